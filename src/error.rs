//! Errors reported by junction-tree construction and inference.

use thiserror::Error;

/// Errors that can occur while building a junction tree or answering queries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    /// A query or evidence update arrived before a successful `process`.
    #[error("junction tree is not initialized yet")]
    UninitializedTree,

    /// Variable index outside `0..count`.
    #[error("invalid variable {variable} (model has {count} variables)")]
    InvalidVariable { variable: usize, count: usize },

    /// Value index outside the variable's state space.
    #[error("invalid value {value} for variable {variable} with cardinality {cardinality}")]
    InvalidValue {
        variable: usize,
        value: usize,
        cardinality: usize,
    },

    /// The built structure broke one of its own invariants.
    #[error("structural invariant violated: {0}")]
    StructuralInvariantViolation(String),

    /// A table summed to zero while being normalized.
    #[error("cannot normalize {what}: total mass is zero")]
    DegenerateNormalization { what: String },

    /// Adjacency matrix shape does not match the model.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A conditional probability table is malformed.
    #[error("invalid factor for variable {variable}: {reason}")]
    InvalidFactor { variable: usize, reason: String },

    /// Joint table size does not fit in `usize`.
    #[error("joint table over variables {variables:?} is too large")]
    TableTooLarge { variables: Vec<usize> },
}

/// Result type for inference operations.
pub type Result<T> = std::result::Result<T, InferenceError>;
