//! # junction-rs: exact inference on discrete Bayesian networks
//!
//! **`junction-rs`** computes exact marginal distributions of discrete
//! probabilistic graphical models with the classical **junction-tree**
//! (clique-tree) algorithm, and updates them incrementally when evidence
//! arrives.
//!
//! ## What is a junction tree?
//!
//! Starting from the moral graph of a Bayesian network, the graph is made
//! **chordal** by adding fill-in edges along an elimination order. The
//! maximal cliques of a chordal graph can be arranged in a tree where every
//! variable's cliques form a connected subtree (the *running intersection
//! property*). Local computations on that tree then produce globally exact
//! marginals: one upward and one downward pass of messages over the
//! separators is enough.
//!
//! ## Pipeline
//!
//! ```text
//! adjacency ─▶ order ─▶ fill-in ─▶ order ─▶ cliques ─▶ tree ─▶ potentials ─▶ propagation
//! ```
//!
//! ## Basic Usage
//!
//! ```rust
//! use junction_rs::{BayesNet, MarginCalculator};
//!
//! // A -> B -> C, each copying its parent with probability 0.8.
//! let mut net = BayesNet::new();
//! let a = net.add_variable("A", 2);
//! let b = net.add_variable("B", 2);
//! let c = net.add_variable("C", 2);
//! net.set_cpt(b, &[a], vec![0.8, 0.2, 0.2, 0.8]).unwrap();
//! net.set_cpt(c, &[b], vec![0.8, 0.2, 0.2, 0.8]).unwrap();
//!
//! let mut engine = MarginCalculator::new(net);
//! let margins = engine.process_model().unwrap();
//! assert!((margins[c][0] - 0.5).abs() < 1e-9);
//!
//! let margins = engine.set_evidence(a, 0).unwrap();
//! assert!((margins[b][0] - 0.8).abs() < 1e-9);
//! assert!((margins[c][0] - 0.68).abs() < 1e-9);
//! ```
//!
//! ## Core Components
//!
//! - **[`engine`]**: the [`MarginCalculator`] façade and its [`EngineConfig`].
//! - **[`junction`]**: the clique/separator arena and its construction.
//! - **[`network`]**: the [`Model`] trait and the [`BayesNet`] implementation.
//! - **[`debug`]**: structural summaries for logs and tests.

pub mod cliques;
pub mod debug;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod graph;
pub mod index;
pub mod junction;
pub mod margins;
pub mod network;
pub mod order;
pub mod potential;
pub mod propagate;
pub mod tree;
pub mod triangulate;
pub mod varset;

pub use engine::{EngineConfig, MarginCalculator};
pub use error::{InferenceError, Result};
pub use graph::Graph;
pub use junction::JunctionTree;
pub use margins::Margins;
pub use network::{BayesNet, Cpt, Model};
