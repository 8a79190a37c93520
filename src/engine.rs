//! The inference engine: build once, query many times.
//!
//! [`MarginCalculator`] owns a model and the junction tree built for it.
//!
//! ```
//! use junction_rs::{BayesNet, MarginCalculator};
//!
//! let mut net = BayesNet::new();
//! let rain = net.add_variable("rain", 2);
//! let wet = net.add_variable("wet", 2);
//! net.set_cpt(rain, &[], vec![0.8, 0.2]).unwrap();
//! net.set_cpt(wet, &[rain], vec![0.9, 0.1, 0.2, 0.8]).unwrap();
//!
//! let mut engine = MarginCalculator::new(net);
//! let margins = engine.process_model().unwrap();
//! assert!((margins[wet][1] - 0.24).abs() < 1e-9);
//!
//! let margins = engine.set_evidence(wet, 1).unwrap();
//! assert!((margins[rain][1] - 0.16 / 0.24).abs() < 1e-9);
//! ```

use std::fmt;

use log::{debug, info};

use crate::error::{InferenceError, Result};
use crate::graph::Graph;
use crate::junction::JunctionTree;
use crate::margins::Margins;
use crate::network::{check_model, Model};

/// Configuration of a [`MarginCalculator`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Tables with less total mass cannot be normalized.
    pub min_normalizer: f64,
    /// Check chordality, clique completeness and running intersection
    /// after construction.
    pub verify_structure: bool,
    /// Log the tree summary at debug level after construction.
    pub log_structure: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_normalizer: f64::MIN_POSITIVE,
            verify_structure: true,
            log_structure: false,
        }
    }
}

/// Exact marginal inference over a discrete model.
#[derive(Debug, Clone)]
pub struct MarginCalculator<M: Model> {
    model: M,
    config: EngineConfig,
    tree: Option<JunctionTree>,
    margins: Margins,
    evidence: Vec<Option<usize>>,
}

impl<M: Model> MarginCalculator<M> {
    pub fn new(model: M) -> Self {
        Self::with_config(model, EngineConfig::default())
    }

    pub fn with_config(model: M, config: EngineConfig) -> Self {
        Self {
            model,
            config,
            tree: None,
            margins: Margins::default(),
            evidence: Vec::new(),
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds and calibrates the junction tree for an adjacency matrix.
    ///
    /// Any previous tree and evidence are dropped first, so a failed call
    /// leaves the engine uninitialized.
    pub fn process(&mut self, adjacency: &[Vec<bool>]) -> Result<Margins> {
        self.reset();
        let n = self.model.num_variables();
        if adjacency.len() != n {
            return Err(InferenceError::DimensionMismatch {
                expected: n,
                got: adjacency.len(),
            });
        }
        let graph = Graph::from_matrix(adjacency)?;
        self.process_graph(graph)
    }

    /// Like [`process`][Self::process], for the moral graph of the model.
    pub fn process_model(&mut self) -> Result<Margins> {
        self.reset();
        check_model(&self.model)?;
        let graph = Graph::moralize(&self.model);
        self.calibrate(graph)
    }

    /// Like [`process`][Self::process], for an already built graph.
    ///
    /// The model's parent structure is checked first: out-of-range or
    /// self parents and cyclic parent relations are
    /// [`InferenceError::InvalidFactor`].
    pub fn process_graph(&mut self, graph: Graph) -> Result<Margins> {
        self.reset();
        check_model(&self.model)?;
        self.calibrate(graph)
    }

    fn calibrate(&mut self, graph: Graph) -> Result<Margins> {
        let mut tree = JunctionTree::build(&self.model, graph, &self.config)?;
        tree.propagate()?;
        if self.config.log_structure {
            debug!("{}", tree.summary());
        }

        self.margins = tree.margins();
        self.evidence = vec![None; self.model.num_variables()];
        self.tree = Some(tree);
        info!("processed {} variables", self.margins.len());
        Ok(self.margins.clone())
    }

    fn reset(&mut self) {
        self.tree = None;
        self.margins = Margins::default();
        self.evidence.clear();
    }

    pub fn is_initialized(&self) -> bool {
        self.tree.is_some()
    }

    /// The calibrated junction tree, if [`process`][Self::process] succeeded.
    pub fn tree(&self) -> Option<&JunctionTree> {
        self.tree.as_ref()
    }

    /// Current marginal distribution of one variable.
    pub fn margin(&self, variable: usize) -> Result<&[f64]> {
        if self.tree.is_none() {
            return Err(InferenceError::UninitializedTree);
        }
        self.margins.get(variable).ok_or(InferenceError::InvalidVariable {
            variable,
            count: self.margins.len(),
        })
    }

    /// Current marginals of all variables.
    pub fn margins(&self) -> Result<&Margins> {
        match self.tree {
            Some(_) => Ok(&self.margins),
            None => Err(InferenceError::UninitializedTree),
        }
    }

    /// Observes `variable = value` and returns the updated marginals.
    ///
    /// Observing the same value twice is a no-op. Evidence that has zero
    /// probability under the current state (including a value conflicting
    /// with earlier evidence on the same variable) fails with
    /// [`InferenceError::DegenerateNormalization`] and changes nothing.
    pub fn set_evidence(&mut self, variable: usize, value: usize) -> Result<Margins> {
        let count = self.model.num_variables();
        let tree = self.tree.as_mut().ok_or(InferenceError::UninitializedTree)?;
        if variable >= count {
            return Err(InferenceError::InvalidVariable { variable, count });
        }
        if self.evidence[variable] == Some(value) {
            debug!("variable {} already observed as {}", variable, value);
            return Ok(self.margins.clone());
        }

        tree.set_evidence(variable, value)?;
        self.margins = tree.margins();
        self.evidence[variable] = Some(value);
        info!("evidence {} = {} absorbed", variable, value);
        Ok(self.margins.clone())
    }

    /// Observed values, indexed by variable.
    pub fn evidence(&self) -> &[Option<usize>] {
        &self.evidence
    }

    /// Retracts all evidence by re-propagating the stored potentials.
    pub fn clear_evidence(&mut self) -> Result<Margins> {
        let tree = self.tree.as_mut().ok_or(InferenceError::UninitializedTree)?;
        tree.propagate()?;
        self.margins = tree.margins();
        self.evidence.iter_mut().for_each(|e| *e = None);
        info!("evidence cleared");
        Ok(self.margins.clone())
    }
}

impl<M: Model> fmt::Display for MarginCalculator<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tree {
            Some(tree) => f.write_str(&tree.debug_marginals()),
            None => writeln!(f, "<uninitialized>"),
        }
    }
}
