//! Incremental evidence absorption.
//!
//! Observing `variable = value` zeroes the inconsistent cells of the
//! variable's home clique and renormalizes it. The change then spreads
//! without a full re-propagation:
//!
//! 1. the home clique's own subtrees are re-distributed;
//! 2. walking up, each ancestor absorbs the updated child message
//!    (`P ← P · from_child / from_parent`, 0 where `from_parent = 0`),
//!    and re-distributes into every other child subtree;
//! 3. finally the parent messages along the walked path are refreshed.
//!
//! Only the component containing the variable is touched.

use log::debug;

use crate::error::{InferenceError, Result};
use crate::junction::{CliqueState, JunctionTree};

/// Mutable tables of the tree, restored when an update fails half-way.
///
/// Potentials and layouts never change after construction and are not saved.
struct Checkpoint {
    cliques: Vec<(Vec<f64>, Vec<Vec<f64>>, CliqueState)>,
    messages: Vec<(Vec<f64>, Vec<f64>)>,
}

impl JunctionTree {
    /// Conditions the calibrated tree on `variable = value`.
    ///
    /// On error the tree is left exactly as it was before the call.
    pub fn set_evidence(&mut self, variable: usize, value: usize) -> Result<()> {
        if !self.is_calibrated() {
            return Err(InferenceError::UninitializedTree);
        }
        let count = self.num_variables();
        if variable >= count {
            return Err(InferenceError::InvalidVariable { variable, count });
        }
        let cardinality = self.cardinalities[variable];
        if value >= cardinality {
            return Err(InferenceError::InvalidValue {
                variable,
                value,
                cardinality,
            });
        }

        let checkpoint = self.checkpoint();
        let result = self.apply_evidence(variable, value);
        if result.is_err() {
            debug!("evidence {} = {} rejected, restoring tree", variable, value);
            self.restore(checkpoint);
        }
        result
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            cliques: self
                .cliques
                .iter()
                .map(|c| (c.distribution.clone(), c.marginals.clone(), c.state))
                .collect(),
            messages: self
                .separators
                .iter()
                .map(|s| (s.from_child.clone(), s.from_parent.clone()))
                .collect(),
        }
    }

    fn restore(&mut self, checkpoint: Checkpoint) {
        for (clique, (distribution, marginals, state)) in self.cliques.iter_mut().zip(checkpoint.cliques) {
            clique.distribution = distribution;
            clique.marginals = marginals;
            clique.state = state;
        }
        for (sep, (from_child, from_parent)) in self.separators.iter_mut().zip(checkpoint.messages) {
            sep.from_child = from_child;
            sep.from_parent = from_parent;
        }
    }

    fn apply_evidence(&mut self, variable: usize, value: usize) -> Result<()> {
        let home = self.home[variable];
        let clique = &mut self.cliques[home];
        let position = clique.position(variable).ok_or_else(|| {
            InferenceError::StructuralInvariantViolation(format!(
                "variable {} missing from its home clique",
                variable
            ))
        })?;
        debug!("observe {} = {} in clique {:?}", variable, value, clique.variables);

        let mut odometer = clique.layout.odometer();
        for p in clique.distribution.iter_mut() {
            if odometer.values()[position] != value {
                *p = 0.0;
            }
            odometer.advance();
        }
        self.normalize(home)?;
        self.compute_marginals(home);
        self.update_evidence(home)
    }

    /// Spreads a change made to clique `c` through its component.
    fn update_evidence(&mut self, c: usize) -> Result<()> {
        for s in self.cliques[c].children.clone() {
            let child = self.separators[s].child;
            self.distribute_subtree(child)?;
        }

        let mut path = Vec::new();
        let mut current = c;
        while let Some(s) = self.cliques[current].parent {
            self.update_from_child(s);
            let parent = self.separators[s].parent;
            self.absorb_from_child(s)?;
            for t in self.cliques[parent].children.clone() {
                if t != s {
                    let sibling = self.separators[t].child;
                    self.distribute_subtree(sibling)?;
                }
            }
            path.push(s);
            current = parent;
        }

        for s in path {
            self.update_from_parent(s);
        }
        Ok(())
    }

    /// Rescales the parent of separator `s` by the fresh child message.
    fn absorb_from_child(&mut self, s: usize) -> Result<()> {
        let sep = &self.separators[s];
        let p = sep.parent;
        let clique = &mut self.cliques[p];
        for (x, &k) in clique.distribution.iter_mut().zip(&sep.parent_map) {
            let denominator = sep.from_parent[k];
            *x = if denominator == 0.0 {
                0.0
            } else {
                *x * sep.from_child[k] / denominator
            };
        }
        self.normalize(p)?;
        self.compute_marginals(p);
        Ok(())
    }
}
