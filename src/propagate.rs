//! Two-pass (Hugin) message passing over a [`JunctionTree`].
//!
//! # Algorithm
//!
//! **Upward pass** (post-order): each clique starts from its potential,
//! multiplies in the child message cached on every child separator,
//! normalizes, and writes its own marginal onto its parent separator.
//!
//! **Downward pass** (pre-order): each non-root clique recomputes the
//! parent message from its parent's final distribution and rescales:
//!
//! ```text
//! P(x) ← P(x) · from_parent(x_S) / from_child(x_S)      (0 if from_child = 0)
//! ```
//!
//! After the downward pass both messages on every separator agree, and
//! every clique holds the normalized joint over its members.

use crate::error::{InferenceError, Result};
use crate::junction::{CliqueState, JunctionTree};

/// Sums `table` into `out` along a projection map.
pub(crate) fn marginalize(table: &[f64], map: &[usize], out: &mut [f64]) {
    out.iter_mut().for_each(|x| *x = 0.0);
    for (&p, &k) in table.iter().zip(map) {
        out[k] += p;
    }
}

impl JunctionTree {
    /// Calibrates the tree from the initial potentials.
    ///
    /// Any previously absorbed evidence is discarded.
    pub fn propagate(&mut self) -> Result<()> {
        for clique in &mut self.cliques {
            clique.distribution.copy_from_slice(&clique.potential);
            clique.state = CliqueState::Uninitialized;
        }
        for i in (0..self.preorder.len()).rev() {
            let c = self.preorder[i];
            self.collect(c)?;
        }
        for i in 0..self.preorder.len() {
            let c = self.preorder[i];
            self.distribute(c)?;
        }
        Ok(())
    }

    /// Whether every clique has finished the downward pass.
    pub fn is_calibrated(&self) -> bool {
        !self.cliques.is_empty() && self.cliques.iter().all(|c| c.state == CliqueState::UpdatedDown)
    }

    /// Upward step for one clique; all of its children must be done.
    fn collect(&mut self, c: usize) -> Result<()> {
        for &s in &self.cliques[c].children {
            let sep = &self.separators[s];
            if self.cliques[sep.child].state != CliqueState::UpdatedUp {
                return Err(InferenceError::StructuralInvariantViolation(format!(
                    "clique {} collected before its child {}",
                    c, sep.child
                )));
            }
        }

        let children = self.cliques[c].children.clone();
        for s in children {
            let sep = &self.separators[s];
            let clique = &mut self.cliques[c];
            for (p, &k) in clique.distribution.iter_mut().zip(&sep.parent_map) {
                *p *= sep.from_child[k];
            }
        }
        self.normalize(c)?;
        if let Some(s) = self.cliques[c].parent {
            self.update_from_child(s);
        }
        self.cliques[c].state = CliqueState::UpdatedUp;
        Ok(())
    }

    /// Downward step for one clique; its parent must be final.
    fn distribute(&mut self, c: usize) -> Result<()> {
        match self.cliques[c].parent {
            None => {
                if self.cliques[c].state != CliqueState::UpdatedUp {
                    return Err(InferenceError::StructuralInvariantViolation(format!(
                        "root clique {} distributed before collecting",
                        c
                    )));
                }
            }
            Some(s) => {
                let parent = self.separators[s].parent;
                if self.cliques[parent].state != CliqueState::UpdatedDown {
                    return Err(InferenceError::StructuralInvariantViolation(format!(
                        "clique {} distributed before its parent {}",
                        c, parent
                    )));
                }
                self.absorb_from_parent(s)?;
            }
        }
        self.compute_marginals(c);
        self.cliques[c].state = CliqueState::UpdatedDown;
        Ok(())
    }

    /// Rescales the child of separator `s` by the fresh parent message.
    pub(crate) fn absorb_from_parent(&mut self, s: usize) -> Result<()> {
        self.update_from_parent(s);
        let sep = &self.separators[s];
        let c = sep.child;
        let clique = &mut self.cliques[c];
        for (p, &k) in clique.distribution.iter_mut().zip(&sep.child_map) {
            let denominator = sep.from_child[k];
            *p = if denominator == 0.0 {
                0.0
            } else {
                *p * sep.from_parent[k] / denominator
            };
        }
        self.normalize(c)?;
        self.update_from_child(s);
        Ok(())
    }

    /// Re-runs the downward pass over the whole subtree rooted at `c`.
    ///
    /// The parent of `c` must already hold its new distribution.
    pub(crate) fn distribute_subtree(&mut self, c: usize) -> Result<()> {
        let mut stack = vec![c];
        while let Some(c) = stack.pop() {
            if let Some(s) = self.cliques[c].parent {
                self.absorb_from_parent(s)?;
            }
            self.compute_marginals(c);
            self.cliques[c].state = CliqueState::UpdatedDown;
            for &s in self.cliques[c].children.iter().rev() {
                stack.push(self.separators[s].child);
            }
        }
        Ok(())
    }

    /// Marginalizes the child of separator `s` onto the separator.
    pub(crate) fn update_from_child(&mut self, s: usize) {
        let sep = &mut self.separators[s];
        let child = &self.cliques[sep.child];
        marginalize(&child.distribution, &sep.child_map, &mut sep.from_child);
    }

    /// Marginalizes the parent of separator `s` onto the separator.
    pub(crate) fn update_from_parent(&mut self, s: usize) {
        let sep = &mut self.separators[s];
        let parent = &self.cliques[sep.parent];
        marginalize(&parent.distribution, &sep.parent_map, &mut sep.from_parent);
    }

    /// Scales the distribution of clique `c` to total mass one.
    pub(crate) fn normalize(&mut self, c: usize) -> Result<()> {
        let clique = &mut self.cliques[c];
        let total: f64 = clique.distribution.iter().sum();
        if total.is_nan() || total < self.min_normalizer {
            return Err(InferenceError::DegenerateNormalization {
                what: format!("clique {:?}", clique.variables),
            });
        }
        clique.distribution.iter_mut().for_each(|p| *p /= total);
        Ok(())
    }

    /// Recomputes the per-member marginals of clique `c`.
    pub(crate) fn compute_marginals(&mut self, c: usize) {
        let clique = &mut self.cliques[c];
        for m in &mut clique.marginals {
            m.iter_mut().for_each(|x| *x = 0.0);
        }
        let mut odometer = clique.layout.odometer();
        for &p in &clique.distribution {
            for (m, &value) in clique.marginals.iter_mut().zip(odometer.values()) {
                m[value] += p;
            }
            odometer.advance();
        }
    }
}
