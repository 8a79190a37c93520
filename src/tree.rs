//! Clique-tree construction (separators and parent links).
//!
//! Cliques are visited in elimination order of their generating variable
//! while a running union `U` of the variables seen so far is maintained.
//! A clique's separator is its intersection with `U`, and its parent is the
//! first earlier clique covering the separator. Because the cliques of an
//! MCS order come out in running-intersection order, such a parent always
//! exists when the separator is non-empty; an empty separator starts a new
//! root, one per connected component.

use log::debug;

use crate::error::{InferenceError, Result};
use crate::order::Order;
use crate::varset::VarSet;

/// Separator and parent links of the cliques, indexed by generating variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliqueTree {
    /// `separators[v]` is `Some` iff `v` generates a clique.
    pub separators: Vec<Option<VarSet>>,
    /// Generating variable of the parent clique, `None` for roots.
    pub parents: Vec<Option<usize>>,
}

impl CliqueTree {
    /// Generators of the root cliques, in elimination order.
    pub fn roots<'a>(&'a self, order: &'a Order) -> impl Iterator<Item = usize> + 'a {
        order
            .iter()
            .filter(move |&v| self.separators[v].is_some() && self.parents[v].is_none())
    }
}

/// Links maximal cliques into a junction forest.
pub fn build_clique_tree(cliques: &[Option<VarSet>], order: &Order) -> Result<CliqueTree> {
    let n = cliques.len();
    let mut separators: Vec<Option<VarSet>> = vec![None; n];
    let mut parents: Vec<Option<usize>> = vec![None; n];

    let mut processed: Vec<usize> = Vec::new();
    let mut union = VarSet::new(n);

    for v in order.iter() {
        let Some(clique) = &cliques[v] else {
            continue;
        };

        let separator = clique.intersection(&union);
        union.union_with(clique);

        if !separator.is_empty() {
            let parent = processed
                .iter()
                .copied()
                .find(|&u| cliques[u].as_ref().is_some_and(|c| c.is_superset(&separator)))
                .ok_or_else(|| {
                    InferenceError::StructuralInvariantViolation(format!(
                        "no earlier clique covers separator {} of clique {}",
                        separator, clique
                    ))
                })?;
            debug!(
                "clique {} (generator {}) -> parent {} via {}",
                clique, v, parent, separator
            );
            parents[v] = Some(parent);
        } else {
            debug!("clique {} (generator {}) is a root", clique, v);
        }

        separators[v] = Some(separator);
        processed.push(v);
    }

    Ok(CliqueTree {
        separators,
        parents,
    })
}
