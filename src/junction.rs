//! The junction tree: an arena of cliques and separators.
//!
//! # Construction
//!
//! ```text
//! Graph → MCS order → fill-in → MCS order → cliques → clique tree → potentials
//! ```
//!
//! [`JunctionTree::build`] runs the whole pipeline. Cliques are stored in
//! elimination order of their generating variable, so every parent clique
//! has a smaller index than its children. Cliques and separators refer to
//! each other only by index:
//!
//! - a clique knows its parent separator (if any) and its child separators;
//! - a separator knows its child clique and its parent clique.
//!
//! Propagation lives in [`propagate`][crate::propagate], evidence handling
//! in [`evidence`][crate::evidence], inspection in [`debug`][crate::debug].

use log::{debug, info};

use crate::cliques::{cliques_in_order, maximal_cliques};
use crate::engine::EngineConfig;
use crate::error::{InferenceError, Result};
use crate::graph::Graph;
use crate::index::MixedRadix;
use crate::margins::Margins;
use crate::network::Model;
use crate::order::{max_cardinality_order, Order};
use crate::potential::{assign_factors, initial_potential};
use crate::tree::build_clique_tree;
use crate::triangulate::{fill_in, is_perfect_elimination_order};
use crate::varset::VarSet;

/// Propagation state of a clique.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CliqueState {
    /// Holds only its initial potential.
    Uninitialized,
    /// Has absorbed all of its children's messages.
    UpdatedUp,
    /// Holds its final, globally consistent distribution.
    UpdatedDown,
}

/// A maximal clique with its tables.
#[derive(Debug, Clone)]
pub struct Clique {
    pub(crate) variables: Vec<usize>,
    pub(crate) layout: MixedRadix,
    /// Product of the claimed factors; never modified after construction.
    pub(crate) potential: Vec<f64>,
    /// Current normalized joint distribution over the clique.
    pub(crate) distribution: Vec<f64>,
    /// Per-member marginals of `distribution`, same order as `variables`.
    pub(crate) marginals: Vec<Vec<f64>>,
    pub(crate) claimed: Vec<usize>,
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
    pub(crate) state: CliqueState,
}

impl Clique {
    /// Member variables in table order (ascending ids).
    pub fn variables(&self) -> &[usize] {
        &self.variables
    }

    pub fn contains(&self, variable: usize) -> bool {
        self.variables.binary_search(&variable).is_ok()
    }

    pub(crate) fn position(&self, variable: usize) -> Option<usize> {
        self.variables.binary_search(&variable).ok()
    }

    /// Number of cells in the clique's tables.
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    pub fn potential(&self) -> &[f64] {
        &self.potential
    }

    pub fn distribution(&self) -> &[f64] {
        &self.distribution
    }

    /// Variables whose factors were multiplied into this clique.
    pub fn claimed(&self) -> &[usize] {
        &self.claimed
    }

    /// Index of the separator towards the parent, `None` for roots.
    pub fn parent_separator(&self) -> Option<usize> {
        self.parent
    }

    pub fn child_separators(&self) -> &[usize] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn state(&self) -> CliqueState {
        self.state
    }

    /// Marginal of a member variable under the current distribution.
    pub fn marginal(&self, variable: usize) -> Option<&[f64]> {
        self.position(variable)
            .and_then(|i| self.marginals.get(i))
            .map(|m| m.as_slice())
    }
}

/// The intersection of a clique with its parent, with cached messages.
#[derive(Debug, Clone)]
pub struct Separator {
    pub(crate) variables: Vec<usize>,
    pub(crate) child: usize,
    pub(crate) parent: usize,
    /// Child clique offset -> separator offset.
    pub(crate) child_map: Vec<usize>,
    /// Parent clique offset -> separator offset.
    pub(crate) parent_map: Vec<usize>,
    pub(crate) size: usize,
    /// Child's distribution marginalized onto the separator.
    pub(crate) from_child: Vec<f64>,
    /// Parent's distribution marginalized onto the separator.
    pub(crate) from_parent: Vec<f64>,
}

impl Separator {
    pub fn variables(&self) -> &[usize] {
        &self.variables
    }

    pub fn child(&self) -> usize {
        self.child
    }

    pub fn parent(&self) -> usize {
        self.parent
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn child_message(&self) -> &[f64] {
        &self.from_child
    }

    pub fn parent_message(&self) -> &[f64] {
        &self.from_parent
    }
}

/// Junction forest over the variables of a model.
#[derive(Debug, Clone)]
pub struct JunctionTree {
    pub(crate) cliques: Vec<Clique>,
    pub(crate) separators: Vec<Separator>,
    pub(crate) roots: Vec<usize>,
    /// Parents before children.
    pub(crate) preorder: Vec<usize>,
    /// Canonical clique of each variable: the first one containing it.
    pub(crate) home: Vec<usize>,
    pub(crate) cardinalities: Vec<usize>,
    pub(crate) order: Order,
    pub(crate) fill_edges: usize,
    pub(crate) min_normalizer: f64,
}

impl JunctionTree {
    /// Builds the junction tree of `graph` and loads the model's factors.
    ///
    /// The returned tree holds initial potentials only; call
    /// [`propagate`][JunctionTree::propagate] to calibrate it.
    pub fn build<M: Model + ?Sized>(model: &M, mut graph: Graph, config: &EngineConfig) -> Result<Self> {
        let n = model.num_variables();
        if graph.len() != n {
            return Err(InferenceError::DimensionMismatch {
                expected: n,
                got: graph.len(),
            });
        }
        let cardinalities: Vec<usize> = (0..n).map(|v| model.cardinality(v)).collect();
        if let Some(v) = cardinalities.iter().position(|&c| c == 0) {
            return Err(InferenceError::InvalidFactor {
                variable: v,
                reason: "cardinality must be positive".to_string(),
            });
        }

        let order = max_cardinality_order(&graph);
        debug!("initial order = {:?}", order.as_slice());
        let fill_edges = fill_in(&mut graph, &order);
        let order = max_cardinality_order(&graph);
        debug!("order after {} fill-in edges = {:?}", fill_edges, order.as_slice());

        let generated = maximal_cliques(&graph, &order);
        if config.verify_structure {
            if !is_perfect_elimination_order(&graph, &order) {
                return Err(InferenceError::StructuralInvariantViolation(
                    "filled graph is not chordal along its order".to_string(),
                ));
            }
            if let Some(c) = generated.iter().flatten().find(|c| !graph.is_complete(c)) {
                return Err(InferenceError::StructuralInvariantViolation(format!(
                    "{} is not a clique of the filled graph",
                    c
                )));
            }
        }
        let links = build_clique_tree(&generated, &order)?;

        // Arena indices follow elimination order of the generators.
        let in_order = cliques_in_order(&generated, &order);
        let mut index_of = vec![usize::MAX; n];
        for (i, &(v, _)) in in_order.iter().enumerate() {
            index_of[v] = i;
        }

        let sets: Vec<VarSet> = in_order.iter().map(|(_, c)| c.clone()).collect();
        let claims = assign_factors(model, &sets)?;

        let mut cliques = Vec::with_capacity(in_order.len());
        for ((_, set), claimed) in in_order.iter().zip(claims) {
            let variables = set.to_vec();
            if variables.is_empty() {
                return Err(InferenceError::StructuralInvariantViolation(
                    "empty clique".to_string(),
                ));
            }
            let layout = MixedRadix::new(variables.iter().map(|&v| cardinalities[v]).collect())
                .ok_or_else(|| InferenceError::TableTooLarge {
                    variables: variables.clone(),
                })?;
            let potential = initial_potential(model, &variables, &layout, &claimed)?;
            let marginals = variables.iter().map(|&v| vec![0.0; cardinalities[v]]).collect();
            cliques.push(Clique {
                distribution: potential.clone(),
                variables,
                layout,
                potential,
                marginals,
                claimed,
                parent: None,
                children: Vec::new(),
                state: CliqueState::Uninitialized,
            });
        }

        let mut separators = Vec::new();
        let mut roots = Vec::new();
        for (i, &(v, _)) in in_order.iter().enumerate() {
            let Some(p) = links.parents[v] else {
                roots.push(i);
                continue;
            };
            let parent = index_of[p];
            let variables = links.separators[v]
                .as_ref()
                .map(|s| s.to_vec())
                .unwrap_or_default();
            let separator = Self::link(&cliques, i, parent, variables)?;
            let s = separators.len();
            separators.push(separator);
            cliques[i].parent = Some(s);
            cliques[parent].children.push(s);
        }

        let mut home = vec![usize::MAX; n];
        for (i, clique) in cliques.iter().enumerate() {
            for &v in &clique.variables {
                if home[v] == usize::MAX {
                    home[v] = i;
                }
            }
        }
        if let Some(v) = home.iter().position(|&h| h == usize::MAX) {
            return Err(InferenceError::StructuralInvariantViolation(format!(
                "variable {} is absent from every clique",
                v
            )));
        }

        let mut tree = Self {
            cliques,
            separators,
            roots,
            preorder: Vec::new(),
            home,
            cardinalities,
            order,
            fill_edges,
            min_normalizer: config.min_normalizer,
        };
        tree.preorder = tree.compute_preorder();

        if config.verify_structure {
            tree.verify_running_intersection()?;
        }

        info!(
            "built junction tree: {} variables, {} cliques, {} roots, {} fill-in edges, largest table {}",
            n,
            tree.cliques.len(),
            tree.roots.len(),
            tree.fill_edges,
            tree.cliques.iter().map(|c| c.size()).max().unwrap_or(0)
        );
        Ok(tree)
    }

    /// Creates the separator between `child` and `parent`.
    fn link(cliques: &[Clique], child: usize, parent: usize, variables: Vec<usize>) -> Result<Separator> {
        let positions = |clique: &Clique| {
            variables
                .iter()
                .map(|&v| {
                    clique.position(v).ok_or_else(|| {
                        InferenceError::StructuralInvariantViolation(format!(
                            "separator variable {} missing from clique {:?}",
                            v, clique.variables
                        ))
                    })
                })
                .collect::<Result<Vec<usize>>>()
        };
        let child_positions = positions(&cliques[child])?;
        let parent_positions = positions(&cliques[parent])?;
        let size = child_positions
            .iter()
            .map(|&i| cliques[child].layout.radii()[i])
            .product();

        Ok(Separator {
            child_map: cliques[child].layout.projection(&child_positions),
            parent_map: cliques[parent].layout.projection(&parent_positions),
            variables,
            child,
            parent,
            size,
            from_child: vec![0.0; size],
            from_parent: vec![0.0; size],
        })
    }

    /// Depth-first listing of every clique, parents before children.
    fn compute_preorder(&self) -> Vec<usize> {
        let mut preorder = Vec::with_capacity(self.cliques.len());
        for &root in &self.roots {
            self.push_subtree(root, &mut preorder);
        }
        preorder
    }

    /// Appends the subtree rooted at `clique` to `out` in pre-order.
    pub(crate) fn push_subtree(&self, clique: usize, out: &mut Vec<usize>) {
        let mut stack = vec![clique];
        while let Some(c) = stack.pop() {
            out.push(c);
            for &s in self.cliques[c].children.iter().rev() {
                stack.push(self.separators[s].child);
            }
        }
    }

    /// Checks that the cliques holding any one variable form a connected subtree.
    ///
    /// Within a tree the cliques containing `v` are connected iff exactly
    /// one of them has no parent containing `v`.
    pub fn verify_running_intersection(&self) -> Result<()> {
        let n = self.cardinalities.len();
        let mut tops = vec![0usize; n];
        for clique in &self.cliques {
            for &v in &clique.variables {
                let parent_has = clique
                    .parent
                    .map(|s| self.cliques[self.separators[s].parent].contains(v))
                    .unwrap_or(false);
                if !parent_has {
                    tops[v] += 1;
                }
            }
        }
        match tops.iter().position(|&t| t != 1) {
            Some(v) => Err(InferenceError::StructuralInvariantViolation(format!(
                "running intersection broken for variable {} ({} disconnected groups)",
                v, tops[v]
            ))),
            None => Ok(()),
        }
    }

    pub fn num_variables(&self) -> usize {
        self.cardinalities.len()
    }

    pub fn cardinality(&self, variable: usize) -> usize {
        self.cardinalities[variable]
    }

    pub fn cliques(&self) -> &[Clique] {
        &self.cliques
    }

    pub fn separators(&self) -> &[Separator] {
        &self.separators
    }

    /// Indices of the root cliques, one per connected component.
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Elimination order used for decomposition (post fill-in).
    pub fn order(&self) -> &Order {
        &self.order
    }

    /// Number of fill-in edges the triangulation added.
    pub fn fill_edges(&self) -> usize {
        self.fill_edges
    }

    /// Index of the canonical clique holding `variable`.
    pub fn home(&self, variable: usize) -> usize {
        self.home[variable]
    }

    /// Index of the parent clique of `clique`.
    pub fn parent_clique(&self, clique: usize) -> Option<usize> {
        self.cliques[clique].parent.map(|s| self.separators[s].parent)
    }

    /// Marginal of `variable` as seen by a specific clique.
    pub fn clique_marginal(&self, clique: usize, variable: usize) -> Option<&[f64]> {
        self.cliques.get(clique)?.marginal(variable)
    }

    /// Per-variable marginals read from each variable's canonical clique.
    pub fn margins(&self) -> Margins {
        let values = (0..self.num_variables())
            .map(|v| {
                self.clique_marginal(self.home[v], v)
                    .map(|m| m.to_vec())
                    .unwrap_or_default()
            })
            .collect();
        Margins::new(values)
    }
}
