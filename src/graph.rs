//! Undirected adjacency graph over variable ids.
//!
//! The junction tree is built from the moral graph of a Bayesian network:
//! every variable is linked to its parents, co-parents are "married", and
//! edge directions are dropped. The triangulator then only ever adds edges.

use std::fmt;

use log::{debug, warn};

use crate::error::{InferenceError, Result};
use crate::network::Model;
use crate::varset::VarSet;

/// Symmetric adjacency matrix stored as one [`VarSet`] row per variable.
#[derive(Clone, PartialEq, Eq)]
pub struct Graph {
    rows: Vec<VarSet>,
}

impl Graph {
    /// Creates a graph with `n` variables and no edges.
    pub fn new(n: usize) -> Self {
        Self {
            rows: (0..n).map(|_| VarSet::new(n)).collect(),
        }
    }

    /// Builds a graph from a square boolean matrix.
    ///
    /// The diagonal is ignored. An edge present in only one direction is
    /// treated as undirected.
    pub fn from_matrix(matrix: &[Vec<bool>]) -> Result<Self> {
        let n = matrix.len();
        if let Some(row) = matrix.iter().find(|row| row.len() != n) {
            return Err(InferenceError::DimensionMismatch {
                expected: n,
                got: row.len(),
            });
        }

        let mut graph = Graph::new(n);
        let mut asymmetric = 0;
        for (a, row) in matrix.iter().enumerate() {
            for (b, &edge) in row.iter().enumerate() {
                if edge && a != b {
                    if !matrix[b][a] {
                        asymmetric += 1;
                    }
                    graph.add_edge(a, b);
                }
            }
        }
        if asymmetric > 0 {
            warn!(
                "adjacency matrix has {} one-directional entries, treating them as undirected",
                asymmetric
            );
        }
        Ok(graph)
    }

    /// Builds the moral graph of a model.
    pub fn moralize<M: Model + ?Sized>(model: &M) -> Self {
        let n = model.num_variables();
        let mut graph = Graph::new(n);
        for v in 0..n {
            let parents = model.parents(v);
            for (i, &p) in parents.iter().enumerate() {
                graph.add_edge(v, p);
                for &q in &parents[i + 1..] {
                    if graph.add_edge(p, q) {
                        debug!("moralize: marry {} -- {}", p, q);
                    }
                }
            }
        }
        graph
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.rows[a].contains(b)
    }

    /// Adds the undirected edge `a -- b`. Returns true if it was new.
    pub fn add_edge(&mut self, a: usize, b: usize) -> bool {
        if a == b {
            return false;
        }
        let added = self.rows[a].insert(b);
        self.rows[b].insert(a);
        added
    }

    pub fn neighbors(&self, v: usize) -> &VarSet {
        &self.rows[v]
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.rows.iter().map(|r| r.len()).sum::<usize>() / 2
    }

    /// Iterates over edges `(a, b)` with `a < b`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.rows
            .iter()
            .enumerate()
            .flat_map(|(a, row)| row.iter().filter(move |&b| a < b).map(move |b| (a, b)))
    }

    /// Returns true if every edge of `self` is also an edge of `other`.
    pub fn is_subgraph_of(&self, other: &Graph) -> bool {
        self.len() == other.len()
            && self
                .rows
                .iter()
                .zip(other.rows.iter())
                .all(|(mine, theirs)| mine.is_subset(theirs))
    }

    /// Returns true if every pair of distinct members of `vars` is adjacent.
    pub fn is_complete(&self, vars: &VarSet) -> bool {
        vars.iter().all(|a| {
            let mut others = vars.clone();
            others.remove(a);
            others.is_subset(&self.rows[a])
        })
    }

    /// Dense boolean matrix form.
    pub fn to_matrix(&self) -> Vec<Vec<bool>> {
        let n = self.len();
        self.rows
            .iter()
            .map(|row| (0..n).map(|b| row.contains(b)).collect())
            .collect()
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("variables", &self.len())
            .field("edges", &self.edges().collect::<Vec<_>>())
            .finish()
    }
}
