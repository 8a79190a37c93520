//! Debug utilities for inspecting junction-tree structure.
//!
//! This module provides structural summaries and a depth-first dump of the
//! clique marginals. These are primarily useful in tests, in logs, and
//! during development.

use std::fmt::Write;

use crate::junction::{CliqueState, JunctionTree};

/// Structural information about a single clique.
#[derive(Debug, Clone)]
pub struct CliqueInfo {
    /// Index of the clique in the arena
    pub index: usize,
    /// Member variables, in table order
    pub variables: Vec<usize>,
    /// Variables shared with the parent (empty for roots)
    pub separator: Vec<usize>,
    /// Index of the parent clique
    pub parent: Option<usize>,
    /// Number of cells in the potential table
    pub size: usize,
    /// Variables whose factors this clique holds
    pub claimed: Vec<usize>,
    pub state: CliqueState,
}

impl std::fmt::Display for CliqueInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} {:?} (size={}, parent={}, sep={:?}, claims={:?}, {:?})",
            self.index,
            self.variables,
            self.size,
            self.parent.map_or("-".to_string(), |p| p.to_string()),
            self.separator,
            self.claimed,
            self.state,
        )
    }
}

/// Summary of a whole junction forest.
#[derive(Debug, Clone)]
pub struct TreeSummary {
    pub num_variables: usize,
    pub fill_edges: usize,
    pub roots: Vec<usize>,
    pub cliques: Vec<CliqueInfo>,
}

impl TreeSummary {
    /// Largest table size over all cliques.
    pub fn max_table_size(&self) -> usize {
        self.cliques.iter().map(|c| c.size).max().unwrap_or(0)
    }

    /// Sum of all table sizes.
    pub fn total_table_size(&self) -> usize {
        self.cliques.iter().map(|c| c.size).sum()
    }
}

impl std::fmt::Display for TreeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Junction tree ({} variables, {} cliques, roots = {:?}, fill-in = {}):",
            self.num_variables,
            self.cliques.len(),
            self.roots,
            self.fill_edges
        )?;
        for clique in &self.cliques {
            writeln!(f, "  {}", clique)?;
        }
        Ok(())
    }
}

impl JunctionTree {
    /// Get structural information about a single clique.
    pub fn clique_info(&self, index: usize) -> CliqueInfo {
        let clique = &self.cliques[index];
        CliqueInfo {
            index,
            variables: clique.variables.clone(),
            separator: clique
                .parent
                .map(|s| self.separators[s].variables.clone())
                .unwrap_or_default(),
            parent: self.parent_clique(index),
            size: clique.size(),
            claimed: clique.claimed.clone(),
            state: clique.state,
        }
    }

    /// Summarize the forest, cliques in arena order.
    pub fn summary(&self) -> TreeSummary {
        TreeSummary {
            num_variables: self.num_variables(),
            fill_edges: self.fill_edges,
            roots: self.roots.clone(),
            cliques: (0..self.cliques.len()).map(|i| self.clique_info(i)).collect(),
        }
    }

    /// Per-clique marginals, depth-first from each root.
    ///
    /// Each clique prints one line per member variable, and cliques are
    /// separated by a dashed line.
    pub fn debug_marginals(&self) -> String {
        let mut order = Vec::with_capacity(self.cliques.len());
        for &root in &self.roots {
            self.push_subtree(root, &mut order);
        }

        let mut result = String::new();
        for (i, &c) in order.iter().enumerate() {
            if i > 0 {
                result.push_str("--------\n");
            }
            let clique = &self.cliques[c];
            for (&v, m) in clique.variables.iter().zip(&clique.marginals) {
                write!(&mut result, "{}:", v).unwrap();
                for p in m {
                    write!(&mut result, " {:.4}", p).unwrap();
                }
                result.push('\n');
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::engine::EngineConfig;
    use crate::graph::Graph;
    use crate::network::BayesNet;

    fn chain() -> JunctionTree {
        let mut net = BayesNet::new();
        let a = net.add_variable("A", 2);
        let b = net.add_variable("B", 2);
        let c = net.add_variable("C", 2);
        net.set_cpt(b, &[a], vec![0.8, 0.2, 0.2, 0.8]).unwrap();
        net.set_cpt(c, &[b], vec![0.8, 0.2, 0.2, 0.8]).unwrap();
        let mut tree = JunctionTree::build(&net, Graph::moralize(&net), &EngineConfig::default()).unwrap();
        tree.propagate().unwrap();
        tree
    }

    #[test]
    fn test_summary() {
        let tree = chain();
        let summary = tree.summary();
        assert_eq!(summary.cliques.len(), 2);
        assert_eq!(summary.max_table_size(), 4);
        assert_eq!(summary.total_table_size(), 8);
        assert_eq!(summary.cliques[0].separator, Vec::<usize>::new());
        assert_eq!(summary.cliques[1].separator, vec![1]);
        assert_eq!(summary.cliques[1].parent, Some(0));

        let text = summary.to_string();
        assert!(text.starts_with("Junction tree (3 variables, 2 cliques"));
        assert!(text.contains("#1 [1, 2] (size=4, parent=0, sep=[1], claims=[2], UpdatedDown)"));
    }

    #[test]
    fn test_debug_marginals() {
        let tree = chain();
        assert_eq!(
            tree.debug_marginals(),
            "0: 0.5000 0.5000\n1: 0.5000 0.5000\n--------\n1: 0.5000 0.5000\n2: 0.5000 0.5000\n"
        );
    }
}
