//! Maximal cliques of a chordal graph.
//!
//! In a chordal graph with perfect elimination order `order`, every
//! `{v} ∪ earlier_neighbors(v)` is a clique, and every maximal clique has
//! this form for some `v`. Generating one candidate per variable and then
//! discarding the candidates contained in another one leaves exactly the
//! maximal cliques.

use log::debug;

use crate::graph::Graph;
use crate::order::Order;
use crate::triangulate::earlier_neighbors;
use crate::varset::VarSet;

/// Maximal cliques indexed by the variable that generated them.
///
/// `cliques[v]` is `Some` iff the candidate generated by `v` survived.
pub fn maximal_cliques(graph: &Graph, order: &Order) -> Vec<Option<VarSet>> {
    let n = graph.len();
    let mut cliques: Vec<Option<VarSet>> = vec![None; n];

    for v in order.iter().rev() {
        let mut clique = earlier_neighbors(graph, order, v);
        clique.insert(v);
        cliques[v] = Some(clique);
    }

    // Candidates are pairwise distinct (the generator of each candidate is
    // its latest member), so dropping subsets one at a time is safe.
    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }
            let dominated = match (&cliques[i], &cliques[j]) {
                (Some(big), Some(small)) => small.is_subset(big),
                _ => false,
            };
            if dominated {
                debug!("clique of {} is contained in clique of {}", j, i);
                cliques[j] = None;
            }
        }
    }

    cliques
}

/// Returns the surviving cliques in elimination order, paired with their generator.
pub fn cliques_in_order(cliques: &[Option<VarSet>], order: &Order) -> Vec<(usize, VarSet)> {
    order
        .iter()
        .filter_map(|v| cliques[v].as_ref().map(|c| (v, c.clone())))
        .collect()
}
