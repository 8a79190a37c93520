//! Tarjan-Yannakakis fill-in.
//!
//! Walking the order backwards, every pair of earlier-ordered neighbors of
//! the current variable is connected. Afterwards the order is a perfect
//! elimination order of the filled graph, so the graph is chordal.

use log::debug;

use crate::graph::Graph;
use crate::order::Order;
use crate::varset::VarSet;

/// Neighbors of `v` that come before it in `order`.
pub(crate) fn earlier_neighbors(graph: &Graph, order: &Order, v: usize) -> VarSet {
    graph
        .neighbors(v)
        .iter()
        .filter(|&w| order.precedes(w, v))
        .collect()
}

/// Adds fill-in edges to `graph` along `order`. Returns the number of edges added.
///
/// Only adds edges, never removes them.
pub fn fill_in(graph: &mut Graph, order: &Order) -> usize {
    assert_eq!(graph.len(), order.len(), "Order must cover every variable");

    let mut added = 0;
    for v in order.iter().rev() {
        let earlier: Vec<usize> = earlier_neighbors(graph, order, v).to_vec();
        for (i, &a) in earlier.iter().enumerate() {
            for &b in &earlier[i + 1..] {
                if graph.add_edge(a, b) {
                    debug!("fill in {} -- {} (eliminating {})", a, b, v);
                    added += 1;
                }
            }
        }
    }
    added
}

/// Returns true if `order` is a perfect elimination order of `graph`.
pub fn is_perfect_elimination_order(graph: &Graph, order: &Order) -> bool {
    order
        .iter()
        .all(|v| graph.is_complete(&earlier_neighbors(graph, order, v)))
}

#[cfg(test)]
mod tests {
    use test_log::test;

    use super::*;
    use crate::order::max_cardinality_order;

    fn cycle(n: usize) -> Graph {
        let mut g = Graph::new(n);
        for v in 0..n {
            g.add_edge(v, (v + 1) % n);
        }
        g
    }

    #[test]
    fn test_tree_needs_no_fill() {
        let mut g = Graph::new(4);
        g.add_edge(0, 1);
        g.add_edge(1, 2);
        g.add_edge(1, 3);
        let order = max_cardinality_order(&g);
        assert_eq!(fill_in(&mut g, &order), 0);
        assert!(is_perfect_elimination_order(&g, &order));
    }

    #[test]
    fn test_square_gets_one_chord() {
        let original = cycle(4);
        let mut g = original.clone();
        let order = max_cardinality_order(&g);
        assert!(!is_perfect_elimination_order(&g, &order));

        assert_eq!(fill_in(&mut g, &order), 1);
        assert_eq!(g.edge_count(), 5);
        assert!(original.is_subgraph_of(&g));
        assert!(is_perfect_elimination_order(&g, &order));
    }

    #[test]
    fn test_long_cycle_becomes_chordal() {
        for n in 4..9 {
            let original = cycle(n);
            let mut g = original.clone();
            let order = max_cardinality_order(&g);
            let added = fill_in(&mut g, &order);
            assert_eq!(added, n - 3, "cycle of length {}", n);
            assert!(original.is_subgraph_of(&g));

            let reorder = max_cardinality_order(&g);
            assert!(is_perfect_elimination_order(&g, &reorder));
        }
    }
}
