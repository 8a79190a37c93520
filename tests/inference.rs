use test_log::test;

use junction_rs::cliques::maximal_cliques;
use junction_rs::index::MixedRadix;
use junction_rs::order::max_cardinality_order;
use junction_rs::triangulate::fill_in;
use junction_rs::{BayesNet, Graph, InferenceError, JunctionTree, MarginCalculator, Margins, Model};

const EPS: f64 = 1e-9;

/// Marginals by summing the full joint, restricted to `evidence`.
fn brute_force(net: &BayesNet, evidence: &[(usize, usize)]) -> Margins {
    let n = net.num_variables();
    let layout = MixedRadix::new((0..n).map(|v| net.cardinality(v)).collect()).unwrap();
    let mut margins: Vec<Vec<f64>> = (0..n).map(|v| vec![0.0; net.cardinality(v)]).collect();
    let mut odometer = layout.odometer();
    loop {
        let values = odometer.values();
        if evidence.iter().all(|&(v, x)| values[v] == x) {
            let mut p = 1.0;
            for v in 0..n {
                let parent_values: Vec<usize> = net.parents(v).iter().map(|&u| values[u]).collect();
                p *= net.probability(v, values[v], &parent_values);
            }
            for v in 0..n {
                margins[v][values[v]] += p;
            }
        }
        if !odometer.advance() {
            break;
        }
    }
    for m in &mut margins {
        let total: f64 = m.iter().sum();
        m.iter_mut().for_each(|x| *x /= total);
    }
    Margins::new(margins)
}

fn chain() -> BayesNet {
    let mut net = BayesNet::new();
    let a = net.add_variable("A", 2);
    let b = net.add_variable("B", 2);
    let c = net.add_variable("C", 2);
    net.set_cpt(b, &[a], vec![0.8, 0.2, 0.2, 0.8]).unwrap();
    net.set_cpt(c, &[b], vec![0.8, 0.2, 0.2, 0.8]).unwrap();
    net
}

/// A -> B, A -> C, B -> D, C -> D with a ternary C.
fn diamond() -> BayesNet {
    let mut net = BayesNet::new();
    let a = net.add_variable("A", 2);
    let b = net.add_variable("B", 2);
    let c = net.add_variable("C", 3);
    let d = net.add_variable("D", 2);
    net.set_cpt(a, &[], vec![0.3, 0.7]).unwrap();
    net.set_cpt(b, &[a], vec![0.7, 0.3, 0.2, 0.8]).unwrap();
    net.set_cpt(c, &[a], vec![0.5, 0.3, 0.2, 0.1, 0.1, 0.8]).unwrap();
    net.set_cpt(
        d,
        &[b, c],
        vec![0.9, 0.1, 0.6, 0.4, 0.5, 0.5, 0.3, 0.7, 0.2, 0.8, 0.01, 0.99],
    )
    .unwrap();
    net
}

/// The "Asia" chest-clinic network: loopy, eight binary variables.
fn asia() -> BayesNet {
    let mut net = BayesNet::new();
    let asia = net.add_variable("asia", 2);
    let smoke = net.add_variable("smoke", 2);
    let tub = net.add_variable("tub", 2);
    let lung = net.add_variable("lung", 2);
    let bronc = net.add_variable("bronc", 2);
    let either = net.add_variable("either", 2);
    let xray = net.add_variable("xray", 2);
    let dysp = net.add_variable("dysp", 2);
    net.set_cpt(asia, &[], vec![0.99, 0.01]).unwrap();
    net.set_cpt(smoke, &[], vec![0.5, 0.5]).unwrap();
    net.set_cpt(tub, &[asia], vec![0.99, 0.01, 0.95, 0.05]).unwrap();
    net.set_cpt(lung, &[smoke], vec![0.99, 0.01, 0.9, 0.1]).unwrap();
    net.set_cpt(bronc, &[smoke], vec![0.7, 0.3, 0.4, 0.6]).unwrap();
    // Logical OR.
    net.set_cpt(either, &[tub, lung], vec![1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0])
        .unwrap();
    net.set_cpt(xray, &[either], vec![0.95, 0.05, 0.02, 0.98]).unwrap();
    net.set_cpt(dysp, &[either, bronc], vec![0.9, 0.1, 0.2, 0.8, 0.3, 0.7, 0.1, 0.9])
        .unwrap();
    net.validate().unwrap();
    net
}

fn assert_one_hot(margin: &[f64], value: usize) {
    for (x, &p) in margin.iter().enumerate() {
        let expected = if x == value { 1.0 } else { 0.0 };
        assert!((p - expected).abs() < EPS, "{:?} is not one-hot at {}", margin, value);
    }
}

fn assert_close(actual: &Margins, expected: &Margins) {
    let diff = actual.max_abs_diff(expected);
    assert!(diff < EPS, "max diff {}\nactual:\n{}expected:\n{}", diff, actual, expected);
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_chain_scenario() {
    let matrix = vec![
        vec![false, true, false],
        vec![true, false, true],
        vec![false, true, false],
    ];
    let mut engine = MarginCalculator::new(chain());
    let margins = engine.process(&matrix).unwrap();
    for v in 0..3 {
        assert!((margins[v][0] - 0.5).abs() < 1e-6);
        assert!((margins[v][1] - 0.5).abs() < 1e-6);
    }

    let margins = engine.set_evidence(0, 0).unwrap();
    assert_one_hot(&margins[0], 0);
    assert!((margins[1][0] - 0.8).abs() < 1e-6);
    assert!((margins[1][1] - 0.2).abs() < 1e-6);
    assert!((margins[2][0] - 0.68).abs() < 1e-6);
    assert!((margins[2][1] - 0.32).abs() < 1e-6);
    assert_eq!(engine.margin(2).unwrap(), &margins[2]);
}

#[test]
fn test_disconnected_variables_stay_independent() {
    let mut net = BayesNet::new();
    net.add_variable("X", 2);
    net.add_variable("Y", 2);
    let mut engine = MarginCalculator::new(net);
    engine.process(&[vec![false; 2], vec![false; 2]]).unwrap();
    assert_eq!(engine.tree().unwrap().roots().len(), 2);

    let margins = engine.set_evidence(0, 1).unwrap();
    assert_one_hot(&margins[0], 1);
    assert!((margins[1][0] - 0.5).abs() < 1e-12);
    assert!((margins[1][1] - 0.5).abs() < 1e-12);
}

#[test]
fn test_diamond_matches_brute_force() {
    let net = diamond();
    let mut engine = MarginCalculator::new(net.clone());
    let margins = engine.process_model().unwrap();
    assert_close(&margins, &brute_force(&net, &[]));

    let margins = engine.set_evidence(3, 1).unwrap();
    assert_close(&margins, &brute_force(&net, &[(3, 1)]));

    let margins = engine.set_evidence(2, 0).unwrap();
    assert_close(&margins, &brute_force(&net, &[(3, 1), (2, 0)]));
}

#[test]
fn test_asia_matches_brute_force() {
    let net = asia();
    let mut engine = MarginCalculator::new(net.clone());
    let margins = engine.process_model().unwrap();
    assert_close(&margins, &brute_force(&net, &[]));

    let mut evidence = Vec::new();
    for (v, x) in [(7, 1), (0, 1), (6, 0), (1, 1)] {
        evidence.push((v, x));
        let margins = engine.set_evidence(v, x).unwrap();
        assert_close(&margins, &brute_force(&net, &evidence));
    }
}

#[test]
fn test_evidence_order_does_not_matter() {
    let net = asia();
    let mut forward = MarginCalculator::new(net.clone());
    forward.process_model().unwrap();
    forward.set_evidence(7, 1).unwrap();
    let a = forward.set_evidence(6, 1).unwrap();

    let mut backward = MarginCalculator::new(net);
    backward.process_model().unwrap();
    backward.set_evidence(6, 1).unwrap();
    let b = backward.set_evidence(7, 1).unwrap();

    assert_close(&a, &b);
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_margins_sum_to_one() {
    for net in [chain(), diamond(), asia()] {
        let mut engine = MarginCalculator::new(net);
        let margins = engine.process_model().unwrap();
        for m in margins.iter() {
            let total: f64 = m.iter().sum();
            assert!((total - 1.0).abs() < EPS);
        }
    }
}

#[test]
fn test_repeated_propagation_is_idempotent() {
    let mut engine = MarginCalculator::new(asia());
    let first = engine.process_model().unwrap();
    let second = engine.process_model().unwrap();
    assert_eq!(first, second);

    let mut tree = engine.tree().unwrap().clone();
    tree.propagate().unwrap();
    assert_eq!(first, tree.margins());
}

#[test]
fn test_evidence_is_one_hot() {
    let mut engine = MarginCalculator::new(diamond());
    engine.process_model().unwrap();
    let margins = engine.set_evidence(2, 2).unwrap();
    assert_one_hot(&margins[2], 2);
}

#[test]
fn test_failed_evidence_restores_state() {
    let mut engine = MarginCalculator::new(asia());
    engine.process_model().unwrap();
    let before = engine.set_evidence(2, 1).unwrap();

    // tub = 1 forces either = 1.
    let err = engine.set_evidence(5, 0).unwrap_err();
    assert!(matches!(err, InferenceError::DegenerateNormalization { .. }));
    assert_eq!(engine.margins().unwrap(), &before);
    assert_eq!(engine.evidence()[5], None);

    // The restored tree still accepts consistent evidence.
    let margins = engine.set_evidence(6, 1).unwrap();
    assert_close(&margins, &brute_force(engine.model(), &[(2, 1), (6, 1)]));
}

#[test]
fn test_clear_evidence_restores_priors() {
    let net = asia();
    let mut engine = MarginCalculator::new(net.clone());
    let prior = engine.process_model().unwrap();
    engine.set_evidence(7, 1).unwrap();
    engine.set_evidence(1, 0).unwrap();
    let cleared = engine.clear_evidence().unwrap();
    assert_close(&cleared, &prior);
    assert!(engine.evidence().iter().all(Option::is_none));
}

#[test]
fn test_uninitialized_engine() {
    let mut engine = MarginCalculator::new(chain());
    assert_eq!(engine.set_evidence(0, 0), Err(InferenceError::UninitializedTree));
    assert_eq!(engine.margin(0), Err(InferenceError::UninitializedTree));
}

#[test]
fn test_invalid_queries() {
    let mut engine = MarginCalculator::new(chain());
    engine.process_model().unwrap();
    assert_eq!(
        engine.set_evidence(3, 0),
        Err(InferenceError::InvalidVariable { variable: 3, count: 3 })
    );
    assert_eq!(
        engine.set_evidence(1, 2),
        Err(InferenceError::InvalidValue {
            variable: 1,
            value: 2,
            cardinality: 2
        })
    );
}

#[test]
fn test_asymmetric_matrix_is_symmetrized() {
    // Only the upper triangle of the chain is given.
    let matrix = vec![
        vec![false, true, false],
        vec![false, false, true],
        vec![false, false, false],
    ];
    let mut engine = MarginCalculator::new(chain());
    engine.process(&matrix).unwrap();
    let margins = engine.set_evidence(0, 0).unwrap();
    assert!((margins[2][0] - 0.68).abs() < 1e-6);
}

// ============================================================================
// Structure
// ============================================================================

fn test_graphs() -> Vec<Graph> {
    let mut graphs = vec![Graph::moralize(&asia()), Graph::moralize(&diamond())];

    // 6-cycle with a pendant.
    let mut g = Graph::new(7);
    for v in 0..6 {
        g.add_edge(v, (v + 1) % 6);
    }
    g.add_edge(2, 6);
    graphs.push(g);

    // 3x3 grid.
    let mut g = Graph::new(9);
    for r in 0..3 {
        for c in 0..3 {
            if c + 1 < 3 {
                g.add_edge(r * 3 + c, r * 3 + c + 1);
            }
            if r + 1 < 3 {
                g.add_edge(r * 3 + c, (r + 1) * 3 + c);
            }
        }
    }
    graphs.push(g);
    graphs
}

#[test]
fn test_fill_in_preserves_edges() {
    for original in test_graphs() {
        let mut filled = original.clone();
        let order = max_cardinality_order(&filled);
        fill_in(&mut filled, &order);
        assert!(original.is_subgraph_of(&filled));
    }
}

#[test]
fn test_cliques_are_maximal() {
    for mut g in test_graphs() {
        let order = max_cardinality_order(&g);
        fill_in(&mut g, &order);
        let order = max_cardinality_order(&g);
        let cliques: Vec<_> = maximal_cliques(&g, &order).into_iter().flatten().collect();
        for (i, a) in cliques.iter().enumerate() {
            for (j, b) in cliques.iter().enumerate() {
                if i != j {
                    assert!(!a.is_subset(b), "{} is inside {}", a, b);
                }
            }
        }
    }
}

/// Uniform binary model over an arbitrary graph, with no parents.
struct Uniform(usize);

impl Model for Uniform {
    fn num_variables(&self) -> usize {
        self.0
    }

    fn cardinality(&self, _variable: usize) -> usize {
        2
    }

    fn parents(&self, _variable: usize) -> &[usize] {
        &[]
    }

    fn probability(&self, _variable: usize, _value: usize, _parent_values: &[usize]) -> f64 {
        0.5
    }
}

#[test]
fn test_running_intersection_on_every_path() {
    for g in test_graphs() {
        let model = Uniform(g.len());
        let tree = JunctionTree::build(&model, g, &Default::default()).unwrap();
        tree.verify_running_intersection().unwrap();

        let path_to_root = |mut c: usize| {
            let mut path = vec![c];
            while let Some(p) = tree.parent_clique(c) {
                path.push(p);
                c = p;
            }
            path
        };
        let cliques = tree.cliques();
        for i in 0..cliques.len() {
            for j in (i + 1)..cliques.len() {
                let up_i = path_to_root(i);
                let up_j = path_to_root(j);
                let Some(&meet) = up_i.iter().find(|c| up_j.contains(c)) else {
                    continue;
                };
                let path: Vec<usize> = up_i
                    .iter()
                    .take_while(|&&c| c != meet)
                    .chain(up_j.iter().take_while(|&&c| c != meet))
                    .chain(std::iter::once(&meet))
                    .copied()
                    .collect();
                for &v in cliques[i].variables() {
                    if cliques[j].contains(v) {
                        for &k in &path {
                            assert!(cliques[k].contains(v), "variable {} missing on path {:?}", v, path);
                        }
                    }
                }
            }
        }
    }
}

#[test]
fn test_custom_model_on_grid() {
    let g = test_graphs().pop().unwrap();
    let mut engine = MarginCalculator::new(Uniform(9));
    let margins = engine.process_graph(g).unwrap();
    assert_eq!(margins.len(), 9);
    let margins = engine.set_evidence(4, 1).unwrap();
    assert!((margins[0][1] - 0.5).abs() < 1e-12);
}

#[test]
fn test_trees_are_shareable() {
    fn assert_send_sync<T: Send + Sync + Clone>() {}
    assert_send_sync::<JunctionTree>();
    assert_send_sync::<MarginCalculator<BayesNet>>();

    let mut engine = MarginCalculator::new(asia());
    engine.process_model().unwrap();
    let tree = engine.tree().unwrap().clone();
    let handle = std::thread::spawn(move || tree.margins());
    assert_eq!(&handle.join().unwrap(), engine.margins().unwrap());
}
