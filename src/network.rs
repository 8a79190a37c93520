//! Discrete Bayesian networks: the factors the junction tree consumes.
//!
//! The engine only needs four things from a model, captured by [`Model`]:
//! how many variables there are, each variable's cardinality, its parents,
//! and the conditional probability of a value given its parents' values.
//! [`BayesNet`] is the concrete implementation used by the rest of the crate.

use std::fmt;

use log::debug;

use crate::error::{InferenceError, Result};

/// Allowed deviation from one when checking that a table row is a distribution.
pub const ROW_TOLERANCE: f64 = 1e-9;

/// Source of variables and conditional probability factors.
pub trait Model {
    /// Number of variables; ids are `0..num_variables()`.
    fn num_variables(&self) -> usize;

    /// Number of states of `variable`.
    fn cardinality(&self, variable: usize) -> usize;

    /// Conditioning parents of `variable`, in factor order.
    fn parents(&self, variable: usize) -> &[usize];

    /// `P(variable = value | parents = parent_values)`.
    ///
    /// `parent_values[i]` is the value of `self.parents(variable)[i]`.
    fn probability(&self, variable: usize, value: usize, parent_values: &[usize]) -> f64;
}

/// Conditional probability table for a single variable.
///
/// The table is row-major: one row per joint parent configuration (first
/// parent most significant), and within a row one entry per value of the
/// variable itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Cpt {
    parents: Vec<usize>,
    parent_cardinalities: Vec<usize>,
    cardinality: usize,
    table: Vec<f64>,
}

impl Cpt {
    /// Creates a table, checking its size and that every row sums to one.
    pub fn new(
        variable: usize,
        cardinality: usize,
        parents: Vec<(usize, usize)>,
        table: Vec<f64>,
        tolerance: f64,
    ) -> Result<Self> {
        let invalid = |reason: String| InferenceError::InvalidFactor { variable, reason };

        if cardinality == 0 {
            return Err(invalid("cardinality must be positive".to_string()));
        }
        let (parent_ids, parent_cardinalities): (Vec<usize>, Vec<usize>) =
            parents.into_iter().unzip();
        if parent_ids.contains(&variable) {
            return Err(invalid("variable lists itself as a parent".to_string()));
        }
        if parent_cardinalities.contains(&0) {
            return Err(invalid("parent cardinality must be positive".to_string()));
        }
        let rows = parent_cardinalities
            .iter()
            .try_fold(1usize, |acc, &c| acc.checked_mul(c))
            .ok_or_else(|| invalid("parent configuration count overflows".to_string()))?;
        let expected = rows
            .checked_mul(cardinality)
            .ok_or_else(|| invalid("table size overflows".to_string()))?;
        if table.len() != expected {
            return Err(invalid(format!(
                "table has {} entries, expected {}",
                table.len(),
                expected
            )));
        }
        for (row, chunk) in table.chunks(cardinality).enumerate() {
            if chunk.iter().any(|p| !p.is_finite() || *p < 0.0) {
                return Err(invalid(format!("row {} has a negative or non-finite entry", row)));
            }
            let sum: f64 = chunk.iter().sum();
            if (sum - 1.0).abs() > tolerance {
                return Err(invalid(format!("row {} sums to {}", row, sum)));
            }
        }

        Ok(Self {
            parents: parent_ids,
            parent_cardinalities,
            cardinality,
            table,
        })
    }

    /// A parentless table with every value equally likely.
    pub fn uniform(cardinality: usize) -> Self {
        let p = 1.0 / cardinality as f64;
        Self {
            parents: Vec::new(),
            parent_cardinalities: Vec::new(),
            cardinality,
            table: vec![p; cardinality],
        }
    }

    pub fn parents(&self) -> &[usize] {
        &self.parents
    }

    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    pub fn table(&self) -> &[f64] {
        &self.table
    }

    /// Row index of a parent configuration.
    fn row(&self, parent_values: &[usize]) -> usize {
        debug_assert_eq!(parent_values.len(), self.parent_cardinalities.len());
        parent_values
            .iter()
            .zip(self.parent_cardinalities.iter())
            .fold(0, |acc, (&v, &c)| acc * c + v)
    }

    /// `P(value | parent_values)`.
    pub fn get(&self, value: usize, parent_values: &[usize]) -> f64 {
        self.table[self.row(parent_values) * self.cardinality + value]
    }
}

/// A Bayesian network over discrete variables.
#[derive(Debug, Clone, Default)]
pub struct BayesNet {
    names: Vec<String>,
    cpts: Vec<Cpt>,
}

impl BayesNet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable with a uniform prior and returns its id.
    pub fn add_variable(&mut self, name: impl Into<String>, cardinality: usize) -> usize {
        assert!(cardinality > 0, "Cardinality must be positive");
        let id = self.cpts.len();
        self.names.push(name.into());
        self.cpts.push(Cpt::uniform(cardinality));
        id
    }

    /// Replaces the table of `variable`.
    ///
    /// `parents` lists parent ids; their cardinalities are taken from the
    /// network, so parents must be added before their children's tables.
    pub fn set_cpt(&mut self, variable: usize, parents: &[usize], table: Vec<f64>) -> Result<()> {
        self.check_variable(variable)?;
        let mut with_cards = Vec::with_capacity(parents.len());
        for &p in parents {
            self.check_variable(p)?;
            with_cards.push((p, self.cpts[p].cardinality()));
        }
        let cardinality = self.cpts[variable].cardinality();
        let cpt = Cpt::new(variable, cardinality, with_cards, table, ROW_TOLERANCE)?;
        debug!(
            "set_cpt(variable = {}, parents = {:?})",
            variable,
            cpt.parents()
        );
        self.cpts[variable] = cpt;
        Ok(())
    }

    pub fn cpt(&self, variable: usize) -> &Cpt {
        &self.cpts[variable]
    }

    pub fn name(&self, variable: usize) -> &str {
        &self.names[variable]
    }

    /// Looks up a variable id by name.
    pub fn variable(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    fn check_variable(&self, variable: usize) -> Result<()> {
        if variable >= self.cpts.len() {
            return Err(InferenceError::InvalidVariable {
                variable,
                count: self.cpts.len(),
            });
        }
        Ok(())
    }

    /// Checks that parent cardinalities agree with the network and that the
    /// parent relation is acyclic.
    pub fn validate(&self) -> Result<()> {
        for (v, cpt) in self.cpts.iter().enumerate() {
            for (&p, &c) in cpt.parents.iter().zip(cpt.parent_cardinalities.iter()) {
                self.check_variable(p)?;
                if self.cpts[p].cardinality() != c {
                    return Err(InferenceError::InvalidFactor {
                        variable: v,
                        reason: format!(
                            "parent {} has cardinality {}, table assumes {}",
                            p,
                            self.cpts[p].cardinality(),
                            c
                        ),
                    });
                }
            }
        }

        check_model(self)
    }
}

/// Checks the parent structure of any model.
///
/// Every parent id must be a variable of the model other than the child,
/// every cardinality must be positive, and the parent relation must be
/// acyclic.
pub fn check_model<M: Model + ?Sized>(model: &M) -> Result<()> {
    let n = model.num_variables();
    let invalid = |variable: usize, reason: String| InferenceError::InvalidFactor { variable, reason };

    for v in 0..n {
        if model.cardinality(v) == 0 {
            return Err(invalid(v, "cardinality must be positive".to_string()));
        }
        for &p in model.parents(v) {
            if p >= n {
                return Err(invalid(
                    v,
                    format!("parent {} is not a variable (model has {})", p, n),
                ));
            }
            if p == v {
                return Err(invalid(v, "variable lists itself as a parent".to_string()));
            }
        }
    }

    // Kahn's algorithm over child -> parent edges.
    let mut pending: Vec<usize> = (0..n).map(|v| model.parents(v).len()).collect();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    for v in 0..n {
        for &p in model.parents(v) {
            children[p].push(v);
        }
    }
    let mut ready: Vec<usize> = (0..n).filter(|&v| pending[v] == 0).collect();
    let mut seen = 0;
    while let Some(v) = ready.pop() {
        seen += 1;
        for &c in &children[v] {
            pending[c] -= 1;
            if pending[c] == 0 {
                ready.push(c);
            }
        }
    }
    if seen != n {
        let culprit = (0..n).find(|&v| pending[v] > 0).unwrap_or(0);
        return Err(invalid(culprit, "parent relation contains a cycle".to_string()));
    }
    Ok(())
}

impl Model for BayesNet {
    fn num_variables(&self) -> usize {
        self.cpts.len()
    }

    fn cardinality(&self, variable: usize) -> usize {
        self.cpts[variable].cardinality()
    }

    fn parents(&self, variable: usize) -> &[usize] {
        self.cpts[variable].parents()
    }

    fn probability(&self, variable: usize, value: usize, parent_values: &[usize]) -> f64 {
        self.cpts[variable].get(value, parent_values)
    }
}

impl fmt::Display for BayesNet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (v, cpt) in self.cpts.iter().enumerate() {
            write!(f, "{}({})", self.names[v], cpt.cardinality())?;
            if !cpt.parents.is_empty() {
                let parents: Vec<&str> = cpt.parents.iter().map(|&p| self.names[p].as_str()).collect();
                write!(f, " | {}", parents.join(", "))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
