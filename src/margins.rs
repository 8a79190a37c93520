//! Per-variable marginal distributions.

use std::fmt;
use std::ops::Index;

/// One probability vector per variable, indexed by variable id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Margins {
    values: Vec<Vec<f64>>,
}

impl Margins {
    pub fn new(values: Vec<Vec<f64>>) -> Self {
        Self { values }
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Distribution of `variable`, or `None` if out of range.
    pub fn get(&self, variable: usize) -> Option<&[f64]> {
        self.values.get(variable).map(|m| m.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.values.iter().map(|m| m.as_slice())
    }

    /// Largest absolute difference between corresponding probabilities.
    ///
    /// Returns `f64::INFINITY` if the shapes differ.
    pub fn max_abs_diff(&self, other: &Margins) -> f64 {
        if self.values.len() != other.values.len() {
            return f64::INFINITY;
        }
        let mut diff: f64 = 0.0;
        for (a, b) in self.values.iter().zip(&other.values) {
            if a.len() != b.len() {
                return f64::INFINITY;
            }
            for (x, y) in a.iter().zip(b) {
                diff = diff.max((x - y).abs());
            }
        }
        diff
    }
}

impl Index<usize> for Margins {
    type Output = [f64];

    fn index(&self, variable: usize) -> &[f64] {
        &self.values[variable]
    }
}

impl fmt::Display for Margins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (v, m) in self.values.iter().enumerate() {
            write!(f, "{}:", v)?;
            for p in m {
                write!(f, " {:.4}", p)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
