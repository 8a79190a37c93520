//! Initial clique potentials.
//!
//! Every conditional probability factor is multiplied into exactly one
//! clique: the first clique, in elimination order, that holds the variable
//! together with all of its parents. A clique that claims no factor starts
//! out as all ones.

use log::debug;

use crate::error::{InferenceError, Result};
use crate::index::MixedRadix;
use crate::network::Model;
use crate::varset::VarSet;

/// For every clique (given in elimination order), the variables whose
/// factors it claims.
pub fn assign_factors<M: Model + ?Sized>(model: &M, cliques: &[VarSet]) -> Result<Vec<Vec<usize>>> {
    let n = model.num_variables();
    let mut done = vec![false; n];
    let mut claimed = vec![Vec::new(); cliques.len()];

    for (i, clique) in cliques.iter().enumerate() {
        for v in clique.iter() {
            if done[v] {
                continue;
            }
            if model.parents(v).iter().all(|&p| clique.contains(p)) {
                debug!("clique {} claims the factor of {}", clique, v);
                done[v] = true;
                claimed[i].push(v);
            }
        }
    }

    if let Some(v) = done.iter().position(|&d| !d) {
        return Err(InferenceError::StructuralInvariantViolation(format!(
            "no clique holds variable {} together with its parents {:?}",
            v,
            model.parents(v)
        )));
    }

    Ok(claimed)
}

/// Product of the claimed factors over the clique's joint state space.
///
/// `variables` are the clique members in table order and `layout` their
/// mixed-radix layout.
pub fn initial_potential<M: Model + ?Sized>(
    model: &M,
    variables: &[usize],
    layout: &MixedRadix,
    claimed: &[usize],
) -> Result<Vec<f64>> {
    let position = |var: usize| {
        variables.iter().position(|&w| w == var).ok_or_else(|| {
            InferenceError::StructuralInvariantViolation(format!(
                "claimed factor mentions {} outside clique {:?}",
                var, variables
            ))
        })
    };
    // (variable, its position, parent positions) per claimed factor
    let mut factors: Vec<(usize, usize, Vec<usize>)> = Vec::with_capacity(claimed.len());
    for &v in claimed {
        let parent_pos = model
            .parents(v)
            .iter()
            .map(|&p| position(p))
            .collect::<Result<Vec<_>>>()?;
        factors.push((v, position(v)?, parent_pos));
    }

    let mut table = Vec::with_capacity(layout.size());
    let mut parent_values = Vec::new();
    let mut odometer = layout.odometer();
    loop {
        let values = odometer.values();
        let mut p = 1.0;
        for (v, pos, parent_pos) in &factors {
            parent_values.clear();
            parent_values.extend(parent_pos.iter().map(|&i| values[i]));
            p *= model.probability(*v, values[*pos], &parent_values);
        }
        table.push(p);
        if !odometer.advance() {
            break;
        }
    }
    Ok(table)
}
