//! Action selector.
//!
//! Picks the vector with maximal utility at a belief and reports its stored
//! action. Ties go to the vector loaded first. Checks run in a fixed order:
//! empty set, then belief dimension, then the observable-state pool.

use ap_common::{Error, Result};
use ap_math::{argmax_first_indexed, dot};
use serde::{Deserialize, Serialize};

use super::evaluator::check_dimension;
use super::store::AlphaVectorSet;

/// Outcome of a selection, in the set's own zero-based indexing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    /// Zero-based action stored on the winning vector.
    pub action: u32,
    /// Utility of the winning vector.
    pub value: f64,
    /// Position of the winning vector in load order.
    pub vector_index: usize,
}

/// Best action over all vectors.
///
/// Utilities are compared with a strict `>`, so a NaN utility never
/// displaces the incumbent. A NaN vector wins only when it comes first in
/// the pool; otherwise it is skipped and `value` is the maximum of the
/// remaining utilities.
pub fn select(set: &AlphaVectorSet, belief: &[f64]) -> Result<Selection> {
    if set.is_empty() {
        return Err(Error::PolicyEmpty);
    }
    check_dimension(set, belief)?;

    let best = argmax_first_indexed(set.iter().map(|v| (v.index, dot(v.coefficients, belief))))
        .ok_or(Error::PolicyEmpty)?;
    selection_at(set, best.index, best.value)
}

/// Best action among vectors tagged with `observed_state`.
///
/// NaN utilities are handled as in [`select`].
///
/// Fails with [`Error::Domain`] when no vector carries that tag, which
/// includes every query against an untagged set.
pub fn select_observed(
    set: &AlphaVectorSet,
    belief: &[f64],
    observed_state: u32,
) -> Result<Selection> {
    if set.is_empty() {
        return Err(Error::PolicyEmpty);
    }
    check_dimension(set, belief)?;

    let pool = set
        .iter()
        .filter(|v| v.observable_state == Some(observed_state))
        .map(|v| (v.index, dot(v.coefficients, belief)));
    let best = argmax_first_indexed(pool).ok_or_else(|| Error::Domain {
        observed_state,
        available: set.observable_states(),
    })?;
    selection_at(set, best.index, best.value)
}

fn selection_at(set: &AlphaVectorSet, index: usize, value: f64) -> Result<Selection> {
    let action = set.action(index).ok_or(Error::PolicyEmpty)?;
    Ok(Selection {
        action,
        value,
        vector_index: index,
    })
}
