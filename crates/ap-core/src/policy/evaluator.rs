//! Belief-utility evaluator.
//!
//! The utility of vector `i` at belief `b` is the inner product
//! `u[i] = Σ_j v[i][j] · b[j]`, accumulated in coefficient order. Evaluation
//! is pure and costs O(N·S). Non-finite inputs propagate under IEEE rules.

use ap_common::{Error, Result};
use ap_math::dot;

use super::store::AlphaVectorSet;

/// Fail with [`Error::Dimension`] unless `belief` has one entry per hidden
/// state of `set`.
pub fn check_dimension(set: &AlphaVectorSet, belief: &[f64]) -> Result<()> {
    if belief.len() != set.dimension() {
        return Err(Error::Dimension {
            expected: set.dimension(),
            actual: belief.len(),
        });
    }
    Ok(())
}

/// Utility of every vector at `belief`, in load order.
///
/// An empty set yields an empty sequence.
pub fn utilities(set: &AlphaVectorSet, belief: &[f64]) -> Result<Vec<f64>> {
    check_dimension(set, belief)?;
    Ok(set.rows().map(|row| dot(row, belief)).collect())
}

/// Utility of a single vector, or `None` if `index` is out of range.
pub fn utility_of(set: &AlphaVectorSet, index: usize, belief: &[f64]) -> Result<Option<f64>> {
    check_dimension(set, belief)?;
    Ok(set.get(index).map(|v| dot(v.coefficients, belief)))
}
