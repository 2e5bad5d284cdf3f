//! Deterministic arg-max with first-occurrence tie-breaking.

use serde::{Deserialize, Serialize};

/// Position and value of a maximum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArgMax {
    /// Index of the winning element.
    pub index: usize,
    /// The winning value.
    pub value: f64,
}

/// First index achieving the maximum of `values`.
///
/// Returns `None` for empty input. Ties keep the earliest index. A later
/// element replaces the incumbent only when it compares strictly greater, so
/// a NaN incumbent is never displaced and NaN challengers never win.
pub fn argmax_first(values: &[f64]) -> Option<ArgMax> {
    argmax_first_indexed(values.iter().copied().enumerate())
}

/// Same as [`argmax_first`] over `(index, value)` pairs in iteration order.
///
/// Used when the candidate pool is a filtered subset of a larger table and the
/// reported index must refer to the original position.
pub fn argmax_first_indexed<I>(pairs: I) -> Option<ArgMax>
where
    I: IntoIterator<Item = (usize, f64)>,
{
    let mut iter = pairs.into_iter();
    let (index, value) = iter.next()?;
    let mut best = ArgMax { index, value };
    for (index, value) in iter {
        if value > best.value {
            best = ArgMax { index, value };
        }
    }
    Some(best)
}
