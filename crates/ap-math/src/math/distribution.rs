//! Helpers for finite discrete probability distributions.

/// Default tolerance when checking that a distribution sums to one.
pub const DEFAULT_MASS_TOLERANCE: f64 = 1e-6;

/// Sum of all entries.
pub fn total_mass(p: &[f64]) -> f64 {
    p.iter().sum()
}

/// Whether `p` is a probability distribution within `tol`.
///
/// Every entry must be finite and non-negative, and the entries must sum to
/// one within `tol`. Empty input is not a distribution.
pub fn is_distribution(p: &[f64], tol: f64) -> bool {
    if p.is_empty() {
        return false;
    }
    if p.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return false;
    }
    (total_mass(p) - 1.0).abs() <= tol
}

/// Rescale `p` so that it sums to one.
///
/// Returns `None` when the total mass is zero, negative or not finite.
pub fn normalize(p: &[f64]) -> Option<Vec<f64>> {
    let mass = total_mass(p);
    if !mass.is_finite() || mass <= 0.0 {
        return None;
    }
    Some(p.iter().map(|v| v / mass).collect())
}

/// Uniform distribution over `n` outcomes. Empty when `n == 0`.
pub fn uniform(n: usize) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    vec![1.0 / n as f64; n]
}
