//! Inner products over dense coefficient slices.

/// Inner product of two equal-length slices.
///
/// Terms are accumulated left to right with plain `f64` arithmetic, so NaN
/// and infinite inputs propagate under IEEE rules. Callers are responsible for
/// the length check; extra elements in the longer slice are ignored.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "dot product of mismatched slices");
    let mut sum = 0.0;
    for (x, y) in a.iter().zip(b) {
        sum += x * y;
    }
    sum
}

/// Inner product of every row of a row-major matrix with `x`.
///
/// `matrix.len()` must be a multiple of `x.len()`. Returns an empty vector
/// when `x` is empty.
pub fn mat_vec(matrix: &[f64], x: &[f64]) -> Vec<f64> {
    if x.is_empty() {
        return Vec::new();
    }
    debug_assert_eq!(matrix.len() % x.len(), 0, "matrix is not row-aligned");
    matrix.chunks_exact(x.len()).map(|row| dot(row, x)).collect()
}
