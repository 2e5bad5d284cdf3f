//! Property-based tests for ap-math numerical functions.
//!
//! Uses proptest to verify linear-algebra and arg-max properties hold across
//! many random inputs.

use ap_math::{argmax_first, argmax_first_indexed, dot, is_distribution, mat_vec, normalize};
use proptest::prelude::*;

/// Tolerance for floating point comparisons.
const TOL: f64 = 1e-9;

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol.max(tol * a.abs().max(b.abs()))
}

fn vec_pair(max_len: usize) -> impl Strategy<Value = (Vec<f64>, Vec<f64>)> {
    (1..=max_len).prop_flat_map(|n| {
        (
            prop::collection::vec(-100.0..100.0f64, n),
            prop::collection::vec(-100.0..100.0f64, n),
        )
    })
}

// ============================================================================
// dot properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// dot is commutative up to rounding.
    #[test]
    fn dot_commutative((a, b) in vec_pair(16)) {
        prop_assert!(approx_eq(dot(&a, &b), dot(&b, &a), TOL));
    }

    /// dot scales linearly in its second argument.
    #[test]
    fn dot_linear((a, b) in vec_pair(16), k in -10.0..10.0f64) {
        let scaled: Vec<f64> = b.iter().map(|v| v * k).collect();
        prop_assert!(approx_eq(dot(&a, &scaled), k * dot(&a, &b), 1e-7));
    }

    /// mat_vec agrees with row-by-row dot products.
    #[test]
    fn mat_vec_matches_rows(rows in 1usize..8, (x, _) in vec_pair(6), seed in prop::collection::vec(-10.0..10.0f64, 48)) {
        let s = x.len();
        let matrix: Vec<f64> = seed.iter().cycle().take(rows * s).copied().collect();
        let out = mat_vec(&matrix, &x);
        prop_assert_eq!(out.len(), rows);
        for (i, row) in matrix.chunks_exact(s).enumerate() {
            prop_assert_eq!(out[i], dot(row, &x));
        }
    }
}

// ============================================================================
// argmax properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// The reported value is the true maximum and no earlier element equals it.
    #[test]
    fn argmax_is_first_maximum(values in prop::collection::vec(-5i32..5, 1..32)) {
        let values: Vec<f64> = values.into_iter().map(f64::from).collect();
        let m = argmax_first(&values).unwrap();
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        prop_assert_eq!(m.value, max);
        prop_assert_eq!(values[m.index], max);
        prop_assert!(values[..m.index].iter().all(|v| *v < max));
    }

    /// Filtering then arg-maxing reports an index from the filtered pool.
    #[test]
    fn indexed_argmax_stays_in_pool(values in prop::collection::vec(-100.0..100.0f64, 1..32), keep_even in any::<bool>()) {
        let parity = usize::from(!keep_even);
        let pool = values.iter().copied().enumerate().filter(|(i, _)| i % 2 == parity);
        if let Some(m) = argmax_first_indexed(pool) {
            prop_assert_eq!(m.index % 2, parity);
        } else {
            prop_assert!(values.len() == 1 && parity == 1);
        }
    }
}

// ============================================================================
// distribution properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// normalize produces a distribution for any positive-mass input.
    #[test]
    fn normalize_yields_distribution(weights in prop::collection::vec(0.01..100.0f64, 1..16)) {
        let p = normalize(&weights).unwrap();
        prop_assert!(is_distribution(&p, 1e-9));
    }
}
