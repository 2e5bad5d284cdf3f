//! Fuzz target for action selection over arbitrary vector sets.
//!
//! Builds a set from fuzzer-chosen coefficients and queries it with a
//! fuzzer-chosen belief. Dimension mismatches, NaN and infinities must
//! surface as `Err` or a well-formed selection, never a panic.

#![no_main]

use ap_core::policy::{select, select_observed, AlphaVector, AlphaVectorSet};
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    dimension: u8,
    vectors: Vec<(u8, Option<u8>, Vec<f64>)>,
    belief: Vec<f64>,
    observed: Option<u8>,
}

fuzz_target!(|input: Input| {
    let dimension = usize::from(input.dimension % 16);
    let vectors = input
        .vectors
        .into_iter()
        .take(64)
        .map(|(action, obs, coefficients)| {
            let v = AlphaVector::new(u32::from(action), coefficients);
            match obs {
                Some(state) => v.observed(u32::from(state % 4)),
                None => v,
            }
        })
        .collect();

    let Ok(set) = AlphaVectorSet::new(dimension, vectors) else {
        return;
    };
    let result = match input.observed {
        Some(state) => select_observed(&set, &input.belief, u32::from(state % 4)),
        None => select(&set, &input.belief),
    };
    if let Ok(selection) = result {
        assert!(selection.vector_index < set.len());
    }
});
