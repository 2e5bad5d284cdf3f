//! Fuzz target for alpha-vector policy parsing.
//!
//! Tests that `AlphaVectorSet::from_xml_str` handles arbitrary input without
//! panicking. Policy files are written by an external solver and may be
//! truncated or corrupted.

#![no_main]

use ap_core::policy::AlphaVectorSet;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Malformed documents must come back as errors
    let _ = AlphaVectorSet::from_xml_str(data);
});
