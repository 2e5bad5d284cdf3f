//! Fuzz target for alphaplan.json parsing and validation.
//!
//! Tests that config parsing and semantic validation handle arbitrary input
//! without panicking.

#![no_main]

use ap_config::validate::validate_config;
use ap_core::config::parse_config;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(config) = parse_config(data) {
        let _ = validate_config(&config);
    }
});
