//! Fuzz target for belief dynamics tables.
//!
//! Tests that `DiscreteDynamics::new` rejects ragged or non-stochastic
//! tables and that updates on accepted tables never panic.

#![no_main]

use ap_core::belief::{BeliefUpdater, DiscreteDynamics, DiscreteUpdater, DynamicsTables};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    let Ok(tables) = serde_json::from_slice::<DynamicsTables>(data) else {
        return;
    };
    let Ok(dynamics) = DiscreteDynamics::new(tables) else {
        return;
    };
    let actions = dynamics.actions() as u32;
    let observations = dynamics.observations() as u32;
    let updater = DiscreteUpdater::new(Arc::new(dynamics));
    let Ok(mut belief) = updater.initialize(None) else {
        return;
    };
    for action in 0..=actions + 1 {
        for observation in 0..=observations {
            if let Ok(next) = updater.update(&belief, action, observation) {
                belief = next;
            }
        }
    }
});
