//! Property-based tests for alpha-vector evaluation and action selection.

use ap_core::policy::{
    select, select_observed, utilities, AlphaVector, AlphaVectorSet, PolicyHandle,
    ACTION_INDEX_OFFSET,
};
use ap_core::{Error, Model};
use ap_math::dot;
use proptest::prelude::*;

fn brute_force(set: &AlphaVectorSet, belief: &[f64], observed: Option<u32>) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for v in set.iter() {
        if observed.is_some() && v.observable_state != observed {
            continue;
        }
        let u = dot(v.coefficients, belief);
        match best {
            Some((_, b)) if u <= b => {}
            _ => best = Some((v.index, u)),
        }
    }
    best
}

/// (dimension, vectors, belief) with every vector the right length.
fn policy_and_belief() -> impl Strategy<Value = (usize, Vec<AlphaVector>, Vec<f64>)> {
    (1usize..6).prop_flat_map(|dim| {
        let vector = (0u32..5, prop::collection::vec(-100.0f64..100.0, dim))
            .prop_map(|(action, coefficients)| AlphaVector::new(action, coefficients));
        let belief = prop::collection::vec(0.0f64..1.0, dim).prop_map(|raw| {
            let total: f64 = raw.iter().sum();
            if total > 0.0 {
                raw.iter().map(|p| p / total).collect()
            } else {
                vec![1.0 / raw.len() as f64; raw.len()]
            }
        });
        (
            Just(dim),
            prop::collection::vec(vector, 1..10),
            belief,
        )
    })
}

fn tagged(vectors: Vec<AlphaVector>, states: &[u32]) -> Vec<AlphaVector> {
    vectors
        .into_iter()
        .zip(states.iter().cycle())
        .map(|(v, &s)| v.observed(s))
        .collect()
}

proptest! {
    #[test]
    fn value_is_brute_force_max((dim, vectors, belief) in policy_and_belief()) {
        let set = AlphaVectorSet::new(dim, vectors).unwrap();
        let selection = select(&set, &belief).unwrap();
        let (_, expected) = brute_force(&set, &belief, None).unwrap();
        prop_assert!((selection.value - expected).abs() <= 1e-9 * (1.0 + expected.abs()));

        let all = utilities(&set, &belief).unwrap();
        prop_assert_eq!(all.len(), set.len());
        prop_assert!(all.iter().all(|u| *u <= selection.value + 1e-9 * (1.0 + selection.value.abs())));
    }

    #[test]
    fn action_comes_from_the_winning_vector((dim, vectors, belief) in policy_and_belief()) {
        let set = AlphaVectorSet::new(dim, vectors).unwrap();
        let selection = select(&set, &belief).unwrap();
        prop_assert_eq!(set.action(selection.vector_index), Some(selection.action));
        prop_assert!(set.distinct_actions().contains(&selection.action));

        let handle = PolicyHandle::from_set(Model::new("prop.pomdp"), set);
        prop_assert_eq!(handle.action(&belief).unwrap(), selection.action + ACTION_INDEX_OFFSET);
    }

    #[test]
    fn ties_go_to_the_first_vector((dim, vectors, belief) in policy_and_belief()) {
        let set = AlphaVectorSet::new(dim, vectors.clone()).unwrap();
        let winner = select(&set, &belief).unwrap();

        // Put a copy of the winner, with a different action, in front
        let mut copy = vectors[winner.vector_index].clone();
        copy.action += 10;
        let mut shadowed = vec![copy.clone()];
        shadowed.extend(vectors);
        let set = AlphaVectorSet::new(dim, shadowed).unwrap();

        let selection = select(&set, &belief).unwrap();
        prop_assert_eq!(selection.vector_index, 0);
        prop_assert_eq!(selection.action, copy.action);
    }

    #[test]
    fn wrong_belief_length_is_rejected(
        (dim, vectors, _belief) in policy_and_belief(),
        extra in 1usize..3,
    ) {
        let set = AlphaVectorSet::new(dim, vectors).unwrap();
        let belief = vec![0.0; dim + extra];
        let is_dimension_error = matches!(
            select(&set, &belief),
            Err(Error::Dimension { expected, actual }) if expected == dim && actual == dim + extra
        );
        prop_assert!(is_dimension_error);
    }

    #[test]
    fn observed_selection_stays_in_its_pool(
        (dim, vectors, belief) in policy_and_belief(),
        observed in 0u32..4,
    ) {
        let set = AlphaVectorSet::new(dim, tagged(vectors, &[0, 1, 2])).unwrap();
        match brute_force(&set, &belief, Some(observed)) {
            Some((index, value)) => {
                let selection = select_observed(&set, &belief, observed).unwrap();
                prop_assert_eq!(set.observable_state(selection.vector_index), Some(observed));
                prop_assert_eq!(selection.vector_index, index);
                prop_assert!((selection.value - value).abs() <= 1e-9 * (1.0 + value.abs()));
            }
            None => {
                let is_domain_error = matches!(
                    select_observed(&set, &belief, observed),
                    Err(Error::Domain { observed_state, .. }) if observed_state == observed
                );
                prop_assert!(is_domain_error);
            }
        }
    }

    #[test]
    fn policy_documents_round_trip((dim, vectors, _belief) in policy_and_belief()) {
        let set = AlphaVectorSet::new(dim, vectors).unwrap();
        let mut xml = format!(
            "<?xml version=\"1.0\"?>\n<Policy version=\"0.1\" type=\"value\">\n<AlphaVector vectorLength=\"{}\" numObsValue=\"1\" numVectors=\"{}\">\n",
            set.dimension(),
            set.len()
        );
        for v in set.iter() {
            let coefficients: Vec<String> = v.coefficients.iter().map(|c| c.to_string()).collect();
            xml.push_str(&format!(
                "<Vector action=\"{}\" obsValue=\"0\">{}</Vector>\n",
                v.action,
                coefficients.join(" ")
            ));
        }
        xml.push_str("</AlphaVector>\n</Policy>\n");

        let parsed = AlphaVectorSet::from_xml_str(&xml).unwrap();
        prop_assert_eq!(parsed.len(), set.len());
        for (a, b) in parsed.iter().zip(set.iter()) {
            prop_assert_eq!(a.action, b.action);
            prop_assert_eq!(a.coefficients, b.coefficients);
            prop_assert_eq!(a.observable_state, Some(0));
        }
    }
}
