//! Structured error contract tests.
//!
//! Error codes and JSON field names are a stable interface for automation;
//! these tests pin them.

use ap_common::{format_error_human, Error, ErrorCategory, StructuredError, SuggestedAction};

fn all_errors() -> Vec<Error> {
    vec![
        Error::format("out.policy", "unexpected end of document"),
        Error::PolicyEmpty,
        Error::Dimension {
            expected: 2,
            actual: 3,
        },
        Error::Domain {
            observed_state: 2,
            available: vec![0, 1],
        },
        Error::SolverProcess {
            tool: "pomdpsol".into(),
            code: 1,
        },
        Error::SolverTerminated {
            tool: "pomdpsol".into(),
        },
        Error::SolverSpawn {
            tool: "pomdpsol".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        },
        Error::UpdaterUnavailable("model has no dynamics".into()),
        Error::BeliefUpdate("observation has zero probability".into()),
        Error::Config("bad".into()),
        Error::InvalidOptions("precision must be positive".into()),
        Error::Io(std::io::Error::from(std::io::ErrorKind::NotFound)),
    ]
}

#[test]
fn codes_are_unique() {
    let mut codes: Vec<u32> = all_errors().iter().map(Error::code).collect();
    codes.sort_unstable();
    let before = codes.len();
    codes.dedup();
    assert_eq!(before, codes.len());
}

#[test]
fn codes_fall_in_category_ranges() {
    for err in all_errors() {
        let range = match err.category() {
            ErrorCategory::Policy => 10..20,
            ErrorCategory::Query => 20..30,
            ErrorCategory::Process => 30..40,
            ErrorCategory::Belief => 40..50,
            ErrorCategory::Config => 50..60,
            ErrorCategory::Io => 60..70,
        };
        assert!(range.contains(&err.code()), "{} has code {}", err, err.code());
    }
}

#[test]
fn every_error_has_headline_and_remediation() {
    for err in all_errors() {
        assert!(!err.headline().is_empty());
        assert!(!err.remediation().is_empty());
        let human = format_error_human(&err, true);
        assert!(human.contains(err.headline()));
    }
}

#[test]
fn domain_error_is_never_recoverable() {
    let err = Error::Domain {
        observed_state: 9,
        available: vec![],
    };
    let structured = StructuredError::from(&err);
    assert!(!structured.recoverable);
    assert_eq!(structured.suggested_action, SuggestedAction::Abort);
    assert_eq!(structured.context["observed_state"], serde_json::json!(9));
}

#[test]
fn structured_error_roundtrips_through_json() {
    let err = Error::SolverProcess {
        tool: "pomdpeval".into(),
        code: 2,
    };
    let json = StructuredError::from(&err).to_json_pretty();
    let parsed: StructuredError = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.code, 30);
    assert_eq!(parsed.category, ErrorCategory::Process);
    assert_eq!(parsed.context["tool"], serde_json::json!("pomdpeval"));
}
