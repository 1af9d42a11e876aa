//! Golden tests for the built-in reception protocol.
//!
//! Each case pins the ranked match ids and the primary action for a phrase
//! a patient might plausibly say at the desk.

use triage_core::classifier::classify;
use triage_core::corpus::Corpus;
use triage_core::models::{Disposition, NO_MATCH_ACTION};

const CALL_999: &str = "CALL 999 NOW";

struct GoldenCase {
    id: &'static str,
    query: &'static str,
    expected_ids: &'static [&'static str],
    expected_disposition: Disposition,
    /// `None` means the primary action is the top match's own action
    expected_action: Option<&'static str>,
}

fn golden_cases() -> Vec<GoldenCase> {
    vec![
        GoldenCase {
            id: "crushing-chest-pain",
            query: "crushing chest pain radiating to my arm",
            expected_ids: &["chest-pain"],
            expected_disposition: Disposition::Emergency,
            expected_action: Some(CALL_999),
        },
        GoldenCase {
            id: "sore-throat-otherwise-well",
            query: "sore throat for 3 days, otherwise well",
            expected_ids: &["sore-throat"],
            expected_disposition: Disposition::PharmacyFirst,
            expected_action: None,
        },
        GoldenCase {
            id: "earache-with-thunderclap",
            query: "earache and also worst headache of my life",
            expected_ids: &["headache-severe", "acute-otitis-media"],
            expected_disposition: Disposition::Emergency,
            expected_action: Some(CALL_999),
        },
        GoldenCase {
            id: "empty-query",
            query: "",
            expected_ids: &[],
            expected_disposition: Disposition::ManualEscalation,
            expected_action: Some(NO_MATCH_ACTION),
        },
        GoldenCase {
            id: "query-inside-keyword",
            query: "stroke",
            expected_ids: &["stroke"],
            expected_disposition: Disposition::Emergency,
            expected_action: Some(CALL_999),
        },
        GoldenCase {
            id: "keyword-inside-query",
            query: "sudden slurred speech at dinner",
            expected_ids: &["stroke"],
            expected_disposition: Disposition::Emergency,
            expected_action: Some(CALL_999),
        },
        GoldenCase {
            id: "cross-tier-collision",
            query: "testicle pain since this morning",
            expected_ids: &["testicular-torsion", "testicular-symptoms"],
            expected_disposition: Disposition::Emergency,
            expected_action: Some(CALL_999),
        },
        GoldenCase {
            id: "vague-no-match",
            query: "feeling a bit tired",
            expected_ids: &[],
            expected_disposition: Disposition::ManualEscalation,
            expected_action: Some(NO_MATCH_ACTION),
        },
        GoldenCase {
            id: "high-risk-group",
            query: "Pregnant and bleeding heavily",
            expected_ids: &["pregnancy"],
            expected_disposition: Disposition::TriagerReview,
            expected_action: None,
        },
        GoldenCase {
            id: "dental-pathway",
            query: "my toothache is awful",
            expected_ids: &["dental"],
            expected_disposition: Disposition::Signpost,
            expected_action: None,
        },
        GoldenCase {
            id: "substring-false-positive",
            query: "computing routine",
            expected_ids: &["uncomplicated-uti"],
            expected_disposition: Disposition::PharmacyFirst,
            expected_action: None,
        },
        GoldenCase {
            id: "whitespace-and-case",
            query: "  SORE\tTHROAT  ",
            expected_ids: &["sore-throat"],
            expected_disposition: Disposition::PharmacyFirst,
            expected_action: None,
        },
    ]
}

#[test]
fn test_golden_cases() {
    let corpus = Corpus::builtin();
    let mut failures = Vec::new();

    for case in golden_cases() {
        let result = classify(case.query, &corpus);
        let ids = result.matched_ids();

        if ids != case.expected_ids {
            failures.push(format!(
                "{}: expected ids {:?}, got {:?}",
                case.id, case.expected_ids, ids
            ));
            continue;
        }

        if result.disposition() != case.expected_disposition {
            failures.push(format!(
                "{}: expected disposition {:?}, got {:?}",
                case.id,
                case.expected_disposition,
                result.disposition()
            ));
        }

        let expected_action = match case.expected_action {
            Some(action) => action.to_string(),
            None => corpus
                .get(case.expected_ids[0])
                .map(|flag| flag.action().to_string())
                .unwrap_or_default(),
        };
        if result.primary_action.text() != expected_action {
            failures.push(format!(
                "{}: expected action {:?}, got {:?}",
                case.id,
                expected_action,
                result.primary_action.text()
            ));
        }
    }

    assert!(failures.is_empty(), "Golden failures:\n{}", failures.join("\n"));
}

#[test]
fn test_builtin_corpus_shape() {
    let corpus = Corpus::builtin();

    for id in ["chest-pain", "headache-severe", "stroke", "sore-throat", "acute-otitis-media"] {
        assert!(corpus.get(id).is_some(), "missing {id}");
    }
    assert!(corpus.entries().iter().all(|e| !e.action().is_empty()));
    assert!(corpus.entries().iter().all(|e| !e.keywords().is_empty()));
}

#[test]
fn test_red_flag_action_never_replaced() {
    let corpus = Corpus::builtin();
    let result = classify(
        "pregnant, diabetic, toothache, sore throat and crushing chest pain",
        &corpus,
    );

    assert!(result.matches.len() > 1);
    assert_eq!(result.matches[0].id(), "chest-pain");
    assert_eq!(result.primary_action.text(), CALL_999);
}
