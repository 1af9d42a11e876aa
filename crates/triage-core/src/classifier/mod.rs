//! Symptom classification engine.
//!
//! Pipeline: Normalize → Containment match → Tier ranking → Primary action
//!
//! Classification is a pure function of `(query, corpus)`. It does no I/O
//! and no logging; recording a result is the caller's job.

mod normalizer;

pub use normalizer::*;

use std::sync::Arc;

use crate::corpus::Corpus;
use crate::models::{ClassificationResult, Containment, FlagCategory, MatchedFlag, PrimaryAction};

/// Classify free text against a corpus.
///
/// An entry matches when any keyword is a substring of the normalized query,
/// or the normalized query is a substring of any keyword. Matches are ranked
/// by tier priority and, within a tier, by declaration order. An empty
/// query matches nothing.
pub fn classify(query: &str, corpus: &Corpus) -> ClassificationResult {
    let normalized_query = normalize_query(query);

    let mut matches: Vec<MatchedFlag> = if normalized_query.is_empty() {
        Vec::new()
    } else {
        corpus
            .entries()
            .iter()
            .filter_map(|entry| match_entry(entry, &normalized_query))
            .collect()
    };

    // Stable: ties keep corpus declaration order.
    matches.sort_by_key(|m| m.tier().rank());

    let primary_action = match matches.first() {
        Some(top) => PrimaryAction::Matched {
            flag_id: top.id().to_string(),
            tier: top.tier(),
            action: top.action().to_string(),
        },
        None => PrimaryAction::NoMatch,
    };

    ClassificationResult {
        normalized_query,
        corpus_version: corpus.version().to_string(),
        matches,
        primary_action,
    }
}

/// Test one entry against an already-normalized, non-empty query.
///
/// Keywords are checked in declaration order; the first that fires in
/// either direction is reported.
fn match_entry(entry: &FlagCategory, normalized_query: &str) -> Option<MatchedFlag> {
    entry.keywords().iter().find_map(|keyword| {
        let containment = if normalized_query.contains(keyword.as_str()) {
            Containment::KeywordInQuery
        } else if keyword.contains(normalized_query) {
            Containment::QueryInKeyword
        } else {
            return None;
        };

        Some(MatchedFlag {
            flag: entry.clone(),
            matched_keyword: keyword.clone(),
            containment,
        })
    })
}

/// Classifier bound to one corpus snapshot.
#[derive(Debug, Clone)]
pub struct Classifier {
    corpus: Arc<Corpus>,
}

impl Classifier {
    pub fn new(corpus: Arc<Corpus>) -> Self {
        Self { corpus }
    }

    pub fn classify(&self, query: &str) -> ClassificationResult {
        classify(query, &self.corpus)
    }

    /// Classify several queries against the same snapshot.
    pub fn classify_all(&self, queries: &[&str]) -> Vec<ClassificationResult> {
        queries.iter().map(|q| self.classify(q)).collect()
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Disposition, FlagBase, Tier, NO_MATCH_ACTION};

    fn flag(tier: Tier, id: &str, keywords: &[&str], action: &str) -> FlagCategory {
        let mut base = FlagBase::new(id.into(), action.into());
        base.keywords = keywords.iter().map(|k| k.to_string()).collect();
        FlagCategory::new(tier, base)
    }

    fn test_corpus() -> Corpus {
        // Lower tiers declared first on purpose.
        Corpus::new(
            "test",
            vec![
                flag(Tier::PharmacyFirst, "earache", &["earache", "ear pain"], "Pharmacy First"),
                flag(Tier::Pathway, "dental", &["toothache"], "Dentist"),
                flag(Tier::Amber, "testicle-amber", &["testicle pain"], "GP Triager - Same Day"),
                flag(Tier::Red, "headache-severe", &["worst headache of my life"], "CALL 999 NOW"),
                flag(Tier::Red, "testicle-red", &["testicle pain"], "CALL 999 NOW"),
                flag(Tier::HighRisk, "pregnancy", &["pregnant"], "Tier 2"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_red_flag_wins() {
        let corpus = test_corpus();
        let result = classify("Earache and also worst headache of my life", &corpus);

        assert_eq!(result.matched_ids(), vec!["headache-severe", "earache"]);
        assert_eq!(result.primary_action.text(), "CALL 999 NOW");
        assert!(result.has_red_flag());
        assert_eq!(result.disposition(), Disposition::Emergency);
        assert_eq!(result.secondary_matches().len(), 1);
    }

    #[test]
    fn test_cross_tier_collision_ranked_by_tier() {
        let corpus = test_corpus();
        let result = classify("testicle pain", &corpus);

        assert_eq!(result.matched_ids(), vec!["testicle-red", "testicle-amber"]);
        assert_eq!(
            result.primary_action,
            PrimaryAction::Matched {
                flag_id: "testicle-red".into(),
                tier: Tier::Red,
                action: "CALL 999 NOW".into(),
            }
        );
    }

    #[test]
    fn test_full_tier_order() {
        let corpus = test_corpus();
        let result = classify("pregnant with earache and toothache", &corpus);

        let tiers: Vec<Tier> = result.matches.iter().map(|m| m.tier()).collect();
        assert_eq!(tiers, vec![Tier::HighRisk, Tier::Pathway, Tier::PharmacyFirst]);
    }

    #[test]
    fn test_query_inside_keyword() {
        let corpus = test_corpus();
        let result = classify("tooth", &corpus);

        assert_eq!(result.matched_ids(), vec!["dental"]);
        assert_eq!(result.matches[0].containment, Containment::QueryInKeyword);
        assert_eq!(result.matches[0].matched_keyword, "toothache");
    }

    #[test]
    fn test_first_keyword_reported() {
        let corpus = test_corpus();
        let result = classify("ear pain and earache", &corpus);

        assert_eq!(result.matches.len(), 1);
        assert_eq!(result.matches[0].matched_keyword, "earache");
        assert_eq!(result.matches[0].containment, Containment::KeywordInQuery);
    }

    #[test]
    fn test_empty_query_matches_nothing() {
        let corpus = test_corpus();
        for query in ["", "   ", "\n\t"] {
            let result = classify(query, &corpus);
            assert!(!result.is_match());
            assert_eq!(result.primary_action, PrimaryAction::NoMatch);
            assert_eq!(result.primary_action.text(), NO_MATCH_ACTION);
        }
    }

    #[test]
    fn test_no_match() {
        let corpus = test_corpus();
        let result = classify("feeling a bit tired", &corpus);

        assert!(result.matches.is_empty());
        assert!(result.primary_action.is_no_match());
        assert_eq!(result.disposition(), Disposition::ManualEscalation);
        assert_eq!(result.corpus_version, "test");
    }

    #[test]
    fn test_substring_inside_word_still_matches() {
        let corpus = Corpus::new(
            "test",
            vec![flag(Tier::PharmacyFirst, "uti", &["uti"], "Pharmacy First")],
        )
        .unwrap();

        // Over-inclusive on purpose: plain containment, no word boundaries.
        let result = classify("routine computing question", &corpus);
        assert_eq!(result.matched_ids(), vec!["uti"]);
    }

    #[test]
    fn test_classifier_snapshot() {
        let classifier = Classifier::new(Arc::new(test_corpus()));
        let results = classifier.classify_all(&["toothache", "nothing relevant"]);

        assert_eq!(results.len(), 2);
        assert!(results[0].is_match());
        assert!(!results[1].is_match());
        assert_eq!(classifier.corpus().version(), "test");
    }
}
