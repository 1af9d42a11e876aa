//! Plain-text rendering for terminal output.

use std::fmt::Write;

use triage_core::audit::LogVerification;
use triage_core::{ClassificationResult, Corpus, EscalationCase, LeafCommit};

pub fn classification(result: &ClassificationResult) -> String {
    let mut out = String::new();
    let banner = if result.has_red_flag() { "!!! " } else { "" };
    let _ = writeln!(out, "{banner}ACTION: {}", result.primary_action.text());
    let _ = writeln!(
        out,
        "disposition: {}  (corpus {})",
        result.disposition().as_str(),
        result.corpus_version
    );

    if result.matches.is_empty() {
        let _ = writeln!(out, "no matching categories");
        return out;
    }

    for (rank, m) in result.matches.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:>2}. [{}] {}  (\"{}\")  {}",
            rank + 1,
            m.tier(),
            m.id(),
            m.matched_keyword,
            m.action()
        );
    }
    out
}

pub fn corpus(corpus: &Corpus) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "version: {}  ({} entries)", corpus.version(), corpus.len());
    for entry in corpus.entries() {
        let _ = writeln!(
            out,
            "[{}] {}: {}",
            entry.tier(),
            entry.id(),
            entry.keywords().join(", ")
        );
    }
    out
}

pub fn tier_counts(corpus: &Corpus) -> String {
    corpus
        .tier_counts()
        .iter()
        .map(|(tier, count)| format!("{tier}={count}"))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn case(case: &EscalationCase) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "case {}", case.case_id);
    let _ = writeln!(out, "  query:       {}", case.query);
    let _ = writeln!(out, "  disposition: {}", case.classification.disposition.as_str());
    let _ = writeln!(out, "  action:      {}", case.classification.primary_action);
    let _ = writeln!(out, "  status:      {}", case.status.as_str());
    let _ = writeln!(out, "  held at:     {}", case.current_tier);
    if let Some(required) = case.required_tier {
        let _ = writeln!(out, "  requires:    {required}");
    }
    for step in &case.history {
        let _ = writeln!(
            out,
            "  {} -> {} by {} at {}: {}",
            step.from, step.to, step.by, step.at, step.reason
        );
    }
    if let Some(outcome) = &case.outcome {
        let by = case.resolved_by.as_deref().unwrap_or("?");
        let _ = writeln!(out, "  outcome:     {outcome} ({by})");
    }
    out
}

pub fn case_line(case: &EscalationCase) -> String {
    format!(
        "{}  {:<10} {:<18} {}  {}",
        case.case_id,
        case.current_tier.as_str(),
        case.classification.disposition.as_str(),
        case.created_at,
        case.query
    )
}

pub fn commit(commit: &LeafCommit) -> String {
    format!(
        "audit record {} committed (leaf {}, root {}, {} records)",
        commit.record_id, commit.leaf_hash, commit.root_hash, commit.leaf_count
    )
}

pub fn verification(v: &LogVerification) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "records: {}", v.leaf_count);
    let _ = writeln!(out, "stored root:   {}", v.stored_root.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "computed root: {}", v.computed_root.as_deref().unwrap_or("-"));
    if v.is_intact() {
        let _ = writeln!(out, "audit log intact");
    } else {
        if !v.root_matches() {
            let _ = writeln!(out, "ROOT MISMATCH");
        }
        for record_id in &v.tampered_records {
            let _ = writeln!(out, "TAMPERED: {record_id}");
        }
    }
    out
}
