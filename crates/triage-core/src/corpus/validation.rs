//! Load-time validation of corpus entries.
//!
//! Every problem is collected so an administrator sees the whole list at
//! once. Any issue blocks the corpus from reaching the classifier.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{FlagCategory, Tier};

/// What is wrong with an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IssueKind {
    EmptyVersion,
    EmptyId,
    DuplicateId,
    NoKeywords,
    BlankKeyword { position: usize },
    MissingAction,
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Position of the entry in the corpus (None for corpus-level issues)
    pub entry_index: Option<usize>,
    pub flag_id: Option<String>,
    pub tier: Option<Tier>,
    pub kind: IssueKind,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match &self.kind {
            IssueKind::EmptyVersion => "corpus version is empty".to_string(),
            IssueKind::EmptyId => "id is empty".to_string(),
            IssueKind::DuplicateId => "id is declared more than once".to_string(),
            IssueKind::NoKeywords => "has no keywords".to_string(),
            IssueKind::BlankKeyword { position } => format!("keyword #{} is blank", position + 1),
            IssueKind::MissingAction => "action is empty".to_string(),
        };

        match (self.entry_index, &self.flag_id, self.tier) {
            (Some(index), Some(id), Some(tier)) if !id.is_empty() => {
                write!(f, "entry {} ({} '{}'): {}", index, tier, id, what)
            }
            (Some(index), _, Some(tier)) => write!(f, "entry {} ({}): {}", index, tier, what),
            _ => f.write_str(&what),
        }
    }
}

/// Validate a normalized corpus.
///
/// The same requirements apply to every tier, not only red and amber.
pub fn validate_entries(version: &str, entries: &[FlagCategory]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    if version.trim().is_empty() {
        issues.push(ValidationIssue {
            entry_index: None,
            flag_id: None,
            tier: None,
            kind: IssueKind::EmptyVersion,
        });
    }

    let mut seen_ids = HashSet::new();

    for (index, entry) in entries.iter().enumerate() {
        let issue = |kind| ValidationIssue {
            entry_index: Some(index),
            flag_id: Some(entry.id().to_string()),
            tier: Some(entry.tier()),
            kind,
        };

        if entry.id().trim().is_empty() {
            issues.push(issue(IssueKind::EmptyId));
        } else if !seen_ids.insert(entry.id()) {
            issues.push(issue(IssueKind::DuplicateId));
        }

        if entry.keywords().is_empty() {
            issues.push(issue(IssueKind::NoKeywords));
        }
        for (position, keyword) in entry.keywords().iter().enumerate() {
            if keyword.trim().is_empty() {
                issues.push(issue(IssueKind::BlankKeyword { position }));
            }
        }

        if entry.action().trim().is_empty() {
            issues.push(issue(IssueKind::MissingAction));
        }
    }

    issues
}
