//! Audit record model.

use serde::{Deserialize, Serialize};

use super::classification::{ClassificationResult, Disposition};
use super::escalation::{EscalationCase, StaffTier};

/// What an audit record attests to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditEvent {
    /// The query was classified and the result shown to the operator
    #[default]
    Classified,
    /// A case was passed up one tier by the operator
    Escalated {
        from: StaffTier,
        to: StaffTier,
        reason: String,
    },
    /// A case was closed by the operator
    Resolved { tier: StaffTier, outcome: String },
}

impl AuditEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEvent::Classified => "classified",
            AuditEvent::Escalated { .. } => "escalated",
            AuditEvent::Resolved { .. } => "resolved",
        }
    }
}

/// One compliance record of something an operator acted on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuditRecord {
    /// Unique record ID
    pub record_id: String,
    /// Text exactly as entered by the operator
    pub query: String,
    pub normalized_query: String,
    pub corpus_version: String,
    /// Matched category ids in ranked order
    pub matched_ids: Vec<String>,
    pub primary_action: String,
    pub disposition: Disposition,
    /// Operator identifier
    pub operator: String,
    /// RFC 3339 timestamp
    pub recorded_at: String,
    /// Escalation case this record belongs to, if any
    pub case_id: Option<String>,
    #[serde(default)]
    pub event: AuditEvent,
}

impl AuditRecord {
    /// Build a record from a completed classification.
    pub fn from_classification(
        query: &str,
        result: &ClassificationResult,
        operator: &str,
        case_id: Option<String>,
    ) -> Self {
        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            query: query.to_string(),
            normalized_query: result.normalized_query.clone(),
            corpus_version: result.corpus_version.clone(),
            matched_ids: result.matched_ids(),
            primary_action: result.primary_action.text().to_string(),
            disposition: result.disposition(),
            operator: operator.to_string(),
            recorded_at: chrono::Utc::now().to_rfc3339(),
            case_id,
            event: AuditEvent::Classified,
        }
    }

    /// Build a record of a case hand-off or closure.
    ///
    /// The classification fields repeat the case's opening snapshot so that
    /// every record for a case can be read on its own.
    pub fn for_case_event(case: &EscalationCase, operator: &str, event: AuditEvent) -> Self {
        let classification = &case.classification;
        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            query: case.query.clone(),
            normalized_query: classification.normalized_query.clone(),
            corpus_version: classification.corpus_version.clone(),
            matched_ids: classification.matched_ids.clone(),
            primary_action: classification.primary_action.clone(),
            disposition: classification.disposition,
            operator: operator.to_string(),
            recorded_at: chrono::Utc::now().to_rfc3339(),
            case_id: Some(case.case_id.clone()),
            event,
        }
    }

    /// Serialize to the canonical JSON form that is hashed into the trail.
    ///
    /// Field order follows the struct declaration, so the output is stable.
    pub fn to_canonical_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
