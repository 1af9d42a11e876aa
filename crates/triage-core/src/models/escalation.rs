//! Escalation case models for the Tier 1 → Tier 2 → Tier 3 workflow.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::classification::{ClassificationResult, Disposition};

/// Escalation workflow errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EscalationError {
    #[error("Case {0} is already closed")]
    AlreadyClosed(String),

    #[error("Case {0} is already with the GP (Tier 3)")]
    AtTopTier(String),

    #[error("An outcome must be recorded to resolve a case")]
    MissingOutcome,

    #[error("Case is at {current} but must reach {required} before it can be resolved")]
    BelowRequiredTier {
        current: StaffTier,
        required: StaffTier,
    },
}

pub type EscalationResult<T> = Result<T, EscalationError>;

/// Human escalation tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffTier {
    /// Tier 1: reception
    Reception,
    /// Tier 2: non-clinical triager
    Triager,
    /// Tier 3: GP
    Gp,
}

impl StaffTier {
    pub fn number(self) -> u8 {
        match self {
            StaffTier::Reception => 1,
            StaffTier::Triager => 2,
            StaffTier::Gp => 3,
        }
    }

    /// The next tier up, if any.
    pub fn next(self) -> Option<StaffTier> {
        match self {
            StaffTier::Reception => Some(StaffTier::Triager),
            StaffTier::Triager => Some(StaffTier::Gp),
            StaffTier::Gp => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StaffTier::Reception => "reception",
            StaffTier::Triager => "triager",
            StaffTier::Gp => "gp",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "reception" | "tier1" | "1" => Some(StaffTier::Reception),
            "triager" | "tier2" | "2" => Some(StaffTier::Triager),
            "gp" | "tier3" | "3" => Some(StaffTier::Gp),
            _ => None,
        }
    }
}

impl fmt::Display for StaffTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tier {} ({})", self.number(), self.as_str())
    }
}

/// Case status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    /// Awaiting action at the current tier
    Open,
    /// Passed up at least once, awaiting action
    Escalated,
    /// Closed with a recorded outcome
    Resolved,
    /// Red flag: handed to emergency services at creation
    EmergencyHandedOff,
}

impl CaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CaseStatus::Open => "open",
            CaseStatus::Escalated => "escalated",
            CaseStatus::Resolved => "resolved",
            CaseStatus::EmergencyHandedOff => "emergency_handed_off",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(CaseStatus::Open),
            "escalated" => Some(CaseStatus::Escalated),
            "resolved" => Some(CaseStatus::Resolved),
            "emergency_handed_off" => Some(CaseStatus::EmergencyHandedOff),
            _ => None,
        }
    }

    pub fn is_closed(self) -> bool {
        matches!(self, CaseStatus::Resolved | CaseStatus::EmergencyHandedOff)
    }
}

/// One hand-off between tiers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EscalationStep {
    pub from: StaffTier,
    pub to: StaffTier,
    /// Operator who escalated
    pub by: String,
    /// RFC 3339 timestamp
    pub at: String,
    pub reason: String,
}

/// Snapshot of the classification that opened a case.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseClassification {
    pub normalized_query: String,
    pub corpus_version: String,
    pub matched_ids: Vec<String>,
    pub primary_action: String,
    pub disposition: Disposition,
}

impl From<&ClassificationResult> for CaseClassification {
    fn from(result: &ClassificationResult) -> Self {
        Self {
            normalized_query: result.normalized_query.clone(),
            corpus_version: result.corpus_version.clone(),
            matched_ids: result.matched_ids(),
            primary_action: result.primary_action.text().to_string(),
            disposition: result.disposition(),
        }
    }
}

/// A patient contact moving through the escalation chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EscalationCase {
    /// Unique case ID
    pub case_id: String,
    /// Patient's own words as entered by the operator
    pub query: String,
    pub classification: CaseClassification,
    /// Tier currently holding the case
    pub current_tier: StaffTier,
    /// Lowest tier allowed to close the case (None for emergencies)
    pub required_tier: Option<StaffTier>,
    pub status: CaseStatus,
    pub history: Vec<EscalationStep>,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
    pub outcome: Option<String>,
    pub resolved_by: Option<String>,
}

impl EscalationCase {
    /// Open a case at reception from a classification result.
    ///
    /// Red-flag results are closed immediately as handed off to emergency
    /// services; everything else starts open at Tier 1.
    pub fn open(query: String, result: &ClassificationResult, operator: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        let classification = CaseClassification::from(result);
        let required_tier = classification.disposition.owning_tier();

        let (status, outcome, resolved_by) = if classification.disposition == Disposition::Emergency
        {
            (
                CaseStatus::EmergencyHandedOff,
                Some(classification.primary_action.clone()),
                Some(operator.clone()),
            )
        } else {
            (CaseStatus::Open, None, None)
        };

        Self {
            case_id: uuid::Uuid::new_v4().to_string(),
            query,
            classification,
            current_tier: StaffTier::Reception,
            required_tier,
            status,
            history: Vec::new(),
            created_by: operator,
            created_at: now.clone(),
            updated_at: now,
            outcome,
            resolved_by,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.status.is_closed()
    }

    /// Whether the case still sits below the tier its classification requires.
    pub fn needs_escalation(&self) -> bool {
        match self.required_tier {
            Some(required) => !self.is_closed() && self.current_tier < required,
            None => false,
        }
    }

    /// Pass the case up one tier.
    pub fn escalate(&mut self, by: &str, reason: &str) -> EscalationResult<StaffTier> {
        if self.is_closed() {
            return Err(EscalationError::AlreadyClosed(self.case_id.clone()));
        }
        let to = self
            .current_tier
            .next()
            .ok_or_else(|| EscalationError::AtTopTier(self.case_id.clone()))?;

        let now = chrono::Utc::now().to_rfc3339();
        self.history.push(EscalationStep {
            from: self.current_tier,
            to,
            by: by.to_string(),
            at: now.clone(),
            reason: reason.to_string(),
        });
        self.current_tier = to;
        self.status = CaseStatus::Escalated;
        self.updated_at = now;
        Ok(to)
    }

    /// Escalate until the case reaches the tier its classification requires.
    ///
    /// Returns the number of hand-offs made.
    pub fn escalate_to_required(&mut self, by: &str) -> EscalationResult<usize> {
        let reason = format!("classified as {}", self.classification.disposition.as_str());
        let mut steps = 0;
        while self.needs_escalation() {
            self.escalate(by, &reason)?;
            steps += 1;
        }
        Ok(steps)
    }

    /// Close the case with an outcome.
    pub fn resolve(&mut self, by: &str, outcome: &str) -> EscalationResult<()> {
        if self.is_closed() {
            return Err(EscalationError::AlreadyClosed(self.case_id.clone()));
        }
        if outcome.trim().is_empty() {
            return Err(EscalationError::MissingOutcome);
        }
        if let Some(required) = self.required_tier {
            if self.current_tier < required {
                return Err(EscalationError::BelowRequiredTier {
                    current: self.current_tier,
                    required,
                });
            }
        }

        self.status = CaseStatus::Resolved;
        self.outcome = Some(outcome.trim().to_string());
        self.resolved_by = Some(by.to_string());
        self.updated_at = chrono::Utc::now().to_rfc3339();
        Ok(())
    }
}
