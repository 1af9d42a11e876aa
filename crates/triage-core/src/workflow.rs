//! Reception workflow: classify, open a case, record the audit entry.
//!
//! These are the operations that touch storage. Classification itself stays
//! pure; this module runs it, then persists what the operator acted on.

use thiserror::Error;
use tracing::{info, warn};

use crate::audit::{AuditError, AuditTrail, LeafCommit};
use crate::classifier::classify;
use crate::corpus::Corpus;
use crate::db::{Database, DbError};
use crate::models::{
    AuditEvent, AuditRecord, ClassificationResult, EscalationCase, EscalationError, StaffTier,
};

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error(transparent)]
    Database(#[from] DbError),

    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error(transparent)]
    Escalation(#[from] EscalationError),

    #[error("Case not found: {0}")]
    CaseNotFound(String),

    #[error("Operator must be identified")]
    MissingOperator,
}

impl From<rusqlite::Error> for WorkflowError {
    fn from(e: rusqlite::Error) -> Self {
        WorkflowError::Database(DbError::Sqlite(e))
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Everything produced by triaging one patient contact.
#[derive(Debug, Clone)]
pub struct TriageOutcome {
    pub result: ClassificationResult,
    pub case: EscalationCase,
    pub commit: LeafCommit,
}

fn require_operator(operator: &str) -> WorkflowResult<&str> {
    let operator = operator.trim();
    if operator.is_empty() {
        return Err(WorkflowError::MissingOperator);
    }
    Ok(operator)
}

/// Classify a query, open a case at the tier its result requires and append
/// the audit record, all in one transaction.
pub fn triage(
    db: &Database,
    corpus: &Corpus,
    query: &str,
    operator: &str,
) -> WorkflowResult<TriageOutcome> {
    let operator = require_operator(operator)?;
    let result = classify(query, corpus);

    let mut case = EscalationCase::open(query.to_string(), &result, operator.to_string());
    case.escalate_to_required(operator)?;

    let record =
        AuditRecord::from_classification(query, &result, operator, Some(case.case_id.clone()));

    let tx = db.conn().unchecked_transaction()?;
    db.insert_case(&case)?;
    let commit = AuditTrail::new(db).record(&record)?;
    tx.commit()?;

    if result.has_red_flag() {
        warn!(
            case_id = %case.case_id,
            operator,
            matched = ?result.matched_ids(),
            "red flag: emergency action issued"
        );
    }
    info!(
        case_id = %case.case_id,
        disposition = result.disposition().as_str(),
        tier = %case.current_tier,
        corpus_version = %result.corpus_version,
        "triage recorded"
    );

    Ok(TriageOutcome {
        result,
        case,
        commit,
    })
}

/// Pass a case up one tier and append the hand-off to the audit trail.
pub fn escalate_case(
    db: &Database,
    case_id: &str,
    operator: &str,
    reason: &str,
) -> WorkflowResult<(EscalationCase, LeafCommit)> {
    let operator = require_operator(operator)?;
    let mut case = load_case(db, case_id)?;

    let from = case.current_tier;
    let to = case.escalate(operator, reason)?;
    let event = AuditEvent::Escalated {
        from,
        to,
        reason: reason.to_string(),
    };
    let commit = save_transition(db, &case, operator, event)?;

    info!(case_id, operator, %from, %to, "case escalated");
    Ok((case, commit))
}

/// Close a case with an outcome and append the closure to the audit trail.
pub fn resolve_case(
    db: &Database,
    case_id: &str,
    operator: &str,
    outcome: &str,
) -> WorkflowResult<(EscalationCase, LeafCommit)> {
    let operator = require_operator(operator)?;
    let mut case = load_case(db, case_id)?;

    case.resolve(operator, outcome)?;
    let event = AuditEvent::Resolved {
        tier: case.current_tier,
        outcome: case.outcome.clone().unwrap_or_default(),
    };
    let commit = save_transition(db, &case, operator, event)?;

    info!(case_id, operator, tier = %case.current_tier, "case resolved");
    Ok((case, commit))
}

/// Open cases, optionally only those held at one tier.
pub fn open_cases(db: &Database, tier: Option<StaffTier>) -> WorkflowResult<Vec<EscalationCase>> {
    Ok(db.list_open_cases(tier)?)
}

fn save_transition(
    db: &Database,
    case: &EscalationCase,
    operator: &str,
    event: AuditEvent,
) -> WorkflowResult<LeafCommit> {
    let record = AuditRecord::for_case_event(case, operator, event);

    let tx = db.conn().unchecked_transaction()?;
    db.update_case(case)?;
    let commit = AuditTrail::new(db).record(&record)?;
    tx.commit()?;
    Ok(commit)
}

fn load_case(db: &Database, case_id: &str) -> WorkflowResult<EscalationCase> {
    db.get_case(case_id)?
        .ok_or_else(|| WorkflowError::CaseNotFound(case_id.to_string()))
}
