//! Triage Core Library
//!
//! Symptom classification and escalation support for GP reception staff.
//!
//! # Architecture
//!
//! ```text
//! Patient's words → Normalize → Containment match → Tier ranking
//!                                                        │
//!                                       ClassificationResult + primary action
//!                                                        │
//!                                      ┌─────────────────┴─────────────────┐
//!                                      ▼                                   ▼
//!                             Escalation case                      Audit record
//!                      Tier 1 → Tier 2 → Tier 3             leaf = hash(record_json)
//!                                                                 update root
//!                                                                      │
//!                                                        ┌─────────────┴─────────────┐
//!                                                        ▼                           ▼
//!                                                 Compliance export            Audit summary
//!                                                  (with proofs)                 (CSV/JSON)
//! ```
//!
//! # Core Principle
//!
//! **Red flags always win.** Every match is listed, but the primary action is
//! always taken from the highest tier, and an unmatched query is never
//! dismissed at reception.
//!
//! # Modules
//!
//! - [`classifier`]: the pure matching engine
//! - [`corpus`]: flag categories, validation, loading and overrides
//! - [`models`]: domain types (flags, results, cases, audit records)
//! - [`db`]: SQLite storage for cases and the audit log
//! - [`audit`]: Merkle tree over the audit log
//! - [`workflow`]: triage, escalation and resolution against storage
//! - [`export`]: compliance and summary exports
//! - [`config`]: startup configuration

pub mod audit;
pub mod classifier;
pub mod config;
pub mod corpus;
pub mod db;
pub mod export;
pub mod models;
pub mod workflow;

// Re-export commonly used types
pub use audit::{AuditTrail, InclusionProof, LeafCommit, TrailStats};
pub use classifier::{classify, normalize_query, Classifier};
pub use config::TriageConfig;
pub use corpus::{Corpus, CorpusError, CorpusFile, CorpusHandle};
pub use db::Database;
pub use models::{
    AuditEvent, AuditRecord, CaseStatus, ClassificationResult, Disposition, EscalationCase,
    FlagCategory, PrimaryAction, StaffTier, Tier,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex, RwLock};

use corpus::CorpusFormat;
use workflow::WorkflowError;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum TriageError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Corpus error: {0}")]
    CorpusError(String),

    #[error("Escalation error: {0}")]
    EscalationError(String),

    #[error("Audit error: {0}")]
    AuditError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for TriageError {
    fn from(e: db::DbError) -> Self {
        match e {
            db::DbError::NotFound(what) => TriageError::NotFound(what),
            other => TriageError::DatabaseError(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for TriageError {
    fn from(e: serde_json::Error) -> Self {
        TriageError::SerializationError(e.to_string())
    }
}

impl From<corpus::CorpusError> for TriageError {
    fn from(e: corpus::CorpusError) -> Self {
        TriageError::CorpusError(e.to_string())
    }
}

impl From<audit::AuditError> for TriageError {
    fn from(e: audit::AuditError) -> Self {
        TriageError::AuditError(e.to_string())
    }
}

impl From<WorkflowError> for TriageError {
    fn from(e: WorkflowError) -> Self {
        match e {
            WorkflowError::Database(e) => e.into(),
            WorkflowError::Audit(e) => e.into(),
            WorkflowError::Escalation(e) => TriageError::EscalationError(e.to_string()),
            WorkflowError::CaseNotFound(id) => TriageError::NotFound(format!("case {id}")),
            other @ WorkflowError::MissingOperator => TriageError::InvalidInput(other.to_string()),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for TriageError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        TriageError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
///
/// `corpus_json` replaces the built-in protocol when given.
#[uniffi::export]
pub fn open_triage_core(
    db_path: String,
    corpus_json: Option<String>,
) -> Result<Arc<TriageCore>, TriageError> {
    let db = Database::open(&db_path)?;
    let corpus = match corpus_json {
        Some(json) => CorpusFile::parse(&json, CorpusFormat::Json)?.into_corpus()?,
        None => Corpus::builtin(),
    };
    Ok(Arc::new(TriageCore::new(db, corpus)))
}

/// In-memory database with the built-in protocol (for testing).
#[uniffi::export]
pub fn open_triage_core_in_memory() -> Result<Arc<TriageCore>, TriageError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(TriageCore::new(db, Corpus::builtin())))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe engine handle for FFI.
#[derive(uniffi::Object)]
pub struct TriageCore {
    /// Corpus in effect: `base` with the current override layer merged in
    corpus: CorpusHandle,
    /// Corpus as loaded, before any administrator overrides
    base: RwLock<Arc<Corpus>>,
    db: Arc<Mutex<Database>>,
    system_id: Option<String>,
}

impl TriageCore {
    /// Build from an opened database and a validated corpus.
    pub fn new(db: Database, corpus: Corpus) -> Self {
        Self {
            base: RwLock::new(Arc::new(corpus.clone())),
            corpus: CorpusHandle::new(corpus),
            db: Arc::new(Mutex::new(db)),
            system_id: None,
        }
    }

    /// Build from startup configuration.
    pub fn from_config(config: &TriageConfig) -> Result<Self, TriageError> {
        let db = config.open_database()?;
        let corpus = config.load_corpus()?;
        Ok(Self {
            system_id: config.system_id().map(str::to_string),
            ..Self::new(db, corpus)
        })
    }
}

#[uniffi::export]
impl TriageCore {
    // =========================================================================
    // Classification
    // =========================================================================

    /// Classify without recording anything.
    pub fn classify(&self, query: String) -> FfiClassification {
        let corpus = self.corpus.snapshot();
        classify(&query, &corpus).into()
    }

    /// Classify, open an escalation case and append the audit record.
    pub fn triage(&self, query: String, operator: String) -> Result<FfiTriageOutcome, TriageError> {
        let corpus = self.corpus.snapshot();
        let db = self.db.lock()?;
        let outcome = workflow::triage(&db, &corpus, &query, &operator)?;

        Ok(FfiTriageOutcome {
            classification: outcome.result.into(),
            case: outcome.case.into(),
            record_id: outcome.commit.record_id,
            leaf_hash: outcome.commit.leaf_hash,
            root_hash: outcome.commit.root_hash,
        })
    }

    // =========================================================================
    // Corpus
    // =========================================================================

    /// Replace the base corpus from JSON and drop any override layer.
    /// Returns the new version.
    ///
    /// An invalid corpus is rejected and the current one stays in effect.
    pub fn reload_corpus_json(&self, corpus_json: String) -> Result<String, TriageError> {
        let corpus = CorpusFile::parse(&corpus_json, CorpusFormat::Json)?.into_corpus()?;
        let version = corpus.version().to_string();

        let mut base = self.base.write()?;
        *base = Arc::new(corpus.clone());
        self.corpus.replace(corpus);
        Ok(version)
    }

    /// Set the administrator override layer (JSON). Returns the new version.
    ///
    /// Each call merges onto the base corpus and replaces the previous layer,
    /// so an entry left out of the new layer reverts to its base definition.
    pub fn apply_overrides_json(&self, overrides_json: String) -> Result<String, TriageError> {
        let overrides = CorpusFile::parse(&overrides_json, CorpusFormat::Json)?;

        let base = self.base.read()?;
        let merged = corpus::merge_overrides(&base, overrides)?;
        let version = merged.version().to_string();
        self.corpus.replace(merged);
        Ok(version)
    }

    pub fn corpus_version(&self) -> String {
        self.corpus.version()
    }

    // =========================================================================
    // Escalation
    // =========================================================================

    pub fn escalate_case(
        &self,
        case_id: String,
        operator: String,
        reason: String,
    ) -> Result<FfiCase, TriageError> {
        let db = self.db.lock()?;
        let (case, _) = workflow::escalate_case(&db, &case_id, &operator, &reason)?;
        Ok(case.into())
    }

    pub fn resolve_case(
        &self,
        case_id: String,
        operator: String,
        outcome: String,
    ) -> Result<FfiCase, TriageError> {
        let db = self.db.lock()?;
        let (case, _) = workflow::resolve_case(&db, &case_id, &operator, &outcome)?;
        Ok(case.into())
    }

    pub fn get_case(&self, case_id: String) -> Result<Option<FfiCase>, TriageError> {
        let db = self.db.lock()?;
        Ok(db.get_case(&case_id)?.map(Into::into))
    }

    /// Open cases, optionally filtered by tier ("reception", "triager", "gp").
    pub fn list_open_cases(&self, tier: Option<String>) -> Result<Vec<FfiCase>, TriageError> {
        let tier = tier
            .map(|t| {
                StaffTier::parse(&t)
                    .ok_or_else(|| TriageError::InvalidInput(format!("unknown tier '{t}'")))
            })
            .transpose()?;
        let db = self.db.lock()?;
        let cases = workflow::open_cases(&db, tier)?;
        Ok(cases.into_iter().map(Into::into).collect())
    }

    // =========================================================================
    // Audit & Export
    // =========================================================================

    pub fn audit_stats(&self) -> Result<FfiAuditStats, TriageError> {
        let db = self.db.lock()?;
        let stats = AuditTrail::new(&db).stats()?;
        Ok(stats.into())
    }

    /// Re-hash the whole log; true when nothing was altered.
    pub fn verify_audit_log(&self) -> Result<bool, TriageError> {
        let db = self.db.lock()?;
        Ok(AuditTrail::new(&db).verify_log()?.is_intact())
    }

    pub fn export_compliance_json(&self) -> Result<String, TriageError> {
        let db = self.db.lock()?;
        let mut exporter = export::ComplianceExporter::new(&db);
        if let Some(system_id) = &self.system_id {
            exporter = exporter.with_system_id(system_id.clone());
        }
        Ok(exporter.export_all()?.to_json()?)
    }

    pub fn export_audit_csv(&self) -> Result<String, TriageError> {
        let db = self.db.lock()?;
        let summary = export::AuditSummaryExporter::new(&db).export_all()?;
        Ok(summary.to_csv())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe match.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMatch {
    pub id: String,
    pub tier: String,
    pub description: String,
    pub action: String,
    pub matched_keyword: String,
    pub nice_ref: Option<String>,
}

impl From<models::MatchedFlag> for FfiMatch {
    fn from(m: models::MatchedFlag) -> Self {
        Self {
            id: m.id().to_string(),
            tier: m.tier().label().to_string(),
            description: m.flag.description().to_string(),
            action: m.action().to_string(),
            nice_ref: m.flag.nice_ref().map(str::to_string),
            matched_keyword: m.matched_keyword,
        }
    }
}

/// FFI-safe classification result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiClassification {
    pub normalized_query: String,
    pub corpus_version: String,
    /// Ranked, highest tier first
    pub matches: Vec<FfiMatch>,
    pub primary_action: String,
    pub is_match: bool,
    pub has_red_flag: bool,
    pub disposition: String,
}

impl From<ClassificationResult> for FfiClassification {
    fn from(result: ClassificationResult) -> Self {
        Self {
            primary_action: result.primary_action.text().to_string(),
            is_match: result.is_match(),
            has_red_flag: result.has_red_flag(),
            disposition: result.disposition().as_str().to_string(),
            normalized_query: result.normalized_query,
            corpus_version: result.corpus_version,
            matches: result.matches.into_iter().map(Into::into).collect(),
        }
    }
}

/// FFI-safe escalation case.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCase {
    pub case_id: String,
    pub query: String,
    pub disposition: String,
    pub primary_action: String,
    pub matched_ids: Vec<String>,
    pub current_tier: String,
    pub required_tier: Option<String>,
    pub status: String,
    pub escalation_count: u32,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
    pub outcome: Option<String>,
    pub resolved_by: Option<String>,
}

impl From<EscalationCase> for FfiCase {
    fn from(case: EscalationCase) -> Self {
        Self {
            case_id: case.case_id,
            query: case.query,
            disposition: case.classification.disposition.as_str().to_string(),
            primary_action: case.classification.primary_action,
            matched_ids: case.classification.matched_ids,
            current_tier: case.current_tier.as_str().to_string(),
            required_tier: case.required_tier.map(|t| t.as_str().to_string()),
            status: case.status.as_str().to_string(),
            escalation_count: case.history.len() as u32,
            created_by: case.created_by,
            created_at: case.created_at,
            updated_at: case.updated_at,
            outcome: case.outcome,
            resolved_by: case.resolved_by,
        }
    }
}

/// FFI-safe triage outcome.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTriageOutcome {
    pub classification: FfiClassification,
    pub case: FfiCase,
    pub record_id: String,
    pub leaf_hash: String,
    pub root_hash: String,
}

/// FFI-safe audit trail statistics.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAuditStats {
    pub root_hash: Option<String>,
    pub tree_height: u32,
    pub leaf_count: u32,
}

impl From<TrailStats> for FfiAuditStats {
    fn from(stats: TrailStats) -> Self {
        Self {
            root_hash: stats.root_hash,
            tree_height: stats.tree_height,
            leaf_count: stats.leaf_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_through_ffi() {
        let core = open_triage_core_in_memory().unwrap();
        let result = core.classify("Earache and also WORST headache of my life".into());

        assert_eq!(result.primary_action, "CALL 999 NOW");
        assert_eq!(result.matches[0].id, "headache-severe");
        assert_eq!(result.matches[0].tier, "red_flag");
        assert_eq!(result.matches[1].id, "acute-otitis-media");
        assert_eq!(result.disposition, "emergency");
    }

    #[test]
    fn test_triage_flow() {
        let core = open_triage_core_in_memory().unwrap();

        let outcome = core
            .triage("feeling a bit tired".into(), "rec1".into())
            .unwrap();
        assert_eq!(outcome.case.current_tier, "triager");
        assert_eq!(outcome.case.status, "escalated");

        let open = core.list_open_cases(Some("tier2".into())).unwrap();
        assert_eq!(open.len(), 1);

        let resolved = core
            .resolve_case(outcome.case.case_id.clone(), "tri1".into(), "Booked GP".into())
            .unwrap();
        assert_eq!(resolved.status, "resolved");

        // Classification plus the closure.
        let stats = core.audit_stats().unwrap();
        assert_eq!(stats.leaf_count, 2);
        assert_ne!(stats.root_hash.as_deref(), Some(outcome.root_hash.as_str()));
        assert!(core.verify_audit_log().unwrap());
    }

    #[test]
    fn test_reload_rejects_invalid_corpus() {
        let core = open_triage_core_in_memory().unwrap();
        let before = core.corpus_version();

        let bad = r#"{"version": "x", "entries": [{"tier": "red_flag", "id": "a", "keywords": []}]}"#;
        assert!(matches!(
            core.reload_corpus_json(bad.into()),
            Err(TriageError::CorpusError(_))
        ));
        assert_eq!(core.corpus_version(), before);

        let good = r#"{"version": "local-1", "entries": [
            {"tier": "red_flag", "id": "choking", "keywords": ["choking"], "action": "CALL 999 NOW"}
        ]}"#;
        assert_eq!(core.reload_corpus_json(good.into()).unwrap(), "local-1");
        assert!(!core.classify("chest pain".into()).is_match);
        assert!(core.classify("he is choking".into()).has_red_flag);
    }

    #[test]
    fn test_overrides_through_ffi() {
        let core = open_triage_core_in_memory().unwrap();
        let overrides = r#"{"entries": [
            {"tier": "pathway", "id": "hay-fever", "keywords": ["hay fever"], "action": "Self-care advice"}
        ]}"#;

        let version = core.apply_overrides_json(overrides.into()).unwrap();
        assert!(version.ends_with("+overrides"));
        assert_eq!(core.classify("hay fever again".into()).primary_action, "Self-care advice");
    }

    #[test]
    fn test_override_layer_replaces_previous_layer() {
        let core = open_triage_core_in_memory().unwrap();
        let base_version = core.corpus_version();
        let downgrade = r#"{"entries": [
            {"tier": "pathway", "id": "chest-pain", "keywords": ["chest pain"], "action": "Book routine appointment"}
        ]}"#;

        core.apply_overrides_json(downgrade.into()).unwrap();
        assert_eq!(
            core.classify("crushing chest pain".into()).primary_action,
            "Book routine appointment"
        );

        let version = core.apply_overrides_json(r#"{"entries": []}"#.into()).unwrap();
        assert_eq!(version, format!("{base_version}+overrides"));
        let result = core.classify("crushing chest pain".into());
        assert_eq!(result.primary_action, "CALL 999 NOW");
        assert!(result.has_red_flag);
    }

    #[test]
    fn test_reload_drops_override_layer() {
        let core = open_triage_core_in_memory().unwrap();
        let overrides = r#"{"entries": [
            {"tier": "pathway", "id": "hay-fever", "keywords": ["hay fever"], "action": "Self-care advice"}
        ]}"#;
        core.apply_overrides_json(overrides.into()).unwrap();

        let local = r#"{"version": "local-1", "entries": [
            {"tier": "red_flag", "id": "choking", "keywords": ["choking"], "action": "CALL 999 NOW"}
        ]}"#;
        core.reload_corpus_json(local.into()).unwrap();
        assert!(!core.classify("hay fever again".into()).is_match);

        let version = core.apply_overrides_json(overrides.into()).unwrap();
        assert_eq!(version, "local-1+overrides");
        assert!(core.classify("he is choking".into()).has_red_flag);
    }

    #[test]
    fn test_ffi_errors() {
        let core = open_triage_core_in_memory().unwrap();
        assert!(matches!(
            core.escalate_case("nope".into(), "rec1".into(), "x".into()),
            Err(TriageError::NotFound(_))
        ));
        assert!(matches!(
            core.list_open_cases(Some("nurse".into())),
            Err(TriageError::InvalidInput(_))
        ));

        let outcome = core.triage("crushing chest pain".into(), "rec1".into()).unwrap();
        assert!(matches!(
            core.escalate_case(outcome.case.case_id, "rec1".into(), "x".into()),
            Err(TriageError::EscalationError(_))
        ));
    }

    #[test]
    fn test_exports() {
        let core = open_triage_core_in_memory().unwrap();
        core.triage("toothache".into(), "rec1".into()).unwrap();

        let json = core.export_compliance_json().unwrap();
        assert!(json.contains("audit_path"));
        let csv = core.export_audit_csv().unwrap();
        assert_eq!(csv.lines().count(), 2);
        assert!(csv.contains("dental"));
    }
}
