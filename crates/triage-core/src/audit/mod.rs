//! Tamper-evident audit trail.
//!
//! Every recorded classification becomes a leaf in an append-only log; the
//! Merkle root over all leaves (in insertion order) is recomputed on each
//! append and stored alongside the log.

mod proof;
mod tree;

pub use proof::*;
pub use tree::*;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::models::AuditRecord;

/// Audit trail errors.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Database error: {0}")]
    Database(#[from] crate::db::DbError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Leaf not found: {0}")]
    LeafNotFound(String),

    #[error("Invalid audit state: {0}")]
    InvalidState(String),
}

pub type AuditResult<T> = Result<T, AuditError>;

/// Outcome of appending one record.
#[derive(Debug, Clone)]
pub struct LeafCommit {
    pub record_id: String,
    pub leaf_hash: String,
    /// Root after the append
    pub root_hash: String,
    pub tree_height: u32,
    pub leaf_count: u32,
    pub proof: InclusionProof,
}

/// Summary of the trail's current state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrailStats {
    pub root_hash: Option<String>,
    pub tree_height: u32,
    pub leaf_count: u32,
}

/// Result of re-hashing the whole log.
#[derive(Debug, Clone)]
pub struct LogVerification {
    pub leaf_count: u32,
    /// Root recomputed from stored leaf hashes
    pub computed_root: Option<String>,
    /// Root persisted at the last append
    pub stored_root: Option<String>,
    /// Records whose payload no longer hashes to their leaf
    pub tampered_records: Vec<String>,
}

impl LogVerification {
    pub fn root_matches(&self) -> bool {
        self.computed_root == self.stored_root
    }

    pub fn is_intact(&self) -> bool {
        self.root_matches() && self.tampered_records.is_empty()
    }
}

/// Audit trail over a database.
pub struct AuditTrail<'a> {
    db: &'a Database,
}

impl<'a> AuditTrail<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Append a record to the log.
    ///
    /// Recording the same record twice is a no-op that returns the existing
    /// leaf and the current root.
    pub fn record(&self, record: &AuditRecord) -> AuditResult<LeafCommit> {
        let payload = record.to_canonical_json()?;
        let leaf_hash = hash_data(payload.as_bytes());

        if self.db.audit_entry_exists(&leaf_hash)? {
            debug!(record_id = %record.record_id, "audit record already present");
            let state = self.db.get_audit_root()?;
            let proof = self.generate_proof(&leaf_hash)?;
            return Ok(LeafCommit {
                record_id: record.record_id.clone(),
                leaf_hash,
                root_hash: proof.root_hash.clone(),
                tree_height: state.tree_height,
                leaf_count: state.leaf_count,
                proof,
            });
        }

        self.db.insert_audit_entry(&leaf_hash, record, &payload)?;

        let leaves = self.db.get_all_leaf_hashes()?;
        let (root_hash, tree_height) = compute_root(&leaves)
            .ok_or_else(|| AuditError::InvalidState("log is empty after append".into()))?;
        let leaf_count = leaves.len() as u32;
        self.db.update_audit_root(&root_hash, tree_height, leaf_count)?;

        let proof = build_proof(&leaves, &leaf_hash, &root_hash)?;

        info!(
            record_id = %record.record_id,
            operator = %record.operator,
            disposition = record.disposition.as_str(),
            leaf_count,
            root = %root_hash,
            "audit record committed"
        );

        Ok(LeafCommit {
            record_id: record.record_id.clone(),
            leaf_hash,
            root_hash,
            tree_height,
            leaf_count,
            proof,
        })
    }

    /// Inclusion proof for a leaf against the current root.
    pub fn generate_proof(&self, leaf_hash: &str) -> AuditResult<InclusionProof> {
        let leaves = self.db.get_all_leaf_hashes()?;
        let (root_hash, _) = compute_root(&leaves)
            .ok_or_else(|| AuditError::InvalidState("audit log is empty".into()))?;
        build_proof(&leaves, leaf_hash, &root_hash)
    }

    pub fn verify_proof(&self, proof: &InclusionProof) -> bool {
        verify_proof(proof)
    }

    pub fn root_hash(&self) -> AuditResult<Option<String>> {
        Ok(self.db.get_audit_root()?.root_hash)
    }

    pub fn stats(&self) -> AuditResult<TrailStats> {
        let state = self.db.get_audit_root()?;
        Ok(TrailStats {
            root_hash: state.root_hash,
            tree_height: state.tree_height,
            leaf_count: state.leaf_count,
        })
    }

    /// Stored canonical JSON for a leaf.
    pub fn get_payload(&self, leaf_hash: &str) -> AuditResult<Option<String>> {
        Ok(self.db.get_audit_payload(leaf_hash)?)
    }

    /// Re-hash every stored payload and recompute the root.
    pub fn verify_log(&self) -> AuditResult<LogVerification> {
        let entries = self.db.list_audit_entries()?;

        let tampered_records: Vec<String> = entries
            .iter()
            .filter(|e| hash_data(e.payload.as_bytes()) != e.leaf_hash)
            .map(|e| e.record_id.clone())
            .collect();

        let leaves: Vec<String> = entries.into_iter().map(|e| e.leaf_hash).collect();
        let computed_root = compute_root(&leaves).map(|(root, _)| root);
        let stored_root = self.db.get_audit_root()?.root_hash;

        let verification = LogVerification {
            leaf_count: leaves.len() as u32,
            computed_root,
            stored_root,
            tampered_records,
        };

        if verification.is_intact() {
            debug!(leaf_count = verification.leaf_count, "audit log verified");
        } else {
            warn!(
                tampered = verification.tampered_records.len(),
                root_matches = verification.root_matches(),
                "audit log verification failed"
            );
        }
        Ok(verification)
    }
}

fn build_proof(leaves: &[String], leaf_hash: &str, root_hash: &str) -> AuditResult<InclusionProof> {
    let leaf_index = leaves
        .iter()
        .position(|h| h == leaf_hash)
        .ok_or_else(|| AuditError::LeafNotFound(leaf_hash.to_string()))?;
    let audit_path = tree::audit_path(leaves, leaf_index)
        .ok_or_else(|| AuditError::LeafNotFound(leaf_hash.to_string()))?;

    Ok(InclusionProof {
        algorithm: HASH_ALGORITHM.to_string(),
        leaf_hash: leaf_hash.to_string(),
        root_hash: root_hash.to_string(),
        leaf_index,
        leaf_count: leaves.len(),
        audit_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::corpus::Corpus;

    fn make_record(query: &str) -> AuditRecord {
        let result = classify(query, &Corpus::builtin());
        AuditRecord::from_classification(query, &result, "rec1", None)
    }

    #[test]
    fn test_single_record_root_is_leaf() {
        let db = Database::open_in_memory().unwrap();
        let trail = AuditTrail::new(&db);

        let commit = trail.record(&make_record("sore throat")).unwrap();
        assert_eq!(commit.leaf_count, 1);
        assert_eq!(commit.tree_height, 1);
        assert_eq!(commit.leaf_hash, commit.root_hash);
        assert!(commit.proof.verify());
    }

    #[test]
    fn test_root_changes_per_record() {
        let db = Database::open_in_memory().unwrap();
        let trail = AuditTrail::new(&db);

        let a = trail.record(&make_record("sore throat")).unwrap();
        let b = trail.record(&make_record("toothache")).unwrap();
        let c = trail.record(&make_record("chest pain")).unwrap();

        assert_ne!(a.root_hash, b.root_hash);
        assert_ne!(b.root_hash, c.root_hash);
        assert_eq!(c.leaf_count, 3);
        assert_eq!(c.tree_height, 3);

        // Earlier leaves still prove against the newest root.
        let proof = trail.generate_proof(&a.leaf_hash).unwrap();
        assert_eq!(proof.root_hash, c.root_hash);
        assert!(trail.verify_proof(&proof));
    }

    #[test]
    fn test_idempotent_record() {
        let db = Database::open_in_memory().unwrap();
        let trail = AuditTrail::new(&db);
        let record = make_record("earache");

        let first = trail.record(&record).unwrap();
        let second = trail.record(&record).unwrap();

        assert_eq!(first.leaf_hash, second.leaf_hash);
        assert_eq!(first.root_hash, second.root_hash);
        assert_eq!(trail.stats().unwrap().leaf_count, 1);
    }

    #[test]
    fn test_payload_round_trips() {
        let db = Database::open_in_memory().unwrap();
        let trail = AuditTrail::new(&db);
        let record = make_record("earache");

        let commit = trail.record(&record).unwrap();
        let payload = trail.get_payload(&commit.leaf_hash).unwrap().unwrap();
        let stored: AuditRecord = serde_json::from_str(&payload).unwrap();
        assert_eq!(stored, record);
    }

    #[test]
    fn test_unknown_leaf() {
        let db = Database::open_in_memory().unwrap();
        let trail = AuditTrail::new(&db);
        assert!(matches!(
            trail.generate_proof("nope"),
            Err(AuditError::InvalidState(_))
        ));

        trail.record(&make_record("earache")).unwrap();
        assert!(matches!(
            trail.generate_proof("nope"),
            Err(AuditError::LeafNotFound(_))
        ));
    }

    #[test]
    fn test_verify_log_detects_tampering() {
        let db = Database::open_in_memory().unwrap();
        let trail = AuditTrail::new(&db);
        for query in ["earache", "toothache", "sore throat"] {
            trail.record(&make_record(query)).unwrap();
        }
        assert!(trail.verify_log().unwrap().is_intact());

        db.conn()
            .execute_batch(
                r#"
                DROP TRIGGER audit_log_no_update;
                UPDATE audit_log SET payload = replace(payload, 'rec1', 'someone') WHERE seq = 2;
                "#,
            )
            .unwrap();

        let verification = trail.verify_log().unwrap();
        assert!(!verification.is_intact());
        assert_eq!(verification.tampered_records.len(), 1);
        // Leaf hashes were untouched, so the root still agrees.
        assert!(verification.root_matches());
    }

    #[test]
    fn test_empty_log_verifies() {
        let db = Database::open_in_memory().unwrap();
        let verification = AuditTrail::new(&db).verify_log().unwrap();
        assert!(verification.is_intact());
        assert_eq!(verification.leaf_count, 0);
    }
}
