//! Compliance export: audit records with inclusion proofs.

use serde::{Deserialize, Serialize};

use super::EXPORT_FORMAT_VERSION;
use crate::audit::{
    compute_root, verify_proof, AuditError, AuditResult, AuditTrail, InclusionProof,
    HASH_ALGORITHM,
};
use crate::db::{AuditEntry, Database};
use crate::models::AuditRecord;

/// One audit record with its proof.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordComplianceExport {
    pub metadata: ComplianceMetadata,
    pub record: AuditRecord,
    pub proof: InclusionProof,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceMetadata {
    pub format_version: String,
    pub exported_at: String,
    pub hash_algorithm: String,
    pub system_id: Option<String>,
}

impl RecordComplianceExport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// A set of records proven against one root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchComplianceExport {
    pub metadata: BatchComplianceMetadata,
    pub records: Vec<RecordComplianceExport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchComplianceMetadata {
    pub format_version: String,
    pub exported_at: String,
    pub hash_algorithm: String,
    /// Root every proof in the batch resolves to
    pub root_hash: Option<String>,
    pub tree_height: u32,
    /// Size of the whole log, not just this batch
    pub leaf_count: u32,
    pub system_id: Option<String>,
}

impl BatchComplianceExport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Check every proof, and that each leaf hash matches its record.
    pub fn verify_all_proofs(&self) -> Vec<ProofVerification> {
        self.records
            .iter()
            .map(|export| {
                let payload_matches = export
                    .record
                    .to_canonical_json()
                    .map(|json| crate::audit::hash_data(json.as_bytes()) == export.proof.leaf_hash)
                    .unwrap_or(false);
                let root_matches =
                    self.metadata.root_hash.as_deref() == Some(export.proof.root_hash.as_str());

                ProofVerification {
                    record_id: export.record.record_id.clone(),
                    leaf_hash: export.proof.leaf_hash.clone(),
                    is_valid: payload_matches && root_matches && verify_proof(&export.proof),
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofVerification {
    pub record_id: String,
    pub leaf_hash: String,
    pub is_valid: bool,
}

/// Builds compliance exports from the audit log.
pub struct ComplianceExporter<'a> {
    db: &'a Database,
    trail: AuditTrail<'a>,
    system_id: Option<String>,
}

impl<'a> ComplianceExporter<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            trail: AuditTrail::new(db),
            system_id: None,
        }
    }

    pub fn with_system_id(mut self, system_id: impl Into<String>) -> Self {
        self.system_id = Some(system_id.into());
        self
    }

    fn metadata(&self) -> ComplianceMetadata {
        ComplianceMetadata {
            format_version: EXPORT_FORMAT_VERSION.to_string(),
            exported_at: chrono::Utc::now().to_rfc3339(),
            hash_algorithm: HASH_ALGORITHM.to_string(),
            system_id: self.system_id.clone(),
        }
    }

    /// Export one record by leaf hash.
    pub fn export_by_hash(&self, leaf_hash: &str) -> AuditResult<RecordComplianceExport> {
        let payload = self
            .trail
            .get_payload(leaf_hash)?
            .ok_or_else(|| AuditError::LeafNotFound(leaf_hash.to_string()))?;

        Ok(RecordComplianceExport {
            metadata: self.metadata(),
            record: serde_json::from_str(&payload)?,
            proof: self.trail.generate_proof(leaf_hash)?,
        })
    }

    /// Export every record in the log.
    pub fn export_all(&self) -> AuditResult<BatchComplianceExport> {
        let entries = self.db.list_audit_entries()?;
        self.export_entries(entries)
    }

    /// Export records whose `recorded_at` falls within `[start, end]`.
    pub fn export_date_range(&self, start: &str, end: &str) -> AuditResult<BatchComplianceExport> {
        let entries = self.db.list_audit_entries_between(start, end)?;
        self.export_entries(entries)
    }

    fn export_entries(&self, entries: Vec<AuditEntry>) -> AuditResult<BatchComplianceExport> {
        // Proofs are built against one snapshot of the leaves.
        let leaves = self.db.get_all_leaf_hashes()?;
        let root = compute_root(&leaves);
        let state = self.db.get_audit_root()?;

        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            records.push(RecordComplianceExport {
                metadata: self.metadata(),
                record: serde_json::from_str(&entry.payload)?,
                proof: self.trail.generate_proof(&entry.leaf_hash)?,
            });
        }

        Ok(BatchComplianceExport {
            metadata: BatchComplianceMetadata {
                format_version: EXPORT_FORMAT_VERSION.to_string(),
                exported_at: chrono::Utc::now().to_rfc3339(),
                hash_algorithm: HASH_ALGORITHM.to_string(),
                root_hash: root.as_ref().map(|(hash, _)| hash.clone()),
                tree_height: root.map(|(_, height)| height).unwrap_or(state.tree_height),
                leaf_count: leaves.len() as u32,
                system_id: self.system_id.clone(),
            },
            records,
        })
    }
}
