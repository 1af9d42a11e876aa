//! Inclusion proofs for audit records.

use serde::{Deserialize, Serialize};

use super::tree::hash_pair;

/// Hash algorithm named in exported proofs.
pub const HASH_ALGORITHM: &str = "SHA-256";

/// Which side of the running hash a sibling sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

/// One sibling on the path from a leaf to the root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub hash: String,
    pub position: Side,
}

/// Merkle inclusion proof (RFC 6962 style audit path).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InclusionProof {
    pub algorithm: String,
    /// Hash of the record's canonical JSON
    pub leaf_hash: String,
    /// Root the path resolves to
    pub root_hash: String,
    /// Zero-based position in the log
    pub leaf_index: usize,
    /// Log size the root was computed over
    pub leaf_count: usize,
    pub audit_path: Vec<PathStep>,
}

impl InclusionProof {
    /// Check that the audit path folds the leaf into the root.
    pub fn verify(&self) -> bool {
        verify_proof(self)
    }
}

/// Verify an inclusion proof without database access.
pub fn verify_proof(proof: &InclusionProof) -> bool {
    if proof.algorithm != HASH_ALGORITHM {
        return false;
    }

    let computed = proof
        .audit_path
        .iter()
        .fold(proof.leaf_hash.clone(), |acc, step| match step.position {
            Side::Right => hash_pair(&acc, &step.hash),
            Side::Left => hash_pair(&step.hash, &acc),
        });

    computed == proof.root_hash
}
