//! Audit log database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::AuditRecord;

/// A stored audit log row.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    /// Leaf position (1-based insertion order)
    pub seq: i64,
    pub leaf_hash: String,
    pub record_id: String,
    pub recorded_at: String,
    /// Canonical JSON of the record
    pub payload: String,
}

/// Current audit root state.
#[derive(Debug, Clone)]
pub struct AuditRootState {
    pub root_hash: Option<String>,
    pub tree_height: u32,
    pub leaf_count: u32,
    pub updated_at: String,
}

impl Database {
    /// Append an audit entry.
    pub fn insert_audit_entry(
        &self,
        leaf_hash: &str,
        record: &AuditRecord,
        payload: &str,
    ) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO audit_log (
                leaf_hash, record_id, operator, corpus_version,
                disposition, case_id, recorded_at, payload
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                leaf_hash,
                record.record_id,
                record.operator,
                record.corpus_version,
                record.disposition.as_str(),
                record.case_id,
                record.recorded_at,
                payload,
            ],
        )?;
        Ok(())
    }

    /// Check if a leaf is already in the log.
    pub fn audit_entry_exists(&self, leaf_hash: &str) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM audit_log WHERE leaf_hash = ?",
            [leaf_hash],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Get a leaf's payload by hash.
    pub fn get_audit_payload(&self, leaf_hash: &str) -> DbResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT payload FROM audit_log WHERE leaf_hash = ?",
                [leaf_hash],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    /// All leaf hashes in insertion order.
    pub fn get_all_leaf_hashes(&self) -> DbResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT leaf_hash FROM audit_log ORDER BY seq")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// All entries in insertion order.
    pub fn list_audit_entries(&self) -> DbResult<Vec<AuditEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT seq, leaf_hash, record_id, recorded_at, payload
            FROM audit_log
            ORDER BY seq
            "#,
        )?;
        let rows = stmt.query_map([], map_entry)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Entries recorded within `[start, end]` (RFC 3339 strings compare
    /// lexicographically when they share a UTC offset).
    pub fn list_audit_entries_between(&self, start: &str, end: &str) -> DbResult<Vec<AuditEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT seq, leaf_hash, record_id, recorded_at, payload
            FROM audit_log
            WHERE recorded_at >= ?1 AND recorded_at <= ?2
            ORDER BY seq
            "#,
        )?;
        let rows = stmt.query_map(params![start, end], map_entry)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Audit entries linked to an escalation case.
    pub fn list_audit_entries_for_case(&self, case_id: &str) -> DbResult<Vec<AuditEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT seq, leaf_hash, record_id, recorded_at, payload
            FROM audit_log
            WHERE case_id = ?
            ORDER BY seq
            "#,
        )?;
        let rows = stmt.query_map([case_id], map_entry)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Get current root state.
    pub fn get_audit_root(&self) -> DbResult<AuditRootState> {
        self.conn
            .query_row(
                "SELECT root_hash, tree_height, leaf_count, updated_at FROM audit_root WHERE id = 1",
                [],
                |row| {
                    Ok(AuditRootState {
                        root_hash: row.get(0)?,
                        tree_height: row.get(1)?,
                        leaf_count: row.get(2)?,
                        updated_at: row.get(3)?,
                    })
                },
            )
            .map_err(Into::into)
    }

    /// Update root state atomically.
    pub fn update_audit_root(
        &self,
        root_hash: &str,
        tree_height: u32,
        leaf_count: u32,
    ) -> DbResult<()> {
        self.conn.execute(
            r#"
            UPDATE audit_root
            SET root_hash = ?, tree_height = ?, leaf_count = ?, updated_at = datetime('now')
            WHERE id = 1
            "#,
            params![root_hash, tree_height, leaf_count],
        )?;
        Ok(())
    }
}

fn map_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<AuditEntry> {
    Ok(AuditEntry {
        seq: row.get(0)?,
        leaf_hash: row.get(1)?,
        record_id: row.get(2)?,
        recorded_at: row.get(3)?,
        payload: row.get(4)?,
    })
}
