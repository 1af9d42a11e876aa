//! SQLite schema definition.

/// Complete database schema for the triage navigator.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Escalation Cases (Mutable until closed)
-- ============================================================================

CREATE TABLE IF NOT EXISTS escalation_cases (
    case_id TEXT PRIMARY KEY,
    query TEXT NOT NULL,
    classification TEXT NOT NULL,               -- JSON CaseClassification
    current_tier TEXT NOT NULL,                 -- reception, triager, gp
    required_tier TEXT,                         -- NULL for emergencies
    status TEXT NOT NULL DEFAULT 'open',        -- open, escalated, resolved, emergency_handed_off
    history TEXT NOT NULL DEFAULT '[]',         -- JSON array of EscalationStep
    created_by TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    outcome TEXT,
    resolved_by TEXT
);

CREATE INDEX IF NOT EXISTS idx_cases_status ON escalation_cases(status);
CREATE INDEX IF NOT EXISTS idx_cases_tier ON escalation_cases(current_tier);

-- ============================================================================
-- Audit Log (Append-Only)
-- ============================================================================

CREATE TABLE IF NOT EXISTS audit_log (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,      -- leaf order in the Merkle tree
    leaf_hash TEXT NOT NULL UNIQUE,             -- SHA-256 of payload
    record_id TEXT NOT NULL UNIQUE,
    operator TEXT NOT NULL,
    corpus_version TEXT NOT NULL,
    disposition TEXT NOT NULL,
    case_id TEXT REFERENCES escalation_cases(case_id),
    recorded_at TEXT NOT NULL,
    payload TEXT NOT NULL,                      -- canonical JSON AuditRecord
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_audit_recorded_at ON audit_log(recorded_at);
CREATE INDEX IF NOT EXISTS idx_audit_case ON audit_log(case_id);

CREATE TRIGGER IF NOT EXISTS audit_log_no_update BEFORE UPDATE ON audit_log
BEGIN
    SELECT RAISE(ABORT, 'audit_log is append-only');
END;

CREATE TRIGGER IF NOT EXISTS audit_log_no_delete BEFORE DELETE ON audit_log
BEGIN
    SELECT RAISE(ABORT, 'audit_log is append-only');
END;

-- Current Merkle root (single row, updated atomically)
CREATE TABLE IF NOT EXISTS audit_root (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    root_hash TEXT,
    tree_height INTEGER NOT NULL DEFAULT 0,
    leaf_count INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Initialize with empty tree state
INSERT OR IGNORE INTO audit_root (id, root_hash, tree_height, leaf_count)
VALUES (1, NULL, 0, 0);
"#;
