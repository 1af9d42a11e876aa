//! Escalation case database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{CaseStatus, EscalationCase, StaffTier};

const CASE_COLUMNS: &str = r#"
    case_id, query, classification, current_tier, required_tier,
    status, history, created_by, created_at, updated_at, outcome, resolved_by
"#;

impl Database {
    /// Insert a new escalation case.
    pub fn insert_case(&self, case: &EscalationCase) -> DbResult<()> {
        let classification_json = serde_json::to_string(&case.classification)?;
        let history_json = serde_json::to_string(&case.history)?;

        self.conn.execute(
            r#"
            INSERT INTO escalation_cases (
                case_id, query, classification, current_tier, required_tier,
                status, history, created_by, created_at, updated_at, outcome, resolved_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                case.case_id,
                case.query,
                classification_json,
                case.current_tier.as_str(),
                case.required_tier.map(StaffTier::as_str),
                case.status.as_str(),
                history_json,
                case.created_by,
                case.created_at,
                case.updated_at,
                case.outcome,
                case.resolved_by,
            ],
        )?;
        Ok(())
    }

    /// Persist the mutable parts of a case.
    ///
    /// Returns false if no case with that ID exists.
    pub fn update_case(&self, case: &EscalationCase) -> DbResult<bool> {
        let history_json = serde_json::to_string(&case.history)?;

        let rows_affected = self.conn.execute(
            r#"
            UPDATE escalation_cases SET
                current_tier = ?2,
                status = ?3,
                history = ?4,
                updated_at = ?5,
                outcome = ?6,
                resolved_by = ?7
            WHERE case_id = ?1
            "#,
            params![
                case.case_id,
                case.current_tier.as_str(),
                case.status.as_str(),
                history_json,
                case.updated_at,
                case.outcome,
                case.resolved_by,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a case by ID.
    pub fn get_case(&self, case_id: &str) -> DbResult<Option<EscalationCase>> {
        let sql = format!("SELECT {CASE_COLUMNS} FROM escalation_cases WHERE case_id = ?");
        self.conn
            .query_row(&sql, [case_id], CaseRow::from_row)
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Get a case by ID, failing if it does not exist.
    pub fn require_case(&self, case_id: &str) -> DbResult<EscalationCase> {
        self.get_case(case_id)?
            .ok_or_else(|| DbError::NotFound(format!("case {case_id}")))
    }

    /// Cases still awaiting action, oldest first.
    ///
    /// With a tier, only cases currently held at that tier are returned.
    pub fn list_open_cases(&self, tier: Option<StaffTier>) -> DbResult<Vec<EscalationCase>> {
        let sql = format!(
            r#"
            SELECT {CASE_COLUMNS}
            FROM escalation_cases
            WHERE status IN ('open', 'escalated')
              AND (?1 IS NULL OR current_tier = ?1)
            ORDER BY created_at ASC
            "#
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([tier.map(StaffTier::as_str)], CaseRow::from_row)?;

        let mut cases = Vec::new();
        for row in rows {
            cases.push(row?.try_into()?);
        }
        Ok(cases)
    }

    /// List cases by status, most recently updated first.
    pub fn list_cases_by_status(&self, status: CaseStatus) -> DbResult<Vec<EscalationCase>> {
        let sql = format!(
            r#"
            SELECT {CASE_COLUMNS}
            FROM escalation_cases
            WHERE status = ?
            ORDER BY updated_at DESC
            "#
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([status.as_str()], CaseRow::from_row)?;

        let mut cases = Vec::new();
        for row in rows {
            cases.push(row?.try_into()?);
        }
        Ok(cases)
    }

    /// Count cases per status.
    pub fn count_cases_by_status(&self) -> DbResult<Vec<(CaseStatus, u32)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM escalation_cases GROUP BY status ORDER BY status")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
        })?;

        let mut counts = Vec::new();
        for row in rows {
            let (status, count) = row?;
            counts.push((parse_status(&status)?, count));
        }
        Ok(counts)
    }
}

/// Internal row type for case queries.
struct CaseRow {
    case_id: String,
    query: String,
    classification: String,
    current_tier: String,
    required_tier: Option<String>,
    status: String,
    history: String,
    created_by: String,
    created_at: String,
    updated_at: String,
    outcome: Option<String>,
    resolved_by: Option<String>,
}

impl CaseRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            case_id: row.get(0)?,
            query: row.get(1)?,
            classification: row.get(2)?,
            current_tier: row.get(3)?,
            required_tier: row.get(4)?,
            status: row.get(5)?,
            history: row.get(6)?,
            created_by: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
            outcome: row.get(10)?,
            resolved_by: row.get(11)?,
        })
    }
}

impl TryFrom<CaseRow> for EscalationCase {
    type Error = DbError;

    fn try_from(row: CaseRow) -> Result<Self, Self::Error> {
        Ok(EscalationCase {
            case_id: row.case_id,
            query: row.query,
            classification: serde_json::from_str(&row.classification)?,
            current_tier: parse_tier(&row.current_tier)?,
            required_tier: row.required_tier.as_deref().map(parse_tier).transpose()?,
            status: parse_status(&row.status)?,
            history: serde_json::from_str(&row.history)?,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
            outcome: row.outcome,
            resolved_by: row.resolved_by,
        })
    }
}

fn parse_tier(s: &str) -> DbResult<StaffTier> {
    StaffTier::parse(s).ok_or_else(|| DbError::InvalidValue(format!("staff tier '{s}'")))
}

fn parse_status(s: &str) -> DbResult<CaseStatus> {
    CaseStatus::parse(s).ok_or_else(|| DbError::InvalidValue(format!("case status '{s}'")))
}
