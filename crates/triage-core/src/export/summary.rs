//! Audit summary export (JSON and CSV) for practice reporting.

use serde::{Deserialize, Serialize};

use super::EXPORT_FORMAT_VERSION;
use crate::audit::AuditResult;
use crate::db::{AuditEntry, Database};
use crate::models::{AuditEvent, AuditRecord, Disposition};

const CSV_HEADER: &str = "record_id,recorded_at,event,operator,corpus_version,disposition,primary_action,matched_ids,case_id,leaf_hash\n";

/// One audit record flattened for reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSummaryRow {
    pub record_id: String,
    pub recorded_at: String,
    pub event: AuditEvent,
    pub operator: String,
    pub corpus_version: String,
    pub disposition: Disposition,
    pub primary_action: String,
    pub matched_ids: Vec<String>,
    pub case_id: Option<String>,
    pub leaf_hash: String,
}

impl AuditSummaryRow {
    fn from_record(record: AuditRecord, leaf_hash: String) -> Self {
        Self {
            record_id: record.record_id,
            recorded_at: record.recorded_at,
            event: record.event,
            operator: record.operator,
            corpus_version: record.corpus_version,
            disposition: record.disposition,
            primary_action: record.primary_action,
            matched_ids: record.matched_ids,
            case_id: record.case_id,
            leaf_hash,
        }
    }

    fn to_csv_line(&self) -> String {
        format!(
            "{},{},{},{},{},{},{},{},{},{}\n",
            escape_csv(&self.record_id),
            escape_csv(&self.recorded_at),
            self.event.as_str(),
            escape_csv(&self.operator),
            escape_csv(&self.corpus_version),
            self.disposition.as_str(),
            escape_csv(&self.primary_action),
            escape_csv(&self.matched_ids.join(";")),
            escape_csv(self.case_id.as_deref().unwrap_or("")),
            self.leaf_hash,
        )
    }
}

/// Count of records per disposition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DispositionCount {
    pub disposition: Disposition,
    pub count: usize,
}

/// Audit summary over a set of records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSummary {
    pub format_version: String,
    pub exported_at: String,
    pub total_records: usize,
    /// Classifications per disposition, only those that occur, in
    /// first-seen order. Case hand-offs and closures are not counted.
    pub dispositions: Vec<DispositionCount>,
    pub rows: Vec<AuditSummaryRow>,
}

impl AuditSummary {
    pub fn from_rows(rows: Vec<AuditSummaryRow>) -> Self {
        let mut dispositions: Vec<DispositionCount> = Vec::new();
        for row in rows.iter().filter(|r| r.event == AuditEvent::Classified) {
            match dispositions.iter_mut().find(|d| d.disposition == row.disposition) {
                Some(entry) => entry.count += 1,
                None => dispositions.push(DispositionCount {
                    disposition: row.disposition,
                    count: 1,
                }),
            }
        }

        Self {
            format_version: EXPORT_FORMAT_VERSION.to_string(),
            exported_at: chrono::Utc::now().to_rfc3339(),
            total_records: rows.len(),
            dispositions,
            rows,
        }
    }

    pub fn count_for(&self, disposition: Disposition) -> usize {
        self.dispositions
            .iter()
            .find(|d| d.disposition == disposition)
            .map_or(0, |d| d.count)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// One line per record; matched ids are joined with `;`.
    pub fn to_csv(&self) -> String {
        let mut csv = String::from(CSV_HEADER);
        for row in &self.rows {
            csv.push_str(&row.to_csv_line());
        }
        csv
    }
}

/// Builds audit summaries from the log.
pub struct AuditSummaryExporter<'a> {
    db: &'a Database,
}

impl<'a> AuditSummaryExporter<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn export_all(&self) -> AuditResult<AuditSummary> {
        summarize(self.db.list_audit_entries()?)
    }

    pub fn export_date_range(&self, start: &str, end: &str) -> AuditResult<AuditSummary> {
        summarize(self.db.list_audit_entries_between(start, end)?)
    }

    /// Records linked to one escalation case.
    pub fn export_case(&self, case_id: &str) -> AuditResult<AuditSummary> {
        summarize(self.db.list_audit_entries_for_case(case_id)?)
    }
}

fn summarize(entries: Vec<AuditEntry>) -> AuditResult<AuditSummary> {
    let mut rows = Vec::with_capacity(entries.len());
    for entry in entries {
        let record: AuditRecord = serde_json::from_str(&entry.payload)?;
        rows.push(AuditSummaryRow::from_record(record, entry.leaf_hash));
    }
    Ok(AuditSummary::from_rows(rows))
}

/// Escape a field for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditTrail;
    use crate::classifier::classify;
    use crate::corpus::Corpus;
    use crate::workflow;

    fn commit(db: &Database, query: &str, operator: &str) {
        let result = classify(query, &Corpus::builtin());
        let record = AuditRecord::from_classification(query, &result, operator, None);
        AuditTrail::new(db).record(&record).unwrap();
    }

    #[test]
    fn test_summary_counts() {
        let db = Database::open_in_memory().unwrap();
        commit(&db, "earache and also worst headache of my life", "rec1");
        commit(&db, "sore throat", "rec1");
        commit(&db, "feeling a bit tired", "rec2");
        commit(&db, "earache", "rec2");

        let summary = AuditSummaryExporter::new(&db).export_all().unwrap();
        assert_eq!(summary.total_records, 4);
        assert_eq!(summary.count_for(Disposition::Emergency), 1);
        assert_eq!(summary.count_for(Disposition::PharmacyFirst), 2);
        assert_eq!(summary.count_for(Disposition::ManualEscalation), 1);
        assert_eq!(summary.count_for(Disposition::Signpost), 0);
        assert_eq!(summary.dispositions[0].disposition, Disposition::Emergency);
    }

    #[test]
    fn test_csv_rows() {
        let db = Database::open_in_memory().unwrap();
        commit(&db, "earache and also worst headache of my life", "Smith, J");

        let csv = AuditSummaryExporter::new(&db).export_all().unwrap().to_csv();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("record_id,recorded_at,event"));
        assert!(lines[1].contains(",classified,"));
        assert!(lines[1].contains("headache-severe;acute-otitis-media"));
        assert!(lines[1].contains("\"Smith, J\""));
        assert!(lines[1].contains(",emergency,"));
    }

    #[test]
    fn test_case_transitions_not_counted_as_dispositions() {
        let db = Database::open_in_memory().unwrap();
        let corpus = Corpus::builtin();
        let outcome = workflow::triage(&db, &corpus, "feeling a bit tired", "rec1").unwrap();
        workflow::resolve_case(&db, &outcome.case.case_id, "tri1", "Booked GP").unwrap();

        let summary = AuditSummaryExporter::new(&db)
            .export_case(&outcome.case.case_id)
            .unwrap();
        assert_eq!(summary.total_records, 2);
        assert_eq!(summary.count_for(Disposition::ManualEscalation), 1);

        let csv = summary.to_csv();
        assert!(csv.lines().nth(2).unwrap().contains(",resolved,tri1,"));
    }

    #[test]
    fn test_csv_escaping() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_csv("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn test_empty_summary() {
        let db = Database::open_in_memory().unwrap();
        let summary = AuditSummaryExporter::new(&db).export_all().unwrap();

        assert_eq!(summary.total_records, 0);
        assert_eq!(summary.to_csv(), CSV_HEADER);
        assert!(summary.to_json().unwrap().contains("\"rows\": []"));
    }
}
