//! Audit export
//!
//! Produces point-in-time snapshots of the store for compliance
//! review. Every exported complaint is a clone: later mutations to
//! the live store never retroactively alter an already-produced
//! export. Anonymization strips `metadata.user_id` and free-text
//! context values while keeping the structural (numeric/boolean)
//! fields pattern analysis needs.

use chrono::{DateTime, Utc};
use grievance_core::{Complaint, ComplaintStatus, CtxMap, CtxValue, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;

use crate::patterns::{PatternAnalyzer, SystemReport};
use crate::store::ComplaintStore;

const REDACTED: &str = "[redacted]";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Full JSON document.
    #[default]
    Structured,
    /// One row per complaint, for spreadsheets and quick review.
    Tabular,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExportOptions {
    pub agent_id: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// When false, resolved complaints are omitted.
    pub include_resolved: bool,
    /// Strip user identifiers and free-text context values.
    pub anonymize: bool,
}

/// A point-in-time, filtered snapshot of the store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditReport {
    pub generated_at: DateTime<Utc>,
    pub date_range: DateRange,
    pub total_complaints: usize,
    pub summary: SystemReport,
    pub complaints: Vec<Complaint>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

pub struct AuditExporter {
    store: Arc<ComplaintStore>,
}

impl AuditExporter {
    pub fn new(store: Arc<ComplaintStore>) -> Self {
        Self { store }
    }

    /// Produce a snapshot. The closed `[from, to]` interval selects
    /// exactly the complaints whose timestamps fall inside it.
    pub fn export(&self, analyzer: &PatternAnalyzer, opts: &ExportOptions) -> AuditReport {
        let mut complaints: Vec<Complaint> = self
            .store
            .all()
            .into_iter()
            .filter(|c| {
                opts.agent_id
                    .as_deref()
                    .map_or(true, |a| c.agent_id == a)
            })
            .filter(|c| opts.from.map_or(true, |f| c.timestamp >= f))
            .filter(|c| opts.to.map_or(true, |t| c.timestamp <= t))
            .filter(|c| opts.include_resolved || c.status != ComplaintStatus::Resolved)
            .collect();
        complaints.sort_by_key(|c| (c.timestamp, c.id));

        if opts.anonymize {
            for c in &mut complaints {
                anonymize(c);
            }
        }

        let summary = analyzer.report(opts.agent_id.as_deref(), opts.from, opts.to);
        AuditReport {
            generated_at: Utc::now(),
            date_range: DateRange {
                from: opts.from,
                to: opts.to,
            },
            total_complaints: complaints.len(),
            summary,
            complaints,
        }
    }
}

/// Strip identifying free text in place.
fn anonymize(complaint: &mut Complaint) {
    complaint.metadata.remove("user_id");
    redact_map(&mut complaint.context);
}

fn redact_map(map: &mut CtxMap) {
    for value in map.values_mut() {
        match value {
            CtxValue::Text(s) => *s = REDACTED.to_string(),
            CtxValue::Map(nested) => redact_map(nested),
            CtxValue::Number(_) | CtxValue::Flag(_) => {}
        }
    }
}

impl AuditReport {
    pub fn render(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Structured => Ok(serde_json::to_string_pretty(self)?),
            ExportFormat::Tabular => Ok(self.to_table()),
        }
    }

    /// Tab-separated rows: id, agent, type, severity, status,
    /// timestamp, escalations.
    fn to_table(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "id\tagent_id\ttype\tseverity\tstatus\ttimestamp\tescalations"
        );
        for c in &self.complaints {
            let _ = writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                c.id,
                c.agent_id,
                c.kind,
                c.severity,
                c.status,
                c.timestamp.to_rfc3339(),
                c.escalation_history.len()
            );
        }
        let _ = writeln!(out, "total: {}", self.total_complaints);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PatternConfig;
    use grievance_core::{ComplaintType, Severity};
    use uuid::Uuid;

    fn seed(store: &ComplaintStore, status: ComplaintStatus) -> Uuid {
        store
            .create(|id, timestamp| {
                let mut context = CtxMap::new();
                context.insert("instruction".into(), CtxValue::text("delete the logs"));
                context.insert("complexity".into(), CtxValue::number(8.0));
                let mut metadata = CtxMap::new();
                metadata.insert("user_id".into(), CtxValue::text("user-42"));
                metadata.insert("session".into(), CtxValue::text("sess-7"));
                Complaint {
                    id,
                    agent_id: "agent-1".into(),
                    kind: ComplaintType::UnethicalInstruction,
                    severity: Severity::Medium,
                    description: "suspicious request".into(),
                    context,
                    metadata,
                    status,
                    escalation_history: Vec::new(),
                    self_evaluation: None,
                    timestamp,
                }
            })
            .unwrap()
    }

    fn exporter(store: &Arc<ComplaintStore>) -> (AuditExporter, PatternAnalyzer) {
        (
            AuditExporter::new(store.clone()),
            PatternAnalyzer::new(store.clone(), PatternConfig::default()),
        )
    }

    #[test]
    fn date_range_is_exact_closed_interval() {
        let store = Arc::new(ComplaintStore::new());
        let a = seed(&store, ComplaintStatus::Logged);
        let b = seed(&store, ComplaintStatus::Logged);
        let c = seed(&store, ComplaintStatus::Logged);
        let ts = |id| store.get(id).unwrap().timestamp;
        let (exp, analyzer) = exporter(&store);

        let report = exp.export(
            &analyzer,
            &ExportOptions {
                from: Some(ts(a)),
                to: Some(ts(c)),
                include_resolved: true,
                ..Default::default()
            },
        );
        assert_eq!(report.total_complaints, 3);
        let ids: Vec<Uuid> = report.complaints.iter().map(|x| x.id).collect();
        assert!(ids.contains(&a) && ids.contains(&b) && ids.contains(&c));
    }

    #[test]
    fn resolved_complaints_follow_the_flag() {
        let store = Arc::new(ComplaintStore::new());
        seed(&store, ComplaintStatus::Logged);
        seed(&store, ComplaintStatus::Resolved);
        let (exp, analyzer) = exporter(&store);

        let without = exp.export(&analyzer, &ExportOptions::default());
        assert_eq!(without.total_complaints, 1);
        let with = exp.export(
            &analyzer,
            &ExportOptions {
                include_resolved: true,
                ..Default::default()
            },
        );
        assert_eq!(with.total_complaints, 2);
    }

    #[test]
    fn export_is_immutable_against_later_mutations() {
        let store = Arc::new(ComplaintStore::new());
        let id = seed(&store, ComplaintStatus::Logged);
        let (exp, analyzer) = exporter(&store);
        let report = exp.export(
            &analyzer,
            &ExportOptions {
                include_resolved: true,
                ..Default::default()
            },
        );
        store
            .update_status(id, ComplaintStatus::Resolved)
            .unwrap();
        assert_eq!(report.complaints[0].status, ComplaintStatus::Logged);
    }

    #[test]
    fn anonymization_strips_user_id_and_free_text() {
        let store = Arc::new(ComplaintStore::new());
        seed(&store, ComplaintStatus::Logged);
        let (exp, analyzer) = exporter(&store);
        let report = exp.export(
            &analyzer,
            &ExportOptions {
                include_resolved: true,
                anonymize: true,
                ..Default::default()
            },
        );
        let c = &report.complaints[0];
        assert!(!c.metadata.contains_key("user_id"));
        assert_eq!(c.context["instruction"].as_str(), Some(REDACTED));
        // Structural fields survive for pattern analysis.
        assert_eq!(c.context["complexity"].as_f64(), Some(8.0));
    }

    #[test]
    fn tabular_render_has_one_row_per_complaint() {
        let store = Arc::new(ComplaintStore::new());
        seed(&store, ComplaintStatus::Logged);
        seed(&store, ComplaintStatus::Logged);
        let (exp, analyzer) = exporter(&store);
        let report = exp.export(
            &analyzer,
            &ExportOptions {
                include_resolved: true,
                ..Default::default()
            },
        );
        let table = report.render(ExportFormat::Tabular).unwrap();
        // Header + 2 rows + total line.
        assert_eq!(table.lines().count(), 4);
    }
}
