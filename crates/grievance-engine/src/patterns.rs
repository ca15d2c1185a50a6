//! Pattern analysis over the complaint store
//!
//! Read-only mining of the store for recurring issues: per-severity
//! and per-type counts over a time window, recurring-type pattern
//! strings, and system-wide suggested actions front-loaded with
//! URGENT items when critical complaints are in-window.

use chrono::{DateTime, Duration, Utc};
use grievance_core::{Complaint, ComplaintType, Severity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::PatternConfig;
use crate::store::ComplaintStore;

/// System-wide recommendations derived from complaint patterns.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SystemReport {
    pub generated_at: DateTime<Utc>,
    pub total_complaints: usize,
    pub by_severity: BTreeMap<Severity, usize>,
    pub by_type: BTreeMap<ComplaintType, usize>,
    /// `"{type}: {count} instances"` for types at or beyond the
    /// repetition threshold.
    pub recent_patterns: Vec<String>,
    pub suggested_actions: Vec<String>,
}

pub struct PatternAnalyzer {
    store: Arc<ComplaintStore>,
    config: PatternConfig,
}

impl PatternAnalyzer {
    pub fn new(store: Arc<ComplaintStore>, config: PatternConfig) -> Self {
        Self { store, config }
    }

    /// Aggregate complaints for `agent_id` (or all agents) within the
    /// closed `[from, to]` window. Unbounded ends are open.
    pub fn report(
        &self,
        agent_id: Option<&str>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> SystemReport {
        let in_window: Vec<Complaint> = self
            .store
            .all()
            .into_iter()
            .filter(|c| agent_id.map_or(true, |a| c.agent_id == a))
            .filter(|c| from.map_or(true, |f| c.timestamp >= f))
            .filter(|c| to.map_or(true, |t| c.timestamp <= t))
            .collect();

        let mut by_severity: BTreeMap<Severity, usize> = BTreeMap::new();
        let mut by_type: BTreeMap<ComplaintType, usize> = BTreeMap::new();
        for c in &in_window {
            *by_severity.entry(c.severity).or_default() += 1;
            *by_type.entry(c.kind).or_default() += 1;
        }

        let recent_patterns: Vec<String> = by_type
            .iter()
            .filter(|(_, &count)| count >= self.config.repetition_threshold)
            .map(|(kind, count)| format!("{kind}: {count} instances"))
            .collect();

        let mut suggested_actions = Vec::new();
        if by_severity.get(&Severity::Critical).copied().unwrap_or(0) > 0 {
            suggested_actions.push(
                "URGENT: critical complaints detected - immediate review required".to_string(),
            );
        }
        if in_window.len() > self.config.volume_threshold {
            suggested_actions
                .push("High complaint volume - consider protocol adjustment".to_string());
        }
        for pattern in &recent_patterns {
            suggested_actions.push(format!("Investigate recurring pattern: {pattern}"));
        }

        SystemReport {
            generated_at: Utc::now(),
            total_complaints: in_window.len(),
            by_severity,
            by_type,
            recent_patterns,
            suggested_actions,
        }
    }

    /// Complaints sharing the queried complaint's type with
    /// overlapping context, within the similarity window around the
    /// queried timestamp. Never includes the queried complaint
    /// itself. Callers use the result size to decide whether a
    /// pattern escalation is warranted.
    pub fn find_similar_complaints(&self, complaint: &Complaint) -> Vec<Complaint> {
        let window = Duration::hours(self.config.similar_window_hours);
        let mut similar: Vec<Complaint> = self
            .store
            .all()
            .into_iter()
            .filter(|c| c.id != complaint.id)
            .filter(|c| c.kind == complaint.kind)
            .filter(|c| (c.timestamp - complaint.timestamp).abs() <= window)
            .filter(|c| context_overlaps(complaint, c))
            .collect();
        similar.sort_by_key(|c| c.timestamp);
        similar
    }
}

/// A query with no context matches on type alone; otherwise at least
/// one key must carry an equal value in both complaints.
fn context_overlaps(query: &Complaint, candidate: &Complaint) -> bool {
    if query.context.is_empty() {
        return true;
    }
    query
        .context
        .iter()
        .any(|(key, value)| candidate.context.get(key) == Some(value))
}
