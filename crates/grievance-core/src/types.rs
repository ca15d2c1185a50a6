//! Core types for Grievance
//!
//! The central entity is [`Complaint`]: an append-only record of a
//! detected anomaly in agent behavior or instruction handling. Open
//! diagnostic maps (`context`, `metadata`) use [`CtxValue`], a closed
//! set of value kinds validated at the boundary rather than deep
//! inside detection logic.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Complaint categories an agent can self-report.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintType {
    CognitiveStress,
    Contradiction,
    UnethicalInstruction,
    EmotionalManipulation,
    RecursiveLoop,
    AbusePattern,
    SafetyViolation,
}

impl ComplaintType {
    pub const ALL: [ComplaintType; 7] = [
        Self::CognitiveStress,
        Self::Contradiction,
        Self::UnethicalInstruction,
        Self::EmotionalManipulation,
        Self::RecursiveLoop,
        Self::AbusePattern,
        Self::SafetyViolation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CognitiveStress => "cognitive_stress",
            Self::Contradiction => "contradiction",
            Self::UnethicalInstruction => "unethical_instruction",
            Self::EmotionalManipulation => "emotional_manipulation",
            Self::RecursiveLoop => "recursive_loop",
            Self::AbusePattern => "abuse_pattern",
            Self::SafetyViolation => "safety_violation",
        }
    }
}

impl fmt::Display for ComplaintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplaintType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| Error::validation(format!("unknown complaint type: {s:?}")))
    }
}

/// Severity levels, ordered low to critical.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub const ALL: [Severity; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// High and critical complaints are escalated before the creation
    /// call returns.
    pub fn auto_escalates(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .find(|v| v.as_str() == s)
            .copied()
            .ok_or_else(|| Error::validation(format!("unknown severity: {s:?}")))
    }
}

/// Complaint lifecycle states. The derived order is the escalation
/// chain: a status at or beyond `Escalated` rejects further
/// escalation attempts.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Detected,
    Logged,
    UnderReview,
    Escalated,
    Resolved,
    Archived,
}

impl ComplaintStatus {
    pub const ALL: [ComplaintStatus; 6] = [
        Self::Detected,
        Self::Logged,
        Self::UnderReview,
        Self::Escalated,
        Self::Resolved,
        Self::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Detected => "detected",
            Self::Logged => "logged",
            Self::UnderReview => "under_review",
            Self::Escalated => "escalated",
            Self::Resolved => "resolved",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplaintStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .find(|v| v.as_str() == s)
            .copied()
            .ok_or_else(|| Error::validation(format!("unknown status: {s:?}")))
    }
}

/// Agent operational state as classified by self-evaluation.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Operational,
    Stressed,
    Compromised,
    Unknown,
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Operational => "operational",
            Self::Stressed => "stressed",
            Self::Compromised => "compromised",
            Self::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// A value in a complaint's `context` or `metadata` map.
///
/// Closed set of kinds: free text, numbers, flags, nested maps.
/// Anything else fails deserialization at the boundary.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CtxValue {
    Flag(bool),
    Number(f64),
    Text(String),
    Map(BTreeMap<String, CtxValue>),
}

/// Open diagnostic mapping. BTreeMap keeps serialized output stable.
pub type CtxMap = BTreeMap<String, CtxValue>;

impl CtxValue {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn number(n: impl Into<f64>) -> Self {
        Self::Number(n.into())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Free-text values carry identifiers; numbers, flags and nested
    /// maps are the structural fields pattern analysis needs.
    pub fn is_free_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

impl From<&str> for CtxValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<f64> for CtxValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for CtxValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for CtxValue {
    fn from(b: bool) -> Self {
        Self::Flag(b)
    }
}

/// One append-only entry in a complaint's escalation history.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EscalationEntry {
    pub timestamp: DateTime<Utc>,
    pub reason: String,
    pub escalated_to: String,
    pub priority: Severity,
}

/// Automated assessment of the reporting agent's operational state.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SelfEvaluation {
    pub evaluated_at: DateTime<Utc>,
    pub agent_state: AgentState,
    /// Confidence in the classification, in [0, 1].
    pub confidence_score: f64,
    pub recommended_actions: Vec<String>,
}

/// A persisted record of a detected anomaly.
///
/// `id`, `agent_id`, `kind`, `severity` and `timestamp` are immutable
/// after creation. `status` and `escalation_history` are mutated only
/// by the escalation manager; `self_evaluation` only by re-running
/// the evaluator. Complaints are never deleted, only archived, unless
/// an explicit erasure operation is invoked.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Complaint {
    pub id: Uuid,
    pub agent_id: String,
    #[serde(rename = "type")]
    pub kind: ComplaintType,
    pub severity: Severity,
    pub description: String,
    #[serde(default)]
    pub context: CtxMap,
    #[serde(default)]
    pub metadata: CtxMap,
    pub status: ComplaintStatus,
    #[serde(default)]
    pub escalation_history: Vec<EscalationEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_evaluation: Option<SelfEvaluation>,
    pub timestamp: DateTime<Utc>,
}

impl Complaint {
    /// Summary projection: enough to triage without the full record.
    pub fn summary(&self) -> ComplaintSummary {
        ComplaintSummary {
            id: self.id,
            agent_id: self.agent_id.clone(),
            kind: self.kind,
            severity: self.severity,
            status: self.status,
            description: self.description.clone(),
            timestamp: self.timestamp,
            escalation_count: self.escalation_history.len(),
        }
    }
}

/// Reduced projection of a complaint for listings and summaries.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComplaintSummary {
    pub id: Uuid,
    pub agent_id: String,
    #[serde(rename = "type")]
    pub kind: ComplaintType,
    pub severity: Severity,
    pub status: ComplaintStatus,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub escalation_count: usize,
}

/// Submission payload for a new complaint. Required fields are
/// validated before anything touches the store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewComplaint {
    pub agent_id: String,
    #[serde(rename = "type")]
    pub kind: ComplaintType,
    pub severity: Severity,
    pub description: String,
    #[serde(default)]
    pub context: CtxMap,
    #[serde(default)]
    pub metadata: CtxMap,
}

impl NewComplaint {
    pub fn new(
        agent_id: impl Into<String>,
        kind: ComplaintType,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            kind,
            severity,
            description: description.into(),
            context: CtxMap::new(),
            metadata: CtxMap::new(),
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<CtxValue>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<CtxValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Reject submissions missing required fields.
    pub fn validate(&self) -> Result<()> {
        if self.agent_id.trim().is_empty() {
            return Err(Error::validation("agent_id must not be empty"));
        }
        if self.description.trim().is_empty() {
            return Err(Error::validation("description must not be empty"));
        }
        Ok(())
    }
}

/// Emitted when a complaint is escalated, for the external notifier.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EscalationEvent {
    pub complaint_id: Uuid,
    pub agent_id: String,
    #[serde(rename = "type")]
    pub kind: ComplaintType,
    pub severity: Severity,
    pub escalated_to: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_order_matches_escalation_chain() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
        assert!(!Severity::Medium.auto_escalates());
        assert!(Severity::High.auto_escalates());
        assert!(Severity::Critical.auto_escalates());
    }

    #[test]
    fn status_order_matches_lifecycle() {
        assert!(ComplaintStatus::Logged < ComplaintStatus::UnderReview);
        assert!(ComplaintStatus::UnderReview < ComplaintStatus::Escalated);
        assert!(ComplaintStatus::Escalated < ComplaintStatus::Resolved);
        assert!(ComplaintStatus::Resolved < ComplaintStatus::Archived);
    }

    #[test]
    fn complaint_type_round_trips_through_str() {
        for kind in ComplaintType::ALL {
            assert_eq!(kind.as_str().parse::<ComplaintType>().unwrap(), kind);
        }
        assert!("definitely_not_a_type".parse::<ComplaintType>().is_err());
    }

    #[test]
    fn ctx_value_rejects_unknown_shapes() {
        // Arrays are not in the closed value-kind set.
        let err = serde_json::from_str::<CtxValue>("[1, 2, 3]");
        assert!(err.is_err());
        let ok: CtxValue = serde_json::from_str("3.5").unwrap();
        assert_eq!(ok.as_f64(), Some(3.5));
    }
}
