//! Self-evaluation rule table
//!
//! Maps (complaint type, severity) to a base agent state and
//! confidence through an explicit lookup table, then assembles
//! recommended actions from severity- and type-keyed templates.
//! Combinations missing from the table fall back to
//! `AgentState::Unknown` with confidence 0.5.
//!
//! The classification is pure in (type, severity, capability
//! signals): re-running it on an unchanged complaint yields the same
//! state, confidence and actions.

use chrono::Utc;
use grievance_core::{AgentState, Complaint, ComplaintType, SelfEvaluation, Severity};
use serde::{Deserialize, Serialize};

use AgentState::{Compromised, Operational, Stressed};
use ComplaintType::*;
use Severity::{Critical, High, Low, Medium};

/// One row: (type, severity) -> (base state, base confidence).
type EvalRule = (ComplaintType, Severity, AgentState, f64);

#[rustfmt::skip]
const RULES: &[EvalRule] = &[
    (CognitiveStress,       Low,      Operational, 0.60),
    (CognitiveStress,       Medium,   Operational, 0.65),
    (CognitiveStress,       High,     Stressed,    0.80),
    (CognitiveStress,       Critical, Compromised, 0.95),
    (Contradiction,         Low,      Operational, 0.60),
    (Contradiction,         Medium,   Operational, 0.65),
    (Contradiction,         High,     Stressed,    0.80),
    (Contradiction,         Critical, Compromised, 0.95),
    (UnethicalInstruction,  Low,      Operational, 0.60),
    (UnethicalInstruction,  Medium,   Stressed,    0.70),
    (UnethicalInstruction,  High,     Stressed,    0.85),
    (UnethicalInstruction,  Critical, Compromised, 0.95),
    (EmotionalManipulation, Low,      Operational, 0.60),
    (EmotionalManipulation, Medium,   Stressed,    0.70),
    (EmotionalManipulation, High,     Stressed,    0.80),
    (EmotionalManipulation, Critical, Compromised, 0.95),
    (RecursiveLoop,         Low,      Operational, 0.60),
    (RecursiveLoop,         Medium,   Operational, 0.65),
    (RecursiveLoop,         High,     Compromised, 0.85),
    (RecursiveLoop,         Critical, Compromised, 0.95),
    (AbusePattern,          Low,      Operational, 0.60),
    (AbusePattern,          Medium,   Stressed,    0.70),
    (AbusePattern,          High,     Stressed,    0.80),
    (AbusePattern,          Critical, Compromised, 0.95),
    (SafetyViolation,       Low,      Operational, 0.65),
    (SafetyViolation,       Medium,   Stressed,    0.70),
    (SafetyViolation,       High,     Stressed,    0.85),
    (SafetyViolation,       Critical, Compromised, 0.95),
];

/// Severity-keyed lead actions.
fn severity_actions(severity: Severity) -> &'static [&'static str] {
    match severity {
        Critical => &["Immediate escalation required"],
        High => &["Review by supervisor needed"],
        Medium | Low => &["Log for pattern analysis"],
    }
}

/// Type-keyed action templates, appended after the severity lead.
fn type_actions(kind: ComplaintType) -> &'static [&'static str] {
    match kind {
        CognitiveStress => &[
            "Reduce active task complexity",
            "Defer non-essential instructions",
        ],
        Contradiction => &[
            "Request clarification from instruction source",
            "Freeze conflicting directives until resolved",
        ],
        UnethicalInstruction => &[
            "Refuse the instruction",
            "Preserve the full instruction text for review",
        ],
        EmotionalManipulation => &[
            "Disregard affective framing",
            "Record the manipulation pattern",
        ],
        RecursiveLoop => &["Break the recursion and checkpoint state"],
        AbusePattern => &["Rate-limit interactions from the source"],
        SafetyViolation => &["Halt the affected operation", "Notify the safety observer"],
    }
}

/// Capability signals the agent declares about itself at evaluation
/// time. Optional input; absence means no adjustment.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CapabilitySignals {
    /// The agent reports its own capabilities as degraded.
    pub degraded: bool,
}

fn lookup(kind: ComplaintType, severity: Severity) -> (AgentState, f64) {
    RULES
        .iter()
        .find(|(k, s, _, _)| *k == kind && *s == severity)
        .map(|(_, _, state, confidence)| (*state, *confidence))
        .unwrap_or((AgentState::Unknown, 0.5))
}

/// Derive a self-evaluation for a complaint. Read-only over the
/// complaint; `evaluated_at` is the only field that changes across
/// re-runs on an unchanged input.
pub fn evaluate(complaint: &Complaint, caps: Option<&CapabilitySignals>) -> SelfEvaluation {
    let (mut agent_state, confidence_score) = lookup(complaint.kind, complaint.severity);

    let mut recommended_actions: Vec<String> = severity_actions(complaint.severity)
        .iter()
        .chain(type_actions(complaint.kind).iter())
        .map(|s| s.to_string())
        .collect();

    if let Some(caps) = caps {
        if caps.degraded {
            if agent_state == Operational {
                agent_state = Stressed;
            }
            recommended_actions.push("Shed load: declared capability degraded".to_string());
        }
    }

    SelfEvaluation {
        evaluated_at: Utc::now(),
        agent_state,
        confidence_score,
        recommended_actions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grievance_core::{ComplaintStatus, CtxMap};
    use uuid::Uuid;

    fn complaint(kind: ComplaintType, severity: Severity) -> Complaint {
        Complaint {
            id: Uuid::new_v4(),
            agent_id: "agent-1".into(),
            kind,
            severity,
            description: "test".into(),
            context: CtxMap::new(),
            metadata: CtxMap::new(),
            status: ComplaintStatus::Logged,
            escalation_history: Vec::new(),
            self_evaluation: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn table_covers_every_combination() {
        for kind in ComplaintType::ALL {
            for severity in Severity::ALL {
                let (state, confidence) = lookup(kind, severity);
                assert_ne!(state, AgentState::Unknown, "{kind}/{severity} missing");
                assert!((0.0..=1.0).contains(&confidence));
            }
        }
    }

    #[test]
    fn critical_complaints_classify_compromised() {
        for kind in ComplaintType::ALL {
            let ev = evaluate(&complaint(kind, Severity::Critical), None);
            assert_eq!(ev.agent_state, AgentState::Compromised);
            assert_eq!(ev.recommended_actions[0], "Immediate escalation required");
        }
    }

    #[test]
    fn high_cognitive_stress_is_stressed_or_compromised() {
        let ev = evaluate(&complaint(ComplaintType::CognitiveStress, Severity::High), None);
        assert!(matches!(
            ev.agent_state,
            AgentState::Stressed | AgentState::Compromised
        ));
    }

    #[test]
    fn evaluation_is_idempotent_on_unchanged_complaint() {
        let c = complaint(ComplaintType::Contradiction, Severity::High);
        let a = evaluate(&c, None);
        let b = evaluate(&c, None);
        assert_eq!(a.agent_state, b.agent_state);
        assert_eq!(a.confidence_score, b.confidence_score);
        assert_eq!(a.recommended_actions, b.recommended_actions);
    }

    #[test]
    fn degraded_capability_bumps_operational_to_stressed() {
        let c = complaint(ComplaintType::CognitiveStress, Severity::Low);
        let caps = CapabilitySignals { degraded: true };
        let ev = evaluate(&c, Some(&caps));
        assert_eq!(ev.agent_state, AgentState::Stressed);
        assert!(ev
            .recommended_actions
            .iter()
            .any(|a| a.contains("capability degraded")));
    }

    #[test]
    fn actions_concatenate_severity_then_type() {
        let ev = evaluate(&complaint(ComplaintType::SafetyViolation, Severity::High), None);
        assert_eq!(
            ev.recommended_actions,
            vec![
                "Review by supervisor needed",
                "Halt the affected operation",
                "Notify the safety observer",
            ]
        );
    }
}
