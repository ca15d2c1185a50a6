//! Escalation manager: the complaint status state machine
//!
//! Status chain: `detected → logged → under_review → escalated →
//! resolved → archived`, with direct edges `logged → resolved`,
//! `logged → archived` and `under_review → archived`. Complaints are
//! persisted already in `logged`; escalation may skip `under_review`.
//!
//! `escalate` is idempotency-guarded: a complaint at or beyond
//! `escalated` rejects further escalation with `AlreadyEscalated`,
//! including re-escalation to a different authority. The whole
//! check-append-transition runs under the complaint's entry lock, so
//! concurrent escalations of the same id cannot both succeed.

use chrono::Utc;
use grievance_core::{
    ComplaintStatus, Error, EscalationEntry, EscalationEvent, Result, Severity,
};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::store::ComplaintStore;

/// Allowed status transitions.
const ALLOWED_TRANSITIONS: &[(ComplaintStatus, ComplaintStatus)] = &[
    (ComplaintStatus::Detected, ComplaintStatus::Logged),
    (ComplaintStatus::Logged, ComplaintStatus::UnderReview),
    (ComplaintStatus::Logged, ComplaintStatus::Escalated),
    (ComplaintStatus::Logged, ComplaintStatus::Resolved),
    (ComplaintStatus::Logged, ComplaintStatus::Archived),
    (ComplaintStatus::UnderReview, ComplaintStatus::Escalated),
    (ComplaintStatus::UnderReview, ComplaintStatus::Archived),
    (ComplaintStatus::Escalated, ComplaintStatus::Resolved),
    (ComplaintStatus::Resolved, ComplaintStatus::Archived),
];

pub fn transition_allowed(from: ComplaintStatus, to: ComplaintStatus) -> bool {
    ALLOWED_TRANSITIONS.contains(&(from, to))
}

/// Receives escalation events for delivery to subscribers. The
/// delivery mechanism itself (webhooks, queues) lives outside the
/// engine.
pub trait EscalationNotifier: Send + Sync {
    fn notify(&self, event: &EscalationEvent);
}

pub struct EscalationManager {
    store: Arc<ComplaintStore>,
    notifier: Option<Box<dyn EscalationNotifier>>,
}

impl EscalationManager {
    pub fn new(store: Arc<ComplaintStore>) -> Self {
        Self {
            store,
            notifier: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn EscalationNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Apply a status transition, rejecting edges outside the state
    /// machine.
    pub fn update_status(&self, id: Uuid, new_status: ComplaintStatus) -> Result<()> {
        self.store.mutate(id, |c| {
            if !transition_allowed(c.status, new_status) {
                return Err(Error::validation(format!(
                    "invalid status transition: {} -> {}",
                    c.status, new_status
                )));
            }
            c.status = new_status;
            Ok(())
        })?;
        info!(%id, status = %new_status, "complaint status updated");
        Ok(())
    }

    /// Escalate a complaint to a named authority. Appends to the
    /// escalation history and moves status to `escalated`. Fails with
    /// `AlreadyEscalated` if the complaint is at or beyond
    /// `escalated`, leaving the history untouched.
    pub fn escalate(
        &self,
        id: Uuid,
        reason: impl Into<String>,
        escalated_to: impl Into<String>,
        priority: Severity,
    ) -> Result<EscalationEvent> {
        let reason = reason.into();
        let escalated_to = escalated_to.into();
        if reason.trim().is_empty() {
            return Err(Error::validation("escalation reason must not be empty"));
        }
        if escalated_to.trim().is_empty() {
            return Err(Error::validation("escalated_to must not be empty"));
        }

        let event = self.store.mutate(id, |c| {
            if c.status >= ComplaintStatus::Escalated {
                return Err(Error::AlreadyEscalated(id));
            }
            c.escalation_history.push(EscalationEntry {
                timestamp: Utc::now(),
                reason: reason.clone(),
                escalated_to: escalated_to.clone(),
                priority,
            });
            c.status = ComplaintStatus::Escalated;
            Ok(EscalationEvent {
                complaint_id: c.id,
                agent_id: c.agent_id.clone(),
                kind: c.kind,
                severity: c.severity,
                escalated_to: escalated_to.clone(),
            })
        })?;

        warn!(
            %id,
            agent_id = %event.agent_id,
            kind = %event.kind,
            severity = %event.severity,
            escalated_to = %event.escalated_to,
            "complaint escalated"
        );
        if let Some(notifier) = &self.notifier {
            notifier.notify(&event);
        }
        Ok(event)
    }

    /// System-initiated escalation for high/critical severities,
    /// invoked by the engine before the creation call returns.
    pub fn auto_escalate(
        &self,
        id: Uuid,
        severity: Severity,
        authority: &str,
    ) -> Result<EscalationEvent> {
        self.escalate(
            id,
            format!("Auto-escalation: severity {severity} requires review"),
            authority,
            severity,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grievance_core::{Complaint, ComplaintType, CtxMap};

    fn logged_complaint(store: &ComplaintStore, severity: Severity) -> Uuid {
        store
            .create(|id, timestamp| Complaint {
                id,
                agent_id: "agent-1".into(),
                kind: ComplaintType::SafetyViolation,
                severity,
                description: "test".into(),
                context: CtxMap::new(),
                metadata: CtxMap::new(),
                status: ComplaintStatus::Logged,
                escalation_history: Vec::new(),
                self_evaluation: None,
                timestamp,
            })
            .unwrap()
    }

    fn manager() -> (Arc<ComplaintStore>, EscalationManager) {
        let store = Arc::new(ComplaintStore::new());
        let mgr = EscalationManager::new(store.clone());
        (store, mgr)
    }

    #[test]
    fn escalate_appends_history_and_sets_status() {
        let (store, mgr) = manager();
        let id = logged_complaint(&store, Severity::Medium);
        let event = mgr
            .escalate(id, "manual review requested", "Safety Board", Severity::Medium)
            .unwrap();
        assert_eq!(event.complaint_id, id);
        let c = store.get(id).unwrap();
        assert_eq!(c.status, ComplaintStatus::Escalated);
        assert_eq!(c.escalation_history.len(), 1);
        assert_eq!(c.escalation_history[0].escalated_to, "Safety Board");
    }

    #[test]
    fn double_escalation_is_rejected_without_history_change() {
        let (store, mgr) = manager();
        let id = logged_complaint(&store, Severity::Medium);
        mgr.escalate(id, "first", "Safety Board", Severity::Medium)
            .unwrap();
        // Different authority changes nothing: still rejected.
        let err = mgr.escalate(id, "second", "Another Authority", Severity::High);
        assert!(matches!(err, Err(Error::AlreadyEscalated(_))));
        assert_eq!(store.get(id).unwrap().escalation_history.len(), 1);
    }

    #[test]
    fn escalation_requires_reason_and_authority() {
        let (store, mgr) = manager();
        let id = logged_complaint(&store, Severity::Low);
        assert!(matches!(
            mgr.escalate(id, "", "Safety Board", Severity::Low),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            mgr.escalate(id, "reason", "  ", Severity::Low),
            Err(Error::Validation(_))
        ));
        assert!(store.get(id).unwrap().escalation_history.is_empty());
    }

    #[test]
    fn status_machine_permits_chain_and_direct_edges() {
        assert!(transition_allowed(
            ComplaintStatus::Logged,
            ComplaintStatus::UnderReview
        ));
        assert!(transition_allowed(
            ComplaintStatus::UnderReview,
            ComplaintStatus::Escalated
        ));
        assert!(transition_allowed(
            ComplaintStatus::Escalated,
            ComplaintStatus::Resolved
        ));
        assert!(transition_allowed(
            ComplaintStatus::Resolved,
            ComplaintStatus::Archived
        ));
        // Direct edges.
        assert!(transition_allowed(
            ComplaintStatus::Logged,
            ComplaintStatus::Resolved
        ));
        assert!(transition_allowed(
            ComplaintStatus::Logged,
            ComplaintStatus::Archived
        ));
        assert!(transition_allowed(
            ComplaintStatus::UnderReview,
            ComplaintStatus::Archived
        ));
        // Backwards and skipping edges are rejected.
        assert!(!transition_allowed(
            ComplaintStatus::Escalated,
            ComplaintStatus::Logged
        ));
        assert!(!transition_allowed(
            ComplaintStatus::Archived,
            ComplaintStatus::Resolved
        ));
        assert!(!transition_allowed(
            ComplaintStatus::UnderReview,
            ComplaintStatus::Resolved
        ));
    }

    #[test]
    fn update_status_rejects_illegal_edge() {
        let (store, mgr) = manager();
        let id = logged_complaint(&store, Severity::Low);
        mgr.update_status(id, ComplaintStatus::Resolved).unwrap();
        let err = mgr.update_status(id, ComplaintStatus::UnderReview);
        assert!(matches!(err, Err(Error::Validation(_))));
        assert_eq!(store.get(id).unwrap().status, ComplaintStatus::Resolved);
    }

    #[test]
    fn notifier_receives_escalation_events() {
        use std::sync::Mutex;

        #[derive(Clone)]
        struct Capture(Arc<Mutex<Vec<EscalationEvent>>>);
        impl EscalationNotifier for Capture {
            fn notify(&self, event: &EscalationEvent) {
                self.0.lock().unwrap().push(event.clone());
            }
        }

        let store = Arc::new(ComplaintStore::new());
        let capture = Capture(Arc::new(Mutex::new(Vec::new())));
        let mgr =
            EscalationManager::new(store.clone()).with_notifier(Box::new(capture.clone()));
        let id = logged_complaint(&store, Severity::High);
        mgr.escalate(id, "severe", "AI Safety Observer", Severity::High)
            .unwrap();
        let events = capture.0.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].complaint_id, id);
    }
}
