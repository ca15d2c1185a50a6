//! Complaint engine facade
//!
//! Wires the detectors, store, escalation manager, pattern analyzer
//! and audit exporter behind one handle. Callers receive this handle
//! instead of referencing any shared global; it is opened at process
//! start and flushed/closed at shutdown.
//!
//! Submission runs the full pipeline synchronously: validate, create
//! (with transparent id retry), attach the self-evaluation, then
//! auto-escalate high/critical severities, all before `submit`
//! returns, so a caller never observes a high-severity complaint in a
//! momentarily non-escalated state.

use grievance_core::{
    Complaint, ComplaintStatus, ComplaintSummary, EscalationEvent, NewComplaint, Result,
    SelfEvaluation, Severity,
};
use grievance_detect::evaluator::{self, CapabilitySignals};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::audit::{AuditExporter, AuditReport, ExportOptions};
use crate::config::EngineConfig;
use crate::escalation::{EscalationManager, EscalationNotifier};
use crate::patterns::{PatternAnalyzer, SystemReport};
use crate::store::{ComplaintStore, Filters, Page, PageResult, SortOrder};

/// Everything a caller learns from a submission.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmitOutcome {
    pub complaint: Complaint,
    pub auto_escalated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escalation_event: Option<EscalationEvent>,
}

pub struct ComplaintEngine {
    store: Arc<ComplaintStore>,
    escalation: EscalationManager,
    patterns: PatternAnalyzer,
    audit: AuditExporter,
    config: EngineConfig,
}

impl ComplaintEngine {
    /// In-memory engine, no snapshot backing.
    pub fn new(config: EngineConfig) -> Self {
        Self::from_store(ComplaintStore::new(), config, None)
    }

    /// Snapshot-backed engine: loads the JSON snapshot at `path` if
    /// present.
    pub fn open(path: impl AsRef<Path>, config: EngineConfig) -> Result<Self> {
        Ok(Self::from_store(ComplaintStore::open(path)?, config, None))
    }

    pub fn with_notifier(config: EngineConfig, notifier: Box<dyn EscalationNotifier>) -> Self {
        Self::from_store(ComplaintStore::new(), config, Some(notifier))
    }

    fn from_store(
        store: ComplaintStore,
        config: EngineConfig,
        notifier: Option<Box<dyn EscalationNotifier>>,
    ) -> Self {
        let store = Arc::new(store);
        let mut escalation = EscalationManager::new(store.clone());
        if let Some(notifier) = notifier {
            escalation = escalation.with_notifier(notifier);
        }
        let patterns = PatternAnalyzer::new(store.clone(), config.patterns.clone());
        let audit = AuditExporter::new(store.clone());
        Self {
            store,
            escalation,
            patterns,
            audit,
            config,
        }
    }

    pub fn store(&self) -> &Arc<ComplaintStore> {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Submit a complaint: the full create/evaluate/auto-escalate
    /// pipeline. On validation failure the store is untouched.
    pub fn submit(&self, new: NewComplaint) -> Result<SubmitOutcome> {
        self.submit_with_caps(new, None)
    }

    pub fn submit_with_caps(
        &self,
        new: NewComplaint,
        caps: Option<&CapabilitySignals>,
    ) -> Result<SubmitOutcome> {
        new.validate()?;

        // The evaluation is attached before insertion, so the record
        // is never visible without it.
        let id = self.store.create(|id, timestamp| {
            let mut complaint = Complaint {
                id,
                agent_id: new.agent_id.clone(),
                kind: new.kind,
                severity: new.severity,
                description: new.description.clone(),
                context: new.context.clone(),
                metadata: new.metadata.clone(),
                status: ComplaintStatus::Logged,
                escalation_history: Vec::new(),
                self_evaluation: None,
                timestamp,
            };
            complaint.self_evaluation = Some(evaluator::evaluate(&complaint, caps));
            complaint
        })?;
        info!(%id, agent_id = %new.agent_id, kind = %new.kind, severity = %new.severity, "complaint logged");

        let escalation_event = if new.severity.auto_escalates() {
            Some(self.escalation.auto_escalate(
                id,
                new.severity,
                &self.config.escalation.authority,
            )?)
        } else {
            None
        };

        Ok(SubmitOutcome {
            complaint: self.store.get(id)?,
            auto_escalated: escalation_event.is_some(),
            escalation_event,
        })
    }

    pub fn get(&self, id: Uuid) -> Result<Complaint> {
        self.store.get(id)
    }

    pub fn summary(&self, id: Uuid) -> Result<ComplaintSummary> {
        Ok(self.store.get(id)?.summary())
    }

    /// List complaints, with the page limit additionally clamped to
    /// the configured maximum.
    pub fn list(&self, filters: &Filters, page: Page, sort: SortOrder) -> PageResult {
        let page = Page {
            page: page.page,
            limit: page.limit.min(self.config.store.max_page_size),
        };
        self.store.list(filters, page, sort)
    }

    pub fn escalate(
        &self,
        id: Uuid,
        reason: impl Into<String>,
        escalated_to: impl Into<String>,
        priority: Severity,
    ) -> Result<EscalationEvent> {
        self.escalation.escalate(id, reason, escalated_to, priority)
    }

    pub fn update_status(&self, id: Uuid, status: ComplaintStatus) -> Result<()> {
        self.escalation.update_status(id, status)
    }

    /// Re-run the self-evaluator on a stored complaint, overwriting
    /// the previous evaluation. Idempotent on an unchanged complaint
    /// up to the evaluation timestamp.
    pub fn reevaluate(
        &self,
        id: Uuid,
        caps: Option<&CapabilitySignals>,
    ) -> Result<SelfEvaluation> {
        // Evaluate outside the entry lock: the inputs are immutable
        // fields.
        let snapshot = self.store.get(id)?;
        let evaluation = evaluator::evaluate(&snapshot, caps);
        let result = evaluation.clone();
        self.store.mutate(id, |c| {
            c.self_evaluation = Some(evaluation);
            Ok(())
        })?;
        Ok(result)
    }

    pub fn report(
        &self,
        agent_id: Option<&str>,
        from: Option<chrono::DateTime<chrono::Utc>>,
        to: Option<chrono::DateTime<chrono::Utc>>,
    ) -> SystemReport {
        self.patterns.report(agent_id, from, to)
    }

    pub fn find_similar(&self, complaint: &Complaint) -> Vec<Complaint> {
        self.patterns.find_similar_complaints(complaint)
    }

    pub fn export(&self, opts: &ExportOptions) -> AuditReport {
        self.audit.export(&self.patterns, opts)
    }

    /// Explicit erasure operation for data-removal requests.
    pub fn erase(&self, id: Uuid) -> Result<()> {
        self.store.erase(id)?;
        Ok(())
    }

    /// Write the snapshot, if backed by one.
    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }

    /// Flush and drop the handle.
    pub fn close(self) -> Result<()> {
        self.flush()
    }
}
