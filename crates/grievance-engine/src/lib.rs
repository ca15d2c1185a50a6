//! Grievance Engine - complaint lifecycle, store, escalation, audit
//!
//! The engine owns a single logical [`ComplaintStore`] per deployment
//! and drives the complaint lifecycle around it:
//!
//! - [`ComplaintEngine`]: facade. Validate, create, self-evaluate,
//!   auto-escalate, all before the submission call returns.
//! - [`ComplaintStore`]: append-only record collection with
//!   filter/pagination/sort queries and per-id mutation locking.
//! - [`EscalationManager`]: the status state machine and escalation
//!   idempotency rules.
//! - [`PatternAnalyzer`]: recurring-issue mining and system-wide
//!   recommendations.
//! - [`AuditExporter`]: point-in-time, optionally anonymized
//!   snapshots for compliance review.

pub mod audit;
pub mod config;
pub mod engine;
pub mod escalation;
pub mod patterns;
pub mod store;

pub use audit::{AuditExporter, AuditReport, ExportFormat, ExportOptions};
pub use config::EngineConfig;
pub use engine::{ComplaintEngine, SubmitOutcome};
pub use escalation::{EscalationManager, EscalationNotifier};
pub use patterns::{PatternAnalyzer, SystemReport};
pub use store::{ComplaintStore, Filters, Page, PageResult, SortOrder};
