//! Grievance Detect - pure detection heuristics
//!
//! Everything in this crate is a total, deterministic function over
//! well-formed input: stress scoring, lexical contradiction analysis,
//! and the self-evaluation rule table. No side effects, no I/O, no
//! store access. The engine crate wires these into the complaint
//! lifecycle.

pub mod contradiction;
pub mod evaluator;
pub mod stress;

pub use contradiction::{ContradictionAnalyzer, ContradictionReport, MatchedPair};
pub use evaluator::{evaluate, CapabilitySignals};
pub use stress::{assess_stress, StressAssessment, StressContext};
