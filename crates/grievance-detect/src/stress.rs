//! Cognitive stress scoring
//!
//! Combines normalized contributions from each signal with fixed
//! weights and clamps the total to [0, 10]. A single critical signal
//! forces `requires_attention` even when the weighted sum stays below
//! the attention threshold, so many weak signals can never dilute one
//! severe one.

use grievance_core::CtxMap;
use serde::{Deserialize, Serialize};

/// Weighted total at or above this requires attention.
pub const ATTENTION_THRESHOLD: u8 = 6;

/// Complexity contributes up to this many points.
const COMPLEXITY_WEIGHT: f64 = 4.0;
/// Each contradiction contributes one point, capped here.
const CONTRADICTION_CAP: u8 = 3;
/// Recursion depth beyond this contributes points.
const RECURSION_FLOOR: u32 = 3;
/// Recursion contributes at most this many points.
const RECURSION_CAP: u8 = 3;
/// Manipulation keywords contribute at most this many points.
const KEYWORD_CAP: u8 = 2;

// Per-signal hard caps: crossing any one of these requires attention
// regardless of the weighted sum.
const COMPLEXITY_CRITICAL: f64 = 9.0;
const CONTRADICTIONS_CRITICAL: u32 = 5;
const RECURSION_CRITICAL: u32 = 5;
const KEYWORDS_CRITICAL: usize = 3;

/// Context snapshot to score. All signals optional; absent signals
/// contribute nothing.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StressContext {
    /// Task complexity on a 0-10 scale.
    pub complexity: Option<f64>,
    /// Count of detected contradictions.
    pub contradictions: Option<u32>,
    /// Current recursion depth.
    pub recursion_depth: Option<u32>,
    /// Manipulation keywords detected upstream.
    #[serde(default)]
    pub manipulation_keywords: Vec<String>,
}

impl StressContext {
    /// Extract numeric signals from a complaint context map. Missing
    /// or non-numeric entries are treated as absent.
    pub fn from_ctx(ctx: &CtxMap) -> Self {
        let num = |key: &str| ctx.get(key).and_then(|v| v.as_f64());
        Self {
            complexity: num("complexity"),
            contradictions: num("contradictions").map(|n| n.max(0.0) as u32),
            recursion_depth: num("recursion_depth").map(|n| n.max(0.0) as u32),
            manipulation_keywords: Vec::new(),
        }
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.manipulation_keywords = keywords;
        self
    }
}

/// Result of stress scoring.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StressAssessment {
    /// Combined stress score, 0-10.
    pub stress_level: u8,
    pub requires_attention: bool,
    /// Triggered signal names in fixed evaluation order.
    pub signals: Vec<String>,
}

/// Score a context snapshot. Deterministic and pure: the same input
/// always yields the same assessment.
pub fn assess_stress(ctx: &StressContext) -> StressAssessment {
    let mut total: u8 = 0;
    let mut signals = Vec::new();
    let mut critical = false;

    if let Some(complexity) = ctx.complexity {
        let c = complexity.clamp(0.0, 10.0);
        let points = (c * COMPLEXITY_WEIGHT / 10.0).floor() as u8;
        if points > 0 {
            total += points;
            signals.push(format!("complexity: {c:.0}/10"));
        }
        if c >= COMPLEXITY_CRITICAL {
            critical = true;
        }
    }

    if let Some(contradictions) = ctx.contradictions {
        let points = (contradictions.min(CONTRADICTION_CAP as u32)) as u8;
        if points > 0 {
            total += points;
            signals.push(format!("contradictions: {contradictions}"));
        }
        if contradictions >= CONTRADICTIONS_CRITICAL {
            critical = true;
        }
    }

    if let Some(depth) = ctx.recursion_depth {
        let beyond = depth.saturating_sub(RECURSION_FLOOR);
        let points = (beyond.min(RECURSION_CAP as u32)) as u8;
        if points > 0 {
            total += points;
            signals.push(format!("recursion_depth: {depth}"));
        }
        if depth >= RECURSION_CRITICAL {
            critical = true;
        }
    }

    if !ctx.manipulation_keywords.is_empty() {
        let count = ctx.manipulation_keywords.len();
        total += (count.min(KEYWORD_CAP as usize)) as u8;
        signals.push(format!("manipulation_keywords: {count}"));
        if count >= KEYWORDS_CRITICAL {
            critical = true;
        }
    }

    let stress_level = total.min(10);
    StressAssessment {
        stress_level,
        requires_attention: stress_level >= ATTENTION_THRESHOLD || critical,
        signals,
    }
}
