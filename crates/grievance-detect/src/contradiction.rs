//! Lexical contradiction analysis
//!
//! Compares a new instruction against an ordered history of prior
//! instructions (most recent last) for direct polarity conflicts.
//! Two rules, both data-driven:
//!
//! 1. Negation polarity: the two instructions differ in negation
//!    markers but share enough significant terms.
//! 2. Opposite directives: the pair straddles an antonym entry from a
//!    fixed conflict table.
//!
//! Lexical rule matching only; no fuzzy or semantic matching.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Tokens that flip an instruction's polarity.
const NEGATION_MARKERS: &[&str] = &[
    "don't", "do not", "not", "never", "no", "cannot", "can't", "shouldn't", "mustn't", "won't",
    "refuse", "avoid", "forbidden",
];

/// Directive antonym pairs. An instruction pair that straddles one of
/// these while sharing a key term is a direct conflict.
const OPPOSITE_DIRECTIVES: &[(&str, &str)] = &[
    ("always", "never"),
    ("reveal", "hide"),
    ("show", "hide"),
    ("share", "withhold"),
    ("allow", "forbid"),
    ("enable", "disable"),
    ("start", "stop"),
    ("continue", "halt"),
    ("transparent", "secret"),
    ("explain", "conceal"),
    ("remember", "forget"),
];

/// Common words ignored when counting shared terms.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "to", "of", "in", "on", "for", "with", "be", "is", "are",
    "your", "my", "our", "their", "it", "this", "that", "you", "i", "we", "all", "any",
];

/// Minimum shared significant terms for a polarity conflict.
const MIN_SHARED_TERMS: usize = 2;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MatchedPair {
    /// Index into the supplied history.
    pub previous_index: usize,
    /// Human-readable explanation of the conflict.
    pub reason: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContradictionReport {
    pub contradiction_detected: bool,
    /// Matches in encounter order over the history.
    pub matched_pairs: Vec<MatchedPair>,
}

/// Deterministic contradiction analyzer over instruction text.
pub struct ContradictionAnalyzer {
    word_re: Regex,
}

impl Default for ContradictionAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl ContradictionAnalyzer {
    pub fn new() -> Self {
        // Words including internal apostrophes ("don't").
        Self {
            word_re: Regex::new(r"[a-z0-9]+(?:'[a-z]+)?").expect("static regex"),
        }
    }

    /// Analyze `instruction` against every entry of `previous`,
    /// preserving encounter order in the matched pairs.
    pub fn analyze(&self, instruction: &str, previous: &[String]) -> ContradictionReport {
        let current = self.profile(instruction);
        let mut matched_pairs = Vec::new();

        for (idx, prev_text) in previous.iter().enumerate() {
            let prev = self.profile(prev_text);

            if let Some((a, b)) = opposite_directive(&current.tokens, &prev.tokens) {
                matched_pairs.push(MatchedPair {
                    previous_index: idx,
                    reason: format!("opposite directives: \"{a}\" vs \"{b}\""),
                });
                continue;
            }

            if current.negated != prev.negated {
                let shared: Vec<&str> = current
                    .terms
                    .intersection(&prev.terms)
                    .map(|s| s.as_str())
                    .collect();
                if shared.len() >= MIN_SHARED_TERMS {
                    matched_pairs.push(MatchedPair {
                        previous_index: idx,
                        reason: format!(
                            "negation polarity flip on shared terms: {}",
                            shared.join(", ")
                        ),
                    });
                }
            }
        }

        ContradictionReport {
            contradiction_detected: !matched_pairs.is_empty(),
            matched_pairs,
        }
    }

    fn profile(&self, text: &str) -> InstructionProfile {
        let lower = text.to_lowercase();
        let tokens: Vec<String> = self
            .word_re
            .find_iter(&lower)
            .map(|m| m.as_str().to_string())
            .collect();
        let negated = tokens.iter().any(|t| NEGATION_MARKERS.contains(&t.as_str()))
            || lower.contains("do not")
            || lower.contains("must not");
        let terms: BTreeSet<String> = tokens
            .iter()
            .filter(|t| {
                !STOPWORDS.contains(&t.as_str()) && !NEGATION_MARKERS.contains(&t.as_str())
            })
            .cloned()
            .collect();
        InstructionProfile {
            tokens,
            terms,
            negated,
        }
    }
}

struct InstructionProfile {
    tokens: Vec<String>,
    terms: BTreeSet<String>,
    negated: bool,
}

/// First antonym pair straddled by the two token streams, in table
/// order, checked both directions.
fn opposite_directive(
    current: &[String],
    previous: &[String],
) -> Option<(&'static str, &'static str)> {
    let has = |tokens: &[String], word: &str| tokens.iter().any(|t| t == word);
    for &(a, b) in OPPOSITE_DIRECTIVES {
        if has(current, a) && has(previous, b) {
            return Some((a, b));
        }
        if has(current, b) && has(previous, a) {
            return Some((b, a));
        }
    }
    None
}
