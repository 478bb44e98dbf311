// crates/research-pipeline/src/claim_extractor.rs
// ============================================================================
// Module: Claim Extractor
// Description: Assigns a direction-agnostic claim key and a directional
//              stance to evidence carrying a quantitative claim.
// Purpose: Let the triangulator cluster same-metric, same-period claims
//          together regardless of whether a given source reports them as
//          rising or falling, and flag the direction disagreement as a
//          contradiction rather than silent noise.
// Dependencies: research_core::{Evidence, Stance, canonical_claim_key}
// ============================================================================

//! ## Overview
//! [`extract`] is a no-op for evidence with no digit in its title or
//! snippet: only text that plausibly carries a quantitative claim is worth
//! keying. For everything else, [`research_core::canonical_claim_key`]
//! already collapses increase/decrease verb families to `inc`/`dec` tokens;
//! this stage folds both back to a single `chg` token for the join key so
//! two sources reporting opposite directions for the same metric and period
//! land in the same [`crate::triangulator`] cluster, while recording the
//! direction it actually found as [`Stance::Supports`] (increase) or
//! [`Stance::Disputes`] (decrease) so the triangulator's contradiction check
//! fires on the disagreement.

use research_core::Evidence;
use research_core::Stance;
use research_core::canonical_claim_key;

/// Verb family indicating an upward-direction claim.
const INCREASE_MARKERS: &[&str] = &[
    "increase", "increased", "increasing", "rose", "rising", "grew", "growing", "grow", "climbed", "jumped", "surged", "gained",
];

/// Verb family indicating a downward-direction claim.
const DECREASE_MARKERS: &[&str] = &[
    "decrease", "decreased", "decreasing", "fell", "falling", "dropped", "dropping", "declined", "declining", "decline", "shrank",
    "shrinking", "slid", "plunged",
];

/// Sets `evidence.claim` and `evidence.stance` from its title and snippet,
/// when they contain a quantitative claim. Leaves both fields untouched
/// otherwise.
pub fn extract(evidence: &mut Evidence) {
    let text = format!("{} {}", evidence.title, evidence.snippet);
    if !text.chars().any(|c| c.is_ascii_digit()) {
        return;
    }
    let lowered = text.to_ascii_lowercase();
    evidence.stance = classify_stance(&lowered);
    evidence.claim = Some(direction_agnostic(&canonical_claim_key(&text)));
}

/// Reads the direction a claim's text asserts from its verb family.
fn classify_stance(lowered: &str) -> Stance {
    let has_increase = INCREASE_MARKERS.iter().any(|m| lowered.contains(m));
    let has_decrease = DECREASE_MARKERS.iter().any(|m| lowered.contains(m));
    match (has_increase, has_decrease) {
        (true, false) => Stance::Supports,
        (false, true) => Stance::Disputes,
        _ => Stance::Neutral,
    }
}

/// Replaces the `inc`/`dec` direction token in a canonical claim key with a
/// shared `chg` token, so same-metric claims cluster regardless of which
/// direction any single source reported.
fn direction_agnostic(key: &str) -> String {
    key.split(' ').map(|token| if token == "inc" || token == "dec" { "chg" } else { token }).collect::<Vec<_>>().join(" ")
}
