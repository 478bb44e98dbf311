// crates/research-core/src/intent.rs
// ============================================================================
// Module: Topic Intent
// Description: The intent classification a topic is assigned before planning.
// Purpose: Let downstream stages pick per-intent triangulation/source
//          thresholds without re-inspecting the topic string.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Intent classification runs once, before query planning, and every later
//! stage reads the resulting [`Intent`] rather than re-classifying. The set
//! of intents is fixed: eleven categories spanning reference, commercial,
//! and claim-heavy topics, each carrying its own minimum triangulation rate
//! and minimum source count for gate evaluation.

use serde::Deserialize;
use serde::Serialize;

/// The classified intent of a research topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Reference-style topics with a stable, citable history (e.g. "history
    /// of the Eiffel Tower").
    Encyclopedia,
    /// Current-events topics where recency matters.
    News,
    /// Topics about a specific commercial product or service.
    Product,
    /// Topics scoped to a place, business, or local service.
    Local,
    /// Topics best answered by scholarly or research literature.
    Academic,
    /// Topics asking for a statistic or time series (e.g. "GDP growth").
    Stats,
    /// Topics asking how to do or accomplish something.
    Howto,
    /// Topics about travel destinations, logistics, or planning.
    Travel,
    /// Topics concerning law, regulation, or compliance.
    Regulatory,
    /// Topics concerning health, medicine, or clinical guidance.
    Medical,
    /// A general research topic with no narrower classification.
    Generic,
}

impl Intent {
    /// All eleven fixed intent variants, in table order.
    pub const ALL: [Self; 11] = [
        Self::Product,
        Self::Local,
        Self::Academic,
        Self::Stats,
        Self::News,
        Self::Encyclopedia,
        Self::Travel,
        Self::Howto,
        Self::Regulatory,
        Self::Medical,
        Self::Generic,
    ];
}

/// Per-intent thresholds consulted during gate evaluation and backfill.
///
/// # Invariants
/// - `min_sources` is always at least 1.
/// - `min_triangulation` lies in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntentThresholds {
    /// Minimum union triangulation rate required before the gate can pass.
    pub min_triangulation: f64,
    /// Minimum number of distinct sources required before the gate can pass.
    pub min_sources: usize,
}

impl IntentThresholds {
    /// Returns the fixed threshold table entry for `intent`.
    #[must_use]
    pub const fn for_intent(intent: Intent) -> Self {
        match intent {
            Intent::Product => Self { min_triangulation: 0.20, min_sources: 3 },
            Intent::Local => Self { min_triangulation: 0.15, min_sources: 2 },
            Intent::Academic => Self { min_triangulation: 0.35, min_sources: 3 },
            Intent::Stats => Self { min_triangulation: 0.30, min_sources: 3 },
            Intent::News => Self { min_triangulation: 0.30, min_sources: 4 },
            Intent::Encyclopedia => Self { min_triangulation: 0.25, min_sources: 2 },
            Intent::Travel => Self { min_triangulation: 0.25, min_sources: 3 },
            Intent::Howto => Self { min_triangulation: 0.20, min_sources: 2 },
            Intent::Regulatory => Self { min_triangulation: 0.30, min_sources: 3 },
            Intent::Medical => Self { min_triangulation: 0.35, min_sources: 3 },
            Intent::Generic => Self { min_triangulation: 0.25, min_sources: 2 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_intent_has_nonzero_min_sources() {
        for intent in Intent::ALL {
            assert!(IntentThresholds::for_intent(intent).min_sources >= 1);
        }
    }

    #[test]
    fn every_intent_has_fractional_triangulation_floor() {
        for intent in Intent::ALL {
            let t = IntentThresholds::for_intent(intent).min_triangulation;
            assert!((0.0..=1.0).contains(&t));
        }
    }

    #[test]
    fn medical_and_academic_carry_the_strictest_triangulation_floor() {
        assert_eq!(IntentThresholds::for_intent(Intent::Academic).min_triangulation, 0.35);
        assert_eq!(IntentThresholds::for_intent(Intent::Medical).min_triangulation, 0.35);
    }

    #[test]
    fn news_requires_the_most_sources() {
        let news = IntentThresholds::for_intent(Intent::News).min_sources;
        for intent in Intent::ALL {
            assert!(IntentThresholds::for_intent(intent).min_sources <= news);
        }
    }
}
