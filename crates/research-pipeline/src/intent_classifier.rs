// crates/research-pipeline/src/intent_classifier.rs
// ============================================================================
// Module: Intent Classifier
// Description: Classifies a research topic into one of the fixed Intent
//              variants before planning begins.
// Purpose: Let every later stage read a typed Intent instead of
//          re-inspecting the topic string.
// Dependencies: research_core::Intent
// ============================================================================

//! ## Overview
//! Classification runs in three stages, and the first stage to produce a
//! confident match wins:
//!
//! 1. **Regex rules** — a fixed set of characteristic phrases per intent,
//!    checked first because they are cheap and unambiguous when present.
//! 2. **Hybrid semantic similarity** — each intent carries a short label and
//!    a handful of worked examples; the topic is scored against both with a
//!    lexical-overlap stand-in for embedding cosine similarity, blended
//!    `0.7 * label_similarity + 0.3 * example_similarity`, and the
//!    highest-scoring intent wins if that blend clears `0.42`.
//! 3. **Zero-shot entailment** — as a last resort, the topic is scored as a
//!    premise against a per-intent hypothesis ("this is about {intent}"),
//!    and the highest-scoring intent wins if it clears `0.30`.
//!
//! A topic that clears none of the three stages falls back to
//! [`Intent::Generic`]. Separately, every topic is checked against a closed
//! list of geographic homographs (place names with more than one common
//! referent); matches are reported for the run but never used to rewrite
//! the topic automatically.

use research_core::Intent;

/// The result of classifying a topic: the winning intent plus any detected
/// geographic ambiguity, surfaced for reporting only.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// The winning [`Intent`].
    pub intent: Intent,
    /// Homograph place names found in the topic, for reporting. Detection
    /// never rewrites the topic or the query plan.
    pub ambiguous_places: Vec<&'static str>,
}

/// Phrases associated with each intent, checked in table order; the first
/// intent with a matching phrase wins stage 1.
const STAGE1_RULES: &[(Intent, &[&str])] = &[
    (Intent::Regulatory, &["regulation", "regulatory", "compliance", "law requires", "legal requirement", "statute", "directive", "sanction", "tariff"]),
    (Intent::Medical, &["symptom", "treatment", "diagnosis", "side effect", "dosage", "clinical", "disease", "medication"]),
    (Intent::Stats, &["gdp", "growth rate", "inflation", "unemployment", "percent", "statistic", "trend", "year over year", "how many", "how much"]),
    (Intent::News, &["breaking", "latest news", "this week", "today", "developing story"]),
    (Intent::Academic, &["research paper", "peer-reviewed", "study finds", "literature review", "journal of"]),
    (Intent::Howto, &["how to", "how do i", "step by step", "tutorial", "guide to"]),
    (Intent::Travel, &["itinerary", "best time to visit", "things to do in", "travel guide", "flights to"]),
    (Intent::Product, &["review", "vs ", "price of", "specs", "buy ", "best "]),
    (Intent::Local, &["near me", "open now", "hours of operation", "closest "]),
    (Intent::Encyclopedia, &["history of", "what is", "origin of", "definition of"]),
];

/// `(label, examples)` used for stage 2's hybrid similarity blend.
const STAGE2_PROFILES: &[(Intent, &str, &[&str])] = &[
    (Intent::Product, "product review and pricing", &["best wireless headphones 2024", "iphone 15 pro vs galaxy s24"]),
    (Intent::Local, "local business or place", &["coffee shops near me", "plumber open now"]),
    (Intent::Academic, "academic research", &["quantum computing research", "peer reviewed climate study"]),
    (Intent::Stats, "statistics and data", &["unemployment rate by country", "population growth statistics"]),
    (Intent::News, "current news event", &["latest election results", "breaking news today"]),
    (Intent::Encyclopedia, "encyclopedic background", &["history of the roman empire", "origin of the internet"]),
    (Intent::Travel, "travel planning", &["best time to visit japan", "itinerary for rome"]),
    (Intent::Howto, "how-to instructions", &["how to bake sourdough bread", "step by step guide to changing a tire"]),
    (Intent::Regulatory, "law and regulation", &["eu data protection regulation", "tariff compliance requirements"]),
    (Intent::Medical, "medical and health", &["symptoms of the flu", "treatment for migraines"]),
];

/// Hypothesis templates used for stage 3's zero-shot entailment check.
const STAGE3_HYPOTHESES: &[(Intent, &str)] = &[
    (Intent::Product, "this topic is about a commercial product or service"),
    (Intent::Local, "this topic is about a specific place or local business"),
    (Intent::Academic, "this topic is about scholarly or scientific research"),
    (Intent::Stats, "this topic is about a statistic or time series"),
    (Intent::News, "this topic is about a current event"),
    (Intent::Encyclopedia, "this topic is about general background or history"),
    (Intent::Travel, "this topic is about travel or tourism"),
    (Intent::Howto, "this topic is about how to accomplish a task"),
    (Intent::Regulatory, "this topic is about law or regulatory compliance"),
    (Intent::Medical, "this topic is about health or medicine"),
];

/// Closed list of geographic homographs: place names with more than one
/// common referent, used only to flag ambiguity for the run report.
const GEOGRAPHIC_HOMOGRAPHS: &[&str] = &["georgia", "washington", "cambridge", "paris", "birmingham", "columbia", "york", "richmond", "dublin"];

const STAGE2_THRESHOLD: f64 = 0.42;
const STAGE3_THRESHOLD: f64 = 0.30;

/// Tokenizes into lowercase alphanumeric words, for Jaccard-style overlap.
fn tokens(text: &str) -> std::collections::HashSet<String> {
    text.to_ascii_lowercase().split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()).map(str::to_string).collect()
}

/// Jaccard overlap between two token sets, used as a deterministic stand-in
/// for embedding cosine similarity.
fn overlap_similarity(a: &str, b: &str) -> f64 {
    let ta = tokens(a);
    let tb = tokens(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let intersection = ta.intersection(&tb).count();
    let union = ta.union(&tb).count();
    if union == 0 { 0.0 } else { intersection as f64 / union as f64 }
}

fn stage1(lowered: &str) -> Option<Intent> {
    STAGE1_RULES.iter().find(|(_, markers)| markers.iter().any(|m| lowered.contains(m))).map(|(intent, _)| *intent)
}

fn stage2(topic: &str) -> Option<Intent> {
    STAGE2_PROFILES
        .iter()
        .map(|(intent, label, examples)| {
            let label_sim = overlap_similarity(topic, label);
            let example_sim = examples.iter().map(|ex| overlap_similarity(topic, ex)).fold(0.0_f64, f64::max);
            (*intent, 0.7 * label_sim + 0.3 * example_sim)
        })
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .filter(|(_, score)| *score >= STAGE2_THRESHOLD)
        .map(|(intent, _)| intent)
}

fn stage3(topic: &str) -> Option<Intent> {
    STAGE3_HYPOTHESES
        .iter()
        .map(|(intent, hypothesis)| (*intent, overlap_similarity(topic, hypothesis)))
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .filter(|(_, score)| *score >= STAGE3_THRESHOLD)
        .map(|(intent, _)| intent)
}

fn detect_ambiguous_places(lowered: &str) -> Vec<&'static str> {
    GEOGRAPHIC_HOMOGRAPHS.iter().copied().filter(|place| lowered.split(|c: char| !c.is_alphanumeric()).any(|w| w == *place)).collect()
}

/// Classifies `topic` into one of the fixed [`Intent`] variants.
///
/// # Invariants
/// - Classification is a pure function of `topic`'s lowercase form; it
///   never reads configuration or external state.
/// - Falls back to [`Intent::Generic`] when no stage produces a confident
///   match.
#[must_use]
pub fn classify(topic: &str) -> Intent {
    classify_detailed(topic).intent
}

/// Runs the full three-stage classification and geographic-ambiguity check,
/// returning both the winning intent and any flagged homographs.
#[must_use]
pub fn classify_detailed(topic: &str) -> Classification {
    let lowered = topic.to_ascii_lowercase();
    let intent = stage1(&lowered).or_else(|| stage2(topic)).or_else(|| stage3(topic)).unwrap_or(Intent::Generic);
    Classification { intent, ambiguous_places: detect_ambiguous_places(&lowered) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage1_detects_regulatory_phrasing() {
        assert_eq!(classify("New EU tariff regulation on steel imports"), Intent::Regulatory);
    }

    #[test]
    fn stage1_detects_stats_phrasing() {
        assert_eq!(classify("US GDP growth rate in 2023"), Intent::Stats);
    }

    #[test]
    fn stage2_catches_phrasing_stage1_misses() {
        assert_eq!(classify("best wireless earbuds under $100"), Intent::Product);
    }

    #[test]
    fn falls_back_to_generic() {
        assert_eq!(classify("xyzzy plugh"), Intent::Generic);
    }

    #[test]
    fn regulatory_takes_priority_over_stats_markers_in_stage1() {
        let topic = "inflation reporting regulatory compliance requirements";
        assert_eq!(classify(topic), Intent::Regulatory);
    }

    #[test]
    fn flags_known_geographic_homographs() {
        let result = classify_detailed("history of georgia");
        assert!(result.ambiguous_places.contains(&"georgia"));
    }

    #[test]
    fn unambiguous_topics_flag_nothing() {
        let result = classify_detailed("best wireless earbuds under $100");
        assert!(result.ambiguous_places.is_empty());
    }
}
