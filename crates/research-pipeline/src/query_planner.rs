// crates/research-pipeline/src/query_planner.rs
// ============================================================================
// Module: Query Planner
// Description: Expands a topic into a set of facet queries and assigns each
//              to an available provider.
// Purpose: Turn one topic string into the dispatcher's request batch, and
//          produce the plan.md / source_strategy.md artifact content.
// Dependencies: research_core::{Intent, Depth, ProviderQuery}
// ============================================================================

//! ## Overview
//! Planning always reserves the raw topic as the first query, unmodified,
//! so collection never depends on expansion succeeding. Beyond that, a
//! fixed set of per-intent facet templates is expanded and scaled in count
//! by [`research_core::Depth`] — but capped at five expansion queries per
//! run regardless of depth. Facets that would render to the same
//! lowercased, whitespace-normalized query text as one already queued are
//! dropped rather than sent twice.

use research_core::Depth;
use research_core::Intent;
use research_core::ProviderQuery;

/// Hard cap on expansion queries (the raw-topic query is never counted
/// against this).
const MAX_EXPANSION_QUERIES: usize = 5;

/// One query assigned to a specific provider.
#[derive(Debug, Clone)]
pub struct PlannedQuery {
    /// Name of the provider this query should be sent to.
    pub provider_name: String,
    /// The query itself.
    pub query: ProviderQuery,
}

/// The full output of planning: queries plus the facet list for reporting.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    /// Facet names used to build the queries, in plan order. The raw-topic
    /// query has no facet and is not represented here.
    pub subtopics: Vec<String>,
    /// Queries, each already assigned to a provider. Index 0 is always the
    /// unmodified raw-topic query when `available_providers` is non-empty.
    pub queries: Vec<PlannedQuery>,
}

/// A facet template, optionally carrying a query-text suffix to append
/// after `"{topic} {facet}"` (site hints, date-range tokens, ...).
struct Facet {
    name: &'static str,
    suffix: Option<&'static str>,
}

const fn facet(name: &'static str) -> Facet {
    Facet { name, suffix: None }
}

const fn facet_with_suffix(name: &'static str, suffix: &'static str) -> Facet {
    Facet { name, suffix: Some(suffix) }
}

/// Reference-style facets: no recency filters, since encyclopedic topics are
/// not time-sensitive; site hints point at reference primaries.
const ENCYCLOPEDIA_FACETS: &[Facet] = &[
    facet("history and timeline"),
    facet_with_suffix("overview", "site:wikipedia.org OR site:britannica.com"),
    facet("origins and background"),
    facet("notable facts"),
];

/// News facets: every expansion is scoped to a trailing 12-month window so
/// collection favors recent coverage.
const NEWS_FACETS: &[Facet] = &[
    facet_with_suffix("latest developments", "after:12-months-ago"),
    facet_with_suffix("breaking coverage", "after:12-months-ago"),
    facet_with_suffix("reactions and analysis", "after:12-months-ago"),
];

/// Academic facets: every expansion hints at scholarly/`.edu` sources.
const ACADEMIC_FACETS: &[Facet] = &[
    facet_with_suffix("research", "site:.edu"),
    facet_with_suffix("study findings", "site:.edu"),
    facet_with_suffix("literature review", "site:.edu"),
];

/// Stats facets: every expansion hints at official/`.gov` sources.
const STATS_FACETS: &[Facet] = &[
    facet_with_suffix("statistics", "site:.gov"),
    facet_with_suffix("data", "site:.gov"),
    facet_with_suffix("methodology notes", "site:.gov"),
];

/// Default facets used for every intent without a dedicated template.
const DEFAULT_FACETS: &[Facet] = &[
    facet("overview"),
    facet("recent developments"),
    facet("expert analysis"),
    facet("criticism or controversy"),
    facet("comparison with alternatives"),
];

const fn facets_for_intent(intent: Intent) -> &'static [Facet] {
    match intent {
        Intent::Encyclopedia => ENCYCLOPEDIA_FACETS,
        Intent::News => NEWS_FACETS,
        Intent::Academic => ACADEMIC_FACETS,
        Intent::Stats => STATS_FACETS,
        _ => DEFAULT_FACETS,
    }
}

/// Number of expansion facets to use for each depth setting, before the
/// run-wide cap is applied.
const fn facet_count(depth: Depth) -> usize {
    match depth {
        Depth::Quick => 2,
        Depth::Standard => 4,
        Depth::Deep => MAX_EXPANSION_QUERIES,
    }
}

/// Maximum results requested per query, scaled by depth.
const fn max_results_per_query(depth: Depth) -> usize {
    match depth {
        Depth::Quick => 5,
        Depth::Standard => 8,
        Depth::Deep => 12,
    }
}

/// Lowercases and collapses internal whitespace, for near-duplicate query
/// detection.
fn normalize_for_dedup(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_lowercase()
}

/// Builds a [`QueryPlan`] for `topic`, scaled by `depth`, assigning queries
/// round-robin across `available_providers`.
///
/// # Invariants
/// - Returns an empty query list (but a populated subtopic list) when
///   `available_providers` is empty; the caller is responsible for treating
///   that as a planning-stage supply problem.
/// - At most [`MAX_EXPANSION_QUERIES`] expansion queries are planned,
///   regardless of `depth`; the raw-topic query is not counted against
///   this cap.
#[must_use]
pub fn plan(topic: &str, intent: Intent, depth: Depth, available_providers: &[String]) -> QueryPlan {
    let templates = facets_for_intent(intent);
    let count = facet_count(depth).min(MAX_EXPANSION_QUERIES).min(templates.len());

    let mut seen = std::collections::HashSet::new();
    seen.insert(normalize_for_dedup(topic));

    let mut subtopics = Vec::new();
    let mut texts = vec![topic.to_string()];
    for f in templates.iter().take(count) {
        let text = match f.suffix {
            Some(suffix) => format!("{topic} {} {suffix}", f.name),
            None => format!("{topic} {}", f.name),
        };
        if seen.insert(normalize_for_dedup(&text)) {
            subtopics.push(f.name.to_string());
            texts.push(text);
        }
    }

    let mut queries = Vec::new();
    if !available_providers.is_empty() {
        let raw_provider = available_providers[0].clone();
        queries.push(PlannedQuery {
            provider_name: raw_provider,
            query: ProviderQuery { text: texts[0].clone(), max_results: max_results_per_query(depth), intent, subtopic_name: None },
        });
        for (i, (facet_name, text)) in subtopics.iter().zip(texts.iter().skip(1)).enumerate() {
            let provider_name = available_providers[(i + 1) % available_providers.len()].clone();
            queries.push(PlannedQuery {
                provider_name,
                query: ProviderQuery {
                    text: text.clone(),
                    max_results: max_results_per_query(depth),
                    intent,
                    subtopic_name: Some(facet_name.clone()),
                },
            });
        }
    }

    QueryPlan { subtopics, queries }
}

/// Renders the human-readable `plan.md` artifact body for a [`QueryPlan`].
#[must_use]
pub fn render_plan_markdown(topic: &str, intent: Intent, depth: Depth, plan: &QueryPlan) -> String {
    let mut out = format!("# Research Plan\n\nTopic: {topic}\nIntent: {intent:?}\nDepth: {depth:?}\n\n## Facets\n\n");
    out.push_str("- (raw topic)\n");
    for facet in &plan.subtopics {
        out.push_str(&format!("- {facet}\n"));
    }
    out.push_str("\n## Queries\n\n");
    for planned in &plan.queries {
        out.push_str(&format!("- `{}` -> {}\n", planned.query.text, planned.provider_name));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_topic_is_always_the_first_query() {
        let providers = vec!["p1".to_string(), "p2".to_string()];
        let plan = plan("eu carbon tariff", Intent::Regulatory, Depth::Standard, &providers);
        assert_eq!(plan.queries[0].query.text, "eu carbon tariff");
        assert!(plan.queries[0].query.subtopic_name.is_none());
    }

    #[test]
    fn deep_depth_never_exceeds_five_expansion_queries() {
        let providers = vec!["p1".to_string()];
        let plan = plan("topic", Intent::Generic, Depth::Deep, &providers);
        assert!(plan.subtopics.len() <= MAX_EXPANSION_QUERIES);
    }

    #[test]
    fn encyclopedia_facets_carry_no_recency_filters() {
        let providers = vec!["p1".to_string()];
        let plan = plan("eiffel tower", Intent::Encyclopedia, Depth::Standard, &providers);
        for q in &plan.queries {
            assert!(!q.query.text.contains("after:"));
        }
    }

    #[test]
    fn news_facets_carry_a_twelve_month_window() {
        let providers = vec!["p1".to_string()];
        let plan = plan("election results", Intent::News, Depth::Standard, &providers);
        assert!(plan.queries.iter().skip(1).all(|q| q.query.text.contains("after:12-months-ago")));
    }

    #[test]
    fn academic_facets_hint_at_edu_sites() {
        let providers = vec!["p1".to_string()];
        let plan = plan("protein folding", Intent::Academic, Depth::Standard, &providers);
        assert!(plan.queries.iter().skip(1).all(|q| q.query.text.contains("site:.edu")));
    }

    #[test]
    fn stats_facets_hint_at_gov_sites() {
        let providers = vec!["p1".to_string()];
        let plan = plan("unemployment rate", Intent::Stats, Depth::Standard, &providers);
        assert!(plan.queries.iter().skip(1).all(|q| q.query.text.contains("site:.gov")));
    }

    #[test]
    fn queries_round_robin_across_providers() {
        let providers = vec!["a".to_string(), "b".to_string()];
        let plan = plan("topic", Intent::Generic, Depth::Standard, &providers);
        assert_eq!(plan.queries[0].provider_name, "a");
        assert_eq!(plan.queries[1].provider_name, "b");
        assert_eq!(plan.queries[2].provider_name, "a");
    }

    #[test]
    fn empty_providers_yields_no_queries_but_keeps_subtopics() {
        let plan = plan("topic", Intent::Generic, Depth::Quick, &[]);
        assert!(plan.queries.is_empty());
        assert_eq!(plan.subtopics.len(), 2);
    }
}
