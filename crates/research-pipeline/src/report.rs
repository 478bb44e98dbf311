// crates/research-pipeline/src/report.rs
// ============================================================================
// Module: Report Renderer
// Description: Renders the run's markdown and CSV artifacts from its final
//              evidence set, metrics, and gate decision.
// Purpose: Turn the pipeline's internal state into the files an operator or
//          downstream tool actually reads.
// Dependencies: research_core::{Evidence, RunMetrics}, crate::gate::GateDecision
// ============================================================================

//! ## Overview
//! A run renders exactly one of [`render_final_report`] or
//! [`render_insufficient_evidence_report`], plus the two evidence-set
//! artifacts ([`render_citation_checklist`], [`render_source_quality_table`])
//! and a machine-readable `sources.csv` row set regardless of gate outcome,
//! since even a rejected run should hand back whatever it found.

use research_core::Evidence;
use research_core::RunMetrics;

use crate::gate::ConfidenceLevel;
use crate::gate::GateDecision;

/// Renders `final_report.md`: a narrative answer grouped by subtopic, with
/// every claim's supporting citations inline.
#[must_use]
pub fn render_final_report(topic: &str, records: &[Evidence], metrics: &RunMetrics, confidence: ConfidenceLevel) -> String {
    let mut out = format!("# Research Report: {topic}\n\n{} Confidence: {}\n\n", confidence.emoji(), confidence.label());
    out.push_str(&format!(
        "Retained {} cards across {} domains; {:.0}% triangulated, {:.0}% primary-sourced.\n\n",
        metrics.total_cards,
        metrics.unique_domains,
        metrics.triangulated_pct * 100.0,
        metrics.primary_share_pct * 100.0
    ));

    for (subtopic, group) in group_by_subtopic(records) {
        out.push_str(&format!("## {subtopic}\n\n"));
        for record in group {
            let quote = record.best_quote.as_deref().unwrap_or(&record.snippet);
            out.push_str(&format!("- {quote} [{}]({})\n", record.source_domain, record.url));
        }
        out.push('\n');
    }

    out
}

/// Renders `insufficient_evidence_report.md`: names every gate check that
/// failed and what was found instead, so the operator knows exactly what a
/// re-run with a deeper [`research_core::Depth`] would need to close.
#[must_use]
pub fn render_insufficient_evidence_report(topic: &str, decision: &GateDecision, metrics: &RunMetrics) -> String {
    let mut out = format!("# Insufficient Evidence: {topic}\n\n{} Confidence: {}\n\n", decision.confidence.emoji(), decision.confidence.label());
    out.push_str(&format!(
        "Collected {} cards across {} domains, below the bar for a confident answer.\n\n## Gaps\n\n",
        metrics.total_cards, metrics.unique_domains
    ));
    for failure in &decision.failures {
        out.push_str(&format!("- **{}**: {}\n", failure.check, failure.detail));
    }
    out.push_str("\nConsider re-running with a deeper search depth or a narrower topic.\n");
    out
}

/// Renders `draft_degraded.md`: a best-effort narrative built from whatever
/// was retained, offered alongside the insufficient-evidence report so an
/// operator can judge whether the shortfall is actually disqualifying.
#[must_use]
pub fn render_draft_degraded(topic: &str, decision: &GateDecision, records: &[Evidence], metrics: &RunMetrics) -> String {
    let mut out = format!("# Preliminary Draft (Gate Failed): {topic}\n\n{} Confidence: {}\n\n", decision.confidence.emoji(), decision.confidence.label());
    out.push_str("This draft did not clear the acceptance gate; treat every claim below as unverified pending a deeper re-run.\n\n## Unmet Checks\n\n");
    for failure in &decision.failures {
        out.push_str(&format!("- **{}**: {}\n", failure.check, failure.detail));
    }
    out.push_str(&format!(
        "\n## Retained Evidence ({} cards, {} domains)\n\n",
        metrics.total_cards, metrics.unique_domains
    ));
    for (subtopic, group) in group_by_subtopic(records) {
        out.push_str(&format!("### {subtopic}\n\n"));
        for record in group {
            let quote = record.best_quote.as_deref().unwrap_or(&record.snippet);
            out.push_str(&format!("- {quote} [{}]({})\n", record.source_domain, record.url));
        }
        out.push('\n');
    }
    out
}

/// Renders `citation_checklist.md`: one line per retained card, flagging
/// any without a usable quote.
#[must_use]
pub fn render_citation_checklist(records: &[Evidence]) -> String {
    let mut out = String::from("# Citation Checklist\n\n");
    for record in records {
        let status = if record.best_quote.is_some() { "OK" } else { "NO QUOTE" };
        out.push_str(&format!("- [{status}] {} — {}\n", record.id, record.url));
    }
    out
}

/// Renders `source_quality_table.md`: a per-domain rollup of credibility and
/// primary-source status.
#[must_use]
pub fn render_source_quality_table(records: &[Evidence]) -> String {
    let mut out = String::from("# Source Quality Table\n\n| Domain | Cards | Avg Credibility | Primary |\n|---|---|---|---|\n");
    for (domain, group) in group_by_domain(records) {
        let count = group.len();
        #[allow(clippy::cast_precision_loss, reason = "card counts per domain are small and fit f64 precision")]
        let avg_credibility = group.iter().map(|r| r.credibility_score).sum::<f64>() / count as f64;
        let is_primary = group.iter().any(|r| r.is_primary_source);
        out.push_str(&format!("| {domain} | {count} | {avg_credibility:.2} | {} |\n", if is_primary { "yes" } else { "no" }));
    }
    out
}

/// Renders `sources.csv`: one row per retained card.
#[must_use]
pub fn render_sources_csv(records: &[Evidence]) -> String {
    let mut out = String::from("id,domain,url,credibility_score,is_primary_source,is_triangulated\n");
    for record in records {
        out.push_str(&format!(
            "{},{},{},{:.2},{},{}\n",
            record.id, record.source_domain, record.url, record.credibility_score, record.is_primary_source, record.is_triangulated
        ));
    }
    out
}

/// Groups `records` by `subtopic_name`, falling back to `"General"`,
/// preserving first-seen subtopic order.
fn group_by_subtopic(records: &[Evidence]) -> Vec<(String, Vec<&Evidence>)> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: std::collections::HashMap<String, Vec<&Evidence>> = std::collections::HashMap::new();
    for record in records {
        let key = record.subtopic_name.clone().unwrap_or_else(|| "General".to_string());
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(record);
    }
    order.into_iter().map(|key| { let v = groups.remove(&key).unwrap_or_default(); (key, v) }).collect()
}

/// Groups `records` by `source_domain`, sorted alphabetically.
fn group_by_domain(records: &[Evidence]) -> Vec<(String, Vec<&Evidence>)> {
    let mut groups: std::collections::BTreeMap<String, Vec<&Evidence>> = std::collections::BTreeMap::new();
    for record in records {
        groups.entry(record.source_domain.clone()).or_default().push(record);
    }
    groups.into_iter().collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "tests assert against deterministic fixtures")]
mod tests {
    use research_core::CanonicalId;
    use research_core::ProviderTag;
    use research_core::Stance;

    use super::*;
    use crate::gate::GateFailure;

    fn record(id: &str, domain: &str, subtopic: Option<&str>) -> Evidence {
        Evidence {
            id: id.to_string(),
            canonical_id: CanonicalId::UrlFingerprint(id.to_string()),
            provider: ProviderTag::WebSearch,
            url: format!("https://{domain}/{id}"),
            canonical_url: format!("https://{domain}/{id}"),
            source_domain: domain.to_string(),
            title: "t".to_string(),
            snippet: "s".to_string(),
            best_quote: Some("GDP grew 3 percent.".to_string()),
            publication_date: None,
            collected_at: "t".to_string(),
            credibility_score: 0.8,
            relevance_score: 0.5,
            confidence: 0.5,
            is_primary_source: true,
            is_triangulated: true,
            cluster_id: None,
            family: None,
            controversy_score: 0.0,
            stance: Stance::Neutral,
            disputed_by: std::collections::BTreeSet::new(),
            claim: None,
            supporting_text: None,
            subtopic_name: subtopic.map(str::to_string),
        }
    }

    fn sample_metrics() -> RunMetrics {
        RunMetrics {
            total_cards: 2,
            unique_domains: 2,
            credible_cards: 2,
            triangulated_pct: 1.0,
            triangulated_cards: 2,
            triangulated_clusters: 1,
            primary_share_pct: 1.0,
            top_domain_share: 0.5,
            contradiction_pct: 0.0,
            provider_error_rate: 0.0,
            elapsed_seconds: 10.0,
        }
    }

    fn sample_supply() -> research_core::SupplyContext {
        research_core::SupplyContext { total_cards: 3, unique_domains: 2, credible_cards: 2, provider_error_rate: 0.0, time_budget_used_pct: 0.9 }
    }

    #[test]
    fn final_report_groups_by_subtopic_and_shows_confidence() {
        let records = vec![record("e1", "a.com", Some("official data")), record("e2", "b.com", Some("official data"))];
        let report = render_final_report("topic", &records, &sample_metrics(), ConfidenceLevel::High);
        assert!(report.contains("## official data"));
        assert!(report.contains("GDP grew 3 percent."));
        assert!(report.contains("Confidence: High"));
    }

    #[test]
    fn insufficient_report_lists_every_failure() {
        let decision = crate::gate::GateDecision {
            accepted: false,
            failures: vec![GateFailure { check: "credible_cards".to_string(), detail: "1 observed, 10 required".to_string() }],
            supply: sample_supply(),
            confidence: ConfidenceLevel::Low,
        };
        let report = render_insufficient_evidence_report("topic", &decision, &sample_metrics());
        assert!(report.contains("credible_cards"));
        assert!(report.contains("Confidence: Low"));
    }

    #[test]
    fn draft_degraded_lists_failures_and_retained_evidence() {
        let decision = crate::gate::GateDecision {
            accepted: false,
            failures: vec![GateFailure { check: "credible_cards".to_string(), detail: "2 observed, 10 required".to_string() }],
            supply: sample_supply(),
            confidence: ConfidenceLevel::Low,
        };
        let records = vec![record("e1", "a.com", Some("official data"))];
        let draft = render_draft_degraded("topic", &decision, &records, &sample_metrics());
        assert!(draft.contains("credible_cards"));
        assert!(draft.contains("GDP grew 3 percent."));
    }

    #[test]
    fn citation_checklist_flags_missing_quotes() {
        let mut no_quote = record("e1", "a.com", None);
        no_quote.best_quote = None;
        let checklist = render_citation_checklist(&[no_quote]);
        assert!(checklist.contains("NO QUOTE"));
    }

    #[test]
    fn source_quality_table_rolls_up_by_domain() {
        let records = vec![record("e1", "a.com", None), record("e2", "a.com", None)];
        let table = render_source_quality_table(&records);
        assert!(table.contains("a.com"));
        assert!(table.contains("| 2 |"));
    }
}
