// crates/research-pipeline/src/artifacts.rs
// ============================================================================
// Module: Artifact Writer
// Description: Writes the run directory's files: evidence JSONL, metrics
//              JSON, and the rendered report/checklist/table markdown.
// Purpose: Be the single place that knows the run directory's file layout,
//          so the CLI's orchestration code stays free of path literals.
// Dependencies: std::fs, serde_json, research_core::PipelineError
// ============================================================================

//! ## Overview
//! A run directory always gets `evidence_cards.jsonl`, `metrics.json`,
//! `triangulation.json`, `citation_checklist.md`, and `source_quality_table.md`;
//! malformed records encountered along the way go to
//! `evidence_cards.errors.jsonl` instead of being silently dropped.
//! `triangulation.json` splits clusters into `paraphrase_clusters` (found by
//! similarity-threshold clustering) and `structured_triangles` (found by a
//! shared [`research_core::claim::StructuredClaim`] key), since a reader
//! trusts the two differently. The `evidence/` subdirectory mirrors the
//! final retained set for downstream tooling that only wants the post-gate
//! data: `final_cards.jsonl`, `sources.csv`, `metrics_snapshot.json`.

use std::fs;
use std::path::Path;

use research_core::Cluster;
use research_core::Evidence;
use research_core::PipelineError;
use research_core::ProviderHit;
use research_core::RunMetrics;

use crate::report;

/// One cluster's entry in `triangulation.json`.
#[derive(Debug, Clone, serde::Serialize)]
struct ClusterSummary {
    /// Member evidence ids.
    indices: Vec<String>,
    /// Distinct source domains contributing to the cluster.
    domains: Vec<String>,
    /// Number of member evidence records.
    size: usize,
    /// The shared claim key, for structured triangles only.
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<String>,
}

impl From<&Cluster> for ClusterSummary {
    fn from(cluster: &Cluster) -> Self {
        Self {
            indices: cluster.member_ids.iter().cloned().collect(),
            domains: cluster.domains.iter().cloned().collect(),
            size: cluster.size(),
            key: cluster.claim_key.clone(),
        }
    }
}

/// The `triangulation.json` document: paraphrase-similarity clusters and
/// claim-keyed structured triangles, reported separately.
#[derive(Debug, Clone, serde::Serialize)]
struct TriangulationArtifact {
    paraphrase_clusters: Vec<ClusterSummary>,
    structured_triangles: Vec<ClusterSummary>,
}

/// Splits `clusters` into the paraphrase/structured document `triangulation.json`
/// expects: a cluster with a claim key is a structured triangle, everything
/// else is a paraphrase cluster.
fn build_triangulation_artifact(clusters: &[Cluster]) -> TriangulationArtifact {
    let mut paraphrase_clusters = Vec::new();
    let mut structured_triangles = Vec::new();
    for cluster in clusters {
        if cluster.claim_key.is_some() {
            structured_triangles.push(ClusterSummary::from(cluster));
        } else {
            paraphrase_clusters.push(ClusterSummary::from(cluster));
        }
    }
    TriangulationArtifact { paraphrase_clusters, structured_triangles }
}

/// Writes every artifact for a completed run into `run_dir`.
///
/// # Errors
/// Returns [`PipelineError::Io`] if any file cannot be created, and
/// [`PipelineError::Validation`] if serialization fails.
#[allow(clippy::too_many_arguments, reason = "mirrors the run directory's fixed artifact set; splitting further would scatter one write operation across several calls")]
pub fn write_run_artifacts(
    run_dir: &Path,
    topic: &str,
    records: &[Evidence],
    rejected_records: &[(ProviderHit, String)],
    clusters: &[Cluster],
    metrics: &RunMetrics,
    gate_decision: &crate::gate::GateDecision,
    write_draft_on_fail: bool,
) -> Result<(), PipelineError> {
    fs::create_dir_all(run_dir)?;
    let evidence_dir = run_dir.join("evidence");
    fs::create_dir_all(&evidence_dir)?;

    write_jsonl(&run_dir.join("evidence_cards.jsonl"), records)?;
    write_error_jsonl(&run_dir.join("evidence_cards.errors.jsonl"), rejected_records)?;
    write_json(&run_dir.join("metrics.json"), metrics)?;
    write_json(&run_dir.join("triangulation.json"), &build_triangulation_artifact(clusters))?;

    fs::write(run_dir.join("citation_checklist.md"), report::render_citation_checklist(records))?;
    fs::write(run_dir.join("source_quality_table.md"), report::render_source_quality_table(records))?;

    if gate_decision.accepted {
        fs::write(run_dir.join("final_report.md"), report::render_final_report(topic, records, metrics, gate_decision.confidence))?;
    } else {
        fs::write(
            run_dir.join("insufficient_evidence_report.md"),
            report::render_insufficient_evidence_report(topic, gate_decision, metrics),
        )?;
        if write_draft_on_fail {
            fs::write(run_dir.join("draft_degraded.md"), report::render_draft_degraded(topic, gate_decision, records, metrics))?;
        }
    }

    write_jsonl(&evidence_dir.join("final_cards.jsonl"), records)?;
    fs::write(evidence_dir.join("sources.csv"), report::render_sources_csv(records))?;
    write_json(&evidence_dir.join("metrics_snapshot.json"), metrics)?;

    Ok(())
}

/// Writes `plan.md`, `source_strategy.md`, and `acceptance_guardrails.md`
/// ahead of collection, before any evidence exists.
///
/// # Errors
/// Returns [`PipelineError::Io`] if any file cannot be created.
pub fn write_planning_artifacts(run_dir: &Path, plan_markdown: &str, source_strategy_markdown: &str, guardrails_markdown: &str) -> Result<(), PipelineError> {
    fs::create_dir_all(run_dir)?;
    fs::write(run_dir.join("plan.md"), plan_markdown)?;
    fs::write(run_dir.join("source_strategy.md"), source_strategy_markdown)?;
    fs::write(run_dir.join("acceptance_guardrails.md"), guardrails_markdown)?;
    Ok(())
}

/// Writes `records` as newline-delimited JSON to `path`.
fn write_jsonl(path: &Path, records: &[Evidence]) -> Result<(), PipelineError> {
    let mut body = String::new();
    for record in records {
        body.push_str(&serde_json::to_string(record)?);
        body.push('\n');
    }
    fs::write(path, body)?;
    Ok(())
}

/// Writes rejected provider hits (with their rejection reason) as
/// newline-delimited JSON to `path`.
fn write_error_jsonl(path: &Path, rejected: &[(ProviderHit, String)]) -> Result<(), PipelineError> {
    let mut body = String::new();
    for (hit, reason) in rejected {
        let mut value = serde_json::to_value(hit)?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("rejection_reason".to_string(), serde_json::Value::String(reason.clone()));
        }
        body.push_str(&serde_json::to_string(&value)?);
        body.push('\n');
    }
    fs::write(path, body)?;
    Ok(())
}

/// Writes `value` as pretty-printed JSON to `path`.
fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), PipelineError> {
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "tests assert against deterministic fixtures")]
mod tests {
    use research_core::CanonicalId;
    use research_core::ProviderTag;
    use research_core::Stance;
    use research_core::SupplyContext;

    use super::*;
    use crate::gate::GateDecision;

    fn rejected_hit() -> ProviderHit {
        ProviderHit { title: "t".to_string(), url: "not a url".to_string(), snippet: "s".to_string(), published_at: None, doi: None, raw_score: None }
    }

    fn record() -> Evidence {
        Evidence {
            id: "ev-000001".to_string(),
            canonical_id: CanonicalId::UrlFingerprint("x".to_string()),
            provider: ProviderTag::WebSearch,
            url: "https://example.com".to_string(),
            canonical_url: "https://example.com".to_string(),
            source_domain: "example.com".to_string(),
            title: "t".to_string(),
            snippet: "s".to_string(),
            best_quote: None,
            publication_date: None,
            collected_at: "t".to_string(),
            credibility_score: 0.5,
            relevance_score: 0.5,
            confidence: 0.5,
            is_primary_source: false,
            is_triangulated: false,
            cluster_id: None,
            family: None,
            controversy_score: 0.0,
            stance: Stance::Neutral,
            disputed_by: std::collections::BTreeSet::new(),
            claim: None,
            supporting_text: None,
            subtopic_name: None,
        }
    }

    fn metrics() -> RunMetrics {
        RunMetrics {
            total_cards: 1,
            unique_domains: 1,
            credible_cards: 1,
            triangulated_pct: 0.0,
            triangulated_cards: 0,
            triangulated_clusters: 0,
            primary_share_pct: 0.0,
            top_domain_share: 0.0,
            contradiction_pct: 0.0,
            provider_error_rate: 0.0,
            elapsed_seconds: 1.0,
        }
    }

    fn supply() -> SupplyContext {
        SupplyContext { total_cards: 1, unique_domains: 1, credible_cards: 1, provider_error_rate: 0.0, time_budget_used_pct: 0.1 }
    }

    fn claim_cluster() -> Cluster {
        let mut cluster = Cluster::new(1, Some("k".to_string()));
        cluster.add_member("ev-000001", "example.com");
        cluster.add_member("ev-000002", "other.com");
        cluster
    }

    fn paraphrase_cluster() -> Cluster {
        let mut cluster = Cluster::new(2, None);
        cluster.add_member("ev-000003", "third.com");
        cluster
    }

    #[test]
    fn accepted_run_writes_final_report_and_evidence_mirror() {
        let dir = tempfile::tempdir().expect("tempdir");
        let decision = GateDecision { accepted: true, failures: Vec::new(), supply: supply(), confidence: crate::gate::ConfidenceLevel::High };
        write_run_artifacts(dir.path(), "topic", &[record()], &[], &[], &metrics(), &decision, false).expect("writes");

        assert!(dir.path().join("final_report.md").exists());
        assert!(!dir.path().join("insufficient_evidence_report.md").exists());
        assert!(dir.path().join("evidence/final_cards.jsonl").exists());
        assert!(dir.path().join("evidence/sources.csv").exists());
    }

    #[test]
    fn rejected_run_writes_insufficient_evidence_report() {
        let dir = tempfile::tempdir().expect("tempdir");
        let decision = GateDecision {
            accepted: false,
            failures: vec![crate::gate::GateFailure { check: "credible_cards".to_string(), detail: "1 observed, 10 required".to_string() }],
            supply: supply(),
            confidence: crate::gate::ConfidenceLevel::Low,
        };
        write_run_artifacts(dir.path(), "topic", &[record()], &[(rejected_hit(), "no usable source domain".to_string())], &[], &metrics(), &decision, false).expect("writes");

        assert!(dir.path().join("insufficient_evidence_report.md").exists());
        assert!(dir.path().join("evidence_cards.errors.jsonl").exists());
        assert!(!dir.path().join("draft_degraded.md").exists());
    }

    #[test]
    fn rejected_run_with_draft_on_fail_also_writes_draft() {
        let dir = tempfile::tempdir().expect("tempdir");
        let decision = GateDecision {
            accepted: false,
            failures: vec![crate::gate::GateFailure { check: "credible_cards".to_string(), detail: "1 observed, 10 required".to_string() }],
            supply: supply(),
            confidence: crate::gate::ConfidenceLevel::Low,
        };
        write_run_artifacts(dir.path(), "topic", &[record()], &[], &[], &metrics(), &decision, true).expect("writes");

        assert!(dir.path().join("draft_degraded.md").exists());
    }

    #[test]
    fn triangulation_artifact_splits_claim_and_paraphrase_clusters() {
        let artifact = build_triangulation_artifact(&[claim_cluster(), paraphrase_cluster()]);
        assert_eq!(artifact.structured_triangles.len(), 1);
        assert_eq!(artifact.paraphrase_clusters.len(), 1);
        assert_eq!(artifact.structured_triangles[0].key.as_deref(), Some("k"));
        assert!(artifact.paraphrase_clusters[0].key.is_none());
        assert_eq!(artifact.structured_triangles[0].size, 2);
    }

    #[test]
    fn triangulation_artifact_round_trips_through_serde_json() {
        let artifact = build_triangulation_artifact(&[claim_cluster()]);
        let value = serde_json::to_value(&artifact).expect("serializes");
        assert!(value.get("paraphrase_clusters").is_some());
        assert!(value.get("structured_triangles").is_some());
    }
}
