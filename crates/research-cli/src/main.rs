// crates/research-cli/src/main.rs
// ============================================================================
// Module: Research CLI
// Description: Command-line entry point: parses flags, loads configuration,
//              drives the pipeline end to end, and writes run artifacts.
// Purpose: Be the one place that touches argv, process environment overrides
//          outside research-config, and wall-clock exit-code mapping.
// Dependencies: clap, tokio, tracing, research-core, research-config,
//               research-providers, research-dispatch, research-pipeline
// ============================================================================

//! ## Overview
//! One invocation runs one topic through the full pipeline: classify ->
//! plan -> dispatch -> normalize -> dedup -> enrich -> extract claims ->
//! triangulate -> cap domains -> score credibility -> aggregate metrics ->
//! evaluate the gate -> (backfill and retry, or) write artifacts. Every
//! stage after argument parsing and config loading is a call into
//! `research-pipeline`, `research-dispatch`, or `research-providers`; this
//! crate owns only orchestration order, run-directory bookkeeping, and the
//! handful of environment overrides not already covered by
//! `research_config::RunConfig`.
//!
//! Exit codes: `0` on an accepted report, `1` on a rejected gate decision
//! (after `insufficient_evidence_report.md` is written) or a configuration
//! or argument error, `2` when the wall-clock budget was exceeded before
//! the pipeline could finish, with whatever partial artifacts were written.

use std::collections::HashMap;
use std::io::Write as _;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use research_core::Cluster;
use research_core::Depth;
use research_core::Evidence;
use research_core::Intent;
use research_core::IntentThresholds;
use research_core::ProviderHit;
use research_core::ProviderQuery;
use research_core::ProviderTag;
use research_dispatch::DispatchError;
use research_dispatch::DispatchOutcome;
use research_dispatch::DispatchRequest;
use research_dispatch::Dispatcher;
use research_providers::HttpFetchConfig;
use research_providers::JsonSearchProvider;
use research_providers::ProviderRegistry;

/// Credibility floor a card must clear to count toward
/// [`research_pipeline::metrics_aggregator::aggregate`]'s `credible_cards`,
/// matching the lowest base score `research-pipeline`'s credibility scorer
/// ever assigns a non-singleton record.
const CREDIBILITY_FLOOR: f64 = 0.5;

/// Maximum results requested per generated backfill query.
const BACKFILL_MAX_RESULTS: usize = 8;

/// Flags accepted by a single research run. There are no subcommands:
/// every invocation produces exactly one run directory for one topic.
#[derive(Debug, Parser)]
#[command(name = "research-agent", about = "Produce a sourced research report for a topic.")]
struct Cli {
    /// The research topic to investigate.
    #[arg(long)]
    topic: String,

    /// How thorough a pass to run.
    #[arg(long, value_enum, default_value = "standard")]
    depth: DepthArg,

    /// Directory new run directories are created under; defaults to the
    /// configured `RA_OUTPUT_DIR` (or `outputs`).
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Maximum provider spend, in USD, before collection halts; defaults to
    /// the configured `RA_MAX_COST_USD`.
    #[arg(long)]
    max_cost: Option<f64>,

    /// Reject any non-primary source outright for a primary-only intent,
    /// rather than merely down-weighting it.
    #[arg(long)]
    strict: bool,

    /// Continue into the most recent existing run directory for this topic
    /// instead of starting a new one.
    #[arg(long)]
    resume: bool,

    /// Emit debug-level tracing regardless of the configured log level.
    #[arg(long)]
    verbose: bool,
}

/// Command-line form of [`Depth`]; kept distinct so the flag's accepted
/// spellings (`rapid`/`standard`/`deep`) don't have to match the enum's
/// internal variant names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
#[value(rename_all = "lowercase")]
enum DepthArg {
    /// A fast, lower-confidence pass.
    Rapid,
    /// The default balance of thoroughness and latency.
    Standard,
    /// A slower, exhaustive pass with a relaxed time budget.
    Deep,
}

impl DepthArg {
    /// Maps the CLI spelling onto the pipeline's [`Depth`] enum.
    const fn to_depth(self) -> Depth {
        match self {
            Self::Rapid => Depth::Quick,
            Self::Standard => Depth::Standard,
            Self::Deep => Depth::Deep,
        }
    }
}

/// A user-facing CLI failure: a bad argument, an unreadable config value,
/// or an I/O failure writing run artifacts.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
struct CliError {
    /// The message written to stderr when this error reaches `main`.
    message: String,
}

impl CliError {
    /// Wraps `message` as a [`CliError`].
    const fn new(message: String) -> Self {
        Self { message }
    }

    /// Wraps any displayable error as a [`CliError`].
    fn from_display<E: std::fmt::Display>(err: E) -> Self {
        Self::new(err.to_string())
    }
}

/// Result type returned by every fallible step in [`run`].
type CliResult<T> = Result<T, CliError>;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Runs one topic through the full pipeline and writes its run directory.
///
/// # Errors
/// Returns [`CliError`] for an empty topic, a configuration load failure,
/// or an I/O failure writing run artifacts.
async fn run(cli: Cli) -> CliResult<ExitCode> {
    let config = research_config::RunConfig::from_env().map_err(CliError::from_display)?;
    init_tracing(&config.log_level, cli.verbose);

    let topic = cli.topic.trim().to_string();
    if topic.is_empty() {
        return Err(CliError::new("--topic must not be empty".to_string()));
    }

    let depth = cli.depth.to_depth();
    let output_dir = cli.output_dir.clone().unwrap_or_else(|| PathBuf::from(&config.default_output_dir));
    let _max_cost_usd = cli.max_cost.unwrap_or(config.default_max_cost_usd);
    let slug = slugify(&topic);

    let wall_timeout_sec =
        research_config::env::read_u64("WALL_TIMEOUT_SEC", depth.time_budget_seconds()).map_err(CliError::from_display)?;
    let gates_profile = research_config::env::read_string("GATES_PROFILE");
    let write_draft_on_fail = research_config::env::read_bool("WRITE_DRAFT_ON_FAIL", false).map_err(CliError::from_display)?;
    let tri_threshold = research_config::env::read_f64("TRI_PARA_THRESHOLD", research_pipeline::DEFAULT_CLUSTER_SIMILARITY_THRESHOLD)
        .map_err(CliError::from_display)?;

    let quality = if gates_profile.as_deref() == Some("discovery") {
        config.quality.relaxed_for_discovery()
    } else {
        config.quality.clone()
    };

    let started_at_unix_millis = research_core::now_unix_millis();
    let budget_millis = i64::try_from(wall_timeout_sec.saturating_mul(1000)).unwrap_or(i64::MAX);
    let deadline_unix_millis = started_at_unix_millis.saturating_add(budget_millis);

    let timestamp = run_timestamp(time::OffsetDateTime::now_utc());
    let (run_dir, resumed) = resolve_run_dir(&output_dir, &slug, cli.resume, &timestamp).map_err(CliError::from_display)?;
    tracing::info!(run_dir = %run_dir.display(), resumed, depth = ?depth, "starting run");

    let classification = research_pipeline::classify_detailed(&topic);
    let intent = classification.intent;
    if !classification.ambiguous_places.is_empty() {
        tracing::warn!(places = ?classification.ambiguous_places, "topic contains geographically ambiguous place names");
    }

    let provider_fetch_config = HttpFetchConfig {
        timeout: Duration::from_millis(config.providers.request_timeout_ms),
        max_response_bytes: config.providers.max_response_bytes,
        ..HttpFetchConfig::default()
    };
    let doi_fetch_config = HttpFetchConfig {
        timeout: Duration::from_secs(config.providers.doi_resolution_timeout_secs),
        max_response_bytes: config.providers.max_response_bytes,
        ..HttpFetchConfig::default()
    };

    let mut registry = ProviderRegistry::new(config.providers.clone(), &config.global_seed);
    if config.providers.enable_free_apis && config.providers.is_enabled("web-search") {
        registry.register(
            Box::new(JsonSearchProvider::web_search(config.providers.web_search_base_url.clone(), provider_fetch_config.clone())),
            config.providers.circuit_breaker,
        );
    }
    if config.providers.enable_free_apis && config.providers.is_enabled("statistical-agency") {
        registry.register(
            Box::new(JsonSearchProvider::statistical_agency(config.providers.stats_agency_base_url.clone(), provider_fetch_config)),
            config.providers.circuit_breaker,
        );
    }
    let registry = Arc::new(registry);
    let available_providers = registry.available_providers();

    let plan = research_pipeline::plan(&topic, intent, depth, &available_providers);
    let thresholds = IntentThresholds::for_intent(intent);
    let plan_markdown = research_pipeline::render_plan_markdown(&topic, intent, depth, &plan);
    let source_strategy_markdown = render_source_strategy(&topic, intent, &thresholds, &available_providers);
    let guardrails_markdown = render_guardrails(&quality, cli.strict);

    std::fs::create_dir_all(&run_dir).map_err(CliError::from_display)?;
    research_pipeline::artifacts::write_planning_artifacts(&run_dir, &plan_markdown, &source_strategy_markdown, &guardrails_markdown)
        .map_err(CliError::from_display)?;

    let query_text_by_subtopic: HashMap<Option<String>, String> =
        plan.queries.iter().map(|planned| (planned.query.subtopic_name.clone(), planned.query.text.clone())).collect();

    let dispatcher = Dispatcher::new(Arc::clone(&registry));
    let per_call_timeout = Duration::from_millis(config.providers.request_timeout_ms);

    let mut ids = research_pipeline::IdAllocator::default();
    let mut accumulated: Vec<Evidence> = Vec::new();
    let mut total_rejected: Vec<(ProviderHit, String)> = Vec::new();
    let mut total_outcomes = 0usize;
    let mut total_errors = 0usize;
    let mut deadline_hit = false;

    if !plan.queries.is_empty() {
        let requests: Vec<DispatchRequest> = plan
            .queries
            .iter()
            .map(|planned| DispatchRequest { provider_name: planned.provider_name.clone(), query: planned.query.clone() })
            .collect();
        let overall_deadline = remaining_duration(deadline_unix_millis, research_core::now_unix_millis());
        let (outcomes, hit_deadline) = dispatch_round(&dispatcher, requests, per_call_timeout, overall_deadline).await;
        deadline_hit = deadline_hit || hit_deadline;
        let collected_at = research_core::now_rfc3339();
        let (records, rejected, errors, outcomes_count) = normalize_outcomes(outcomes, &mut ids, &collected_at);
        total_errors += errors;
        total_outcomes += outcomes_count;
        accumulated.extend(records);
        total_rejected.extend(rejected);
    }

    let (mut records, mut clusters) =
        process_round(Vec::new(), accumulated, &query_text_by_subtopic, &doi_fetch_config, &quality, tri_threshold).await;

    let mut provider_error_rate = ratio_usize(total_errors, total_outcomes);
    let mut elapsed_seconds = elapsed_seconds_since(started_at_unix_millis);
    let mut metrics = research_pipeline::aggregate(&records, &clusters, CREDIBILITY_FLOOR, provider_error_rate, elapsed_seconds);
    let mut tb_pct = time_budget_used_pct(research_core::now_unix_millis(), started_at_unix_millis, deadline_unix_millis);
    let mut gate_decision = research_pipeline::evaluate(&metrics, &quality, cli.strict, tb_pct);

    let mut attempts_used: u32 = 0;
    while quality.backfill.enabled
        && needs_backfill(&gate_decision, &metrics, &quality)
        && !deadline_hit
        && !available_providers.is_empty()
    {
        let now = research_core::now_unix_millis();
        tb_pct = time_budget_used_pct(now, started_at_unix_millis, deadline_unix_millis);
        let shortfall_pp = quality.triangulation.get_threshold(cli.strict, &gate_decision.supply) - metrics.triangulated_pct;
        let attempt_round = research_pipeline::backfill::should_attempt_round(&quality.backfill, attempts_used, tb_pct);
        let attempt_last_mile = research_pipeline::backfill::should_attempt_last_mile(&quality.backfill, shortfall_pp, tb_pct);
        if !attempt_round && !attempt_last_mile {
            break;
        }

        let mut backfill_queries = research_pipeline::backfill::generate_queries(&topic, &gate_decision.failures);
        if backfill_queries.is_empty() && below_min_cards_floor(&gate_decision, &metrics, &quality) {
            backfill_queries = research_pipeline::backfill::generate_min_cards_queries(&topic);
        }
        if backfill_queries.is_empty() {
            break;
        }

        let requests: Vec<DispatchRequest> = backfill_queries
            .iter()
            .enumerate()
            .map(|(i, backfill_query)| DispatchRequest {
                provider_name: available_providers[i % available_providers.len()].clone(),
                query: ProviderQuery {
                    text: backfill_query.text.clone(),
                    max_results: BACKFILL_MAX_RESULTS,
                    intent,
                    subtopic_name: Some(backfill_query.purpose.clone()),
                },
            })
            .collect();

        let overall_deadline = remaining_duration(deadline_unix_millis, now);
        if overall_deadline.is_zero() {
            deadline_hit = true;
            break;
        }
        let (outcomes, hit_deadline) = dispatch_round(&dispatcher, requests, per_call_timeout, overall_deadline).await;
        deadline_hit = deadline_hit || hit_deadline;

        let collected_at = research_core::now_rfc3339();
        let (new_records, rejected, errors, outcomes_count) = normalize_outcomes(outcomes, &mut ids, &collected_at);
        total_errors += errors;
        total_outcomes += outcomes_count;
        total_rejected.extend(rejected);

        let (next_records, next_clusters) =
            process_round(new_records, records, &query_text_by_subtopic, &doi_fetch_config, &quality, tri_threshold).await;
        records = next_records;
        clusters = next_clusters;

        provider_error_rate = ratio_usize(total_errors, total_outcomes);
        elapsed_seconds = elapsed_seconds_since(started_at_unix_millis);
        metrics = research_pipeline::aggregate(&records, &clusters, CREDIBILITY_FLOOR, provider_error_rate, elapsed_seconds);
        tb_pct = time_budget_used_pct(research_core::now_unix_millis(), started_at_unix_millis, deadline_unix_millis);
        gate_decision = research_pipeline::evaluate(&metrics, &quality, cli.strict, tb_pct);
        attempts_used += 1;
    }

    research_pipeline::artifacts::write_run_artifacts(&run_dir, &topic, &records, &total_rejected, &clusters, &metrics, &gate_decision, write_draft_on_fail)
        .map_err(CliError::from_display)?;

    let final_tb_pct = time_budget_used_pct(research_core::now_unix_millis(), started_at_unix_millis, deadline_unix_millis);
    if deadline_hit || final_tb_pct >= 1.0 {
        write_stderr_line(&format!("run exceeded its wall-clock budget; partial artifacts written to {}", run_dir.display()))
            .map_err(CliError::from_display)?;
        return Ok(ExitCode::from(2));
    }
    if !gate_decision.accepted {
        write_stdout_line(&format!("insufficient evidence; see {}", run_dir.join("insufficient_evidence_report.md").display()))
            .map_err(CliError::from_display)?;
        // A gate failure is not itself an error; only strict mode upgrades it
        // to a non-zero exit after the insufficient-evidence report is written.
        return Ok(if cli.strict { ExitCode::from(1) } else { ExitCode::SUCCESS });
    }
    write_stdout_line(&format!("report written to {}", run_dir.join("final_report.md").display())).map_err(CliError::from_display)?;
    Ok(ExitCode::SUCCESS)
}

/// Installs a `tracing-subscriber` writing to stderr, filtered by
/// `log_level` unless `--verbose` forces debug level.
fn init_tracing(log_level: &str, verbose: bool) {
    let directive = if verbose { "debug" } else { log_level };
    let filter = tracing_subscriber::EnvFilter::try_new(directive).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

/// Dispatches one round of requests, reporting whether the overall deadline
/// was hit rather than surfacing it as a hard error: partial outcomes are
/// still usable evidence.
async fn dispatch_round(
    dispatcher: &Dispatcher,
    requests: Vec<DispatchRequest>,
    per_call_timeout: Duration,
    overall_deadline: Duration,
) -> (Vec<DispatchOutcome>, bool) {
    match dispatcher.dispatch_all(requests, per_call_timeout, overall_deadline).await {
        Ok(outcomes) => (outcomes, false),
        Err((outcomes, DispatchError::DeadlineExceeded { .. })) => (outcomes, true),
        Err((outcomes, DispatchError::Empty)) => (outcomes, false),
    }
}

/// Reason a raw provider hit failed to normalize into an [`Evidence`]
/// record. The normalizer currently only ever drops a hit for one reason;
/// named here rather than inlined at the call site so the errors-jsonl
/// artifact and any future rejection reason stay in one place.
const REJECTION_NO_USABLE_DOMAIN: &str = "no usable source domain";

/// Normalizes every successful outcome's hits into [`Evidence`] records,
/// collecting hits the normalizer rejects (with their reason) separately,
/// and counts failed outcomes.
fn normalize_outcomes(
    outcomes: Vec<DispatchOutcome>,
    ids: &mut research_pipeline::IdAllocator,
    collected_at: &str,
) -> (Vec<Evidence>, Vec<(ProviderHit, String)>, usize, usize) {
    let mut records = Vec::new();
    let mut rejected = Vec::new();
    let mut errors = 0usize;
    let total = outcomes.len();
    for outcome in outcomes {
        match outcome.result {
            Ok(hits) => {
                let tag = provider_tag(&outcome.provider_name);
                for hit in hits {
                    let hit_for_rejection = hit.clone();
                    match research_pipeline::normalize(tag, hit, outcome.subtopic_name.clone(), ids, collected_at) {
                        Some(evidence) => records.push(evidence),
                        None => rejected.push((hit_for_rejection, REJECTION_NO_USABLE_DOMAIN.to_string())),
                    }
                }
            }
            Err(_) => errors += 1,
        }
    }
    (records, rejected, errors, total)
}

/// Maps a registered provider name back to its [`ProviderTag`].
fn provider_tag(name: &str) -> ProviderTag {
    match name {
        "web-search" => ProviderTag::WebSearch,
        "statistical-agency" => ProviderTag::StatisticalAgency,
        _ => ProviderTag::Other,
    }
}

/// Runs one set of newly-collected records (plus everything retained so
/// far) through dedup, enrichment, claim extraction, triangulation, domain
/// balancing, and credibility scoring.
async fn process_round(
    mut new_records: Vec<Evidence>,
    mut accumulated: Vec<Evidence>,
    query_text_by_subtopic: &HashMap<Option<String>, String>,
    doi_fetch_config: &HttpFetchConfig,
    quality: &research_config::QualityConfig,
    tri_threshold: f64,
) -> (Vec<Evidence>, Vec<Cluster>) {
    accumulated.append(&mut new_records);
    let deduped = research_pipeline::dedup_records(accumulated, &research_pipeline::JaccardSimilarity);

    let mut enriched = Vec::with_capacity(deduped.len());
    for mut record in deduped {
        research_pipeline::enrichment::resolve_doi_redirect(&mut record, doi_fetch_config).await;
        let query_text = query_text_by_subtopic.get(&record.subtopic_name).map_or("", String::as_str);
        research_pipeline::enrichment::enrich_best_quote(&mut record, query_text);
        research_pipeline::extract_claim(&mut record);
        enriched.push(record);
    }

    let (triangulated, clusters) = research_pipeline::triangulate(enriched, &research_pipeline::JaccardSimilarity, tri_threshold);
    let capped = research_pipeline::enforce_cap(triangulated, &quality.domain_balance);
    let scored = score_credibility(capped, &clusters, &quality.credibility);
    (scored, clusters)
}

/// Scores every record's credibility, looking up singleton status from its
/// cluster's size.
fn score_credibility(mut records: Vec<Evidence>, clusters: &[Cluster], config: &research_config::CredibilityConfig) -> Vec<Evidence> {
    let sizes: std::collections::BTreeMap<u64, usize> = clusters.iter().map(|cluster| (cluster.id, cluster.size())).collect();
    for record in &mut records {
        let is_singleton = record.cluster_id.and_then(|id| sizes.get(&id)).map_or(true, |&size| size <= 1);
        research_pipeline::credibility::score(record, config, is_singleton);
    }
    records
}

/// Renders `source_strategy.md`: the per-intent source targets this run is
/// aiming for, and which providers were available to plan against.
fn render_source_strategy(topic: &str, intent: Intent, thresholds: &IntentThresholds, available_providers: &[String]) -> String {
    let mut out = format!("# Source Strategy: {topic}\n\nIntent: {intent:?}\n\n");
    out.push_str(&format!(
        "Target: at least {} sources, {:.0}% union triangulation.\n\n## Available Providers\n\n",
        thresholds.min_sources,
        thresholds.min_triangulation * 100.0,
    ));
    if available_providers.is_empty() {
        out.push_str("- none registered or available\n");
    } else {
        for provider in available_providers {
            out.push_str(&format!("- {provider}\n"));
        }
    }
    out
}

/// Renders `acceptance_guardrails.md`: the configured thresholds this run's
/// gate evaluation will check against.
fn render_guardrails(quality: &research_config::QualityConfig, strict: bool) -> String {
    let tri = &quality.triangulation;
    let primary = &quality.primary_share;
    format!(
        "# Acceptance Guardrails\n\n- Minimum retained cards (backfill trigger, not a gate check): {} normal / {} constrained / {} low evidence\n- Minimum credible cards: {}\n- Triangulation target: {:.0}% ({} mode), {:.0}% under constrained supply, floor {:.0}% under low evidence\n- Primary-source target: {:.0}% ({:.0}% under constrained supply, {:.0}% under low evidence)\n- Strict mode: {strict}\n",
        tri.min_cards_abs,
        tri.min_cards_abs_constrained,
        tri.min_cards_abs_low_supply,
        tri.min_credible_cards,
        if strict { tri.target_strict_pct * 100.0 } else { tri.target_normal_pct * 100.0 },
        if strict { "strict" } else { "normal" },
        tri.target_constrained_pct * 100.0,
        tri.floor_pct_low_supply * 100.0,
        primary.target_pct * 100.0,
        primary.constrained_pct * 100.0,
        primary.low_supply_pct * 100.0,
    )
}

/// Whether `metrics`'s card count falls short of the minimum-card floor for
/// the gate decision's supply tier. A dedicated check rather than a gate
/// failure, since the floor is a backfill trigger only (see
/// [`research_config::TriangulationConfig::min_cards`]).
fn below_min_cards_floor(gate_decision: &research_pipeline::gate::GateDecision, metrics: &research_core::RunMetrics, quality: &research_config::QualityConfig) -> bool {
    research_pipeline::backfill::below_min_cards_floor(metrics.total_cards, quality.triangulation.min_cards(&gate_decision.supply))
}

/// Whether another backfill round is warranted: either the gate rejected
/// the run outright, or it accepted but the card count is still under the
/// minimum-card floor for its supply tier.
fn needs_backfill(gate_decision: &research_pipeline::gate::GateDecision, metrics: &research_core::RunMetrics, quality: &research_config::QualityConfig) -> bool {
    !gate_decision.accepted || below_min_cards_floor(gate_decision, metrics, quality)
}

/// Returns `count / total`, or `0.0` when `total` is zero.
#[allow(clippy::cast_precision_loss, reason = "outcome counts per run are small and fit f64 precision")]
fn ratio_usize(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// Seconds elapsed since `started_at_unix_millis`.
#[allow(clippy::cast_precision_loss, reason = "run elapsed milliseconds fit f64 precision for any realistic run duration")]
fn elapsed_seconds_since(started_at_unix_millis: i64) -> f64 {
    let elapsed_millis = (research_core::now_unix_millis() - started_at_unix_millis).max(0);
    elapsed_millis as f64 / 1000.0
}

/// Time remaining before `deadline_unix_millis`, clamped to zero.
#[allow(clippy::cast_sign_loss, reason = "remaining millis is clamped to non-negative before the cast")]
fn remaining_duration(deadline_unix_millis: i64, now_unix_millis: i64) -> Duration {
    let remaining = (deadline_unix_millis - now_unix_millis).max(0);
    Duration::from_millis(remaining as u64)
}

/// Fraction of the run's wall-clock budget consumed as of `now_unix_millis`,
/// clamped to `[0.0, 1.0]`. Computed independently of
/// [`research_core::RunContext::time_budget_used_pct`] so a `WALL_TIMEOUT_SEC`
/// override can replace the depth-derived budget.
fn time_budget_used_pct(now_unix_millis: i64, started_at_unix_millis: i64, deadline_unix_millis: i64) -> f64 {
    let elapsed = (now_unix_millis - started_at_unix_millis).max(0);
    let budget = deadline_unix_millis - started_at_unix_millis;
    if budget <= 0 {
        1.0
    } else {
        #[allow(clippy::cast_precision_loss, reason = "millisecond counts for run budgets fit f64 precision")]
        let pct = elapsed as f64 / budget as f64;
        pct.clamp(0.0, 1.0)
    }
}

/// Picks the run directory: the most recent existing one matching `slug`
/// when `resume` is set and one exists, else a freshly timestamped one.
fn resolve_run_dir(output_dir: &Path, slug: &str, resume: bool, timestamp: &str) -> std::io::Result<(PathBuf, bool)> {
    if resume {
        if let Some(existing) = find_latest_run_dir(output_dir, slug)? {
            return Ok((existing, true));
        }
    }
    Ok((output_dir.join(format!("{slug}_{timestamp}")), false))
}

/// Finds the lexicographically latest existing directory under
/// `output_dir` whose name starts with `{slug}_`.
fn find_latest_run_dir(output_dir: &Path, slug: &str) -> std::io::Result<Option<PathBuf>> {
    if !output_dir.is_dir() {
        return Ok(None);
    }
    let prefix = format!("{slug}_");
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(output_dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir() && path.file_name().and_then(|name| name.to_str()).is_some_and(|name| name.starts_with(&prefix)))
        .collect();
    candidates.sort();
    Ok(candidates.pop())
}

/// Converts a topic into a filesystem-safe, lowercase, hyphenated slug,
/// truncated to a reasonable directory-name length.
fn slugify(topic: &str) -> String {
    let mut slug = String::with_capacity(topic.len());
    let mut last_was_dash = false;
    for ch in topic.to_ascii_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_was_dash = false;
        } else if !last_was_dash {
            slug.push('-');
            last_was_dash = true;
        }
    }
    let trimmed = slug.trim_matches('-');
    let truncated: String = trimmed.chars().take(60).collect();
    if truncated.is_empty() { "topic".to_string() } else { truncated }
}

/// Formats `now` as `YYYYmmdd_HHMMSS`, for the run-directory name.
fn run_timestamp(now: time::OffsetDateTime) -> String {
    format!(
        "{:04}{:02}{:02}_{:02}{:02}{:02}",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

/// Writes one line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes one line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Writes `message` to stderr and returns the generic failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::from(1)
}
