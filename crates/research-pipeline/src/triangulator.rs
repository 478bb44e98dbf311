// crates/research-pipeline/src/triangulator.rs
// ============================================================================
// Module: Triangulator
// Description: Groups evidence into clusters and flags multi-domain
//              corroboration and cross-record contradiction.
// Purpose: Turn a flat evidence list into the clusters the domain balancer,
//          credibility floor, and gate evaluator all reason about.
// Dependencies: research_core::{Evidence, Cluster, SimilarityOracle, Stance}
// ============================================================================

//! ## Overview
//! Records with a claim-key (set by the structured-claim extractor) cluster
//! by exact key match. Everything else is clustered by agglomerative
//! single-linkage over the best-available text (`best_quote` if present,
//! else `claim`, else `snippet`, else `title`): pairwise similarity comes
//! from the configured [`SimilarityOracle`], boosted when both records
//! share a numeric or year token, and two records merge transitively
//! whenever any single pairwise link in the chain clears
//! `cluster_similarity_threshold`.
//!
//! Two post-sanitization passes run after clustering:
//!
//! - **Numeric-mismatch split** — a similarity-based cluster whose members
//!   disagree on a year or numeric token (e.g. one cites 2019, another
//!   2021, for what similarity alone would treat as the same claim) is
//!   split by its numeric signature.
//! - **Contradiction drop** — a cluster with at least two
//!   [`Stance::Supports`] members and at least two [`Stance::Disputes`]
//!   members is dropped outright rather than merely flagged, since a
//!   two-against-two (or larger) split gives no trustworthy majority
//!   reading. Smaller contradictions (one side has only one member) are
//!   kept but marked `needs_review`.
//!
//! Every surviving cluster picks a representative member: primary source
//! wins first, then higher credibility, then more recent publication date,
//! then longer best-available text.

use research_core::Cluster;
use research_core::Evidence;
use research_core::SimilarityOracle;
use research_core::Stance;

/// Default paraphrase-cluster similarity threshold; lowerable to `0.30` for
/// topics with thin, sparsely-worded coverage.
pub const DEFAULT_CLUSTER_SIMILARITY_THRESHOLD: f64 = 0.40;

/// Similarity boost applied when two records share at least one numeric or
/// year token, on top of the oracle's raw score.
const NUMERIC_TOKEN_BOOST: f64 = 0.10;

/// Best-available text for a record: extracted quote, then claim, then
/// snippet, then title.
fn best_available_text(record: &Evidence) -> &str {
    record
        .best_quote
        .as_deref()
        .filter(|s| !s.is_empty())
        .or_else(|| record.claim.as_deref().filter(|s| !s.is_empty()))
        .or_else(|| Some(record.snippet.as_str()).filter(|s| !s.is_empty()))
        .unwrap_or(&record.title)
}

/// Extracts numeric/year tokens (runs of digits, 2+ characters) from `text`.
fn numeric_tokens(text: &str) -> std::collections::BTreeSet<String> {
    let mut tokens = std::collections::BTreeSet::new();
    let mut current = String::new();
    for c in text.chars() {
        if c.is_ascii_digit() {
            current.push(c);
        } else if !current.is_empty() {
            if current.len() >= 2 {
                tokens.insert(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        }
    }
    if current.len() >= 2 {
        tokens.insert(current);
    }
    tokens
}

/// Disjoint-set union-find, used to build single-linkage clusters from
/// pairwise similarity links.
struct UnionFind {
    parent: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self { parent: (0..n).collect() }
    }

    fn find(&mut self, x: usize) -> usize {
        if self.parent[x] != x {
            self.parent[x] = self.find(self.parent[x]);
        }
        self.parent[x]
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            self.parent[ra] = rb;
        }
    }
}

/// Clusters `records` and returns both the mutated records (cluster
/// assignment, triangulation flag, disputed-by set) and the cluster list.
///
/// # Invariants
/// - Every input record ends up in exactly one output cluster, unless its
///   cluster was dropped entirely by the contradiction-drop pass, in which
///   case it is left unclustered (`cluster_id = None`).
#[must_use]
pub fn triangulate(mut records: Vec<Evidence>, similarity: &dyn SimilarityOracle, cluster_similarity_threshold: f64) -> (Vec<Evidence>, Vec<Cluster>) {
    let n = records.len();
    let mut assignment: Vec<Option<usize>> = vec![None; n];

    // Claim-keyed records cluster by exact key, bypassing similarity.
    let mut claim_cluster_of: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    let mut clusters: Vec<Cluster> = Vec::new();
    for (i, record) in records.iter().enumerate() {
        if let Some(key) = &record.claim {
            let idx = *claim_cluster_of.entry(key.clone()).or_insert_with(|| {
                let id = u64::try_from(clusters.len()).unwrap_or(u64::MAX);
                clusters.push(Cluster::new(id, Some(key.clone())));
                clusters.len() - 1
            });
            assignment[i] = Some(idx);
        }
    }

    // Remaining (unclaimed) records cluster by single-linkage similarity.
    let unclaimed: Vec<usize> = (0..n).filter(|&i| assignment[i].is_none()).collect();
    if !unclaimed.is_empty() {
        let texts: Vec<String> = unclaimed.iter().map(|&i| best_available_text(&records[i]).to_string()).collect();
        let vectors = similarity.encode(&texts);
        let numeric: Vec<std::collections::BTreeSet<String>> = texts.iter().map(|t| numeric_tokens(t)).collect();

        let mut uf = UnionFind::new(unclaimed.len());
        for a in 0..unclaimed.len() {
            for b in (a + 1)..unclaimed.len() {
                let mut score = research_core::cosine(&vectors[a], &vectors[b]);
                if !numeric[a].is_disjoint(&numeric[b]) && !numeric[a].is_empty() {
                    score = (score + NUMERIC_TOKEN_BOOST).min(1.0);
                }
                if score >= cluster_similarity_threshold {
                    uf.union(a, b);
                }
            }
        }

        let mut root_to_cluster: std::collections::HashMap<usize, usize> = std::collections::HashMap::new();
        for (local_idx, &record_idx) in unclaimed.iter().enumerate() {
            let root = uf.find(local_idx);
            let cluster_idx = *root_to_cluster.entry(root).or_insert_with(|| {
                let id = u64::try_from(clusters.len()).unwrap_or(u64::MAX);
                clusters.push(Cluster::new(id, None));
                clusters.len() - 1
            });
            assignment[record_idx] = Some(cluster_idx);
        }
    }

    for (i, record) in records.iter().enumerate() {
        if let Some(idx) = assignment[i] {
            clusters[idx].add_member(record.id.clone(), record.source_domain.clone());
        }
    }

    let mut assignment: Vec<usize> = assignment.into_iter().map(|a| a.unwrap_or(usize::MAX)).collect();
    split_numeric_mismatches(&records, &mut assignment, &mut clusters);
    mark_stance_contradictions(&mut records, &assignment, &mut clusters);
    let mut clusters = drop_contradicted_clusters(&mut records, &mut assignment, clusters);
    choose_representatives(&records, &assignment, &mut clusters);
    apply_assignments(&mut records, &assignment, &clusters);

    (records, clusters)
}

/// Splits similarity-based clusters whose members disagree on a numeric or
/// year token into one cluster per distinct numeric signature. Claim-keyed
/// clusters (which already agreed at extraction time) are left alone.
fn split_numeric_mismatches(records: &[Evidence], assignment: &mut [usize], clusters: &mut Vec<Cluster>) {
    let mut by_cluster: std::collections::BTreeMap<usize, Vec<usize>> = std::collections::BTreeMap::new();
    for (i, &cluster_idx) in assignment.iter().enumerate() {
        by_cluster.entry(cluster_idx).or_default().push(i);
    }

    for (cluster_idx, member_indices) in by_cluster {
        if clusters[cluster_idx].claim_key.is_some() {
            continue;
        }
        let mut signature_groups: std::collections::BTreeMap<Vec<String>, Vec<usize>> = std::collections::BTreeMap::new();
        for &i in &member_indices {
            let tokens = numeric_tokens(best_available_text(&records[i]));
            signature_groups.entry(tokens.into_iter().collect()).or_default().push(i);
        }
        if signature_groups.len() <= 1 {
            continue;
        }
        // Keep the largest group under the original cluster id; split the rest off.
        let mut groups: Vec<(Vec<String>, Vec<usize>)> = signature_groups.into_iter().collect();
        groups.sort_by_key(|(_, members)| std::cmp::Reverse(members.len()));
        for (_, members) in groups.into_iter().skip(1) {
            let id = u64::try_from(clusters.len()).unwrap_or(u64::MAX);
            clusters.push(Cluster::new(id, None));
            let new_idx = clusters.len() - 1;
            for i in members {
                assignment[i] = new_idx;
            }
        }
    }
}

/// Within each cluster, cross-references supporting and disputing members
/// so every disputed record's `disputed_by` set names its opponents, and
/// flags the owning [`Cluster`] as contradicted.
fn mark_stance_contradictions(records: &mut [Evidence], assignment: &[usize], clusters: &mut [Cluster]) {
    let mut by_cluster: std::collections::BTreeMap<usize, Vec<usize>> = std::collections::BTreeMap::new();
    for (i, &cluster_idx) in assignment.iter().enumerate() {
        by_cluster.entry(cluster_idx).or_default().push(i);
    }

    for (cluster_idx, member_indices) in by_cluster {
        let supports: Vec<usize> = member_indices.iter().copied().filter(|&i| records[i].stance == Stance::Supports).collect();
        let disputes: Vec<usize> = member_indices.iter().copied().filter(|&i| records[i].stance == Stance::Disputes).collect();
        if supports.is_empty() || disputes.is_empty() {
            continue;
        }
        clusters[cluster_idx].is_contradicted = true;
        let dispute_ids: Vec<String> = disputes.iter().map(|&i| records[i].id.clone()).collect();
        let support_ids: Vec<String> = supports.iter().map(|&i| records[i].id.clone()).collect();
        for &i in &supports {
            records[i].disputed_by.extend(dispute_ids.clone());
            records[i].controversy_score = 1.0;
        }
        for &i in &disputes {
            records[i].disputed_by.extend(support_ids.clone());
            records[i].controversy_score = 1.0;
        }
    }
}

/// Rebuilds the cluster list, physically dropping any cluster with at
/// least two supporting and two disputing members (an even, directional
/// contradiction with no trustworthy majority) and leaving their members
/// unclustered; smaller contradictions survive, flagged `needs_review`.
fn drop_contradicted_clusters(records: &mut [Evidence], assignment: &mut [usize], clusters: Vec<Cluster>) -> Vec<Cluster> {
    let mut by_cluster: std::collections::BTreeMap<usize, Vec<usize>> = std::collections::BTreeMap::new();
    for (i, &cluster_idx) in assignment.iter().enumerate() {
        by_cluster.entry(cluster_idx).or_default().push(i);
    }

    let mut dropped: std::collections::HashSet<usize> = std::collections::HashSet::new();
    for (&cluster_idx, member_indices) in &by_cluster {
        if !clusters[cluster_idx].is_contradicted {
            continue;
        }
        let supports = member_indices.iter().filter(|&&i| records[i].stance == Stance::Supports).count();
        let disputes = member_indices.iter().filter(|&&i| records[i].stance == Stance::Disputes).count();
        if supports >= 2 && disputes >= 2 {
            dropped.insert(cluster_idx);
        }
    }

    for &i in by_cluster.values().flatten() {
        if dropped.contains(&assignment[i]) {
            assignment[i] = usize::MAX;
        }
    }

    let mut remapped: Vec<Cluster> = Vec::with_capacity(clusters.len() - dropped.len());
    let mut old_to_new: std::collections::HashMap<usize, usize> = std::collections::HashMap::new();
    for (old_idx, mut cluster) in clusters.into_iter().enumerate() {
        if dropped.contains(&old_idx) {
            continue;
        }
        if cluster.is_contradicted {
            cluster.needs_review = true;
        }
        old_to_new.insert(old_idx, remapped.len());
        remapped.push(cluster);
    }

    for slot in assignment.iter_mut() {
        if *slot != usize::MAX {
            *slot = old_to_new[slot];
        }
    }

    remapped
}

/// Selects each surviving cluster's representative member: primary source
/// first, then higher credibility, then more recent publication date, then
/// longer best-available text.
fn choose_representatives(records: &[Evidence], assignment: &[usize], clusters: &mut [Cluster]) {
    let mut by_cluster: std::collections::BTreeMap<usize, Vec<usize>> = std::collections::BTreeMap::new();
    for (i, &cluster_idx) in assignment.iter().enumerate() {
        if cluster_idx != usize::MAX {
            by_cluster.entry(cluster_idx).or_default().push(i);
        }
    }

    for (cluster_idx, member_indices) in by_cluster {
        let best = member_indices.into_iter().max_by(|&a, &b| {
            let ra = &records[a];
            let rb = &records[b];
            ra.is_primary_source
                .cmp(&rb.is_primary_source)
                .then(ra.credibility_score.total_cmp(&rb.credibility_score))
                .then(ra.publication_date.cmp(&rb.publication_date))
                .then(best_available_text(ra).len().cmp(&best_available_text(rb).len()))
        });
        if let Some(best) = best {
            clusters[cluster_idx].representative_evidence_id = Some(records[best].id.clone());
            clusters[cluster_idx].representative_text = Some(best_available_text(&records[best]).to_string());
        }
    }
}

/// Writes cluster assignment and triangulation flag back onto each record;
/// records whose cluster was dropped are left unclustered.
fn apply_assignments(records: &mut [Evidence], assignment: &[usize], clusters: &[Cluster]) {
    for (record, &cluster_idx) in records.iter_mut().zip(assignment) {
        if cluster_idx == usize::MAX {
            record.cluster_id = None;
            record.is_triangulated = false;
            continue;
        }
        let cluster = &clusters[cluster_idx];
        record.cluster_id = Some(cluster.id);
        record.is_triangulated = cluster.is_triangulated;
    }
}
