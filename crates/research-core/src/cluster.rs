// crates/research-core/src/cluster.rs
// ============================================================================
// Module: Evidence Clusters
// Description: A group of evidence records triangulating the same claim.
// Purpose: Carry the triangulator's output forward to domain balancing,
//          credibility floor checks, and report rendering.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`Cluster`] groups evidence records that share a [`crate::claim::StructuredClaim`]
//! canonical key or a paraphrase-similarity bucket found by agglomerative
//! single-linkage clustering. Clusters, not individual records, are what
//! the gate evaluator and domain balancer reason about.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

/// A set of evidence records believed to support (or dispute) the same
/// underlying claim.
///
/// # Invariants
/// - `domains` always has at least one element once a cluster is non-empty.
/// - `is_triangulated` is true only when `domains.len() >= 2`.
/// - A cluster with `is_contradicted` set true and `needs_review` false has
///   already been dropped by the triangulator's post-sanitization pass and
///   must not appear in `triangulation.json`; surviving contradicted
///   clusters always carry `needs_review = true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Stable id assigned at creation time, unique within a run.
    pub id: u64,
    /// Canonical claim key shared by every member, if claim-based.
    pub claim_key: Option<String>,
    /// Ids of member evidence records.
    pub member_ids: BTreeSet<String>,
    /// Distinct source domains contributing to this cluster.
    pub domains: BTreeSet<String>,
    /// True once the cluster spans at least two distinct domains.
    pub is_triangulated: bool,
    /// True when the cluster contains both supporting and disputing members
    /// that survived the contradiction-drop pass (flagged, not removed).
    pub is_contradicted: bool,
    /// True when a human should review this cluster before trusting it —
    /// set for surviving contradicted clusters.
    pub needs_review: bool,
    /// Id of the representative member, chosen by primary-source status,
    /// then credibility, then recency, then best-quote length.
    pub representative_evidence_id: Option<String>,
    /// The representative member's best-available text, cached so report
    /// rendering doesn't need the full evidence list.
    pub representative_text: Option<String>,
}

impl Cluster {
    /// Creates an empty cluster with the given id.
    #[must_use]
    pub fn new(id: u64, claim_key: Option<String>) -> Self {
        Self {
            id,
            claim_key,
            member_ids: BTreeSet::new(),
            domains: BTreeSet::new(),
            is_triangulated: false,
            is_contradicted: false,
            needs_review: false,
            representative_evidence_id: None,
            representative_text: None,
        }
    }

    /// Adds a member and refreshes the triangulation flag.
    pub fn add_member(&mut self, evidence_id: impl Into<String>, domain: impl Into<String>) {
        self.member_ids.insert(evidence_id.into());
        self.domains.insert(domain.into());
        self.is_triangulated = self.domains.len() >= 2;
    }

    /// Number of member evidence records.
    #[must_use]
    pub fn size(&self) -> usize {
        self.member_ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangulation_flips_on_second_domain() {
        let mut cluster = Cluster::new(1, Some("k".to_string()));
        cluster.add_member("e1", "a.com");
        assert!(!cluster.is_triangulated);
        cluster.add_member("e2", "b.com");
        assert!(cluster.is_triangulated);
    }

    #[test]
    fn same_domain_repeated_does_not_triangulate() {
        let mut cluster = Cluster::new(1, None);
        cluster.add_member("e1", "a.com");
        cluster.add_member("e2", "a.com");
        assert!(!cluster.is_triangulated);
        assert_eq!(cluster.size(), 2);
    }

    #[test]
    fn fresh_cluster_does_not_need_review() {
        let cluster = Cluster::new(1, None);
        assert!(!cluster.needs_review);
        assert!(cluster.representative_evidence_id.is_none());
    }
}
