// crates/research-pipeline/src/domain_balance.rs
// ============================================================================
// Module: Domain Balancer
// Description: Caps how much of the retained evidence set a single domain
//              (or domain family) can occupy, preferring primary-pool
//              domains and better-corroborated records when trimming.
// Purpose: Stop one prolific source (or a provider's own bias toward a
//          handful of sites, or a handful of sibling subdomains) from
//          crowding out corroboration.
// Dependencies: research_config::DomainBalanceConfig, research_core::Evidence
// ============================================================================

//! ## Overview
//! The cap is a fraction of the total retained set, with a floor of one
//! record per domain. Records are grouped first: sibling domains that
//! belong to the same organization (e.g. `eurostat.ec.europa.eu` and
//! `ec.europa.eu`, or any `.gov` subdomain) fold into one family via
//! [`Evidence::family`], set by the normalizer from [`family_for_domain`],
//! so they cannot evade the cap by spreading across subdomains. Within each
//! domain/family, records are sorted by `(is_triangulated DESC,
//! credibility * relevance DESC)` before truncating to the cap, so the
//! best-corroborated, highest-quality records in an over-represented group
//! survive the cut; everything past the cap is dropped. Original relative
//! order is preserved among survivors.

use std::collections::BTreeMap;

use research_config::DomainBalanceConfig;
use research_core::Evidence;

/// Internationally recognized statistical/regulatory domains exempted from
/// aggressive capping, since a legitimate research answer often leans on
/// them more heavily than any blog or news outlet.
pub const PRIMARY_POOL: &[&str] = &[
    "worldbank.org",
    "oecd.org",
    "imf.org",
    "data.europa.eu",
    "ec.europa.eu",
    "eurostat.ec.europa.eu",
    "bis.org",
    "unctad.org",
    "wto.org",
    "ecb.europa.eu",
    "who.int",
    "un.org",
];

/// Explicit domain -> family table for organizations with more than one
/// publishing subdomain. Entries match the domain itself or any subdomain
/// of it (`eurostat.ec.europa.eu` matches the `ec.europa.eu` entry).
const DOMAIN_FAMILIES: &[(&str, &str)] = &[
    ("ec.europa.eu", "eu-official"),
    ("europa.eu", "eu-official"),
    ("worldbank.org", "worldbank"),
    ("imf.org", "imf"),
    ("oecd.org", "oecd"),
    ("who.int", "who"),
    ("un.org", "un"),
    ("wto.org", "wto"),
];

/// Returns the domain family `domain` belongs to, if any. Every `.gov`
/// (or `.gov.<cc>`) host folds into a single `"gov"` family so sibling
/// agency subdomains count together.
#[must_use]
pub fn family_for_domain(domain: &str) -> Option<String> {
    for (root, family) in DOMAIN_FAMILIES {
        if domain == *root || domain.ends_with(&format!(".{root}")) {
            return Some((*family).to_string());
        }
    }
    if domain.ends_with(".gov") || domain.contains(".gov.") {
        return Some("gov".to_string());
    }
    None
}

/// The cap-accounting key for a record: its family if it has one, else its
/// bare domain.
fn group_key(record: &Evidence) -> &str {
    record.family.as_deref().unwrap_or(&record.source_domain)
}

/// Applies the per-domain (or per-family) cap to `records`, returning the
/// retained subset in original relative order.
///
/// # Invariants
/// - Every domain/family keeps at least one record, even under the cap.
/// - Primary-pool domains are capped at double the computed limit, since
///   they are the set a complete answer is expected to lean on.
/// - Within an over-represented group, the records kept are the ones
///   sorted highest by `(is_triangulated DESC, credibility * relevance
///   DESC)`, not simply the first ones encountered.
#[must_use]
pub fn enforce_cap(records: Vec<Evidence>, config: &DomainBalanceConfig) -> Vec<Evidence> {
    if records.is_empty() {
        return records;
    }
    let cap = config.get_cap(count_unique_domains(&records));
    #[allow(clippy::cast_precision_loss, reason = "record counts in a single run are small and fit f64 precision")]
    let total = records.len() as f64;
    #[allow(
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation,
        reason = "cap * total is always non-negative and bounded by total"
    )]
    let cap_abs = ((cap * total) as usize).max(1);

    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, record) in records.iter().enumerate() {
        groups.entry(group_key(record).to_string()).or_default().push(i);
    }

    let mut kept_indices: std::collections::BTreeSet<usize> = std::collections::BTreeSet::new();
    for (key, mut indices) in groups {
        let is_primary_pool = PRIMARY_POOL.contains(&key.as_str()) || indices.iter().any(|&i| PRIMARY_POOL.contains(&records[i].source_domain.as_str()));
        let limit = if is_primary_pool { cap_abs * 2 } else { cap_abs };
        indices.sort_by(|&a, &b| {
            let ra = &records[a];
            let rb = &records[b];
            rb.is_triangulated
                .cmp(&ra.is_triangulated)
                .then((rb.credibility_score * rb.relevance_score).total_cmp(&(ra.credibility_score * ra.relevance_score)))
        });
        kept_indices.extend(indices.into_iter().take(limit.max(1)));
    }

    records.into_iter().enumerate().filter(|(i, _)| kept_indices.contains(i)).map(|(_, r)| r).collect()
}

/// Counts distinct source domains among `records`.
#[must_use]
pub fn count_unique_domains(records: &[Evidence]) -> usize {
    records.iter().map(|r| r.source_domain.as_str()).collect::<std::collections::BTreeSet<_>>().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use research_core::CanonicalId;
    use research_core::ProviderTag;
    use research_core::Stance;

    fn record(id: &str, domain: &str) -> Evidence {
        Evidence {
            id: id.to_string(),
            canonical_id: CanonicalId::UrlFingerprint(id.to_string()),
            provider: ProviderTag::WebSearch,
            url: format!("https://{domain}/{id}"),
            canonical_url: format!("https://{domain}/{id}"),
            source_domain: domain.to_string(),
            title: id.to_string(),
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
            family: family_for_domain(domain),
            controversy_score: 0.0,
            stance: Stance::Neutral,
            disputed_by: std::collections::BTreeSet::new(),
            claim: None,
            supporting_text: None,
            subtopic_name: None,
        }
    }

    fn config() -> DomainBalanceConfig {
        DomainBalanceConfig { cap_default: 0.25, cap_when_few_domains: 0.40, few_domains_threshold: 6 }
    }

    #[test]
    fn caps_a_single_dominant_domain() {
        let mut records: Vec<Evidence> = (0..20).map(|i| record(&format!("a{i}"), "spammy.com")).collect();
        records.push(record("other1", "other.com"));
        let result = enforce_cap(records, &config());
        let spammy_count = result.iter().filter(|r| r.source_domain == "spammy.com").count();
        assert!(spammy_count < 20);
        assert!(result.iter().any(|r| r.source_domain == "other.com"));
    }

    #[test]
    fn primary_pool_domain_gets_a_higher_cap() {
        let records: Vec<Evidence> = (0..10).map(|i| record(&format!("w{i}"), "worldbank.org")).collect();
        let result = enforce_cap(records, &config());
        assert!(result.len() > (0.25 * 10.0) as usize);
    }

    #[test]
    fn every_domain_keeps_at_least_one_record() {
        let records = vec![record("a", "rare.com")];
        let result = enforce_cap(records, &config());
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn sibling_gov_subdomains_are_capped_together() {
        let mut records: Vec<Evidence> = Vec::new();
        for i in 0..10 {
            records.push(record(&format!("a{i}"), "agency-a.gov"));
        }
        for i in 0..10 {
            records.push(record(&format!("b{i}"), "agency-b.gov"));
        }
        let result = enforce_cap(records, &config());
        assert!(result.len() < 20, "gov subdomains should be capped as one family, got {}", result.len());
    }

    #[test]
    fn within_group_keeps_triangulated_records_over_uncapped_ones() {
        let mut low = record("low", "spammy.com");
        low.is_triangulated = false;
        low.credibility_score = 0.9;
        let mut high = record("high", "spammy.com");
        high.is_triangulated = true;
        high.credibility_score = 0.1;
        let mut config = config();
        config.cap_default = 0.01;
        config.cap_when_few_domains = 0.01;
        let result = enforce_cap(vec![low, high], &config);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, "high");
    }
}
