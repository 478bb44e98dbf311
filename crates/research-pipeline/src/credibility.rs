// crates/research-pipeline/src/credibility.rs
// ============================================================================
// Module: Credibility Scoring
// Description: Domain-tier credibility scoring, primary-source detection,
//              and the singleton credibility floor.
// Purpose: Give every evidence record a credibility score and
//          is_primary_source flag before triangulation and domain balancing
//          run.
// Dependencies: research_config::CredibilityConfig, research_core::Evidence
// ============================================================================

//! ## Overview
//! A record earns primary-source status by exact domain match against a
//! curated list of statistical, regulatory, and academic-preprint
//! publishers, or by TLD pattern (`.gov` outside a short partisan-term
//! exclusion list, `.edu`, or an EU institutional pattern). A whitelisted
//! singleton (an uncorroborated record from a recognized statistical
//! agency) can still satisfy the credibility floor, but at a downweighted
//! score, since corroboration is still preferable when available.

use research_config::CredibilityConfig;
use research_core::Evidence;

/// Domains treated as primary/official regardless of triangulation.
const PRIMARY_OK_DOMAINS: &[&str] = &[
    "treasury.gov",
    "irs.gov",
    "bls.gov",
    "bea.gov",
    "census.gov",
    "cbo.gov",
    "gao.gov",
    "federalreserve.gov",
    "oecd.org",
    "imf.org",
    "worldbank.org",
    "un.org",
    "europa.eu",
    "ecb.europa.eu",
    "eurostat.ec.europa.eu",
    "bis.org",
    "statcan.gc.ca",
    "ons.gov.uk",
    "destatis.de",
    "insee.fr",
    "nber.org",
    "ssrn.com",
    "arxiv.org",
];

/// Substrings in a `.gov` domain that indicate a partisan or advocacy page
/// rather than an official statistical/regulatory one, and so should not be
/// treated as automatically primary.
const GOV_PARTISAN_EXCLUSIONS: &[&str] = &["campaign", "senate.gov/press", "house.gov/press"];

/// Returns true when `domain` (or a URL containing it) should be treated as
/// a primary/official source.
#[must_use]
pub fn is_primary_like(domain: &str, full_url: &str) -> bool {
    let lowered = domain.to_ascii_lowercase();
    if PRIMARY_OK_DOMAINS.iter().any(|d| &lowered == d || lowered.ends_with(&format!(".{d}"))) {
        return true;
    }
    if lowered.ends_with(".edu") {
        return true;
    }
    if lowered.ends_with(".gov") {
        let lowered_url = full_url.to_ascii_lowercase();
        return !GOV_PARTISAN_EXCLUSIONS.iter().any(|ex| lowered_url.contains(ex));
    }
    false
}

/// Base credibility score awarded by domain tier, before any downweighting.
#[must_use]
fn base_score(domain: &str, full_url: &str, config: &CredibilityConfig) -> f64 {
    if is_primary_like(domain, full_url) || config.trusted_domains.contains(domain) {
        0.95
    } else if domain.ends_with(".org") {
        0.65
    } else {
        0.50
    }
}

/// Sets `evidence.is_primary_source` and `evidence.credibility_score` based
/// on its domain, applying the whitelisted-singleton downweight when
/// `is_singleton` is true. An operator-trusted domain (see
/// [`CredibilityConfig::trusted_domains`]) is treated as primary alongside
/// the builtin list.
pub fn score(evidence: &mut Evidence, config: &CredibilityConfig, is_singleton: bool) {
    evidence.is_primary_source =
        is_primary_like(&evidence.source_domain, &evidence.url) || config.trusted_domains.contains(&evidence.source_domain);
    let mut score = base_score(&evidence.source_domain, &evidence.url, config);
    if is_singleton && config.whitelist_singletons.iter().any(|d| d == &evidence.source_domain) {
        score *= config.singleton_downweight;
    } else if is_singleton {
        score *= 0.5;
    }
    evidence.credibility_score = score.clamp(0.0, 1.0);
}

/// Returns true when a singleton (uncorroborated) record from `domain`
/// still satisfies the credibility floor.
#[must_use]
pub fn singleton_passes_floor(domain: &str, config: &CredibilityConfig) -> bool {
    config.whitelist_singletons.iter().any(|d| d == domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CredibilityConfig {
        CredibilityConfig {
            whitelist_singletons: vec!["worldbank.org".to_string()],
            singleton_downweight: 0.85,
            trusted_domains: std::collections::BTreeSet::new(),
        }
    }

    #[test]
    fn gov_domain_is_primary_outside_exclusions() {
        assert!(is_primary_like("bls.gov", "https://bls.gov/report"));
    }

    #[test]
    fn partisan_gov_path_is_excluded() {
        assert!(!is_primary_like("senate.gov", "https://senate.gov/press/release"));
    }

    #[test]
    fn whitelisted_singleton_passes_floor() {
        let cfg = config();
        assert!(singleton_passes_floor("worldbank.org", &cfg));
        assert!(!singleton_passes_floor("randomblog.com", &cfg));
    }

    #[test]
    fn singleton_downweight_reduces_score() {
        let cfg = config();
        let mut evidence = sample_evidence();
        evidence.source_domain = "worldbank.org".to_string();
        evidence.url = "https://worldbank.org/data".to_string();
        score(&mut evidence, &cfg, true);
        assert!(evidence.credibility_score < 0.95);
        assert!(evidence.is_primary_source);
    }

    #[test]
    fn trusted_domain_is_scored_as_primary() {
        let mut cfg = config();
        cfg.trusted_domains.insert("internal-portal.example.com".to_string());
        let mut evidence = sample_evidence();
        evidence.source_domain = "internal-portal.example.com".to_string();
        evidence.url = "https://internal-portal.example.com/report".to_string();
        score(&mut evidence, &cfg, false);
        assert!(evidence.is_primary_source);
        assert!((evidence.credibility_score - 0.95).abs() < f64::EPSILON);
    }

    fn sample_evidence() -> Evidence {
        Evidence {
            id: "e1".to_string(),
            canonical_id: research_core::CanonicalId::UrlFingerprint("x".to_string()),
            provider: research_core::ProviderTag::WebSearch,
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
            stance: research_core::Stance::Neutral,
            disputed_by: std::collections::BTreeSet::new(),
            claim: None,
            supporting_text: None,
            subtopic_name: None,
        }
    }
}
