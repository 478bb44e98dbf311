// crates/research-config/src/quality_config.rs
// ============================================================================
// Module: Quality Thresholds
// Description: The triangulation/primary-share/domain-balance/backfill/
//              credibility threshold tables the gate evaluator consults.
// Purpose: Give every quality-sensitive stage one validated source of truth
//          instead of scattered magic numbers.
// Dependencies: crate::env, crate::error, research_core::SupplyContext
// ============================================================================

//! ## Overview
//! Every triangulation and primary-share target is three-tiered, keyed by
//! [`research_core::SupplyTier`]: a run classified `Normal` is graded
//! against the strict/normal target, `Constrained` against a relaxed
//! middle target, and `LowEvidence` against the relaxed floor. Defaults
//! mirror a conservative, previously tuned threshold set; every field is
//! overridable via environment variable for operators running against
//! smaller or noisier corpora.

use std::collections::BTreeSet;

use research_core::SupplyContext;
use research_core::SupplyTier;

use crate::env::read_bool;
use crate::env::read_csv_set;
use crate::env::read_f64;
use crate::env::read_u64;
use crate::error::ConfigError;

/// Triangulation-rate thresholds the gate evaluator checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangulationConfig {
    /// Target triangulated-fraction under strict mode, for [`SupplyTier::Normal`].
    pub target_strict_pct: f64,
    /// Target triangulated-fraction under normal mode, for [`SupplyTier::Normal`].
    pub target_normal_pct: f64,
    /// Target triangulated-fraction for [`SupplyTier::Constrained`].
    pub target_constrained_pct: f64,
    /// Relaxed floor applied for [`SupplyTier::LowEvidence`].
    pub floor_pct_low_supply: f64,
    /// Minimum absolute card count required under [`SupplyTier::Normal`].
    pub min_cards_abs: usize,
    /// Minimum absolute card count required under [`SupplyTier::Constrained`].
    pub min_cards_abs_constrained: usize,
    /// Minimum absolute card count required under [`SupplyTier::LowEvidence`].
    pub min_cards_abs_low_supply: usize,
    /// Minimum credible-card count required.
    pub min_credible_cards: usize,
    /// Provider error rate threshold recorded for reference; the tier
    /// boundaries in [`research_core::SupplyContext::tier`] are fixed, not
    /// configurable, but this value is still surfaced to operators who want
    /// to see what triggered a `LowEvidence` classification.
    pub provider_error_rate: f64,
}

impl TriangulationConfig {
    /// Loads triangulation thresholds from environment overrides, falling
    /// back to the tuned defaults.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if any override fails to parse or falls
    /// outside its valid range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            target_strict_pct: read_f64("RA_TRIANGULATION_TARGET_STRICT_PCT", 0.35)?,
            target_normal_pct: read_f64("RA_TRIANGULATION_TARGET_NORMAL_PCT", 0.30)?,
            target_constrained_pct: read_f64("RA_TRIANGULATION_TARGET_CONSTRAINED_PCT", 0.27)?,
            floor_pct_low_supply: read_f64("RA_TRIANGULATION_FLOOR_PCT_LOW_SUPPLY", 0.25)?,
            #[allow(
                clippy::cast_possible_truncation,
                reason = "card-count thresholds are small positive integers"
            )]
            min_cards_abs: read_u64("RA_TRIANGULATION_MIN_CARDS_ABS", 10)? as usize,
            #[allow(
                clippy::cast_possible_truncation,
                reason = "card-count thresholds are small positive integers"
            )]
            min_cards_abs_constrained: read_u64("RA_TRIANGULATION_MIN_CARDS_ABS_CONSTRAINED", 9)? as usize,
            #[allow(
                clippy::cast_possible_truncation,
                reason = "card-count thresholds are small positive integers"
            )]
            min_cards_abs_low_supply: read_u64("RA_TRIANGULATION_MIN_CARDS_ABS_LOW_SUPPLY", 8)? as usize,
            #[allow(
                clippy::cast_possible_truncation,
                reason = "card-count thresholds are small positive integers"
            )]
            min_credible_cards: read_u64("RA_TRIANGULATION_MIN_CREDIBLE_CARDS", 25)? as usize,
            provider_error_rate: read_f64("RA_TRIANGULATION_PROVIDER_ERROR_RATE", 0.30)?,
        })
    }

    /// Returns the triangulation-fraction threshold to apply, given `strict`
    /// mode and the run's current [`SupplyContext`]. The floor used for
    /// backfill triggering (see [`Self::min_cards`]) plays no part in this
    /// decision; triangulation rate and card count are independent checks.
    #[must_use]
    pub fn get_threshold(&self, strict: bool, supply: &SupplyContext) -> f64 {
        match supply.tier() {
            SupplyTier::Normal if strict => self.target_strict_pct,
            SupplyTier::Normal => self.target_normal_pct,
            SupplyTier::Constrained => self.target_constrained_pct,
            SupplyTier::LowEvidence => self.floor_pct_low_supply,
        }
    }

    /// Returns the minimum absolute card count expected for `supply`'s tier.
    ///
    /// This is a **backfill trigger**, not a gate check: a run short of this
    /// floor should attempt another collection round, but a run that stays
    /// short after backfill is exhausted is graded on triangulation rate,
    /// credible-card count, and primary share alone, never on this number
    /// directly.
    #[must_use]
    pub fn min_cards(&self, supply: &SupplyContext) -> usize {
        match supply.tier() {
            SupplyTier::Normal => self.min_cards_abs,
            SupplyTier::Constrained => self.min_cards_abs_constrained,
            SupplyTier::LowEvidence => self.min_cards_abs_low_supply,
        }
    }
}

/// Primary-source share thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimaryShareConfig {
    /// Target primary-source share under [`SupplyTier::Normal`].
    pub target_pct: f64,
    /// Target primary-source share under [`SupplyTier::Constrained`].
    pub constrained_pct: f64,
    /// Relaxed target under [`SupplyTier::LowEvidence`].
    pub low_supply_pct: f64,
    /// Primary-supply fraction above which the relaxed target applies even
    /// under [`SupplyTier::Normal`] (plenty of primary sources were simply
    /// not all retained by domain balancing).
    pub primary_supply_relaxed_threshold: f64,
}

impl PrimaryShareConfig {
    /// Loads primary-share thresholds from environment overrides.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if any override fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            target_pct: read_f64("RA_PRIMARY_SHARE_TARGET_PCT", 0.40)?,
            constrained_pct: read_f64("RA_PRIMARY_SHARE_CONSTRAINED_PCT", 0.35)?,
            low_supply_pct: read_f64("RA_PRIMARY_SHARE_LOW_SUPPLY_PCT", 0.30)?,
            primary_supply_relaxed_threshold: read_f64(
                "RA_PRIMARY_SHARE_RELAXED_THRESHOLD",
                0.50,
            )?,
        })
    }
}

/// Domain-cap thresholds applied during domain balancing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainBalanceConfig {
    /// Default per-domain cap, as a fraction of total retained cards.
    pub cap_default: f64,
    /// Relaxed cap applied when few distinct domains were found.
    pub cap_when_few_domains: f64,
    /// Domain count at or below which the relaxed cap applies.
    pub few_domains_threshold: usize,
}

impl DomainBalanceConfig {
    /// Loads domain-balance thresholds from environment overrides.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if any override fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            cap_default: read_f64("RA_DOMAIN_BALANCE_CAP_DEFAULT", 0.25)?,
            cap_when_few_domains: read_f64("RA_DOMAIN_BALANCE_CAP_FEW_DOMAINS", 0.40)?,
            #[allow(
                clippy::cast_possible_truncation,
                reason = "domain-count thresholds are small positive integers"
            )]
            few_domains_threshold: read_u64("RA_DOMAIN_BALANCE_FEW_DOMAINS_THRESHOLD", 6)? as usize,
        })
    }

    /// Returns the cap to apply for `unique_domains` distinct domains.
    #[must_use]
    pub fn get_cap(&self, unique_domains: usize) -> f64 {
        if unique_domains <= self.few_domains_threshold {
            self.cap_when_few_domains
        } else {
            self.cap_default
        }
    }
}

/// Backfill-controller thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackfillConfig {
    /// Maximum number of backfill rounds per axis.
    pub max_attempts: u32,
    /// Whether a final "last mile" backfill round runs when close to goal.
    pub last_mile_enabled: bool,
    /// Shortfall, as percentage points, within which last-mile backfill
    /// triggers.
    pub last_mile_pp_shortfall: f64,
    /// Minimum remaining time-budget fraction required to attempt last-mile
    /// backfill.
    pub last_mile_min_time_budget: f64,
    /// Master switch for the whole backfill controller; when false, a gate
    /// failure is reported as-is with no retry round attempted.
    pub enabled: bool,
}

impl BackfillConfig {
    /// Loads backfill thresholds from environment overrides.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if any override fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "attempt counts are small positive integers"
            )]
            max_attempts: read_u64("RA_BACKFILL_MAX_ATTEMPTS", 3)? as u32,
            last_mile_enabled: read_bool("RA_BACKFILL_LAST_MILE_ENABLED", true)?,
            last_mile_pp_shortfall: read_f64("RA_BACKFILL_LAST_MILE_PP_SHORTFALL", 0.05)?,
            last_mile_min_time_budget: read_f64("RA_BACKFILL_LAST_MILE_MIN_TIME_BUDGET", 0.20)?,
            enabled: read_bool("BACKFILL_ON_FAIL", true)?,
        })
    }
}

/// Credibility-floor thresholds and the domain whitelist it relaxes for.
#[derive(Debug, Clone, PartialEq)]
pub struct CredibilityConfig {
    /// Domains allowed to satisfy the credibility floor as a singleton
    /// (no corroboration required) because they are themselves recognized
    /// statistical or regulatory authorities.
    pub whitelist_singletons: Vec<String>,
    /// Credibility multiplier applied to a whitelisted singleton so it does
    /// not fully bypass scoring.
    pub singleton_downweight: f64,
    /// Operator-supplied domains treated as primary-like in addition to the
    /// builtin list, e.g. an internal data portal no generic rule would
    /// recognize.
    pub trusted_domains: BTreeSet<String>,
}

impl CredibilityConfig {
    /// Loads the credibility configuration; the whitelist is fixed (it
    /// names specific statistical agencies and is not meaningfully
    /// operator-tunable) but the downweight factor and trusted-domain list
    /// are overridable.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the downweight override fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            whitelist_singletons: default_whitelist_singletons(),
            singleton_downweight: read_f64("RA_CREDIBILITY_SINGLETON_DOWNWEIGHT", 0.85)?,
            trusted_domains: read_csv_set("TRUSTED_DOMAINS"),
        })
    }
}

/// Statistical and regulatory agencies trusted as singleton sources.
fn default_whitelist_singletons() -> Vec<String> {
    [
        "oecd.org",
        "unwto.org",
        "worldbank.org",
        "imf.org",
        "fred.stlouisfed.org",
        "ecb.europa.eu",
        "trade.gov",
        "ustravel.org",
        "bls.gov",
        "census.gov",
        "federalreserve.gov",
        "stats.govt.nz",
        "statistics.gov.uk",
        "abs.gov.au",
        "statcan.gc.ca",
        "destatis.de",
        "insee.fr",
        "istat.it",
        "stat.go.jp",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// The complete set of quality thresholds consulted by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct QualityConfig {
    /// Triangulation-rate thresholds.
    pub triangulation: TriangulationConfig,
    /// Primary-source share thresholds.
    pub primary_share: PrimaryShareConfig,
    /// Domain-balance cap thresholds.
    pub domain_balance: DomainBalanceConfig,
    /// Backfill controller thresholds.
    pub backfill: BackfillConfig,
    /// Credibility floor configuration.
    pub credibility: CredibilityConfig,
}

impl QualityConfig {
    /// Loads the full quality configuration from environment overrides,
    /// validating every field eagerly.
    ///
    /// # Errors
    /// Returns [`ConfigError`] on the first invalid override encountered.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            triangulation: TriangulationConfig::from_env()?,
            primary_share: PrimaryShareConfig::from_env()?,
            domain_balance: DomainBalanceConfig::from_env()?,
            backfill: BackfillConfig::from_env()?,
            credibility: CredibilityConfig::from_env()?,
        })
    }

    /// Returns a copy with every target threshold relaxed to its low-supply
    /// fallback, for an open-ended discovery run where early-stage coverage
    /// is expected to be thin.
    #[must_use]
    pub fn relaxed_for_discovery(&self) -> Self {
        let mut relaxed = self.clone();
        relaxed.triangulation.target_strict_pct = self.triangulation.floor_pct_low_supply;
        relaxed.triangulation.target_normal_pct = self.triangulation.floor_pct_low_supply;
        relaxed.triangulation.min_cards_abs = self.triangulation.min_cards_abs_low_supply;
        relaxed.primary_share.target_pct = self.primary_share.low_supply_pct;
        relaxed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "tests assert against deterministic fixtures")]
mod tests {
    use super::*;

    fn supply(unique_domains: usize, credible_cards: usize, provider_error_rate: f64) -> SupplyContext {
        SupplyContext { total_cards: 30, unique_domains, credible_cards, provider_error_rate, time_budget_used_pct: 0.5 }
    }

    #[test]
    fn triangulation_threshold_falls_back_under_low_evidence() {
        let cfg = TriangulationConfig::from_env().expect("defaults parse");
        let low_supply = supply(2, 5, 0.1);
        assert!((cfg.get_threshold(true, &low_supply) - cfg.floor_pct_low_supply).abs() < f64::EPSILON);
    }

    #[test]
    fn triangulation_threshold_uses_constrained_target_in_between() {
        let cfg = TriangulationConfig::from_env().expect("defaults parse");
        let constrained = supply(6, 25, 0.1);
        assert!((cfg.get_threshold(true, &constrained) - cfg.target_constrained_pct).abs() < f64::EPSILON);
    }

    #[test]
    fn triangulation_threshold_uses_strict_target_with_ample_supply() {
        let cfg = TriangulationConfig::from_env().expect("defaults parse");
        let ample_supply = supply(12, 40, 0.05);
        assert!((cfg.get_threshold(true, &ample_supply) - cfg.target_strict_pct).abs() < f64::EPSILON);
    }

    #[test]
    fn domain_balance_cap_relaxes_with_few_domains() {
        let cfg = DomainBalanceConfig::from_env().expect("defaults parse");
        assert!((cfg.get_cap(3) - cfg.cap_when_few_domains).abs() < f64::EPSILON);
        assert!((cfg.get_cap(20) - cfg.cap_default).abs() < f64::EPSILON);
    }

    #[test]
    fn credibility_whitelist_contains_known_agencies() {
        let cfg = CredibilityConfig::from_env().expect("defaults parse");
        assert!(cfg.whitelist_singletons.iter().any(|d| d == "worldbank.org"));
    }

    #[test]
    fn relaxed_for_discovery_lowers_triangulation_and_primary_share_targets() {
        let cfg = QualityConfig::from_env().expect("defaults parse");
        let relaxed = cfg.relaxed_for_discovery();
        assert!((relaxed.triangulation.target_strict_pct - cfg.triangulation.floor_pct_low_supply).abs() < f64::EPSILON);
        assert!((relaxed.primary_share.target_pct - cfg.primary_share.low_supply_pct).abs() < f64::EPSILON);
        assert_eq!(relaxed.triangulation.min_cards_abs, cfg.triangulation.min_cards_abs_low_supply);
    }
}
