//! Engine configuration.
//!
//! All weights and thresholds live here so that scoring stays deterministic
//! and tenant-configurable: the rule tables read config, never constants
//! scattered through the code. Per-tenant overrides are resolved with
//! `ArbiterConfig::for_tenant`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::domain::PriorityDomain;

/// Base weight per domain. Commerce is structurally lowest; health is
/// structurally highest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BaseWeights {
    /// Weight for health & wellbeing.
    #[serde(default = "default_health_weight")]
    pub health: f64,
    /// Weight for social/relationships.
    #[serde(default = "default_social_weight")]
    pub social: f64,
    /// Weight for learning & growth.
    #[serde(default = "default_learning_weight")]
    pub learning: f64,
    /// Weight for exploration/discovery.
    #[serde(default = "default_exploration_weight")]
    pub exploration: f64,
    /// Weight for commerce/monetization.
    #[serde(default = "default_commerce_weight")]
    pub commerce: f64,
}

const fn default_health_weight() -> f64 {
    100.0
}
const fn default_social_weight() -> f64 {
    70.0
}
const fn default_learning_weight() -> f64 {
    60.0
}
const fn default_exploration_weight() -> f64 {
    50.0
}
const fn default_commerce_weight() -> f64 {
    20.0
}

impl Default for BaseWeights {
    fn default() -> Self {
        Self {
            health: default_health_weight(),
            social: default_social_weight(),
            learning: default_learning_weight(),
            exploration: default_exploration_weight(),
            commerce: default_commerce_weight(),
        }
    }
}

impl BaseWeights {
    /// Weight for a domain.
    pub fn weight(&self, domain: PriorityDomain) -> f64 {
        match domain {
            PriorityDomain::HealthWellbeing => self.health,
            PriorityDomain::SocialRelationships => self.social,
            PriorityDomain::LearningGrowth => self.learning,
            PriorityDomain::ExplorationDiscovery => self.exploration,
            PriorityDomain::CommerceMonetization => self.commerce,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format: json or pretty.
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Optional directory for rotated file output.
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

/// Audit log configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AuditConfig {
    /// Maximum entries retained in memory.
    #[serde(default = "default_audit_max_entries")]
    pub max_entries: usize,
    /// Whether decision rationale is attached to audit entries.
    #[serde(default = "default_true")]
    pub log_rationale: bool,
}

const fn default_audit_max_entries() -> usize {
    10000
}

const fn default_true() -> bool {
    true
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            max_entries: default_audit_max_entries(),
            log_rationale: default_true(),
        }
    }
}

/// Per-tenant overrides. Every field is optional; absent fields fall back
/// to the platform config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TenantOverrides {
    /// Override base weights.
    #[serde(default)]
    pub base_weights: Option<BaseWeights>,
    /// Override the activation threshold.
    #[serde(default)]
    pub activation_threshold: Option<f64>,
    /// Override the conflict emission threshold.
    #[serde(default)]
    pub conflict_resolution_threshold: Option<f64>,
    /// Override the stability switch threshold.
    #[serde(default)]
    pub switch_threshold: Option<f64>,
    /// Override the stability window length.
    #[serde(default)]
    pub stability_window_seconds: Option<u64>,
    /// Override the secondary-domain cap.
    #[serde(default)]
    pub max_secondary_domains: Option<usize>,
    /// Whether monetization is enabled at all for this tenant.
    #[serde(default)]
    pub monetization_enabled: Option<bool>,
}

/// Main configuration for the arbitration engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ArbiterConfig {
    /// Version label of the configuration object, carried into audit
    /// metadata.
    #[serde(default = "default_config_version")]
    pub config_version: String,

    /// Base weight per domain.
    #[serde(default)]
    pub base_weights: BaseWeights,

    /// Minimum final score for a domain to count as active (secondary
    /// eligibility, conflict pair eligibility, override floor).
    #[serde(default = "default_activation_threshold")]
    pub activation_threshold: f64,

    /// Minimum severity for a conflict to be emitted.
    #[serde(default = "default_conflict_resolution_threshold")]
    pub conflict_resolution_threshold: f64,

    /// Score margin a new primary must beat the previous one by to flip
    /// inside the stability window.
    #[serde(default = "default_switch_threshold")]
    pub switch_threshold: f64,

    /// How long a confirmed primary is protected from low-margin flips.
    #[serde(default = "default_stability_window_seconds")]
    pub stability_window_seconds: u64,

    /// Cap on secondary domains per plan.
    #[serde(default = "default_max_secondary_domains")]
    pub max_secondary_domains: usize,

    /// Whether monetization is enabled at all. When false commerce is
    /// suppressed on every turn.
    #[serde(default = "default_true")]
    pub monetization_enabled: bool,

    /// Confidence cap applied to synthesized (inferred) signals. Shared by
    /// all aggregation call sites.
    #[serde(default = "default_inferred_confidence_cap")]
    pub inferred_confidence_cap: f64,

    /// Availability below this triggers the low-availability scale-down.
    #[serde(default = "default_low_availability_threshold")]
    pub low_availability_threshold: f64,

    /// Factor applied to non-health scores under low availability.
    #[serde(default = "default_low_availability_factor")]
    pub low_availability_factor: f64,

    /// Ceiling on the commerce score while vulnerability indicators are
    /// active.
    #[serde(default = "default_vulnerability_commerce_cap")]
    pub vulnerability_commerce_cap: f64,

    /// Activation boost for domains the goals engine marks as focus.
    #[serde(default = "default_goal_focus_boost")]
    pub goal_focus_boost: f64,

    /// Compute budget for one arbitration, in milliseconds. Exceeding it
    /// triggers the fallback chain.
    #[serde(default = "default_compute_budget_ms")]
    pub compute_budget_ms: u64,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Audit log configuration.
    #[serde(default)]
    pub audit: AuditConfig,

    /// Per-tenant overrides, keyed by tenant id.
    #[serde(default)]
    pub tenants: HashMap<String, TenantOverrides>,
}

fn default_config_version() -> String {
    "v1".to_string()
}
const fn default_activation_threshold() -> f64 {
    20.0
}
const fn default_conflict_resolution_threshold() -> f64 {
    30.0
}
const fn default_switch_threshold() -> f64 {
    15.0
}
const fn default_stability_window_seconds() -> u64 {
    60
}
const fn default_max_secondary_domains() -> usize {
    2
}
const fn default_inferred_confidence_cap() -> f64 {
    30.0
}
const fn default_low_availability_threshold() -> f64 {
    30.0
}
const fn default_low_availability_factor() -> f64 {
    0.6
}
const fn default_vulnerability_commerce_cap() -> f64 {
    10.0
}
const fn default_goal_focus_boost() -> f64 {
    10.0
}
const fn default_compute_budget_ms() -> u64 {
    50
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            base_weights: BaseWeights::default(),
            activation_threshold: default_activation_threshold(),
            conflict_resolution_threshold: default_conflict_resolution_threshold(),
            switch_threshold: default_switch_threshold(),
            stability_window_seconds: default_stability_window_seconds(),
            max_secondary_domains: default_max_secondary_domains(),
            monetization_enabled: default_true(),
            inferred_confidence_cap: default_inferred_confidence_cap(),
            low_availability_threshold: default_low_availability_threshold(),
            low_availability_factor: default_low_availability_factor(),
            vulnerability_commerce_cap: default_vulnerability_commerce_cap(),
            goal_focus_boost: default_goal_focus_boost(),
            compute_budget_ms: default_compute_budget_ms(),
            logging: LoggingConfig::default(),
            audit: AuditConfig::default(),
            tenants: HashMap::new(),
        }
    }
}

impl ArbiterConfig {
    /// Resolve the effective configuration for one tenant, applying its
    /// overrides over the platform defaults. Unknown tenants get the
    /// platform config unchanged.
    pub fn for_tenant(&self, tenant: &str) -> Self {
        let mut resolved = self.clone();
        if let Some(overrides) = self.tenants.get(tenant) {
            if let Some(weights) = overrides.base_weights {
                resolved.base_weights = weights;
            }
            if let Some(v) = overrides.activation_threshold {
                resolved.activation_threshold = v;
            }
            if let Some(v) = overrides.conflict_resolution_threshold {
                resolved.conflict_resolution_threshold = v;
            }
            if let Some(v) = overrides.switch_threshold {
                resolved.switch_threshold = v;
            }
            if let Some(v) = overrides.stability_window_seconds {
                resolved.stability_window_seconds = v;
            }
            if let Some(v) = overrides.max_secondary_domains {
                resolved.max_secondary_domains = v;
            }
            if let Some(v) = overrides.monetization_enabled {
                resolved.monetization_enabled = v;
            }
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights_commerce_lowest() {
        let weights = BaseWeights::default();
        assert_eq!(weights.weight(PriorityDomain::HealthWellbeing), 100.0);
        assert_eq!(weights.weight(PriorityDomain::CommerceMonetization), 20.0);
        for domain in PriorityDomain::ALL {
            assert!(weights.weight(domain) >= weights.commerce);
        }
    }

    #[test]
    fn test_default_thresholds() {
        let config = ArbiterConfig::default();
        assert_eq!(config.activation_threshold, 20.0);
        assert_eq!(config.conflict_resolution_threshold, 30.0);
        assert_eq!(config.switch_threshold, 15.0);
        assert_eq!(config.stability_window_seconds, 60);
        assert_eq!(config.max_secondary_domains, 2);
    }

    #[test]
    fn test_for_tenant_applies_overrides() {
        let mut config = ArbiterConfig::default();
        config.tenants.insert(
            "strict".to_string(),
            TenantOverrides {
                monetization_enabled: Some(false),
                switch_threshold: Some(25.0),
                ..Default::default()
            },
        );

        let resolved = config.for_tenant("strict");
        assert!(!resolved.monetization_enabled);
        assert_eq!(resolved.switch_threshold, 25.0);
        // Untouched fields keep platform defaults
        assert_eq!(resolved.activation_threshold, 20.0);

        let other = config.for_tenant("unknown");
        assert!(other.monetization_enabled);
    }
}
