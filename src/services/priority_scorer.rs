//! Priority scoring.
//!
//! Converts each domain signal plus configured base weights into a
//! `DomainPriorityScore`. The adjustment rules are data: an ordered table
//! applied in declared order, never in input-arrival order, so identical
//! inputs always produce identical scores.

use tracing::debug;

use crate::domain::models::{ArbiterConfig, DomainPriorityScore, PriorityDomain};

use super::signal_aggregator::SignalSet;

/// One entry of the ordered adjustment rule table.
#[derive(Debug, Clone, Copy)]
pub struct AdjustmentRule {
    /// Stable rule identifier, recorded on every adjustment it produces.
    pub id: &'static str,
    /// What the rule enforces.
    pub description: &'static str,
    /// Which effect the rule applies.
    pub kind: RuleKind,
}

/// Effects the scorer knows how to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Explicit user override: target forced to 100, all others floored to
    /// at most the activation threshold.
    UserOverride,
    /// Critical safety flag: carrying domain forced to 100.
    CriticalSafety,
    /// Boundary/consent suppression: forced to 0 and marked suppressed.
    BoundarySuppression,
    /// Tenant kill-switch: commerce suppressed when monetization is
    /// disabled.
    MonetizationDisabled,
    /// Low availability: non-health domains scaled down by a fixed factor.
    LowAvailability,
    /// Vulnerability indicators active: commerce capped.
    VulnerabilityGuard,
}

/// The fixed rule order. Order is part of the contract: an override is
/// applied before safety so a critical safety flag can still outrank it,
/// and suppressions run before the scaling rules so suppressed domains
/// stay at zero.
pub const ADJUSTMENT_RULES: &[AdjustmentRule] = &[
    AdjustmentRule {
        id: "user_override",
        description: "explicit user override forces its target to the top",
        kind: RuleKind::UserOverride,
    },
    AdjustmentRule {
        id: "critical_safety",
        description: "a critical safety flag outranks every other signal",
        kind: RuleKind::CriticalSafety,
    },
    AdjustmentRule {
        id: "boundary_suppression",
        description: "boundary/consent rules zero the domains they cover",
        kind: RuleKind::BoundarySuppression,
    },
    AdjustmentRule {
        id: "monetization_disabled",
        description: "tenant kill-switch suppresses commerce entirely",
        kind: RuleKind::MonetizationDisabled,
    },
    AdjustmentRule {
        id: "low_availability",
        description: "low availability shrinks every non-health domain",
        kind: RuleKind::LowAvailability,
    },
    AdjustmentRule {
        id: "vulnerability_guard",
        description: "vulnerability indicators cap monetization",
        kind: RuleKind::VulnerabilityGuard,
    },
];

/// Computes per-domain priority scores from a turn's signal set.
#[derive(Debug, Clone, Default)]
pub struct PriorityScorer;

impl PriorityScorer {
    /// Create a scorer.
    pub fn new() -> Self {
        Self
    }

    /// Score all five domains. Returns scores in fixed domain order.
    pub fn score(&self, set: &SignalSet, config: &ArbiterConfig) -> Vec<DomainPriorityScore> {
        let mut scores: Vec<DomainPriorityScore> = PriorityDomain::ALL
            .iter()
            .map(|&domain| {
                let signal = set.signal(domain);
                let base = config.base_weights.weight(domain) * signal.activation_score / 100.0;
                DomainPriorityScore::new(domain, base)
            })
            .collect();

        for rule in ADJUSTMENT_RULES {
            self.apply_rule(rule, &mut scores, set, config);
        }

        debug!(
            scores = ?scores
                .iter()
                .map(|s| (s.domain.as_str(), s.final_score))
                .collect::<Vec<_>>(),
            "scored domains"
        );
        scores
    }

    fn apply_rule(
        &self,
        rule: &AdjustmentRule,
        scores: &mut [DomainPriorityScore],
        set: &SignalSet,
        config: &ArbiterConfig,
    ) {
        match rule.kind {
            RuleKind::UserOverride => {
                let Some(target) = set.user_override else {
                    return;
                };
                for score in scores.iter_mut() {
                    if score.domain == target {
                        score.force_to(rule.id, "explicit user override", 100.0);
                    } else if score.final_score > config.activation_threshold {
                        score.force_to(
                            rule.id,
                            "floored below override target",
                            config.activation_threshold,
                        );
                    }
                }
            }
            RuleKind::CriticalSafety => {
                for score in scores.iter_mut() {
                    if set.signal(score.domain).has_critical_safety() {
                        score.force_to(rule.id, "active critical safety flag", 100.0);
                    }
                }
            }
            RuleKind::BoundarySuppression => {
                for score in scores.iter_mut() {
                    if set.boundary_suppressed.contains(&score.domain) {
                        score.suppress(rule.id, "boundary_rule");
                    } else if score.domain == PriorityDomain::CommerceMonetization
                        && set.commerce_opted_out
                    {
                        score.suppress(rule.id, "consent_opted_out");
                    }
                }
            }
            RuleKind::MonetizationDisabled => {
                if config.monetization_enabled {
                    return;
                }
                for score in scores.iter_mut() {
                    if score.domain == PriorityDomain::CommerceMonetization && !score.suppressed {
                        score.suppress(rule.id, "monetization_disabled");
                    }
                }
            }
            RuleKind::LowAvailability => {
                if set.availability >= config.low_availability_threshold {
                    return;
                }
                for score in scores.iter_mut() {
                    if score.domain == PriorityDomain::HealthWellbeing || score.suppressed {
                        continue;
                    }
                    let delta = score.final_score * (config.low_availability_factor - 1.0);
                    score.adjust(rule.id, "low availability scale-down", delta);
                }
            }
            RuleKind::VulnerabilityGuard => {
                if !set.vulnerability_active {
                    return;
                }
                for score in scores.iter_mut() {
                    if score.domain == PriorityDomain::CommerceMonetization
                        && !score.suppressed
                        && score.final_score > config.vulnerability_commerce_cap
                    {
                        score.force_to(
                            rule.id,
                            "vulnerability indicators cap commerce",
                            config.vulnerability_commerce_cap,
                        );
                    }
                }
            }
        }
    }
}
