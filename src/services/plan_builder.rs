//! Plan assembly.
//!
//! Turns scored domains and settled conflicts into the single
//! `ResolvedActionPlan` the response layer consumes. Primary selection is
//! where the hard product guarantees land: critical safety always wins,
//! and commerce can never become primary without an explicit, unsuppressed
//! ask.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::domain::models::{
    ArbiterConfig, ConflictResolution, DeferredDomain, DomainPriorityScore, PriorityDomain,
    ResolutionStrategy, ResolvedActionPlan, SuggestedDepth, SuggestedPacing, SuppressedDomain,
    Urgency,
};

use super::signal_aggregator::SignalSet;

/// Tag set on every plan that holds a previous primary.
pub const TAG_STABILITY_HOLD: &str = "stability_hold";
/// Tag set on the conservative fallback plan.
pub const TAG_FALLBACK: &str = "fallback";

/// Assembles the final plan for a turn.
#[derive(Debug, Clone, Default)]
pub struct PlanBuilder;

impl PlanBuilder {
    /// Create a builder.
    pub fn new() -> Self {
        Self
    }

    /// Pick the primary domain for the turn, before any stability check.
    ///
    /// Order of precedence: an eligible domain carrying a critical safety
    /// signal, then highest final score among eligible domains, ties broken
    /// by fixed domain order. Returns `None` only when every domain is
    /// ineligible, which the caller treats as a fallback condition.
    pub fn select_primary(
        &self,
        scores: &[DomainPriorityScore],
        resolutions: &[ConflictResolution],
        set: &SignalSet,
    ) -> Option<PriorityDomain> {
        let eligible = |domain: PriorityDomain| self.eligible(domain, scores, resolutions, set);

        // Critical safety first, regardless of score.
        for domain in PriorityDomain::ALL {
            if set.signal(domain).has_critical_safety() && eligible(domain) {
                return Some(domain);
            }
        }

        let mut best: Option<&DomainPriorityScore> = None;
        for domain in PriorityDomain::ALL {
            if !eligible(domain) {
                continue;
            }
            let Some(score) = score_of(scores, domain) else {
                continue;
            };
            // Strict comparison keeps the earlier-declared domain on ties.
            if best.is_none_or(|b| score.final_score > b.final_score) {
                best = Some(score);
            }
        }
        best.map(|s| s.domain)
    }

    /// Assemble the plan around a chosen primary. `hold_reason` is set when
    /// the stability controller retained a previous primary, and surfaces
    /// as a tag plus rationale text.
    pub fn build(
        &self,
        primary: PriorityDomain,
        scores: &[DomainPriorityScore],
        resolutions: &[ConflictResolution],
        set: &SignalSet,
        config: &ArbiterConfig,
        now: DateTime<Utc>,
        hold_reason: Option<&str>,
    ) -> ResolvedActionPlan {
        let mut plan = ResolvedActionPlan::new(primary, now);
        plan.resolved_conflicts = resolutions.to_vec();

        plan.secondary_domains = self.select_secondaries(primary, scores, resolutions, set, config);
        plan.deferred_domains = collect_deferred(primary, resolutions);
        plan.suppressed_domains = collect_suppressed(scores, resolutions);

        let commerce_allowed = commerce_eligible(scores, resolutions, set)
            && !set.vulnerability_active;
        plan.constraints.allow_commerce = commerce_allowed;
        plan.constraints.allow_proactive = !set.proactive_opted_out
            && !set.vulnerability_active
            && set.boundary_suppressed.is_empty();

        let rest_mode = primary == PriorityDomain::HealthWellbeing
            && (set.availability < config.low_availability_threshold
                || set.signal(PriorityDomain::HealthWellbeing).urgency >= Urgency::High);
        plan.constraints.suggested_depth = if set.availability < config.low_availability_threshold
        {
            SuggestedDepth::Brief
        } else if set.availability >= 80.0 {
            SuggestedDepth::Deep
        } else {
            SuggestedDepth::Standard
        };
        plan.constraints.suggested_pacing = if set.vulnerability_active || rest_mode {
            SuggestedPacing::Gentle
        } else {
            SuggestedPacing::Steady
        };

        if primary == PriorityDomain::HealthWellbeing {
            plan.priority_tags.insert("health_first".to_string());
        }
        if rest_mode {
            plan.priority_tags.insert("rest_mode".to_string());
        }
        if !commerce_allowed {
            plan.priority_tags.insert("commerce_suppressed".to_string());
        }
        if set.user_override == Some(primary) {
            plan.priority_tags.insert("user_override".to_string());
        }
        if hold_reason.is_some() {
            plan.priority_tags.insert(TAG_STABILITY_HOLD.to_string());
        }

        plan.rationale = self.rationale(&plan, scores, hold_reason);
        debug!(
            primary = primary.as_str(),
            secondaries = plan.secondary_domains.len(),
            conflicts = plan.resolved_conflicts.len(),
            "plan assembled"
        );
        plan
    }

    /// The conservative plan used when arbitration cannot complete: a
    /// low-stakes exploration turn with monetization and proactive
    /// suggestions disabled.
    pub fn conservative_fallback(&self, now: DateTime<Utc>) -> ResolvedActionPlan {
        let mut plan = ResolvedActionPlan::new(PriorityDomain::ExplorationDiscovery, now);
        plan.suppressed_domains.push(SuppressedDomain {
            domain: PriorityDomain::CommerceMonetization,
            reason: "conservative_fallback".to_string(),
        });
        plan.constraints.allow_commerce = false;
        plan.constraints.allow_proactive = false;
        plan.constraints.suggested_depth = SuggestedDepth::Brief;
        plan.constraints.suggested_pacing = SuggestedPacing::Gentle;
        plan.priority_tags.insert(TAG_FALLBACK.to_string());
        plan.priority_tags.insert("commerce_suppressed".to_string());
        plan.rationale =
            "arbitration unavailable; conservative exploration turn with monetization and \
             proactive suggestions disabled"
                .to_string();
        plan
    }

    fn eligible(
        &self,
        domain: PriorityDomain,
        scores: &[DomainPriorityScore],
        resolutions: &[ConflictResolution],
        set: &SignalSet,
    ) -> bool {
        let Some(score) = score_of(scores, domain) else {
            return false;
        };
        if score.suppressed || suppressed_by_resolution(domain, resolutions) {
            return false;
        }
        if domain == PriorityDomain::CommerceMonetization {
            // Commerce needs an explicit, unsuppressed ask to lead a turn.
            return set.user_override == Some(domain) || set.explicit_commerce_request;
        }
        true
    }

    fn select_secondaries(
        &self,
        primary: PriorityDomain,
        scores: &[DomainPriorityScore],
        resolutions: &[ConflictResolution],
        set: &SignalSet,
        config: &ArbiterConfig,
    ) -> Vec<PriorityDomain> {
        let mut candidates: Vec<&DomainPriorityScore> = PriorityDomain::ALL
            .iter()
            .filter_map(|&domain| score_of(scores, domain))
            .filter(|score| {
                let domain = score.domain;
                domain != primary
                    && score.final_score >= config.activation_threshold
                    && self.eligible(domain, scores, resolutions, set)
                    && !lost_to(domain, primary, resolutions)
                    && !deferred_by_resolution(domain, resolutions)
            })
            .collect();
        // Stable sort keeps fixed domain order on equal scores.
        candidates.sort_by(|a, b| {
            b.final_score
                .partial_cmp(&a.final_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        candidates
            .into_iter()
            .take(config.max_secondary_domains)
            .map(|s| s.domain)
            .collect()
    }

    fn rationale(
        &self,
        plan: &ResolvedActionPlan,
        scores: &[DomainPriorityScore],
        hold_reason: Option<&str>,
    ) -> String {
        let primary_score =
            score_of(scores, plan.primary_domain).map_or(0.0, |s| s.final_score);
        let mut parts = vec![format!(
            "primary {} at {primary_score:.1}",
            plan.primary_domain.as_str()
        )];
        if let Some(reason) = hold_reason {
            parts.push(format!("held by stability window: {reason}"));
        }
        if !plan.secondary_domains.is_empty() {
            let names: Vec<&str> = plan
                .secondary_domains
                .iter()
                .map(PriorityDomain::as_str)
                .collect();
            parts.push(format!("secondary: {}", names.join(", ")));
        }
        for resolution in &plan.resolved_conflicts {
            parts.push(format!(
                "{} via {}",
                resolution.conflict.conflict_type.as_str(),
                resolution.strategy.as_str()
            ));
        }
        parts.join("; ")
    }
}

fn score_of(scores: &[DomainPriorityScore], domain: PriorityDomain) -> Option<&DomainPriorityScore> {
    scores.iter().find(|s| s.domain == domain)
}

fn suppressed_by_resolution(domain: PriorityDomain, resolutions: &[ConflictResolution]) -> bool {
    resolutions.iter().any(|r| {
        r.strategy == ResolutionStrategy::SuppressEntirely && r.loser() == Some(domain)
    })
}

fn deferred_by_resolution(domain: PriorityDomain, resolutions: &[ConflictResolution]) -> bool {
    resolutions.iter().any(|r| {
        r.deferred.is_some_and(|(d, _)| d == domain)
            || r.time_split.as_ref().is_some_and(|s| s.later == domain)
    })
}

fn lost_to(domain: PriorityDomain, winner: PriorityDomain, resolutions: &[ConflictResolution]) -> bool {
    resolutions
        .iter()
        .any(|r| r.winner == Some(winner) && r.loser() == Some(domain))
}

fn commerce_eligible(
    scores: &[DomainPriorityScore],
    resolutions: &[ConflictResolution],
    set: &SignalSet,
) -> bool {
    if set.commerce_opted_out {
        return false;
    }
    let commerce = PriorityDomain::CommerceMonetization;
    !score_of(scores, commerce).is_none_or(|s| s.suppressed)
        && !suppressed_by_resolution(commerce, resolutions)
        && !deferred_by_resolution(commerce, resolutions)
}

fn collect_deferred(
    primary: PriorityDomain,
    resolutions: &[ConflictResolution],
) -> Vec<DeferredDomain> {
    let mut deferred = Vec::new();
    for resolution in resolutions {
        let reason = resolution.conflict.conflict_type.as_str().to_string();
        if let Some((domain, delay_minutes)) = resolution.deferred {
            if domain != primary {
                deferred.push(DeferredDomain {
                    domain,
                    reason: reason.clone(),
                    delay_minutes,
                });
            }
        }
        if let Some(split) = &resolution.time_split {
            if split.later != primary {
                deferred.push(DeferredDomain {
                    domain: split.later,
                    reason,
                    delay_minutes: split.later_delay_minutes,
                });
            }
        }
    }
    deferred
}

fn collect_suppressed(
    scores: &[DomainPriorityScore],
    resolutions: &[ConflictResolution],
) -> Vec<SuppressedDomain> {
    let mut suppressed: Vec<SuppressedDomain> = scores
        .iter()
        .filter(|s| s.suppressed)
        .map(|s| SuppressedDomain {
            domain: s.domain,
            reason: s
                .suppression_reason
                .clone()
                .unwrap_or_else(|| "suppressed".to_string()),
        })
        .collect();
    for resolution in resolutions {
        if resolution.strategy == ResolutionStrategy::SuppressEntirely {
            if let Some(loser) = resolution.loser() {
                if !suppressed.iter().any(|s| s.domain == loser) {
                    suppressed.push(SuppressedDomain {
                        domain: loser,
                        reason: resolution.conflict.conflict_type.as_str().to_string(),
                    });
                }
            }
        }
    }
    suppressed
}
