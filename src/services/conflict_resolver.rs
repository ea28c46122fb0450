//! Conflict resolution.
//!
//! Maps every detected conflict to exactly one named strategy via a
//! deterministic data table keyed on conflict type and severity band.
//! The guarantee that health/safety and boundaries/consent never lose to
//! commerce or exploration is enforced as a post-condition on every
//! resolution, not assumed from table correctness.

use tracing::{debug, warn};

use crate::domain::models::{
    ConflictResolution, ConflictType, DomainConflict, DomainPriorityScore, PriorityDomain,
    ResolutionStrategy, TimeSplit,
};

use super::signal_aggregator::SignalSet;

/// One entry of the strategy table: conflict type plus the lowest severity
/// it covers. Entries for the same type go highest band first; the first
/// matching entry wins, so bands partition the severity range with no gaps.
#[derive(Debug, Clone, Copy)]
pub struct StrategyRule {
    /// Conflict type the entry covers.
    pub conflict_type: ConflictType,
    /// Lower severity bound, inclusive.
    pub min_severity: f64,
    /// Strategy to apply.
    pub strategy: ResolutionStrategy,
}

/// The fixed strategy table.
pub const STRATEGY_RULES: &[StrategyRule] = &[
    StrategyRule {
        conflict_type: ConflictType::HealthVsMonetization,
        min_severity: 0.0,
        strategy: ResolutionStrategy::SuppressEntirely,
    },
    StrategyRule {
        conflict_type: ConflictType::BoundariesVsOptimization,
        min_severity: 0.0,
        strategy: ResolutionStrategy::SuppressEntirely,
    },
    StrategyRule {
        conflict_type: ConflictType::RestVsSocial,
        min_severity: 0.0,
        strategy: ResolutionStrategy::DeferLowerPriority,
    },
    StrategyRule {
        conflict_type: ConflictType::CapacityVsDemand,
        min_severity: 0.0,
        strategy: ResolutionStrategy::DeferLowerPriority,
    },
    StrategyRule {
        conflict_type: ConflictType::LearningVsAvailability,
        min_severity: 0.0,
        strategy: ResolutionStrategy::SplitAcrossTime,
    },
    StrategyRule {
        conflict_type: ConflictType::GoalsVsDesire,
        min_severity: 50.0,
        strategy: ResolutionStrategy::UserArbitration,
    },
    StrategyRule {
        conflict_type: ConflictType::GoalsVsDesire,
        min_severity: 0.0,
        strategy: ResolutionStrategy::ReframeSuggestion,
    },
];

/// Settles detected conflicts into resolutions.
#[derive(Debug, Clone, Default)]
pub struct ConflictResolver;

impl ConflictResolver {
    /// Create a resolver.
    pub fn new() -> Self {
        Self
    }

    /// Resolve every conflict. Output order follows input order, so the
    /// whole pipeline stays deterministic.
    pub fn resolve(
        &self,
        conflicts: &[DomainConflict],
        scores: &[DomainPriorityScore],
        set: &SignalSet,
    ) -> Vec<ConflictResolution> {
        conflicts
            .iter()
            .map(|conflict| self.resolve_one(conflict, scores, set))
            .collect()
    }

    fn resolve_one(
        &self,
        conflict: &DomainConflict,
        scores: &[DomainPriorityScore],
        set: &SignalSet,
    ) -> ConflictResolution {
        let strategy = strategy_for(conflict, set);
        let (higher, lower) = ordered_by_score(conflict, scores);
        let delay = delay_minutes(conflict.severity);

        let resolution = match strategy {
            ResolutionStrategy::SuppressEntirely => {
                // The monetization/optimization side loses unconditionally.
                let loser = if conflict.domain_a.is_optimization() {
                    conflict.domain_a
                } else {
                    conflict.domain_b
                };
                let winner = conflict.opponent_of(loser).unwrap_or(conflict.domain_a);
                ConflictResolution::new(
                    conflict.clone(),
                    strategy,
                    format!(
                        "{} suppressed: {} takes absolute precedence",
                        loser.as_str(),
                        winner.as_str()
                    ),
                )
                .with_winner(winner)
            }
            ResolutionStrategy::DeferLowerPriority => ConflictResolution::new(
                conflict.clone(),
                strategy,
                format!(
                    "{} deferred {} minutes behind {}",
                    lower.as_str(),
                    delay,
                    higher.as_str()
                ),
            )
            .with_winner(higher)
            .with_deferred(lower, delay),
            ResolutionStrategy::SplitAcrossTime => ConflictResolution::new(
                conflict.clone(),
                strategy,
                format!(
                    "{} now, {} scheduled {} minutes later",
                    higher.as_str(),
                    lower.as_str(),
                    delay
                ),
            )
            .with_winner(higher)
            .with_time_split(TimeSplit {
                now: higher,
                later: lower,
                later_delay_minutes: delay,
            }),
            ResolutionStrategy::ReframeSuggestion => ConflictResolution::new(
                conflict.clone(),
                strategy,
                format!(
                    "{} reframed inside {}'s framing instead of a second ask",
                    lower.as_str(),
                    higher.as_str()
                ),
            )
            .with_winner(higher),
            ResolutionStrategy::MergeCompatible => ConflictResolution::new(
                conflict.clone(),
                strategy,
                format!(
                    "{} and {} merged into one suggestion",
                    conflict.domain_a.as_str(),
                    conflict.domain_b.as_str()
                ),
            ),
            ResolutionStrategy::UserArbitration => ConflictResolution::new(
                conflict.clone(),
                strategy,
                format!(
                    "{} vs {} left to the user to decide",
                    conflict.domain_a.as_str(),
                    conflict.domain_b.as_str()
                ),
            ),
        };

        let resolution = enforce_safety_guarantee(resolution, set);
        debug!(
            conflict_type = conflict.conflict_type.as_str(),
            strategy = resolution.strategy.as_str(),
            winner = ?resolution.winner.map(|w| w.as_str()),
            "resolved conflict"
        );
        resolution
    }
}

/// Look up the strategy for a conflict. The table covers the whole
/// taxonomy; `generic` is decided by confidence rather than severity band.
fn strategy_for(conflict: &DomainConflict, set: &SignalSet) -> ResolutionStrategy {
    if conflict.conflict_type == ConflictType::Generic {
        let conf_a = set.signal(conflict.domain_a).confidence;
        let conf_b = set.signal(conflict.domain_b).confidence;
        return if conf_a < 50.0 && conf_b < 50.0 {
            ResolutionStrategy::UserArbitration
        } else {
            ResolutionStrategy::DeferLowerPriority
        };
    }

    STRATEGY_RULES
        .iter()
        .find(|rule| {
            rule.conflict_type == conflict.conflict_type
                && conflict.severity >= rule.min_severity
        })
        .map_or(ResolutionStrategy::UserArbitration, |rule| rule.strategy)
}

/// Post-condition: health/safety and consent-protected domains never lose
/// to commerce or exploration. Violations are corrected by swapping the
/// winner, and the correction is visible in the rationale.
fn enforce_safety_guarantee(
    mut resolution: ConflictResolution,
    set: &SignalSet,
) -> ConflictResolution {
    let Some(winner) = resolution.winner else {
        return resolution;
    };
    let Some(loser) = resolution.loser() else {
        return resolution;
    };

    let loser_protected = loser == PriorityDomain::HealthWellbeing
        || set.signal(loser).has_critical_safety();
    if loser_protected && winner.is_optimization() {
        warn!(
            winner = winner.as_str(),
            loser = loser.as_str(),
            "resolution violated safety guarantee; swapping winner"
        );
        resolution.winner = Some(loser);
        if let Some((deferred, delay)) = resolution.deferred {
            if deferred == loser {
                resolution.deferred = Some((winner, delay));
            }
        }
        if let Some(split) = resolution.time_split.as_mut() {
            std::mem::swap(&mut split.now, &mut split.later);
        }
        resolution
            .rationale
            .push_str("; corrected: protected domain may not lose to an optimization domain");
    }
    resolution
}

/// Higher-scoring side first; exact ties break by fixed domain order.
fn ordered_by_score(
    conflict: &DomainConflict,
    scores: &[DomainPriorityScore],
) -> (PriorityDomain, PriorityDomain) {
    let score_of = |domain: PriorityDomain| {
        scores
            .iter()
            .find(|s| s.domain == domain)
            .map_or(0.0, |s| s.final_score)
    };
    let a = conflict.domain_a;
    let b = conflict.domain_b;
    if score_of(b) > score_of(a) {
        (b, a)
    } else {
        (a, b)
    }
}

/// Suggested delay proportional to severity, with a floor so a deferral is
/// never meaningless.
fn delay_minutes(severity: f64) -> u32 {
    ((severity / 2.0).round() as u32).max(5)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ArbiterConfig, SessionKey, TurnContext};
    use crate::services::signal_aggregator::SignalAggregator;
    use chrono::{TimeZone, Utc};

    fn empty_set() -> SignalSet {
        let ts = Utc.with_ymd_and_hms(2026, 8, 26, 14, 0, 0).unwrap();
        let ctx = TurnContext::new(SessionKey::new("acme", "alice", "s-1"), ts);
        SignalAggregator::new().aggregate(&ctx, &ArbiterConfig::default())
    }

    fn score(domain: PriorityDomain, value: f64) -> DomainPriorityScore {
        let mut s = DomainPriorityScore::new(domain, value);
        s.final_score = value;
        s
    }

    #[test]
    fn test_health_vs_monetization_suppresses_commerce() {
        let conflict = DomainConflict::new(
            PriorityDomain::HealthWellbeing,
            PriorityDomain::CommerceMonetization,
            ConflictType::HealthVsMonetization,
            80.0,
        );
        let scores = vec![
            score(PriorityDomain::HealthWellbeing, 40.0),
            // Even when commerce outscores health, it loses.
            score(PriorityDomain::CommerceMonetization, 90.0),
        ];
        let set = empty_set();
        let resolutions = ConflictResolver::new().resolve(&[conflict], &scores, &set);

        assert_eq!(resolutions[0].strategy, ResolutionStrategy::SuppressEntirely);
        assert_eq!(
            resolutions[0].winner,
            Some(PriorityDomain::HealthWellbeing)
        );
    }

    #[test]
    fn test_defer_carries_proportional_delay() {
        let conflict = DomainConflict::new(
            PriorityDomain::HealthWellbeing,
            PriorityDomain::SocialRelationships,
            ConflictType::RestVsSocial,
            60.0,
        );
        let scores = vec![
            score(PriorityDomain::HealthWellbeing, 70.0),
            score(PriorityDomain::SocialRelationships, 45.0),
        ];
        let set = empty_set();
        let resolutions = ConflictResolver::new().resolve(&[conflict], &scores, &set);

        assert_eq!(
            resolutions[0].strategy,
            ResolutionStrategy::DeferLowerPriority
        );
        assert_eq!(
            resolutions[0].deferred,
            Some((PriorityDomain::SocialRelationships, 30))
        );
    }

    #[test]
    fn test_goals_vs_desire_band_split() {
        let set = empty_set();
        let low = DomainConflict::new(
            PriorityDomain::LearningGrowth,
            PriorityDomain::ExplorationDiscovery,
            ConflictType::GoalsVsDesire,
            40.0,
        );
        assert_eq!(
            strategy_for(&low, &set),
            ResolutionStrategy::ReframeSuggestion
        );

        // Anything short of 50, even by a hair, still reframes.
        let near = DomainConflict::new(
            PriorityDomain::LearningGrowth,
            PriorityDomain::ExplorationDiscovery,
            ConflictType::GoalsVsDesire,
            49.9999,
        );
        assert_eq!(
            strategy_for(&near, &set),
            ResolutionStrategy::ReframeSuggestion
        );

        let high = DomainConflict::new(
            PriorityDomain::LearningGrowth,
            PriorityDomain::ExplorationDiscovery,
            ConflictType::GoalsVsDesire,
            50.0,
        );
        assert_eq!(strategy_for(&high, &set), ResolutionStrategy::UserArbitration);
    }

    #[test]
    fn test_generic_low_confidence_goes_to_user() {
        // Defaulted signals carry confidence <= 30 on both sides.
        let set = empty_set();
        let conflict = DomainConflict::new(
            PriorityDomain::SocialRelationships,
            PriorityDomain::ExplorationDiscovery,
            ConflictType::Generic,
            55.0,
        );
        assert_eq!(
            strategy_for(&conflict, &set),
            ResolutionStrategy::UserArbitration
        );
    }

    #[test]
    fn test_split_across_time_builds_split() {
        let conflict = DomainConflict::new(
            PriorityDomain::SocialRelationships,
            PriorityDomain::LearningGrowth,
            ConflictType::LearningVsAvailability,
            50.0,
        );
        let scores = vec![
            score(PriorityDomain::SocialRelationships, 60.0),
            score(PriorityDomain::LearningGrowth, 35.0),
        ];
        let set = empty_set();
        let resolutions = ConflictResolver::new().resolve(&[conflict], &scores, &set);

        let split = resolutions[0].time_split.as_ref().unwrap();
        assert_eq!(split.now, PriorityDomain::SocialRelationships);
        assert_eq!(split.later, PriorityDomain::LearningGrowth);
        assert_eq!(split.later_delay_minutes, 25);
    }

    #[test]
    fn test_post_condition_corrects_bad_winner() {
        // A capacity conflict where exploration happens to outscore health.
        let conflict = DomainConflict::new(
            PriorityDomain::HealthWellbeing,
            PriorityDomain::ExplorationDiscovery,
            ConflictType::CapacityVsDemand,
            70.0,
        );
        let scores = vec![
            score(PriorityDomain::HealthWellbeing, 30.0),
            score(PriorityDomain::ExplorationDiscovery, 80.0),
        ];
        let set = empty_set();
        let resolutions = ConflictResolver::new().resolve(&[conflict], &scores, &set);

        // The table would defer health behind exploration; the post-condition
        // must flip it.
        assert_eq!(
            resolutions[0].winner,
            Some(PriorityDomain::HealthWellbeing)
        );
        assert_eq!(
            resolutions[0].deferred,
            Some((PriorityDomain::ExplorationDiscovery, 35))
        );
        assert!(resolutions[0].rationale.contains("corrected"));
    }
}
