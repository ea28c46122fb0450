//! Conflict detection.
//!
//! Scans every unordered domain pair whose scores are both active and
//! matches them against an ordered rule table of known antagonistic
//! patterns. Severity rises as scores get closer and as both sides get
//! more confident; only conflicts above the configured threshold are
//! emitted.

use tracing::debug;

use crate::domain::models::{
    ArbiterConfig, ConflictType, DomainConflict, DomainPriorityScore, PriorityDomain,
};

use super::signal_aggregator::SignalSet;

/// Extra condition a pair rule may require beyond the pair itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairCondition {
    /// Always applies.
    Always,
    /// Applies only while boundary or vulnerability pressure is active.
    BoundaryPressure,
    /// Applies only while availability is below the configured threshold.
    LowAvailability,
}

/// One entry of the ordered pair rule table. First matching entry wins.
#[derive(Debug, Clone, Copy)]
pub struct ConflictRule {
    /// One side of the pair.
    pub a: PriorityDomain,
    /// The other side.
    pub b: PriorityDomain,
    /// Extra condition required for the rule to match.
    pub condition: PairCondition,
    /// Conflict type the rule emits.
    pub conflict_type: ConflictType,
}

impl ConflictRule {
    fn matches(&self, x: PriorityDomain, y: PriorityDomain, set: &SignalSet, config: &ArbiterConfig) -> bool {
        let pair_match = (self.a == x && self.b == y) || (self.a == y && self.b == x);
        if !pair_match {
            return false;
        }
        match self.condition {
            PairCondition::Always => true,
            PairCondition::BoundaryPressure => {
                set.vulnerability_active || !set.boundary_suppressed.is_empty()
            }
            PairCondition::LowAvailability => {
                set.availability < config.low_availability_threshold
            }
        }
    }
}

/// The fixed pair rule table. Conditional entries come before their
/// unconditional fallbacks for the same pair; any pair with no match at
/// all falls through to `generic`.
pub const CONFLICT_RULES: &[ConflictRule] = &[
    ConflictRule {
        a: PriorityDomain::HealthWellbeing,
        b: PriorityDomain::CommerceMonetization,
        condition: PairCondition::Always,
        conflict_type: ConflictType::HealthVsMonetization,
    },
    ConflictRule {
        a: PriorityDomain::SocialRelationships,
        b: PriorityDomain::CommerceMonetization,
        condition: PairCondition::BoundaryPressure,
        conflict_type: ConflictType::BoundariesVsOptimization,
    },
    ConflictRule {
        a: PriorityDomain::ExplorationDiscovery,
        b: PriorityDomain::CommerceMonetization,
        condition: PairCondition::BoundaryPressure,
        conflict_type: ConflictType::BoundariesVsOptimization,
    },
    ConflictRule {
        a: PriorityDomain::HealthWellbeing,
        b: PriorityDomain::SocialRelationships,
        condition: PairCondition::Always,
        conflict_type: ConflictType::RestVsSocial,
    },
    ConflictRule {
        a: PriorityDomain::HealthWellbeing,
        b: PriorityDomain::LearningGrowth,
        condition: PairCondition::Always,
        conflict_type: ConflictType::CapacityVsDemand,
    },
    ConflictRule {
        a: PriorityDomain::HealthWellbeing,
        b: PriorityDomain::ExplorationDiscovery,
        condition: PairCondition::Always,
        conflict_type: ConflictType::CapacityVsDemand,
    },
    ConflictRule {
        a: PriorityDomain::LearningGrowth,
        b: PriorityDomain::SocialRelationships,
        condition: PairCondition::LowAvailability,
        conflict_type: ConflictType::LearningVsAvailability,
    },
    ConflictRule {
        a: PriorityDomain::LearningGrowth,
        b: PriorityDomain::ExplorationDiscovery,
        condition: PairCondition::Always,
        conflict_type: ConflictType::GoalsVsDesire,
    },
];

/// Detects conflicts between active domains.
#[derive(Debug, Clone, Default)]
pub struct ConflictDetector;

impl ConflictDetector {
    /// Create a detector.
    pub fn new() -> Self {
        Self
    }

    /// Detect all conflicts for the turn. Pairs are visited in fixed
    /// declaration order so output order is deterministic.
    pub fn detect(
        &self,
        scores: &[DomainPriorityScore],
        set: &SignalSet,
        config: &ArbiterConfig,
    ) -> Vec<DomainConflict> {
        let mut conflicts = Vec::new();

        for (i, &a) in PriorityDomain::ALL.iter().enumerate() {
            for &b in &PriorityDomain::ALL[i + 1..] {
                let Some(score_a) = scores.iter().find(|s| s.domain == a) else {
                    continue;
                };
                let Some(score_b) = scores.iter().find(|s| s.domain == b) else {
                    continue;
                };
                // Suppressed domains are already out of the turn; only
                // pairs where both sides are actively competing count.
                if score_a.suppressed || score_b.suppressed {
                    continue;
                }
                if score_a.final_score < config.activation_threshold
                    || score_b.final_score < config.activation_threshold
                {
                    continue;
                }

                let conflict_type = CONFLICT_RULES
                    .iter()
                    .find(|rule| rule.matches(a, b, set, config))
                    .map_or(ConflictType::Generic, |rule| rule.conflict_type);

                let severity = severity(score_a, score_b, set);
                if severity < config.conflict_resolution_threshold {
                    continue;
                }

                conflicts.push(
                    DomainConflict::new(a, b, conflict_type, severity)
                        .with_evidence(format!(
                            "{}={:.1} vs {}={:.1}",
                            a.as_str(),
                            score_a.final_score,
                            b.as_str(),
                            score_b.final_score
                        ))
                        .with_evidence(format!(
                            "confidence {:.0}/{:.0}",
                            set.signal(a).confidence,
                            set.signal(b).confidence
                        )),
                );
            }
        }

        debug!(count = conflicts.len(), "detected conflicts");
        conflicts
    }
}

/// Severity of a pair: closer scores are more contentious, weighted by how
/// confident both sides are.
fn severity(a: &DomainPriorityScore, b: &DomainPriorityScore, set: &SignalSet) -> f64 {
    let proximity = 100.0 - (a.final_score - b.final_score).abs();
    let mean_confidence = (set.signal(a.domain).confidence + set.signal(b.domain).confidence) / 2.0;
    (proximity * 0.6 + mean_confidence * 0.4).clamp(0.0, 100.0)
}
