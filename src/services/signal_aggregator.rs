//! Signal aggregation.
//!
//! Normalizes the partial, possibly-missing upstream context of one turn
//! into a complete set of five `DomainSignal`s. Missing sources degrade to
//! low-confidence defaults from a static time-of-day table; nothing here
//! ever fails or blocks. Pure function of the turn context plus config.

use std::collections::BTreeMap;

use chrono::{Datelike, Timelike, Weekday};
use tracing::debug;

use crate::domain::errors::ValidationError;
use crate::domain::models::{
    ArbiterConfig, DayType, DomainSignal, PriorityDomain, SafetySeverity, TimeOfDay, TurnContext,
    Urgency, SAFETY_CRITICAL_FLAG,
};

/// Risk flag set while vulnerability indicators are active.
pub const VULNERABILITY_FLAG: &str = "vulnerability";

/// Provenance label for synthesized signals.
const DEFAULTS_SOURCE: &str = "defaults";

/// The aggregator's complete output for one turn: the five signals plus
/// the cross-domain conditions later stages consume.
#[derive(Debug, Clone)]
pub struct SignalSet {
    /// One signal per domain, keyed in fixed domain order.
    pub signals: BTreeMap<PriorityDomain, DomainSignal>,
    /// User availability 0-100 (defaulted when situational is missing).
    pub availability: f64,
    /// Whether any vulnerability indicator is active.
    pub vulnerability_active: bool,
    /// Domains suppressed by boundary/consent rules this turn.
    pub boundary_suppressed: Vec<PriorityDomain>,
    /// Whether the user opted out of monetization.
    pub commerce_opted_out: bool,
    /// Whether the user opted out of proactive suggestions.
    pub proactive_opted_out: bool,
    /// Validated explicit override, if one survived the boundary.
    pub user_override: Option<PriorityDomain>,
    /// Whether the turn's intent explicitly asked for commerce.
    pub explicit_commerce_request: bool,
    /// Boundary rejections produced while validating the inputs.
    pub rejections: Vec<ValidationError>,
}

impl SignalSet {
    /// The signal for a domain. Aggregation always produces all five.
    pub fn signal(&self, domain: PriorityDomain) -> &DomainSignal {
        &self.signals[&domain]
    }
}

/// Builds the per-turn `SignalSet` from upstream context fragments.
#[derive(Debug, Clone, Default)]
pub struct SignalAggregator;

impl SignalAggregator {
    /// Create an aggregator.
    pub fn new() -> Self {
        Self
    }

    /// Normalize one turn's context into a complete signal set.
    pub fn aggregate(&self, ctx: &TurnContext, config: &ArbiterConfig) -> SignalSet {
        let mut rejections = Vec::new();

        let time_of_day = ctx
            .situational
            .as_ref()
            .and_then(|s| s.time_of_day)
            .unwrap_or_else(|| TimeOfDay::from_hour(ctx.timestamp.hour()));
        let day_type = ctx
            .situational
            .as_ref()
            .and_then(|s| s.day_type)
            .unwrap_or_else(|| day_type_of(ctx.timestamp.weekday()));

        let cap = config.inferred_confidence_cap;
        let mut signals = BTreeMap::new();

        // Health: the only fragment that can carry safety flags. A critical
        // flag forces urgency to critical regardless of numeric activation.
        let health = match &ctx.health {
            Some(h) => {
                let mut signal = DomainSignal::new(
                    PriorityDomain::HealthWellbeing,
                    h.activation,
                    h.confidence,
                    h.urgency,
                    "health_capacity",
                );
                for flag in &h.safety_flags {
                    signal.risk_flags.insert(format!("safety:{}", flag.label));
                }
                if h.safety_flags
                    .iter()
                    .any(|f| f.severity == SafetySeverity::Critical)
                {
                    signal.urgency = Urgency::Critical;
                    signal.risk_flags.insert(SAFETY_CRITICAL_FLAG.to_string());
                }
                signal
            }
            None => synthesized(
                PriorityDomain::HealthWellbeing,
                time_of_day,
                day_type,
                cap,
            ),
        };
        signals.insert(PriorityDomain::HealthWellbeing, health);

        let social = ctx.social.as_ref().map_or_else(
            || synthesized(PriorityDomain::SocialRelationships, time_of_day, day_type, cap),
            |f| {
                DomainSignal::new(
                    PriorityDomain::SocialRelationships,
                    f.activation,
                    f.confidence,
                    f.urgency,
                    "social",
                )
            },
        );
        signals.insert(PriorityDomain::SocialRelationships, social);

        let learning = ctx.learning.as_ref().map_or_else(
            || synthesized(PriorityDomain::LearningGrowth, time_of_day, day_type, cap),
            |f| {
                DomainSignal::new(
                    PriorityDomain::LearningGrowth,
                    f.activation,
                    f.confidence,
                    f.urgency,
                    "learning_style",
                )
            },
        );
        signals.insert(PriorityDomain::LearningGrowth, learning);

        let commerce = ctx.financial.as_ref().map_or_else(
            || synthesized(PriorityDomain::CommerceMonetization, time_of_day, day_type, cap),
            |f| {
                DomainSignal::new(
                    PriorityDomain::CommerceMonetization,
                    f.activation,
                    f.confidence,
                    f.urgency,
                    "financial",
                )
            },
        );
        signals.insert(PriorityDomain::CommerceMonetization, commerce);

        let exploration = ctx.taste.as_ref().map_or_else(
            || synthesized(PriorityDomain::ExplorationDiscovery, time_of_day, day_type, cap),
            |f| {
                DomainSignal::new(
                    PriorityDomain::ExplorationDiscovery,
                    f.activation,
                    f.confidence,
                    f.urgency,
                    "taste_lifestyle",
                )
            },
        );
        signals.insert(PriorityDomain::ExplorationDiscovery, exploration);

        // Goals: focus domains get a fixed activation boost and a
        // provenance label. Unknown names are boundary rejections.
        if let Some(goals) = &ctx.goals {
            for name in &goals.focus_domains {
                match PriorityDomain::parse_str(name) {
                    Some(domain) => {
                        if let Some(signal) = signals.get_mut(&domain) {
                            signal.activation_score =
                                (signal.activation_score + config.goal_focus_boost).min(100.0);
                            signal.sources.insert("goals_trajectory".to_string());
                        }
                    }
                    None => rejections.push(ValidationError::UnknownDomain {
                        field: "goals.focus_domains".to_string(),
                        value: name.clone(),
                    }),
                }
            }
        }

        // Boundaries: absolute suppressions, consent opt-outs, and
        // vulnerability indicators.
        let mut boundary_suppressed = Vec::new();
        let mut commerce_opted_out = false;
        let mut proactive_opted_out = false;
        let mut vulnerability_active = false;
        if let Some(boundaries) = &ctx.boundaries {
            for name in &boundaries.suppressed_domains {
                match PriorityDomain::parse_str(name) {
                    Some(domain) => {
                        if !boundary_suppressed.contains(&domain) {
                            boundary_suppressed.push(domain);
                        }
                    }
                    None => rejections.push(ValidationError::UnknownDomain {
                        field: "boundaries.suppressed_domains".to_string(),
                        value: name.clone(),
                    }),
                }
            }
            commerce_opted_out = boundaries.commerce_opted_out;
            proactive_opted_out = boundaries.proactive_opted_out;
            vulnerability_active = !boundaries.vulnerability_indicators.is_empty();
            if vulnerability_active {
                for signal in signals.values_mut() {
                    signal.risk_flags.insert(VULNERABILITY_FLAG.to_string());
                }
            }
        }
        boundary_suppressed.sort_by_key(PriorityDomain::ordinal);

        // Override: validate the domain name, then let the boundary win
        // over it. Both failure modes are surfaced, never dropped.
        let user_override = match &ctx.user_override {
            Some(override_req) => match PriorityDomain::parse_str(&override_req.domain) {
                Some(domain) => {
                    let blocked = boundary_suppressed.contains(&domain)
                        || (domain == PriorityDomain::CommerceMonetization
                            && (commerce_opted_out || !config.monetization_enabled));
                    if blocked {
                        rejections.push(ValidationError::OverrideRejected {
                            domain,
                            reason: if boundary_suppressed.contains(&domain) {
                                "boundary_rule".to_string()
                            } else {
                                "consent_opted_out".to_string()
                            },
                        });
                        None
                    } else {
                        Some(domain)
                    }
                }
                None => {
                    rejections.push(ValidationError::UnknownDomain {
                        field: "user_override.domain".to_string(),
                        value: override_req.domain.clone(),
                    });
                    None
                }
            },
            None => None,
        };

        let availability = ctx
            .situational
            .as_ref()
            .map_or(70.0, |s| s.availability.clamp(0.0, 100.0));

        let explicit_commerce_request = ctx
            .intent
            .as_ref()
            .is_some_and(|i| i.explicit_commerce_request);

        debug!(
            availability,
            vulnerability_active,
            rejections = rejections.len(),
            "aggregated turn signals"
        );

        SignalSet {
            signals,
            availability,
            vulnerability_active,
            boundary_suppressed,
            commerce_opted_out,
            proactive_opted_out,
            user_override,
            explicit_commerce_request,
            rejections,
        }
    }
}

fn day_type_of(weekday: Weekday) -> DayType {
    match weekday {
        Weekday::Sat | Weekday::Sun => DayType::Weekend,
        _ => DayType::Weekday,
    }
}

/// Synthesize a neutral low-confidence signal for a missing source.
fn synthesized(
    domain: PriorityDomain,
    time_of_day: TimeOfDay,
    day_type: DayType,
    confidence_cap: f64,
) -> DomainSignal {
    DomainSignal::new(
        domain,
        default_activation(domain, time_of_day, day_type),
        confidence_cap.min(30.0),
        Urgency::None,
        DEFAULTS_SOURCE,
    )
}

/// Static default activation table, by domain x time of day x day type.
fn default_activation(domain: PriorityDomain, time_of_day: TimeOfDay, day_type: DayType) -> f64 {
    use DayType::{Weekday, Weekend};
    use PriorityDomain::{
        CommerceMonetization, ExplorationDiscovery, HealthWellbeing, LearningGrowth,
        SocialRelationships,
    };
    use TimeOfDay::{Afternoon, Evening, Morning, Night};

    match (domain, time_of_day, day_type) {
        (HealthWellbeing, Morning, _) => 35.0,
        (HealthWellbeing, Night, _) => 45.0,
        (HealthWellbeing, _, _) => 25.0,

        (SocialRelationships, Evening, Weekend) => 40.0,
        (SocialRelationships, Evening, Weekday) => 30.0,
        (SocialRelationships, _, Weekend) => 30.0,
        (SocialRelationships, _, Weekday) => 20.0,

        (LearningGrowth, Morning | Afternoon, Weekday) => 30.0,
        (LearningGrowth, _, _) => 20.0,

        (CommerceMonetization, _, _) => 10.0,

        (ExplorationDiscovery, Evening | Night, _) => 30.0,
        (ExplorationDiscovery, _, Weekend) => 30.0,
        (ExplorationDiscovery, _, Weekday) => 25.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{
        BoundaryContext, GoalsContext, HealthContext, SafetyFlag, SessionKey, UserOverride,
    };
    use chrono::{TimeZone, Utc};

    fn turn() -> TurnContext {
        // A Wednesday morning.
        let ts = Utc.with_ymd_and_hms(2026, 8, 26, 9, 0, 0).unwrap();
        TurnContext::new(SessionKey::new("acme", "alice", "s-1"), ts)
    }

    #[test]
    fn test_missing_sources_synthesize_all_five() {
        let set = SignalAggregator::new().aggregate(&turn(), &ArbiterConfig::default());
        assert_eq!(set.signals.len(), 5);
        for domain in PriorityDomain::ALL {
            let signal = set.signal(domain);
            assert!(signal.confidence <= 30.0);
            assert!(signal.sources.contains("defaults"));
        }
        assert!(set.rejections.is_empty());
    }

    #[test]
    fn test_critical_safety_flag_forces_urgency() {
        let mut ctx = turn();
        ctx.health = Some(HealthContext {
            activation: 15.0,
            confidence: 90.0,
            urgency: Urgency::Low,
            safety_flags: vec![SafetyFlag {
                label: "panic_episode".to_string(),
                severity: SafetySeverity::Critical,
            }],
        });
        let set = SignalAggregator::new().aggregate(&ctx, &ArbiterConfig::default());
        let health = set.signal(PriorityDomain::HealthWellbeing);
        assert_eq!(health.urgency, Urgency::Critical);
        assert!(health.has_critical_safety());
    }

    #[test]
    fn test_unknown_focus_domain_rejected_not_dropped() {
        let mut ctx = turn();
        ctx.goals = Some(GoalsContext {
            confidence: 80.0,
            focus_domains: vec!["learning_growth".to_string(), "finance".to_string()],
        });
        let config = ArbiterConfig::default();
        let set = SignalAggregator::new().aggregate(&ctx, &config);

        assert_eq!(set.rejections.len(), 1);
        assert!(matches!(
            set.rejections[0],
            ValidationError::UnknownDomain { .. }
        ));
        // The valid one still got its boost over the weekday-morning default.
        let learning = set.signal(PriorityDomain::LearningGrowth);
        assert_eq!(learning.activation_score, 30.0 + config.goal_focus_boost);
    }

    #[test]
    fn test_override_loses_to_boundary() {
        let mut ctx = turn();
        ctx.user_override = Some(UserOverride {
            domain: "commerce_monetization".to_string(),
        });
        ctx.boundaries = Some(BoundaryContext {
            commerce_opted_out: true,
            ..BoundaryContext::default()
        });
        let set = SignalAggregator::new().aggregate(&ctx, &ArbiterConfig::default());
        assert_eq!(set.user_override, None);
        assert!(matches!(
            set.rejections[0],
            ValidationError::OverrideRejected { .. }
        ));
    }

    #[test]
    fn test_vulnerability_flags_every_signal() {
        let mut ctx = turn();
        ctx.boundaries = Some(BoundaryContext {
            vulnerability_indicators: vec!["grief".to_string()],
            ..BoundaryContext::default()
        });
        let set = SignalAggregator::new().aggregate(&ctx, &ArbiterConfig::default());
        assert!(set.vulnerability_active);
        for domain in PriorityDomain::ALL {
            assert!(set.signal(domain).risk_flags.contains(VULNERABILITY_FLAG));
        }
    }
}
