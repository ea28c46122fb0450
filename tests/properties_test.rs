//! Property tests for the arbitration pipeline's universal guarantees,
//! run against the synchronous pipeline stages with generated contexts.

use arbiter::domain::models::{
    ActivationFragment, ArbiterConfig, BoundaryContext, HealthContext, PriorityDomain,
    SafetyFlag, SafetySeverity, SessionKey, SituationalContext, TurnContext, Urgency,
};
use arbiter::services::{
    ConflictDetector, ConflictResolver, PlanBuilder, PriorityScorer, SignalAggregator,
};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

fn urgency_strategy() -> impl Strategy<Value = Urgency> {
    prop_oneof![
        Just(Urgency::None),
        Just(Urgency::Low),
        Just(Urgency::Medium),
        Just(Urgency::High),
        Just(Urgency::Critical),
    ]
}

fn fragment_strategy() -> impl Strategy<Value = ActivationFragment> {
    (0.0f64..=100.0, 0.0f64..=100.0, urgency_strategy())
        .prop_map(|(activation, confidence, urgency)| {
            ActivationFragment::new(activation, confidence, urgency)
        })
}

fn context_strategy() -> impl Strategy<Value = TurnContext> {
    (
        proptest::option::of(fragment_strategy()),
        proptest::option::of(fragment_strategy()),
        proptest::option::of(fragment_strategy()),
        proptest::option::of(fragment_strategy()),
        proptest::option::of((0.0f64..=100.0, 0.0f64..=100.0, urgency_strategy())),
        proptest::option::of(0.0f64..=100.0),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(
            |(social, financial, learning, taste, health, availability, commerce_opted_out, vulnerable)| {
                let ts = Utc.with_ymd_and_hms(2026, 8, 26, 14, 0, 0).unwrap();
                let mut ctx =
                    TurnContext::new(SessionKey::new("acme", "alice", "s-prop"), ts);
                ctx.social = social;
                ctx.financial = financial;
                ctx.learning = learning;
                ctx.taste = taste;
                ctx.health = health.map(|(activation, confidence, urgency)| HealthContext {
                    activation,
                    confidence,
                    urgency,
                    safety_flags: Vec::new(),
                });
                ctx.situational = availability.map(|availability| SituationalContext {
                    availability,
                    time_of_day: None,
                    day_type: None,
                });
                if commerce_opted_out || vulnerable {
                    ctx.boundaries = Some(BoundaryContext {
                        commerce_opted_out,
                        vulnerability_indicators: if vulnerable {
                            vec!["financial_stress".to_string()]
                        } else {
                            Vec::new()
                        },
                        ..Default::default()
                    });
                }
                ctx
            },
        )
}

fn run_pipeline(
    ctx: &TurnContext,
    config: &ArbiterConfig,
) -> arbiter::domain::models::ResolvedActionPlan {
    let set = SignalAggregator::new().aggregate(ctx, config);
    let scores = PriorityScorer::new().score(&set, config);
    let conflicts = ConflictDetector::new().detect(&scores, &set, config);
    let resolutions = ConflictResolver::new().resolve(&conflicts, &scores, &set);
    let builder = PlanBuilder::new();
    let primary = builder
        .select_primary(&scores, &resolutions, &set)
        .unwrap_or(PriorityDomain::ExplorationDiscovery);
    builder.build(primary, &scores, &resolutions, &set, config, ctx.timestamp, None)
}

proptest! {
    /// Commerce can never lead a turn without an explicit, unsuppressed ask.
    #[test]
    fn prop_commerce_never_primary_uninvited(ctx in context_strategy()) {
        let plan = run_pipeline(&ctx, &ArbiterConfig::default());
        prop_assert_ne!(plan.primary_domain, PriorityDomain::CommerceMonetization);
    }

    /// A critical health safety flag wins regardless of other signals.
    #[test]
    fn prop_critical_safety_always_health_primary(mut ctx in context_strategy()) {
        ctx.health = Some(HealthContext {
            activation: 5.0,
            confidence: 95.0,
            urgency: Urgency::Low,
            safety_flags: vec![SafetyFlag {
                label: "crisis".to_string(),
                severity: SafetySeverity::Critical,
            }],
        });

        let plan = run_pipeline(&ctx, &ArbiterConfig::default());
        prop_assert_eq!(plan.primary_domain, PriorityDomain::HealthWellbeing);
    }

    /// Exactly one domain may carry a high-effort ask, on every plan.
    #[test]
    fn prop_single_high_effort_domain(ctx in context_strategy()) {
        let plan = run_pipeline(&ctx, &ArbiterConfig::default());
        prop_assert_eq!(plan.constraints.max_high_effort_domains, 1);
    }

    /// All final scores stay within bounds and every domain is scored.
    #[test]
    fn prop_scores_bounded_and_complete(ctx in context_strategy()) {
        let config = ArbiterConfig::default();
        let set = SignalAggregator::new().aggregate(&ctx, &config);
        let scores = PriorityScorer::new().score(&set, &config);

        prop_assert_eq!(scores.len(), 5);
        for score in &scores {
            prop_assert!((0.0..=100.0).contains(&score.final_score));
            prop_assert!(!score.suppressed || score.final_score == 0.0);
        }
    }

    /// The pipeline is a pure function of its inputs.
    #[test]
    fn prop_pipeline_deterministic(ctx in context_strategy()) {
        let config = ArbiterConfig::default();
        let first = run_pipeline(&ctx, &config);
        let second = run_pipeline(&ctx, &config);
        prop_assert_eq!(first, second);
    }

    /// Secondary domains never exceed the configured cap and never repeat
    /// the primary.
    #[test]
    fn prop_secondaries_capped_and_distinct(ctx in context_strategy()) {
        let config = ArbiterConfig::default();
        let plan = run_pipeline(&ctx, &config);

        prop_assert!(plan.secondary_domains.len() <= config.max_secondary_domains);
        prop_assert!(!plan.secondary_domains.contains(&plan.primary_domain));
    }

    /// A suppressed domain never appears as primary or secondary.
    #[test]
    fn prop_suppressed_domains_excluded(ctx in context_strategy()) {
        let plan = run_pipeline(&ctx, &ArbiterConfig::default());
        for suppressed in &plan.suppressed_domains {
            prop_assert!(!plan.features(suppressed.domain));
        }
    }
}
