//! Benchmarks for the arbitration pipeline. The full engine round-trip is
//! measured against the configured compute budget; the scoring stage is
//! benchmarked separately since it dominates rule-table work.

use std::sync::Arc;

use arbiter::domain::models::{
    ActivationFragment, ArbiterConfig, HealthContext, SessionKey, TurnContext, Urgency,
};
use arbiter::services::{AuditLogService, PriorityScorer, SignalAggregator};
use arbiter::{ArbitrationEngine, InMemoryStabilityStore};
use chrono::{TimeZone, Utc};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn busy_context() -> TurnContext {
    let ts = Utc.with_ymd_and_hms(2026, 8, 26, 14, 0, 0).unwrap();
    let mut ctx = TurnContext::new(SessionKey::new("acme", "alice", "s-bench"), ts);
    ctx.health = Some(HealthContext {
        activation: 60.0,
        confidence: 85.0,
        urgency: Urgency::Medium,
        safety_flags: Vec::new(),
    });
    ctx.social = Some(ActivationFragment::new(70.0, 80.0, Urgency::Low));
    ctx.learning = Some(ActivationFragment::new(55.0, 75.0, Urgency::None));
    ctx.financial = Some(ActivationFragment::new(45.0, 70.0, Urgency::None));
    ctx.taste = Some(ActivationFragment::new(50.0, 65.0, Urgency::None));
    ctx
}

fn bench_full_arbitration(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let config = ArbiterConfig::default();
    let audit = Arc::new(AuditLogService::new(config.audit.clone()));
    let engine = ArbitrationEngine::new(Arc::new(InMemoryStabilityStore::new()), audit, config);
    let ctx = busy_context();

    c.bench_function("arbitrate_full_turn", |b| {
        b.to_async(&runtime)
            .iter(|| async { black_box(engine.arbitrate(black_box(&ctx)).await) });
    });
}

fn bench_scoring(c: &mut Criterion) {
    let config = ArbiterConfig::default();
    let ctx = busy_context();
    let set = SignalAggregator::new().aggregate(&ctx, &config);
    let scorer = PriorityScorer::new();

    c.bench_function("score_five_domains", |b| {
        b.iter(|| black_box(scorer.score(black_box(&set), &config)));
    });
}

criterion_group!(benches, bench_full_arbitration, bench_scoring);
criterion_main!(benches);
