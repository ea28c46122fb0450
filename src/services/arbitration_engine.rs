//! Arbitration engine facade.
//!
//! Owns the turn pipeline end to end: aggregate signals, score domains,
//! detect and resolve conflicts, enforce the stability window, assemble
//! the plan, and commit per-session state. Same-session turns serialize on
//! the store's advisory lock; different sessions never contend.
//!
//! The engine never fails a turn. When the pipeline cannot complete inside
//! the compute budget it degrades to the last in-window plan, and failing
//! that to a conservative default.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{ArbitrationError, InputRejection};
use crate::domain::models::{
    ArbiterConfig, DomainConflict, DomainPriorityScore, ResolvedActionPlan, SessionKey,
    StabilityState, TurnContext,
};
use crate::domain::ports::StabilityStore;

use super::audit_log::{
    AuditAction, AuditCategory, AuditEntry, AuditLevel, AuditSink, DecisionRationale,
};
use super::conflict_detector::ConflictDetector;
use super::conflict_resolver::ConflictResolver;
use super::plan_builder::PlanBuilder;
use super::priority_scorer::PriorityScorer;
use super::signal_aggregator::SignalAggregator;
use super::stability_controller::{StabilityController, StabilityDecision};

/// Provenance attached to every response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputationMetadata {
    /// Unique id for this computation, echoed into the audit trail.
    pub computation_id: Uuid,
    /// When the turn was arbitrated.
    pub timestamp: DateTime<Utc>,
    /// SHA-256 of the canonical input context, for replay verification.
    pub input_hash: String,
    /// Ids of scoring rules and resolution strategies that fired.
    pub rules_applied: Vec<String>,
    /// Wall-clock duration of the computation.
    pub duration_ms: u64,
    /// Whether the plan came from the degradation path.
    pub fallback: bool,
}

/// Everything the response layer gets back for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrationResponse {
    /// The plan to act on.
    pub resolved_plan: ResolvedActionPlan,
    /// Per-domain scores with their full adjustment trails.
    pub domain_priorities: Vec<DomainPriorityScore>,
    /// Conflicts detected this turn, before resolution.
    pub conflicts_detected: Vec<DomainConflict>,
    /// Window during which the primary resists low-margin flips.
    pub stability_window_seconds: u64,
    /// Inputs that were rejected rather than failing the turn.
    pub rejected_inputs: Vec<InputRejection>,
    /// Computation provenance.
    pub metadata: ComputationMetadata,
}

struct ComputedTurn {
    plan: ResolvedActionPlan,
    scores: Vec<DomainPriorityScore>,
    conflicts: Vec<DomainConflict>,
    rejections: Vec<InputRejection>,
    hold_reason: Option<String>,
    flip_reason: Option<String>,
    fallback: bool,
}

/// The conflict arbitration engine.
pub struct ArbitrationEngine {
    aggregator: SignalAggregator,
    scorer: PriorityScorer,
    detector: ConflictDetector,
    resolver: ConflictResolver,
    stability: StabilityController,
    builder: PlanBuilder,
    store: Arc<dyn StabilityStore>,
    audit: Arc<dyn AuditSink>,
    config: ArbiterConfig,
}

impl ArbitrationEngine {
    /// Build an engine around a stability store and an audit sink.
    pub fn new(
        store: Arc<dyn StabilityStore>,
        audit: Arc<dyn AuditSink>,
        config: ArbiterConfig,
    ) -> Self {
        Self {
            aggregator: SignalAggregator::new(),
            scorer: PriorityScorer::new(),
            detector: ConflictDetector::new(),
            resolver: ConflictResolver::new(),
            stability: StabilityController::new(),
            builder: PlanBuilder::new(),
            store,
            audit,
            config,
        }
    }

    /// Arbitrate one turn and commit the resulting stability state.
    ///
    /// Never fails: budget overruns and internal faults degrade to the
    /// last in-window plan, then to the conservative default.
    #[instrument(skip(self, ctx), fields(session = %ctx.session))]
    pub async fn arbitrate(&self, ctx: &TurnContext) -> ArbitrationResponse {
        let config = self.config.for_tenant(&ctx.session.tenant);
        let _guard = self.store.acquire(&ctx.session).await;
        let previous = self.load_previous(&ctx.session).await;

        let started = Instant::now();
        let computation_id = Uuid::new_v4();
        let computed = self
            .compute_within_budget(ctx, &config, previous.as_ref())
            .await;

        // A held turn retains the previous primary and lives only in the
        // audit trail; committing it would slide the stability window
        // forward and let a low-margin challenger be held indefinitely.
        if !computed.fallback && computed.hold_reason.is_none() {
            self.commit(&ctx.session, &computed, previous).await;
        }
        self.audit_turn(ctx, &computed, computation_id, AuditAction::PlanResolved)
            .await;

        self.response(ctx, &config, computed, computation_id, started)
    }

    /// Compute a plan without committing stability state. The session lock
    /// is still taken so previews see a consistent baseline.
    #[instrument(skip(self, ctx), fields(session = %ctx.session))]
    pub async fn preview(&self, ctx: &TurnContext) -> ArbitrationResponse {
        let config = self.config.for_tenant(&ctx.session.tenant);
        let _guard = self.store.acquire(&ctx.session).await;
        let previous = self.load_previous(&ctx.session).await;

        let started = Instant::now();
        let computation_id = Uuid::new_v4();
        let computed = self
            .compute_within_budget(ctx, &config, previous.as_ref())
            .await;

        self.audit_turn(ctx, &computed, computation_id, AuditAction::PlanPreviewed)
            .await;
        self.response(ctx, &config, computed, computation_id, started)
    }

    /// Record that a committed turn was abandoned mid-response. The
    /// committed stability state stands; the marker only explains later
    /// flips in the audit trail.
    pub async fn mark_abandoned(
        &self,
        key: &SessionKey,
        computation_id: Uuid,
    ) -> Result<(), ArbitrationError> {
        self.audit
            .record(
                AuditEntry::new(
                    AuditLevel::Info,
                    AuditCategory::Session,
                    AuditAction::PlanAbandoned,
                    "turn abandoned before the response completed",
                )
                .with_session(key.clone())
                .with_computation(computation_id),
            )
            .await;
        Ok(())
    }

    /// Discard all stability state for a session.
    pub async fn end_session(&self, key: &SessionKey) -> Result<(), ArbitrationError> {
        let _guard = self.store.acquire(key).await;
        self.store
            .remove(key)
            .await
            .map_err(|e| ArbitrationError::Internal(e.to_string()))?;
        self.audit
            .record(
                AuditEntry::new(
                    AuditLevel::Info,
                    AuditCategory::Session,
                    AuditAction::SessionEnded,
                    "session ended; stability state discarded",
                )
                .with_session(key.clone()),
            )
            .await;
        Ok(())
    }

    async fn load_previous(&self, key: &SessionKey) -> Option<StabilityState> {
        match self.store.load(key).await {
            Ok(state) => state,
            Err(e) => {
                warn!(session = %key, error = %e, "stability state unavailable; treating session as new");
                None
            }
        }
    }

    async fn compute_within_budget(
        &self,
        ctx: &TurnContext,
        config: &ArbiterConfig,
        previous: Option<&StabilityState>,
    ) -> ComputedTurn {
        // The pipeline is synchronous, so the budget is checked against
        // measured wall time; a plan that took too long is discarded even
        // though it finished.
        let budget = Duration::from_millis(config.compute_budget_ms);
        let started = Instant::now();
        let computed = self.compute(ctx, config, previous);
        if started.elapsed() > budget {
            let err = ArbitrationError::ComputeBudgetExceeded {
                budget_ms: config.compute_budget_ms,
            };
            warn!(session = %ctx.session, error = %err, "degrading to fallback plan");
            return self.fallback_turn(ctx, config, previous, &err).await;
        }
        computed
    }

    fn compute(
        &self,
        ctx: &TurnContext,
        config: &ArbiterConfig,
        previous: Option<&StabilityState>,
    ) -> ComputedTurn {
        let set = self.aggregator.aggregate(ctx, config);
        let rejections: Vec<InputRejection> =
            set.rejections.iter().map(InputRejection::from).collect();

        let scores = self.scorer.score(&set, config);
        let conflicts = self.detector.detect(&scores, &set, config);
        let resolutions = self.resolver.resolve(&conflicts, &scores, &set);

        let Some(proposed) = self.builder.select_primary(&scores, &resolutions, &set) else {
            // Every domain ineligible: nothing sane to lead the turn with.
            let mut plan = self.builder.conservative_fallback(ctx.timestamp);
            plan.resolved_conflicts = resolutions;
            return ComputedTurn {
                plan,
                scores,
                conflicts,
                rejections,
                hold_reason: None,
                flip_reason: None,
                fallback: true,
            };
        };

        let decision = self.stability.evaluate(
            previous,
            proposed,
            &scores,
            &set,
            config,
            ctx.timestamp,
        );
        let (primary, hold_reason, flip_reason) = match decision {
            StabilityDecision::Accept { .. } => (proposed, None, None),
            StabilityDecision::AllowFlip { reason } => (proposed, None, Some(reason)),
            StabilityDecision::Hold {
                retained_primary,
                reason,
            } => (retained_primary, Some(reason), None),
        };

        let plan = self.builder.build(
            primary,
            &scores,
            &resolutions,
            &set,
            config,
            ctx.timestamp,
            hold_reason.as_deref(),
        );
        ComputedTurn {
            plan,
            scores,
            conflicts,
            rejections,
            hold_reason,
            flip_reason,
            fallback: false,
        }
    }

    /// Fallback chain: last in-window plan, else the conservative default.
    async fn fallback_turn(
        &self,
        ctx: &TurnContext,
        config: &ArbiterConfig,
        previous: Option<&StabilityState>,
        err: &ArbitrationError,
    ) -> ComputedTurn {
        let plan = previous
            .filter(|state| state.is_fresh(ctx.timestamp, config.stability_window_seconds))
            .map_or_else(
                || self.builder.conservative_fallback(ctx.timestamp),
                |state| state.plan.clone(),
            );
        self.audit
            .record(
                AuditEntry::new(
                    AuditLevel::Warning,
                    AuditCategory::System,
                    AuditAction::FallbackApplied,
                    err.to_string(),
                )
                .with_session(ctx.session.clone())
                .with_metadata(
                    "fallback_primary",
                    serde_json::json!(plan.primary_domain.as_str()),
                ),
            )
            .await;
        ComputedTurn {
            plan,
            scores: Vec::new(),
            conflicts: Vec::new(),
            rejections: Vec::new(),
            hold_reason: None,
            flip_reason: None,
            fallback: true,
        }
    }

    async fn commit(
        &self,
        key: &SessionKey,
        computed: &ComputedTurn,
        previous: Option<StabilityState>,
    ) {
        let primary_score = computed
            .scores
            .iter()
            .find(|s| s.domain == computed.plan.primary_domain)
            .map_or(0.0, |s| s.final_score);
        let now = computed.plan.computed_at;

        let state = match previous {
            Some(mut prev) if prev.key == *key => {
                prev.refresh(computed.plan.clone(), primary_score, now);
                prev
            }
            _ => StabilityState::new(key.clone(), computed.plan.clone(), primary_score, now),
        };
        if let Err(e) = self.store.store(state).await {
            warn!(session = %key, error = %e, "failed to persist stability state");
        }
    }

    async fn audit_turn(
        &self,
        ctx: &TurnContext,
        computed: &ComputedTurn,
        computation_id: Uuid,
        action: AuditAction,
    ) {
        for rejection in &computed.rejections {
            self.audit
                .record(
                    AuditEntry::new(
                        AuditLevel::Warning,
                        AuditCategory::Signals,
                        AuditAction::InputRejected,
                        format!("{}: {}", rejection.code, rejection.message),
                    )
                    .with_session(ctx.session.clone())
                    .with_computation(computation_id),
                )
                .await;
        }

        if let Some(reason) = &computed.hold_reason {
            self.audit
                .record(
                    AuditEntry::new(
                        AuditLevel::Decision,
                        AuditCategory::Stability,
                        AuditAction::FlipSuppressed,
                        reason.clone(),
                    )
                    .with_session(ctx.session.clone())
                    .with_computation(computation_id),
                )
                .await;
        }
        if let Some(reason) = &computed.flip_reason {
            self.audit
                .record(
                    AuditEntry::new(
                        AuditLevel::Decision,
                        AuditCategory::Stability,
                        AuditAction::FlipAllowed,
                        reason.clone(),
                    )
                    .with_session(ctx.session.clone())
                    .with_computation(computation_id),
                )
                .await;
        }

        let rationale = DecisionRationale::new(
            format!("primary: {}", computed.plan.primary_domain.as_str()),
            computed.plan.rationale.clone(),
        )
        .with_factor("conflicts", computed.conflicts.len().to_string())
        .with_factor("rejections", computed.rejections.len().to_string());
        self.audit
            .record(
                AuditEntry::new(AuditLevel::Decision, AuditCategory::Plan, action, {
                    format!("plan resolved for {}", ctx.session)
                })
                .with_session(ctx.session.clone())
                .with_computation(computation_id)
                .with_rationale(rationale),
            )
            .await;

        info!(
            session = %ctx.session,
            primary = computed.plan.primary_domain.as_str(),
            fallback = computed.fallback,
            "turn arbitrated"
        );
    }

    fn response(
        &self,
        ctx: &TurnContext,
        config: &ArbiterConfig,
        computed: ComputedTurn,
        computation_id: Uuid,
        started: Instant,
    ) -> ArbitrationResponse {
        let mut rules_applied: Vec<String> = Vec::new();
        for score in &computed.scores {
            for adjustment in &score.adjustments {
                if !rules_applied.contains(&adjustment.rule_id) {
                    rules_applied.push(adjustment.rule_id.clone());
                }
            }
        }
        for resolution in &computed.plan.resolved_conflicts {
            let strategy = resolution.strategy.as_str().to_string();
            if !rules_applied.contains(&strategy) {
                rules_applied.push(strategy);
            }
        }

        ArbitrationResponse {
            resolved_plan: computed.plan,
            domain_priorities: computed.scores,
            conflicts_detected: computed.conflicts,
            stability_window_seconds: config.stability_window_seconds,
            rejected_inputs: computed.rejections,
            metadata: ComputationMetadata {
                computation_id,
                timestamp: ctx.timestamp,
                input_hash: input_hash(ctx),
                rules_applied,
                duration_ms: started.elapsed().as_millis() as u64,
                fallback: computed.fallback,
            },
        }
    }
}

/// SHA-256 over the canonical JSON encoding of the turn context. Field
/// order is fixed by the struct definitions, so equal inputs hash equal.
fn input_hash(ctx: &TurnContext) -> String {
    let mut hasher = Sha256::new();
    match serde_json::to_vec(ctx) {
        Ok(bytes) => hasher.update(&bytes),
        Err(_) => hasher.update(ctx.session.to_string().as_bytes()),
    }
    format!("{:x}", hasher.finalize())
}
