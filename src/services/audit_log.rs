//! Audit logging service for observability.
//!
//! Records every arbitration outcome, suppressed flip, input rejection and
//! fallback with full rationale. Append-only, bounded, in memory; platform
//! adapters that need durable compliance storage implement the `AuditSink`
//! port around their own backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use async_trait::async_trait;

use crate::domain::models::{AuditConfig, SessionKey};

/// Append-only destination for audit events.
///
/// The engine mirrors every plan, rejection, suppressed flip and fallback
/// here. Writes are fire-and-forget: a failing sink must never fail a turn.
/// Platform adapters that need durable compliance storage implement this
/// around their own backend; `AuditLogService` is the in-memory default.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Record one audit entry, best effort.
    async fn record(&self, entry: AuditEntry);
}

/// Audit log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditLevel {
    /// Detailed debugging information.
    Debug,
    /// General information about operations.
    Info,
    /// Arbitration decisions and state changes.
    Decision,
    /// Warning conditions (rejections, suppressed flips).
    Warning,
    /// Error conditions (fallbacks).
    Error,
}

impl AuditLevel {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Decision => "decision",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

/// Category of audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditCategory {
    /// Signal aggregation and input validation.
    Signals,
    /// Scoring and adjustment rules.
    Scoring,
    /// Conflict detection and resolution.
    Conflict,
    /// Stability window decisions.
    Stability,
    /// Final plan assembly and delivery.
    Plan,
    /// Session lifecycle.
    Session,
    /// Engine/system events.
    System,
}

impl AuditCategory {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Signals => "signals",
            Self::Scoring => "scoring",
            Self::Conflict => "conflict",
            Self::Stability => "stability",
            Self::Plan => "plan",
            Self::Session => "session",
            Self::System => "system",
        }
    }
}

/// Type of audited event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A plan was computed and committed.
    PlanResolved,
    /// A plan was computed but not committed (preview).
    PlanPreviewed,
    /// A computed plan was discarded before delivery.
    PlanAbandoned,
    /// A low-margin primary flip was suppressed inside the window.
    FlipSuppressed,
    /// A primary flip was allowed through the window.
    FlipAllowed,
    /// A user override was rejected (boundary wins).
    OverrideRejected,
    /// Malformed inbound data was rejected at the boundary.
    InputRejected,
    /// A conflict was settled.
    ConflictResolved,
    /// The safety post-condition corrected a resolution.
    SafetyCorrection,
    /// The fallback chain produced the plan.
    FallbackApplied,
    /// A session's stability state was discarded.
    SessionEnded,
}

impl AuditAction {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlanResolved => "plan_resolved",
            Self::PlanPreviewed => "plan_previewed",
            Self::PlanAbandoned => "plan_abandoned",
            Self::FlipSuppressed => "flip_suppressed",
            Self::FlipAllowed => "flip_allowed",
            Self::OverrideRejected => "override_rejected",
            Self::InputRejected => "input_rejected",
            Self::ConflictResolved => "conflict_resolved",
            Self::SafetyCorrection => "safety_correction",
            Self::FallbackApplied => "fallback_applied",
            Self::SessionEnded => "session_ended",
        }
    }
}

/// Decision rationale attached to arbitration entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionRationale {
    /// The decision that was made.
    pub decision: String,
    /// Why this decision was made.
    pub reasoning: String,
    /// Data/factors that influenced the decision.
    pub factors: Vec<(String, String)>,
}

impl DecisionRationale {
    /// Build a rationale.
    pub fn new(decision: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            decision: decision.into(),
            reasoning: reasoning.into(),
            factors: Vec::new(),
        }
    }

    /// Attach an influencing factor.
    pub fn with_factor(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.factors.push((name.into(), value.into()));
        self
    }
}

/// A single audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique entry ID.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Log level.
    pub level: AuditLevel,
    /// Event category.
    pub category: AuditCategory,
    /// Action/event type.
    pub action: AuditAction,
    /// Session the event belongs to, when applicable.
    pub session: Option<SessionKey>,
    /// Computation the event belongs to, when applicable.
    pub computation_id: Option<Uuid>,
    /// Human-readable message.
    pub message: String,
    /// Decision rationale, when the entry records a decision.
    pub rationale: Option<DecisionRationale>,
    /// Additional structured metadata.
    pub metadata: std::collections::HashMap<String, serde_json::Value>,
}

impl AuditEntry {
    /// Create a new audit entry.
    pub fn new(
        level: AuditLevel,
        category: AuditCategory,
        action: AuditAction,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            level,
            category,
            action,
            session: None,
            computation_id: None,
            message: message.into(),
            rationale: None,
            metadata: std::collections::HashMap::new(),
        }
    }

    /// Attach the owning session.
    pub fn with_session(mut self, key: SessionKey) -> Self {
        self.session = Some(key);
        self
    }

    /// Attach the owning computation.
    pub fn with_computation(mut self, id: Uuid) -> Self {
        self.computation_id = Some(id);
        self
    }

    /// Attach decision rationale.
    pub fn with_rationale(mut self, rationale: DecisionRationale) -> Self {
        self.rationale = Some(rationale);
        self
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Filter for querying audit entries.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Minimum level.
    pub min_level: Option<AuditLevel>,
    /// Category match.
    pub category: Option<AuditCategory>,
    /// Action match.
    pub action: Option<AuditAction>,
    /// Session match.
    pub session: Option<SessionKey>,
    /// Result cap.
    pub limit: Option<usize>,
}

impl AuditFilter {
    /// Empty filter (matches everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a minimum level.
    pub fn with_min_level(mut self, level: AuditLevel) -> Self {
        self.min_level = Some(level);
        self
    }

    /// Require a category.
    pub fn with_category(mut self, category: AuditCategory) -> Self {
        self.category = Some(category);
        self
    }

    /// Require an action.
    pub fn with_action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Require a session.
    pub fn with_session(mut self, key: SessionKey) -> Self {
        self.session = Some(key);
        self
    }

    /// Cap the result count.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check whether an entry matches.
    pub fn matches(&self, entry: &AuditEntry) -> bool {
        if let Some(min_level) = self.min_level {
            if entry.level < min_level {
                return false;
            }
        }
        if let Some(category) = self.category {
            if entry.category != category {
                return false;
            }
        }
        if let Some(action) = self.action {
            if entry.action != action {
                return false;
            }
        }
        if let Some(ref session) = self.session {
            if entry.session.as_ref() != Some(session) {
                return false;
            }
        }
        true
    }
}

/// Statistics over the retained entries.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AuditStats {
    /// Entries currently held.
    pub total_entries: usize,
    /// Count per level wire name.
    pub by_level: std::collections::HashMap<String, usize>,
    /// Count per category wire name.
    pub by_category: std::collections::HashMap<String, usize>,
    /// Entries carrying a decision rationale.
    pub decisions_logged: usize,
}

/// Bounded in-memory audit log.
pub struct AuditLogService {
    config: AuditConfig,
    entries: Arc<RwLock<VecDeque<AuditEntry>>>,
}

impl AuditLogService {
    /// Create a new audit log service.
    pub fn new(config: AuditConfig) -> Self {
        Self {
            config,
            entries: Arc::new(RwLock::new(VecDeque::new())),
        }
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(AuditConfig::default())
    }

    /// Append an entry, evicting the oldest past the retention cap.
    pub async fn log(&self, mut entry: AuditEntry) {
        if !self.config.log_rationale {
            entry.rationale = None;
        }
        let mut entries = self.entries.write().await;
        while entries.len() >= self.config.max_entries {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Query entries, newest first.
    pub async fn query(&self, filter: AuditFilter) -> Vec<AuditEntry> {
        let entries = self.entries.read().await;
        let mut results: Vec<AuditEntry> =
            entries.iter().filter(|e| filter.matches(e)).cloned().collect();
        results.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limit) = filter.limit {
            results.truncate(limit);
        }
        results
    }

    /// All entries for one session, newest first.
    pub async fn session_history(&self, key: &SessionKey) -> Vec<AuditEntry> {
        self.query(AuditFilter::new().with_session(key.clone())).await
    }

    /// Statistics over retained entries.
    pub async fn stats(&self) -> AuditStats {
        let entries = self.entries.read().await;
        let mut stats = AuditStats {
            total_entries: entries.len(),
            ..AuditStats::default()
        };
        for entry in entries.iter() {
            *stats
                .by_level
                .entry(entry.level.as_str().to_string())
                .or_default() += 1;
            *stats
                .by_category
                .entry(entry.category.as_str().to_string())
                .or_default() += 1;
            if entry.rationale.is_some() {
                stats.decisions_logged += 1;
            }
        }
        stats
    }

    /// Drop all retained entries.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[async_trait]
impl AuditSink for AuditLogService {
    async fn record(&self, entry: AuditEntry) {
        self.log(entry).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(action: AuditAction) -> AuditEntry {
        AuditEntry::new(AuditLevel::Info, AuditCategory::Plan, action, "test")
    }

    #[test]
    fn test_level_ordering() {
        assert!(AuditLevel::Debug < AuditLevel::Info);
        assert!(AuditLevel::Decision < AuditLevel::Warning);
        assert!(AuditLevel::Warning < AuditLevel::Error);
    }

    #[test]
    fn test_filter_matches() {
        let e = entry(AuditAction::PlanResolved);
        assert!(AuditFilter::new().with_category(AuditCategory::Plan).matches(&e));
        assert!(!AuditFilter::new()
            .with_category(AuditCategory::Stability)
            .matches(&e));
        assert!(!AuditFilter::new()
            .with_min_level(AuditLevel::Warning)
            .matches(&e));
        assert!(AuditFilter::new()
            .with_action(AuditAction::PlanResolved)
            .matches(&e));
    }

    #[tokio::test]
    async fn test_session_scoped_query() {
        let service = AuditLogService::with_defaults();
        let key = SessionKey::new("acme", "alice", "s-1");

        service
            .log(entry(AuditAction::PlanResolved).with_session(key.clone()))
            .await;
        service
            .log(entry(AuditAction::PlanResolved).with_session(SessionKey::new(
                "acme", "bob", "s-2",
            )))
            .await;

        let history = service.session_history(&key).await;
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_retention_cap() {
        let service = AuditLogService::new(AuditConfig {
            max_entries: 3,
            log_rationale: true,
        });
        for _ in 0..10 {
            service.log(entry(AuditAction::PlanResolved)).await;
        }
        assert_eq!(service.stats().await.total_entries, 3);
    }

    #[tokio::test]
    async fn test_rationale_stripped_when_disabled() {
        let service = AuditLogService::new(AuditConfig {
            max_entries: 10,
            log_rationale: false,
        });
        service
            .log(
                entry(AuditAction::FlipSuppressed)
                    .with_rationale(DecisionRationale::new("hold", "margin too small")),
            )
            .await;
        let all = service.query(AuditFilter::new()).await;
        assert!(all[0].rationale.is_none());
    }
}
