//! Stability state model.
//!
//! Per-session memory of the last confirmed plan, used to suppress
//! low-margin primary-domain flips inside the stability window. The state
//! machine is `no_plan -> active -> active (refreshed) -> expired`; session
//! end discards state immediately.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::context::SessionKey;
use super::plan::ResolvedActionPlan;

/// Lifecycle position of a session's stability state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityStatus {
    /// No plan has been confirmed for the session yet.
    NoPlan,
    /// A plan is active and inside its window.
    Active,
    /// The window has elapsed; the next turn recomputes freely.
    Expired,
}

/// Snapshot of the last confirmed plan for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityState {
    /// Session the state belongs to.
    pub key: SessionKey,
    /// The last confirmed plan.
    pub plan: ResolvedActionPlan,
    /// When the plan was confirmed or last refreshed.
    pub computed_at: DateTime<Utc>,
    /// Final score the primary domain carried when confirmed. Used for the
    /// switch-threshold comparison on the next turn.
    pub primary_score: f64,
    /// Optimistic-concurrency version, bumped on every commit.
    pub version: u64,
}

impl StabilityState {
    /// Record a freshly confirmed plan.
    pub fn new(
        key: SessionKey,
        plan: ResolvedActionPlan,
        primary_score: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            plan,
            computed_at: now,
            primary_score,
            version: 1,
        }
    }

    /// Whether the state is still inside its window at `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>, window_seconds: u64) -> bool {
        let age = now.signed_duration_since(self.computed_at);
        age >= Duration::zero() && age <= Duration::seconds(window_seconds as i64)
    }

    /// Lifecycle status at `now` for the given window.
    pub fn status(&self, now: DateTime<Utc>, window_seconds: u64) -> StabilityStatus {
        if self.is_fresh(now, window_seconds) {
            StabilityStatus::Active
        } else {
            StabilityStatus::Expired
        }
    }

    /// Replace the confirmed plan and restart the window.
    pub fn refresh(&mut self, plan: ResolvedActionPlan, primary_score: f64, now: DateTime<Utc>) {
        self.plan = plan;
        self.primary_score = primary_score;
        self.computed_at = now;
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::domain::PriorityDomain;
    use crate::domain::models::plan::PlanConstraints;
    use std::collections::BTreeSet;

    fn sample_plan(primary: PriorityDomain) -> ResolvedActionPlan {
        ResolvedActionPlan {
            primary_domain: primary,
            secondary_domains: vec![],
            deferred_domains: vec![],
            suppressed_domains: vec![],
            priority_tags: BTreeSet::new(),
            resolved_conflicts: vec![],
            rationale: String::new(),
            constraints: PlanConstraints::default(),
            computed_at: Utc::now(),
        }
    }

    #[test]
    fn test_fresh_inside_window() {
        let now = Utc::now();
        let state = StabilityState::new(
            SessionKey::new("acme", "alice", "s-1"),
            sample_plan(PriorityDomain::HealthWellbeing),
            70.0,
            now,
        );
        assert!(state.is_fresh(now + Duration::seconds(30), 60));
        assert_eq!(
            state.status(now + Duration::seconds(30), 60),
            StabilityStatus::Active
        );
    }

    #[test]
    fn test_expired_after_window() {
        let now = Utc::now();
        let state = StabilityState::new(
            SessionKey::new("acme", "alice", "s-1"),
            sample_plan(PriorityDomain::HealthWellbeing),
            70.0,
            now,
        );
        assert!(!state.is_fresh(now + Duration::seconds(61), 60));
        assert_eq!(
            state.status(now + Duration::seconds(61), 60),
            StabilityStatus::Expired
        );
    }

    #[test]
    fn test_refresh_bumps_version() {
        let now = Utc::now();
        let mut state = StabilityState::new(
            SessionKey::new("acme", "alice", "s-1"),
            sample_plan(PriorityDomain::HealthWellbeing),
            70.0,
            now,
        );
        state.refresh(
            sample_plan(PriorityDomain::HealthWellbeing),
            72.0,
            now + Duration::seconds(10),
        );
        assert_eq!(state.version, 2);
        assert_eq!(state.primary_score, 72.0);
    }
}
