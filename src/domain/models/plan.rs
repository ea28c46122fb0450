//! Resolved action plan model.
//!
//! The engine's final, explainable output: exactly one primary domain, the
//! supporting cast, and the constraints the response layer must honor.
//! Written once per turn, retained for the stability window, then
//! superseded.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::PriorityDomain;
use super::resolution::ConflictResolution;

/// A domain pushed to a later turn, with the reason and suggested delay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeferredDomain {
    /// The deferred domain.
    pub domain: PriorityDomain,
    /// Why it was deferred.
    pub reason: String,
    /// Suggested delay before revisiting, in minutes.
    pub delay_minutes: u32,
}

/// A domain removed from the turn entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressedDomain {
    /// The suppressed domain.
    pub domain: PriorityDomain,
    /// Why it was suppressed (e.g. `consent_opted_out`).
    pub reason: String,
}

/// How deep the response should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedDepth {
    /// Short, single-point response.
    Brief,
    /// Normal depth.
    #[default]
    Standard,
    /// Room for a thorough treatment.
    Deep,
}

/// Pacing the response layer should adopt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedPacing {
    /// Soft, low-pressure delivery.
    Gentle,
    /// Normal pacing.
    #[default]
    Steady,
    /// Urgent, to-the-point delivery.
    Brisk,
}

/// Hard constraints attached to every plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanConstraints {
    /// Always exactly 1: only the primary domain may carry a high-effort
    /// ask.
    pub max_high_effort_domains: u8,
    /// Whether monetizable content may appear anywhere in the response.
    pub allow_commerce: bool,
    /// Whether unprompted suggestions are allowed this turn.
    pub allow_proactive: bool,
    /// Suggested response depth.
    pub suggested_depth: SuggestedDepth,
    /// Suggested delivery pacing.
    pub suggested_pacing: SuggestedPacing,
}

impl Default for PlanConstraints {
    fn default() -> Self {
        Self {
            max_high_effort_domains: 1,
            allow_commerce: true,
            allow_proactive: true,
            suggested_depth: SuggestedDepth::default(),
            suggested_pacing: SuggestedPacing::default(),
        }
    }
}

/// The engine's final output for one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedActionPlan {
    /// The single domain allowed to drive the response.
    pub primary_domain: PriorityDomain,
    /// Supporting domains, ranked by score, capped by config.
    pub secondary_domains: Vec<PriorityDomain>,
    /// Domains pushed to later turns.
    pub deferred_domains: Vec<DeferredDomain>,
    /// Domains removed from the turn.
    pub suppressed_domains: Vec<SuppressedDomain>,
    /// Shape tags (e.g. `health_first`, `commerce_suppressed`). Ordered set
    /// for deterministic serialization.
    pub priority_tags: BTreeSet<String>,
    /// Every conflict detected this turn, settled.
    pub resolved_conflicts: Vec<ConflictResolution>,
    /// Human-readable explanation of the plan.
    pub rationale: String,
    /// Constraints the response layer must honor.
    pub constraints: PlanConstraints,
    /// When the plan was computed.
    pub computed_at: DateTime<Utc>,
}

impl ResolvedActionPlan {
    /// An empty plan around a primary domain; the builder fills the rest.
    pub fn new(primary_domain: PriorityDomain, computed_at: DateTime<Utc>) -> Self {
        Self {
            primary_domain,
            secondary_domains: Vec::new(),
            deferred_domains: Vec::new(),
            suppressed_domains: Vec::new(),
            priority_tags: BTreeSet::new(),
            resolved_conflicts: Vec::new(),
            rationale: String::new(),
            constraints: PlanConstraints::default(),
            computed_at,
        }
    }

    /// Whether the given domain appears as primary or secondary.
    pub fn features(&self, domain: PriorityDomain) -> bool {
        self.primary_domain == domain || self.secondary_domains.contains(&domain)
    }

    /// Whether the given domain was suppressed.
    pub fn is_suppressed(&self, domain: PriorityDomain) -> bool {
        self.suppressed_domains.iter().any(|s| s.domain == domain)
    }

    /// Whether the given domain was deferred.
    pub fn is_deferred(&self, domain: PriorityDomain) -> bool {
        self.deferred_domains.iter().any(|d| d.domain == domain)
    }
}
