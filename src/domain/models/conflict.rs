//! Domain conflict model.
//!
//! A `DomainConflict` records a detected antagonism between two active
//! domains on one turn. Conflicts are computed fresh every turn and carry
//! enough evidence to justify the resolution chosen for them.

use serde::{Deserialize, Serialize};

use super::domain::PriorityDomain;

/// Fixed taxonomy of known antagonistic patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    /// Health or recovery needs against a monetizable suggestion.
    HealthVsMonetization,
    /// Need for rest against social obligations.
    RestVsSocial,
    /// Learning ambitions against actual available time.
    LearningVsAvailability,
    /// Stated goals against in-the-moment desire.
    GoalsVsDesire,
    /// A consent/boundary rule against an optimization push.
    BoundariesVsOptimization,
    /// Limited capacity against the combined demand of two domains.
    CapacityVsDemand,
    /// Any other contention between two active domains.
    Generic,
}

impl ConflictType {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HealthVsMonetization => "health_vs_monetization",
            Self::RestVsSocial => "rest_vs_social",
            Self::LearningVsAvailability => "learning_vs_availability",
            Self::GoalsVsDesire => "goals_vs_desire",
            Self::BoundariesVsOptimization => "boundaries_vs_optimization",
            Self::CapacityVsDemand => "capacity_vs_demand",
            Self::Generic => "generic",
        }
    }
}

/// A detected conflict between two domains.
///
/// The pair is unordered semantically but reported as an ordered tuple in
/// fixed domain declaration order, so identical inputs always serialize
/// identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainConflict {
    /// First domain of the pair (earlier in declaration order).
    pub domain_a: PriorityDomain,
    /// Second domain of the pair.
    pub domain_b: PriorityDomain,
    /// Which antagonistic pattern matched.
    pub conflict_type: ConflictType,
    /// How contentious the conflict is, 0-100. Closer scores and higher
    /// confidence both raise severity.
    pub severity: f64,
    /// Evidence strings captured at detection time.
    pub evidence: Vec<String>,
}

impl DomainConflict {
    /// Build a conflict, normalizing the pair into declaration order.
    pub fn new(
        a: PriorityDomain,
        b: PriorityDomain,
        conflict_type: ConflictType,
        severity: f64,
    ) -> Self {
        let (domain_a, domain_b) = if a.ordinal() <= b.ordinal() { (a, b) } else { (b, a) };
        Self {
            domain_a,
            domain_b,
            conflict_type,
            severity: severity.clamp(0.0, 100.0),
            evidence: Vec::new(),
        }
    }

    /// Attach an evidence string.
    pub fn with_evidence(mut self, evidence: impl Into<String>) -> Self {
        self.evidence.push(evidence.into());
        self
    }

    /// Whether the given domain is one side of this conflict.
    pub fn involves(&self, domain: PriorityDomain) -> bool {
        self.domain_a == domain || self.domain_b == domain
    }

    /// The other side of the conflict, if `domain` is one side.
    pub fn opponent_of(&self, domain: PriorityDomain) -> Option<PriorityDomain> {
        if self.domain_a == domain {
            Some(self.domain_b)
        } else if self.domain_b == domain {
            Some(self.domain_a)
        } else {
            None
        }
    }
}
