//! Conflict resolution model.
//!
//! Every detected conflict is settled by exactly one named strategy; the
//! resolution carries the winner/loser assignment and a rationale string
//! that feeds the plan's explanation and the audit trail.

use serde::{Deserialize, Serialize};

use super::conflict::DomainConflict;
use super::domain::PriorityDomain;

/// Named policies for settling a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// The lower-priority side waits; it is deferred with a suggested delay.
    DeferLowerPriority,
    /// Keep both, but reframe the losing suggestion inside the winner's
    /// framing instead of stacking asks.
    ReframeSuggestion,
    /// Address one side now and schedule the other for later in the turn
    /// sequence.
    SplitAcrossTime,
    /// The losing side disappears from the turn entirely.
    SuppressEntirely,
    /// The two sides are compatible enough to merge into one suggestion.
    /// Not produced by the default rule table; available to tenant tables.
    MergeCompatible,
    /// Neither side is settled automatically; the user is asked.
    UserArbitration,
}

impl ResolutionStrategy {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeferLowerPriority => "defer_lower_priority",
            Self::ReframeSuggestion => "reframe_suggestion",
            Self::SplitAcrossTime => "split_across_time",
            Self::SuppressEntirely => "suppress_entirely",
            Self::MergeCompatible => "merge_compatible",
            Self::UserArbitration => "user_arbitration",
        }
    }
}

/// A now/later split produced by `SplitAcrossTime`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSplit {
    /// Domain addressed in the current turn.
    pub now: PriorityDomain,
    /// Domain scheduled for later.
    pub later: PriorityDomain,
    /// Suggested delay before the later side, in minutes.
    pub later_delay_minutes: u32,
}

/// The settled outcome of one detected conflict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictResolution {
    /// The conflict being settled.
    pub conflict: DomainConflict,
    /// Strategy chosen by the resolution table.
    pub strategy: ResolutionStrategy,
    /// Winning side, when the strategy picks one.
    pub winner: Option<PriorityDomain>,
    /// Deferred side and suggested delay in minutes, for deferring
    /// strategies.
    pub deferred: Option<(PriorityDomain, u32)>,
    /// Now/later split, for `SplitAcrossTime`.
    pub time_split: Option<TimeSplit>,
    /// Human-readable explanation of the outcome.
    pub rationale: String,
}

impl ConflictResolution {
    /// Build a resolution with no winner/defer/split assignments yet.
    pub fn new(
        conflict: DomainConflict,
        strategy: ResolutionStrategy,
        rationale: impl Into<String>,
    ) -> Self {
        Self {
            conflict,
            strategy,
            winner: None,
            deferred: None,
            time_split: None,
            rationale: rationale.into(),
        }
    }

    /// Set the winning side.
    pub fn with_winner(mut self, winner: PriorityDomain) -> Self {
        self.winner = Some(winner);
        self
    }

    /// Set the deferred side and its delay.
    pub fn with_deferred(mut self, domain: PriorityDomain, delay_minutes: u32) -> Self {
        self.deferred = Some((domain, delay_minutes));
        self
    }

    /// Set the time split.
    pub fn with_time_split(mut self, split: TimeSplit) -> Self {
        self.time_split = Some(split);
        self
    }

    /// The side that lost to the winner, when a winner is set.
    pub fn loser(&self) -> Option<PriorityDomain> {
        self.winner.and_then(|w| self.conflict.opponent_of(w))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::conflict::ConflictType;

    fn sample_conflict() -> DomainConflict {
        DomainConflict::new(
            PriorityDomain::HealthWellbeing,
            PriorityDomain::CommerceMonetization,
            ConflictType::HealthVsMonetization,
            75.0,
        )
    }

    #[test]
    fn test_loser_is_opposite_of_winner() {
        let resolution = ConflictResolution::new(
            sample_conflict(),
            ResolutionStrategy::SuppressEntirely,
            "health outranks monetization",
        )
        .with_winner(PriorityDomain::HealthWellbeing);

        assert_eq!(
            resolution.loser(),
            Some(PriorityDomain::CommerceMonetization)
        );
    }

    #[test]
    fn test_no_winner_no_loser() {
        let resolution = ConflictResolution::new(
            sample_conflict(),
            ResolutionStrategy::UserArbitration,
            "both sides uncertain",
        );
        assert_eq!(resolution.winner, None);
        assert_eq!(resolution.loser(), None);
    }
}
