//! Stability window enforcement.
//!
//! A freshly computed plan may propose a different primary domain than the
//! plan committed moments earlier. Within the stability window a flip is
//! only honored when something decisive changed; otherwise the previous
//! primary is held to keep the assistant from whipsawing between topics.

use tracing::debug;

use crate::domain::models::{
    ArbiterConfig, DomainPriorityScore, PriorityDomain, StabilityState, Urgency,
};

use super::signal_aggregator::SignalSet;

/// Outcome of a stability check against the previous committed plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StabilityDecision {
    /// No usable prior state, or the proposed primary already matches it;
    /// commit the proposed plan as-is.
    Accept {
        /// Why the proposed primary stands.
        reason: String,
    },
    /// A flip inside the window was justified; commit the proposed plan.
    AllowFlip {
        /// Why the flip was let through.
        reason: String,
    },
    /// The flip was below the switch threshold; rebuild the plan with the
    /// previous primary forced back on top.
    Hold {
        /// Primary domain to retain from the previous plan.
        retained_primary: PriorityDomain,
        /// Why the flip was suppressed.
        reason: String,
    },
}

impl StabilityDecision {
    /// Whether the proposed primary survives the check.
    pub fn allows_proposed(&self) -> bool {
        !matches!(self, Self::Hold { .. })
    }
}

/// Compares a proposed primary against the session's committed state.
#[derive(Debug, Clone, Default)]
pub struct StabilityController;

impl StabilityController {
    /// Create a controller.
    pub fn new() -> Self {
        Self
    }

    /// Decide whether the proposed primary may replace the committed one.
    ///
    /// Both sides of the switch-threshold comparison are taken from the
    /// current turn's scores, so the margin reflects what the user looks
    /// like right now rather than a stale snapshot.
    pub fn evaluate(
        &self,
        previous: Option<&StabilityState>,
        proposed_primary: PriorityDomain,
        scores: &[DomainPriorityScore],
        set: &SignalSet,
        config: &ArbiterConfig,
        now: chrono::DateTime<chrono::Utc>,
    ) -> StabilityDecision {
        let Some(prev) = previous else {
            return StabilityDecision::Accept {
                reason: "no prior plan for session".to_string(),
            };
        };
        if !prev.is_fresh(now, config.stability_window_seconds) {
            return StabilityDecision::Accept {
                reason: "stability window expired".to_string(),
            };
        }

        let held = prev.plan.primary_domain;
        if held == proposed_primary {
            return StabilityDecision::Accept {
                reason: "primary unchanged".to_string(),
            };
        }

        if set.user_override == Some(proposed_primary) {
            return StabilityDecision::AllowFlip {
                reason: format!("user override to {}", proposed_primary.as_str()),
            };
        }
        if set.signal(proposed_primary).urgency >= Urgency::Critical {
            return StabilityDecision::AllowFlip {
                reason: format!("critical urgency on {}", proposed_primary.as_str()),
            };
        }
        // A held primary that is now suppressed cannot be retained.
        if score_of(scores, held).is_none_or(|s| s.suppressed) {
            return StabilityDecision::AllowFlip {
                reason: format!("previous primary {} is now suppressed", held.as_str()),
            };
        }

        let proposed_score = score_of(scores, proposed_primary).map_or(0.0, |s| s.final_score);
        let held_score = score_of(scores, held).map_or(0.0, |s| s.final_score);
        let delta = proposed_score - held_score;
        if delta > config.switch_threshold {
            return StabilityDecision::AllowFlip {
                reason: format!(
                    "{} leads {} by {delta:.1} (> switch threshold {})",
                    proposed_primary.as_str(),
                    held.as_str(),
                    config.switch_threshold
                ),
            };
        }

        debug!(
            held = held.as_str(),
            proposed = proposed_primary.as_str(),
            delta,
            "holding primary inside stability window"
        );
        StabilityDecision::Hold {
            retained_primary: held,
            reason: format!(
                "{} leads {} by only {delta:.1} (<= switch threshold {})",
                proposed_primary.as_str(),
                held.as_str(),
                config.switch_threshold
            ),
        }
    }
}

fn score_of(scores: &[DomainPriorityScore], domain: PriorityDomain) -> Option<&DomainPriorityScore> {
    scores.iter().find(|s| s.domain == domain)
}
