//! Domain signal model.
//!
//! A `DomainSignal` is the normalized, per-turn measurement of how strongly a
//! domain wants to act. Signals are ephemeral: the aggregator rebuilds the
//! full set of five on every turn, synthesizing low-confidence defaults for
//! anything upstream did not report.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::domain::PriorityDomain;

/// Risk flag set on any signal whose source reported a critical safety
/// condition. Scoring and primary selection treat it as an absolute trump.
pub const SAFETY_CRITICAL_FLAG: &str = "safety_critical";

/// Urgency reported by (or synthesized for) a domain signal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    /// No time pressure.
    #[default]
    None,
    /// Can wait for several turns.
    Low,
    /// Should be addressed soon.
    Medium,
    /// Should drive this turn if nothing outranks it.
    High,
    /// Must drive this turn; also unlocks stability flips.
    Critical,
}

impl Urgency {
    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Normalized per-turn measurement for one domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainSignal {
    /// The domain this signal speaks for.
    pub domain: PriorityDomain,
    /// How strongly the domain wants to act, 0-100.
    pub activation_score: f64,
    /// Upstream confidence in the measurement, 0-100. Synthesized signals
    /// are capped at the configured inferred-confidence cap.
    pub confidence: f64,
    /// Time pressure attached to the signal.
    pub urgency: Urgency,
    /// Risk markers (e.g. `safety_critical`, `vulnerability`). Ordered set
    /// so serialization and hashing are deterministic.
    pub risk_flags: BTreeSet<String>,
    /// Provenance labels naming which upstream sources contributed.
    pub sources: BTreeSet<String>,
}

impl DomainSignal {
    /// Build a signal with no risk flags and a single provenance label.
    pub fn new(
        domain: PriorityDomain,
        activation_score: f64,
        confidence: f64,
        urgency: Urgency,
        source: impl Into<String>,
    ) -> Self {
        Self {
            domain,
            activation_score: activation_score.clamp(0.0, 100.0),
            confidence: confidence.clamp(0.0, 100.0),
            urgency,
            risk_flags: BTreeSet::new(),
            sources: BTreeSet::from([source.into()]),
        }
    }

    /// Add a risk flag.
    pub fn with_risk_flag(mut self, flag: impl Into<String>) -> Self {
        self.risk_flags.insert(flag.into());
        self
    }

    /// Whether this signal carries an active critical safety flag.
    pub fn has_critical_safety(&self) -> bool {
        self.risk_flags.contains(SAFETY_CRITICAL_FLAG)
    }
}
