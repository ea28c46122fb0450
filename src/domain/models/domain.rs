//! Priority domain model.
//!
//! The five life domains the engine arbitrates between. The set is fixed;
//! unknown names arriving from upstream are boundary validation errors,
//! never silently coerced.

use serde::{Deserialize, Serialize};

/// One of the five competing life domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityDomain {
    /// Physical and mental wellbeing, rest, capacity.
    HealthWellbeing,
    /// Relationships, obligations to other people.
    SocialRelationships,
    /// Skill building, study, personal growth.
    LearningGrowth,
    /// Purchases, subscriptions, monetizable suggestions.
    CommerceMonetization,
    /// Novelty, discovery, open-ended exploration.
    ExplorationDiscovery,
}

impl PriorityDomain {
    /// All five domains in fixed declaration order (health first).
    ///
    /// This order is also the deterministic tie-break order for primary
    /// selection and pair iteration.
    pub const ALL: [Self; 5] = [
        Self::HealthWellbeing,
        Self::SocialRelationships,
        Self::LearningGrowth,
        Self::CommerceMonetization,
        Self::ExplorationDiscovery,
    ];

    /// Wire name used by upstream engines and audit records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HealthWellbeing => "health_wellbeing",
            Self::SocialRelationships => "social_relationships",
            Self::LearningGrowth => "learning_growth",
            Self::CommerceMonetization => "commerce_monetization",
            Self::ExplorationDiscovery => "exploration_discovery",
        }
    }

    /// Parse a wire name. Returns `None` for unknown identifiers so the
    /// boundary can reject them explicitly.
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "health_wellbeing" | "health" => Some(Self::HealthWellbeing),
            "social_relationships" | "social" => Some(Self::SocialRelationships),
            "learning_growth" | "learning" => Some(Self::LearningGrowth),
            "commerce_monetization" | "commerce" => Some(Self::CommerceMonetization),
            "exploration_discovery" | "exploration" => Some(Self::ExplorationDiscovery),
            _ => None,
        }
    }

    /// Whether this domain is an "optimization" side in boundary conflicts.
    ///
    /// Commerce and exploration are the sides that must never beat health or
    /// consent-protected domains.
    pub fn is_optimization(&self) -> bool {
        matches!(self, Self::CommerceMonetization | Self::ExplorationDiscovery)
    }

    /// Position in the fixed declaration order, for deterministic tie-breaks.
    pub fn ordinal(&self) -> usize {
        Self::ALL.iter().position(|d| d == self).unwrap_or(usize::MAX)
    }
}

impl std::fmt::Display for PriorityDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
