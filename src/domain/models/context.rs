//! Turn context model.
//!
//! The inbound record for one conversational turn: up to eight optional
//! upstream context fragments plus the classified intent and an optional
//! explicit user priority override. Every fragment is independently
//! optional; the aggregator degrades missing ones to low-confidence
//! defaults instead of failing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::signal::Urgency;

/// Identity of the conversation a turn belongs to. Stability state is
/// scoped by this key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    /// Tenant the user belongs to (selects config overrides).
    pub tenant: String,
    /// Stable user identifier within the tenant.
    pub user: String,
    /// Conversation session identifier.
    pub session: String,
}

impl SessionKey {
    /// Build a session key.
    pub fn new(
        tenant: impl Into<String>,
        user: impl Into<String>,
        session: impl Into<String>,
    ) -> Self {
        Self {
            tenant: tenant.into(),
            user: user.into(),
            session: session.into(),
        }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.tenant, self.user, self.session)
    }
}

/// Coarse time-of-day bucket used by the static defaults table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    /// 05:00-11:59.
    Morning,
    /// 12:00-16:59.
    Afternoon,
    /// 17:00-21:59.
    Evening,
    /// 22:00-04:59.
    Night,
}

impl TimeOfDay {
    /// Bucket an hour (0-23).
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=21 => Self::Evening,
            _ => Self::Night,
        }
    }
}

/// Weekday vs weekend, for the defaults table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    /// Monday through Friday.
    Weekday,
    /// Saturday and Sunday.
    Weekend,
}

/// Severity of a health safety flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetySeverity {
    /// Informational only.
    Info,
    /// Worth factoring into pacing.
    Elevated,
    /// Hard trump: the carrying domain must drive the turn.
    Critical,
}

/// A safety condition reported by the health-capacity engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyFlag {
    /// Short machine label, e.g. `sleep_deprivation`.
    pub label: String,
    /// How seriously the engine must take it.
    pub severity: SafetySeverity,
}

/// Situational context: where the user is and how much room they have.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SituationalContext {
    /// How available the user is right now, 0-100.
    pub availability: f64,
    /// Reported time-of-day bucket; derived from the turn timestamp when
    /// absent.
    #[serde(default)]
    pub time_of_day: Option<TimeOfDay>,
    /// Reported day type; derived from the turn timestamp when absent.
    #[serde(default)]
    pub day_type: Option<DayType>,
}

/// Generic activation fragment shared by the social, financial, learning
/// and taste engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationFragment {
    /// Activation strength, 0-100.
    pub activation: f64,
    /// Upstream confidence, 0-100.
    pub confidence: f64,
    /// Urgency attached to the fragment.
    #[serde(default)]
    pub urgency: Urgency,
}

impl ActivationFragment {
    /// Build a fragment.
    pub fn new(activation: f64, confidence: f64, urgency: Urgency) -> Self {
        Self {
            activation,
            confidence,
            urgency,
        }
    }
}

/// Health-capacity context, the only fragment that can carry safety flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthContext {
    /// Activation strength, 0-100.
    pub activation: f64,
    /// Upstream confidence, 0-100.
    pub confidence: f64,
    /// Urgency attached to the fragment.
    #[serde(default)]
    pub urgency: Urgency,
    /// Active safety conditions. Any critical entry forces
    /// `urgency = critical` on the health signal.
    #[serde(default)]
    pub safety_flags: Vec<SafetyFlag>,
}

/// Goals/trajectory context. Focus domains are named by string because they
/// arrive from outside; unknown names are boundary rejections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalsContext {
    /// Upstream confidence, 0-100.
    pub confidence: f64,
    /// Domains the user's stated goals currently emphasize.
    #[serde(default)]
    pub focus_domains: Vec<String>,
}

/// Boundaries/consent context. Suppressions listed here are absolute for
/// the turn: a suppressed domain can never be primary or secondary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundaryContext {
    /// Domains the user has opted out of, by wire name. Unknown names are
    /// boundary rejections.
    #[serde(default)]
    pub suppressed_domains: Vec<String>,
    /// Whether the user opted out of monetization entirely.
    #[serde(default)]
    pub commerce_opted_out: bool,
    /// Whether the user opted out of proactive suggestions.
    #[serde(default)]
    pub proactive_opted_out: bool,
    /// Active vulnerability indicators (e.g. `grief`, `financial_stress`).
    /// Any entry caps commerce scoring for the turn.
    #[serde(default)]
    pub vulnerability_indicators: Vec<String>,
}

/// The current turn's classified intent, as produced upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnIntent {
    /// Free-form intent label (not interpreted by the engine).
    pub label: String,
    /// Whether the user explicitly asked for a commerce action this turn.
    /// Required for commerce to ever become primary.
    #[serde(default)]
    pub explicit_commerce_request: bool,
}

/// An explicit user priority override for this turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOverride {
    /// Requested domain, by wire name. Validated at the boundary; an
    /// override targeting a boundary-suppressed domain is rejected with
    /// rationale (the boundary wins).
    pub domain: String,
}

/// The full inbound record for one conversational turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnContext {
    /// Session identity, scoping stability state.
    pub session: SessionKey,
    /// When the turn was received.
    pub timestamp: DateTime<Utc>,
    /// Classified intent, if the classifier produced one.
    #[serde(default)]
    pub intent: Option<TurnIntent>,
    /// Explicit user priority override, if any.
    #[serde(default)]
    pub user_override: Option<UserOverride>,
    /// Situational engine output.
    #[serde(default)]
    pub situational: Option<SituationalContext>,
    /// Social engine output.
    #[serde(default)]
    pub social: Option<ActivationFragment>,
    /// Financial engine output (feeds commerce).
    #[serde(default)]
    pub financial: Option<ActivationFragment>,
    /// Health-capacity engine output.
    #[serde(default)]
    pub health: Option<HealthContext>,
    /// Learning-style engine output.
    #[serde(default)]
    pub learning: Option<ActivationFragment>,
    /// Taste/lifestyle engine output (feeds exploration).
    #[serde(default)]
    pub taste: Option<ActivationFragment>,
    /// Goals/trajectory engine output.
    #[serde(default)]
    pub goals: Option<GoalsContext>,
    /// Boundaries/consent engine output.
    #[serde(default)]
    pub boundaries: Option<BoundaryContext>,
}

impl TurnContext {
    /// Build an empty turn context for a session at a given time. All
    /// fragments start absent; the aggregator will default them.
    pub fn new(session: SessionKey, timestamp: DateTime<Utc>) -> Self {
        Self {
            session,
            timestamp,
            intent: None,
            user_override: None,
            situational: None,
            social: None,
            financial: None,
            health: None,
            learning: None,
            taste: None,
            goals: None,
            boundaries: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_of_day_buckets() {
        assert_eq!(TimeOfDay::from_hour(6), TimeOfDay::Morning);
        assert_eq!(TimeOfDay::from_hour(13), TimeOfDay::Afternoon);
        assert_eq!(TimeOfDay::from_hour(19), TimeOfDay::Evening);
        assert_eq!(TimeOfDay::from_hour(23), TimeOfDay::Night);
        assert_eq!(TimeOfDay::from_hour(3), TimeOfDay::Night);
    }

    #[test]
    fn test_session_key_display() {
        let key = SessionKey::new("acme", "alice", "s-1");
        assert_eq!(key.to_string(), "acme/alice/s-1");
    }

    #[test]
    fn test_turn_context_starts_empty() {
        let ctx = TurnContext::new(SessionKey::new("acme", "alice", "s-1"), Utc::now());
        assert!(ctx.health.is_none());
        assert!(ctx.boundaries.is_none());
        assert!(ctx.user_override.is_none());
    }
}
