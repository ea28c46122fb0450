//! Domain models for priority arbitration.

pub mod config;
pub mod conflict;
pub mod context;
pub mod domain;
pub mod plan;
pub mod resolution;
pub mod score;
pub mod signal;
pub mod stability;

pub use config::{ArbiterConfig, AuditConfig, BaseWeights, LoggingConfig, TenantOverrides};
pub use conflict::{ConflictType, DomainConflict};
pub use context::{
    ActivationFragment, BoundaryContext, DayType, GoalsContext, HealthContext, SafetyFlag,
    SafetySeverity, SessionKey, SituationalContext, TimeOfDay, TurnContext, TurnIntent,
    UserOverride,
};
pub use domain::PriorityDomain;
pub use plan::{
    DeferredDomain, PlanConstraints, ResolvedActionPlan, SuggestedDepth, SuggestedPacing,
    SuppressedDomain,
};
pub use resolution::{ConflictResolution, ResolutionStrategy, TimeSplit};
pub use score::{DomainPriorityScore, ScoreAdjustment};
pub use signal::{DomainSignal, Urgency, SAFETY_CRITICAL_FLAG};
pub use stability::{StabilityState, StabilityStatus};
