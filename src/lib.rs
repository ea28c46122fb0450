//! Arbiter - Domain Priority Resolution & Conflict Arbitration Engine
//!
//! Arbiter decides, for each conversational turn of a personal-assistant
//! platform, which life domain leads the response and how competing
//! domains are reconciled. It is fully deterministic: the same turn
//! context, configuration, and session state always produce the same
//! resolved plan.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Pure models, errors, and ports
//! - **Service Layer** (`services`): The arbitration pipeline
//! - **Infrastructure Layer** (`infrastructure`): Config, logging, and state storage adapters
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use arbiter::{ArbitrationEngine, InMemoryStabilityStore};
//! use arbiter::services::AuditLogService;
//! use arbiter::domain::models::{ArbiterConfig, SessionKey, TurnContext};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ArbiterConfig::default();
//!     let audit = Arc::new(AuditLogService::new(config.audit.clone()));
//!     let engine = ArbitrationEngine::new(
//!         Arc::new(InMemoryStabilityStore::new()),
//!         audit,
//!         config,
//!     );
//!     let ctx = TurnContext::new(
//!         SessionKey::new("tenant", "user", "session"),
//!         chrono::Utc::now(),
//!     );
//!     let response = engine.arbitrate(&ctx).await;
//!     println!("primary: {}", response.resolved_plan.primary_domain.as_str());
//!     Ok(())
//! }
//! ```

pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{ArbitrationError, InputRejection, ValidationError};
pub use domain::models::{
    ArbiterConfig, BaseWeights, ConflictResolution, ConflictType, DomainConflict,
    DomainPriorityScore, DomainSignal, PriorityDomain, ResolutionStrategy, ResolvedActionPlan,
    SessionKey, StabilityState, TurnContext, Urgency,
};
pub use domain::ports::StabilityStore;
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use infrastructure::stability_store::InMemoryStabilityStore;
pub use services::{ArbitrationEngine, ArbitrationResponse, AuditLogService};
