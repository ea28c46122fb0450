//! Service layer: the arbitration pipeline and its supporting services.

pub mod arbitration_engine;
pub mod audit_log;
pub mod conflict_detector;
pub mod conflict_resolver;
pub mod plan_builder;
pub mod priority_scorer;
pub mod signal_aggregator;
pub mod stability_controller;

pub use arbitration_engine::{ArbitrationEngine, ArbitrationResponse, ComputationMetadata};
pub use audit_log::{AuditLogService, AuditSink};
pub use conflict_detector::ConflictDetector;
pub use conflict_resolver::ConflictResolver;
pub use plan_builder::PlanBuilder;
pub use priority_scorer::PriorityScorer;
pub use signal_aggregator::{SignalAggregator, SignalSet};
pub use stability_controller::{StabilityController, StabilityDecision};
