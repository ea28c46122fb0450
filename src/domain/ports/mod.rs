//! Port trait definitions (Hexagonal Architecture).
//!
//! Async trait interfaces that infrastructure adapters implement. The
//! engine depends on these contracts, not on the in-memory defaults
//! shipped under `infrastructure`.

pub mod stability_store;

pub use stability_store::StabilityStore;
