//! Infrastructure: configuration, logging, and state storage adapters.

pub mod config;
pub mod logging;
pub mod stability_store;

pub use config::{ConfigError, ConfigLoader};
pub use logging::Logging;
pub use stability_store::InMemoryStabilityStore;
