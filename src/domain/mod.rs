//! Domain layer for the arbitration engine.
//!
//! Pure models, typed errors, and the port traits infrastructure adapters
//! implement. Nothing in this layer performs I/O.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{ArbitrationError, InputRejection, ValidationError};
