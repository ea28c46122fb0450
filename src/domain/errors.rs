//! Domain-level errors.
//!
//! Validation failures are typed results, never panics, and the malformed
//! input is carried in the error so rejections can be surfaced verbatim in
//! the audit trail.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::models::domain::PriorityDomain;

/// Boundary validation failure for inbound context.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// An upstream fragment named a domain the engine does not know.
    #[error("Unknown domain identifier '{value}' in {field}")]
    UnknownDomain {
        /// Which inbound field carried the identifier.
        field: String,
        /// The offending identifier.
        value: String,
    },

    /// A user override targeted a domain an active boundary rule suppresses.
    /// The boundary wins; the override is rejected, not silently dropped.
    #[error("Override for {domain} rejected: {reason}")]
    OverrideRejected {
        /// The override's target.
        domain: PriorityDomain,
        /// Why the boundary wins.
        reason: String,
    },

    /// A numeric field fell outside its documented range.
    #[error("{field} out of range: {value} (expected {min}..={max})")]
    OutOfRange {
        /// Field name.
        field: String,
        /// Offending value.
        value: f64,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
}

/// Serializable record of a rejected input, surfaced in the response and
/// mirrored to the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRejection {
    /// Short machine code (e.g. `unknown_domain`).
    pub code: String,
    /// Human-readable description of the rejection.
    pub message: String,
}

impl From<&ValidationError> for InputRejection {
    fn from(err: &ValidationError) -> Self {
        let code = match err {
            ValidationError::UnknownDomain { .. } => "unknown_domain",
            ValidationError::OverrideRejected { .. } => "override_rejected",
            ValidationError::OutOfRange { .. } => "out_of_range",
        };
        Self {
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

/// Faults inside the arbitration pipeline. All of these route to the
/// fallback chain; none escape to the caller as a hard failure.
#[derive(Error, Debug)]
pub enum ArbitrationError {
    /// The computation exceeded the configured budget.
    #[error("Arbitration exceeded compute budget of {budget_ms}ms")]
    ComputeBudgetExceeded {
        /// Configured budget.
        budget_ms: u64,
    },

    /// An internal invariant did not hold (reported, then recovered via
    /// fallback).
    #[error("Internal arbitration fault: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_codes() {
        let err = ValidationError::UnknownDomain {
            field: "boundaries.suppressed_domains".to_string(),
            value: "finance".to_string(),
        };
        let rejection = InputRejection::from(&err);
        assert_eq!(rejection.code, "unknown_domain");
        assert!(rejection.message.contains("finance"));
    }

    #[test]
    fn test_override_rejection_names_reason() {
        let err = ValidationError::OverrideRejected {
            domain: PriorityDomain::CommerceMonetization,
            reason: "consent_opted_out".to_string(),
        };
        assert!(err.to_string().contains("consent_opted_out"));
        assert_eq!(InputRejection::from(&err).code, "override_rejected");
    }
}
