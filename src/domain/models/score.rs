//! Priority score model.
//!
//! One `DomainPriorityScore` per domain per turn, carrying the full ordered
//! adjustment trail so every final score is explainable after the fact.
//! Scores live only as long as the turn's audit entry.

use serde::{Deserialize, Serialize};

use super::domain::PriorityDomain;

/// A single applied adjustment, in rule-declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreAdjustment {
    /// Identifier of the rule that fired (e.g. `critical_safety`).
    pub rule_id: String,
    /// Human-readable reason for the delta.
    pub reason: String,
    /// Signed change applied to the running score.
    pub delta: f64,
}

/// Final prioritization result for one domain on one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainPriorityScore {
    /// The scored domain.
    pub domain: PriorityDomain,
    /// Weighted activation before any adjustment rules ran.
    pub base_score: f64,
    /// Final score after all adjustments, clamped to 0-100.
    pub final_score: f64,
    /// Adjustments in the order they were applied.
    pub adjustments: Vec<ScoreAdjustment>,
    /// Whether the domain is suppressed for the turn (boundary/consent or
    /// tenant kill-switch). Suppressed domains can never be primary or
    /// secondary.
    pub suppressed: bool,
    /// Why the domain was suppressed, when it was.
    pub suppression_reason: Option<String>,
}

impl DomainPriorityScore {
    /// Start a score at its weighted base, with no adjustments.
    pub fn new(domain: PriorityDomain, base_score: f64) -> Self {
        Self {
            domain,
            base_score,
            final_score: base_score.clamp(0.0, 100.0),
            adjustments: Vec::new(),
            suppressed: false,
            suppression_reason: None,
        }
    }

    /// Apply an adjustment, recording it and re-clamping the final score.
    pub fn adjust(&mut self, rule_id: &str, reason: impl Into<String>, delta: f64) {
        if delta == 0.0 {
            return;
        }
        self.final_score = (self.final_score + delta).clamp(0.0, 100.0);
        self.adjustments.push(ScoreAdjustment {
            rule_id: rule_id.to_string(),
            reason: reason.into(),
            delta,
        });
    }

    /// Force the final score to an exact value, recording the delta.
    pub fn force_to(&mut self, rule_id: &str, reason: impl Into<String>, target: f64) {
        let delta = target.clamp(0.0, 100.0) - self.final_score;
        self.adjust(rule_id, reason, delta);
    }

    /// Mark the domain suppressed and zero its score.
    pub fn suppress(&mut self, rule_id: &str, reason: impl Into<String>) {
        let reason = reason.into();
        self.force_to(rule_id, reason.clone(), 0.0);
        self.suppressed = true;
        self.suppression_reason = Some(reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjust_clamps_and_records() {
        let mut score = DomainPriorityScore::new(PriorityDomain::SocialRelationships, 70.0);
        score.adjust("test_rule", "boost", 50.0);
        assert_eq!(score.final_score, 100.0);
        assert_eq!(score.adjustments.len(), 1);
        assert_eq!(score.adjustments[0].rule_id, "test_rule");
    }

    #[test]
    fn test_force_to_records_exact_delta() {
        let mut score = DomainPriorityScore::new(PriorityDomain::CommerceMonetization, 18.0);
        score.force_to("vulnerability_guard", "commerce capped", 10.0);
        assert_eq!(score.final_score, 10.0);
        assert_eq!(score.adjustments[0].delta, -8.0);
    }

    #[test]
    fn test_suppress_zeroes_and_flags() {
        let mut score = DomainPriorityScore::new(PriorityDomain::CommerceMonetization, 12.0);
        score.suppress("boundary_suppression", "consent_opted_out");
        assert!(score.suppressed);
        assert_eq!(score.final_score, 0.0);
        assert_eq!(
            score.suppression_reason.as_deref(),
            Some("consent_opted_out")
        );
    }

    #[test]
    fn test_zero_delta_not_recorded() {
        let mut score = DomainPriorityScore::new(PriorityDomain::LearningGrowth, 60.0);
        score.adjust("noop", "nothing", 0.0);
        assert!(score.adjustments.is_empty());
    }
}
