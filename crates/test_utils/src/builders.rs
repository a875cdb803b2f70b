//! Test Data Builders
//!
//! Builder patterns for constructing claim results with sensible defaults.
//! Tests set only the fields they care about.

use rust_decimal::Decimal;

use domain_claims::{ClaimProcessingResult, RiskLevel};

use crate::fixtures::ClaimFixtures;

/// Builder for claim processing results
///
/// Starts from [`ClaimFixtures::low_risk_result`]. Setting the claim id
/// updates all three sub-records so they stay consistent.
pub struct ClaimResultBuilder {
    result: ClaimProcessingResult,
}

impl Default for ClaimResultBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimResultBuilder {
    pub fn new() -> Self {
        Self {
            result: ClaimFixtures::low_risk_result(),
        }
    }

    /// Sets the claim id on the claim, risk report and routing decision
    pub fn with_claim_id(mut self, claim_id: impl Into<String>) -> Self {
        let claim_id = claim_id.into();
        self.result.risk_report.claim_id = claim_id.clone();
        self.result.routing_decision.claim_id = claim_id.clone();
        self.result.claim.claim_id = claim_id;
        self
    }

    /// Clears the claim id everywhere, as a backend that failed to assign one
    pub fn without_claim_id(self) -> Self {
        self.with_claim_id("")
    }

    pub fn with_claim_type(mut self, claim_type: impl Into<String>) -> Self {
        self.result.claim.claim_type = claim_type.into();
        self
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.result.claim.amount = amount;
        self
    }

    /// Sets the score and a matching category label
    pub fn with_risk_score(mut self, score: f64) -> Self {
        self.result.risk_report.risk_score = score;
        self.result.risk_report.category = match RiskLevel::from_score(score) {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
        .to_string();
        self
    }

    pub fn with_processing_path(mut self, path: impl Into<String>) -> Self {
        self.result.routing_decision.processing_path = path.into();
        self
    }

    pub fn with_log(mut self, line: impl Into<String>) -> Self {
        self.result.logs.push(line.into());
        self
    }

    pub fn build(self) -> ClaimProcessingResult {
        self.result
    }
}
