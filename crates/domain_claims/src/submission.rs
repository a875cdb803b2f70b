//! Claim submissions
//!
//! A submission is what a claimant fills in. The non-streaming endpoint
//! takes it as a natural-language narrative; the streaming endpoint takes a
//! seeded claim-state document built from a free-text description.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Claim form data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSubmission {
    pub customer_id: String,
    /// Claim type code such as `auto_collision`
    #[serde(rename = "type")]
    pub claim_type: String,
    pub policy_number: String,
    pub amount: Decimal,
    pub date: NaiveDate,
    pub location: String,
    #[serde(default)]
    pub police_report: Option<String>,
    #[serde(default)]
    pub injuries: bool,
    pub description: String,
}

impl ClaimSubmission {
    /// Renders the submission as the text the processing backend expects
    pub fn narrative(&self, submitted_at: DateTime<Utc>) -> String {
        let police = match self.police_report.as_deref().map(str::trim) {
            Some(report) if !report.is_empty() => format!("Police report number: {report}."),
            _ => "No police report filed.".to_string(),
        };
        let injuries = if self.injuries {
            "Injuries were reported."
        } else {
            "No injuries reported."
        };

        [
            format!(
                "Customer {} reported {} incident.",
                self.customer_id,
                self.claim_type.replacen('_', " ", 1)
            ),
            format!("Policy number {}.", self.policy_number),
            format!("Estimated loss ${}.", self.amount.normalize()),
            format!(
                "Incident occurred on {} at {}.",
                self.date.format("%Y-%m-%d"),
                self.location
            ),
            police,
            injuries.to_string(),
            format!("Description: {}", self.description),
            format!(
                "Submitted on {}.",
                submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true)
            ),
            "Claim ID should be generated automatically.".to_string(),
        ]
        .join("\n")
    }
}

/// Request body for the streaming endpoint
///
/// Mirrors the backend's claim-state document. Only `claim_description` is
/// meaningful on the way in; the backend fills the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamClaimRequest {
    pub claim_description: String,
    pub claim_id: String,
    #[serde(rename = "type")]
    pub claim_type: String,
    pub date: String,
    pub amount: Decimal,
    pub description: String,
    pub customer_id: String,
    pub policy_number: String,
    pub incident_location: String,
    pub police_report: Option<String>,
    pub injuries_reported: bool,
    pub other_party_involved: bool,
    pub timestamp_submitted: String,
    pub customer_tenure_days: i64,
    pub previous_claims_count: u32,
    #[serde(rename = "claim_Extracted")]
    pub claim_extracted: bool,
    pub risk_assessment_report: Option<Value>,
    pub routing_decision_report: Option<Value>,
}

impl StreamClaimRequest {
    pub fn from_description(description: impl Into<String>) -> Self {
        Self {
            claim_description: description.into(),
            claim_id: String::new(),
            claim_type: String::new(),
            date: String::new(),
            amount: Decimal::ZERO,
            description: String::new(),
            customer_id: String::new(),
            policy_number: String::new(),
            incident_location: String::new(),
            police_report: None,
            injuries_reported: false,
            other_party_involved: false,
            timestamp_submitted: String::new(),
            customer_tenure_days: 0,
            previous_claims_count: 0,
            claim_extracted: false,
            risk_assessment_report: None,
            routing_decision_report: None,
        }
    }
}
