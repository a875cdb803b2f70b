//! Claim processing result aggregate
//!
//! The shape mirrors what the multi-agent backend returns for one claim:
//! the extracted claim facts, the risk report and the routing decision,
//! plus the backend's processing log.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use core_kernel::ClaimKey;

/// Structured facts extracted from the claim description by the intake stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimFacts {
    pub claim_id: String,
    #[serde(rename = "type")]
    pub claim_type: String,
    /// Incident date as reported by the backend
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
}

/// Output of the risk assessment stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskReport {
    pub claim_id: String,
    /// Score on the backend's 0-10 scale
    pub risk_score: f64,
    /// Free-form label, usually "Low", "Medium" or "High"
    pub category: String,
    pub reasons: Vec<String>,
}

impl RiskReport {
    /// Buckets the numeric score into a display level
    pub fn level(&self) -> RiskLevel {
        RiskLevel::from_score(self.risk_score)
    }
}

/// Output of the routing stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingDecision {
    pub claim_id: String,
    pub processing_path: String,
    pub priority: String,
    pub adjuster_tier: String,
    #[serde(deserialize_with = "text_or_lines")]
    pub rationale: String,
}

/// Aggregate record the backend produces for one claim
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimProcessingResult {
    pub claim: ClaimFacts,
    pub risk_report: RiskReport,
    pub routing_decision: RoutingDecision,
    pub logs: Vec<String>,
}

impl ClaimProcessingResult {
    /// Returns the backend-assigned key, if the intake stage produced one
    pub fn claim_key(&self) -> Option<ClaimKey> {
        ClaimKey::new(self.claim.claim_id.as_str()).ok()
    }

    /// Lists the sub-records whose claim id disagrees with `claim.claim_id`
    ///
    /// Blank ids on the sub-records are not counted as disagreement.
    pub fn mismatched_ids(&self) -> Vec<&'static str> {
        let expected = self.claim.claim_id.trim();
        let mut mismatched = Vec::new();
        let risk = self.risk_report.claim_id.trim();
        if !risk.is_empty() && risk != expected {
            mismatched.push("risk_report");
        }
        let routing = self.routing_decision.claim_id.trim();
        if !routing.is_empty() && routing != expected {
            mismatched.push("routing_decision");
        }
        mismatched
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_report.level()
    }
}

/// Display bucket for a risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Scores up to 3 are low, up to 6 medium, anything above is high
    pub fn from_score(score: f64) -> Self {
        if score <= 3.0 {
            RiskLevel::Low
        } else if score <= 6.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        };
        f.pad(label)
    }
}

fn text_or_lines<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Rationale {
        Text(String),
        Lines(Vec<String>),
    }

    Ok(match Option::<Rationale>::deserialize(deserializer)? {
        Some(Rationale::Text(text)) => text,
        Some(Rationale::Lines(lines)) => lines.join("; "),
        None => String::new(),
    })
}
