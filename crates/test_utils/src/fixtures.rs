//! Pre-built Test Fixtures
//!
//! Provides ready-to-use claim data shaped like the processing backend's
//! output. These fixtures are consistent and predictable for unit tests.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal_macros::dec;
use serde_json::json;

use core_kernel::ClaimKey;
use domain_claims::{
    ClaimFacts, ClaimProcessingResult, ClaimSubmission, RiskReport, RoutingDecision,
    StreamResult,
};

/// Fixture for claim processing data
pub struct ClaimFixtures;

impl ClaimFixtures {
    /// Claim id used by the standard results
    pub const CLAIM_ID: &'static str = "CLM-2024-001";

    /// Second claim id for multi-entry tests
    pub const OTHER_CLAIM_ID: &'static str = "CLM-2024-002";

    pub fn claim_key() -> ClaimKey {
        ClaimKey::new(Self::CLAIM_ID).unwrap()
    }

    pub fn other_claim_key() -> ClaimKey {
        ClaimKey::new(Self::OTHER_CLAIM_ID).unwrap()
    }

    /// Fixed submission timestamp
    pub fn submitted_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap()
    }

    /// Claim facts for a minor rear-end collision
    pub fn claim_facts(claim_id: &str) -> ClaimFacts {
        ClaimFacts {
            claim_id: claim_id.to_string(),
            claim_type: "auto_collision".to_string(),
            date: "2024-03-14".to_string(),
            amount: dec!(2800.00),
            description: "Rear-ended at a traffic light, bumper damage".to_string(),
            customer_id: "CUST-1001".to_string(),
            policy_number: "POL-AUTO-7781".to_string(),
            incident_location: "Main St & 3rd Ave".to_string(),
            police_report: Some("PR-55821".to_string()),
            injuries_reported: false,
            other_party_involved: true,
            timestamp_submitted: "2024-03-15T14:30:00.000Z".to_string(),
            customer_tenure_days: 1460,
            previous_claims_count: 0,
        }
    }

    /// Result for a low-risk claim routed to fast track
    pub fn low_risk_result() -> ClaimProcessingResult {
        Self::low_risk_result_for(Self::CLAIM_ID)
    }

    pub fn low_risk_result_for(claim_id: &str) -> ClaimProcessingResult {
        ClaimProcessingResult {
            claim: Self::claim_facts(claim_id),
            risk_report: RiskReport {
                claim_id: claim_id.to_string(),
                risk_score: 2.0,
                category: "Low".to_string(),
                reasons: vec![
                    "Long customer tenure".to_string(),
                    "No prior claims".to_string(),
                ],
            },
            routing_decision: RoutingDecision {
                claim_id: claim_id.to_string(),
                processing_path: "Fast Track".to_string(),
                priority: "Low".to_string(),
                adjuster_tier: "Tier 1".to_string(),
                rationale: "Low risk claim with police report".to_string(),
            },
            logs: vec![
                "Intake Agent: claim extracted".to_string(),
                "Risk Agent: score 2".to_string(),
                "Routing Agent: Fast Track".to_string(),
            ],
        }
    }

    /// Result for a high-risk claim sent to investigation
    pub fn high_risk_result() -> ClaimProcessingResult {
        let claim_id = Self::OTHER_CLAIM_ID;
        let mut claim = Self::claim_facts(claim_id);
        claim.amount = dec!(48000.00);
        claim.injuries_reported = true;
        claim.police_report = None;
        claim.previous_claims_count = 4;

        ClaimProcessingResult {
            claim,
            risk_report: RiskReport {
                claim_id: claim_id.to_string(),
                risk_score: 8.5,
                category: "High".to_string(),
                reasons: vec![
                    "High claim amount".to_string(),
                    "Multiple prior claims".to_string(),
                    "No police report".to_string(),
                ],
            },
            routing_decision: RoutingDecision {
                claim_id: claim_id.to_string(),
                processing_path: "Special Investigation Unit".to_string(),
                priority: "High".to_string(),
                adjuster_tier: "Senior".to_string(),
                rationale: "High risk score requires investigation".to_string(),
            },
            logs: vec!["Routing Agent: SIU".to_string()],
        }
    }

    /// Backend response with no claim id
    pub fn result_without_id() -> ClaimProcessingResult {
        let mut result = Self::low_risk_result();
        result.claim.claim_id = String::new();
        result.risk_report.claim_id = String::new();
        result.routing_decision.claim_id = String::new();
        result
    }

    /// Standard claim form
    pub fn submission() -> ClaimSubmission {
        ClaimSubmission {
            customer_id: "CUST-1001".to_string(),
            claim_type: "auto_collision".to_string(),
            policy_number: "POL-AUTO-7781".to_string(),
            amount: dec!(2800.00),
            date: NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
            location: "Main St & 3rd Ave".to_string(),
            police_report: Some("PR-55821".to_string()),
            injuries: false,
            description: "Rear-ended at a traffic light, bumper damage".to_string(),
        }
    }

    /// One event per pipeline stage for `low_risk_result`
    pub fn stream_events() -> Vec<StreamResult> {
        let result = Self::low_risk_result();
        let event = |node: &str, data: serde_json::Value| -> StreamResult {
            serde_json::from_value(json!({ "node": node, "data": data })).unwrap()
        };
        vec![
            event("intake", serde_json::to_value(&result.claim).unwrap()),
            event(
                "risk_assessment",
                json!({ "risk_assessment_report": result.risk_report }),
            ),
            event(
                "routing",
                json!({ "routing_decision_report": result.routing_decision }),
            ),
        ]
    }

    /// NDJSON body for `stream_events`, one event per line
    pub fn ndjson_body() -> String {
        Self::stream_events()
            .iter()
            .map(|event| serde_json::to_string(event).unwrap() + "\n")
            .collect()
    }
}
