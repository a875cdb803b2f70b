//! Streaming pipeline events
//!
//! The streaming endpoint emits one `StreamResult` per pipeline node as the
//! node finishes. Each event's `data` is whatever the node produced; the
//! typed views below pull the well-known sections out of it.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::claim::{ClaimFacts, ClaimProcessingResult, RiskReport, RoutingDecision};
use crate::error::ClaimError;

/// One event of the NDJSON processing stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamResult {
    pub node: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Map<String, Value>,
}

/// Nodes with nothing to report send `"data": null`
fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

impl StreamResult {
    pub fn new(node: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            node: node.into(),
            data,
        }
    }

    pub fn stage(&self) -> PipelineStage {
        PipelineStage::from_node(&self.node)
    }

    /// Claim facts from an intake event, either under `claim` or at the top level
    pub fn claim_facts(&self) -> Result<ClaimFacts, ClaimError> {
        self.decode_section(&["claim"], "claim facts")
    }

    /// Risk report from `risk_assessment_report`, falling back to `data` itself
    pub fn risk_report(&self) -> Result<RiskReport, ClaimError> {
        self.decode_section(&["risk_assessment_report", "risk_report"], "risk report")
    }

    /// Routing decision from `routing_decision_report`, falling back to `data` itself
    pub fn routing_decision(&self) -> Result<RoutingDecision, ClaimError> {
        self.decode_section(
            &["routing_decision_report", "routing_decision"],
            "routing decision",
        )
    }

    fn decode_section<T: DeserializeOwned>(
        &self,
        nested: &[&str],
        section: &'static str,
    ) -> Result<T, ClaimError> {
        let value = nested
            .iter()
            .find_map(|name| match self.data.get(*name) {
                Some(inner @ Value::Object(_)) => Some(inner.clone()),
                _ => None,
            })
            .unwrap_or_else(|| Value::Object(self.data.clone()));

        serde_json::from_value(value).map_err(|source| ClaimError::InvalidStageData {
            node: self.node.clone(),
            section,
            source,
        })
    }
}

/// Pipeline stage a stream node belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    Intake,
    RiskAssessment,
    Routing,
    Other(String),
}

impl PipelineStage {
    /// Classifies a node name, ignoring case
    pub fn from_node(node: &str) -> Self {
        let name = node.to_ascii_lowercase();
        if name.contains("intake") {
            PipelineStage::Intake
        } else if name.contains("risk") {
            PipelineStage::RiskAssessment
        } else if name.contains("routing") {
            PipelineStage::Routing
        } else {
            PipelineStage::Other(node.to_string())
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Intake => f.write_str("intake"),
            PipelineStage::RiskAssessment => f.write_str("risk assessment"),
            PipelineStage::Routing => f.write_str("routing"),
            PipelineStage::Other(node) => f.write_str(node),
        }
    }
}

/// Builds the aggregate result from a complete stream session
///
/// Returns `None` unless intake, risk assessment and routing all reported.
pub fn assemble_result(results: &[StreamResult]) -> Option<ClaimProcessingResult> {
    try_assemble_result(results).ok()
}

/// Like [`assemble_result`], naming the missing stages on failure
///
/// The last event of each stage wins. Events whose data does not decode
/// are ignored as if the stage had not reported.
pub fn try_assemble_result(results: &[StreamResult]) -> Result<ClaimProcessingResult, ClaimError> {
    let mut claim = None;
    let mut risk_report = None;
    let mut routing_decision = None;
    let mut logs = Vec::with_capacity(results.len());

    for result in results {
        let decoded = match result.stage() {
            PipelineStage::Intake => result.claim_facts().map(|facts| claim = Some(facts)),
            PipelineStage::RiskAssessment => {
                result.risk_report().map(|report| risk_report = Some(report))
            }
            PipelineStage::Routing => result
                .routing_decision()
                .map(|decision| routing_decision = Some(decision)),
            PipelineStage::Other(_) => Ok(()),
        };
        if let Err(e) = decoded {
            tracing::warn!(node = %result.node, error = %e, "Ignoring undecodable stage data");
        }
        logs.push(format!("{} completed", result.node));
    }

    match (claim, risk_report, routing_decision) {
        (Some(claim), Some(risk_report), Some(routing_decision)) => Ok(ClaimProcessingResult {
            claim,
            risk_report,
            routing_decision,
            logs,
        }),
        (claim, risk_report, routing_decision) => {
            let mut missing = Vec::new();
            if claim.is_none() {
                missing.push(PipelineStage::Intake);
            }
            if risk_report.is_none() {
                missing.push(PipelineStage::RiskAssessment);
            }
            if routing_decision.is_none() {
                missing.push(PipelineStage::Routing);
            }
            Err(ClaimError::IncompleteStream { missing })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(node: &str, data: Value) -> StreamResult {
        serde_json::from_value(json!({ "node": node, "data": data })).unwrap()
    }

    #[test]
    fn test_stage_classification() {
        assert_eq!(PipelineStage::from_node("intake"), PipelineStage::Intake);
        assert_eq!(PipelineStage::from_node("Intake_Agent"), PipelineStage::Intake);
        assert_eq!(
            PipelineStage::from_node("risk_assessment"),
            PipelineStage::RiskAssessment
        );
        assert_eq!(PipelineStage::from_node("ROUTING"), PipelineStage::Routing);
        assert_eq!(
            PipelineStage::from_node("summary"),
            PipelineStage::Other("summary".to_string())
        );
    }

    #[test]
    fn test_missing_data_defaults_to_empty_object() {
        let result: StreamResult = serde_json::from_str(r#"{"node":"a"}"#).unwrap();
        assert!(result.data.is_empty());
    }

    #[test]
    fn test_null_data_is_empty_object() {
        let result: StreamResult =
            serde_json::from_str(r#"{"node":"summary","data":null}"#).unwrap();
        assert_eq!(result, StreamResult::new("summary", Map::new()));
    }

    #[test]
    fn test_non_object_data_is_rejected() {
        assert!(serde_json::from_str::<StreamResult>(r#"{"node":"a","data":[1]}"#).is_err());
    }

    #[test]
    fn test_risk_report_prefers_nested_section() {
        let result = event(
            "risk_assessment",
            json!({
                "claim_id": "CLM-1",
                "risk_assessment_report": { "claim_id": "CLM-1", "risk_score": 8, "category": "High" }
            }),
        );
        let report = result.risk_report().unwrap();
        assert_eq!(report.risk_score, 8.0);
        assert_eq!(report.category, "High");
    }

    #[test]
    fn test_routing_decision_falls_back_to_data() {
        let result = event(
            "routing",
            json!({ "processing_path": "Fast Track", "priority": "Low" }),
        );
        let decision = result.routing_decision().unwrap();
        assert_eq!(decision.processing_path, "Fast Track");
    }

    #[test]
    fn test_invalid_stage_data_names_node() {
        let result = event("risk", json!({ "risk_score": "very" }));
        let err = result.risk_report().unwrap_err();
        assert!(err.to_string().contains("risk"));
    }

    #[test]
    fn test_assemble_requires_all_stages() {
        let results = vec![
            event("intake", json!({ "claim_id": "CLM-1" })),
            event("routing", json!({ "processing_path": "Standard" })),
        ];
        assert!(assemble_result(&results).is_none());

        match try_assemble_result(&results) {
            Err(ClaimError::IncompleteStream { missing }) => {
                assert_eq!(missing, vec![PipelineStage::RiskAssessment]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
