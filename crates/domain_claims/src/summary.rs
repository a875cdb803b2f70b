//! Claim history rows

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::ClaimKey;

use crate::claim::{ClaimProcessingResult, RiskLevel};
use crate::submission::ClaimSubmission;

const HIGH_AMOUNT: Decimal = dec!(10000);
const MEDIUM_AMOUNT: Decimal = dec!(3000);

/// Outcome shown for a claim in the history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimDisposition {
    Approved,
    Rejected,
    /// The backend could not process the claim
    ManualReview,
}

impl ClaimDisposition {
    pub fn from_risk(level: RiskLevel) -> Self {
        match level {
            RiskLevel::High => ClaimDisposition::Rejected,
            RiskLevel::Medium | RiskLevel::Low => ClaimDisposition::Approved,
        }
    }
}

impl fmt::Display for ClaimDisposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimDisposition::Approved => f.pad("approved"),
            ClaimDisposition::Rejected => f.pad("rejected"),
            ClaimDisposition::ManualReview => f.pad("manual review"),
        }
    }
}

/// One row of the claim history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimSummary {
    pub claim_id: ClaimKey,
    #[serde(rename = "type")]
    pub claim_type: String,
    pub amount: Decimal,
    /// Date the claim was processed
    pub date: NaiveDate,
    pub status: ClaimDisposition,
    pub risk_level: RiskLevel,
    pub customer_id: String,
}

impl ClaimSummary {
    /// Summarises a stored result using the facts the backend extracted
    pub fn from_result(key: ClaimKey, result: &ClaimProcessingResult, date: NaiveDate) -> Self {
        let risk_level = result.risk_level();
        Self {
            claim_id: key,
            claim_type: result.claim.claim_type.clone(),
            amount: result.claim.amount,
            date,
            status: ClaimDisposition::from_risk(risk_level),
            risk_level,
            customer_id: result.claim.customer_id.clone(),
        }
    }

    /// Summarises a processed submission, keeping the form's own facts
    pub fn for_submission(
        key: ClaimKey,
        submission: &ClaimSubmission,
        result: &ClaimProcessingResult,
        date: NaiveDate,
    ) -> Self {
        let risk_level = result.risk_level();
        Self {
            claim_id: key,
            claim_type: submission.claim_type.clone(),
            amount: submission.amount,
            date,
            status: ClaimDisposition::from_risk(risk_level),
            risk_level,
            customer_id: submission.customer_id.clone(),
        }
    }

    /// Row for a submission the backend could not process
    ///
    /// Risk is estimated from the claimed amount alone.
    pub fn manual_review(key: ClaimKey, submission: &ClaimSubmission, date: NaiveDate) -> Self {
        let risk_level = if submission.amount > HIGH_AMOUNT {
            RiskLevel::High
        } else if submission.amount > MEDIUM_AMOUNT {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };
        Self {
            claim_id: key,
            claim_type: submission.claim_type.clone(),
            amount: submission.amount,
            date,
            status: ClaimDisposition::ManualReview,
            risk_level,
            customer_id: submission.customer_id.clone(),
        }
    }
}
