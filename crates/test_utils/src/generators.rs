//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating claim results and for
//! splitting stream bodies into arbitrary chunks.

use proptest::prelude::*;
use rust_decimal::Decimal;

use core_kernel::ClaimKey;
use domain_claims::ClaimProcessingResult;

use crate::builders::ClaimResultBuilder;

/// Strategy for claim keys in the backend's `CLM-<year>-<n>` style
fn claim_key_strategy() -> impl Strategy<Value = ClaimKey> {
    (2020u32..2030, 1u32..100_000)
        .prop_map(|(year, n)| ClaimKey::new(format!("CLM-{year}-{n:03}")).unwrap())
}

/// Strategy for risk scores on the 0-10 scale, in tenths
fn risk_score_strategy() -> impl Strategy<Value = f64> {
    (0u32..=100).prop_map(|tenths| f64::from(tenths) / 10.0)
}

/// Strategy for claim amounts with cents
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for complete, self-consistent claim results
pub fn claim_result_strategy() -> impl Strategy<Value = ClaimProcessingResult> {
    (
        claim_key_strategy(),
        risk_score_strategy(),
        amount_strategy(),
        prop::collection::vec("[A-Za-z ]{1,30}", 0..4),
    )
        .prop_map(|(key, score, amount, logs)| {
            logs.into_iter().fold(
                ClaimResultBuilder::new()
                    .with_claim_id(key.as_str())
                    .with_risk_score(score)
                    .with_amount(amount),
                |builder, line| builder.with_log(line),
            )
            .build()
        })
}

/// Strategy for cut points that split a body of `len` bytes into chunks
///
/// Returns sorted, deduplicated offsets strictly inside the body.
pub fn chunk_boundaries_strategy(len: usize) -> impl Strategy<Value = Vec<usize>> {
    let upper = len.max(2);
    prop::collection::vec(1..upper, 0..8).prop_map(move |mut cuts| {
        cuts.retain(|&cut| cut < len);
        cuts.sort_unstable();
        cuts.dedup();
        cuts
    })
}

/// Splits `body` at the given byte offsets
pub fn split_at_boundaries(body: &[u8], cuts: &[usize]) -> Vec<Vec<u8>> {
    let mut chunks = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for &cut in cuts {
        chunks.push(body[start..cut].to_vec());
        start = cut;
    }
    chunks.push(body[start..].to_vec());
    chunks
}
