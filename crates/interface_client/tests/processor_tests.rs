//! Streaming processor tests over the scripted backend

use bytes::Bytes;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

use domain_claims::assemble_result;
use interface_client::backend::mock::{MockClaimsBackend, MockFailure};
use interface_client::notify::mock::RecordingNotifier;
use interface_client::{
    ClaimProcessor, DecodedLine, NdjsonDecoder, NotificationLevel, ProcessorSnapshot,
};
use test_utils::{chunk_boundaries_strategy, split_at_boundaries, ClaimFixtures};

fn processor(
    backend: MockClaimsBackend,
) -> (ClaimProcessor, Arc<MockClaimsBackend>, Arc<RecordingNotifier>) {
    let backend = Arc::new(backend);
    let notifier = Arc::new(RecordingNotifier::new());
    (
        ClaimProcessor::new(backend.clone(), notifier.clone()),
        backend,
        notifier,
    )
}

fn node_names(processor: &ClaimProcessor) -> Vec<String> {
    processor
        .snapshot()
        .results
        .into_iter()
        .map(|event| event.node)
        .collect()
}

// ============================================================================
// Successful Stream Tests
// ============================================================================

mod success_tests {
    use super::*;

    #[tokio::test]
    async fn test_partial_lines_across_chunks() {
        let backend = MockClaimsBackend::new().with_stream_chunks([
            "{\"node\":\"intake\",\"data\":{}}\n{\"node\":\"ri",
            "sk\",\"data\":{}}\n",
        ]);
        let (processor, _, notifier) = processor(backend);

        let summary = processor.process_claim("Hail damage").await.unwrap();

        assert_eq!(node_names(&processor), vec!["intake", "risk"]);
        assert_eq!(summary.events, 2);
        assert!(!summary.superseded);
        let snapshot = processor.snapshot();
        assert!(!snapshot.is_processing);
        assert_eq!(snapshot.completed_nodes, vec!["intake", "risk"]);
        let last = notifier.last().unwrap();
        assert_eq!(last.level, NotificationLevel::Success);
        assert_eq!(last.message, "Claim processed successfully!");
    }

    #[tokio::test]
    async fn test_full_pipeline_assembles_result() {
        let backend = MockClaimsBackend::new().with_stream_chunks([ClaimFixtures::ndjson_body()]);
        let (processor, _, _) = processor(backend);

        processor.process_claim("Rear-ended").await.unwrap();

        let snapshot = processor.snapshot();
        assert_eq!(snapshot.results, ClaimFixtures::stream_events());
        let assembled = assemble_result(&snapshot.results).unwrap();
        assert_eq!(assembled.claim, ClaimFixtures::low_risk_result().claim);
        assert_eq!(
            assembled.risk_report,
            ClaimFixtures::low_risk_result().risk_report
        );
    }

    #[tokio::test]
    async fn test_unterminated_last_line_is_applied() {
        let backend = MockClaimsBackend::new()
            .with_stream_chunks(["{\"node\":\"intake\",\"data\":{}}\n{\"node\":\"routing\"}"]);
        let (processor, _, _) = processor(backend);

        let summary = processor.process_claim("text").await.unwrap();

        assert_eq!(summary.events, 2);
        assert_eq!(node_names(&processor), vec!["intake", "routing"]);
    }

    #[tokio::test]
    async fn test_malformed_line_is_skipped() {
        let backend = MockClaimsBackend::new().with_stream_chunks([
            "{\"node\":\"intake\",\"data\":{}}\n{not json}\n\n{\"node\":\"routing\",\"data\":{}}\n",
        ]);
        let (processor, _, notifier) = processor(backend);

        let summary = processor.process_claim("text").await.unwrap();

        assert_eq!(summary.events, 2);
        assert_eq!(summary.skipped_lines, 1);
        assert_eq!(node_names(&processor), vec!["intake", "routing"]);
        assert_eq!(notifier.last().unwrap().level, NotificationLevel::Success);
    }

    #[tokio::test]
    async fn test_repeated_node_is_kept_in_results() {
        let backend = MockClaimsBackend::new().with_stream_chunks([
            "{\"node\":\"intake\",\"data\":{}}\n{\"node\":\"intake\",\"data\":{}}\n",
        ]);
        let (processor, _, _) = processor(backend);

        processor.process_claim("text").await.unwrap();

        let snapshot = processor.snapshot();
        assert_eq!(snapshot.results.len(), 2);
        assert_eq!(snapshot.completed_nodes, vec!["intake"]);
    }

    #[tokio::test]
    async fn test_completed_nodes_keep_arrival_order() {
        let backend = MockClaimsBackend::new().with_stream_chunks([
            "{\"node\":\"routing\",\"data\":{}}\n",
            "{\"node\":\"intake\",\"data\":{}}\n{\"node\":\"routing\",\"data\":{}}\n",
        ]);
        let (processor, _, _) = processor(backend);

        let summary = processor.process_claim("text").await.unwrap();

        assert_eq!(processor.snapshot().completed_nodes, vec!["routing", "intake"]);
        assert_eq!(summary.completed_nodes, vec!["routing", "intake"]);
        assert_eq!(node_names(&processor), vec!["routing", "intake", "routing"]);
    }

    #[tokio::test]
    async fn test_sends_description_only_request() {
        let (processor, backend, _) = processor(MockClaimsBackend::new());

        processor.process_claim("Water leak in kitchen").await.unwrap();

        let requests = backend.stream_requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].claim_description, "Water leak in kitchen");
        assert!(!requests[0].claim_extracted);
        assert!(requests[0].risk_assessment_report.is_none());
    }
}

// ============================================================================
// Failure Tests
// ============================================================================

mod failure_tests {
    use super::*;

    #[tokio::test]
    async fn test_error_status_leaves_results_empty() {
        let backend = MockClaimsBackend::new().with_stream_failure(MockFailure::Status {
            status: 500,
            body: "boom".to_string(),
        });
        let (processor, _, notifier) = processor(backend);

        let err = processor.process_claim("text").await.unwrap_err();

        assert_eq!(err.to_string(), "HTTP error! status: 500, details: boom");
        let snapshot = processor.snapshot();
        assert!(snapshot.results.is_empty());
        assert!(!snapshot.is_processing);
        let last = notifier.last().unwrap();
        assert_eq!(last.level, NotificationLevel::Failure);
        assert_eq!(
            last.message,
            "Connection Error: HTTP error! status: 500, details: boom"
        );
    }

    #[tokio::test]
    async fn test_missing_body_fails() {
        let backend = MockClaimsBackend::new().with_stream_failure(MockFailure::MissingBody);
        let (processor, _, notifier) = processor(backend);

        let err = processor.process_claim("text").await.unwrap_err();

        assert!(err.is_transport());
        assert!(!processor.is_processing());
        assert_eq!(notifier.notifications().len(), 1);
    }

    #[tokio::test]
    async fn test_interruption_keeps_applied_events() {
        let backend = MockClaimsBackend::new().with_stream_interrupted(
            ["{\"node\":\"intake\",\"data\":{}}\n{\"node\":\"ri"],
            MockFailure::Connection("connection reset".to_string()),
        );
        let (processor, _, notifier) = processor(backend);

        let err = processor.process_claim("text").await.unwrap_err();

        assert!(err.to_string().contains("connection reset"));
        assert_eq!(node_names(&processor), vec!["intake"]);
        assert!(!processor.is_processing());
        assert_eq!(notifier.last().unwrap().level, NotificationLevel::Failure);
    }

    #[tokio::test]
    async fn test_new_submission_clears_previous_results() {
        let backend = MockClaimsBackend::new()
            .with_stream_chunks([ClaimFixtures::ndjson_body()])
            .with_stream_failure(MockFailure::Status {
                status: 503,
                body: String::new(),
            });
        let (processor, _, _) = processor(backend);

        processor.process_claim("first").await.unwrap();
        assert_eq!(processor.snapshot().results.len(), 3);

        processor.process_claim("second").await.unwrap_err();

        assert!(processor.snapshot().results.is_empty());
    }
}

// ============================================================================
// Reset Tests
// ============================================================================

mod reset_tests {
    use super::*;

    #[tokio::test]
    async fn test_reset_clears_state() {
        let backend = MockClaimsBackend::new().with_stream_chunks([ClaimFixtures::ndjson_body()]);
        let (processor, _, _) = processor(backend);
        processor.process_claim("text").await.unwrap();

        processor.reset();

        assert_eq!(processor.snapshot(), ProcessorSnapshot::default());
    }

    #[tokio::test]
    async fn test_reset_supersedes_running_stream() {
        let (backend, sender) = MockClaimsBackend::new().with_stream_channel();
        let (processor, _, notifier) = processor(backend);
        let processor = Arc::new(processor);
        let mut updates = processor.subscribe();

        let running = {
            let processor = processor.clone();
            tokio::spawn(async move { processor.process_claim("text").await })
        };

        sender
            .send(Ok(Bytes::from("{\"node\":\"intake\",\"data\":{}}\n")))
            .unwrap();
        tokio::time::timeout(
            Duration::from_secs(5),
            updates.wait_for(|state| state.results.len() == 1),
        )
        .await
        .unwrap()
        .unwrap();

        processor.reset();
        sender
            .send(Ok(Bytes::from("{\"node\":\"routing\",\"data\":{}}\n")))
            .unwrap();
        drop(sender);

        let summary = running.await.unwrap().unwrap();

        assert!(summary.superseded);
        assert_eq!(processor.snapshot(), ProcessorSnapshot::default());
        assert!(notifier.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_processing_flag_visible_while_streaming() {
        let (backend, sender) = MockClaimsBackend::new().with_stream_channel();
        let (processor, _, _) = processor(backend);
        let processor = Arc::new(processor);
        let mut updates = processor.subscribe();

        let running = {
            let processor = processor.clone();
            tokio::spawn(async move { processor.process_claim("text").await })
        };

        tokio::time::timeout(
            Duration::from_secs(5),
            updates.wait_for(|state| state.is_processing),
        )
        .await
        .unwrap()
        .unwrap();
        drop(sender);

        running.await.unwrap().unwrap();
        assert!(!processor.is_processing());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod property_tests {
    use super::*;

    fn decode_all(chunks: &[Vec<u8>]) -> Vec<String> {
        let mut decoder = NdjsonDecoder::new();
        let mut nodes = Vec::new();
        let mut collect = |lines: Vec<DecodedLine>| {
            for line in lines {
                if let DecodedLine::Event(event) = line {
                    nodes.push(event.node);
                }
            }
        };
        for chunk in chunks {
            collect(decoder.push(chunk));
        }
        collect(decoder.finish().into_iter().collect());
        nodes
    }

    proptest! {
        #[test]
        fn test_chunking_does_not_change_events(
            cuts in chunk_boundaries_strategy(ClaimFixtures::ndjson_body().len())
        ) {
            let body = ClaimFixtures::ndjson_body();
            let chunks = split_at_boundaries(body.as_bytes(), &cuts);

            let nodes = decode_all(&chunks);

            prop_assert_eq!(nodes, vec!["intake", "risk_assessment", "routing"]);
        }
    }
}
