//! Integration tests for the sync job rescue path
//!
//! Wires the real orchestrator, breaker, tracker, policy and sink around a
//! scripted provider and the in-memory dead-letter store.

mod support;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use syncward_common::resilience::{CircuitBreaker, CircuitBreakerConfig, MockClock};
use syncward_core::{DeadLetterSink, ErrorTracker, RetryPolicy, SyncJob, SyncOrchestrator};
use syncward_domain::{
    DeadLetterSettings, ErrorKind, JobContext, JobOutcome, RetrySettings, SyncError, SyncOptions,
    SyncReport, SyncType,
};

use support::providers::ScriptedProvider;
use support::stores::{InMemoryFailedJobStore, RecordingNotifier};

struct Harness {
    job: SyncJob<MockClock>,
    provider: Arc<ScriptedProvider>,
    tracker: Arc<ErrorTracker>,
    store: Arc<InMemoryFailedJobStore>,
    notifier: Arc<RecordingNotifier>,
    sink: Arc<DeadLetterSink>,
    clock: MockClock,
}

impl Harness {
    fn new(provider: ScriptedProvider) -> Self {
        Self::with_critical(provider, &[])
    }

    fn with_critical(provider: ScriptedProvider, critical: &[&str]) -> Self {
        let provider = Arc::new(provider);
        let clock = MockClock::new();
        let breaker = CircuitBreaker::with_clock(
            CircuitBreakerConfig::builder()
                .failure_threshold(5)
                .timeout(Duration::from_secs(60))
                .build()
                .expect("valid breaker config"),
            clock.clone(),
        )
        .expect("breaker builds");
        let tracker = Arc::new(ErrorTracker::default());
        let store = InMemoryFailedJobStore::new();
        let notifier = RecordingNotifier::new();
        let sink = Arc::new(DeadLetterSink::new(
            store.clone(),
            notifier.clone(),
            DeadLetterSettings {
                critical_job_classes: critical.iter().map(|c| (*c).to_string()).collect::<BTreeSet<_>>(),
                ..DeadLetterSettings::default()
            },
        ));
        let orchestrator = SyncOrchestrator::new(provider.clone(), breaker, Arc::clone(&tracker));
        let job = SyncJob::new(
            orchestrator,
            Arc::clone(&tracker),
            RetryPolicy::new(RetrySettings::default()),
            Arc::clone(&sink),
        );
        Self { job, provider, tracker, store, notifier, sink, clock }
    }

    fn ctx(executions: u32) -> JobContext {
        JobContext {
            job_id: "job-42".to_string(),
            executions,
            arguments: SyncJob::<MockClock>::arguments(SyncType::Initial, &SyncOptions::with_limit(10)),
        }
    }
}

/// Validates the partial-failure scenario.
///
/// # Test Steps
/// 1. Provider returns 8 valid and 2 failing records
/// 2. `perform("initial", limit 10)` completes without aborting
/// 3. The report is 8 synced and 2 errors, both tracked
#[tokio::test(flavor = "multi_thread")]
async fn test_initial_sync_reports_partial_failures() {
    let harness = Harness::new(ScriptedProvider::with_records(8, 2));

    let outcome = harness
        .job
        .run(&Harness::ctx(0), "initial", &SyncOptions::with_limit(10))
        .await
        .expect("run succeeds");

    assert_eq!(outcome, JobOutcome::Completed(SyncReport { synced: 8, errors: 2 }));
    assert_eq!(harness.provider.sync_calls(), 10);
    assert_eq!(harness.tracker.error_summary().total_errors, 2);
    assert!(harness.store.rows().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_sync_type_never_reaches_provider() {
    let harness = Harness::new(ScriptedProvider::with_records(3, 0));

    let err = harness.job.perform("everything", &SyncOptions::default()).await.expect_err("rejected");

    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(harness.provider.list_calls(), 0);
}

/// Argument errors take the generic bucket: three retries, then dead-letter.
#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_sync_type_is_retried_then_dead_lettered() {
    let harness = Harness::new(ScriptedProvider::with_records(3, 0));

    for executions in 0..3 {
        let outcome = harness
            .job
            .run(&Harness::ctx(executions), "everything", &SyncOptions::default())
            .await
            .expect("run succeeds");
        assert_eq!(
            outcome,
            JobOutcome::RetryScheduled { delay_secs: 2_u64.pow(executions), executions: executions + 1 }
        );
    }

    let outcome = harness
        .job
        .run(&Harness::ctx(3), "everything", &SyncOptions::default())
        .await
        .expect("run succeeds");
    match outcome {
        JobOutcome::DeadLettered(record) => {
            assert_eq!(record.error_kind, "ArgumentError");
            assert_eq!(record.executions, 4);
        }
        other => panic!("expected dead letter, got {other:?}"),
    }
}

/// Network failures retry with backoff for executions 0..=4, then escalate.
#[tokio::test(flavor = "multi_thread")]
async fn test_network_failures_escalate_after_five_executions() {
    let harness = Harness::new(ScriptedProvider::failing_listing(SyncError::network("timeout")));

    for executions in 0..5 {
        harness.clock.advance(Duration::from_secs(61));
        let outcome = harness
            .job
            .run(&Harness::ctx(executions), "initial", &SyncOptions::default())
            .await
            .expect("run succeeds");
        assert_eq!(
            outcome,
            JobOutcome::RetryScheduled { delay_secs: 2_u64.pow(executions), executions: executions + 1 }
        );
    }

    harness.clock.advance(Duration::from_secs(61));
    let outcome = harness
        .job
        .run(&Harness::ctx(5), "initial", &SyncOptions::default())
        .await
        .expect("run succeeds");

    assert!(matches!(outcome, JobOutcome::DeadLettered(ref r) if r.error_kind == "NetworkError"));
    let rows = harness.store.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].record.job_id, "job-42");
    assert_eq!(rows[0].record.executions, 6);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_authentication_failure_escalates_and_alerts() {
    let harness = Harness::with_critical(
        ScriptedProvider::failing_listing(SyncError::authentication("refresh token revoked")),
        &["SyncJob"],
    );

    let outcome = harness
        .job
        .run(&Harness::ctx(0), "update", &SyncOptions::default())
        .await
        .expect("run succeeds");

    assert!(matches!(outcome, JobOutcome::DeadLettered(_)));
    assert!(harness.tracker.has_critical_errors());
    assert_eq!(harness.notifier.sent().len(), 1);
    assert_eq!(harness.notifier.sent()[0].error_kind, "AuthenticationError");
}

/// Five failed listings open the breaker; the sixth run is rejected without
/// calling the provider and escalates as `CircuitOpenError`.
#[tokio::test(flavor = "multi_thread")]
async fn test_open_breaker_escalates_without_calling_provider() {
    let harness = Harness::new(ScriptedProvider::failing_listing(SyncError::api("bad gateway", Some(502))));

    for executions in 0..5 {
        let outcome = harness
            .job
            .run(&Harness::ctx(executions), "initial", &SyncOptions::default())
            .await
            .expect("run succeeds");
        assert!(!outcome.is_terminal());
    }
    assert_eq!(harness.provider.list_calls(), 5);

    let outcome = harness
        .job
        .run(&Harness::ctx(0), "initial", &SyncOptions::default())
        .await
        .expect("run succeeds");

    assert_eq!(harness.provider.list_calls(), 5);
    match outcome {
        JobOutcome::DeadLettered(record) => assert_eq!(record.error_kind, "CircuitOpenError"),
        other => panic!("expected dead letter, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stale_reference_is_discarded_silently() {
    let harness = Harness::new(ScriptedProvider::failing_listing(SyncError::StaleReference {
        message: "account 7 was deleted".to_string(),
    }));

    let outcome = harness
        .job
        .run(&Harness::ctx(0), "update", &SyncOptions::default())
        .await
        .expect("run succeeds");

    assert_eq!(outcome, JobOutcome::Discarded);
    assert!(harness.store.rows().is_empty());
    assert_eq!(harness.tracker.error_summary().total_errors, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_deadlocks_retry_with_growing_wait() {
    let harness = Harness::new(ScriptedProvider::failing_listing(SyncError::Deadlock {
        message: "database table is locked".to_string(),
    }));

    let first = harness.job.run(&Harness::ctx(0), "update", &SyncOptions::default()).await.expect("run");
    let second = harness.job.run(&Harness::ctx(1), "update", &SyncOptions::default()).await.expect("run");
    let third = harness.job.run(&Harness::ctx(2), "update", &SyncOptions::default()).await.expect("run");

    assert_eq!(first, JobOutcome::RetryScheduled { delay_secs: 5, executions: 1 });
    assert_eq!(second, JobOutcome::RetryScheduled { delay_secs: 10, executions: 2 });
    assert!(matches!(third, JobOutcome::DeadLettered(ref r) if r.error_kind == "DeadlockError"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rate_limit_honours_retry_after() {
    let harness = Harness::new(ScriptedProvider::failing_listing(SyncError::rate_limited(
        "quota exhausted",
        Some(120),
    )));

    let outcome = harness.job.run(&Harness::ctx(9), "initial", &SyncOptions::default()).await.expect("run");

    assert_eq!(outcome, JobOutcome::RetryScheduled { delay_secs: 120, executions: 10 });
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dead_letter_persistence_failure_surfaces() {
    let harness = Harness::new(ScriptedProvider::failing_listing(SyncError::authentication("nope")));
    harness.store.fail_inserts();

    let result = harness.job.run(&Harness::ctx(0), "initial", &SyncOptions::default()).await;

    assert!(result.is_err());
    harness.sink.wait_for_pruning().await.expect("no pending prunes");
}
