//! Runtime wiring.
//!
//! [`SyncRuntime`] owns one instance of every control-layer component and
//! shares the breaker and error tracker between the orchestrator and the
//! job's rescue path.

use std::sync::Arc;
use std::time::Duration;

use syncward_common::resilience::{CircuitBreaker, CircuitBreakerConfig, Clock, SystemClock};
use syncward_core::{
    AlertNotifier, DeadLetterSink, ErrorTracker, FailedJobStore, RetryPolicy, SyncJob,
    SyncOrchestrator, SyncProvider,
};
use syncward_domain::{Config, Result, SyncwardError};
use tracing::info;

use crate::database::{DbManager, SqliteFailedJobRepository};

/// Fully assembled sync control layer.
pub struct SyncRuntime<C: Clock = SystemClock> {
    config: Config,
    db: Arc<DbManager>,
    store: Arc<SqliteFailedJobRepository>,
    tracker: Arc<ErrorTracker>,
    breaker: CircuitBreaker<C>,
    sink: Arc<DeadLetterSink>,
    job: SyncJob<C>,
}

impl<C: Clock> std::fmt::Debug for SyncRuntime<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncRuntime")
            .field("db", &self.db)
            .field("breaker", &self.breaker)
            .field("sink", &self.sink)
            .finish_non_exhaustive()
    }
}

impl SyncRuntime<SystemClock> {
    /// Validate `config`, open the database and wire every component.
    ///
    /// # Errors
    /// Returns `SyncwardError::Config` for invalid settings and
    /// `SyncwardError::Database` if the database cannot be opened or
    /// migrated.
    pub fn build(
        config: Config,
        provider: Arc<dyn SyncProvider>,
        notifier: Arc<dyn AlertNotifier>,
    ) -> Result<Self> {
        Self::build_with_clock(config, provider, notifier, SystemClock)
    }
}

impl<C: Clock> SyncRuntime<C> {
    /// Same as [`SyncRuntime::build`] with an explicit breaker clock.
    ///
    /// # Errors
    /// See [`SyncRuntime::build`].
    pub fn build_with_clock(
        config: Config,
        provider: Arc<dyn SyncProvider>,
        notifier: Arc<dyn AlertNotifier>,
        clock: C,
    ) -> Result<Self> {
        config.validate()?;

        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;
        let store = Arc::new(SqliteFailedJobRepository::new(Arc::clone(&db)));

        let breaker_config = CircuitBreakerConfig::builder()
            .failure_threshold(config.circuit_breaker.failure_threshold)
            .timeout(Duration::from_secs(config.circuit_breaker.timeout_secs))
            .build()
            .map_err(|e| SyncwardError::Config(e.to_string()))?;
        let breaker = CircuitBreaker::with_clock(breaker_config, clock)
            .map_err(|e| SyncwardError::Config(e.to_string()))?;

        let tracker = Arc::new(ErrorTracker::new(config.error_tracker.capacity));
        let sink = Arc::new(DeadLetterSink::new(
            Arc::clone(&store) as Arc<dyn FailedJobStore>,
            notifier,
            config.dead_letter.clone(),
        ));
        let orchestrator = SyncOrchestrator::new(provider, breaker.clone(), Arc::clone(&tracker));
        let job = SyncJob::new(
            orchestrator,
            Arc::clone(&tracker),
            RetryPolicy::new(config.retry.clone()),
            Arc::clone(&sink),
        );

        info!(
            db_path = %db.path().display(),
            failure_threshold = config.circuit_breaker.failure_threshold,
            breaker_timeout_secs = config.circuit_breaker.timeout_secs,
            retention_limit = config.dead_letter.retention_limit,
            "sync runtime ready"
        );

        Ok(Self { config, db, store, tracker, breaker, sink, job })
    }

    /// Configuration the runtime was built from.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Database manager.
    pub const fn db(&self) -> &Arc<DbManager> {
        &self.db
    }

    /// Dead-letter store.
    pub const fn store(&self) -> &Arc<SqliteFailedJobRepository> {
        &self.store
    }

    /// Shared error tracker.
    pub const fn tracker(&self) -> &Arc<ErrorTracker> {
        &self.tracker
    }

    /// Shared provider breaker.
    pub const fn breaker(&self) -> &CircuitBreaker<C> {
        &self.breaker
    }

    /// Dead-letter sink.
    pub const fn sink(&self) -> &Arc<DeadLetterSink> {
        &self.sink
    }

    /// The sync job entry point.
    pub const fn job(&self) -> &SyncJob<C> {
        &self.job
    }

    /// Wait for background pruning to settle.
    ///
    /// # Errors
    /// Returns `SyncwardError::Internal` if a prune task panicked.
    pub async fn shutdown(&self) -> Result<()> {
        self.sink.wait_for_pruning().await
    }
}
