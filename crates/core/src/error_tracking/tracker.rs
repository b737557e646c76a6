use std::collections::{BTreeMap, VecDeque};

use parking_lot::Mutex;
use serde_json::Value;
use syncward_domain::constants::{
    DEFAULT_ERROR_TRACKER_CAPACITY, ERROR_SUMMARY_RECENT, EVENT_SYNC_ERROR,
};
use syncward_domain::{ErrorKind, ErrorRecord, ErrorSummary, SyncError};
use tracing::error;

#[derive(Debug, Default)]
struct TrackerState {
    recent: VecDeque<ErrorRecord>,
    kind_counts: BTreeMap<ErrorKind, u64>,
    total: u64,
}

/// Bounded ring of recent failures plus cumulative per-kind counters.
///
/// The ring keeps the `capacity` most recent records; counters are never
/// trimmed. Safe to share between workers.
#[derive(Debug)]
pub struct ErrorTracker {
    capacity: usize,
    state: Mutex<TrackerState>,
}

impl Default for ErrorTracker {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_TRACKER_CAPACITY)
    }
}

impl ErrorTracker {
    /// Tracker retaining at most `capacity` records (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            state: Mutex::new(TrackerState {
                recent: VecDeque::with_capacity(capacity),
                ..TrackerState::default()
            }),
        }
    }

    /// Ring capacity.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record a failure, emit one structured log event and trim the ring.
    pub fn record_error(&self, err: &SyncError, context: BTreeMap<String, Value>) -> ErrorRecord {
        let record = ErrorRecord::capture(err, context);

        error!(
            event = EVENT_SYNC_ERROR,
            error_kind = %record.error_kind,
            error_message = %record.message,
            job_class = context_str(&record.context, "job_class"),
            job_id = context_str(&record.context, "job_id"),
            sync_type = context_str(&record.context, "sync_type"),
            record_id = context_str(&record.context, "record_id"),
            executions = record.context.get("executions").and_then(serde_json::Value::as_u64),
            "sync error recorded"
        );

        let mut state = self.state.lock();
        state.total += 1;
        *state.kind_counts.entry(record.error_kind).or_insert(0) += 1;
        state.recent.push_back(record.clone());
        while state.recent.len() > self.capacity {
            state.recent.pop_front();
        }

        record
    }

    /// Totals, per-kind counts, the ten newest records and the most
    /// frequent kind. Ties go to the kind declared first in [`ErrorKind`].
    pub fn error_summary(&self) -> ErrorSummary {
        let state = self.state.lock();

        let skip = state.recent.len().saturating_sub(ERROR_SUMMARY_RECENT);
        let last_10_errors = state.recent.iter().skip(skip).cloned().collect();

        let most_frequent_error_kind = state
            .kind_counts
            .iter()
            .fold(None::<(ErrorKind, u64)>, |best, (&kind, &count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((kind, count)),
            })
            .map(|(kind, _)| kind);

        ErrorSummary {
            total_errors: state.total,
            retained_errors: state.recent.len(),
            error_kind_counts: state.kind_counts.clone(),
            last_10_errors,
            most_frequent_error_kind,
        }
    }

    /// `true` once an authentication failure or open-breaker rejection has
    /// been recorded.
    pub fn has_critical_errors(&self) -> bool {
        self.state.lock().kind_counts.keys().any(|kind| kind.is_critical())
    }

    /// Copy of the retained ring, oldest first.
    pub fn recent_errors(&self) -> Vec<ErrorRecord> {
        self.state.lock().recent.iter().cloned().collect()
    }

    /// Drop every record and counter.
    pub fn clear(&self) {
        *self.state.lock() = TrackerState::default();
    }
}

fn context_str<'a>(context: &'a BTreeMap<String, Value>, key: &str) -> Option<&'a str> {
    context.get(key).and_then(Value::as_str)
}
