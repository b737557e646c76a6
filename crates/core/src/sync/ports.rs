//! Port interface for the external data provider

use async_trait::async_trait;
use syncward_domain::{ProviderRecord, SyncError};

/// Record-level access to the external provider.
///
/// Implementations classify their own failures into [`SyncError`]; transport
/// and parsing details stay behind this boundary.
#[async_trait]
pub trait SyncProvider: Send + Sync {
    /// Records pulled by an initial pass when no limit is given
    fn default_limit(&self) -> usize;

    /// List up to `limit` records for an initial pass
    async fn list_records(&self, limit: usize) -> Result<Vec<ProviderRecord>, SyncError>;

    /// List already-known records that need a refresh
    async fn list_stale_records(&self) -> Result<Vec<ProviderRecord>, SyncError>;

    /// Fetch, parse and upsert one record
    async fn sync_record(&self, record: &ProviderRecord) -> Result<(), SyncError>;
}
