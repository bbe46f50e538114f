//! Port interfaces for the upstream platform and sync bookkeeping

use async_trait::async_trait;
use cellarsync_domain::{DateRange, RawClubMembership, Result, SyncLog};
use serde_json::Value;

/// Paged access to upstream orders filtered by paid date
#[async_trait]
pub trait OrderPageSource: Send + Sync {
    /// Fetch one page (1-based) of raw order payloads paid within `range`.
    ///
    /// A response without a record array is reported as
    /// `CellarSyncError::UpstreamShape`.
    async fn fetch_order_page(&self, range: DateRange, page: u32, limit: u32)
        -> Result<Vec<Value>>;
}

/// Paged access to club membership signups filtered by signup date
#[async_trait]
pub trait ClubSignupSource: Send + Sync {
    async fn fetch_club_signup_page(
        &self,
        range: DateRange,
        page: u32,
        limit: u32,
    ) -> Result<Vec<RawClubMembership>>;
}

/// Trait for persisting sync run logs
#[async_trait]
pub trait SyncLogRepository: Send + Sync {
    /// Insert a freshly started log
    async fn create_sync_log(&self, log: &SyncLog) -> Result<()>;

    /// Persist the terminal state of a log
    async fn finalize_sync_log(&self, log: &SyncLog) -> Result<()>;

    async fn find_sync_log(&self, id: &str) -> Result<Option<SyncLog>>;
}
