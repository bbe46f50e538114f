//! Port interfaces for club signups and KPI snapshots

use async_trait::async_trait;
use cellarsync_domain::{ClubSignup, DailyKpiSnapshot, DateRange, Result};
use chrono::NaiveDate;

/// Trait for persisting club signup events
#[async_trait]
pub trait ClubSignupRepository: Send + Sync {
    /// Upsert keyed by `(customer_id, signup_date)`, returning rows written
    async fn upsert_signups(&self, signups: &[ClubSignup]) -> Result<usize>;

    /// Signups dated within `range` (inclusive)
    async fn find_signups_in_range(&self, range: DateRange) -> Result<Vec<ClubSignup>>;
}

/// Trait for persisting daily KPI snapshots
#[async_trait]
pub trait KpiSnapshotRepository: Send + Sync {
    /// Replace the snapshot for `snapshot.date`
    async fn upsert_snapshot(&self, snapshot: &DailyKpiSnapshot) -> Result<()>;

    async fn find_snapshot(&self, date: NaiveDate) -> Result<Option<DailyKpiSnapshot>>;

    /// Snapshots within `range`, ascending by date
    async fn find_snapshots_in_range(&self, range: DateRange) -> Result<Vec<DailyKpiSnapshot>>;
}
