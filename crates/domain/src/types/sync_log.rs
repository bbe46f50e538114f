//! Sync run bookkeeping
//!
//! A [`SyncLog`] is inserted when a run starts and finalized exactly once
//! when it ends. Runs are never resumed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::range::DateRange;
use crate::errors::{CellarSyncError, Result};
use crate::impl_domain_status_conversions;

/// Lifecycle state of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Running,
    Completed,
    Error,
}

impl_domain_status_conversions!(SyncStatus {
    Running => "running",
    Completed => "completed",
    Error => "error",
});

/// Which pipeline a run executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncType {
    /// Orders, staff, club signups and KPI snapshots.
    HistoricalSync,
    /// Club signups only.
    ClubSync,
}

impl_domain_status_conversions!(SyncType {
    HistoricalSync => "historical_sync",
    ClubSync => "club_sync",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncLog {
    pub id: String,
    pub sync_type: SyncType,
    pub status: SyncStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub records_processed: u64,
    pub error_message: Option<String>,
}

impl SyncLog {
    /// A new run in the `running` state.
    pub fn start(sync_type: SyncType, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            sync_type,
            status: SyncStatus::Running,
            started_at,
            completed_at: None,
            records_processed: 0,
            error_message: None,
        }
    }

    /// Transition `running → completed`. A note (e.g. a truncated fetch)
    /// may be kept in `error_message` without failing the run.
    ///
    /// # Errors
    /// `Internal` if the log was already finalized.
    pub fn complete(
        &mut self,
        completed_at: DateTime<Utc>,
        records_processed: u64,
        note: Option<String>,
    ) -> Result<()> {
        self.finalize(SyncStatus::Completed, completed_at, records_processed, note)
    }

    /// Transition `running → error`.
    ///
    /// # Errors
    /// `Internal` if the log was already finalized.
    pub fn fail(
        &mut self,
        completed_at: DateTime<Utc>,
        records_processed: u64,
        message: impl Into<String>,
    ) -> Result<()> {
        self.finalize(SyncStatus::Error, completed_at, records_processed, Some(message.into()))
    }

    pub fn is_finalized(&self) -> bool {
        self.status != SyncStatus::Running
    }

    fn finalize(
        &mut self,
        status: SyncStatus,
        completed_at: DateTime<Utc>,
        records_processed: u64,
        message: Option<String>,
    ) -> Result<()> {
        if self.is_finalized() {
            return Err(CellarSyncError::Internal(format!(
                "sync log {} already finalized as {}",
                self.id, self.status
            )));
        }
        self.status = status;
        self.completed_at = Some(completed_at);
        self.records_processed = records_processed;
        self.error_message = message;
        Ok(())
    }
}

/// Outcome of one orchestrated run, threaded through the pipeline instead
/// of kept as shared mutable state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub sync_log_id: String,
    pub range: Option<DateRange>,
    pub pages_requested: u32,
    pub orders_fetched: u64,
    pub orders_persisted: u64,
    pub staff_upserted: u64,
    pub club_signups_synced: u64,
    pub snapshots_written: u64,
    /// Why pagination stopped early, if it did.
    pub truncated: Option<String>,
}

impl SyncReport {
    pub fn new(sync_log_id: impl Into<String>, range: DateRange) -> Self {
        Self { sync_log_id: sync_log_id.into(), range: Some(range), ..Self::default() }
    }
}
