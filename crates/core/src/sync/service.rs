//! Sync orchestrator
//!
//! One invocation owns exactly one [`SyncLog`]: it is inserted before any
//! fetch begins and finalized once, as `completed` or `error`, when the run
//! ends. Stages run in order (orders, staff, club signups, KPI snapshots)
//! and data written by earlier stages is kept when a later stage fails.

use std::sync::Arc;

use async_trait::async_trait;
use cellarsync_domain::{
    CellarSyncError, ClubSignup, DateRange, RawClubMembership, RawOrder, Result, SyncLog,
    SyncReport, SyncType,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use super::fetcher::{FetchPolicy, PageSink, RateLimitedFetcher, Truncation};
use super::ports::{ClubSignupSource, OrderPageSource, SyncLogRepository};
use crate::kpi::ports::{ClubSignupRepository, KpiSnapshotRepository};
use crate::kpi::KpiAggregator;
use crate::orders::ports::{OrderRepository, StaffRepository};
use crate::orders::{extract_staff, OrderNormalizer};

const ORDERS_RESOURCE: &str = "orders";
const CLUB_RESOURCE: &str = "club_memberships";

/// External collaborators the orchestrator drives.
#[derive(Clone)]
pub struct SyncPorts {
    pub order_source: Arc<dyn OrderPageSource>,
    pub club_source: Arc<dyn ClubSignupSource>,
    pub orders: Arc<dyn OrderRepository>,
    pub staff: Arc<dyn StaffRepository>,
    pub club_signups: Arc<dyn ClubSignupRepository>,
    pub snapshots: Arc<dyn KpiSnapshotRepository>,
    pub sync_logs: Arc<dyn SyncLogRepository>,
}

/// What to run and over which days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequest {
    pub sync_type: SyncType,
    pub range: DateRange,
}

impl SyncRequest {
    pub fn historical(range: DateRange) -> Self {
        Self { sync_type: SyncType::HistoricalSync, range }
    }

    pub fn club(range: DateRange) -> Self {
        Self { sync_type: SyncType::ClubSync, range }
    }
}

/// A sync running in the background.
///
/// Dropping the handle detaches the task; the run still finalizes its log.
pub struct SyncHandle {
    request: SyncRequest,
    cancellation: CancellationToken,
    task: JoinHandle<Result<SyncReport>>,
}

impl SyncHandle {
    pub fn request(&self) -> SyncRequest {
        self.request
    }

    /// Ask the run to stop; it finalizes its log as `error`.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the run to end.
    ///
    /// # Errors
    /// The run's own error, or `Internal` if the task panicked.
    pub async fn join(self) -> Result<SyncReport> {
        self.task.await.map_err(|err| {
            CellarSyncError::Internal(format!("sync task did not complete: {err}"))
        })?
    }
}

struct OrderSink<'a> {
    repository: &'a dyn OrderRepository,
    normalizer: OrderNormalizer,
    persisted: u64,
}

#[async_trait]
impl<'a> PageSink<RawOrder> for OrderSink<'a> {
    async fn accept(&mut self, page: &[RawOrder]) -> Result<()> {
        for raw in page {
            if raw.id.trim().is_empty() {
                warn!("Skipping upstream order without an id");
                continue;
            }
            let order = self.normalizer.normalize(raw);
            self.repository.upsert_order(&order).await?;
            self.persisted += 1;
        }
        Ok(())
    }
}

struct ClubSignupSink<'a> {
    repository: &'a dyn ClubSignupRepository,
    synced: u64,
}

#[async_trait]
impl<'a> PageSink<RawClubMembership> for ClubSignupSink<'a> {
    async fn accept(&mut self, page: &[RawClubMembership]) -> Result<()> {
        let signups: Vec<ClubSignup> = page
            .iter()
            .filter_map(|raw| match ClubSignup::try_from(raw) {
                Ok(signup) => Some(signup),
                Err(err) => {
                    warn!(error = %err, "Skipping unusable club membership");
                    None
                }
            })
            .collect();
        if signups.is_empty() {
            return Ok(());
        }
        let written = self.repository.upsert_signups(&signups).await?;
        self.synced += written as u64;
        Ok(())
    }
}

/// Sequences fetch, normalization, staff extraction, club signup sync and
/// KPI aggregation.
pub struct SyncService {
    ports: SyncPorts,
    fetcher: RateLimitedFetcher,
    normalizer: OrderNormalizer,
    aggregator: KpiAggregator,
}

impl SyncService {
    pub fn new(ports: SyncPorts, policy: FetchPolicy) -> Self {
        let aggregator = KpiAggregator::new(
            Arc::clone(&ports.orders),
            Arc::clone(&ports.club_signups),
            Arc::clone(&ports.snapshots),
        );
        Self {
            ports,
            fetcher: RateLimitedFetcher::new(policy),
            normalizer: OrderNormalizer::new(),
            aggregator,
        }
    }

    pub async fn run(&self, request: SyncRequest, cancel: &CancellationToken) -> Result<SyncReport> {
        match request.sync_type {
            SyncType::HistoricalSync => self.sync_historical_data(request.range, cancel).await,
            SyncType::ClubSync => self.sync_club_memberships(request.range, cancel).await,
        }
    }

    /// Start `request` on the runtime and return immediately.
    pub fn spawn(self: &Arc<Self>, request: SyncRequest) -> SyncHandle {
        let cancellation = CancellationToken::new();
        let cancel = cancellation.clone();
        let service = Arc::clone(self);

        let task = tokio::spawn(async move {
            let result = service.run(request, &cancel).await;
            if let Err(err) = &result {
                error!(
                    sync_type = %request.sync_type,
                    range = %request.range,
                    error = %err,
                    "Background sync failed"
                );
            }
            result
        });

        info!(sync_type = %request.sync_type, range = %request.range, "Background sync started");
        SyncHandle { request, cancellation, task }
    }

    /// Full pipeline over `range`.
    ///
    /// # Errors
    /// The first unrecovered stage failure, after the log is marked `error`.
    #[instrument(skip_all, fields(range = %range, sync_log_id = tracing::field::Empty))]
    pub async fn sync_historical_data(
        &self,
        range: DateRange,
        cancel: &CancellationToken,
    ) -> Result<SyncReport> {
        let log = self.start_log(SyncType::HistoricalSync).await?;
        let mut report = SyncReport::new(&log.id, range);
        info!("Starting historical sync");

        let result = self.historical_stages(range, cancel, &mut report).await;
        self.finish_log(log, report, result).await
    }

    /// Club signups only, under their own `club_sync` log.
    ///
    /// # Errors
    /// Store failures or cancellation, after the log is marked `error`.
    #[instrument(skip_all, fields(range = %range, sync_log_id = tracing::field::Empty))]
    pub async fn sync_club_memberships(
        &self,
        range: DateRange,
        cancel: &CancellationToken,
    ) -> Result<SyncReport> {
        let log = self.start_log(SyncType::ClubSync).await?;
        let mut report = SyncReport::new(&log.id, range);
        info!("Starting club membership sync");

        let result = self.pull_club_signups(range, cancel, &mut report).await;
        self.finish_log(log, report, result).await
    }

    /// Rebuild snapshots for `range` from what is already stored.
    pub async fn recompute_kpis(&self, range: DateRange) -> Result<u64> {
        self.aggregator.recompute(range).await
    }

    async fn historical_stages(
        &self,
        range: DateRange,
        cancel: &CancellationToken,
        report: &mut SyncReport,
    ) -> Result<()> {
        let fetched = self.pull_orders(range, cancel, report).await?;
        info!(orders = fetched.len(), persisted = report.orders_persisted, "Orders fetched");

        report.staff_upserted = self.upsert_staff(&fetched).await?;

        self.pull_club_signups(range, cancel, report).await?;

        if cancel.is_cancelled() {
            return Err(CellarSyncError::Cancelled("sync cancelled before KPI aggregation".into()));
        }
        report.snapshots_written = self.aggregator.recompute(range).await?;
        Ok(())
    }

    async fn pull_orders(
        &self,
        range: DateRange,
        cancel: &CancellationToken,
        report: &mut SyncReport,
    ) -> Result<Vec<RawOrder>> {
        let source = self.ports.order_source.as_ref();
        let limit = self.fetcher.policy().page_size;
        let mut sink = OrderSink {
            repository: self.ports.orders.as_ref(),
            normalizer: self.normalizer,
            persisted: 0,
        };

        let fetch = move |page: u32| async move {
            let payloads = source.fetch_order_page(range, page, limit).await?;
            let orders: Vec<RawOrder> = payloads.into_iter().map(RawOrder::from_payload).collect();
            Ok::<_, CellarSyncError>(orders)
        };
        let result = self.fetcher.fetch_all(ORDERS_RESOURCE, fetch, &mut sink, cancel).await;
        report.orders_persisted = sink.persisted;
        let outcome = result?;

        report.pages_requested += outcome.requests;
        report.orders_fetched = outcome.records.len() as u64;
        if let Some(truncation) = &outcome.truncation {
            note_truncation(report, ORDERS_RESOURCE, truncation);
        }
        Ok(outcome.records)
    }

    async fn upsert_staff(&self, orders: &[RawOrder]) -> Result<u64> {
        let staff = extract_staff(orders);
        if staff.is_empty() {
            info!("No staff to upsert");
            return Ok(0);
        }
        let written = self.ports.staff.upsert_staff(&staff).await?;
        info!(staff = written, "Staff upserted");
        Ok(written as u64)
    }

    async fn pull_club_signups(
        &self,
        range: DateRange,
        cancel: &CancellationToken,
        report: &mut SyncReport,
    ) -> Result<()> {
        let source = self.ports.club_source.as_ref();
        let limit = self.fetcher.policy().page_size;
        let mut sink = ClubSignupSink { repository: self.ports.club_signups.as_ref(), synced: 0 };

        let fetch = move |page: u32| source.fetch_club_signup_page(range, page, limit);
        let result = self.fetcher.fetch_all(CLUB_RESOURCE, fetch, &mut sink, cancel).await;
        report.club_signups_synced = sink.synced;
        let outcome = result?;

        report.pages_requested += outcome.requests;
        if let Some(truncation) = &outcome.truncation {
            note_truncation(report, CLUB_RESOURCE, truncation);
        }
        info!(signups = sink.synced, "Club memberships synced");
        Ok(())
    }

    async fn start_log(&self, sync_type: SyncType) -> Result<SyncLog> {
        let log = SyncLog::start(sync_type, Utc::now());
        self.ports.sync_logs.create_sync_log(&log).await?;
        tracing::Span::current().record("sync_log_id", log.id.as_str());
        Ok(log)
    }

    async fn finish_log(
        &self,
        mut log: SyncLog,
        report: SyncReport,
        result: Result<()>,
    ) -> Result<SyncReport> {
        let records = match log.sync_type {
            SyncType::HistoricalSync => report.orders_persisted,
            SyncType::ClubSync => report.club_signups_synced,
        };

        match result {
            Ok(()) => {
                log.complete(Utc::now(), records, report.truncated.clone())?;
                self.ports.sync_logs.finalize_sync_log(&log).await?;
                match &report.truncated {
                    Some(reason) => error!(%reason, records, "Sync completed with a truncated fetch"),
                    None => info!(records, "Sync completed"),
                }
                Ok(report)
            }
            Err(err) => {
                error!(error = %err, records, "Sync failed");
                log.fail(Utc::now(), records, err.to_string())?;
                if let Err(finalize_err) = self.ports.sync_logs.finalize_sync_log(&log).await {
                    error!(error = %finalize_err, "Failed to finalize sync log");
                }
                Err(err)
            }
        }
    }
}

fn note_truncation(report: &mut SyncReport, resource: &str, truncation: &Truncation) {
    let note = format!("{resource}: {truncation}");
    report.truncated = Some(match report.truncated.take() {
        Some(previous) => format!("{previous}; {note}"),
        None => note,
    });
}
