//! Application context - dependency injection container

use std::sync::{Arc, Mutex};

use cellarsync_core::{
    FetchPolicy, KpiSnapshotRepository, OrderRepository, SyncHandle, SyncPorts, SyncRequest,
    SyncService,
};
use cellarsync_domain::{Config, DateRange, Result};
use cellarsync_infra::{
    Commerce7Client, DbManager, SqliteClubSignupRepository, SqliteKpiSnapshotRepository,
    SqliteOrderRepository, SqliteStaffRepository, SqliteSyncLogRepository,
};
use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::utils::health::{ComponentHealth, HealthStatus};

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub sync_service: Arc<SyncService>,
    pub orders: Arc<dyn OrderRepository>,
    pub snapshots: Arc<dyn KpiSnapshotRepository>,
    pub sync_logs: Arc<SqliteSyncLogRepository>,

    // Background runs started through the HTTP surface
    background: Mutex<Vec<SyncHandle>>,
}

impl AppContext {
    /// Open the database, apply the schema and wire every port.
    ///
    /// # Errors
    /// Database or Commerce7 client initialisation failures.
    pub fn new(config: Config) -> Result<Self> {
        let db = Arc::new(DbManager::from_config(&config.database)?);
        db.run_migrations()?;

        let client = Arc::new(Commerce7Client::new(&config.commerce7)?);
        let orders = Arc::new(SqliteOrderRepository::new(Arc::clone(&db)));
        let snapshots = Arc::new(SqliteKpiSnapshotRepository::new(Arc::clone(&db)));
        let sync_logs = Arc::new(SqliteSyncLogRepository::new(Arc::clone(&db)));

        let ports = SyncPorts {
            order_source: client.clone(),
            club_source: client,
            orders: orders.clone(),
            staff: Arc::new(SqliteStaffRepository::new(Arc::clone(&db))),
            club_signups: Arc::new(SqliteClubSignupRepository::new(Arc::clone(&db))),
            snapshots: snapshots.clone(),
            sync_logs: sync_logs.clone(),
        };
        let policy = FetchPolicy::from(&config.sync);
        let sync_service = Arc::new(SyncService::new(ports, policy));

        info!(
            db_path = %db.path().display(),
            base_url = %config.commerce7.base_url,
            page_size = policy.page_size,
            "Application context initialised"
        );

        Ok(Self {
            config,
            db,
            sync_service,
            orders,
            snapshots,
            sync_logs,
            background: Mutex::new(Vec::new()),
        })
    }

    /// Today in UTC, the default end of every range.
    pub fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }

    /// Configured history start through `end`.
    ///
    /// # Errors
    /// `InvalidInput` if the configured start is malformed or after `end`.
    pub fn full_history_range(&self, end: NaiveDate) -> Result<DateRange> {
        DateRange::parse(&self.config.sync.history_start, &end.format("%Y-%m-%d").to_string())
    }

    /// Start a sync in the background and keep its handle for shutdown.
    pub fn start_background_sync(&self, request: SyncRequest) -> DateRange {
        let handle = self.sync_service.spawn(request);
        match self.background.lock() {
            Ok(mut running) => {
                running.retain(|existing| !existing.is_finished());
                running.push(handle);
            }
            Err(_) => warn!("background sync registry poisoned; run will not be cancelled on shutdown"),
        }
        request.range
    }

    /// Number of background runs that have not finished yet.
    pub fn running_background_syncs(&self) -> usize {
        self.background
            .lock()
            .map(|running| running.iter().filter(|handle| !handle.is_finished()).count())
            .unwrap_or(0)
    }

    /// Probe the database and the sync log table.
    pub async fn health_check(&self) -> HealthStatus {
        let database = match self.db.health_check() {
            Ok(()) => ComponentHealth::healthy("database"),
            Err(err) => ComponentHealth::unhealthy("database", err.to_string()),
        };

        let sync_log = match self.sync_logs.list_recent(1).await {
            Ok(logs) => match logs.first() {
                Some(log) => ComponentHealth::healthy_with(
                    "sync_log",
                    format!("last {} run {} at {}", log.sync_type, log.status, log.started_at),
                ),
                None => ComponentHealth::healthy_with("sync_log", "no runs yet"),
            },
            Err(err) => ComponentHealth::unhealthy("sync_log", err.to_string()),
        };

        HealthStatus::new().add_component(database).add_component(sync_log)
    }

    /// Cancel background runs and wait for them to finalize their logs.
    pub async fn shutdown(&self) {
        let handles = match self.background.lock() {
            Ok(mut running) => std::mem::take(&mut *running),
            Err(_) => Vec::new(),
        };

        for handle in &handles {
            handle.cancel();
        }
        for handle in handles {
            let request = handle.request();
            if let Err(err) = handle.join().await {
                info!(sync_type = %request.sync_type, error = %err, "Background sync stopped");
            }
        }
        info!("Application context shut down");
    }
}
