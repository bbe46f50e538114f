#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use cellarsync_core::{FetchPolicy, SyncPorts, SyncService};
use cellarsync_domain::constants::{NON_CLUB_GUEST_PRODUCT_ID, WINE_BOTTLE_DEPARTMENT_ID};
use cellarsync_domain::Commerce7Config;
use cellarsync_infra::database::{
    DbManager, SqliteClubSignupRepository, SqliteKpiSnapshotRepository, SqliteOrderRepository,
    SqliteStaffRepository, SqliteSyncLogRepository,
};
use cellarsync_infra::Commerce7Client;
use serde_json::{json, Value};
use tempfile::TempDir;

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a new temporary database with the schema applied.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("cellarsync-test.db");

        let manager = DbManager::new(&db_path, 4).expect("db manager should be created");
        manager.run_migrations().expect("schema migrations should apply");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }

    pub fn orders(&self) -> Arc<SqliteOrderRepository> {
        Arc::new(SqliteOrderRepository::new(Arc::clone(&self.manager)))
    }

    pub fn staff(&self) -> Arc<SqliteStaffRepository> {
        Arc::new(SqliteStaffRepository::new(Arc::clone(&self.manager)))
    }

    pub fn club_signups(&self) -> Arc<SqliteClubSignupRepository> {
        Arc::new(SqliteClubSignupRepository::new(Arc::clone(&self.manager)))
    }

    pub fn snapshots(&self) -> Arc<SqliteKpiSnapshotRepository> {
        Arc::new(SqliteKpiSnapshotRepository::new(Arc::clone(&self.manager)))
    }

    pub fn sync_logs(&self) -> Arc<SqliteSyncLogRepository> {
        Arc::new(SqliteSyncLogRepository::new(Arc::clone(&self.manager)))
    }

    /// Raw JSON columns of one snapshot row, for byte-level comparisons.
    pub fn snapshot_row(&self, date: &str) -> Option<(String, String, String)> {
        let conn = self.manager.get_connection().expect("connection should be available");
        conn.query_row(
            "SELECT service_type_breakdown, associate_performance, guest_breakdown
             FROM kpi_daily_snapshots WHERE date = ?1",
            [date],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .ok()
    }

    pub fn count(&self, table: &str) -> i64 {
        let conn = self.manager.get_connection().expect("connection should be available");
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .expect("count query should succeed")
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

pub fn commerce7_config(base_url: String) -> Commerce7Config {
    Commerce7Config {
        base_url,
        app_id: "cellar-app".into(),
        api_key: "secret".into(),
        tenant_id: "estate-winery".into(),
        timeout_secs: 5,
    }
}

/// Fetch policy without pacing so tests against a mock server run fast.
pub fn fast_policy(page_size: u32) -> FetchPolicy {
    FetchPolicy { page_size, max_pages: 10, max_attempts: 3, page_delay: Duration::ZERO }
}

/// Sync service wired to a Commerce7 mock and a real SQLite database.
pub fn sqlite_service(db: &TestDatabase, base_url: String, page_size: u32) -> SyncService {
    let client = Arc::new(
        Commerce7Client::new(&commerce7_config(base_url)).expect("client should be created"),
    );
    let ports = SyncPorts {
        order_source: client.clone(),
        club_source: client,
        orders: db.orders(),
        staff: db.staff(),
        club_signups: db.club_signups(),
        snapshots: db.snapshots(),
        sync_logs: db.sync_logs(),
    };
    SyncService::new(ports, fast_policy(page_size))
}

/// Commerce7-shaped order with one non-club guest and `bottles` bottles.
/// Amounts are in cents.
pub fn order_payload(id: &str, paid: &str, associate: &str, subtotal: i64, bottles: u32) -> Value {
    json!({
        "id": id,
        "orderPaidDate": paid,
        "customerId": format!("cust-{id}"),
        "subTotal": subtotal,
        "taxTotal": subtotal / 10,
        "total": subtotal + subtotal / 10,
        "salesAssociate": { "name": associate },
        "items": [
            { "productId": NON_CLUB_GUEST_PRODUCT_ID, "quantity": 1 },
            { "productId": "estate-syrah", "departmentId": WINE_BOTTLE_DEPARTMENT_ID, "quantity": bottles }
        ]
    })
}
