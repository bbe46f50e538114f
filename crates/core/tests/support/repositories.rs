//! In-memory repository implementations
//!
//! Each mock shares its state through `Arc<Mutex<..>>`, so a clone handed to
//! the service and the clone kept by the test observe the same data.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cellarsync_core::{
    ClubSignupRepository, KpiSnapshotRepository, OrderRepository, StaffRepository,
    SyncLogRepository,
};
use cellarsync_domain::{
    CellarSyncError, ClubSignup, DailyKpiSnapshot, DateRange, Order, Result as DomainResult,
    StaffMember, SyncLog,
};
use chrono::NaiveDate;

/// In-memory `OrderRepository` keyed by order id.
#[derive(Default, Clone)]
pub struct MemoryOrderRepository {
    orders: Arc<Mutex<BTreeMap<String, Order>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryOrderRepository {
    pub fn len(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    pub fn get(&self, id: &str) -> Option<Order> {
        self.orders.lock().unwrap().get(id).cloned()
    }

    /// Make every subsequent upsert fail with a database error.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn upsert_order(&self, order: &Order) -> DomainResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CellarSyncError::Database("orders table is read-only".into()));
        }
        self.orders.lock().unwrap().insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn find_orders_in_range(&self, range: DateRange) -> DomainResult<Vec<Order>> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .values()
            .filter(|order| order.order_day().is_some_and(|day| range.contains(day)))
            .cloned()
            .collect())
    }

    async fn find_orders_for_associate(
        &self,
        associate_name: &str,
        range: DateRange,
    ) -> DomainResult<Vec<Order>> {
        let orders = self.find_orders_in_range(range).await?;
        Ok(orders.into_iter().filter(|order| order.associate_name == associate_name).collect())
    }
}

/// In-memory `StaffRepository` keyed by name.
#[derive(Default, Clone)]
pub struct MemoryStaffRepository {
    staff: Arc<Mutex<BTreeMap<String, StaffMember>>>,
}

impl MemoryStaffRepository {
    pub fn names(&self) -> Vec<String> {
        self.staff.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl StaffRepository for MemoryStaffRepository {
    async fn upsert_staff(&self, staff: &[StaffMember]) -> DomainResult<usize> {
        let mut stored = self.staff.lock().unwrap();
        for member in staff {
            stored.insert(member.name.clone(), member.clone());
        }
        Ok(staff.len())
    }

    async fn list_staff(&self) -> DomainResult<Vec<StaffMember>> {
        Ok(self.staff.lock().unwrap().values().cloned().collect())
    }
}

/// In-memory `ClubSignupRepository`.
#[derive(Default, Clone)]
pub struct MemoryClubSignupRepository {
    signups: Arc<Mutex<BTreeSet<ClubSignup>>>,
}

impl MemoryClubSignupRepository {
    pub fn seed(&self, signups: impl IntoIterator<Item = ClubSignup>) {
        self.signups.lock().unwrap().extend(signups);
    }

    pub fn len(&self) -> usize {
        self.signups.lock().unwrap().len()
    }
}

#[async_trait]
impl ClubSignupRepository for MemoryClubSignupRepository {
    async fn upsert_signups(&self, signups: &[ClubSignup]) -> DomainResult<usize> {
        self.seed(signups.iter().cloned());
        Ok(signups.len())
    }

    async fn find_signups_in_range(&self, range: DateRange) -> DomainResult<Vec<ClubSignup>> {
        Ok(self
            .signups
            .lock()
            .unwrap()
            .iter()
            .filter(|signup| range.contains(signup.signup_date))
            .cloned()
            .collect())
    }
}

/// In-memory `KpiSnapshotRepository` that stores the serialized JSON, the
/// same representation the database keeps.
#[derive(Default, Clone)]
pub struct MemorySnapshotRepository {
    rows: Arc<Mutex<BTreeMap<NaiveDate, String>>>,
}

impl MemorySnapshotRepository {
    pub fn raw(&self, date: NaiveDate) -> Option<String> {
        self.rows.lock().unwrap().get(&date).cloned()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.lock().unwrap().keys().copied().collect()
    }

    pub fn seed(&self, snapshot: &DailyKpiSnapshot) {
        let json = serde_json::to_string(snapshot).unwrap();
        self.rows.lock().unwrap().insert(snapshot.date, json);
    }
}

#[async_trait]
impl KpiSnapshotRepository for MemorySnapshotRepository {
    async fn upsert_snapshot(&self, snapshot: &DailyKpiSnapshot) -> DomainResult<()> {
        self.seed(snapshot);
        Ok(())
    }

    async fn find_snapshot(&self, date: NaiveDate) -> DomainResult<Option<DailyKpiSnapshot>> {
        Ok(self.raw(date).map(|json| serde_json::from_str(&json).unwrap()))
    }

    async fn find_snapshots_in_range(
        &self,
        range: DateRange,
    ) -> DomainResult<Vec<DailyKpiSnapshot>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .range(range.start..=range.end)
            .map(|(_, json)| serde_json::from_str(json).unwrap())
            .collect())
    }
}

/// In-memory `SyncLogRepository` that keeps every write for inspection.
#[derive(Default, Clone)]
pub struct MemorySyncLogRepository {
    logs: Arc<Mutex<BTreeMap<String, SyncLog>>>,
    finalize_calls: Arc<Mutex<Vec<String>>>,
}

impl MemorySyncLogRepository {
    pub fn all(&self) -> Vec<SyncLog> {
        self.logs.lock().unwrap().values().cloned().collect()
    }

    pub fn only(&self) -> SyncLog {
        let logs = self.all();
        assert_eq!(logs.len(), 1, "expected exactly one sync log, found {logs:?}");
        logs.into_iter().next().unwrap()
    }

    pub fn finalize_count(&self, id: &str) -> usize {
        self.finalize_calls.lock().unwrap().iter().filter(|logged| logged.as_str() == id).count()
    }
}

#[async_trait]
impl SyncLogRepository for MemorySyncLogRepository {
    async fn create_sync_log(&self, log: &SyncLog) -> DomainResult<()> {
        self.logs.lock().unwrap().insert(log.id.clone(), log.clone());
        Ok(())
    }

    async fn finalize_sync_log(&self, log: &SyncLog) -> DomainResult<()> {
        self.finalize_calls.lock().unwrap().push(log.id.clone());
        self.logs.lock().unwrap().insert(log.id.clone(), log.clone());
        Ok(())
    }

    async fn find_sync_log(&self, id: &str) -> DomainResult<Option<SyncLog>> {
        Ok(self.logs.lock().unwrap().get(id).cloned())
    }
}
