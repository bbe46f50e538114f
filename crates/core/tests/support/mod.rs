//! Shared test helpers for `cellarsync-core` integration tests.
//!
//! In-memory ports, scripted upstream sources and order payload fixtures so
//! pipeline tests can focus on behaviour instead of boilerplate.

#![allow(dead_code)]

pub mod fixtures;
pub mod repositories;
pub mod upstream;

use std::sync::Arc;
use std::time::Duration;

use cellarsync_core::{FetchPolicy, SyncPorts, SyncService};
pub use fixtures::OrderFixture;
pub use repositories::{
    MemoryClubSignupRepository, MemoryOrderRepository, MemorySnapshotRepository,
    MemoryStaffRepository, MemorySyncLogRepository,
};
pub use upstream::{ScriptedOrderSource, StaticClubSource};

/// Policy matching production limits with a configurable page size.
pub fn policy(page_size: u32) -> FetchPolicy {
    FetchPolicy {
        page_size,
        max_pages: 100,
        max_attempts: 3,
        page_delay: Duration::from_millis(2_000),
    }
}

/// All ports wired to in-memory implementations.
pub struct Harness {
    pub orders: MemoryOrderRepository,
    pub staff: MemoryStaffRepository,
    pub signups: MemoryClubSignupRepository,
    pub snapshots: MemorySnapshotRepository,
    pub logs: MemorySyncLogRepository,
    pub order_source: Arc<ScriptedOrderSource>,
    pub club_source: Arc<StaticClubSource>,
}

impl Harness {
    pub fn new(order_source: ScriptedOrderSource, club_source: StaticClubSource) -> Self {
        Self {
            orders: MemoryOrderRepository::default(),
            staff: MemoryStaffRepository::default(),
            signups: MemoryClubSignupRepository::default(),
            snapshots: MemorySnapshotRepository::default(),
            logs: MemorySyncLogRepository::default(),
            order_source: Arc::new(order_source),
            club_source: Arc::new(club_source),
        }
    }

    pub fn ports(&self) -> SyncPorts {
        SyncPorts {
            order_source: self.order_source.clone(),
            club_source: self.club_source.clone(),
            orders: Arc::new(self.orders.clone()),
            staff: Arc::new(self.staff.clone()),
            club_signups: Arc::new(self.signups.clone()),
            snapshots: Arc::new(self.snapshots.clone()),
            sync_logs: Arc::new(self.logs.clone()),
        }
    }

    pub fn service(&self, page_size: u32) -> SyncService {
        SyncService::new(self.ports(), policy(page_size))
    }
}
