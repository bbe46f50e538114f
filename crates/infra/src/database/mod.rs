//! SQLite persistence
//!
//! `DbManager` owns the r2d2 pool and schema; each repository implements
//! one core port and runs its queries on the blocking thread pool.

pub mod club_signup_repository;
pub mod manager;
pub mod order_repository;
pub mod snapshot_repository;
pub mod staff_repository;
pub mod sync_log_repository;

pub use club_signup_repository::SqliteClubSignupRepository;
pub use manager::{DbConnection, DbManager, SqlitePool};
pub use order_repository::SqliteOrderRepository;
pub use snapshot_repository::SqliteKpiSnapshotRepository;
pub use staff_repository::SqliteStaffRepository;
pub use sync_log_repository::SqliteSyncLogRepository;
