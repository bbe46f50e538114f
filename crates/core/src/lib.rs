//! # CellarSync Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (traits) for the upstream platform and the store
//! - Order normalization and staff extraction
//! - Club signup attribution and daily KPI aggregation
//! - The rate-limited page fetcher and the sync orchestrator
//!
//! ## Architecture Principles
//! - Only depends on `cellarsync-domain`
//! - No database or HTTP code
//! - All external collaborators via traits
//! - Aggregation is a pure function of persisted orders and signups

pub mod insights;
pub mod kpi;
pub mod orders;
pub mod sync;

// Re-export specific items to avoid ambiguity
pub use insights::{InsightContext, StaffMetrics};
pub use kpi::ports::{ClubSignupRepository, KpiSnapshotRepository};
pub use kpi::{aggregate_day, ClubSignupAttributor, KpiAggregator};
pub use orders::ports::{OrderRepository, StaffRepository};
pub use orders::{classify_items, extract_staff, ItemClassification, OrderNormalizer};
pub use sync::fetcher::{FetchOutcome, FetchPolicy, PageSink, RateLimitedFetcher, Truncation};
pub use sync::ports::{ClubSignupSource, OrderPageSource, SyncLogRepository};
pub use sync::service::{SyncHandle, SyncPorts, SyncRequest, SyncService};
