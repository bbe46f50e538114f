//! Upstream fetching and sync orchestration

pub mod fetcher;
pub mod ports;
pub mod service;

pub use fetcher::{FetchOutcome, FetchPolicy, PageSink, RateLimitedFetcher, Truncation};
pub use service::{SyncHandle, SyncPorts, SyncRequest, SyncService};
