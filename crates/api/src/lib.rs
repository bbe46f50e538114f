//! # CellarSync API
//!
//! Invocation layer - HTTP triggers and the binary entry point.
//!
//! This crate contains:
//! - Application context (dependency injection)
//! - The axum router for sync triggers, health and staff metrics
//! - Logging initialisation and health reporting helpers
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires the SQLite repositories and the Commerce7 client into the
//!   sync service

pub mod context;
pub mod http;
pub mod utils;

// Re-export for convenience
pub use context::AppContext;
pub use http::router;
