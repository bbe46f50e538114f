//! # CellarSync Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite repositories behind an r2d2 pool
//! - The Commerce7 REST adapter for orders and club memberships
//! - Configuration loading (environment and JSON/TOML files)
//! - Conversions from third-party errors into domain errors
//!
//! ## Architecture
//! - Implements traits defined in `cellarsync-core`
//! - Contains all "impure" code (I/O, network, storage)

pub mod commerce7;
pub mod config;
pub mod database;
pub mod errors;
pub mod http;

// Re-export commonly used items
pub use commerce7::Commerce7Client;
pub use database::*;
pub use errors::InfraError;
pub use http::*;
