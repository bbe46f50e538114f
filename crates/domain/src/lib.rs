//! # CellarSync Domain
//!
//! Business domain types and models for CellarSync.
//!
//! This crate contains:
//! - Upstream and canonical order types, staff, club signups
//! - Daily KPI snapshot and sync log records
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Catalog constants (guest-type products, departments)
//!
//! ## Architecture
//! - No dependencies on other CellarSync crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
