//! Commerce7 upstream adapter
//!
//! Implements the core `OrderPageSource` and `ClubSignupSource` ports over
//! the Commerce7 REST API.

pub mod auth;
pub mod client;
pub mod envelope;

pub use client::Commerce7Client;
pub use envelope::extract_records;
