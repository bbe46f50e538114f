//! Cross-cutting helpers for the service binary

pub mod health;
pub mod logging;
