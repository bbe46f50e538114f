//! Order ingestion: normalization of upstream payloads and staff extraction

pub mod normalizer;
pub mod ports;
pub mod staff;

pub use normalizer::{classify_items, classify_payload, ItemClassification, OrderNormalizer};
pub use staff::extract_staff;
