//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Catalog: guest-type product identifiers
pub const NON_CLUB_GUEST_PRODUCT_ID: &str = "fe778da9-5164-4688-acd2-98d044d7ce84";
pub const CLUB_MEMBER_GUEST_PRODUCT_ID: &str = "75d4f6cf-cf69-4e76-8f3b-bb35cc7ddeb3";
pub const TRADE_GUEST_PRODUCT_ID: &str = "718b9fbb-4e23-48c7-8b2d-da86d2624b36";

// Catalog: department identifiers
pub const WINE_BOTTLE_DEPARTMENT_ID: &str = "7f3a16cc-62b3-4625-b995-e4a3af41e441";
pub const TASTING_DEPARTMENT_ID: &str = "8571508b-bcfe-4d96-b12d-0a2b941bc3f1";
pub const DINING_DEPARTMENT_ID: &str = "3b4ae488-af0a-4f72-955e-571dfabea081";
pub const WINE_BY_THE_GLASS_DEPARTMENT_ID: &str = "b95fae3f-7671-47ea-82f6-617a7ce4b826";

// Order normalization
pub const UNKNOWN_ASSOCIATE: &str = "Unknown";
pub const MINOR_UNITS_PER_MAJOR: f64 = 100.0;
pub const DEFAULT_STAFF_ROLE: &str = "associate";

// Upstream fetch policy defaults
pub const DEFAULT_COMMERCE7_BASE_URL: &str = "https://api.commerce7.com/v1";
pub const DEFAULT_PAGE_SIZE: u32 = 50;
pub const DEFAULT_MAX_PAGES: u32 = 100;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_PAGE_DELAY_MS: u64 = 2_000;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

// Sync defaults
pub const DEFAULT_HISTORY_START: &str = "2022-04-01";
pub const RECENT_SYNC_DAYS: i64 = 7;
pub const INSIGHT_TRAILING_DAYS: i64 = 30;

// Storage / server defaults
pub const DEFAULT_DB_PATH: &str = "cellarsync.db";
pub const DEFAULT_DB_POOL_SIZE: u32 = 4;
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
