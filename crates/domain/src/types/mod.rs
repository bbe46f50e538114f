//! Domain types and models

pub mod club;
pub mod kpi;
pub mod order;
pub mod range;
pub mod raw;
pub mod staff;
pub mod sync_log;

pub use club::ClubSignup;
pub use kpi::{round_to, AssociateMetrics, DailyKpiSnapshot, OrderMix, Rate, ServiceTypeMetrics};
pub use order::{GuestBreakdown, GuestType, Order, ServiceType};
pub use range::{parse_day, DateRange};
pub use raw::{RawClubMembership, RawLineItem, RawOrder, RawSalesAssociate};
pub use staff::StaffMember;
pub use sync_log::{SyncLog, SyncReport, SyncStatus, SyncType};
