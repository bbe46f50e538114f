//! Daily KPI aggregation and club signup attribution

pub mod aggregator;
pub mod attribution;
pub mod ports;

pub use aggregator::{aggregate_day, group_by_day, KpiAggregator};
pub use attribution::{Attribution, ClubSignupAttributor};
