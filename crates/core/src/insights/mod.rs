//! Inputs for the external insight generator
//!
//! Text generation lives outside this crate. These types assemble what it
//! consumes: a day's snapshot with its trailing window, and order-derived
//! metrics for a single associate.

use cellarsync_domain::constants::INSIGHT_TRAILING_DAYS;
use cellarsync_domain::{round_to, DailyKpiSnapshot, DateRange, Order, Result};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::kpi::ports::KpiSnapshotRepository;
use crate::orders::ports::OrderRepository;

/// Order-derived performance for one associate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StaffMetrics {
    pub total_orders: u32,
    /// Sum of order grand totals.
    pub total_revenue: f64,
    pub avg_order_value: f64,
    /// Orders with guests and bottles over orders with guests.
    pub wine_conversion_rate: f64,
}

impl StaffMetrics {
    pub fn from_orders(orders: &[Order]) -> Self {
        let total_orders = u32::try_from(orders.len()).unwrap_or(u32::MAX);
        let total_revenue: f64 = orders.iter().map(|order| order.total).sum();
        let guest_orders = orders.iter().filter(|order| order.guest_count > 0).count();
        let converted = orders
            .iter()
            .filter(|order| order.guest_count > 0 && order.bottle_count > 0)
            .count();

        let avg_order_value =
            if total_orders == 0 { 0.0 } else { total_revenue / f64::from(total_orders) };
        let wine_conversion_rate = if guest_orders == 0 {
            0.0
        } else {
            count_as_f64(converted) / count_as_f64(guest_orders) * 100.0
        };

        Self {
            total_orders,
            total_revenue: round_to(total_revenue, 2),
            avg_order_value: round_to(avg_order_value, 2),
            wine_conversion_rate: round_to(wine_conversion_rate, 2),
        }
    }

    /// Load an associate's orders for `range` and summarize them.
    pub async fn load(
        orders: &dyn OrderRepository,
        associate_name: &str,
        range: DateRange,
    ) -> Result<Self> {
        let orders = orders.find_orders_for_associate(associate_name, range).await?;
        Ok(Self::from_orders(&orders))
    }
}

fn count_as_f64(count: usize) -> f64 {
    f64::from(u32::try_from(count).unwrap_or(u32::MAX))
}

/// A day's snapshot plus the snapshots leading up to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightContext {
    pub date: NaiveDate,
    pub snapshot: Option<DailyKpiSnapshot>,
    /// Snapshots for the preceding days, ascending by date.
    pub trailing: Vec<DailyKpiSnapshot>,
}

impl InsightContext {
    pub async fn load(snapshots: &dyn KpiSnapshotRepository, date: NaiveDate) -> Result<Self> {
        let snapshot = snapshots.find_snapshot(date).await?;
        let trailing = match date.pred_opt() {
            Some(previous_day) => {
                let window = DateRange::trailing(previous_day, INSIGHT_TRAILING_DAYS - 1);
                let mut trailing = snapshots.find_snapshots_in_range(window).await?;
                trailing.sort_by_key(|snapshot| snapshot.date);
                trailing
            }
            None => Vec::new(),
        };
        Ok(Self { date, snapshot, trailing })
    }

    /// First day covered by the trailing window.
    pub fn window_start(&self) -> NaiveDate {
        self.date - Duration::days(INSIGHT_TRAILING_DAYS)
    }
}
