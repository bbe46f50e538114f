//! Daily KPI aggregation
//!
//! [`aggregate_day`] is a pure function of one day's orders and club
//! signups. Only revenue-bearing orders (`subtotal + tax > 0`) contribute.
//! Sums are kept at full precision and rounded once when the snapshot is
//! built.

use std::collections::BTreeMap;
use std::sync::Arc;

use cellarsync_domain::constants::UNKNOWN_ASSOCIATE;
use cellarsync_domain::{
    round_to, AssociateMetrics, ClubSignup, DailyKpiSnapshot, DateRange, GuestBreakdown, Order,
    OrderMix, Rate, Result, ServiceType, ServiceTypeMetrics,
};
use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use super::attribution::ClubSignupAttributor;
use super::ports::{ClubSignupRepository, KpiSnapshotRepository};
use crate::orders::ports::OrderRepository;
use crate::orders::{classify_payload, ItemClassification};

const MONEY_PLACES: u32 = 2;
const RATE_PLACES: u32 = 2;

#[derive(Debug, Default)]
struct ServiceTally {
    orders: u32,
    guests: u32,
    bottles: u32,
    revenue: f64,
    non_club_guests: u32,
    guests_who_bought_bottles: u32,
    guests_who_signed_up_for_club: u32,
}

impl ServiceTally {
    fn finish(&self) -> ServiceTypeMetrics {
        ServiceTypeMetrics {
            orders: self.orders,
            guests: self.guests,
            bottles: self.bottles,
            revenue: round_to(self.revenue, MONEY_PLACES),
            non_club_guests: self.non_club_guests,
            guests_who_bought_bottles: self.guests_who_bought_bottles,
            guests_who_signed_up_for_club: self.guests_who_signed_up_for_club,
            bottle_conversion_rate: round_to(
                percent_or_zero(self.guests_who_bought_bottles, self.guests),
                RATE_PLACES,
            ),
            club_conversion_rate: club_rate(self.guests_who_signed_up_for_club, self.non_club_guests),
            aov: round_to(average(self.revenue, self.orders), MONEY_PLACES),
        }
    }
}

#[derive(Debug, Default)]
struct AssociateTally {
    orders: u32,
    guests: u32,
    bottles: u32,
    revenue: f64,
    wine_bottle_sales: u32,
    club_signups: u32,
    non_club_guests: u32,
}

impl AssociateTally {
    fn finish(&self) -> AssociateMetrics {
        AssociateMetrics {
            orders: self.orders,
            guests: self.guests,
            bottles: self.bottles,
            revenue: round_to(self.revenue, MONEY_PLACES),
            wine_bottle_sales: self.wine_bottle_sales,
            club_signups: self.club_signups,
            non_club_guests: self.non_club_guests,
            wine_bottle_conversion_rate: round_to(
                percent_or_zero(self.wine_bottle_sales, self.guests),
                RATE_PLACES,
            ),
            club_conversion_rate: club_rate(self.club_signups, self.non_club_guests),
        }
    }
}

#[derive(Debug, Default)]
struct DayTally {
    revenue: f64,
    subtotal: f64,
    tax: f64,
    tip: f64,
    grand_total: f64,
    orders: u32,
    guests: u32,
    non_club_guests: u32,
    bottles: u32,
    order_mix: OrderMix,
    guest_breakdown: GuestBreakdown,
    services: BTreeMap<ServiceType, ServiceTally>,
    associates: BTreeMap<String, AssociateTally>,
}

impl DayTally {
    fn fold(&mut self, order: &Order, attributor: &mut ClubSignupAttributor) {
        let items =
            classify_payload(&order.raw_data).unwrap_or_else(|| ItemClassification::from_order(order));
        let revenue = order.revenue();
        let associate_name = if order.associate_name.trim().is_empty() {
            UNKNOWN_ASSOCIATE
        } else {
            order.associate_name.as_str()
        };

        self.orders = self.orders.saturating_add(1);
        self.revenue += revenue;
        self.subtotal += order.subtotal;
        self.tax += order.tax;
        self.tip += order.tip;
        self.grand_total += order.total;
        self.bottles = self.bottles.saturating_add(items.bottle_count);
        self.guest_breakdown.merge(&items.guest_breakdown);

        let service = self.services.entry(items.service_type).or_default();
        service.orders = service.orders.saturating_add(1);
        service.guests = service.guests.saturating_add(items.guest_count);
        service.bottles = service.bottles.saturating_add(items.bottle_count);
        service.revenue += revenue;
        service.non_club_guests = service.non_club_guests.saturating_add(items.club_prospects);
        if items.has_wine_bottles && items.guest_count > 0 {
            service.guests_who_bought_bottles =
                service.guests_who_bought_bottles.saturating_add(items.guest_count);
        }

        let associate = self.associates.entry(associate_name.to_string()).or_default();
        associate.orders = associate.orders.saturating_add(1);
        associate.revenue += revenue;
        associate.bottles = associate.bottles.saturating_add(items.bottle_count);

        if attributor.attribute(order, items.service_type).is_some() {
            associate.club_signups = associate.club_signups.saturating_add(1);
            service.guests_who_signed_up_for_club =
                service.guests_who_signed_up_for_club.saturating_add(1);
        }

        if items.guest_count > 0 {
            self.guests = self.guests.saturating_add(items.guest_count);
            self.non_club_guests = self.non_club_guests.saturating_add(items.club_prospects);
            associate.guests = associate.guests.saturating_add(items.guest_count);
            associate.non_club_guests =
                associate.non_club_guests.saturating_add(items.club_prospects);
            if items.has_wine_bottles {
                associate.wine_bottle_sales =
                    associate.wine_bottle_sales.saturating_add(items.guest_count);
            }
        }

        let mix = &mut self.order_mix;
        match (items.has_guest_items, items.has_wine_bottles) {
            (true, false) => mix.guest_only_orders = mix.guest_only_orders.saturating_add(1),
            (false, true) => mix.wine_only_orders = mix.wine_only_orders.saturating_add(1),
            (true, true) => mix.mixed_orders = mix.mixed_orders.saturating_add(1),
            (false, false) => {}
        }
    }

    fn finish(self, date: NaiveDate, club_signups: u32) -> DailyKpiSnapshot {
        let service_type_breakdown: BTreeMap<ServiceType, ServiceTypeMetrics> = ServiceType::ALL
            .iter()
            .map(|kind| {
                let metrics = self.services.get(kind).map(ServiceTally::finish);
                (*kind, metrics.unwrap_or_else(|| ServiceTally::default().finish()))
            })
            .collect();
        let guests_who_bought_bottles = self
            .services
            .values()
            .fold(0_u32, |total, service| total.saturating_add(service.guests_who_bought_bottles));

        DailyKpiSnapshot {
            date,
            total_revenue: round_to(self.revenue, MONEY_PLACES),
            total_orders: self.orders,
            total_guests: self.guests,
            total_bottles_sold: self.bottles,
            subtotal: round_to(self.subtotal, MONEY_PLACES),
            tax_total: round_to(self.tax, MONEY_PLACES),
            tip_total: round_to(self.tip, MONEY_PLACES),
            grand_total: round_to(self.grand_total, MONEY_PLACES),
            avg_order_value: round_to(average(self.revenue, self.orders), MONEY_PLACES),
            avg_guests_per_order: round_to(
                average(f64::from(self.guests), self.orders),
                RATE_PLACES,
            ),
            wine_bottle_conversion_rate: round_to(
                percent_or_zero(guests_who_bought_bottles, self.guests),
                RATE_PLACES,
            ),
            club_conversion_rate: club_rate(club_signups, self.non_club_guests),
            conversion_rate: round_to(
                percent_or_zero(self.order_mix.mixed_orders, self.order_mix.guest_experiences()),
                RATE_PLACES,
            ),
            club_signups,
            order_mix: self.order_mix,
            service_type_breakdown,
            associate_performance: self
                .associates
                .iter()
                .map(|(name, tally)| (name.clone(), tally.finish()))
                .collect(),
            guest_breakdown: self.guest_breakdown,
        }
    }
}

fn percent_or_zero(numerator: u32, denominator: u32) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        f64::from(numerator) / f64::from(denominator) * 100.0
    }
}

fn average(sum: f64, count: u32) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}

/// Signups counted per customer over prospects counted per guest. The two
/// units differ, so the ratio is capped at 100.
fn club_rate(signups: u32, prospects: u32) -> Rate {
    match Rate::percent(f64::from(signups), f64::from(prospects)) {
        Rate::Value(value) => Rate::Value(value.min(100.0)),
        Rate::NotApplicable => Rate::NotApplicable,
    }
    .rounded(RATE_PLACES)
}

/// Build the snapshot for `date`.
///
/// Orders and signups for other days are ignored, as are orders that do not
/// bear revenue. Orders are folded in `(order_date, id)` order so first-touch
/// attribution does not depend on the order in which they were loaded.
pub fn aggregate_day<'a>(
    date: NaiveDate,
    orders: impl IntoIterator<Item = &'a Order>,
    signups: impl IntoIterator<Item = &'a ClubSignup>,
) -> DailyKpiSnapshot {
    let mut day_orders: Vec<&Order> = orders
        .into_iter()
        .filter(|order| order.order_day() == Some(date) && order.is_revenue_bearing())
        .collect();
    day_orders.sort_by(|a, b| a.order_date.cmp(&b.order_date).then_with(|| a.id.cmp(&b.id)));

    let mut attributor = ClubSignupAttributor::new(
        signups.into_iter().filter(|signup| signup.signup_date == date),
    );
    let mut tally = DayTally::default();
    for order in day_orders {
        tally.fold(order, &mut attributor);
    }

    let club_signups = u32::try_from(attributor.credited_count()).unwrap_or(u32::MAX);
    tally.finish(date, club_signups)
}

/// Group orders by calendar day. Orders with an unparseable date are dropped.
pub fn group_by_day(orders: &[Order]) -> BTreeMap<NaiveDate, Vec<&Order>> {
    let mut days: BTreeMap<NaiveDate, Vec<&Order>> = BTreeMap::new();
    for order in orders {
        if let Some(day) = order.order_day() {
            days.entry(day).or_default().push(order);
        }
    }
    days
}

/// Recomputes and replaces snapshots from persisted orders and signups.
pub struct KpiAggregator {
    orders: Arc<dyn OrderRepository>,
    signups: Arc<dyn ClubSignupRepository>,
    snapshots: Arc<dyn KpiSnapshotRepository>,
}

impl KpiAggregator {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        signups: Arc<dyn ClubSignupRepository>,
        snapshots: Arc<dyn KpiSnapshotRepository>,
    ) -> Self {
        Self { orders, signups, snapshots }
    }

    /// Rebuild one snapshot per day in `range` that has at least one order.
    /// Returns the number of snapshots written.
    #[instrument(skip_all, fields(range = %range))]
    pub async fn recompute(&self, range: DateRange) -> Result<u64> {
        let orders = self.orders.find_orders_in_range(range).await?;
        if orders.is_empty() {
            info!("No orders found for KPI calculation");
            return Ok(0);
        }

        let signups = self.signups.find_signups_in_range(range).await?;
        let mut signups_by_day: BTreeMap<NaiveDate, Vec<&ClubSignup>> = BTreeMap::new();
        for signup in &signups {
            signups_by_day.entry(signup.signup_date).or_default().push(signup);
        }

        let mut written = 0;
        for (day, day_orders) in group_by_day(&orders) {
            if !range.contains(day) {
                continue;
            }
            let day_signups = signups_by_day.get(&day).map(Vec::as_slice).unwrap_or_default();
            let snapshot =
                aggregate_day(day, day_orders.iter().copied(), day_signups.iter().copied());
            self.snapshots.upsert_snapshot(&snapshot).await?;
            debug!(
                date = %day,
                orders = snapshot.total_orders,
                revenue = snapshot.total_revenue,
                "KPI snapshot upserted"
            );
            written += 1;
        }

        info!(snapshots = written, "Daily KPI calculation complete");
        Ok(written)
    }
}
