//! Canonical order record and its classification enums

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{
    CLUB_MEMBER_GUEST_PRODUCT_ID, NON_CLUB_GUEST_PRODUCT_ID, TRADE_GUEST_PRODUCT_ID,
};
use crate::impl_domain_status_conversions;

/// Normalized order, upserted by `id`.
///
/// Monetary fields are in major currency units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Upstream paid (or created) timestamp, verbatim.
    pub order_date: String,
    pub customer_id: Option<String>,
    pub associate_name: String,
    pub total: f64,
    pub subtotal: f64,
    pub tax: f64,
    pub tip: f64,
    pub guest_count: u32,
    pub bottle_count: u32,
    pub has_wine_bottles: bool,
    pub service_type: ServiceType,
    pub guest_breakdown: GuestBreakdown,
    pub raw_data: Value,
}

impl Order {
    /// Calendar day the order belongs to (`order_date` truncated to
    /// `YYYY-MM-DD`). `None` when the timestamp is missing or malformed.
    pub fn order_day(&self) -> Option<NaiveDate> {
        let prefix = self.order_date.get(..10)?;
        NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
    }

    /// Revenue as used by KPI arithmetic: subtotal plus tax (tips excluded).
    pub fn revenue(&self) -> f64 {
        self.subtotal + self.tax
    }

    /// Zero-value and refund transactions are stored but never aggregated.
    pub fn is_revenue_bearing(&self) -> bool {
        self.revenue() > 0.0
    }
}

/// Mutually exclusive service context of an order.
///
/// Declaration order is the resolution priority and the ordering of
/// breakdown maps.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum ServiceType {
    Tasting,
    Dining,
    ByTheGlass,
    #[default]
    Retail,
}

impl_domain_status_conversions!(ServiceType {
    Tasting => "tasting",
    Dining => "dining",
    ByTheGlass => "byTheGlass",
    Retail => "retail",
});

impl ServiceType {
    pub const ALL: [ServiceType; 4] =
        [ServiceType::Tasting, ServiceType::Dining, ServiceType::ByTheGlass, ServiceType::Retail];
}

/// Guest class signalled by a guest-type catalog product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GuestType {
    #[serde(rename = "Non-Club Guest")]
    NonClubGuest,
    #[serde(rename = "Club Member")]
    ClubMember,
    #[serde(rename = "Trade Guest")]
    TradeGuest,
}

impl GuestType {
    /// Look up the guest class for a catalog product id.
    pub fn from_product_id(product_id: &str) -> Option<Self> {
        match product_id {
            NON_CLUB_GUEST_PRODUCT_ID => Some(Self::NonClubGuest),
            CLUB_MEMBER_GUEST_PRODUCT_ID => Some(Self::ClubMember),
            TRADE_GUEST_PRODUCT_ID => Some(Self::TradeGuest),
            _ => None,
        }
    }

    /// Guests who could still be converted into club members.
    pub fn is_club_prospect(self) -> bool {
        matches!(self, Self::NonClubGuest | Self::TradeGuest)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NonClubGuest => "Non-Club Guest",
            Self::ClubMember => "Club Member",
            Self::TradeGuest => "Trade Guest",
        }
    }
}

/// Guest counts keyed by guest class. Counts saturate at `u32::MAX`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuestBreakdown(BTreeMap<GuestType, u32>);

impl GuestBreakdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, guest_type: GuestType, count: u32) {
        let slot = self.0.entry(guest_type).or_insert(0);
        *slot = slot.saturating_add(count);
    }

    pub fn get(&self, guest_type: GuestType) -> u32 {
        self.0.get(&guest_type).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.0.values().fold(0, |total, count| total.saturating_add(*count))
    }

    /// Non-club plus trade guests: the club-conversion denominator.
    pub fn club_prospects(&self) -> u32 {
        self.0
            .iter()
            .filter(|(kind, _)| kind.is_club_prospect())
            .fold(0, |total, (_, count)| total.saturating_add(*count))
    }

    pub fn merge(&mut self, other: &GuestBreakdown) {
        for (kind, count) in &other.0 {
            self.add(*kind, *count);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GuestType, u32)> + '_ {
        self.0.iter().map(|(kind, count)| (*kind, *count))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn order_dated(order_date: &str) -> Order {
        Order {
            id: "ord".into(),
            order_date: order_date.into(),
            customer_id: None,
            associate_name: "Unknown".into(),
            total: 0.0,
            subtotal: 0.0,
            tax: 0.0,
            tip: 0.0,
            guest_count: 0,
            bottle_count: 0,
            has_wine_bottles: false,
            service_type: ServiceType::Retail,
            guest_breakdown: GuestBreakdown::new(),
            raw_data: json!({}),
        }
    }

    #[test]
    fn order_day_truncates_timestamp() {
        let order = order_dated("2024-06-01T23:59:59.000Z");
        assert_eq!(order.order_day(), NaiveDate::from_ymd_opt(2024, 6, 1));
    }

    #[test]
    fn order_day_is_none_for_malformed_dates() {
        assert_eq!(order_dated("").order_day(), None);
        assert_eq!(order_dated("yesterday").order_day(), None);
    }

    #[test]
    fn revenue_bearing_requires_positive_subtotal_plus_tax() {
        let mut order = order_dated("2024-06-01");
        assert!(!order.is_revenue_bearing());
        order.tip = 5.0;
        assert!(!order.is_revenue_bearing());
        order.subtotal = 40.0;
        order.tax = 4.0;
        assert!(order.is_revenue_bearing());
        assert!((order.revenue() - 44.0).abs() < f64::EPSILON);
    }

    #[test]
    fn guest_breakdown_counts_saturate() {
        let mut breakdown = GuestBreakdown::new();
        breakdown.add(GuestType::NonClubGuest, u32::MAX);
        breakdown.add(GuestType::NonClubGuest, 1);
        breakdown.add(GuestType::TradeGuest, 3);

        let mut merged = breakdown.clone();
        merged.merge(&breakdown);

        assert_eq!(breakdown.get(GuestType::NonClubGuest), u32::MAX);
        assert_eq!(breakdown.total(), u32::MAX);
        assert_eq!(merged.club_prospects(), u32::MAX);
        assert_eq!(merged.get(GuestType::TradeGuest), 6);
    }

    #[test]
    fn guest_breakdown_serializes_with_labels() {
        let mut breakdown = GuestBreakdown::new();
        breakdown.add(GuestType::NonClubGuest, 2);
        breakdown.add(GuestType::TradeGuest, 1);
        breakdown.add(GuestType::ClubMember, 3);

        assert_eq!(breakdown.total(), 6);
        assert_eq!(breakdown.club_prospects(), 3);

        let json = serde_json::to_value(&breakdown).expect("serialize");
        assert_eq!(json, json!({ "Non-Club Guest": 2, "Club Member": 3, "Trade Guest": 1 }));

        let back: GuestBreakdown = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, breakdown);
    }

    #[test]
    fn service_type_uses_camel_case_names() {
        assert_eq!(ServiceType::ByTheGlass.to_string(), "byTheGlass");
        assert_eq!(serde_json::to_value(ServiceType::ByTheGlass).unwrap(), json!("byTheGlass"));
        assert_eq!("retail".parse::<ServiceType>().unwrap(), ServiceType::Retail);
    }

    #[test]
    fn guest_type_lookup_by_product_id() {
        assert_eq!(
            GuestType::from_product_id(NON_CLUB_GUEST_PRODUCT_ID),
            Some(GuestType::NonClubGuest)
        );
        assert_eq!(GuestType::from_product_id("some-wine"), None);
        assert!(GuestType::TradeGuest.is_club_prospect());
        assert!(!GuestType::ClubMember.is_club_prospect());
    }
}
