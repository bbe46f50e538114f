//! Daily KPI snapshot model
//!
//! A snapshot is the fully recomputed aggregate for one calendar day. It is
//! replaced wholesale on every aggregation run and never patched. All maps
//! are ordered so that serialising the same snapshot twice yields identical
//! bytes.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::order::{GuestBreakdown, ServiceType};

const NOT_APPLICABLE: &str = "n/a";

/// Percentage that may be undefined when its denominator is zero.
///
/// Serialises as a number, or as `"n/a"` when not applicable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rate {
    Value(f64),
    NotApplicable,
}

impl Rate {
    /// `numerator / denominator * 100`, or `NotApplicable` for a zero
    /// denominator.
    pub fn percent(numerator: f64, denominator: f64) -> Self {
        if denominator == 0.0 {
            Self::NotApplicable
        } else {
            Self::Value(numerator / denominator * 100.0)
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(value) => Some(value),
            Self::NotApplicable => None,
        }
    }

    pub fn is_applicable(self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Round a defined rate to `places` decimal places.
    pub fn rounded(self, places: u32) -> Self {
        match self {
            Self::Value(value) => Self::Value(round_to(value, places)),
            Self::NotApplicable => Self::NotApplicable,
        }
    }
}

impl Serialize for Rate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(value) => serializer.serialize_f64(*value),
            Self::NotApplicable => serializer.serialize_str(NOT_APPLICABLE),
        }
    }
}

impl<'de> Deserialize<'de> for Rate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(f64),
            Label(String),
            Null(()),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Self::Value(value),
            Repr::Label(_) | Repr::Null(()) => Self::NotApplicable,
        })
    }
}

/// Round half away from zero to `places` decimal places.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Metrics for one service-type bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTypeMetrics {
    pub orders: u32,
    pub guests: u32,
    pub bottles: u32,
    pub revenue: f64,
    pub non_club_guests: u32,
    pub guests_who_bought_bottles: u32,
    pub guests_who_signed_up_for_club: u32,
    pub bottle_conversion_rate: f64,
    pub club_conversion_rate: Rate,
    pub aov: f64,
}

/// Metrics for one sales associate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociateMetrics {
    pub orders: u32,
    pub guests: u32,
    pub bottles: u32,
    pub revenue: f64,
    /// Guests on orders that included a wine-bottle purchase.
    pub wine_bottle_sales: u32,
    pub club_signups: u32,
    pub non_club_guests: u32,
    pub wine_bottle_conversion_rate: f64,
    /// `club_signups ÷ non_club_guests`, capped at 100.
    pub club_conversion_rate: Rate,
}

/// Order counts by guest/wine composition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMix {
    /// Guest items, no wine bottles.
    pub guest_only_orders: u32,
    /// Wine bottles, no guest items.
    pub wine_only_orders: u32,
    /// Both guest items and wine bottles.
    pub mixed_orders: u32,
}

impl OrderMix {
    /// Orders that served guests, with or without wine.
    pub fn guest_experiences(&self) -> u32 {
        self.guest_only_orders.saturating_add(self.mixed_orders)
    }
}

/// One row per calendar day, keyed by `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyKpiSnapshot {
    pub date: NaiveDate,
    pub total_revenue: f64,
    pub total_orders: u32,
    pub total_guests: u32,
    pub total_bottles_sold: u32,
    pub subtotal: f64,
    pub tax_total: f64,
    pub tip_total: f64,
    pub grand_total: f64,
    pub avg_order_value: f64,
    pub avg_guests_per_order: f64,
    /// Guests on bottle-buying orders ÷ all guests.
    pub wine_bottle_conversion_rate: f64,
    /// Attributed club signups ÷ non-club-and-trade guests.
    ///
    /// The numerator counts customers while the denominator counts guests,
    /// so the raw ratio can pass 100. It is capped at 100 here; the
    /// uncapped inputs stay available as `club_signups` and the per-associate
    /// `club_signups` / `non_club_guests` counts.
    pub club_conversion_rate: Rate,
    /// Mixed orders ÷ guest-serving orders.
    pub conversion_rate: f64,
    pub club_signups: u32,
    pub order_mix: OrderMix,
    pub service_type_breakdown: BTreeMap<ServiceType, ServiceTypeMetrics>,
    pub associate_performance: BTreeMap<String, AssociateMetrics>,
    pub guest_breakdown: GuestBreakdown,
}
