//! Raw order → canonical [`Order`] transformation
//!
//! Normalization is total: malformed or missing line-item fields count as
//! zero quantity / no match and never produce an error.

use cellarsync_domain::constants::{
    DINING_DEPARTMENT_ID, MINOR_UNITS_PER_MAJOR, TASTING_DEPARTMENT_ID, UNKNOWN_ASSOCIATE,
    WINE_BOTTLE_DEPARTMENT_ID, WINE_BY_THE_GLASS_DEPARTMENT_ID,
};
use cellarsync_domain::{GuestBreakdown, GuestType, Order, RawLineItem, RawOrder, ServiceType};
use serde::Deserialize;
use serde_json::Value;

/// Per-order facts derived from line items.
///
/// Shared by the normalizer and the aggregator, which re-derives these flags
/// from the stored `raw_data` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemClassification {
    pub guest_breakdown: GuestBreakdown,
    pub guest_count: u32,
    /// Guests who are not yet club members (non-club and trade).
    pub club_prospects: u32,
    pub bottle_count: u32,
    pub has_guest_items: bool,
    pub has_wine_bottles: bool,
    pub service_type: ServiceType,
}

#[derive(Default)]
struct ServiceFlags {
    tasting: bool,
    dining: bool,
    by_the_glass: bool,
}

impl ServiceFlags {
    fn observe(&mut self, department_id: &str) {
        match department_id {
            TASTING_DEPARTMENT_ID => self.tasting = true,
            DINING_DEPARTMENT_ID => self.dining = true,
            WINE_BY_THE_GLASS_DEPARTMENT_ID => self.by_the_glass = true,
            _ => {}
        }
    }

    /// tasting > dining > byTheGlass > retail
    fn resolve(&self) -> ServiceType {
        if self.tasting {
            ServiceType::Tasting
        } else if self.dining {
            ServiceType::Dining
        } else if self.by_the_glass {
            ServiceType::ByTheGlass
        } else {
            ServiceType::Retail
        }
    }
}

/// Classify line items by guest product and department identifiers.
pub fn classify_items(items: &[RawLineItem]) -> ItemClassification {
    let mut classification = ItemClassification::default();
    let mut flags = ServiceFlags::default();

    for item in items {
        if let Some(guest_type) = item.product_id.as_deref().and_then(GuestType::from_product_id) {
            classification.guest_breakdown.add(guest_type, item.quantity);
            classification.guest_count = classification.guest_count.saturating_add(item.quantity);
            classification.has_guest_items = true;
            if guest_type.is_club_prospect() {
                classification.club_prospects =
                    classification.club_prospects.saturating_add(item.quantity);
            }
        }

        let Some(department_id) = item.department_id.as_deref() else {
            continue;
        };
        if department_id == WINE_BOTTLE_DEPARTMENT_ID {
            classification.has_wine_bottles = true;
            classification.bottle_count = classification.bottle_count.saturating_add(item.quantity);
        }
        flags.observe(department_id);
    }

    classification.service_type = flags.resolve();
    classification
}

/// Re-derive the classification from a stored upstream payload.
///
/// Returns `None` when the payload carries no `items` array.
pub fn classify_payload(raw_data: &Value) -> Option<ItemClassification> {
    let items = raw_data.get("items")?.as_array()?;
    let items: Vec<RawLineItem> =
        items.iter().map(|item| RawLineItem::deserialize(item).unwrap_or_default()).collect();
    Some(classify_items(&items))
}

impl ItemClassification {
    /// Rebuild from the normalized columns of an order.
    pub fn from_order(order: &Order) -> Self {
        Self {
            guest_breakdown: order.guest_breakdown.clone(),
            guest_count: order.guest_count,
            club_prospects: order.guest_breakdown.club_prospects(),
            bottle_count: order.bottle_count,
            has_guest_items: !order.guest_breakdown.is_empty(),
            has_wine_bottles: order.has_wine_bottles,
            service_type: order.service_type,
        }
    }
}

/// Maps upstream orders onto the canonical record.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderNormalizer;

impl OrderNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, raw: &RawOrder) -> Order {
        let classification = classify_items(&raw.items);
        let order_date = raw
            .order_paid_date
            .clone()
            .or_else(|| raw.created_at.clone())
            .unwrap_or_default();

        Order {
            id: raw.id.clone(),
            order_date,
            customer_id: raw.customer_id.clone(),
            associate_name: raw.associate_name().unwrap_or(UNKNOWN_ASSOCIATE).to_string(),
            total: to_major(raw.total),
            subtotal: to_major(raw.sub_total),
            tax: to_major(raw.tax_total),
            tip: to_major(raw.tip),
            guest_count: classification.guest_count,
            bottle_count: classification.bottle_count,
            has_wine_bottles: classification.has_wine_bottles,
            service_type: classification.service_type,
            guest_breakdown: classification.guest_breakdown,
            raw_data: raw.payload.clone(),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn to_major(minor: i64) -> f64 {
    minor as f64 / MINOR_UNITS_PER_MAJOR
}

#[cfg(test)]
mod tests {
    use cellarsync_domain::constants::{
        CLUB_MEMBER_GUEST_PRODUCT_ID, NON_CLUB_GUEST_PRODUCT_ID, TRADE_GUEST_PRODUCT_ID,
    };
    use serde_json::json;

    use super::*;

    fn normalize(payload: Value) -> Order {
        OrderNormalizer::new().normalize(&RawOrder::from_payload(payload))
    }

    #[test]
    fn oversized_quantities_saturate_instead_of_overflowing() {
        let order = normalize(json!({
            "id": "ord-huge",
            "orderPaidDate": "2024-06-01T18:00:00.000Z",
            "subTotal": 1000,
            "items": [
                { "productId": NON_CLUB_GUEST_PRODUCT_ID, "quantity": 1e12 },
                { "productId": NON_CLUB_GUEST_PRODUCT_ID, "quantity": 1 },
                { "productId": TRADE_GUEST_PRODUCT_ID, "quantity": 5 },
                { "productId": "wine-1", "departmentId": WINE_BOTTLE_DEPARTMENT_ID, "quantity": 1e12 },
                { "productId": "wine-2", "departmentId": WINE_BOTTLE_DEPARTMENT_ID, "quantity": 2 }
            ]
        }));

        assert_eq!(order.guest_count, u32::MAX);
        assert_eq!(order.bottle_count, u32::MAX);
        assert_eq!(order.guest_breakdown.get(GuestType::NonClubGuest), u32::MAX);
        assert_eq!(order.guest_breakdown.total(), u32::MAX);
        assert_eq!(order.guest_breakdown.club_prospects(), u32::MAX);
    }

    #[test]
    fn converts_minor_units_and_counts_guests_and_bottles() {
        let order = normalize(json!({
            "id": "ord-1",
            "orderPaidDate": "2024-06-01T18:00:00.000Z",
            "customerId": "cust-1",
            "salesAssociate": { "name": "Jane" },
            "total": 4850,
            "subTotal": 4000,
            "taxTotal": 400,
            "tip": 450,
            "items": [
                { "productId": NON_CLUB_GUEST_PRODUCT_ID, "quantity": 2 },
                { "productId": CLUB_MEMBER_GUEST_PRODUCT_ID, "quantity": 1 },
                { "productId": "wine-1", "departmentId": WINE_BOTTLE_DEPARTMENT_ID, "quantity": 3 },
                { "productId": "flight", "departmentId": TASTING_DEPARTMENT_ID, "quantity": 3 }
            ]
        }));

        assert_eq!(order.id, "ord-1");
        assert_eq!(order.associate_name, "Jane");
        assert!((order.total - 48.5).abs() < 1e-9);
        assert!((order.subtotal - 40.0).abs() < 1e-9);
        assert!((order.tax - 4.0).abs() < 1e-9);
        assert!((order.tip - 4.5).abs() < 1e-9);
        assert_eq!(order.guest_count, 3);
        assert_eq!(order.guest_breakdown.get(GuestType::NonClubGuest), 2);
        assert_eq!(order.guest_breakdown.get(GuestType::ClubMember), 1);
        assert_eq!(order.bottle_count, 3);
        assert!(order.has_wine_bottles);
        assert_eq!(order.service_type, ServiceType::Tasting);
        assert_eq!(order.raw_data["id"], "ord-1");
    }

    #[test]
    fn service_type_follows_priority_order() {
        let dining_and_glass = normalize(json!({
            "id": "a",
            "items": [
                { "departmentId": WINE_BY_THE_GLASS_DEPARTMENT_ID, "quantity": 1 },
                { "departmentId": DINING_DEPARTMENT_ID, "quantity": 1 }
            ]
        }));
        assert_eq!(dining_and_glass.service_type, ServiceType::Dining);

        let glass_only = normalize(json!({
            "id": "b",
            "items": [{ "departmentId": WINE_BY_THE_GLASS_DEPARTMENT_ID, "quantity": 1 }]
        }));
        assert_eq!(glass_only.service_type, ServiceType::ByTheGlass);

        let bottles_only = normalize(json!({
            "id": "c",
            "items": [{ "departmentId": WINE_BOTTLE_DEPARTMENT_ID, "quantity": 6 }]
        }));
        assert_eq!(bottles_only.service_type, ServiceType::Retail);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let order = normalize(json!({
            "id": "ord-2",
            "createdAt": "2024-06-02T09:00:00.000Z",
            "items": [
                { "productId": TRADE_GUEST_PRODUCT_ID },
                { "productId": TRADE_GUEST_PRODUCT_ID, "quantity": "two" },
                42
            ]
        }));

        assert_eq!(order.order_date, "2024-06-02T09:00:00.000Z");
        assert_eq!(order.associate_name, UNKNOWN_ASSOCIATE);
        assert_eq!(order.customer_id, None);
        assert_eq!(order.guest_count, 0);
        assert_eq!(order.bottle_count, 0);
        assert!(order.total.abs() < f64::EPSILON);
        assert_eq!(order.service_type, ServiceType::Retail);
    }

    #[test]
    fn classification_counts_club_prospects() {
        let classification = classify_payload(&json!({
            "items": [
                { "productId": NON_CLUB_GUEST_PRODUCT_ID, "quantity": 2 },
                { "productId": TRADE_GUEST_PRODUCT_ID, "quantity": 1 },
                { "productId": CLUB_MEMBER_GUEST_PRODUCT_ID, "quantity": 4 }
            ]
        }))
        .unwrap();

        assert_eq!(classification.guest_count, 7);
        assert_eq!(classification.club_prospects, 3);
        assert!(classification.has_guest_items);
        assert!(!classification.has_wine_bottles);
    }

    #[test]
    fn payload_without_items_is_not_classified() {
        assert_eq!(classify_payload(&json!({ "id": "x" })), None);
        assert_eq!(classify_payload(&Value::Null), None);
    }
}
