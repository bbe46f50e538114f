//! Upstream order payload builder

use cellarsync_domain::constants::{TASTING_DEPARTMENT_ID, WINE_BOTTLE_DEPARTMENT_ID};
use serde_json::{json, Value};

/// Builds a Commerce7-shaped order payload. Amounts are in cents.
pub struct OrderFixture {
    value: Value,
}

impl OrderFixture {
    pub fn new(id: &str, paid: &str) -> Self {
        Self {
            value: json!({
                "id": id,
                "orderPaidDate": paid,
                "subTotal": 0,
                "taxTotal": 0,
                "total": 0,
                "items": []
            }),
        }
    }

    pub fn associate(mut self, name: &str) -> Self {
        let email = format!("{}@winery.test", name.to_lowercase());
        self.value["salesAssociate"] = json!({ "name": name, "email": email });
        self
    }

    pub fn customer(mut self, customer_id: &str) -> Self {
        self.value["customerId"] = json!(customer_id);
        self
    }

    pub fn amounts(mut self, subtotal: i64, tax: i64) -> Self {
        self.value["subTotal"] = json!(subtotal);
        self.value["taxTotal"] = json!(tax);
        self.value["total"] = json!(subtotal + tax);
        self
    }

    pub fn guests(self, product_id: &str, quantity: u32) -> Self {
        self.item(json!({ "productId": product_id, "quantity": quantity }))
    }

    pub fn bottles(self, quantity: u32) -> Self {
        self.item(json!({
            "productId": "estate-cabernet",
            "departmentId": WINE_BOTTLE_DEPARTMENT_ID,
            "quantity": quantity
        }))
    }

    pub fn tasting(self) -> Self {
        self.item(json!({ "productId": "flight", "departmentId": TASTING_DEPARTMENT_ID, "quantity": 1 }))
    }

    pub fn build(self) -> Value {
        self.value
    }

    fn item(mut self, item: Value) -> Self {
        if let Some(items) = self.value["items"].as_array_mut() {
            items.push(item);
        }
        self
    }
}
