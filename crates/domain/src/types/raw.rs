//! Upstream (Commerce7) payload views
//!
//! Only the documented fields are typed; the original JSON document is kept
//! alongside so it can be stored verbatim as `raw_data`.

use serde::Deserialize;
use serde_json::Value;

use crate::utils::lenient;

/// One order as delivered by the upstream API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawOrder {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub order_paid_date: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub created_at: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub customer_id: Option<String>,
    #[serde(deserialize_with = "lenient::opt_object")]
    pub sales_associate: Option<RawSalesAssociate>,
    #[serde(deserialize_with = "lenient::minor_units")]
    pub total: i64,
    #[serde(deserialize_with = "lenient::minor_units")]
    pub sub_total: i64,
    #[serde(deserialize_with = "lenient::minor_units")]
    pub tax_total: i64,
    #[serde(deserialize_with = "lenient::minor_units")]
    pub tip: i64,
    #[serde(deserialize_with = "lenient::seq_or_empty")]
    pub items: Vec<RawLineItem>,
    /// The untouched upstream document.
    #[serde(skip)]
    pub payload: Value,
}

impl RawOrder {
    /// Build a typed view over an upstream document. Never fails: a document
    /// that is not an object yields an order with an empty id.
    pub fn from_payload(payload: Value) -> Self {
        let mut order: RawOrder = serde_json::from_value(payload.clone()).unwrap_or_default();
        order.payload = payload;
        order
    }

    /// Trimmed associate name, if the payload names one.
    pub fn associate_name(&self) -> Option<&str> {
        self.sales_associate
            .as_ref()
            .and_then(|associate| associate.name.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Sales associate reference embedded in an order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawSalesAssociate {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub phone: Option<String>,
}

/// Order line item. Only the catalog identifiers and quantity matter here.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawLineItem {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub product_id: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub department_id: Option<String>,
    #[serde(deserialize_with = "lenient::quantity")]
    pub quantity: u32,
}

/// Club membership record as delivered by the upstream API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawClubMembership {
    #[serde(deserialize_with = "lenient::opt_string")]
    pub customer_id: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    pub signup_date: Option<String>,
}
