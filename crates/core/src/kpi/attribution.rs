//! First-touch club signup attribution
//!
//! A customer who joined the club on a given day is credited to the first
//! order of theirs processed for that day. Later orders from the same
//! customer on the same day receive nothing.

use std::collections::{BTreeMap, HashSet};

use cellarsync_domain::{ClubSignup, Order, ServiceType};

/// Credit assigned to one signing customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribution {
    pub order_id: String,
    pub associate_name: String,
    pub service_type: ServiceType,
}

/// Tracks attributions for a single calendar day.
#[derive(Debug, Default)]
pub struct ClubSignupAttributor {
    signing_customers: HashSet<String>,
    credited: BTreeMap<String, Attribution>,
}

impl ClubSignupAttributor {
    /// Seed with the customers who signed up on the day being aggregated.
    pub fn new<'a>(signups: impl IntoIterator<Item = &'a ClubSignup>) -> Self {
        Self {
            signing_customers: signups.into_iter().map(|s| s.customer_id.clone()).collect(),
            credited: BTreeMap::new(),
        }
    }

    /// Offer an order for attribution. Returns the credit when this order is
    /// the first touch for a signing customer.
    pub fn attribute(&mut self, order: &Order, service_type: ServiceType) -> Option<&Attribution> {
        let customer_id = order.customer_id.as_deref()?;
        if !self.signing_customers.contains(customer_id) || self.credited.contains_key(customer_id)
        {
            return None;
        }
        let credit = Attribution {
            order_id: order.id.clone(),
            associate_name: order.associate_name.clone(),
            service_type,
        };
        Some(self.credited.entry(customer_id.to_string()).or_insert(credit))
    }

    /// Number of customers credited so far.
    pub fn credited_count(&self) -> usize {
        self.credited.len()
    }

    pub fn credit_for(&self, customer_id: &str) -> Option<&Attribution> {
        self.credited.get(customer_id)
    }
}
