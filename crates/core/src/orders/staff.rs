//! Staff extraction from a batch of upstream orders

use std::collections::HashSet;

use cellarsync_domain::{RawOrder, StaffMember};

/// Distinct associates in first-seen order.
///
/// Names are trimmed and compared case-sensitively; contact fields come from
/// the first order carrying each name. Orders without an associate name are
/// ignored.
pub fn extract_staff(orders: &[RawOrder]) -> Vec<StaffMember> {
    let mut seen = HashSet::new();
    let mut staff = Vec::new();

    for order in orders {
        let Some(name) = order.associate_name() else {
            continue;
        };
        if !seen.insert(name.to_string()) {
            continue;
        }
        let contact = order.sales_associate.as_ref();
        staff.push(StaffMember::associate(
            name,
            contact.and_then(|associate| non_blank(associate.email.as_deref())),
            contact.and_then(|associate| non_blank(associate.phone.as_deref())),
        ));
    }

    staff
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|value| !value.is_empty()).map(String::from)
}
