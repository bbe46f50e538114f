//! Club membership signup events

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::range::parse_day;
use super::raw::RawClubMembership;
use crate::errors::{CellarSyncError, Result};

/// A customer joining the wine club on a given day.
///
/// Keyed by `(customer_id, signup_date)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClubSignup {
    pub customer_id: String,
    pub signup_date: NaiveDate,
}

impl ClubSignup {
    pub fn new(customer_id: impl Into<String>, signup_date: NaiveDate) -> Self {
        Self { customer_id: customer_id.into(), signup_date }
    }
}

impl TryFrom<&RawClubMembership> for ClubSignup {
    type Error = CellarSyncError;

    /// Accepts either a bare day or a full timestamp for `signupDate`.
    fn try_from(raw: &RawClubMembership) -> Result<Self> {
        let customer_id = raw
            .customer_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| CellarSyncError::UpstreamShape("club membership without customerId".into()))?;
        let signup_date = raw
            .signup_date
            .as_deref()
            .and_then(|value| value.get(..10))
            .ok_or_else(|| {
                CellarSyncError::UpstreamShape(format!(
                    "club membership for {customer_id} without signupDate"
                ))
            })
            .and_then(parse_day)?;
        Ok(Self::new(customer_id, signup_date))
    }
}
