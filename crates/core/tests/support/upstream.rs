//! Scripted upstream sources

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use cellarsync_core::{ClubSignupSource, OrderPageSource};
use cellarsync_domain::{CellarSyncError, DateRange, RawClubMembership, Result as DomainResult};
use serde_json::Value;
use tokio::time::Instant;

/// Serves fixed pages and fails chosen pages a set number of times first.
#[derive(Default)]
pub struct ScriptedOrderSource {
    pages: Vec<Vec<Value>>,
    failures: Mutex<HashMap<u32, u32>>,
    calls: Mutex<Vec<(u32, Instant)>>,
}

impl ScriptedOrderSource {
    pub fn new(pages: Vec<Vec<Value>>) -> Self {
        Self { pages, ..Self::default() }
    }

    /// Pages of `sizes` generated orders, all paid on `day`.
    pub fn sized(sizes: &[usize], day: &str) -> Self {
        let mut next_id = 0;
        let pages = sizes
            .iter()
            .map(|size| {
                (0..*size)
                    .map(|_| {
                        next_id += 1;
                        super::OrderFixture::new(&format!("ord-{next_id:04}"), day)
                            .amounts(1_000, 100)
                            .build()
                    })
                    .collect()
            })
            .collect();
        Self::new(pages)
    }

    /// Fail `page` for its first `times` requests.
    pub fn failing(self, page: u32, times: u32) -> Self {
        self.failures.lock().unwrap().insert(page, times);
        self
    }

    pub fn calls(&self) -> Vec<(u32, Instant)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderPageSource for ScriptedOrderSource {
    async fn fetch_order_page(
        &self,
        _range: DateRange,
        page: u32,
        _limit: u32,
    ) -> DomainResult<Vec<Value>> {
        self.calls.lock().unwrap().push((page, Instant::now()));
        if let Some(remaining) = self.failures.lock().unwrap().get_mut(&page) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(CellarSyncError::Network(format!("page {page}: 503 Service Unavailable")));
            }
        }
        Ok(self.pages.get(page as usize - 1).cloned().unwrap_or_default())
    }
}

/// Serves a fixed list of memberships, chunked by the requested limit.
#[derive(Default)]
pub struct StaticClubSource {
    memberships: Vec<RawClubMembership>,
}

impl StaticClubSource {
    pub fn new(memberships: &[(&str, &str)]) -> Self {
        Self {
            memberships: memberships
                .iter()
                .map(|(customer, date)| RawClubMembership {
                    customer_id: Some((*customer).to_string()),
                    signup_date: Some((*date).to_string()),
                })
                .collect(),
        }
    }
}

#[async_trait]
impl ClubSignupSource for StaticClubSource {
    async fn fetch_club_signup_page(
        &self,
        _range: DateRange,
        page: u32,
        limit: u32,
    ) -> DomainResult<Vec<RawClubMembership>> {
        Ok(self
            .memberships
            .chunks(limit.max(1) as usize)
            .nth(page as usize - 1)
            .map(<[RawClubMembership]>::to_vec)
            .unwrap_or_default())
    }
}
