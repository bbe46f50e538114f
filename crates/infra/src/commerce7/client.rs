//! Commerce7 REST client
//!
//! One call per page; pacing, retries and pagination are driven by the
//! core `RateLimitedFetcher`.

use async_trait::async_trait;
use cellarsync_core::{ClubSignupSource, OrderPageSource};
use cellarsync_domain::{CellarSyncError, Commerce7Config, DateRange, RawClubMembership, Result};
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use super::auth;
use super::envelope::extract_records;
use crate::http::HttpClient;

const ORDER_PATH: &str = "order";
const ORDER_RECORDS_FIELD: &str = "orders";
const ORDER_DATE_FILTER: &str = "orderPaidDate";

const CLUB_PATH: &str = "club-membership";
const CLUB_RECORDS_FIELD: &str = "clubMemberships";
const CLUB_DATE_FILTER: &str = "signupDate";

/// Commerce7 adapter for order and club membership pages.
#[derive(Clone)]
pub struct Commerce7Client {
    http: HttpClient,
    base_url: Url,
}

impl Commerce7Client {
    /// Build a client with auth and tenant headers baked in.
    ///
    /// # Errors
    /// Returns `CellarSyncError::Config` for an unparsable base URL or
    /// credentials that cannot be sent as headers.
    pub fn new(config: &Commerce7Config) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(config.timeout())
            .default_headers(auth::default_headers(config)?)
            .build()?;

        // A trailing slash keeps the `/v1` segment when joining paths.
        let base = format!("{}/", config.base_url.trim_end_matches('/'));
        let base_url = Url::parse(&base).map_err(|e| {
            CellarSyncError::Config(format!("invalid Commerce7 base URL {}: {e}", config.base_url))
        })?;

        Ok(Self { http, base_url })
    }

    async fn fetch_page(
        &self,
        path: &str,
        date_filter: &str,
        records_field: &str,
        range: DateRange,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Value>> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| CellarSyncError::Internal(format!("cannot build {path} URL: {e}")))?;

        let request = self.http.request(Method::GET, url).query(&[
            ("page", page.to_string()),
            ("limit", limit.to_string()),
            (date_filter, between(range)),
        ]);

        let body: Value = self.http.send_json(request).await?;
        let records = extract_records(body, records_field)?;
        debug!(path, page, records = records.len(), "page received");
        Ok(records)
    }
}

/// `btw:YYYY-MM-DD|YYYY-MM-DD`, both ends inclusive.
fn between(range: DateRange) -> String {
    format!("btw:{}|{}", range.start.format("%Y-%m-%d"), range.end.format("%Y-%m-%d"))
}

#[async_trait]
impl OrderPageSource for Commerce7Client {
    #[instrument(skip(self), fields(range = %range))]
    async fn fetch_order_page(
        &self,
        range: DateRange,
        page: u32,
        limit: u32,
    ) -> Result<Vec<Value>> {
        self.fetch_page(ORDER_PATH, ORDER_DATE_FILTER, ORDER_RECORDS_FIELD, range, page, limit)
            .await
    }
}

#[async_trait]
impl ClubSignupSource for Commerce7Client {
    #[instrument(skip(self), fields(range = %range))]
    async fn fetch_club_signup_page(
        &self,
        range: DateRange,
        page: u32,
        limit: u32,
    ) -> Result<Vec<RawClubMembership>> {
        let records =
            self.fetch_page(CLUB_PATH, CLUB_DATE_FILTER, CLUB_RECORDS_FIELD, range, page, limit)
                .await?;

        // Malformed entries become blank records and are rejected downstream.
        Ok(records
            .iter()
            .map(|record| RawClubMembership::deserialize(record).unwrap_or_default())
            .collect())
    }
}
