//! Commerce7 request authentication

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cellarsync_domain::{CellarSyncError, Commerce7Config, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

/// Header carrying the tenant (winery) identifier.
pub const TENANT_HEADER: &str = "tenant";

/// `Basic base64(app_id:api_key)`
pub fn basic_credentials(app_id: &str, api_key: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{app_id}:{api_key}")))
}

/// Headers attached to every Commerce7 request.
pub fn default_headers(config: &Commerce7Config) -> Result<HeaderMap> {
    let mut authorization = header_value(&basic_credentials(&config.app_id, &config.api_key))?;
    authorization.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, authorization);
    headers.insert(TENANT_HEADER, header_value(&config.tenant_id)?);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| CellarSyncError::Config(format!("credential is not a valid header: {e}")))
}
