#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use cellarsync_api::{router, AppContext};
use cellarsync_domain::{
    Commerce7Config, Config, DatabaseConfig, ServerConfig, SyncConfig,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

/// Router over a temporary database and a mock Commerce7 base URL.
pub struct TestApp {
    pub ctx: Arc<AppContext>,
    pub router: Router,
    _temp_dir: TempDir,
}

impl TestApp {
    pub fn new(commerce7_base_url: &str) -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let config = Config {
            database: DatabaseConfig {
                path: temp_dir.path().join("cellarsync-api.db").display().to_string(),
                pool_size: 4,
            },
            commerce7: Commerce7Config {
                base_url: commerce7_base_url.to_string(),
                app_id: "cellar-app".into(),
                api_key: "secret".into(),
                tenant_id: "estate-winery".into(),
                timeout_secs: 5,
            },
            sync: SyncConfig {
                page_size: 2,
                max_pages: 10,
                max_attempts: 2,
                page_delay_ms: 0,
                history_start: "2024-06-01".into(),
            },
            server: ServerConfig::default(),
        };

        let ctx = Arc::new(AppContext::new(config).expect("context should initialise"));
        let router = router(Arc::clone(&ctx));
        Self { ctx, router, _temp_dir: temp_dir }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::get(uri).body(Body::empty()).expect("request should build");
        self.send(request).await
    }

    pub async fn post(&self, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request should build");
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response =
            self.router.clone().oneshot(request).await.expect("router should respond");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body should read");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body should be JSON")
        };
        (status, body)
    }
}
