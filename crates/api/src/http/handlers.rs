//! Route handlers
//!
//! Each handler validates its input up front, so malformed dates are
//! rejected before any sync starts or any query runs.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use cellarsync_core::{InsightContext, StaffMetrics, SyncRequest};
use cellarsync_domain::constants::{INSIGHT_TRAILING_DAYS, RECENT_SYNC_DAYS};
use cellarsync_domain::{parse_day, CellarSyncError, DateRange, SyncLog, SyncReport};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::errors::ApiResult;
use crate::context::AppContext;
use crate::utils::health::HealthStatus;
use crate::utils::logging::log_request_outcome;

pub type AppState = Arc<AppContext>;

const DEFAULT_LOG_LIMIT: usize = 20;
const MAX_LOG_LIMIT: usize = 200;

/// Optional body of the sync triggers.
#[derive(Debug, Default, Deserialize)]
pub struct RangeBody {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncStarted {
    pub started: bool,
    pub range: DateRange,
}

#[derive(Debug, Deserialize)]
pub struct StaffMetricsQuery {
    pub name: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StaffMetricsResponse {
    pub name: String,
    pub range: DateRange,
    pub metrics: StaffMetrics,
}

#[derive(Debug, Deserialize)]
pub struct InsightQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    pub limit: Option<usize>,
}

/// `POST /sync/full`: start a historical sync in the background.
pub async fn sync_full(State(ctx): State<AppState>, body: Bytes) -> ApiResult<impl IntoResponse> {
    let started = Instant::now();
    let result = requested_range(&ctx, &body).map(|range| {
        let range = ctx.start_background_sync(SyncRequest::historical(range));
        SyncStarted { started: true, range }
    });
    log_request_outcome("/sync/full", started.elapsed(), result.as_ref().err());
    Ok((StatusCode::ACCEPTED, Json(result?)))
}

/// `POST /sync/club`: run a club-signup-only sync and wait for it.
pub async fn sync_club(State(ctx): State<AppState>, body: Bytes) -> ApiResult<Json<SyncReport>> {
    let started = Instant::now();
    let result = match requested_range(&ctx, &body) {
        Ok(range) => run_to_completion(&ctx, SyncRequest::club(range)).await,
        Err(err) => Err(err),
    };
    log_request_outcome("/sync/club", started.elapsed(), result.as_ref().err());
    Ok(Json(result?))
}

/// `POST /sync/recent`: historical sync over the last week, awaited.
pub async fn sync_recent(State(ctx): State<AppState>) -> ApiResult<Json<SyncReport>> {
    let started = Instant::now();
    let range = DateRange::trailing(ctx.today(), RECENT_SYNC_DAYS);
    let result = run_to_completion(&ctx, SyncRequest::historical(range)).await;
    log_request_outcome("/sync/recent", started.elapsed(), result.as_ref().err());
    Ok(Json(result?))
}

/// `GET /sync/logs?limit`: most recent runs first.
pub async fn sync_logs(
    State(ctx): State<AppState>,
    Query(query): Query<LogQuery>,
) -> ApiResult<Json<Vec<SyncLog>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT);
    Ok(Json(ctx.sync_logs.list_recent(limit).await?))
}

/// `GET /health`: 200 when every component is healthy, 503 otherwise.
pub async fn health(State(ctx): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let status = ctx.health_check().await;
    let code = if status.is_healthy { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (code, Json(status))
}

/// `GET /staff/metrics?name&start&end`
///
/// Without dates the window is the trailing thirty days ending today.
pub async fn staff_metrics(
    State(ctx): State<AppState>,
    Query(query): Query<StaffMetricsQuery>,
) -> ApiResult<Json<StaffMetricsResponse>> {
    let name = query
        .name
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| CellarSyncError::InvalidInput("query parameter `name` is required".into()))?;

    let end = optional_day(query.end.as_deref())?.unwrap_or_else(|| ctx.today());
    let range = match optional_day(query.start.as_deref())? {
        Some(start) => DateRange::new(start, end)?,
        None => DateRange::trailing(end, INSIGHT_TRAILING_DAYS),
    };

    let metrics = StaffMetrics::load(ctx.orders.as_ref(), &name, range).await?;
    Ok(Json(StaffMetricsResponse { name, range, metrics }))
}

/// `GET /insights/context?date`: a day's snapshot and its trailing window.
pub async fn insight_context(
    State(ctx): State<AppState>,
    Query(query): Query<InsightQuery>,
) -> ApiResult<Json<InsightContext>> {
    let date = optional_day(query.date.as_deref())?.unwrap_or_else(|| ctx.today());
    Ok(Json(InsightContext::load(ctx.snapshots.as_ref(), date).await?))
}

async fn run_to_completion(
    ctx: &AppContext,
    request: SyncRequest,
) -> Result<SyncReport, CellarSyncError> {
    ctx.sync_service.run(request, &CancellationToken::new()).await
}

/// Range from an optional JSON body, defaulting to full history through today.
fn requested_range(ctx: &AppContext, body: &[u8]) -> Result<DateRange, CellarSyncError> {
    let requested: RangeBody = if body.iter().all(u8::is_ascii_whitespace) {
        RangeBody::default()
    } else {
        serde_json::from_slice(body)
            .map_err(|err| CellarSyncError::InvalidInput(format!("invalid request body: {err}")))?
    };

    let end = optional_day(requested.end.as_deref())?.unwrap_or_else(|| ctx.today());
    match optional_day(requested.start.as_deref())? {
        Some(start) => DateRange::new(start, end),
        None => ctx.full_history_range(end),
    }
}

fn optional_day(value: Option<&str>) -> Result<Option<chrono::NaiveDate>, CellarSyncError> {
    value.map(str::trim).filter(|value| !value.is_empty()).map(parse_day).transpose()
}
