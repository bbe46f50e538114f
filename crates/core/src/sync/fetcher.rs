//! Rate-limited pagination driver
//!
//! Pages are requested strictly in sequence. Each page is retried with a
//! linearly growing backoff; exhausting the attempts for a page stops
//! pagination and the records fetched so far are returned with a
//! [`Truncation`] note rather than an error. Each page is handed to a
//! [`PageSink`] before the next one is requested, so earlier pages survive a
//! later failure.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use cellarsync_domain::constants::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_PAGES, DEFAULT_PAGE_DELAY_MS, DEFAULT_PAGE_SIZE,
};
use cellarsync_domain::{CellarSyncError, Result, SyncConfig};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Pagination and retry limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    pub page_size: u32,
    /// Hard ceiling on pages per run.
    pub max_pages: u32,
    /// Attempts per page, including the first.
    pub max_attempts: u32,
    /// Pause between full pages; also the backoff unit.
    pub page_delay: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            page_delay: Duration::from_millis(DEFAULT_PAGE_DELAY_MS),
        }
    }
}

impl From<&SyncConfig> for FetchPolicy {
    fn from(config: &SyncConfig) -> Self {
        Self {
            page_size: config.page_size.max(1),
            max_pages: config.max_pages.max(1),
            max_attempts: config.max_attempts.max(1),
            page_delay: config.page_delay(),
        }
    }
}

impl FetchPolicy {
    /// Backoff after the `failed_attempt`-th failure: `(n + 1) × page_delay`.
    pub fn retry_delay(&self, failed_attempt: u32) -> Duration {
        self.page_delay.saturating_mul(failed_attempt.saturating_add(1))
    }
}

/// Why pagination stopped before the upstream ran out of records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Truncation {
    RetriesExhausted { page: u32, attempts: u32, last_error: String },
    PageCeiling { max_pages: u32 },
}

impl fmt::Display for Truncation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RetriesExhausted { page, attempts, last_error } => write!(
                f,
                "page {page} failed after {attempts} attempts, pagination stopped: {last_error}"
            ),
            Self::PageCeiling { max_pages } => {
                write!(f, "page ceiling of {max_pages} reached, pagination stopped")
            }
        }
    }
}

/// Everything a pagination run produced.
#[derive(Debug)]
pub struct FetchOutcome<T> {
    pub records: Vec<T>,
    /// Pages that returned successfully.
    pub pages_fetched: u32,
    /// HTTP requests issued, retries included.
    pub requests: u32,
    pub truncation: Option<Truncation>,
}

impl<T> FetchOutcome<T> {
    pub fn is_truncated(&self) -> bool {
        self.truncation.is_some()
    }
}

/// Receives each page as soon as it arrives.
#[async_trait]
pub trait PageSink<T: Send + Sync>: Send {
    /// An error aborts pagination and propagates to the caller.
    async fn accept(&mut self, page: &[T]) -> Result<()>;
}

enum PageAttempt<T> {
    Fetched(Vec<T>),
    Exhausted(Truncation),
}

/// Drives a page source under a [`FetchPolicy`].
#[derive(Debug, Clone, Default)]
pub struct RateLimitedFetcher {
    policy: FetchPolicy,
}

impl RateLimitedFetcher {
    pub fn new(policy: FetchPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    /// Page through `fetch_page(1), fetch_page(2), …` until a short page, the
    /// page ceiling, or retry exhaustion.
    ///
    /// # Errors
    /// `Cancelled` when `cancel` fires, or whatever the sink returns.
    pub async fn fetch_all<T, F, Fut, S>(
        &self,
        resource: &'static str,
        mut fetch_page: F,
        sink: &mut S,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome<T>>
    where
        T: Send + Sync,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
        S: PageSink<T> + ?Sized,
    {
        let page_size = usize::try_from(self.policy.page_size).unwrap_or(usize::MAX);
        let mut outcome =
            FetchOutcome { records: Vec::new(), pages_fetched: 0, requests: 0, truncation: None };
        let mut page = 1;

        loop {
            if cancel.is_cancelled() {
                return Err(cancelled(resource, page));
            }

            let records = match self
                .fetch_with_retry(resource, page, &mut fetch_page, &mut outcome.requests, cancel)
                .await?
            {
                PageAttempt::Fetched(records) => records,
                PageAttempt::Exhausted(truncation) => {
                    error!(resource, page, reason = %truncation, "Pagination truncated");
                    outcome.truncation = Some(truncation);
                    break;
                }
            };

            let count = records.len();
            outcome.pages_fetched += 1;
            sink.accept(&records).await?;
            outcome.records.extend(records);
            info!(resource, page, count, "Fetched page");

            if count < page_size {
                break;
            }
            if page >= self.policy.max_pages {
                let truncation = Truncation::PageCeiling { max_pages: self.policy.max_pages };
                error!(resource, page, reason = %truncation, "Pagination truncated");
                outcome.truncation = Some(truncation);
                break;
            }

            self.pause(resource, page, self.policy.page_delay, cancel).await?;
            page += 1;
        }

        Ok(outcome)
    }

    async fn fetch_with_retry<T, F, Fut>(
        &self,
        resource: &'static str,
        page: u32,
        fetch_page: &mut F,
        requests: &mut u32,
        cancel: &CancellationToken,
    ) -> Result<PageAttempt<T>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<Vec<T>>>,
    {
        let mut attempt = 1;
        loop {
            *requests += 1;
            let result = tokio::select! {
                () = cancel.cancelled() => return Err(cancelled(resource, page)),
                result = fetch_page(page) => result,
            };

            let err = match result {
                Ok(records) => return Ok(PageAttempt::Fetched(records)),
                Err(CellarSyncError::UpstreamShape(detail)) => {
                    warn!(resource, page, %detail, "No record array in response, treating page as empty");
                    return Ok(PageAttempt::Fetched(Vec::new()));
                }
                Err(err) => err,
            };

            warn!(
                resource,
                page,
                attempt,
                max_attempts = self.policy.max_attempts,
                transient = err.is_transient(),
                error = %err,
                "Page fetch failed"
            );
            if attempt >= self.policy.max_attempts {
                return Ok(PageAttempt::Exhausted(Truncation::RetriesExhausted {
                    page,
                    attempts: attempt,
                    last_error: err.to_string(),
                }));
            }

            self.pause(resource, page, self.policy.retry_delay(attempt), cancel).await?;
            attempt += 1;
        }
    }

    async fn pause(
        &self,
        resource: &'static str,
        page: u32,
        delay: Duration,
        cancel: &CancellationToken,
    ) -> Result<()> {
        tokio::select! {
            () = cancel.cancelled() => Err(cancelled(resource, page)),
            () = tokio::time::sleep(delay) => Ok(()),
        }
    }
}

fn cancelled(resource: &str, page: u32) -> CellarSyncError {
    CellarSyncError::Cancelled(format!("{resource} pagination cancelled before page {page}"))
}
