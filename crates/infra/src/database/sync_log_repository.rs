//! SQLite-backed implementation of the `SyncLogRepository` port.

use std::sync::Arc;

use async_trait::async_trait;
use cellarsync_core::SyncLogRepository;
use cellarsync_domain::{CellarSyncError, Result, SyncLog};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use tokio::task;

use super::manager::{count_from_column, map_join_error, map_sql_error, DbManager};

/// SQLite repository for sync run logs.
pub struct SqliteSyncLogRepository {
    db: Arc<DbManager>,
}

impl SqliteSyncLogRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Most recent runs first.
    pub async fn list_recent(&self, limit: usize) -> Result<Vec<SyncLog>> {
        let db = Arc::clone(&self.db);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        task::spawn_blocking(move || -> Result<Vec<SyncLog>> {
            let conn = db.get_connection()?;
            let mut stmt = conn
                .prepare(&format!("{SYNC_LOG_SELECT} ORDER BY started_at DESC, id DESC LIMIT ?1"))
                .map_err(map_sql_error)?;
            let rows = stmt.query_map(params![limit], map_sync_log_row).map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

const SYNC_LOG_INSERT_SQL: &str = "INSERT INTO sync_logs (
        id, sync_type, status, started_at, completed_at, records_processed, error_message
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

const SYNC_LOG_FINALIZE_SQL: &str = "UPDATE sync_logs
    SET status = ?2, completed_at = ?3, records_processed = ?4, error_message = ?5
    WHERE id = ?1";

const SYNC_LOG_SELECT: &str = "SELECT id, sync_type, status, started_at, completed_at,
        records_processed, error_message
    FROM sync_logs";

#[async_trait]
impl SyncLogRepository for SqliteSyncLogRepository {
    async fn create_sync_log(&self, log: &SyncLog) -> Result<()> {
        let db = Arc::clone(&self.db);
        let log = log.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(
                SYNC_LOG_INSERT_SQL,
                params![
                    log.id,
                    log.sync_type.as_str(),
                    log.status.as_str(),
                    log.started_at.to_rfc3339(),
                    log.completed_at.map(|at| at.to_rfc3339()),
                    stored_count(log.records_processed),
                    log.error_message,
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn finalize_sync_log(&self, log: &SyncLog) -> Result<()> {
        let db = Arc::clone(&self.db);
        let log = log.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let updated = conn
                .execute(
                    SYNC_LOG_FINALIZE_SQL,
                    params![
                        log.id,
                        log.status.as_str(),
                        log.completed_at.map(|at| at.to_rfc3339()),
                        stored_count(log.records_processed),
                        log.error_message,
                    ],
                )
                .map_err(map_sql_error)?;

            if updated == 0 {
                return Err(CellarSyncError::NotFound(format!("sync log {}", log.id)));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_sync_log(&self, id: &str) -> Result<Option<SyncLog>> {
        let db = Arc::clone(&self.db);
        let id = id.to_owned();

        task::spawn_blocking(move || -> Result<Option<SyncLog>> {
            let conn = db.get_connection()?;
            conn.query_row(
                &format!("{SYNC_LOG_SELECT} WHERE id = ?1"),
                params![id],
                map_sync_log_row,
            )
            .optional()
            .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn stored_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn map_sync_log_row(row: &Row<'_>) -> rusqlite::Result<SyncLog> {
    let sync_type: String = row.get(1)?;
    let status: String = row.get(2)?;
    let started_at: String = row.get(3)?;
    let completed_at: Option<String> = row.get(4)?;
    let records_processed: i64 = row.get(5)?;

    Ok(SyncLog {
        id: row.get(0)?,
        sync_type: sync_type.parse().map_err(|err: String| text_error(1, err))?,
        status: status.parse().map_err(|err: String| text_error(2, err))?,
        started_at: timestamp_from_column(3, &started_at)?,
        completed_at: completed_at.map(|at| timestamp_from_column(4, &at)).transpose()?,
        records_processed: count_from_column(records_processed),
        error_message: row.get(6)?,
    })
}

fn timestamp_from_column(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err)))
}

fn text_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}
