//! SQLite-backed implementation of the `ClubSignupRepository` port.

use std::sync::Arc;

use async_trait::async_trait;
use cellarsync_core::ClubSignupRepository;
use cellarsync_domain::{ClubSignup, DateRange, Result};
use rusqlite::{params, Row};
use tokio::task;

use super::manager::{day_from_column, day_key, map_join_error, map_sql_error, DbManager};

/// SQLite repository for club signups, keyed by customer and signup day.
pub struct SqliteClubSignupRepository {
    db: Arc<DbManager>,
}

impl SqliteClubSignupRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

const SIGNUP_UPSERT_SQL: &str =
    "INSERT OR IGNORE INTO club_signups (customer_id, signup_date) VALUES (?1, ?2)";

const SIGNUP_RANGE_QUERY: &str = "SELECT customer_id, signup_date
    FROM club_signups
    WHERE signup_date BETWEEN ?1 AND ?2
    ORDER BY signup_date, customer_id";

#[async_trait]
impl ClubSignupRepository for SqliteClubSignupRepository {
    async fn upsert_signups(&self, signups: &[ClubSignup]) -> Result<usize> {
        if signups.is_empty() {
            return Ok(0);
        }

        let db = Arc::clone(&self.db);
        let signups = signups.to_vec();

        task::spawn_blocking(move || -> Result<usize> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;
            {
                let mut stmt = tx.prepare(SIGNUP_UPSERT_SQL).map_err(map_sql_error)?;
                for signup in &signups {
                    stmt.execute(params![signup.customer_id, day_key(signup.signup_date)])
                        .map_err(map_sql_error)?;
                }
            }
            tx.commit().map_err(map_sql_error)?;
            // Re-sent signups count as synced even when the row already existed.
            Ok(signups.len())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_signups_in_range(&self, range: DateRange) -> Result<Vec<ClubSignup>> {
        let db = Arc::clone(&self.db);
        let (start, end) = (day_key(range.start), day_key(range.end));

        task::spawn_blocking(move || -> Result<Vec<ClubSignup>> {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(SIGNUP_RANGE_QUERY).map_err(map_sql_error)?;
            let rows =
                stmt.query_map(params![start, end], map_signup_row).map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_signup_row(row: &Row<'_>) -> rusqlite::Result<ClubSignup> {
    let signup_date: String = row.get(1)?;
    Ok(ClubSignup { customer_id: row.get(0)?, signup_date: day_from_column(1, &signup_date)? })
}
