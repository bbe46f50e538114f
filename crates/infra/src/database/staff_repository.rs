//! SQLite-backed implementation of the `StaffRepository` port.

use std::sync::Arc;

use async_trait::async_trait;
use cellarsync_core::StaffRepository;
use cellarsync_domain::{Result, StaffMember};
use rusqlite::{params, Row};
use tokio::task;

use super::manager::{map_join_error, map_sql_error, DbManager};

/// SQLite repository for staff members, keyed by name.
pub struct SqliteStaffRepository {
    db: Arc<DbManager>,
}

impl SqliteStaffRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

// Contact details already on file survive a later sighting without them.
const STAFF_UPSERT_SQL: &str = "INSERT INTO staff_members (name, email, phone, role, is_active)
    VALUES (?1, ?2, ?3, ?4, ?5)
    ON CONFLICT(name) DO UPDATE SET
        email = COALESCE(excluded.email, staff_members.email),
        phone = COALESCE(excluded.phone, staff_members.phone),
        is_active = excluded.is_active";

const STAFF_LIST_QUERY: &str =
    "SELECT name, email, phone, role, is_active FROM staff_members ORDER BY name";

#[async_trait]
impl StaffRepository for SqliteStaffRepository {
    async fn upsert_staff(&self, staff: &[StaffMember]) -> Result<usize> {
        if staff.is_empty() {
            return Ok(0);
        }

        let db = Arc::clone(&self.db);
        let staff = staff.to_vec();

        task::spawn_blocking(move || -> Result<usize> {
            let mut conn = db.get_connection()?;
            let tx = conn.transaction().map_err(map_sql_error)?;
            let mut written = 0;
            {
                let mut stmt = tx.prepare(STAFF_UPSERT_SQL).map_err(map_sql_error)?;
                for member in &staff {
                    written += stmt
                        .execute(params![
                            member.name,
                            member.email,
                            member.phone,
                            member.role,
                            member.is_active
                        ])
                        .map_err(map_sql_error)?;
                }
            }
            tx.commit().map_err(map_sql_error)?;
            Ok(written)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_staff(&self) -> Result<Vec<StaffMember>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Vec<StaffMember>> {
            let conn = db.get_connection()?;
            let mut stmt = conn.prepare(STAFF_LIST_QUERY).map_err(map_sql_error)?;
            let rows = stmt.query_map([], map_staff_row).map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_staff_row(row: &Row<'_>) -> rusqlite::Result<StaffMember> {
    Ok(StaffMember {
        name: row.get(0)?,
        email: row.get(1)?,
        phone: row.get(2)?,
        role: row.get(3)?,
        is_active: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn repository(dir: &TempDir) -> SqliteStaffRepository {
        let db = DbManager::new(dir.path().join("staff.db"), 2).unwrap();
        db.run_migrations().unwrap();
        SqliteStaffRepository::new(Arc::new(db))
    }

    #[tokio::test]
    async fn upserts_and_lists_by_name() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);

        let written = repo
            .upsert_staff(&[
                StaffMember::associate("Ben", None, None),
                StaffMember::associate("Ana", Some("ana@winery.test".into()), None),
            ])
            .await
            .unwrap();

        assert_eq!(written, 2);
        let names: Vec<_> =
            repo.list_staff().await.unwrap().into_iter().map(|member| member.name).collect();
        assert_eq!(names, vec!["Ana", "Ben"]);
    }

    #[tokio::test]
    async fn repeated_upsert_keeps_one_row_and_known_contact() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);

        repo.upsert_staff(&[StaffMember::associate("Ana", Some("ana@winery.test".into()), None)])
            .await
            .unwrap();
        repo.upsert_staff(&[StaffMember::associate("Ana", None, Some("555-0100".into()))])
            .await
            .unwrap();

        let staff = repo.list_staff().await.unwrap();
        assert_eq!(staff.len(), 1);
        assert_eq!(staff[0].email.as_deref(), Some("ana@winery.test"));
        assert_eq!(staff[0].phone.as_deref(), Some("555-0100"));
        assert!(staff[0].is_active);
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let repo = repository(&dir);

        assert_eq!(repo.upsert_staff(&[]).await.unwrap(), 0);
        assert!(repo.list_staff().await.unwrap().is_empty());
    }
}
