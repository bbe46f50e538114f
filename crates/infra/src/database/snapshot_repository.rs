//! SQLite-backed implementation of the `KpiSnapshotRepository` port.
//!
//! Scalar KPIs live in their own columns; breakdown maps are stored as JSON
//! text. Maps are ordered, so re-aggregating the same day rewrites the row
//! with identical bytes.

use std::sync::Arc;

use async_trait::async_trait;
use cellarsync_core::KpiSnapshotRepository;
use cellarsync_domain::{DailyKpiSnapshot, DateRange, Rate, Result};
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};
use tokio::task;

use super::manager::{
    day_from_column, day_key, json_from_column, map_join_error, map_json_error, map_sql_error,
    DbConnection, DbManager,
};

/// SQLite repository for daily KPI snapshots, keyed by date.
pub struct SqliteKpiSnapshotRepository {
    db: Arc<DbManager>,
}

impl SqliteKpiSnapshotRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

const SNAPSHOT_UPSERT_SQL: &str = "INSERT OR REPLACE INTO kpi_daily_snapshots (
        date, total_revenue, total_orders, total_guests, total_bottles_sold, subtotal, tax_total,
        tip_total, grand_total, avg_order_value, avg_guests_per_order,
        wine_bottle_conversion_rate, club_conversion_rate, conversion_rate, club_signups,
        order_mix, service_type_breakdown, associate_performance, guest_breakdown
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)";

const SNAPSHOT_SELECT: &str = "SELECT date, total_revenue, total_orders, total_guests,
        total_bottles_sold, subtotal, tax_total, tip_total, grand_total, avg_order_value,
        avg_guests_per_order, wine_bottle_conversion_rate, club_conversion_rate, conversion_rate,
        club_signups, order_mix, service_type_breakdown, associate_performance, guest_breakdown
    FROM kpi_daily_snapshots";

#[async_trait]
impl KpiSnapshotRepository for SqliteKpiSnapshotRepository {
    async fn upsert_snapshot(&self, snapshot: &DailyKpiSnapshot) -> Result<()> {
        let db = Arc::clone(&self.db);
        let snapshot = snapshot.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            insert_snapshot(&conn, &snapshot)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_snapshot(&self, date: NaiveDate) -> Result<Option<DailyKpiSnapshot>> {
        let db = Arc::clone(&self.db);
        let key = day_key(date);

        task::spawn_blocking(move || -> Result<Option<DailyKpiSnapshot>> {
            let conn = db.get_connection()?;
            let sql = format!("{SNAPSHOT_SELECT} WHERE date = ?1");
            conn.query_row(&sql, params![key], map_snapshot_row)
                .optional()
                .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_snapshots_in_range(&self, range: DateRange) -> Result<Vec<DailyKpiSnapshot>> {
        let db = Arc::clone(&self.db);
        let (start, end) = (day_key(range.start), day_key(range.end));

        task::spawn_blocking(move || -> Result<Vec<DailyKpiSnapshot>> {
            let conn = db.get_connection()?;
            let sql = format!("{SNAPSHOT_SELECT} WHERE date BETWEEN ?1 AND ?2 ORDER BY date");
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
            let rows =
                stmt.query_map(params![start, end], map_snapshot_row).map_err(map_sql_error)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn insert_snapshot(conn: &DbConnection, snapshot: &DailyKpiSnapshot) -> Result<()> {
    let order_mix = serde_json::to_string(&snapshot.order_mix).map_err(map_json_error)?;
    let service_types =
        serde_json::to_string(&snapshot.service_type_breakdown).map_err(map_json_error)?;
    let associates =
        serde_json::to_string(&snapshot.associate_performance).map_err(map_json_error)?;
    let guests = serde_json::to_string(&snapshot.guest_breakdown).map_err(map_json_error)?;

    conn.execute(
        SNAPSHOT_UPSERT_SQL,
        params![
            day_key(snapshot.date),
            snapshot.total_revenue,
            snapshot.total_orders,
            snapshot.total_guests,
            snapshot.total_bottles_sold,
            snapshot.subtotal,
            snapshot.tax_total,
            snapshot.tip_total,
            snapshot.grand_total,
            snapshot.avg_order_value,
            snapshot.avg_guests_per_order,
            snapshot.wine_bottle_conversion_rate,
            snapshot.club_conversion_rate.value(),
            snapshot.conversion_rate,
            snapshot.club_signups,
            order_mix,
            service_types,
            associates,
            guests,
        ],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

fn map_snapshot_row(row: &Row<'_>) -> rusqlite::Result<DailyKpiSnapshot> {
    let date: String = row.get(0)?;
    let club_rate: Option<f64> = row.get(12)?;
    let order_mix: String = row.get(15)?;
    let service_types: String = row.get(16)?;
    let associates: String = row.get(17)?;
    let guests: String = row.get(18)?;

    Ok(DailyKpiSnapshot {
        date: day_from_column(0, &date)?,
        total_revenue: row.get(1)?,
        total_orders: row.get(2)?,
        total_guests: row.get(3)?,
        total_bottles_sold: row.get(4)?,
        subtotal: row.get(5)?,
        tax_total: row.get(6)?,
        tip_total: row.get(7)?,
        grand_total: row.get(8)?,
        avg_order_value: row.get(9)?,
        avg_guests_per_order: row.get(10)?,
        wine_bottle_conversion_rate: row.get(11)?,
        club_conversion_rate: club_rate.map_or(Rate::NotApplicable, Rate::Value),
        conversion_rate: row.get(13)?,
        club_signups: row.get(14)?,
        order_mix: json_from_column(15, &order_mix)?,
        service_type_breakdown: json_from_column(16, &service_types)?,
        associate_performance: json_from_column(17, &associates)?,
        guest_breakdown: json_from_column(18, &guests)?,
    })
}

#[cfg(test)]
mod tests {
    use cellarsync_core::aggregate_day;
    use cellarsync_domain::{GuestBreakdown, GuestType, Order, ServiceType};
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn manager(dir: &TempDir) -> Arc<DbManager> {
        let db = DbManager::new(dir.path().join("kpi.db"), 2).unwrap();
        db.run_migrations().unwrap();
        Arc::new(db)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn tasting_order(id: &str, d: u32, associate: &str) -> Order {
        let mut guest_breakdown = GuestBreakdown::default();
        guest_breakdown.add(GuestType::NonClubGuest, 2);
        Order {
            id: id.into(),
            order_date: format!("2024-06-{d:02}T18:00:00.000Z"),
            customer_id: None,
            associate_name: associate.into(),
            total: 44.0,
            subtotal: 40.0,
            tax: 4.0,
            tip: 2.0,
            guest_count: 2,
            bottle_count: 1,
            has_wine_bottles: true,
            service_type: ServiceType::Tasting,
            guest_breakdown,
            raw_data: json!({}),
        }
    }

    fn snapshot(d: u32) -> DailyKpiSnapshot {
        let orders = vec![tasting_order("o-1", d, "Ana"), tasting_order("o-2", d, "Ben")];
        aggregate_day(day(d), &orders, &[])
    }

    fn raw_row(db: &DbManager, date: &str) -> Vec<String> {
        let conn = db.get_connection().unwrap();
        conn.query_row(
            "SELECT order_mix, service_type_breakdown, associate_performance, guest_breakdown,
                    CAST(club_conversion_rate AS TEXT), CAST(total_revenue AS TEXT)
             FROM kpi_daily_snapshots WHERE date = ?1",
            params![date],
            |row| {
                (0..6)
                    .map(|idx| row.get::<_, Option<String>>(idx).map(Option::unwrap_or_default))
                    .collect()
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn snapshot_round_trips() {
        let dir = TempDir::new().unwrap();
        let repo = SqliteKpiSnapshotRepository::new(manager(&dir));
        let stored = snapshot(1);

        repo.upsert_snapshot(&stored).await.unwrap();

        assert_eq!(repo.find_snapshot(day(1)).await.unwrap(), Some(stored));
        assert_eq!(repo.find_snapshot(day(2)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn not_applicable_club_rate_is_stored_as_null() {
        let dir = TempDir::new().unwrap();
        let db = manager(&dir);
        let repo = SqliteKpiSnapshotRepository::new(Arc::clone(&db));
        let empty = aggregate_day(day(5), &Vec::<Order>::new(), &[]);
        assert_eq!(empty.club_conversion_rate, Rate::NotApplicable);

        repo.upsert_snapshot(&empty).await.unwrap();

        let conn = db.get_connection().unwrap();
        let stored: Option<f64> = conn
            .query_row(
                "SELECT club_conversion_rate FROM kpi_daily_snapshots WHERE date = '2024-06-05'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(stored, None);
        let found = repo.find_snapshot(day(5)).await.unwrap().unwrap();
        assert_eq!(found.club_conversion_rate, Rate::NotApplicable);
    }

    #[tokio::test]
    async fn rewriting_a_day_yields_identical_bytes() {
        let dir = TempDir::new().unwrap();
        let db = manager(&dir);
        let repo = SqliteKpiSnapshotRepository::new(Arc::clone(&db));

        repo.upsert_snapshot(&snapshot(1)).await.unwrap();
        let first = raw_row(&db, "2024-06-01");
        repo.upsert_snapshot(&snapshot(1)).await.unwrap();
        let second = raw_row(&db, "2024-06-01");

        assert_eq!(first, second);
        assert!(first[2].find("\"Ana\"") < first[2].find("\"Ben\""));
    }

    #[tokio::test]
    async fn range_query_is_ascending_and_inclusive() {
        let dir = TempDir::new().unwrap();
        let repo = SqliteKpiSnapshotRepository::new(manager(&dir));
        for d in [4, 1, 3, 2] {
            repo.upsert_snapshot(&snapshot(d)).await.unwrap();
        }

        let range = DateRange::new(day(2), day(4)).unwrap();
        let dates: Vec<_> = repo
            .find_snapshots_in_range(range)
            .await
            .unwrap()
            .into_iter()
            .map(|snapshot| snapshot.date)
            .collect();
        assert_eq!(dates, vec![day(2), day(3), day(4)]);
    }
}
