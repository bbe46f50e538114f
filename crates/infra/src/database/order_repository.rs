//! SQLite-backed implementation of the `OrderRepository` port.
//!
//! Orders are keyed by upstream id and replaced wholesale on upsert. The
//! `order_day` column holds the truncated calendar day so range queries stay
//! on an index instead of parsing timestamps.

use std::sync::Arc;

use async_trait::async_trait;
use cellarsync_core::OrderRepository;
use cellarsync_domain::{DateRange, GuestBreakdown, Order, Result};
use rusqlite::{params, Row, ToSql};
use tokio::task;

use super::manager::{
    day_key, json_from_column, map_join_error, map_json_error, map_sql_error, DbConnection,
    DbManager,
};

/// SQLite repository for canonical orders.
pub struct SqliteOrderRepository {
    db: Arc<DbManager>,
}

impl SqliteOrderRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl OrderRepository for SqliteOrderRepository {
    async fn upsert_order(&self, order: &Order) -> Result<()> {
        let db = Arc::clone(&self.db);
        let order = order.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            insert_order(&conn, &order)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_orders_in_range(&self, range: DateRange) -> Result<Vec<Order>> {
        let db = Arc::clone(&self.db);
        let (start, end) = (day_key(range.start), day_key(range.end));

        task::spawn_blocking(move || -> Result<Vec<Order>> {
            let conn = db.get_connection()?;
            let params: [&dyn ToSql; 2] = [&start, &end];
            query_orders(&conn, ORDER_RANGE_QUERY, &params)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_orders_for_associate(
        &self,
        associate_name: &str,
        range: DateRange,
    ) -> Result<Vec<Order>> {
        let db = Arc::clone(&self.db);
        let associate = associate_name.to_owned();
        let (start, end) = (day_key(range.start), day_key(range.end));

        task::spawn_blocking(move || -> Result<Vec<Order>> {
            let conn = db.get_connection()?;
            let params: [&dyn ToSql; 3] = [&associate, &start, &end];
            query_orders(&conn, ORDER_ASSOCIATE_QUERY, &params)
        })
        .await
        .map_err(map_join_error)?
    }
}

const ORDER_UPSERT_SQL: &str = "INSERT OR REPLACE INTO orders (
        id, order_date, order_day, customer_id, associate_name, total, subtotal, tax, tip,
        guest_count, bottle_count, has_wine_bottles, service_type, guest_breakdown, raw_data
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)";

const ORDER_RANGE_QUERY: &str = "SELECT id, order_date, customer_id, associate_name, total,
        subtotal, tax, tip, guest_count, bottle_count, has_wine_bottles, service_type,
        guest_breakdown, raw_data
    FROM orders
    WHERE order_day BETWEEN ?1 AND ?2
    ORDER BY order_date, id";

const ORDER_ASSOCIATE_QUERY: &str = "SELECT id, order_date, customer_id, associate_name, total,
        subtotal, tax, tip, guest_count, bottle_count, has_wine_bottles, service_type,
        guest_breakdown, raw_data
    FROM orders
    WHERE associate_name = ?1 AND order_day BETWEEN ?2 AND ?3
    ORDER BY order_date, id";

fn insert_order(conn: &DbConnection, order: &Order) -> Result<()> {
    let order_day = order.order_day().map(day_key);
    let guest_breakdown = serde_json::to_string(&order.guest_breakdown).map_err(map_json_error)?;
    let raw_data = serde_json::to_string(&order.raw_data).map_err(map_json_error)?;

    conn.execute(
        ORDER_UPSERT_SQL,
        params![
            order.id,
            order.order_date,
            order_day,
            order.customer_id,
            order.associate_name,
            order.total,
            order.subtotal,
            order.tax,
            order.tip,
            order.guest_count,
            order.bottle_count,
            order.has_wine_bottles,
            order.service_type.as_str(),
            guest_breakdown,
            raw_data,
        ],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

fn query_orders(conn: &DbConnection, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<Order>> {
    let mut stmt = conn.prepare(sql).map_err(map_sql_error)?;
    let rows = stmt.query_map(params, map_order_row).map_err(map_sql_error)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(map_sql_error)
}

fn map_order_row(row: &Row<'_>) -> rusqlite::Result<Order> {
    let service_type: String = row.get(11)?;
    let guest_breakdown: String = row.get(12)?;
    let raw_data: String = row.get(13)?;

    Ok(Order {
        id: row.get(0)?,
        order_date: row.get(1)?,
        customer_id: row.get(2)?,
        associate_name: row.get(3)?,
        total: row.get(4)?,
        subtotal: row.get(5)?,
        tax: row.get(6)?,
        tip: row.get(7)?,
        guest_count: row.get(8)?,
        bottle_count: row.get(9)?,
        has_wine_bottles: row.get(10)?,
        service_type: service_type.parse().map_err(|err: String| {
            rusqlite::Error::FromSqlConversionFailure(
                11,
                rusqlite::types::Type::Text,
                err.into(),
            )
        })?,
        guest_breakdown: json_from_column::<GuestBreakdown>(12, &guest_breakdown)?,
        raw_data: json_from_column(13, &raw_data)?,
    })
}
