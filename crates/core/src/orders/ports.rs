//! Port interfaces for order and staff persistence

use async_trait::async_trait;
use cellarsync_domain::{DateRange, Order, Result, StaffMember};

/// Trait for persisting canonical orders
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert or fully replace the order keyed by `order.id`
    async fn upsert_order(&self, order: &Order) -> Result<()>;

    /// Orders whose calendar day falls in `range` (inclusive)
    async fn find_orders_in_range(&self, range: DateRange) -> Result<Vec<Order>>;

    /// Orders serviced by one associate within `range`
    async fn find_orders_for_associate(
        &self,
        associate_name: &str,
        range: DateRange,
    ) -> Result<Vec<Order>>;
}

/// Trait for persisting staff members
#[async_trait]
pub trait StaffRepository: Send + Sync {
    /// Upsert by name, returning the number of rows written
    async fn upsert_staff(&self, staff: &[StaffMember]) -> Result<usize>;

    /// All known staff, ordered by name
    async fn list_staff(&self) -> Result<Vec<StaffMember>>;
}
