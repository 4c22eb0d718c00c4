//! OrderRepository - orders, their items and stock movements

use super::Read;
use crate::dtos::OrderLineDTO;
use crate::entities::{Order, OrderItem, OrderStatus};
use chrono::Utc;
use sqlx::{Error, QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, instrument, warn};

const ORDER_COLUMNS: &str =
    "order_id, user_id, shipping_address, status, total_cents, created_at, updated_at";

/// Result of trying to place an order; anything but `Placed` rolled back
#[derive(Debug)]
pub enum PlaceOrderOutcome {
    Placed(Order, Vec<OrderItem>),
    UnknownMedicine(i64),
    OutOfStock(i64),
}

pub struct OrderRepository {
    connection_pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Prices the lines, reserves stock and inserts the order in one transaction
    #[instrument(skip(self, shipping_address, lines), fields(user_id = %user_id, lines = lines.len()))]
    pub async fn place(
        &self,
        user_id: &i64,
        shipping_address: &str,
        lines: &[OrderLineDTO],
    ) -> Result<PlaceOrderOutcome, Error> {
        debug!("Placing order");
        let mut tx = self.connection_pool.begin().await?;
        let mut priced: Vec<(i64, i64, i64)> = Vec::with_capacity(lines.len());

        for line in lines {
            let price: Option<i64> =
                sqlx::query_scalar("SELECT price_cents FROM medicines WHERE medicine_id = ?")
                    .bind(line.medicine_id)
                    .fetch_optional(&mut *tx)
                    .await?;
            let Some(price) = price else {
                warn!("Unknown medicine {}", line.medicine_id);
                return Ok(PlaceOrderOutcome::UnknownMedicine(line.medicine_id));
            };

            let reserved = sqlx::query(
                "UPDATE medicines SET stock = stock - ? WHERE medicine_id = ? AND stock >= ?",
            )
            .bind(line.quantity)
            .bind(line.medicine_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
            if reserved.rows_affected() == 0 {
                warn!("Insufficient stock for medicine {}", line.medicine_id);
                return Ok(PlaceOrderOutcome::OutOfStock(line.medicine_id));
            }

            priced.push((line.medicine_id, line.quantity, price));
        }

        let total_cents: i64 = priced.iter().map(|(_, quantity, price)| quantity * price).sum();
        let now = Utc::now();
        let sql = format!(
            "INSERT INTO orders (user_id, shipping_address, status, total_cents, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {ORDER_COLUMNS}"
        );
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(user_id)
            .bind(shipping_address.trim())
            .bind(OrderStatus::Pending)
            .bind(total_cents)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

        for (medicine_id, quantity, price) in &priced {
            sqlx::query(
                "INSERT INTO order_items (order_id, medicine_id, quantity, unit_price_cents) VALUES (?, ?, ?, ?)",
            )
            .bind(order.order_id)
            .bind(medicine_id)
            .bind(quantity)
            .bind(price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Order {} placed, total {}", order.order_id, order.total_cents);

        let items = self.find_items(&order.order_id).await?;
        Ok(PlaceOrderOutcome::Placed(order, items))
    }

    #[instrument(skip(self))]
    pub async fn find_items(&self, order_id: &i64) -> Result<Vec<OrderItem>, Error> {
        sqlx::query_as::<_, OrderItem>(
            "SELECT oi.order_item_id, oi.order_id, oi.medicine_id, m.name AS medicine_name, \
             oi.quantity, oi.unit_price_cents \
             FROM order_items oi INNER JOIN medicines m ON m.medicine_id = oi.medicine_id \
             WHERE oi.order_id = ? ORDER BY oi.order_item_id",
        )
        .bind(order_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    /// Lists orders, newest first; `user_id = None` lists everybody's
    #[instrument(skip(self))]
    pub async fn find_many(&self, user_id: Option<i64>, status: Option<OrderStatus>) -> Result<Vec<Order>, Error> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders WHERE 1 = 1"));
        if let Some(user_id) = user_id {
            builder.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(status) = status {
            builder.push(" AND status = ").push_bind(status);
        }
        builder.push(" ORDER BY created_at DESC, order_id DESC");

        builder
            .build_query_as::<Order>()
            .fetch_all(&self.connection_pool)
            .await
    }

    /// Moves an order from `from` to `to`. Returns `None` when the order is no
    /// longer in `from` (a concurrent update won). Cancelling puts the stock back.
    #[instrument(skip(self))]
    pub async fn transition(
        &self,
        order_id: &i64,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Option<Order>, Error> {
        let mut tx = self.connection_pool.begin().await?;

        let sql = format!(
            "UPDATE orders SET status = ?, updated_at = ? WHERE order_id = ? AND status = ? RETURNING {ORDER_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Order>(&sql)
            .bind(to)
            .bind(Utc::now())
            .bind(order_id)
            .bind(from)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(order) = updated else {
            return Ok(None);
        };

        if to == OrderStatus::Cancelled {
            sqlx::query(
                "UPDATE medicines SET stock = stock + \
                 (SELECT COALESCE(SUM(oi.quantity), 0) FROM order_items oi \
                  WHERE oi.order_id = ? AND oi.medicine_id = medicines.medicine_id) \
                 WHERE medicine_id IN (SELECT medicine_id FROM order_items WHERE order_id = ?)",
            )
            .bind(order_id)
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
            debug!("Stock restored for cancelled order");
        }

        tx.commit().await?;
        info!("Order {} moved from {} to {}", order.order_id, from, to);
        Ok(Some(order))
    }

    pub async fn count_by_status(&self) -> Result<Vec<(OrderStatus, i64)>, Error> {
        sqlx::query_as::<_, (OrderStatus, i64)>(
            "SELECT status, COUNT(*) FROM orders GROUP BY status ORDER BY status",
        )
        .fetch_all(&self.connection_pool)
        .await
    }

    pub async fn delivered_revenue(&self) -> Result<i64, Error> {
        sqlx::query_scalar("SELECT COALESCE(SUM(total_cents), 0) FROM orders WHERE status = 'delivered'")
            .fetch_one(&self.connection_pool)
            .await
    }
}

impl Read<Order, i64> for OrderRepository {
    async fn read(&self, id: &i64) -> Result<Option<Order>, Error> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = ?");
        sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.connection_pool)
            .await
    }
}
