//! Order entities

use super::enums::OrderStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Order {
    pub order_id: i64,
    pub user_id: i64,
    pub shipping_address: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct OrderItem {
    pub order_item_id: i64,
    pub order_id: i64,
    pub medicine_id: i64,
    pub medicine_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
}
