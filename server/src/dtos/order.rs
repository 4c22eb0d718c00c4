//! Order DTOs

use crate::entities::{Order, OrderItem, OrderStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use validator::{Validate, ValidationError, ValidationErrors};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OrderLineDTO {
    pub medicine_id: i64,
    pub quantity: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct PlaceOrderDTO {
    #[validate(length(min = 1, message = "An order needs at least one item"))]
    pub items: Vec<OrderLineDTO>,

    #[validate(length(min = 5, max = 500, message = "Shipping address must be between 5 and 500 characters"))]
    pub shipping_address: String,
}

impl PlaceOrderDTO {
    /// Merges lines for the same medicine, keeping the first-seen order.
    /// Fails when the summed quantity of a medicine overflows.
    pub fn merged_items(&self) -> Result<Vec<OrderLineDTO>, ValidationErrors> {
        let mut order: Vec<i64> = Vec::new();
        let mut quantities: BTreeMap<i64, i64> = BTreeMap::new();
        for line in &self.items {
            let total = quantities.entry(line.medicine_id).or_insert_with(|| {
                order.push(line.medicine_id);
                0
            });
            *total = total
                .checked_add(line.quantity)
                .ok_or_else(|| quantity_too_large(line.medicine_id))?;
        }
        Ok(order
            .into_iter()
            .map(|medicine_id| OrderLineDTO {
                medicine_id,
                quantity: quantities[&medicine_id],
            })
            .collect())
    }
}

fn quantity_too_large(medicine_id: i64) -> ValidationErrors {
    let mut error = ValidationError::new("quantity_overflow");
    error.message = Some(Cow::from(format!(
        "Total quantity for medicine {} is too large",
        medicine_id
    )));
    let mut errors = ValidationErrors::new();
    errors.add("items", error);
    errors
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OrderStatusDTO {
    pub status: OrderStatus,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
}

/// Order with its line items
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OrderDTO {
    pub order_id: i64,
    pub user_id: i64,
    pub shipping_address: String,
    pub status: OrderStatus,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl OrderDTO {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        Self {
            order_id: order.order_id,
            user_id: order.user_id,
            shipping_address: order.shipping_address,
            status: order.status,
            total_cents: order.total_cents,
            created_at: order.created_at,
            updated_at: order.updated_at,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_lines_are_merged() {
        let dto = PlaceOrderDTO {
            items: vec![
                OrderLineDTO { medicine_id: 4, quantity: 1 },
                OrderLineDTO { medicine_id: 2, quantity: 3 },
                OrderLineDTO { medicine_id: 4, quantity: 2 },
            ],
            shipping_address: "12 Lotus Road, Kandy".to_string(),
        };
        assert_eq!(
            dto.merged_items().unwrap(),
            vec![
                OrderLineDTO { medicine_id: 4, quantity: 3 },
                OrderLineDTO { medicine_id: 2, quantity: 3 },
            ]
        );
    }

    #[test]
    fn overflowing_quantities_are_rejected() {
        let dto = PlaceOrderDTO {
            items: vec![
                OrderLineDTO { medicine_id: 1, quantity: i64::MAX },
                OrderLineDTO { medicine_id: 1, quantity: i64::MAX },
            ],
            shipping_address: "12 Lotus Road, Kandy".to_string(),
        };
        let errors = dto.merged_items().unwrap_err();
        assert!(errors.field_errors().contains_key("items"));
    }

    #[test]
    fn empty_order_is_rejected() {
        let dto = PlaceOrderDTO { items: vec![], shipping_address: "12 Lotus Road, Kandy".to_string() };
        assert!(dto.validate().is_err());
    }
}
