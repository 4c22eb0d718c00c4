//! Order services - checkout, order history and fulfilment

use crate::core::{AppError, AppState, require_role};
use crate::dtos::{OrderDTO, OrderQuery, OrderStatusDTO, PlaceOrderDTO};
use crate::entities::{Order, OrderStatus, Role, User};
use crate::repositories::{PlaceOrderOutcome, Read};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Loads an order the user is allowed to see: the owner or an admin
async fn visible_order(state: &AppState, user: &User, order_id: i64) -> Result<Order, AppError> {
    let order = state
        .order
        .read(&order_id)
        .await?
        .ok_or_else(|| AppError::not_found("Order not found"))?;
    if user.role != Role::Admin && order.user_id != user.user_id {
        warn!("User {} tried to access order {}", user.user_id, order_id);
        return Err(AppError::forbidden("You cannot access this order"));
    }
    Ok(order)
}

/// Moves the order to `to`; a concurrent change in between answers 409
async fn apply_transition(
    state: &AppState,
    order: &Order,
    to: OrderStatus,
) -> Result<Order, AppError> {
    if !order.status.can_transition_to(to) {
        return Err(AppError::bad_request("Illegal status transition").with_details(format!(
            "Cannot move an order from {} to {}",
            order.status, to
        )));
    }
    state
        .order
        .transition(&order.order_id, order.status, to)
        .await?
        .ok_or_else(|| AppError::conflict("Order was changed by someone else"))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, lines = body.items.len()))]
pub async fn place_order(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<PlaceOrderDTO>,
) -> Result<(StatusCode, Json<OrderDTO>), AppError> {
    require_role(&current_user, &[Role::Patient])?;
    body.validate()?;
    if body.items.iter().any(|line| line.quantity < 1) {
        return Err(AppError::bad_request("Quantity must be at least 1"));
    }

    let lines = body.merged_items()?;
    debug!("Placing order with {} distinct medicines", lines.len());

    match state
        .order
        .place(&current_user.user_id, &body.shipping_address, &lines)
        .await?
    {
        PlaceOrderOutcome::Placed(order, items) => {
            info!("Order {} placed", order.order_id);
            Ok((StatusCode::CREATED, Json(OrderDTO::new(order, items))))
        }
        PlaceOrderOutcome::UnknownMedicine(id) => Err(AppError::not_found("Medicine not found")
            .with_details(format!("Medicine {} does not exist", id))),
        PlaceOrderOutcome::OutOfStock(id) => Err(AppError::conflict("Insufficient stock")
            .with_details(format!("Not enough stock for medicine {}", id))),
    }
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Vec<Order>>, AppError> {
    let owner = (current_user.role != Role::Admin).then_some(current_user.user_id);
    let orders = state.order.find_many(owner, query.status).await?;
    debug!("Found {} orders", orders.len());
    Ok(Json(orders))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderDTO>, AppError> {
    let order = visible_order(&state, &current_user, order_id).await?;
    let items = state.order.find_items(&order_id).await?;
    Ok(Json(OrderDTO::new(order, items)))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, status = %body.status))]
pub async fn update_order_status(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(order_id): Path<i64>,
    Json(body): Json<OrderStatusDTO>,
) -> Result<Json<OrderDTO>, AppError> {
    require_role(&current_user, &[Role::Admin])?;
    let order = visible_order(&state, &current_user, order_id).await?;

    let updated = apply_transition(&state, &order, body.status).await?;
    let items = state.order.find_items(&order_id).await?;
    info!("Order {} is now {}", order_id, updated.status);
    Ok(Json(OrderDTO::new(updated, items)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(order_id): Path<i64>,
) -> Result<Json<OrderDTO>, AppError> {
    let order = visible_order(&state, &current_user, order_id).await?;
    if order.user_id != current_user.user_id {
        return Err(AppError::forbidden("Only the owner can cancel an order"));
    }
    if order.status != OrderStatus::Pending {
        return Err(AppError::bad_request("Only pending orders can be cancelled"));
    }

    let cancelled = apply_transition(&state, &order, OrderStatus::Cancelled).await?;
    let items = state.order.find_items(&order_id).await?;
    info!("Order {} cancelled by its owner", order_id);
    Ok(Json(OrderDTO::new(cancelled, items)))
}
