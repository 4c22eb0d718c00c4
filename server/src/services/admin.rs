//! Admin dashboard

use crate::core::{AppError, AppState, require_role};
use crate::dtos::DashboardStatsDTO;
use crate::entities::{Role, User};
use axum::{
    Extension,
    extract::{Json, State},
};
use chrono::Utc;
use futures::try_join;
use std::sync::Arc;
use tracing::{debug, instrument};

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<DashboardStatsDTO>, AppError> {
    require_role(&current_user, &[Role::Admin])?;

    let today = Utc::now().date_naive();
    let (roles, statuses, pending_applications, appointments_today, delivered_revenue_cents) = try_join!(
        state.user.count_by_role(),
        state.order.count_by_status(),
        state.application.count_pending(),
        state.appointment.count_open_on(today),
        state.order.delivered_revenue(),
    )?;
    debug!("Dashboard computed for {}", today);

    Ok(Json(DashboardStatsDTO {
        users_by_role: roles
            .into_iter()
            .map(|(role, count)| (role.to_string(), count))
            .collect(),
        orders_by_status: statuses
            .into_iter()
            .map(|(status, count)| (status.to_string(), count))
            .collect(),
        pending_applications,
        appointments_today,
        delivered_revenue_cents,
    }))
}
