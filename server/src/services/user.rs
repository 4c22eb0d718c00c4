//! User services - admin account management and self-service profile edits

use crate::core::{AppError, AppState, require_role};
use crate::dtos::{ChangePasswordDTO, UpdateMeDTO, UpdateUserDTO, UserDTO, UserQuery};
use crate::entities::{Role, User};
use crate::repositories::{Delete, Read, Update};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<UserDTO>>, AppError> {
    require_role(&current_user, &[Role::Admin])?;
    let users = state.user.find_many(&query).await?;
    debug!("Found {} users", users.len());
    Ok(Json(users.into_iter().map(UserDTO::from).collect()))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn get_user_by_id(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserDTO>, AppError> {
    require_role(&current_user, &[Role::Admin])?;
    let user = state
        .user
        .read(&user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(Json(UserDTO::from(user)))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(user_id): Path<i64>,
    Json(body): Json<UpdateUserDTO>,
) -> Result<Json<UserDTO>, AppError> {
    require_role(&current_user, &[Role::Admin])?;
    body.validate()?;
    if user_id == current_user.user_id && body.is_active == Some(false) {
        return Err(AppError::bad_request("You cannot deactivate your own account"));
    }

    let updated = state.user.update(&user_id, &body).await?;
    info!("User {} updated by admin", updated.user_id);
    Ok(Json(UserDTO::from(updated)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(user_id): Path<i64>,
) -> Result<StatusCode, AppError> {
    require_role(&current_user, &[Role::Admin])?;
    if user_id == current_user.user_id {
        warn!("Admin tried to delete their own account");
        return Err(AppError::bad_request("You cannot delete your own account"));
    }

    state.user.delete(&user_id).await?;
    info!("User {} deleted", user_id);
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<UpdateMeDTO>,
) -> Result<Json<UserDTO>, AppError> {
    body.validate()?;
    let updated = state
        .user
        .update(&current_user.user_id, &UpdateUserDTO::from(body))
        .await?;
    Ok(Json(UserDTO::from(updated)))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<ChangePasswordDTO>,
) -> Result<StatusCode, AppError> {
    body.validate()?;
    if !current_user.verify_password(&body.current_password) {
        warn!("Wrong current password");
        return Err(AppError::unauthorized("Current password is not correct"));
    }

    let password_hash = User::hash_password(&body.new_password, state.bcrypt_cost)?;
    state
        .user
        .update_password(&current_user.user_id, &password_hash)
        .await?;
    info!("Password changed");
    Ok(StatusCode::NO_CONTENT)
}
