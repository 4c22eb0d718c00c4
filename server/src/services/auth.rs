//! Auth services - registration, login and the current session

use crate::core::auth::AUTH_TOKEN_HEADER;
use crate::core::{AppError, AppState, encode_jwt};
use crate::dtos::{CreateUserDTO, LoginDTO, LoginResponseDTO, RegisterDTO, UserDTO};
use crate::entities::User;
use axum::{
    Extension,
    extract::{Json, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

#[instrument(skip(state, body), fields(email = %body.email))]
pub async fn login_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginDTO>,
) -> Result<impl IntoResponse, AppError> {
    // 1. refuse early while the email is locked out
    // 2. look the user up and check the password, counting failures
    // 3. refuse deactivated accounts
    // 4. mint the token and hand it back in the body and in both headers
    debug!("Login attempt");

    if let Some(remaining) = state.login_throttle.check(&body.email) {
        warn!("Login throttled");
        return Err(AppError::too_many_requests("Too many failed login attempts")
            .with_details(format!("Try again in {} seconds", remaining.as_secs().max(1))));
    }

    let user = match state.user.find_by_email(&body.email).await? {
        Some(user) if user.verify_password(&body.password) => user,
        _ => {
            state.login_throttle.record_failure(&body.email);
            warn!("Invalid credentials");
            return Err(AppError::unauthorized("Invalid email or password"));
        }
    };

    if !user.is_active {
        warn!("Login refused for deactivated user {}", user.user_id);
        return Err(AppError::forbidden("Account is deactivated"));
    }

    state.login_throttle.clear(&body.email);
    let token = encode_jwt(&user, &state.jwt_secret, state.jwt_expiry_hours)?;

    let mut headers = HeaderMap::new();
    let token_value = HeaderValue::from_str(&token)
        .map_err(|_| AppError::internal_server_error("Failed to build token header"))?;
    let bearer_value = HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|_| AppError::internal_server_error("Failed to build token header"))?;
    headers.insert(AUTH_TOKEN_HEADER, token_value);
    headers.insert(header::AUTHORIZATION, bearer_value);

    info!("User {} logged in", user.user_id);
    Ok((
        StatusCode::OK,
        headers,
        Json(LoginResponseDTO {
            token,
            user_id: user.user_id,
            name: user.name,
            role: user.role,
        }),
    ))
}

#[instrument(skip(state, body), fields(email = %body.email, role = %body.role))]
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterDTO>,
) -> Result<(StatusCode, Json<UserDTO>), AppError> {
    debug!("Registering user");
    body.validate()?;

    if !body.role.can_self_register() {
        warn!("Self registration refused for role {}", body.role);
        return Err(AppError::bad_request("Only patients and students can register"));
    }

    if state.user.find_by_email(&body.email).await?.is_some() {
        return Err(AppError::conflict("Email is already registered"));
    }

    let password_hash = User::hash_password(&body.password, state.bcrypt_cost)?;

    let new_user = CreateUserDTO {
        name: body.name.trim().to_string(),
        email: body.email.trim().to_lowercase(),
        password: password_hash,
        role: body.role,
        phone: body.phone,
    };

    let created = state.user.create_with_profile(&new_user).await?;
    info!("User {} registered", created.user_id);
    Ok((StatusCode::CREATED, Json(UserDTO::from(created))))
}

#[instrument(skip(current_user), fields(user_id = %current_user.user_id))]
pub async fn get_me(Extension(current_user): Extension<User>) -> Json<UserDTO> {
    Json(UserDTO::from(current_user))
}
