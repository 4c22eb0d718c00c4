use crate::core::{AppError, AppState};
use crate::entities::{Role, User};
use crate::repositories::Read;
use axum::extract::{Path, State};
use axum::{body::Body, extract::Request, http, http::Response, middleware::Next};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Header the SPA sends its token in
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

// contents of the jwt
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub exp: usize, // Expiry time of the token
    pub iat: usize, // Issued at time of the token
    pub id: i64,
    pub email: String,
    pub role: Role,
}

#[instrument(skip(user, secret), fields(user_id = %user.user_id))]
pub fn encode_jwt(
    user: &User,
    secret: &str,
    expiry_hours: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    debug!("Encoding JWT token for user");
    let now = Utc::now();
    let exp = (now + Duration::hours(expiry_hours)).timestamp() as usize;
    let iat = now.timestamp() as usize;
    let claim = Claims {
        iat,
        exp,
        id: user.user_id,
        email: user.email.clone(),
        role: user.role,
    };

    encode(
        &Header::default(),
        &claim,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .inspect_err(|e| error!("Failed to encode JWT token: {:?}", e))
}

#[instrument(skip(jwt_token, secret))]
pub fn decode_jwt(
    jwt_token: &str,
    secret: &str,
) -> Result<TokenData<Claims>, jsonwebtoken::errors::Error> {
    debug!("Decoding JWT token");
    decode::<Claims>(
        jwt_token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .inspect(|data| debug!("JWT token decoded for user {}", data.claims.id))
}

/// Pulls the token out of `x-auth-token`, falling back to `Authorization: Bearer`
fn extract_token(req: &Request) -> Result<Option<String>, AppError> {
    if let Some(value) = req.headers().get(AUTH_TOKEN_HEADER) {
        let token = value
            .to_str()
            .map_err(|_| AppError::forbidden("Invalid token header"))?
            .trim();
        if !token.is_empty() {
            return Ok(Some(token.to_string()));
        }
    }

    let Some(value) = req.headers().get(http::header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AppError::forbidden("Invalid authorization header"))?;
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some(scheme), Some(token)) if scheme.eq_ignore_ascii_case("bearer") => {
            Ok(Some(token.to_string()))
        }
        _ => Ok(None),
    }
}

#[instrument(skip(state, req, next))]
pub async fn authentication_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running authentication middleware");
    let Some(token) = extract_token(&req)? else {
        warn!("Missing auth token");
        return Err(AppError::forbidden("No token, authorization denied"));
    };

    let token_data = decode_jwt(&token, &state.jwt_secret).map_err(|_| {
        warn!("Failed to decode JWT token");
        AppError::unauthorized("Token is not valid")
    })?;

    let current_user = match state.user.read(&token_data.claims.id).await? {
        Some(user) => user,
        None => {
            warn!("User {} from token no longer exists", token_data.claims.id);
            return Err(AppError::unauthorized("Token is not valid"));
        }
    };

    if !current_user.is_active {
        warn!("Inactive user {} rejected", current_user.user_id);
        return Err(AppError::forbidden("Account is deactivated"));
    }

    debug!("User authenticated: {}", current_user.user_id);
    req.extensions_mut().insert(current_user);
    Ok(next.run(req).await)
}

/// Loads the conversation named in the path and checks the current user takes
/// part in it. The conversation is inserted into the request extensions.
#[instrument(skip(state, req, next))]
pub async fn conversation_participant_middleware(
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<i64>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    let current_user = req
        .extensions()
        .get::<User>()
        .ok_or_else(|| {
            warn!("User not found in request extensions");
            AppError::unauthorized("User not authenticated")
        })?
        .clone();

    let conversation = state
        .conversation
        .read(&conversation_id)
        .await?
        .ok_or_else(|| AppError::not_found("Conversation not found"))?;

    if !conversation.has_participant(current_user.user_id) {
        warn!(
            "User {} is not part of conversation {}",
            current_user.user_id, conversation_id
        );
        return Err(AppError::forbidden("You are not part of this conversation"));
    }

    req.extensions_mut().insert(conversation);
    Ok(next.run(req).await)
}

/// Checks that the user holds one of the allowed roles
pub fn require_role(user: &User, allowed_roles: &[Role]) -> Result<(), AppError> {
    if !allowed_roles.contains(&user.role) {
        warn!(
            "User {} has insufficient role {}, required one of: {:?}",
            user.user_id, user.role, allowed_roles
        );
        return Err(AppError::forbidden("Insufficient role").with_details(format!(
            "This action requires one of the following roles: {}",
            allowed_roles
                .iter()
                .map(Role::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }
    info!("Role check passed for user {}", user.user_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        User {
            user_id: 42,
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            password: String::new(),
            role,
            phone: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn jwt_round_trip_keeps_identity() {
        let token = encode_jwt(&user(Role::Doctor), "secret", 1).unwrap();
        let data = decode_jwt(&token, "secret").unwrap();
        assert_eq!(data.claims.id, 42);
        assert_eq!(data.claims.role, Role::Doctor);
        assert_eq!(data.claims.email, "asha@example.com");
    }

    #[test]
    fn jwt_with_wrong_secret_is_rejected() {
        let token = encode_jwt(&user(Role::Patient), "secret", 1).unwrap();
        assert!(decode_jwt(&token, "other").is_err());
    }

    #[test]
    fn expired_jwt_is_rejected() {
        let token = encode_jwt(&user(Role::Patient), "secret", -2).unwrap();
        assert!(decode_jwt(&token, "secret").is_err());
    }

    fn request_with(headers: &[(&str, &str)]) -> Request {
        let mut builder = http::Request::builder().uri("/users/me");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn token_is_read_from_either_header() {
        let req = request_with(&[(AUTH_TOKEN_HEADER, "abc")]);
        assert_eq!(extract_token(&req).unwrap().as_deref(), Some("abc"));

        let req = request_with(&[("authorization", "Bearer xyz")]);
        assert_eq!(extract_token(&req).unwrap().as_deref(), Some("xyz"));

        let req = request_with(&[]);
        assert!(extract_token(&req).unwrap().is_none());
    }

    #[test]
    fn blank_token_header_falls_back_to_bearer() {
        let req = request_with(&[(AUTH_TOKEN_HEADER, "  "), ("authorization", "Bearer xyz")]);
        assert_eq!(extract_token(&req).unwrap().as_deref(), Some("xyz"));

        let req = request_with(&[(AUTH_TOKEN_HEADER, "")]);
        assert!(extract_token(&req).unwrap().is_none());
    }

    #[test]
    fn require_role_checks_membership() {
        assert!(require_role(&user(Role::Admin), &[Role::Admin]).is_ok());
        let err = require_role(&user(Role::Student), &[Role::Admin, Role::Doctor]).unwrap_err();
        assert_eq!(err.status(), http::StatusCode::FORBIDDEN);
    }
}
