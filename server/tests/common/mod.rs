#![allow(dead_code)]

use axum::http::HeaderName;
use axum_test::TestServer;
use ayurweda_server::core::{AppState, Config, encode_jwt};
use ayurweda_server::dtos::{CreateUserDTO, NewDoctorDTO};
use ayurweda_server::entities::{Role, User};
use ayurweda_server::repositories::Create;
use sqlx::SqlitePool;
use std::sync::Arc;

pub const TEST_PASSWORD: &str = "Password123";
pub const JWT_SECRET: &str = "ayurweda-test-secret";

/// Header the server reads the session token from
pub fn auth_header() -> HeaderName {
    HeaderName::from_static("x-auth-token")
}

/// Configuration used by every test: cheap bcrypt and a small login budget
pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: JWT_SECRET.to_string(),
        jwt_expiry_hours: 24,
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        max_connections: 1,
        connection_lifetime_secs: 1800,
        app_env: "test".to_string(),
        bcrypt_cost: 4,
        slot_minutes: 30,
        login_max_failures: 3,
        login_lockout_secs: 300,
        cors_origin: None,
    }
}

/// Creates an AppState for tests
pub fn create_test_state(pool: SqlitePool) -> Arc<AppState> {
    Arc::new(AppState::new(pool, &test_config()))
}

/// Creates a TestServer over the full router
pub fn create_test_server(state: Arc<AppState>) -> TestServer {
    let app = ayurweda_server::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Inserts an active user with `TEST_PASSWORD`, including its role profile
pub async fn create_user(state: &AppState, name: &str, email: &str, role: Role) -> User {
    let account = CreateUserDTO {
        name: name.to_string(),
        email: email.to_string(),
        password: User::hash_password(TEST_PASSWORD, 4).expect("hash"),
        role,
        phone: None,
    };

    match role {
        Role::Patient | Role::Student => state
            .user
            .create_with_profile(&account)
            .await
            .expect("Failed to create user"),
        Role::Doctor => {
            let profile = NewDoctorDTO {
                specialization: "Kayachikitsa".to_string(),
                qualification: "BAMS".to_string(),
                experience_years: 8,
                consultation_fee_cents: 150_000,
                bio: None,
            };
            state
                .doctor
                .create_with_account(&account, &profile)
                .await
                .expect("Failed to create doctor")
                .0
        }
        Role::Admin => state.user.create(&account).await.expect("Failed to create admin"),
    }
}

/// Mints a token for the user, as a login would
pub fn token_for(state: &AppState, user: &User) -> String {
    encode_jwt(user, &state.jwt_secret, state.jwt_expiry_hours).expect("Failed to create JWT token")
}

/// Creates a user and returns it together with its token
pub async fn login_as(state: &AppState, name: &str, email: &str, role: Role) -> (User, String) {
    let user = create_user(state, name, email, role).await;
    let token = token_for(state, &user);
    (user, token)
}

pub async fn doctor_id_of(state: &AppState, user: &User) -> i64 {
    state
        .doctor
        .find_by_user_id(&user.user_id)
        .await
        .expect("query")
        .expect("doctor profile")
        .doctor_id
}

pub async fn patient_id_of(state: &AppState, user: &User) -> i64 {
    state
        .patient
        .find_by_user_id(&user.user_id)
        .await
        .expect("query")
        .expect("patient profile")
        .patient_id
}
