//! Core Module - infrastructure shared by every handler
//!
//! - Authentication, JWT and route guards
//! - Configuration
//! - Error handling
//! - Application state and the login throttle

pub mod auth;
pub mod config;
pub mod error;
pub mod state;
pub mod throttle;

pub use auth::{
    Claims, authentication_middleware, conversation_participant_middleware, decode_jwt, encode_jwt,
    require_role,
};
pub use config::Config;
pub use error::AppError;
pub use state::AppState;
pub use throttle::LoginThrottle;
