//! Ayurweda API client - typed access to the REST backend plus a persisted login session

pub mod api;
pub mod error;
pub mod models;
pub mod session;

pub use api::{ApiClient, AUTH_TOKEN_HEADER};
pub use error::{ClientError, Result};
pub use session::{Session, SessionStore};
