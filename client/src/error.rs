//! Client error type

use thiserror::Error;

/// Everything a call through [`crate::ApiClient`] can fail with
#[derive(Error, Debug)]
pub enum ClientError {
    /// The HTTP client could not be set up
    #[error("Failed to build HTTP client")]
    Build(#[source] reqwest::Error),

    /// The server could not be reached at all
    #[error("Cannot connect to the server")]
    Connect(#[source] reqwest::Error),

    /// The server answered with a non-success status
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Session storage error: {0}")]
    Session(#[from] std::io::Error),
}

impl ClientError {
    /// HTTP status of an API error, `None` for transport and local failures
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
