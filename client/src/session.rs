//! Login session and its on-disk store

use crate::error::Result;
use crate::models::Role;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What the client remembers between runs after logging in
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub name: String,
    pub role: Role,
}

/// Persists a single [`Session`] as JSON in a file
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored session; a missing file means nobody is logged in
    pub async fn load(&self) -> Result<Option<Session>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(session)?;
        tokio::fs::write(&self.path, bytes).await?;
        debug!("Session for user {} saved", session.user_id);
        Ok(())
    }

    /// Forgets the session; clearing twice is not an error
    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> SessionStore {
        let dir = std::env::temp_dir().join(format!("ayurweda-session-{}-{}", name, std::process::id()));
        SessionStore::new(dir.join("session.json"))
    }

    #[tokio::test]
    async fn missing_file_means_no_session() {
        let store = temp_store("missing");
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_load_clear() {
        let store = temp_store("cycle");
        let session = Session {
            token: "token".to_string(),
            user_id: 7,
            name: "Asha".to_string(),
            role: Role::Patient,
        };

        store.save(&session).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(session));

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_file_is_a_decode_error() {
        let store = temp_store("corrupt");
        tokio::fs::create_dir_all(store.path().parent().unwrap()).await.unwrap();
        tokio::fs::write(store.path(), b"not json").await.unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, crate::ClientError::Decode(_)));
        store.clear().await.unwrap();
    }
}
