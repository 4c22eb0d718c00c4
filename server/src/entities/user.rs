//! User entity - account row with password helpers

use super::enums::Role;
use bcrypt::{hash, verify};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Role,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Verify if target_password matches the stored hashed password
    pub fn verify_password(&self, target_password: &str) -> bool {
        verify(target_password, &self.password).unwrap_or(false)
    }

    /// Hash a password using bcrypt with the configured cost
    pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
        hash(password, cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user_with_password(password: &str) -> User {
        User {
            user_id: 1,
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            password: User::hash_password(password, 4).unwrap(),
            role: Role::Patient,
            phone: None,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn verify_password_accepts_the_original() {
        let user = user_with_password("Turmeric42");
        assert!(user.verify_password("Turmeric42"));
        assert!(!user.verify_password("turmeric42"));
    }

    #[test]
    fn password_is_never_serialized() {
        let user = user_with_password("Turmeric42");
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "patient");
    }
}
