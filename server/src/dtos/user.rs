//! User and authentication DTOs

use super::PHONE_RE;
use crate::entities::{Role, User};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Public view of a user, the password hash is never exposed
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserDTO {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDTO {
    fn from(value: User) -> Self {
        Self {
            user_id: value.user_id,
            name: value.name,
            email: value.email,
            role: value.role,
            phone: value.phone,
            is_active: value.is_active,
            created_at: value.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct RegisterDTO {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,

    #[validate(email(message = "Email address is not valid"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub password: String,

    pub role: Role,

    #[validate(regex(path = *PHONE_RE, message = "Phone number is not valid"))]
    pub phone: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginDTO {
    pub email: String,
    pub password: String,
}

/// Session data handed to the client after a successful login
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginResponseDTO {
    pub token: String,
    pub user_id: i64,
    pub name: String,
    pub role: Role,
}

/// Row data for inserting a user; `password` is already hashed
#[derive(Debug, Clone)]
pub struct CreateUserDTO {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    pub phone: Option<String>,
}

/// Partial update of a user; only `Some` fields change
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateUserDTO {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: Option<String>,

    #[validate(regex(path = *PHONE_RE, message = "Phone number is not valid"))]
    pub phone: Option<String>,

    pub is_active: Option<bool>,
}

/// Self-service profile update; cannot toggle `is_active`
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct UpdateMeDTO {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: Option<String>,

    #[validate(regex(path = *PHONE_RE, message = "Phone number is not valid"))]
    pub phone: Option<String>,
}

impl From<UpdateMeDTO> for UpdateUserDTO {
    fn from(value: UpdateMeDTO) -> Self {
        Self {
            name: value.name,
            phone: value.phone,
            is_active: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct ChangePasswordDTO {
    pub current_password: String,

    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub new_password: String,
}
