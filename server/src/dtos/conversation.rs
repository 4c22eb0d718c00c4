//! Conversation and message DTOs

use crate::entities::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_MESSAGE_PAGE: i64 = 50;
pub const MAX_MESSAGE_PAGE: i64 = 100;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StartConversationDTO {
    pub participant_id: i64,
}

/// A conversation as seen by one participant
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConversationDTO {
    pub conversation_id: i64,
    pub participant_id: i64,
    pub participant_name: String,
    pub created_at: DateTime<Utc>,
    pub last_message: Option<Message>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct SendMessageDTO {
    #[validate(length(min = 1, max = 5000, message = "Message content must be between 1 and 5000 characters"))]
    pub content: String,
}

/// Pagination for message history, newest first
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct MessagesQuery {
    pub before_id: Option<i64>,
    pub limit: Option<i64>,
}

impl MessagesQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_MESSAGE_PAGE).clamp(1, MAX_MESSAGE_PAGE)
    }
}
