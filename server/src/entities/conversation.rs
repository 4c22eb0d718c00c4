//! Conversation entities - one-to-one threads between two users

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Conversation {
    pub conversation_id: i64,
    // stored ordered so each pair has exactly one row
    pub user_low_id: i64,
    pub user_high_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn has_participant(&self, user_id: i64) -> bool {
        self.user_low_id == user_id || self.user_high_id == user_id
    }

    pub fn other_participant(&self, user_id: i64) -> i64 {
        if self.user_low_id == user_id {
            self.user_high_id
        } else {
            self.user_low_id
        }
    }

    /// Orders a pair of user ids the way they are stored
    pub fn ordered_pair(a: i64, b: i64) -> (i64, i64) {
        if a < b { (a, b) } else { (b, a) }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Message {
    pub message_id: i64,
    pub conversation_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_pair_is_symmetric() {
        assert_eq!(Conversation::ordered_pair(7, 3), (3, 7));
        assert_eq!(Conversation::ordered_pair(3, 7), (3, 7));
    }

    #[test]
    fn other_participant_resolves_both_sides() {
        let conversation = Conversation {
            conversation_id: 1,
            user_low_id: 3,
            user_high_id: 7,
            created_at: Utc::now(),
        };
        assert!(conversation.has_participant(3));
        assert!(!conversation.has_participant(4));
        assert_eq!(conversation.other_participant(3), 7);
        assert_eq!(conversation.other_participant(7), 3);
    }
}
