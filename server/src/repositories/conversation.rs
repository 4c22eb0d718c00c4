//! ConversationRepository - one-to-one threads and their messages

use super::Read;
use crate::entities::{Conversation, Message};
use chrono::{DateTime, Utc};
use sqlx::{Error, QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info, instrument};

/// One row of a user's inbox: the thread, the person on the other side and
/// the latest message, if any
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct InboxRow {
    pub conversation_id: i64,
    pub participant_id: i64,
    pub participant_name: String,
    pub created_at: DateTime<Utc>,
    pub last_message_id: Option<i64>,
    pub last_sender_id: Option<i64>,
    pub last_content: Option<String>,
    pub last_created_at: Option<DateTime<Utc>>,
}

impl InboxRow {
    pub fn last_message(&self) -> Option<Message> {
        Some(Message {
            message_id: self.last_message_id?,
            conversation_id: self.conversation_id,
            sender_id: self.last_sender_id?,
            content: self.last_content.clone()?,
            created_at: self.last_created_at?,
        })
    }
}

pub struct ConversationRepository {
    connection_pool: SqlitePool,
}

impl ConversationRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    pub async fn find_between(&self, a: i64, b: i64) -> Result<Option<Conversation>, Error> {
        let (low, high) = Conversation::ordered_pair(a, b);
        sqlx::query_as::<_, Conversation>(
            "SELECT conversation_id, user_low_id, user_high_id, created_at \
             FROM conversations WHERE user_low_id = ? AND user_high_id = ?",
        )
        .bind(low)
        .bind(high)
        .fetch_optional(&self.connection_pool)
        .await
    }

    /// Returns the existing thread between two users, or opens one.
    /// The flag is `true` when a new thread was created.
    #[instrument(skip(self))]
    pub async fn find_or_create(&self, a: i64, b: i64) -> Result<(Conversation, bool), Error> {
        if let Some(existing) = self.find_between(a, b).await? {
            debug!("Conversation already exists");
            return Ok((existing, false));
        }

        let (low, high) = Conversation::ordered_pair(a, b);
        let inserted = sqlx::query_as::<_, Conversation>(
            "INSERT INTO conversations (user_low_id, user_high_id, created_at) VALUES (?, ?, ?) \
             ON CONFLICT (user_low_id, user_high_id) DO NOTHING \
             RETURNING conversation_id, user_low_id, user_high_id, created_at",
        )
        .bind(low)
        .bind(high)
        .bind(Utc::now())
        .fetch_optional(&self.connection_pool)
        .await?;

        match inserted {
            Some(conversation) => {
                info!("Conversation {} opened", conversation.conversation_id);
                Ok((conversation, true))
            }
            // lost a race with the other participant
            None => self
                .find_between(a, b)
                .await?
                .map(|c| (c, false))
                .ok_or(Error::RowNotFound),
        }
    }

    /// The user's conversations, most recent activity first
    #[instrument(skip(self))]
    pub async fn find_inbox(&self, user_id: i64) -> Result<Vec<InboxRow>, Error> {
        sqlx::query_as::<_, InboxRow>(
            "SELECT c.conversation_id, u.user_id AS participant_id, u.name AS participant_name, \
             c.created_at, m.message_id AS last_message_id, m.sender_id AS last_sender_id, \
             m.content AS last_content, m.created_at AS last_created_at \
             FROM conversations c \
             INNER JOIN users u ON u.user_id = \
                 CASE WHEN c.user_low_id = ? THEN c.user_high_id ELSE c.user_low_id END \
             LEFT JOIN messages m ON m.message_id = \
                 (SELECT MAX(message_id) FROM messages WHERE conversation_id = c.conversation_id) \
             WHERE c.user_low_id = ? OR c.user_high_id = ? \
             ORDER BY COALESCE(m.created_at, c.created_at) DESC, c.conversation_id DESC",
        )
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    /// A page of history, newest first, strictly older than `before_id` when given
    #[instrument(skip(self))]
    pub async fn find_messages(
        &self,
        conversation_id: i64,
        before_id: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Message>, Error> {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT message_id, conversation_id, sender_id, content, created_at \
             FROM messages WHERE conversation_id = ",
        );
        builder.push_bind(conversation_id);
        if let Some(before_id) = before_id {
            builder.push(" AND message_id < ").push_bind(before_id);
        }
        builder.push(" ORDER BY message_id DESC LIMIT ").push_bind(limit);

        builder
            .build_query_as::<Message>()
            .fetch_all(&self.connection_pool)
            .await
    }

    #[instrument(skip(self, content))]
    pub async fn add_message(
        &self,
        conversation_id: i64,
        sender_id: i64,
        content: &str,
    ) -> Result<Message, Error> {
        let message = sqlx::query_as::<_, Message>(
            "INSERT INTO messages (conversation_id, sender_id, content, created_at) VALUES (?, ?, ?, ?) \
             RETURNING message_id, conversation_id, sender_id, content, created_at",
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(content)
        .bind(Utc::now())
        .fetch_one(&self.connection_pool)
        .await?;
        debug!("Message {} stored", message.message_id);
        Ok(message)
    }
}

impl Read<Conversation, i64> for ConversationRepository {
    async fn read(&self, id: &i64) -> Result<Option<Conversation>, Error> {
        sqlx::query_as::<_, Conversation>(
            "SELECT conversation_id, user_low_id, user_high_id, created_at \
             FROM conversations WHERE conversation_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
    }
}
