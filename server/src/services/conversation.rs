//! Conversation services - one-to-one messaging between users

use crate::core::{AppError, AppState};
use crate::dtos::{ConversationDTO, MessagesQuery, SendMessageDTO, StartConversationDTO};
use crate::entities::{Conversation, Message, User};
use crate::repositories::Read;
use axum::{
    Extension,
    extract::{Json, Query, State},
    http::StatusCode,
};
use axum_macros::debug_handler;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

#[debug_handler]
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, participant_id = %body.participant_id))]
pub async fn start_conversation(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<StartConversationDTO>,
) -> Result<(StatusCode, Json<ConversationDTO>), AppError> {
    if body.participant_id == current_user.user_id {
        warn!("User tried to open a conversation with themselves");
        return Err(AppError::bad_request("You cannot start a conversation with yourself"));
    }

    let participant = state
        .user
        .read(&body.participant_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let (conversation, created) = state
        .conversation
        .find_or_create(current_user.user_id, participant.user_id)
        .await?;

    let last_message = if created {
        None
    } else {
        state
            .conversation
            .find_messages(conversation.conversation_id, None, 1)
            .await?
            .into_iter()
            .next()
    };

    let status = if created { StatusCode::CREATED } else { StatusCode::OK };
    info!("Conversation {} ready (created: {})", conversation.conversation_id, created);
    Ok((
        status,
        Json(ConversationDTO {
            conversation_id: conversation.conversation_id,
            participant_id: participant.user_id,
            participant_name: participant.name,
            created_at: conversation.created_at,
            last_message,
        }),
    ))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_conversations(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<ConversationDTO>>, AppError> {
    let rows = state.conversation.find_inbox(current_user.user_id).await?;
    debug!("User has {} conversations", rows.len());

    let conversations = rows
        .into_iter()
        .map(|row| ConversationDTO {
            last_message: row.last_message(),
            conversation_id: row.conversation_id,
            participant_id: row.participant_id,
            participant_name: row.participant_name,
            created_at: row.created_at,
        })
        .collect();
    Ok(Json(conversations))
}

#[instrument(skip(state, conversation), fields(conversation_id = %conversation.conversation_id))]
pub async fn get_messages(
    State(state): State<Arc<AppState>>,
    Extension(conversation): Extension<Conversation>, // inserted by conversation_participant_middleware
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<Message>>, AppError> {
    let messages = state
        .conversation
        .find_messages(conversation.conversation_id, query.before_id, query.limit())
        .await?;
    Ok(Json(messages))
}

#[instrument(skip(state, current_user, conversation, body), fields(user_id = %current_user.user_id, conversation_id = %conversation.conversation_id))]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Extension(conversation): Extension<Conversation>,
    Json(body): Json<SendMessageDTO>,
) -> Result<(StatusCode, Json<Message>), AppError> {
    body.validate()?;
    if body.content.trim().is_empty() {
        return Err(AppError::bad_request("Message cannot be empty"));
    }

    let message = state
        .conversation
        .add_message(conversation.conversation_id, current_user.user_id, &body.content)
        .await?;
    info!("Message {} sent", message.message_id);
    Ok((StatusCode::CREATED, Json(message)))
}
