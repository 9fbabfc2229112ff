// src/handlers/chat.rs

use std::sync::Arc;

use axum::{Extension, Json, extract::State, response::IntoResponse};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    ai::{self, AiClient},
    error::AppError,
    models::chat::{ChatMessage, ChatRequest, ChatResponse},
    utils::{html::clean_html, jwt::Claims},
};

const HISTORY_LIMIT: i64 = 100;

async fn insert_message(
    pool: &PgPool,
    user_id: i64,
    sender: &str,
    content: &str,
) -> Result<ChatMessage, AppError> {
    let message: ChatMessage = sqlx::query_as(
        r#"
        INSERT INTO chat_messages (user_id, sender, content)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, sender, content, created_at
        "#,
    )
    .bind(user_id)
    .bind(sender)
    .bind(content)
    .fetch_one(pool)
    .await?;

    Ok(message)
}

/// Last `limit` messages of the user, oldest first.
async fn recent_history(pool: &PgPool, user_id: i64, limit: i64) -> Result<Vec<ChatMessage>, AppError> {
    let mut messages: Vec<ChatMessage> = sqlx::query_as(
        r#"
        SELECT id, user_id, sender, content, created_at
        FROM chat_messages
        WHERE user_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    messages.reverse();
    Ok(messages)
}

/// Stores the user's message and asks the assistant for a reply.
///
/// If the assistant is unavailable the message is still stored and the
/// response says so instead of failing.
pub async fn send_message(
    State(pool): State<PgPool>,
    State(assistant): State<Arc<AiClient>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ChatRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    let user_id = claims.user_id()?;

    let content = clean_html(&payload.message);
    if content.trim().is_empty() {
        return Err(AppError::BadRequest("Message is empty".to_string()));
    }
    let message = insert_message(&pool, user_id, "user", &content).await?;

    let history = recent_history(&pool, user_id, ai::chat::CHAT_CONTEXT_MESSAGES as i64).await?;

    let reply = match ai::chat::reply(&assistant, &history).await {
        Ok(response) => {
            let text = clean_html(&response.value);
            Some(insert_message(&pool, user_id, "assistant", &text).await?)
        }
        Err(e) => {
            tracing::warn!(user_id, "Chat reply unavailable: {}", e);
            None
        }
    };

    Ok(Json(ChatResponse {
        message,
        ai_available: reply.is_some(),
        reply,
    }))
}

/// The caller's chat history, oldest first.
pub async fn get_history(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let messages = recent_history(&pool, claims.user_id()?, HISTORY_LIMIT).await?;
    Ok(Json(messages))
}
