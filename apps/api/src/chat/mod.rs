//! Visitor chat grounded in the owner's résumé.
//!
//! The chat endpoint never returns a bodyless failure: when every provider
//! is down the visitor still gets a human-readable `response` (with a 500
//! status and `fallback: true`) so the widget has something to render.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm::{ChatMessage, MessageRole};
use crate::models::conversation::ConversationMessageRow;
use crate::profile::prompts::{build_system_prompt, Attachment, PromptContext};
use crate::ratelimit::middleware::{client_ip, enforce};
use crate::state::AppState;

/// Served when no provider could produce a reply.
const CHAT_FALLBACK_RESPONSE: &str = "I'm having trouble reaching my AI backend right now. \
Please try again in a moment, or reach out through the contact form instead.";

/// Only this many recent turns are replayed into the prompt on a follow-up.
const HISTORY_REPLAY_LIMIT: i64 = 10;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub conversation_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    pub fallback: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryMessage {
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryResponse {
    pub conversation_id: Uuid,
    pub messages: Vec<ChatHistoryMessage>,
}

/// POST /api/v1/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Result<Response, AppError> {
    if req.message.trim().is_empty() {
        return Err(AppError::missing_fields(&["message"]));
    }
    let ip = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr));
    enforce(&state.limiters.ai, &ip).await?;

    let conversation_id = req.conversation_id.unwrap_or_else(Uuid::new_v4);
    let context = PromptContext::parse(req.context.as_deref().unwrap_or_default());

    let system = build_system_prompt(&state.profile, context, &req.attachments);
    let history = load_recent_messages(&state.db, conversation_id).await?;

    let mut messages = vec![ChatMessage::system(system)];
    messages.extend(replay_messages(&history));
    messages.push(ChatMessage::user(req.message.clone()));

    // the visitor's turn is stored before spending a provider call
    insert_message(&state.db, conversation_id, "user", &req.message).await?;

    match state.executor.execute(&messages, "chat", None).await {
        Ok(outcome) => {
            // the reply already exists; a failed insert degrades history,
            // not the response
            if let Err(e) =
                insert_message(&state.db, conversation_id, "assistant", &outcome.text).await
            {
                tracing::warn!(%conversation_id, error = %e, "failed to persist assistant turn");
            }
            Ok(Json(ChatResponse {
                response: outcome.text,
                conversation_id,
                provider: Some(outcome.provider),
                fallback: false,
            })
            .into_response())
        }
        Err(e) => {
            tracing::error!(
                %conversation_id,
                error = %e,
                "chat completion failed, serving fallback"
            );
            let body = ChatResponse {
                response: CHAT_FALLBACK_RESPONSE.to_string(),
                conversation_id,
                provider: None,
                fallback: true,
            };
            Ok((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response())
        }
    }
}

/// GET /api/v1/chat/history/:conversation_id
pub async fn handle_chat_history(
    State(state): State<AppState>,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<ChatHistoryResponse>, AppError> {
    let rows: Vec<ConversationMessageRow> = sqlx::query_as(
        "SELECT * FROM conversation_messages WHERE conversation_id = $1 ORDER BY created_at ASC",
    )
    .bind(conversation_id)
    .fetch_all(&state.db)
    .await?;

    if rows.is_empty() {
        return Err(AppError::NotFound(format!(
            "Conversation {conversation_id} not found"
        )));
    }

    Ok(Json(ChatHistoryResponse {
        conversation_id,
        messages: rows
            .into_iter()
            .map(|row| ChatHistoryMessage {
                role: row.role,
                content: row.content,
                timestamp: row.created_at,
            })
            .collect(),
    }))
}

/// The most recent turns in chronological order.
async fn load_recent_messages(
    pool: &PgPool,
    conversation_id: Uuid,
) -> Result<Vec<ConversationMessageRow>, AppError> {
    let mut rows: Vec<ConversationMessageRow> = sqlx::query_as(
        "SELECT * FROM conversation_messages
         WHERE conversation_id = $1
         ORDER BY created_at DESC
         LIMIT $2",
    )
    .bind(conversation_id)
    .bind(HISTORY_REPLAY_LIMIT)
    .fetch_all(pool)
    .await?;
    rows.reverse();
    Ok(rows)
}

async fn insert_message(
    pool: &PgPool,
    conversation_id: Uuid,
    role: &str,
    content: &str,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO conversation_messages (id, conversation_id, role, content) \
         VALUES ($1, $2, $3, $4)",
    )
    .bind(Uuid::new_v4())
    .bind(conversation_id)
    .bind(role)
    .bind(content)
    .execute(pool)
    .await?;
    Ok(())
}

/// Stored rows back into prompt messages. Unknown roles are dropped rather
/// than guessed.
fn replay_messages(rows: &[ConversationMessageRow]) -> Vec<ChatMessage> {
    rows.iter()
        .filter_map(|row| match row.role.as_str() {
            "user" => Some(ChatMessage::new(MessageRole::User, row.content.clone())),
            "assistant" => Some(ChatMessage::new(MessageRole::Assistant, row.content.clone())),
            _ => None,
        })
        .collect()
}
