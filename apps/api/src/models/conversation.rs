use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A single chat turn. Append-only; never reordered.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConversationMessageRow {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
