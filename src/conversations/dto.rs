use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::chat::client::MessageRole;
use crate::chat::personas::Therapist;
use crate::journal::dto::NewEntryRequest;

use super::repo_types::{Conversation, Message};

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct CreateConversationRequest {
    pub title: String,
    pub therapist: Therapist,
    /// Optional starting history, used when promoting an anonymous chat.
    #[serde(default)]
    pub messages: Vec<NewMessage>,
}

#[derive(Debug, Deserialize)]
pub struct NewMessage {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateConversationRequest {
    pub title: Option<String>,
    pub is_favorite: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ConversationSummary {
    pub id: Uuid,
    pub title: String,
    pub therapist: String,
    pub is_favorite: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<Conversation> for ConversationSummary {
    fn from(c: Conversation) -> Self {
        Self {
            id: c.id,
            title: c.title,
            therapist: c.therapist,
            is_favorite: c.is_favorite,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConversationDetails {
    #[serde(flatten)]
    pub summary: ConversationSummary,
    pub messages: Vec<MessageView>,
}

#[derive(Debug, Serialize)]
pub struct MessageView {
    pub id: Uuid,
    pub role: String,
    pub content: String,
    pub created_at: OffsetDateTime,
}

impl From<Message> for MessageView {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            role: m.role,
            content: m.content,
            created_at: m.created_at,
        }
    }
}

/// One-shot upload of anonymous local-storage state after login.
#[derive(Debug, Deserialize)]
pub struct SyncRequest {
    #[serde(default)]
    pub conversations: Vec<SyncConversation>,
    #[serde(default)]
    pub journal: Vec<NewEntryRequest>,
}

#[derive(Debug, Deserialize)]
pub struct SyncConversation {
    pub title: String,
    pub therapist: Therapist,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub messages: Vec<NewMessage>,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub conversations: usize,
    pub messages: usize,
    pub journal_entries: usize,
}
