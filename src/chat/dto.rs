use serde::{Deserialize, Serialize};

use super::client::{ChatMessage, MessageRole};
use super::personas::Therapist;

/// Stateless completion request: the client sends its mirrored history,
/// the server only adds the persona's system prompt.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub therapist: Therapist,
    pub messages: Vec<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub role: MessageRole,
    pub content: String,
}

impl From<IncomingMessage> for ChatMessage {
    fn from(m: IncomingMessage) -> Self {
        ChatMessage::new(m.role, m.content)
    }
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// Catalogue entry for the persona picker.
#[derive(Debug, Serialize)]
pub struct TherapistInfo {
    pub id: Therapist,
    pub name: &'static str,
    pub specialty: &'static str,
}

impl From<Therapist> for TherapistInfo {
    fn from(t: Therapist) -> Self {
        Self {
            id: t,
            name: t.display_name(),
            specialty: t.specialty(),
        }
    }
}
