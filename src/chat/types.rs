//! Conversation model and chat wire types.

use serde::{Deserialize, Serialize};

/// Maximum number of characters a derived conversation title keeps.
pub const TITLE_MAX_CHARS: usize = 30;

/// Who authored a message.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// The human user.
    User,
    /// The AI assistant.
    Assistant,
}

/// A single message in a conversation. Immutable once created.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier.
    pub id: String,
    /// Author of the message.
    pub role: MessageRole,
    /// Text content.
    pub content: String,
    /// Creation timestamp in milliseconds since Unix epoch.
    pub timestamp: i64,
}

impl Message {
    /// Create a message stamped with the current time.
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// A titled, ordered thread of messages between user and assistant.
///
/// Messages are append-only and chronological; individual messages are
/// never edited or removed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique identifier.
    pub id: String,
    /// Display title, derived from the first message.
    pub title: String,
    /// Ordered message thread.
    pub messages: Vec<Message>,
    /// Creation timestamp in milliseconds since Unix epoch.
    pub created_at: i64,
}

impl Conversation {
    /// Create an empty conversation with the given title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            messages: Vec::new(),
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Append a message to the thread.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Last message in the thread, if any.
    #[must_use]
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Derive a display title from a message: the first
/// [`TITLE_MAX_CHARS`] characters, with `"..."` appended when truncated.
#[must_use]
pub fn derive_title(input: &str) -> String {
    let title: String = input.chars().take(TITLE_MAX_CHARS).collect();
    if input.chars().count() > TITLE_MAX_CHARS {
        format!("{title}...")
    } else {
        title
    }
}

/// Request body for `POST /chatbot-agent`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The user's message text.
    pub query: String,
    /// Backend session identifier, freshly generated per request.
    pub bot_id: String,
    /// Knowledge-base index scoping the answer.
    pub index_name: String,
}

/// Response body of `POST /chatbot-agent`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Whether the backend considers the exchange successful.
    pub succeeded: bool,
    /// The assistant's reply text.
    pub response: String,
    /// Echo of the backend session identifier.
    pub bot_id: String,
}

/// Response body of `GET /all_indexes`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexListResponse {
    /// Server status message.
    pub message: String,
    /// Available knowledge-base index names.
    pub data: Vec<String>,
    /// Whether the listing succeeded.
    pub succeeded: bool,
}
