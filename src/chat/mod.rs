//! Chat service and conversation state management.

pub mod manager;
pub mod types;

pub use manager::{
    ConversationManager, FALLBACK_REPLY, NEW_CONVERSATION_TITLE, PendingExchange, SubmitError,
};
pub use types::{
    ChatRequest, ChatResponse, Conversation, IndexListResponse, Message, MessageRole,
    TITLE_MAX_CHARS, derive_title,
};

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::api::ApiClient;
use crate::error::ClientError;

/// The two backend calls the conversation manager depends on.
///
/// Kept as a trait so the state machine can be exercised without a
/// network; [`ChatService`] is the real implementation.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send a user message and return the assistant's reply text.
    ///
    /// # Errors
    /// Returns an error if the request fails or the session expired.
    async fn send_message(
        &self,
        query: &str,
        bot_id: &str,
        index_name: &str,
    ) -> Result<String, ClientError>;

    /// List the available knowledge-base index names.
    ///
    /// # Errors
    /// Returns an error if the request fails or the session expired.
    async fn list_indexes(&self) -> Result<Vec<String>, ClientError>;
}

/// Chat service talking to the real backend through the shared client.
pub struct ChatService {
    api: Arc<ApiClient>,
}

impl ChatService {
    /// Create a chat service over the shared client.
    #[must_use]
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ChatBackend for ChatService {
    async fn send_message(
        &self,
        query: &str,
        bot_id: &str,
        index_name: &str,
    ) -> Result<String, ClientError> {
        let request = ChatRequest {
            query: query.to_string(),
            bot_id: bot_id.to_string(),
            index_name: index_name.to_string(),
        };
        let response: ChatResponse = self.api.post_json("chatbot-agent", &request).await?;
        debug!(
            bot_id = %response.bot_id,
            succeeded = response.succeeded,
            "Chat reply received"
        );
        Ok(response.response)
    }

    async fn list_indexes(&self) -> Result<Vec<String>, ClientError> {
        let response: IndexListResponse = self.api.get_json("all_indexes").await?;
        debug!("Backend lists {} indexes", response.data.len());
        Ok(response.data)
    }
}
