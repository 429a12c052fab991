//! Conversation state machine.
//!
//! The manager owns the conversation list, the active pointer and the
//! loading flag. A submit is an explicit two-phase transition: an
//! optimistic local phase ([`ConversationManager::begin_submit`]) and a
//! resolution phase ([`ConversationManager::finish_submit`]), with at
//! most one exchange pending between them.

use rand::Rng;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::error::ClientError;

use super::ChatBackend;
use super::types::{Conversation, Message, MessageRole, derive_title};

/// Assistant reply shown inline when the backend call fails.
pub const FALLBACK_REPLY: &str =
    "Sorry, something went wrong while answering. Please try again.";

/// Placeholder title for a conversation created before its first message.
pub const NEW_CONVERSATION_TITLE: &str = "New conversation";

/// Reasons a submit is rejected before anything is sent.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum SubmitError {
    /// Input was empty or whitespace-only.
    #[error("cannot send an empty message")]
    EmptyInput,
    /// A previous exchange is still in flight.
    #[error("a request is already in flight")]
    Busy,
}

/// A submit whose optimistic phase completed and whose backend call is
/// still outstanding.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PendingExchange {
    /// Conversation the exchange belongs to.
    pub conversation_id: String,
    /// The user's message text.
    pub query: String,
    /// Freshly generated numeric backend session identifier.
    pub bot_id: String,
    /// Knowledge-base index scoping the request.
    pub index_name: String,
}

/// Holds the conversation list and drives the submit state machine.
#[derive(Default)]
pub struct ConversationManager {
    conversations: Vec<Conversation>,
    active_id: Option<String>,
    loading: bool,
    selected_index: Option<String>,
}

impl ConversationManager {
    /// Create an empty manager with no active conversation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All conversations, most recent first.
    #[must_use]
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Identifier of the active conversation, if any.
    #[must_use]
    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    /// The active conversation, if any.
    #[must_use]
    pub fn active_conversation(&self) -> Option<&Conversation> {
        let id = self.active_id.as_deref()?;
        self.conversations.iter().find(|c| c.id == id)
    }

    /// Whether an exchange is currently in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Currently selected knowledge-base index, if any.
    #[must_use]
    pub fn selected_index(&self) -> Option<&str> {
        self.selected_index.as_deref()
    }

    /// Select the knowledge-base index scoping subsequent requests.
    pub fn select_index(&mut self, name: impl Into<String>) {
        self.selected_index = Some(name.into());
    }

    /// Explicit "new chat": prepend an empty conversation with a
    /// placeholder title and make it active. Returns its identifier.
    pub fn new_conversation(&mut self) -> String {
        let conversation = Conversation::new(NEW_CONVERSATION_TITLE);
        let id = conversation.id.clone();
        self.conversations.insert(0, conversation);
        self.active_id = Some(id.clone());
        info!("Created new conversation {id}");
        id
    }

    /// Make the conversation with the given id active. Returns false if
    /// no such conversation exists.
    pub fn select(&mut self, id: &str) -> bool {
        if self.position_of(id).is_some() {
            self.active_id = Some(id.to_string());
            debug!("Switched to conversation {id}");
            true
        } else {
            false
        }
    }

    /// Remove the conversation with the given id. When it was the
    /// active one the active pointer is cleared; no other conversation
    /// is auto-selected.
    pub fn delete(&mut self, id: &str) {
        self.conversations.retain(|c| c.id != id);
        if self.active_id.as_deref() == Some(id) {
            self.active_id = None;
        }
        info!("Deleted conversation {id}");
    }

    /// Optimistic phase of a submit.
    ///
    /// Rejects empty input and concurrent submits, creates a
    /// conversation when none is active, appends the user message (and
    /// derives the title when it is the first message), then enters the
    /// loading state and returns the exchange to resolve.
    ///
    /// # Errors
    /// [`SubmitError::EmptyInput`] for whitespace-only input,
    /// [`SubmitError::Busy`] while a prior exchange is outstanding.
    pub fn begin_submit(&mut self, input: &str) -> Result<PendingExchange, SubmitError> {
        if input.trim().is_empty() {
            return Err(SubmitError::EmptyInput);
        }
        if self.loading {
            return Err(SubmitError::Busy);
        }

        let conversation_id = match self.active_id.clone() {
            Some(id) if self.position_of(&id).is_some() => id,
            _ => {
                let conversation = Conversation::new(derive_title(input));
                let id = conversation.id.clone();
                self.conversations.insert(0, conversation);
                self.active_id = Some(id.clone());
                id
            }
        };

        if let Some(position) = self.position_of(&conversation_id) {
            if let Some(conversation) = self.conversations.get_mut(position) {
                if conversation.messages.is_empty() {
                    conversation.title = derive_title(input);
                }
                conversation.push(Message::new(MessageRole::User, input));
            }
        }

        self.loading = true;
        Ok(PendingExchange {
            conversation_id,
            query: input.to_string(),
            bot_id: generate_bot_id(),
            index_name: self.selected_index.clone().unwrap_or_default(),
        })
    }

    /// Resolution phase of a submit: append the assistant reply, or the
    /// fixed apology when the call failed, and leave the loading state.
    pub fn finish_submit(
        &mut self,
        pending: &PendingExchange,
        outcome: Result<String, ClientError>,
    ) {
        let reply = match outcome {
            Ok(text) => text,
            Err(e) => {
                warn!("Chat request failed: {e}");
                FALLBACK_REPLY.to_string()
            }
        };

        if let Some(position) = self.position_of(&pending.conversation_id) {
            if let Some(conversation) = self.conversations.get_mut(position) {
                conversation.push(Message::new(MessageRole::Assistant, reply));
            }
        }
        self.loading = false;
    }

    /// Run both submit phases around one backend call.
    ///
    /// # Errors
    /// Propagates the guard errors of [`ConversationManager::begin_submit`].
    /// Backend failures do not error; they surface as the inline apology
    /// message.
    pub async fn submit(
        &mut self,
        input: &str,
        backend: &dyn ChatBackend,
    ) -> Result<(), SubmitError> {
        let pending = self.begin_submit(input)?;
        let outcome = backend
            .send_message(&pending.query, &pending.bot_id, &pending.index_name)
            .await;
        self.finish_submit(&pending, outcome);
        Ok(())
    }

    fn position_of(&self, id: &str) -> Option<usize> {
        self.conversations.iter().position(|c| c.id == id)
    }
}

/// Fresh numeric identifier for the backend session. Generated per
/// request, not per conversation (observed backend contract).
fn generate_bot_id() -> String {
    rand::thread_rng().gen_range(100_000_000..1_000_000_000_u64).to_string()
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    /// Backend double returning a canned reply, or failing when `reply`
    /// is `None`.
    struct FixedBackend {
        reply: Option<String>,
    }

    impl FixedBackend {
        fn answering(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
            }
        }

        const fn failing() -> Self {
            Self { reply: None }
        }
    }

    #[async_trait]
    impl ChatBackend for FixedBackend {
        async fn send_message(
            &self,
            _query: &str,
            _bot_id: &str,
            _index_name: &str,
        ) -> Result<String, ClientError> {
            self.reply
                .clone()
                .ok_or_else(|| ClientError::Api("backend unavailable".to_string()))
        }

        async fn list_indexes(&self) -> Result<Vec<String>, ClientError> {
            Ok(vec!["default".to_string()])
        }
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let mut manager = ConversationManager::new();
        assert_eq!(manager.begin_submit(""), Err(SubmitError::EmptyInput));
        assert_eq!(manager.begin_submit("   \n"), Err(SubmitError::EmptyInput));
        assert!(manager.conversations().is_empty());
        assert!(!manager.is_loading());
    }

    #[test]
    fn test_optimistic_update_before_resolution() {
        let mut manager = ConversationManager::new();
        let pending = manager.begin_submit("Hello");
        assert!(pending.is_ok());

        // The user message is visible before any resolution happens.
        let conversation = manager.active_conversation();
        assert!(conversation.is_some_and(|c| {
            c.title == "Hello"
                && c.messages.len() == 1
                && c.messages[0].role == MessageRole::User
                && c.messages[0].content == "Hello"
        }));
        assert!(manager.is_loading());
    }

    #[test]
    fn test_submit_while_in_flight_is_rejected() {
        let mut manager = ConversationManager::new();
        let first = manager.begin_submit("Hello");
        assert!(first.is_ok());

        assert_eq!(manager.begin_submit("Again"), Err(SubmitError::Busy));

        // No duplicate user messages were appended.
        let count = manager.active_conversation().map_or(0, |c| c.messages.len());
        assert_eq!(count, 1);
    }

    #[test]
    fn test_finish_submit_appends_reply_and_clears_loading() {
        let mut manager = ConversationManager::new();
        let Ok(pending) = manager.begin_submit("Hello") else {
            unreachable!("idle manager accepts non-empty input");
        };

        manager.finish_submit(&pending, Ok("Hi, how can I help?".to_string()));

        let conversation = manager.active_conversation();
        assert!(conversation.is_some_and(|c| {
            c.messages.len() == 2
                && c.messages[0].role == MessageRole::User
                && c.messages[1].role == MessageRole::Assistant
                && c.messages[1].content == "Hi, how can I help?"
        }));
        assert!(!manager.is_loading());
    }

    #[test]
    fn test_failed_exchange_appends_apology() {
        let mut manager = ConversationManager::new();
        let Ok(pending) = manager.begin_submit("Hello") else {
            unreachable!("idle manager accepts non-empty input");
        };

        manager.finish_submit(&pending, Err(ClientError::Api("boom".to_string())));

        let conversation = manager.active_conversation();
        assert!(conversation.is_some_and(|c| {
            c.messages.len() == 2
                && c.messages[1].role == MessageRole::Assistant
                && c.messages[1].content == FALLBACK_REPLY
        }));
        assert!(!manager.is_loading());
    }

    #[tokio::test]
    async fn test_submit_round_trip() {
        let mut manager = ConversationManager::new();
        manager.select_index("handbook");

        let backend = FixedBackend::answering("The handbook says yes.");
        let submitted = manager.submit("Hello", &backend).await;
        assert!(submitted.is_ok());

        let conversation = manager.active_conversation();
        assert!(conversation.is_some_and(|c| {
            c.title == "Hello"
                && c.messages.len() == 2
                && c.messages[0].content == "Hello"
                && c.messages[1].content == "The handbook says yes."
        }));
        assert!(!manager.is_loading());
    }

    #[tokio::test]
    async fn test_submit_failure_round_trip() {
        let mut manager = ConversationManager::new();
        let backend = FixedBackend::failing();

        let submitted = manager.submit("Hello", &backend).await;
        assert!(submitted.is_ok());

        let contents: Vec<&str> = manager
            .active_conversation()
            .map(|c| c.messages.iter().map(|m| m.content.as_str()).collect())
            .unwrap_or_default();
        assert_eq!(contents, vec!["Hello", FALLBACK_REPLY]);
        assert!(!manager.is_loading());
    }

    #[test]
    fn test_new_conversations_are_prepended() {
        let mut manager = ConversationManager::new();
        let Ok(pending) = manager.begin_submit("First topic") else {
            unreachable!("idle manager accepts non-empty input");
        };
        manager.finish_submit(&pending, Ok("reply".to_string()));

        let second = manager.new_conversation();
        assert_eq!(manager.active_id(), Some(second.as_str()));
        assert_eq!(manager.conversations()[0].id, second);
        assert_eq!(manager.conversations()[1].title, "First topic");
    }

    #[test]
    fn test_first_message_retitles_placeholder_conversation() {
        let mut manager = ConversationManager::new();
        let id = manager.new_conversation();
        assert_eq!(manager.conversations()[0].title, NEW_CONVERSATION_TITLE);

        let pending = manager.begin_submit("Tell me about indexes");
        assert!(pending.is_ok_and(|p| p.conversation_id == id));
        assert_eq!(manager.conversations()[0].title, "Tell me about indexes");
    }

    #[test]
    fn test_delete_active_clears_selection() {
        let mut manager = ConversationManager::new();
        let id = manager.new_conversation();

        manager.delete(&id);

        assert!(manager.conversations().is_empty());
        assert!(manager.active_id().is_none());
        assert!(manager.active_conversation().is_none());
    }

    #[test]
    fn test_delete_non_active_keeps_selection() {
        let mut manager = ConversationManager::new();
        let first = manager.new_conversation();
        let second = manager.new_conversation();

        manager.delete(&first);

        assert_eq!(manager.active_id(), Some(second.as_str()));
        assert_eq!(manager.conversations().len(), 1);
    }

    #[test]
    fn test_pending_exchange_carries_selected_index_and_numeric_bot_id() {
        let mut manager = ConversationManager::new();
        manager.select_index("handbook");

        let Ok(pending) = manager.begin_submit("Hello") else {
            unreachable!("idle manager accepts non-empty input");
        };
        assert_eq!(pending.index_name, "handbook");
        assert!(pending.bot_id.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(pending.query, "Hello");
    }

    #[test]
    fn test_bot_id_is_fresh_per_request() {
        let mut manager = ConversationManager::new();
        let Ok(first) = manager.begin_submit("one") else {
            unreachable!("idle manager accepts non-empty input");
        };
        manager.finish_submit(&first, Ok("ok".to_string()));
        let Ok(second) = manager.begin_submit("two") else {
            unreachable!("manager is idle again after finish_submit");
        };
        // Nine-digit random ids; a collision here is vanishingly rare.
        assert_ne!(first.bot_id, second.bot_id);
    }
}
