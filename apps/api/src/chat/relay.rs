//! Chat Relay: one user turn against the upstream model.
//!
//! Flow: validate → resolve id → lock conversation → load history →
//!       capacity check → append user message → system prompt →
//!       upstream call → append assistant reply → return.
//!
//! A failed upstream call leaves the user message in the history with no
//! assistant reply after it. The widget keeps its conversation id, so the
//! next attempt continues the same conversation.

use tracing::{info, warn};
use uuid::Uuid;

use crate::chat::models::{ChatReply, ChatTurn};
use crate::chat::session::SessionManager;
use crate::conversation::Message;
use crate::errors::AppError;
use crate::llm_client::ModelConfig;

const MAX_CONVERSATION_ID_LEN: usize = 128;

/// A turn stores two messages: the user's and the assistant's.
const MESSAGES_PER_TURN: usize = 2;

impl SessionManager {
    pub async fn handle_message(&self, turn: ChatTurn) -> Result<ChatReply, AppError> {
        if turn.message.trim().is_empty() {
            return Err(AppError::EmptyInput);
        }
        let credential = turn.credential.ok_or(AppError::MissingCredential)?;

        let conversation_id = match turn.conversation_id {
            Some(id) => validate_conversation_id(id)?,
            None => Uuid::new_v4().to_string(),
        };

        let _turn_guard = self.locks.acquire(&conversation_id).await;

        let mut history = self.store.get(&conversation_id).await;
        let max_messages = self.store.limits().max_messages;
        if history.len() + MESSAGES_PER_TURN > max_messages {
            info!(
                "Conversation {conversation_id} is full ({} of {max_messages} messages)",
                history.len()
            );
            return Err(AppError::ConversationFull);
        }

        let user_message = Message::user(turn.message);
        self.store
            .append_to(&conversation_id, history.clone(), user_message.clone())
            .await?;
        history.push(user_message);

        let system_prompt = self.system_prompt(&turn.name).await;
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(system_prompt));
        messages.extend(history.iter().cloned());

        let model = ModelConfig {
            model: turn.model,
            endpoint: turn.endpoint,
            credential,
            temperature: turn.temperature,
        };
        let result = match self.llm.complete(&model, &messages).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Upstream call failed for conversation {conversation_id}: {e}");
                return Err(AppError::Upstream(e));
            }
        };

        // The conversation may have been evicted while the upstream call was
        // in flight; the held history re-seeds it.
        self.store
            .append_to(&conversation_id, history, Message::assistant(result.clone()))
            .await?;

        Ok(ChatReply {
            result,
            conversation_id,
        })
    }
}

/// Caller-supplied ids end up in file names, so only a safe alphabet is accepted.
pub fn validate_conversation_id(id: String) -> Result<String, AppError> {
    let valid = !id.is_empty()
        && id.len() <= MAX_CONVERSATION_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(id)
    } else {
        Err(AppError::InvalidConversationId(id))
    }
}
