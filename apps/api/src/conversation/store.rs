//! Conversation Store: bounded, insertion-ordered map of conversation histories.
//!
//! Two limits apply:
//! - a conversation never grows past `max_messages`; the append that would
//!   exceed it is rejected, nothing is truncated;
//! - once more than `max_conversations` are tracked, the earliest-inserted one
//!   is dropped from memory (insertion order, not access order).
//!
//! With a [`ConversationFiles`] mirror attached, every append is written
//! through to disk and evicted conversations are reloaded on next use. Disk
//! reads and writes happen outside the state lock, so a slow write never
//! stalls other conversations. Appends to one id must be serialized by the
//! caller, or their records may be written out of order.

use std::collections::{HashMap, VecDeque};

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::conversation::models::Message;
use crate::conversation::persistence::ConversationFiles;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Conversation {id} already holds {len} messages (limit {max})")]
    ConversationFull { id: String, len: usize, max: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLimits {
    pub max_messages: usize,
    pub max_conversations: usize,
}

#[derive(Debug, Default)]
struct StoreState {
    conversations: HashMap<String, Vec<Message>>,
    /// Keys in the order they were first tracked. Front is evicted first.
    insertion_order: VecDeque<String>,
}

impl StoreState {
    /// Drops the earliest-inserted conversation if more than the ceiling are tracked.
    fn evict_if_over_capacity(&mut self, max_conversations: usize) -> Option<String> {
        if self.conversations.len() <= max_conversations {
            return None;
        }
        let oldest = self.insertion_order.pop_front()?;
        self.conversations.remove(&oldest);
        Some(oldest)
    }
}

pub struct ConversationStore {
    limits: StoreLimits,
    state: Mutex<StoreState>,
    files: Option<ConversationFiles>,
}

impl ConversationStore {
    /// Purely in-memory store; contents are lost on restart.
    pub fn in_memory(limits: StoreLimits) -> Self {
        Self {
            limits,
            state: Mutex::new(StoreState::default()),
            files: None,
        }
    }

    /// Store mirrored to one JSON record per conversation.
    pub fn with_files(limits: StoreLimits, files: ConversationFiles) -> Self {
        Self {
            files: Some(files),
            ..Self::in_memory(limits)
        }
    }

    pub fn limits(&self) -> StoreLimits {
        self.limits
    }

    /// Returns the ordered history for `id`, or an empty history if unknown.
    /// Falls back to the persisted record when nothing is held in memory.
    pub async fn get(&self, id: &str) -> Vec<Message> {
        if let Some(messages) = self.state.lock().await.conversations.get(id) {
            return messages.clone();
        }

        match &self.files {
            Some(files) => files
                .load(id)
                .await
                .map(|record| record.messages)
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Appends `message`, creating the conversation if absent.
    /// Returns the new history length. Evicts at most one conversation afterwards.
    pub async fn append(&self, id: &str, message: Message) -> Result<usize, StoreError> {
        let prior = self.get(id).await;
        self.append_to(id, prior, message).await
    }

    /// Appends `message` to the tracked history of `id`. When `id` is not
    /// tracked (never seen, or evicted since the caller read it), the
    /// conversation is re-seeded from `prior` first.
    pub async fn append_to(
        &self,
        id: &str,
        prior: Vec<Message>,
        message: Message,
    ) -> Result<usize, StoreError> {
        let (len, snapshot) = {
            let mut state = self.state.lock().await;

            let tracked_len = state.conversations.get(id).map(Vec::len);
            let len = tracked_len.unwrap_or(prior.len());
            if len >= self.limits.max_messages {
                return Err(StoreError::ConversationFull {
                    id: id.to_string(),
                    len,
                    max: self.limits.max_messages,
                });
            }

            if tracked_len.is_none() {
                state.conversations.insert(id.to_string(), prior);
                state.insertion_order.push_back(id.to_string());
            }
            let messages = state.conversations.entry(id.to_string()).or_default();
            messages.push(message);
            let len = messages.len();
            let snapshot = self.files.as_ref().map(|_| messages.clone());
            debug!("Conversation {id} now holds {len} messages");

            if let Some(evicted) = state.evict_if_over_capacity(self.limits.max_conversations) {
                info!(
                    "Evicted conversation {evicted} (over {} tracked)",
                    self.limits.max_conversations
                );
            }
            (len, snapshot)
        };

        if let (Some(files), Some(messages)) = (&self.files, snapshot) {
            if let Err(e) = files.save(id, &messages).await {
                warn!(
                    "Failed to persist conversation {id} to {}: {e}",
                    files.dir().display()
                );
            }
        }

        Ok(len)
    }
}

#[cfg(test)]
impl ConversationStore {
    /// Number of conversations currently held in memory.
    pub async fn tracked(&self) -> usize {
        self.state.lock().await.conversations.len()
    }

    pub async fn is_tracked(&self, id: &str) -> bool {
        self.state.lock().await.conversations.contains_key(id)
    }
}
