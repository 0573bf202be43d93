use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::conversation::ConversationStore;
use crate::llm_client::LlmClient;
use crate::resume::{ResumeExtractor, SystemPromptCache};

/// Owns all shared chat state for the lifetime of the server.
/// Handlers reach it through `AppState`; nothing here is global.
pub struct SessionManager {
    pub(crate) resume_source: String,
    pub(crate) extractor: Arc<dyn ResumeExtractor>,
    pub(crate) prompt: SystemPromptCache,
    pub(crate) store: ConversationStore,
    pub(crate) llm: LlmClient,
    pub(crate) locks: ConversationLocks,
}

impl SessionManager {
    pub fn new(
        resume_source: impl Into<String>,
        extractor: Arc<dyn ResumeExtractor>,
        store: ConversationStore,
        llm: LlmClient,
    ) -> Self {
        Self {
            resume_source: resume_source.into(),
            extractor,
            prompt: SystemPromptCache::new(),
            store,
            llm,
            locks: ConversationLocks::default(),
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// Builds (or returns the cached) system prompt for `name`.
    pub async fn system_prompt(&self, name: &str) -> &str {
        self.prompt
            .get_or_build(name, &self.resume_source, self.extractor.as_ref())
            .await
    }
}

/// One async mutex per conversation id, so turns on the same conversation
/// run one at a time while different conversations proceed in parallel.
#[derive(Default)]
pub struct ConversationLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ConversationLocks {
    pub async fn acquire(&self, id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            // Only the table itself holds idle entries.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}
