use tokio::sync::OnceCell;
use tracing::info;

use crate::resume::extractor::{extract_or_empty, ResumeExtractor};
use crate::resume::prompts::build_system_prompt;

/// Compute-once cache for the system prompt.
///
/// The first caller extracts the resume and builds the prompt; concurrent
/// first callers wait for that single computation. Later calls return the
/// stored string regardless of their arguments, so a changed resume is only
/// picked up after a restart.
#[derive(Default)]
pub struct SystemPromptCache {
    cell: OnceCell<String>,
}

impl SystemPromptCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Never fails: an unreadable resume yields a prompt with empty resume text.
    pub async fn get_or_build(
        &self,
        name: &str,
        resume_source: &str,
        extractor: &dyn ResumeExtractor,
    ) -> &str {
        self.cell
            .get_or_init(|| async {
                let resume_text = extract_or_empty(extractor, resume_source).await;
                info!(
                    "Built system prompt for {name} ({} chars of resume text)",
                    resume_text.len()
                );
                build_system_prompt(name, &resume_text)
            })
            .await
    }
}

#[cfg(test)]
impl SystemPromptCache {
    pub fn is_built(&self) -> bool {
        self.cell.initialized()
    }
}
