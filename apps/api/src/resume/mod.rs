pub mod extractor;
pub mod prompts;
pub mod system_prompt;

pub use extractor::{PdfResumeExtractor, ResumeExtractor};
pub use system_prompt::SystemPromptCache;
