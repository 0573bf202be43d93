pub mod models;
pub mod persistence;
pub mod store;

pub use models::Message;
pub use persistence::ConversationFiles;
pub use store::{ConversationStore, StoreError, StoreLimits};
