//! Durable mirror of the conversation store: one JSON record per conversation.
//!
//! Records are named `<YYYY-MM-DD>_<conversation id>.json`, dated by the first
//! write. The directory is scanned once when opened; after that every lookup
//! goes through an in-memory id → path index, so callers never need the date.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::conversation::models::Message;

/// On-disk shape of a conversation. Never contains the system message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRecord {
    pub conversation_id: String,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl ConversationRecord {
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}.json",
            self.created_at.format("%Y-%m-%d"),
            self.conversation_id
        )
    }
}

#[derive(Debug, Clone)]
struct IndexedRecord {
    path: PathBuf,
    /// Known once the record has been read or written by this process.
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct ConversationFiles {
    dir: PathBuf,
    index: Mutex<HashMap<String, IndexedRecord>>,
}

impl ConversationFiles {
    /// Creates the directory if needed and indexes the records already in it.
    pub fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let mut index: HashMap<String, IndexedRecord> = HashMap::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(id) = file_name.to_str().and_then(record_id) else {
                continue;
            };
            let path = entry.path();
            // Oldest date prefix wins if a record was ever duplicated.
            match index.get(id) {
                Some(existing) if existing.path <= path => {}
                _ => {
                    index.insert(
                        id.to_string(),
                        IndexedRecord {
                            path,
                            created_at: None,
                        },
                    );
                }
            }
        }

        info!(
            "Indexed {} conversation records in {}",
            index.len(),
            dir.display()
        );
        Ok(Self {
            dir,
            index: Mutex::new(index),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Loads the record for `id`. Unknown, unreadable and malformed records
    /// all come back as `None`.
    pub async fn load(&self, id: &str) -> Option<ConversationRecord> {
        let path = self.lookup(id)?.path;
        let record = read_record(&path, id).await?;
        debug!(
            "Loaded conversation {id} from {} ({} messages)",
            path.display(),
            record.messages.len()
        );
        self.remember(id, path, record.created_at);
        Some(record)
    }

    /// Writes `messages` as the record for `id`, keeping the file name and
    /// creation time of an existing record.
    pub async fn save(&self, id: &str, messages: &[Message]) -> io::Result<()> {
        let (path, created_at) = match self.lookup(id) {
            Some(IndexedRecord {
                path,
                created_at: Some(created_at),
            }) => (path, created_at),
            Some(IndexedRecord {
                path,
                created_at: None,
            }) => {
                let created_at = read_record(&path, id)
                    .await
                    .map(|record| record.created_at)
                    .unwrap_or_else(Utc::now);
                (path, created_at)
            }
            None => {
                let created_at = Utc::now();
                let file_name = ConversationRecord {
                    conversation_id: id.to_string(),
                    created_at,
                    messages: Vec::new(),
                }
                .file_name();
                (self.dir.join(file_name), created_at)
            }
        };

        let record = ConversationRecord {
            conversation_id: id.to_string(),
            created_at,
            messages: messages.to_vec(),
        };
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(&record)?;

        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;

        self.remember(id, path, created_at);
        Ok(())
    }

    fn lookup(&self, id: &str) -> Option<IndexedRecord> {
        self.index
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    fn remember(&self, id: &str, path: PathBuf, created_at: DateTime<Utc>) {
        self.index
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id.to_string(),
                IndexedRecord {
                    path,
                    created_at: Some(created_at),
                },
            );
    }
}

async fn read_record(path: &Path, id: &str) -> Option<ConversationRecord> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Failed to read conversation record {}: {e}", path.display());
            return None;
        }
    };

    match serde_json::from_slice::<ConversationRecord>(&raw) {
        Ok(record) if record.conversation_id == id => Some(record),
        Ok(record) => {
            warn!(
                "Conversation record {} belongs to {}, not {id}",
                path.display(),
                record.conversation_id
            );
            None
        }
        Err(e) => {
            warn!("Malformed conversation record {}: {e}", path.display());
            None
        }
    }
}

/// Extracts the conversation id from a `<date>_<id>.json` file name.
fn record_id(file_name: &str) -> Option<&str> {
    let stem = file_name.strip_suffix(".json")?;
    let (_date, id) = stem.split_once('_')?;
    Some(id)
}
