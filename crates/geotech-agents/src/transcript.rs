//! Chat transcript persistence.
//!
//! The file store keeps the whole transcript in memory and rewrites the JSON
//! array on every change. Writes are serialized within one process only; two
//! processes sharing a file will overwrite each other.
//!
//! Files written by the dashboard are read as-is: their timestamps are free
//! text and may be missing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Who said it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person asking
    User,
    /// The model
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        })
    }
}

/// When a message was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    /// An RFC 3339 instant, as written by this store.
    At(DateTime<Utc>),
    /// Any other text, kept verbatim.
    Text(String),
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At(at) => write!(f, "{}", at.format("%Y-%m-%d %H:%M:%S UTC")),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// One chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// Speaker
    pub role: Role,
    /// Message text
    pub content: String,
    /// When the message was recorded, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

impl TranscriptEntry {
    /// A user message stamped now.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// An assistant message stamped now.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Some(Timestamp::At(Utc::now())),
        }
    }
}

/// Render entries as `Role: content` lines for the chat prompt.
pub fn render_history(entries: &[TranscriptEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("{}: {}", e.role, e.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Transcript storage errors.
#[derive(Debug, Error)]
pub enum TranscriptError {
    /// Reading or writing the backing file failed.
    #[error("Transcript I/O error on {path}: {source}")]
    Io {
        /// Backing file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The transcript could not be encoded.
    #[error("Transcript encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Where chat turns are kept between requests.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// All entries, oldest first.
    async fn load(&self) -> Result<Vec<TranscriptEntry>, TranscriptError>;

    /// Append entries in order.
    async fn append(&self, entries: &[TranscriptEntry]) -> Result<(), TranscriptError>;

    /// Remove every entry.
    async fn clear(&self) -> Result<(), TranscriptError>;
}

/// In-process transcript, lost on restart.
#[derive(Debug, Default)]
pub struct MemoryTranscriptStore {
    entries: Mutex<Vec<TranscriptEntry>>,
}

impl MemoryTranscriptStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TranscriptStore for MemoryTranscriptStore {
    async fn load(&self) -> Result<Vec<TranscriptEntry>, TranscriptError> {
        Ok(self.entries.lock().await.clone())
    }

    async fn append(&self, entries: &[TranscriptEntry]) -> Result<(), TranscriptError> {
        self.entries.lock().await.extend_from_slice(entries);
        Ok(())
    }

    async fn clear(&self) -> Result<(), TranscriptError> {
        self.entries.lock().await.clear();
        Ok(())
    }
}

/// Transcript stored as a JSON array in one file.
#[derive(Debug)]
pub struct JsonFileTranscriptStore {
    path: PathBuf,
    entries: Mutex<Vec<TranscriptEntry>>,
}

impl JsonFileTranscriptStore {
    /// Open `path`, loading any existing transcript.
    ///
    /// A missing file starts an empty transcript. A file that does not decode
    /// is moved aside to `<path>.bak` and the transcript starts empty; if the
    /// move fails, opening fails.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, TranscriptError> {
        let path = path.into();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<Vec<TranscriptEntry>>(&bytes) {
                Ok(entries) => entries,
                Err(e) => {
                    let backup = backup_path(&path);
                    tokio::fs::rename(&path, &backup)
                        .await
                        .map_err(|source| TranscriptError::Io {
                            path: path.clone(),
                            source,
                        })?;
                    warn!(
                        path = %path.display(),
                        backup = %backup.display(),
                        error = %e,
                        "Unreadable transcript moved aside"
                    );
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => return Err(TranscriptError::Io { path, source }),
        };

        debug!(path = %path.display(), entries = entries.len(), "Transcript loaded");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write(&self, entries: &[TranscriptEntry]) -> Result<(), TranscriptError> {
        let json = serde_json::to_vec_pretty(entries)?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|source| TranscriptError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

#[async_trait]
impl TranscriptStore for JsonFileTranscriptStore {
    async fn load(&self) -> Result<Vec<TranscriptEntry>, TranscriptError> {
        Ok(self.entries.lock().await.clone())
    }

    async fn append(&self, new_entries: &[TranscriptEntry]) -> Result<(), TranscriptError> {
        let mut entries = self.entries.lock().await;
        let mut updated = entries.clone();
        updated.extend_from_slice(new_entries);
        self.write(&updated).await?;
        *entries = updated;
        Ok(())
    }

    async fn clear(&self) -> Result<(), TranscriptError> {
        let mut entries = self.entries.lock().await;
        self.write(&[]).await?;
        entries.clear();
        Ok(())
    }
}
