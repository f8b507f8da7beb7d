//! Publishing: upload the deck and record it against its owner.
//!
//! Two collaborator traits, each with an HTTP/on-disk implementation and an
//! in-process one:
//!
//! | Trait                 | Implementations                        |
//! |-----------------------|----------------------------------------|
//! | [`DeckStorage`]       | [`HttpStorage`], [`LocalDirStorage`]   |
//! | [`PresentationStore`] | [`JsonFileStore`], [`MemoryStore`]     |

use crate::error::{BackendError, Yt2PptxError};
use crate::output::PresentationRecord;
use crate::pipeline::deck::GeneratedDeck;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// MIME type of a `.pptx` file.
pub const PRESENTATION_MIME: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// Storage service that makes a deck downloadable.
#[async_trait]
pub trait DeckStorage: Send + Sync {
    /// Upload `bytes`; `Ok(None)` when the service accepted the file but
    /// returned no access URL.
    async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime: &str,
    ) -> Result<Option<String>, BackendError>;
}

/// Datastore of owners and their presentations.
#[async_trait]
pub trait PresentationStore: Send + Sync {
    async fn user_exists(&self, owner_id: &str) -> Result<bool, BackendError>;

    /// Insert one record. Not idempotent.
    async fn insert_presentation(&self, record: &PresentationRecord) -> Result<(), BackendError>;
}

// ── Storage implementations ───────────────────────────────────────────────

/// Multipart upload to an HTTP endpoint.
///
/// The endpoint answers with JSON carrying the access URL either at `url` or
/// at `data.url`; a list response uses its first element.
pub struct HttpStorage {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpStorage {
    pub fn new(
        endpoint: impl Into<String>,
        token: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token: token.filter(|t| !t.is_empty()),
        })
    }
}

#[async_trait]
impl DeckStorage for HttpStorage {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime: &str,
    ) -> Result<Option<String>, BackendError> {
        let size = bytes.len();
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)?;
        let form = reqwest::multipart::Form::new().part("files", part);

        let mut req = self.client.post(&self.endpoint).multipart(form);
        if let Some(ref token) = self.token {
            req = req.bearer_auth(token);
        }

        let response = req.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        debug!("Uploaded {} ({} bytes)", file_name, size);
        Ok(url_from_response(&body))
    }
}

/// Find the access URL in an upload response.
pub fn url_from_response(body: &Value) -> Option<String> {
    let body = match body {
        Value::Array(items) => items.first()?,
        other => other,
    };
    body.get("url")
        .or_else(|| body.get("data").and_then(|d| d.get("url")))
        .and_then(Value::as_str)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
}

/// Copies decks into a local directory and hands back `file://` URLs.
pub struct LocalDirStorage {
    dir: PathBuf,
}

impl LocalDirStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl DeckStorage for LocalDirStorage {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        _mime: &str,
    ) -> Result<Option<String>, BackendError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let target = self.dir.join(file_name);
        tokio::fs::write(&target, &bytes).await?;
        let target = tokio::fs::canonicalize(&target).await?;
        Ok(Some(format!("file://{}", target.display())))
    }
}

// ── Store implementations ─────────────────────────────────────────────────

const USERS_FILE: &str = "users.json";
const RECORDS_FILE: &str = "presentations.jsonl";

/// File-backed store: a JSON array of owner ids plus a JSON-lines log of
/// presentation records.
pub struct JsonFileStore {
    dir: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn read_users(&self) -> Result<Vec<String>, BackendError> {
        match tokio::fs::read(self.dir.join(USERS_FILE)).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Register `owner_id` if it is not already known.
    pub async fn ensure_user(&self, owner_id: &str) -> Result<(), BackendError> {
        let _guard = self.write_lock.lock().await;
        let mut users = self.read_users().await?;
        if users.iter().any(|u| u == owner_id) {
            return Ok(());
        }
        users.push(owner_id.to_string());
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(USERS_FILE), serde_json::to_vec_pretty(&users)?).await?;
        info!("Registered owner {}", owner_id);
        Ok(())
    }

    /// All records, oldest first.
    pub async fn records(&self) -> Result<Vec<PresentationRecord>, BackendError> {
        let text = match tokio::fs::read_to_string(self.dir.join(RECORDS_FILE)).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        text.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|l| serde_json::from_str(l).map_err(BackendError::from))
            .collect()
    }
}

#[async_trait]
impl PresentationStore for JsonFileStore {
    async fn user_exists(&self, owner_id: &str) -> Result<bool, BackendError> {
        Ok(self.read_users().await?.iter().any(|u| u == owner_id))
    }

    async fn insert_presentation(&self, record: &PresentationRecord) -> Result<(), BackendError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.dir).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(RECORDS_FILE))
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

/// In-process store.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashSet<String>>,
    records: Mutex<Vec<PresentationRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, owner_id: impl Into<String>) -> Self {
        if let Ok(mut users) = self.users.lock() {
            users.insert(owner_id.into());
        }
        self
    }

    pub fn records(&self) -> Vec<PresentationRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PresentationStore for MemoryStore {
    async fn user_exists(&self, owner_id: &str) -> Result<bool, BackendError> {
        Ok(self
            .users
            .lock()
            .map(|u| u.contains(owner_id))
            .unwrap_or(false))
    }

    async fn insert_presentation(&self, record: &PresentationRecord) -> Result<(), BackendError> {
        match self.records.lock() {
            Ok(mut records) => {
                records.push(record.clone());
                Ok(())
            }
            Err(_) => Err(BackendError::Io(std::io::Error::other(
                "memory store lock poisoned",
            ))),
        }
    }
}

// ── Stage wrappers ────────────────────────────────────────────────────────

/// Upload a built deck and return its access URL.
pub async fn upload_deck(
    storage: &dyn DeckStorage,
    deck: &GeneratedDeck,
) -> Result<String, Yt2PptxError> {
    let bytes = deck.read_bytes().await.map_err(Yt2PptxError::deck_build)?;

    match storage.upload(bytes, &deck.file_name, PRESENTATION_MIME).await {
        Ok(Some(url)) if !url.is_empty() => {
            info!("Uploaded {} → {}", deck.file_name, url);
            Ok(url)
        }
        Ok(_) => Err(Yt2PptxError::UploadFailure {
            reason: "No URL returned".into(),
        }),
        Err(e) => Err(Yt2PptxError::UploadFailure {
            reason: e.to_string(),
        }),
    }
}

/// Insert the presentation record.
pub async fn persist_record(
    store: &dyn PresentationStore,
    record: &PresentationRecord,
) -> Result<(), Yt2PptxError> {
    store
        .insert_presentation(record)
        .await
        .map_err(|e| Yt2PptxError::PersistenceFailure {
            reason: e.to_string(),
        })
}
