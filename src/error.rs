//! Error types for the edgequake-yt2pptx library.
//!
//! The pipeline distinguishes two kinds of failure:
//!
//! * [`Yt2PptxError`] — **Fatal**: the run cannot produce a deck (caller not
//!   authenticated, video too long, no usable outline, upload rejected, …).
//!   Returned as `Err(Yt2PptxError)` from [`crate::generate::Generator::run`]
//!   and flattened into [`crate::output::GenerateResult`] by
//!   [`crate::generate::Generator::generate`].
//!
//! * Component errors — [`BackendError`], [`LlmCallError`] and
//!   [`ExtractError`] — raised *inside* a stage. Degradable stages (metadata,
//!   captions, title synthesis) swallow them and return a sentinel; the other
//!   stages wrap them in the matching [`Yt2PptxError`] variant.
//!
//! Display strings of the caller-facing variants are the exact messages the
//! web front-end shows, so changing them is a breaking change.

use crate::progress::Stage;
use thiserror::Error;

/// All fatal errors returned by the edgequake-yt2pptx library.
#[derive(Debug, Error)]
pub enum Yt2PptxError {
    // ── Caller errors ─────────────────────────────────────────────────────
    /// No caller identity was supplied.
    #[error("User not authenticated")]
    NotAuthenticated,

    /// The caller identity is unknown to the datastore.
    #[error("User not found in database")]
    UserNotFound { owner_id: String },

    // ── Video errors ──────────────────────────────────────────────────────
    /// The video exceeds the configured length cap. No override exists.
    #[error("Video needs to be less than {}", length_cap(.max_secs))]
    VideoTooLong { length_secs: u64, max_secs: u64 },

    /// Captions were advertised but could not be downloaded or parsed.
    #[error("Failed to parse subtitles")]
    SubtitleParseFailure { video_id: String },

    /// The text-generation service produced no usable slide outline.
    #[error("Failed to generate slide content")]
    ContentGenerationFailure { video_id: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Writing the `.pptx` file failed.
    #[error("Failed to create PowerPoint file: {source}")]
    DeckBuildFailure {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The storage service failed or returned no accessible URL.
    #[error("Upload failed - {reason}")]
    UploadFailure { reason: String },

    /// The presentation record could not be written.
    #[error("Failed to save presentation record: {reason}")]
    PersistenceFailure { reason: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// The configured LLM provider could not be initialised.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The user input is neither a YouTube URL nor an 11-character video id.
    #[error("Invalid YouTube URL or video id: '{input}'")]
    InvalidVideoId { input: String },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Anything not covered above, including a panic inside a stage.
    #[error("Unexpected failure: {0}")]
    UnexpectedFailure(String),
}

/// "10 minutes" for whole-minute caps, "90 seconds" otherwise.
fn length_cap(max_secs: &u64) -> String {
    match *max_secs {
        60 => "1 minute".to_string(),
        s if s % 60 == 0 => format!("{} minutes", s / 60),
        1 => "1 second".to_string(),
        s => format!("{s} seconds"),
    }
}

impl Yt2PptxError {
    /// Wrap any error raised while producing the deck file.
    pub fn deck_build(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Yt2PptxError::DeckBuildFailure {
            source: Box::new(source),
        }
    }

    /// Pipeline stage the error terminated, if it belongs to one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Yt2PptxError::NotAuthenticated | Yt2PptxError::UserNotFound { .. } => {
                Some(Stage::Authenticating)
            }
            Yt2PptxError::VideoTooLong { .. } => Some(Stage::FetchingMetadata),
            Yt2PptxError::SubtitleParseFailure { .. } => Some(Stage::ParsingCaptions),
            Yt2PptxError::ContentGenerationFailure { .. } => Some(Stage::SynthesizingContent),
            Yt2PptxError::DeckBuildFailure { .. } => Some(Stage::BuildingDeck),
            Yt2PptxError::UploadFailure { .. } => Some(Stage::Uploading),
            Yt2PptxError::PersistenceFailure { .. } => Some(Stage::Persisting),
            _ => None,
        }
    }
}

/// Failure talking to the storage service or the datastore.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The service answered, but with a non-success status.
    #[error("service rejected the request with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Failure of a single text-generation call. Never retried.
#[derive(Debug, Clone, Error)]
pub enum LlmCallError {
    #[error("LLM API error: {0}")]
    Api(String),

    #[error("LLM call timed out after {secs}s")]
    Timeout { secs: u64 },
}

/// Why a JSON value could not be recovered from free-form model output.
///
/// Extraction failures (`NotFound`, `Unbalanced`) are kept apart from
/// decoding failures (`Malformed`, `Schema`) so tests can tell a model that
/// ignored the format instruction from one that got the shape wrong.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no JSON object found in model output")]
    NotFound,

    #[error("JSON object starting at byte {start} is never closed")]
    Unbalanced { start: usize },

    #[error("malformed JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("JSON does not match the expected schema: {0}")]
    Schema(String),
}
