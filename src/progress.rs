//! Progress-callback trait for per-stage generation events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to receive
//! events as a run moves through its stages.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a Tokio broadcast channel, a WebSocket, a job table, or a
//! terminal spinner without the library knowing how the host application
//! communicates.
//!
//! # Example
//!
//! ```rust
//! use edgequake_yt2pptx::{GenerationConfig, GenerationProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl GenerationProgressCallback for Printer {
//!     fn on_stage_start(&self, video_id: &str, stage: Stage) {
//!         eprintln!("{video_id}: {stage}…");
//!     }
//! }
//!
//! let config = GenerationConfig::builder()
//!     .progress_callback(Arc::new(Printer) as Arc<dyn GenerationProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// The states a run moves through, in order.
///
/// `NoCaptionsFallback` and `ParsingCaptions` are alternatives: exactly one of
/// them is visited, and `SynthesizingContent` is skipped on the fallback path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Stage {
    Authenticating,
    FetchingMetadata,
    NoCaptionsFallback,
    ParsingCaptions,
    SynthesizingContent,
    BuildingDeck,
    Uploading,
    Persisting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Authenticating => "authenticating",
            Stage::FetchingMetadata => "fetching metadata",
            Stage::NoCaptionsFallback => "building fallback content",
            Stage::ParsingCaptions => "parsing captions",
            Stage::SynthesizingContent => "synthesizing content",
            Stage::BuildingDeck => "building deck",
            Stage::Uploading => "uploading",
            Stage::Persisting => "persisting",
        };
        f.write_str(s)
    }
}

/// Called by the generation pipeline as it moves between stages.
///
/// Implementations must be `Send + Sync`: one [`crate::generate::Generator`]
/// may serve several concurrent runs. All methods have default no-op
/// implementations so callers only override what they care about.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called when a stage begins.
    fn on_stage_start(&self, video_id: &str, stage: Stage) {
        let _ = (video_id, stage);
    }

    /// Called when a stage finished without terminating the run.
    fn on_stage_complete(&self, video_id: &str, stage: Stage) {
        let _ = (video_id, stage);
    }

    /// Called once when the run terminates with an error.
    ///
    /// `stage` is `None` for failures that do not belong to a pipeline stage
    /// (configuration problems, panics).
    fn on_run_failed(&self, video_id: &str, stage: Option<Stage>, error: &str) {
        let _ = (video_id, stage, error);
    }

    /// Called once when the deck has been published.
    fn on_run_complete(&self, video_id: &str, url: &str) {
        let _ = (video_id, url);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;
