//! # edgequake-yt2pptx
//!
//! Turn a short YouTube video into a downloadable PowerPoint deck using an
//! LLM to summarise its captions.
//!
//! ## Pipeline Overview
//!
//! ```text
//! video id + caller
//!  │
//!  ├─ 1. Auth      caller must exist in the presentation store
//!  ├─ 2. Metadata  length, title, captions URL (RapidAPI yt-api)
//!  ├─ 3. Captions  timed-text XML → narration      ┐ skipped when the
//!  ├─ 4. LLM       title/description + outline     ┘ video has no captions
//!  ├─ 5. Deck      16:9 .pptx on the blocking pool
//!  └─ 6. Publish   upload, record, delete the temp file
//! ```
//!
//! Videos longer than ten minutes are rejected up front. Videos without
//! captions still get a deck: a fixed three-slide presentation that explains
//! why the content is limited.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_yt2pptx::{GenerationConfig, Generator, JsonFileStore, LocalDirStorage};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // LLM provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     // Metadata requests use RAPID_API_KEY.
//!     let store = JsonFileStore::new("./data");
//!     store.ensure_user("me").await?;
//!
//!     let generator = Generator::builder(GenerationConfig::default())
//!         .storage(Arc::new(LocalDirStorage::new("./decks")))
//!         .store(Arc::new(store))
//!         .build()?;
//!
//!     let result = generator.generate("dQw4w9WgXcQ", Some("me")).await;
//!     println!("{}", serde_json::to_string(&result)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `yt2pptx` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-yt2pptx = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationConfig, GenerationConfigBuilder};
pub use error::{BackendError, ExtractError, LlmCallError, Yt2PptxError};
pub use generate::{fallback_content, resolve_provider, Generator, GeneratorBuilder};
pub use output::{
    CaptionLine, GenerateResult, PresentationRecord, PublishedDeck, SlideContent, SlideOutline,
    TitleDescription, VideoMetadata,
};
pub use pipeline::captions::{CaptionsSource, HttpCaptions};
pub use pipeline::input::resolve_video_id;
pub use pipeline::llm::{LlmTextGenerator, TextGenerator};
pub use pipeline::metadata::{MetadataSource, RapidApiMetadata};
pub use pipeline::publish::{
    DeckStorage, HttpStorage, JsonFileStore, LocalDirStorage, MemoryStore, PresentationStore,
};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
