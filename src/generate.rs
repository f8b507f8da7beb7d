//! Run orchestration: one video id in, one published deck out.
//!
//! ## State machine
//!
//! ```text
//! Authenticating ─▶ FetchingMetadata ─┬▶ NoCaptionsFallback ───────────────┬▶ BuildingDeck ─▶ Uploading ─▶ Persisting ─▶ Done
//!                                     └▶ ParsingCaptions ─▶ SynthesizingContent ┘
//! ```
//!
//! `Done` is not a [`Stage`]: reaching it fires `on_run_complete` once the
//! published deck is returned.
//!
//! Any step may end the run with a [`Yt2PptxError`]. Metadata, captions and
//! title synthesis are degradable and never end a run on their own; the
//! orchestrator decides what their sentinels mean.
//!
//! The deck file is owned by a [`crate::pipeline::deck::GeneratedDeck`] for
//! the rest of the run, so it is removed whether the run succeeds, fails
//! after the deck was built, or unwinds.

use crate::config::GenerationConfig;
use crate::error::Yt2PptxError;
use crate::output::{
    narration_text, GenerateResult, PresentationRecord, PublishedDeck, SlideContent,
    SlideOutline, TitleDescription, VideoMetadata,
};
use crate::pipeline::captions::{CaptionsSource, HttpCaptions};
use crate::pipeline::deck::build_deck;
use crate::pipeline::llm::{
    synthesize_outline, synthesize_title_description, LlmTextGenerator, TextGenerator,
};
use crate::pipeline::metadata::{MetadataSource, RapidApiMetadata};
use crate::pipeline::publish::{persist_record, upload_deck, DeckStorage, PresentationStore};
use crate::progress::Stage;
use edgequake_llm::{LLMProvider, ProviderFactory};
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Description used on the no-captions path.
pub const NO_CAPTIONS_DESCRIPTION: &str =
    "This video doesn't have subtitles. Limited content available.";

/// Default model when a provider is named without one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Turns YouTube videos into published slide decks.
///
/// Cheap to share: wrap in an `Arc` and call [`Generator::generate`] from as
/// many tasks as needed. Runs do not share mutable state.
pub struct Generator {
    config: GenerationConfig,
    metadata: Arc<dyn MetadataSource>,
    captions: Arc<dyn CaptionsSource>,
    text: Arc<dyn TextGenerator>,
    storage: Arc<dyn DeckStorage>,
    store: Arc<dyn PresentationStore>,
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Generator {
    pub fn builder(config: GenerationConfig) -> GeneratorBuilder {
        GeneratorBuilder {
            config,
            metadata: None,
            captions: None,
            text: None,
            storage: None,
            store: None,
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Run the pipeline and flatten the outcome for the caller.
    ///
    /// Never panics and never returns an error: a panic inside any stage is
    /// reported as [`Yt2PptxError::UnexpectedFailure`].
    pub async fn generate(&self, video_id: &str, caller: Option<&str>) -> GenerateResult {
        match AssertUnwindSafe(self.run(video_id, caller))
            .catch_unwind()
            .await
        {
            Ok(Ok(deck)) => GenerateResult::ok(deck.url),
            Ok(Err(e)) => GenerateResult::failed(e.to_string()),
            Err(payload) => {
                let e = Yt2PptxError::UnexpectedFailure(panic_message(payload.as_ref()));
                error!("Video {}: run panicked — {}", video_id, e);
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_run_failed(video_id, None, &e.to_string());
                }
                GenerateResult::failed(e.to_string())
            }
        }
    }

    /// Run the pipeline for `video_id` on behalf of `caller`.
    ///
    /// `video_id` is passed to the metadata source as-is; use
    /// [`crate::pipeline::input::resolve_video_id`] first for user input.
    pub async fn run(
        &self,
        video_id: &str,
        caller: Option<&str>,
    ) -> Result<PublishedDeck, Yt2PptxError> {
        let start = Instant::now();
        info!("Starting generation: {}", video_id);

        match self.run_stages(video_id, caller).await {
            Ok(deck) => {
                info!(
                    "Video {}: published {} slides in {:?} → {}",
                    video_id,
                    deck.slide_count + 1,
                    start.elapsed(),
                    deck.url
                );
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_run_complete(video_id, &deck.url);
                }
                Ok(deck)
            }
            Err(e) => {
                let stage = e.stage();
                match stage {
                    Some(s) => error!("Video {}: failed while {} — {}", video_id, s, e),
                    None => error!("Video {}: failed — {}", video_id, e),
                }
                if let Some(ref cb) = self.config.progress_callback {
                    cb.on_run_failed(video_id, stage, &e.to_string());
                }
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        video_id: &str,
        caller: Option<&str>,
    ) -> Result<PublishedDeck, Yt2PptxError> {
        // ── Step 1: Authenticate ─────────────────────────────────────────
        self.stage_start(video_id, Stage::Authenticating);
        let owner_id = self.authenticate(caller).await?;
        self.stage_complete(video_id, Stage::Authenticating);

        // ── Step 2: Metadata + length cap ────────────────────────────────
        self.stage_start(video_id, Stage::FetchingMetadata);
        let meta = self.metadata.fetch(video_id).await;
        if let Some(length_secs) = meta.length_seconds {
            if length_secs > self.config.max_video_secs {
                return Err(Yt2PptxError::VideoTooLong {
                    length_secs,
                    max_secs: self.config.max_video_secs,
                });
            }
        }
        self.stage_complete(video_id, Stage::FetchingMetadata);

        // ── Step 3: Content ──────────────────────────────────────────────
        let (td, outline, used_fallback) = match meta.captions_url.as_deref() {
            None => {
                self.stage_start(video_id, Stage::NoCaptionsFallback);
                info!("Video {}: no captions, using fallback deck", video_id);
                let (td, outline) = fallback_content(video_id, &meta);
                self.stage_complete(video_id, Stage::NoCaptionsFallback);
                (td, outline, true)
            }
            Some(url) => {
                let (td, outline) = self.synthesize(video_id, url).await?;
                (td, outline, false)
            }
        };

        // ── Step 4: Deck ─────────────────────────────────────────────────
        self.stage_start(video_id, Stage::BuildingDeck);
        let deck = build_deck(&td, &outline, &owner_id, &self.config.deck_dir()).await?;
        self.stage_complete(video_id, Stage::BuildingDeck);

        // ── Step 5: Upload ───────────────────────────────────────────────
        self.stage_start(video_id, Stage::Uploading);
        let url = upload_deck(self.storage.as_ref(), &deck).await?;
        self.stage_complete(video_id, Stage::Uploading);

        // ── Step 6: Persist ──────────────────────────────────────────────
        self.stage_start(video_id, Stage::Persisting);
        let record = PresentationRecord::new(&owner_id, &td.title, &td.description, &url);
        persist_record(self.store.as_ref(), &record).await?;
        self.stage_complete(video_id, Stage::Persisting);

        if let Err(e) = deck.close() {
            warn!("Video {}: could not delete temp deck — {}", video_id, e);
        }

        Ok(PublishedDeck {
            url,
            title: td.title,
            description: td.description,
            slide_count: outline.len(),
            used_fallback,
        })
    }

    async fn authenticate(&self, caller: Option<&str>) -> Result<String, Yt2PptxError> {
        let owner_id = caller
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(Yt2PptxError::NotAuthenticated)?;

        match self.store.user_exists(owner_id).await {
            Ok(true) => Ok(owner_id.to_string()),
            Ok(false) => Err(Yt2PptxError::UserNotFound {
                owner_id: owner_id.to_string(),
            }),
            Err(e) => Err(Yt2PptxError::UnexpectedFailure(format!(
                "user lookup failed: {e}"
            ))),
        }
    }

    async fn synthesize(
        &self,
        video_id: &str,
        captions_url: &str,
    ) -> Result<(TitleDescription, SlideOutline), Yt2PptxError> {
        self.stage_start(video_id, Stage::ParsingCaptions);
        let lines = self
            .captions
            .parse(captions_url)
            .await
            .filter(|lines| !lines.is_empty())
            .ok_or_else(|| Yt2PptxError::SubtitleParseFailure {
                video_id: video_id.to_string(),
            })?;
        let narration = narration_text(&lines);
        debug!(
            "Video {}: {} caption lines, {} chars of narration",
            video_id,
            lines.len(),
            narration.len()
        );
        self.stage_complete(video_id, Stage::ParsingCaptions);

        self.stage_start(video_id, Stage::SynthesizingContent);
        let llm_start = Instant::now();
        // Title synthesis cannot fail, so joining never cancels the outline.
        let (td, outline) = futures::join!(
            synthesize_title_description(self.text.as_ref(), &narration),
            synthesize_outline(self.text.as_ref(), &narration, self.config.slide_count),
        );
        let outline = outline.ok_or_else(|| Yt2PptxError::ContentGenerationFailure {
            video_id: video_id.to_string(),
        })?;
        info!(
            "Video {}: synthesized {} slides in {:?}",
            video_id,
            outline.len(),
            llm_start.elapsed()
        );
        self.stage_complete(video_id, Stage::SynthesizingContent);

        Ok((td, outline))
    }

    fn stage_start(&self, video_id: &str, stage: Stage) {
        debug!("Video {}: {}", video_id, stage);
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_stage_start(video_id, stage);
        }
    }

    fn stage_complete(&self, video_id: &str, stage: Stage) {
        if let Some(ref cb) = self.config.progress_callback {
            cb.on_stage_complete(video_id, stage);
        }
    }
}

/// Builder for [`Generator`].
///
/// Storage and store have no default and must be supplied. Metadata and
/// captions default to the HTTP sources; the text generator defaults to one
/// backed by the provider resolved from the config.
pub struct GeneratorBuilder {
    config: GenerationConfig,
    metadata: Option<Arc<dyn MetadataSource>>,
    captions: Option<Arc<dyn CaptionsSource>>,
    text: Option<Arc<dyn TextGenerator>>,
    storage: Option<Arc<dyn DeckStorage>>,
    store: Option<Arc<dyn PresentationStore>>,
}

impl GeneratorBuilder {
    pub fn metadata_source(mut self, source: Arc<dyn MetadataSource>) -> Self {
        self.metadata = Some(source);
        self
    }

    pub fn captions_source(mut self, source: Arc<dyn CaptionsSource>) -> Self {
        self.captions = Some(source);
        self
    }

    pub fn text_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.text = Some(generator);
        self
    }

    pub fn storage(mut self, storage: Arc<dyn DeckStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn store(mut self, store: Arc<dyn PresentationStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<Generator, Yt2PptxError> {
        let config = self.config;

        let storage = self
            .storage
            .ok_or_else(|| Yt2PptxError::InvalidConfig("a deck storage is required".into()))?;
        let store = self.store.ok_or_else(|| {
            Yt2PptxError::InvalidConfig("a presentation store is required".into())
        })?;

        let metadata: Arc<dyn MetadataSource> = match self.metadata {
            Some(m) => m,
            None => Arc::new(RapidApiMetadata::from_config(&config).map_err(|e| {
                Yt2PptxError::InvalidConfig(format!("metadata HTTP client: {e}"))
            })?),
        };

        let captions: Arc<dyn CaptionsSource> = match self.captions {
            Some(c) => c,
            None => Arc::new(HttpCaptions::from_config(&config).map_err(|e| {
                Yt2PptxError::InvalidConfig(format!("captions HTTP client: {e}"))
            })?),
        };

        let text: Arc<dyn TextGenerator> = match self.text {
            Some(t) => t,
            None => {
                let provider = resolve_provider(&config)?;
                Arc::new(LlmTextGenerator::new(provider, &config))
            }
        };

        Ok(Generator {
            config,
            metadata,
            captions,
            text,
            storage,
            store,
        })
    }
}

/// Title slide and the fixed three-slide outline for a video without captions.
pub fn fallback_content(video_id: &str, meta: &VideoMetadata) -> (TitleDescription, SlideOutline) {
    let td = TitleDescription {
        title: meta
            .title
            .clone()
            .unwrap_or_else(|| format!("Presentation for YouTube Video: {video_id}")),
        description: NO_CAPTIONS_DESCRIPTION.to_string(),
    };

    let length = match meta.length_seconds {
        Some(secs) => format!("{} minutes, {} seconds", secs / 60, secs % 60),
        None => "Unknown".to_string(),
    };

    let outline = vec![
        SlideContent {
            title: "About This Video".into(),
            content: vec![
                "This presentation was created with limited information because the video doesn't have subtitles.".into(),
                "To get better results, try using videos with closed captions enabled.".into(),
                "You can add captions to your YouTube videos in YouTube Studio.".into(),
                "The presentation includes basic information about the video.".into(),
            ],
        },
        SlideContent {
            title: "Video Information".into(),
            content: vec![
                format!("Video ID: {video_id}"),
                format!(
                    "Video Title: {}",
                    meta.title.as_deref().unwrap_or("Not available")
                ),
                format!("Video Length: {length}"),
                "This presentation was generated automatically.".into(),
            ],
        },
        SlideContent {
            title: "Next Steps".into(),
            content: vec![
                "You can edit this presentation to add your own content.".into(),
                "Consider using videos with subtitles for better results.".into(),
                "You can download this presentation and modify it in PowerPoint.".into(),
                "Thank you for using our service!".into(),
            ],
        },
    ];

    (td, outline)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

// ── Provider resolution ───────────────────────────────────────────────────

/// Instantiate a named provider with the given model.
pub fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, Yt2PptxError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        Yt2PptxError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`, `config.model`).
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`),
///    honoured only when both are set.
/// 4. **OpenAI** when `OPENAI_API_KEY` is present.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_provider(config: &GenerationConfig) -> Result<Arc<dyn LLMProvider>, Yt2PptxError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| Yt2PptxError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::publish::MemoryStore;

    fn meta(length: Option<u64>, title: Option<&str>) -> VideoMetadata {
        VideoMetadata {
            length_seconds: length,
            captions_url: None,
            title: title.map(str::to_string),
        }
    }

    #[test]
    fn fallback_uses_video_title() {
        let (td, outline) = fallback_content("xyz98765432", &meta(Some(120), Some("Cooking pasta")));
        assert_eq!(td.title, "Cooking pasta");
        assert_eq!(td.description, NO_CAPTIONS_DESCRIPTION);
        assert_eq!(outline.len(), 3);
        assert_eq!(
            outline.iter().map(|s| s.title.as_str()).collect::<Vec<_>>(),
            vec!["About This Video", "Video Information", "Next Steps"]
        );
        assert!(outline.iter().all(|s| s.content.len() == 4));
        assert_eq!(outline[1].content[0], "Video ID: xyz98765432");
        assert_eq!(outline[1].content[1], "Video Title: Cooking pasta");
        assert_eq!(outline[1].content[2], "Video Length: 2 minutes, 0 seconds");
    }

    #[test]
    fn fallback_without_title_or_length() {
        let (td, outline) = fallback_content("xyz98765432", &meta(None, None));
        assert_eq!(td.title, "Presentation for YouTube Video: xyz98765432");
        assert_eq!(outline[1].content[1], "Video Title: Not available");
        assert_eq!(outline[1].content[2], "Video Length: Unknown");
    }

    #[test]
    fn fallback_length_is_minutes_and_seconds() {
        let (_, outline) = fallback_content("a", &meta(Some(125), None));
        assert_eq!(outline[1].content[2], "Video Length: 2 minutes, 5 seconds");
    }

    #[test]
    fn builder_requires_storage_and_store() {
        let err = Generator::builder(GenerationConfig::default())
            .store(Arc::new(MemoryStore::new()))
            .build()
            .unwrap_err();
        assert!(matches!(err, Yt2PptxError::InvalidConfig(_)));
    }

    #[test]
    fn panic_messages() {
        let s: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(s.as_ref()), "boom");
        let s: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(s.as_ref()), "bang");
        let s: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(s.as_ref()), "panic with non-string payload");
    }
}
