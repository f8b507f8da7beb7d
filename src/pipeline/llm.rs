//! Outline synthesis: turn narration into slide text via the LLM.
//!
//! Two calls, two failure policies:
//!
//! * [`synthesize_title_description`] always returns a usable value. A bad
//!   title slide is cosmetic, so any failure yields [`fallback_title_description`].
//! * [`synthesize_outline`] returns `None` on any failure. Without an outline
//!   there is nothing to put on the slides and the run must stop.
//!
//! Neither call is retried. All prompt wording lives in [`crate::prompts`].

use crate::config::GenerationConfig;
use crate::error::{ExtractError, LlmCallError};
use crate::output::{SlideContent, SlideOutline, TitleDescription};
use crate::pipeline::extract::extract_typed;
use crate::prompts::{outline_prompt, title_description_prompt};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Title used when title/description synthesis fails.
pub const FALLBACK_TITLE: &str = "Presentation from YouTube Video";

/// Description used when title/description synthesis fails.
pub const FALLBACK_DESCRIPTION: &str =
    "Automatically generated presentation based on video content.";

/// A single-prompt text-generation service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send one free-text prompt and return the raw response text.
    async fn generate(&self, prompt: &str) -> Result<String, LlmCallError>;
}

/// [`TextGenerator`] backed by an edgequake-llm provider.
pub struct LlmTextGenerator {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
    timeout: Duration,
}

impl LlmTextGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &GenerationConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
            timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }
}

#[async_trait]
impl TextGenerator for LlmTextGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmCallError> {
        let start = Instant::now();
        let messages = vec![ChatMessage::user(prompt)];

        let response = tokio::time::timeout(
            self.timeout,
            self.provider.chat(&messages, Some(&self.options)),
        )
        .await
        .map_err(|_| LlmCallError::Timeout {
            secs: self.timeout.as_secs(),
        })?
        .map_err(|e| LlmCallError::Api(e.to_string()))?;

        debug!(
            "LLM call: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }
}

/// Build `CompletionOptions` from the generation config.
fn build_options(config: &GenerationConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

/// The canned title slide used when synthesis fails.
pub fn fallback_title_description() -> TitleDescription {
    TitleDescription {
        title: FALLBACK_TITLE.to_string(),
        description: FALLBACK_DESCRIPTION.to_string(),
    }
}

/// Ask for a title and description. Never fails.
pub async fn synthesize_title_description(
    generator: &dyn TextGenerator,
    narration: &str,
) -> TitleDescription {
    let raw = match generator.generate(&title_description_prompt(narration)).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Title generation failed, using fallback — {}", e);
            return fallback_title_description();
        }
    };

    match parse_title_description(&raw) {
        Ok(td) => td,
        Err(e) => {
            warn!("Title response rejected, using fallback — {}", e);
            fallback_title_description()
        }
    }
}

/// Ask for `slide_count` content slides. `None` on any failure.
pub async fn synthesize_outline(
    generator: &dyn TextGenerator,
    narration: &str,
    slide_count: usize,
) -> Option<SlideOutline> {
    let raw = match generator
        .generate(&outline_prompt(narration, slide_count))
        .await
    {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Outline generation failed — {}", e);
            return None;
        }
    };

    match parse_outline(&raw) {
        Ok(outline) => {
            if outline.len() != slide_count {
                debug!(
                    "Model returned {} slides, {} requested",
                    outline.len(),
                    slide_count
                );
            }
            Some(outline)
        }
        Err(e) => {
            warn!("Outline response rejected — {}", e);
            None
        }
    }
}

/// Decode and validate a title/description response.
pub fn parse_title_description(raw: &str) -> Result<TitleDescription, ExtractError> {
    let td: TitleDescription = extract_typed(raw)?;
    if td.title.trim().is_empty() || td.description.trim().is_empty() {
        return Err(ExtractError::Schema(
            "title and description must be non-empty".into(),
        ));
    }
    Ok(td)
}

#[derive(Debug, Deserialize)]
struct OutlineEnvelope {
    #[serde(rename = "arrayOfObjects")]
    array_of_objects: Vec<SlideContent>,
}

/// Decode and validate an outline response.
///
/// The response is rejected as a whole if any slide is malformed; slides are
/// never partially accepted.
pub fn parse_outline(raw: &str) -> Result<SlideOutline, ExtractError> {
    let envelope: OutlineEnvelope = extract_typed(raw)?;
    let slides = envelope.array_of_objects;

    if slides.is_empty() {
        return Err(ExtractError::Schema("outline has no slides".into()));
    }
    if let Some(i) = slides.iter().position(|s| s.content.is_empty()) {
        return Err(ExtractError::Schema(format!(
            "slide {} has no content lines",
            i + 1
        )));
    }
    Ok(slides)
}
