//! Configuration types for video-to-deck generation.
//!
//! All generation behaviour is controlled through [`GenerationConfig`], built
//! via its [`GenerationConfigBuilder`]. Collaborators with side effects
//! (storage, datastore) are *not* configured here; they are handed to
//! [`crate::generate::GeneratorBuilder`] so tests can swap them for fakes.

use crate::error::Yt2PptxError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default metadata provider endpoint (RapidAPI `yt-api`).
pub const DEFAULT_METADATA_ENDPOINT: &str = "https://yt-api.p.rapidapi.com/video/info";

/// Host header expected by the RapidAPI gateway.
pub const DEFAULT_METADATA_HOST: &str = "yt-api.p.rapidapi.com";

/// Name of the directory under the system temp dir that holds in-flight decks.
pub const DECK_TEMP_DIR_NAME: &str = "ppt-generator";

/// Configuration for a generation run.
///
/// Built via [`GenerationConfig::builder()`] or using
/// [`GenerationConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_yt2pptx::GenerationConfig;
///
/// let config = GenerationConfig::builder()
///     .slide_count(8)
///     .model("gpt-4.1-mini")
///     .build()
///     .unwrap();
/// assert_eq!(config.slide_count, 8);
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// Hard cap on video length in seconds. Default: 600 (10 minutes).
    ///
    /// Longer videos are rejected before any captions are downloaded. The cap
    /// keeps the narration inside a single prompt and bounds LLM cost.
    pub max_video_secs: u64,

    /// Number of content slides requested from the outline prompt. Default: 10.
    pub slide_count: usize,

    /// Preferred captions language code. Default: "en".
    pub language: String,

    /// Metadata provider endpoint.
    pub metadata_endpoint: String,

    /// Value of the `x-rapidapi-host` header.
    pub metadata_host: String,

    /// RapidAPI key. If None, `RAPID_API_KEY` is read from the environment.
    pub rapidapi_key: Option<String>,

    /// Timeout for the metadata request in seconds. Default: 5.
    pub metadata_timeout_secs: u64,

    /// Timeout for the captions download in seconds. Default: 5.
    pub captions_timeout_secs: u64,

    /// LLM model identifier, e.g. "gpt-4.1-nano", "gemini-1.5-pro".
    /// If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "gemini", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for both synthesis prompts. Default: 0.4.
    pub temperature: f32,

    /// Maximum tokens per synthesis response. Default: 4096.
    ///
    /// Ten slides of four ~165-character bullets is roughly 2 000 tokens of
    /// JSON; 4 096 leaves room for headings and the odd preamble.
    pub max_tokens: usize,

    /// Per-LLM-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,

    /// Directory for in-flight deck files.
    /// If None, `<system temp>/ppt-generator` is used.
    pub temp_dir: Option<PathBuf>,

    /// Optional per-stage progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_video_secs: 600,
            slide_count: 10,
            language: "en".to_string(),
            metadata_endpoint: DEFAULT_METADATA_ENDPOINT.to_string(),
            metadata_host: DEFAULT_METADATA_HOST.to_string(),
            rapidapi_key: None,
            metadata_timeout_secs: 5,
            captions_timeout_secs: 5,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.4,
            max_tokens: 4096,
            api_timeout_secs: 60,
            temp_dir: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("max_video_secs", &self.max_video_secs)
            .field("slide_count", &self.slide_count)
            .field("language", &self.language)
            .field("metadata_endpoint", &self.metadata_endpoint)
            .field("rapidapi_key", &self.rapidapi_key.as_ref().map(|_| "<redacted>"))
            .field("metadata_timeout_secs", &self.metadata_timeout_secs)
            .field("captions_timeout_secs", &self.captions_timeout_secs)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("temp_dir", &self.temp_dir)
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }

    /// Directory where deck files are written before upload.
    pub fn deck_dir(&self) -> PathBuf {
        self.temp_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(DECK_TEMP_DIR_NAME))
    }
}

/// Builder for [`GenerationConfig`].
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl fmt::Debug for GenerationConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfigBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl GenerationConfigBuilder {
    pub fn max_video_secs(mut self, secs: u64) -> Self {
        self.config.max_video_secs = secs;
        self
    }

    pub fn slide_count(mut self, n: usize) -> Self {
        self.config.slide_count = n.clamp(1, 30);
        self
    }

    pub fn language(mut self, code: impl Into<String>) -> Self {
        self.config.language = code.into();
        self
    }

    pub fn metadata_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.metadata_endpoint = url.into();
        self
    }

    pub fn metadata_host(mut self, host: impl Into<String>) -> Self {
        self.config.metadata_host = host.into();
        self
    }

    pub fn rapidapi_key(mut self, key: impl Into<String>) -> Self {
        self.config.rapidapi_key = Some(key.into());
        self
    }

    pub fn metadata_timeout_secs(mut self, secs: u64) -> Self {
        self.config.metadata_timeout_secs = secs;
        self
    }

    pub fn captions_timeout_secs(mut self, secs: u64) -> Self {
        self.config.captions_timeout_secs = secs;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = Some(dir.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, Yt2PptxError> {
        let c = &self.config;
        if c.max_video_secs == 0 {
            return Err(Yt2PptxError::InvalidConfig(
                "max_video_secs must be ≥ 1".into(),
            ));
        }
        if c.language.trim().is_empty() {
            return Err(Yt2PptxError::InvalidConfig(
                "captions language must not be empty".into(),
            ));
        }
        if c.metadata_timeout_secs == 0 || c.captions_timeout_secs == 0 || c.api_timeout_secs == 0
        {
            return Err(Yt2PptxError::InvalidConfig(
                "timeouts must be ≥ 1 second".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(Yt2PptxError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}
