//! Video metadata: length, title and captions-track URL.
//!
//! Fail-soft by contract: any transport, status or decoding problem yields
//! [`VideoMetadata::default()`] (all fields `None`) so the orchestrator can
//! fall back to the no-captions deck instead of aborting.

use crate::config::GenerationConfig;
use crate::output::VideoMetadata;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Source of [`VideoMetadata`] for a video id.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Never fails; unreachable metadata is reported as all-`None`.
    async fn fetch(&self, video_id: &str) -> VideoMetadata;
}

/// Metadata from the RapidAPI `yt-api` `video/info` endpoint.
pub struct RapidApiMetadata {
    client: reqwest::Client,
    endpoint: String,
    host: String,
    api_key: Option<String>,
    language: String,
}

impl RapidApiMetadata {
    /// Build from config. Falls back to `RAPID_API_KEY` when no key is set.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.metadata_timeout_secs))
            .build()?;

        let api_key = config
            .rapidapi_key
            .clone()
            .or_else(|| std::env::var("RAPID_API_KEY").ok())
            .filter(|k| !k.is_empty());

        if api_key.is_none() {
            warn!("RAPID_API_KEY is not set; metadata requests will likely be rejected");
        }

        Ok(Self {
            client,
            endpoint: config.metadata_endpoint.clone(),
            host: config.metadata_host.clone(),
            api_key,
            language: config.language.clone(),
        })
    }

    async fn request(&self, video_id: &str) -> Result<Value, reqwest::Error> {
        let mut req = self
            .client
            .get(&self.endpoint)
            .query(&[("id", video_id), ("lang", self.language.as_str())])
            .header("x-rapidapi-host", &self.host);
        if let Some(ref key) = self.api_key {
            req = req.header("x-rapidapi-key", key);
        }

        req.send().await?.error_for_status()?.json::<Value>().await
    }
}

#[async_trait]
impl MetadataSource for RapidApiMetadata {
    async fn fetch(&self, video_id: &str) -> VideoMetadata {
        match self.request(video_id).await {
            Ok(body) => {
                let meta = metadata_from_response(&body, &self.language);
                info!(
                    "Video {}: length={:?}s, captions={}, title={:?}",
                    video_id,
                    meta.length_seconds,
                    meta.captions_url.is_some(),
                    meta.title
                );
                meta
            }
            Err(e) => {
                warn!("Video {}: metadata fetch failed — {}", video_id, e);
                VideoMetadata::default()
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct InfoResponse {
    #[serde(rename = "lengthSeconds", default)]
    length_seconds: Option<Value>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    subtitles: Option<SubtitlesBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct SubtitlesBlock {
    #[serde(default)]
    subtitles: Vec<CaptionTrack>,
}

/// One captions track advertised by the provider.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaptionTrack {
    #[serde(rename = "languageCode", default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

/// Decode a `video/info` body. Unknown or malformed fields become `None`.
pub fn metadata_from_response(body: &Value, language: &str) -> VideoMetadata {
    let info: InfoResponse = match serde_json::from_value(body.clone()) {
        Ok(info) => info,
        Err(e) => {
            debug!("Metadata body did not match the expected shape: {}", e);
            InfoResponse::default()
        }
    };

    let tracks = info.subtitles.map(|s| s.subtitles).unwrap_or_default();

    VideoMetadata {
        length_seconds: info.length_seconds.as_ref().and_then(parse_length),
        captions_url: select_captions_url(&tracks, language),
        title: info.title.filter(|t| !t.trim().is_empty()),
    }
}

/// Pick the captions URL: preferred language, else the first track.
///
/// A preferred track without a usable URL falls through to the first track.
pub fn select_captions_url(tracks: &[CaptionTrack], language: &str) -> Option<String> {
    let usable = |t: &CaptionTrack| t.url.clone().filter(|u| !u.is_empty());

    tracks
        .iter()
        .find(|t| t.language_code.as_deref() == Some(language))
        .and_then(usable)
        .or_else(|| tracks.first().and_then(usable))
}

/// `lengthSeconds` arrives as a number or a numeric string. Zero means unknown.
fn parse_length(v: &Value) -> Option<u64> {
    let n = match v {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    n.filter(|&secs| secs > 0)
}
