//! Data types flowing through the generation pipeline.
//!
//! ```text
//! VideoMetadata ─▶ Vec<CaptionLine> ─▶ narration ─┬▶ TitleDescription ─┐
//!                                                  └▶ SlideOutline ─────┴▶ GeneratedDeck ─▶ PresentationRecord
//! ```
//!
//! Everything except [`PresentationRecord`] lives only for the duration of a
//! single run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the metadata provider told us about a video.
///
/// All fields are `None` when the provider could not be reached; the
/// orchestrator then takes the no-captions path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub length_seconds: Option<u64>,
    pub captions_url: Option<String>,
    pub title: Option<String>,
}

/// One `<text>` element of a timed-text captions document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionLine {
    pub text: String,
}

/// Join caption lines into one flat transcript.
pub fn narration_text(lines: &[CaptionLine]) -> String {
    lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Title slide text. Both fields are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleDescription {
    pub title: String,
    pub description: String,
}

/// One content slide: a heading and its bullet lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideContent {
    pub title: String,
    pub content: Vec<String>,
}

/// Ordered content slides. Non-empty; every slide has at least one line.
pub type SlideOutline = Vec<SlideContent>;

/// The row written to the datastore for every published deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationRecord {
    pub link: String,
    pub owner_id: String,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl PresentationRecord {
    pub fn new(
        owner_id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            link: link.into(),
            owner_id: owner_id.into(),
            title: title.into(),
            description: description.into(),
            created_at: Utc::now(),
        }
    }
}

/// Successful outcome of [`crate::generate::Generator::run`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishedDeck {
    /// Public access URL returned by the storage service.
    pub url: String,
    pub title: String,
    pub description: String,
    /// Content slides, not counting the title slide.
    pub slide_count: usize,
    /// `true` when the video had no captions and the canned deck was used.
    pub used_fallback: bool,
}

/// Terminal result handed back to the caller.
///
/// Serialises as `{"success":true,"url":"…"}` or
/// `{"success":false,"error":"…"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerateResult {
    pub fn ok(url: impl Into<String>) -> Self {
        Self {
            success: true,
            url: Some(url.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            url: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narration_is_space_joined_in_order() {
        let lines = vec![
            CaptionLine { text: "hello".into() },
            CaptionLine { text: "there".into() },
            CaptionLine { text: "world".into() },
        ];
        assert_eq!(narration_text(&lines), "hello there world");
        assert_eq!(narration_text(&[]), "");
    }

    #[test]
    fn result_json_omits_absent_fields() {
        let ok = serde_json::to_value(GenerateResult::ok("https://x/y.pptx")).unwrap();
        assert_eq!(ok, serde_json::json!({"success": true, "url": "https://x/y.pptx"}));

        let failed = serde_json::to_value(GenerateResult::failed("nope")).unwrap();
        assert_eq!(failed, serde_json::json!({"success": false, "error": "nope"}));
    }
}
