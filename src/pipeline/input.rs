//! Input resolution: normalise a user-supplied URL or id to a video id.
//!
//! The orchestrator itself accepts any id string and leaves validation to the
//! metadata provider. This module is for front ends (the CLI, a web form)
//! that receive whatever the user pasted: full `watch?v=` links, `youtu.be`
//! short links, Shorts, embed and live URLs, or a bare 11-character id.

use crate::error::Yt2PptxError;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static RE_VIDEO_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:https?://)?(?:www\.|m\.)?(?:youtube\.com/(?:watch\?(?:.*&)?v=|shorts/|embed/|live/)|youtu\.be/)([A-Za-z0-9_-]{11})(?:[?&#/].*)?$",
    )
    .unwrap()
});

static RE_BARE_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").unwrap());

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://")
        || input.starts_with("https://")
        || input.contains("youtube.com/")
        || input.contains("youtu.be/")
}

/// Resolve a YouTube URL or bare id to the 11-character video id.
pub fn resolve_video_id(input: &str) -> Result<String, Yt2PptxError> {
    let input = input.trim();

    let id = if is_url(input) {
        RE_VIDEO_URL
            .captures(input)
            .map(|caps| caps[1].to_string())
    } else if RE_BARE_ID.is_match(input) {
        Some(input.to_string())
    } else {
        None
    };

    match id {
        Some(id) => {
            debug!("Resolved video id {} from '{}'", id, input);
            Ok(id)
        }
        None => Err(Yt2PptxError::InvalidVideoId {
            input: input.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(is_url("youtu.be/dQw4w9WgXcQ"));
        assert!(!is_url("dQw4w9WgXcQ"));
        assert!(!is_url(""));
    }

    #[test]
    fn resolves_common_url_shapes() {
        for url in [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "http://youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?t=30",
            "youtu.be/dQw4w9WgXcQ",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/live/dQw4w9WgXcQ?si=abc",
        ] {
            assert_eq!(resolve_video_id(url).unwrap(), "dQw4w9WgXcQ", "url: {url}");
        }
    }

    #[test]
    fn accepts_bare_id_with_whitespace() {
        assert_eq!(resolve_video_id("  abc12345678 \n").unwrap(), "abc12345678");
    }

    #[test]
    fn rejects_other_sites_and_bad_ids() {
        for bad in [
            "https://vimeo.com/123456789",
            "https://www.youtube.com/playlist?list=PLrAXtmRdnEQy",
            "https://www.youtube.com/watch?v=short",
            "not a video",
            "abc1234567",
            "",
        ] {
            let err = resolve_video_id(bad).unwrap_err();
            assert!(
                matches!(err, Yt2PptxError::InvalidVideoId { .. }),
                "input {bad:?} gave {err:?}"
            );
        }
    }
}
