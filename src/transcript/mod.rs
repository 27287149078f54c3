use async_trait::async_trait;
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub mod api;
pub mod captions;

use crate::{Result, TranscriptError};

/// Sentinel text returned when no provider yields a transcript.
pub const NO_TRANSCRIPT: &str = "No transcript available";

static VIDEO_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[?&]v=([^&]+)").unwrap());

/// A single captioned segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment text
    pub text: String,

    /// Start time in seconds
    pub start: f64,

    /// Duration in seconds
    pub duration: f64,
}

/// Which provider supplied the transcript text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provenance {
    /// Captions API (preferred for robustness)
    Primary,
    /// Caption-track fallback
    Fallback,
    /// No provider yielded a transcript
    None,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provenance::Primary => write!(f, "transcript-api"),
            Provenance::Fallback => write!(f, "captions"),
            Provenance::None => write!(f, "none"),
        }
    }
}

/// Resolved transcript text plus its provenance. Immutable once produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptResult {
    pub text: String,
    pub provenance: Provenance,
}

impl TranscriptResult {
    /// The miss case: sentinel text, no provenance.
    pub fn unavailable() -> Self {
        Self {
            text: NO_TRANSCRIPT.to_string(),
            provenance: Provenance::None,
        }
    }
}

/// Primary transcript provider: lookup by video id with an ordered language
/// preference list.
#[async_trait]
pub trait TranscriptApi: Send + Sync {
    async fn fetch_segments(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> std::result::Result<Vec<Segment>, TranscriptError>;
}

/// Fallback transcript provider: constructed from a watch URL, returns
/// generated subtitle text for the first available language, if any.
#[async_trait]
pub trait CaptionSource: Send + Sync {
    async fn caption_text(&self, watch_url: &str, languages: &[String]) -> Result<Option<String>>;
}

/// Extract the video id from the `v=` query parameter of a watch URL.
pub fn extract_video_id(url: &str) -> Option<String> {
    VIDEO_ID_RE
        .captures(url)
        .map(|caps| caps[1].to_string())
}

/// Canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Resolve a transcript for a watch URL: captions API first, caption-track
/// fallback second, sentinel last. Never fails; provider errors are either
/// expected (silent fall-through) or logged before falling through.
pub async fn resolve(
    url: &str,
    primary: &dyn TranscriptApi,
    fallback: &dyn CaptionSource,
    languages: &[String],
) -> TranscriptResult {
    let video_id = match extract_video_id(url) {
        Some(id) => id,
        None => return TranscriptResult::unavailable(),
    };

    match primary.fetch_segments(&video_id, languages).await {
        Ok(segments) => {
            let text = segments
                .iter()
                .map(|segment| segment.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            return TranscriptResult {
                text,
                provenance: Provenance::Primary,
            };
        }
        Err(err) if err.is_expected() => {
            tracing::debug!("Captions API has no transcript for {}: {}", video_id, err);
        }
        Err(err) => {
            tracing::warn!("Captions API error for {}: {}", video_id, err);
        }
    }

    match fallback.caption_text(url, languages).await {
        Ok(Some(text)) => {
            return TranscriptResult {
                text,
                provenance: Provenance::Fallback,
            };
        }
        Ok(None) => {}
        Err(err) => {
            tracing::warn!("Caption-track fallback error for {}: {}", video_id, err);
        }
    }

    TranscriptResult::unavailable()
}

/// Parse a timedtext XML document (`<transcript><text start=".." dur="..">`)
/// into ordered segments.
pub(crate) fn parse_timedtext(xml: &str) -> Result<Vec<Segment>> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut segments = Vec::new();
    let mut current: Option<Segment> = None;

    loop {
        match reader.read_event()? {
            Event::Start(ref e) if e.name().as_ref() == b"text" => {
                let mut start = 0.0;
                let mut duration = 0.0;

                for attr in e.attributes() {
                    let attr = attr?;
                    let value = attr.unescape_value()?;
                    match attr.key.as_ref() {
                        b"start" => start = value.parse().unwrap_or(0.0),
                        b"dur" => duration = value.parse().unwrap_or(0.0),
                        _ => {}
                    }
                }

                current = Some(Segment {
                    text: String::new(),
                    start,
                    duration,
                });
            }
            Event::Text(ref e) => {
                if let Some(segment) = current.as_mut() {
                    let text = e.unescape()?;
                    if !segment.text.is_empty() {
                        segment.text.push(' ');
                    }
                    segment.text.push_str(text.trim());
                }
            }
            Event::End(ref e) if e.name().as_ref() == b"text" => {
                if let Some(segment) = current.take() {
                    if !segment.text.is_empty() {
                        segments.push(segment);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct FakeApi {
        outcome: std::result::Result<Vec<Segment>, &'static str>,
    }

    #[async_trait]
    impl TranscriptApi for FakeApi {
        async fn fetch_segments(
            &self,
            video_id: &str,
            _languages: &[String],
        ) -> std::result::Result<Vec<Segment>, TranscriptError> {
            match &self.outcome {
                Ok(segments) => Ok(segments.clone()),
                Err(kind) => {
                    let kind: &str = kind;
                    Err(match kind {
                        "disabled" => TranscriptError::Disabled(video_id.to_string()),
                        "not-found" => TranscriptError::NotFound(video_id.to_string()),
                        other => TranscriptError::Other(anyhow!("{}", other)),
                    })
                }
            }
        }
    }

    struct FakeCaptions {
        outcome: Result<Option<String>>,
    }

    #[async_trait]
    impl CaptionSource for FakeCaptions {
        async fn caption_text(
            &self,
            _watch_url: &str,
            _languages: &[String],
        ) -> Result<Option<String>> {
            match &self.outcome {
                Ok(text) => Ok(text.clone()),
                Err(err) => Err(anyhow!("{}", err)),
            }
        }
    }

    fn langs() -> Vec<String> {
        vec!["en".to_string(), "ta".to_string()]
    }

    fn segment(text: &str) -> Segment {
        Segment {
            text: text.to_string(),
            start: 0.0,
            duration: 1.0,
        }
    }

    #[test]
    fn test_extract_video_id() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=120"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?list=abc&v=xyz123"),
            Some("xyz123".to_string())
        );
    }

    #[test]
    fn test_extract_video_id_missing() {
        assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXcQ"), None);
        assert_eq!(extract_video_id("https://www.youtube.com/watch"), None);
        assert_eq!(extract_video_id(""), None);
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(
            watch_url("dQw4w9WgXcQ"),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[tokio::test]
    async fn test_resolve_joins_segments_with_spaces() {
        let primary = FakeApi {
            outcome: Ok(vec![segment("a"), segment("b")]),
        };
        let fallback = FakeCaptions { outcome: Ok(None) };

        let result = resolve(&watch_url("abc123"), &primary, &fallback, &langs()).await;

        assert_eq!(result.text, "a b");
        assert_eq!(result.provenance, Provenance::Primary);
    }

    #[tokio::test]
    async fn test_resolve_falls_back_on_disabled() {
        let primary = FakeApi {
            outcome: Err("disabled"),
        };
        let fallback = FakeCaptions {
            outcome: Ok(Some("fallback text".to_string())),
        };

        let result = resolve(&watch_url("abc123"), &primary, &fallback, &langs()).await;

        assert_eq!(result.text, "fallback text");
        assert_eq!(result.provenance, Provenance::Fallback);
    }

    #[tokio::test]
    async fn test_resolve_sentinel_when_both_providers_miss() {
        let primary = FakeApi {
            outcome: Err("disabled"),
        };
        let fallback = FakeCaptions { outcome: Ok(None) };

        let result = resolve(&watch_url("abc123"), &primary, &fallback, &langs()).await;

        assert_eq!(result.text, NO_TRANSCRIPT);
        assert_eq!(result.provenance, Provenance::None);
    }

    #[tokio::test]
    async fn test_resolve_unexpected_primary_error_still_falls_back() {
        let primary = FakeApi {
            outcome: Err("connection reset"),
        };
        let fallback = FakeCaptions {
            outcome: Ok(Some("recovered".to_string())),
        };

        let result = resolve(&watch_url("abc123"), &primary, &fallback, &langs()).await;

        assert_eq!(result.text, "recovered");
        assert_eq!(result.provenance, Provenance::Fallback);
    }

    #[tokio::test]
    async fn test_resolve_fallback_error_yields_sentinel() {
        let primary = FakeApi {
            outcome: Err("not-found"),
        };
        let fallback = FakeCaptions {
            outcome: Err(anyhow!("caption endpoint unreachable")),
        };

        let result = resolve(&watch_url("abc123"), &primary, &fallback, &langs()).await;

        assert_eq!(result, TranscriptResult::unavailable());
    }

    #[tokio::test]
    async fn test_resolve_short_circuits_without_video_id() {
        // Providers would panic if contacted; neither should be.
        struct PanicApi;

        #[async_trait]
        impl TranscriptApi for PanicApi {
            async fn fetch_segments(
                &self,
                _video_id: &str,
                _languages: &[String],
            ) -> std::result::Result<Vec<Segment>, TranscriptError> {
                panic!("primary provider contacted without a video id");
            }
        }

        struct PanicCaptions;

        #[async_trait]
        impl CaptionSource for PanicCaptions {
            async fn caption_text(
                &self,
                _watch_url: &str,
                _languages: &[String],
            ) -> Result<Option<String>> {
                panic!("fallback provider contacted without a video id");
            }
        }

        let result = resolve(
            "https://www.youtube.com/playlist?list=abc",
            &PanicApi,
            &PanicCaptions,
            &langs(),
        )
        .await;

        assert_eq!(result, TranscriptResult::unavailable());
    }

    #[test]
    fn test_parse_timedtext() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<transcript>
  <text start="0.5" dur="2.1">hello world</text>
  <text start="2.6" dur="1.4">it&#39;s a test</text>
</transcript>"#;

        let segments = parse_timedtext(xml).unwrap();

        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].text, "hello world");
        assert_eq!(segments[0].start, 0.5);
        assert_eq!(segments[0].duration, 2.1);
        assert_eq!(segments[1].text, "it's a test");
    }

    #[test]
    fn test_parse_timedtext_skips_empty_segments() {
        let xml = r#"<transcript><text start="0" dur="1"></text><text start="1" dur="1">kept</text></transcript>"#;

        let segments = parse_timedtext(xml).unwrap();

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "kept");
    }
}
