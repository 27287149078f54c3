use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use super::{parse_timedtext, watch_url, Segment, TranscriptApi};
use crate::TranscriptError;

const CAPTIONS_MARKER: &str = r#""captions":"#;
const VIDEO_DETAILS_MARKER: &str = r#","videoDetails""#;

/// Primary transcript provider. Discovers caption tracks on the watch page
/// and fetches the timedtext document for the first preferred language.
pub struct CaptionsApi {
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionsBlock {
    player_captions_tracklist_renderer: Option<TracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<CaptionTrack>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTrack {
    base_url: String,
    language_code: String,
}

impl CaptionsApi {
    pub fn new() -> crate::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http })
    }

    async fn fetch_watch_page(&self, video_id: &str) -> Result<String, TranscriptError> {
        let response = self
            .http
            .get(watch_url(video_id))
            .send()
            .await
            .map_err(|e| TranscriptError::CouldNotRetrieve(video_id.to_string(), e.to_string()))?;

        if !response.status().is_success() {
            return Err(TranscriptError::CouldNotRetrieve(
                video_id.to_string(),
                format!("watch page returned HTTP {}", response.status()),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| TranscriptError::CouldNotRetrieve(video_id.to_string(), e.to_string()))
    }

    async fn fetch_track_segments(
        &self,
        video_id: &str,
        track: &CaptionTrack,
    ) -> Result<Vec<Segment>, TranscriptError> {
        let response = self
            .http
            .get(&track.base_url)
            .send()
            .await
            .map_err(|e| TranscriptError::CouldNotRetrieve(video_id.to_string(), e.to_string()))?;

        if !response.status().is_success() {
            return Err(TranscriptError::CouldNotRetrieve(
                video_id.to_string(),
                format!("timedtext returned HTTP {}", response.status()),
            ));
        }

        let xml = response
            .text()
            .await
            .map_err(|e| TranscriptError::CouldNotRetrieve(video_id.to_string(), e.to_string()))?;

        parse_timedtext(&xml).map_err(TranscriptError::Other)
    }
}

/// Locate the captions JSON block embedded in the watch page.
fn extract_caption_tracks(html: &str, video_id: &str) -> Result<Vec<CaptionTrack>, TranscriptError> {
    let start = match html.find(CAPTIONS_MARKER) {
        Some(pos) => pos + CAPTIONS_MARKER.len(),
        None => {
            // Page loaded but carries no captions block at all.
            return Err(TranscriptError::Disabled(video_id.to_string()));
        }
    };

    let rest = &html[start..];
    let end = rest.find(VIDEO_DETAILS_MARKER).ok_or_else(|| {
        TranscriptError::CouldNotRetrieve(
            video_id.to_string(),
            "malformed captions block on watch page".to_string(),
        )
    })?;

    let block: CaptionsBlock = serde_json::from_str(rest[..end].trim()).map_err(|e| {
        TranscriptError::CouldNotRetrieve(
            video_id.to_string(),
            format!("failed to parse captions block: {}", e),
        )
    })?;

    let tracks = block
        .player_captions_tracklist_renderer
        .map(|renderer| renderer.caption_tracks)
        .unwrap_or_default();

    if tracks.is_empty() {
        return Err(TranscriptError::Disabled(video_id.to_string()));
    }

    Ok(tracks)
}

fn pick_track<'a>(
    tracks: &'a [CaptionTrack],
    languages: &[String],
) -> Option<&'a CaptionTrack> {
    languages
        .iter()
        .find_map(|lang| tracks.iter().find(|track| &track.language_code == lang))
}

#[async_trait]
impl TranscriptApi for CaptionsApi {
    async fn fetch_segments(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> Result<Vec<Segment>, TranscriptError> {
        let html = self.fetch_watch_page(video_id).await?;
        let tracks = extract_caption_tracks(&html, video_id)?;

        let track = pick_track(&tracks, languages)
            .ok_or_else(|| TranscriptError::NotFound(video_id.to_string()))?;

        self.fetch_track_segments(video_id, track).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watch_page_with_tracks() -> String {
        r#"var ytInitialPlayerResponse = {"playabilityStatus":{"status":"OK"},"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"https://example.com/tt?lang=ta","languageCode":"ta"},{"baseUrl":"https://example.com/tt?lang=en","languageCode":"en"}]}},"videoDetails":{"videoId":"abc"}}"#
            .to_string()
    }

    #[test]
    fn test_extract_caption_tracks() {
        let tracks = extract_caption_tracks(&watch_page_with_tracks(), "abc").unwrap();

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].language_code, "ta");
        assert_eq!(tracks[1].base_url, "https://example.com/tt?lang=en");
    }

    #[test]
    fn test_extract_caption_tracks_disabled_without_captions_block() {
        let html = r#"{"playabilityStatus":{"status":"OK"},"videoDetails":{}}"#;

        let err = extract_caption_tracks(html, "abc").unwrap_err();

        assert!(matches!(err, TranscriptError::Disabled(_)));
        assert!(err.is_expected());
    }

    #[test]
    fn test_extract_caption_tracks_disabled_when_track_list_empty() {
        let html = r#"{"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[]}},"videoDetails":{}}"#;

        let err = extract_caption_tracks(html, "abc").unwrap_err();

        assert!(matches!(err, TranscriptError::Disabled(_)));
    }

    #[test]
    fn test_extract_caption_tracks_malformed_block() {
        let html = r#"{"captions":{"playerCaptionsTracklistRenderer"...garbage"#;

        let err = extract_caption_tracks(html, "abc").unwrap_err();

        assert!(matches!(err, TranscriptError::CouldNotRetrieve(_, _)));
    }

    #[test]
    fn test_pick_track_honors_language_order() {
        let tracks = extract_caption_tracks(&watch_page_with_tracks(), "abc").unwrap();
        let languages = vec!["en".to_string(), "ta".to_string()];

        let track = pick_track(&tracks, &languages).unwrap();

        assert_eq!(track.language_code, "en");
    }

    #[test]
    fn test_pick_track_none_for_unlisted_language() {
        let tracks = extract_caption_tracks(&watch_page_with_tracks(), "abc").unwrap();
        let languages = vec!["fr".to_string()];

        assert!(pick_track(&tracks, &languages).is_none());
    }
}
