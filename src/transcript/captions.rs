use anyhow::Context;
use async_trait::async_trait;
use serde_json::{json, Value};

use super::{extract_video_id, parse_timedtext, CaptionSource, Segment};
use crate::Result;

const PLAYER_ENDPOINT: &str = "https://www.youtube.com/youtubei/v1/player";
const WEB_CLIENT_VERSION: &str = "2.20240101.00.00";

/// Fallback transcript provider. Asks the Innertube player endpoint for the
/// video's caption tracks and generates SRT-style subtitle text from the
/// first track matching the language preference order.
pub struct CaptionTracks {
    http: reqwest::Client,
}

impl CaptionTracks {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http })
    }

    async fn player_response(&self, video_id: &str) -> Result<Value> {
        let body = json!({
            "context": {
                "client": {
                    "clientName": "WEB",
                    "clientVersion": WEB_CLIENT_VERSION,
                }
            },
            "videoId": video_id,
        });

        let response = self
            .http
            .post(PLAYER_ENDPOINT)
            .json(&body)
            .send()
            .await
            .context("Player endpoint request failed")?
            .error_for_status()
            .context("Player endpoint returned an error status")?;

        response
            .json()
            .await
            .context("Failed to parse player response")
    }

    async fn track_segments(&self, base_url: &str) -> Result<Vec<Segment>> {
        let xml = self
            .http
            .get(base_url)
            .send()
            .await
            .context("Caption track request failed")?
            .error_for_status()
            .context("Caption track returned an error status")?
            .text()
            .await
            .context("Failed to read caption track body")?;

        parse_timedtext(&xml)
    }
}

#[async_trait]
impl CaptionSource for CaptionTracks {
    async fn caption_text(&self, watch_url: &str, languages: &[String]) -> Result<Option<String>> {
        let video_id = extract_video_id(watch_url)
            .with_context(|| format!("No video id in URL: {}", watch_url))?;

        let player = self.player_response(&video_id).await?;

        let tracks = match player
            .pointer("/captions/playerCaptionsTracklistRenderer/captionTracks")
            .and_then(Value::as_array)
        {
            Some(tracks) => tracks,
            None => return Ok(None),
        };

        // First available track in the fixed language order wins.
        for lang in languages {
            let track = tracks
                .iter()
                .find(|track| track["languageCode"].as_str() == Some(lang.as_str()));

            if let Some(track) = track {
                let base_url = track["baseUrl"]
                    .as_str()
                    .context("Caption track without a baseUrl")?;

                let segments = self.track_segments(base_url).await?;
                return Ok(Some(generate_srt(&segments)));
            }
        }

        Ok(None)
    }
}

/// Render segments as SRT subtitle text.
pub(crate) fn generate_srt(segments: &[Segment]) -> String {
    let mut srt = String::new();

    for (index, segment) in segments.iter().enumerate() {
        if index > 0 {
            srt.push('\n');
        }
        srt.push_str(&format!(
            "{}\n{} --> {}\n{}\n",
            index + 1,
            srt_timestamp(segment.start),
            srt_timestamp(segment.start + segment.duration),
            segment.text
        ));
    }

    srt
}

fn srt_timestamp(seconds: f64) -> String {
    let total_millis = (seconds * 1000.0).round() as u64;
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;

    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}
