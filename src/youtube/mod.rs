use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;

use crate::Result;

const VIDEOS_ENDPOINT: &str = "https://www.googleapis.com/youtube/v3/videos";

/// Metadata for one liked video, as returned by the listing API.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoSnippet {
    pub video_id: String,
    pub title: String,
    pub published_at: String,
    pub description: String,
}

/// Listing collaborator: up to one page of the user's liked videos.
#[async_trait]
pub trait LikedVideos: Send + Sync {
    async fn list_liked(&self, max_results: u32) -> Result<Vec<VideoSnippet>>;
}

/// YouTube Data API v3 client. Token acquisition and refresh happen outside
/// this tool; we consume the bearer token persisted by that flow.
pub struct YoutubeDataApi {
    http: reqwest::Client,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    published_at: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct TokenFile {
    token: String,
}

impl YoutubeDataApi {
    pub fn new(access_token: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http, access_token })
    }

    /// Build a client from the token file persisted by the OAuth flow.
    pub fn from_token_file(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path)
            .with_context(|| format!("Failed to read token file: {}", path.display()))?;

        let token_file: TokenFile =
            serde_json::from_str(&content).context("Failed to parse token file")?;

        Self::new(token_file.token)
    }
}

#[async_trait]
impl LikedVideos for YoutubeDataApi {
    async fn list_liked(&self, max_results: u32) -> Result<Vec<VideoSnippet>> {
        let response = self
            .http
            .get(VIDEOS_ENDPOINT)
            .query(&[
                ("part", "snippet"),
                ("myRating", "like"),
                ("maxResults", &max_results.to_string()),
            ])
            .bearer_auth(&self.access_token)
            .send()
            .await
            .context("YouTube API request failed")?
            .error_for_status()
            .context("YouTube API returned an error status")?;

        let listing: VideoListResponse = response
            .json()
            .await
            .context("Failed to parse YouTube API response")?;

        Ok(listing
            .items
            .into_iter()
            .map(|item| VideoSnippet {
                video_id: item.id,
                title: item.snippet.title,
                published_at: item.snippet.published_at,
                description: item.snippet.description,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_video_list_response() {
        let body = r#"{
            "items": [
                {
                    "id": "abc123",
                    "snippet": {
                        "title": "A video",
                        "publishedAt": "2024-01-15T10:00:00Z",
                        "description": "About something"
                    }
                },
                {
                    "id": "def456",
                    "snippet": {
                        "title": "No description",
                        "publishedAt": "2024-02-01T08:30:00Z"
                    }
                }
            ]
        }"#;

        let listing: VideoListResponse = serde_json::from_str(body).unwrap();

        assert_eq!(listing.items.len(), 2);
        assert_eq!(listing.items[0].id, "abc123");
        assert_eq!(listing.items[0].snippet.title, "A video");
        // Missing description defaults to empty, not an error.
        assert_eq!(listing.items[1].snippet.description, "");
    }

    #[test]
    fn test_parse_empty_listing() {
        let listing: VideoListResponse = serde_json::from_str("{}").unwrap();
        assert!(listing.items.is_empty());
    }

    #[test]
    fn test_parse_token_file() {
        let token: TokenFile =
            serde_json::from_str(r#"{"token": "ya29.secret", "refresh_token": "1//r"}"#).unwrap();
        assert_eq!(token.token, "ya29.secret");
    }
}
