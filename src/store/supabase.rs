use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;

use super::{VideoRecord, VideoStore};
use crate::Result;

const TABLE: &str = "youtube_videos";

/// Store B: Supabase, spoken to over the PostgREST API. The row payload is
/// built from the typed record, so no Mongo-internal `_id` ever reaches it.
pub struct SupabaseStore {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseStore {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, TABLE)
    }
}

#[async_trait]
impl VideoStore for SupabaseStore {
    fn name(&self) -> &'static str {
        "supabase"
    }

    async fn contains(&self, video_id: &str) -> Result<bool> {
        let response = self
            .http
            .get(self.table_url())
            .query(&[
                ("select", "video_id"),
                ("video_id", &format!("eq.{}", video_id)),
            ])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .context("Supabase select request failed")?
            .error_for_status()
            .context("Supabase select returned an error status")?;

        let rows: Vec<Value> = response
            .json()
            .await
            .context("Failed to parse Supabase select response")?;

        Ok(!rows.is_empty())
    }

    async fn insert(&self, record: &VideoRecord) -> Result<()> {
        self.http
            .post(self.table_url())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await
            .context("Supabase insert request failed")?
            .error_for_status()
            .context("Supabase insert returned an error status")?;

        Ok(())
    }
}
