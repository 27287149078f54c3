use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod mongo;
pub mod supabase;

use crate::transcript::{watch_url, TranscriptResult};
use crate::youtube::VideoSnippet;
use crate::Result;

/// One archived video. Built once per new video, never mutated, written to
/// both stores as two independent copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    pub title: String,
    pub published_at: String,
    pub description: String,
    pub youtube_url: String,
    pub added_at: DateTime<Utc>,
    pub transcript: String,
}

impl VideoRecord {
    /// Assemble a record from API metadata and a resolved transcript,
    /// stamping the creation time.
    pub fn new(snippet: &VideoSnippet, transcript: &TranscriptResult) -> Self {
        Self {
            video_id: snippet.video_id.clone(),
            title: snippet.title.clone(),
            published_at: snippet.published_at.clone(),
            description: snippet.description.clone(),
            youtube_url: watch_url(&snippet.video_id),
            added_at: Utc::now(),
            transcript: transcript.text.clone(),
        }
    }
}

/// Minimal persistence surface shared by both stores.
#[async_trait]
pub trait VideoStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether a record with this video id is present.
    async fn contains(&self, video_id: &str) -> Result<bool>;

    /// Insert one record.
    async fn insert(&self, record: &VideoRecord) -> Result<()>;
}

/// OR-existence over both stores. A primary-store error propagates and ends
/// the run; a secondary-store error is logged and folded to "absent", which
/// accepts a duplication risk rather than skipping a video silently.
pub async fn already_recorded(
    video_id: &str,
    primary: &dyn VideoStore,
    secondary: &dyn VideoStore,
) -> Result<bool> {
    let in_primary = primary.contains(video_id).await?;

    let in_secondary = match secondary.contains(video_id).await {
        Ok(found) => found,
        Err(err) => {
            tracing::warn!(
                "{} existence check failed for {}: {:#}",
                secondary.name(),
                video_id,
                err
            );
            false
        }
    };

    Ok(in_primary || in_secondary)
}

/// Best-effort dual write: primary first, then secondary. A primary failure
/// skips the secondary; neither failure is compensated. The caller owns the
/// failure boundary and logs with the record title.
pub async fn write_both(
    record: &VideoRecord,
    primary: &dyn VideoStore,
    secondary: &dyn VideoStore,
) -> Result<()> {
    primary.insert(record).await?;
    secondary.insert(record).await?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use anyhow::anyhow;
    use std::sync::{Arc, Mutex};

    /// In-memory store for tests; optionally errors on either operation.
    pub struct FakeStore {
        pub label: &'static str,
        pub known: Vec<String>,
        pub fail_contains: bool,
        pub fail_insert: bool,
        pub inserted: Arc<Mutex<Vec<String>>>,
    }

    impl FakeStore {
        pub fn new(label: &'static str) -> Self {
            Self {
                label,
                known: Vec::new(),
                fail_contains: false,
                fail_insert: false,
                inserted: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn with_known(mut self, video_ids: &[&str]) -> Self {
            self.known = video_ids.iter().map(|id| id.to_string()).collect();
            self
        }
    }

    #[async_trait]
    impl VideoStore for FakeStore {
        fn name(&self) -> &'static str {
            self.label
        }

        async fn contains(&self, video_id: &str) -> Result<bool> {
            if self.fail_contains {
                return Err(anyhow!("{} query failed", self.label));
            }
            Ok(self.known.iter().any(|known| known == video_id))
        }

        async fn insert(&self, record: &VideoRecord) -> Result<()> {
            if self.fail_insert {
                return Err(anyhow!("{} insert failed", self.label));
            }
            self.inserted.lock().unwrap().push(record.video_id.clone());
            Ok(())
        }
    }
}
