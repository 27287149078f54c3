use anyhow::Context;
use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::{Client, Collection};

use super::{VideoRecord, VideoStore};
use crate::Result;

const DATABASE: &str = "youtube_liked_videos";
const COLLECTION: &str = "videos";

/// Store A: MongoDB document store.
pub struct MongoStore {
    collection: Collection<Document>,
}

impl MongoStore {
    pub async fn connect(uri: &str) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .context("Failed to connect to MongoDB")?;

        Ok(Self {
            collection: client.database(DATABASE).collection(COLLECTION),
        })
    }
}

#[async_trait]
impl VideoStore for MongoStore {
    fn name(&self) -> &'static str {
        "mongodb"
    }

    async fn contains(&self, video_id: &str) -> Result<bool> {
        let found = self
            .collection
            .find_one(doc! { "video_id": video_id }, None)
            .await
            .context("MongoDB find_one failed")?;

        Ok(found.is_some())
    }

    async fn insert(&self, record: &VideoRecord) -> Result<()> {
        let document =
            mongodb::bson::to_document(record).context("Failed to serialize record to BSON")?;

        self.collection
            .insert_one(document, None)
            .await
            .context("MongoDB insert_one failed")?;

        Ok(())
    }
}
