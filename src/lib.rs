//! Liked Sync - a Rust CLI tool that archives your liked YouTube videos
//!
//! This library lists the authenticated user's liked videos, resolves a
//! transcript for each one via a primary captions API with a fallback source,
//! and writes new records into two stores (MongoDB and Supabase).

pub mod cli;
pub mod config;
pub mod store;
pub mod sync;
pub mod transcript;
pub mod youtube;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use store::VideoRecord;
pub use sync::SyncPipeline;
pub use transcript::{Provenance, TranscriptResult};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Distinguishable transcript-provider conditions. The first three are the
/// officially expected ones and trigger a silent fallback; anything else is
/// logged before falling back.
#[derive(thiserror::Error, Debug)]
pub enum TranscriptError {
    #[error("transcripts are disabled for video {0}")]
    Disabled(String),

    #[error("no transcript found for video {0} in the requested languages")]
    NotFound(String),

    #[error("could not retrieve transcript for video {0}: {1}")]
    CouldNotRetrieve(String, String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TranscriptError {
    /// True for the conditions the primary provider is documented to raise.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            TranscriptError::Disabled(_)
                | TranscriptError::NotFound(_)
                | TranscriptError::CouldNotRetrieve(_, _)
        )
    }
}
