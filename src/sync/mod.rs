use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::config::Config;
use crate::store::{self, mongo::MongoStore, supabase::SupabaseStore, VideoRecord, VideoStore};
use crate::transcript::{self, api::CaptionsApi, captions::CaptionTracks, CaptionSource, TranscriptApi};
use crate::youtube::{LikedVideos, YoutubeDataApi};
use crate::Result;

/// Counts for one completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub listed: usize,
    pub skipped: usize,
    pub recorded: usize,
    pub failed: usize,
}

/// Single-pass sync over one page of liked videos. All collaborators are
/// injected, so each can be substituted with a fake.
pub struct SyncPipeline {
    config: Config,
    youtube: Box<dyn LikedVideos>,
    transcript_api: Box<dyn TranscriptApi>,
    caption_source: Box<dyn CaptionSource>,
    primary_store: Box<dyn VideoStore>,
    secondary_store: Box<dyn VideoStore>,
    dry_run: bool,
    show_progress: bool,
}

impl SyncPipeline {
    /// Wire up the real collaborators: YouTube API from the persisted token,
    /// both transcript providers, and both stores.
    pub async fn new(config: Config) -> Result<Self> {
        let youtube = YoutubeDataApi::from_token_file(&config.app.token_path)?;
        let transcript_api = CaptionsApi::new()?;
        let caption_source = CaptionTracks::new()?;
        let primary_store = MongoStore::connect(&config.stores.mongo_uri).await?;
        let secondary_store =
            SupabaseStore::new(&config.stores.supabase_url, &config.stores.supabase_key)?;

        Ok(Self::with_collaborators(
            config,
            Box::new(youtube),
            Box::new(transcript_api),
            Box::new(caption_source),
            Box::new(primary_store),
            Box::new(secondary_store),
        ))
    }

    /// Assemble a pipeline from explicit collaborators.
    pub fn with_collaborators(
        config: Config,
        youtube: Box<dyn LikedVideos>,
        transcript_api: Box<dyn TranscriptApi>,
        caption_source: Box<dyn CaptionSource>,
        primary_store: Box<dyn VideoStore>,
        secondary_store: Box<dyn VideoStore>,
    ) -> Self {
        Self {
            config,
            youtube,
            transcript_api,
            caption_source,
            primary_store,
            secondary_store,
            dry_run: false,
            show_progress: false,
        }
    }

    /// Resolve and build records without writing to either store.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// One pass: list the first page of liked videos, skip the ones already
    /// recorded in either store, record the rest, pacing between videos.
    pub async fn run(&self) -> Result<SyncSummary> {
        let videos = self
            .youtube
            .list_liked(self.config.app.max_results)
            .await?;

        tracing::info!("Found {} liked videos to process", videos.len());

        let progress = if self.show_progress {
            let bar = ProgressBar::new(videos.len() as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                    )
                    .unwrap(),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        let delay = Duration::from_secs(self.config.app.delay_secs);
        let mut summary = SyncSummary {
            listed: videos.len(),
            ..Default::default()
        };

        for video in &videos {
            progress.set_message(video.title.clone());

            let recorded = store::already_recorded(
                &video.video_id,
                self.primary_store.as_ref(),
                self.secondary_store.as_ref(),
            )
            .await?;

            if recorded {
                tracing::info!("Skipping existing video: {}", video.video_id);
                summary.skipped += 1;
                progress.inc(1);
                continue;
            }

            let url = transcript::watch_url(&video.video_id);
            let transcript = transcript::resolve(
                &url,
                self.transcript_api.as_ref(),
                self.caption_source.as_ref(),
                &self.config.app.languages,
            )
            .await;

            tracing::debug!(
                "Transcript for {} resolved via {}",
                video.video_id,
                transcript.provenance
            );

            let record = VideoRecord::new(video, &transcript);

            if self.dry_run {
                tracing::info!("[dry-run] Would record video: {}", record.title);
            } else {
                let written = store::write_both(
                    &record,
                    self.primary_store.as_ref(),
                    self.secondary_store.as_ref(),
                )
                .await;

                match written {
                    Ok(()) => {
                        tracing::info!("Successfully recorded video: {}", record.title);
                        summary.recorded += 1;
                    }
                    Err(err) => {
                        tracing::warn!("Error recording video {}: {:#}", record.title, err);
                        summary.failed += 1;
                    }
                }
            }

            // Fixed pacing to respect provider rate limits; skipped videos
            // don't pay it.
            tokio::time::sleep(delay).await;
            progress.inc(1);
        }

        progress.finish_and_clear();

        Ok(summary)
    }
}
