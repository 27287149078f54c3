use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "likedsync",
    about = "Liked Sync - Archive your liked YouTube videos with transcripts into MongoDB and Supabase",
    version,
    long_about = "A CLI tool that lists your liked YouTube videos, resolves a transcript for each one (captions API first, caption-track fallback second), and records every new video into MongoDB and Supabase. Videos already present in either store are skipped."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch liked videos and record the new ones in both stores
    Sync {
        /// Maximum number of liked videos to request (first page only)
        #[arg(long, value_name = "COUNT")]
        max_results: Option<u32>,

        /// Seconds to pause after each processed video
        #[arg(long, value_name = "SECS")]
        delay: Option<u64>,

        /// Resolve transcripts and build records, but skip all store writes
        #[arg(long)]
        dry_run: bool,
    },

    /// Show or manage configuration
    Config {
        /// Show current configuration (secrets redacted)
        #[arg(short, long)]
        show: bool,
    },

    /// List transcript providers and store backends
    Providers,
}
