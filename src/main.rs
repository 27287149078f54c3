use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use liked_sync::cli::{Cli, Commands};
use liked_sync::config::{Config, StoreConfig};
use liked_sync::sync::SyncPipeline;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "liked_sync=debug"
    } else {
        "liked_sync=info"
    };

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Pick up a local .env before resolving configuration
    dotenvy::dotenv().ok();

    match cli.command {
        Commands::Sync {
            max_results,
            delay,
            dry_run,
        } => {
            let mut config = Config::load().await?;

            if let Some(max_results) = max_results {
                config.app.max_results = max_results;
            }
            if let Some(delay) = delay {
                config.app.delay_secs = delay;
            }

            let pipeline = SyncPipeline::new(config)
                .await?
                .with_dry_run(dry_run)
                .with_progress(!cli.quiet);

            // Run errors are logged and the process ends normally; there is
            // no distinguished exit code.
            match pipeline.run().await {
                Ok(summary) => {
                    println!(
                        "Sync complete: {} listed, {} skipped, {} recorded, {} failed",
                        summary.listed, summary.skipped, summary.recorded, summary.failed
                    );
                }
                Err(err) => {
                    tracing::error!("Sync run failed: {:#}", err);
                }
            }
        }
        Commands::Config { show } => {
            if show {
                let mut config = Config::load_without_stores().await?;
                if let Ok(stores) = StoreConfig::from_env() {
                    config.stores = stores;
                }
                config.display();
            } else {
                println!("Edit the config file manually:");
                println!("  {}", Config::config_file_hint());
            }
        }
        Commands::Providers => {
            println!("Transcript providers (tried in order):");
            println!("  • Captions API (watch-page caption tracks, timedtext)");
            println!("  • Caption-track fallback (Innertube player endpoint)");
            println!("Store backends:");
            println!("  • MongoDB  (database: youtube_liked_videos, collection: videos)");
            println!("  • Supabase (table: youtube_videos)");
        }
    }

    Ok(())
}
