//! Tuberr binary entry point
//!
//! One invocation is one run: fetch the channel listing, drive the
//! pipeline over it, and report a summary. `--dry-run` stops before the
//! executor; `--status` prints library and ledger statistics instead.

mod cli;

use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use walkdir::WalkDir;

use tuberr::config::Config;
use tuberr::services::{
    DedupLedger, FilterEngine, MetadataSink, NfoWriter, PathResolver, Pipeline, RecordOutcome,
    YtDlpExecutor,
};
use tuberr::sources::{ChannelLister, RssChannelLister};

use crate::cli::CliOptions;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "webm", "m4a", "mp3", "flv"];

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let options = CliOptions::from_args();
    let config = Config::load(&options.config_path)?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tuberr=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(channel = %config.channel.url, "Starting tuberr");

    if options.status {
        return print_status(&config);
    }

    let mut ledger = DedupLedger::open(config.ledger_path())?;

    let mut lister = RssChannelLister::for_channel(&config.channel.url)?;
    let max_videos = options.max_videos.unwrap_or(config.channel.max_videos);
    let records = lister.recent_videos(max_videos)?;

    let filter = FilterEngine::new(&config.filters, Utc::now());
    let resolver = PathResolver::new(
        config.base_directory(),
        config.download.output_extension.clone(),
        config.storage.organize_by_season,
    );
    let mut executor = YtDlpExecutor::new(config.download.subtitle_languages.clone());
    let mut nfo = NfoWriter;
    let metadata: Option<&mut dyn MetadataSink> = config
        .storage
        .generate_metadata
        .then_some(&mut nfo as &mut dyn MetadataSink);

    let mut pipeline = Pipeline::new(
        filter,
        &mut ledger,
        resolver,
        &mut executor,
        metadata,
        None,
        config.download.quality.clone(),
        options.dry_run,
    );

    let summary = pipeline.run(&records)?;

    println!("Run complete:");
    println!("  fetched:    {}", summary.fetched);
    println!("  filtered:   {}", summary.filtered);
    println!("  duplicates: {}", summary.duplicates);
    if options.dry_run {
        let would = summary
            .outcomes
            .iter()
            .filter(|(_, o)| matches!(o, RecordOutcome::WouldDownload(_)))
            .count();
        println!("  would download: {would}");
        for (id, outcome) in &summary.outcomes {
            if let RecordOutcome::WouldDownload(dest) = outcome {
                println!("    {id} -> {}", dest.display());
            }
        }
    } else {
        println!("  downloaded: {}", summary.downloaded);
        println!("  failed:     {}", summary.failed);
    }

    if summary.failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Print library statistics: file count, total size, ledger entries.
fn print_status(config: &Config) -> anyhow::Result<()> {
    let base = config.base_directory();
    let ledger = DedupLedger::open(config.ledger_path())?;

    let mut files = 0usize;
    let mut bytes = 0u64;
    for entry in WalkDir::new(&base).into_iter().filter_map(Result::ok) {
        let is_video = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| VIDEO_EXTENSIONS.contains(&e.to_lowercase().as_str()));
        if entry.file_type().is_file() && is_video {
            files += 1;
            bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
        }
    }

    println!("Library: {}", base.display());
    println!("  videos:         {files}");
    println!("  total size:     {:.1} MB", bytes as f64 / (1024.0 * 1024.0));
    println!("  ledger entries: {}", ledger.len());
    Ok(())
}
