//! Single-pass processing pipeline
//!
//! Drives one run over a fetched video listing, record by record and in
//! listing order: filter, dedup lookup, identity resolution, path
//! resolution, then the download executor. The ledger is appended to
//! only on executor success, so failed records are retried by a future
//! run. Nothing here suspends; all I/O is synchronous.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, error, info, warn};

use crate::media::{EpisodeIdentity, VideoRecord};
use crate::services::ledger::{DedupLedger, LedgerError};
use crate::services::organizer::PathResolver;
use crate::services::title_parser;
use crate::services::video_filter::{FilterEngine, FilterVerdict, RejectReason};

/// What the pipeline hands to the download executor for one video
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub video_id: String,
    pub url: String,
    pub dest: PathBuf,
    pub quality: String,
}

/// Performs the actual media download. External collaborator; the
/// pipeline only consumes its success/failure signal.
pub trait DownloadExecutor {
    fn download(&mut self, request: &DownloadRequest) -> Result<()>;
}

/// Writes companion metadata next to a downloaded file. Outcome does not
/// affect ledger recording.
pub trait MetadataSink {
    fn write(&mut self, record: &VideoRecord, identity: &EpisodeIdentity, video_path: &Path)
    -> Result<()>;
}

/// Fetches subtitles for a downloaded file. Outcome does not affect
/// ledger recording.
pub trait SubtitleFetcher {
    fn fetch(&mut self, record: &VideoRecord, video_path: &Path) -> Result<()>;
}

/// Outcome of one record in the run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Downloaded(PathBuf),
    WouldDownload(PathBuf),
    Duplicate,
    Filtered(RejectReason),
    Failed,
}

/// Aggregate counters and per-record outcomes for a run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub fetched: usize,
    pub filtered: usize,
    pub duplicates: usize,
    pub downloaded: usize,
    pub failed: usize,
    pub outcomes: Vec<(String, RecordOutcome)>,
}

/// One run over a channel listing. Owns the per-run state (filter
/// cutoff, counters); construct a fresh pipeline for every run.
pub struct Pipeline<'a> {
    filter: FilterEngine,
    ledger: &'a mut DedupLedger,
    resolver: PathResolver,
    executor: &'a mut dyn DownloadExecutor,
    metadata: Option<&'a mut dyn MetadataSink>,
    subtitles: Option<&'a mut dyn SubtitleFetcher>,
    quality: String,
    dry_run: bool,
}

impl<'a> Pipeline<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        filter: FilterEngine,
        ledger: &'a mut DedupLedger,
        resolver: PathResolver,
        executor: &'a mut dyn DownloadExecutor,
        metadata: Option<&'a mut dyn MetadataSink>,
        subtitles: Option<&'a mut dyn SubtitleFetcher>,
        quality: impl Into<String>,
        dry_run: bool,
    ) -> Self {
        Self {
            filter,
            ledger,
            resolver,
            executor,
            metadata,
            subtitles,
            quality: quality.into(),
            dry_run,
        }
    }

    /// Process the listing in order. Only ledger failures abort the run;
    /// per-record executor failures are counted and skipped.
    pub fn run(&mut self, records: &[VideoRecord]) -> Result<RunSummary, LedgerError> {
        let mut summary = RunSummary {
            fetched: records.len(),
            ..Default::default()
        };

        info!(records = records.len(), dry_run = self.dry_run, "Starting run");

        for record in records {
            let outcome = self.process(record, &mut summary)?;
            summary.outcomes.push((record.id.clone(), outcome));
        }

        info!(
            fetched = summary.fetched,
            filtered = summary.filtered,
            duplicates = summary.duplicates,
            downloaded = summary.downloaded,
            failed = summary.failed,
            "Run complete"
        );

        Ok(summary)
    }

    fn process(
        &mut self,
        record: &VideoRecord,
        summary: &mut RunSummary,
    ) -> Result<RecordOutcome, LedgerError> {
        if let FilterVerdict::Reject(reason) = self.filter.evaluate(record) {
            debug!(video_id = %record.id, reason = reason.as_str(), "Filtered");
            summary.filtered += 1;
            return Ok(RecordOutcome::Filtered(reason));
        }

        if !self.ledger.is_new(&record.id) {
            debug!(video_id = %record.id, "Already processed, skipping");
            summary.duplicates += 1;
            return Ok(RecordOutcome::Duplicate);
        }

        let identity = title_parser::resolve(&record.title, &record.channel_name);
        let storage = self.resolver.resolve(&identity);

        // A path already present on disk only counts as a collision when
        // the ledger attributes it to a different video.
        let ledger = &*self.ledger;
        let video_id = record.id.as_str();
        let dest = self.resolver.disambiguate(&storage, |p| {
            p.exists() && ledger.owner_of(p) != Some(video_id)
        });

        if self.dry_run {
            info!(video_id = %record.id, dest = %dest.display(), "Dry run: would download");
            return Ok(RecordOutcome::WouldDownload(dest));
        }

        let request = DownloadRequest {
            video_id: record.id.clone(),
            url: record.url(),
            dest: dest.clone(),
            quality: self.quality.clone(),
        };

        if let Some(parent) = dest.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            error!(video_id = %record.id, error = %e, "Failed to create destination directory");
            summary.failed += 1;
            return Ok(RecordOutcome::Failed);
        }

        match self.executor.download(&request) {
            Ok(()) => {
                self.ledger.record(&record.id, &dest)?;
                info!(video_id = %record.id, dest = %dest.display(), "Downloaded");

                if let Some(sink) = self.metadata.as_deref_mut()
                    && let Err(e) = sink.write(record, &identity, &dest)
                {
                    warn!(video_id = %record.id, error = %e, "Metadata write failed");
                }
                if let Some(fetcher) = self.subtitles.as_deref_mut()
                    && let Err(e) = fetcher.fetch(record, &dest)
                {
                    warn!(video_id = %record.id, error = %e, "Subtitle fetch failed");
                }

                summary.downloaded += 1;
                Ok(RecordOutcome::Downloaded(dest))
            }
            Err(e) => {
                // Left un-recorded so the next run retries it
                error!(video_id = %record.id, error = %e, "Download failed");
                summary.failed += 1;
                Ok(RecordOutcome::Failed)
            }
        }
    }
}
