//! Service layer: the decision engine and its collaborators

pub mod downloader;
pub mod ledger;
pub mod nfo;
pub mod organizer;
pub mod pipeline;
pub mod title_parser;
pub mod video_filter;

pub use downloader::YtDlpExecutor;
pub use ledger::{DedupLedger, LedgerEntry, LedgerError};
pub use nfo::NfoWriter;
pub use organizer::PathResolver;
pub use pipeline::{
    DownloadExecutor, DownloadRequest, MetadataSink, Pipeline, RecordOutcome, RunSummary,
    SubtitleFetcher,
};
pub use video_filter::{FilterEngine, FilterVerdict, RejectReason};
