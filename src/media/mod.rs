//! Core data model shared across the pipeline
//!
//! A [VideoRecord] flows through filtering and dedup, is resolved to an
//! [EpisodeIdentity] by the title parser, and lands as a [StoragePath].

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One video from a channel listing, as produced by a channel lister.
///
/// Records are transient: they live for a single run and are never
/// persisted. Duration is `None` when the source (e.g. an RSS feed)
/// does not carry it; duration filters pass unknown durations through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Channel-unique video identifier
    pub id: String,
    pub title: String,
    pub channel_name: String,
    pub upload_date: DateTime<Utc>,
    pub duration_seconds: Option<u32>,
    #[serde(default)]
    pub description: String,
}

impl VideoRecord {
    /// Watch URL handed to the download executor
    pub fn url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

/// Season/episode placement of a video, when a title pattern yielded one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeNumber {
    Numbered { season: u32, episode: u32 },
    /// No pattern matched; the video files as a flat, season-less entry
    Unknown,
}

impl EpisodeNumber {
    pub fn is_known(&self) -> bool {
        matches!(self, EpisodeNumber::Numbered { .. })
    }
}

/// Canonical show/season/episode identity inferred from a video title.
///
/// Derived once per record and never mutated. The parser guarantees
/// `show_name` and `display_title` are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeIdentity {
    pub show_name: String,
    pub number: EpisodeNumber,
    pub display_title: String,
}

/// Relative on-disk location for a resolved episode.
///
/// Every component is filesystem-safe; `season_dir` is absent for
/// fallback identities and when season organization is disabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePath {
    pub show_dir: String,
    pub season_dir: Option<String>,
    pub filename: String,
}

impl StoragePath {
    /// Path relative to the library base directory
    pub fn relative(&self) -> PathBuf {
        let mut path = PathBuf::from(&self.show_dir);
        if let Some(season) = &self.season_dir {
            path.push(season);
        }
        path.push(&self.filename);
        path
    }
}
