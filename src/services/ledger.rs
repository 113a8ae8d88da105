//! Durable dedup ledger of processed video ids
//!
//! The ledger is the only durable state in the pipeline. It is read in
//! full when opened and rewritten atomically on every successful record,
//! so an interrupted run leaves it consistent as of the last recorded
//! video. A run must not start without ledger visibility; open failures
//! are fatal to avoid re-downloading the whole channel.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("ledger file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// What was stored for a processed video
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub resolved_path: String,
    pub processed_at: DateTime<Utc>,
}

/// Persistent set of processed video ids, keyed by id.
///
/// Lookup and insert are the only operations; entries are never updated
/// or deleted in normal operation.
#[derive(Debug)]
pub struct DedupLedger {
    path: PathBuf,
    entries: BTreeMap<String, LedgerEntry>,
}

impl DedupLedger {
    /// Open the ledger, reading all entries. A missing file is an empty
    /// ledger; an unreadable or corrupt file is an error.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LedgerError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|source| LedgerError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(LedgerError::Io { path, source }),
        };

        debug!(path = %path.display(), entries = entries.len(), "Opened dedup ledger");
        Ok(Self { path, entries })
    }

    /// True when the id has never been recorded
    pub fn is_new(&self, video_id: &str) -> bool {
        !self.entries.contains_key(video_id)
    }

    /// Record a processed video. Idempotent: recording an id that is
    /// already present is a no-op, not an error.
    pub fn record(&mut self, video_id: &str, resolved_path: &Path) -> Result<(), LedgerError> {
        if self.entries.contains_key(video_id) {
            return Ok(());
        }

        self.entries.insert(
            video_id.to_string(),
            LedgerEntry {
                resolved_path: resolved_path.to_string_lossy().into_owned(),
                processed_at: Utc::now(),
            },
        );
        self.persist()
    }

    /// The id that owns a resolved path, if any. Used to tell a re-run
    /// of the same video apart from a genuine path collision.
    pub fn owner_of(&self, resolved_path: &Path) -> Option<&str> {
        let wanted = resolved_path.to_string_lossy();
        self.entries
            .iter()
            .find(|(_, entry)| entry.resolved_path == wanted)
            .map(|(id, _)| id.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rewrite the backing file via a temp file and rename, so readers
    /// never observe a half-written ledger.
    fn persist(&self) -> Result<(), LedgerError> {
        let io_err = |source| LedgerError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let raw = serde_json::to_string_pretty(&self.entries).map_err(|source| {
            LedgerError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_ledger() -> (tempfile::TempDir, DedupLedger) {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DedupLedger::open(dir.path().join("ledger.json")).unwrap();
        (dir, ledger)
    }

    #[test]
    fn test_missing_file_is_empty_ledger() {
        let (_dir, ledger) = temp_ledger();
        assert!(ledger.is_empty());
        assert!(ledger.is_new("abc123"));
    }

    #[test]
    fn test_record_then_is_new_false() {
        let (_dir, mut ledger) = temp_ledger();
        ledger.record("abc123", Path::new("Show/Season 01/ep.mkv")).unwrap();
        assert!(!ledger.is_new("abc123"));
        // Repeated lookups stay false
        assert!(!ledger.is_new("abc123"));
        assert!(ledger.is_new("other"));
    }

    #[test]
    fn test_record_is_idempotent() {
        let (_dir, mut ledger) = temp_ledger();
        ledger.record("abc123", Path::new("a.mkv")).unwrap();
        ledger.record("abc123", Path::new("b.mkv")).unwrap();
        assert_eq!(ledger.len(), 1);
        // First write wins; re-recording never rewrites the path
        assert_eq!(ledger.owner_of(Path::new("a.mkv")), Some("abc123"));
        assert_eq!(ledger.owner_of(Path::new("b.mkv")), None);
    }

    #[test]
    fn test_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        let mut ledger = DedupLedger::open(&path).unwrap();
        ledger.record("abc123", Path::new("Show/ep.mkv")).unwrap();
        drop(ledger);

        let reopened = DedupLedger::open(&path).unwrap();
        assert!(!reopened.is_new("abc123"));
        assert_eq!(reopened.owner_of(Path::new("Show/ep.mkv")), Some("abc123"));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        fs::write(&path, "not json at all").unwrap();

        assert!(matches!(
            DedupLedger::open(&path),
            Err(LedgerError::Corrupt { .. })
        ));
    }
}
