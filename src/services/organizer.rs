//! Storage path resolution and naming
//!
//! Renders an episode identity into a Plex-style relative path:
//! `<Show>/Season 05/<Show> - S05E12 - <Title>.<ext>` for numbered
//! episodes, or a flat `<Show>/<Title>.<ext>` for fallback identities.

use std::path::{Path, PathBuf};

use crate::media::{EpisodeIdentity, EpisodeNumber, StoragePath};

/// Resolves episode identities to library paths. Pure and deterministic
/// given the identity and configuration.
#[derive(Debug, Clone)]
pub struct PathResolver {
    base: PathBuf,
    extension: String,
    organize_by_season: bool,
}

impl PathResolver {
    pub fn new(base: impl Into<PathBuf>, extension: impl Into<String>, organize_by_season: bool) -> Self {
        Self {
            base: base.into(),
            extension: extension.into(),
            organize_by_season,
        }
    }

    /// Resolve the canonical storage path for an identity.
    pub fn resolve(&self, identity: &EpisodeIdentity) -> StoragePath {
        let show = sanitize(&identity.show_name);
        let title = sanitize(&identity.display_title);

        match identity.number {
            EpisodeNumber::Numbered { season, episode } if self.organize_by_season => StoragePath {
                season_dir: Some(format!("Season {season:02}")),
                filename: format!(
                    "{show} - S{season:02}E{episode:02} - {title}.{ext}",
                    ext = self.extension
                ),
                show_dir: show,
            },
            _ => StoragePath {
                show_dir: show,
                season_dir: None,
                filename: format!("{title}.{ext}", ext = self.extension),
            },
        }
    }

    /// Absolute path under the library base directory
    pub fn full_path(&self, storage: &StoragePath) -> PathBuf {
        self.base.join(storage.relative())
    }

    /// Resolve a collision-free path: while `taken` reports the candidate
    /// as used by some other video, append " (2)", " (3)", ... before the
    /// extension.
    pub fn disambiguate(&self, storage: &StoragePath, taken: impl Fn(&Path) -> bool) -> PathBuf {
        let candidate = self.full_path(storage);
        if !taken(&candidate) {
            return candidate;
        }

        let stem = candidate
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let parent = candidate.parent().map(Path::to_path_buf).unwrap_or_default();

        let mut n = 2u32;
        loop {
            let next = parent.join(format!("{stem} ({n}).{ext}", ext = self.extension));
            if !taken(&next) {
                return next;
            }
            n += 1;
        }
    }
}

/// Make a name safe for use as a single path component: path-illegal and
/// control characters become a single space, runs of whitespace collapse,
/// and the ends are trimmed.
pub fn sanitize(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();

    let safe = sanitize_filename::sanitize_with_options(
        replaced,
        sanitize_filename::Options {
            windows: true,
            truncate: true,
            replacement: " ",
        },
    );

    let collapsed = safe.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        "untitled".to_string()
    } else {
        collapsed
    }
}
