//! yt-dlp download executor
//!
//! Spawns the `yt-dlp` binary per request with the configured format
//! selector and an output template derived from the resolved storage
//! path. Subtitle languages are requested in the same invocation.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::services::pipeline::{DownloadExecutor, DownloadRequest};

pub struct YtDlpExecutor {
    binary: PathBuf,
    subtitle_languages: Vec<String>,
}

impl YtDlpExecutor {
    pub fn new(subtitle_languages: Vec<String>) -> Self {
        Self {
            binary: PathBuf::from("yt-dlp"),
            subtitle_languages,
        }
    }

    pub fn with_binary(binary: impl Into<PathBuf>, subtitle_languages: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            subtitle_languages,
        }
    }
}

impl DownloadExecutor for YtDlpExecutor {
    fn download(&mut self, request: &DownloadRequest) -> Result<()> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--format")
            .arg(&request.quality)
            .arg("--output")
            .arg(output_template(&request.dest))
            .arg("--no-progress");

        // Keep the container matching the configured extension
        if let Some(ext) = request.dest.extension() {
            cmd.arg("--merge-output-format").arg(ext);
        }

        if !self.subtitle_languages.is_empty() {
            cmd.arg("--write-subs")
                .arg("--write-auto-subs")
                .arg("--sub-langs")
                .arg(self.subtitle_languages.join(","));
        }

        cmd.arg(&request.url);

        info!(video_id = %request.video_id, dest = %request.dest.display(), "Starting download");
        debug!(command = ?cmd, "yt-dlp invocation");

        let status = cmd
            .status()
            .with_context(|| format!("failed to launch {}", self.binary.display()))?;

        anyhow::ensure!(status.success(), "yt-dlp exited with {status}");
        Ok(())
    }
}

/// yt-dlp decides the final container, so the template keeps the
/// destination stem and lets `%(ext)s` fill the extension.
fn output_template(dest: &Path) -> OsString {
    let mut template = dest.with_extension("").into_os_string();
    template.push(".%(ext)s");
    template
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_template_replaces_extension() {
        let template = output_template(Path::new("/lib/Show/Season 01/Show - S01E01 - Ep.mkv"));
        assert_eq!(
            template,
            OsString::from("/lib/Show/Season 01/Show - S01E01 - Ep.%(ext)s")
        );
    }

    #[test]
    fn test_failed_launch_is_an_error() {
        let mut executor = YtDlpExecutor::with_binary("/nonexistent/yt-dlp", Vec::new());
        let request = DownloadRequest {
            video_id: "abc".into(),
            url: "https://www.youtube.com/watch?v=abc".into(),
            dest: PathBuf::from("/tmp/out.mkv"),
            quality: "best".into(),
        };
        assert!(executor.download(&request).is_err());
    }
}
