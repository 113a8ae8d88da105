//! NFO companion metadata for media center libraries
//!
//! Writes an `<episodedetails>` file next to each downloaded video so
//! Plex/Kodi pick up the title, air date, and source id without
//! guessing from the filename.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::escape::escape;
use tracing::debug;

use crate::media::{EpisodeIdentity, EpisodeNumber, VideoRecord};
use crate::services::pipeline::MetadataSink;

const PLOT_LIMIT: usize = 500;

pub struct NfoWriter;

impl MetadataSink for NfoWriter {
    fn write(
        &mut self,
        record: &VideoRecord,
        identity: &EpisodeIdentity,
        video_path: &Path,
    ) -> Result<()> {
        let nfo_path = video_path.with_extension("nfo");
        let content = render(record, identity);

        fs::write(&nfo_path, content)
            .with_context(|| format!("failed to write {}", nfo_path.display()))?;
        debug!(path = %nfo_path.display(), "Wrote NFO file");
        Ok(())
    }
}

fn render(record: &VideoRecord, identity: &EpisodeIdentity) -> String {
    let title = escape(&record.title);
    let plot = escape(truncate(&record.description, PLOT_LIMIT));
    let aired = record.upload_date.format("%Y-%m-%d");

    let mut nfo = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n");
    nfo.push_str("<episodedetails>\n");
    nfo.push_str(&format!("    <title>{title}</title>\n"));
    nfo.push_str(&format!("    <showtitle>{}</showtitle>\n", escape(&identity.show_name)));
    if let EpisodeNumber::Numbered { season, episode } = identity.number {
        nfo.push_str(&format!("    <season>{season}</season>\n"));
        nfo.push_str(&format!("    <episode>{episode}</episode>\n"));
    }
    nfo.push_str(&format!("    <plot>{plot}</plot>\n"));
    nfo.push_str(&format!("    <aired>{aired}</aired>\n"));
    nfo.push_str("    <studio>YouTube</studio>\n");
    nfo.push_str(&format!(
        "    <uniqueid type=\"youtube\">{}</uniqueid>\n",
        escape(&record.id)
    ));
    if let Some(seconds) = record.duration_seconds {
        nfo.push_str(&format!("    <runtime>{}</runtime>\n", seconds.div_ceil(60)));
    }
    nfo.push_str("</episodedetails>\n");
    nfo
}

/// Truncate on a char boundary
fn truncate(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
