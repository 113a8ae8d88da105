//! Channel listing via the YouTube video RSS feed
//!
//! The feed (`/feeds/videos.xml`) needs no API key and returns the ~15
//! most recent uploads with id, title, publish date, and description.
//! It carries no duration, so records from this source report an
//! unknown duration and pass configured duration bounds untouched.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::{info, warn};

use crate::media::VideoRecord;
use crate::sources::ChannelLister;

/// RSS-backed channel lister.
pub struct RssChannelLister {
    client: reqwest::blocking::Client,
    feed_url: String,
}

impl RssChannelLister {
    /// Build a lister for a channel URL. Supported forms:
    /// `/channel/<id>`, `/user/<name>`, `/@handle`, and a bare `@handle`.
    pub fn for_channel(channel_url: &str) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("tuberr/0.1")
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            feed_url: feed_url_for(channel_url)?,
        })
    }
}

impl ChannelLister for RssChannelLister {
    fn recent_videos(&mut self, max: usize) -> Result<Vec<VideoRecord>> {
        info!(feed = %self.feed_url, "Fetching channel feed");

        let response = self
            .client
            .get(&self.feed_url)
            .send()
            .context("Failed to fetch channel feed")?;

        if !response.status().is_success() {
            anyhow::bail!("channel feed returned error status: {}", response.status());
        }

        let content = response.text().context("Failed to read channel feed")?;
        let mut records = parse_feed(&content)?;
        records.truncate(max);

        info!(records = records.len(), "Fetched channel listing");
        Ok(records)
    }
}

/// Map a channel URL to its RSS feed URL.
fn feed_url_for(channel_url: &str) -> Result<String> {
    let trimmed = channel_url.trim().trim_end_matches('/');

    if let Some(id) = trimmed.rsplit("/channel/").next().filter(|_| trimmed.contains("/channel/")) {
        return Ok(format!(
            "https://www.youtube.com/feeds/videos.xml?channel_id={id}"
        ));
    }
    if let Some(user) = trimmed.rsplit("/user/").next().filter(|_| trimmed.contains("/user/")) {
        return Ok(format!("https://www.youtube.com/feeds/videos.xml?user={user}"));
    }
    if let Some(handle) = trimmed
        .rsplit("/@")
        .next()
        .filter(|_| trimmed.contains("/@"))
        .or_else(|| trimmed.strip_prefix('@'))
    {
        return Ok(format!("https://www.youtube.com/feeds/videos.xml?user={handle}"));
    }

    anyhow::bail!("unrecognized channel URL: {channel_url}")
}

#[derive(Default)]
struct EntryBuilder {
    video_id: Option<String>,
    title: Option<String>,
    published: Option<String>,
    description: Option<String>,
}

/// Parse a YouTube Atom feed into video records, preserving feed order.
fn parse_feed(content: &str) -> Result<Vec<VideoRecord>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut records = Vec::new();
    let mut channel_name = String::new();
    let mut current: Option<EntryBuilder> = None;
    let mut current_tag = String::new();
    let mut in_author = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match tag.as_str() {
                    "entry" => current = Some(EntryBuilder::default()),
                    "author" => in_author = true,
                    _ => {}
                }
                current_tag = tag;
            }
            Ok(Event::End(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match tag.as_str() {
                    "entry" => {
                        if let Some(builder) = current.take() {
                            match build_record(builder, &channel_name) {
                                Some(record) => records.push(record),
                                None => warn!("Skipping feed entry with missing fields"),
                            }
                        }
                    }
                    "author" => in_author = false,
                    _ => {}
                }
                current_tag.clear();
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().unwrap_or_default().to_string();
                match current.as_mut() {
                    Some(builder) => match current_tag.as_str() {
                        "yt:videoId" => builder.video_id = Some(text),
                        "title" => builder.title = Some(text),
                        "published" => builder.published = Some(text),
                        "media:description" => builder.description = Some(text),
                        // The per-entry author block repeats the channel name
                        "name" if in_author && channel_name.is_empty() => channel_name = text,
                        _ => {}
                    },
                    // Feed-level title is the channel name
                    None => {
                        if current_tag == "title" && channel_name.is_empty() {
                            channel_name = text;
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                warn!("Error parsing channel feed XML: {:?}", e);
                break;
            }
            _ => {}
        }
    }

    Ok(records)
}

fn build_record(builder: EntryBuilder, channel_name: &str) -> Option<VideoRecord> {
    let published = builder.published?;
    let upload_date = DateTime::parse_from_rfc3339(&published)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()?;

    Some(VideoRecord {
        id: builder.video_id?,
        title: builder.title?,
        channel_name: channel_name.to_string(),
        upload_date,
        duration_seconds: None,
        description: builder.description.unwrap_or_default(),
    })
}
