//! Title parser for channel video titles
//!
//! Derives a show/season/episode identity from free-text titles like:
//! - "Game of Thrones S01E05"
//! - "Doctor Who Season 12 Episode 4"
//! - "Friends 1x01"
//! - "Only Connect - Series 21 - Episode 3"
//!
//! Patterns are tried in a fixed order and the first match wins. Titles
//! that match no pattern fall back to a channel-level identity, so
//! resolution is total: every title yields a usable identity.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::media::{EpisodeIdentity, EpisodeNumber};

/// `S01E05`, case-insensitive, optional separator between the tokens
static SEASON_EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bs(\d{1,3})\s*[.\-_]?\s*e(\d{1,3})\b").unwrap());

/// `Season 12 Episode 4` word form
static WORD_FORM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bseason\s+(\d{1,3})\s+episode\s+(\d{1,3})\b").unwrap());

/// `1x01` compact form
static COMPACT_FORM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})\s*x\s*(\d{2,3})\b").unwrap());

/// `<Show> - Series 21 - Episode 3` / `<Show> Series 54 Episode 37`,
/// with "Series" as the season synonym and the show name captured from
/// the text preceding it
static SERIES_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(.*?)\s*-?\s*(\bseries\s+(\d{1,3})\s*-?\s*episode\s+(\d{1,3})\b)").unwrap()
});

/// Resolve a title to an episode identity. Never fails.
pub fn resolve(title: &str, channel_name: &str) -> EpisodeIdentity {
    let identity = resolve_inner(title, channel_name);

    debug!(
        title = title,
        show = %identity.show_name,
        number = ?identity.number,
        "Resolved episode identity"
    );

    identity
}

fn resolve_inner(title: &str, channel_name: &str) -> EpisodeIdentity {
    // Rules 1-3: season/episode token anywhere in the title; the show is
    // the channel and the display title is the title minus the token.
    for pattern in [&*SEASON_EPISODE, &*WORD_FORM, &*COMPACT_FORM] {
        if let Some(caps) = pattern.captures(title) {
            let matched = caps.get(0).unwrap();
            let season: u32 = caps[1].parse().unwrap_or(0);
            let episode: u32 = caps[2].parse().unwrap_or(0);
            return EpisodeIdentity {
                show_name: fallback_show_name(channel_name),
                number: EpisodeNumber::Numbered { season, episode },
                display_title: strip_token(title, matched.start(), matched.end()),
            };
        }
    }

    // Rule 4: "Series N Episode M" with the show name taken from the
    // preceding text. An empty show name means the leading text was all
    // separator debris; treat as no match.
    if let Some(caps) = SERIES_FORM.captures(title) {
        let show = trim_separators(&caps[1]);
        if !show.is_empty() {
            let token = caps.get(2).unwrap();
            let season: u32 = caps[3].parse().unwrap_or(0);
            let episode: u32 = caps[4].parse().unwrap_or(0);
            return EpisodeIdentity {
                show_name: show,
                number: EpisodeNumber::Numbered { season, episode },
                display_title: strip_token(title, token.start(), token.end()),
            };
        }
    }

    // Rule 5: fallback to a flat channel-level identity.
    let show_name = fallback_show_name(channel_name);
    let trimmed = title.trim();
    let display_title = if trimmed.is_empty() {
        show_name.clone()
    } else {
        trimmed.to_string()
    };
    EpisodeIdentity {
        show_name,
        number: EpisodeNumber::Unknown,
        display_title,
    }
}

/// Remove the matched token from the title, then tidy up the leftover
/// separators. Falls back to the full title when stripping leaves
/// nothing, so display titles stay non-empty.
fn strip_token(title: &str, start: usize, end: usize) -> String {
    let stripped = format!("{} {}", &title[..start], &title[end..]);
    let cleaned = trim_separators(&stripped);
    if cleaned.is_empty() {
        title.trim().to_string()
    } else {
        cleaned
    }
}

/// Collapse internal whitespace and trim stray separator characters left
/// behind at either end after token removal.
fn trim_separators(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == '-' || c == ':' || c == '|' || c.is_whitespace())
        .to_string()
}

fn fallback_show_name(channel_name: &str) -> String {
    let trimmed = channel_name.trim();
    if trimmed.is_empty() {
        "Unknown Channel".to_string()
    } else {
        trimmed.to_string()
    }
}
