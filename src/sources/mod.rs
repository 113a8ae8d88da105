//! Channel listing sources
//!
//! A source supplies the ordered sequence of recent videos for one
//! channel; the pipeline never calls back into it.

use anyhow::Result;

use crate::media::VideoRecord;

/// Supplies a channel's recent video listing, newest first.
pub trait ChannelLister {
    fn recent_videos(&mut self, max: usize) -> Result<Vec<VideoRecord>>;
}

pub mod rss;

pub use rss::RssChannelLister;
