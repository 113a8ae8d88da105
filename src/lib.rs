//! Tuberr - channel-to-library episode downloader
//!
//! Watches a channel's recent uploads, filters them against configured
//! criteria, infers show/season/episode identities from titles, and
//! organizes downloads into a Plex-style library with companion
//! metadata. A durable ledger of processed video ids prevents
//! re-downloading across runs.

pub mod config;
pub mod media;
pub mod services;
pub mod sources;
