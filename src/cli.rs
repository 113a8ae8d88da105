//! Minimal CLI parsing for run options.

use std::env;

#[derive(Debug)]
pub struct CliOptions {
    pub config_path: String,
    pub dry_run: bool,
    pub status: bool,
    pub max_videos: Option<usize>,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            config_path: "config.yaml".to_string(),
            dry_run: false,
            status: false,
            max_videos: None,
        }
    }
}

impl CliOptions {
    pub fn from_args() -> Self {
        let mut options = CliOptions::default();
        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--dry-run" => options.dry_run = true,
                "--status" => options.status = true,
                "--config" => {
                    if let Some(value) = args.next() {
                        options.config_path = value;
                    }
                }
                "--max-videos" => {
                    if let Some(value) = args.next() {
                        options.max_videos = value.parse().ok();
                    }
                }
                _ if arg.starts_with("--config=") => {
                    if let Some((_, value)) = arg.split_once('=') {
                        options.config_path = value.to_string();
                    }
                }
                _ if arg.starts_with("--max-videos=") => {
                    if let Some((_, value)) = arg.split_once('=') {
                        options.max_videos = value.parse().ok();
                    }
                }
                _ => {}
            }
        }
        options
    }
}
