//! Application configuration
//!
//! Loaded from a YAML file with `${VAR}` environment expansion, after
//! `dotenvy` has populated the environment from `.env`. Validation
//! failures are fatal before any record is processed.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// One fuzzy title pattern with its acceptance threshold (0-100)
#[derive(Debug, Clone, Deserialize)]
pub struct TitlePattern {
    pub pattern: String,
    pub fuzzy_threshold: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    pub url: String,
    #[serde(default = "default_max_videos")]
    pub max_videos: usize,
}

/// Filter criteria; zero disables the window and either duration bound
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FiltersConfig {
    pub upload_window_days: u32,
    pub title_patterns: Vec<TitlePattern>,
    pub min_duration_minutes: u32,
    pub max_duration_minutes: u32,
    pub exclude_keywords: Vec<String>,
}

impl Default for FiltersConfig {
    fn default() -> Self {
        Self {
            upload_window_days: 7,
            title_patterns: Vec::new(),
            min_duration_minutes: 0,
            max_duration_minutes: 0,
            exclude_keywords: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Format selector passed to the download executor
    pub quality: String,
    pub output_extension: String,
    pub subtitle_languages: Vec<String>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            quality: "best[height<=1080]".to_string(),
            output_extension: "mkv".to_string(),
            subtitle_languages: vec!["en".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub base_directory: String,
    pub organize_by_season: bool,
    pub generate_metadata: bool,
    /// Defaults to `.tuberr-ledger.json` under the base directory
    pub ledger_path: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_directory: "~/tv-shows".to_string(),
            organize_by_season: true,
            generate_metadata: true,
            ledger_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub channel: ChannelConfig,
    #[serde(default)]
    pub filters: FiltersConfig,
    #[serde(default)]
    pub download: DownloadConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

fn default_max_videos() -> usize {
    50
}

static ENV_VAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

impl Config {
    /// Load and validate configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let raw = fs::read_to_string(path)?;
        let expanded = expand_env_variables(&raw);
        let config: Config = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.channel.url.trim().is_empty() {
            return Err(ConfigError::Invalid("channel.url must not be empty".into()));
        }

        for p in &self.filters.title_patterns {
            if p.fuzzy_threshold > 100 {
                return Err(ConfigError::Invalid(format!(
                    "fuzzy_threshold for pattern '{}' must be 0-100",
                    p.pattern
                )));
            }
        }

        let min = self.filters.min_duration_minutes;
        let max = self.filters.max_duration_minutes;
        if min > 0 && max > 0 && max <= min {
            return Err(ConfigError::Invalid(
                "max_duration_minutes must be greater than min_duration_minutes".into(),
            ));
        }

        let ext = self.download.output_extension.trim();
        if ext.is_empty() || ext.contains('.') {
            return Err(ConfigError::Invalid(
                "download.output_extension must be a bare extension like 'mkv'".into(),
            ));
        }

        Ok(())
    }

    /// Library base directory with `~` expanded
    pub fn base_directory(&self) -> PathBuf {
        expand_home(&self.storage.base_directory)
    }

    /// Ledger location, defaulting to a dotfile inside the library
    pub fn ledger_path(&self) -> PathBuf {
        match &self.storage.ledger_path {
            Some(p) => expand_home(p),
            None => self.base_directory().join(".tuberr-ledger.json"),
        }
    }
}

/// Replace `${VAR}` references with their environment values. Unknown
/// variables are left as-is so validation can surface them.
fn expand_env_variables(raw: &str) -> String {
    ENV_VAR
        .replace_all(raw, |caps: &regex::Captures| {
            env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use assert_matches::assert_matches;

    use super::*;

    fn write_config(yaml: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let (_dir, path) = write_config("channel:\n  url: https://www.youtube.com/@example\n");
        let config = Config::load(&path).unwrap();

        assert_eq!(config.channel.max_videos, 50);
        assert_eq!(config.filters.upload_window_days, 7);
        assert_eq!(config.download.output_extension, "mkv");
        assert!(config.storage.organize_by_season);
        assert!(config.ledger_path().ends_with(".tuberr-ledger.json"));
    }

    #[test]
    fn test_full_config_parses() {
        let (_dir, path) = write_config(
            r#"
channel:
  url: https://www.youtube.com/@quizchannel
  max_videos: 25
filters:
  upload_window_days: 14
  title_patterns:
    - pattern: only connect
      fuzzy_threshold: 85
  min_duration_minutes: 10
  max_duration_minutes: 90
  exclude_keywords: [trailer, teaser]
download:
  quality: best[height<=720]
  output_extension: mp4
  subtitle_languages: [en, en-GB]
storage:
  base_directory: /srv/tv
  organize_by_season: false
  generate_metadata: false
"#,
        );
        let config = Config::load(&path).unwrap();

        assert_eq!(config.filters.title_patterns.len(), 1);
        assert_eq!(config.filters.title_patterns[0].fuzzy_threshold, 85);
        assert_eq!(config.filters.exclude_keywords, vec!["trailer", "teaser"]);
        assert_eq!(config.download.output_extension, "mp4");
        assert_eq!(config.base_directory(), PathBuf::from("/srv/tv"));
        assert!(!config.storage.organize_by_season);
    }

    #[test]
    fn test_missing_file_errors() {
        assert_matches!(
            Config::load("/nonexistent/config.yaml"),
            Err(ConfigError::NotFound(_))
        );
    }

    #[test]
    fn test_invalid_duration_range_rejected() {
        let (_dir, path) = write_config(
            "channel:\n  url: https://example.com/c\nfilters:\n  min_duration_minutes: 60\n  max_duration_minutes: 30\n",
        );
        assert_matches!(Config::load(&path), Err(ConfigError::Invalid(_)));
    }

    #[test]
    fn test_empty_channel_url_rejected() {
        let (_dir, path) = write_config("channel:\n  url: \"\"\n");
        assert_matches!(Config::load(&path), Err(ConfigError::Invalid(_)));
    }

    #[test]
    fn test_dotted_extension_rejected() {
        let (_dir, path) = write_config(
            "channel:\n  url: https://example.com/c\ndownload:\n  output_extension: .mkv\n",
        );
        assert_matches!(Config::load(&path), Err(ConfigError::Invalid(_)));
    }

    #[test]
    fn test_env_expansion() {
        unsafe { env::set_var("TUBERR_TEST_CHANNEL", "https://www.youtube.com/@expanded") };
        let (_dir, path) = write_config("channel:\n  url: ${TUBERR_TEST_CHANNEL}\n");
        let config = Config::load(&path).unwrap();
        assert_eq!(config.channel.url, "https://www.youtube.com/@expanded");
    }
}
