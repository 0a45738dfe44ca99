//! Configuration file handling for veo-studio.
//!
//! Loads configuration from `<config dir>/veo-studio/config.toml` or a custom
//! path, then lets environment variables fill in credentials.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::genai::{
    DEEPSEEK_API_BASE_URL, DEEPSEEK_API_KEY_ENV, DEFAULT_ASPECT_RATIO, DEFAULT_DEEPSEEK_MODEL,
    DEFAULT_GEMINI_MODEL, DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL, DEFAULT_RETRY_DELAY,
    DEFAULT_VIDEO_MODEL, GEMINI_API_BASE_URL, GEMINI_API_KEYS_ENV, KIE_API_BASE_URL,
    KIE_API_KEY_ENV,
};

/// Configuration file structure for veo-studio.
#[derive(Debug, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub text: TextConfig,
    #[serde(default)]
    pub video: VideoConfig,
}

/// `[text]` section: primary key pool and endpoint.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct TextConfig {
    pub api_keys: Vec<String>,
    pub base_url: String,
    pub model: String,
    pub retry_delay_ms: u64,
    pub fallback: FallbackConfig,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            base_url: GEMINI_API_BASE_URL.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            retry_delay_ms: DEFAULT_RETRY_DELAY.as_millis() as u64,
            fallback: FallbackConfig::default(),
        }
    }
}

/// `[text.fallback]` section: the secondary provider.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct FallbackConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEEPSEEK_API_BASE_URL.to_string(),
            model: DEFAULT_DEEPSEEK_MODEL.to_string(),
        }
    }
}

/// `[video]` section.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct VideoConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub aspect_ratio: String,
    pub poll_interval_secs: u64,
    pub max_wait_secs: u64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: KIE_API_BASE_URL.to_string(),
            model: DEFAULT_VIDEO_MODEL.to_string(),
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            max_wait_secs: DEFAULT_MAX_WAIT.as_secs(),
        }
    }
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Fill credentials from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Fill credentials using `lookup`. Set variables win over file values.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(keys) = lookup(GEMINI_API_KEYS_ENV) {
            let keys: Vec<String> = keys
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect();
            if !keys.is_empty() {
                self.text.api_keys = keys;
            }
        }
        if let Some(key) = lookup(DEEPSEEK_API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.text.fallback.api_key = Some(key);
        }
        if let Some(key) = lookup(KIE_API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.video.api_key = Some(key);
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{}': {source}", .path.display())]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("veo-studio").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/veo-studio/config.toml")
        })
}

/// Commented starting point written by `config init`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# veo-studio configuration

[text]
# Primary API keys, tried round-robin (or set GEMINI_API_KEYS=key1,key2)
api_keys = []
# model = "gemini-1.5-flash-latest"
# Base delay before retrying an overloaded key, in milliseconds
retry_delay_ms = 2000

[text.fallback]
# Secondary provider key (or set DEEPSEEK_API_KEY)
# api_key = ""
# model = "deepseek-chat"

[video]
# Video API key (or set KIE_API_KEY)
# api_key = ""
model = "veo3"
aspect_ratio = "16:9"
# Seconds between status polls
poll_interval_secs = 10
# Give up on a job after this many seconds
max_wait_secs = 600
"#;
