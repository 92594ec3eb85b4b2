//! Configuration management for Alarmbot.
//!
//! Provides configuration loading from TOML files with support for
//! multiple file locations, environment variable overrides, and sensible defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::dialogue::UnsupportedCategoryPolicy;


/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file '{path}': {source}")]
    IoError {
        /// Path to the configuration file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the configuration file as TOML.
    #[error("failed to parse config file '{path}': {source}")]
    ParseError {
        /// Path to the configuration file that could not be parsed.
        path: PathBuf,
        /// The underlying TOML parse error.
        source: toml::de::Error,
    },
}

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    /// HTTP front-end settings.
    #[serde(default)]
    pub web: WebConfig,

    /// Telegram bot settings.
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,

    /// Discord bot settings.
    #[serde(default)]
    pub discord: Option<DiscordConfig>,

    /// Session expiry settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Dialogue behavior settings.
    #[serde(default)]
    pub dialogue: DialogueConfig,

    /// File logging. Stdout-only when absent.
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WebConfig {
    /// Address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl WebConfig {
    /// `bind:port` string for the listener.
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

/// How Telegram updates reach the bot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TelegramMode {
    /// Long-poll the Bot API.
    #[default]
    Polling,
    /// Receive pushed updates on `POST /webhook`.
    Webhook,
}

/// Telegram bot settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TelegramConfig {
    /// Bot token. The `TELEGRAM_BOT_TOKEN` env var takes precedence.
    #[serde(default)]
    pub token: Option<String>,

    /// Update delivery mode.
    #[serde(default)]
    pub mode: TelegramMode,

    /// Public URL Telegram should push updates to (webhook mode).
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Expected `X-Telegram-Bot-Api-Secret-Token` header value (webhook mode).
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

/// Discord bot settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DiscordConfig {
    /// Bot token. The `DISCORD_BOT_TOKEN` env var takes precedence.
    #[serde(default)]
    pub token: Option<String>,

    /// Answer messages through the FAQ matcher instead of the static stub reply.
    #[serde(default)]
    pub faq: bool,
}

/// Session expiry settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionConfig {
    /// Seconds a session may stay untouched before eviction. 0 disables expiry.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Seconds between expiry sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_idle_timeout_secs() -> u64 {
    3600
}

fn default_sweep_interval_secs() -> u64 {
    300
}

impl SessionConfig {
    /// Idle timeout, or `None` when expiry is disabled.
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }

    /// Sweep interval, never shorter than one second.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Dialogue behavior settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DialogueConfig {
    /// Handling of recognized categories without published alarms.
    #[serde(default)]
    pub unsupported_category: UnsupportedCategoryPolicy,
}

/// Log file rotation period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    /// Start a new file every day.
    #[default]
    Daily,
    /// Start a new file every hour.
    Hourly,
    /// Never rotate.
    Never,
}

/// File logging settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    /// Directory for log files.
    #[serde(default = "default_log_directory")]
    pub directory: String,

    /// Rotation period.
    #[serde(default)]
    pub rotation: Rotation,

    /// Maximum number of rotated files kept.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

fn default_log_directory() -> String {
    "logs".to_string()
}

fn default_max_files() -> usize {
    7
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
            rotation: Rotation::default(),
            max_files: default_max_files(),
        }
    }
}

impl Config {
    /// Load configuration from file system.
    ///
    /// Priority order:
    /// 1. `explicit` path (e.g. a `--config` flag)
    /// 2. ALARMBOT_CONFIG environment variable
    /// 3. ./alarmbot.toml (local directory)
    /// 4. ~/.config/alarmbot/config.toml (user config)
    ///
    /// Returns default config if no config file found.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::IoError`] if a found file cannot be read.
    /// Returns [`ConfigError::ParseError`] if a found file is not valid TOML.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        if let Ok(path) = std::env::var("ALARMBOT_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                return Self::load_from(p);
            }
        }

        let local = PathBuf::from("alarmbot.toml");
        if local.exists() {
            return Self::load_from(local);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".config/alarmbot/config.toml");
            if user_config.exists() {
                return Self::load_from(user_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::IoError`] if the file cannot be read.
    /// Returns [`ConfigError::ParseError`] if the file is not valid TOML.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }
}
