mod defaults;


use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::error::BotError;
use defaults::*;

/// Environment variable consulted when the config carries no token.
pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Top-level telebot configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub telebot: GeneralConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

/// Process-wide settings for the binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// Client configuration. Everything except the token has a default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Bot credential, as issued by BotFather.
    #[serde(default)]
    pub token: String,
    /// API root; request URLs are `{base_url}bot{token}/{method}`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// First update id the poller expects.
    #[serde(default)]
    pub offset: i64,
    /// Spacing between short polls, and the pause after a failed poll.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Long-poll timeout in seconds. Zero switches to short polling.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Local network slack added on top of the long-poll timeout.
    #[serde(default = "default_poll_slack_secs")]
    pub poll_slack_secs: u64,
    /// Attempt ceiling for host-not-found retries (1 = no retry).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Pause between retry attempts.
    #[serde(default)]
    pub retry_delay_ms: u64,
    /// Emit a named event for every `/command` message.
    #[serde(default = "default_true")]
    pub parse_command: bool,
    /// When set, `start()` registers this webhook instead of polling.
    #[serde(default)]
    pub webhook: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            base_url: default_base_url(),
            offset: 0,
            interval_ms: default_interval_ms(),
            timeout_secs: default_timeout_secs(),
            poll_slack_secs: default_poll_slack_secs(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: 0,
            parse_command: true,
            webhook: None,
        }
    }
}

impl ClientConfig {
    /// Default configuration for the given token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Default::default()
        }
    }

    /// Check the invariants the client relies on.
    pub fn validate(&self) -> Result<(), BotError> {
        if self.token.trim().is_empty() {
            return Err(BotError::Config(format!(
                "bot token is empty. Set client.token in config.toml or the {TOKEN_ENV} env var."
            )));
        }
        if self.max_attempts == 0 {
            return Err(BotError::Config("max_attempts must be at least 1".into()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(BotError::Config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Whether the poller holds requests open server-side.
    pub fn is_long_poll(&self) -> bool {
        self.timeout_secs > 0
    }

    /// Client-side deadline for one `getUpdates` call.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs + self.poll_slack_secs)
    }

    /// Full URL for an API method.
    pub fn api_url(&self, method: &str) -> String {
        format!("{}bot{}/{method}", self.root(), self.token)
    }

    /// Download URL for a `file_path` returned by `getFile`.
    pub fn file_url(&self, file_path: &str) -> String {
        format!(
            "{}file/bot{}/{}",
            self.root(),
            self.token,
            file_path.trim_start_matches('/')
        )
    }

    fn root(&self) -> String {
        if self.base_url.ends_with('/') {
            self.base_url.clone()
        } else {
            format!("{}/", self.base_url)
        }
    }
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist. An empty token is
/// filled from `TELEGRAM_BOT_TOKEN` when that variable is set.
pub fn load(path: &str) -> Result<Config, BotError> {
    let path = Path::new(path);
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .map_err(|e| BotError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        parse(&content)?
    } else {
        info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        Config::default()
    };

    if config.client.token.is_empty() {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            config.client.token = token;
        }
    }

    Ok(config)
}

/// Parse configuration from TOML text.
pub fn parse(content: &str) -> Result<Config, BotError> {
    toml::from_str(content).map_err(|e| BotError::Config(format!("failed to parse config: {e}")))
}
