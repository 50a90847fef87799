//! Seatwatch configuration system.
//!
//! Loaded from `~/.seatwatch/config.toml`, then overlaid with environment
//! variables so the daemon can run fully env-configured (credentials never
//! need to touch the config file).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, SeatwatchError};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeatwatchConfig {
    #[serde(default)]
    pub watch: WatchConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

impl SeatwatchConfig {
    /// Load config from the default path (~/.seatwatch/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SeatwatchError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| SeatwatchError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".seatwatch")
            .join("config.toml")
    }

    /// Overlay environment variables onto the loaded config. Env always
    /// wins so credentials can be injected at deploy time.
    pub fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("SEATWATCH_URL") {
            self.watch.url = v;
        }
        if let Ok(v) = std::env::var("SEATWATCH_MATCH") {
            self.watch.match_name = v;
        }
        if let Ok(v) = std::env::var("SEATWATCH_RECIPIENTS") {
            self.watch.recipients = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = std::env::var("SEATWATCH_SCHEDULE") {
            self.watch.schedule = v;
        }
        if let Ok(v) = std::env::var("SEATWATCH_SMTP_USER") {
            self.mail.username = v;
        }
        if let Ok(v) = std::env::var("SEATWATCH_SMTP_PASS") {
            self.mail.password = v;
        }
        if let Ok(v) = std::env::var("SEATWATCH_API_KEY") {
            self.llm.api_key = v;
        }
    }

    /// Fail fast on a config that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        if self.watch.url.is_empty() {
            return Err(SeatwatchError::Config(
                "watch.url is empty (set SEATWATCH_URL or [watch] url)".into(),
            ));
        }
        if self.watch.match_name.is_empty() {
            return Err(SeatwatchError::Config(
                "watch.match_name is empty (set SEATWATCH_MATCH or [watch] match_name)".into(),
            ));
        }
        if self.watch.recipients.is_empty() {
            return Err(SeatwatchError::Config(
                "watch.recipients is empty (set SEATWATCH_RECIPIENTS or [watch] recipients)".into(),
            ));
        }
        Ok(())
    }
}

/// What to monitor and who to tell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Target ticket-sale page.
    #[serde(default)]
    pub url: String,
    /// Exact target-event identifier (event name + date/time).
    #[serde(default)]
    pub match_name: String,
    /// Alert fan-out list.
    #[serde(default)]
    pub recipients: Vec<String>,
    /// 5-field cron expression.
    #[serde(default = "default_schedule")]
    pub schedule: String,
}

fn default_schedule() -> String {
    "*/2 * * * *".into()
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            match_name: String::new(),
            recipients: vec![],
            schedule: default_schedule(),
        }
    }
}

/// Classification backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Override base URL; empty means use the provider default.
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Hard cap on one classification call.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.0
}
fn default_max_tokens() -> u32 {
    512
}
fn default_request_timeout() -> u64 {
    60
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            endpoint: String::new(),
            model: default_model(),
            api_key: String::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Mail transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// Sender identity; also the SMTP login.
    #[serde(default)]
    pub username: String,
    /// Application credential.
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".into()
}
fn default_smtp_port() -> u16 {
    587
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            username: String::new(),
            password: String::new(),
            display_name: None,
        }
    }
}

/// Headless browser session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Realistic client identity sent on navigation.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Bound on navigation + extraction; slow third-party pages need
    /// headroom, so keep this at 60s or more.
    #[serde(default = "default_navigation_timeout")]
    pub navigation_timeout_secs: u64,
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36"
        .into()
}
fn default_navigation_timeout() -> u64 {
    75
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            navigation_timeout_secs: default_navigation_timeout(),
        }
    }
}
