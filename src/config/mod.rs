//! # Configuration Management Module
//!
//! Lantern reads a single TOML file (default `lantern.toml`) with four sections:
//!
//! - [`BackendConfig`] - where the story backend lives and which endpoint variant it speaks
//! - [`HostConfig`] - where the host session data (`initData`) comes from
//! - [`DisplayConfig`] - typing speed, transcript labels and frame pacing
//! - [`LoggingConfig`] - log level and log file
//!
//! Every section is optional in the file; missing values fall back to [`Default`].
//!
//! ## Configuration File Format
//!
//! ```toml
//! [backend]
//! base_url = "https://adventure.example.org"
//! variant = "adventure"     # or "step"
//! timeout_seconds = 60
//!
//! [host]
//! init_data_env = "LANTERN_INIT_DATA"
//!
//! [display]
//! typing_interval_ms = 25
//! player_label = "Ты"
//! ```
//!
//! ## Precedence
//!
//! CLI args > Environment > Config file > Defaults. Environment overrides are applied by
//! [`Config::apply_env`]; CLI overrides are applied by the binary after loading.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::fs;

/// Environment variable overriding `backend.base_url`.
pub const BASE_URL_ENV: &str = "LANTERN_BASE_URL";

/// Default environment variable carrying the host session data.
pub const DEFAULT_INIT_DATA_ENV: &str = "LANTERN_INIT_DATA";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which of the two backend endpoint shapes to talk to.
///
/// Both variants accept the same request body; they differ in the path and in the
/// name of the reply field, and the reply decoder accepts either field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiVariant {
    #[default]
    Adventure,
    Step,
}

impl ApiVariant {
    pub fn default_path(self) -> &'static str {
        match self {
            ApiVariant::Adventure => "/api/adventure",
            ApiVariant::Step => "/api/step",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub base_url: String,
    pub variant: ApiVariant,
    /// Overrides the variant's default path when set. Must start with `/`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            variant: ApiVariant::Adventure,
            path: None,
            timeout_seconds: 60,
        }
    }
}

impl BackendConfig {
    /// Full endpoint URL: base URL without trailing slash + variant path (or override).
    pub fn endpoint_url(&self) -> String {
        let path = self
            .path
            .as_deref()
            .unwrap_or_else(|| self.variant.default_path());
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Literal `initData`. Usually left unset in favour of the environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init_data: Option<String>,
    /// Name of the environment variable holding `initData`.
    #[serde(default = "default_init_data_env")]
    pub init_data_env: String,
}

fn default_init_data_env() -> String {
    DEFAULT_INIT_DATA_ENV.to_string()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            init_data: None,
            init_data_env: default_init_data_env(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Delay between revealed characters.
    pub typing_interval_ms: u64,
    pub player_label: String,
    pub narrator_label: String,
    /// Shown in the status line while a request is in flight.
    pub thinking_label: String,
    /// Draw a rule after every completed narration.
    pub show_separators: bool,
    /// UI redraw pacing.
    pub frame_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            typing_interval_ms: 25,
            player_label: "Ты".to_string(),
            narrator_label: "Повествователь".to_string(),
            thinking_label: "Повествователь думает…".to_string(),
            show_separators: true,
            frame_ms: 16,
        }
    }
}

impl DisplayConfig {
    pub fn typing_interval(&self) -> Duration {
        Duration::from_millis(self.typing_interval_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_ms.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Log file; `file = ""` turns file logging off. The interactive UI owns the
    /// terminal, so `play` writes records nowhere else.
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("lantern.log".to_string()),
        }
    }
}

impl LoggingConfig {
    /// Configured log file, with an empty path meaning none.
    pub fn file_path(&self) -> Option<&str> {
        self.file.as_deref().filter(|p| !p.trim().is_empty())
    }

    pub fn level_filter(&self) -> log::LevelFilter {
        match self.level.to_ascii_lowercase().as_str() {
            "off" => log::LevelFilter::Off,
            "error" => log::LevelFilter::Error,
            "warn" | "warning" => log::LevelFilter::Warn,
            "debug" => log::LevelFilter::Debug,
            "trace" => log::LevelFilter::Trace,
            _ => log::LevelFilter::Info,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        Self::from_toml(&content).map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))
    }

    /// Parse and validate configuration text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` when it exists, otherwise start from defaults.
    pub async fn load_or_default(path: &str) -> Result<Self> {
        if fs::try_exists(path).await.unwrap_or(false) {
            Self::load(path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Apply environment overrides (`LANTERN_BASE_URL`).
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.backend.base_url = url.trim().to_string();
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.trim().is_empty() {
            return Err(anyhow!("backend.base_url must not be empty"));
        }
        if !(self.backend.base_url.starts_with("http://")
            || self.backend.base_url.starts_with("https://"))
        {
            return Err(anyhow!(
                "backend.base_url must start with http:// or https:// (got {})",
                self.backend.base_url
            ));
        }
        if let Some(path) = &self.backend.path {
            if !path.starts_with('/') {
                return Err(anyhow!("backend.path must start with '/' (got {})", path));
            }
        }
        if self.backend.timeout_seconds == 0 {
            return Err(anyhow!("backend.timeout_seconds must be positive"));
        }
        if self.display.typing_interval_ms == 0 {
            return Err(anyhow!("display.typing_interval_ms must be positive"));
        }
        if self.host.init_data_env.trim().is_empty() {
            return Err(anyhow!("host.init_data_env must name an environment variable"));
        }
        Ok(())
    }
}
