use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://dataapi.aipopshort.com/v1/api";
pub const DEFAULT_REFRESH_URL: &str = "https://dataapi.aipopshort.com/v1/api/auth/refresh-token";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// Origin every relative request path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Absolute URL of the token refresh endpoint
    #[serde(default = "default_refresh_url")]
    pub refresh_url: String,
    /// Login view the session-expired redirect points at
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Per-request timeout; unset means the transport default (wait indefinitely)
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// Timeout for the refresh call itself
    #[serde(default)]
    pub refresh_timeout_secs: Option<u64>,
    /// Refresh cycles a single call may go through before the session is abandoned
    #[serde(default = "default_max_refresh_cycles")]
    pub max_refresh_cycles: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            refresh_url: default_refresh_url(),
            login_path: default_login_path(),
            request_timeout_secs: None,
            refresh_timeout_secs: None,
            max_refresh_cycles: default_max_refresh_cycles(),
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn refresh_timeout(&self) -> Option<Duration> {
        self.refresh_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Credential file location; defaults to the platform data directory
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
}

impl StorageConfig {
    pub fn credentials_path(&self) -> PathBuf {
        if let Some(path) = &self.credentials_path {
            return path.clone();
        }
        match dirs::data_dir() {
            Some(dir) => dir.join("yt-console").join("credentials.json"),
            None => PathBuf::from("./data/credentials.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_refresh_url() -> String {
    DEFAULT_REFRESH_URL.to_string()
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_max_refresh_cycles() -> u32 {
    2
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

/// Load configuration from an optional TOML file layered under `YT_CONSOLE__*` env vars
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "Config file not found, using defaults");
    }

    let config = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("YT_CONSOLE").separator("__"))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    validate_url("api.base_url", &cfg.api.base_url)?;
    validate_url("api.refresh_url", &cfg.api.refresh_url)?;

    if !cfg.api.login_path.starts_with('/') {
        anyhow::bail!("api.login_path must start with '/': {}", cfg.api.login_path);
    }

    if cfg.api.max_refresh_cycles == 0 {
        anyhow::bail!("api.max_refresh_cycles must be at least 1");
    }

    if cfg.api.request_timeout_secs == Some(0) || cfg.api.refresh_timeout_secs == Some(0) {
        anyhow::bail!("Timeouts must be greater than zero when set");
    }

    match cfg.logging.format.as_str() {
        "text" | "json" => {}
        other => anyhow::bail!("Invalid logging.format '{}', expected 'text' or 'json'", other),
    }

    Ok(())
}

fn validate_url(field: &str, value: &str) -> anyhow::Result<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| anyhow::anyhow!("{} is not a valid URL ({}): {}", field, e, value))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("{} must use http or https: {}", field, value);
    }
    Ok(())
}
