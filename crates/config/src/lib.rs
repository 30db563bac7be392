use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "feedback.toml",
    "feedback.json",
    "config/feedback.toml",
    "config/feedback.json",
    "../feedback.toml",
    "../config/feedback.toml",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub database: DatabaseConfig,
}

/// Connection settings for the Bot API transport.
///
/// ```
/// use feedback_config::TelegramConfig;
///
/// let telegram = TelegramConfig::default();
/// assert_eq!(telegram.api_base_url, "https://api.telegram.org");
/// assert!(telegram.request_timeout_seconds > telegram.poll_timeout_seconds);
/// assert!(telegram.token.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "TelegramConfig::default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "TelegramConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "TelegramConfig::default_poll_timeout")]
    pub poll_timeout_seconds: u64,
    #[serde(default = "TelegramConfig::default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default = "TelegramConfig::default_batch_limit")]
    pub batch_limit: u32,
}

impl TelegramConfig {
    fn default_api_base_url() -> String {
        "https://api.telegram.org".to_string()
    }

    const fn default_request_timeout() -> u64 {
        35
    }

    const fn default_poll_timeout() -> u64 {
        25
    }

    const fn default_poll_interval() -> u64 {
        1_000
    }

    const fn default_batch_limit() -> u32 {
        100
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base_url: Self::default_api_base_url(),
            request_timeout_seconds: Self::default_request_timeout(),
            poll_timeout_seconds: Self::default_poll_timeout(),
            poll_interval_ms: Self::default_poll_interval(),
            batch_limit: Self::default_batch_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://database/feedback.db".to_string(),
            max_connections: 5,
        }
    }
}

/// Load the bot configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use feedback_config::load;
///
/// std::env::remove_var("FEEDBACK_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.database.url.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    load_from(std::env::var("FEEDBACK_CONFIG").ok().map(PathBuf::from))
}

/// Same as [`load`] but with an explicit configuration file taking precedence
/// over `FEEDBACK_CONFIG` and the default search locations.
pub fn load_from(explicit: Option<PathBuf>) -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let builder = config::Config::builder()
        .set_default("telegram.api_base_url", defaults.telegram.api_base_url.clone())?
        .set_default(
            "telegram.request_timeout_seconds",
            i64::try_from(defaults.telegram.request_timeout_seconds).unwrap_or(i64::MAX),
        )?
        .set_default(
            "telegram.poll_timeout_seconds",
            i64::try_from(defaults.telegram.poll_timeout_seconds).unwrap_or(i64::MAX),
        )?
        .set_default(
            "telegram.poll_interval_ms",
            i64::try_from(defaults.telegram.poll_interval_ms).unwrap_or(i64::MAX),
        )?
        .set_default("telegram.batch_limit", i64::from(defaults.telegram.batch_limit))?
        .set_default("database.url", defaults.database.url.clone())?
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )?;

    let mut builder = builder;
    let mut config_file_attached = false;

    if let Some(path) = explicit {
        debug!(path = %path.display(), "loading configuration from explicit path");
        builder = builder.add_source(config::File::from(path));
        config_file_attached = true;
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(config::Environment::with_prefix("FEEDBACK").separator("__"));

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    if config.telegram.token.as_deref().is_some_and(|token| token.trim().is_empty()) {
        config.telegram.token = None;
    }

    if config.telegram.request_timeout_seconds <= config.telegram.poll_timeout_seconds {
        config.telegram.request_timeout_seconds = config.telegram.poll_timeout_seconds + 10;
    }

    debug!(
        api_base_url = %config.telegram.api_base_url,
        database_url = %config.database.url,
        token_present = config.telegram.token.is_some(),
        "loaded bot configuration"
    );
    Ok(config)
}
