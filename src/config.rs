use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::constants::{DEFAULT_SOURCE_URL, DEFAULT_TELEGRAM_API_URL};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Source page
    pub source_url: String,
    pub poll_interval: Duration,
    pub preview_len: usize,
    pub scan_limit: Option<usize>,
    pub http_timeout: Duration,

    // Seen-post storage
    pub store_backend: StoreBackend,
    pub database_path: PathBuf,

    // Delivery
    pub sink: SinkConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Durable SQLite file at `database_path`
    Sqlite,
    /// Process-local set, forgotten on restart
    Memory,
}

/// Which notification backend receives new posts, with its settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkConfig {
    Telegram(TelegramConfig),
    Desktop(DesktopConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: i64,
    pub api_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopConfig {
    pub command: String,
    pub app_name: String,
    pub icon_path: Option<PathBuf>,
    pub preview_words: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Source page
            source_url: env_or_default("SOURCE_URL", DEFAULT_SOURCE_URL),
            poll_interval: Duration::from_secs(parse_env_u64("POLL_INTERVAL_SECS", 60)?),
            preview_len: parse_env_usize("PREVIEW_LEN", 64)?,
            scan_limit: optional_env("SCAN_LIMIT")
                .map(|v| {
                    v.parse::<usize>().map_err(|e| ConfigError::ParseInt {
                        name: "SCAN_LIMIT".to_string(),
                        source: e,
                    })
                })
                .transpose()?,
            http_timeout: Duration::from_secs(parse_env_u64("HTTP_TIMEOUT_SECS", 30)?),

            // Seen-post storage
            store_backend: parse_store_backend(&env_or_default("STORE_BACKEND", "sqlite"))?,
            database_path: PathBuf::from(env_or_default("DATABASE_PATH", "./data/posts.sqlite")),

            // Delivery
            sink: sink_from_env()?,
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "POLL_INTERVAL_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if url::Url::parse(&self.source_url).is_err() {
            return Err(ConfigError::InvalidValue {
                name: "SOURCE_URL".to_string(),
                message: format!("not a valid URL: '{}'", self.source_url),
            });
        }
        if self.scan_limit == Some(0) {
            return Err(ConfigError::InvalidValue {
                name: "SCAN_LIMIT".to_string(),
                message: "must be at least 1 when set".to_string(),
            });
        }
        match &self.sink {
            SinkConfig::Telegram(telegram) => {
                if telegram.bot_token.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        name: "TELEGRAM_BOT_TOKEN".to_string(),
                        message: "cannot be empty".to_string(),
                    });
                }
            }
            SinkConfig::Desktop(desktop) => {
                if desktop.command.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        name: "DESKTOP_NOTIFY_COMMAND".to_string(),
                        message: "cannot be empty".to_string(),
                    });
                }
                if desktop.preview_words == 0 {
                    return Err(ConfigError::InvalidValue {
                        name: "DESKTOP_PREVIEW_WORDS".to_string(),
                        message: "must be at least 1".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Configuration suitable for tests: in-memory store, desktop sink, local URLs.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            source_url: "http://127.0.0.1:1/index.php?v=Diary".to_string(),
            poll_interval: Duration::from_secs(1),
            preview_len: 64,
            scan_limit: None,
            http_timeout: Duration::from_secs(5),
            store_backend: StoreBackend::Memory,
            database_path: PathBuf::from("./data/test.sqlite"),
            sink: SinkConfig::Desktop(DesktopConfig {
                command: "true".to_string(),
                app_name: "diary-notifier".to_string(),
                icon_path: None,
                preview_words: 10,
            }),
        }
    }
}

fn sink_from_env() -> Result<SinkConfig, ConfigError> {
    match env_or_default("NOTIFY_SINK", "telegram").to_lowercase().as_str() {
        "telegram" => Ok(SinkConfig::Telegram(TelegramConfig {
            bot_token: required_env("TELEGRAM_BOT_TOKEN")?,
            chat_id: required_env("TELEGRAM_CHAT_ID")?.parse().map_err(|e| {
                ConfigError::ParseInt {
                    name: "TELEGRAM_CHAT_ID".to_string(),
                    source: e,
                }
            })?,
            api_url: env_or_default("TELEGRAM_API_URL", DEFAULT_TELEGRAM_API_URL),
        })),
        "desktop" => Ok(SinkConfig::Desktop(DesktopConfig {
            command: env_or_default("DESKTOP_NOTIFY_COMMAND", "notify-send"),
            app_name: env_or_default("DESKTOP_APP_NAME", "diary-notifier"),
            icon_path: optional_env("DESKTOP_ICON_PATH").map(PathBuf::from),
            preview_words: parse_env_usize("DESKTOP_PREVIEW_WORDS", 10)?,
        })),
        other => Err(ConfigError::InvalidValue {
            name: "NOTIFY_SINK".to_string(),
            message: format!("must be 'telegram' or 'desktop', got '{other}'"),
        }),
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_store_backend(value: &str) -> Result<StoreBackend, ConfigError> {
    match value.to_lowercase().as_str() {
        "sqlite" => Ok(StoreBackend::Sqlite),
        "memory" => Ok(StoreBackend::Memory),
        _ => Err(ConfigError::InvalidValue {
            name: "STORE_BACKEND".to_string(),
            message: format!("must be 'sqlite' or 'memory', got '{value}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_store_backend() {
        assert_eq!(parse_store_backend("sqlite").unwrap(), StoreBackend::Sqlite);
        assert_eq!(parse_store_backend("SQLite").unwrap(), StoreBackend::Sqlite);
        assert_eq!(parse_store_backend("memory").unwrap(), StoreBackend::Memory);
        assert!(parse_store_backend("postgres").is_err());
    }

    #[test]
    fn test_parse_defaults() {
        assert_eq!(parse_env_u64("NONEXISTENT_VAR", 60).unwrap(), 60);
        assert_eq!(parse_env_usize("NONEXISTENT_VAR", 64).unwrap(), 64);
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = Config {
            poll_interval: Duration::ZERO,
            ..Config::for_testing()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref name, .. }) if name == "POLL_INTERVAL_SECS"
        ));
    }

    #[test]
    fn test_validate_rejects_bad_source_url() {
        let config = Config {
            source_url: "not a url".to_string(),
            ..Config::for_testing()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_token() {
        let config = Config {
            sink: SinkConfig::Telegram(TelegramConfig {
                bot_token: String::new(),
                chat_id: 1,
                api_url: DEFAULT_TELEGRAM_API_URL.to_string(),
            }),
            ..Config::for_testing()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_testing_config_is_valid() {
        assert!(Config::for_testing().validate().is_ok());
    }
}
