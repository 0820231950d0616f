//! Application configuration management.
//!
//! Everything is read from environment variables (the binary loads a `.env`
//! file first). Notion credentials and database ids are not validated here:
//! a missing value only surfaces when a request needs it.

use std::time::Duration;

use thiserror::Error;

/// Default Notion REST endpoint
pub const DEFAULT_API_URL: &str = "https://api.notion.com/v1";

/// Delay between capture loop ticks.
/// 250ms keeps the camera responsive without hammering the CPU.
const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub notion_token: Option<String>,
    pub meetings_db_id: Option<String>,
    pub attendance_db_id: Option<String>,
    pub api_url: String,
    /// `ENV=dev`: debug logging and frame preview
    pub debug: bool,
    pub log_level: String,
    pub cache_enabled: bool,
    pub camera_index: u32,
    pub poll_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let camera_index = match non_empty("CAMERA_INDEX") {
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
                name: "CAMERA_INDEX",
                value: v,
            })?,
            None => 0,
        };

        let poll_interval_ms = match non_empty("POLL_INTERVAL_MS") {
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidValue {
                name: "POLL_INTERVAL_MS",
                value: v,
            })?,
            None => DEFAULT_POLL_INTERVAL_MS,
        };

        Ok(Self {
            notion_token: non_empty("NOTION_TOKEN"),
            meetings_db_id: non_empty("NOTION_MEETINGS_DBID"),
            attendance_db_id: non_empty("NOTION_ATTENDANCE_DBID"),
            api_url: non_empty("NOTION_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            debug: lookup("ENV").as_deref() == Some("dev"),
            log_level: non_empty("LOG_LEVEL").unwrap_or_else(|| "INFO".to_string()),
            cache_enabled: lookup("CACHE_ENABLED").as_deref() == Some("true"),
            camera_index,
            poll_interval: Duration::from_millis(poll_interval_ms),
        })
    }

    /// Default tracing filter directive: debug in dev, otherwise `LOG_LEVEL`.
    /// Accepts the usual level spellings (`WARNING`, `CRITICAL`) as well.
    pub fn log_filter(&self) -> String {
        if self.debug {
            return "debug".to_string();
        }
        match self.log_level.to_ascii_lowercase().as_str() {
            "warning" => "warn".to_string(),
            "critical" | "fatal" => "error".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert!(config.notion_token.is_none());
        assert!(config.meetings_db_id.is_none());
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(!config.debug);
        assert!(!config.cache_enabled);
        assert_eq!(config.camera_index, 0);
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.log_filter(), "info");
    }

    #[test]
    fn test_full_environment() {
        let config = config_from(&[
            ("NOTION_TOKEN", "secret_abc"),
            ("NOTION_MEETINGS_DBID", "meetings"),
            ("NOTION_ATTENDANCE_DBID", "attendance"),
            ("NOTION_API_URL", "http://localhost:9000/v1/"),
            ("LOG_LEVEL", "WARNING"),
            ("CACHE_ENABLED", "true"),
            ("CAMERA_INDEX", "2"),
            ("POLL_INTERVAL_MS", "1000"),
        ])
        .unwrap();
        assert_eq!(config.notion_token.as_deref(), Some("secret_abc"));
        assert_eq!(config.meetings_db_id.as_deref(), Some("meetings"));
        assert_eq!(config.attendance_db_id.as_deref(), Some("attendance"));
        assert_eq!(config.api_url, "http://localhost:9000/v1");
        assert!(config.cache_enabled);
        assert_eq!(config.camera_index, 2);
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.log_filter(), "warn");
    }

    #[test]
    fn test_dev_env_forces_debug_logging() {
        let config = config_from(&[("ENV", "dev"), ("LOG_LEVEL", "ERROR")]).unwrap();
        assert!(config.debug);
        assert_eq!(config.log_filter(), "debug");
    }

    #[test]
    fn test_cache_flag_is_exact() {
        assert!(!config_from(&[("CACHE_ENABLED", "TRUE")]).unwrap().cache_enabled);
        assert!(!config_from(&[("CACHE_ENABLED", "1")]).unwrap().cache_enabled);
    }

    #[test]
    fn test_invalid_numbers_are_rejected() {
        let err = config_from(&[("POLL_INTERVAL_MS", "fast")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name: "POLL_INTERVAL_MS", .. }));
        assert!(config_from(&[("CAMERA_INDEX", "-1")]).is_err());
    }
}
