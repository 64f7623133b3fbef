//! Service configuration.
//!
//! Settings come from an optional TOML file, then environment overrides
//! (`BASE_URL`, `RAI_BASE_URL`, `FETCH_QUEUE_SIZE`, `LOG_LEVEL`,
//! `LISTEN_ADDR`). A missing file yields `Config::default()`. Unknown keys
//! are accepted but logged as a warning since they are usually typos.
//!
//! The conversion core never reads any of this directly: [`Config::validate`]
//! produces the [`ConvertConfig`] bundle it is handed.
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::feed::{ConvertConfig, GuidStrategy, DEFAULT_POOL_SIZE};
use crate::media::ResolveStrategy;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// A setting has a value that cannot be used.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

// ============================================================================
// Configuration Structs
// ============================================================================

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Top-level service configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Public origin of this service, used for links it emits.
    pub base_url: String,

    /// Provider origin feeds and images are fetched from.
    pub rai_base_url: String,

    /// Maximum concurrent media resolutions per conversion. Must be > 0.
    pub pool_size: usize,

    /// One of trace, debug, info, warn, error, off.
    pub log_level: String,

    /// Address `serve` binds to.
    pub listen_addr: String,

    /// Per-request timeout for outbound calls, in seconds.
    pub request_timeout_secs: u64,

    pub resolve_strategy: ResolveStrategy,

    pub guid_strategy: GuidStrategy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/".to_string(),
            rai_base_url: "https://www.raiplaysound.it/".to_string(),
            pool_size: DEFAULT_POOL_SIZE,
            log_level: "info".to_string(),
            listen_addr: "127.0.0.1:3000".to_string(),
            request_timeout_secs: 30,
            resolve_strategy: ResolveStrategy::default(),
            guid_strategy: GuidStrategy::default(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: &[&str] = &[
        "base_url",
        "rai_base_url",
        "pool_size",
        "log_level",
        "listen_addr",
        "request_timeout_secs",
        "resolve_strategy",
        "guid_strategy",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check file size before reading to avoid loading a huge or corrupted file.
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // File deleted between metadata and read
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Applies overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup`, keyed by environment variable name.
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = get("RAI_BASE_URL") {
            self.rai_base_url = v;
        }
        if let Some(v) = get("FETCH_QUEUE_SIZE") {
            self.pool_size = v.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "FETCH_QUEUE_SIZE",
                value: v.clone(),
            })?;
        }
        if let Some(v) = get("LOG_LEVEL") {
            self.log_level = v.trim().to_ascii_lowercase();
        }
        if let Some(v) = get("LISTEN_ADDR") {
            self.listen_addr = v;
        }
        Ok(())
    }

    /// Checks every setting and builds the conversion parameters.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] for the first unusable setting: a URL
    /// that is not absolute, a zero pool size or timeout, an unknown log
    /// level, or an unparseable listen address.
    pub fn validate(&self) -> Result<ConvertConfig, ConfigError> {
        let rai_base_url = parse_base_url("rai_base_url", &self.rai_base_url)?;
        let base_url = parse_base_url("base_url", &self.base_url)?;

        if self.pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "pool_size",
                value: self.pool_size.to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "request_timeout_secs",
                value: self.request_timeout_secs.to_string(),
            });
        }
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "log_level",
                value: self.log_level.clone(),
            });
        }
        self.listen_addr()?;

        Ok(ConvertConfig {
            rai_base_url,
            base_url,
            pool_size: self.pool_size,
            resolve_strategy: self.resolve_strategy,
            guid_strategy: self.guid_strategy,
        })
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen_addr
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "listen_addr",
                value: self.listen_addr.clone(),
            })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Parses an absolute http(s) URL, adding the trailing slash relative
/// references need to resolve beneath it.
fn parse_base_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    };

    let mut url = Url::parse(value.trim()).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.base_url, "http://localhost:3000/");
        assert_eq!(config.rai_base_url, "https://www.raiplaysound.it/");
        assert_eq!(config.pool_size, 5);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.resolve_strategy, ResolveStrategy::FollowRedirects);
        assert_eq!(config.guid_strategy, GuidStrategy::EpisodeTitle);
    }

    #[test]
    fn test_default_config_validates() {
        let convert = Config::default().validate().unwrap();
        assert_eq!(convert.rai_base_url.as_str(), "https://www.raiplaysound.it/");
        assert_eq!(convert.base_url.as_str(), "http://localhost:3000/");
        assert_eq!(convert.pool_size, 5);
    }

    #[test]
    fn test_missing_file_returns_default() {
        let path = Path::new("/tmp/raiplayrss_test_nonexistent_config.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_empty_file_returns_default() {
        let dir = std::env::temp_dir().join("raiplayrss_config_test_empty");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "   \n  \n  ").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config, Config::default());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_full_config() {
        let dir = std::env::temp_dir().join("raiplayrss_config_test_full");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let content = r#"
base_url = "https://feeds.example.org/"
rai_base_url = "https://rai.example.org/"
pool_size = 2
log_level = "debug"
listen_addr = "0.0.0.0:8080"
request_timeout_secs = 10
resolve_strategy = "manual_redirect"
guid_strategy = "hashed"
"#;
        std::fs::write(&path, content).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.base_url, "https://feeds.example.org/");
        assert_eq!(config.pool_size, 2);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.resolve_strategy, ResolveStrategy::ManualRedirect);
        assert_eq!(config.guid_strategy, GuidStrategy::Hashed);
        assert_eq!(
            config.listen_addr().unwrap(),
            "0.0.0.0:8080".parse::<SocketAddr>().unwrap()
        );

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let dir = std::env::temp_dir().join("raiplayrss_config_test_invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "this is not [valid toml").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().contains("Invalid TOML"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_keys_accepted() {
        let dir = std::env::temp_dir().join("raiplayrss_config_test_unknown");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "pool_size = 3\npoolsize = 4\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.pool_size, 3);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_unknown_strategy_rejected() {
        let dir = std::env::temp_dir().join("raiplayrss_config_test_strategy");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "resolve_strategy = \"teleport\"\n").unwrap();

        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_too_large_file_rejected() {
        let dir = std::env::temp_dir().join("raiplayrss_config_test_too_large");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "a".repeat(1_048_577)).unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge(_)));
        assert!(err.to_string().contains("too large"));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[
                ("BASE_URL", "https://feeds.example.org/"),
                ("RAI_BASE_URL", "https://rai.example.org/"),
                ("FETCH_QUEUE_SIZE", "8"),
                ("LOG_LEVEL", "DEBUG"),
                ("LISTEN_ADDR", "0.0.0.0:9000"),
            ]))
            .unwrap();

        assert_eq!(config.base_url, "https://feeds.example.org/");
        assert_eq!(config.rai_base_url, "https://rai.example.org/");
        assert_eq!(config.pool_size, 8);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.listen_addr, "0.0.0.0:9000");
    }

    #[test]
    fn test_empty_env_values_ignored() {
        let mut config = Config::default();
        config
            .apply_overrides(env(&[("BASE_URL", ""), ("FETCH_QUEUE_SIZE", "  ")]))
            .unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_non_numeric_queue_size_rejected() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(env(&[("FETCH_QUEUE_SIZE", "many")]))
            .unwrap_err();
        match err {
            ConfigError::InvalidValue { key, value } => {
                assert_eq!(key, "FETCH_QUEUE_SIZE");
                assert_eq!(value, "many");
            }
            e => panic!("Expected InvalidValue, got {:?}", e),
        }
    }

    #[test]
    fn test_zero_pool_size_rejected() {
        let config = Config {
            pool_size: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key: "pool_size", .. })
        ));
    }

    #[test]
    fn test_relative_base_url_rejected() {
        let config = Config {
            rai_base_url: "www.raiplaysound.it".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key: "rai_base_url", .. })
        ));
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = Config {
            rai_base_url: "https://rai.example.org/api".to_string(),
            ..Config::default()
        };
        let convert = config.validate().unwrap();
        assert_eq!(convert.rai_base_url.as_str(), "https://rai.example.org/api/");
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let config = Config {
            log_level: "chatty".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key: "log_level", .. })
        ));
    }

    #[test]
    fn test_bad_listen_addr_rejected() {
        let config = Config {
            listen_addr: "localhost".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key: "listen_addr", .. })
        ));
    }
}
