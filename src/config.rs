use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "BloodTrack";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_ADDR: &str = "127.0.0.1:8787";
pub const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_EXTRACT_TIMEOUT_SECS: u64 = 120;

/// Maximum number of files accepted in one upload batch.
pub const MAX_UPLOAD_FILES: usize = 20;

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "bloodtrack=info,bloodtrack_lib=info,tower_http=warn"
}

/// Default data directory: `<platform data dir>/BloodTrack`.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Settings for the extraction collaborator.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub data_dir: PathBuf,
    pub extraction: ExtractionConfig,
}

impl AppConfig {
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("bloodtrack.db")
    }

    pub fn documents_dir(&self) -> PathBuf {
        self.data_dir.join("documents")
    }

    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read settings through `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let addr_raw = get("BLOODTRACK_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = addr_raw.parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::Invalid {
                var: "BLOODTRACK_ADDR",
                reason: e.to_string(),
            }
        })?;

        let data_dir = get("BLOODTRACK_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);

        let max_tokens = parse_or("BLOODTRACK_MAX_TOKENS", get("BLOODTRACK_MAX_TOKENS"), DEFAULT_MAX_TOKENS)?;
        let timeout_secs = parse_or(
            "BLOODTRACK_EXTRACT_TIMEOUT_SECS",
            get("BLOODTRACK_EXTRACT_TIMEOUT_SECS"),
            DEFAULT_EXTRACT_TIMEOUT_SECS,
        )?;

        Ok(Self {
            addr,
            data_dir,
            extraction: ExtractionConfig {
                api_key: get("ANTHROPIC_API_KEY"),
                base_url: get("ANTHROPIC_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_ANTHROPIC_BASE_URL.to_string()),
                model: get("BLOODTRACK_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                max_tokens,
                timeout_secs,
            },
        })
    }
}

fn parse_or<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.addr.to_string(), DEFAULT_ADDR);
        assert_eq!(config.data_dir, default_data_dir());
        assert_eq!(config.extraction.api_key, None);
        assert_eq!(config.extraction.base_url, DEFAULT_ANTHROPIC_BASE_URL);
        assert_eq!(config.extraction.max_tokens, 1024);
        assert_eq!(config.extraction.timeout_secs, 120);
    }

    #[test]
    fn overrides_are_read() {
        let config = AppConfig::from_lookup(lookup(&[
            ("BLOODTRACK_ADDR", "0.0.0.0:9000"),
            ("BLOODTRACK_DATA_DIR", "/tmp/bt"),
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("BLOODTRACK_MODEL", "other-model"),
            ("BLOODTRACK_MAX_TOKENS", "2048"),
        ]))
        .unwrap();
        assert_eq!(config.addr.port(), 9000);
        assert_eq!(config.database_path(), PathBuf::from("/tmp/bt/bloodtrack.db"));
        assert_eq!(config.documents_dir(), PathBuf::from("/tmp/bt/documents"));
        assert_eq!(config.extraction.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.extraction.model, "other-model");
        assert_eq!(config.extraction.max_tokens, 2048);
    }

    #[test]
    fn blank_api_key_is_unset() {
        let config = AppConfig::from_lookup(lookup(&[("ANTHROPIC_API_KEY", "  ")])).unwrap();
        assert_eq!(config.extraction.api_key, None);
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("BLOODTRACK_MAX_TOKENS", "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "BLOODTRACK_MAX_TOKENS", .. }));
        assert!(AppConfig::from_lookup(lookup(&[("BLOODTRACK_ADDR", "nowhere")])).is_err());
    }

    #[test]
    fn app_name_is_bloodtrack() {
        assert_eq!(APP_NAME, "BloodTrack");
        assert!(default_data_dir().ends_with("BloodTrack"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.3.0");
    }
}
