use crate::client::RetryPolicy;
use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_directory")]
    pub directory: String,
    #[serde(default = "default_log_filename")]
    pub filename: String,
}

/// Where the course search lives and the fixed query parameters it expects.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_campus_id")]
    pub campus_id: String,
    #[serde(default = "default_rc_id")]
    pub rc_id: String,
    #[serde(default = "default_result_limit")]
    pub result_limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default)]
    pub impersonate: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    /// Absent means retry transient failures forever.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_output_prefix")]
    pub prefix: String,
    #[serde(default = "default_latest")]
    pub latest: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LogConfig,

    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Deprecated: fail a source when a course level cannot be found instead
    /// of recording `Unknown`.
    #[serde(default)]
    pub strict_course_level: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            campus_id: default_campus_id(),
            rc_id: default_rc_id(),
            result_limit: default_result_limit(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout: default_request_timeout(),
            proxy: None,
            impersonate: false,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
            max_attempts: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            prefix: default_output_prefix(),
            latest: default_latest(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: default_log_directory(),
            filename: default_log_filename(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            client: ClientConfig::default(),
            retry: RetryConfig::default(),
            output: OutputConfig::default(),
            logging: LogConfig::default(),
            concurrency: default_concurrency(),
            strict_course_level: false,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            Duration::from_millis(self.base_delay_ms),
            Duration::from_millis(self.max_delay_ms),
            self.multiplier,
            self.max_attempts,
        )
    }
}

impl Config {
    /// Loads `path` if given, otherwise `config.toml` when it exists, otherwise
    /// the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => {
                let config = Config::default();
                config.validate()?;
                Ok(config)
            }
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::FileRead)?;
        let config = Self::from_toml(&content)?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.site.base_url.is_empty() {
            return Err(ConfigError::MissingField("site.base_url".to_string()).into());
        }
        if !self.site.base_url.starts_with("http") {
            return Err(ConfigError::InvalidValue(format!(
                "site.base_url must start with http(s): {}",
                self.site.base_url
            ))
            .into());
        }

        if self.site.result_limit == 0 {
            return Err(ConfigError::InvalidValue(
                "site.result_limit must be greater than 0".to_string(),
            )
            .into());
        }

        if self.client.request_timeout == 0 {
            return Err(ConfigError::InvalidValue(
                "client.request_timeout must be greater than 0".to_string(),
            )
            .into());
        }

        if self.retry.multiplier < 1.0 {
            return Err(ConfigError::InvalidValue(format!(
                "retry.multiplier must be at least 1.0: {}",
                self.retry.multiplier
            ))
            .into());
        }

        if self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(ConfigError::InvalidValue(
                "retry.max_delay_ms must not be smaller than retry.base_delay_ms".to_string(),
            )
            .into());
        }

        if self.retry.max_attempts == Some(0) {
            return Err(ConfigError::InvalidValue(
                "retry.max_attempts must be greater than 0 when set".to_string(),
            )
            .into());
        }

        if self.concurrency == 0 {
            return Err(ConfigError::InvalidValue(
                "concurrency must be greater than 0".to_string(),
            )
            .into());
        }

        if self.output.prefix.is_empty() || self.output.latest.is_empty() {
            return Err(ConfigError::InvalidValue(
                "output.prefix and output.latest cannot be empty".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

fn default_base_url() -> String {
    "https://eservices.minnstate.edu/registration/search/".to_string()
}

fn default_campus_id() -> String {
    "072".to_string()
}

fn default_rc_id() -> String {
    "0072".to_string()
}

fn default_result_limit() -> u32 {
    250
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.0.0 Safari/537.36".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_base_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_output_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_output_prefix() -> String {
    "results".to_string()
}

fn default_latest() -> String {
    "latest".to_string()
}

fn default_concurrency() -> usize {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> String {
    "logs".to_string()
}

fn default_log_filename() -> String {
    "enrollment.log".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.site.result_limit, 250);
        assert_eq!(config.output.prefix, "results");
        assert_eq!(config.retry.max_attempts, None);
        assert_eq!(config.concurrency, 1);
        assert!(!config.strict_course_level);
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::from_toml(
            r#"
            concurrency = 4

            [site]
            base_url = "http://localhost:8080/search/"
            campus_id = "071"

            [retry]
            base_delay_ms = 10
            max_delay_ms = 100
            max_attempts = 7
            "#,
        )
        .unwrap();
        assert_eq!(config.concurrency, 4);
        assert_eq!(config.site.campus_id, "071");
        assert_eq!(config.site.rc_id, "0072");
        assert_eq!(config.retry.max_attempts, Some(7));
        assert_eq!(config.retry.policy().max_attempts(), Some(7));
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(Config::from_toml("concurrency = 0").is_err());
        assert!(Config::from_toml("[site]\nbase_url = \"ftp://x\"").is_err());
        assert!(Config::from_toml("[retry]\nmax_attempts = 0").is_err());
        assert!(Config::from_toml("[retry]\nbase_delay_ms = 10\nmax_delay_ms = 1").is_err());
    }
}
