//! github-watch configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Event API connection settings
    pub api: ApiConfig,

    /// Poll cadence and batch sizing
    pub poll: PollConfig,

    /// Summary layout
    pub render: RenderConfig,

    /// Stream merge settings
    pub merge: MergeConfig,

    /// Credential storage
    pub auth: AuthConfig,

    /// Source descriptors (`org:name`, `repo:owner/name`, ...) watched in addition to CLI sources
    pub sources: Vec<String>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .github-watch.yml
        let local_config = PathBuf::from(".github-watch.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/github-watch/github-watch.yml
        if let Some(user_config) = user_config_path()
            && user_config.exists()
        {
            match Self::load_from_file(&user_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Errors are swallowed: a broken config file is reported properly by
    /// [`Config::load`] once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => [Some(PathBuf::from(".github-watch.yml")), user_config_path()]
                .into_iter()
                .flatten()
                .collect(),
        };

        candidates
            .iter()
            .find(|p| p.exists())
            .and_then(|p| fs::read_to_string(p).ok())
            .and_then(|content| serde_yaml::from_str::<Self>(&content).ok())
            .and_then(|config| config.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("github-watch").join("github-watch.yml"))
}

/// Event API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Environment variable that may hold a token
    #[serde(rename = "token-env")]
    pub token_env: String,

    /// Per-request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            token_env: "GITHUB_TOKEN".to_string(),
            timeout_ms: 30_000,
            user_agent: format!("github-watch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Poll cadence and batch sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Interval used until the server sends a poll-interval hint
    #[serde(rename = "default-interval-secs")]
    pub default_interval_secs: u64,

    /// Lower bound applied to every interval
    #[serde(rename = "min-interval-secs")]
    pub min_interval_secs: u64,

    /// Maximum events returned per source per cycle
    pub count: usize,

    /// Capacity of the poller → merger queue
    #[serde(rename = "channel-capacity")]
    pub channel_capacity: usize,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            default_interval_secs: crate::DEFAULT_POLL_INTERVAL_SECS,
            min_interval_secs: 1,
            count: crate::DEFAULT_COUNT,
            channel_capacity: 64,
        }
    }
}

/// Summary layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Comment bodies are cut after this many lines
    #[serde(rename = "body-lines")]
    pub body_lines: usize,

    /// Width of the repository column
    #[serde(rename = "repo-column")]
    pub repo_column: usize,

    /// chrono format string for timestamps
    #[serde(rename = "time-format")]
    pub time_format: String,

    /// Colorize output
    pub color: bool,

    /// Show timestamps in the local zone (UTC otherwise)
    #[serde(rename = "local-time")]
    pub local_time: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            body_lines: 5,
            repo_column: 30,
            time_format: "%b %-d %-I:%M:%S %p".to_string(),
            color: true,
            local_time: true,
        }
    }
}

/// Stream merge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// How many emitted ids are remembered for cross-source dedup
    #[serde(rename = "dedup-window")]
    pub dedup_window: usize,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self { dedup_window: 1024 }
    }
}

/// Credential storage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JSON file holding `{"login": ..., "token": ...}`
    #[serde(rename = "token-file")]
    pub token_file: PathBuf,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let token_file = dirs::config_dir()
            .map(|d| d.join("github-watch"))
            .unwrap_or_else(|| PathBuf::from(".github-watch"))
            .join("auth.json");

        Self { token_file }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "https://api.github.com");
        assert_eq!(config.api.token_env, "GITHUB_TOKEN");
        assert_eq!(config.poll.default_interval_secs, 30);
        assert_eq!(config.poll.min_interval_secs, 1);
        assert_eq!(config.render.repo_column, 30);
        assert_eq!(config.render.body_lines, 5);
        assert!(config.sources.is_empty());
        assert!(config.auth.token_file.ends_with("auth.json"));
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
api:
  base-url: https://ghe.example.com/api/v3
  timeout-ms: 5000
poll:
  count: 50
render:
  color: false
sources:
  - org:rust-lang
  - repo:tokio-rs/tokio
log-level: DEBUG
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.api.base_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.api.timeout(), Duration::from_secs(5));
        // Unset keys in a present section keep their defaults
        assert_eq!(config.api.token_env, "GITHUB_TOKEN");
        assert_eq!(config.poll.count, 50);
        assert_eq!(config.poll.default_interval_secs, 30);
        assert!(!config.render.color);
        assert_eq!(config.render.repo_column, 30);
        assert_eq!(config.sources, vec!["org:rust-lang", "repo:tokio-rs/tokio"]);
        assert_eq!(config.log_level.as_deref(), Some("DEBUG"));
    }

    #[test]
    fn test_load_explicit_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("gw.yml");
        fs::write(&path, "merge:\n  dedup-window: 16\nlog-level: WARN\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.merge.dedup_window, 16);
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("WARN"));
    }

    #[test]
    fn test_load_explicit_missing_path_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.yml");
        assert!(Config::load(Some(&path)).is_err());
        assert_eq!(Config::load_log_level(Some(&path)), None);
    }

    #[test]
    fn test_load_invalid_yaml_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.yml");
        fs::write(&path, "poll: [not, a, map]").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }
}
