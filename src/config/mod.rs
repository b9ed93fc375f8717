//! Configuration management for ASOLens

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Analysis backend used when nothing else is configured
pub const DEFAULT_API_HOST: &str = "http://localhost:8000";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the analysis backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_host: Option<String>,

    /// User preferences
    #[serde(default)]
    pub preferences: Preferences,

    /// Job polling behaviour
    #[serde(default)]
    pub polling: PollingConfig,

    /// Per-request timeouts
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// When the file was first written by `asolens init`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// User preferences
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preferences {
    /// Default output format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Treat 404 from the synchronous analysis endpoints as an empty result
    #[serde(default)]
    pub treat_not_found_as_empty: bool,
}

/// Polling settings for long-running analysis jobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_interval_secs() -> u64 {
    2
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    1000
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// HTTP timeouts, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Job submission and status calls
    #[serde(default = "default_job_secs")]
    pub job_secs: u64,

    /// Synchronous app/competitor/keyword analysis calls
    #[serde(default = "default_analysis_secs")]
    pub analysis_secs: u64,
}

fn default_job_secs() -> u64 {
    30
}

fn default_analysis_secs() -> u64 {
    60
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            job_secs: default_job_secs(),
            analysis_secs: default_analysis_secs(),
        }
    }
}

impl TimeoutConfig {
    pub fn job(&self) -> Duration {
        Duration::from_secs(self.job_secs)
    }

    pub fn analysis(&self) -> Duration {
        Duration::from_secs(self.analysis_secs)
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::Invalid(
            "Could not determine home directory".to_string(),
        ))?;

        Ok(home.join(".asolens").join("config.yaml"))
    }

    /// Resolve an optional override to a concrete path
    pub fn resolve_path(path: Option<&str>) -> Result<PathBuf> {
        match path {
            Some(p) => Ok(PathBuf::from(p)),
            None => Self::default_path(),
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound.into());
        }

        let contents = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&contents).map_err(ConfigError::from)?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration, falling back to defaults when no file exists
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match Self::load_from(Self::resolve_path(path)?) {
            Ok(config) => Ok(config),
            Err(crate::error::Error::Config(ConfigError::NotFound)) => {
                log::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents =
            serde_yaml::to_string(self).map_err(|e| ConfigError::SaveError(e.to_string()))?;

        std::fs::write(&path, contents)?;

        // Set file permissions to 600 on Unix systems
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&path)?.permissions();
            perms.set_mode(0o600);
            std::fs::set_permissions(&path, perms)?;
        }

        Ok(())
    }

    /// Backend base URL, honouring an explicit override first
    pub fn api_host(&self, override_host: Option<&str>) -> String {
        override_host
            .map(str::to_string)
            .or_else(|| self.api_host.clone())
            .unwrap_or_else(|| DEFAULT_API_HOST.to_string())
            .trim_end_matches('/')
            .to_string()
    }

    /// Reject settings that would make polling or requests meaningless
    pub fn validate(&self) -> Result<()> {
        if self.polling.interval_secs == 0 {
            return Err(ConfigError::Invalid("polling.interval_secs must be > 0".into()).into());
        }
        if self.polling.retry_attempts == 0 {
            return Err(ConfigError::Invalid("polling.retry_attempts must be > 0".into()).into());
        }
        if self.timeouts.job_secs == 0 || self.timeouts.analysis_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be > 0".into()).into());
        }
        Ok(())
    }
}
