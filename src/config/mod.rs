// ABOUTME: Configuration types and parsing for stagegate.yml.
// ABOUTME: Engine gateway, ITSM, callback, and polling settings.

mod env_value;

pub use env_value::EnvValue;

use crate::cm::{DEFAULT_LIFECYCLE, PollSettings, WaitTimeout};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "stagegate.yml";
pub const CONFIG_FILENAME_ALT: &str = "stagegate.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".stagegate/config.yml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub engine: Option<EngineConfig>,

    #[serde(default)]
    pub itsm: Option<ItsmConfig>,

    #[serde(default)]
    pub callback: Option<CallbackConfig>,

    #[serde(default)]
    pub approval: ApprovalConfig,

    #[serde(default)]
    pub deployment: DeploymentConfig,
}

/// How to reach the configuration engine gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub program: PathBuf,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default = "default_lifecycle")]
    pub lifecycle: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

fn default_lifecycle() -> String {
    DEFAULT_LIFECYCLE.to_string()
}

fn default_max_connections() -> usize {
    4
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItsmConfig {
    pub url: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    pub username: String,

    #[serde(default)]
    pub password: EnvValue,

    #[serde(default = "default_http_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Orchestrator endpoint notified when an approval settles.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackConfig {
    pub url: String,

    pub username: String,

    #[serde(default)]
    pub password: EnvValue,

    #[serde(default = "default_http_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApprovalConfig {
    #[serde(default = "default_approval_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    #[serde(default = "default_max_polls")]
    pub max_polls: u32,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_approval_interval(),
            max_polls: default_max_polls(),
        }
    }
}

fn default_approval_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_max_polls() -> u32 {
    60
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentConfig {
    #[serde(default = "default_deployment_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Absent means the 24 hour default.
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_deployment_interval(),
            timeout: None,
        }
    }
}

fn default_deployment_interval() -> Duration {
    Duration::from_millis(200)
}

impl DeploymentConfig {
    /// Poll settings, with an optional caller override in milliseconds (`-1` = default).
    pub fn poll_settings(&self, timeout_override_ms: Option<i64>) -> Result<PollSettings> {
        let timeout = match timeout_override_ms {
            Some(ms) => WaitTimeout::from_millis(ms)?,
            None => self
                .timeout
                .map(WaitTimeout::Limit)
                .unwrap_or(WaitTimeout::Default),
        };
        Ok(PollSettings {
            interval: self.poll_interval,
            timeout,
        })
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    fn validate(&self) -> Result<()> {
        if let Some(engine) = &self.engine {
            if engine.program.as_os_str().is_empty() {
                return Err(Error::InvalidConfig("engine.program cannot be empty".into()));
            }
            if engine.max_connections == 0 {
                return Err(Error::InvalidConfig(
                    "engine.max_connections must be at least 1".into(),
                ));
            }
        }
        if self.approval.poll_interval.is_zero() {
            return Err(Error::InvalidConfig(
                "approval.poll_interval must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn engine(&self) -> Result<&EngineConfig> {
        self.engine.as_ref().ok_or(Error::MissingSection("engine"))
    }

    pub fn itsm(&self) -> Result<&ItsmConfig> {
        self.itsm.as_ref().ok_or(Error::MissingSection("itsm"))
    }

    pub fn callback(&self) -> Result<&CallbackConfig> {
        self.callback.as_ref().ok_or(Error::MissingSection("callback"))
    }
}
