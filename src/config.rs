//! Agent configuration.
//!
//! [`AgentArgs`] is parsed once from the command line and environment and
//! turned into an [`AgentConfig`], which is passed by value or `Arc` to the
//! adapters and services. Nothing reads configuration from globals.

use crate::deployment::provisioning::ReadinessSettings;
use camino::Utf8PathBuf;
use clap::Parser;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by configuration validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No default region was provided.
    #[error("default region must not be empty")]
    EmptyRegion,

    /// The readiness timeout is zero.
    #[error("instance ready timeout must be greater than zero")]
    ZeroTimeout,

    /// Polling would never happen within the timeout.
    #[error("poll interval ({poll_secs}s) exceeds ready timeout ({timeout_secs}s)")]
    PollIntervalExceedsTimeout {
        /// Configured poll interval in seconds.
        poll_secs: u64,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
}

/// Command-line and environment options of the MCP server.
#[derive(Debug, Clone, Parser)]
#[command(name = "skylift-mcp")]
#[command(about = "Deploy applications to AWS through MCP tools", long_about = None)]
pub struct AgentArgs {
    /// Region used when a tool call does not name one
    #[arg(long, env = "AWS_DEFAULT_REGION", default_value = "us-east-1")]
    pub region: String,

    /// Directory holding one JSON record per deployment
    #[arg(long, env = "SKYLIFT_STATE_DIR", default_value = "./deployments")]
    pub state_dir: Utf8PathBuf,

    /// Seconds between instance state queries
    #[arg(long, env = "SKYLIFT_POLL_INTERVAL_SECS", default_value_t = 10)]
    pub poll_interval_secs: u64,

    /// Seconds to wait after an instance is reachable
    #[arg(long, env = "SKYLIFT_SETTLE_SECS", default_value_t = 60)]
    pub settle_secs: u64,

    /// Upper bound in seconds on waiting for an instance
    #[arg(long, env = "SKYLIFT_READY_TIMEOUT_SECS", default_value_t = 600)]
    pub ready_timeout_secs: u64,

    /// Replace the EC2 and S3 providers with in-memory ones
    #[arg(long, env = "SKYLIFT_SIMULATE")]
    pub simulate: bool,

    /// Emit logs as JSON objects
    #[arg(long, env = "SKYLIFT_LOG_JSON")]
    pub log_json: bool,
}

/// Validated runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Region used when a tool call does not name one.
    pub region: String,
    /// Directory holding deployment records.
    pub state_dir: Utf8PathBuf,
    /// Instance readiness timing.
    pub readiness: ReadinessSettings,
    /// Whether in-memory providers replace AWS.
    pub simulate: bool,
    /// Whether logs are JSON formatted.
    pub log_json: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_owned(),
            state_dir: Utf8PathBuf::from("./deployments"),
            readiness: ReadinessSettings::default(),
            simulate: false,
            log_json: false,
        }
    }
}

impl AgentConfig {
    /// Checks invariants between settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an empty region, a zero timeout, or a poll
    /// interval larger than the timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.trim().is_empty() {
            return Err(ConfigError::EmptyRegion);
        }
        if self.readiness.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.readiness.poll_interval > self.readiness.timeout {
            return Err(ConfigError::PollIntervalExceedsTimeout {
                poll_secs: self.readiness.poll_interval.as_secs(),
                timeout_secs: self.readiness.timeout.as_secs(),
            });
        }
        Ok(())
    }
}

impl TryFrom<AgentArgs> for AgentConfig {
    type Error = ConfigError;

    fn try_from(args: AgentArgs) -> Result<Self, Self::Error> {
        let config = Self {
            region: args.region.trim().to_owned(),
            state_dir: args.state_dir,
            readiness: ReadinessSettings {
                poll_interval: Duration::from_secs(args.poll_interval_secs),
                settle_delay: Duration::from_secs(args.settle_secs),
                timeout: Duration::from_secs(args.ready_timeout_secs),
            },
            simulate: args.simulate,
            log_json: args.log_json,
        };
        config.validate()?;
        Ok(config)
    }
}
