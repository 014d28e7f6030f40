//! Build tooling port.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Result type for build runner operations.
pub type BuildRunnerResult<T> = Result<T, BuildRunnerError>;

/// One external command to run inside a working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInvocation {
    /// Directory the command runs in.
    pub working_dir: PathBuf,
    /// Program to execute.
    pub program: String,
    /// Program arguments.
    pub args: Vec<String>,
    /// Extra environment variables layered over the inherited environment.
    pub env: Vec<(String, String)>,
}

impl BuildInvocation {
    /// Creates an invocation with no extra environment.
    #[must_use]
    pub fn new(working_dir: impl Into<PathBuf>, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            working_dir: working_dir.into(),
            program: program.into(),
            args,
            env: Vec::new(),
        }
    }

    /// Adds an environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Returns the command line for diagnostics.
    #[must_use]
    pub fn display_command(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildOutcome {
    /// Process exit code, absent when killed by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl BuildOutcome {
    /// Returns whether the command exited with status zero.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        matches!(self.exit_code, Some(0))
    }
}

/// Runs package-manager and build commands.
#[async_trait]
pub trait BuildRunner: Send + Sync {
    /// Runs the command to completion and captures its output.
    ///
    /// A non-zero exit is reported through [`BuildOutcome`], not as an error.
    ///
    /// # Errors
    ///
    /// Returns [`BuildRunnerError::Spawn`] when the command cannot start.
    async fn run(&self, invocation: &BuildInvocation) -> BuildRunnerResult<BuildOutcome>;
}

/// Errors returned by build runners.
#[derive(Debug, Clone, Error)]
pub enum BuildRunnerError {
    /// The command could not be started or awaited.
    #[error("failed to run `{command}`: {cause}")]
    Spawn {
        /// Command line that failed.
        command: String,
        /// Underlying failure.
        cause: Arc<dyn std::error::Error + Send + Sync>,
    },
}

impl BuildRunnerError {
    /// Wraps a spawn failure for the given invocation.
    pub fn spawn(
        invocation: &BuildInvocation,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Spawn {
            command: invocation.display_command(),
            cause: Arc::new(err),
        }
    }
}
