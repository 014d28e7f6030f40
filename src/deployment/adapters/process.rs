//! Build runner spawning local processes.

use crate::deployment::ports::{
    BuildInvocation, BuildOutcome, BuildRunner, BuildRunnerError, BuildRunnerResult,
};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Runs build commands with `tokio::process`, capturing their output.
#[derive(Debug, Clone, Default)]
pub struct ProcessBuildRunner;

impl ProcessBuildRunner {
    /// Creates a process-backed runner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl BuildRunner for ProcessBuildRunner {
    async fn run(&self, invocation: &BuildInvocation) -> BuildRunnerResult<BuildOutcome> {
        debug!(
            command = %invocation.display_command(),
            cwd = %invocation.working_dir.display(),
            "running build command"
        );
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .envs(invocation.env.iter().map(|(key, value)| (key, value)))
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| BuildRunnerError::spawn(invocation, err))?;

        Ok(BuildOutcome {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
