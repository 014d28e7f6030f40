//! Scripted build runner returning queued outcomes.

use crate::deployment::ports::{
    BuildInvocation, BuildOutcome, BuildRunner, BuildRunnerError, BuildRunnerResult,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Build runner that records invocations instead of spawning processes.
///
/// Each run pops the next queued outcome; with an empty queue the command
/// succeeds with no output.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBuildRunner {
    state: Arc<Mutex<ScriptState>>,
}

#[derive(Debug, Default)]
struct ScriptState {
    outcomes: VecDeque<BuildOutcome>,
    invocations: Vec<BuildInvocation>,
}

impl ScriptedBuildRunner {
    /// Creates a runner where every command succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the outcome of the next run.
    pub fn push_outcome(&self, outcome: BuildOutcome) {
        if let Ok(mut state) = self.state.lock() {
            state.outcomes.push_back(outcome);
        }
    }

    /// Returns the invocations received so far, in order.
    #[must_use]
    pub fn invocations(&self) -> Vec<BuildInvocation> {
        self.state
            .lock()
            .map(|state| state.invocations.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl BuildRunner for ScriptedBuildRunner {
    async fn run(&self, invocation: &BuildInvocation) -> BuildRunnerResult<BuildOutcome> {
        let mut state = self.state.lock().map_err(|err| {
            BuildRunnerError::spawn(invocation, std::io::Error::other(err.to_string()))
        })?;
        state.invocations.push(invocation.clone());
        Ok(state.outcomes.pop_front().unwrap_or_else(|| BuildOutcome {
            exit_code: Some(0),
            ..BuildOutcome::default()
        }))
    }
}
