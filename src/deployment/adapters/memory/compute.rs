//! In-memory compute provider simulating security groups and instances.

use crate::deployment::{
    domain::{InstanceSnapshot, RUNNING_STATE},
    ports::{
        ComputeApi, ComputeApiError, ComputeApiResult, InstanceLaunchRequest,
        SecurityGroupRequest,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

const PENDING_STATE: &str = "pending";

/// Simulated compute provider.
///
/// Instances report `pending` for a configurable number of polls and then
/// `running` with a documentation-range public address. Identifiers are
/// sequential, so runs are reproducible.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCompute {
    state: Arc<RwLock<ComputeState>>,
}

#[derive(Debug, Default)]
struct ComputeState {
    pending_polls: u32,
    never_ready: bool,
    describe_failure: Option<String>,
    next_id: u32,
    groups: BTreeMap<(String, String), String>,
    ingress: BTreeMap<String, Vec<u16>>,
    instances: BTreeMap<String, SimulatedInstance>,
}

#[derive(Debug, Clone)]
struct SimulatedInstance {
    request: InstanceLaunchRequest,
    public_ip: String,
    launch_time: DateTime<Utc>,
    polls: u32,
}

impl ComputeState {
    fn allocate(&mut self) -> u32 {
        self.next_id = self.next_id.saturating_add(1);
        self.next_id
    }
}

impl InMemoryCompute {
    /// Creates a provider whose instances run on the first poll.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider whose instances report `pending` for `polls`
    /// queries before running.
    #[must_use]
    pub fn with_pending_polls(polls: u32) -> Self {
        let provider = Self::default();
        if let Ok(mut state) = provider.state.write() {
            state.pending_polls = polls;
        }
        provider
    }

    /// Creates a provider whose instances never leave `pending`.
    #[must_use]
    pub fn never_ready() -> Self {
        let provider = Self::default();
        if let Ok(mut state) = provider.state.write() {
            state.never_ready = true;
        }
        provider
    }

    /// Makes every subsequent state query fail with `message`.
    ///
    /// # Errors
    ///
    /// Returns provider errors when lock acquisition fails.
    pub fn fail_describe(&self, message: impl Into<String>) -> ComputeApiResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ComputeApiError::provider_message(err.to_string()))?;
        state.describe_failure = Some(message.into());
        Ok(())
    }

    /// Returns every launch request received, in order of identifiers.
    #[must_use]
    pub fn launches(&self) -> Vec<InstanceLaunchRequest> {
        self.state
            .read()
            .map(|state| {
                state
                    .instances
                    .values()
                    .map(|instance| instance.request.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the ports opened on a security group.
    #[must_use]
    pub fn ingress(&self, group_id: &str) -> Vec<u16> {
        self.state
            .read()
            .ok()
            .and_then(|state| state.ingress.get(group_id).cloned())
            .unwrap_or_default()
    }

    /// Returns the names of all created security groups.
    #[must_use]
    pub fn security_group_names(&self) -> Vec<String> {
        self.state
            .read()
            .map(|state| state.groups.keys().map(|(_, name)| name.clone()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ComputeApi for InMemoryCompute {
    async fn create_security_group(
        &self,
        request: &SecurityGroupRequest,
    ) -> ComputeApiResult<String> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ComputeApiError::provider_message(err.to_string()))?;
        let key = (request.region.clone(), request.name.clone());
        if state.groups.contains_key(&key) {
            return Err(ComputeApiError::AlreadyExists {
                resource: request.name.clone(),
            });
        }
        let group_id = format!("sg-{:08x}", state.allocate());
        state.groups.insert(key, group_id.clone());
        Ok(group_id)
    }

    async fn find_security_group(
        &self,
        region: &str,
        name: &str,
    ) -> ComputeApiResult<Option<String>> {
        let state = self
            .state
            .read()
            .map_err(|err| ComputeApiError::provider_message(err.to_string()))?;
        Ok(state
            .groups
            .get(&(region.to_owned(), name.to_owned()))
            .cloned())
    }

    async fn authorize_ingress(
        &self,
        _region: &str,
        group_id: &str,
        ports: &[u16],
    ) -> ComputeApiResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ComputeApiError::provider_message(err.to_string()))?;
        if !state.groups.values().any(|id| id == group_id) {
            return Err(ComputeApiError::NotFound(format!("security group {group_id}")));
        }
        state
            .ingress
            .entry(group_id.to_owned())
            .or_default()
            .extend_from_slice(ports);
        Ok(())
    }

    async fn run_instance(&self, request: &InstanceLaunchRequest) -> ComputeApiResult<String> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ComputeApiError::provider_message(err.to_string()))?;
        let sequence = state.allocate();
        let instance_id = format!("i-{sequence:017x}");
        let host = sequence.rem_euclid(250).saturating_add(1);
        state.instances.insert(
            instance_id.clone(),
            SimulatedInstance {
                request: request.clone(),
                public_ip: format!("203.0.113.{host}"),
                launch_time: Utc::now(),
                polls: 0,
            },
        );
        Ok(instance_id)
    }

    async fn describe_instance(
        &self,
        _region: &str,
        instance_id: &str,
    ) -> ComputeApiResult<InstanceSnapshot> {
        let mut state = self
            .state
            .write()
            .map_err(|err| ComputeApiError::provider_message(err.to_string()))?;
        if let Some(message) = &state.describe_failure {
            return Err(ComputeApiError::provider_message(message.clone()));
        }
        let pending_polls = state.pending_polls;
        let never_ready = state.never_ready;
        let instance = state
            .instances
            .get_mut(instance_id)
            .ok_or_else(|| ComputeApiError::NotFound(format!("instance {instance_id}")))?;
        instance.polls = instance.polls.saturating_add(1);

        let running = !never_ready && instance.polls > pending_polls;
        Ok(InstanceSnapshot {
            instance_id: instance_id.to_owned(),
            state: if running { RUNNING_STATE } else { PENDING_STATE }.to_owned(),
            public_ip: running.then(|| instance.public_ip.clone()),
            instance_type: instance.request.instance_type.clone(),
            launch_time: Some(instance.launch_time),
        })
    }
}
