//! Point-in-time view of a compute instance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Instance state in which the provider reports a booted machine.
pub const RUNNING_STATE: &str = "running";

/// Live instance details reported by the compute provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSnapshot {
    /// Provider instance identifier.
    pub instance_id: String,
    /// Provider lifecycle state, for example `pending` or `running`.
    pub state: String,
    /// Public IPv4 address, once assigned.
    pub public_ip: Option<String>,
    /// Instance class, for example `t2.micro`.
    pub instance_type: String,
    /// Launch timestamp reported by the provider.
    pub launch_time: Option<DateTime<Utc>>,
}

impl InstanceSnapshot {
    /// Returns the public address when the instance is running and reachable.
    #[must_use]
    pub fn ready_address(&self) -> Option<&str> {
        if self.state == RUNNING_STATE {
            self.public_ip.as_deref()
        } else {
            None
        }
    }
}
