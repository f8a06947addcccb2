//! Boundary to the remote cluster.
//!
//! Every call blocks on the network and none retry. Retry and wait policy
//! belongs to the [`Orchestrator`](crate::orchestrator::Orchestrator).

pub mod mock;
pub mod proxmox;

use proxmon_core::error::GatewayError;
use proxmon_core::node::{DnsConfig, NodeSummary, Task};
use proxmon_core::resource::{Resource, ResourceTarget, Verb};

pub use proxmox::ProxmoxGateway;

pub trait Gateway {
    /// Every VM and container in the cluster.
    fn fetch_resources(&self) -> Result<Vec<Resource>, GatewayError>;

    /// Fire a lifecycle verb. Returns once the cluster accepted it.
    fn send_action(&self, target: &ResourceTarget, verb: Verb) -> Result<(), GatewayError>;

    /// Currently reported status string ("running", "stopped", ...).
    fn read_status(&self, target: &ResourceTarget) -> Result<String, GatewayError>;

    /// Irreversible. The cluster rejects this while the guest runs.
    fn delete(&self, target: &ResourceTarget) -> Result<(), GatewayError>;

    fn reboot_node(&self, node: &str) -> Result<(), GatewayError>;

    /// Refresh the node's package index.
    fn update_node(&self, node: &str) -> Result<(), GatewayError>;

    /// Blank secondary/tertiary entries are left out of the request.
    fn set_dns(&self, node: &str, dns: &DnsConfig) -> Result<(), GatewayError>;

    fn list_tasks(&self, node: &str, limit: u32) -> Result<Vec<Task>, GatewayError>;

    /// Node overview. Per-node detail failures degrade that row only.
    fn fetch_nodes(&self) -> Result<Vec<NodeSummary>, GatewayError>;
}
