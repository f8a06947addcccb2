//! Recording in-memory [`Gateway`] for tests.
//!
//! Logs every call, serves a scripted sequence of statuses to
//! `read_status`, and fails chosen operations on demand.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use proxmon_core::error::GatewayError;
use proxmon_core::node::{DnsConfig, NodeSummary, Task};
use proxmon_core::resource::{Resource, ResourceTarget, Verb};

use super::Gateway;

/// One recorded gateway call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FetchResources,
    SendAction { target: ResourceTarget, verb: Verb },
    ReadStatus(ResourceTarget),
    Delete(ResourceTarget),
    RebootNode(String),
    UpdateNode(String),
    SetDns { node: String, fields: Vec<(String, String)> },
    ListTasks { node: String, limit: u32 },
    FetchNodes,
}

/// Operation selector for scripted failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    FetchResources,
    Send(Verb),
    ReadStatus,
    Delete,
    RebootNode,
    UpdateNode,
    SetDns,
    ListTasks,
    FetchNodes,
}

#[derive(Default)]
pub struct MockGateway {
    resources: Vec<Resource>,
    nodes: Vec<NodeSummary>,
    tasks: Vec<Task>,
    /// Served front to back; the last entry repeats forever.
    statuses: RefCell<VecDeque<String>>,
    failures: HashMap<Op, GatewayError>,
    calls: RefCell<Vec<Call>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resources(mut self, resources: Vec<Resource>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_nodes(mut self, nodes: Vec<NodeSummary>) -> Self {
        self.nodes = nodes;
        self
    }

    pub fn with_tasks(mut self, tasks: Vec<Task>) -> Self {
        self.tasks = tasks;
        self
    }

    /// Script what successive `read_status` calls return.
    pub fn with_statuses(self, statuses: &[&str]) -> Self {
        *self.statuses.borrow_mut() = statuses.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Make `op` fail with `err` every time.
    pub fn failing(mut self, op: Op, err: GatewayError) -> Self {
        self.failures.insert(op, err);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }

    /// How many times `verb` was sent to any guest.
    pub fn sent(&self, verb: Verb) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::SendAction { verb: v, .. } if *v == verb))
            .count()
    }

    pub fn status_reads(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::ReadStatus(_)))
            .count()
    }

    fn record(&self, call: Call, op: Op) -> Result<(), GatewayError> {
        self.calls.borrow_mut().push(call);
        match self.failures.get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl Gateway for MockGateway {
    fn fetch_resources(&self) -> Result<Vec<Resource>, GatewayError> {
        self.record(Call::FetchResources, Op::FetchResources)?;
        Ok(self.resources.clone())
    }

    fn send_action(&self, target: &ResourceTarget, verb: Verb) -> Result<(), GatewayError> {
        self.record(
            Call::SendAction {
                target: target.clone(),
                verb,
            },
            Op::Send(verb),
        )
    }

    fn read_status(&self, target: &ResourceTarget) -> Result<String, GatewayError> {
        self.record(Call::ReadStatus(target.clone()), Op::ReadStatus)?;
        let mut statuses = self.statuses.borrow_mut();
        let status = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        Ok(status.unwrap_or_else(|| "running".to_string()))
    }

    fn delete(&self, target: &ResourceTarget) -> Result<(), GatewayError> {
        self.record(Call::Delete(target.clone()), Op::Delete)
    }

    fn reboot_node(&self, node: &str) -> Result<(), GatewayError> {
        self.record(Call::RebootNode(node.to_string()), Op::RebootNode)
    }

    fn update_node(&self, node: &str) -> Result<(), GatewayError> {
        self.record(Call::UpdateNode(node.to_string()), Op::UpdateNode)
    }

    fn set_dns(&self, node: &str, dns: &DnsConfig) -> Result<(), GatewayError> {
        let fields = dns
            .form_fields()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.record(
            Call::SetDns {
                node: node.to_string(),
                fields,
            },
            Op::SetDns,
        )
    }

    fn list_tasks(&self, node: &str, limit: u32) -> Result<Vec<Task>, GatewayError> {
        self.record(
            Call::ListTasks {
                node: node.to_string(),
                limit,
            },
            Op::ListTasks,
        )?;
        Ok(self.tasks.iter().take(limit as usize).cloned().collect())
    }

    fn fetch_nodes(&self) -> Result<Vec<NodeSummary>, GatewayError> {
        self.record(Call::FetchNodes, Op::FetchNodes)?;
        Ok(self.nodes.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxmon_core::resource::ResourceKind;

    fn target() -> ResourceTarget {
        Resource::new("101", ResourceKind::Vm, "pve1", "running").target()
    }

    #[test]
    fn test_status_script_repeats_last_entry() {
        let gw = MockGateway::new().with_statuses(&["running", "stopped"]);
        assert_eq!(gw.read_status(&target()).unwrap(), "running");
        assert_eq!(gw.read_status(&target()).unwrap(), "stopped");
        assert_eq!(gw.read_status(&target()).unwrap(), "stopped");
        assert_eq!(gw.status_reads(), 3);
    }

    #[test]
    fn test_failure_is_still_recorded() {
        let gw = MockGateway::new().failing(
            Op::Delete,
            GatewayError::Rejected("VM 101 is running".to_string()),
        );
        let err = gw.delete(&target()).unwrap_err();
        assert_eq!(err, GatewayError::Rejected("VM 101 is running".to_string()));
        assert_eq!(gw.calls(), vec![Call::Delete(target())]);
    }

    #[test]
    fn test_list_tasks_respects_limit() {
        let tasks = (0..5)
            .map(|i| Task {
                upid: format!("UPID:{}", i),
                ..Task::default()
            })
            .collect();
        let gw = MockGateway::new().with_tasks(tasks);
        assert_eq!(gw.list_tasks("pve1", 3).unwrap().len(), 3);
    }
}
