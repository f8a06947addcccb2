//! Action orchestration: maps a requested lifecycle transition onto the
//! cluster's fire-and-forget API and decides the outcome.
//!
//! Simple actions (start, shutdown, reset, delete, node reboot, update, dns)
//! are one gateway call each and report as soon as the cluster accepts them.
//! Stop, restart, and hardreset wait for the guest to report `stopped`:
//!
//! | Action    | Stop wait             | Stop times out          |
//! |-----------|-----------------------|-------------------------|
//! | stop      | [`PollPolicy::STOP`]    | `Timeout`               |
//! | restart   | [`PollPolicy::RESTART`] | `Timeout`, no start     |
//! | hardreset | [`PollPolicy::STOP`]    | start is sent anyway    |
//!
//! A local timeout never cancels anything remotely. Gateway errors are
//! absorbed here and returned as [`Outcome::Failure`] carrying the error
//! text unchanged.

use std::time::Duration;

use tracing::{info, warn};

use proxmon_core::node::DnsConfig;
use proxmon_core::outcome::Outcome;
use proxmon_core::resource::{ResourceTarget, STATUS_STOPPED, Verb};
use proxmon_core::retry::{PollPolicy, PollResult, Sleeper, poll_until};

use crate::directory::Snapshot;
use crate::gateway::Gateway;

/// A lifecycle request together with its argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start(String),
    Shutdown(String),
    Stop(String),
    Reset(String),
    Restart(String),
    HardReset(String),
    Delete(String),
    NodeRestart(String),
    /// Package index refresh, optionally chained with a node reboot.
    NodeUpdate { node: String, reboot: bool },
    DnsUpdate { node: String, dns: DnsConfig },
}

/// Argument-free tag of an [`Action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Start,
    Shutdown,
    Stop,
    Reset,
    Restart,
    HardReset,
    Delete,
    NodeRestart,
    NodeUpdate,
    DnsUpdate,
}

impl ActionKind {
    /// Label used in console feedback ("Restart failed: ...").
    pub fn title(self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Shutdown => "Shutdown",
            Self::Stop => "Stop",
            Self::Reset => "Reset",
            Self::Restart => "Restart",
            Self::HardReset => "Hardreset",
            Self::Delete => "Delete",
            Self::NodeRestart => "Node reboot",
            Self::NodeUpdate => "Update",
            Self::DnsUpdate => "DNS update",
        }
    }

    /// Whether the action polls and may take a while.
    pub fn waits(self) -> bool {
        matches!(self, Self::Stop | Self::Restart | Self::HardReset)
    }
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Start(_) => ActionKind::Start,
            Self::Shutdown(_) => ActionKind::Shutdown,
            Self::Stop(_) => ActionKind::Stop,
            Self::Reset(_) => ActionKind::Reset,
            Self::Restart(_) => ActionKind::Restart,
            Self::HardReset(_) => ActionKind::HardReset,
            Self::Delete(_) => ActionKind::Delete,
            Self::NodeRestart(_) => ActionKind::NodeRestart,
            Self::NodeUpdate { .. } => ActionKind::NodeUpdate,
            Self::DnsUpdate { .. } => ActionKind::DnsUpdate,
        }
    }

    /// The resource id or node name the action is aimed at.
    pub fn subject(&self) -> &str {
        match self {
            Self::Start(id)
            | Self::Shutdown(id)
            | Self::Stop(id)
            | Self::Reset(id)
            | Self::Restart(id)
            | Self::HardReset(id)
            | Self::Delete(id) => id,
            Self::NodeRestart(node)
            | Self::NodeUpdate { node, .. }
            | Self::DnsUpdate { node, .. } => node,
        }
    }
}

/// How the stop-and-wait step ended.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StopStep {
    Stopped,
    TimedOut(Duration),
    Failed(String),
}

pub struct Orchestrator<'a> {
    gateway: &'a dyn Gateway,
    sleeper: &'a dyn Sleeper,
    stop_policy: PollPolicy,
    restart_policy: PollPolicy,
}

impl<'a> Orchestrator<'a> {
    pub fn new(gateway: &'a dyn Gateway, sleeper: &'a dyn Sleeper) -> Self {
        Self {
            gateway,
            sleeper,
            stop_policy: PollPolicy::STOP,
            restart_policy: PollPolicy::RESTART,
        }
    }

    /// Override the wait used by stop/hardreset and by restart.
    pub fn with_policies(mut self, stop: PollPolicy, restart: PollPolicy) -> Self {
        self.stop_policy = stop;
        self.restart_policy = restart;
        self
    }

    /// Run one action against the caller's snapshot. Never refreshes it.
    pub fn execute(&self, action: &Action, snapshot: &Snapshot) -> Outcome {
        match action {
            Action::Start(id) => self.fire(snapshot, id, Verb::Start),
            Action::Shutdown(id) => self.fire(snapshot, id, Verb::Shutdown),
            Action::Reset(id) => self.fire(snapshot, id, Verb::Reset),
            Action::Stop(id) => self.stop(snapshot, id),
            Action::Restart(id) => self.restart(snapshot, id),
            Action::HardReset(id) => self.hard_reset(snapshot, id),
            Action::Delete(id) => self.delete(snapshot, id),
            Action::NodeRestart(node) => self.reboot_node(node),
            Action::NodeUpdate { node, reboot } => self.update_node(node, *reboot),
            Action::DnsUpdate { node, dns } => self.update_dns(node, dns),
        }
    }

    fn resolve(&self, snapshot: &Snapshot, id: &str) -> Result<ResourceTarget, Outcome> {
        snapshot
            .find(id)
            .map(|r| r.target())
            .ok_or_else(|| Outcome::NotFound(id.trim().to_string()))
    }

    fn fire(&self, snapshot: &Snapshot, id: &str, verb: Verb) -> Outcome {
        let target = match self.resolve(snapshot, id) {
            Ok(t) => t,
            Err(outcome) => return outcome,
        };
        match self.gateway.send_action(&target, verb) {
            Ok(()) => Outcome::Success(format!("{} {}", verb.title(), target)),
            Err(e) => {
                warn!(%target, %verb, error = %e, "lifecycle command rejected");
                Outcome::Failure(e.to_string())
            }
        }
    }

    /// Send `stop` and poll until the guest reports stopped.
    fn stop_and_wait(&self, target: &ResourceTarget, policy: &PollPolicy) -> StopStep {
        if let Err(e) = self.gateway.send_action(target, Verb::Stop) {
            warn!(%target, error = %e, "stop rejected");
            return StopStep::Failed(e.to_string());
        }

        let label = format!("stop of {}", target);
        let polled = poll_until(
            policy,
            self.sleeper,
            &label,
            || self.gateway.read_status(target),
            |status| status == STATUS_STOPPED,
        );

        match polled {
            Ok(PollResult::Ready { attempts, .. }) => {
                info!(%target, attempts, "guest stopped");
                StopStep::Stopped
            }
            Ok(PollResult::Exhausted { attempts, elapsed }) => {
                warn!(%target, attempts, elapsed_secs = elapsed.as_secs(), "guest did not stop in time");
                StopStep::TimedOut(elapsed)
            }
            Err(e) => {
                warn!(%target, error = %e, "status poll failed");
                StopStep::Failed(e.to_string())
            }
        }
    }

    fn stop(&self, snapshot: &Snapshot, id: &str) -> Outcome {
        let target = match self.resolve(snapshot, id) {
            Ok(t) => t,
            Err(outcome) => return outcome,
        };
        match self.stop_and_wait(&target, &self.stop_policy) {
            StopStep::Stopped => Outcome::Success(format!("Stopped {}", target)),
            StopStep::TimedOut(elapsed) => Outcome::Timeout(elapsed),
            StopStep::Failed(reason) => Outcome::Failure(reason),
        }
    }

    /// Stop, then start only if the stop was confirmed.
    fn restart(&self, snapshot: &Snapshot, id: &str) -> Outcome {
        let target = match self.resolve(snapshot, id) {
            Ok(t) => t,
            Err(outcome) => return outcome,
        };
        match self.stop_and_wait(&target, &self.restart_policy) {
            StopStep::Stopped => {}
            // Never start while the stop may still be in flight.
            StopStep::TimedOut(elapsed) => return Outcome::Timeout(elapsed),
            StopStep::Failed(reason) => return Outcome::Failure(reason),
        }
        match self.gateway.send_action(&target, Verb::Start) {
            Ok(()) => Outcome::Success(format!("Restarted {}", target)),
            Err(e) => {
                warn!(%target, error = %e, "start after stop rejected");
                Outcome::Failure(e.to_string())
            }
        }
    }

    /// Stop, then start whatever the stop step reported.
    fn hard_reset(&self, snapshot: &Snapshot, id: &str) -> Outcome {
        let target = match self.resolve(snapshot, id) {
            Ok(t) => t,
            Err(outcome) => return outcome,
        };
        let note = match self.stop_and_wait(&target, &self.stop_policy) {
            StopStep::Stopped => None,
            StopStep::TimedOut(elapsed) => Some(format!(
                "stop not confirmed after {}s",
                elapsed.as_secs()
            )),
            StopStep::Failed(reason) => Some(format!("stop failed: {}", reason)),
        };
        match self.gateway.send_action(&target, Verb::Start) {
            Ok(()) => match note {
                None => Outcome::Success(format!("Hard reset {}", target)),
                Some(note) => Outcome::Success(format!("Hard reset {} ({})", target, note)),
            },
            Err(e) => {
                warn!(%target, error = %e, "start after hard stop rejected");
                Outcome::Failure(e.to_string())
            }
        }
    }

    fn delete(&self, snapshot: &Snapshot, id: &str) -> Outcome {
        let target = match self.resolve(snapshot, id) {
            Ok(t) => t,
            Err(outcome) => return outcome,
        };
        match self.gateway.delete(&target) {
            Ok(()) => Outcome::Success(format!("Deleted {}", target)),
            Err(e) => {
                warn!(%target, error = %e, "delete rejected");
                Outcome::Failure(e.to_string())
            }
        }
    }

    /// Fire and forget: the node drops off the network while rebooting.
    fn reboot_node(&self, node: &str) -> Outcome {
        match self.gateway.reboot_node(node) {
            Ok(()) => Outcome::Success(format!("Node {} reboot triggered.", node)),
            Err(e) => Outcome::Failure(e.to_string()),
        }
    }

    fn update_node(&self, node: &str, reboot: bool) -> Outcome {
        if let Err(e) = self.gateway.update_node(node) {
            return Outcome::Failure(e.to_string());
        }
        if !reboot {
            return Outcome::Success(format!("Update triggered for {}", node));
        }
        match self.gateway.reboot_node(node) {
            Ok(()) => Outcome::Success(format!("Update triggered for {}, reboot requested", node)),
            Err(e) => {
                warn!(node, error = %e, "reboot after update rejected");
                Outcome::Failure(e.to_string())
            }
        }
    }

    fn update_dns(&self, node: &str, dns: &DnsConfig) -> Outcome {
        if let Err(e) = dns.validate() {
            return Outcome::Failure(e.to_string());
        }
        match self.gateway.set_dns(node, dns) {
            Ok(()) => Outcome::Success(format!("DNS updated for {}", node)),
            Err(e) => Outcome::Failure(e.to_string()),
        }
    }
}
