//! The interactive console: one command at a time on a single thread.
//!
//! The console owns the last fetched [`Snapshot`] and hands it to the
//! orchestrator by reference. Every mutating command is followed by a
//! fresh fetch that replaces the snapshot wholesale.

use std::path::PathBuf;

use tracing::warn;

use proxmon_core::config::Config;
use proxmon_core::node::DnsConfig;
use proxmon_core::outcome::Outcome;
use proxmon_core::retry::ThreadSleeper;
use proxmon_runtime::{Action, ActionKind, Gateway, Orchestrator, Snapshot};

use crate::router::{self, Command, HELP, UNKNOWN_COMMAND};
use crate::{display, settings, ui};

/// Severity of a feedback line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Warn,
    Error,
}

/// Console wording for an outcome.
pub fn feedback(kind: ActionKind, outcome: &Outcome) -> (Level, String) {
    match outcome {
        Outcome::Success(msg) => (Level::Success, msg.clone()),
        Outcome::Failure(reason) => (Level::Error, format!("{} failed: {}", kind.title(), reason)),
        Outcome::Timeout(_) if kind == ActionKind::Restart => (
            Level::Warn,
            format!("{} Start was not sent; the guest may still be stopping.", outcome),
        ),
        Outcome::Timeout(_) => (
            Level::Warn,
            format!("{} The stop may still complete.", outcome),
        ),
        Outcome::NotFound(_) => (Level::Warn, outcome.to_string()),
    }
}

pub struct Console {
    config: Config,
    config_path: PathBuf,
    gateway: Box<dyn Gateway>,
    snapshot: Snapshot,
}

impl Console {
    pub fn new(config: Config, config_path: PathBuf, gateway: Box<dyn Gateway>) -> Self {
        Self {
            config,
            config_path,
            gateway,
            snapshot: Snapshot::default(),
        }
    }

    pub fn run(&mut self) {
        self.clear_and_refresh();
        ui::info("Type :? for help.");

        while let Some(line) = ui::prompt_command() {
            match router::parse(&line) {
                Command::Quit => break,
                Command::Refresh => self.clear_and_refresh(),
                Command::Help => {
                    ui::clear_screen();
                    println!("{}", HELP);
                }
                Command::Settings => {
                    ui::clear_screen();
                    settings::menu(&mut self.config, &self.config_path);
                }
                Command::Nodes => self.show_nodes(),
                Command::Tasks(node) => self.show_tasks(&node),
                Command::Usage(usage) => ui::warn(usage),
                Command::Run(action) => self.run_action(&action),
                Command::NodeUpdate(node) => {
                    if ui::confirm(&format!("Update Node '{}' and reboot after?", node)) {
                        self.run_action(&Action::NodeUpdate { node, reboot: true });
                    } else {
                        ui::info("Update canceled.");
                    }
                }
                Command::Dns(node) => {
                    let dns = DnsConfig::from_input(
                        &ui::prompt_text("Primary DNS (required):"),
                        &ui::prompt_text("Secondary DNS (optional):"),
                        &ui::prompt_text("Tertiary DNS (optional):"),
                    );
                    self.run_action(&Action::DnsUpdate { node, dns });
                }
                Command::Unknown => ui::warn(UNKNOWN_COMMAND),
            }
        }
    }

    /// Replace the snapshot. On failure the previous one is kept and shown.
    fn refresh(&mut self) {
        match Snapshot::fetch_all(self.gateway.as_ref()) {
            Ok(snapshot) => self.snapshot = snapshot,
            Err(e) => {
                warn!(error = %e, "resource refresh failed");
                ui::error(&format!("Failed to load VM list (showing last known state): {}", e));
            }
        }
        display::print_resources(
            self.snapshot.resources(),
            self.config.cpu_thresholds(),
            self.config.use_color,
        );
    }

    fn clear_and_refresh(&mut self) {
        ui::clear_screen();
        self.refresh();
    }

    fn run_action(&mut self, action: &Action) {
        let kind = action.kind();
        let outcome = {
            let pb = ui::spinner(&format!("{} {}", kind.title(), action.subject()));
            let sleeper = ThreadSleeper;
            let orchestrator = Orchestrator::new(self.gateway.as_ref(), &sleeper);
            let outcome = orchestrator.execute(action, &self.snapshot);
            pb.finish_and_clear();
            outcome
        };

        self.clear_and_refresh();
        match feedback(kind, &outcome) {
            (Level::Success, msg) => ui::success(&msg),
            (Level::Warn, msg) => ui::warn(&msg),
            (Level::Error, msg) => ui::error(&msg),
        }
    }

    fn show_nodes(&self) {
        ui::clear_screen();
        let pb = ui::spinner("Loading node data...");
        let view = nodes_view(self.gateway.as_ref(), self.config.use_color);
        pb.finish_and_clear();
        match view {
            Ok(table) => {
                ui::title("Proxmon Node Overview");
                println!("{}", table);
            }
            Err(msg) => ui::error(&msg),
        }
    }

    fn show_tasks(&self, node: &str) {
        ui::clear_screen();
        match tasks_view(self.gateway.as_ref(), node, self.config.task_limit) {
            Ok(table) => {
                ui::title(&format!("Tasks on {}", node));
                println!("{}", table);
            }
            Err(msg) => ui::error(&msg),
        }
    }
}

/// Node overview table, or the console error line.
fn nodes_view(gateway: &dyn Gateway, use_color: bool) -> Result<String, String> {
    gateway
        .fetch_nodes()
        .map(|nodes| display::nodes_table(&nodes, use_color))
        .map_err(|e| format!("Failed to load nodes: {}", e))
}

fn tasks_view(gateway: &dyn Gateway, node: &str, limit: u32) -> Result<String, String> {
    gateway
        .list_tasks(node, limit)
        .map(|tasks| display::tasks_table(&tasks))
        .map_err(|e| format!("Failed to load tasks for node '{}': {}", node, e))
}
