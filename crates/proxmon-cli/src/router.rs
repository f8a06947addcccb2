//! Console command parsing. Pure: no I/O, no gateway.

use proxmon_runtime::Action;

pub const UNKNOWN_COMMAND: &str = "Unknown command. Use :? for help.";

/// A parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Refresh,
    Help,
    Settings,
    Nodes,
    Tasks(String),
    /// Recognised command with a bad argument list.
    Usage(&'static str),
    Run(Action),
    /// `:ru`, needs a y/N confirmation before running.
    NodeUpdate(String),
    /// `:dns`, needs the DNS values prompted.
    Dns(String),
    Unknown,
}

/// Trim and make sure the line starts with `:`.
pub fn normalize(input: &str) -> String {
    let line = input.trim();
    if line.starts_with(':') {
        line.to_string()
    } else {
        format!(":{}", line)
    }
}

pub fn parse(input: &str) -> Command {
    let line = normalize(input);
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line.as_str(), ""),
    };
    let arg = (!rest.is_empty()).then(|| rest.to_string());

    match (head, arg) {
        (":q", None) => Command::Quit,
        (":r", None) => Command::Refresh,
        (":?", None) => Command::Help,
        (":settings", None) => Command::Settings,
        (":nodes", None) => Command::Nodes,
        (":tasks", Some(node)) if !node.contains(char::is_whitespace) => Command::Tasks(node),
        (":tasks", _) => Command::Usage("Usage: :tasks <nodename>"),

        (":start", Some(id)) => Command::Run(Action::Start(id)),
        (":shutdown", Some(id)) => Command::Run(Action::Shutdown(id)),
        (":stop", Some(id)) => Command::Run(Action::Stop(id)),
        (":reset", Some(id)) => Command::Run(Action::Reset(id)),
        (":restart", Some(id)) => Command::Run(Action::Restart(id)),
        (":hardreset", Some(id)) => Command::Run(Action::HardReset(id)),
        (":delete", Some(id)) => Command::Run(Action::Delete(id)),
        (":start" | ":shutdown" | ":stop" | ":reset" | ":restart" | ":hardreset" | ":delete", None) => {
            Command::Usage("Usage: :<action> <ID>")
        }

        (":node-restart", Some(node)) => Command::Run(Action::NodeRestart(node)),
        (":ru", Some(node)) => Command::NodeUpdate(first_word(&node)),
        (":dns", Some(node)) => Command::Dns(first_word(&node)),
        (":node-restart" | ":ru" | ":dns", None) => Command::Usage("Usage: :<command> <NODE>"),

        _ => Command::Unknown,
    }
}

fn first_word(s: &str) -> String {
    s.split_whitespace().next().unwrap_or_default().to_string()
}

pub const HELP: &str = "\
:q                   → quit
:r                   → refresh VM list
:restart <ID>        → restart VM/LXC (stop, wait, start)
:start <ID>          → start VM/LXC
:shutdown <ID>       → shutdown VM/LXC
:stop <ID>           → stop VM/LXC and wait until stopped
:reset <ID>          → reset VM/LXC
:hardreset <ID>      → stop + start, start even if stop is not confirmed
:delete <ID>         → permanently delete VM/LXC
:node-restart <NODE> → reboot full Proxmox node
:ru <NODE>           → update package index and reboot node (asks first)
:dns <NODE>          → set DNS servers of a node
:tasks <NODE>        → show recent tasks (limit from config)
:settings            → open settings menu
:nodes               → show node overview
:?                   → show this help";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_colon() {
        assert_eq!(normalize("q"), ":q");
        assert_eq!(normalize("  :r  "), ":r");
        assert_eq!(normalize(""), ":");
    }

    #[test]
    fn test_quit_forms() {
        assert_eq!(parse(":q"), Command::Quit);
        assert_eq!(parse("q"), Command::Quit);
        assert_eq!(parse(":q now"), Command::Unknown);
    }

    #[test]
    fn test_views() {
        assert_eq!(parse("r"), Command::Refresh);
        assert_eq!(parse(":?"), Command::Help);
        assert_eq!(parse(":settings"), Command::Settings);
        assert_eq!(parse(":nodes"), Command::Nodes);
    }

    #[test]
    fn test_tasks_requires_exactly_one_node() {
        assert_eq!(parse(":tasks pve1"), Command::Tasks("pve1".to_string()));
        assert_eq!(parse(":tasks"), Command::Usage("Usage: :tasks <nodename>"));
        assert_eq!(parse(":tasks pve1 pve2"), Command::Usage("Usage: :tasks <nodename>"));
    }

    #[test]
    fn test_resource_actions() {
        assert_eq!(parse(":restart 101"), Command::Run(Action::Restart("101".into())));
        assert_eq!(parse("start 101"), Command::Run(Action::Start("101".into())));
        assert_eq!(parse(":shutdown   200 "), Command::Run(Action::Shutdown("200".into())));
        assert_eq!(parse(":stop 101"), Command::Run(Action::Stop("101".into())));
        assert_eq!(parse(":reset 101"), Command::Run(Action::Reset("101".into())));
        assert_eq!(parse(":hardreset 101"), Command::Run(Action::HardReset("101".into())));
        assert_eq!(parse(":delete 101"), Command::Run(Action::Delete("101".into())));
        assert_eq!(parse(":delete"), Command::Usage("Usage: :<action> <ID>"));
    }

    #[test]
    fn test_node_commands() {
        assert_eq!(
            parse(":node-restart pve1"),
            Command::Run(Action::NodeRestart("pve1".into()))
        );
        assert_eq!(parse(":ru pve2"), Command::NodeUpdate("pve2".into()));
        assert_eq!(parse(":dns pve3 extra"), Command::Dns("pve3".into()));
        assert_eq!(parse(":ru"), Command::Usage("Usage: :<command> <NODE>"));
    }

    #[test]
    fn test_unknown_input() {
        assert_eq!(parse(":frobnicate 1"), Command::Unknown);
        assert_eq!(parse(""), Command::Unknown);
        assert_eq!(parse(":"), Command::Unknown);
    }

    #[test]
    fn test_help_mentions_every_command() {
        for cmd in [
            ":q", ":r", ":restart", ":start", ":shutdown", ":stop", ":reset", ":hardreset",
            ":delete", ":node-restart", ":ru", ":dns", ":tasks", ":settings", ":nodes", ":?",
        ] {
            assert!(HELP.contains(cmd), "help should mention {}", cmd);
        }
    }
}
