//! Interactive settings menu. Edits the in-memory config and writes it
//! back only on "Save and return".

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};

use proxmon_core::config::{Config, ServerEntry};
use proxmon_runtime::gateway::ProxmoxGateway;

use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    ListServers,
    AddServer,
    EditServer,
    DeleteServer,
    CpuThresholds,
    Language,
    ToggleColor,
    TaskLimit,
    SaveAndReturn,
}

struct MenuEntry {
    item: MenuItem,
    label: String,
}

impl fmt::Display for MenuEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

fn menu_entries(config: &Config) -> Vec<MenuEntry> {
    let entry = |item, label: String| MenuEntry { item, label };
    vec![
        entry(MenuItem::ListServers, "List servers".to_string()),
        entry(MenuItem::AddServer, "Add server".to_string()),
        entry(MenuItem::EditServer, "Edit server".to_string()),
        entry(MenuItem::DeleteServer, "Delete server".to_string()),
        entry(
            MenuItem::CpuThresholds,
            format!(
                "Change CPU thresholds (yellow: {} / red: {})",
                config.cpu_load_yellow, config.cpu_load_red
            ),
        ),
        entry(
            MenuItem::Language,
            format!("Change language (currently: {})", config.language),
        ),
        entry(
            MenuItem::ToggleColor,
            format!("Toggle color (currently: {})", config.use_color),
        ),
        entry(
            MenuItem::TaskLimit,
            format!("Set task list limit (currently: {})", config.task_limit),
        ),
        entry(MenuItem::SaveAndReturn, "Save and return".to_string()),
    ]
}

/// Run the menu until the user saves. Cancelling leaves the file untouched.
///
/// A failed save is reported and the menu stays open, so the caller's
/// session survives an unwritable config directory.
pub fn menu(config: &mut Config, path: &Path) {
    loop {
        let choice = match inquire::Select::new("Settings", menu_entries(config)).prompt() {
            Ok(entry) => entry.item,
            Err(_) => {
                ui::warn("Settings closed without saving.");
                return;
            }
        };

        match choice {
            MenuItem::ListServers => list_servers(config),
            MenuItem::AddServer => {
                add_server(config);
            }
            MenuItem::EditServer => edit_server(config),
            MenuItem::DeleteServer => delete_server(config),
            MenuItem::CpuThresholds => {
                if let Some(yellow) = ui::prompt_number("CPU Load YELLOW:", config.cpu_load_yellow) {
                    config.cpu_load_yellow = yellow;
                }
                if let Some(red) = ui::prompt_number("CPU Load RED:", config.cpu_load_red) {
                    config.cpu_load_red = red;
                }
                if config.cpu_load_red < config.cpu_load_yellow {
                    ui::warn("RED threshold is below YELLOW; CPU cells will never show yellow.");
                }
            }
            MenuItem::Language => {
                if let Some(lang) =
                    ui::prompt_text_with_default("Language code (en/de):", &config.language)
                {
                    if !lang.is_empty() {
                        config.language = lang;
                    }
                }
            }
            MenuItem::ToggleColor => config.use_color = !config.use_color,
            MenuItem::TaskLimit => {
                if let Some(limit) = ui::prompt_number("Number of tasks to show:", config.task_limit)
                {
                    config.task_limit = limit;
                }
            }
            MenuItem::SaveAndReturn => match save_settings(config, path) {
                Ok(()) => {
                    ui::success("Saved.");
                    return;
                }
                Err(e) => ui::error(&format!("{:#}", e)),
            },
        }
    }
}

fn save_settings(config: &Config, path: &Path) -> Result<()> {
    config
        .save(path)
        .with_context(|| format!("Failed to save settings to {}", path.display()))
}

fn list_servers(config: &Config) {
    if config.servers.is_empty() {
        ui::info("(no servers configured)");
        return;
    }
    for (idx, srv) in config.servers.iter().enumerate() {
        println!("{}: {} ({})", idx, srv.name, srv.host);
    }
}

/// Log in once to prove the entry works.
fn verify(server: &ServerEntry) -> bool {
    let pb = ui::spinner(&format!("Connecting to {}...", server.host));
    let result = ProxmoxGateway::connect(server);
    pb.finish_and_clear();
    match result {
        Ok(_) => true,
        Err(e) => {
            ui::error(&format!("Connection failed: {}", e));
            false
        }
    }
}

/// Prompt for a new server and keep it if a login succeeds.
pub fn add_server(config: &mut Config) -> bool {
    let name = ui::prompt_text("Name:");
    let host = ui::prompt_text("Host:");
    let username = ui::prompt_text("Username (e.g. root@pam):");
    let Some(password) = ui::prompt_password("Password:") else {
        return false;
    };
    if name.is_empty() || host.is_empty() || username.is_empty() {
        ui::error("Name, host and username are required.");
        return false;
    }

    let server = ServerEntry {
        name,
        host,
        username,
        password,
        verify_ssl: false,
    };
    if !verify(&server) {
        return false;
    }
    config.servers.push(server);
    ui::success("Server added.");
    true
}

fn pick_server(config: &Config, prompt: &str) -> Option<usize> {
    if config.servers.is_empty() {
        ui::info("(no servers configured)");
        return None;
    }
    let labels: Vec<String> = config
        .servers
        .iter()
        .map(|s| format!("{} ({})", s.name, s.host))
        .collect();
    inquire::Select::new(prompt, labels)
        .raw_prompt()
        .ok()
        .map(|choice| choice.index)
}

fn edit_server(config: &mut Config) {
    let Some(idx) = pick_server(config, "Edit server") else {
        return;
    };
    let mut srv = config.servers[idx].clone();

    if let Some(name) = ui::prompt_text_with_default("Name:", &srv.name) {
        srv.name = name;
    }
    if let Some(host) = ui::prompt_text_with_default("Host:", &srv.host) {
        srv.host = host;
    }
    if let Some(username) = ui::prompt_text_with_default("Username:", &srv.username) {
        srv.username = username;
    }
    if let Some(pw) = ui::prompt_password("Password (leave blank to keep):") {
        if !pw.is_empty() {
            srv.password = pw;
        }
    }

    if verify(&srv) {
        config.servers[idx] = srv;
        ui::success("Updated and verified.");
    } else {
        ui::error("Update failed.");
    }
}

fn delete_server(config: &mut Config) {
    let Some(idx) = pick_server(config, "Delete server") else {
        return;
    };
    let name = config.servers[idx].name.clone();
    if ui::confirm(&format!("Delete server '{}'?", name)) {
        config.servers.remove(idx);
        ui::success("Server deleted.");
    }
}
