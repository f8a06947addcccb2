use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use proxmon_core::config::{self, Config, ServerEntry};
use proxmon_runtime::gateway::ProxmoxGateway;

use crate::console::Console;
use crate::logging::{self, LogFormat};
use crate::{settings, ui};

#[derive(Parser)]
#[command(
    name = "proxmon",
    version,
    about = "Interactive terminal console for Proxmox VE clusters"
)]
struct Cli {
    /// Config file (default: ~/.config/proxmon/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Connect to this configured server instead of asking
    #[arg(long, short = 's')]
    server: Option<String>,

    /// Log output format on stderr
    #[arg(long, global = true, value_enum, default_value = "human")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the settings menu (servers, thresholds, colors, task limit)
    Settings,
    /// List configured servers
    Servers,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_format);

    let config_path = match cli.config {
        Some(path) => path,
        None => config::default_config_path()?,
    };
    let mut config = Config::load(&config_path)
        .with_context(|| "Failed to load configuration")?;

    match cli.command {
        Some(Commands::Settings) => {
            settings::menu(&mut config, &config_path);
            Ok(())
        }
        Some(Commands::Servers) => cmd_servers(&config),
        None => cmd_console(config, config_path, cli.server.as_deref()),
    }
}

fn cmd_servers(config: &Config) -> Result<()> {
    if config.servers.is_empty() {
        println!("(none)");
        return Ok(());
    }
    for srv in &config.servers {
        println!("{}\t{}\t{}", srv.name, srv.api_base_url(), srv.username);
    }
    Ok(())
}

fn cmd_console(mut config: Config, config_path: PathBuf, server: Option<&str>) -> Result<()> {
    if config.servers.is_empty() {
        anyhow::bail!("No servers configured. Run `proxmon settings` to add one.");
    }

    let server = match server {
        Some(name) => config
            .server(name)
            .cloned()
            .with_context(|| format!("Unknown server '{}'. Run `proxmon servers` to list them.", name))?,
        None => choose_server(&mut config, &config_path)?,
    };

    let pb = ui::spinner(&format!("Connecting to {} ({})...", server.name, server.host));
    let gateway = ProxmoxGateway::connect(&server);
    pb.finish_and_clear();
    let gateway = gateway.with_context(|| format!("Failed to connect to {}", server.name))?;

    Console::new(config, config_path, Box::new(gateway)).run();
    Ok(())
}

enum ServerChoice {
    Add,
    Existing(usize, String),
}

impl fmt::Display for ServerChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "Add server"),
            Self::Existing(_, label) => f.write_str(label),
        }
    }
}

/// Ask which server to use. "Add server" runs the add flow, saves, and asks again.
fn choose_server(config: &mut Config, config_path: &Path) -> Result<ServerEntry> {
    loop {
        let mut choices: Vec<ServerChoice> = config
            .servers
            .iter()
            .enumerate()
            .map(|(i, s)| ServerChoice::Existing(i, format!("{} ({})", s.name, s.host)))
            .collect();
        choices.push(ServerChoice::Add);

        let choice = inquire::Select::new("Choose a server:", choices)
            .prompt()
            .context("Server selection aborted")?;

        match choice {
            ServerChoice::Existing(idx, _) => return Ok(config.servers[idx].clone()),
            ServerChoice::Add => {
                if settings::add_server(config) {
                    config
                        .save(config_path)
                        .with_context(|| format!("Failed to save {}", config_path.display()))?;
                }
            }
        }
    }
}
