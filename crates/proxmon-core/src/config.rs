use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Config location relative to `$HOME`.
pub const CONFIG_RELATIVE_PATH: &str = ".config/proxmon/config.toml";

/// Owner read/write only; the file stores server passwords.
#[cfg(unix)]
const CONFIG_FILE_MODE: u32 = 0o600;

/// Port the Proxmox VE API listens on.
pub const DEFAULT_API_PORT: u16 = 8006;

/// Top-level console configuration, persisted as TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub servers: Vec<ServerEntry>,
    /// Refresh interval hint in seconds.
    #[serde(default = "default_update_interval")]
    pub update_interval: u64,
    /// CPU% at which the resource table turns yellow.
    #[serde(default = "default_cpu_yellow")]
    pub cpu_load_yellow: u32,
    /// CPU% at which the resource table turns bold red.
    #[serde(default = "default_cpu_red")]
    pub cpu_load_red: u32,
    #[serde(default)]
    pub use_color: bool,
    #[serde(default = "default_language")]
    pub language: String,
    /// Number of entries `:tasks` requests.
    #[serde(default = "default_task_limit")]
    pub task_limit: u32,
}

/// One Proxmox VE endpoint with credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub name: String,
    /// Hostname, optionally with scheme and port (`https://pve1:8006`).
    pub host: String,
    /// Login including realm, e.g. `root@pam`.
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub verify_ssl: bool,
}

/// CPU colouring thresholds in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CpuThresholds {
    pub yellow: f64,
    pub red: f64,
}

fn default_update_interval() -> u64 {
    10
}
fn default_cpu_yellow() -> u32 {
    80
}
fn default_cpu_red() -> u32 {
    90
}
fn default_language() -> String {
    "en".to_string()
}
fn default_task_limit() -> u32 {
    15
}

impl Default for Config {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            update_interval: default_update_interval(),
            cpu_load_yellow: default_cpu_yellow(),
            cpu_load_red: default_cpu_red(),
            use_color: false,
            language: default_language(),
            task_limit: default_task_limit(),
        }
    }
}

/// `$HOME/.config/proxmon/config.toml`.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let home = std::env::var("HOME").map_err(|_| ConfigError::NoHome)?;
    Ok(Path::new(&home).join(CONFIG_RELATIVE_PATH))
}

impl Config {
    /// Load config from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "config file absent, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write config to `path`, creating the parent directory on demand.
    ///
    /// The file holds passwords. On unix it is created with mode 0600, and an
    /// existing file with looser bits is tightened before the new content
    /// is written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(write_err)?;
        }

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(CONFIG_FILE_MODE);
        }
        let mut file = options.open(path).map_err(write_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(CONFIG_FILE_MODE))
                .map_err(write_err)?;
        }
        file.write_all(content.as_bytes()).map_err(write_err)?;
        Ok(())
    }

    pub fn cpu_thresholds(&self) -> CpuThresholds {
        CpuThresholds {
            yellow: f64::from(self.cpu_load_yellow),
            red: f64::from(self.cpu_load_red),
        }
    }

    pub fn server(&self, name: &str) -> Option<&ServerEntry> {
        self.servers.iter().find(|s| s.name == name)
    }
}

impl ServerEntry {
    /// Bare hostname: scheme, port, and path stripped.
    pub fn hostname(&self) -> &str {
        let host = self.host.trim();
        let host = host
            .strip_prefix("https://")
            .or_else(|| host.strip_prefix("http://"))
            .unwrap_or(host);
        let host = host.split('/').next().unwrap_or(host);
        host.split(':').next().unwrap_or(host)
    }

    /// API root, e.g. `https://pve1:8006/api2/json`.
    pub fn api_base_url(&self) -> String {
        format!("https://{}:{}/api2/json", self.hostname(), DEFAULT_API_PORT)
    }
}
