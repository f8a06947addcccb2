use serde::{Deserialize, Deserializer, Serialize};

/// Status string the cluster reports for a fully stopped guest.
pub const STATUS_STOPPED: &str = "stopped";
/// Status string the cluster reports for a running guest.
pub const STATUS_RUNNING: &str = "running";

/// Guest flavour. Decides which API subtree (`qemu` or `lxc`) a call goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    #[serde(rename = "qemu")]
    Vm,
    #[serde(rename = "lxc")]
    Container,
}

impl ResourceKind {
    /// Path segment used by the management API.
    pub fn api_segment(self) -> &'static str {
        match self {
            Self::Vm => "qemu",
            Self::Container => "lxc",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vm => write!(f, "VM"),
            Self::Container => write!(f, "LXC"),
        }
    }
}

/// One VM or container as reported by `/cluster/resources?type=vm`.
///
/// Telemetry fields are only used for display and default to zero when the
/// cluster omits them (stopped guests report no cpu/uptime).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "vmid", deserialize_with = "id_from_number_or_string")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub node: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub name: Option<String>,
    /// CPU usage as a fraction of allocated cores (0.0–1.0).
    #[serde(default)]
    pub cpu: f64,
    #[serde(default)]
    pub mem: u64,
    #[serde(default)]
    pub maxmem: u64,
    #[serde(default)]
    pub disk: u64,
    #[serde(default)]
    pub uptime: u64,
}

impl Resource {
    /// Minimal constructor; telemetry left at zero.
    pub fn new(id: impl Into<String>, kind: ResourceKind, node: &str, status: &str) -> Self {
        Self {
            id: id.into(),
            kind,
            node: node.to_string(),
            status: status.to_string(),
            name: None,
            cpu: 0.0,
            mem: 0,
            maxmem: 0,
            disk: 0,
            uptime: 0,
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// The resolved `(node, kind, id)` triple the gateway addresses.
    pub fn target(&self) -> ResourceTarget {
        ResourceTarget {
            node: self.node.clone(),
            kind: self.kind,
            id: self.id.clone(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == STATUS_RUNNING
    }
}

/// A guest address the gateway can act on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceTarget {
    pub node: String,
    pub kind: ResourceKind,
    pub id: String,
}

impl std::fmt::Display for ResourceTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} on {}", self.kind, self.id, self.node)
    }
}

/// One-shot lifecycle verbs accepted by `status/{verb}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Start,
    Stop,
    Shutdown,
    Reset,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Shutdown => "shutdown",
            Self::Reset => "reset",
        }
    }

    /// Capitalised form used in console messages ("Start", "Shutdown").
    pub fn title(self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::Stop => "Stop",
            Self::Shutdown => "Shutdown",
            Self::Reset => "Reset",
        }
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn id_from_number_or_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_cluster_resource_entry() {
        let json = r#"{
            "id": "qemu/101",
            "type": "qemu",
            "vmid": 101,
            "node": "pve1",
            "status": "running",
            "name": "web-01",
            "cpu": 0.125,
            "mem": 1073741824,
            "maxmem": 4294967296,
            "disk": 0,
            "uptime": 3600,
            "template": 0
        }"#;
        let res: Resource = serde_json::from_str(json).unwrap();
        assert_eq!(res.id, "101");
        assert_eq!(res.kind, ResourceKind::Vm);
        assert_eq!(res.node, "pve1");
        assert_eq!(res.name.as_deref(), Some("web-01"));
        assert!(res.is_running());
        assert_eq!(res.uptime, 3600);
    }

    #[test]
    fn test_deserialize_stopped_container_without_telemetry() {
        let json = r#"{"type": "lxc", "vmid": "200", "node": "pve2", "status": "stopped"}"#;
        let res: Resource = serde_json::from_str(json).unwrap();
        assert_eq!(res.id, "200");
        assert_eq!(res.kind, ResourceKind::Container);
        assert_eq!(res.cpu, 0.0);
        assert_eq!(res.name, None);
        assert!(!res.is_running());
    }

    #[test]
    fn test_target_display() {
        let res = Resource::new("101", ResourceKind::Vm, "pve1", STATUS_RUNNING);
        assert_eq!(res.target().to_string(), "VM 101 on pve1");
        let ct = Resource::new("200", ResourceKind::Container, "pve2", STATUS_STOPPED);
        assert_eq!(ct.target().to_string(), "LXC 200 on pve2");
    }

    #[test]
    fn test_kind_api_segment() {
        assert_eq!(ResourceKind::Vm.api_segment(), "qemu");
        assert_eq!(ResourceKind::Container.api_segment(), "lxc");
    }

    #[test]
    fn test_verb_strings() {
        assert_eq!(Verb::Shutdown.as_str(), "shutdown");
        assert_eq!(Verb::Reset.title(), "Reset");
    }
}
