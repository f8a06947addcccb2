use serde::{Deserialize, Serialize};

use crate::error::DnsError;

/// Cluster membership state of a physical node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Online,
    Offline,
    #[default]
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Online => write!(f, "online"),
            Self::Offline => write!(f, "offline"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Entry of the `/nodes` listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeListEntry {
    pub node: String,
    #[serde(default)]
    pub status: NodeStatus,
}

/// Node overview row, assembled from the listing plus per-node detail calls.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSummary {
    pub name: String,
    pub status: NodeStatus,
    /// Proxmox VE version, `-` when the detail call failed.
    pub version: String,
    pub dns: Option<DnsConfig>,
    pub pending_updates: usize,
}

impl NodeSummary {
    /// Row used when per-node detail could not be fetched.
    pub fn degraded(entry: NodeListEntry) -> Self {
        Self {
            name: entry.node,
            status: entry.status,
            version: "-".to_string(),
            dns: None,
            pending_updates: 0,
        }
    }
}

/// Resolver settings for a node. Secondary and tertiary are optional and
/// never carried as empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DnsConfig {
    #[serde(rename = "dns1", default)]
    pub primary: String,
    #[serde(rename = "dns2", default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
    #[serde(rename = "dns3", default, skip_serializing_if = "Option::is_none")]
    pub tertiary: Option<String>,
}

impl DnsConfig {
    /// Build from raw user input. Values are trimmed and blank optionals dropped.
    pub fn from_input(primary: &str, secondary: &str, tertiary: &str) -> Self {
        Self {
            primary: primary.trim().to_string(),
            secondary: non_blank(secondary),
            tertiary: non_blank(tertiary),
        }
    }

    pub fn validate(&self) -> Result<(), DnsError> {
        if self.primary.trim().is_empty() {
            return Err(DnsError::MissingPrimary);
        }
        Ok(())
    }

    /// Request fields: `dns1` always, `dns2`/`dns3` only when set.
    pub fn form_fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![("dns1", self.primary.as_str())];
        if let Some(s) = self.secondary.as_deref().filter(|s| !s.trim().is_empty()) {
            fields.push(("dns2", s));
        }
        if let Some(t) = self.tertiary.as_deref().filter(|t| !t.trim().is_empty()) {
            fields.push(("dns3", t));
        }
        fields
    }

    /// Comma-joined list of configured servers, for display.
    pub fn joined(&self) -> String {
        [Some(self.primary.as_str()), self.secondary.as_deref(), self.tertiary.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() { None } else { Some(s.to_string()) }
}

/// Entry of `/nodes/{node}/tasks`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Task {
    #[serde(default)]
    pub upid: String,
    /// Absent while the task is still running.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub starttime: Option<i64>,
    #[serde(default)]
    pub endtime: Option<i64>,
    #[serde(rename = "type", default)]
    pub task_type: String,
    #[serde(default)]
    pub user: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dns_from_input_drops_blank_optionals() {
        let dns = DnsConfig::from_input(" 1.1.1.1 ", "  ", "");
        assert_eq!(dns.primary, "1.1.1.1");
        assert_eq!(dns.secondary, None);
        assert_eq!(dns.tertiary, None);
        assert_eq!(dns.form_fields(), vec![("dns1", "1.1.1.1")]);
    }

    #[test]
    fn test_dns_form_fields_all_set() {
        let dns = DnsConfig::from_input("1.1.1.1", "8.8.8.8", "9.9.9.9");
        assert_eq!(
            dns.form_fields(),
            vec![("dns1", "1.1.1.1"), ("dns2", "8.8.8.8"), ("dns3", "9.9.9.9")]
        );
        assert_eq!(dns.joined(), "1.1.1.1, 8.8.8.8, 9.9.9.9");
    }

    #[test]
    fn test_dns_tertiary_without_secondary() {
        let dns = DnsConfig::from_input("1.1.1.1", "", "9.9.9.9");
        assert_eq!(dns.form_fields(), vec![("dns1", "1.1.1.1"), ("dns3", "9.9.9.9")]);
    }

    #[test]
    fn test_dns_validate_requires_primary() {
        assert_eq!(
            DnsConfig::from_input("", "8.8.8.8", "").validate(),
            Err(DnsError::MissingPrimary)
        );
        assert!(DnsConfig::from_input("1.1.1.1", "", "").validate().is_ok());
    }

    #[test]
    fn test_dns_deserialize_from_api() {
        let dns: DnsConfig =
            serde_json::from_str(r#"{"search": "lan", "dns1": "10.0.0.1", "dns2": "10.0.0.2"}"#)
                .unwrap();
        assert_eq!(dns.joined(), "10.0.0.1, 10.0.0.2");
    }

    #[test]
    fn test_node_status_unknown_fallback() {
        let entry: NodeListEntry =
            serde_json::from_str(r#"{"node": "pve3", "status": "maintenance"}"#).unwrap();
        assert_eq!(entry.status, NodeStatus::Unknown);
        let entry: NodeListEntry = serde_json::from_str(r#"{"node": "pve1"}"#).unwrap();
        assert_eq!(entry.status, NodeStatus::Unknown);
    }

    #[test]
    fn test_task_running_has_no_status() {
        let task: Task = serde_json::from_str(
            r#"{"upid": "UPID:pve1:0001", "type": "vzdump", "user": "root@pam", "starttime": 1700000000}"#,
        )
        .unwrap();
        assert_eq!(task.status, None);
        assert_eq!(task.endtime, None);
        assert_eq!(task.task_type, "vzdump");
    }
}
