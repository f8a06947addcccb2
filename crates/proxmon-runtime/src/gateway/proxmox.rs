//! Proxmox VE REST gateway over blocking HTTP.
//!
//! Authentication uses the ticket flow: `POST /access/ticket` returns a
//! ticket (sent as the `PVEAuthCookie` cookie) and a CSRF token that every
//! non-GET request must carry. Tickets are valid for two hours and are
//! renewed before the next request once they are older than
//! [`TICKET_RENEW_AFTER`].
//!
//! No request timeout is configured beyond the client default; a remote
//! call that hangs blocks the console.

use std::cell::RefCell;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header::COOKIE;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use proxmon_core::config::ServerEntry;
use proxmon_core::error::GatewayError;
use proxmon_core::node::{DnsConfig, NodeListEntry, NodeSummary, Task};
use proxmon_core::resource::{Resource, ResourceTarget, Verb};

use super::Gateway;

/// Renew the ticket this long after it was issued (lifetime is 2h).
pub const TICKET_RENEW_AFTER: Duration = Duration::from_secs(90 * 60);

const CSRF_HEADER: &str = "CSRFPreventionToken";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct TicketData {
    ticket: String,
    #[serde(rename = "CSRFPreventionToken")]
    csrf_token: String,
}

#[derive(Debug, Deserialize)]
struct CurrentStatus {
    status: String,
}

#[derive(Debug, Deserialize)]
struct VersionInfo {
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug)]
struct Session {
    ticket: String,
    csrf_token: String,
    issued_at: Instant,
}

/// Authenticated connection to one Proxmox VE endpoint.
pub struct ProxmoxGateway {
    base_url: String,
    username: String,
    password: String,
    http: Client,
    session: RefCell<Session>,
}

impl ProxmoxGateway {
    /// Build the HTTP client and log in. Fails with `Auth` on bad credentials.
    pub fn connect(server: &ServerEntry) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .user_agent(concat!("proxmon/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(!server.verify_ssl)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let base_url = server.api_base_url();
        info!(server = %server.name, url = %base_url, "connecting to proxmox");
        let session = login(&http, &base_url, &server.username, &server.password)?;

        Ok(Self {
            base_url,
            username: server.username.clone(),
            password: server.password.clone(),
            http,
            session: RefCell::new(session),
        })
    }

    fn renew_session_if_stale(&self) -> Result<(), GatewayError> {
        if self.session.borrow().issued_at.elapsed() < TICKET_RENEW_AFTER {
            return Ok(());
        }
        debug!("renewing proxmox ticket");
        let fresh = login(&self.http, &self.base_url, &self.username, &self.password)?;
        *self.session.borrow_mut() = fresh;
        Ok(())
    }

    fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        form: &[(&str, &str)],
    ) -> Result<Value, GatewayError> {
        self.renew_session_if_stale()?;
        let session = self.session.borrow();

        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "proxmox api request");

        let mut req = self
            .http
            .request(method.clone(), &url)
            .header(COOKIE, format!("PVEAuthCookie={}", session.ticket));
        if method != Method::GET {
            req = req.header(CSRF_HEADER, session.csrf_token.as_str());
        }
        if !query.is_empty() {
            req = req.query(query);
        }
        if !form.is_empty() {
            req = req.form(form);
        }

        let resp = req
            .send()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !status.is_success() {
            warn!(%method, %url, %status, "proxmox api request failed");
            if status == StatusCode::UNAUTHORIZED {
                return Err(GatewayError::Auth(rejection_reason(status, &body)));
            }
            return Err(GatewayError::Rejected(rejection_reason(status, &body)));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        let envelope: Envelope<Option<Value>> =
            serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))?;
        Ok(envelope.data.unwrap_or(Value::Null))
    }

    fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let data = self.request(Method::GET, path, query, &[])?;
        serde_json::from_value(data).map_err(|e| GatewayError::Decode(format!("{}: {}", path, e)))
    }

    fn post(&self, path: &str, form: &[(&str, &str)]) -> Result<(), GatewayError> {
        self.request(Method::POST, path, &[], form).map(|_| ())
    }

    fn node_detail(&self, entry: &NodeListEntry) -> Result<NodeSummary, GatewayError> {
        let name = &entry.node;
        let version: VersionInfo = self.get(&format!("/nodes/{}/version", name), &[])?;
        let updates: Vec<Value> = self.get(&format!("/nodes/{}/apt/update", name), &[])?;
        let dns: DnsConfig = self.get(&format!("/nodes/{}/dns", name), &[])?;

        Ok(NodeSummary {
            name: name.clone(),
            status: entry.status,
            version: version.version.unwrap_or_else(|| "-".to_string()),
            dns: Some(dns),
            pending_updates: updates.len(),
        })
    }
}

fn login(
    http: &Client,
    base_url: &str,
    username: &str,
    password: &str,
) -> Result<Session, GatewayError> {
    let resp = http
        .post(format!("{}/access/ticket", base_url))
        .form(&[("username", username), ("password", password)])
        .send()
        .map_err(|e| GatewayError::Transport(e.to_string()))?;

    let status = resp.status();
    let body = resp
        .text()
        .map_err(|e| GatewayError::Transport(e.to_string()))?;
    if !status.is_success() {
        return Err(GatewayError::Auth(rejection_reason(status, &body)));
    }

    let envelope: Envelope<Option<TicketData>> =
        serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))?;
    // A wrong password can come back as 200 with `"data": null`.
    let ticket = envelope
        .data
        .ok_or_else(|| GatewayError::Auth(format!("login rejected for {}", username)))?;

    Ok(Session {
        ticket: ticket.ticket,
        csrf_token: ticket.csrf_token,
        issued_at: Instant::now(),
    })
}

/// Human-readable reason for a non-2xx answer.
///
/// Prefers the API's `message`, then its per-parameter `errors`, then the raw
/// body, then the status line.
pub fn rejection_reason(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        if let Some(msg) = json.get("message").and_then(Value::as_str) {
            let msg = msg.trim();
            if !msg.is_empty() {
                return msg.to_string();
            }
        }
        if let Some(errors) = json.get("errors").and_then(Value::as_object) {
            let joined = errors
                .iter()
                .map(|(field, err)| match err.as_str() {
                    Some(s) => format!("{}: {}", field, s.trim()),
                    None => format!("{}: {}", field, err),
                })
                .collect::<Vec<_>>()
                .join("; ");
            if !joined.is_empty() {
                return joined;
            }
        }
    }
    let body = body.trim();
    if !body.is_empty() && !body.starts_with('{') {
        return body.to_string();
    }
    format!("HTTP {}", status)
}

fn guest_path(target: &ResourceTarget) -> String {
    format!(
        "/nodes/{}/{}/{}",
        target.node,
        target.kind.api_segment(),
        target.id
    )
}

impl Gateway for ProxmoxGateway {
    fn fetch_resources(&self) -> Result<Vec<Resource>, GatewayError> {
        self.get("/cluster/resources", &[("type", "vm".to_string())])
    }

    fn send_action(&self, target: &ResourceTarget, verb: Verb) -> Result<(), GatewayError> {
        info!(%target, %verb, "sending lifecycle command");
        self.post(&format!("{}/status/{}", guest_path(target), verb), &[])
    }

    fn read_status(&self, target: &ResourceTarget) -> Result<String, GatewayError> {
        let current: CurrentStatus =
            self.get(&format!("{}/status/current", guest_path(target)), &[])?;
        Ok(current.status)
    }

    fn delete(&self, target: &ResourceTarget) -> Result<(), GatewayError> {
        info!(%target, "deleting guest");
        self.request(Method::DELETE, &guest_path(target), &[], &[])
            .map(|_| ())
    }

    fn reboot_node(&self, node: &str) -> Result<(), GatewayError> {
        info!(node, "rebooting node");
        self.post(&format!("/nodes/{}/status", node), &[("command", "reboot")])
    }

    fn update_node(&self, node: &str) -> Result<(), GatewayError> {
        info!(node, "refreshing package index");
        self.post(&format!("/nodes/{}/apt/update", node), &[])
    }

    fn set_dns(&self, node: &str, dns: &DnsConfig) -> Result<(), GatewayError> {
        // The endpoint requires `search`; carry the node's current value over.
        let current: Value = self.get(&format!("/nodes/{}/dns", node), &[])?;
        let search = current
            .get("search")
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut form = dns.form_fields();
        if let Some(search) = search.as_deref() {
            form.push(("search", search));
        }
        info!(node, servers = %dns.joined(), "updating dns");
        self.request(Method::PUT, &format!("/nodes/{}/dns", node), &[], &form)
            .map(|_| ())
    }

    fn list_tasks(&self, node: &str, limit: u32) -> Result<Vec<Task>, GatewayError> {
        self.get(
            &format!("/nodes/{}/tasks", node),
            &[("limit", limit.to_string())],
        )
    }

    fn fetch_nodes(&self) -> Result<Vec<NodeSummary>, GatewayError> {
        let entries: Vec<NodeListEntry> = self.get("/nodes", &[])?;
        Ok(summarize_nodes(entries, |entry| self.node_detail(entry)))
    }
}

/// One summary per listed node, in listing order. A node whose detail
/// lookup fails gets a degraded row instead of failing the overview.
fn summarize_nodes<F>(entries: Vec<NodeListEntry>, mut detail: F) -> Vec<NodeSummary>
where
    F: FnMut(&NodeListEntry) -> Result<NodeSummary, GatewayError>,
{
    entries
        .into_iter()
        .map(|entry| match detail(&entry) {
            Ok(summary) => summary,
            Err(e) => {
                warn!(node = %entry.node, error = %e, "node detail unavailable");
                NodeSummary::degraded(entry)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxmon_core::node::NodeStatus;
    use proxmon_core::resource::ResourceKind;

    #[test]
    fn test_rejection_reason_prefers_message() {
        let body = r#"{"data": null, "message": "VM 101 is running - destroy failed\n"}"#;
        assert_eq!(
            rejection_reason(StatusCode::INTERNAL_SERVER_ERROR, body),
            "VM 101 is running - destroy failed"
        );
    }

    #[test]
    fn test_rejection_reason_joins_parameter_errors() {
        let body = r#"{"data": null, "errors": {"dns1": "invalid format - value does not look like a valid IP address\n"}}"#;
        assert_eq!(
            rejection_reason(StatusCode::BAD_REQUEST, body),
            "dns1: invalid format - value does not look like a valid IP address"
        );
    }

    #[test]
    fn test_rejection_reason_plain_body() {
        assert_eq!(
            rejection_reason(StatusCode::FORBIDDEN, "permission check failed"),
            "permission check failed"
        );
    }

    #[test]
    fn test_rejection_reason_falls_back_to_status() {
        assert_eq!(
            rejection_reason(StatusCode::INTERNAL_SERVER_ERROR, ""),
            "HTTP 500 Internal Server Error"
        );
        assert_eq!(
            rejection_reason(StatusCode::BAD_GATEWAY, r#"{"data": null}"#),
            "HTTP 502 Bad Gateway"
        );
    }

    fn entry(node: &str, status: NodeStatus) -> NodeListEntry {
        NodeListEntry {
            node: node.to_string(),
            status,
        }
    }

    #[test]
    fn test_summarize_nodes_degrades_only_failing_node() {
        let entries = vec![
            entry("pve1", NodeStatus::Online),
            entry("pve2", NodeStatus::Offline),
            entry("pve3", NodeStatus::Online),
        ];
        let nodes = summarize_nodes(entries, |e| {
            if e.node == "pve2" {
                return Err(GatewayError::Transport("no route to host".to_string()));
            }
            Ok(NodeSummary {
                name: e.node.clone(),
                status: e.status,
                version: "8.2.4".to_string(),
                dns: None,
                pending_updates: 2,
            })
        });

        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["pve1", "pve2", "pve3"]);
        assert_eq!(nodes[0].version, "8.2.4");
        assert_eq!(nodes[1], NodeSummary::degraded(entry("pve2", NodeStatus::Offline)));
        assert_eq!(nodes[1].version, "-");
        assert_eq!(nodes[1].pending_updates, 0);
        assert_eq!(nodes[2].pending_updates, 2);
    }

    #[test]
    fn test_summarize_nodes_all_failing_still_lists_every_node() {
        let entries = vec![entry("pve1", NodeStatus::Unknown), entry("pve2", NodeStatus::Online)];
        let nodes = summarize_nodes(entries, |_| Err(GatewayError::Auth("ticket expired".to_string())));
        assert_eq!(nodes.len(), 2);
        assert!(nodes.iter().all(|n| n.dns.is_none() && n.version == "-"));
    }

    #[test]
    fn test_guest_path() {
        let target = Resource::new("200", ResourceKind::Container, "pve2", "running").target();
        assert_eq!(guest_path(&target), "/nodes/pve2/lxc/200");
    }
}
