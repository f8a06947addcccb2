use colored::{ColoredString, Colorize};
use tabled::Tabled;

use proxmon_core::config::CpuThresholds;
use proxmon_core::node::{NodeStatus, NodeSummary, Task};
use proxmon_core::resource::Resource;
use proxmon_core::time::{bytes_to_gib, format_unix_timestamp, format_uptime};

/// Colour band for a table cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shade {
    Green,
    Yellow,
    Red,
}

pub fn cpu_shade(cpu_percent: f64, thresholds: CpuThresholds) -> Shade {
    if cpu_percent >= thresholds.red {
        Shade::Red
    } else if cpu_percent >= thresholds.yellow {
        Shade::Yellow
    } else {
        Shade::Green
    }
}

pub fn updates_shade(pending: usize) -> Shade {
    match pending {
        0 => Shade::Green,
        1..=10 => Shade::Yellow,
        _ => Shade::Red,
    }
}

fn paint(text: String, shade: Shade, use_color: bool) -> String {
    if !use_color {
        return text;
    }
    let colored: ColoredString = match shade {
        Shade::Green => text.green(),
        Shade::Yellow => text.yellow(),
        Shade::Red => text.red().bold(),
    };
    colored.to_string()
}

/// Display row for the resource overview.
#[derive(Debug, Tabled)]
pub struct ResourceRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Type")]
    pub kind: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Uptime")]
    pub uptime: String,
    #[tabled(rename = "CPU%")]
    pub cpu: String,
    #[tabled(rename = "RAM (GB)")]
    pub ram: String,
    #[tabled(rename = "Disk (GB)")]
    pub disk: String,
    #[tabled(rename = "Node")]
    pub node: String,
}

/// Display row for `:nodes`.
#[derive(Debug, Tabled)]
pub struct NodeRow {
    #[tabled(rename = "Node")]
    pub node: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Version")]
    pub version: String,
    #[tabled(rename = "DNS (IP)")]
    pub dns: String,
    #[tabled(rename = "Updates")]
    pub updates: String,
}

/// Display row for `:tasks`.
#[derive(Debug, Tabled)]
pub struct TaskRow {
    #[tabled(rename = "UPID")]
    pub upid: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "StartTime")]
    pub start: String,
    #[tabled(rename = "EndTime")]
    pub end: String,
    #[tabled(rename = "Type")]
    pub task_type: String,
    #[tabled(rename = "User")]
    pub user: String,
}

pub fn resource_row(res: &Resource, thresholds: CpuThresholds, use_color: bool) -> ResourceRow {
    let cpu = (res.cpu * 1000.0).round() / 10.0;
    let status_shade = if res.is_running() {
        Shade::Green
    } else {
        Shade::Red
    };

    ResourceRow {
        id: res.id.clone(),
        kind: res.kind.to_string(),
        name: res.name.clone().unwrap_or_else(|| "-".to_string()),
        status: paint(res.status.clone(), status_shade, use_color),
        uptime: format_uptime(res.uptime),
        cpu: paint(format!("{:.1}", cpu), cpu_shade(cpu, thresholds), use_color),
        ram: format!("{:.1}/{:.1}", bytes_to_gib(res.mem), bytes_to_gib(res.maxmem)),
        disk: format!("{:.1}", bytes_to_gib(res.disk)),
        node: res.node.clone(),
    }
}

pub fn node_row(node: &NodeSummary, use_color: bool) -> NodeRow {
    let status_shade = if node.status == NodeStatus::Online {
        Shade::Green
    } else {
        Shade::Red
    };
    let dns = node
        .dns
        .as_ref()
        .map(|d| d.joined())
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| "-".to_string());

    NodeRow {
        node: node.name.clone(),
        status: paint(node.status.to_string(), status_shade, use_color),
        version: node.version.clone(),
        dns,
        updates: paint(
            node.pending_updates.to_string(),
            updates_shade(node.pending_updates),
            use_color,
        ),
    }
}

pub fn task_row(task: &Task) -> TaskRow {
    TaskRow {
        upid: task.upid.clone(),
        status: task.status.clone().unwrap_or_default(),
        start: format_unix_timestamp(task.starttime.filter(|t| *t > 0)),
        end: format_unix_timestamp(task.endtime.filter(|t| *t > 0)),
        task_type: task.task_type.clone(),
        user: task.user.clone(),
    }
}

/// Render rows as a rounded table, or `(none)` when empty.
pub fn render_table<T: Tabled>(rows: &[T]) -> String {
    if rows.is_empty() {
        return "(none)".to_string();
    }
    tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string()
}

pub fn print_resources(resources: &[Resource], thresholds: CpuThresholds, use_color: bool) {
    let rows: Vec<ResourceRow> = resources
        .iter()
        .map(|r| resource_row(r, thresholds, use_color))
        .collect();
    crate::ui::title("Proxmon VM Overview");
    println!("{}", render_table(&rows));
}

pub fn nodes_table(nodes: &[NodeSummary], use_color: bool) -> String {
    let rows: Vec<NodeRow> = nodes.iter().map(|n| node_row(n, use_color)).collect();
    render_table(&rows)
}

pub fn tasks_table(tasks: &[Task]) -> String {
    let rows: Vec<TaskRow> = tasks.iter().map(task_row).collect();
    render_table(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxmon_core::config::Config;
    use proxmon_core::node::DnsConfig;
    use proxmon_core::resource::ResourceKind;

    fn thresholds() -> CpuThresholds {
        Config::default().cpu_thresholds()
    }

    #[test]
    fn test_cpu_shade_bands() {
        assert_eq!(cpu_shade(10.0, thresholds()), Shade::Green);
        assert_eq!(cpu_shade(80.0, thresholds()), Shade::Yellow);
        assert_eq!(cpu_shade(89.9, thresholds()), Shade::Yellow);
        assert_eq!(cpu_shade(90.0, thresholds()), Shade::Red);
    }

    #[test]
    fn test_updates_shade_bands() {
        assert_eq!(updates_shade(0), Shade::Green);
        assert_eq!(updates_shade(10), Shade::Yellow);
        assert_eq!(updates_shade(11), Shade::Red);
    }

    #[test]
    fn test_resource_row_plain() {
        let mut res = Resource::new("101", ResourceKind::Vm, "pve1", "running").with_name("web");
        res.cpu = 0.4567;
        res.mem = 1_610_612_736;
        res.maxmem = 4 * 1024 * 1024 * 1024;
        res.disk = 0;
        res.uptime = 90_061;

        let row = resource_row(&res, thresholds(), false);
        assert_eq!(row.id, "101");
        assert_eq!(row.kind, "VM");
        assert_eq!(row.name, "web");
        assert_eq!(row.status, "running");
        assert_eq!(row.uptime, "1d 1h 1m");
        assert_eq!(row.cpu, "45.7");
        assert_eq!(row.ram, "1.5/4.0");
        assert_eq!(row.disk, "0.0");
        assert_eq!(row.node, "pve1");
    }

    #[test]
    fn test_resource_row_unnamed_container() {
        let res = Resource::new("200", ResourceKind::Container, "pve2", "stopped");
        let row = resource_row(&res, thresholds(), false);
        assert_eq!(row.kind, "LXC");
        assert_eq!(row.name, "-");
        assert_eq!(row.uptime, "-");
    }

    #[test]
    fn test_node_row_degraded() {
        let node = NodeSummary {
            name: "pve2".to_string(),
            status: NodeStatus::Offline,
            version: "-".to_string(),
            dns: None,
            pending_updates: 0,
        };
        let row = node_row(&node, false);
        assert_eq!(row.status, "offline");
        assert_eq!(row.dns, "-");
        assert_eq!(row.updates, "0");
    }

    #[test]
    fn test_node_row_dns_joined() {
        let node = NodeSummary {
            name: "pve1".to_string(),
            status: NodeStatus::Online,
            version: "8.2.4".to_string(),
            dns: Some(DnsConfig::from_input("1.1.1.1", "", "9.9.9.9")),
            pending_updates: 3,
        };
        let row = node_row(&node, false);
        assert_eq!(row.dns, "1.1.1.1, 9.9.9.9");
        assert_eq!(row.updates, "3");
    }

    #[test]
    fn test_task_row_running_task() {
        let task = Task {
            upid: "UPID:pve1:1".to_string(),
            status: None,
            starttime: Some(1_700_000_000),
            endtime: Some(0),
            task_type: "qmstart".to_string(),
            user: "root@pam".to_string(),
        };
        let row = task_row(&task);
        assert_eq!(row.status, "");
        assert_eq!(row.end, "-");
        assert_ne!(row.start, "-");
    }

    #[test]
    fn test_render_table_empty_and_headers() {
        let empty: Vec<TaskRow> = Vec::new();
        assert_eq!(render_table(&empty), "(none)");

        let rows = vec![task_row(&Task::default())];
        let out = render_table(&rows);
        for header in ["UPID", "Status", "StartTime", "EndTime", "Type", "User"] {
            assert!(out.contains(header), "missing header {}", header);
        }
    }
}
