//! Resource directory: an immutable snapshot of the cluster's guests.
//!
//! A snapshot is never updated in place. Refreshing means fetching a new
//! one and dropping the old.

use std::collections::HashSet;

use tracing::{debug, warn};

use proxmon_core::error::GatewayError;
use proxmon_core::resource::Resource;

use crate::gateway::Gateway;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    resources: Vec<Resource>,
}

impl Snapshot {
    /// Fetch the full current snapshot.
    pub fn fetch_all(gateway: &dyn Gateway) -> Result<Self, GatewayError> {
        let resources = gateway.fetch_resources()?;
        debug!(count = resources.len(), "fetched resource snapshot");
        Ok(Self::from_resources(resources))
    }

    /// Build a snapshot. Ids are unique: a repeated id keeps its first entry.
    pub fn from_resources(resources: Vec<Resource>) -> Self {
        let mut seen = HashSet::new();
        let resources = resources
            .into_iter()
            .filter(|r| {
                let fresh = seen.insert(r.id.clone());
                if !fresh {
                    warn!(id = %r.id, node = %r.node, "duplicate resource id in snapshot, ignoring");
                }
                fresh
            })
            .collect();
        Self { resources }
    }

    /// Look up by id. Absence is the normal answer for a mistyped id.
    pub fn find(&self, id: &str) -> Option<&Resource> {
        let id = id.trim();
        self.resources.iter().find(|r| r.id == id)
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::mock::{Call, MockGateway, Op};
    use proxmon_core::resource::ResourceKind;

    fn sample() -> Vec<Resource> {
        vec![
            Resource::new("101", ResourceKind::Vm, "pve1", "running").with_name("web"),
            Resource::new("200", ResourceKind::Container, "pve2", "stopped"),
        ]
    }

    #[test]
    fn test_find_by_id() {
        let snap = Snapshot::from_resources(sample());
        assert_eq!(snap.find("200").map(|r| r.node.as_str()), Some("pve2"));
        assert_eq!(snap.find(" 101 ").and_then(|r| r.name.as_deref()), Some("web"));
    }

    #[test]
    fn test_find_missing_is_none() {
        let snap = Snapshot::from_resources(sample());
        assert!(snap.find("999").is_none());
        assert!(Snapshot::default().find("101").is_none());
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let mut resources = sample();
        resources.push(Resource::new("101", ResourceKind::Container, "pve3", "stopped"));
        let snap = Snapshot::from_resources(resources);
        assert_eq!(snap.len(), 2);
        assert_eq!(snap.find("101").map(|r| r.kind), Some(ResourceKind::Vm));
    }

    #[test]
    fn test_fetch_all_uses_gateway_once() {
        let gw = MockGateway::new().with_resources(sample());
        let snap = Snapshot::fetch_all(&gw).unwrap();
        assert_eq!(snap.len(), 2);
        assert_eq!(gw.calls(), vec![Call::FetchResources]);
    }

    #[test]
    fn test_fetch_all_propagates_upstream_error() {
        let gw = MockGateway::new().failing(
            Op::FetchResources,
            GatewayError::Transport("connection refused".to_string()),
        );
        let err = Snapshot::fetch_all(&gw).unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
    }

    #[test]
    fn test_lookup_does_not_touch_gateway() {
        let gw = MockGateway::new().with_resources(sample());
        let snap = Snapshot::fetch_all(&gw).unwrap();
        let _ = snap.find("101");
        let _ = snap.find("nope");
        assert_eq!(gw.call_count(), 1);
    }
}
