// Flattened views of the cluster objects kubectl returns, one per row
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{Node, Pod, Service};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use serde::{Deserialize, Serialize};

/// Marker a node's status must carry to count as ready.
pub const READY_MARKER: &str = "Ready";

/// Phase a pod must be in to count as ready.
pub const RUNNING_MARKER: &str = "Running";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Node,
    Pod,
    Service,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Pod => "pod",
            Self::Service => "service",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSummary {
    pub kind: ResourceKind,
    /// `None` for cluster-scoped objects (nodes).
    pub namespace: Option<String>,
    pub name: String,
    /// Ready condition for nodes, `status.phase` for pods, type for services.
    pub phase: String,
    /// What kubectl would print in its STATUS column.
    pub status: String,
    pub created: Option<DateTime<Utc>>,
}

impl ResourceSummary {
    /// `namespace/name`, or just `name` for cluster-scoped objects.
    pub fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}/{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Human age relative to `now`, in kubectl's coarse style (`45s`, `3h`, `12d`).
    pub fn age(&self, now: DateTime<Utc>) -> String {
        let Some(created) = self.created else {
            return "<unknown>".to_string();
        };
        let secs = (now - created).num_seconds().max(0);
        match secs {
            s if s < 120 => format!("{s}s"),
            s if s < 2 * 3600 => format!("{}m", s / 60),
            s if s < 2 * 86400 => format!("{}h", s / 3600),
            s => format!("{}d", s / 86400),
        }
    }
}

fn name_of(meta: &ObjectMeta) -> String {
    meta.name.clone().unwrap_or_default()
}

fn created_at(meta: &ObjectMeta) -> Option<DateTime<Utc>> {
    meta.creation_timestamp.as_ref().map(|t| t.0)
}

impl From<&Node> for ResourceSummary {
    fn from(node: &Node) -> Self {
        let ready = node
            .status
            .as_ref()
            .and_then(|s| s.conditions.as_ref())
            .and_then(|conds| conds.iter().find(|c| c.type_ == READY_MARKER))
            .map(|c| c.status.as_str());

        let phase = match ready {
            Some("True") => READY_MARKER.to_string(),
            Some("False") => format!("Not{READY_MARKER}"),
            _ => "Unknown".to_string(),
        };

        let cordoned = node
            .spec
            .as_ref()
            .and_then(|s| s.unschedulable)
            .unwrap_or(false);

        let status = if cordoned {
            format!("{phase},SchedulingDisabled")
        } else {
            phase.clone()
        };

        Self {
            kind: ResourceKind::Node,
            namespace: None,
            name: name_of(&node.metadata),
            phase,
            status,
            created: created_at(&node.metadata),
        }
    }
}

impl From<&Pod> for ResourceSummary {
    fn from(pod: &Pod) -> Self {
        let status = pod.status.as_ref();
        let phase = status
            .and_then(|s| s.phase.clone())
            .unwrap_or_else(|| "Unknown".to_string());

        // A container stuck waiting or crashed says more than the pod phase.
        let container_reason = status
            .and_then(|s| s.container_statuses.as_ref())
            .and_then(|statuses| {
                statuses.iter().find_map(|cs| {
                    let state = cs.state.as_ref()?;
                    state
                        .waiting
                        .as_ref()
                        .and_then(|w| w.reason.clone())
                        .or_else(|| state.terminated.as_ref().and_then(|t| t.reason.clone()))
                })
            });

        let display = if pod.metadata.deletion_timestamp.is_some() {
            "Terminating".to_string()
        } else {
            container_reason
                .or_else(|| status.and_then(|s| s.reason.clone()))
                .unwrap_or_else(|| phase.clone())
        };

        Self {
            kind: ResourceKind::Pod,
            namespace: pod.metadata.namespace.clone(),
            name: name_of(&pod.metadata),
            phase,
            status: display,
            created: created_at(&pod.metadata),
        }
    }
}

impl From<&Service> for ResourceSummary {
    fn from(svc: &Service) -> Self {
        let spec = svc.spec.as_ref();
        let kind = spec
            .and_then(|s| s.type_.clone())
            .unwrap_or_else(|| "ClusterIP".to_string());
        let cluster_ip = spec
            .and_then(|s| s.cluster_ip.clone())
            .unwrap_or_else(|| "<none>".to_string());
        let ports = spec
            .and_then(|s| s.ports.as_ref())
            .map(|ports| {
                ports
                    .iter()
                    .map(|p| {
                        let proto = p.protocol.as_deref().unwrap_or("TCP");
                        match p.node_port {
                            Some(np) => format!("{}:{np}/{proto}", p.port),
                            None => format!("{}/{proto}", p.port),
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "<none>".to_string());

        Self {
            kind: ResourceKind::Service,
            namespace: svc.metadata.namespace.clone(),
            name: name_of(&svc.metadata),
            phase: kind,
            status: format!("{cluster_ip} {ports}"),
            created: created_at(&svc.metadata),
        }
    }
}
