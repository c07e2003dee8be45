//! Readiness aggregation over resource listings.
//!
//! Two rules only: a node counts as ready when `Ready` is one of the
//! comma-separated conditions in its status (so `Ready,SchedulingDisabled`
//! is ready and `NotReady` is not); a pod counts as ready when its phase is
//! exactly `Running`, whatever its containers are doing.

use serde::Serialize;

use crate::models::k8s::{READY_MARKER, RUNNING_MARKER};
use crate::models::ResourceSummary;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub scope: String,
    pub ready: usize,
    pub total: usize,
    pub not_ready: Vec<String>,
}

impl HealthReport {
    fn tally<'a>(
        scope: impl Into<String>,
        items: impl IntoIterator<Item = &'a ResourceSummary>,
        is_ready: impl Fn(&ResourceSummary) -> bool,
    ) -> Self {
        let mut report = Self {
            scope: scope.into(),
            ready: 0,
            total: 0,
            not_ready: Vec::new(),
        };
        for item in items {
            report.total += 1;
            if is_ready(item) {
                report.ready += 1;
            } else {
                report.not_ready.push(item.qualified_name());
            }
        }
        report
    }

    /// Fraction of ready resources, `None` for an empty scope.
    pub fn ratio(&self) -> Option<f64> {
        (self.total > 0).then(|| self.ready as f64 / self.total as f64)
    }

    pub fn is_healthy(&self) -> bool {
        self.ready == self.total
    }
}

pub fn node_is_ready(node: &ResourceSummary) -> bool {
    node.status.split(',').any(|cond| cond.trim() == READY_MARKER)
}

pub fn pod_is_ready(pod: &ResourceSummary) -> bool {
    pod.phase == RUNNING_MARKER
}

pub fn aggregate_nodes(nodes: &[ResourceSummary]) -> HealthReport {
    HealthReport::tally("nodes", nodes, node_is_ready)
}

pub fn aggregate_pods(pods: &[ResourceSummary]) -> HealthReport {
    HealthReport::tally("pods", pods, pod_is_ready)
}

/// Like [`aggregate_pods`], restricted to pods in `namespace`. Accepts an
/// unfiltered listing.
pub fn aggregate_namespace(namespace: &str, pods: &[ResourceSummary]) -> HealthReport {
    HealthReport::tally(
        namespace,
        pods.iter().filter(|p| p.namespace.as_deref() == Some(namespace)),
        pod_is_ready,
    )
}
