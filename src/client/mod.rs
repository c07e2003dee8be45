//! The only seam between this crate and the cluster.
//!
//! [`ClusterClient`] is implemented by [`Kubectl`] for real clusters and by
//! in-memory fakes in tests. Implementations receive requests that have
//! already been validated and must not second-guess them.

mod kubectl;

use serde::Serialize;

pub use kubectl::Kubectl;

use crate::error::Result;
use crate::models::{LogsRequest, ResourceSummary, RestartRequest, ScaleRequest};

/// Outcome of a store snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Pod the snapshot was taken in, `namespace/name`.
    pub pod: String,
    /// Snapshot file path inside that pod.
    pub path: String,
    /// Whatever the snapshot tool printed.
    pub output: String,
}

/// Every method makes one external call, except
/// [`snapshot_store`](Self::snapshot_store) which makes two. Nothing is
/// retried.
#[allow(async_fn_in_trait)]
pub trait ClusterClient {
    async fn list_nodes(&self) -> Result<Vec<ResourceSummary>>;

    /// `None` lists every namespace.
    async fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<ResourceSummary>>;

    /// `None` lists every namespace.
    async fn list_services(&self, namespace: Option<&str>) -> Result<Vec<ResourceSummary>>;

    async fn scale_deployment(&self, req: &ScaleRequest) -> Result<()>;

    /// Starts a rolling restart and returns without waiting for it.
    async fn restart_deployment(&self, req: &RestartRequest) -> Result<()>;

    async fn snapshot_store(&self) -> Result<Snapshot>;

    async fn fetch_logs(&self, req: &LogsRequest) -> Result<String>;
}
