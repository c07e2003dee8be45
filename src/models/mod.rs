pub mod k8s;
pub mod requests;

pub use k8s::{ResourceKind, ResourceSummary};
pub use requests::{LogsRequest, RestartRequest, ScaleRequest, DEFAULT_LOG_LINES};
