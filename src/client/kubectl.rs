use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use k8s_openapi::api::core::v1::{Node, Pod, Service};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::process::Command;

use super::{ClusterClient, Snapshot};
use crate::config::Settings;
use crate::error::{Error, Result, TransportError};
use crate::models::k8s::RUNNING_MARKER;
use crate::models::{LogsRequest, ResourceSummary, RestartRequest, ScaleRequest};

/// Tool run inside the store pod to take a snapshot.
const SNAPSHOT_TOOL: &str = "etcdctl";

/// Marker kubectl puts in stderr when the API server answers 404.
const NOT_FOUND_MARKER: &str = "(NotFound)";

/// Shape of `kubectl get ... -o json`.
#[derive(Deserialize)]
struct ItemList<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

// ── argument lists ────────────────────────────────────────────────────────────

fn list_args(resource: &str, namespace: Option<&str>) -> Vec<String> {
    let mut args = vec!["get".to_string(), resource.to_string()];
    match namespace {
        Some(ns) => args.extend(["-n".to_string(), ns.to_string()]),
        None if resource == "nodes" => {}
        None => args.push("--all-namespaces".to_string()),
    }
    args.extend(["-o".to_string(), "json".to_string()]);
    args
}

fn scale_args(req: &ScaleRequest) -> Vec<String> {
    vec![
        "scale".to_string(),
        "deployment".to_string(),
        req.name().to_string(),
        "-n".to_string(),
        req.namespace().to_string(),
        format!("--replicas={}", req.replicas()),
    ]
}

fn restart_args(req: &RestartRequest) -> Vec<String> {
    vec![
        "rollout".to_string(),
        "restart".to_string(),
        "deployment".to_string(),
        req.name().to_string(),
        "-n".to_string(),
        req.namespace().to_string(),
    ]
}

fn logs_args(req: &LogsRequest) -> Vec<String> {
    vec![
        "logs".to_string(),
        req.pod().to_string(),
        "-n".to_string(),
        req.namespace().to_string(),
        format!("--tail={}", req.lines()),
    ]
}

fn store_pod_args(namespace: &str, selector: &str) -> Vec<String> {
    vec![
        "get".to_string(),
        "pods".to_string(),
        "-n".to_string(),
        namespace.to_string(),
        "-l".to_string(),
        selector.to_string(),
        "-o".to_string(),
        "json".to_string(),
    ]
}

fn snapshot_args(namespace: &str, pod: &str, path: &str) -> Vec<String> {
    vec![
        "exec".to_string(),
        "-n".to_string(),
        namespace.to_string(),
        pod.to_string(),
        "--".to_string(),
        SNAPSHOT_TOOL.to_string(),
        "snapshot".to_string(),
        "save".to_string(),
        path.to_string(),
    ]
}

/// A running member if there is one, otherwise whatever was listed first.
fn pick_store_pod(pods: &[ResourceSummary]) -> Option<&ResourceSummary> {
    pods.iter()
        .find(|p| p.phase == RUNNING_MARKER && !p.name.is_empty())
        .or_else(|| pods.iter().find(|p| !p.name.is_empty()))
}

/// Turns a 404 from kubectl into [`Error::NotFound`]; anything else stays a
/// transport failure.
fn not_found_or(err: TransportError, kind: &'static str, name: String) -> Error {
    match err.stderr() {
        Some(stderr) if stderr.contains(NOT_FOUND_MARKER) => {
            log::debug!("kubectl: {kind} {name} not found: {stderr}");
            Error::NotFound { kind, name }
        }
        _ => err.into(),
    }
}

// ── client ────────────────────────────────────────────────────────────────────

/// [`ClusterClient`] backed by the kubectl binary.
///
/// Every call passes `--kubeconfig` explicitly, runs with stdin closed and is
/// killed if it outlives the configured timeout.
#[derive(Debug, Clone)]
pub struct Kubectl {
    program: PathBuf,
    kubeconfig: PathBuf,
    context: Option<String>,
    timeout: Duration,
    system_namespace: String,
    store_selector: String,
    snapshot_path: String,
}

impl Kubectl {
    pub fn new(settings: &Settings) -> Self {
        Self {
            program: settings.kubectl.clone(),
            kubeconfig: settings.credentials.path().to_path_buf(),
            context: settings.context.clone(),
            timeout: settings.timeout,
            system_namespace: settings.system_namespace.clone(),
            store_selector: settings.store_selector.clone(),
            snapshot_path: settings.snapshot_path.clone(),
        }
    }

    fn global_args(&self) -> Vec<String> {
        let mut args = vec![format!("--kubeconfig={}", self.kubeconfig.display())];
        if let Some(ref ctx) = self.context {
            args.push(format!("--context={ctx}"));
        }
        args
    }

    /// Full argument list for `args` plus its printable command line.
    fn invocation(&self, args: Vec<String>) -> (Vec<String>, String) {
        let mut full = self.global_args();
        full.extend(args);

        let mut line = vec![self.program.to_string_lossy().to_string()];
        line.extend(full.iter().cloned());
        (full, shell_words::join(&line))
    }

    /// Runs kubectl with `args` and returns its stdout.
    async fn run(&self, args: Vec<String>) -> Result<String, TransportError> {
        let (full, command) = self.invocation(args);
        self.exec(full, command).await
    }

    async fn exec(&self, full: Vec<String>, command: String) -> Result<String, TransportError> {
        log::debug!("kubectl: {command}");

        let child = Command::new(&self.program)
            .args(&full)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| TransportError::Spawn {
                command: command.clone(),
                source,
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(res) => res.map_err(|source| TransportError::Spawn {
                command: command.clone(),
                source,
            })?,
            Err(_) => {
                log::warn!("kubectl: killed after {:?}: {command}", self.timeout);
                return Err(TransportError::Timeout {
                    command,
                    after: self.timeout,
                });
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let stderr = if stderr.is_empty() {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr
            };
            return Err(TransportError::Failed {
                command,
                status: output.status.to_string(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn get_items<T: DeserializeOwned>(&self, args: Vec<String>) -> Result<Vec<T>> {
        let (full, command) = self.invocation(args);
        let stdout = self.exec(full, command.clone()).await?;
        let list: ItemList<T> = serde_json::from_str(&stdout)
            .map_err(|source| TransportError::Decode { command, source })?;
        Ok(list.items)
    }
}

impl ClusterClient for Kubectl {
    async fn list_nodes(&self) -> Result<Vec<ResourceSummary>> {
        let nodes: Vec<Node> = self.get_items(list_args("nodes", None)).await?;
        Ok(nodes.iter().map(ResourceSummary::from).collect())
    }

    async fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<ResourceSummary>> {
        let pods: Vec<Pod> = self.get_items(list_args("pods", namespace)).await?;
        Ok(pods.iter().map(ResourceSummary::from).collect())
    }

    async fn list_services(&self, namespace: Option<&str>) -> Result<Vec<ResourceSummary>> {
        let svcs: Vec<Service> = self.get_items(list_args("services", namespace)).await?;
        Ok(svcs.iter().map(ResourceSummary::from).collect())
    }

    async fn scale_deployment(&self, req: &ScaleRequest) -> Result<()> {
        self.run(scale_args(req)).await.map_err(|e| {
            not_found_or(e, "deployment", format!("{}/{}", req.namespace(), req.name()))
        })?;
        log::info!(
            "scaled deployment {}/{} to {} replicas",
            req.namespace(),
            req.name(),
            req.replicas()
        );
        Ok(())
    }

    async fn restart_deployment(&self, req: &RestartRequest) -> Result<()> {
        self.run(restart_args(req)).await.map_err(|e| {
            not_found_or(e, "deployment", format!("{}/{}", req.namespace(), req.name()))
        })?;
        log::info!("restart requested for deployment {}/{}", req.namespace(), req.name());
        Ok(())
    }

    async fn snapshot_store(&self) -> Result<Snapshot> {
        let ns = self.system_namespace.as_str();
        let pods: Vec<Pod> = self
            .get_items(store_pod_args(ns, &self.store_selector))
            .await?;

        let summaries: Vec<ResourceSummary> = pods.iter().map(ResourceSummary::from).collect();
        let pod = pick_store_pod(&summaries).ok_or_else(|| Error::NotFound {
                kind: "store pod",
                name: format!("{ns} ({})", self.store_selector),
            })?;

        log::info!("snapshot: using store pod {ns}/{}", pod.name);
        let output = self
            .run(snapshot_args(ns, &pod.name, &self.snapshot_path))
            .await?;

        Ok(Snapshot {
            pod: format!("{ns}/{}", pod.name),
            path: self.snapshot_path.clone(),
            output: output.trim().to_string(),
        })
    }

    async fn fetch_logs(&self, req: &LogsRequest) -> Result<String> {
        self.run(logs_args(req))
            .await
            .map_err(|e| not_found_or(e, "pod", format!("{}/{}", req.namespace(), req.pod())))
    }
}
