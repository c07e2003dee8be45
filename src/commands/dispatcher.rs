use std::io::Write;

use super::{usage, Command};
use crate::client::ClusterClient;
use crate::config::Settings;
use crate::error::Result;
use crate::health::{aggregate_namespace, aggregate_nodes, aggregate_pods};
use crate::models::ResourceKind;
use crate::report::{Reporter, Section};

/// Runs one command invocation: validate, execute, report.
///
/// Sections are emitted as soon as each step finishes, so a failure late in
/// `info` leaves the earlier sections on screen. The first error ends the
/// invocation, annotated with the command it came from.
pub struct Dispatcher<'a, C, W> {
    client: &'a C,
    settings: &'a Settings,
    reporter: &'a mut Reporter<W>,
}

impl<'a, C: ClusterClient, W: Write> Dispatcher<'a, C, W> {
    pub fn new(client: &'a C, settings: &'a Settings, reporter: &'a mut Reporter<W>) -> Self {
        Self {
            client,
            settings,
            reporter,
        }
    }

    /// Validates `name`/`args` and, only if they are well formed, executes.
    pub async fn dispatch(&mut self, name: &str, args: &[String]) -> Result<()> {
        log::debug!("dispatch: validating {name} {args:?}");
        let command = Command::parse(name, args)?;
        self.execute(&command).await
    }

    pub async fn execute(&mut self, command: &Command) -> Result<()> {
        log::debug!("dispatch: executing {}", command.describe());
        self.perform(command)
            .await
            .map_err(|e| e.context(command.describe()))
    }

    async fn perform(&mut self, command: &Command) -> Result<()> {
        match command {
            Command::Info => self.info().await,
            Command::Health => self.health().await,
            Command::Scale(req) => {
                self.client.scale_deployment(req).await?;
                self.reporter.emit(&Section::Scaled {
                    namespace: req.namespace().to_string(),
                    name: req.name().to_string(),
                    replicas: req.replicas(),
                })
            }
            Command::Restart(req) => {
                self.client.restart_deployment(req).await?;
                self.reporter.emit(&Section::Restarted {
                    namespace: req.namespace().to_string(),
                    name: req.name().to_string(),
                })
            }
            Command::Backup => {
                let snapshot = self.client.snapshot_store().await?;
                self.reporter.emit(&Section::Snapshot(snapshot))
            }
            Command::Logs(req) => {
                let text = self.client.fetch_logs(req).await?;
                self.reporter.emit(&Section::Logs {
                    namespace: req.namespace().to_string(),
                    pod: req.pod().to_string(),
                    lines: req.lines(),
                    text,
                })
            }
            Command::Help => self.reporter.emit(&Section::Usage { text: usage() }),
        }
    }

    async fn info(&mut self) -> Result<()> {
        self.reporter.emit(&Section::Context {
            context: self.settings.active_context().map(String::from),
            kubeconfig: self.settings.credentials.path().display().to_string(),
        })?;

        let nodes = self.client.list_nodes().await?;
        self.reporter.emit(&Section::Resources {
            kind: ResourceKind::Node,
            items: nodes,
        })?;

        let pods = self.client.list_pods(None).await?;
        self.reporter.emit(&Section::Resources {
            kind: ResourceKind::Pod,
            items: pods,
        })?;

        let services = self.client.list_services(None).await?;
        self.reporter.emit(&Section::Resources {
            kind: ResourceKind::Service,
            items: services,
        })
    }

    async fn health(&mut self) -> Result<()> {
        let nodes = self.client.list_nodes().await?;
        self.reporter.emit(&Section::NodeHealth(aggregate_nodes(&nodes)))?;

        let pods = self.client.list_pods(None).await?;
        self.reporter.emit(&Section::PodHealth(aggregate_pods(&pods)))?;

        // One unreachable namespace should not hide the others.
        for ns in &self.settings.critical_namespaces {
            match self.client.list_pods(Some(ns.as_str())).await {
                Ok(pods) => {
                    self.reporter
                        .emit(&Section::NamespaceHealth(aggregate_namespace(ns, &pods)))?;
                }
                Err(e) => {
                    log::warn!("health: could not check namespace {ns}: {e}");
                    self.reporter.emit(&Section::NamespaceUnavailable {
                        namespace: ns.clone(),
                        reason: e.to_string(),
                    })?;
                }
            }
        }
        Ok(())
    }
}
