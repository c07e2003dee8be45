//! Output rendering for command results.
//!
//! Commands produce [`Section`]s; the [`Reporter`] renders each one the
//! moment it is emitted, as text or as one JSON document per line.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cli::Format;
use crate::client::Snapshot;
use crate::error::{Error, Result};
use crate::health::HealthReport;
use crate::models::{ResourceKind, ResourceSummary};

/// One self-contained piece of command output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "section", rename_all = "snake_case")]
pub enum Section {
    Context {
        context: Option<String>,
        kubeconfig: String,
    },
    Resources {
        kind: ResourceKind,
        items: Vec<ResourceSummary>,
    },
    NodeHealth(HealthReport),
    PodHealth(HealthReport),
    NamespaceHealth(HealthReport),
    NamespaceUnavailable {
        namespace: String,
        reason: String,
    },
    Scaled {
        namespace: String,
        name: String,
        replicas: u32,
    },
    Restarted {
        namespace: String,
        name: String,
    },
    Snapshot(Snapshot),
    Logs {
        namespace: String,
        pod: String,
        lines: u32,
        text: String,
    },
    Usage {
        text: String,
    },
}

/// Renders sections to a writer.
pub struct Reporter<W> {
    out: W,
    format: Format,
    now: DateTime<Utc>,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, format: Format) -> Self {
        Self::at(out, format, Utc::now())
    }

    /// Ages are computed relative to `now`.
    pub fn at(out: W, format: Format, now: DateTime<Utc>) -> Self {
        Self { out, format, now }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Renders and flushes one section.
    pub fn emit(&mut self, section: &Section) -> Result<()> {
        match self.format {
            Format::Json => {
                serde_json::to_writer(&mut self.out, section)
                    .map_err(|e| Error::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(self.out)?;
            }
            Format::Text => self.write_text(section)?,
        }
        self.out.flush()?;
        Ok(())
    }

    fn write_text(&mut self, section: &Section) -> Result<()> {
        let out = &mut self.out;
        match section {
            Section::Context {
                context,
                kubeconfig,
            } => {
                writeln!(out, "=== Kubernetes Cluster Information ===")?;
                writeln!(out, "Context:    {}", context.as_deref().unwrap_or("<default>"))?;
                writeln!(out, "Kubeconfig: {kubeconfig}")?;
            }
            Section::Resources { kind, items } => {
                let title = match kind {
                    ResourceKind::Node => "Nodes",
                    ResourceKind::Pod => "Pods",
                    ResourceKind::Service => "Services",
                };
                writeln!(out)?;
                writeln!(out, "{title}:")?;
                if items.is_empty() {
                    writeln!(out, "No resources found.")?;
                } else {
                    write_table(out, &resource_rows(*kind, items, self.now))?;
                }
            }
            Section::NodeHealth(r) => {
                writeln!(out, "Node Health: {}/{} nodes ready", r.ready, r.total)?;
                write_not_ready(out, r)?;
            }
            Section::PodHealth(r) => {
                writeln!(out, "Pod Health: {}/{} pods running", r.ready, r.total)?;
                write_not_ready(out, r)?;
            }
            Section::NamespaceHealth(r) => {
                writeln!(out, "Namespace {}: {}/{} pods ready", r.scope, r.ready, r.total)?;
                write_not_ready(out, r)?;
            }
            Section::NamespaceUnavailable { namespace, reason } => {
                writeln!(out, "Namespace {namespace}: unavailable ({reason})")?;
            }
            Section::Scaled {
                namespace,
                name,
                replicas,
            } => {
                writeln!(
                    out,
                    "Successfully scaled deployment {namespace}/{name} to {replicas} replicas"
                )?;
            }
            Section::Restarted { namespace, name } => {
                writeln!(out, "Successfully restarted deployment {namespace}/{name}")?;
            }
            Section::Snapshot(s) => {
                writeln!(out, "Etcd backup created successfully in {}: {}", s.pod, s.path)?;
                if !s.output.is_empty() {
                    writeln!(out, "{}", s.output)?;
                }
            }
            Section::Logs {
                namespace,
                pod,
                lines,
                text,
            } => {
                writeln!(out, "Showing last {lines} lines of logs for {namespace}/{pod}")?;
                write!(out, "{text}")?;
                if !text.is_empty() && !text.ends_with('\n') {
                    writeln!(out)?;
                }
            }
            Section::Usage { text } => write!(out, "{text}")?,
        }
        Ok(())
    }
}

fn write_not_ready<W: Write>(out: &mut W, report: &HealthReport) -> Result<()> {
    if !report.not_ready.is_empty() {
        writeln!(out, "  not ready: {}", report.not_ready.join(", "))?;
    }
    Ok(())
}

fn resource_rows(kind: ResourceKind, items: &[ResourceSummary], now: DateTime<Utc>) -> Vec<Vec<String>> {
    let ns = |r: &ResourceSummary| r.namespace.clone().unwrap_or_default();
    let mut rows = Vec::with_capacity(items.len() + 1);
    match kind {
        ResourceKind::Node => {
            rows.push(vec!["NAME".into(), "STATUS".into(), "AGE".into()]);
            rows.extend(
                items
                    .iter()
                    .map(|r| vec![r.name.clone(), r.status.clone(), r.age(now)]),
            );
        }
        ResourceKind::Pod => {
            rows.push(vec!["NAMESPACE".into(), "NAME".into(), "STATUS".into(), "AGE".into()]);
            rows.extend(
                items
                    .iter()
                    .map(|r| vec![ns(r), r.name.clone(), r.status.clone(), r.age(now)]),
            );
        }
        ResourceKind::Service => {
            rows.push(vec![
                "NAMESPACE".into(),
                "NAME".into(),
                "TYPE".into(),
                "ENDPOINT".into(),
                "AGE".into(),
            ]);
            rows.extend(items.iter().map(|r| {
                vec![ns(r), r.name.clone(), r.phase.clone(), r.status.clone(), r.age(now)]
            }));
        }
    }
    rows
}

/// Left-aligned columns separated by three spaces, kubectl style.
fn write_table<W: Write>(out: &mut W, rows: &[Vec<String>]) -> Result<()> {
    let columns = rows.first().map_or(0, Vec::len);
    let widths: Vec<usize> = (0..columns)
        .map(|c| rows.iter().map(|r| r[c].chars().count()).max().unwrap_or(0))
        .collect();

    for row in rows {
        let mut line = String::new();
        for (c, cell) in row.iter().enumerate() {
            if c + 1 == columns {
                line.push_str(cell);
            } else {
                line.push_str(&format!("{cell:<width$}   ", width = widths[c]));
            }
        }
        writeln!(out, "{}", line.trim_end())?;
    }
    Ok(())
}
