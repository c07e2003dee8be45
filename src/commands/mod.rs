//! Command words, their argument contracts, and dispatch.

mod dispatcher;

pub use dispatcher::Dispatcher;

use crate::error::{Error, Result};
use crate::models::requests::parse_count;
use crate::models::{LogsRequest, RestartRequest, ScaleRequest};

struct CommandSpec {
    name: &'static str,
    synopsis: &'static str,
    about: &'static str,
}

const COMMANDS: &[CommandSpec] = &[
    CommandSpec { name: "info", synopsis: "info", about: "Show cluster information" },
    CommandSpec { name: "health", synopsis: "health", about: "Check cluster health" },
    CommandSpec { name: "scale", synopsis: "scale <ns> <name> <n>", about: "Scale deployment" },
    CommandSpec { name: "restart", synopsis: "restart <ns> <name>", about: "Restart deployment" },
    CommandSpec { name: "backup", synopsis: "backup", about: "Create etcd backup" },
    CommandSpec {
        name: "logs",
        synopsis: "logs <ns> <pod> [n]",
        about: "Show pod logs (default: 100 lines)",
    },
    CommandSpec { name: "help", synopsis: "help", about: "Show this help message" },
];

/// Full usage text, as printed by `help`.
pub fn usage() -> String {
    let mut text = String::from(
        "Kubernetes Cluster Manager\nUsage:\n  cluster-manager [options] <command> [args]\n\nCommands:\n",
    );
    for cmd in COMMANDS {
        text.push_str(&format!("  {:<24}- {}\n", cmd.synopsis, cmd.about));
    }
    text.push_str("\nRun `cluster-manager --help` to list options.\n");
    text
}

/// Names of every command, in usage order.
pub fn known_commands() -> Vec<&'static str> {
    COMMANDS.iter().map(|c| c.name).collect()
}

/// A fully validated command, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Info,
    Health,
    Scale(ScaleRequest),
    Restart(RestartRequest),
    Backup,
    Logs(LogsRequest),
    Help,
}

impl Command {
    /// Resolves `name` and checks `args` against its contract. Never touches
    /// the cluster.
    pub fn parse(name: &str, args: &[String]) -> Result<Self> {
        let spec = COMMANDS.iter().find(|c| c.name == name).ok_or_else(|| {
            Error::Usage(format!(
                "unknown command {name:?}; known commands: {}",
                known_commands().join(", ")
            ))
        })?;

        let command = match (spec.name, args) {
            ("info", []) => Self::Info,
            ("health", []) => Self::Health,
            ("scale", [ns, name, replicas]) => {
                Self::Scale(ScaleRequest::new(ns, name, parse_count("replicas", replicas)?)?)
            }
            ("restart", [ns, name]) => Self::Restart(RestartRequest::new(ns, name)?),
            ("backup", []) => Self::Backup,
            ("logs", [ns, pod]) => Self::Logs(LogsRequest::new(ns, pod, None)?),
            ("logs", [ns, pod, lines]) => {
                Self::Logs(LogsRequest::new(ns, pod, Some(parse_count("lines", lines)?))?)
            }
            // help never fails; anything after it is ignored.
            ("help", _) => Self::Help,
            _ => {
                return Err(Error::Usage(format!(
                    "wrong number of arguments; usage: {}",
                    spec.synopsis
                )))
            }
        };
        Ok(command)
    }

    /// Short description used as error context.
    pub fn describe(&self) -> String {
        match self {
            Self::Info => "info".to_string(),
            Self::Health => "health".to_string(),
            Self::Scale(r) => format!("scale {}/{} to {}", r.namespace(), r.name(), r.replicas()),
            Self::Restart(r) => format!("restart {}/{}", r.namespace(), r.name()),
            Self::Backup => "backup".to_string(),
            Self::Logs(r) => format!("logs {}/{}", r.namespace(), r.pod()),
            Self::Help => "help".to_string(),
        }
    }
}
