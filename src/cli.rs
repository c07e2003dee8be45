//! Command-line argument parsing with clap.
//!
//! clap only owns the global options. The command word and its positional
//! arguments are handed to [`crate::commands::Command::parse`] untouched so
//! that arity and type errors are reported the same way for every command.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::ErrorKind as ClapErrorKind;
use clap::{Parser, ValueEnum};

use crate::config::{
    DEFAULT_CRITICAL_NAMESPACES, DEFAULT_SNAPSHOT_PATH, DEFAULT_STORE_SELECTOR,
    DEFAULT_SYSTEM_NAMESPACE, DEFAULT_TIMEOUT_SECS,
};
use crate::error::{Error, Result};

/// Kubernetes cluster manager.
///
/// Options must come before the command.
#[derive(Parser, Debug, Clone)]
#[command(name = "cluster-manager")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format.
    #[arg(short, long, value_enum, env = "CLUSTER_MANAGER_FORMAT", default_value_t = Format::Text)]
    pub format: Format,

    /// Path to the kubectl binary. Defaults to the one on PATH.
    #[arg(long, env = "CLUSTER_MANAGER_KUBECTL")]
    pub kubectl: Option<PathBuf>,

    /// Kubeconfig context to use instead of the current one.
    #[arg(long, env = "CLUSTER_MANAGER_CONTEXT")]
    pub context: Option<String>,

    /// Seconds to wait for each kubectl call before killing it.
    #[arg(
        long,
        env = "CLUSTER_MANAGER_TIMEOUT",
        default_value_t = DEFAULT_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout: u64,

    /// Namespaces checked individually by `health`, in report order.
    #[arg(
        long,
        env = "CLUSTER_MANAGER_CRITICAL_NAMESPACES",
        value_delimiter = ',',
        default_values = DEFAULT_CRITICAL_NAMESPACES
    )]
    pub critical_namespaces: Vec<String>,

    /// Namespace the store pod runs in.
    #[arg(long, env = "CLUSTER_MANAGER_SYSTEM_NAMESPACE", default_value = DEFAULT_SYSTEM_NAMESPACE)]
    pub system_namespace: String,

    /// Label selector locating the store pod.
    #[arg(long, env = "CLUSTER_MANAGER_STORE_SELECTOR", default_value = DEFAULT_STORE_SELECTOR)]
    pub store_selector: String,

    /// Where the snapshot is written inside the store pod.
    #[arg(long, env = "CLUSTER_MANAGER_SNAPSHOT_PATH", default_value = DEFAULT_SNAPSHOT_PATH)]
    pub snapshot_path: String,

    /// Command to run (`help` lists them).
    pub command: Option<String>,

    /// Arguments for the command.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl Cli {
    /// Parses `args` (program name first).
    ///
    /// `--help` and `--version` print and exit as clap does. Every other
    /// parse failure becomes [`Error::Usage`] so it exits like any other
    /// usage error.
    pub fn parse_args<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(|e| match e.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => e.exit(),
            _ => {
                let rendered = e.to_string();
                let first = rendered.lines().next().unwrap_or_default();
                Error::Usage(first.trim_start_matches("error: ").trim().to_string())
            }
        })
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable text.
    #[default]
    Text,
    /// One JSON document per report section.
    Json,
}
