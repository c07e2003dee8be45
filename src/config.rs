use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use kube::config::Kubeconfig;

use crate::cli::{Cli, Format};
use crate::error::{Error, Result};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CRITICAL_NAMESPACES: [&str; 3] = ["kube-system", "metallb-system", "traefik"];
pub const DEFAULT_SYSTEM_NAMESPACE: &str = "kube-system";
pub const DEFAULT_STORE_SELECTOR: &str = "component=etcd";
pub const DEFAULT_SNAPSHOT_PATH: &str = "/tmp/backup.db";

// ── credentials ───────────────────────────────────────────────────────────────

/// Location of the kubeconfig handed to every kubectl call.
///
/// Always `<home>/.kube/config`; the file must exist when this is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialLocation(PathBuf);

impl CredentialLocation {
    /// Resolves from the `HOME` environment variable.
    pub fn from_env() -> Result<Self> {
        Self::from_home(std::env::var_os("HOME").as_deref())
    }

    pub fn from_home(home: Option<&OsStr>) -> Result<Self> {
        let home = home
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::Config("HOME is not set; cannot locate kubeconfig".into()))?;

        let path = Path::new(home).join(".kube").join("config");
        if !path.is_file() {
            return Err(Error::Config(format!(
                "kubeconfig not found at {}",
                path.display()
            )));
        }
        Ok(Self(path))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

// ── kubeconfig contents ───────────────────────────────────────────────────────

/// What we could learn from parsing the kubeconfig.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KubeconfigSummary {
    pub current_context: Option<String>,
    pub contexts: Vec<String>,
}

/// Parses the kubeconfig for reporting purposes only. A file kubectl accepts
/// but kube-rs does not is not our problem to reject, so failures are logged
/// and swallowed.
fn inspect_kubeconfig(path: &Path) -> Option<KubeconfigSummary> {
    match Kubeconfig::read_from(path) {
        Ok(cfg) => {
            log::info!(
                "kubeconfig: {} context(s) in {}",
                cfg.contexts.len(),
                path.display()
            );
            Some(KubeconfigSummary {
                current_context: cfg.current_context,
                contexts: cfg.contexts.into_iter().map(|c| c.name).collect(),
            })
        }
        Err(e) => {
            log::warn!("kubeconfig: cannot parse {}: {e}", path.display());
            None
        }
    }
}

// ── settings ──────────────────────────────────────────────────────────────────

/// Everything an invocation needs, resolved once before dispatch.
#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: CredentialLocation,
    pub kubeconfig: Option<KubeconfigSummary>,
    pub kubectl: PathBuf,
    /// Explicit `--context`; `None` leaves kubectl on the current context.
    pub context: Option<String>,
    pub timeout: Duration,
    pub critical_namespaces: Vec<String>,
    pub system_namespace: String,
    pub store_selector: String,
    pub snapshot_path: String,
    pub format: Format,
}

impl Settings {
    /// Defaults for everything except the credentials.
    pub fn new(credentials: CredentialLocation) -> Self {
        Self {
            credentials,
            kubeconfig: None,
            kubectl: PathBuf::from("kubectl"),
            context: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            critical_namespaces: DEFAULT_CRITICAL_NAMESPACES.map(String::from).to_vec(),
            system_namespace: DEFAULT_SYSTEM_NAMESPACE.to_string(),
            store_selector: DEFAULT_STORE_SELECTOR.to_string(),
            snapshot_path: DEFAULT_SNAPSHOT_PATH.to_string(),
            format: Format::Text,
        }
    }

    /// Builds settings from parsed arguments and the environment.
    ///
    /// Fails with [`Error::Config`] when the kubeconfig is missing or when an
    /// explicit context is not defined in it.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        Self::from_cli_with(cli, CredentialLocation::from_env()?)
    }

    pub fn from_cli_with(cli: &Cli, credentials: CredentialLocation) -> Result<Self> {
        let kubeconfig = inspect_kubeconfig(credentials.path());

        if let (Some(wanted), Some(cfg)) = (&cli.context, &kubeconfig) {
            if !cfg.contexts.iter().any(|c| c == wanted) {
                return Err(Error::Config(format!(
                    "context {wanted:?} not defined in {}",
                    credentials.path().display()
                )));
            }
        }

        let kubectl = cli.kubectl.clone().unwrap_or_else(|| {
            which::which("kubectl").unwrap_or_else(|_| PathBuf::from("kubectl"))
        });

        let critical_namespaces = cli
            .critical_namespaces
            .iter()
            .map(|ns| ns.trim())
            .filter(|ns| !ns.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            credentials,
            kubeconfig,
            kubectl,
            context: cli.context.clone(),
            timeout: Duration::from_secs(cli.timeout),
            critical_namespaces,
            system_namespace: cli.system_namespace.clone(),
            store_selector: cli.store_selector.clone(),
            snapshot_path: cli.snapshot_path.clone(),
            format: cli.format,
        })
    }

    /// The context kubectl will talk to, when known.
    pub fn active_context(&self) -> Option<&str> {
        self.context
            .as_deref()
            .or_else(|| self.kubeconfig.as_ref()?.current_context.as_deref())
    }
}
