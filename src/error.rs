//! Error taxonomy for cluster operations.
//!
//! Every variant is terminal for the current invocation. The process exit
//! code is uniform today (see [`Error::exit_code`]) but the kinds stay
//! distinct so a stricter contract can be layered on without touching the
//! client or the dispatcher.

use std::fmt;
use std::time::Duration;

/// Crate-wide result alias.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Failures of the external control binary itself.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The binary could not be started at all.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The binary ran and exited unsuccessfully.
    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    /// The binary did not finish within the configured bound and was killed.
    #[error("`{command}` timed out after {}s", .after.as_secs())]
    Timeout { command: String, after: Duration },

    /// The binary's output could not be decoded.
    #[error("unexpected output from `{command}`: {source}")]
    Decode {
        command: String,
        #[source]
        source: serde_json::Error,
    },
}

impl TransportError {
    /// Diagnostic text the binary wrote to stderr, if it got that far.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Failed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

/// Top-level error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or unusable configuration, detected before any command runs.
    #[error("configuration error: {0}")]
    Config(String),

    /// Unknown command or bad arguments.
    #[error("usage error: {0}")]
    Usage(String),

    /// A named cluster object does not exist.
    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Report rendering failed.
    #[error("format error: {0}")]
    Format(String),

    /// Another error annotated with the command that produced it.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

/// Coarse classification, independent of any context wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Usage,
    NotFound,
    Transport,
    Timeout,
    Io,
    Format,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Config => "config",
            Self::Usage => "usage",
            Self::NotFound => "not-found",
            Self::Transport => "transport",
            Self::Timeout => "timeout",
            Self::Io => "io",
            Self::Format => "format",
        };
        f.write_str(name)
    }
}

impl Error {
    /// Wraps `self` with a description of what was being attempted.
    pub fn context(self, context: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The kind of the innermost error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Usage(_) => ErrorKind::Usage,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Transport(TransportError::Timeout { .. }) => ErrorKind::Timeout,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Io(_) => ErrorKind::Io,
            Self::Format(_) => ErrorKind::Format,
            Self::Context { source, .. } => source.kind(),
        }
    }

    /// Process exit code for this error. Every failure maps to 1.
    pub fn exit_code(&self) -> u8 {
        1
    }
}
