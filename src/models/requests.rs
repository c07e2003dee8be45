//! Validated arguments for mutating and log commands.
//!
//! Requests can only be built through their constructors, which enforce the
//! identifier and count rules; the cluster client trusts them as-is.

use serde::Serialize;

use crate::error::{Error, Result};

/// Lines of log output fetched when the caller does not say.
pub const DEFAULT_LOG_LINES: u32 = 100;

/// Rejects identifiers kubectl could misread as flags or split on whitespace.
fn identifier(what: &str, value: &str) -> Result<String> {
    if value.is_empty() {
        return Err(Error::Usage(format!("{what} must not be empty")));
    }
    if value.starts_with('-') {
        return Err(Error::Usage(format!("{what} must not start with '-': {value:?}")));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(Error::Usage(format!("{what} must not contain whitespace: {value:?}")));
    }
    Ok(value.to_string())
}

/// Parses a non-negative count. Negative numbers get their own message so
/// they are never confused with a typo.
pub fn parse_count(what: &str, raw: &str) -> Result<u32> {
    let value: i64 = raw
        .trim()
        .parse()
        .map_err(|_| Error::Usage(format!("{what} must be an integer, got {raw:?}")))?;
    if value < 0 {
        return Err(Error::Usage(format!("{what} must not be negative, got {value}")));
    }
    u32::try_from(value).map_err(|_| Error::Usage(format!("{what} is too large: {value}")))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScaleRequest {
    namespace: String,
    name: String,
    replicas: u32,
}

impl ScaleRequest {
    pub fn new(namespace: &str, name: &str, replicas: u32) -> Result<Self> {
        Ok(Self {
            namespace: identifier("namespace", namespace)?,
            name: identifier("deployment", name)?,
            replicas,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn replicas(&self) -> u32 {
        self.replicas
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestartRequest {
    namespace: String,
    name: String,
}

impl RestartRequest {
    pub fn new(namespace: &str, name: &str) -> Result<Self> {
        Ok(Self {
            namespace: identifier("namespace", namespace)?,
            name: identifier("deployment", name)?,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogsRequest {
    namespace: String,
    pod: String,
    lines: u32,
}

impl LogsRequest {
    /// `lines = None` falls back to [`DEFAULT_LOG_LINES`].
    pub fn new(namespace: &str, pod: &str, lines: Option<u32>) -> Result<Self> {
        Ok(Self {
            namespace: identifier("namespace", namespace)?,
            pod: identifier("pod", pod)?,
            lines: lines.unwrap_or(DEFAULT_LOG_LINES),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn pod(&self) -> &str {
        &self.pod
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }
}
