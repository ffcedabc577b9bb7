//! Structured error types shared across the block-model crates.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Code, message and context carried by every [`SbmError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable kebab-case code, e.g. `length-mismatch`.
    pub code: String,
    /// Human readable message.
    pub message: String,
    /// Offending values keyed by name (vertex, label, path, ...).
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    /// Suggested fix, if there is an obvious one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Payload with an empty context.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds (or replaces) a context entry.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Attaches a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code: {})", self.message, self.code)?;
        if !self.context.is_empty() {
            let pairs: Vec<String> = self
                .context
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect();
            write!(f, " | context: [{}]", pairs.join(", "))?;
        }
        match &self.hint {
            Some(hint) => write!(f, " | hint: {hint}"),
            None => Ok(()),
        }
    }
}

/// Error returned at the boundaries of the block-model engine.
///
/// Hot-path arithmetic never returns this type; it is reserved for input
/// validation (graphs, partitions, configuration, files).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum SbmError {
    /// Malformed graphs: bad endpoints, weights or degree lists.
    #[error("graph error: {0}")]
    Graph(ErrorInfo),
    /// Block assignments that do not fit the graph.
    #[error("partition error: {0}")]
    Partition(ErrorInfo),
    /// Configuration values that cannot drive a sampler.
    #[error("config error: {0}")]
    Config(ErrorInfo),
    /// Seeding errors.
    #[error("rng error: {0}")]
    Rng(ErrorInfo),
    /// Parsing, serialization and file errors.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl SbmError {
    /// Payload of the error.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            SbmError::Graph(info)
            | SbmError::Partition(info)
            | SbmError::Config(info)
            | SbmError::Rng(info)
            | SbmError::Serde(info) => info,
        }
    }

    fn info_mut(&mut self) -> &mut ErrorInfo {
        match self {
            SbmError::Graph(info)
            | SbmError::Partition(info)
            | SbmError::Config(info)
            | SbmError::Rng(info)
            | SbmError::Serde(info) => info,
        }
    }

    /// Stable code of the error.
    pub fn code(&self) -> &str {
        &self.info().code
    }

    /// Name of the error family, as used in the serialized form.
    pub fn family(&self) -> &'static str {
        match self {
            SbmError::Graph(_) => "Graph",
            SbmError::Partition(_) => "Partition",
            SbmError::Config(_) => "Config",
            SbmError::Rng(_) => "Rng",
            SbmError::Serde(_) => "Serde",
        }
    }

    /// Adds a context entry without changing the family.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.info_mut().context.insert(key.into(), value.into());
        self
    }
}
