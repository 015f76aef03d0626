//! Provider error types and diagnostics.

use crate::artifactory::http::status_hint;
use serde::Serialize;
use thiserror::Error;

/// Provider result type alias
pub type Result<T> = std::result::Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("configuration error: {0}")]
    Config(String),

    /// Network-level failure, surfaced verbatim
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{method} {path} failed with status {status}: {body}")]
    Api {
        method: String,
        path: String,
        status: u16,
        body: String,
    },

    #[error("failed to decode {context}: {message}")]
    Decode { context: String, message: String },

    #[error("failed to encode {context}: {message}")]
    Encode { context: String, message: String },

    /// Raised before any network call
    #[error("{0}")]
    Validation(String),

    #[error("unknown resource type: {0}")]
    UnknownResource(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    pub fn decode(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            context: context.into(),
            message: err.to_string(),
        }
    }

    pub fn encode(context: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Encode {
            context: context.into(),
            message: err.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// HTTP status of an API error, if this is one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Replication endpoints answer 400 for repositories without replication
    pub fn is_missing_replication(&self) -> bool {
        matches!(self.status(), Some(400) | Some(404))
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        let summary = match self {
            Self::Config(_) => "invalid provider configuration",
            Self::Transport(_) => "request failed",
            Self::Api { .. } => "Artifactory API error",
            Self::Decode { .. } => "unexpected response",
            Self::Encode { .. } => "could not build request body",
            Self::Validation(_) => "invalid resource configuration",
            Self::UnknownResource(_) => "unknown resource type",
            Self::Io(_) => "io error",
        };
        let detail = match self.status().and_then(status_hint) {
            Some(hint) => format!("{}\n  {}", self, hint),
            None => self.to_string(),
        };
        Diagnostic::error(summary, detail)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// User-facing message attached to a lifecycle operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self.severity {
            Severity::Error => "Error",
            Severity::Warning => "Warning",
        };
        write!(f, "{}: {}\n  {}", label, self.summary, self.detail)
    }
}
