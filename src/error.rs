//! Error types for the sitedeploy library.

use std::path::PathBuf;

use thiserror::Error;

use crate::api::ServerErrorKind;

/// Main error type for deploy operations.
#[derive(Error, Debug)]
pub enum DeployError {
    /// A command-line argument failed validation.
    #[error("{0}")]
    Validation(String),

    /// The site rejected the credentials.
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// HTTP request failed with status code.
    #[error("HTTP error: {0}")]
    HttpError(u16),

    /// Network request error.
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("HTTP request timed out")]
    Timeout,

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid or unexpected response from server.
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// The store reported a failure for a single operation.
    #[error("{type_name}: {message}")]
    Server {
        kind: ServerErrorKind,
        type_name: String,
        message: String,
    },

    /// One or more operations of a committed batch failed.
    #[error("{failed} of {total} operations failed, first: {first}")]
    Commit {
        failed: usize,
        total: usize,
        first: Box<DeployError>,
    },

    /// Local filesystem error while walking or reading the source tree.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DeployError {
    /// Build a store failure from its reported type name and message.
    pub fn server(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        let type_name = type_name.into();
        DeployError::Server {
            kind: ServerErrorKind::from_type_name(&type_name),
            type_name,
            message: message.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DeployError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the store reported that the requested object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DeployError::Server {
                kind: ServerErrorKind::NotFound,
                ..
            }
        )
    }

    /// Classification printed next to the message when a run fails.
    pub fn kind(&self) -> &'static str {
        match self {
            DeployError::Validation(_) => "ValidationError",
            DeployError::AuthFailed(_) => "AuthError",
            DeployError::HttpError(_)
            | DeployError::RequestError(_)
            | DeployError::Timeout
            | DeployError::JsonError(_)
            | DeployError::InvalidResponse(_) => "TransportError",
            DeployError::Server { .. } => "ServerError",
            DeployError::Commit { .. } => "CommitError",
            DeployError::Io { .. } => "IoError",
        }
    }
}

/// Result type alias for deploy operations.
pub type Result<T> = std::result::Result<T, DeployError>;
