//! Error types for dispatch, attempts, credentials and decoding.

use thiserror::Error;

/// Failure of a single outbound attempt.
///
/// The worker loop treats every variant the same way; the subtypes exist
/// for logging.
#[derive(Debug, Error)]
pub enum AttemptError {
    /// Connection refused, reset, TLS failure and similar.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The remote answered with a non-success status.
    #[error("upstream returned HTTP {status}")]
    Status { status: u16 },

    /// The call did not complete within the per-call timeout.
    #[error("request timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("{0}")]
    Other(String),
}

impl AttemptError {
    /// Short label used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Status { .. } => "status",
            Self::Timeout { .. } => "timeout",
            Self::Other(_) => "other",
        }
    }
}

/// Errors raised while loading a credential list.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to read credential file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed credential file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A captured response payload could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed response payload: {0}")]
    Malformed(String),

    #[error("empty response payload")]
    Empty,
}

/// Errors surfaced to the caller of a batch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Malformed or non-positive request fields. The batch never starts.
    #[error("{message}")]
    InvalidInput {
        message: String,
        detail: Option<String>,
    },

    /// No usable credentials. The batch never starts.
    #[error("no valid credentials found for {scope}")]
    NoCredentials { scope: String },

    /// The batch ran to completion without a decodable payload.
    #[error("could not decode response ({success} successes over {attempts} attempts)")]
    Undecoded {
        success: u64,
        attempts: u64,
        elapsed_seconds: f64,
    },
}

impl DispatchError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            detail: None,
        }
    }

    /// Returns `true` if the caller sent bad input, as opposed to a
    /// server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}
