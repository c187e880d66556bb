//! Errors raised while setting up or running the HTTP pieces.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    /// The reqwest client could not be built (TLS backend, etc.).
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    /// A configured static header has an invalid name or value.
    #[error("invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}
