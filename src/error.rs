//! Error types for pql-stream.

use thiserror::Error;

/// Error type for pql-stream operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The client configuration is unusable (e.g. the server address has no port).
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// HTTP request failed before a response was received.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a status code of 400 or above.
    #[error("Query failed with status {status}: {body}")]
    Query {
        /// HTTP status code returned by the server.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// The response body is not a well-formed JSON array.
    #[error("JSON parse error at byte {offset}: {message}")]
    Parse {
        /// Byte offset into the response body where the problem was found.
        offset: usize,
        /// Description of what failed to parse.
        message: String,
    },

    /// Failed to decode a fully-read JSON document.
    #[error("Failed to decode response: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error during streaming.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns true if this error came from the streaming JSON parser.
    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse { .. })
    }
}

/// Result type alias for pql-stream operations.
pub type Result<T> = std::result::Result<T, Error>;
