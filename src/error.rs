//! Error types for the depth-sync crate.
//!
//! [`Error`] covers everything the venue client and the synchronization
//! engine can fail with. [`DecodeError`] is the narrower error produced when a
//! depth payload from the venue cannot be turned into price levels or diff
//! events; the engine logs and drops those messages instead of failing.

use thiserror::Error;

/// The main error type for this crate
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed URL (bad base URL in the configuration)
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Depth payload could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// API returned an error response
    #[error("API error ({}): {}", .0.status, .0.message)]
    Api(ApiError),

    /// Subscribing failed before the session started (stream dial or the
    /// first snapshot)
    #[error("failed to subscribe to {pair}: {source}")]
    Connect {
        /// Trading pair symbol
        pair: String,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },

    /// WebSocket connection closed unexpectedly
    #[error("WebSocket connection closed")]
    ConnectionClosed,

    /// Diff event did not continue the applied sequence
    #[error("Sequence gap: expected {expected}, got {got}")]
    SequenceGap {
        /// Expected first event id
        expected: i64,
        /// First event id actually received
        got: i64,
    },

    /// Pair is not listed in the venue's symbol table
    #[error("Unsupported pair: {0}")]
    UnsupportedPair(String),

    /// Operation timed out
    #[error("Operation timed out")]
    Timeout,
}

/// Error produced while decoding venue depth payloads
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A price level encoding had fewer than two tokens
    #[error("at least two fields are expected but got {0}")]
    MissingFields(usize),

    /// A token was not a valid decimal
    #[error("invalid decimal {token:?}: {reason}")]
    InvalidDecimal {
        /// The offending token
        token: String,
        /// Parser message
        reason: String,
    },

    /// Price or quantity was negative
    #[error("negative value {0}")]
    NegativeValue(String),

    /// The envelope was not the expected JSON shape
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Error returned by the venue API
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status code
    pub status: u16,
    /// Error code from API (if provided)
    pub code: Option<String>,
    /// Error message
    pub message: String,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            code: None,
            message: message.into(),
        }
    }

    /// Create an API error with an error code
    pub fn with_code(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

impl Error {
    pub(crate) fn connect(pair: impl std::fmt::Display, source: Error) -> Self {
        Error::Connect {
            pair: pair.to_string(),
            source: Box::new(source),
        }
    }
}
