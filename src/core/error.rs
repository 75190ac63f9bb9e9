//! Bridge Error Module
//!
//! Structured error types for every failure the bridge can report. Native
//! failures are keyed by the connector's numeric error code; the remaining
//! variants describe inconsistencies detected while decoding results and the
//! ambient failures of configuration loading.
use crate::core::codes::ErrorCode;
use thiserror::Error;

/// A native failure with a known error code.
///
/// Produced by [`map_native_error`] right after a failing native call. It owns
/// no resources and is cheap to clone.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[{}] {}", .code.code(), self.message())]
pub struct ClientError {
    pub code: ErrorCode,
    pub message: Option<String>,
}

impl ClientError {
    pub fn new(code: ErrorCode, message: Option<String>) -> Self {
        ClientError { code, message }
    }

    /// The connector's message, or the stock description for the code.
    pub fn message(&self) -> &str {
        self.message
            .as_deref()
            .unwrap_or_else(|| self.code.description())
    }
}

/// Comprehensive error type for the bridge.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Connect or administrative call failed
    #[error("Connection error: {0}")]
    Connection(ClientError),

    /// The statement was rejected by the native exec call
    #[error("Query error: {0}")]
    Query(ClientError),

    /// The connector reported a code outside the known set
    #[error("Unrepresentable error code {code}: {}", message.as_deref().unwrap_or("no message"))]
    Unrepresentable { code: u32, message: Option<String> },

    /// Exec succeeded, no result handle came back, yet the statement has columns
    #[error("Bad result: no result handle for a statement with {field_count} column(s)")]
    BadResult { field_count: u32 },

    /// The fetch loop stopped before the native end-of-file indicator was set
    #[error("Incomplete read: result ended without end-of-file after {rows_read} row(s)")]
    IncompleteRead { rows_read: usize },

    /// A fetched row does not match the shape of its result
    #[error("Malformed row {row}: {detail}")]
    MalformedRow { row: usize, detail: String },

    /// The connector could not allocate a connection handle
    #[error("Resource error: could not initialize a native connection handle")]
    ResourceInit,

    /// An argument cannot be passed to the connector
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON encoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BridgeError {
    /// The native error code, when the error came from the connector.
    pub fn native_code(&self) -> Option<u32> {
        match self {
            BridgeError::Connection(e) | BridgeError::Query(e) => Some(e.code.code()),
            BridgeError::Unrepresentable { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Type alias for Result to use BridgeError as the error type.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Maps a native error code and message to a [`ClientError`].
///
/// Codes outside [`ErrorCode`] are never coerced into a known variant; they
/// come back as `BridgeError::Unrepresentable` carrying the raw value.
pub fn map_native_error(code: u32, message: Option<String>) -> Result<ClientError> {
    match ErrorCode::from_code(code) {
        Some(code) => Ok(ClientError::new(code, message)),
        None => Err(BridgeError::Unrepresentable { code, message }),
    }
}
