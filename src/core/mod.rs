/// Core Module for the bridge
///
/// The connection, execution and decoding machinery plus the error types
/// shared by everything else in the crate.
pub mod codes;
pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use codes::ErrorCode;
pub use error::{map_native_error, BridgeError, ClientError, Result};
