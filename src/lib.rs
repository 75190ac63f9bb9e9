// Core infrastructure modules
pub mod core;
pub mod drivers;

// Feature-specific modules
pub mod config;
pub mod repl;

#[cfg(test)]
mod test_utils;

pub use crate::core::db::{
    ClientOption, ConnectOptions, Connection, FieldDescriptor, FieldType, QueryExecutor, ResultSet,
    Row,
};
pub use crate::core::{BridgeError, ClientError, ErrorCode, Result};
