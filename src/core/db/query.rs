//! Query Execution Module
//!
//! Sends statements over a [`Connection`] and hands populated results to the
//! decoder.

use super::connection::Connection;
use super::decode::materialize;
use super::driver::Driver;
use super::row::ResultSet;
use crate::core::{BridgeError, Result};
use tracing::debug;

/// Query execution service that operates on a connection
pub struct QueryExecutor<'a, D: Driver> {
    connection: &'a mut Connection<D>,
}

impl<'a, D: Driver> QueryExecutor<'a, D> {
    /// Creates a new QueryExecutor for the given connection
    pub fn new(connection: &'a mut Connection<D>) -> Self {
        QueryExecutor { connection }
    }

    /// Executes a SQL statement and materializes its result.
    ///
    /// # Returns
    ///
    /// * `Some(ResultSet)` for statements that produce a result set, even an
    ///   empty one.
    /// * `None` for statements that produce no result set at all, such as
    ///   `INSERT` or `CREATE TABLE`.
    ///
    /// # Errors
    ///
    /// * `BridgeError::Query` (or `Unrepresentable`) when the statement fails.
    ///   No result is fetched in that case.
    /// * `BridgeError::BadResult` when no result handle comes back although the
    ///   statement has columns.
    /// * Any decoder error; see [`materialize`].
    pub fn execute(&mut self, sql: &str) -> Result<Option<ResultSet>> {
        debug!(sql_len = sql.len(), "executing statement");
        if !self.connection.driver_mut().exec_sql(sql) {
            return Err(self.connection.native_error(BridgeError::Query));
        }

        let stored = match self.connection.driver_mut().store_result() {
            Some(result) => Some(materialize(result)?),
            None => None,
        };
        if let Some(set) = stored {
            debug!(rows = set.len(), columns = set.columns().len(), "statement returned rows");
            return Ok(Some(set));
        }

        // No handle: either the statement has no result set or storing it failed.
        let field_count = self.connection.driver_mut().field_count();
        if field_count != 0 {
            return Err(BridgeError::BadResult { field_count });
        }
        debug!("statement returned no result set");
        Ok(None)
    }
}

/// Convenience function to execute a statement on a connection
pub fn execute_query_on_connection<D: Driver>(
    conn: &mut Connection<D>,
    sql: &str,
) -> Result<Option<ResultSet>> {
    QueryExecutor::new(conn).execute(sql)
}

/// Formats a field value for display
///
/// # Returns
///
/// `NULL` for SQL NULL, the text for valid UTF-8, and a byte count otherwise.
pub fn format_value(value: Option<&[u8]>) -> String {
    match value {
        None => "NULL".to_string(),
        Some(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) if !text.contains('\0') => text.to_string(),
            _ => format!("<BINARY: {} bytes>", bytes.len()),
        },
    }
}
