//! Connection Management Module
//!
//! Owns one native connection handle for its whole life: allocation, connect,
//! database administration, diagnostics and teardown.

use super::driver::Driver;
use super::options::{ClientOption, ConnectOptions, ConnectParams};
use super::query::QueryExecutor;
use super::row::ResultSet;
use crate::core::error::map_native_error;
use crate::core::{BridgeError, ClientError, Result};
use tracing::debug;

/// A single native connection.
///
/// The handle is allocated by [`Connection::new`] and released exactly once
/// when the value is dropped, whether or not `connect` ever succeeded. Every
/// native operation takes `&mut self`, so one owner drives the handle at a time.
pub struct Connection<D: Driver> {
    driver: D,
    connected: bool,
    database: Option<String>,
}

impl<D: Driver> Connection<D> {
    /// Allocates a native connection handle.
    ///
    /// # Errors
    ///
    /// `BridgeError::ResourceInit` if the connector cannot allocate a handle.
    pub fn new() -> Result<Self> {
        let driver = D::init().ok_or(BridgeError::ResourceInit)?;
        debug!("initialized native connection handle");
        Ok(Connection {
            driver,
            connected: false,
            database: None,
        })
    }

    /// Establishes the session described by `options`.
    ///
    /// No retry is attempted.
    ///
    /// # Errors
    ///
    /// `BridgeError::Connection` with the mapped native code, or
    /// `BridgeError::Unrepresentable` when the code is unknown.
    pub fn connect(&mut self, options: &ConnectOptions) -> Result<()> {
        reject_nul("host", &options.host)?;
        reject_nul("user", &options.user)?;
        reject_nul("password", &options.password)?;
        if let Some(database) = &options.database {
            reject_nul("database", database)?;
        }
        let params = ConnectParams::from(options);
        debug!(
            host = params.host,
            user = params.user,
            port = params.port,
            database = ?params.database,
            "connecting"
        );
        if !self.driver.real_connect(&params) {
            return Err(self.native_error(BridgeError::Connection));
        }
        self.connected = true;
        self.database = options.database.clone();
        debug!(host_info = ?self.host_info(), "connected");
        Ok(())
    }

    /// Positional form of [`Connection::connect`].
    ///
    /// # Arguments
    ///
    /// * `database` - default schema, or `None` to select none
    /// * `port` - TCP port, `0` for the connector's default
    /// * `options` - negotiation flags
    pub fn connect_with(
        &mut self,
        host: &str,
        user: &str,
        password: &str,
        database: Option<&str>,
        port: u32,
        options: &[ClientOption],
    ) -> Result<()> {
        let options = ConnectOptions {
            host: host.to_string(),
            user: user.to_string(),
            password: password.to_string(),
            database: database.map(str::to_string),
            port,
            options: options.to_vec(),
        };
        self.connect(&options)
    }

    /// Makes `name` the default database.
    pub fn select_database(&mut self, name: &str) -> Result<()> {
        reject_nul("database", name)?;
        debug!(database = name, "selecting database");
        if !self.driver.select_db(name) {
            return Err(self.native_error(BridgeError::Connection));
        }
        self.database = Some(name.to_string());
        Ok(())
    }

    pub fn create_database(&mut self, name: &str) -> Result<()> {
        reject_nul("database", name)?;
        debug!(database = name, "creating database");
        if !self.driver.create_db(name) {
            return Err(self.native_error(BridgeError::Connection));
        }
        Ok(())
    }

    pub fn delete_database(&mut self, name: &str) -> Result<()> {
        reject_nul("database", name)?;
        debug!(database = name, "dropping database");
        if !self.driver.drop_db(name) {
            return Err(self.native_error(BridgeError::Connection));
        }
        if self.database.as_deref() == Some(name) {
            self.database = None;
        }
        Ok(())
    }

    /// Executes one statement; see [`QueryExecutor::execute`].
    pub fn execute(&mut self, sql: &str) -> Result<Option<ResultSet>> {
        QueryExecutor::new(self).execute(sql)
    }

    /// Human readable message for the last error on this handle, if any.
    pub fn error_string(&self) -> Option<String> {
        self.driver.error().filter(|message| !message.is_empty())
    }

    /// Description of the connection type and server host, if connected.
    pub fn host_info(&self) -> Option<String> {
        self.driver.host_info().filter(|info| !info.is_empty())
    }

    /// Version string of the linked connector library.
    pub fn client_info() -> Option<String> {
        D::client_info().filter(|info| !info.is_empty())
    }

    /// Numeric version of the linked connector library.
    pub fn client_version() -> u64 {
        D::client_version()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// The database selected through this connection, if known.
    pub fn current_database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Releases the native handle now rather than at end of scope.
    pub fn close(self) {
        drop(self);
    }

    pub(crate) fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Builds the error for the native call that just failed.
    ///
    /// Must run before any other native call on this handle: the connector
    /// keeps only the most recent error.
    pub(crate) fn native_error(&self, stage: fn(ClientError) -> BridgeError) -> BridgeError {
        let code = self.driver.errno();
        let message = self.driver.error().filter(|message| !message.is_empty());
        match map_native_error(code, message) {
            Ok(error) => stage(error),
            Err(unrepresentable) => unrepresentable,
        }
    }
}

/// Connection arguments travel as C strings, which cannot hold NUL bytes.
fn reject_nul(what: &str, value: &str) -> Result<()> {
    if value.contains('\0') {
        return Err(BridgeError::InvalidArgument(format!("{} contains a NUL byte", what)));
    }
    Ok(())
}

impl<D: Driver> Drop for Connection<D> {
    fn drop(&mut self) {
        debug!(connected = self.connected, "closing native connection handle");
        self.driver.close();
    }
}

impl<D: Driver> std::fmt::Debug for Connection<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("connected", &self.connected)
            .field("database", &self.database)
            .finish()
    }
}
