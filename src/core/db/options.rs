//! Connection parameters and client negotiation flags.

use serde::Deserialize;

/// A connection negotiation option, OR-ed into the native client flag word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClientOption {
    /// Report matched rows instead of changed rows
    FoundRows,
    /// Refuse `db.table.column` syntax
    NoSchema,
    /// Compress the client/server protocol
    Compress,
    Odbc,
    /// Allow `LOAD DATA LOCAL`
    LocalFiles,
    /// Allow spaces after function names
    IgnoreSpace,
    Interactive,
    /// Negotiate TLS
    Ssl,
    IgnoreSigpipe,
    /// Allow several statements per exec call
    MultiStatements,
    MultiResults,
}

impl ClientOption {
    /// The native client flag bit.
    pub fn flag(self) -> u64 {
        match self {
            ClientOption::FoundRows => 2,
            ClientOption::NoSchema => 16,
            ClientOption::Compress => 32,
            ClientOption::Odbc => 64,
            ClientOption::LocalFiles => 128,
            ClientOption::IgnoreSpace => 256,
            ClientOption::Interactive => 1024,
            ClientOption::Ssl => 2048,
            ClientOption::IgnoreSigpipe => 4096,
            ClientOption::MultiStatements => 1 << 16,
            ClientOption::MultiResults => 1 << 17,
        }
    }
}

/// Combines a set of options into the client flag word.
pub fn client_flags(options: &[ClientOption]) -> u64 {
    options.iter().fold(0, |flags, option| flags | option.flag())
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_user() -> String {
    "root".to_string()
}

/// Everything needed to open a session.
///
/// `port == 0` means the connector's default port; `database == None` selects
/// no default schema.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectOptions {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub port: u32,
    #[serde(default)]
    pub options: Vec<ClientOption>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        ConnectOptions {
            host: default_host(),
            user: default_user(),
            password: String::new(),
            database: None,
            port: 0,
            options: Vec::new(),
        }
    }
}

impl ConnectOptions {
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        ConnectOptions {
            host: host.into(),
            user: user.into(),
            password: password.into(),
            ..ConnectOptions::default()
        }
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn port(mut self, port: u32) -> Self {
        self.port = port;
        self
    }

    pub fn option(mut self, option: ClientOption) -> Self {
        if !self.options.contains(&option) {
            self.options.push(option);
        }
        self
    }

    pub fn client_flags(&self) -> u64 {
        client_flags(&self.options)
    }
}

/// Borrowed view of [`ConnectOptions`] handed to a driver.
#[derive(Debug, Clone, Copy)]
pub struct ConnectParams<'a> {
    pub host: &'a str,
    pub user: &'a str,
    pub password: &'a str,
    pub database: Option<&'a str>,
    pub port: u32,
    pub client_flags: u64,
}

impl<'a> From<&'a ConnectOptions> for ConnectParams<'a> {
    fn from(options: &'a ConnectOptions) -> Self {
        ConnectParams {
            host: &options.host,
            user: &options.user,
            password: &options.password,
            database: options.database.as_deref(),
            port: options.port,
            client_flags: options.client_flags(),
        }
    }
}
