//! Embedded Driver
//!
//! An in-process engine that speaks the native driver contract on top of
//! SQLite. Each "database" is one SQLite database: a file `<host>/<name>.db`
//! when the host is a directory, or an in-memory database when the host is
//! `:memory:` or `localhost`. Failures are reported with the connector's
//! numeric codes, and query results are buffered at exec time in text form so
//! the decoder sees the same shape it would get from a server.

use crate::core::codes::ErrorCode;
use crate::core::db::driver::{Driver, NativeResult, RawRow};
use crate::core::db::field::{FieldDescriptor, FieldFlags, FieldType};
use crate::core::db::options::{ClientOption, ConnectParams};
use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection as SqliteConnection, Statement};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Hosts that select the in-memory catalog.
const MEMORY_HOSTS: &[&str] = &[":memory:", "localhost"];

/// Where the databases of a session live.
enum Catalog {
    Memory(HashMap<String, SqliteConnection>),
    Directory {
        root: PathBuf,
        open: Option<SqliteConnection>,
    },
}

/// Native connection backed by SQLite.
pub struct EmbeddedDriver {
    catalog: Option<Catalog>,
    current: Option<String>,
    client_flags: u64,
    errno: u32,
    error: Option<String>,
    field_count: u32,
    pending: Option<BufferedResult>,
}

impl EmbeddedDriver {
    fn succeed(&mut self) -> bool {
        self.errno = 0;
        self.error = None;
        true
    }

    fn fail(&mut self, code: ErrorCode, message: impl Into<String>) -> bool {
        self.errno = code.code();
        self.error = Some(message.into());
        false
    }

    fn active(&self) -> Option<&SqliteConnection> {
        match self.catalog.as_ref()? {
            Catalog::Memory(databases) => databases.get(self.current.as_deref()?),
            Catalog::Directory { open, .. } => open.as_ref(),
        }
    }

    /// Opens `name` and makes it current; reports 1049 if it does not exist.
    fn switch_to(&mut self, name: &str) -> bool {
        if let Some(message) = invalid_name(name) {
            return self.fail(ErrorCode::WrongDatabaseName, message);
        }
        let opened = match self.catalog.as_mut() {
            None => return self.fail(ErrorCode::ServerGone, "MySQL server has gone away"),
            Some(Catalog::Memory(databases)) => Ok(databases.contains_key(name)),
            Some(Catalog::Directory { root, open }) => {
                let path = database_path(root, name);
                if path.is_file() {
                    SqliteConnection::open(&path).map(|conn| {
                        *open = Some(conn);
                        true
                    })
                } else {
                    Ok(false)
                }
            }
        };
        match opened {
            Ok(true) => {
                self.current = Some(name.to_string());
                self.succeed()
            }
            Ok(false) => self.fail(ErrorCode::BadDatabase, format!("Unknown database '{}'", name)),
            Err(e) => {
                let (code, message) = map_sqlite_error(&e);
                self.fail(code, message)
            }
        }
    }
}

impl Driver for EmbeddedDriver {
    type Stored<'conn> = BufferedResult;

    fn init() -> Option<Self> {
        Some(EmbeddedDriver {
            catalog: None,
            current: None,
            client_flags: 0,
            errno: 0,
            error: None,
            field_count: 0,
            pending: None,
        })
    }

    fn real_connect(&mut self, params: &ConnectParams<'_>) -> bool {
        if self.catalog.is_some() {
            return self.fail(ErrorCode::AlreadyConnected, "This handle is already connected");
        }
        trace!(
            user = params.user,
            port = params.port,
            "embedded engine ignores credentials and transport settings"
        );

        if MEMORY_HOSTS.contains(&params.host) {
            let mut databases = HashMap::new();
            if let Some(name) = params.database {
                if let Some(message) = invalid_name(name) {
                    return self.fail(ErrorCode::WrongDatabaseName, message);
                }
                match SqliteConnection::open_in_memory() {
                    Ok(conn) => {
                        databases.insert(name.to_string(), conn);
                    }
                    Err(e) => {
                        let (code, message) = map_sqlite_error(&e);
                        return self.fail(code, message);
                    }
                }
            }
            self.catalog = Some(Catalog::Memory(databases));
        } else {
            let root = PathBuf::from(params.host);
            if !root.is_dir() {
                return self.fail(
                    ErrorCode::UnknownHost,
                    format!("Unknown MySQL server host '{}'", params.host),
                );
            }
            self.catalog = Some(Catalog::Directory { root, open: None });
        }

        if let Some(name) = params.database {
            if !self.switch_to(name) {
                self.catalog = None;
                return false;
            }
        }
        self.client_flags = params.client_flags;
        debug!(host = params.host, client_flags = params.client_flags, "embedded engine connected");
        self.succeed()
    }

    fn select_db(&mut self, name: &str) -> bool {
        self.switch_to(name)
    }

    fn create_db(&mut self, name: &str) -> bool {
        if let Some(message) = invalid_name(name) {
            return self.fail(ErrorCode::WrongDatabaseName, message);
        }
        let created = match self.catalog.as_mut() {
            None => return self.fail(ErrorCode::ServerGone, "MySQL server has gone away"),
            Some(Catalog::Memory(databases)) => {
                if databases.contains_key(name) {
                    Ok(false)
                } else {
                    match SqliteConnection::open_in_memory() {
                        Ok(conn) => {
                            databases.insert(name.to_string(), conn);
                            Ok(true)
                        }
                        Err(e) => Err(map_sqlite_error(&e)),
                    }
                }
            }
            Some(Catalog::Directory { root, .. }) => {
                // an empty file is a valid, empty SQLite database
                match OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(database_path(root, name))
                {
                    Ok(_) => Ok(true),
                    Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
                    Err(e) => Err(map_io_error(&e)),
                }
            }
        };
        match created {
            Ok(true) => self.succeed(),
            Ok(false) => self.fail(
                ErrorCode::DatabaseCreateExists,
                format!("Can't create database '{}'; database exists", name),
            ),
            Err((code, message)) => self.fail(code, message),
        }
    }

    fn drop_db(&mut self, name: &str) -> bool {
        if let Some(message) = invalid_name(name) {
            return self.fail(ErrorCode::WrongDatabaseName, message);
        }
        let is_current = self.current.as_deref() == Some(name);
        let dropped = match self.catalog.as_mut() {
            None => return self.fail(ErrorCode::ServerGone, "MySQL server has gone away"),
            Some(Catalog::Memory(databases)) => Ok(databases.remove(name).is_some()),
            Some(Catalog::Directory { root, open }) => {
                // the current database keeps its handle unless the file is gone
                let handle = if is_current { open.take() } else { None };
                match std::fs::remove_file(database_path(root, name)) {
                    Ok(()) => Ok(true),
                    Err(e) => {
                        if handle.is_some() {
                            *open = handle;
                        }
                        if e.kind() == io::ErrorKind::NotFound {
                            Ok(false)
                        } else {
                            Err(map_io_error(&e))
                        }
                    }
                }
            }
        };
        match dropped {
            Ok(true) => {
                if is_current {
                    self.current = None;
                }
                self.succeed()
            }
            Ok(false) => self.fail(
                ErrorCode::DatabaseDropExists,
                format!("Can't drop database '{}'; database doesn't exist", name),
            ),
            Err((code, message)) => self.fail(code, message),
        }
    }

    fn exec_sql(&mut self, sql: &str) -> bool {
        self.pending = None;
        self.field_count = 0;
        if self.catalog.is_none() {
            return self.fail(ErrorCode::ServerGone, "MySQL server has gone away");
        }
        let multi_statements = self.client_flags & ClientOption::MultiStatements.flag() != 0;
        let outcome = match self.active() {
            Some(conn) => run_batch(conn, sql, multi_statements),
            None => return self.fail(ErrorCode::NoDatabaseSelected, "No database selected"),
        };
        match outcome {
            Ok(Some(result)) => {
                self.field_count = result.fields.len() as u32;
                self.pending = Some(result);
                self.succeed()
            }
            Ok(None) => self.succeed(),
            Err((code, message)) => self.fail(code, message),
        }
    }

    fn store_result(&mut self) -> Option<Self::Stored<'_>> {
        self.pending.take()
    }

    fn field_count(&self) -> u32 {
        self.field_count
    }

    fn errno(&self) -> u32 {
        self.errno
    }

    fn error(&self) -> Option<String> {
        self.error.clone()
    }

    fn host_info(&self) -> Option<String> {
        match self.catalog.as_ref()? {
            Catalog::Memory(_) => Some("Embedded engine (in-memory)".to_string()),
            Catalog::Directory { root, .. } => {
                Some(format!("Embedded engine at {}", root.display()))
            }
        }
    }

    fn close(&mut self) {
        self.pending = None;
        self.current = None;
        self.catalog = None;
    }

    fn client_info() -> Option<String> {
        Some(format!("embedded (SQLite {})", rusqlite::version()))
    }

    fn client_version() -> u64 {
        u64::try_from(rusqlite::version_number()).unwrap_or(0)
    }
}

/// A result buffered in full at exec time.
#[derive(Debug)]
pub struct BufferedResult {
    fields: Vec<FieldDescriptor>,
    rows: Vec<Vec<Option<Vec<u8>>>>,
    cursor: usize,
    eof: bool,
}

impl NativeResult for BufferedResult {
    fn num_fields(&self) -> usize {
        self.fields.len()
    }

    fn fetch_field(&self, index: usize) -> FieldDescriptor {
        self.fields[index].clone()
    }

    fn fetch_row(&mut self) -> Option<RawRow<'_>> {
        if self.cursor >= self.rows.len() {
            self.eof = true;
            return None;
        }
        self.cursor += 1;
        let row = &self.rows[self.cursor - 1];
        let lengths = row
            .iter()
            .map(|value| value.as_ref().map_or(0, |bytes| bytes.len() as u64))
            .collect();
        Some(RawRow::new(row.iter().map(|value| value.as_deref()).collect(), lengths))
    }

    fn eof(&self) -> bool {
        self.eof
    }
}

impl Drop for BufferedResult {
    fn drop(&mut self) {
        trace!(rows = self.rows.len(), "freeing buffered result");
    }
}

/// Runs every statement in `sql`, in order.
///
/// More than one statement is a syntax error unless multi-statements was
/// negotiated. Statements are prepared one at a time, so later ones may use
/// tables created by earlier ones. The first result set produced is kept.
fn run_batch(
    conn: &SqliteConnection,
    sql: &str,
    multi_statements: bool,
) -> Result<Option<BufferedResult>, (ErrorCode, String)> {
    let sqlite = |e: rusqlite::Error| map_sqlite_error(&e);
    let mut batch = Batch::new(conn, sql);
    let mut first = match batch.next().map_err(sqlite)? {
        Some(stmt) => stmt,
        None => return Err((ErrorCode::EmptyQuery, "Query was empty".to_string())),
    };

    if !multi_statements {
        if !matches!(batch.next(), Ok(None)) {
            return Err((
                ErrorCode::ParseError,
                "You have an error in your SQL syntax; \
                 multiple statements need the multi-statements option"
                    .to_string(),
            ));
        }
        return run_statement(&mut first).map_err(sqlite);
    }

    let mut result = run_statement(&mut first).map_err(sqlite)?;
    drop(first);
    while let Some(mut stmt) = batch.next().map_err(sqlite)? {
        let next = run_statement(&mut stmt).map_err(sqlite)?;
        if result.is_none() {
            result = next;
        }
    }
    Ok(result)
}

/// Runs one prepared statement; statements with columns are buffered.
fn run_statement(stmt: &mut Statement<'_>) -> rusqlite::Result<Option<BufferedResult>> {
    let column_count = stmt.column_count();
    if column_count == 0 {
        stmt.execute([])?;
        return Ok(None);
    }

    let declared: Vec<(String, Option<String>)> = stmt
        .columns()
        .iter()
        .map(|column| (column.name().to_string(), column.decl_type().map(str::to_string)))
        .collect();

    let mut observed: Vec<Option<FieldType>> = vec![None; column_count];
    let mut widths = vec![0u64; column_count];
    let mut rows = Vec::new();
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        let mut values = Vec::with_capacity(column_count);
        for index in 0..column_count {
            let value = row.get_ref(index)?;
            if observed[index].is_none() {
                observed[index] = value_type(value);
            }
            let bytes = text_protocol_bytes(value);
            if let Some(bytes) = &bytes {
                widths[index] = widths[index].max(bytes.len() as u64);
            }
            values.push(bytes);
        }
        rows.push(values);
    }

    let fields = declared
        .into_iter()
        .enumerate()
        .map(|(index, (name, decl_type))| {
            let field_type = decl_type
                .as_deref()
                .map(declared_type)
                .or(observed[index])
                .unwrap_or(FieldType::Null);
            let flags = if field_type.is_blob() {
                FieldFlags::BLOB | FieldFlags::BINARY
            } else {
                0
            };
            FieldDescriptor::new(name, field_type)
                .with_length(widths[index])
                .with_flags(flags)
        })
        .collect();

    Ok(Some(BufferedResult {
        fields,
        rows,
        cursor: 0,
        eof: false,
    }))
}

/// Renders a value the way a server's text protocol would.
fn text_protocol_bytes(value: ValueRef<'_>) -> Option<Vec<u8>> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string().into_bytes()),
        ValueRef::Real(f) => Some(real_text(f).into_bytes()),
        ValueRef::Text(t) => Some(t.to_vec()),
        ValueRef::Blob(b) => Some(b.to_vec()),
    }
}

/// Decimal text for a double, switching to exponent form past 15 integer digits.
fn real_text(value: f64) -> String {
    if value.is_finite() && value.abs() >= 1e15 {
        format!("{:e}", value)
    } else {
        value.to_string()
    }
}

fn value_type(value: ValueRef<'_>) -> Option<FieldType> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(_) => Some(FieldType::LongLong),
        ValueRef::Real(_) => Some(FieldType::Double),
        ValueRef::Text(_) => Some(FieldType::VarString),
        ValueRef::Blob(_) => Some(FieldType::Blob),
    }
}

/// Maps a declared SQLite column type to the closest connector type.
fn declared_type(decl: &str) -> FieldType {
    let decl = decl.to_ascii_uppercase();
    if decl.contains("BOOL") {
        FieldType::Tiny
    } else if decl.contains("INT") {
        FieldType::LongLong
    } else if decl.contains("CHAR") || decl.contains("CLOB") || decl.contains("TEXT") {
        FieldType::VarString
    } else if decl.contains("BLOB") || decl.is_empty() {
        FieldType::Blob
    } else if decl.contains("REAL") || decl.contains("FLOA") || decl.contains("DOUB") {
        FieldType::Double
    } else if decl.contains("DATETIME") || decl.contains("TIMESTAMP") {
        FieldType::DateTime
    } else if decl.contains("DATE") {
        FieldType::Date
    } else if decl.contains("TIME") {
        FieldType::Time
    } else if decl.contains("JSON") {
        FieldType::Json
    } else {
        FieldType::NewDecimal
    }
}

fn database_path(root: &Path, name: &str) -> PathBuf {
    root.join(format!("{}.db", name))
}

fn invalid_name(name: &str) -> Option<String> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(|c| matches!(c, '/' | '\\' | '\0'));
    bad.then(|| format!("Incorrect database name '{}'", name.escape_default()))
}

/// Translates a SQLite failure into a connector code and message.
fn map_sqlite_error(error: &rusqlite::Error) -> (ErrorCode, String) {
    let message = error.to_string();
    let lower = message.to_lowercase();
    let code = if lower.contains("no such table") {
        ErrorCode::NoSuchTable
    } else if lower.contains("no such column") {
        ErrorCode::BadField
    } else if lower.contains("syntax error") || lower.contains("incomplete input") {
        ErrorCode::ParseError
    } else if lower.contains("already exists") {
        ErrorCode::TableExists
    } else if lower.contains("unique constraint") {
        ErrorCode::DuplicateEntry
    } else {
        ErrorCode::UnknownServerError
    };
    (code, message)
}

fn map_io_error(error: &io::Error) -> (ErrorCode, String) {
    (ErrorCode::UnknownServerError, error.to_string())
}
