//! Native Driver Interface
//!
//! The narrow capability surface the bridge needs from a connector library.
//! Implementations mirror the C API closely: calls report plain success or
//! failure, and the details of a failure are read afterwards through
//! [`Driver::errno`] and [`Driver::error`], which only describe the most recent
//! call on the handle.
//!
//! Resource release is tied to ownership. A connection handle is released by
//! [`Driver::close`], which [`Connection`](super::Connection) calls exactly once
//! from its `Drop`. A stored result is released when the [`NativeResult`] value
//! is dropped.

use super::field::FieldDescriptor;
use super::options::ConnectParams;

/// One native connection handle.
pub trait Driver: Sized {
    /// Stored result handle produced by [`Driver::store_result`].
    type Stored<'conn>: NativeResult
    where
        Self: 'conn;

    /// Allocates a handle. `None` means the library could not allocate one.
    fn init() -> Option<Self>;

    /// Opens a session. Returns `false` on failure.
    fn real_connect(&mut self, params: &ConnectParams<'_>) -> bool;

    fn select_db(&mut self, name: &str) -> bool;

    fn create_db(&mut self, name: &str) -> bool;

    fn drop_db(&mut self, name: &str) -> bool;

    /// Sends one statement. Returns `false` if the statement failed.
    fn exec_sql(&mut self, sql: &str) -> bool;

    /// Takes the buffered result of the last statement, if it produced one.
    fn store_result(&mut self) -> Option<Self::Stored<'_>>;

    /// Column count of the last statement.
    fn field_count(&self) -> u32;

    /// Code of the last error on this handle, 0 when the last call succeeded.
    fn errno(&self) -> u32;

    /// Message of the last error on this handle.
    fn error(&self) -> Option<String>;

    fn host_info(&self) -> Option<String>;

    /// Releases the handle. Called exactly once.
    fn close(&mut self);

    fn client_info() -> Option<String>;

    fn client_version() -> u64;
}

/// A stored result handle. Dropping it frees the native result.
pub trait NativeResult {
    fn num_fields(&self) -> usize;

    /// Descriptor of column `index`, with `index < num_fields()`.
    fn fetch_field(&self, index: usize) -> FieldDescriptor;

    /// Advances to the next row. `None` ends the fetch loop, either at the
    /// end of the result or because reading failed; [`NativeResult::eof`] tells
    /// the two apart.
    fn fetch_row(&mut self) -> Option<RawRow<'_>>;

    /// Whether the fetch loop reached the true end of the result.
    fn eof(&self) -> bool;
}

/// A fetched row as the connector hands it out: one buffer per column, `None`
/// for SQL NULL, and the parallel array of field byte lengths.
///
/// Lengths are authoritative. Buffers may hold arbitrary bytes, including
/// zeros, and are never scanned for a terminator.
#[derive(Debug, Clone)]
pub struct RawRow<'a> {
    values: Vec<Option<&'a [u8]>>,
    lengths: Vec<u64>,
}

impl<'a> RawRow<'a> {
    pub fn new(values: Vec<Option<&'a [u8]>>, lengths: Vec<u64>) -> Self {
        RawRow { values, lengths }
    }

    pub fn values(&self) -> &[Option<&'a [u8]>] {
        &self.values
    }

    pub fn lengths(&self) -> &[u64] {
        &self.lengths
    }
}
