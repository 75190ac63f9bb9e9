//! libmysqlclient Driver
//!
//! FFI binding of the driver contract to the MySQL C client library through
//! `mysqlclient-sys`. Only built with the `mysqlclient` feature.
//!
//! `mysql_create_db` and `mysql_drop_db` are gone from current client
//! libraries, so the administrative calls for them are issued as
//! `CREATE DATABASE` / `DROP DATABASE` statements.

use crate::core::codes::ErrorCode;
use crate::core::db::driver::{Driver, NativeResult, RawRow};
use crate::core::db::field::{FieldDescriptor, FieldType};
use crate::core::db::options::ConnectParams;
use mysqlclient_sys as ffi;
use std::ffi::{CStr, CString};
use std::marker::PhantomData;
use std::os::raw::{c_char, c_uint, c_ulong};
use std::ptr::{self, NonNull};
use tracing::trace;

/// One `MYSQL*` handle.
pub struct MysqlDriver {
    handle: NonNull<ffi::MYSQL>,
    /// Failure detected before reaching the library, reported until the next call.
    local_error: Option<String>,
}

impl MysqlDriver {
    fn ptr(&self) -> *mut ffi::MYSQL {
        self.handle.as_ptr()
    }

    fn c_string(&mut self, value: &str) -> Option<CString> {
        match CString::new(value) {
            Ok(value) => Some(value),
            Err(_) => {
                self.local_error = Some(format!("argument contains a NUL byte: {:?}", value));
                None
            }
        }
    }

    fn query(&mut self, sql: &str) -> bool {
        self.local_error = None;
        // SAFETY: the handle is live until `close`; the length bounds the buffer.
        let status = unsafe {
            ffi::mysql_real_query(self.ptr(), sql.as_ptr() as *const c_char, sql.len() as c_ulong)
        };
        status == 0
    }
}

/// Quotes an identifier with backticks.
fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Copies a library-owned C string, treating null and empty as absent.
///
/// # Safety
///
/// `value` must be null or point to a NUL-terminated string.
unsafe fn owned_string(value: *const c_char) -> Option<String> {
    if value.is_null() {
        return None;
    }
    let text = CStr::from_ptr(value).to_string_lossy().into_owned();
    (!text.is_empty()).then_some(text)
}

impl Driver for MysqlDriver {
    type Stored<'conn> = MysqlResult<'conn>;

    fn init() -> Option<Self> {
        // SAFETY: a null argument asks the library to allocate the handle.
        let handle = unsafe { ffi::mysql_init(ptr::null_mut()) };
        NonNull::new(handle).map(|handle| MysqlDriver {
            handle,
            local_error: None,
        })
    }

    fn real_connect(&mut self, params: &ConnectParams<'_>) -> bool {
        let (Some(host), Some(user), Some(password)) = (
            self.c_string(params.host),
            self.c_string(params.user),
            self.c_string(params.password),
        ) else {
            return false;
        };
        let database = match params.database {
            Some(name) => match self.c_string(name) {
                Some(name) => Some(name),
                None => return false,
            },
            None => None,
        };
        self.local_error = None;

        // SAFETY: every pointer is either null or a live CString for the call.
        let connected = unsafe {
            ffi::mysql_real_connect(
                self.ptr(),
                host.as_ptr(),
                user.as_ptr(),
                password.as_ptr(),
                database.as_ref().map_or(ptr::null(), |name| name.as_ptr()),
                params.port as c_uint,
                ptr::null(),
                params.client_flags as c_ulong,
            )
        };
        !connected.is_null()
    }

    fn select_db(&mut self, name: &str) -> bool {
        let Some(name) = self.c_string(name) else {
            return false;
        };
        self.local_error = None;
        // SAFETY: live handle and NUL-terminated name.
        unsafe { ffi::mysql_select_db(self.ptr(), name.as_ptr()) == 0 }
    }

    fn create_db(&mut self, name: &str) -> bool {
        self.query(&format!("CREATE DATABASE {}", quote_identifier(name)))
    }

    fn drop_db(&mut self, name: &str) -> bool {
        self.query(&format!("DROP DATABASE {}", quote_identifier(name)))
    }

    fn exec_sql(&mut self, sql: &str) -> bool {
        self.query(sql)
    }

    fn store_result(&mut self) -> Option<Self::Stored<'_>> {
        // SAFETY: live handle.
        let result = unsafe { ffi::mysql_store_result(self.ptr()) };
        NonNull::new(result).map(|result| MysqlResult {
            result,
            connection: self.handle,
            eof: false,
            _connection: PhantomData,
        })
    }

    fn field_count(&self) -> u32 {
        // SAFETY: live handle.
        unsafe { ffi::mysql_field_count(self.ptr()) as u32 }
    }

    fn errno(&self) -> u32 {
        if self.local_error.is_some() {
            return ErrorCode::UnknownError.code();
        }
        // SAFETY: live handle.
        unsafe { ffi::mysql_errno(self.ptr()) as u32 }
    }

    fn error(&self) -> Option<String> {
        if let Some(message) = &self.local_error {
            return Some(message.clone());
        }
        // SAFETY: the library returns a NUL-terminated buffer owned by the handle.
        unsafe { owned_string(ffi::mysql_error(self.ptr())) }
    }

    fn host_info(&self) -> Option<String> {
        // SAFETY: as for `error`.
        unsafe { owned_string(ffi::mysql_get_host_info(self.ptr())) }
    }

    fn close(&mut self) {
        trace!("mysql_close");
        // SAFETY: called exactly once by the owning connection.
        unsafe { ffi::mysql_close(self.ptr()) }
    }

    fn client_info() -> Option<String> {
        // SAFETY: static string owned by the library.
        unsafe { owned_string(ffi::mysql_get_client_info()) }
    }

    fn client_version() -> u64 {
        // SAFETY: no arguments, no preconditions.
        unsafe { ffi::mysql_get_client_version() as u64 }
    }
}

/// One `MYSQL_RES*`, freed on drop.
pub struct MysqlResult<'conn> {
    result: NonNull<ffi::MYSQL_RES>,
    connection: NonNull<ffi::MYSQL>,
    eof: bool,
    _connection: PhantomData<&'conn mut MysqlDriver>,
}

impl NativeResult for MysqlResult<'_> {
    fn num_fields(&self) -> usize {
        // SAFETY: the result is live until drop.
        unsafe { ffi::mysql_num_fields(self.result.as_ptr()) as usize }
    }

    fn fetch_field(&self, index: usize) -> FieldDescriptor {
        // SAFETY: callers keep `index < num_fields()`.
        let field = unsafe { ffi::mysql_fetch_field_direct(self.result.as_ptr(), index as c_uint) };
        if field.is_null() {
            return FieldDescriptor::new(String::new(), FieldType::Null);
        }
        // SAFETY: non-null field metadata lives as long as the result.
        unsafe {
            let field = &*field;
            FieldDescriptor::new(
                owned_string(field.name).unwrap_or_default(),
                FieldType::from_code(field.type_ as u32),
            )
            .with_table(owned_string(field.table).unwrap_or_default())
            .with_length(field.length as u64)
            .with_flags(field.flags as u32)
        }
    }

    fn fetch_row(&mut self) -> Option<RawRow<'_>> {
        // SAFETY: the result is live until drop.
        let row = unsafe { ffi::mysql_fetch_row(self.result.as_ptr()) };
        if row.is_null() {
            // a null row after a read error leaves the error on the connection
            // SAFETY: the connection outlives this result.
            self.eof = unsafe { ffi::mysql_errno(self.connection.as_ptr()) } == 0;
            return None;
        }

        let count = self.num_fields();
        // SAFETY: lengths describe the row just fetched.
        let lengths = unsafe { ffi::mysql_fetch_lengths(self.result.as_ptr()) };
        if lengths.is_null() {
            return Some(RawRow::new(Vec::new(), Vec::new()));
        }
        // SAFETY: both arrays hold `count` entries and stay valid until the next fetch.
        let (cells, lengths) = unsafe {
            (
                std::slice::from_raw_parts(row, count),
                std::slice::from_raw_parts(lengths, count),
            )
        };
        let lengths: Vec<u64> = lengths.iter().map(|&length| length as u64).collect();
        let values = cells
            .iter()
            .zip(&lengths)
            .map(|(&cell, &length)| {
                if cell.is_null() {
                    None
                } else {
                    // SAFETY: a non-null cell points at `length` readable bytes.
                    Some(unsafe { std::slice::from_raw_parts(cell as *const u8, length as usize) })
                }
            })
            .collect();
        Some(RawRow::new(values, lengths))
    }

    fn eof(&self) -> bool {
        self.eof
    }
}

impl Drop for MysqlResult<'_> {
    fn drop(&mut self) {
        // SAFETY: dropped exactly once; nothing borrows from the result any more.
        unsafe { ffi::mysql_free_result(self.result.as_ptr()) }
    }
}
