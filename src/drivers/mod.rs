//! Native driver implementations.
//!
//! - `embedded`: in-process engine on SQLite, always available
//! - `mysql`: libmysqlclient over FFI, behind the `mysqlclient` feature

pub mod embedded;
#[cfg(feature = "mysqlclient")]
pub mod mysql;

pub use embedded::EmbeddedDriver;
#[cfg(feature = "mysqlclient")]
pub use mysql::MysqlDriver;
