/// Database Module
///
/// The connect → execute → decode core of the bridge.
///
/// ## Architecture
///
/// - **Driver Interface** (`driver.rs`): the native capability surface every connector implements
/// - **Connection Management** (`connection.rs`): owns one native handle from allocation to teardown
/// - **Query Execution** (`query.rs`): sends statements and tells "no result set" apart from a bad result
/// - **Result Decoding** (`decode.rs`): copies native rows into owned, binary-safe buffers
///
/// ## Error Handling
///
/// All operations return the crate-wide `BridgeError`; nothing is retried and nothing is logged at error level.
pub mod connection;
pub mod decode;
pub mod driver;
pub mod field;
pub mod options;
pub mod query;
pub mod row;

pub use connection::*;
pub use decode::materialize;
pub use driver::{Driver, NativeResult, RawRow};
pub use field::*;
pub use options::*;
pub use query::*;
pub use row::*;
