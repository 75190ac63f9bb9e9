//! Result Decoding Module
//!
//! Drains a stored native result into an owned [`ResultSet`]. The native
//! handle is taken by value, so it is released exactly once whichever way
//! `materialize` returns.

use super::driver::{NativeResult, RawRow};
use super::field::FieldDescriptor;
use super::row::{ResultSet, Row, Value};
use crate::core::{BridgeError, Result};
use std::sync::Arc;
use tracing::trace;

/// Copies every row of `result` into owned memory and frees the native result.
///
/// # Errors
///
/// * `BridgeError::MalformedRow` if a row's shape disagrees with the column
///   count or a reported length exceeds the field buffer.
/// * `BridgeError::IncompleteRead` if the fetch loop ended before the native
///   end-of-file indicator was set.
pub fn materialize<R: NativeResult>(mut result: R) -> Result<ResultSet> {
    let column_count = result.num_fields();
    let columns: Vec<Arc<FieldDescriptor>> = (0..column_count)
        .map(|index| Arc::new(result.fetch_field(index)))
        .collect();

    let mut rows = Vec::new();
    while let Some(raw) = result.fetch_row() {
        let row = decode_row(&columns, &raw, rows.len())?;
        rows.push(row);
    }

    if !result.eof() {
        return Err(BridgeError::IncompleteRead { rows_read: rows.len() });
    }

    trace!(columns = column_count, rows = rows.len(), "materialized result set");
    Ok(ResultSet::new(columns, rows))
}

fn decode_row(columns: &[Arc<FieldDescriptor>], raw: &RawRow<'_>, row: usize) -> Result<Row> {
    let values = raw.values();
    let lengths = raw.lengths();
    if values.len() != columns.len() || lengths.len() != columns.len() {
        return Err(BridgeError::MalformedRow {
            row,
            detail: format!(
                "expected {} field(s), got {} value(s) and {} length(s)",
                columns.len(),
                values.len(),
                lengths.len()
            ),
        });
    }

    let mut cells = Vec::with_capacity(columns.len());
    for (index, field) in columns.iter().enumerate() {
        let value = copy_field(values[index], lengths[index]).ok_or_else(|| {
            BridgeError::MalformedRow {
                row,
                detail: format!(
                    "field '{}' reports {} byte(s) but its buffer holds {}",
                    field.name,
                    lengths[index],
                    values[index].map_or(0, <[u8]>::len)
                ),
            }
        })?;
        cells.push((Arc::clone(field), value));
    }
    Ok(Row::new(cells))
}

/// Copies exactly `length` bytes; `None` only when the buffer is too short.
fn copy_field(buffer: Option<&[u8]>, length: u64) -> Option<Value> {
    match buffer {
        None => Some(None),
        Some(bytes) => {
            let length = usize::try_from(length).ok()?;
            bytes.get(..length).map(|data| Some(data.to_vec()))
        }
    }
}
