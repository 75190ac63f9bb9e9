//! Owned, detached query results.

use super::field::FieldDescriptor;
use std::sync::Arc;

/// One column value: `None` is SQL NULL, `Some` holds the exact field bytes,
/// possibly empty.
pub type Value = Option<Vec<u8>>;

/// One result row: a (descriptor, value) pair per column, in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    cells: Vec<(Arc<FieldDescriptor>, Value)>,
}

impl Row {
    pub fn new(cells: Vec<(Arc<FieldDescriptor>, Value)>) -> Self {
        Row { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Value of column `index`; `Some(None)` is a NULL, `None` an out-of-range index.
    pub fn get(&self, index: usize) -> Option<Option<&[u8]>> {
        self.cells.get(index).map(|(_, value)| value.as_deref())
    }

    /// Value of the first column called `name`.
    pub fn get_by_name(&self, name: &str) -> Option<Option<&[u8]>> {
        self.cells
            .iter()
            .find(|(field, _)| field.name == name)
            .map(|(_, value)| value.as_deref())
    }

    pub fn field(&self, index: usize) -> Option<&FieldDescriptor> {
        self.cells.get(index).map(|(field, _)| field.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldDescriptor, Option<&[u8]>)> {
        self.cells
            .iter()
            .map(|(field, value)| (field.as_ref(), value.as_deref()))
    }

    pub fn into_cells(self) -> Vec<(Arc<FieldDescriptor>, Value)> {
        self.cells
    }
}

/// Every row of one query, in fetch order, plus its column descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSet {
    columns: Vec<Arc<FieldDescriptor>>,
    rows: Vec<Row>,
}

impl ResultSet {
    pub fn new(columns: Vec<Arc<FieldDescriptor>>, rows: Vec<Row>) -> Self {
        ResultSet { columns, rows }
    }

    pub fn columns(&self) -> &[Arc<FieldDescriptor>] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|field| field.name.as_str()).collect()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl IntoIterator for ResultSet {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
