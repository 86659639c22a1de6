//! The shared result accumulator: table name -> ordered rows.
//!
//! One [`TableSet`] collects every row a parse call tree produces. The engine
//! and any nested sub-parsers write through a [`SharedTables`] handle, so one
//! raw document fans out into several named tables of the same container, and
//! a caller can keep accumulating across inputs by binding several parsers to
//! one handle.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};
use std::rc::Rc;

use crate::value::DataRecord;

/// An insertion-ordered mapping from table name to its extracted rows.
///
/// Serializes transparently as `{"TableName": [row, ...], ...}`. Append-only
/// during a parse call tree: sub-parsers add rows and tables, never delete or
/// reorder siblings' rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableSet {
    tables: IndexMap<String, Vec<DataRecord>>,
}

impl TableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The rows of a table, in append order.
    pub fn get(&self, table: &str) -> Option<&[DataRecord]> {
        self.tables.get(table).map(Vec::as_slice)
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// Table names in insertion order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DataRecord])> {
        self.tables
            .iter()
            .map(|(name, rows)| (name.as_str(), rows.as_slice()))
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Total number of rows across all tables.
    pub fn row_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    /// Append a row to a table, creating the table if needed.
    pub fn push(&mut self, table: &str, row: DataRecord) {
        self.tables
            .entry(table.to_string())
            .or_insert_with(Vec::new)
            .push(row);
    }

    /// Convert to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Convert to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub(crate) fn ensure(&mut self, table: &str) {
        if !self.tables.contains_key(table) {
            self.tables.insert(table.to_string(), Vec::new());
        }
    }

    /// Remove a table if it holds no rows. Returns whether it was removed.
    pub(crate) fn drop_if_empty(&mut self, table: &str) -> bool {
        match self.tables.get(table) {
            Some(rows) if rows.is_empty() => {
                self.tables.shift_remove(table);
                true
            }
            _ => false,
        }
    }
}

/// A cheaply cloneable handle to one shared [`TableSet`].
///
/// Cloning the handle shares the underlying container; binding a parser to a
/// clone redirects all of that parser's writes, and any nested sub-parser
/// writes triggered during its calls, into the same `TableSet`.
///
/// The handle performs no locking and is not `Send`: parsing is a
/// single-threaded, synchronous call chain, and sharing one result across
/// threads is a compile error rather than a data race. Parallel extraction
/// uses one handle (and one set of parsers) per thread.
#[derive(Debug, Clone, Default)]
pub struct SharedTables {
    inner: Rc<RefCell<TableSet>>,
}

impl SharedTables {
    /// Create a handle to a fresh, empty table set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the underlying table set for reading.
    ///
    /// The borrow must not be held across a `parse` call on a parser bound to
    /// this handle.
    pub fn borrow(&self) -> Ref<'_, TableSet> {
        self.inner.borrow()
    }

    /// Clone the current contents out of the handle.
    pub fn snapshot(&self) -> TableSet {
        self.inner.borrow().clone()
    }

    /// Take the contents, leaving an empty table set behind.
    pub fn take(&self) -> TableSet {
        self.inner.take()
    }

    /// Whether two handles share the same underlying table set.
    pub fn ptr_eq(&self, other: &SharedTables) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn ensure(&self, table: &str) {
        self.inner.borrow_mut().ensure(table);
    }

    pub(crate) fn push(&self, table: &str, row: DataRecord) {
        self.inner.borrow_mut().push(table, row);
    }

    pub(crate) fn drop_if_empty(&self, table: &str) -> bool {
        self.inner.borrow_mut().drop_if_empty(table)
    }
}

impl From<TableSet> for SharedTables {
    fn from(set: TableSet) -> Self {
        Self {
            inner: Rc::new(RefCell::new(set)),
        }
    }
}
