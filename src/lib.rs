//! # Rowmill: Format-Agnostic Row Extraction Engine
//!
//! Rowmill converts heterogeneous raw input (markup trees, structured
//! documents, delimited text) into a normalized collection of
//! relational-style rows grouped by table name, ready for loading into a
//! row/column store.
//!
//! Concrete formats are collaborators: each implements the [`Recipe`] hooks
//! that say how its input decomposes into table, records and fields. The
//! engine supplies the rest:
//!
//! - **Traversal template**: [`RowParser`] walks raw -> table -> records ->
//!   fields, resolves each field's header positionally or through the
//!   recipe's fallback splitter, and assembles one [`DataRecord`] per record
//! - **Declarative registry**: per-header override handlers, computed
//!   columns and nested tables, registered once per definition in
//!   [`Recipe::configure`] and indexed by [`HandlerRegistry`]
//! - **Header resolution**: raw label translation, pre-declared header lists
//!   and case normalization via [`HeaderMap`], loadable from YAML
//! - **Shared accumulation**: one [`TableSet`] behind a cloneable
//!   [`SharedTables`] handle, written by the top-level parser and every
//!   recursively dispatched sub-parser, so one document fans out into
//!   several named tables
//! - **Export**: NDJSON and JSON-array writers for bulk loading
//!
//! ## Example
//!
//! ```
//! use rowmill::{FieldCursor, FieldValue, ParseError, Recipe, RowParser};
//!
//! /// `"a=1, b=2; a=10, b=20"` -> one table, one row per `;`-group.
//! struct Pairs;
//!
//! impl Recipe for Pairs {
//!     type Raw = String;
//!     type Table = String;
//!     type Record = String;
//!     type Field = String;
//!
//!     fn table_name(&self) -> &str {
//!         "Pairs"
//!     }
//!
//!     fn table_from_raw(&self, raw: String) -> Result<String, ParseError> {
//!         Ok(raw)
//!     }
//!
//!     fn find_records(&self, table: &String) -> Result<Vec<String>, ParseError> {
//!         Ok(table.split("; ").map(str::to_string).collect())
//!     }
//!
//!     fn find_fields(&self, record: &String) -> Result<Vec<String>, ParseError> {
//!         Ok(record.split(", ").map(str::to_string).collect())
//!     }
//!
//!     fn split_header_field(&self, field: &String) -> Option<(String, String)> {
//!         field.split_once('=').map(|(h, v)| (h.to_string(), v.to_string()))
//!     }
//!
//!     fn field_value(&self, cursor: &FieldCursor<'_, Self>) -> Result<FieldValue, ParseError> {
//!         Ok(FieldValue::from(cursor.field.as_str()))
//!     }
//! }
//!
//! let parser = RowParser::new(Pairs).unwrap();
//! let tables = parser.parse("a=1, b=2; a=10, b=20".to_string()).unwrap();
//!
//! let set = tables.snapshot();
//! let rows = set.get("Pairs").unwrap();
//! assert_eq!(rows.len(), 2);
//! assert_eq!(rows[0].get("a"), Some(&FieldValue::from("1")));
//! assert_eq!(rows[1].get("b"), Some(&FieldValue::from("20")));
//! ```

// Core modules
pub mod computed;
pub mod engine;
pub mod handlers;
pub mod headers;
pub mod recipe;
pub mod serialization;
pub mod tables;
pub mod value;

// Re-export key types
pub use engine::{ParseError, RowParser};
pub use handlers::{
    ComputedFn, FieldCursor, HandlerKind, HandlerRegistry, OverrideFn, RecipeError, RecordCursor,
};
pub use headers::{CaseStyle, HeaderMap};
pub use recipe::{Definition, Recipe};
pub use serialization::{JsonArrayWriter, NdjsonWriter, SerializationError};
pub use tables::{SharedTables, TableSet};
pub use value::{DataRecord, FieldValue, Header};
