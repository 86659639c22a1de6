//! The traversal engine: raw -> table -> records -> fields -> rows.
//!
//! [`RowParser`] drives one recipe's decomposition as a fixed template. Per
//! parse call it ensures the output table exists, derives the table from the
//! raw input, resolves the canonical header sequence, then walks records and
//! fields: each field's header is resolved positionally, falling back to the
//! recipe's splitter, and its value is produced by the registered override,
//! a nested-table dispatch, or the recipe's default field handler. Computed
//! fields run once per record, after all fields. Tables that end up with no
//! rows are removed before returning.
//!
//! Traversal state lives in per-call cursor values handed to handlers, never
//! in the parser itself, so `parse` takes `&self` and a parser instance can
//! be reused freely between calls.

use std::fmt;
use std::rc::Rc;

use crate::handlers::{FieldCursor, RecordCursor};
use crate::recipe::{Definition, Recipe};
use crate::tables::SharedTables;
use crate::value::DataRecord;

/// Error type for parse-time failures
#[derive(Debug)]
pub enum ParseError {
    /// A field's index exceeded the header sequence and the recipe's fallback
    /// splitter yielded nothing. Aborts the parse call immediately; rows
    /// appended before the failure remain in the shared result.
    HeaderUnresolved {
        table: String,
        record: usize,
        field: usize,
    },
    /// A format-specific extraction failure, carried through unchanged from
    /// the recipe hook that raised it.
    Source(Box<dyn std::error::Error + Send + Sync>),
}

impl ParseError {
    /// Wrap a format-specific error for propagation through the engine.
    pub fn source(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        ParseError::Source(Box::new(err))
    }

    /// Wrap a plain message as a format-specific error.
    pub fn message(msg: impl Into<String>) -> Self {
        let msg: String = msg.into();
        ParseError::Source(msg.into())
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::HeaderUnresolved {
                table,
                record,
                field,
            } => write!(
                f,
                "table '{}': no header resolved for field {} of record {}",
                table, field, record
            ),
            ParseError::Source(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Source(err) => {
                let err: &(dyn std::error::Error + 'static) = &**err;
                Some(err)
            }
            _ => None,
        }
    }
}

/// The extraction engine for one recipe definition.
///
/// A parser is bound to a [`SharedTables`] container: a fresh one by
/// default, or one supplied via [`bind`](RowParser::bind) to accumulate
/// several parsers' (or several inputs') rows in one place. Parsing appends
/// rows under the recipe's table name and returns the shared handle.
pub struct RowParser<R: Recipe> {
    definition: Rc<Definition<R>>,
    tables: SharedTables,
}

impl<R: Recipe> RowParser<R> {
    /// Compile `recipe` and create a parser for it, bound to a fresh result
    /// container.
    pub fn new(recipe: R) -> Result<Self, crate::handlers::RecipeError> {
        Ok(Self::from_definition(Rc::new(Definition::new(recipe)?)))
    }

    /// Create a parser from an already-compiled definition. Instances created
    /// this way share the definition's registry; nothing is recompiled.
    pub fn from_definition(definition: Rc<Definition<R>>) -> Self {
        Self {
            definition,
            tables: SharedTables::new(),
        }
    }

    /// Bind this parser's future writes to an existing result container.
    ///
    /// Idempotent and repeatable: binding again to another handle redirects
    /// subsequent writes there, leaving earlier containers untouched.
    pub fn bind(&mut self, tables: SharedTables) {
        self.tables = tables;
    }

    /// The currently bound result container.
    pub fn tables(&self) -> &SharedTables {
        &self.tables
    }

    pub fn definition(&self) -> &Rc<Definition<R>> {
        &self.definition
    }

    /// Parse one raw input, appending rows to the bound result container
    /// under the recipe's table name, and return the container handle.
    ///
    /// # Errors
    ///
    /// Fails on an unresolvable header or on any error a recipe hook raises;
    /// the failure aborts this call immediately and the container keeps
    /// whatever rows were appended before it.
    pub fn parse(&self, raw: R::Raw) -> Result<SharedTables, ParseError> {
        let def = &self.definition;
        let recipe = def.recipe();
        let table_name = def.table_name();

        self.tables.ensure(table_name);
        let table = recipe.table_from_raw(raw)?;
        let headers = def.resolve_headers(&table);
        let records = recipe.find_records(&table)?;
        tracing::debug!(
            "table '{}': {} record(s), {} positional header(s)",
            table_name,
            records.len(),
            headers.len()
        );

        for (record_index, record) in records.iter().enumerate() {
            let row = self.extract_record(record, record_index, &headers)?;
            self.tables.push(table_name, row);
        }

        if self.tables.drop_if_empty(table_name) {
            tracing::debug!("table '{}' produced no rows, removed", table_name);
        }

        Ok(self.tables.clone())
    }

    /// Decompose one record into a data record.
    fn extract_record(
        &self,
        record: &R::Record,
        record_index: usize,
        headers: &[String],
    ) -> Result<DataRecord, ParseError> {
        let def = &self.definition;
        let recipe = def.recipe();
        let handlers = def.handlers();

        let mut row = DataRecord::new();
        let fields = recipe.find_fields(record)?;
        tracing::trace!("record {}: {} field(s)", record_index, fields.len());

        for (field_index, field) in fields.iter().enumerate() {
            // Positional header first; past the header sequence, the recipe's
            // splitter derives both header and field from the field content.
            let (header, split_field) = match headers.get(field_index) {
                Some(header) => (header.clone(), None),
                None => match recipe.split_header_field(field) {
                    Some((header, value)) => (header, Some(value)),
                    None => {
                        return Err(ParseError::HeaderUnresolved {
                            table: def.table_name().to_string(),
                            record: record_index,
                            field: field_index,
                        })
                    }
                },
            };
            let field = split_field.as_ref().unwrap_or(field);

            if let Some(handler) = handlers.override_for(&header) {
                let cursor = FieldCursor {
                    record,
                    record_index,
                    field,
                    field_index,
                    header: &header,
                };
                let value = handler(recipe, &cursor)?;
                row.insert(header, value);
            } else if let Some(dispatch) = handlers.nested_for(&header) {
                // The nested table consumes the field; the parent row gets no
                // value for this header.
                dispatch(field, &self.tables)?;
            } else {
                let cursor = FieldCursor {
                    record,
                    record_index,
                    field,
                    field_index,
                    header: &header,
                };
                let value = recipe.field_value(&cursor)?;
                row.insert(header, value);
            }
        }

        // Computed fields run last, in registration order, over the row the
        // field pass produced. A record with zero fields still gets them; a
        // record with neither fields nor computed columns stays an empty row
        // and is appended anyway.
        for (header, handler) in handlers.computed() {
            let value = {
                let cursor = RecordCursor {
                    record,
                    record_index,
                    row: &row,
                };
                handler(recipe, &cursor)?
            };
            row.insert(header.clone(), value);
        }

        Ok(row)
    }
}
