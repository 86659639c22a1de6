//! Handler registry: per-definition customizations keyed by output header.
//!
//! A recipe attaches three kinds of special-case behavior without touching
//! the traversal logic:
//!
//! - **override handlers** replace the default field handler for one header;
//! - **computed fields** produce a value once per record, independent of any
//!   raw field (synthetic identifiers, provenance columns);
//! - **nested tables** hand a field's sub-content to another recipe, which
//!   appends rows to a different table of the same shared result.
//!
//! The registry is filled once, when a definition is compiled, and shared
//! read-only by every parser instance of that definition. Dispatch priority
//! is fixed: override, then nested table, then the default field handler.
//! A header may carry at most one customization; a second registration of any
//! kind is rejected rather than silently resolved.

use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;

use crate::engine::{ParseError, RowParser};
use crate::recipe::{Definition, Recipe};
use crate::tables::SharedTables;
use crate::value::{DataRecord, FieldValue};

/// The kind of customization registered for a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Override,
    Computed,
    NestedTable,
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerKind::Override => write!(f, "override handler"),
            HandlerKind::Computed => write!(f, "computed field"),
            HandlerKind::NestedTable => write!(f, "nested table"),
        }
    }
}

/// Error type for definition-time configuration
#[derive(Debug)]
pub enum RecipeError {
    /// A header was registered under more than one customization, or twice
    /// under the same one.
    DuplicateHeader {
        header: String,
        first: HandlerKind,
        second: HandlerKind,
    },
    /// A recipe reported an empty table name.
    EmptyTableName,
    /// A declarative header map failed to parse.
    InvalidHeaderMap(String),
}

impl fmt::Display for RecipeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipeError::DuplicateHeader {
                header,
                first,
                second,
            } => write!(
                f,
                "header '{}' already has a {} registered; cannot also register a {}",
                header, first, second
            ),
            RecipeError::EmptyTableName => write!(f, "recipe reported an empty table name"),
            RecipeError::InvalidHeaderMap(msg) => {
                write!(f, "invalid header map: {}", msg)
            }
        }
    }
}

impl std::error::Error for RecipeError {}

/// Traversal state handed to override handlers and the default field handler.
pub struct FieldCursor<'a, R: Recipe> {
    /// The record currently being decomposed.
    pub record: &'a R::Record,
    /// Zero-based index of the record within this parse call.
    pub record_index: usize,
    /// The field being handled. When the header came from the fallback
    /// splitter, this is the splitter's field part, not the original field.
    pub field: &'a R::Field,
    /// Zero-based index of the field within its record.
    pub field_index: usize,
    /// The resolved canonical header for this field.
    pub header: &'a str,
}

/// Traversal state handed to computed-field handlers, once per record.
///
/// Computed handlers run after every field of the record, so `row` already
/// holds everything the field pass produced.
pub struct RecordCursor<'a, R: Recipe> {
    pub record: &'a R::Record,
    pub record_index: usize,
    /// The data record populated so far.
    pub row: &'a DataRecord,
}

/// An override handler: replaces the default field handler for one header.
pub type OverrideFn<R> =
    Box<dyn Fn(&R, &FieldCursor<'_, R>) -> Result<FieldValue, ParseError>>;

/// A computed field handler: produces one value per record, after all fields.
pub type ComputedFn<R> =
    Box<dyn Fn(&R, &RecordCursor<'_, R>) -> Result<FieldValue, ParseError>>;

/// A nested-table dispatch: parses a field's sub-content into the shared
/// result under a different table name.
pub(crate) type NestedFn<R> =
    Box<dyn Fn(&<R as Recipe>::Field, &SharedTables) -> Result<(), ParseError>>;

/// Registry for one recipe definition's declared customizations.
///
/// Filled inside [`Recipe::configure`]; the engine consults it on every field.
pub struct HandlerRegistry<R: Recipe> {
    overrides: IndexMap<String, OverrideFn<R>>,
    computed: Vec<(String, ComputedFn<R>)>,
    nested: IndexMap<String, NestedFn<R>>,
    claimed: IndexMap<String, HandlerKind>,
}

impl<R: Recipe> HandlerRegistry<R> {
    pub(crate) fn new() -> Self {
        Self {
            overrides: IndexMap::new(),
            computed: Vec::new(),
            nested: IndexMap::new(),
            claimed: IndexMap::new(),
        }
    }

    fn claim(&mut self, header: &str, kind: HandlerKind) -> Result<(), RecipeError> {
        if let Some(first) = self.claimed.get(header) {
            return Err(RecipeError::DuplicateHeader {
                header: header.to_string(),
                first: *first,
                second: kind,
            });
        }
        self.claimed.insert(header.to_string(), kind);
        Ok(())
    }

    /// Register an override handler for a header.
    ///
    /// The handler is invoked instead of the default field handler whenever a
    /// field resolves to this header, and its return value becomes the row's
    /// value for the header.
    ///
    /// # Example
    ///
    /// ```ignore
    /// registry.override_field("Link", Box::new(|_recipe, cursor: &FieldCursor<'_, Self>| {
    ///     Ok(FieldValue::from(cursor.field.trim_start_matches("href=")))
    /// }))?;
    /// ```
    pub fn override_field(
        &mut self,
        header: impl Into<String>,
        handler: OverrideFn<R>,
    ) -> Result<(), RecipeError> {
        let header = header.into();
        self.claim(&header, HandlerKind::Override)?;
        self.overrides.insert(header, handler);
        Ok(())
    }

    /// Register a computed field for a header.
    ///
    /// The handler runs once per record, after all raw fields, in
    /// registration order. Its cursor exposes the row populated so far.
    /// See [`crate::computed`] for stock constructors.
    pub fn computed_field(
        &mut self,
        header: impl Into<String>,
        handler: ComputedFn<R>,
    ) -> Result<(), RecipeError> {
        let header = header.into();
        self.claim(&header, HandlerKind::Computed)?;
        self.computed.push((header, handler));
        Ok(())
    }

    /// Register a nested table for a header.
    ///
    /// When a field resolves to this header, no value is written into the
    /// parent row; instead a fresh parser for `sub` is bound to the current
    /// shared result and parses the field's content, appending rows under the
    /// sub recipe's own table name.
    ///
    /// The sub definition is compiled here, so its configuration errors also
    /// surface at definition time.
    pub fn nested_table<S>(
        &mut self,
        header: impl Into<String>,
        sub: S,
    ) -> Result<(), RecipeError>
    where
        S: Recipe<Raw = R::Field>,
        R::Field: Clone,
    {
        let header = header.into();
        self.claim(&header, HandlerKind::NestedTable)?;

        let definition = Rc::new(Definition::new(sub)?);
        let dispatch_header = header.clone();
        self.nested.insert(
            header,
            Box::new(move |field, tables| {
                tracing::debug!(
                    "header '{}': dispatching nested table '{}'",
                    dispatch_header,
                    definition.table_name()
                );
                let mut sub_parser = RowParser::from_definition(Rc::clone(&definition));
                sub_parser.bind(tables.clone());
                sub_parser.parse(field.clone())?;
                Ok(())
            }),
        );
        Ok(())
    }

    /// The kind registered for a header, if any.
    pub fn kind_of(&self, header: &str) -> Option<HandlerKind> {
        self.claimed.get(header).copied()
    }

    /// All registered headers, in registration order.
    pub fn registered_headers(&self) -> impl Iterator<Item = &str> {
        self.claimed.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }

    pub(crate) fn override_for(&self, header: &str) -> Option<&OverrideFn<R>> {
        self.overrides.get(header)
    }

    pub(crate) fn nested_for(&self, header: &str) -> Option<&NestedFn<R>> {
        self.nested.get(header)
    }

    pub(crate) fn computed(&self) -> &[(String, ComputedFn<R>)] {
        &self.computed
    }
}
