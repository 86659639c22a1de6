//! The extraction-rule contract and its compiled, definition-level state.
//!
//! A [`Recipe`] tells the engine how one raw input decomposes: how the whole
//! input becomes a table, how the table splits into records and records into
//! fields, and how a field becomes a value. Special-case behavior per output
//! column is declared once, in [`Recipe::configure`], and compiled into a
//! [`Definition`] shared read-only by every parser instance of that recipe.

use crate::engine::ParseError;
use crate::handlers::{FieldCursor, HandlerRegistry, RecipeError};
use crate::headers::HeaderMap;
use crate::value::FieldValue;

/// Format-specific extraction rules for one output table.
///
/// The engine is format-agnostic: everything it knows about the input comes
/// from these hooks. `Raw` is the caller's input, `Table` the whole input
/// reinterpreted as one table, `Record` one unit of iteration over the table,
/// `Field` one unit of iteration over a record.
///
/// Required hooks: [`table_name`](Recipe::table_name),
/// [`table_from_raw`](Recipe::table_from_raw),
/// [`find_records`](Recipe::find_records),
/// [`find_fields`](Recipe::find_fields) and
/// [`field_value`](Recipe::field_value); a recipe that does not implement
/// them does not compile. The rest have defaults.
pub trait Recipe: Sized + 'static {
    type Raw;
    type Table;
    type Record;
    type Field;

    /// Name of the output table this recipe's rows land in.
    fn table_name(&self) -> &str;

    /// Header configuration: translations, pre-declared list, case style.
    fn header_map(&self) -> HeaderMap {
        HeaderMap::new()
    }

    /// Declare per-header customizations. Runs once, when the definition is
    /// compiled, never at parse time.
    fn configure(&self, _registry: &mut HandlerRegistry<Self>) -> Result<(), RecipeError> {
        Ok(())
    }

    /// Reinterpret the raw input as one table.
    ///
    /// Identity recipes (where `Table` is `Raw`) return `Ok(raw)`. Failures
    /// from format-specific parsing belong in [`ParseError::source`] and
    /// propagate to the caller unchanged.
    fn table_from_raw(&self, raw: Self::Raw) -> Result<Self::Table, ParseError>;

    /// Discover the raw header labels of the table, in column order.
    ///
    /// Return `None` (the default) to use the pre-declared list from
    /// [`header_map`](Recipe::header_map). Either way, every label passes
    /// through the header map's translation.
    fn find_headers(&self, _table: &Self::Table) -> Option<Vec<String>> {
        None
    }

    /// The records of the table, in the order they should be extracted.
    fn find_records(&self, table: &Self::Table) -> Result<Vec<Self::Record>, ParseError>;

    /// The fields of one record, in column order.
    fn find_fields(&self, record: &Self::Record) -> Result<Vec<Self::Field>, ParseError>;

    /// Fallback resolution for a field whose index exceeds the header
    /// sequence: derive `(header, field)` from the field's own content, e.g.
    /// a `label=value` decomposition.
    ///
    /// The default yields nothing; a field that reaches it unresolved fails
    /// the parse with [`ParseError::HeaderUnresolved`]. Only needed when a
    /// record can have more fields than declared headers.
    fn split_header_field(&self, _field: &Self::Field) -> Option<(String, Self::Field)> {
        None
    }

    /// The default field handler: turn the current field into its value.
    fn field_value(&self, cursor: &FieldCursor<'_, Self>) -> Result<FieldValue, ParseError>;
}

/// Compiled definition-level state for a recipe: table name, header map and
/// handler registry. Built once per definition and shared read-only across
/// all parser instances of it (nested dispatch clones the `Rc`, it never
/// recompiles).
pub struct Definition<R: Recipe> {
    recipe: R,
    table_name: String,
    headers: HeaderMap,
    handlers: HandlerRegistry<R>,
}

impl<R: Recipe> Definition<R> {
    /// Compile a recipe: capture its table name and header map, then run its
    /// declarative registrations. Configuration errors surface here, before
    /// any parsing.
    pub fn new(recipe: R) -> Result<Self, RecipeError> {
        let table_name = recipe.table_name().to_string();
        if table_name.is_empty() {
            return Err(RecipeError::EmptyTableName);
        }
        let headers = recipe.header_map();
        let mut handlers = HandlerRegistry::new();
        recipe.configure(&mut handlers)?;
        Ok(Self {
            recipe,
            table_name,
            headers,
            handlers,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn recipe(&self) -> &R {
        &self.recipe
    }

    pub fn header_map(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn handlers(&self) -> &HandlerRegistry<R> {
        &self.handlers
    }

    /// The canonical header sequence for a table: the recipe's discovered
    /// labels, or the pre-declared list when it discovers none, each passed
    /// through translation.
    pub(crate) fn resolve_headers(&self, table: &R::Table) -> Vec<String> {
        let raw = self
            .recipe
            .find_headers(table)
            .unwrap_or_else(|| self.headers.prepared().to_vec());
        raw.into_iter()
            .map(|label| self.headers.resolve(&label))
            .collect()
    }
}
