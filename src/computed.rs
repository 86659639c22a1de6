//! Stock computed-field constructors.
//!
//! Computed fields are how recipes add synthetic columns that no raw field
//! carries, such as identifiers and provenance stamps. These
//! constructors cover the common cases; anything fancier is a plain closure
//! passed to [`HandlerRegistry::computed_field`](crate::handlers::HandlerRegistry::computed_field).

use chrono::Utc;
use uuid::Uuid;

use crate::handlers::ComputedFn;
use crate::recipe::Recipe;
use crate::value::FieldValue;

/// A fixed value, repeated on every record.
///
/// Matching constants on a parent recipe and a nested recipe are the usual
/// way to link their tables, since the engine creates no linkage itself.
pub fn constant<R: Recipe>(value: FieldValue) -> ComputedFn<R> {
    Box::new(move |_recipe, _cursor| Ok(value.clone()))
}

/// The record's zero-based index within its parse call.
pub fn record_index<R: Recipe>() -> ComputedFn<R> {
    Box::new(|_recipe, cursor| Ok(FieldValue::Int(cursor.record_index as i64)))
}

/// A fresh v4 UUID string per record.
pub fn uuid_v4<R: Recipe>() -> ComputedFn<R> {
    Box::new(|_recipe, _cursor| Ok(FieldValue::String(Uuid::new_v4().to_string())))
}

/// An RFC 3339 UTC timestamp per record.
pub fn timestamp_utc<R: Recipe>() -> ComputedFn<R> {
    Box::new(|_recipe, _cursor| Ok(FieldValue::String(Utc::now().to_rfc3339())))
}
