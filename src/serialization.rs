//! Result export for row/column stores.
//!
//! The engine's output is already relational-shaped; this module writes it
//! out. NDJSON (one JSON object per line) suits bulk loaders, the array
//! writer suits plain JSON consumers. Both stream over any `io::Write`.

use serde::Serialize;
use std::io::Write;

use crate::tables::TableSet;
use crate::value::DataRecord;

/// One row labelled with its table name, for mixed-table NDJSON streams.
#[derive(Serialize)]
struct LabelledRow<'a> {
    table: &'a str,
    row: &'a DataRecord,
}

/// Error type for serialization operations
#[derive(Debug)]
pub enum SerializationError {
    Json(serde_json::Error),
    Io(std::io::Error),
}

impl From<serde_json::Error> for SerializationError {
    fn from(err: serde_json::Error) -> Self {
        SerializationError::Json(err)
    }
}

impl From<std::io::Error> for SerializationError {
    fn from(err: std::io::Error) -> Self {
        SerializationError::Io(err)
    }
}

impl std::fmt::Display for SerializationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SerializationError::Json(e) => write!(f, "JSON error: {}", e),
            SerializationError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for SerializationError {}

/// NDJSON (Newline Delimited JSON) writer
///
/// Writes data records as NDJSON, one JSON object per line. A whole
/// [`TableSet`] is written with each row wrapped as
/// `{"table": <name>, "row": {...}}` so rows of different tables stay
/// distinguishable in one stream.
pub struct NdjsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> NdjsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write a single row as an NDJSON line
    pub fn write_row(&mut self, row: &DataRecord) -> Result<(), SerializationError> {
        let json = serde_json::to_string(row)?;
        writeln!(self.writer, "{}", json)?;
        Ok(())
    }

    /// Write multiple rows
    pub fn write_rows(&mut self, rows: &[DataRecord]) -> Result<(), SerializationError> {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    /// Write every row of every table, labelled with its table name
    pub fn write_table_set(&mut self, tables: &TableSet) -> Result<(), SerializationError> {
        for (table, rows) in tables.iter() {
            for row in rows {
                let json = serde_json::to_string(&LabelledRow { table, row })?;
                writeln!(self.writer, "{}", json)?;
            }
        }
        Ok(())
    }

    /// Flush the underlying writer
    pub fn flush(&mut self) -> Result<(), SerializationError> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// JSON array writer
///
/// Writes rows as a streaming JSON array.
pub struct JsonArrayWriter<W: Write> {
    writer: W,
    first: bool,
}

impl<W: Write> JsonArrayWriter<W> {
    /// Create a new JSON array writer and write the opening bracket
    pub fn new(mut writer: W) -> Result<Self, SerializationError> {
        write!(writer, "[")?;
        Ok(Self {
            writer,
            first: true,
        })
    }

    /// Write a single row into the array
    pub fn write_row(&mut self, row: &DataRecord) -> Result<(), SerializationError> {
        if !self.first {
            write!(self.writer, ",")?;
        }
        self.first = false;

        let json = serde_json::to_string(row)?;
        write!(self.writer, "{}", json)?;
        Ok(())
    }

    /// Finish writing the array and close the bracket
    pub fn finish(mut self) -> Result<W, SerializationError> {
        write!(self.writer, "]")?;
        self.writer.flush()?;
        Ok(self.writer)
    }
}
