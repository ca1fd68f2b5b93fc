//! Error types for normalization.

use serde::Serialize;
use thiserror::Error;
use vax_model::{CanonicalField, MappingError, TableSchema};

/// Row-level problems. The row is excluded and recorded; the extract
/// carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowError {
    /// The row is too short for the field's locator.
    #[error("field '{field}': column #{position} is missing (row has {width} cells)")]
    MissingField {
        field: CanonicalField,
        position: usize,
        width: usize,
    },

    /// A required field is empty or a missing marker.
    #[error("field '{field}' is blank ('{value}')")]
    BlankField { field: CanonicalField, value: String },

    /// The cleaned value cannot be parsed; `value` is the original cell.
    #[error("field '{field}': cannot coerce '{value}'")]
    Coercion { field: CanonicalField, value: String },

    /// The identifier is on the mapping's deny-list.
    #[error("id '{id}' is a known-bad sentinel")]
    Sentinel { id: String },

    /// An earlier row in the same extract has the same `(id, year)`.
    #[error("duplicate key (id '{id}', year {year})")]
    DuplicateKey { id: String, year: i32 },
}

/// Structural problems, fatal to the operation.
#[derive(Debug, Error)]
pub enum NormalizationError {
    /// The mapping does not describe a complete layout.
    #[error("invalid mapping for {source_label}: {error}")]
    Mapping {
        source_label: String,
        #[source]
        error: MappingError,
    },

    /// The declared header row does not exist in the extract.
    #[error("{source_label}: header row {header_row} is beyond the end of the extract ({rows} rows)")]
    HeaderRowOutOfRange {
        source_label: String,
        header_row: usize,
        rows: usize,
    },

    /// A name locator matches no header cell.
    #[error("{source_label}: column '{name}' for field '{field}' is not in the header row")]
    UnknownColumn {
        source_label: String,
        field: CanonicalField,
        name: String,
    },

    /// A constant default cannot be coerced for its field.
    #[error("{source_label}: constant '{value}' is not valid for field '{field}'")]
    InvalidConstant {
        source_label: String,
        field: CanonicalField,
        value: String,
    },

    /// Concatenation inputs disagree on schema.
    #[error("schema mismatch in table {index}: expected [{expected}], found [{found}]")]
    SchemaMismatch {
        index: usize,
        expected: TableSchema,
        found: TableSchema,
    },

    /// Two concatenated rows share `(id, year)`; `index` is the table holding
    /// the later one.
    #[error("duplicate key in table {index}: id '{id}', year {year} already present")]
    DuplicateKey { index: usize, id: String, year: i32 },

    /// A year's total enrollment is zero, so its ratio is undefined.
    #[error("year {year} has zero total enrollment")]
    DivisionByZero { year: i32 },

    /// A year's total does not fit in 64 bits.
    #[error("year {year}: total {field} overflows")]
    CountOverflow { year: i32, field: CanonicalField },

    /// Frame construction failed.
    #[error("polars error: {0}")]
    PolarsError(#[from] polars::prelude::PolarsError),
}
