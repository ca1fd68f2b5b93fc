//! Error types for column mapping validation.

use thiserror::Error;

use crate::mapping::CanonicalField;

/// Errors raised when a column mapping cannot describe a source layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// A canonical field has neither a locator nor a constant.
    #[error("canonical field '{0}' has no source column or constant")]
    UnmappedField(CanonicalField),

    /// A name locator was used with a layout that has no header row.
    #[error("field '{field}' refers to column '{name}' but the layout has no header row")]
    NameLocatorWithoutHeader { field: CanonicalField, name: String },

    /// The header row must precede the first data row.
    #[error("header row {header_row} is not before the first data row {data_start_row}")]
    HeaderAfterData {
        header_row: usize,
        data_start_row: usize,
    },

    /// A constant default was declared with an empty value.
    #[error("constant for field '{0}' is empty")]
    EmptyConstant(CanonicalField),
}

/// Result type for mapping operations.
pub type Result<T> = std::result::Result<T, MappingError>;
