//! Data model for immunization survey reconciliation.
//!
//! This crate defines the types shared by ingestion, normalization and the CLI:
//!
//! - **Raw extracts**: untyped rows of cell strings as read from a source file
//! - **Column mappings**: per-source cleaning descriptors (header layout,
//!   locators, declared value transforms, sentinel deny-list)
//! - **Normalized tables**: typed `(id, enrolled, protected, year)` rows
//! - **Year summaries**: per-year enrollment/protection aggregates

pub mod error;
pub mod extract;
pub mod mapping;
pub mod summary;
pub mod table;

pub use error::{MappingError, Result};
pub use extract::RawExtract;
pub use mapping::{
    CanonicalField, ColumnMapping, DEFAULT_GROUPING_SEPARATORS, DEFAULT_MISSING_MARKERS,
    FieldSource, HeaderLayout, Locator, ValueTransform,
};
pub use summary::YearSummary;
pub use table::{NormalizedRow, NormalizedTable, TableSchema};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_schema_matches_field_order() {
        let schema = TableSchema::canonical();
        assert_eq!(schema.fields, CanonicalField::ALL.to_vec());
        assert_eq!(schema.to_string(), "id, enrolled, protected, year");
    }

    #[test]
    fn table_serializes() {
        let mut table = NormalizedTable::canonical();
        table.push_row(NormalizedRow::new("010010010", 120, 110, 2004));
        let json = serde_json::to_string(&table).expect("serialize table");
        let round: NormalizedTable = serde_json::from_str(&json).expect("deserialize table");
        assert_eq!(round.rows, table.rows);
        assert_eq!(round.schema, table.schema);
    }
}
