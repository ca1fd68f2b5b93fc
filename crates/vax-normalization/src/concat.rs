//! Row-wise union of normalized tables.

use std::collections::HashSet;

use vax_model::{NormalizedTable, TableSchema};

use crate::error::NormalizationError;

/// Concatenates tables in input order, then row order within each table.
///
/// All schemas are checked before any row is moved, so a mismatch never
/// yields a partial merge. A repeated `(id, year)` key, whether across
/// tables or inside a hand-built one, is also fatal: the merged length is
/// always the sum of the input lengths. An empty input produces an empty
/// table with the canonical schema.
pub fn concatenate<I>(tables: I) -> Result<NormalizedTable, NormalizationError>
where
    I: IntoIterator<Item = NormalizedTable>,
{
    let tables: Vec<NormalizedTable> = tables.into_iter().collect();
    let schema = tables
        .first()
        .map_or_else(TableSchema::canonical, |table| table.schema.clone());

    for (index, table) in tables.iter().enumerate().skip(1) {
        if table.schema != schema {
            return Err(NormalizationError::SchemaMismatch {
                index,
                expected: schema,
                found: table.schema.clone(),
            });
        }
    }

    let capacity = tables.iter().map(NormalizedTable::len).sum();
    let mut merged = NormalizedTable::new(schema);
    merged.rows.reserve(capacity);
    let mut seen: HashSet<(String, i32)> = HashSet::with_capacity(capacity);

    for (index, table) in tables.into_iter().enumerate() {
        for row in table.rows {
            if !seen.insert((row.id.clone(), row.year)) {
                return Err(NormalizationError::DuplicateKey {
                    index,
                    id: row.id,
                    year: row.year,
                });
            }
            merged.push_row(row);
        }
    }

    tracing::debug!(rows = merged.len(), "Concatenated tables");
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vax_model::{CanonicalField, NormalizedRow};

    fn table(rows: Vec<NormalizedRow>) -> NormalizedTable {
        NormalizedTable {
            schema: TableSchema::canonical(),
            rows,
        }
    }

    #[test]
    fn test_preserves_order_and_length() {
        let first = table(vec![
            NormalizedRow::new("A", 1, 1, 2004),
            NormalizedRow::new("B", 2, 2, 2004),
        ]);
        let second = table(vec![NormalizedRow::new("A", 3, 3, 2005)]);

        let merged = concatenate(vec![first, second]).unwrap();

        let keys: Vec<(&str, i32)> = merged.iter().map(NormalizedRow::key).collect();
        assert_eq!(keys, vec![("A", 2004), ("B", 2004), ("A", 2005)]);
    }

    #[test]
    fn test_schema_mismatch_is_fatal() {
        let first = table(vec![NormalizedRow::new("A", 1, 1, 2004)]);
        let second = NormalizedTable {
            schema: TableSchema {
                fields: vec![
                    CanonicalField::Id,
                    CanonicalField::Enrolled,
                    CanonicalField::Protected,
                ],
            },
            rows: vec![NormalizedRow::new("B", 1, 1, 2005)],
        };

        let result = concatenate(vec![first, second]);
        assert!(matches!(
            result,
            Err(NormalizationError::SchemaMismatch { index: 1, .. })
        ));
    }

    #[test]
    fn test_duplicate_key_across_tables_is_fatal() {
        let first = table(vec![NormalizedRow::new("A", 1, 1, 2004)]);
        let second = table(vec![
            NormalizedRow::new("A", 9, 9, 2004),
            NormalizedRow::new("B", 2, 2, 2004),
        ]);

        let err = concatenate(vec![first, second]).unwrap_err();
        assert!(matches!(
            &err,
            NormalizationError::DuplicateKey { index: 1, id, year: 2004 } if id == "A"
        ));
        insta::assert_snapshot!(
            err.to_string(),
            @"duplicate key in table 1: id 'A', year 2004 already present"
        );
    }

    #[test]
    fn test_duplicate_key_inside_hand_built_table_is_fatal() {
        let mut only = NormalizedTable::canonical();
        only.push_row(NormalizedRow::new("A", 1, 1, 2004));
        only.push_row(NormalizedRow::new("A", 2, 2, 2004));

        let result = concatenate(vec![only]);
        assert!(matches!(
            result,
            Err(NormalizationError::DuplicateKey { index: 0, .. })
        ));
    }

    #[test]
    fn test_empty_input() {
        let merged = concatenate(Vec::new()).unwrap();
        assert!(merged.is_empty());
        assert_eq!(merged.schema, TableSchema::canonical());
    }
}
