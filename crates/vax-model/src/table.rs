//! Normalized, typed tables.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mapping::CanonicalField;

/// One school (or district) record for one survey year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub id: String,
    pub enrolled: u64,
    pub protected: u64,
    pub year: i32,
}

impl NormalizedRow {
    pub fn new(id: impl Into<String>, enrolled: u64, protected: u64, year: i32) -> Self {
        Self {
            id: id.into(),
            enrolled,
            protected,
            year,
        }
    }

    /// Uniqueness key within a table.
    pub fn key(&self) -> (&str, i32) {
        (self.id.as_str(), self.year)
    }

    /// More protected students than enrolled ones; kept but flagged.
    pub fn exceeds_enrollment(&self) -> bool {
        self.protected > self.enrolled
    }
}

/// Ordered field list of a normalized table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub fields: Vec<CanonicalField>,
}

impl TableSchema {
    pub fn canonical() -> Self {
        Self {
            fields: CanonicalField::ALL.to_vec(),
        }
    }
}

impl Default for TableSchema {
    fn default() -> Self {
        Self::canonical()
    }
}

impl fmt::Display for TableSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pos, field) in self.fields.iter().enumerate() {
            if pos > 0 {
                f.write_str(", ")?;
            }
            f.write_str(field.as_str())?;
        }
        Ok(())
    }
}

/// Rows sharing one schema.
///
/// `(id, year)` is unique per table. `normalize` guarantees it for the
/// tables it builds, and `concatenate` rejects any input that breaks it.
/// Code that fills `rows` or calls [`NormalizedTable::push_row`] directly
/// must keep it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedTable {
    pub schema: TableSchema,
    pub rows: Vec<NormalizedRow>,
}

impl NormalizedTable {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn canonical() -> Self {
        Self::new(TableSchema::canonical())
    }

    /// Appends a row without checking for a repeated `(id, year)`; the
    /// caller keeps keys unique.
    pub fn push_row(&mut self, row: NormalizedRow) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NormalizedRow> {
        self.rows.iter()
    }

    /// Distinct years in first-seen order.
    pub fn years(&self) -> Vec<i32> {
        let mut years = Vec::new();
        for row in &self.rows {
            if !years.contains(&row.year) {
                years.push(row.year);
            }
        }
        years
    }
}

impl<'a> IntoIterator for &'a NormalizedTable {
    type Item = &'a NormalizedRow;
    type IntoIter = std::slice::Iter<'a, NormalizedRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_protected_above_enrolled() {
        assert!(NormalizedRow::new("A", 10, 11, 2004).exceeds_enrollment());
        assert!(!NormalizedRow::new("A", 10, 10, 2004).exceeds_enrollment());
    }

    #[test]
    fn years_in_first_seen_order() {
        let mut table = NormalizedTable::canonical();
        table.push_row(NormalizedRow::new("A", 1, 1, 2006));
        table.push_row(NormalizedRow::new("B", 1, 1, 2004));
        table.push_row(NormalizedRow::new("C", 1, 1, 2006));
        assert_eq!(table.years(), vec![2006, 2004]);
        assert_eq!(table.len(), 3);
    }
}
