//! Raw, untyped tabular extracts.

use serde::{Deserialize, Serialize};

/// An ordered sequence of raw rows read once from an external source.
///
/// Row indices are record indices: mapping offsets (`header_row`,
/// `data_start_row`) and rejection rows all count records, not lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawExtract {
    label: String,
    rows: Vec<Vec<String>>,
}

impl RawExtract {
    pub fn new(label: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            label: label.into(),
            rows,
        }
    }

    /// Builds an extract from string slices (handy for fixtures).
    pub fn from_rows<R, C>(label: impl Into<String>, rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        Self::new(label, rows)
    }

    /// Replaces the label, keeping the rows.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Source label used in logs and reports (usually the file name).
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Widest row in the extract.
    pub fn max_width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_rows_keeps_order_and_ragged_rows() {
        let extract = RawExtract::from_rows("2004.csv", vec![vec!["a", "b", "c"], vec!["1"]]);
        assert_eq!(extract.label(), "2004.csv");
        assert_eq!(extract.len(), 2);
        assert_eq!(extract.row(1), Some(&["1".to_string()][..]));
        assert_eq!(extract.max_width(), 3);
        assert!(extract.row(2).is_none());
    }
}
