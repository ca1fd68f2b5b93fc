//! Per-year aggregation.

use std::collections::BTreeMap;

use vax_model::{CanonicalField, NormalizedTable, YearSummary};

use crate::error::NormalizationError;

/// Sums enrollment and protected counts per year and computes
/// `ratio = sum_protected / sum_enrolled`.
///
/// A year whose enrollment sums to zero is an error rather than a NaN or
/// zero ratio.
pub fn aggregate_by_year(
    table: &NormalizedTable,
) -> Result<BTreeMap<i32, YearSummary>, NormalizationError> {
    let mut totals: BTreeMap<i32, (u64, u64)> = BTreeMap::new();
    for row in table {
        let (enrolled, protected) = totals.entry(row.year).or_insert((0, 0));
        *enrolled = enrolled
            .checked_add(row.enrolled)
            .ok_or(NormalizationError::CountOverflow {
                year: row.year,
                field: CanonicalField::Enrolled,
            })?;
        *protected = protected
            .checked_add(row.protected)
            .ok_or(NormalizationError::CountOverflow {
                year: row.year,
                field: CanonicalField::Protected,
            })?;
    }

    let mut summaries = BTreeMap::new();
    for (year, (sum_enrolled, sum_protected)) in totals {
        if sum_enrolled == 0 {
            return Err(NormalizationError::DivisionByZero { year });
        }
        let ratio = sum_protected as f64 / sum_enrolled as f64;
        tracing::debug!(year, sum_enrolled, sum_protected, ratio, "Aggregated year");
        summaries.insert(
            year,
            YearSummary {
                sum_enrolled,
                sum_protected,
                ratio,
            },
        );
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vax_model::NormalizedRow;

    fn table(rows: Vec<NormalizedRow>) -> NormalizedTable {
        let mut table = NormalizedTable::canonical();
        for row in rows {
            table.push_row(row);
        }
        table
    }

    #[test]
    fn test_sums_and_ratio() {
        let table = table(vec![
            NormalizedRow::new("A", 100, 90, 2004),
            NormalizedRow::new("B", 50, 40, 2004),
        ]);

        let summary = aggregate_by_year(&table).unwrap();

        assert_eq!(summary.len(), 1);
        let year = summary[&2004];
        assert_eq!(year.sum_enrolled, 150);
        assert_eq!(year.sum_protected, 130);
        assert!((year.ratio - 130.0 / 150.0).abs() < 1e-12);
    }

    #[test]
    fn test_years_are_grouped_separately() {
        let table = table(vec![
            NormalizedRow::new("A", 10, 5, 2005),
            NormalizedRow::new("A", 10, 10, 2004),
            NormalizedRow::new("B", 30, 15, 2005),
        ]);

        let summary = aggregate_by_year(&table).unwrap();

        assert_eq!(summary.keys().copied().collect::<Vec<_>>(), vec![2004, 2005]);
        assert_eq!(summary[&2005].sum_enrolled, 40);
        assert!((summary[&2005].ratio - 0.5).abs() < 1e-12);
        assert!((summary[&2004].ratio - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_enrollment_is_division_by_zero() {
        let table = table(vec![
            NormalizedRow::new("A", 10, 5, 2004),
            NormalizedRow::new("B", 0, 0, 2006),
        ]);

        assert!(matches!(
            aggregate_by_year(&table),
            Err(NormalizationError::DivisionByZero { year: 2006 })
        ));
    }

    #[test]
    fn test_overflow_is_reported() {
        let table = table(vec![
            NormalizedRow::new("A", u64::MAX, 0, 2004),
            NormalizedRow::new("B", 1, 0, 2004),
        ]);

        assert!(matches!(
            aggregate_by_year(&table),
            Err(NormalizationError::CountOverflow {
                year: 2004,
                field: CanonicalField::Enrolled
            })
        ));
    }

    #[test]
    fn test_empty_table() {
        let summary = aggregate_by_year(&NormalizedTable::canonical()).unwrap();
        assert!(summary.is_empty());
    }
}
