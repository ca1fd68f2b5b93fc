//! Polars `DataFrame` conversions for normalized tables and summaries.
//!
//! Frames are the hand-off format for reporting collaborators; the CLI
//! writes them as CSV.

use std::collections::BTreeMap;
use std::io::Write;

use polars::prelude::{
    Column, CsvWriter, DataFrame, IntoColumn, NamedFrom, PlSmallStr, SerWriter,
    Series,
};
use vax_model::{CanonicalField, NormalizedTable, YearSummary};

use crate::error::NormalizationError;

/// Builds a frame with one column per schema field, in schema order.
pub fn table_to_dataframe(table: &NormalizedTable) -> Result<DataFrame, NormalizationError> {
    let columns: Vec<Column> = table
        .schema
        .fields
        .iter()
        .map(|field| field_column(table, *field))
        .collect();
    Ok(DataFrame::new(columns)?)
}

fn field_column(table: &NormalizedTable, field: CanonicalField) -> Column {
    let name: PlSmallStr = field.as_str().into();
    let series = match field {
        CanonicalField::Id => {
            Series::new(name, table.iter().map(|row| row.id.as_str()).collect::<Vec<_>>())
        }
        CanonicalField::Enrolled => {
            Series::new(name, table.iter().map(|row| row.enrolled).collect::<Vec<_>>())
        }
        CanonicalField::Protected => {
            Series::new(name, table.iter().map(|row| row.protected).collect::<Vec<_>>())
        }
        CanonicalField::Year => {
            Series::new(name, table.iter().map(|row| row.year).collect::<Vec<_>>())
        }
    };
    series.into_column()
}

/// Builds a `year, sum_enrolled, sum_protected, ratio` frame ordered by year.
pub fn summary_to_dataframe(
    summary: &BTreeMap<i32, YearSummary>,
) -> Result<DataFrame, NormalizationError> {
    let years: Vec<i32> = summary.keys().copied().collect();
    let enrolled: Vec<u64> = summary.values().map(|s| s.sum_enrolled).collect();
    let protected: Vec<u64> = summary.values().map(|s| s.sum_protected).collect();
    let ratios: Vec<f64> = summary.values().map(|s| s.ratio).collect();

    let df = DataFrame::new(vec![
        Series::new("year".into(), years).into_column(),
        Series::new("sum_enrolled".into(), enrolled).into_column(),
        Series::new("sum_protected".into(), protected).into_column(),
        Series::new("ratio".into(), ratios).into_column(),
    ])?;
    Ok(df)
}

/// Writes a frame as comma-separated values with a header line.
pub fn write_csv<W: Write>(df: &mut DataFrame, writer: W) -> Result<(), NormalizationError> {
    CsvWriter::new(writer).include_header(true).finish(df)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vax_model::NormalizedRow;

    fn sample() -> NormalizedTable {
        let mut table = NormalizedTable::canonical();
        table.push_row(NormalizedRow::new("A", 100, 90, 2004));
        table.push_row(NormalizedRow::new("B", 50, 40, 2005));
        table
    }

    #[test]
    fn test_table_frame_follows_schema() {
        let df = table_to_dataframe(&sample()).unwrap();

        assert_eq!(df.height(), 2);
        let names: Vec<&str> = df
            .get_column_names()
            .into_iter()
            .map(|name| name.as_str())
            .collect();
        assert_eq!(names, vec!["id", "enrolled", "protected", "year"]);
    }

    #[test]
    fn test_write_csv() {
        let mut df = table_to_dataframe(&sample()).unwrap();
        let mut buffer = Vec::new();
        write_csv(&mut df, &mut buffer).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "id,enrolled,protected,year\nA,100,90,2004\nB,50,40,2005\n"
        );
    }

    #[test]
    fn test_summary_frame() {
        let mut summary = BTreeMap::new();
        summary.insert(
            2004,
            YearSummary {
                sum_enrolled: 150,
                sum_protected: 130,
                ratio: 130.0 / 150.0,
            },
        );
        let df = summary_to_dataframe(&summary).unwrap();

        assert_eq!(df.height(), 1);
        assert_eq!(df.width(), 4);
    }
}
