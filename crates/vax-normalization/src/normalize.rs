//! Extract normalization.
//!
//! Applies a [`ColumnMapping`] to a [`RawExtract`] in one pass:
//!
//! 1. Resolve locators (header names to positions, constants checked once)
//! 2. Project the id and drop deny-listed sentinels
//! 3. Project the remaining fields (rows too short are rejected)
//! 4. Drop rows with a blank required field
//! 5. Apply declared transforms and coerce counts/year to integers
//! 6. Drop repeated `(id, year)` keys, flag `protected > enrolled`

use std::collections::HashSet;

use vax_model::{
    CanonicalField, ColumnMapping, FieldSource, Locator, NormalizedRow, NormalizedTable,
    RawExtract, ValueTransform,
};

use crate::coerce::{apply_transform, parse_count, parse_year};
use crate::error::{NormalizationError, RowError};
use crate::report::{EnrollmentFlag, NormalizationReport};

/// Normalized rows of one extract together with what was excluded.
#[derive(Debug, Clone)]
pub struct NormalizedExtract {
    pub table: NormalizedTable,
    pub report: NormalizationReport,
}

/// Normalizes one raw extract with its mapping.
///
/// Only mapping-level problems are errors; bad rows end up in the report's
/// rejection log.
pub fn normalize(
    extract: &RawExtract,
    mapping: &ColumnMapping,
) -> Result<NormalizedExtract, NormalizationError> {
    let source_label = extract.label();
    let span = tracing::debug_span!("normalize", source = source_label);
    let _guard = span.enter();

    mapping
        .validate()
        .map_err(|error| NormalizationError::Mapping {
            source_label: source_label.to_string(),
            error,
        })?;
    let plan = FieldPlan::resolve(extract, mapping)?;

    let mut table = NormalizedTable::canonical();
    let mut report = NormalizationReport::new(source_label);
    let mut seen: HashSet<(String, i32)> = HashSet::new();

    for (row_index, row) in extract
        .rows()
        .iter()
        .enumerate()
        .skip(mapping.data_start_row)
    {
        report.rows_read += 1;
        let cells = row.get(mapping.skip_columns..).unwrap_or(&[]);

        let result = plan.apply(cells).and_then(|normalized| {
            if seen.insert((normalized.id.clone(), normalized.year)) {
                Ok(normalized)
            } else {
                Err(RowError::DuplicateKey {
                    id: normalized.id,
                    year: normalized.year,
                })
            }
        });

        match result {
            Ok(normalized) => {
                if normalized.exceeds_enrollment() {
                    tracing::warn!(
                        row = row_index,
                        id = %normalized.id,
                        enrolled = normalized.enrolled,
                        protected = normalized.protected,
                        "Protected count exceeds enrollment"
                    );
                    report.flags.push(EnrollmentFlag {
                        row: row_index,
                        id: normalized.id.clone(),
                        enrolled: normalized.enrolled,
                        protected: normalized.protected,
                    });
                }
                table.push_row(normalized);
            }
            Err(error) => {
                tracing::warn!(row = row_index, %error, "Excluding row");
                report.reject(row_index, error);
            }
        }
    }

    report.rows_accepted = table.len();
    tracing::info!(
        source = source_label,
        read = report.rows_read,
        accepted = report.rows_accepted,
        rejected = report.rejected_count(),
        flagged = report.flags.len(),
        "Normalized extract"
    );

    Ok(NormalizedExtract { table, report })
}

/// Where each canonical field comes from, with names already resolved.
#[derive(Debug)]
enum Projection<'m> {
    Column {
        position: usize,
        transforms: &'m [ValueTransform],
    },
    Constant(&'m str),
}

impl Projection<'_> {
    fn project<'c>(&self, field: CanonicalField, cells: &'c [String]) -> Result<&'c str, RowError>
    where
        Self: 'c,
    {
        match self {
            Self::Column { position, .. } => cells
                .get(*position)
                .map(|cell| cell.trim())
                .ok_or(RowError::MissingField {
                    field,
                    position: *position,
                    width: cells.len(),
                }),
            Self::Constant(value) => Ok((*value).trim()),
        }
    }

    fn transform(&self, field: CanonicalField, raw: &str) -> Result<String, RowError> {
        let Self::Column { transforms, .. } = self else {
            return Ok(raw.to_string());
        };
        let mut value = raw.to_string();
        for transform in *transforms {
            value = apply_transform(&value, transform).ok_or_else(|| RowError::Coercion {
                field,
                value: raw.to_string(),
            })?;
        }
        Ok(value)
    }
}

struct FieldPlan<'m> {
    mapping: &'m ColumnMapping,
    id: Projection<'m>,
    enrolled: Projection<'m>,
    protected: Projection<'m>,
    year: Projection<'m>,
}

impl<'m> FieldPlan<'m> {
    fn resolve(extract: &RawExtract, mapping: &'m ColumnMapping) -> Result<Self, NormalizationError> {
        let header = match mapping.header_row() {
            Some(header_row) => {
                let row = extract.row(header_row).ok_or_else(|| {
                    NormalizationError::HeaderRowOutOfRange {
                        source_label: extract.label().to_string(),
                        header_row,
                        rows: extract.len(),
                    }
                })?;
                Some(row.get(mapping.skip_columns..).unwrap_or(&[]))
            }
            None => None,
        };

        let resolve = |field: CanonicalField| -> Result<Projection<'m>, NormalizationError> {
            let source = mapping
                .source(field)
                .ok_or_else(|| NormalizationError::Mapping {
                    source_label: extract.label().to_string(),
                    error: vax_model::MappingError::UnmappedField(field),
                })?;
            match source {
                FieldSource::Column {
                    locator,
                    transforms,
                } => {
                    let position = match locator {
                        Locator::Index(index) => *index,
                        Locator::Name(name) => header
                            .and_then(|cells| find_column(cells, name))
                            .ok_or_else(|| NormalizationError::UnknownColumn {
                                source_label: extract.label().to_string(),
                                field,
                                name: name.clone(),
                            })?,
                    };
                    tracing::debug!(%field, %locator, position, "Resolved locator");
                    Ok(Projection::Column {
                        position,
                        transforms: transforms.as_slice(),
                    })
                }
                FieldSource::Constant { value } => {
                    if !constant_is_valid(field, value, &mapping.grouping_separators) {
                        return Err(NormalizationError::InvalidConstant {
                            source_label: extract.label().to_string(),
                            field,
                            value: value.clone(),
                        });
                    }
                    Ok(Projection::Constant(value.as_str()))
                }
            }
        };

        Ok(Self {
            mapping,
            id: resolve(CanonicalField::Id)?,
            enrolled: resolve(CanonicalField::Enrolled)?,
            protected: resolve(CanonicalField::Protected)?,
            year: resolve(CanonicalField::Year)?,
        })
    }

    fn apply(&self, cells: &[String]) -> Result<NormalizedRow, RowError> {
        let raw_id = self.id.project(CanonicalField::Id, cells)?;
        self.check_sentinel(raw_id)?;

        let raw_enrolled = self.enrolled.project(CanonicalField::Enrolled, cells)?;
        let raw_protected = self.protected.project(CanonicalField::Protected, cells)?;
        let raw_year = self.year.project(CanonicalField::Year, cells)?;

        for (field, value) in [
            (CanonicalField::Id, raw_id),
            (CanonicalField::Enrolled, raw_enrolled),
            (CanonicalField::Protected, raw_protected),
            (CanonicalField::Year, raw_year),
        ] {
            if self.mapping.is_missing(value) {
                return Err(RowError::BlankField {
                    field,
                    value: value.to_string(),
                });
            }
        }

        let id = self.id.transform(CanonicalField::Id, raw_id)?;
        if id.is_empty() {
            return Err(RowError::Coercion {
                field: CanonicalField::Id,
                value: raw_id.to_string(),
            });
        }
        self.check_sentinel(&id)?;

        let enrolled = self.count(&self.enrolled, CanonicalField::Enrolled, raw_enrolled)?;
        let protected = self.count(&self.protected, CanonicalField::Protected, raw_protected)?;
        let year_text = self.year.transform(CanonicalField::Year, raw_year)?;
        let year = parse_year(&year_text, &self.mapping.grouping_separators).ok_or_else(|| {
            RowError::Coercion {
                field: CanonicalField::Year,
                value: raw_year.to_string(),
            }
        })?;

        Ok(NormalizedRow {
            id,
            enrolled,
            protected,
            year,
        })
    }

    fn count(
        &self,
        projection: &Projection<'_>,
        field: CanonicalField,
        raw: &str,
    ) -> Result<u64, RowError> {
        let value = projection.transform(field, raw)?;
        parse_count(&value, &self.mapping.grouping_separators).ok_or_else(|| RowError::Coercion {
            field,
            value: raw.to_string(),
        })
    }

    fn check_sentinel(&self, id: &str) -> Result<(), RowError> {
        if self.mapping.is_denied(id) {
            return Err(RowError::Sentinel { id: id.to_string() });
        }
        Ok(())
    }
}

fn find_column(header: &[String], name: &str) -> Option<usize> {
    let wanted = name.trim();
    header
        .iter()
        .position(|cell| cell.trim().eq_ignore_ascii_case(wanted))
}

fn constant_is_valid(field: CanonicalField, value: &str, separators: &[char]) -> bool {
    match field {
        CanonicalField::Id => !value.trim().is_empty(),
        CanonicalField::Enrolled | CanonicalField::Protected => {
            parse_count(value, separators).is_some()
        }
        CanonicalField::Year => parse_year(value, separators).is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::RejectionKind;

    fn positional_mapping() -> ColumnMapping {
        ColumnMapping::positional()
            .with_field(CanonicalField::Id, FieldSource::index(0))
            .with_field(CanonicalField::Enrolled, FieldSource::index(1))
            .with_field(CanonicalField::Protected, FieldSource::index(2))
            .with_field(CanonicalField::Year, FieldSource::constant("2004"))
    }

    #[test]
    fn test_grouping_separators_are_removed() {
        let extract = RawExtract::from_rows("t", vec![vec!["A", "1,234", "1,200"]]);
        let result = normalize(&extract, &positional_mapping()).unwrap();

        assert_eq!(
            result.table.rows,
            vec![NormalizedRow::new("A", 1234, 1200, 2004)]
        );
        assert!(!result.report.has_rejections());
    }

    #[test]
    fn test_blank_rows_are_counted() {
        let extract = RawExtract::from_rows(
            "t",
            vec![
                vec!["A", "10", "9"],
                vec!["COUNTY", "", "40"],
                vec!["B", "NA", "3"],
                vec!["C", "5", "5"],
            ],
        );
        let result = normalize(&extract, &positional_mapping()).unwrap();

        assert_eq!(result.table.len(), 2);
        assert_eq!(result.report.count(RejectionKind::BlankField), 2);
        assert_eq!(result.report.rows_read, 4);
        assert_eq!(result.report.rejections[0].row, 1);
    }

    #[test]
    fn test_short_row_is_missing_field() {
        let extract = RawExtract::from_rows("t", vec![vec!["A", "10"]]);
        let result = normalize(&extract, &positional_mapping()).unwrap();

        assert!(result.table.is_empty());
        assert_eq!(
            result.report.rejections[0].error,
            RowError::MissingField {
                field: CanonicalField::Protected,
                position: 2,
                width: 2
            }
        );
    }

    #[test]
    fn test_coercion_failure_keeps_original_value() {
        let extract = RawExtract::from_rows("t", vec![vec!["A", "1,2x4", "3"]]);
        let result = normalize(&extract, &positional_mapping()).unwrap();

        assert!(result.table.is_empty());
        assert_eq!(
            result.report.rejections[0].error,
            RowError::Coercion {
                field: CanonicalField::Enrolled,
                value: "1,2x4".to_string()
            }
        );
    }

    #[test]
    fn test_sentinel_is_excluded_regardless_of_values() {
        let mapping = positional_mapping().with_deny_id("BAD");
        let extract = RawExtract::from_rows(
            "t",
            vec![vec!["BAD", "oops", ""], vec!["BAD"], vec!["OK", "1", "1"]],
        );
        let result = normalize(&extract, &mapping).unwrap();

        assert_eq!(result.table.rows, vec![NormalizedRow::new("OK", 1, 1, 2004)]);
        assert_eq!(result.report.count(RejectionKind::Sentinel), 2);
    }

    #[test]
    fn test_sentinel_matches_truncated_id() {
        let mapping = positional_mapping()
            .with_field(
                CanonicalField::Id,
                FieldSource::index(0).with_transform(ValueTransform::DropSuffix { width: 4 }),
            )
            .with_deny_id("12345678");
        let extract = RawExtract::from_rows(
            "t",
            vec![vec!["123456789999", "5", "5"], vec!["876543210000", "5", "5"]],
        );
        let result = normalize(&extract, &mapping).unwrap();

        assert_eq!(result.table.rows, vec![NormalizedRow::new("87654321", 5, 5, 2004)]);
        assert_eq!(result.report.count(RejectionKind::Sentinel), 1);
    }

    #[test]
    fn test_named_header_with_gap_rows_and_skipped_columns() {
        let mapping = ColumnMapping::named_header(0)
            .with_data_start_row(2)
            .with_skip_columns(1)
            .with_field(
                CanonicalField::Id,
                FieldSource::name("rcdts").with_transform(ValueTransform::DropSuffix { width: 4 }),
            )
            .with_field(CanonicalField::Enrolled, FieldSource::name("Enrollment"))
            .with_field(CanonicalField::Protected, FieldSource::index(3))
            .with_field(CanonicalField::Year, FieldSource::constant("2005"));
        let extract = RawExtract::from_rows(
            "2005.csv",
            vec![
                vec!["", "RCDTS", "Enrollment", "School", "Protected"],
                vec!["", "code", "count", "name", "count"],
                vec!["x", "010010010260001", "1,204", "Central", "1,180"],
            ],
        );
        let result = normalize(&extract, &mapping).unwrap();

        assert_eq!(
            result.table.rows,
            vec![NormalizedRow::new("01001001026", 1204, 1180, 2005)]
        );
        assert_eq!(result.report.rows_read, 1);
    }

    #[test]
    fn test_unknown_column_is_fatal() {
        let mapping = ColumnMapping::named_header(0)
            .with_field(CanonicalField::Id, FieldSource::name("RCDT"))
            .with_field(CanonicalField::Enrolled, FieldSource::name("Enrolled"))
            .with_field(CanonicalField::Protected, FieldSource::name("Missing"))
            .with_field(CanonicalField::Year, FieldSource::constant("2006"));
        let extract = RawExtract::from_rows("t", vec![vec!["RCDT", "Enrolled"]]);
        let result = normalize(&extract, &mapping);

        assert!(matches!(
            result,
            Err(NormalizationError::UnknownColumn {
                field: CanonicalField::Protected,
                ..
            })
        ));
    }

    #[test]
    fn test_header_row_out_of_range() {
        let mapping = positional_mapping();
        let mapping = ColumnMapping {
            layout: vax_model::HeaderLayout::NamedHeader { header_row: 3 },
            data_start_row: 4,
            ..mapping
        };
        let extract = RawExtract::from_rows("t", vec![vec!["A", "1", "1"]]);

        assert!(matches!(
            normalize(&extract, &mapping),
            Err(NormalizationError::HeaderRowOutOfRange { header_row: 3, rows: 1, .. })
        ));
    }

    #[test]
    fn test_invalid_constant_is_fatal() {
        let mapping =
            positional_mapping().with_field(CanonicalField::Year, FieldSource::constant("2004-05"));
        let extract = RawExtract::from_rows("t", vec![vec!["A", "1", "1"]]);

        assert!(matches!(
            normalize(&extract, &mapping),
            Err(NormalizationError::InvalidConstant {
                field: CanonicalField::Year,
                ..
            })
        ));
    }

    #[test]
    fn test_incomplete_mapping_is_fatal() {
        let mapping = ColumnMapping::positional()
            .with_field(CanonicalField::Id, FieldSource::index(0));
        let extract = RawExtract::from_rows("t", vec![vec!["A"]]);

        assert!(matches!(
            normalize(&extract, &mapping),
            Err(NormalizationError::Mapping { .. })
        ));
    }

    #[test]
    fn test_protected_above_enrolled_is_flagged_not_dropped() {
        let extract = RawExtract::from_rows("t", vec![vec!["A", "10", "12"]]);
        let result = normalize(&extract, &positional_mapping()).unwrap();

        assert_eq!(result.table.len(), 1);
        assert_eq!(result.report.flags.len(), 1);
        assert_eq!(result.report.flags[0].protected, 12);
    }

    #[test]
    fn test_duplicate_key_first_wins() {
        let extract = RawExtract::from_rows(
            "t",
            vec![vec!["A", "10", "9"], vec!["A", "20", "19"]],
        );
        let result = normalize(&extract, &positional_mapping()).unwrap();

        assert_eq!(result.table.rows, vec![NormalizedRow::new("A", 10, 9, 2004)]);
        assert_eq!(result.report.count(RejectionKind::DuplicateKey), 1);
    }

    #[test]
    fn test_year_from_column() {
        let mapping = positional_mapping().with_field(CanonicalField::Year, FieldSource::index(3));
        let extract = RawExtract::from_rows(
            "t",
            vec![vec!["A", "10", "9", "2006"], vec!["B", "10", "9", "FY06"]],
        );
        let result = normalize(&extract, &mapping).unwrap();

        assert_eq!(result.table.rows, vec![NormalizedRow::new("A", 10, 9, 2006)]);
        assert_eq!(result.report.count(RejectionKind::Coercion), 1);
    }
}
