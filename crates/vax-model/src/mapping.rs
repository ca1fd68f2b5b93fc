//! Per-source column mapping descriptors.
//!
//! A [`ColumnMapping`] declares how one raw extract's layout maps onto the
//! canonical `(id, enrolled, protected, year)` schema. Layout differences
//! between sources are expressed with a small closed set of tagged variants
//! ([`HeaderLayout`], [`FieldSource`], [`Locator`], [`ValueTransform`]) so
//! that every cleaning decision is reviewable configuration.
//!
//! # Example (JSON)
//!
//! ```json
//! {
//!   "layout": { "kind": "named_header", "header_row": 0 },
//!   "data_start_row": 2,
//!   "fields": {
//!     "id": { "kind": "column", "locator": { "name": "RCDTS" },
//!             "transforms": [{ "op": "drop_suffix", "width": 4 }] },
//!     "enrolled": { "kind": "column", "locator": { "name": "Enrollment" } },
//!     "protected": { "kind": "column", "locator": { "index": 5 } },
//!     "year": { "kind": "constant", "value": "2004" }
//!   },
//!   "deny_ids": ["999999999"]
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{MappingError, Result};

/// Cell values treated as blank in addition to empty cells.
pub const DEFAULT_MISSING_MARKERS: &[&str] = &["", "NA", "N/A", "*"];

/// Characters removed from numeric cells before integer parsing.
pub const DEFAULT_GROUPING_SEPARATORS: &[char] = &[','];

/// Target fields of the normalized schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Id,
    Enrolled,
    Protected,
    Year,
}

impl CanonicalField {
    /// All canonical fields in schema order.
    pub const ALL: [CanonicalField; 4] = [Self::Id, Self::Enrolled, Self::Protected, Self::Year];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Enrolled => "enrolled",
            Self::Protected => "protected",
            Self::Year => "year",
        }
    }

    /// True for the non-negative count fields.
    pub fn is_count(self) -> bool {
        matches!(self, Self::Enrolled | Self::Protected)
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a field's value lives in a source row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    /// Column name, matched against the header row (trimmed, case-insensitive).
    Name(String),
    /// Zero-based position after `skip_columns` have been discarded.
    Index(usize),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "column '{name}'"),
            Self::Index(index) => write!(f, "column #{index}"),
        }
    }
}

/// A declared transform applied to a raw cell before coercion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ValueTransform {
    /// Drop the trailing `width` characters (composite RCDTS -> district code).
    DropSuffix { width: usize },
    /// Remove every occurrence of the listed characters.
    StripChars { chars: String },
    /// Replace every occurrence of `from` with `to`.
    Replace { from: String, to: String },
}

/// Source of one canonical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldSource {
    /// Read from a column, then apply the transforms in order.
    Column {
        locator: Locator,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        transforms: Vec<ValueTransform>,
    },
    /// Same value for every row (e.g. the survey year of a file).
    Constant { value: String },
}

impl FieldSource {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Column {
            locator: Locator::Name(name.into()),
            transforms: Vec::new(),
        }
    }

    pub fn index(index: usize) -> Self {
        Self::Column {
            locator: Locator::Index(index),
            transforms: Vec::new(),
        }
    }

    pub fn constant(value: impl Into<String>) -> Self {
        Self::Constant {
            value: value.into(),
        }
    }

    /// Appends a transform. Has no effect on constants.
    #[must_use]
    pub fn with_transform(mut self, transform: ValueTransform) -> Self {
        if let Self::Column { transforms, .. } = &mut self {
            transforms.push(transform);
        }
        self
    }

    pub fn locator(&self) -> Option<&Locator> {
        match self {
            Self::Column { locator, .. } => Some(locator),
            Self::Constant { .. } => None,
        }
    }
}

/// How the header of a source is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HeaderLayout {
    /// No usable header; only index locators are allowed.
    Positional,
    /// Column names live on `header_row`, which may sit above extra
    /// non-data rows (e.g. a label row between header and data).
    NamedHeader { header_row: usize },
}

/// Cleaning descriptor for one raw extract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub layout: HeaderLayout,
    /// Leading rows discarded before data starts.
    #[serde(default)]
    pub data_start_row: usize,
    /// Leading columns discarded from every row, header included.
    #[serde(default)]
    pub skip_columns: usize,
    pub fields: BTreeMap<CanonicalField, FieldSource>,
    /// Identifiers known a priori to be corrupt.
    #[serde(default)]
    pub deny_ids: BTreeSet<String>,
    #[serde(default = "default_missing_markers")]
    pub missing_markers: Vec<String>,
    #[serde(default = "default_grouping_separators")]
    pub grouping_separators: Vec<char>,
}

fn default_missing_markers() -> Vec<String> {
    DEFAULT_MISSING_MARKERS
        .iter()
        .map(|marker| (*marker).to_string())
        .collect()
}

fn default_grouping_separators() -> Vec<char> {
    DEFAULT_GROUPING_SEPARATORS.to_vec()
}

impl ColumnMapping {
    /// Mapping for a source without a header row.
    pub fn positional() -> Self {
        Self::with_layout(HeaderLayout::Positional, 0)
    }

    /// Mapping for a source whose column names are on `header_row`; data
    /// starts on the following row unless overridden.
    pub fn named_header(header_row: usize) -> Self {
        Self::with_layout(HeaderLayout::NamedHeader { header_row }, header_row + 1)
    }

    fn with_layout(layout: HeaderLayout, data_start_row: usize) -> Self {
        Self {
            layout,
            data_start_row,
            skip_columns: 0,
            fields: BTreeMap::new(),
            deny_ids: BTreeSet::new(),
            missing_markers: default_missing_markers(),
            grouping_separators: default_grouping_separators(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: CanonicalField, source: FieldSource) -> Self {
        self.fields.insert(field, source);
        self
    }

    #[must_use]
    pub fn with_data_start_row(mut self, row: usize) -> Self {
        self.data_start_row = row;
        self
    }

    #[must_use]
    pub fn with_skip_columns(mut self, columns: usize) -> Self {
        self.skip_columns = columns;
        self
    }

    #[must_use]
    pub fn with_deny_id(mut self, id: impl Into<String>) -> Self {
        self.deny_ids.insert(id.into());
        self
    }

    #[must_use]
    pub fn with_missing_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.missing_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_grouping_separators(mut self, separators: Vec<char>) -> Self {
        self.grouping_separators = separators;
        self
    }

    pub fn source(&self, field: CanonicalField) -> Option<&FieldSource> {
        self.fields.get(&field)
    }

    pub fn header_row(&self) -> Option<usize> {
        match self.layout {
            HeaderLayout::Positional => None,
            HeaderLayout::NamedHeader { header_row } => Some(header_row),
        }
    }

    /// True if `value` (already trimmed) is blank or a declared missing marker.
    pub fn is_missing(&self, value: &str) -> bool {
        value.is_empty()
            || self
                .missing_markers
                .iter()
                .any(|marker| marker.trim().eq_ignore_ascii_case(value))
    }

    pub fn is_denied(&self, id: &str) -> bool {
        self.deny_ids.contains(id)
    }

    /// Checks the structural invariants of the descriptor.
    ///
    /// Every canonical field must resolve to exactly one locator or constant,
    /// name locators need a header row, and the header row must precede data.
    pub fn validate(&self) -> Result<()> {
        for field in CanonicalField::ALL {
            let Some(source) = self.fields.get(&field) else {
                return Err(MappingError::UnmappedField(field));
            };
            match source {
                FieldSource::Column {
                    locator: Locator::Name(name),
                    ..
                } if self.header_row().is_none() => {
                    return Err(MappingError::NameLocatorWithoutHeader {
                        field,
                        name: name.clone(),
                    });
                }
                FieldSource::Constant { value } if value.trim().is_empty() => {
                    return Err(MappingError::EmptyConstant(field));
                }
                _ => {}
            }
        }
        if let Some(header_row) = self.header_row()
            && header_row >= self.data_start_row
        {
            return Err(MappingError::HeaderAfterData {
                header_row,
                data_start_row: self.data_start_row,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(mapping: ColumnMapping) -> ColumnMapping {
        mapping
            .with_field(CanonicalField::Id, FieldSource::index(0))
            .with_field(CanonicalField::Enrolled, FieldSource::index(1))
            .with_field(CanonicalField::Protected, FieldSource::index(2))
            .with_field(CanonicalField::Year, FieldSource::constant("2005"))
    }

    #[test]
    fn complete_positional_mapping_is_valid() {
        assert_eq!(complete(ColumnMapping::positional()).validate(), Ok(()));
    }

    #[test]
    fn missing_field_is_reported() {
        let mapping = ColumnMapping::positional()
            .with_field(CanonicalField::Id, FieldSource::index(0))
            .with_field(CanonicalField::Enrolled, FieldSource::index(1));
        assert_eq!(
            mapping.validate(),
            Err(MappingError::UnmappedField(CanonicalField::Protected))
        );
    }

    #[test]
    fn name_locator_requires_header() {
        let mapping = complete(ColumnMapping::positional())
            .with_field(CanonicalField::Enrolled, FieldSource::name("Enrollment"));
        assert!(matches!(
            mapping.validate(),
            Err(MappingError::NameLocatorWithoutHeader {
                field: CanonicalField::Enrolled,
                ..
            })
        ));
    }

    #[test]
    fn header_must_precede_data() {
        let mapping = complete(ColumnMapping::named_header(2)).with_data_start_row(2);
        assert_eq!(
            mapping.validate(),
            Err(MappingError::HeaderAfterData {
                header_row: 2,
                data_start_row: 2
            })
        );
    }

    #[test]
    fn empty_constant_is_rejected() {
        let mapping = complete(ColumnMapping::positional())
            .with_field(CanonicalField::Year, FieldSource::constant("  "));
        assert_eq!(
            mapping.validate(),
            Err(MappingError::EmptyConstant(CanonicalField::Year))
        );
    }

    #[test]
    fn missing_markers_match_case_insensitively() {
        let mapping = ColumnMapping::positional();
        assert!(mapping.is_missing(""));
        assert!(mapping.is_missing("n/a"));
        assert!(mapping.is_missing("*"));
        assert!(!mapping.is_missing("0"));
    }

    #[test]
    fn transforms_are_ignored_for_constants() {
        let source =
            FieldSource::constant("2004").with_transform(ValueTransform::DropSuffix { width: 2 });
        assert_eq!(source, FieldSource::constant("2004"));
        assert!(source.locator().is_none());
    }

    #[test]
    fn named_header_defaults_data_to_next_row() {
        let mapping = ColumnMapping::named_header(0);
        assert_eq!(mapping.header_row(), Some(0));
        assert_eq!(mapping.data_start_row, 1);
    }
}
