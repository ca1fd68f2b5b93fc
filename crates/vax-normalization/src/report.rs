//! Per-extract normalization report and rejection log.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::RowError;

/// Category of a row rejection, for counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionKind {
    MissingField,
    BlankField,
    Coercion,
    Sentinel,
    DuplicateKey,
}

impl RejectionKind {
    pub const ALL: [RejectionKind; 5] = [
        Self::MissingField,
        Self::BlankField,
        Self::Coercion,
        Self::Sentinel,
        Self::DuplicateKey,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingField => "missing field",
            Self::BlankField => "blank field",
            Self::Coercion => "coercion",
            Self::Sentinel => "sentinel",
            Self::DuplicateKey => "duplicate key",
        }
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl RowError {
    pub fn kind(&self) -> RejectionKind {
        match self {
            Self::MissingField { .. } => RejectionKind::MissingField,
            Self::BlankField { .. } => RejectionKind::BlankField,
            Self::Coercion { .. } => RejectionKind::Coercion,
            Self::Sentinel { .. } => RejectionKind::Sentinel,
            Self::DuplicateKey { .. } => RejectionKind::DuplicateKey,
        }
    }
}

/// One excluded row. `row` is the zero-based row index in the raw extract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub row: usize,
    pub error: RowError,
}

/// A kept row whose protected count exceeds its enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrollmentFlag {
    pub row: usize,
    pub id: String,
    pub enrolled: u64,
    pub protected: u64,
}

/// Outcome of normalizing one extract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationReport {
    pub source_label: String,
    /// Data rows examined (rows after `data_start_row`).
    pub rows_read: usize,
    pub rows_accepted: usize,
    pub rejections: Vec<Rejection>,
    pub flags: Vec<EnrollmentFlag>,
}

impl NormalizationReport {
    pub fn new(source_label: impl Into<String>) -> Self {
        Self {
            source_label: source_label.into(),
            ..Self::default()
        }
    }

    pub(crate) fn reject(&mut self, row: usize, error: RowError) {
        self.rejections.push(Rejection { row, error });
    }

    pub fn rejected_count(&self) -> usize {
        self.rejections.len()
    }

    pub fn count(&self, kind: RejectionKind) -> usize {
        self.rejections
            .iter()
            .filter(|rejection| rejection.error.kind() == kind)
            .count()
    }

    pub fn counts_by_kind(&self) -> BTreeMap<RejectionKind, usize> {
        let mut counts = BTreeMap::new();
        for rejection in &self.rejections {
            *counts.entry(rejection.error.kind()).or_insert(0) += 1;
        }
        counts
    }

    pub fn has_rejections(&self) -> bool {
        !self.rejections.is_empty()
    }
}
