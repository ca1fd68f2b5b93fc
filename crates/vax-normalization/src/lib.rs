//! Survey extract normalization crate.
//!
//! Reconciles raw extracts with differing header offsets, column names,
//! identifier encodings and missing-value conventions into one normalized,
//! typed, unioned table, and computes per-year aggregates.
//!
//! # Overview
//!
//! - **Normalization**: [`normalize`] applies a [`vax_model::ColumnMapping`]
//!   to a [`vax_model::RawExtract`], excluding bad rows into a rejection log
//! - **Concatenation**: [`concatenate`] unions normalized tables after
//!   checking that their schemas agree
//! - **Aggregation**: [`aggregate_by_year`] sums counts per year and
//!   computes the protected/enrolled ratio
//! - **Frames**: [`frame`] converts results to Polars `DataFrame`s
//!
//! # Example
//!
//! ```ignore
//! use vax_normalization::{aggregate_by_year, concatenate, normalize};
//!
//! let first = normalize(&extract_2004, &mapping_2004)?;
//! let second = normalize(&extract_2005, &mapping_2005)?;
//! let table = concatenate(vec![first.table, second.table])?;
//! let by_year = aggregate_by_year(&table)?;
//! ```
//!
//! # Error Policy
//!
//! - Row-level problems ([`RowError`]) exclude the row, are logged with
//!   their original value, and never abort the extract
//! - Structural problems ([`NormalizationError`]) abort the operation

mod aggregate;
mod coerce;
mod concat;
mod error;
mod normalize;
mod report;

pub mod frame;

// Error types
pub use error::{NormalizationError, RowError};

// Operations
pub use aggregate::aggregate_by_year;
pub use coerce::{apply_transform, drop_suffix, parse_count, parse_year};
pub use concat::concatenate;
pub use normalize::{NormalizedExtract, normalize};

// Reporting
pub use report::{EnrollmentFlag, NormalizationReport, Rejection, RejectionKind};
