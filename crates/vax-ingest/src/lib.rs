//! Survey data ingestion utilities.
//!
//! This crate turns source files into [`vax_model::RawExtract`] values and
//! loads the manifest that pairs every source with its column mapping.
//! Tokenization is the only thing done here; cleaning is left to
//! `vax-normalization`.
//!
//! # Features
//!
//! - **CSV Loading**: Read CSV files into untyped rows (ragged rows allowed)
//! - **Encoding Checks**: Reject UTF-16 exports, strip UTF-8 BOMs
//! - **Manifests**: Load JSON manifests of `{ path, mapping }` sources
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use vax_ingest::{load_manifest, read_raw_extract};
//!
//! let manifest = load_manifest(Path::new("surveys/manifest.json"))?;
//! for source in &manifest.sources {
//!     let extract = read_raw_extract(&source.path)?;
//!     println!("{}: {} rows", extract.label(), extract.len());
//! }
//! ```

mod error;
mod manifest;
mod reader;

// === Error Types ===
pub use error::{IngestError, Result};

// === CSV Reading ===
pub use reader::{
    MAX_CSV_FILE_SIZE, check_file_size, check_file_size_with_limit, read_raw_extract,
    read_raw_extract_from_reader, validate_encoding,
};

// === Manifests ===
pub use manifest::{Manifest, SourceEntry, load_manifest, parse_manifest};
