//! Error types for survey data ingestion.

use std::path::PathBuf;
use thiserror::Error;
use vax_model::MappingError;

/// Errors that can occur while reading sources or manifests.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Source or manifest file not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File exceeds the configured size limit.
    #[error("file {path} is {size} bytes, limit is {max_size}")]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// File uses an encoding the CSV reader cannot handle.
    #[error("unsupported encoding {encoding} in {path}")]
    UnsupportedEncoding {
        path: PathBuf,
        encoding: &'static str,
    },

    // === CSV Parsing Errors ===
    /// Tokenizer failure.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    // === Manifest Errors ===
    /// Manifest is not valid JSON or does not match the expected shape.
    #[error("failed to parse manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Manifest lists no sources.
    #[error("manifest {path} lists no sources")]
    EmptyManifest { path: PathBuf },

    /// A source's mapping is structurally invalid.
    #[error("invalid mapping for source {source_path}: {error}")]
    InvalidMapping {
        source_path: PathBuf,
        #[source]
        error: MappingError,
    },
}

impl IngestError {
    pub(crate) fn open(path: &std::path::Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::FileRead {
                path: path.to_path_buf(),
                source: err,
            }
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
