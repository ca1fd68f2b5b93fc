//! CSV tokenization into raw extracts.

use std::borrow::Cow;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use vax_model::RawExtract;

use crate::error::{IngestError, Result};

/// Maximum file size for CSV loading (500 MB default).
pub const MAX_CSV_FILE_SIZE: u64 = 500 * 1024 * 1024;

/// Check file size before loading.
pub fn check_file_size(path: &Path) -> Result<()> {
    check_file_size_with_limit(path, MAX_CSV_FILE_SIZE)
}

/// Check file size against a custom limit.
pub fn check_file_size_with_limit(path: &Path, max_size: u64) -> Result<()> {
    let metadata = std::fs::metadata(path).map_err(|e| IngestError::open(path, e))?;

    if metadata.len() > max_size {
        return Err(IngestError::FileTooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max_size,
        });
    }

    Ok(())
}

/// Rejects UTF-16 exports by their BOM.
///
/// A UTF-8 BOM is acceptable and stripped while reading.
pub fn validate_encoding(path: &Path) -> Result<()> {
    let mut file = File::open(path).map_err(|e| IngestError::open(path, e))?;

    let mut buffer = [0u8; 2];
    let bytes_read = file.read(&mut buffer).map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    if bytes_read == 2 {
        let encoding = match buffer {
            [0xFF, 0xFE] => Some("UTF-16 LE"),
            [0xFE, 0xFF] => Some("UTF-16 BE"),
            _ => None,
        };
        if let Some(encoding) = encoding {
            return Err(IngestError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding,
            });
        }
    }

    Ok(())
}

/// Reads a CSV file into a [`RawExtract`] labelled with the file name.
///
/// No header handling happens here: every record becomes a row, ragged
/// rows are kept as they are, and cells are trimmed. Empty lines are
/// skipped by the tokenizer, so row indices count records, not lines.
pub fn read_raw_extract(path: &Path) -> Result<RawExtract> {
    check_file_size(path)?;
    validate_encoding(path)?;

    let file = File::open(path).map_err(|e| IngestError::open(path, e))?;
    let label = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let extract = read_rows(&label, file).map_err(|message| IngestError::CsvParse {
        path: path.to_path_buf(),
        message,
    })?;
    tracing::debug!(
        path = %path.display(),
        rows = extract.len(),
        width = extract.max_width(),
        "Read raw extract"
    );
    Ok(extract)
}

/// Reads CSV data from any reader; errors name `label` as the path.
pub fn read_raw_extract_from_reader<R: Read>(label: &str, reader: R) -> Result<RawExtract> {
    read_rows(label, reader).map_err(|message| IngestError::CsvParse {
        path: PathBuf::from(label),
        message,
    })
}

fn read_rows<R: Read>(label: &str, reader: R) -> std::result::Result<RawExtract, String> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut lossy_rows = 0usize;
    for record in reader.byte_records() {
        let record = record.map_err(|e| e.to_string())?;
        let mut lossy = false;
        let row: Vec<String> = record
            .iter()
            .map(|field| {
                let text = String::from_utf8_lossy(field);
                if matches!(text, Cow::Owned(_)) {
                    lossy = true;
                }
                normalize_cell(&text, rows.is_empty())
            })
            .collect();
        if lossy {
            lossy_rows += 1;
        }
        rows.push(row);
    }

    if lossy_rows > 0 {
        tracing::warn!(
            source = label,
            rows = lossy_rows,
            "Replaced invalid UTF-8 sequences while reading"
        );
    }

    Ok(RawExtract::new(label, rows))
}

fn normalize_cell(raw: &str, first_row: bool) -> String {
    let cell = if first_row {
        raw.trim_start_matches('\u{feff}')
    } else {
        raw
    };
    cell.trim().to_string()
}
