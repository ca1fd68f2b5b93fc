//! Source manifests: which files to read and how to map each one.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vax_model::ColumnMapping;

use crate::error::{IngestError, Result};

/// A list of sources, one per survey year, in concatenation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub sources: Vec<SourceEntry>,
}

/// One source file and the cleaning descriptor for its layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEntry {
    pub path: PathBuf,
    /// Display name; defaults to the file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub mapping: ColumnMapping,
}

impl SourceEntry {
    pub fn display_label(&self) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Loads a JSON manifest from disk.
///
/// Relative source paths are resolved against the manifest's directory and
/// every mapping is validated before anything is read.
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let text = std::fs::read_to_string(path).map_err(|e| IngestError::open(path, e))?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    let manifest = parse_manifest(&text, path, base)?;
    tracing::info!(
        manifest = %path.display(),
        sources = manifest.sources.len(),
        "Loaded manifest"
    );
    Ok(manifest)
}

/// Parses manifest text; `origin` is used in errors, `base` to resolve paths.
pub fn parse_manifest(text: &str, origin: &Path, base: &Path) -> Result<Manifest> {
    let mut manifest: Manifest =
        serde_json::from_str(text).map_err(|source| IngestError::ManifestParse {
            path: origin.to_path_buf(),
            source,
        })?;

    if manifest.sources.is_empty() {
        return Err(IngestError::EmptyManifest {
            path: origin.to_path_buf(),
        });
    }

    for source in &mut manifest.sources {
        if source.path.is_relative() {
            source.path = base.join(&source.path);
        }
        source
            .mapping
            .validate()
            .map_err(|error| IngestError::InvalidMapping {
                source_path: source.path.clone(),
                error,
            })?;
    }

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vax_model::{CanonicalField, FieldSource, MappingError};

    const TWO_SOURCES: &str = r#"{
        "sources": [
            {
                "path": "2004.csv",
                "mapping": {
                    "layout": { "kind": "positional" },
                    "data_start_row": 1,
                    "fields": {
                        "id": { "kind": "column", "locator": { "index": 0 } },
                        "enrolled": { "kind": "column", "locator": { "index": 1 } },
                        "protected": { "kind": "column", "locator": { "index": 2 } },
                        "year": { "kind": "constant", "value": "2004" }
                    }
                }
            },
            {
                "path": "/abs/2005.csv",
                "label": "2005-06",
                "mapping": {
                    "layout": { "kind": "named_header", "header_row": 0 },
                    "data_start_row": 1,
                    "fields": {
                        "id": { "kind": "column", "locator": { "name": "RCDT" } },
                        "enrolled": { "kind": "column", "locator": { "name": "Enrolled" } },
                        "protected": { "kind": "column", "locator": { "name": "Protected" } },
                        "year": { "kind": "constant", "value": "2005" }
                    }
                }
            }
        ]
    }"#;

    #[test]
    fn test_parse_resolves_relative_paths() {
        let manifest =
            parse_manifest(TWO_SOURCES, Path::new("m.json"), Path::new("/surveys")).unwrap();

        assert_eq!(manifest.sources.len(), 2);
        assert_eq!(manifest.sources[0].path, PathBuf::from("/surveys/2004.csv"));
        assert_eq!(manifest.sources[1].path, PathBuf::from("/abs/2005.csv"));
        assert_eq!(manifest.sources[0].display_label(), "2004.csv");
        assert_eq!(manifest.sources[1].display_label(), "2005-06");
        assert_eq!(
            manifest.sources[1].mapping.source(CanonicalField::Id),
            Some(&FieldSource::name("RCDT"))
        );
    }

    #[test]
    fn test_empty_manifest() {
        let result = parse_manifest(r#"{ "sources": [] }"#, Path::new("m.json"), Path::new(""));
        assert!(matches!(result, Err(IngestError::EmptyManifest { .. })));
    }

    #[test]
    fn test_invalid_json() {
        let result = parse_manifest("{ not json", Path::new("m.json"), Path::new(""));
        assert!(matches!(result, Err(IngestError::ManifestParse { .. })));
    }

    #[test]
    fn test_invalid_mapping_is_rejected() {
        let text = TWO_SOURCES.replace(r#""layout": { "kind": "named_header", "header_row": 0 }"#, r#""layout": { "kind": "positional" }"#);
        let result = parse_manifest(&text, Path::new("m.json"), Path::new(""));
        assert!(matches!(
            result,
            Err(IngestError::InvalidMapping {
                error: MappingError::NameLocatorWithoutHeader { .. },
                ..
            })
        ));
    }
}
