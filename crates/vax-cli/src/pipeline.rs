//! Reconciliation pipeline with explicit stages.
//!
//! The pipeline follows these stages in order:
//! 1. **Ingest**: Read every manifest source into a raw extract
//! 2. **Normalize**: Apply each source's column mapping
//! 3. **Merge**: Concatenate the fragments and aggregate by year
//! 4. **Output**: Write the normalized table, summary and rejection log
//!
//! Each stage takes the output of the previous stage and returns typed results.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, info_span};

use vax_ingest::{Manifest, SourceEntry, read_raw_extract};
use vax_model::{ColumnMapping, NormalizedTable, RawExtract, YearSummary};
use vax_normalization::frame::{summary_to_dataframe, table_to_dataframe, write_csv};
use vax_normalization::{NormalizationReport, aggregate_by_year, concatenate, normalize};

/// A raw extract paired with the mapping that cleans it.
#[derive(Debug, Clone)]
pub struct IngestedSource {
    pub path: PathBuf,
    pub extract: RawExtract,
    pub mapping: ColumnMapping,
}

/// Per-source outcome kept for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct SourceOutcome {
    pub path: PathBuf,
    pub report: NormalizationReport,
}

/// Everything a reconciliation run produced.
#[derive(Debug)]
pub struct ReconcileResult {
    pub sources: Vec<SourceOutcome>,
    pub table: NormalizedTable,
    pub by_year: BTreeMap<i32, YearSummary>,
}

impl ReconcileResult {
    pub fn rejected_count(&self) -> usize {
        self.sources
            .iter()
            .map(|source| source.report.rejected_count())
            .sum()
    }

    pub fn flagged_count(&self) -> usize {
        self.sources.iter().map(|source| source.report.flags.len()).sum()
    }
}

/// Output destinations; `None` skips that output.
#[derive(Debug, Clone, Default)]
pub struct OutputPaths {
    pub table: Option<PathBuf>,
    pub summary: Option<PathBuf>,
    pub rejections: Option<PathBuf>,
}

// =============================================================================
// Stage 1: Ingest
// =============================================================================

/// Reads every source listed in the manifest, in manifest order.
pub fn ingest(manifest: &Manifest) -> Result<Vec<IngestedSource>> {
    manifest.sources.iter().map(ingest_source).collect()
}

fn ingest_source(entry: &SourceEntry) -> Result<IngestedSource> {
    let extract = read_raw_extract(&entry.path)
        .with_context(|| format!("read {}", entry.path.display()))?
        .with_label(entry.display_label());
    debug!(
        source = %extract.label(),
        rows = extract.len(),
        width = extract.max_width(),
        "source ingested"
    );
    Ok(IngestedSource {
        path: entry.path.clone(),
        extract,
        mapping: entry.mapping.clone(),
    })
}

// =============================================================================
// Stages 2-3: Normalize and merge
// =============================================================================

/// Normalizes each source, then concatenates and aggregates the fragments.
///
/// Row-level problems end up in the per-source reports. Any structural
/// error aborts: a bad mapping, a schema mismatch, the same `(id, year)`
/// from two sources, or a year without enrollment.
pub fn reconcile(sources: &[IngestedSource]) -> Result<ReconcileResult> {
    let mut outcomes = Vec::with_capacity(sources.len());
    let mut tables = Vec::with_capacity(sources.len());
    for source in sources {
        let span = info_span!("source", label = %source.extract.label());
        let _guard = span.enter();
        let normalized = normalize(&source.extract, &source.mapping)
            .with_context(|| format!("normalize {}", source.extract.label()))?;
        tables.push(normalized.table);
        outcomes.push(SourceOutcome {
            path: source.path.clone(),
            report: normalized.report,
        });
    }

    let table = concatenate(tables).context("concatenate normalized tables")?;
    let by_year = aggregate_by_year(&table).context("aggregate by year")?;
    info!(
        sources = outcomes.len(),
        rows = table.len(),
        years = by_year.len(),
        "reconciliation complete"
    );
    Ok(ReconcileResult {
        sources: outcomes,
        table,
        by_year,
    })
}

// =============================================================================
// Stage 4: Output
// =============================================================================

/// Writes the requested outputs and returns the paths actually written.
///
/// Every file is flushed before it counts as written, so a failed final
/// write surfaces as an error.
pub fn write_outputs(result: &ReconcileResult, paths: &OutputPaths) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    if let Some(path) = &paths.table {
        let mut df = table_to_dataframe(&result.table)?;
        let mut writer = create(path)?;
        write_csv(&mut df, &mut writer).with_context(|| format!("write {}", path.display()))?;
        finish(writer, path)?;
        written.push(path.clone());
    }
    if let Some(path) = &paths.summary {
        let mut df = summary_to_dataframe(&result.by_year)?;
        let mut writer = create(path)?;
        write_csv(&mut df, &mut writer).with_context(|| format!("write {}", path.display()))?;
        finish(writer, path)?;
        written.push(path.clone());
    }
    if let Some(path) = &paths.rejections {
        let mut writer = create(path)?;
        serde_json::to_writer_pretty(&mut writer, &result.sources)
            .with_context(|| format!("write {}", path.display()))?;
        finish(writer, path)?;
        written.push(path.clone());
    }
    for path in &written {
        info!(path = %path.display(), "output written");
    }
    Ok(written)
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn finish(mut writer: BufWriter<File>, path: &Path) -> Result<()> {
    writer
        .flush()
        .with_context(|| format!("flush {}", path.display()))
}
