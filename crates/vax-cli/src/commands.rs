use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use tracing::info_span;

use vax_cli::pipeline::{OutputPaths, ReconcileResult, ingest, reconcile, write_outputs};
use vax_ingest::{load_manifest, read_raw_extract};

use crate::cli::{PreviewArgs, RunArgs};
use crate::summary::{apply_table_style, dim_cell, header_cell};

#[derive(Debug)]
pub struct RunOutcome {
    pub manifest: PathBuf,
    pub result: ReconcileResult,
    pub written: Vec<PathBuf>,
    pub strict: bool,
}

impl RunOutcome {
    /// Rejections only fail the run in strict mode.
    pub fn failed(&self) -> bool {
        self.strict && self.result.rejected_count() > 0
    }
}

pub fn run_reconcile(args: &RunArgs) -> Result<RunOutcome> {
    let span = info_span!("run", manifest = %args.manifest.display());
    let _guard = span.enter();

    let manifest = load_manifest(&args.manifest).context("load manifest")?;
    let sources = ingest(&manifest)?;
    let result = reconcile(&sources)?;
    let written = write_outputs(
        &result,
        &OutputPaths {
            table: args.output.clone(),
            summary: args.summary.clone(),
            rejections: args.rejections.clone(),
        },
    )?;
    Ok(RunOutcome {
        manifest: args.manifest.clone(),
        result,
        written,
        strict: args.strict,
    })
}

pub fn run_preview(args: &PreviewArgs) -> Result<()> {
    let extract = read_raw_extract(&args.path)
        .with_context(|| format!("read {}", args.path.display()))?;
    let shown = extract.len().min(args.rows);
    let width = extract.rows()[..shown]
        .iter()
        .map(Vec::len)
        .max()
        .unwrap_or(0);

    let mut table = Table::new();
    let mut header = vec![header_cell("row")];
    header.extend((0..width).map(|idx| header_cell(&idx.to_string())));
    table.set_header(header);
    apply_table_style(&mut table);
    for (idx, row) in extract.rows()[..shown].iter().enumerate() {
        let mut cells = vec![dim_cell(idx)];
        for col in 0..width {
            cells.push(match row.get(col) {
                Some(value) if !value.is_empty() => Cell::new(value),
                Some(_) => dim_cell("\"\""),
                None => dim_cell("-"),
            });
        }
        table.add_row(cells);
    }

    println!(
        "{}: {} rows, up to {} columns",
        extract.label(),
        extract.len(),
        extract.max_width()
    );
    println!("{table}");
    if shown < extract.len() {
        println!("... {} more rows", extract.len() - shown);
    }
    Ok(())
}
