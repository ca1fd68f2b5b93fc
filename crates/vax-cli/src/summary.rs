use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use vax_model::YearSummary;
use vax_normalization::{RejectionKind, RowError};

use crate::commands::RunOutcome;

/// Rejection rows printed before the remainder is elided.
const MAX_REJECTION_ROWS: usize = 20;

pub fn print_summary(outcome: &RunOutcome) {
    let result = &outcome.result;
    println!("Manifest: {}", outcome.manifest.display());
    for path in &outcome.written {
        println!("Wrote: {}", path.display());
    }

    let mut table = Table::new();
    let mut header = vec![
        header_cell("Source"),
        header_cell("Read"),
        header_cell("Accepted"),
    ];
    header.extend(RejectionKind::ALL.iter().map(|kind| header_cell(kind.as_str())));
    header.push(header_cell("Flagged"));
    table.set_header(header);
    apply_summary_table_style(&mut table);
    for index in 1..table.column_count() {
        align_column(&mut table, index, CellAlignment::Right);
    }

    let mut total_read = 0usize;
    let mut total_accepted = 0usize;
    for source in &result.sources {
        let report = &source.report;
        total_read += report.rows_read;
        total_accepted += report.rows_accepted;
        let mut row = vec![
            Cell::new(&report.source_label)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(report.rows_read),
            Cell::new(report.rows_accepted),
        ];
        row.extend(
            RejectionKind::ALL
                .iter()
                .map(|kind| count_cell(report.count(*kind), Color::Red)),
        );
        row.push(count_cell(report.flags.len(), Color::Yellow));
        table.add_row(row);
    }

    let mut totals = vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total_read).add_attribute(Attribute::Bold),
        Cell::new(total_accepted).add_attribute(Attribute::Bold),
    ];
    totals.extend(RejectionKind::ALL.iter().map(|kind| {
        let count = result
            .sources
            .iter()
            .map(|source| source.report.count(*kind))
            .sum();
        count_cell(count, Color::Red).add_attribute(Attribute::Bold)
    }));
    totals.push(count_cell(result.flagged_count(), Color::Yellow).add_attribute(Attribute::Bold));
    table.add_row(totals);
    println!("{table}");

    print_year_table(result.by_year.iter());
    print_rejection_table(outcome);
    if outcome.failed() {
        eprintln!(
            "Strict mode: {} rows rejected",
            outcome.result.rejected_count()
        );
    }
}

fn print_year_table<'a>(years: impl Iterator<Item = (&'a i32, &'a YearSummary)>) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Year"),
        header_cell("Enrolled"),
        header_cell("Protected"),
        header_cell("Coverage"),
    ]);
    apply_table_style(&mut table);
    for index in 1..4 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for (year, summary) in years {
        table.add_row(vec![
            Cell::new(year).add_attribute(Attribute::Bold),
            Cell::new(summary.sum_enrolled),
            Cell::new(summary.sum_protected),
            coverage_cell(summary.percent()),
        ]);
    }
    println!();
    println!("By year:");
    println!("{table}");
}

fn print_rejection_table(outcome: &RunOutcome) {
    let total = outcome.result.rejected_count();
    if total == 0 {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Source"),
        header_cell("Row"),
        header_cell("Kind"),
        header_cell("Detail"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    let rows = outcome.result.sources.iter().flat_map(|source| {
        source
            .report
            .rejections
            .iter()
            .map(move |rejection| (source.report.source_label.as_str(), rejection))
    });
    for (label, rejection) in rows.take(MAX_REJECTION_ROWS) {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(rejection.row),
            kind_cell(&rejection.error),
            Cell::new(rejection.error.to_string()),
        ]);
    }
    println!();
    println!("Rejections:");
    println!("{table}");
    if total > MAX_REJECTION_ROWS {
        println!(
            "... {} more (use --rejections to write the full log)",
            total - MAX_REJECTION_ROWS
        );
    }
}

fn kind_cell(error: &RowError) -> Cell {
    let cell = Cell::new(error.kind().as_str());
    match error {
        RowError::Sentinel { .. } | RowError::DuplicateKey { .. } => cell.fg(Color::Yellow),
        _ => cell.fg(Color::Red),
    }
}

fn coverage_cell(percent: f64) -> Cell {
    let cell = Cell::new(format!("{percent:.2}%"));
    if percent > 100.0 {
        cell.fg(Color::Red).add_attribute(Attribute::Bold)
    } else {
        cell
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

pub fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

pub fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
