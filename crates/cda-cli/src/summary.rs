//! Human-readable census and run rendering.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use cda_model::ValidationSummary;

use crate::types::RunOutcome;

fn header_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

/// Render the per-kind census as a table.
pub fn render_census(summary: &ValidationSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Resource"), header_cell("Count")]);
    apply_table_style(&mut table);
    if let Some(column) = table.column_mut(1) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    for (kind, count) in &summary.counts {
        table.add_row(vec![Cell::new(kind.as_str()), Cell::new(count)]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(summary.total_resources()).add_attribute(Attribute::Bold),
    ]);
    table
}

pub fn print_summary(outcome: &RunOutcome) {
    if let Some(dir) = &outcome.output_dir {
        println!("Output: {}", dir.display());
    }
    println!("{}", render_census(&outcome.summary));

    if !outcome.run.processed.is_empty() {
        let processed: Vec<String> = outcome
            .run
            .processed
            .iter()
            .map(|(table, count)| format!("{table}={count}"))
            .collect();
        println!("Processed: {}", processed.join(", "));
    }
    if let Some(sampled) = outcome.run.sampled_subjects {
        println!("Sampled subjects: {sampled}");
    }
    if outcome.run.cancelled {
        println!("Run was cancelled before completion.");
    }

    if !outcome.run.skipped.is_empty() {
        println!("Skipped {} record(s):", outcome.run.skipped.len());
        let mut table = Table::new();
        table.set_header(vec![
            header_cell("Table"),
            header_cell("Record"),
            header_cell("Reason"),
        ]);
        apply_table_style(&mut table);
        for skip in &outcome.run.skipped {
            table.add_row(vec![
                Cell::new(&skip.table),
                Cell::new(&skip.record),
                Cell::new(&skip.reason).fg(Color::Yellow),
            ]);
        }
        println!("{table}");
    }

    if !outcome.run.warnings.is_empty() {
        println!("Field warnings: {}", outcome.run.warnings.len());
        for warning in &outcome.run.warnings {
            println!(
                "- {}/{} field `{}` value `{}`: {}",
                warning.table, warning.record, warning.field, warning.value, warning.detail
            );
        }
    }

    if outcome.summary.has_dangling() {
        eprintln!("Dangling references: {}", outcome.summary.dangling.len());
        let mut table = Table::new();
        table.set_header(vec![
            header_cell("Source"),
            header_cell("Slot"),
            header_cell("Target"),
            header_cell("Reason"),
        ]);
        apply_table_style(&mut table);
        for finding in &outcome.summary.dangling {
            table.add_row(vec![
                Cell::new(format!("{}/{}", finding.source_kind, finding.source_id)),
                Cell::new(&finding.slot),
                Cell::new(finding.target_kind.as_str()),
                Cell::new(&finding.reason).fg(Color::Red),
            ]);
        }
        eprintln!("{table}");
    }
}
