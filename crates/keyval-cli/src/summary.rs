use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use keyval_dictionary::hash::short_fingerprint;
use keyval_model::{ErrorKind, ValidationMode, ValidationReport};

use crate::commands::ValidateOutcome;

pub fn print_summary(outcome: &ValidateOutcome, show_errors: usize) {
    let report = &outcome.report;
    println!("Mode: {}", report.mode);
    println!(
        "Dictionary: {}",
        short_fingerprint(&report.dictionary_fingerprint)
    );
    if let Some(path) = &outcome.report_path {
        println!("Report: {}", path.display());
    }
    println!("Elapsed: {:.2}s", outcome.elapsed.as_secs_f64());

    let kinds = columns_for(report.mode);
    let mut table = Table::new();
    let mut header = vec![header_cell("File type"), header_cell("Rows")];
    header.extend(kinds.iter().map(|kind| header_cell(kind.as_str())));
    header.push(header_cell("Errors"));
    table.set_header(header);
    apply_summary_table_style(&mut table);
    for index in 1..table.column_count() {
        align_column(&mut table, index, CellAlignment::Right);
    }

    let summary = report.summary();
    let mut total_rows = 0u64;
    for (file_type, rows) in &report.rows_processed {
        total_rows += rows;
        let counts = summary.by_file_type.get(file_type);
        let count = |kind: &ErrorKind| counts.and_then(|counts| counts.get(kind)).copied();
        let mut row = vec![file_type_cell(file_type.as_str()), Cell::new(rows)];
        row.extend(kinds.iter().map(|kind| count_cell(count(kind).unwrap_or(0), kind_color(*kind))));
        let errors = counts.map_or(0, |counts| counts.values().sum());
        row.push(count_cell(errors, Color::Red));
        table.add_row(row);
    }
    // File types with errors but no streamed rows: missing or ambiguous files.
    for (file_type, counts) in &summary.by_file_type {
        if report.rows_processed.contains_key(file_type) {
            continue;
        }
        let mut row = vec![file_type_cell(file_type.as_str()), dim_cell("-")];
        row.extend(kinds.iter().map(|kind| {
            count_cell(counts.get(kind).copied().unwrap_or(0), kind_color(*kind))
        }));
        row.push(count_cell(counts.values().sum(), Color::Red));
        table.add_row(row);
    }

    let mut total = vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total_rows).add_attribute(Attribute::Bold),
    ];
    total.extend(kinds.iter().map(|kind| {
        count_cell(
            summary.by_kind.get(kind).copied().unwrap_or(0),
            kind_color(*kind),
        )
        .add_attribute(Attribute::Bold)
    }));
    total.push(count_cell(summary.total_errors, Color::Red).add_attribute(Attribute::Bold));
    table.add_row(total);
    println!("{table}");

    print_error_table(report, show_errors);
    if report.is_valid() {
        println!("Submission is valid.");
    } else if report.is_fatal() {
        eprintln!("Submission rejected: structural errors stopped validation.");
    } else {
        eprintln!("Submission has {} key errors.", report.error_count());
    }
}

fn print_error_table(report: &ValidationReport, limit: usize) {
    if report.errors.is_empty() || limit == 0 {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Kind"),
        header_cell("File"),
        header_cell("Line"),
        header_cell("Fields"),
        header_cell("Key"),
        header_cell("Detail"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    for error in report.errors.iter().take(limit) {
        let line = error
            .line_number
            .map_or_else(|| dim_cell("-"), Cell::new);
        let key = error
            .key
            .as_ref()
            .map_or_else(|| dim_cell("-"), Cell::new);
        let detail = match (&error.referenced_file_type, &error.message) {
            (_, Some(message)) => Cell::new(message),
            (Some(referenced), None) => Cell::new(format!("-> {referenced}")),
            (None, None) => dim_cell("-"),
        };
        table.add_row(vec![
            Cell::new(error.error_kind).fg(kind_color(error.error_kind)),
            Cell::new(&error.file_name),
            line,
            Cell::new(error.field_names.join(", ")),
            key,
            detail,
        ]);
    }
    println!();
    if report.error_count() > limit {
        println!("Errors (first {limit} of {}):", report.error_count());
    } else {
        println!("Errors:");
    }
    println!("{table}");
}

/// Error kinds a run in `mode` can produce.
fn columns_for(mode: ValidationMode) -> Vec<ErrorKind> {
    ErrorKind::ALL
        .into_iter()
        .filter(|kind| match mode {
            ValidationMode::Full => {
                !matches!(kind, ErrorKind::UniqueOriginal | ErrorKind::UniqueNew)
            }
            ValidationMode::Incremental => *kind != ErrorKind::Uniqueness,
        })
        .collect()
}

fn kind_color(kind: ErrorKind) -> Color {
    match kind {
        ErrorKind::Structural => Color::Magenta,
        ErrorKind::Surjection => Color::Yellow,
        _ => Color::Red,
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(165);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn file_type_cell(file_type: &str) -> Cell {
    Cell::new(file_type)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

pub fn flag_cell(value: bool) -> Cell {
    if value {
        Cell::new("✓")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold)
    } else {
        dim_cell("-")
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
