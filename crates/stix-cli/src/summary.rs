use std::collections::BTreeMap;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use stix_cli::pipeline::CleanResult;
use stix_model::{Decision, FieldKind};
use stix_report::ExportSummary;

const DECISIONS: [Decision; 3] = [
    Decision::Corrected,
    Decision::Cleared,
    Decision::FlaggedManual,
];

pub fn print_clean_summary(result: &CleanResult) {
    let report = &result.report;
    println!("Input: {}", result.input.display());
    println!("Output: {}", result.output.display());
    println!("Audit log: {}", result.audit_log.display());
    if !report.metadata.is_complete() {
        println!("Missing metadata: {}", report.metadata.missing.join(", "));
    }

    let mut counts: BTreeMap<(FieldKind, Decision), usize> = BTreeMap::new();
    for correction in result.audit.corrections() {
        *counts
            .entry((correction.kind, correction.decision))
            .or_default() += 1;
    }

    let mut table = Table::new();
    let mut header = vec![header_cell("Field")];
    header.extend(DECISIONS.iter().map(|decision| header_cell(decision.as_str())));
    table.set_header(header);
    apply_summary_table_style(&mut table);
    for index in 1..=DECISIONS.len() {
        align_column(&mut table, index, CellAlignment::Right);
    }
    let kinds = [
        FieldKind::Phone,
        FieldKind::Unit,
        FieldKind::StreetNumber,
        FieldKind::StreetName,
    ];
    for kind in kinds {
        let mut row = vec![Cell::new(kind.as_str()).add_attribute(Attribute::Bold)];
        for decision in DECISIONS {
            let count = counts.get(&(kind, decision)).copied().unwrap_or(0);
            row.push(count_cell(count, decision_color(decision)));
        }
        table.add_row(row);
    }
    let summary = report.summary;
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        count_cell(summary.corrected, Color::Green).add_attribute(Attribute::Bold),
        count_cell(summary.cleared, Color::Yellow).add_attribute(Attribute::Bold),
        count_cell(summary.flagged, Color::Red).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    let mut totals = Table::new();
    totals.set_header(vec![
        header_cell("Schools kept"),
        header_cell("Schools removed"),
        header_cell("Students retained"),
    ]);
    apply_table_style(&mut totals);
    totals.add_row(vec![
        Cell::new(report.counts.schools),
        count_cell(summary.schools_removed, Color::Yellow),
        Cell::new(summary.students_retained).add_attribute(Attribute::Bold),
    ]);
    println!("{totals}");
    if summary.flagged > 0 {
        println!(
            "{} field(s) need manual review; see {}",
            summary.flagged,
            result.audit_log.display()
        );
    }
}

pub fn print_export_summary(summary: &ExportSummary) {
    println!("All students: {}", summary.files.all_students.display());
    println!("Filtered students: {}", summary.files.filtered_students.display());
    println!("School counts: {}", summary.files.school_counts.display());
    println!("Grade counts: {}", summary.files.grade_counts.display());
    println!(
        "{} students in {} schools, {} matching the filter",
        summary.students, summary.schools, summary.filtered_students
    );

    let mut years = Table::new();
    years.set_header(vec![header_cell("Birth year"), header_cell("Students")]);
    apply_table_style(&mut years);
    align_column(&mut years, 1, CellAlignment::Right);
    for (year, count) in &summary.birth_years {
        years.add_row(vec![Cell::new(year), Cell::new(count)]);
    }
    println!("{years}");

    let mut grades = Table::new();
    grades.set_header(vec![
        header_cell("Grade"),
        header_cell("Students"),
        header_cell("Filtered"),
    ]);
    apply_table_style(&mut grades);
    align_column(&mut grades, 1, CellAlignment::Right);
    align_column(&mut grades, 2, CellAlignment::Right);
    for (grade, count) in &summary.grades {
        let filtered = summary.filtered_grades.get(grade).copied().unwrap_or(0);
        grades.add_row(vec![
            Cell::new(grade),
            Cell::new(count),
            count_cell(filtered, Color::Green),
        ]);
    }
    println!("{grades}");

    if !summary.filtered_schools.is_empty() {
        println!("Schools in the filtered export:");
        for school in &summary.filtered_schools {
            println!("- {school}");
        }
    }
}

fn decision_color(decision: Decision) -> Color {
    match decision {
        Decision::Kept | Decision::Corrected => Color::Green,
        Decision::Cleared => Color::Yellow,
        Decision::FlaggedManual => Color::Red,
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color)
    } else {
        dim_cell(count)
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
