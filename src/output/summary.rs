use std::fmt::Write;

use comfy_table::Cell;

use crate::metrics::CollectionStats;

use super::styling::heading;
use super::tables::{color_coded_rows_cell, count_cell, create_cyan_header, create_table};

/// Which report a summary describes. Each report only has its own skip
/// reasons, so only those get a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    CycleTime,
    DeploymentFrequency,
}

type SkipColumn = (&'static str, fn(&CollectionStats) -> usize);

const CYCLE_TIME_COLUMNS: &[SkipColumn] = &[
    ("Duplicates", |s| s.duplicates),
    ("Not Merged", |s| s.not_merged),
    ("No Commits", |s| s.no_commits),
];

const DEPLOYMENT_COLUMNS: &[SkipColumn] = &[("Not Webhook", |s| s.not_webhook)];

impl Report {
    fn title(self) -> &'static str {
        match self {
            Report::CycleTime => "Cycle Time",
            Report::DeploymentFrequency => "Deployment Frequency",
        }
    }

    fn skip_columns(self) -> &'static [SkipColumn] {
        match self {
            Report::CycleTime => CYCLE_TIME_COLUMNS,
            Report::DeploymentFrequency => DEPLOYMENT_COLUMNS,
        }
    }
}

/// Prints per-target collection statistics to stderr.
///
/// Stdout carries the CSV report, so the summary never goes there.
pub fn print_summary(report: Report, stats: &[CollectionStats]) {
    eprintln!("{}", render_summary(report, stats));
}

fn render_summary(report: Report, stats: &[CollectionStats]) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "📊 {}", heading(report.title()));

    let columns = report.skip_columns();

    let mut labels = vec!["Target", "Pages", "Items", "Rows"];
    labels.extend(columns.iter().map(|(label, _)| *label));

    let mut table = create_table();
    table.set_header(create_cyan_header(&labels));

    for target in stats {
        let mut row = vec![
            Cell::new(&target.target),
            Cell::new(target.pages),
            Cell::new(target.items),
            color_coded_rows_cell(target.rows),
        ];
        row.extend(columns.iter().map(|(_, count)| count_cell(count(target))));
        table.add_row(row);
    }

    let total_rows: usize = stats.iter().map(|s| s.rows).sum();
    let total_skipped: usize = stats.iter().map(CollectionStats::skipped).sum();

    let _ = writeln!(output, "{table}");
    let _ = writeln!(
        output,
        "  {} rows written, {} items skipped across {} targets",
        total_rows,
        total_skipped,
        stats.len()
    );

    output
}
