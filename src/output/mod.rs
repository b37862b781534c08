mod csv;
mod progress;
mod styling;
mod summary;
mod tables;

pub use csv::{CsvWriter, RowSink};
pub use progress::TargetProgress;
use styling::{brand, dim};
pub use summary::{print_summary, Report};

/// Prints the `engmetrics` banner to stderr.
///
/// Shown once at startup, before any request is made.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        brand("📈 engmetrics"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Cycle Time & Deployment Frequency")
    );
}
