use std::borrow::Cow;
use std::io::Write;

use chrono::SecondsFormat;

use crate::error::Result;
use crate::metrics::{CycleTimeRow, DeploymentRow};

/// A row with a fixed CSV shape.
pub trait CsvRecord {
    const HEADER: &'static [&'static str];

    fn fields(&self) -> Vec<String>;
}

impl CsvRecord for CycleTimeRow {
    const HEADER: &'static [&'static str] = &[
        "Repository",
        "PR Number",
        "Description",
        "First Commit On",
        "Merged On",
        "Cycle Time",
    ];

    fn fields(&self) -> Vec<String> {
        vec![
            self.repository.clone(),
            self.pr_number.to_string(),
            self.description.clone(),
            self.first_commit_on.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.merged_on.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.cycle_time_days.to_string(),
        ]
    }
}

impl CsvRecord for DeploymentRow {
    const HEADER: &'static [&'static str] = &["date", "project", "deploys"];

    fn fields(&self) -> Vec<String> {
        vec![
            self.date.format("%Y-%m-%d").to_string(),
            self.project.clone(),
            self.deploys.to_string(),
        ]
    }
}

/// Destination for projected rows.
pub trait RowSink<R> {
    fn emit(&mut self, row: R) -> Result<()>;
}

impl<R> RowSink<R> for Vec<R> {
    fn emit(&mut self, row: R) -> Result<()> {
        self.push(row);
        Ok(())
    }
}

/// Writes rows of one record type as CSV, header first.
pub struct CsvWriter<W: Write> {
    output: W,
    header_written: bool,
}

impl<W: Write> CsvWriter<W> {
    pub fn new(output: W) -> Self {
        Self {
            output,
            header_written: false,
        }
    }

    /// Writes the header for `R` if it has not been written yet.
    ///
    /// Called up front so an empty report still carries a header line.
    pub fn write_header<R: CsvRecord>(&mut self) -> Result<()> {
        if !self.header_written {
            write_line(&mut self.output, R::HEADER.iter().copied())?;
            self.header_written = true;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.output.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.output
    }
}

impl<W: Write, R: CsvRecord> RowSink<R> for CsvWriter<W> {
    fn emit(&mut self, row: R) -> Result<()> {
        self.write_header::<R>()?;
        let fields = row.fields();
        write_line(&mut self.output, fields.iter().map(String::as_str))
    }
}

fn write_line<'a>(output: &mut dyn Write, fields: impl Iterator<Item = &'a str>) -> Result<()> {
    let line = fields.map(escape_field).collect::<Vec<_>>().join(",");
    writeln!(output, "{line}")?;
    Ok(())
}

/// Quotes a field only when it contains a delimiter, quote or line break.
fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn render<R: CsvRecord>(rows: Vec<R>) -> String {
        let mut writer = CsvWriter::new(Vec::new());
        writer.write_header::<R>().unwrap();
        for row in rows {
            writer.emit(row).unwrap();
        }
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_cycle_time_header_only_when_empty() {
        let csv = render::<CycleTimeRow>(vec![]);
        assert_eq!(
            csv,
            "Repository,PR Number,Description,First Commit On,Merged On,Cycle Time\n"
        );
    }

    #[test]
    fn test_cycle_time_row() {
        let row = CycleTimeRow::new(
            "acme/api",
            17,
            "Add retries, timeouts\n\nbody",
            Utc.with_ymd_and_hms(2024, 1, 1, 23, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 3, 1, 0, 0).unwrap(),
        );
        let csv = render(vec![row]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "acme/api,17,\"Add retries, timeouts\",2024-01-01T23:00:00Z,2024-01-03T01:00:00Z,2"
        );
    }

    #[test]
    fn test_cycle_time_timestamps_drop_sub_seconds() {
        let first_commit = Utc.with_ymd_and_hms(2024, 1, 1, 23, 0, 5).unwrap()
            + chrono::Duration::milliseconds(750);
        let row = CycleTimeRow::new(
            "acme/api",
            3,
            "Fix",
            first_commit,
            Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap(),
        );
        let fields = row.fields();
        assert_eq!(fields[3], "2024-01-01T23:00:05Z");
        assert_eq!(fields[4], "2024-01-02T08:00:00Z");
    }

    #[test]
    fn test_deployment_rows() {
        let rows = vec![
            DeploymentRow {
                date: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
                project: "gh/acme/api".to_string(),
                deploys: 1,
            },
            DeploymentRow {
                date: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
                project: "gh/acme/api".to_string(),
                deploys: 1,
            },
        ];
        let csv = render(rows);
        assert_eq!(
            csv,
            "date,project,deploys\n2024-02-10,gh/acme/api,1\n2024-02-10,gh/acme/api,1\n"
        );
    }

    #[test]
    fn test_header_written_once_without_explicit_call() {
        let mut writer = CsvWriter::new(Vec::new());
        let row = DeploymentRow {
            date: NaiveDate::from_ymd_opt(2024, 2, 10).unwrap(),
            project: "p".to_string(),
            deploys: 1,
        };
        writer.emit(row.clone()).unwrap();
        writer.emit(row).unwrap();
        let csv = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(csv.matches("date,project,deploys").count(), 1);
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
