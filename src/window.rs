use chrono::{Local, Months, NaiveDate};

use crate::error::{MetricsError, Result};

/// Calendar range a report covers, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Parses the `months_ago` command-line argument.
///
/// Only strictly positive integers are accepted; anything else is rejected
/// before any request is made.
pub fn parse_months_ago(raw: &str) -> Result<u32> {
    let invalid = || {
        MetricsError::InvalidArgument(format!(
            "'months_ago' should be a positive integer, got '{raw}'"
        ))
    };

    let months: i64 = raw.trim().parse().map_err(|_| invalid())?;
    if months <= 0 {
        return Err(invalid());
    }

    u32::try_from(months).map_err(|_| invalid())
}

impl TimeWindow {
    /// Builds the window `[today - months_ago months, today]`.
    ///
    /// Month arithmetic is calendar based: the start keeps the day of month
    /// and clamps to the last day when the earlier month is shorter
    /// (2024-03-31 minus one month is 2024-02-29).
    pub fn months_back(today: NaiveDate, months_ago: u32) -> Result<Self> {
        if months_ago == 0 {
            return Err(MetricsError::InvalidArgument(
                "'months_ago' should be a positive integer".to_string(),
            ));
        }

        let start = today
            .checked_sub_months(Months::new(months_ago))
            .ok_or_else(|| {
                MetricsError::InvalidArgument(format!(
                    "{months_ago} months before {today} is out of range"
                ))
            })?;

        Ok(Self { start, end: today })
    }

    /// Window ending on the current local date.
    pub fn ending_today(months_ago: u32) -> Result<Self> {
        Self::months_back(Local::now().date_naive(), months_ago)
    }
}
