use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};

/// Maximum length, in characters, of the description column.
pub const DESCRIPTION_MAX_CHARS: usize = 72;

/// One pull request in the cycle time report.
///
/// Timestamps are written to CSV as RFC 3339 UTC at second precision
/// (`2024-01-03T01:00:00Z`). Older exports of this report used the
/// `2024-01-03 01:00:00 UTC` form, so compare the two by parsed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleTimeRow {
    /// Repository identifier (e.g., "owner/name")
    pub repository: String,
    pub pr_number: u64,
    /// First line of the first commit message, truncated
    pub description: String,
    /// Author date of the first commit in the pull request
    pub first_commit_on: DateTime<Utc>,
    pub merged_on: DateTime<Utc>,
    /// Calendar days between first commit and merge
    pub cycle_time_days: i64,
}

impl CycleTimeRow {
    pub fn new(
        repository: &str,
        pr_number: u64,
        commit_message: &str,
        first_commit_on: DateTime<Utc>,
        merged_on: DateTime<Utc>,
    ) -> Self {
        Self {
            repository: repository.to_string(),
            pr_number,
            description: describe_commit(commit_message),
            first_commit_on,
            merged_on,
            cycle_time_days: cycle_time_days(first_commit_on, merged_on),
        }
    }
}

/// One qualifying CI pipeline in the deployment frequency report.
///
/// Rows are never aggregated here; a day with three deploys yields three rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRow {
    pub date: NaiveDate,
    pub project: String,
    pub deploys: u32,
}

impl DeploymentRow {
    pub fn new(created_at: DateTime<Utc>, project: &str) -> Self {
        Self {
            date: created_at.date_naive(),
            project: project.to_string(),
            deploys: 1,
        }
    }
}

/// Difference in calendar days between the merge date and the first commit
/// date. Time of day is dropped before subtracting, so a commit at 23:00 and
/// a merge two days later at 01:00 count as 2 days.
pub fn cycle_time_days(first_commit_on: DateTime<Utc>, merged_on: DateTime<Utc>) -> i64 {
    (merged_on.date_naive() - first_commit_on.date_naive()).num_days()
}

/// First line of a commit message, cut to [`DESCRIPTION_MAX_CHARS`] characters.
pub fn describe_commit(message: &str) -> String {
    message
        .lines()
        .next()
        .unwrap_or_default()
        .chars()
        .take(DESCRIPTION_MAX_CHARS)
        .collect()
}

/// Pull request numbers already written for one repository.
///
/// Search pages can overlap when results change between requests; a number
/// recorded here is never projected again.
#[derive(Debug, Default)]
pub struct DedupSet {
    seen: HashSet<u64>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, number: u64) -> bool {
        self.seen.contains(&number)
    }

    /// Returns `false` if the number was already recorded.
    pub fn mark(&mut self, number: u64) -> bool {
        self.seen.insert(number)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }
}

/// Why an item fetched from a listing produced no row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Duplicate,
    NotMerged,
    NoCommits,
    NotWebhook,
}

/// Outcome of projecting one fetched item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projected<R> {
    Row(R),
    Skipped(SkipReason),
}

/// Per-target counters collected while draining a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionStats {
    /// Repository or project the counters belong to
    pub target: String,
    pub pages: usize,
    pub items: usize,
    pub rows: usize,
    pub duplicates: usize,
    pub not_merged: usize,
    pub no_commits: usize,
    pub not_webhook: usize,
}

impl CollectionStats {
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            ..Self::default()
        }
    }

    pub fn record_skip(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::Duplicate => self.duplicates += 1,
            SkipReason::NotMerged => self.not_merged += 1,
            SkipReason::NoCommits => self.no_commits += 1,
            SkipReason::NotWebhook => self.not_webhook += 1,
        }
    }

    pub fn skipped(&self) -> usize {
        self.duplicates + self.not_merged + self.no_commits + self.not_webhook
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_cycle_time_uses_calendar_days() {
        let first_commit = utc(2024, 1, 1, 23);
        let merged = utc(2024, 1, 3, 1);
        assert_eq!(cycle_time_days(first_commit, merged), 2);
    }

    #[test]
    fn test_cycle_time_same_day_is_zero() {
        assert_eq!(cycle_time_days(utc(2024, 1, 1, 0), utc(2024, 1, 1, 23)), 0);
    }

    #[test]
    fn test_cycle_time_can_be_negative() {
        // Rebased commits can carry an author date after the merge.
        assert_eq!(cycle_time_days(utc(2024, 1, 5, 12), utc(2024, 1, 3, 12)), -2);
    }

    #[test]
    fn test_describe_commit_truncates_to_72_chars() {
        let message = "x".repeat(100);
        let description = describe_commit(&message);
        assert_eq!(description.chars().count(), 72);
        assert_eq!(description, "x".repeat(72));
    }

    #[test]
    fn test_describe_commit_keeps_short_first_line() {
        let message = "Fix login redirect\n\nLonger body explaining the change";
        assert_eq!(describe_commit(message), "Fix login redirect");
    }

    #[test]
    fn test_describe_commit_truncates_on_char_boundaries() {
        let message = "é".repeat(80);
        assert_eq!(describe_commit(&message).chars().count(), 72);
    }

    #[test]
    fn test_describe_commit_empty_message() {
        assert_eq!(describe_commit(""), "");
    }

    #[test]
    fn test_dedup_set_marks_once() {
        let mut seen = DedupSet::new();
        assert!(!seen.contains(42));
        assert!(seen.mark(42));
        assert!(!seen.mark(42));
        assert!(seen.contains(42));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_deployment_row_counts_one_per_build() {
        let row = DeploymentRow::new(utc(2024, 2, 10, 18), "gh/acme/api");
        assert_eq!(row.date, NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
        assert_eq!(row.project, "gh/acme/api");
        assert_eq!(row.deploys, 1);
    }

    #[test]
    fn test_collection_stats_skips() {
        let mut stats = CollectionStats::new("acme/api");
        stats.record_skip(SkipReason::Duplicate);
        stats.record_skip(SkipReason::NotMerged);
        stats.record_skip(SkipReason::NotMerged);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.not_merged, 2);
        assert_eq!(stats.skipped(), 3);
    }
}
