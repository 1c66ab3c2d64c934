//! Pure date-bucketing helpers behind the dashboard statistics endpoints.
//! Queries fetch the timestamps inside the requested window; grouping and
//! ordering happen here so the logic is testable without a database.

use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

pub const DEFAULT_WINDOW_DAYS: i64 = 30;
pub const DEFAULT_WINDOW_MONTHS: i64 = 12;
pub const BUSIEST_DAYS_LIMIT: usize = 5;
pub const DASHBOARD_ROW_LIMIT: i64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketCount {
    pub date: String,
    pub count: i64,
}

pub fn window_days(days: Option<i64>) -> i64 {
    match days {
        Some(days) if days > 0 => days,
        _ => DEFAULT_WINDOW_DAYS,
    }
}

pub fn window_months(months: Option<i64>) -> i64 {
    match months {
        Some(months) if months > 0 => months,
        _ => DEFAULT_WINDOW_MONTHS,
    }
}

/// Transcription count per calendar day, most recent day first.
pub fn daily_counts(stamps: &[NaiveDateTime]) -> Vec<BucketCount> {
    bucket_by(stamps, |stamp| stamp.format("%Y-%m-%d").to_string())
}

/// Transcription count per calendar month, most recent month first.
pub fn monthly_counts(stamps: &[NaiveDateTime]) -> Vec<BucketCount> {
    bucket_by(stamps, |stamp| stamp.format("%Y-%m").to_string())
}

/// Daily buckets ordered by count descending, truncated to the top `limit`.
/// Ties break toward the more recent day.
pub fn busiest_days(stamps: &[NaiveDateTime], limit: usize) -> Vec<BucketCount> {
    let mut buckets = daily_counts(stamps);
    buckets.sort_by(|a, b| b.count.cmp(&a.count).then(b.date.cmp(&a.date)));
    buckets.truncate(limit);
    buckets
}

fn bucket_by<F>(stamps: &[NaiveDateTime], key: F) -> Vec<BucketCount>
where
    F: Fn(&NaiveDateTime) -> String,
{
    let mut counts: BTreeMap<String, i64> = BTreeMap::new();
    for stamp in stamps {
        *counts.entry(key(stamp)).or_insert(0) += 1;
    }
    // BTreeMap iterates ascending; the dashboard wants newest first.
    counts
        .into_iter()
        .rev()
        .map(|(date, count)| BucketCount { date, count })
        .collect()
}
