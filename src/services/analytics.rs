use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::str::FromStr;

use crate::database::{MetricTable, Store};

/// Reporting window accepted by the analytics endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnalyticsRange {
    Week,
    #[default]
    Month,
    Quarter,
}

impl AnalyticsRange {
    pub fn days(&self) -> i64 {
        match self {
            AnalyticsRange::Week => 7,
            AnalyticsRange::Month => 30,
            AnalyticsRange::Quarter => 90,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsRange::Week => "7d",
            AnalyticsRange::Month => "30d",
            AnalyticsRange::Quarter => "90d",
        }
    }
}

impl FromStr for AnalyticsRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7d" => Ok(AnalyticsRange::Week),
            "30d" => Ok(AnalyticsRange::Month),
            "90d" => Ok(AnalyticsRange::Quarter),
            other => Err(format!("Range must be one of 7d, 30d, 90d (got '{}')", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryMetrics {
    pub total: i64,
    pub new_in_range: i64,
    pub daily: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CategoryMetrics {
    /// Zeroed stand-in for a category whose queries failed
    pub fn failed(days: usize, error: impl Into<String>) -> Self {
        Self {
            total: 0,
            new_in_range: 0,
            daily: vec![0; days],
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsReport {
    pub range: &'static str,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub users: CategoryMetrics,
    pub partners: CategoryMetrics,
    pub jobs: CategoryMetrics,
    pub conversations: CategoryMetrics,
    pub messages: CategoryMetrics,
}

/// Spread per-day counts over `days` buckets starting at `start`.
/// Days outside the window are dropped.
pub fn bucket_by_day(counts: &[(NaiveDate, i64)], start: NaiveDate, days: usize) -> Vec<i64> {
    let mut buckets = vec![0; days];
    for (day, count) in counts {
        let offset = (*day - start).num_days();
        if offset >= 0 && (offset as usize) < days {
            buckets[offset as usize] += count;
        }
    }
    buckets
}

async fn category_metrics(
    store: &dyn Store,
    table: MetricTable,
    start: NaiveDate,
    days: usize,
) -> CategoryMetrics {
    let since = start.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();

    let (total, daily) = tokio::join!(store.count_rows(table), store.daily_counts(table, since));

    match (total, daily) {
        (Ok(total), Ok(daily)) => {
            let daily = bucket_by_day(&daily, start, days);
            CategoryMetrics {
                total,
                new_in_range: daily.iter().sum(),
                daily,
                error: None,
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!("Analytics query for {} failed: {}", table.category(), e);
            CategoryMetrics::failed(days, format!("Failed to load {} metrics", table.category()))
        }
    }
}

/// Build the report for the window ending today (UTC). Categories are
/// queried concurrently; a failed category does not fail the report.
pub async fn build_report(store: &dyn Store, range: AnalyticsRange, now: DateTime<Utc>) -> AnalyticsReport {
    let days = range.days();
    let end_date = now.date_naive();
    let start_date = end_date - Duration::days(days - 1);
    let buckets = days as usize;

    let (users, partners, jobs, conversations, messages) = tokio::join!(
        category_metrics(store, MetricTable::Users, start_date, buckets),
        category_metrics(store, MetricTable::Partners, start_date, buckets),
        category_metrics(store, MetricTable::Jobs, start_date, buckets),
        category_metrics(store, MetricTable::Conversations, start_date, buckets),
        category_metrics(store, MetricTable::Messages, start_date, buckets),
    );

    AnalyticsReport {
        range: range.as_str(),
        start_date,
        end_date,
        generated_at: now,
        users,
        partners,
        jobs,
        conversations,
        messages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn buckets_counts_by_offset_from_start() {
        let start = day(2025, 1, 30);
        let counts = vec![(day(2025, 1, 29), 9), (day(2025, 1, 30), 2), (day(2025, 2, 1), 5), (day(2025, 2, 6), 1)];
        // Jan 29 is before the window, Feb 6 is past a 7-day window
        assert_eq!(bucket_by_day(&counts, start, 7), vec![2, 0, 5, 0, 0, 0, 0]);
    }

    #[test]
    fn parses_ranges() {
        assert_eq!("7d".parse::<AnalyticsRange>().unwrap().days(), 7);
        assert_eq!("90d".parse::<AnalyticsRange>().unwrap(), AnalyticsRange::Quarter);
        assert!("1y".parse::<AnalyticsRange>().is_err());
        assert_eq!(AnalyticsRange::default().as_str(), "30d");
    }

    #[test]
    fn failed_category_is_zeroed() {
        let m = CategoryMetrics::failed(7, "boom");
        assert_eq!(m.daily, vec![0; 7]);
        assert_eq!(m.total, 0);
        assert_eq!(serde_json::to_value(&m).unwrap()["error"], "boom");
    }
}
