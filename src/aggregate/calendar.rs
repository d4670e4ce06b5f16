//! Calendar Aggregator
//!
//! Buckets default-branch commits into UTC days over the trailing year and
//! zero-fills the gaps, producing the contribution-calendar series.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use super::DataPoint;
use crate::github::CommitRecord;

/// Days of history the calendar window spans, counted back from "now"
pub const WINDOW_DAYS: i64 = 365;

/// Accumulates commit pages and derives the per-day series
#[derive(Debug, Default)]
pub struct CalendarAggregator {
    counts: BTreeMap<NaiveDate, u64>,
    total: u64,
}

impl CalendarAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one arrived page of commits into the day buckets
    pub fn ingest(&mut self, records: Vec<CommitRecord>) {
        for commit in records {
            *self.counts.entry(commit.committed_at.date_naive()).or_insert(0) += 1;
            self.total += 1;
        }
    }

    pub fn reset(&mut self) {
        self.counts.clear();
        self.total = 0;
    }

    /// Commits ingested so far, regardless of window
    pub fn total_commits(&self) -> u64 {
        self.total
    }

    /// One point per day from `now - 365d` through `now`, in chronological
    /// order with zero-filled gaps. Commits outside the window are dropped.
    pub fn derive_at(&self, now: DateTime<Utc>) -> Vec<DataPoint> {
        let end = now.date_naive();
        let start = (now - Duration::days(WINDOW_DAYS)).date_naive();

        let mut points = Vec::new();
        let mut day = start;
        while day <= end {
            let count = self.counts.get(&day).copied().unwrap_or(0);
            points.push(DataPoint::new(
                day.and_time(NaiveTime::MIN).and_utc(),
                count as f64,
            ));
            match day.succ_opt() {
                Some(next) => day = next,
                None => break,
            }
        }
        points
    }

    /// Derive against the current wall clock
    pub fn derive(&self) -> Vec<DataPoint> {
        self.derive_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn commits(times: &[DateTime<Utc>]) -> Vec<CommitRecord> {
        times.iter().map(|&committed_at| CommitRecord { committed_at }).collect()
    }

    #[test]
    fn test_window_is_one_year_inclusive() {
        let agg = CalendarAggregator::new();
        let now = at(2024, 6, 15, 9);
        let points = agg.derive_at(now);

        // 365 days back plus today
        assert_eq!(points.len(), 366);
        assert_eq!(points.first().unwrap().date.date_naive(), (now - Duration::days(365)).date_naive());
        assert_eq!(points.last().unwrap().date.date_naive(), now.date_naive());
        assert!(points.iter().all(|p| p.value == 0.0));
    }

    #[test]
    fn test_commits_bucket_by_utc_day() {
        let mut agg = CalendarAggregator::new();
        let now = at(2024, 6, 15, 12);
        agg.ingest(commits(&[
            at(2024, 6, 13, 1),
            at(2024, 6, 13, 23),
            at(2024, 6, 14, 0),
        ]));

        let points = agg.derive_at(now);
        let value_on = |d: u32| {
            points
                .iter()
                .find(|p| p.date.date_naive() == NaiveDate::from_ymd_opt(2024, 6, d).unwrap())
                .map(|p| p.value)
                .unwrap()
        };
        assert_eq!(value_on(13), 2.0);
        assert_eq!(value_on(14), 1.0);
        assert_eq!(value_on(15), 0.0);
    }

    #[test]
    fn test_three_day_scenario() {
        let mut agg = CalendarAggregator::new();
        let now = at(2024, 6, 15, 12);
        // Two commits yesterday, one commit today
        agg.ingest(commits(&[at(2024, 6, 14, 8), at(2024, 6, 14, 18)]));
        agg.ingest(commits(&[at(2024, 6, 15, 7)]));

        let points = agg.derive_at(now);
        let tail: Vec<f64> = points[points.len() - 3..].iter().map(|p| p.value).collect();
        assert_eq!(tail, vec![0.0, 2.0, 1.0]);
    }

    #[test]
    fn test_out_of_window_commits_dropped() {
        let mut agg = CalendarAggregator::new();
        let now = at(2024, 6, 15, 12);
        agg.ingest(commits(&[at(2021, 1, 1, 0), at(2024, 6, 16, 0)]));

        let points = agg.derive_at(now);
        assert!(points.iter().all(|p| p.value == 0.0));
        // Still counted in the raw total
        assert_eq!(agg.total_commits(), 2);
    }

    #[test]
    fn test_points_are_chronological() {
        let agg = CalendarAggregator::new();
        let points = agg.derive_at(at(2024, 2, 1, 0));
        assert!(points.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_reset_clears_buckets() {
        let mut agg = CalendarAggregator::new();
        agg.ingest(commits(&[at(2024, 6, 14, 8)]));
        agg.reset();
        assert_eq!(agg.total_commits(), 0);
        assert!(agg.derive_at(at(2024, 6, 15, 0)).iter().all(|p| p.value == 0.0));
    }
}
