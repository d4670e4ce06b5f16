//! Popularity Aggregator
//!
//! Merges the stargazer and fork histories into two cumulative series with
//! identical horizontal extents: both are anchored at the repository
//! creation date with value zero, and both receive a synthetic "now" point
//! once loading completes so the lines reach the right edge together.
//!
//! Star histories can be enormous, so the card is gated: above
//! [`LARGE_FETCH_THRESHOLD`] stars the fetch needs explicit confirmation.

use chrono::{DateTime, Utc};

use super::{DataPoint, Legend};
use crate::github::{ForkRecord, StargazerRecord};

const STARS_COLOR: &str = "#ffab00";
const FORKS_COLOR: &str = "steelblue";

/// Star count above which the fetch requires explicit confirmation
pub const LARGE_FETCH_THRESHOLD: u64 = 10_000;

/// Chart-ready output of the popularity card
#[derive(Debug, Clone, PartialEq)]
pub struct PopularitySeries {
    pub stars: Vec<DataPoint>,
    pub forks: Vec<DataPoint>,
}

impl PopularitySeries {
    pub fn series(&self) -> Vec<Vec<DataPoint>> {
        vec![self.stars.clone(), self.forks.clone()]
    }

    pub fn legends() -> Vec<Legend> {
        vec![
            Legend::new("Stars", STARS_COLOR),
            Legend::new("Forks", FORKS_COLOR),
        ]
    }
}

/// Accumulates stargazer and fork pages and derives [`PopularitySeries`]
#[derive(Debug, Default)]
pub struct PopularityAggregator {
    created_at: Option<DateTime<Utc>>,
    stars: Vec<DateTime<Utc>>,
    forks: Vec<DateTime<Utc>>,
}

impl PopularityAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchor both series at the repository creation date
    pub fn set_created_at(&mut self, created_at: DateTime<Utc>) {
        self.created_at = Some(created_at);
    }

    pub fn ingest_stars(&mut self, records: Vec<StargazerRecord>) {
        self.stars.extend(records.into_iter().map(|r| r.starred_at));
    }

    pub fn ingest_forks(&mut self, records: Vec<ForkRecord>) {
        self.forks.extend(records.into_iter().map(|r| r.forked_at));
    }

    pub fn reset(&mut self) {
        self.stars.clear();
        self.forks.clear();
    }

    pub fn star_count(&self) -> usize {
        self.stars.len()
    }

    pub fn fork_count(&self) -> usize {
        self.forks.len()
    }

    /// Derive both series. `completed` appends the synthetic now-point and
    /// should only be set once both traversals have finished; `now` is the
    /// timestamp that point carries.
    pub fn derive_at(&self, now: DateTime<Utc>, completed: bool) -> PopularitySeries {
        PopularitySeries {
            stars: self.build_series(&self.stars, now, completed),
            forks: self.build_series(&self.forks, now, completed),
        }
    }

    /// Derive with the current wall clock as the now-point
    pub fn derive(&self, completed: bool) -> PopularitySeries {
        self.derive_at(Utc::now(), completed)
    }

    fn build_series(
        &self,
        events: &[DateTime<Utc>],
        now: DateTime<Utc>,
        completed: bool,
    ) -> Vec<DataPoint> {
        let mut dates = events.to_vec();
        dates.sort();

        let mut points = Vec::with_capacity(dates.len() + 2);
        if let Some(created_at) = self.created_at {
            points.push(DataPoint::new(created_at, 0.0));
        }
        points.extend(
            dates
                .iter()
                .enumerate()
                .map(|(rank, &date)| DataPoint::new(date, (rank + 1) as f64)),
        );
        if completed {
            let last_value = points.last().map(|p| p.value).unwrap_or(0.0);
            points.push(DataPoint::new(now, last_value));
        }
        points
    }
}

/// Whether a star history of `star_count` needs explicit confirmation
pub fn requires_confirmation(star_count: u64) -> bool {
    star_count > LARGE_FETCH_THRESHOLD
}

/// Expected number of page requests for a star history of `star_count`
pub fn estimated_requests(star_count: u64) -> u64 {
    star_count / 100
}
