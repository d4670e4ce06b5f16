//! Card Aggregators
//!
//! One aggregator per dashboard card. Each one folds arriving record pages
//! into an accumulated dataset and derives the chart-ready series from it.
//! Derivation is a pure function of the accumulated data: every new page
//! triggers a wholesale recomputation, never an incremental patch, so a
//! partially-loaded card always shows a consistent prefix.

pub mod calendar;
pub mod downloads;
pub mod issues;
pub mod labels;
pub mod popularity;

use chrono::{DateTime, Utc};

pub use calendar::CalendarAggregator;
pub use downloads::{DownloadsAggregator, DownloadsOrder, DownloadsSummary, ReleaseDownloads};
pub use issues::{IssuesAggregator, IssuesSeries};
pub use labels::{LabelMatrix, LabelsAggregator};
pub use popularity::{
    estimated_requests, requires_confirmation, PopularityAggregator, PopularitySeries,
    LARGE_FETCH_THRESHOLD,
};

/// One chart point: a timestamp and the value the series carries there
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataPoint {
    pub date: DateTime<Utc>,
    pub value: f64,
}

impl DataPoint {
    pub fn new(date: DateTime<Utc>, value: f64) -> Self {
        Self { date, value }
    }
}

/// Legend entry naming one series or matrix group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Legend {
    pub name: String,
    pub color: String,
}

impl Legend {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            color: color.into(),
        }
    }
}
