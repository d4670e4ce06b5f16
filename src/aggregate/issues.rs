//! Issues Aggregator
//!
//! Derives the two cumulative lines of the issues card: every issue in
//! arrival order, and the closed subset ranked within itself. Both series
//! key their points by the issue's creation date, so the closed line runs
//! through the dates its issues were opened, not closed.

use super::{DataPoint, Legend};
use crate::github::IssueRecord;

const OPEN_COLOR: &str = "#ff5252";
const CLOSED_COLOR: &str = "#8bc34a";

/// Chart-ready output of the issues card
#[derive(Debug, Clone, PartialEq)]
pub struct IssuesSeries {
    /// Every issue, value = 1-based arrival rank
    pub all: Vec<DataPoint>,
    /// Closed issues, value = 1-based rank within the closed subsequence.
    /// When closed issues exist but the repository has newer issues, a
    /// synthetic trailing point repeats the final rank at the date of the
    /// newest issue overall, extending the line to the right edge.
    pub closed: Vec<DataPoint>,
}

impl IssuesSeries {
    pub fn series(&self) -> Vec<Vec<DataPoint>> {
        vec![self.all.clone(), self.closed.clone()]
    }

    pub fn legends() -> Vec<Legend> {
        vec![
            Legend::new("Open issues", OPEN_COLOR),
            Legend::new("Closed issues", CLOSED_COLOR),
        ]
    }
}

/// Accumulates issue pages and derives [`IssuesSeries`]
#[derive(Debug, Default)]
pub struct IssuesAggregator {
    issues: Vec<IssueRecord>,
}

impl IssuesAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one arrived page of issues into the dataset
    pub fn ingest(&mut self, records: Vec<IssueRecord>) {
        self.issues.extend(records);
    }

    pub fn reset(&mut self) {
        self.issues.clear();
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn open_count(&self) -> usize {
        self.issues.iter().filter(|issue| !issue.closed).count()
    }

    pub fn closed_count(&self) -> usize {
        self.issues.iter().filter(|issue| issue.closed).count()
    }

    pub fn derive(&self) -> IssuesSeries {
        let all: Vec<DataPoint> = self
            .issues
            .iter()
            .enumerate()
            .map(|(rank, issue)| DataPoint::new(issue.created_at, (rank + 1) as f64))
            .collect();

        let mut closed: Vec<DataPoint> = self
            .issues
            .iter()
            .filter(|issue| issue.closed)
            .enumerate()
            .map(|(rank, issue)| DataPoint::new(issue.created_at, (rank + 1) as f64))
            .collect();

        if let (Some(last_closed), Some(last_all)) = (closed.last().copied(), all.last()) {
            if closed.len() < all.len() {
                closed.push(DataPoint::new(last_all.date, last_closed.value));
            }
        }

        IssuesSeries { all, closed }
    }
}
