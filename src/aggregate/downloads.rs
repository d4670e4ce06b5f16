//! Downloads Aggregator
//!
//! Ranks releases by their summed asset download counts and collapses the
//! long tail into an "Others" bucket so the pie stays readable.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::github::ReleaseRecord;

/// Releases kept individually before the tail collapses into "Others"
const MAX_RANKED_RELEASES: usize = 30;

/// One pie slice: a release and its total downloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDownloads {
    pub name: String,
    pub tag_name: String,
    pub published_at: DateTime<Utc>,
    pub download_count: u64,
}

/// How the pie orders its slices; the ranking itself is always by count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownloadsOrder {
    /// Largest download count first
    #[default]
    Count,
    /// Newest publish date first
    Date,
}

impl DownloadsOrder {
    pub fn compare(&self, a: &ReleaseDownloads, b: &ReleaseDownloads) -> Ordering {
        match self {
            DownloadsOrder::Count => b.download_count.cmp(&a.download_count),
            DownloadsOrder::Date => b.published_at.cmp(&a.published_at),
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            DownloadsOrder::Count => DownloadsOrder::Date,
            DownloadsOrder::Date => DownloadsOrder::Count,
        }
    }
}

/// Chart-ready output of the downloads card
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadsSummary {
    /// At most 30 ranked releases plus an optional trailing "Others" entry
    pub releases: Vec<ReleaseDownloads>,
    /// Sum of download counts across every release seen so far
    pub total_downloads: u64,
}

/// Accumulates release pages and derives [`DownloadsSummary`]
#[derive(Debug, Default)]
pub struct DownloadsAggregator {
    releases: Vec<ReleaseDownloads>,
}

impl DownloadsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one arrived page of releases into the dataset, summing each
    /// release's per-asset download counts
    pub fn ingest(&mut self, records: Vec<ReleaseRecord>) {
        self.releases.extend(records.into_iter().map(|release| {
            let download_count = release.download_count();
            ReleaseDownloads {
                name: release.name,
                tag_name: release.tag_name,
                published_at: release.published_at,
                download_count,
            }
        }));
    }

    pub fn reset(&mut self) {
        self.releases.clear();
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    pub fn derive(&self) -> DownloadsSummary {
        let mut ranked = self.releases.clone();
        ranked.sort_by(|a, b| {
            b.download_count
                .cmp(&a.download_count)
                .then_with(|| b.tag_name.cmp(&a.tag_name))
        });

        if ranked.len() > MAX_RANKED_RELEASES {
            let tail = ranked.split_off(MAX_RANKED_RELEASES);
            let others_count = tail.iter().map(|r| r.download_count).sum();
            // The bucket is dated at the earliest excluded publish date
            let others_date = tail
                .iter()
                .map(|r| r.published_at)
                .min()
                .unwrap_or_else(Utc::now);
            ranked.push(ReleaseDownloads {
                name: "Others".to_string(),
                tag_name: "others".to_string(),
                published_at: others_date,
                download_count: others_count,
            });
        }

        DownloadsSummary {
            releases: ranked,
            total_downloads: self.releases.iter().map(|r| r.download_count).sum(),
        }
    }
}
