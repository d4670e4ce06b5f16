//! GitHub Record Types
//!
//! Typed records and page envelopes for the paginated repository queries.
//! Cursors follow the Relay connection convention: opaque strings that are
//! only meaningful together with the query parameters that produced them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifies a repository by owner and name, e.g. `angular/angular`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

/// Errors raised while validating a repository identifier
#[derive(Error, Debug, PartialEq)]
pub enum RepoIdError {
    #[error("repository owner is missing")]
    MissingOwner,
    #[error("repository name is missing")]
    MissingName,
    #[error("invalid repository path: {0} (expected owner/name)")]
    InvalidPath(String),
}

impl RepoId {
    /// Create a repository identifier, failing fast when either part is missing.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self, RepoIdError> {
        let owner = owner.into();
        let name = name.into();
        if owner.trim().is_empty() {
            return Err(RepoIdError::MissingOwner);
        }
        if name.trim().is_empty() {
            return Err(RepoIdError::MissingName);
        }
        Ok(Self { owner, name })
    }

    /// Parse an `owner/name` path as entered on the command line.
    pub fn parse(path: &str) -> Result<Self, RepoIdError> {
        match path.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() => {
                Self::new(owner, name)
            }
            _ => Err(RepoIdError::InvalidPath(path.to_string())),
        }
    }

    /// Canonical `owner/name` form, used as the cache key component.
    pub fn path(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Relay-style page information attached to every fetch result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// Whether another page can be requested with `end_cursor`
    pub has_next_page: bool,
    /// Continuation cursor for the next request, if any
    pub end_cursor: Option<String>,
}

/// One fetch result: a batch of records plus continuation state.
///
/// `total_count` is populated on the first page of a traversal only; later
/// pages carry `None` and consumers must not overwrite an already-known total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub page_info: PageInfo,
    pub total_count: Option<u64>,
}

impl<T> Page<T> {
    /// Terminal page constructor used by sources that exhaust in one batch
    pub fn last(records: Vec<T>, total_count: Option<u64>) -> Self {
        Self {
            records,
            page_info: PageInfo::default(),
            total_count,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A repository issue with the fields the issue and label cards consume
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRecord {
    pub number: u64,
    pub closed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// A single downloadable asset attached to a release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub download_count: u64,
}

/// A repository release with its assets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseRecord {
    pub name: String,
    pub tag_name: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl ReleaseRecord {
    /// Sum of download counts across all assets of this release
    pub fn download_count(&self) -> u64 {
        self.assets.iter().map(|a| a.download_count).sum()
    }
}

/// A stargazer edge; only the star timestamp is consumed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StargazerRecord {
    pub starred_at: DateTime<Utc>,
}

/// A fork; the fork creation timestamp is consumed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForkRecord {
    pub forked_at: DateTime<Utc>,
}

/// A label definition with its display colour (hex without `#`, as GitHub
/// returns it, or a full CSS colour)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A commit from the default-branch history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRecord {
    pub committed_at: DateTime<Utc>,
}

/// Single-shot repository metadata consumed by the information card and the
/// popularity gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoOverview {
    pub name_with_owner: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub homepage_url: Option<String>,
    #[serde(default)]
    pub license: Option<String>,
    pub created_at: DateTime<Utc>,
    pub pushed_at: DateTime<Utc>,
    #[serde(default)]
    pub issue_count: u64,
    #[serde(default)]
    pub pull_request_count: u64,
    #[serde(default)]
    pub fork_count: u64,
    #[serde(default)]
    pub star_count: u64,
    #[serde(default)]
    pub commit_count: u64,
    #[serde(default)]
    pub watcher_count: u64,
    #[serde(default)]
    pub release_count: u64,
    #[serde(default)]
    pub tag_count: u64,
    /// Repository size on disk, in kilobytes
    #[serde(default)]
    pub disk_usage_kb: u64,
}
