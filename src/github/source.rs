//! Data Source Abstraction
//!
//! The async trait every backing store implements: one single-shot
//! repository query plus one paginated query per record shape. The dashboard
//! never talks to a transport directly, so fixtures and future HTTP clients
//! are interchangeable behind this trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::types::{
    CommitRecord, ForkRecord, IssueRecord, LabelRecord, Page, ReleaseRecord, RepoId, RepoOverview,
    StargazerRecord,
};

/// Result type for data source operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors surfaced by a data source.
///
/// Query errors carry the message list returned by the backend so a card can
/// show all of them; transport and auth failures collapse to single messages.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SourceError {
    #[error("query failed: {}", messages.join("; "))]
    Query { messages: Vec<String> },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("no cached data for {0}")]
    CacheMiss(String),
}

impl SourceError {
    /// Create a query error from a single backend message
    pub fn query<S: Into<String>>(message: S) -> Self {
        SourceError::Query { messages: vec![message.into()] }
    }

    /// Create a transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        SourceError::Transport(message.into())
    }

    /// Create an authentication error
    pub fn auth<S: Into<String>>(message: S) -> Self {
        SourceError::Auth(message.into())
    }

    /// Whether this error means the stored credentials must be discarded
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, SourceError::Auth(_))
    }

    /// Whether this error is a cache-only read that found nothing
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, SourceError::CacheMiss(_))
    }

    /// The individual messages carried by this error
    pub fn messages(&self) -> Vec<String> {
        match self {
            SourceError::Query { messages } => messages.clone(),
            other => vec![other.to_string()],
        }
    }
}

/// How a read should interact with the shared query cache.
///
/// `CacheOnly` reads never touch the transport; they serve a card that
/// depends on data a sibling card has already fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPolicy {
    /// Fetch from the backend and record the page in the shared cache
    #[default]
    NetworkFirst,
    /// Serve from the shared cache or fail with [`SourceError::CacheMiss`]
    CacheOnly,
}

/// Async access to repository statistics, one method per query shape.
///
/// Paginated methods accept an optional continuation cursor; `None` requests
/// the first page. Implementations must populate `total_count` on the first
/// page of a traversal and may omit it afterwards.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Single-shot repository metadata
    async fn repository(&self, repo: &RepoId) -> SourceResult<RepoOverview>;

    /// Issues ordered by creation date, oldest first
    async fn issues(
        &self,
        repo: &RepoId,
        cursor: Option<&str>,
        policy: FetchPolicy,
    ) -> SourceResult<Page<IssueRecord>>;

    /// Releases ordered by creation date, newest first
    async fn releases(
        &self,
        repo: &RepoId,
        cursor: Option<&str>,
        policy: FetchPolicy,
    ) -> SourceResult<Page<ReleaseRecord>>;

    /// Stargazer edges ordered by star date, oldest first
    async fn stargazers(
        &self,
        repo: &RepoId,
        cursor: Option<&str>,
        policy: FetchPolicy,
    ) -> SourceResult<Page<StargazerRecord>>;

    /// Forks ordered by creation date, oldest first
    async fn forks(
        &self,
        repo: &RepoId,
        cursor: Option<&str>,
        policy: FetchPolicy,
    ) -> SourceResult<Page<ForkRecord>>;

    /// Label definitions in repository order
    async fn labels(
        &self,
        repo: &RepoId,
        cursor: Option<&str>,
        policy: FetchPolicy,
    ) -> SourceResult<Page<LabelRecord>>;

    /// Default-branch commits at or after `since`, oldest first
    async fn commits(
        &self,
        repo: &RepoId,
        since: DateTime<Utc>,
        cursor: Option<&str>,
        policy: FetchPolicy,
    ) -> SourceResult<Page<CommitRecord>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_joins_messages() {
        let err = SourceError::Query {
            messages: vec!["first".to_string(), "second".to_string()],
        };
        assert_eq!(err.to_string(), "query failed: first; second");
        assert_eq!(err.messages(), vec!["first", "second"]);
    }

    #[test]
    fn test_error_classification() {
        assert!(SourceError::auth("bad credentials").is_auth_failure());
        assert!(!SourceError::transport("timeout").is_auth_failure());
        assert!(SourceError::CacheMiss("issues".to_string()).is_cache_miss());
        assert!(!SourceError::query("nope").is_cache_miss());
    }

    #[test]
    fn test_default_policy_is_network_first() {
        assert_eq!(FetchPolicy::default(), FetchPolicy::NetworkFirst);
    }
}
