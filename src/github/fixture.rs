//! Fixture Data Source
//!
//! A [`DataSource`] backed by record lists loaded from a JSON file or built
//! in memory. Records are sliced into cursor-addressed pages exactly the way
//! a paginated backend would serve them, with write-through into the shared
//! query cache, so the whole dashboard pipeline runs offline.
//!
//! Fixtures can also simulate backend misbehaviour: a required auth token,
//! an injected error at a given page, and artificial latency per request.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::cache::{QueryCache, QueryKey, QueryKind};
use super::source::{DataSource, FetchPolicy, SourceError, SourceResult};
use super::types::{
    CommitRecord, ForkRecord, IssueRecord, LabelRecord, Page, PageInfo, ReleaseRecord, RepoId,
    RepoOverview, StargazerRecord,
};

/// Default page size, matching the backend's maximum connection page
pub const DEFAULT_PAGE_SIZE: usize = 100;

const CURSOR_PREFIX: &str = "cursor:";

/// Record lists backing a fixture source, in query order: issues, stargazers,
/// forks and commits oldest first, releases newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<RepoOverview>,
    #[serde(default)]
    pub issues: Vec<IssueRecord>,
    #[serde(default)]
    pub releases: Vec<ReleaseRecord>,
    #[serde(default)]
    pub stargazers: Vec<StargazerRecord>,
    #[serde(default)]
    pub forks: Vec<ForkRecord>,
    #[serde(default)]
    pub labels: Vec<LabelRecord>,
    #[serde(default)]
    pub commits: Vec<CommitRecord>,
    /// When set, requests must carry `Bearer <required_token>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_token: Option<String>,
}

impl FixtureData {
    /// Load fixture records from a JSON file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture file: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse fixture file: {}", path.display()))
    }
}

/// An injected failure: serving `page_index` of `kind` returns `error`
#[derive(Debug, Clone)]
struct FailureRule {
    kind: QueryKind,
    page_index: usize,
    error: SourceError,
}

/// In-memory paginating data source. See the module docs for behaviour.
pub struct FixtureSource {
    data: FixtureData,
    page_size: usize,
    cache: Arc<QueryCache>,
    auth_header: Option<String>,
    failures: Vec<FailureRule>,
    latency: Option<Duration>,
}

impl FixtureSource {
    pub fn new(data: FixtureData, cache: Arc<QueryCache>) -> Self {
        Self {
            data,
            page_size: DEFAULT_PAGE_SIZE,
            cache,
            auth_header: None,
            failures: Vec::new(),
            latency: None,
        }
    }

    /// Load a fixture file and build a source over it
    pub fn from_file(path: &Path, cache: Arc<QueryCache>) -> anyhow::Result<Self> {
        Ok(Self::new(FixtureData::from_file(path)?, cache))
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Attach the `Authorization` header value sent with every request
    pub fn with_auth_header(mut self, header: Option<String>) -> Self {
        self.auth_header = header;
        self
    }

    /// Inject an error when serving the zero-based `page_index` of `kind`
    pub fn with_failure(mut self, kind: QueryKind, page_index: usize, error: SourceError) -> Self {
        self.failures.push(FailureRule { kind, page_index, error });
        self
    }

    /// Delay every network-backed request by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn cache(&self) -> Arc<QueryCache> {
        self.cache.clone()
    }

    fn check_auth(&self) -> SourceResult<()> {
        let Some(required) = &self.data.required_token else {
            return Ok(());
        };
        let expected = format!("Bearer {required}");
        match &self.auth_header {
            Some(header) if *header == expected => Ok(()),
            _ => Err(SourceError::auth("Bad credentials")),
        }
    }

    fn check_failure(&self, kind: QueryKind, page_index: usize) -> SourceResult<()> {
        for rule in &self.failures {
            if rule.kind == kind && rule.page_index == page_index {
                return Err(rule.error.clone());
            }
        }
        Ok(())
    }

    fn parse_cursor(cursor: Option<&str>) -> SourceResult<usize> {
        match cursor {
            None => Ok(0),
            Some(raw) => raw
                .strip_prefix(CURSOR_PREFIX)
                .and_then(|offset| offset.parse().ok())
                .ok_or_else(|| SourceError::query(format!("invalid cursor: {raw}"))),
        }
    }

    /// Slice `records` into the page addressed by `cursor`.
    ///
    /// `total_count` is attached to the first page only; later pages carry
    /// `None`, matching the query shapes the cards issue.
    fn slice_page<T: Clone>(&self, records: &[T], cursor: Option<&str>) -> SourceResult<Page<T>> {
        let start = Self::parse_cursor(cursor)?.min(records.len());
        let end = (start + self.page_size).min(records.len());
        let has_next_page = end < records.len();
        Ok(Page {
            records: records[start..end].to_vec(),
            page_info: PageInfo {
                has_next_page,
                end_cursor: has_next_page.then(|| format!("{CURSOR_PREFIX}{end}")),
            },
            total_count: (start == 0).then_some(records.len() as u64),
        })
    }

    /// Serve one paginated query honouring the fetch policy
    async fn serve<T>(
        &self,
        repo: &RepoId,
        kind: QueryKind,
        records: &[T],
        cursor: Option<&str>,
        policy: FetchPolicy,
    ) -> SourceResult<Page<T>>
    where
        T: Clone + Serialize + DeserializeOwned,
    {
        let key = QueryKey::new(repo, kind, cursor);
        if policy == FetchPolicy::CacheOnly {
            return self
                .cache
                .get(&key)
                .ok_or_else(|| SourceError::CacheMiss(key.to_string()));
        }

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.check_auth()?;

        let start = Self::parse_cursor(cursor)?;
        self.check_failure(kind, start / self.page_size)?;

        let page = self.slice_page(records, cursor)?;
        self.cache.insert(key, &page);
        Ok(page)
    }
}

#[async_trait]
impl DataSource for FixtureSource {
    async fn repository(&self, repo: &RepoId) -> SourceResult<RepoOverview> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.check_auth()?;
        let overview = self.data.repository.clone().ok_or_else(|| {
            SourceError::query(format!("Could not resolve to a Repository with the name '{repo}'"))
        })?;
        self.cache
            .insert(QueryKey::new(repo, QueryKind::Repository, None), &overview);
        Ok(overview)
    }

    async fn issues(
        &self,
        repo: &RepoId,
        cursor: Option<&str>,
        policy: FetchPolicy,
    ) -> SourceResult<Page<IssueRecord>> {
        self.serve(repo, QueryKind::Issues, &self.data.issues, cursor, policy).await
    }

    async fn releases(
        &self,
        repo: &RepoId,
        cursor: Option<&str>,
        policy: FetchPolicy,
    ) -> SourceResult<Page<ReleaseRecord>> {
        self.serve(repo, QueryKind::Releases, &self.data.releases, cursor, policy).await
    }

    async fn stargazers(
        &self,
        repo: &RepoId,
        cursor: Option<&str>,
        policy: FetchPolicy,
    ) -> SourceResult<Page<StargazerRecord>> {
        self.serve(repo, QueryKind::Stargazers, &self.data.stargazers, cursor, policy).await
    }

    async fn forks(
        &self,
        repo: &RepoId,
        cursor: Option<&str>,
        policy: FetchPolicy,
    ) -> SourceResult<Page<ForkRecord>> {
        self.serve(repo, QueryKind::Forks, &self.data.forks, cursor, policy).await
    }

    async fn labels(
        &self,
        repo: &RepoId,
        cursor: Option<&str>,
        policy: FetchPolicy,
    ) -> SourceResult<Page<LabelRecord>> {
        self.serve(repo, QueryKind::Labels, &self.data.labels, cursor, policy).await
    }

    async fn commits(
        &self,
        repo: &RepoId,
        since: DateTime<Utc>,
        cursor: Option<&str>,
        policy: FetchPolicy,
    ) -> SourceResult<Page<CommitRecord>> {
        // `since` narrows the history before pagination, so totals and
        // cursors refer to the filtered list.
        let filtered: Vec<CommitRecord> = self
            .data
            .commits
            .iter()
            .filter(|commit| commit.committed_at >= since)
            .cloned()
            .collect();
        self.serve(repo, QueryKind::Commits, &filtered, cursor, policy).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn repo() -> RepoId {
        RepoId::parse("octo/stats").unwrap()
    }

    fn stargazers(count: usize) -> Vec<StargazerRecord> {
        (0..count)
            .map(|i| StargazerRecord {
                starred_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                    + chrono::Duration::days(i as i64),
            })
            .collect()
    }

    fn source_with(data: FixtureData) -> FixtureSource {
        FixtureSource::new(data, Arc::new(QueryCache::new()))
    }

    #[tokio::test]
    async fn test_pages_split_on_boundaries() {
        let source = source_with(FixtureData {
            stargazers: stargazers(7),
            ..Default::default()
        })
        .with_page_size(3);

        let first = source
            .stargazers(&repo(), None, FetchPolicy::NetworkFirst)
            .await
            .unwrap();
        assert_eq!(first.len(), 3);
        assert_eq!(first.total_count, Some(7));
        assert!(first.page_info.has_next_page);
        let cursor = first.page_info.end_cursor.clone().unwrap();
        assert_eq!(cursor, "cursor:3");

        let second = source
            .stargazers(&repo(), Some(&cursor), FetchPolicy::NetworkFirst)
            .await
            .unwrap();
        assert_eq!(second.len(), 3);
        assert_eq!(second.total_count, None);
        assert!(second.page_info.has_next_page);

        let third = source
            .stargazers(
                &repo(),
                second.page_info.end_cursor.as_deref(),
                FetchPolicy::NetworkFirst,
            )
            .await
            .unwrap();
        assert_eq!(third.len(), 1);
        assert!(!third.page_info.has_next_page);
        assert!(third.page_info.end_cursor.is_none());
    }

    #[tokio::test]
    async fn test_empty_list_serves_one_terminal_page() {
        let source = source_with(FixtureData::default());
        let page = source
            .forks(&repo(), None, FetchPolicy::NetworkFirst)
            .await
            .unwrap();
        assert!(page.is_empty());
        assert_eq!(page.total_count, Some(0));
        assert!(!page.page_info.has_next_page);
    }

    #[tokio::test]
    async fn test_network_reads_fill_the_cache() {
        let cache = Arc::new(QueryCache::new());
        let source = FixtureSource::new(
            FixtureData { stargazers: stargazers(2), ..Default::default() },
            cache.clone(),
        );

        source
            .stargazers(&repo(), None, FetchPolicy::NetworkFirst)
            .await
            .unwrap();

        let key = QueryKey::new(&repo(), QueryKind::Stargazers, None);
        assert!(cache.contains(&key));

        let cached = source
            .stargazers(&repo(), None, FetchPolicy::CacheOnly)
            .await
            .unwrap();
        assert_eq!(cached.len(), 2);
    }

    #[tokio::test]
    async fn test_cache_only_miss() {
        let source = source_with(FixtureData {
            stargazers: stargazers(2),
            ..Default::default()
        });
        let err = source
            .stargazers(&repo(), None, FetchPolicy::CacheOnly)
            .await
            .unwrap_err();
        assert!(err.is_cache_miss());
    }

    #[tokio::test]
    async fn test_injected_failure_hits_requested_page() {
        let source = source_with(FixtureData {
            stargazers: stargazers(7),
            ..Default::default()
        })
        .with_page_size(3)
        .with_failure(QueryKind::Stargazers, 1, SourceError::query("boom"));

        let first = source
            .stargazers(&repo(), None, FetchPolicy::NetworkFirst)
            .await
            .unwrap();
        let err = source
            .stargazers(
                &repo(),
                first.page_info.end_cursor.as_deref(),
                FetchPolicy::NetworkFirst,
            )
            .await
            .unwrap_err();
        assert_eq!(err, SourceError::query("boom"));
    }

    #[tokio::test]
    async fn test_required_token_enforced() {
        let data = FixtureData {
            stargazers: stargazers(1),
            required_token: Some("s3cr3t".to_string()),
            ..Default::default()
        };

        let unauthenticated = source_with(data.clone());
        let err = unauthenticated
            .stargazers(&repo(), None, FetchPolicy::NetworkFirst)
            .await
            .unwrap_err();
        assert!(err.is_auth_failure());

        let authenticated =
            source_with(data).with_auth_header(Some("Bearer s3cr3t".to_string()));
        assert!(authenticated
            .stargazers(&repo(), None, FetchPolicy::NetworkFirst)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_commits_filtered_by_since() {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let commits = (0..5)
            .map(|i| CommitRecord { committed_at: base + chrono::Duration::days(i) })
            .collect();
        let source = source_with(FixtureData { commits, ..Default::default() });

        let page = source
            .commits(
                &repo(),
                base + chrono::Duration::days(3),
                None,
                FetchPolicy::NetworkFirst,
            )
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page.total_count, Some(2));
    }

    #[tokio::test]
    async fn test_missing_repository_is_a_query_error() {
        let source = source_with(FixtureData::default());
        let err = source.repository(&repo()).await.unwrap_err();
        assert!(matches!(err, SourceError::Query { .. }));
    }

    #[tokio::test]
    async fn test_invalid_cursor_rejected() {
        let source = source_with(FixtureData {
            stargazers: stargazers(2),
            ..Default::default()
        });
        let err = source
            .stargazers(&repo(), Some("bogus"), FetchPolicy::NetworkFirst)
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Query { .. }));
    }
}
