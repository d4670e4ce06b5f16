//! Shared Query Cache
//!
//! Process-wide cache of fetched pages, keyed by repository, query shape and
//! cursor. Network-backed reads write through it; cache-only reads are served
//! from it. A watch channel carries a version counter so cache-only consumers
//! can wait for a sibling card to fetch the page they need.

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;

use super::types::RepoId;

/// The query shapes the cache distinguishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Repository,
    Issues,
    Releases,
    Stargazers,
    Forks,
    Labels,
    Commits,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::Repository => "repository",
            QueryKind::Issues => "issues",
            QueryKind::Releases => "releases",
            QueryKind::Stargazers => "stargazers",
            QueryKind::Forks => "forks",
            QueryKind::Labels => "labels",
            QueryKind::Commits => "commits",
        }
    }
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache key: one entry per (repository, query shape, cursor) triple.
/// `cursor` is `None` for the first page of a traversal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub repo: String,
    pub kind: QueryKind,
    pub cursor: Option<String>,
}

impl QueryKey {
    pub fn new(repo: &RepoId, kind: QueryKind, cursor: Option<&str>) -> Self {
        Self {
            repo: repo.path(),
            kind,
            cursor: cursor.map(|c| c.to_string()),
        }
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.cursor {
            Some(cursor) => write!(f, "{}:{}@{}", self.repo, self.kind, cursor),
            None => write!(f, "{}:{}", self.repo, self.kind),
        }
    }
}

/// Shared page cache with change notification.
///
/// Entries are stored as JSON values so one map can hold every record shape;
/// readers deserialize back into the shape they asked for. A lookup with the
/// wrong shape is a programming error and surfaces as `None`.
pub struct QueryCache {
    entries: DashMap<QueryKey, serde_json::Value>,
    version_tx: watch::Sender<u64>,
}

impl QueryCache {
    pub fn new() -> Self {
        let (version_tx, _) = watch::channel(0);
        Self {
            entries: DashMap::new(),
            version_tx,
        }
    }

    /// Store a fetched value and bump the cache version
    pub fn insert<T: Serialize>(&self, key: QueryKey, value: &T) {
        if let Ok(json) = serde_json::to_value(value) {
            self.entries.insert(key, json);
            self.version_tx.send_modify(|v| *v += 1);
        }
    }

    /// Fetch a cached value, deserialized into the requested shape
    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        self.entries
            .get(key)
            .and_then(|entry| serde_json::from_value(entry.value().clone()).ok())
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Subscribe to version bumps. `changed()` resolves after the next insert.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version_tx.subscribe()
    }

    /// Current version counter, monotonically increasing per insert
    pub fn version(&self) -> u64 {
        *self.version_tx.borrow()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry, e.g. when switching repositories
    pub fn clear(&self) {
        self.entries.clear();
        self.version_tx.send_modify(|v| *v += 1);
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}
