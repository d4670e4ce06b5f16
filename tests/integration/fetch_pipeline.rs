//! Fetch Pipeline Integration Tests
//!
//! Drives the cursor paginator and the cache follower against the fixture
//! backend end to end: ordered traversal, progress accounting, cooperative
//! stop, error capture and credential failures.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use futures::StreamExt;
use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

use statshub::fetch::{follow_cached, paginate, LoadSession, SessionPhase};
use statshub::github::{
    DataSource, FetchPolicy, FixtureData, FixtureSource, IssueRecord, QueryCache, QueryKind,
    RepoId, SourceError,
};

fn repo() -> RepoId {
    RepoId::parse("octo/stats").expect("repo id")
}

fn day(offset: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().expect("valid date")
        + chrono::Duration::days(offset)
}

/// Open issues numbered `1..=count`, one per day
fn issues(count: usize) -> Vec<IssueRecord> {
    (0..count)
        .map(|i| IssueRecord {
            number: i as u64 + 1,
            closed: false,
            created_at: day(i as i64),
            closed_at: None,
            labels: Vec::new(),
        })
        .collect()
}

fn issue_source(count: usize, page_size: usize) -> FixtureSource {
    let data = FixtureData {
        issues: issues(count),
        ..FixtureData::default()
    };
    FixtureSource::new(data, Arc::new(QueryCache::new())).with_page_size(page_size)
}

proptest! {
    /// Streaming page by page yields exactly the unpaginated record set, in
    /// order, for any page size.
    #[test]
    fn streamed_pages_concatenate_to_the_full_set(count in 0usize..48, page_size in 1usize..13) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        let (numbers, phase, loaded, total, percent) = runtime.block_on(async move {
            let source = issue_source(count, page_size);
            let source: &dyn DataSource = &source;
            let repo = repo();
            let repo = &repo;
            let session = LoadSession::new();

            let mut streamed = Vec::new();
            {
                let mut pages = Box::pin(paginate(session.clone(), move |cursor: Option<String>| {
                    async move {
                        source.issues(repo, cursor.as_deref(), FetchPolicy::NetworkFirst).await
                    }
                }));
                while let Some(page) = pages.next().await {
                    streamed.extend(page.records);
                }
            }

            let snapshot = session.snapshot();
            let numbers: Vec<u64> = streamed.iter().map(|issue| issue.number).collect();
            (numbers, session.phase(), snapshot.loaded, snapshot.total, snapshot.percent)
        });

        let expected: Vec<u64> = (1..=count as u64).collect();
        prop_assert_eq!(numbers, expected);
        prop_assert_eq!(phase, SessionPhase::Complete);
        prop_assert_eq!(loaded, count as u64);
        prop_assert_eq!(total, Some(count as u64));
        prop_assert!((percent - 100.0).abs() < f64::EPSILON);
    }
}

#[tokio::test]
async fn progress_climbs_monotonically_to_completion() {
    let source = issue_source(7, 2);
    let source: &dyn DataSource = &source;
    let repo = repo();
    let repo = &repo;
    let session = LoadSession::new();

    let mut seen = Vec::new();
    {
        let mut pages = Box::pin(paginate(session.clone(), move |cursor: Option<String>| {
            async move { source.issues(repo, cursor.as_deref(), FetchPolicy::NetworkFirst).await }
        }));
        while pages.next().await.is_some() {
            seen.push(session.snapshot().percent);
        }
    }

    assert_eq!(seen.len(), 4);
    for pair in seen.windows(2) {
        assert!(pair[0] <= pair[1], "progress went backwards: {pair:?}");
    }
    assert!((seen[seen.len() - 1] - 100.0).abs() < f64::EPSILON);
    assert_eq!(session.phase(), SessionPhase::Complete);
}

#[tokio::test]
async fn empty_result_set_completes_at_full_progress() {
    let source = issue_source(0, 10);
    let source: &dyn DataSource = &source;
    let repo = repo();
    let repo = &repo;
    let session = LoadSession::new();

    {
        let mut pages = Box::pin(paginate(session.clone(), move |cursor: Option<String>| {
            async move { source.issues(repo, cursor.as_deref(), FetchPolicy::NetworkFirst).await }
        }));
        while pages.next().await.is_some() {}
    }

    let snapshot = session.snapshot();
    assert_eq!(snapshot.loaded, 0);
    assert_eq!(snapshot.total, Some(0));
    assert!((snapshot.percent - 100.0).abs() < f64::EPSILON);
    assert_eq!(snapshot.phase, SessionPhase::Complete);
}

#[tokio::test]
async fn stop_between_pages_keeps_the_loaded_prefix() {
    let source = issue_source(5, 2);
    let source: &dyn DataSource = &source;
    let repo = repo();
    let repo = &repo;
    let session = LoadSession::new();

    let first_len;
    {
        let mut pages = Box::pin(paginate(session.clone(), move |cursor: Option<String>| {
            async move { source.issues(repo, cursor.as_deref(), FetchPolicy::NetworkFirst).await }
        }));
        let first = pages.next().await.expect("first page");
        first_len = first.records.len();
        session.stop();
        assert!(pages.next().await.is_none(), "stream continued past a stop");
    }

    assert_eq!(first_len, 2);
    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Stopped);
    assert_eq!(snapshot.loaded, 2);
    assert!(snapshot.percent < 100.0);
}

#[tokio::test]
async fn stop_discards_the_response_in_flight() {
    let data = FixtureData {
        issues: issues(6),
        ..FixtureData::default()
    };
    let source = FixtureSource::new(data, Arc::new(QueryCache::new()))
        .with_page_size(2)
        .with_latency(Duration::from_millis(200));
    let source: &dyn DataSource = &source;
    let repo = repo();
    let repo = &repo;
    let session = LoadSession::new();

    let stopper = {
        let session = session.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            session.stop();
        })
    };

    {
        let mut pages = Box::pin(paginate(session.clone(), move |cursor: Option<String>| {
            async move { source.issues(repo, cursor.as_deref(), FetchPolicy::NetworkFirst).await }
        }));
        assert!(pages.next().await.is_none(), "in-flight page was delivered");
    }
    stopper.await.expect("stopper task");

    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Stopped);
    assert_eq!(snapshot.loaded, 0);
}

#[tokio::test]
async fn reload_runs_under_a_fresh_session() {
    let source = issue_source(5, 2);
    let source: &dyn DataSource = &source;
    let repo = repo();
    let repo = &repo;

    let stopped = LoadSession::new();
    {
        let mut pages = Box::pin(paginate(stopped.clone(), move |cursor: Option<String>| {
            async move { source.issues(repo, cursor.as_deref(), FetchPolicy::NetworkFirst).await }
        }));
        pages.next().await.expect("first page");
        stopped.stop();
        while pages.next().await.is_some() {}
    }
    assert_eq!(stopped.phase(), SessionPhase::Stopped);
    assert_eq!(stopped.loaded(), 2);

    let resumed = LoadSession::new();
    {
        let mut pages = Box::pin(paginate(resumed.clone(), move |cursor: Option<String>| {
            async move { source.issues(repo, cursor.as_deref(), FetchPolicy::NetworkFirst).await }
        }));
        while pages.next().await.is_some() {}
    }

    assert_ne!(resumed.id(), stopped.id());
    let snapshot = resumed.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Complete);
    assert_eq!(snapshot.loaded, 5);
    assert!((snapshot.percent - 100.0).abs() < f64::EPSILON);
    // the stopped session is untouched by the rerun
    assert_eq!(stopped.loaded(), 2);
}

#[tokio::test]
async fn query_error_fails_the_session_and_keeps_partial_data() {
    let data = FixtureData {
        issues: issues(5),
        ..FixtureData::default()
    };
    let source = FixtureSource::new(data, Arc::new(QueryCache::new()))
        .with_page_size(2)
        .with_failure(QueryKind::Issues, 1, SourceError::query("boom"));
    let source: &dyn DataSource = &source;
    let repo = repo();
    let repo = &repo;
    let session = LoadSession::new();

    let mut streamed = Vec::new();
    {
        let mut pages = Box::pin(paginate(session.clone(), move |cursor: Option<String>| {
            async move { source.issues(repo, cursor.as_deref(), FetchPolicy::NetworkFirst).await }
        }));
        while let Some(page) = pages.next().await {
            streamed.extend(page.records);
        }
    }

    assert_eq!(streamed.len(), 2, "the page before the failure is kept");
    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Failed);
    assert_eq!(snapshot.loaded, 2);
    assert_eq!(snapshot.errors, vec!["boom".to_string()]);
    assert!(!snapshot.auth_failed);
}

#[tokio::test]
async fn rejected_credentials_flag_the_session() {
    let data = FixtureData {
        issues: issues(3),
        required_token: Some("s3cr3t".to_string()),
        ..FixtureData::default()
    };
    let source = FixtureSource::new(data, Arc::new(QueryCache::new()));
    let source: &dyn DataSource = &source;
    let repo = repo();
    let repo = &repo;
    let session = LoadSession::new();

    {
        let mut pages = Box::pin(paginate(session.clone(), move |cursor: Option<String>| {
            async move { source.issues(repo, cursor.as_deref(), FetchPolicy::NetworkFirst).await }
        }));
        assert!(pages.next().await.is_none());
    }

    let snapshot = session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Failed);
    assert!(snapshot.auth_failed);
    assert!(snapshot.errors.iter().any(|m| m.contains("Bad credentials")));
}

#[tokio::test]
async fn accepted_credentials_complete_the_traversal() {
    let data = FixtureData {
        issues: issues(3),
        required_token: Some("s3cr3t".to_string()),
        ..FixtureData::default()
    };
    let source = FixtureSource::new(data, Arc::new(QueryCache::new()))
        .with_auth_header(Some("Bearer s3cr3t".to_string()));
    let source: &dyn DataSource = &source;
    let repo = repo();
    let repo = &repo;
    let session = LoadSession::new();

    {
        let mut pages = Box::pin(paginate(session.clone(), move |cursor: Option<String>| {
            async move { source.issues(repo, cursor.as_deref(), FetchPolicy::NetworkFirst).await }
        }));
        while pages.next().await.is_some() {}
    }

    assert_eq!(session.phase(), SessionPhase::Complete);
    assert_eq!(session.loaded(), 3);
}

#[tokio::test]
async fn follower_replays_pages_as_the_cache_fills() {
    let data = FixtureData {
        issues: issues(9),
        ..FixtureData::default()
    };
    let cache = Arc::new(QueryCache::new());
    let source = Arc::new(
        FixtureSource::new(data, cache.clone())
            .with_page_size(3)
            .with_latency(Duration::from_millis(5)),
    );

    let settled = CancellationToken::new();
    let updates = cache.subscribe();
    let network = {
        let source = source.clone();
        let settled = settled.clone();
        tokio::spawn(async move {
            let session = LoadSession::new();
            let mut pages = Box::pin(paginate(session, move |cursor: Option<String>| {
                let source = source.clone();
                async move {
                    source
                        .issues(&repo(), cursor.as_deref(), FetchPolicy::NetworkFirst)
                        .await
                }
            }));
            while pages.next().await.is_some() {}
            settled.cancel();
        })
    };

    let mut followed = Vec::new();
    let error = follow_cached(
        CancellationToken::new(),
        updates,
        settled,
        |cursor: Option<String>| {
            let source = source.clone();
            async move {
                source
                    .issues(&repo(), cursor.as_deref(), FetchPolicy::CacheOnly)
                    .await
            }
        },
        |page| followed.extend(page.records),
    )
    .await;
    network.await.expect("network task");

    assert!(error.is_none());
    let numbers: Vec<u64> = followed.iter().map(|issue| issue.number).collect();
    assert_eq!(numbers, (1..=9).collect::<Vec<u64>>());
}
