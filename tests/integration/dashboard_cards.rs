//! Dashboard Card Integration Tests
//!
//! Runs whole dashboards over fixture data and checks the chart-ready
//! output of every card: the issues walkthrough, the downloads long tail,
//! the zero-filled calendar year, the label matrix fed through the shared
//! cache and the popularity confirmation gate.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use statshub::aggregate::DataPoint;
use statshub::dashboard::{CardKind, CardSet, Dashboard, DashboardOptions, FetchGate};
use statshub::fetch::SessionPhase;
use statshub::github::{
    CommitRecord, FixtureData, FixtureSource, ForkRecord, IssueRecord, LabelRecord, QueryCache,
    ReleaseAsset, ReleaseRecord, RepoId, RepoOverview, StargazerRecord,
};

fn repo() -> RepoId {
    RepoId::parse("octo/stats").expect("repo id")
}

fn day(offset: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().expect("valid date")
        + chrono::Duration::days(offset)
}

fn overview(star_count: u64) -> RepoOverview {
    RepoOverview {
        name_with_owner: "octo/stats".to_string(),
        description: Some("Repository statistics".to_string()),
        homepage_url: None,
        license: Some("MIT License".to_string()),
        created_at: day(-400),
        pushed_at: day(3),
        issue_count: 4,
        pull_request_count: 2,
        fork_count: 2,
        star_count,
        commit_count: 6,
        watcher_count: 5,
        release_count: 2,
        tag_count: 2,
        disk_usage_kb: 2048,
    }
}

fn open_issue(number: u64, created_at: DateTime<Utc>, labels: &[&str]) -> IssueRecord {
    IssueRecord {
        number,
        closed: false,
        created_at,
        closed_at: None,
        labels: labels.iter().map(|l| l.to_string()).collect(),
    }
}

fn closed_issue(number: u64, created_at: DateTime<Utc>, closed_at: DateTime<Utc>) -> IssueRecord {
    IssueRecord {
        number,
        closed: true,
        created_at,
        closed_at: Some(closed_at),
        labels: Vec::new(),
    }
}

fn release(index: u64, downloads: u64) -> ReleaseRecord {
    ReleaseRecord {
        name: format!("Release {index}"),
        tag_name: format!("v0.{index}"),
        published_at: day(index as i64),
        assets: vec![ReleaseAsset {
            name: format!("statshub-0.{index}.tar.gz"),
            download_count: downloads,
        }],
    }
}

fn dashboard_for(
    data: FixtureData,
    cards: CardSet,
    page_size: usize,
    now: DateTime<Utc>,
) -> Dashboard {
    let cache = Arc::new(QueryCache::new());
    let source = FixtureSource::new(data, cache.clone()).with_page_size(page_size);
    Dashboard::new(
        Arc::new(source),
        cache,
        repo(),
        DashboardOptions {
            cards,
            allow_large_fetch: false,
            now,
        },
    )
}

#[tokio::test]
async fn issues_series_matches_the_manual_walkthrough() {
    // Three open issues on days 1..3, one closed issue created on day 4,
    // served as a page of three and a page of one
    let data = FixtureData {
        issues: vec![
            open_issue(1, day(1), &[]),
            open_issue(2, day(2), &[]),
            open_issue(3, day(3), &[]),
            closed_issue(4, day(4), day(5)),
        ],
        ..FixtureData::default()
    };
    let dashboard = dashboard_for(data, CardSet::ISSUES, 3, day(10));

    dashboard.run().await;

    let card = dashboard.issues_card();
    assert_eq!(card.open_count(), 3);
    assert_eq!(card.closed_count(), 1);

    let series = card.series().expect("issues series");
    let expected_all = vec![
        DataPoint::new(day(1), 1.0),
        DataPoint::new(day(2), 2.0),
        DataPoint::new(day(3), 3.0),
        DataPoint::new(day(4), 4.0),
    ];
    assert_eq!(series.all, expected_all);
    // The closed line ends with a synthetic point extending it to the last
    // created date, so both lines share a right edge
    let expected_closed = vec![DataPoint::new(day(4), 1.0), DataPoint::new(day(4), 1.0)];
    assert_eq!(series.closed, expected_closed);

    let snapshot = dashboard.snapshot_of(CardKind::Issues);
    assert_eq!(snapshot.phase, SessionPhase::Complete);
    assert_eq!(snapshot.loaded, 4);
    assert_eq!(snapshot.total, Some(4));
}

#[tokio::test]
async fn downloads_collapse_the_long_tail_into_others() {
    // 32 releases with distinct totals; the two smallest collapse
    let data = FixtureData {
        releases: (1..=32).map(|i| release(i, i * 10)).collect(),
        ..FixtureData::default()
    };
    let dashboard = dashboard_for(data, CardSet::DOWNLOADS, 7, day(40));

    dashboard.run().await;

    let card = dashboard.downloads_card();
    assert_eq!(card.release_count(), 32);

    let summary = card.summary().expect("downloads summary");
    assert_eq!(summary.releases.len(), 31);
    assert_eq!(summary.total_downloads, (1..=32).map(|i| i * 10).sum::<u64>());

    let first = &summary.releases[0];
    assert_eq!(first.name, "Release 32");
    assert_eq!(first.download_count, 320);

    let others = summary.releases.last().expect("others bucket");
    assert_eq!(others.name, "Others");
    assert_eq!(others.download_count, 10 + 20);

    assert_eq!(dashboard.snapshot_of(CardKind::Downloads).phase, SessionPhase::Complete);
}

#[tokio::test]
async fn calendar_zero_fills_a_full_year_window() {
    let now = day(100);
    // Six commits on exactly three distinct days inside the window
    let commit_days = [now - chrono::Duration::days(10), now - chrono::Duration::days(5), now - chrono::Duration::days(1)];
    let mut commits = Vec::new();
    for _ in 0..2 {
        commits.push(CommitRecord { committed_at: commit_days[0] });
    }
    commits.push(CommitRecord { committed_at: commit_days[1] });
    for _ in 0..3 {
        commits.push(CommitRecord { committed_at: commit_days[2] });
    }
    let data = FixtureData {
        commits,
        ..FixtureData::default()
    };
    let dashboard = dashboard_for(data, CardSet::CALENDAR, 4, now);

    dashboard.run().await;

    let card = dashboard.calendar_card();
    assert_eq!(card.total_commits(), 6);

    let days = card.days().expect("calendar days");
    // 365 days back plus today, gaps zero-filled
    assert_eq!(days.len(), 366);
    assert_eq!(days.iter().filter(|point| point.value > 0.0).count(), 3);
    assert_eq!(days.iter().map(|point| point.value).sum::<f64>(), 6.0);
    assert_eq!(days.first().expect("window start").date.date_naive(), (now - chrono::Duration::days(365)).date_naive());
    assert_eq!(days.last().expect("window end").date.date_naive(), now.date_naive());

    let busiest = days
        .iter()
        .find(|point| point.date.date_naive() == commit_days[2].date_naive())
        .expect("busiest day present");
    assert_eq!(busiest.value, 3.0);
}

#[tokio::test]
async fn labels_matrix_follows_the_issues_traversal() {
    let data = FixtureData {
        issues: vec![
            open_issue(1, day(1), &["bug"]),
            open_issue(2, day(2), &["bug", "feature"]),
            closed_issue(3, day(3), day(4)),
            open_issue(4, day(5), &[]),
        ],
        labels: vec![
            LabelRecord {
                name: "bug".to_string(),
                color: Some("d73a4a".to_string()),
            },
            LabelRecord {
                name: "feature".to_string(),
                color: Some("a2eeef".to_string()),
            },
        ],
        ..FixtureData::default()
    };
    let dashboard = dashboard_for(data, CardSet::ISSUES | CardSet::LABELS, 2, day(10));

    dashboard.run().await;

    let card = dashboard.labels_card();
    assert_eq!(card.definition_count(), 2);

    let matrix = card.matrix().expect("label matrix");
    assert_eq!(matrix.names, vec!["bug".to_string(), "feature".to_string()]);
    // issue 1 carries "bug" alone, issue 2 pairs it with "feature"
    assert_eq!(matrix.matrix, vec![vec![1.0, 1.0], vec![1.0, 0.0]]);
    assert_eq!(matrix.legend[0].color, "#d73a4a");
    assert_eq!(matrix.legend[1].color, "#a2eeef");

    assert_eq!(dashboard.snapshot_of(CardKind::Labels).phase, SessionPhase::Complete);
}

#[tokio::test]
async fn popularity_holds_large_fetches_behind_the_gate() {
    let data = FixtureData {
        repository: Some(overview(25_000)),
        stargazers: vec![StargazerRecord { starred_at: day(1) }],
        forks: vec![ForkRecord { forked_at: day(2) }],
        ..FixtureData::default()
    };
    let dashboard = dashboard_for(data, CardSet::POPULARITY, 100, day(10));

    dashboard.run().await;

    let card = dashboard.popularity_card();
    assert_eq!(
        card.gate(),
        Some(FetchGate {
            star_count: 25_000,
            estimated_requests: 250,
        })
    );
    assert!(card.series().is_none(), "gated card published a series");
    assert_eq!(dashboard.snapshot_of(CardKind::Popularity).phase, SessionPhase::Stopped);
}

#[tokio::test]
async fn popularity_confirmation_runs_the_gated_fetch() {
    let data = FixtureData {
        repository: Some(overview(25_000)),
        stargazers: vec![
            StargazerRecord { starred_at: day(1) },
            StargazerRecord { starred_at: day(2) },
            StargazerRecord { starred_at: day(3) },
        ],
        forks: vec![ForkRecord { forked_at: day(2) }],
        ..FixtureData::default()
    };
    let cache = Arc::new(QueryCache::new());
    let source = FixtureSource::new(data, cache.clone());
    let dashboard = Dashboard::new(
        Arc::new(source),
        cache,
        repo(),
        DashboardOptions {
            cards: CardSet::POPULARITY,
            allow_large_fetch: true,
            now: day(10),
        },
    );

    dashboard.run().await;

    let card = dashboard.popularity_card();
    assert_eq!(card.gate(), None);
    assert_eq!(card.star_count(), 3);
    assert_eq!(card.fork_count(), 1);

    let series = card.series().expect("popularity series");
    // creation anchor, three stars, closing now-point
    assert_eq!(series.stars.len(), 5);
    assert_eq!(series.stars.first().expect("anchor").value, 0.0);
    assert_eq!(series.stars.last().expect("now point").value, 3.0);
    assert_eq!(series.forks.last().expect("now point").value, 1.0);
}

#[tokio::test]
async fn dashboard_loads_every_card_from_a_fixture_file() {
    let now = day(30);
    let data = FixtureData {
        repository: Some(overview(3)),
        issues: vec![
            open_issue(1, day(1), &["bug"]),
            open_issue(2, day(2), &["bug", "feature"]),
            open_issue(3, day(3), &[]),
            closed_issue(4, day(4), day(5)),
        ],
        releases: vec![release(1, 40), release(2, 60)],
        stargazers: vec![
            StargazerRecord { starred_at: day(1) },
            StargazerRecord { starred_at: day(6) },
            StargazerRecord { starred_at: day(8) },
        ],
        forks: vec![
            ForkRecord { forked_at: day(4) },
            ForkRecord { forked_at: day(9) },
        ],
        labels: vec![
            LabelRecord {
                name: "bug".to_string(),
                color: Some("d73a4a".to_string()),
            },
            LabelRecord {
                name: "feature".to_string(),
                color: Some("a2eeef".to_string()),
            },
        ],
        commits: vec![
            CommitRecord { committed_at: day(7) },
            CommitRecord { committed_at: day(7) },
            CommitRecord { committed_at: day(12) },
        ],
        ..FixtureData::default()
    };

    let dir = tempfile::TempDir::new().expect("temp dir");
    let path = dir.path().join("stats.json");
    std::fs::write(&path, serde_json::to_string_pretty(&data).expect("serialize fixture"))
        .expect("write fixture");

    let cache = Arc::new(QueryCache::new());
    let source = FixtureSource::from_file(&path, cache.clone())
        .expect("load fixture")
        .with_page_size(2);
    let dashboard = Dashboard::new(
        Arc::new(source),
        cache,
        repo(),
        DashboardOptions {
            cards: CardSet::all(),
            allow_large_fetch: false,
            now,
        },
    );

    dashboard.run().await;

    assert!(!dashboard.auth_failed());
    for (kind, snapshot) in dashboard.snapshots() {
        assert_eq!(snapshot.phase, SessionPhase::Complete, "{kind:?} did not finish");
        assert!(snapshot.errors.is_empty(), "{kind:?} recorded errors: {:?}", snapshot.errors);
    }

    let overview = dashboard.info_card().overview().expect("overview");
    assert_eq!(overview.name_with_owner, "octo/stats");

    assert_eq!(dashboard.issues_card().open_count(), 3);
    assert_eq!(dashboard.issues_card().closed_count(), 1);

    let downloads = dashboard.downloads_card().summary().expect("downloads");
    assert_eq!(downloads.total_downloads, 100);
    assert_eq!(downloads.releases.len(), 2);

    assert_eq!(dashboard.popularity_card().star_count(), 3);
    assert_eq!(dashboard.popularity_card().fork_count(), 2);

    let matrix = dashboard.labels_card().matrix().expect("label matrix");
    assert_eq!(matrix.names, vec!["bug".to_string(), "feature".to_string()]);

    assert_eq!(dashboard.calendar_card().total_commits(), 3);
    let days = dashboard.calendar_card().days().expect("calendar days");
    assert_eq!(days.len(), 366);
    assert_eq!(days.iter().filter(|point| point.value > 0.0).count(), 2);
}

#[test]
fn focus_is_shared_across_the_dashboard() {
    let dashboard = dashboard_for(FixtureData::default(), CardSet::all(), 10, day(0));
    let focus = dashboard.focus().clone();

    focus.focus(CardKind::Downloads);
    assert!(dashboard.focus().is_focused(CardKind::Downloads));
    assert_eq!(dashboard.focus().focused(), Some(CardKind::Downloads));

    focus.blur();
    assert_eq!(dashboard.focus().focused(), None);
    assert!(dashboard.focus().is_last_focused(CardKind::Downloads));
}

#[tokio::test]
async fn stopping_the_dashboard_keeps_partial_results() {
    let data = FixtureData {
        issues: (1..=40).map(|i| open_issue(i, day(i as i64 % 28), &[])).collect(),
        ..FixtureData::default()
    };
    let cache = Arc::new(QueryCache::new());
    let source = FixtureSource::new(data, cache.clone())
        .with_page_size(2)
        .with_latency(Duration::from_millis(20));
    let dashboard = Arc::new(Dashboard::new(
        Arc::new(source),
        cache,
        repo(),
        DashboardOptions {
            cards: CardSet::ISSUES,
            allow_large_fetch: false,
            now: day(40),
        },
    ));

    let runner = {
        let dashboard = dashboard.clone();
        tokio::spawn(async move { dashboard.run().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    dashboard.stop();
    runner.await.expect("dashboard task");

    let snapshot = dashboard.snapshot_of(CardKind::Issues);
    assert_eq!(snapshot.phase, SessionPhase::Stopped);
    assert!(snapshot.loaded > 0, "stop landed before the first page");
    assert!(snapshot.loaded < 40, "stop landed after the full traversal");

    let series = dashboard.issues_card().series().expect("partial series");
    assert_eq!(series.all.len() as u64, snapshot.loaded);
}
