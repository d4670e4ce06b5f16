//! Dashboard Orchestration
//!
//! A [`Dashboard`] owns one card of every kind plus the focus coordinator
//! and runs the selected cards' load sessions concurrently over one shared
//! data source and query cache. Failures stay on their card; the run simply
//! drives every selected session to its end state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::warn;
use tokio_util::sync::CancellationToken;

use crate::fetch::SessionSnapshot;
use crate::github::{DataSource, QueryCache, RepoId};

pub mod card;
pub mod focus;

pub use card::{
    CalendarCard, CardError, CardKind, CardSet, DownloadsCard, FetchGate, InfoCard, IssuesCard,
    LabelsCard, PopularityCard,
};
pub use focus::{FocusCoordinator, FocusState};

/// Options tuning a dashboard run
#[derive(Debug, Clone)]
pub struct DashboardOptions {
    /// Cards to load
    pub cards: CardSet,
    /// Start very large popularity fetches without asking for confirmation
    pub allow_large_fetch: bool,
    /// End of the calendar window, injectable for deterministic runs
    pub now: DateTime<Utc>,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            cards: CardSet::all(),
            allow_large_fetch: false,
            now: Utc::now(),
        }
    }
}

/// One repository's statistics dashboard
pub struct Dashboard {
    source: Arc<dyn DataSource>,
    cache: Arc<QueryCache>,
    repo: RepoId,
    cards: CardSet,
    focus: FocusCoordinator,
    info: Arc<InfoCard>,
    issues: Arc<IssuesCard>,
    downloads: Arc<DownloadsCard>,
    popularity: Arc<PopularityCard>,
    labels: Arc<LabelsCard>,
    calendar: Arc<CalendarCard>,
}

impl Dashboard {
    pub fn new(
        source: Arc<dyn DataSource>,
        cache: Arc<QueryCache>,
        repo: RepoId,
        options: DashboardOptions,
    ) -> Self {
        Self {
            source,
            cache,
            repo,
            cards: options.cards,
            focus: FocusCoordinator::new(),
            info: Arc::new(InfoCard::new()),
            issues: Arc::new(IssuesCard::new()),
            downloads: Arc::new(DownloadsCard::new()),
            popularity: Arc::new(PopularityCard::new(options.allow_large_fetch)),
            labels: Arc::new(LabelsCard::new()),
            calendar: Arc::new(CalendarCard::anchored(options.now)),
        }
    }

    /// Drive every selected card to its end state.
    ///
    /// Cards run concurrently as runtime tasks. The labels card follows the
    /// issues traversal through the shared cache, so its settle signal fires
    /// when the issues card finishes; with the issues card unselected it
    /// fires immediately and the labels card works from whatever the cache
    /// already holds.
    pub async fn run(&self) {
        let issues_settled = CancellationToken::new();
        let mut tasks = Vec::new();

        if self.cards.contains(CardSet::INFO) {
            let card = self.info.clone();
            let source = self.source.clone();
            let repo = self.repo.clone();
            tasks.push(tokio::spawn(async move {
                card.load(source.as_ref(), &repo).await;
            }));
        }

        if self.cards.contains(CardSet::ISSUES) {
            let card = self.issues.clone();
            let source = self.source.clone();
            let repo = self.repo.clone();
            let settled = issues_settled.clone();
            tasks.push(tokio::spawn(async move {
                card.load(source.as_ref(), &repo).await;
                settled.cancel();
            }));
        } else {
            issues_settled.cancel();
        }

        if self.cards.contains(CardSet::DOWNLOADS) {
            let card = self.downloads.clone();
            let source = self.source.clone();
            let repo = self.repo.clone();
            tasks.push(tokio::spawn(async move {
                card.load(source.as_ref(), &repo).await;
            }));
        }

        if self.cards.contains(CardSet::POPULARITY) {
            let card = self.popularity.clone();
            let source = self.source.clone();
            let repo = self.repo.clone();
            tasks.push(tokio::spawn(async move {
                card.load(source.as_ref(), &repo).await;
            }));
        }

        if self.cards.contains(CardSet::LABELS) {
            let card = self.labels.clone();
            let source = self.source.clone();
            let cache = self.cache.clone();
            let repo = self.repo.clone();
            let settled = issues_settled.clone();
            tasks.push(tokio::spawn(async move {
                card.load(source.as_ref(), &cache, &repo, settled).await;
            }));
        }

        if self.cards.contains(CardSet::CALENDAR) {
            let card = self.calendar.clone();
            let source = self.source.clone();
            let repo = self.repo.clone();
            tasks.push(tokio::spawn(async move {
                card.load(source.as_ref(), &repo).await;
            }));
        }

        for task in tasks {
            if let Err(error) = task.await {
                warn!("Card task aborted: {error}");
            }
        }
    }

    /// Stop the active session of every selected card
    pub fn stop(&self) {
        for kind in self.cards.kinds() {
            match kind {
                CardKind::Info => self.info.stop(),
                CardKind::Issues => self.issues.stop(),
                CardKind::Downloads => self.downloads.stop(),
                CardKind::Popularity => self.popularity.stop(),
                CardKind::Labels => self.labels.stop(),
                CardKind::Calendar => self.calendar.stop(),
            }
        }
    }

    pub fn snapshot_of(&self, kind: CardKind) -> SessionSnapshot {
        match kind {
            CardKind::Info => self.info.snapshot(),
            CardKind::Issues => self.issues.snapshot(),
            CardKind::Downloads => self.downloads.snapshot(),
            CardKind::Popularity => self.popularity.snapshot(),
            CardKind::Labels => self.labels.snapshot(),
            CardKind::Calendar => self.calendar.snapshot(),
        }
    }

    /// Session snapshots of the selected cards, in display order
    pub fn snapshots(&self) -> Vec<(CardKind, SessionSnapshot)> {
        self.cards
            .kinds()
            .into_iter()
            .map(|kind| (kind, self.snapshot_of(kind)))
            .collect()
    }

    /// Whether any selected card ran into an authentication rejection
    pub fn auth_failed(&self) -> bool {
        self.snapshots()
            .iter()
            .any(|(_, snapshot)| snapshot.auth_failed)
    }

    pub fn focus(&self) -> &FocusCoordinator {
        &self.focus
    }

    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    pub fn cards(&self) -> CardSet {
        self.cards
    }

    pub fn info_card(&self) -> &InfoCard {
        &self.info
    }

    pub fn issues_card(&self) -> &IssuesCard {
        &self.issues
    }

    pub fn downloads_card(&self) -> &DownloadsCard {
        &self.downloads
    }

    pub fn popularity_card(&self) -> &PopularityCard {
        &self.popularity
    }

    pub fn labels_card(&self) -> &LabelsCard {
        &self.labels
    }

    pub fn calendar_card(&self) -> &CalendarCard {
        &self.calendar
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::SessionPhase;
    use crate::github::{
        FixtureData, FixtureSource, IssueRecord, LabelRecord, QueryKind, ReleaseAsset,
        ReleaseRecord, RepoOverview, SourceError, StargazerRecord,
    };
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap()
    }

    fn repo() -> RepoId {
        RepoId::new("rust-lang", "cargo").unwrap()
    }

    fn full_fixture() -> FixtureData {
        FixtureData {
            repository: Some(RepoOverview {
                name_with_owner: "rust-lang/cargo".to_string(),
                description: None,
                homepage_url: None,
                license: None,
                created_at: day(1),
                pushed_at: day(20),
                issue_count: 2,
                pull_request_count: 0,
                fork_count: 0,
                star_count: 1,
                commit_count: 2,
                watcher_count: 0,
                release_count: 1,
                tag_count: 1,
                disk_usage_kb: 64,
            }),
            issues: vec![
                IssueRecord {
                    number: 1,
                    closed: false,
                    created_at: day(2),
                    closed_at: None,
                    labels: vec!["bug".to_string()],
                },
                IssueRecord {
                    number: 2,
                    closed: false,
                    created_at: day(3),
                    closed_at: None,
                    labels: vec!["bug".to_string(), "ui".to_string()],
                },
            ],
            releases: vec![ReleaseRecord {
                name: "v1".to_string(),
                tag_name: "1.0.0".to_string(),
                published_at: day(4),
                assets: vec![ReleaseAsset { name: "a.zip".to_string(), download_count: 7 }],
            }],
            stargazers: vec![StargazerRecord { starred_at: day(5) }],
            forks: vec![],
            labels: vec![LabelRecord { name: "bug".to_string(), color: Some("d73a4a".to_string()) }],
            commits: vec![
                crate::github::CommitRecord { committed_at: day(6) },
                crate::github::CommitRecord { committed_at: day(7) },
            ],
            required_token: None,
        }
    }

    fn dashboard_over(data: FixtureData, options: DashboardOptions) -> Dashboard {
        let cache = Arc::new(QueryCache::new());
        let source = Arc::new(FixtureSource::new(data, cache.clone()).with_page_size(1));
        Dashboard::new(source, cache, repo(), options)
    }

    #[tokio::test]
    async fn test_run_loads_every_selected_card() {
        let options = DashboardOptions {
            now: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            ..DashboardOptions::default()
        };
        let dashboard = dashboard_over(full_fixture(), options);
        dashboard.run().await;

        for (kind, snapshot) in dashboard.snapshots() {
            assert_eq!(snapshot.phase, SessionPhase::Complete, "{kind} did not complete");
        }
        assert!(dashboard.info_card().overview().is_some());
        assert_eq!(dashboard.issues_card().series().unwrap().all.len(), 2);
        assert_eq!(dashboard.downloads_card().summary().unwrap().total_downloads, 7);
        assert_eq!(dashboard.popularity_card().star_count(), 1);
        assert_eq!(dashboard.labels_card().matrix().unwrap().size(), 2);
        assert_eq!(dashboard.calendar_card().total_commits(), 2);
        assert!(!dashboard.auth_failed());
    }

    #[tokio::test]
    async fn test_unselected_cards_never_load() {
        let options = DashboardOptions {
            cards: CardSet::ISSUES,
            ..DashboardOptions::default()
        };
        let dashboard = dashboard_over(full_fixture(), options);
        dashboard.run().await;

        assert_eq!(dashboard.issues_card().snapshot().phase, SessionPhase::Complete);
        // Untouched cards stay in their initial state
        assert_eq!(dashboard.downloads_card().snapshot().phase, SessionPhase::Loading);
        assert_eq!(dashboard.downloads_card().snapshot().loaded, 0);
        assert_eq!(dashboard.snapshots().len(), 1);
    }

    #[tokio::test]
    async fn test_labels_settle_without_issues_card() {
        let options = DashboardOptions {
            cards: CardSet::LABELS,
            ..DashboardOptions::default()
        };
        let dashboard = dashboard_over(full_fixture(), options);
        dashboard.run().await;

        // No sibling fills the issue cache, so the matrix stays empty but
        // the card still completes instead of waiting forever
        let snapshot = dashboard.labels_card().snapshot();
        assert_eq!(snapshot.phase, SessionPhase::Complete);
        assert!(dashboard.labels_card().matrix().unwrap().is_empty());
        assert_eq!(dashboard.labels_card().definition_count(), 1);
    }

    #[tokio::test]
    async fn test_failures_stay_on_their_card() {
        let cache = Arc::new(QueryCache::new());
        let source = Arc::new(
            FixtureSource::new(full_fixture(), cache.clone())
                .with_page_size(1)
                .with_failure(QueryKind::Releases, 0, SourceError::query("server error")),
        );
        let dashboard = Dashboard::new(source, cache, repo(), DashboardOptions::default());
        dashboard.run().await;

        assert_eq!(dashboard.downloads_card().snapshot().phase, SessionPhase::Failed);
        assert_eq!(dashboard.downloads_card().snapshot().errors, vec!["server error"]);
        assert_eq!(dashboard.issues_card().snapshot().phase, SessionPhase::Complete);
        assert_eq!(dashboard.labels_card().snapshot().phase, SessionPhase::Complete);
    }

    #[tokio::test]
    async fn test_auth_rejection_is_visible_dashboard_wide() {
        let mut data = full_fixture();
        data.required_token = Some("secret".to_string());
        let dashboard = dashboard_over(data, DashboardOptions::default());
        dashboard.run().await;

        assert!(dashboard.auth_failed());
        assert_eq!(dashboard.issues_card().snapshot().phase, SessionPhase::Failed);
    }

    #[tokio::test]
    async fn test_stop_marks_selected_sessions() {
        let options = DashboardOptions {
            cards: CardSet::ISSUES | CardSet::DOWNLOADS,
            ..DashboardOptions::default()
        };
        let dashboard = dashboard_over(full_fixture(), options);
        dashboard.stop();

        assert_eq!(dashboard.issues_card().snapshot().phase, SessionPhase::Stopped);
        assert_eq!(dashboard.downloads_card().snapshot().phase, SessionPhase::Stopped);
        assert_eq!(dashboard.calendar_card().snapshot().phase, SessionPhase::Loading);
    }

    #[test]
    fn test_focus_is_shared_through_the_dashboard() {
        let dashboard = dashboard_over(full_fixture(), DashboardOptions::default());
        dashboard.focus().focus(CardKind::Issues);
        assert!(dashboard.focus().is_focused(CardKind::Issues));
        assert!(!dashboard.focus().is_focused(CardKind::Labels));
    }
}
