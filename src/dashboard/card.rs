//! Dashboard Cards
//!
//! Card kinds, the combinable selection set and the per-card load pipelines.
//! Each card owns its aggregator, the [`LoadSession`] of the traversal in
//! flight and a watch channel that publishes the freshly derived output after
//! every arrived page, so progress and partial charts render while pages are
//! still loading.
//!
//! Loading a card again after a stop or a failure is the resume path: a
//! fresh session replaces the old one, recorded errors disappear with it and
//! the dataset is rebuilt from the first page. Cursors are never reused
//! across sessions.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use chrono::{DateTime, Duration, Utc};
use futures::StreamExt;
use log::{debug, info, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::aggregate::{
    estimated_requests, requires_confirmation, CalendarAggregator, DataPoint, DownloadsAggregator,
    DownloadsSummary, IssuesAggregator, IssuesSeries, LabelMatrix, LabelsAggregator,
    PopularityAggregator, PopularitySeries,
};
use crate::fetch::{follow_cached, paginate, LoadSession, SessionPhase, SessionSnapshot};
use crate::github::{DataSource, FetchPolicy, QueryCache, RepoId, RepoOverview, SourceError};

/// Days of commit history shown by the calendar card
const CALENDAR_WINDOW_DAYS: i64 = 365;

/// Errors from card selection parsing
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CardError {
    #[error("unknown card '{0}' (expected info, issues, downloads, popularity, labels or calendar)")]
    UnknownCard(String),
}

/// One dashboard card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKind {
    Info,
    Issues,
    Downloads,
    Popularity,
    Labels,
    Calendar,
}

impl CardKind {
    /// Every kind, in dashboard display order
    pub const ALL: [CardKind; 6] = [
        CardKind::Info,
        CardKind::Issues,
        CardKind::Downloads,
        CardKind::Popularity,
        CardKind::Labels,
        CardKind::Calendar,
    ];

    /// Identifier used on the command line and in configuration
    pub fn name(self) -> &'static str {
        match self {
            CardKind::Info => "info",
            CardKind::Issues => "issues",
            CardKind::Downloads => "downloads",
            CardKind::Popularity => "popularity",
            CardKind::Labels => "labels",
            CardKind::Calendar => "calendar",
        }
    }

    /// Heading shown above the card's output
    pub fn title(self) -> &'static str {
        match self {
            CardKind::Info => "Information",
            CardKind::Issues => "Issues",
            CardKind::Downloads => "Downloads",
            CardKind::Popularity => "Popularity",
            CardKind::Labels => "Labels",
            CardKind::Calendar => "Calendar",
        }
    }

    pub fn flag(self) -> CardSet {
        match self {
            CardKind::Info => CardSet::INFO,
            CardKind::Issues => CardSet::ISSUES,
            CardKind::Downloads => CardSet::DOWNLOADS,
            CardKind::Popularity => CardSet::POPULARITY,
            CardKind::Labels => CardSet::LABELS,
            CardKind::Calendar => CardSet::CALENDAR,
        }
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for CardKind {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "info" => Ok(CardKind::Info),
            "issues" => Ok(CardKind::Issues),
            "downloads" => Ok(CardKind::Downloads),
            "popularity" => Ok(CardKind::Popularity),
            "labels" => Ok(CardKind::Labels),
            "calendar" => Ok(CardKind::Calendar),
            other => Err(CardError::UnknownCard(other.to_string())),
        }
    }
}

bitflags! {
    /// Cards selected for a dashboard run, combinable with bitwise operations
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CardSet: u8 {
        /// Repository overview
        const INFO = 0x01;
        /// Cumulative opened/closed issue lines
        const ISSUES = 0x02;
        /// Release download ranking
        const DOWNLOADS = 0x04;
        /// Star and fork growth
        const POPULARITY = 0x08;
        /// Label co-occurrence matrix
        const LABELS = 0x10;
        /// Daily commit heatmap
        const CALENDAR = 0x20;
    }
}

impl CardSet {
    /// Parse a comma-separated selection such as `issues,labels`.
    /// `all` selects every card; empty parts are skipped.
    pub fn parse_list(list: &str) -> Result<CardSet, CardError> {
        let mut set = CardSet::empty();
        for part in list.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if part.eq_ignore_ascii_case("all") {
                set |= CardSet::all();
                continue;
            }
            set |= part.parse::<CardKind>()?.flag();
        }
        Ok(set)
    }

    /// Selected kinds in dashboard display order
    pub fn kinds(self) -> Vec<CardKind> {
        CardKind::ALL
            .iter()
            .copied()
            .filter(|kind| self.contains(kind.flag()))
            .collect()
    }
}

impl Default for CardSet {
    fn default() -> Self {
        CardSet::all()
    }
}

/// Session handle and output channel shared by every card pipeline
struct CardCore<S> {
    session: RwLock<LoadSession>,
    output: watch::Sender<Option<S>>,
}

impl<S: Clone> CardCore<S> {
    fn new() -> Self {
        let (output, _) = watch::channel(None);
        Self {
            session: RwLock::new(LoadSession::new()),
            output,
        }
    }

    /// Swap in a fresh session for the next run and clear stale output
    fn begin(&self) -> LoadSession {
        let session = LoadSession::new();
        *self.session.write() = session.clone();
        self.output.send_replace(None);
        session
    }

    fn publish(&self, value: S) {
        self.output.send_replace(Some(value));
    }

    fn latest(&self) -> Option<S> {
        self.output.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<S>> {
        self.output.subscribe()
    }

    fn snapshot(&self) -> SessionSnapshot {
        self.session.read().snapshot()
    }

    fn stop(&self) {
        self.session.read().stop();
    }
}

/// Repository overview card. Single-shot query, no pagination.
pub struct InfoCard {
    core: CardCore<RepoOverview>,
}

impl InfoCard {
    pub fn new() -> Self {
        Self { core: CardCore::new() }
    }

    pub async fn load(&self, source: &dyn DataSource, repo: &RepoId) {
        let session = self.core.begin();
        match source.repository(repo).await {
            Ok(overview) => {
                self.core.publish(overview);
                session.mark_complete();
            }
            Err(error) => {
                warn!("Repository overview failed for {repo}: {}", error.messages().join("; "));
                session.record_error(&error);
            }
        }
    }

    pub fn overview(&self) -> Option<RepoOverview> {
        self.core.latest()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<RepoOverview>> {
        self.core.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.core.snapshot()
    }

    pub fn stop(&self) {
        self.core.stop()
    }
}

impl Default for InfoCard {
    fn default() -> Self {
        Self::new()
    }
}

/// Issues card: cumulative created and closed lines
pub struct IssuesCard {
    core: CardCore<IssuesSeries>,
    aggregator: RwLock<IssuesAggregator>,
}

impl IssuesCard {
    pub fn new() -> Self {
        Self {
            core: CardCore::new(),
            aggregator: RwLock::new(IssuesAggregator::new()),
        }
    }

    /// Stream issue pages, publishing the recomputed series after each one
    pub async fn load(&self, source: &dyn DataSource, repo: &RepoId) {
        let session = self.core.begin();
        self.aggregator.write().reset();

        let mut pages = Box::pin(paginate(session.clone(), move |cursor: Option<String>| {
            async move { source.issues(repo, cursor.as_deref(), FetchPolicy::NetworkFirst).await }
        }));
        while let Some(page) = pages.next().await {
            let derived = {
                let mut aggregator = self.aggregator.write();
                aggregator.ingest(page.records);
                aggregator.derive()
            };
            self.core.publish(derived);
        }
        debug!(
            "Issues card finished for {repo}: {} of {:?} loaded, phase {:?}",
            session.loaded(),
            session.total(),
            session.phase()
        );
    }

    pub fn series(&self) -> Option<IssuesSeries> {
        self.core.latest()
    }

    pub fn open_count(&self) -> usize {
        self.aggregator.read().open_count()
    }

    pub fn closed_count(&self) -> usize {
        self.aggregator.read().closed_count()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<IssuesSeries>> {
        self.core.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.core.snapshot()
    }

    pub fn stop(&self) {
        self.core.stop()
    }
}

impl Default for IssuesCard {
    fn default() -> Self {
        Self::new()
    }
}

/// Downloads card: per-release download totals with the long tail bucketed
pub struct DownloadsCard {
    core: CardCore<DownloadsSummary>,
    aggregator: RwLock<DownloadsAggregator>,
}

impl DownloadsCard {
    pub fn new() -> Self {
        Self {
            core: CardCore::new(),
            aggregator: RwLock::new(DownloadsAggregator::new()),
        }
    }

    pub async fn load(&self, source: &dyn DataSource, repo: &RepoId) {
        let session = self.core.begin();
        self.aggregator.write().reset();

        let mut pages = Box::pin(paginate(session.clone(), move |cursor: Option<String>| {
            async move { source.releases(repo, cursor.as_deref(), FetchPolicy::NetworkFirst).await }
        }));
        while let Some(page) = pages.next().await {
            let derived = {
                let mut aggregator = self.aggregator.write();
                aggregator.ingest(page.records);
                aggregator.derive()
            };
            self.core.publish(derived);
        }
    }

    pub fn summary(&self) -> Option<DownloadsSummary> {
        self.core.latest()
    }

    pub fn release_count(&self) -> usize {
        self.aggregator.read().len()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<DownloadsSummary>> {
        self.core.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.core.snapshot()
    }

    pub fn stop(&self) {
        self.core.stop()
    }
}

impl Default for DownloadsCard {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard raised instead of starting a very large stargazer fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchGate {
    pub star_count: u64,
    pub estimated_requests: u64,
}

/// Popularity card: star and fork growth with identical horizontal extents.
///
/// The repository overview is fetched first to anchor both series at the
/// creation date and to seed the progress total from the star count. Stars
/// and forks then traverse concurrently over one stop control; progress
/// tracks the star traversal alone.
pub struct PopularityCard {
    core: CardCore<PopularitySeries>,
    aggregator: RwLock<PopularityAggregator>,
    gate: RwLock<Option<FetchGate>>,
    allow_large: bool,
}

impl PopularityCard {
    /// `allow_large` waves through histories above the confirmation
    /// threshold; without it such a fetch stops before the first page
    pub fn new(allow_large: bool) -> Self {
        Self {
            core: CardCore::new(),
            aggregator: RwLock::new(PopularityAggregator::new()),
            gate: RwLock::new(None),
            allow_large,
        }
    }

    pub async fn load(&self, source: &dyn DataSource, repo: &RepoId) {
        let session = self.core.begin();
        self.aggregator.write().reset();
        *self.gate.write() = None;

        let overview = match source.repository(repo).await {
            Ok(overview) => overview,
            Err(error) => {
                warn!("Popularity card could not resolve {repo}: {}", error.messages().join("; "));
                session.record_error(&error);
                return;
            }
        };
        session.set_total(overview.star_count);
        self.aggregator.write().set_created_at(overview.created_at);

        if requires_confirmation(overview.star_count) && !self.allow_large {
            let gate = FetchGate {
                star_count: overview.star_count,
                estimated_requests: estimated_requests(overview.star_count),
            };
            info!(
                "Popularity fetch for {repo} held: {} stars, about {} requests needed",
                gate.star_count, gate.estimated_requests
            );
            *self.gate.write() = Some(gate);
            session.stop();
            return;
        }

        // Forks share the stop signal but keep their own counters so the
        // star traversal alone drives the progress percentage
        let forks_session = LoadSession::linked(&session);

        let stars = async {
            let mut pages = Box::pin(paginate(session.clone(), move |cursor: Option<String>| {
                async move {
                    source.stargazers(repo, cursor.as_deref(), FetchPolicy::NetworkFirst).await
                }
            }));
            while let Some(page) = pages.next().await {
                let derived = {
                    let mut aggregator = self.aggregator.write();
                    aggregator.ingest_stars(page.records);
                    aggregator.derive(false)
                };
                self.core.publish(derived);
            }
        };
        let forks = async {
            let mut pages = Box::pin(paginate(forks_session.clone(), move |cursor: Option<String>| {
                async move { source.forks(repo, cursor.as_deref(), FetchPolicy::NetworkFirst).await }
            }));
            while let Some(page) = pages.next().await {
                let derived = {
                    let mut aggregator = self.aggregator.write();
                    aggregator.ingest_forks(page.records);
                    aggregator.derive(false)
                };
                self.core.publish(derived);
            }
        };
        tokio::join!(stars, forks);

        // A fork failure surfaces on the card even though progress tracked
        // the stars
        if forks_session.has_errors() {
            session.record_error(&SourceError::Query { messages: forks_session.errors() });
        }

        // The closing now-point pins both lines to the same right edge,
        // only once both traversals actually finished
        if session.phase() == SessionPhase::Complete
            && forks_session.phase() == SessionPhase::Complete
        {
            self.core.publish(self.aggregator.read().derive(true));
        }
    }

    pub fn series(&self) -> Option<PopularitySeries> {
        self.core.latest()
    }

    /// The held fetch, when confirmation was required and not given
    pub fn gate(&self) -> Option<FetchGate> {
        *self.gate.read()
    }

    pub fn star_count(&self) -> usize {
        self.aggregator.read().star_count()
    }

    pub fn fork_count(&self) -> usize {
        self.aggregator.read().fork_count()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PopularitySeries>> {
        self.core.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.core.snapshot()
    }

    pub fn stop(&self) {
        self.core.stop()
    }
}

/// Labels card: co-occurrence matrix of the open issues' labels.
///
/// Label definitions load over the network like any other card data. The
/// issues themselves are read cache-only from the pages the issues card
/// fetches, waiting on cache updates for pages that have not landed yet;
/// `issues_settled` tells the walk that no further pages will arrive.
pub struct LabelsCard {
    core: CardCore<LabelMatrix>,
    aggregator: RwLock<LabelsAggregator>,
}

impl LabelsCard {
    pub fn new() -> Self {
        Self {
            core: CardCore::new(),
            aggregator: RwLock::new(LabelsAggregator::new()),
        }
    }

    pub async fn load(
        &self,
        source: &dyn DataSource,
        cache: &QueryCache,
        repo: &RepoId,
        issues_settled: CancellationToken,
    ) {
        let session = self.core.begin();
        self.aggregator.write().reset();

        // Subscribe before walking so an insert racing a miss is never lost
        let updates = cache.subscribe();

        let mut pages = Box::pin(paginate(session.clone(), move |cursor: Option<String>| {
            async move { source.labels(repo, cursor.as_deref(), FetchPolicy::NetworkFirst).await }
        }));
        while let Some(page) = pages.next().await {
            self.aggregator.write().ingest_definitions(page.records);
        }
        if session.phase() != SessionPhase::Complete {
            return;
        }

        let walk_error = follow_cached(
            session.cancellation_token(),
            updates,
            issues_settled,
            move |cursor: Option<String>| async move {
                source.issues(repo, cursor.as_deref(), FetchPolicy::CacheOnly).await
            },
            |page| {
                let derived = {
                    let mut aggregator = self.aggregator.write();
                    aggregator.ingest_issues(page.records);
                    aggregator.derive()
                };
                self.core.publish(derived);
            },
        )
        .await;

        if let Some(error) = walk_error {
            warn!("Labels card issue walk failed for {repo}: {}", error.messages().join("; "));
            session.record_error(&error);
        }
        self.core.publish(self.aggregator.read().derive());
    }

    pub fn matrix(&self) -> Option<LabelMatrix> {
        self.core.latest()
    }

    pub fn definition_count(&self) -> usize {
        self.aggregator.read().definition_count()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<LabelMatrix>> {
        self.core.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.core.snapshot()
    }

    pub fn stop(&self) {
        self.core.stop()
    }
}

impl Default for LabelsCard {
    fn default() -> Self {
        Self::new()
    }
}

/// Calendar card: daily commit counts over the trailing year
pub struct CalendarCard {
    core: CardCore<Vec<DataPoint>>,
    aggregator: RwLock<CalendarAggregator>,
    now: DateTime<Utc>,
}

impl CalendarCard {
    pub fn new() -> Self {
        Self::anchored(Utc::now())
    }

    /// Pin the end of the window, for deterministic derivations
    pub fn anchored(now: DateTime<Utc>) -> Self {
        Self {
            core: CardCore::new(),
            aggregator: RwLock::new(CalendarAggregator::new()),
            now,
        }
    }

    pub async fn load(&self, source: &dyn DataSource, repo: &RepoId) {
        let session = self.core.begin();
        self.aggregator.write().reset();

        let now = self.now;
        let since = now - Duration::days(CALENDAR_WINDOW_DAYS);
        let mut pages = Box::pin(paginate(session.clone(), move |cursor: Option<String>| {
            async move {
                source.commits(repo, since, cursor.as_deref(), FetchPolicy::NetworkFirst).await
            }
        }));
        while let Some(page) = pages.next().await {
            let derived = {
                let mut aggregator = self.aggregator.write();
                aggregator.ingest(page.records);
                aggregator.derive_at(now)
            };
            self.core.publish(derived);
        }
    }

    pub fn days(&self) -> Option<Vec<DataPoint>> {
        self.core.latest()
    }

    pub fn total_commits(&self) -> u64 {
        self.aggregator.read().total_commits()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Vec<DataPoint>>> {
        self.core.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.core.snapshot()
    }

    pub fn stop(&self) {
        self.core.stop()
    }
}

impl Default for CalendarCard {
    fn default() -> Self {
        Self::new()
    }
}
