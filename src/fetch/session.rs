//! Load Session State
//!
//! A [`LoadSession`] tracks one incremental traversal: how many records have
//! arrived, the total reported by the first page, recorded errors and the
//! cooperative stop signal. Sessions are cheaply cloneable handles over
//! shared state, so the fetch stream, the owning card and the progress
//! display all observe the same session.
//!
//! Progress is monotonic within a session. Resuming after a stop or a
//! failure means building a fresh session, which is how recorded errors are
//! cleared.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::github::{Page, SourceError};

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Pages are still being fetched (or no fetch has started yet)
    #[default]
    Loading,
    /// The traversal reached a page with no continuation
    Complete,
    /// The consumer stopped the traversal before it finished
    Stopped,
    /// The traversal terminated on an error
    Failed,
}

#[derive(Debug, Default)]
struct SessionState {
    total: Option<u64>,
    loaded: u64,
    pages: u64,
    errors: Vec<String>,
    auth_failed: bool,
    phase: SessionPhase,
}

/// Point-in-time view of a session, used by the progress display
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub phase: SessionPhase,
    pub loaded: u64,
    pub total: Option<u64>,
    pub percent: f64,
    pub errors: Vec<String>,
    pub auth_failed: bool,
}

struct SessionInner {
    id: Uuid,
    state: RwLock<SessionState>,
    cancel: CancellationToken,
}

/// Shared handle over one traversal's progress and stop state
#[derive(Clone)]
pub struct LoadSession {
    inner: Arc<SessionInner>,
}

impl LoadSession {
    pub fn new() -> Self {
        Self::with_token(CancellationToken::new())
    }

    /// A session that stops when `other` stops, with its own counters.
    /// Used when one card drives several traversals behind one stop control.
    pub fn linked(other: &LoadSession) -> Self {
        Self::with_token(other.inner.cancel.child_token())
    }

    fn with_token(cancel: CancellationToken) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                id: Uuid::new_v4(),
                state: RwLock::new(SessionState::default()),
                cancel,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Fold one arrived page into the counters.
    ///
    /// The total is taken from the first page that carries one and never
    /// overwritten afterwards.
    pub fn observe_page<T>(&self, page: &Page<T>) {
        let mut state = self.inner.state.write();
        state.loaded += page.len() as u64;
        state.pages += 1;
        if state.total.is_none() {
            state.total = page.total_count;
        }
    }

    /// Seed the total from out-of-band metadata, if not already known
    pub fn set_total(&self, total: u64) {
        let mut state = self.inner.state.write();
        if state.total.is_none() {
            state.total = Some(total);
        }
    }

    /// Record a terminal error; the session moves to [`SessionPhase::Failed`]
    pub fn record_error(&self, error: &SourceError) {
        let mut state = self.inner.state.write();
        state.errors.extend(error.messages());
        state.auth_failed |= error.is_auth_failure();
        state.phase = SessionPhase::Failed;
    }

    pub fn mark_complete(&self) {
        let mut state = self.inner.state.write();
        if state.phase == SessionPhase::Loading {
            state.phase = SessionPhase::Complete;
        }
    }

    /// Request a cooperative stop: no further page request will be issued,
    /// and an in-flight response is discarded.
    pub fn stop(&self) {
        {
            let mut state = self.inner.state.write();
            if state.phase == SessionPhase::Loading {
                state.phase = SessionPhase::Stopped;
            }
        }
        self.inner.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Token for `select!`-style integration with other shutdown signals
    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.inner.state.read().phase
    }

    pub fn loaded(&self) -> u64 {
        self.inner.state.read().loaded
    }

    pub fn total(&self) -> Option<u64> {
        self.inner.state.read().total
    }

    pub fn pages(&self) -> u64 {
        self.inner.state.read().pages
    }

    /// Percent complete. 100 when the total is unknown or zero, so cards
    /// without a countable total render as finished rather than stuck.
    pub fn progress_percent(&self) -> f64 {
        let state = self.inner.state.read();
        match state.total {
            Some(total) if total > 0 => (state.loaded as f64 / total as f64) * 100.0,
            _ => 100.0,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.inner.state.read().errors.is_empty()
    }

    pub fn errors(&self) -> Vec<String> {
        self.inner.state.read().errors.clone()
    }

    /// Whether a recorded error was an authentication rejection
    pub fn auth_failed(&self) -> bool {
        self.inner.state.read().auth_failed
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.state.read();
        let percent = match state.total {
            Some(total) if total > 0 => (state.loaded as f64 / total as f64) * 100.0,
            _ => 100.0,
        };
        SessionSnapshot {
            id: self.inner.id,
            phase: state.phase,
            loaded: state.loaded,
            total: state.total,
            percent,
            errors: state.errors.clone(),
            auth_failed: state.auth_failed,
        }
    }
}

impl Default for LoadSession {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LoadSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.state.read();
        f.debug_struct("LoadSession")
            .field("id", &self.inner.id)
            .field("phase", &state.phase)
            .field("loaded", &state.loaded)
            .field("total", &state.total)
            .finish()
    }
}
