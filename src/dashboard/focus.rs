//! Focus Coordination
//!
//! Shared zoom state for the dashboard: at most one card is focused at a
//! time, and the last focused card is remembered after blurring so it can
//! stay stacked on top while it animates back into the grid.

use std::sync::Arc;

use tokio::sync::watch;

use super::card::CardKind;

/// Snapshot of the focus state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusState {
    pub focused: bool,
    pub last: Option<CardKind>,
}

/// Cloneable handle to the dashboard-wide focus state
#[derive(Debug, Clone)]
pub struct FocusCoordinator {
    state: Arc<watch::Sender<FocusState>>,
}

impl FocusCoordinator {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(FocusState::default());
        Self { state: Arc::new(tx) }
    }

    /// Zoom a card in, replacing any current focus
    pub fn focus(&self, card: CardKind) {
        self.state.send_replace(FocusState { focused: true, last: Some(card) });
    }

    /// Zoom back out; the card stays remembered as last focused
    pub fn blur(&self) {
        self.state.send_modify(|state| state.focused = false);
    }

    pub fn is_focused(&self, card: CardKind) -> bool {
        let state = self.state.borrow();
        state.focused && state.last == Some(card)
    }

    /// Whether `card` was the most recently focused one, zoomed or not
    pub fn is_last_focused(&self, card: CardKind) -> bool {
        self.state.borrow().last == Some(card)
    }

    pub fn focused(&self) -> Option<CardKind> {
        let state = self.state.borrow();
        state.focused.then_some(state.last).flatten()
    }

    pub fn subscribe(&self) -> watch::Receiver<FocusState> {
        self.state.subscribe()
    }
}

impl Default for FocusCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
