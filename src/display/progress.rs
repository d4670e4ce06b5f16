//! Progress indicators and status displays for CLI output
//!
//! Renders each card's load session as a one-line status with a textual
//! progress bar, plus error and confirmation lines where a card has them.

use crate::dashboard::{CardKind, FetchGate};
use crate::display::ColourManager;
use crate::fetch::{SessionPhase, SessionSnapshot};

/// Width of the textual progress bar in characters
const BAR_WIDTH: usize = 20;

/// Status indicator symbols with unicode support
#[derive(Debug, Clone)]
pub struct StatusSymbols {
    pub loading: &'static str,
    pub complete: &'static str,
    pub stopped: &'static str,
    pub failed: &'static str,
    pub warning: &'static str,
}

impl Default for StatusSymbols {
    fn default() -> Self {
        Self {
            loading: "…",
            complete: "✓",
            stopped: "■",
            failed: "✗",
            warning: "⚠",
        }
    }
}

impl StatusSymbols {
    /// ASCII-only symbols for terminals without unicode support
    pub fn ascii() -> Self {
        Self {
            loading: ".",
            complete: "+",
            stopped: "#",
            failed: "x",
            warning: "!",
        }
    }
}

/// Renders load progress for dashboard cards
#[derive(Debug, Clone)]
pub struct ProgressRenderer {
    colours: ColourManager,
    symbols: StatusSymbols,
}

impl ProgressRenderer {
    /// Create a renderer with the given colour manager
    pub fn new(colours: ColourManager) -> Self {
        let symbols = if Self::supports_unicode() {
            StatusSymbols::default()
        } else {
            StatusSymbols::ascii()
        };
        Self { colours, symbols }
    }

    /// Check if the terminal supports unicode characters
    fn supports_unicode() -> bool {
        // LANG takes precedence over LC_CTYPE, matching glibc lookup order
        if let Ok(lang) = std::env::var("LANG") {
            return lang.to_lowercase().contains("utf-8") || lang.to_lowercase().contains("utf8");
        }

        if let Ok(lc_ctype) = std::env::var("LC_CTYPE") {
            return lc_ctype.to_lowercase().contains("utf-8")
                || lc_ctype.to_lowercase().contains("utf8");
        }

        // Default to ASCII for safety
        false
    }

    /// One status line for one card's session
    ///
    /// Looks like `issues      [==========          ]  50%  5/10 loading`.
    pub fn line(&self, kind: CardKind, snapshot: &SessionSnapshot) -> String {
        let percent = snapshot.percent.clamp(0.0, 100.0);
        let counts = match snapshot.total {
            Some(total) => format!("{}/{}", snapshot.loaded, total),
            None => snapshot.loaded.to_string(),
        };
        format!(
            "{} {:<10} [{}] {:>3.0}%  {} {}",
            self.symbol(snapshot.phase),
            kind.name(),
            bar(percent, BAR_WIDTH),
            percent,
            counts,
            self.phase_word(snapshot.phase),
        )
    }

    /// Error lines for a card, indented under its status line
    pub fn error_lines(&self, snapshot: &SessionSnapshot) -> Vec<String> {
        snapshot
            .errors
            .iter()
            .map(|message| {
                format!(
                    "    {} {}",
                    self.symbols.failed,
                    self.colours.error(message)
                )
            })
            .collect()
    }

    /// Confirmation hint for a popularity fetch that was held back
    pub fn gate_line(&self, gate: &FetchGate) -> String {
        let message = format!(
            "{} stars need about {} requests; re-run with --yes to fetch anyway",
            gate.star_count, gate.estimated_requests
        );
        format!("    {} {}", self.symbols.warning, self.colours.warning(&message))
    }

    fn symbol(&self, phase: SessionPhase) -> &'static str {
        match phase {
            SessionPhase::Loading => self.symbols.loading,
            SessionPhase::Complete => self.symbols.complete,
            SessionPhase::Stopped => self.symbols.stopped,
            SessionPhase::Failed => self.symbols.failed,
        }
    }

    fn phase_word(&self, phase: SessionPhase) -> String {
        match phase {
            SessionPhase::Loading => self.colours.info("loading").to_string(),
            SessionPhase::Complete => self.colours.success("done").to_string(),
            SessionPhase::Stopped => self.colours.warning("stopped").to_string(),
            SessionPhase::Failed => self.colours.error("failed").to_string(),
        }
    }
}

impl Default for ProgressRenderer {
    fn default() -> Self {
        Self::new(ColourManager::default())
    }
}

/// Fixed-width progress bar filled proportionally to `percent`
pub fn bar(percent: f64, width: usize) -> String {
    let clamped = percent.clamp(0.0, 100.0);
    let filled = ((clamped / 100.0) * width as f64).round() as usize;
    let mut bar = String::with_capacity(width);
    for position in 0..width {
        bar.push(if position < filled { '=' } else { ' ' });
    }
    bar
}
