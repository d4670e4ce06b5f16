//! Display module for colour management and terminal output
//!
//! Colour support, per-card progress lines and prettytable renditions of
//! the dashboard datasets, with terminal compatibility throughout.

pub mod colours;
pub mod progress;
pub mod tables;

pub use colours::{ColourConfig, ColourManager};
pub use progress::{ProgressRenderer, StatusSymbols};
