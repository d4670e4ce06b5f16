pub mod aggregate;
pub mod chart;
pub mod cli;
pub mod config;
pub mod dashboard;
pub mod display;
pub mod fetch;
pub mod github;
pub mod logging;
