use anyhow::Result;
use clap::Parser;
use log::{debug, info};
use regex::Regex;
use std::path::PathBuf;

use crate::dashboard::CardSet;
use crate::github::RepoId;

/// GitHub Repository Statistics Dashboard
#[derive(Parser, Debug)]
#[command(name = "statshub")]
#[command(
    about = "A GitHub repository statistics dashboard: issues, downloads, popularity, labels and commit activity, loaded page by page with cancellable progress"
)]
#[command(version)]
pub struct Args {
    /// Repository to inspect, as owner/name
    pub repository: Option<String>,

    /// Cards to load, comma separated (info, issues, downloads, popularity,
    /// labels, calendar) or "all"
    #[arg(long, value_name = "CARDS")]
    pub cards: Option<String>,

    /// Chart viewport width in pixels
    #[arg(long, value_name = "PX")]
    pub width: Option<f64>,

    /// Chart viewport height in pixels
    #[arg(long, value_name = "PX")]
    pub height: Option<f64>,

    /// JSON fixture file to serve repository data from
    #[arg(long, value_name = "FILE")]
    pub fixture: Option<PathBuf>,

    /// Proceed with large stargazer fetches without asking
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Order the downloads card by publish date instead of download count
    #[arg(long)]
    pub by_date: bool,

    /// Access token for this run only (not persisted)
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Validate and persist an access token, then exit
    #[arg(long, value_name = "TOKEN")]
    pub login: Option<String>,

    /// Remove the persisted access token, then exit
    #[arg(long)]
    pub logout: bool,

    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,

    /// Verbose output (debug level logging)
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (error level logging only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Debug output (trace level logging)
    #[arg(long)]
    pub debug: bool,

    /// Log format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub log_format: String,

    /// Log file path for file output
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level for file output (independent of console level)
    #[arg(long, value_name = "LEVEL")]
    pub log_file_level: Option<String>,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Configuration section name
    #[arg(long, value_name = "SECTION")]
    pub config_name: Option<String>,
}

impl Args {
    /// Console log level implied by the verbosity flags
    pub fn console_level(&self) -> log::LevelFilter {
        if self.debug {
            log::LevelFilter::Trace
        } else if self.verbose {
            log::LevelFilter::Debug
        } else if self.quiet {
            log::LevelFilter::Error
        } else {
            log::LevelFilter::Info
        }
    }
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    let args = Args::parse();
    debug!("Parsed CLI arguments: {:?}", args);
    args
}

/// Validate CLI argument combinations
pub fn validate_args(args: &Args) -> Result<()> {
    debug!("Validating CLI argument combinations");

    let log_flags_count = [args.verbose, args.quiet, args.debug]
        .iter()
        .filter(|&&flag| flag)
        .count();

    if log_flags_count > 1 {
        return Err(anyhow::anyhow!(
            "Conflicting log level flags: only one of --verbose, --quiet, or --debug may be specified"
        ));
    }

    match args.log_format.to_lowercase().as_str() {
        "text" | "json" => {}
        _ => {
            return Err(anyhow::anyhow!(
                "Invalid log format '{}'. Valid options: text, json",
                args.log_format
            ))
        }
    }

    if let Some(ref level) = args.log_file_level {
        match level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => {
                return Err(anyhow::anyhow!(
                    "Invalid log file level '{}'. Valid levels: error, warn, info, debug, trace",
                    level
                ))
            }
        }
    }

    if args.log_file_level.is_some() && args.log_file.is_none() {
        return Err(anyhow::anyhow!(
            "--log-file-level requires --log-file to be specified"
        ));
    }

    if args.login.is_some() && args.logout {
        return Err(anyhow::anyhow!(
            "--login and --logout cannot be combined"
        ));
    }

    // login/logout are standalone commands; everything else needs a repository
    if args.repository.is_none() && args.login.is_none() && !args.logout {
        return Err(anyhow::anyhow!(
            "A repository is required, as owner/name (for example rust-lang/cargo)"
        ));
    }

    if let Some(raw) = &args.repository {
        parse_repository(raw)?;
    }

    if let Some(raw) = &args.cards {
        CardSet::parse_list(raw)?;
    }

    if let Some(width) = args.width {
        if !width.is_finite() || width <= 0.0 {
            return Err(anyhow::anyhow!("--width must be a positive number"));
        }
    }
    if let Some(height) = args.height {
        if !height.is_finite() || height <= 0.0 {
            return Err(anyhow::anyhow!("--height must be a positive number"));
        }
    }

    info!("CLI arguments validated successfully");
    Ok(())
}

/// Parse an `owner/name` repository path
pub fn parse_repository(raw: &str) -> Result<RepoId> {
    let pattern = Regex::new(r"^.+/.+$")?;
    let raw = raw.trim();
    if !pattern.is_match(raw) {
        return Err(anyhow::anyhow!(
            "Invalid repository '{}': expected owner/name",
            raw
        ));
    }
    Ok(RepoId::parse(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::CardKind;

    fn base_args() -> Args {
        Args {
            repository: Some("rust-lang/cargo".to_string()),
            cards: None,
            width: None,
            height: None,
            fixture: None,
            yes: false,
            by_date: false,
            token: None,
            login: None,
            logout: false,
            no_color: false,
            verbose: false,
            quiet: false,
            debug: false,
            log_format: "text".to_string(),
            log_file: None,
            log_file_level: None,
            config_file: None,
            config_name: None,
        }
    }

    #[test]
    fn test_validate_args_success() {
        let mut args = base_args();
        args.verbose = true;
        args.log_format = "json".to_string();
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_args_conflicting_flags() {
        let mut args = base_args();
        args.verbose = true;
        args.quiet = true;
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_invalid_format() {
        let mut args = base_args();
        args.log_format = "invalid".to_string();
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_file_level_without_file() {
        let mut args = base_args();
        args.log_file_level = Some("debug".to_string());
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_validate_args_requires_repository() {
        let mut args = base_args();
        args.repository = None;
        assert!(validate_args(&args).is_err());

        // logout works without a repository
        args.logout = true;
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_args_rejects_unknown_card() {
        let mut args = base_args();
        args.cards = Some("issues,bogus".to_string());
        assert!(validate_args(&args).is_err());

        args.cards = Some("issues,calendar".to_string());
        assert!(validate_args(&args).is_ok());
    }

    #[test]
    fn test_validate_args_rejects_bad_viewport() {
        let mut args = base_args();
        args.width = Some(0.0);
        assert!(validate_args(&args).is_err());

        args.width = Some(960.0);
        args.height = Some(-5.0);
        assert!(validate_args(&args).is_err());
    }

    #[test]
    fn test_parse_repository_splits_owner_and_name() {
        let repo = parse_repository("rust-lang/cargo").unwrap();
        assert_eq!(repo.owner, "rust-lang");
        assert_eq!(repo.name, "cargo");
    }

    #[test]
    fn test_parse_repository_rejects_missing_slash() {
        assert!(parse_repository("cargo").is_err());
        assert!(parse_repository("/cargo").is_err());
        assert!(parse_repository("rust-lang/").is_err());
    }

    #[test]
    fn test_console_level_from_flags() {
        assert_eq!(base_args().console_level(), log::LevelFilter::Info);

        let mut args = base_args();
        args.quiet = true;
        assert_eq!(args.console_level(), log::LevelFilter::Error);

        let mut args = base_args();
        args.debug = true;
        assert_eq!(args.console_level(), log::LevelFilter::Trace);
    }

    #[test]
    fn test_cards_flag_reaches_card_set() {
        let set = CardSet::parse_list("issues, calendar").unwrap();
        assert!(set.contains(CardKind::Issues.flag()));
        assert!(set.contains(CardKind::Calendar.flag()));
        assert!(!set.contains(CardKind::Downloads.flag()));
    }
}
