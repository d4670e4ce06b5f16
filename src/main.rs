use anyhow::{Context, Result};
use chrono::Utc;
use log::{error, warn};
use std::process;
use std::sync::Arc;

use statshub::aggregate::{DownloadsOrder, IssuesSeries, PopularitySeries};
use statshub::cli::{self, Args};
use statshub::config::ConfigManager;
use statshub::dashboard::{CardKind, CardSet, Dashboard, DashboardOptions};
use statshub::display::{tables, ColourManager, ProgressRenderer};
use statshub::github::{
    AuthManager, CredentialStore, DataSource, FileTokenStore, FixtureSource, InMemoryTokenStore,
    QueryCache, RepoId,
};
use statshub::logging::{self, LogConfig, LogDestination, LogFormat};

/// Viewport the charts are laid out for when neither flag nor config says otherwise
const DEFAULT_WIDTH: f64 = 960.0;
const DEFAULT_HEIGHT: f64 = 220.0;

fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("Application panicked: {:?}", panic_info);
        eprintln!("Panic: {:?}", panic_info);
        process::exit(101);
    }));

    if let Err(e) = run() {
        error!("Application error: {}", e);
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = cli::parse_args();
    cli::validate_args(&args)?;

    let config = load_configuration(&args)?;

    let log_config = build_log_config(&args, &config)?;
    logging::init_logger(log_config)?;

    let auth = build_auth(&args)?;

    if let Some(token) = &args.login {
        auth.login(token)?;
        println!("Token stored");
        return Ok(());
    }
    if args.logout {
        auth.logout()?;
        println!("Token removed");
        return Ok(());
    }

    // validate_args guarantees a repository outside the login/logout paths
    let raw_repo = args
        .repository
        .clone()
        .context("A repository is required, as owner/name")?;
    let repo = cli::parse_repository(&raw_repo)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_dashboard(&args, &config, &auth, repo))
}

fn load_configuration(args: &Args) -> Result<ConfigManager> {
    let mut config = match &args.config_file {
        Some(path) => ConfigManager::load_from_file(path.clone())?,
        None => ConfigManager::load()?,
    };
    if let Some(section) = &args.config_name {
        config.select_section(section.clone());
    }
    Ok(config)
}

fn build_log_config(args: &Args, config: &ConfigManager) -> Result<LogConfig> {
    let format: LogFormat = args
        .log_format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let log_file = args
        .log_file
        .clone()
        .or_else(|| config.get_path("base", "log-file"));

    let (destination, file_level) = match log_file {
        Some(path) => {
            let level = match &args.log_file_level {
                Some(level) => logging::parse_log_level(level)?,
                None => config
                    .get_log_level("base", "log-file-level")?
                    .unwrap_or_else(|| args.console_level()),
            };
            (LogDestination::Both(path), Some(level))
        }
        None => (LogDestination::Console, None),
    };

    Ok(LogConfig {
        console_level: args.console_level(),
        file_level,
        format,
        destination,
    })
}

/// A --token flag keeps the credential for this run only; otherwise the
/// token file under the config directory is used.
fn build_auth(args: &Args) -> Result<AuthManager> {
    let store: Arc<dyn CredentialStore> = match &args.token {
        Some(token) => Arc::new(InMemoryTokenStore::with_token(token)),
        None => {
            let path = FileTokenStore::default_path()
                .context("No config directory available for the token file; pass --token")?;
            Arc::new(FileTokenStore::new(path))
        }
    };
    Ok(AuthManager::new(store))
}

async fn run_dashboard(
    args: &Args,
    config: &ConfigManager,
    auth: &AuthManager,
    repo: RepoId,
) -> Result<()> {
    let fixture = args
        .fixture
        .clone()
        .or_else(|| config.get_path("dashboard", "fixture"))
        .context("No data source configured: pass --fixture <FILE> with repository data")?;

    let cache = Arc::new(QueryCache::new());
    let source = FixtureSource::from_file(&fixture, cache.clone())?
        .with_auth_header(auth.authorization_header());
    let source: Arc<dyn DataSource> = Arc::new(source);

    let cards = match args
        .cards
        .clone()
        .or_else(|| config.get_value("dashboard", "cards").cloned())
    {
        Some(raw) => CardSet::parse_list(&raw)?,
        None => CardSet::all(),
    };
    let allow_large_fetch = args.yes
        || config
            .get_bool("dashboard", "allow-large-fetch")?
            .unwrap_or(false);

    let options = DashboardOptions {
        cards,
        allow_large_fetch,
        now: Utc::now(),
    };
    let dashboard = Dashboard::new(source, cache, repo, options);
    dashboard.run().await;

    if dashboard.auth_failed() {
        auth.handle_auth_failure();
        warn!("The stored token was rejected and has been cleared; run --login again");
    }

    let width = args
        .width
        .or(config.get_f64("dashboard", "width")?)
        .unwrap_or(DEFAULT_WIDTH);
    let height = args
        .height
        .or(config.get_f64("dashboard", "height")?)
        .unwrap_or(DEFAULT_HEIGHT);
    let order = if args.by_date {
        DownloadsOrder::Date
    } else {
        DownloadsOrder::Count
    };
    let no_color = args.no_color || config.get_bool("base", "no-color")?.unwrap_or(false);

    render_dashboard(&dashboard, width, height, order, no_color);
    Ok(())
}

fn render_dashboard(
    dashboard: &Dashboard,
    width: f64,
    height: f64,
    order: DownloadsOrder,
    no_color: bool,
) {
    let colours = ColourManager::from_args(no_color);
    let progress = ProgressRenderer::new(colours.clone());

    for (kind, snapshot) in dashboard.snapshots() {
        println!();
        println!("{}", colours.highlight(kind.title()));
        println!("{}", progress.line(kind, &snapshot));
        for line in progress.error_lines(&snapshot) {
            println!("{}", line);
        }

        match kind {
            CardKind::Info => {
                if let Some(overview) = dashboard.info_card().overview() {
                    print!("{}", tables::overview_table(&overview));
                }
            }
            CardKind::Issues => {
                if let Some(series) = dashboard.issues_card().series() {
                    let card = dashboard.issues_card();
                    print!(
                        "{}",
                        tables::issues_table(card.open_count() as u64, card.closed_count() as u64)
                    );
                    print!(
                        "{}",
                        tables::line_chart_summary(
                            &series.series(),
                            &IssuesSeries::legends(),
                            true,
                            width,
                            height,
                        )
                    );
                }
            }
            CardKind::Downloads => {
                if let Some(summary) = dashboard.downloads_card().summary() {
                    print!("{}", tables::downloads_table(&summary, order));
                    print!("{}", tables::pie_summary(&summary, order, width, height));
                }
            }
            CardKind::Popularity => {
                if let Some(gate) = dashboard.popularity_card().gate() {
                    println!("{}", progress.gate_line(&gate));
                }
                if let Some(series) = dashboard.popularity_card().series() {
                    print!("{}", tables::popularity_table(&series));
                    print!(
                        "{}",
                        tables::line_chart_summary(
                            &series.series(),
                            &PopularitySeries::legends(),
                            true,
                            width,
                            height,
                        )
                    );
                }
            }
            CardKind::Labels => {
                if let Some(matrix) = dashboard.labels_card().matrix() {
                    print!("{}", tables::labels_table(&matrix));
                    print!("{}", tables::chords_summary(&matrix, width, height));
                }
            }
            CardKind::Calendar => {
                if let Some(days) = dashboard.calendar_card().days() {
                    let total = dashboard.calendar_card().total_commits();
                    print!("{}", tables::calendar_table(&days, total));
                    print!("{}", tables::calendar_summary(&days, width, height));
                }
            }
        }
    }
}
