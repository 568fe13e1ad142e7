//! Quota Bar - periodically polls a usage quota API and renders a one-line status

pub mod commands;
pub mod quota_usage;
pub mod refresh;
pub mod settings;
pub mod status;

use anyhow::Context;
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use commands::{dispatch, Command, CommandOutcome, HELP_TEXT};
use quota_usage::api::HttpQuotaFetcher;
use quota_usage::credentials::FileCredentialStore;
use refresh::controller::RefreshController;
use settings::{default_settings_path, Settings, SettingsStore};
use status::types::TerminalSurface;

/// Route `log` output to stderr so stdout only carries status lines
///
/// The logger accepts every level; `log::max_level` does the filtering so it
/// can be narrowed once settings are known.
fn init_logging() -> anyhow::Result<()> {
    let config = ConfigBuilder::new().set_target_level(LevelFilter::Off).build();
    TermLogger::init(LevelFilter::Trace, config, TerminalMode::Stderr, ColorChoice::Auto)
        .context("Failed to initialize logger")?;
    log::set_max_level(LevelFilter::Info);
    Ok(())
}

/// Switch to the configured log level, reporting bad values at the current one
fn apply_log_level(settings: &Settings) -> LevelFilter {
    let level = settings.log_level_filter();
    // Warns when the interval is out of range
    settings.refresh_interval_minutes();
    log::set_max_level(level);
    level
}

pub fn run() -> anyhow::Result<()> {
    init_logging()?;
    let settings_path = default_settings_path()?;
    let settings = Arc::new(SettingsStore::open(&settings_path)?);
    apply_log_level(&settings.current());
    log::debug!("Using settings file {}", settings_path.display());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(run_host(settings))
}

async fn run_host(settings: Arc<SettingsStore>) -> anyhow::Result<()> {
    let credentials = Arc::new(FileCredentialStore::default_location()?);
    let fetcher = Arc::new(HttpQuotaFetcher::new(settings.current().api_base_url));
    let controller = Arc::new(RefreshController::new(
        fetcher,
        credentials,
        settings.clone(),
        Arc::new(TerminalSurface),
    ));

    {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.start().await });
    }

    eprintln!("{HELP_TEXT}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read command")? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        match dispatch(command, &controller, &settings).await {
            CommandOutcome::Continue(Some(message)) => eprintln!("{message}"),
            CommandOutcome::Continue(None) => {}
            CommandOutcome::Quit => break,
        }
    }

    controller.dispose();
    log::info!("Shutting down");
    Ok(())
}
