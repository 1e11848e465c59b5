// Gateway Console - terminal admin console for an AS4 messaging gateway
//
// The console drives the gateway's administrative REST API from the
// terminal: audit logs, users, plugin users, parties, JMS queues, error
// logs, logging levels, domains, message filters, trust stores, and PMode
// uploads.
//
// Architecture:
// - Pages: one component per console screen, composed from the list
//   behaviors (filterable/pageable/sortable/modifiable)
// - REST client (reqwest): all gateway calls, with the shared error taxonomy
// - TUI (ratatui): grid rendering, editors, choosers
// - Alert bus: transient notifications surfaced as toasts
// - Logging: tracing captured in memory for the logs panel

mod alert;
mod cli;
mod config;
mod context;
mod list;
mod logging;
mod pages;
mod rest;
mod theme;
mod tui;
mod util;

use alert::AlertBus;
use anyhow::Result;
use clap::Parser;
use config::{Config, LogRotation};
use context::AppContext;
use logging::{LogBuffer, TuiLogLayer};
use rest::models::{CurrentUser, DomainRow};
use rest::params::QueryParams;
use rest::RestClient;
use theme::Theme;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Handle CLI subcommands first (config --show, --reset, --edit, --path)
    let cli = cli::Cli::parse();
    if cli::handle_command(&cli) {
        return Ok(());
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    let mut config = Config::from_env();
    cli::apply_overrides(&cli, &mut config);

    // Log capture for the TUI panel; stdout logging would garble the grid
    let log_buffer = LogBuffer::new();

    // Precedence: RUST_LOG env var > config file > default "info"
    let default_filter = format!("gwcon={}", config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    // Optional rotating JSON file logs; the guard must stay alive so the
    // background writer flushes on exit
    let _file_guard: Option<tracing_appender::non_blocking::WorkerGuard> =
        if config.logging.file_enabled {
            match std::fs::create_dir_all(&config.logging.file_dir) {
                Ok(()) => {
                    let appender = match config.logging.file_rotation {
                        LogRotation::Hourly => tracing_appender::rolling::hourly(
                            &config.logging.file_dir,
                            &config.logging.file_prefix,
                        ),
                        LogRotation::Daily => tracing_appender::rolling::daily(
                            &config.logging.file_dir,
                            &config.logging.file_prefix,
                        ),
                        LogRotation::Never => tracing_appender::rolling::never(
                            &config.logging.file_dir,
                            &config.logging.file_prefix,
                        ),
                    };
                    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(TuiLogLayer::new(log_buffer.clone()))
                        .with(
                            tracing_subscriber::fmt::layer()
                                .json()
                                .with_writer(non_blocking)
                                .with_ansi(false),
                        )
                        .init();
                    Some(guard)
                }
                Err(e) => {
                    eprintln!(
                        "Warning: Could not create log directory {:?}: {}",
                        config.logging.file_dir, e
                    );
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(TuiLogLayer::new(log_buffer.clone()))
                        .init();
                    None
                }
            }
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(TuiLogLayer::new(log_buffer.clone()))
                .init();
            None
        };

    tracing::info!("gwcon {} starting against {}", config::VERSION, config.base_url);

    let client = RestClient::new(&config.base_url, &config.username, &config.password)
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    // Context is best-effort: the console still opens when the gateway is
    // down, the pages surface the errors on activation
    let mut ctx = AppContext::new(&config.username);
    match client
        .get_json::<CurrentUser>("rest/security/user", &QueryParams::new())
        .await
    {
        Ok(user) => {
            if user.default_password_used {
                tracing::warn!("The default password is still in use; change it");
            }
            ctx.apply_current_user(&user);
        }
        Err(err) => tracing::warn!("Could not read the current user: {}", err),
    }
    match client
        .get_json::<DomainRow>("rest/domains/current", &QueryParams::new())
        .await
    {
        Ok(domain) => ctx.current_domain = Some(domain.code),
        Err(err) => tracing::warn!("Could not read the current domain: {}", err),
    }

    let alerts = AlertBus::new();
    let pages = pages::build_pages(&client, &alerts, &ctx, &config)?;
    let theme = Theme::by_name(&config.theme);

    let app = tui::app::App::new(pages, alerts, log_buffer, theme);
    tui::run_tui(app).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
