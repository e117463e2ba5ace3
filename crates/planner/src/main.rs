use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use sp_domain::config::{Config, LogFormat, ObservabilityConfig};
use sp_planner::bootstrap;
use sp_planner::cli::{self, Cli, Command, ConfigCommand, ShowCommand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Default to the daemon when no subcommand is given.
        None | Some(Command::Daemon) => {
            let (config, config_path) = cli::load_config()?;
            init_tracing(&config.observability);
            run_daemon(Arc::new(config), config_path).await
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            let (config, config_path) = cli::load_config()?;
            if !cli::config::validate(&config, &config_path) {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let (config, _config_path) = cli::load_config()?;
            cli::config::show(&config)
        }
        Some(Command::Version) => {
            println!("showplan {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(command) => {
            init_cli_tracing();
            let (config, _) = cli::load_config()?;
            let state = bootstrap::build_app_state(Arc::new(config))?;
            match command {
                Command::Maintain { show_id } => cli::shows::maintain(&state, show_id).await,
                Command::Show(ShowCommand::Add { file }) => cli::shows::add(&state, &file).await,
                Command::Show(ShowCommand::Update { file }) => {
                    cli::shows::update(&state, &file).await
                }
                Command::Show(ShowCommand::Cancel { show_id }) => {
                    cli::shows::cancel(&state, show_id).await
                }
                Command::Show(ShowCommand::List) => cli::shows::list(&state).await,
                Command::Next { show_id, count } => cli::shows::next(&state, show_id, count).await,
                Command::Events { show_id } => cli::shows::events(&state, show_id).await,
                Command::EditEvent { event_id, file } => {
                    cli::shows::edit_event(&state, event_id, &file).await
                }
                Command::Daemon | Command::Config(_) | Command::Version => Ok(()),
            }
        }
    }
}

/// Initialize structured tracing for the daemon.
///
/// `RUST_LOG` overrides the configured default filter.
fn init_tracing(obs: &ObservabilityConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&obs.default_filter));

    match obs.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Compact => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .init(),
    }
}

/// Initialize compact stderr-only tracing for CLI one-shot commands.
///
/// Defaults to `warn` level so diagnostic output does not pollute stdout.
fn init_cli_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn run_daemon(config: Arc<Config>, config_path: String) -> anyhow::Result<()> {
    tracing::info!(config = %config_path, "showplan starting");

    let state = bootstrap::build_app_state(config)?;
    bootstrap::spawn_background_tasks(&state);

    shutdown_signal().await;
    tracing::info!("shutdown complete");
    Ok(())
}

/// Wait for Ctrl-C or (on unix) SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
                    _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to register SIGTERM handler");
                let _ = ctrl_c.await;
                tracing::info!("received SIGINT, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        tracing::info!("received SIGINT, shutting down");
    }
}
