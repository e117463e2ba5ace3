pub mod config;
pub mod shows;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

/// showplan: recurring show planning and event materialization.
#[derive(Debug, Parser)]
#[command(name = "showplan", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the maintenance daemon (default when no subcommand is given).
    Daemon,
    /// Run a single maintenance pass and print the summary.
    Maintain {
        /// Only maintain this show.
        #[arg(long = "show")]
        show_id: Option<Uuid>,
    },
    /// Manage show templates.
    #[command(subcommand)]
    Show(ShowCommand),
    /// Print the upcoming occurrences of a show.
    Next {
        show_id: Uuid,
        /// Number of occurrences (defaults to `scheduling.preview_occurrences`).
        #[arg(long)]
        count: Option<usize>,
    },
    /// List the stored events of a show.
    Events { show_id: Uuid },
    /// Apply a JSON edit to one event; the event becomes customized.
    EditEvent { event_id: Uuid, file: PathBuf },
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum ShowCommand {
    /// Create a show from a JSON file and generate its events.
    Add { file: PathBuf },
    /// Replace a show template from a JSON file (which must carry `id`).
    Update { file: PathBuf },
    /// Cancel a show and all of its scheduled future events.
    Cancel { show_id: Uuid },
    /// List all shows.
    List,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path in `SHOWPLAN_CONFIG` (or
/// `config.toml` by default). A missing file yields the defaults.
pub fn load_config() -> anyhow::Result<(sp_domain::config::Config, String)> {
    let config_path =
        std::env::var("SHOWPLAN_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        sp_domain::config::Config::default()
    };

    Ok((config, config_path))
}
