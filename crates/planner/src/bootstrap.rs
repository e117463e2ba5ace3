//! AppState construction and background-task spawning shared by the daemon
//! and the one-shot CLI commands.

use std::sync::Arc;

use anyhow::Context;

use sp_domain::clock::SystemClock;
use sp_domain::config::{Config, ConfigSeverity};

use crate::runtime::{EventSynchronizer, JsonStore, MaintenanceRunner};
use crate::state::AppState;

/// Validate config, open the store and wire the services together.
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!(
            "config validation failed with {} error(s)",
            issues
                .iter()
                .filter(|i| i.severity == ConfigSeverity::Error)
                .count()
        );
    }

    // ── Store ────────────────────────────────────────────────────────
    let store = Arc::new(
        JsonStore::open(&config.storage.state_path).with_context(|| {
            format!("opening state in {}", config.storage.state_path.display())
        })?,
    );

    // ── Synchronizer & maintenance ───────────────────────────────────
    let sync = Arc::new(EventSynchronizer::new(
        store.clone(),
        store.clone(),
        Arc::new(SystemClock),
        &config.scheduling,
    ));
    let maintenance = Arc::new(MaintenanceRunner::new(store.clone(), sync.clone()));
    tracing::info!(
        horizon_months = config.scheduling.horizon_months,
        cap = config.scheduling.max_generated_occurrences,
        "synchronizer ready"
    );

    Ok(AppState {
        config,
        store,
        sync,
        maintenance,
    })
}

/// Spawn the long-running background tasks: the maintenance sweep and
/// show-lock pruning.
pub fn spawn_background_tasks(state: &AppState) {
    // ── Maintenance sweep ────────────────────────────────────────────
    if state.config.maintenance.enabled {
        let runner = state.maintenance.clone();
        let period = state.config.maintenance.interval();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                if let Err(e) = runner.tick().await {
                    tracing::warn!(error = %e, "maintenance pass failed");
                }
            }
        });
        tracing::info!(interval_secs = period.as_secs(), "maintenance sweep scheduled");
    } else {
        tracing::info!("maintenance sweep disabled");
    }

    // ── Periodic show-lock pruning ───────────────────────────────────
    {
        let sync = state.sync.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
            loop {
                interval.tick().await;
                sync.locks().prune_idle();
            }
        });
    }
    tracing::info!("background tasks spawned");
}
