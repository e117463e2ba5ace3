//! Maintenance driver: keeps every active show's events materialized up to
//! the rolling horizon.

use std::sync::Arc;

use serde::Serialize;

use sp_domain::error::Result;

use super::store::ShowRepository;
use super::sync::EventSynchronizer;

/// Totals for one maintenance pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MaintenanceSummary {
    pub shows_checked: usize,
    /// Shows whose horizon was advanced this pass.
    pub shows_extended: usize,
    pub events_generated: usize,
    pub conflicts: usize,
    pub skipped: usize,
    pub failures: usize,
}

pub struct MaintenanceRunner {
    shows: Arc<dyn ShowRepository>,
    sync: Arc<EventSynchronizer>,
}

impl MaintenanceRunner {
    pub fn new(shows: Arc<dyn ShowRepository>, sync: Arc<EventSynchronizer>) -> Self {
        Self { shows, sync }
    }

    /// Run one pass over the active shows.
    ///
    /// A failing show is logged and counted; the pass moves on to the next
    /// one and the failed show is retried on the following tick because its
    /// stored horizon did not advance.
    pub async fn tick(&self) -> Result<MaintenanceSummary> {
        let shows = self.shows.active_shows().await?;
        let mut summary = MaintenanceSummary::default();

        for show in shows {
            summary.shows_checked += 1;
            match self.sync.maintain_show(&show).await {
                Ok(report) => {
                    if report.generated > 0 || report.conflicts > 0 {
                        summary.shows_extended += 1;
                    }
                    summary.events_generated += report.generated;
                    summary.conflicts += report.conflicts;
                    summary.skipped += report.skipped;
                }
                Err(e) => {
                    summary.failures += 1;
                    tracing::warn!(show_id = %show.id, error = %e, "maintenance failed for show");
                }
            }
        }

        if summary.events_generated > 0 || summary.failures > 0 {
            tracing::info!(
                shows = summary.shows_checked,
                generated = summary.events_generated,
                failures = summary.failures,
                "maintenance pass complete"
            );
        } else {
            tracing::debug!(shows = summary.shows_checked, "maintenance pass: nothing to do");
        }
        Ok(summary)
    }
}
