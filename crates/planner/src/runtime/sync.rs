//! Event synchronization: keeps a show's stored future events in line with
//! its template.
//!
//! Every entry point takes the per-show lock, re-reads storage and hands a
//! [`SyncPlan`] to the event repository, which applies it atomically and
//! rejects duplicate `(show, start)` pairs. Runs are therefore safe to
//! retry and safe to race with another trigger for the same show.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use sp_domain::clock::Clock;
use sp_domain::config::SchedulingSettings;
use sp_domain::error::{Error, Result};
use sp_domain::event::{EventStatus, GenerationTrigger};
use sp_domain::show::{Show, ShowStatus};

use super::schedules::{
    generate_events_after, generate_events_for_show, horizon_after, validate_show, Generation,
};
use super::show_lock::ShowLockMap;
use super::store::{ApplyOutcome, EventRepository, GenerationRecord, ShowRepository, SyncPlan};

/// What one synchronization run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub cancelled: usize,
    pub generated: usize,
    /// Drafts dropped because an event already starts at that instant.
    pub conflicts: usize,
    /// Customized future events left untouched.
    pub preserved_customized: usize,
    /// Occurrences that could not be dated.
    pub skipped: usize,
}

impl SyncReport {
    fn record(&mut self, outcome: &ApplyOutcome) {
        self.cancelled += outcome.cancelled;
        self.generated += outcome.inserted;
        self.conflicts += outcome.conflicts.len();
    }
}

pub struct EventSynchronizer {
    shows: Arc<dyn ShowRepository>,
    events: Arc<dyn EventRepository>,
    clock: Arc<dyn Clock>,
    horizon_months: u32,
    cap: usize,
    locks: ShowLockMap,
}

impl EventSynchronizer {
    pub fn new(
        shows: Arc<dyn ShowRepository>,
        events: Arc<dyn EventRepository>,
        clock: Arc<dyn Clock>,
        settings: &SchedulingSettings,
    ) -> Self {
        Self {
            shows,
            events,
            clock,
            horizon_months: settings.horizon_months,
            cap: settings.max_generated_occurrences,
            locks: ShowLockMap::new(),
        }
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn locks(&self) -> &ShowLockMap {
        &self.locks
    }

    /// The horizon events are materialized up to, as of `now`.
    pub fn horizon(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        horizon_after(now, self.horizon_months)
    }

    // ── Entry points ─────────────────────────────────────────────────

    /// Store a new show and generate its events up to the horizon.
    pub async fn on_show_created(&self, show: Show) -> Result<SyncReport> {
        validate_show(&show)?;
        self.shows.upsert_show(show.clone()).await?;

        let _permit = self.locks.acquire(show.id).await?;
        let now = self.clock.now();
        let horizon = self.horizon(now);
        let generation = generate_events_for_show(&show, horizon, now, self.cap)?;

        let mut plan = SyncPlan::new(show.id, now);
        plan.record = Some(GenerationRecord {
            trigger: GenerationTrigger::NewShow,
            horizon: generation.covered_until,
        });
        let mut report = self.absorb(&show, generation, &mut plan);
        let outcome = self.events.apply(plan).await?;
        report.record(&outcome);
        self.log_outcome(&show, GenerationTrigger::NewShow, &outcome, &report);
        Ok(report)
    }

    /// Reconcile stored events after a template edit.
    ///
    /// Non-customized future events are cancelled and regenerated from the
    /// new template; customized ones are kept as they are. A change to
    /// `cancelled` is handled as a cancellation, and an edit that touches
    /// nothing schedule-relevant changes no events.
    pub async fn on_show_updated(&self, old: &Show, new: Show) -> Result<SyncReport> {
        if old.id != new.id {
            return Err(Error::InvalidInput(format!(
                "show id changed from {} to {}",
                old.id, new.id
            )));
        }
        if new.status == ShowStatus::Cancelled {
            return self.on_show_cancelled(new).await;
        }
        validate_show(&new)?;
        self.shows.upsert_show(new.clone()).await?;
        if !old.schedule_differs(&new) {
            tracing::debug!(show_id = %new.id, "show update has no schedule changes");
            return Ok(SyncReport::default());
        }

        let _permit = self.locks.acquire(new.id).await?;
        let now = self.clock.now();
        let horizon = self.horizon(now);

        let existing = self.events.future_events(new.id, now).await?;
        let mut plan = SyncPlan::new(new.id, now);
        let mut preserved = 0;
        for event in existing.iter().filter(|e| !e.status.is_cancelled()) {
            if event.is_customized {
                preserved += 1;
            } else {
                plan.cancel.push(event.id);
            }
        }

        let generation = generate_events_for_show(&new, horizon, now, self.cap)?;
        plan.record = Some(GenerationRecord {
            trigger: GenerationTrigger::ShowUpdate,
            horizon: generation.covered_until,
        });
        let mut report = self.absorb(&new, generation, &mut plan);
        report.preserved_customized = preserved;
        let outcome = self.events.apply(plan).await?;
        report.record(&outcome);
        self.log_outcome(&new, GenerationTrigger::ShowUpdate, &outcome, &report);
        Ok(report)
    }

    /// Mark the show cancelled and cancel every future scheduled event,
    /// customized or not.
    pub async fn on_show_cancelled(&self, mut show: Show) -> Result<SyncReport> {
        show.status = ShowStatus::Cancelled;
        self.shows.upsert_show(show.clone()).await?;

        let _permit = self.locks.acquire(show.id).await?;
        let now = self.clock.now();
        let mut plan = SyncPlan::new(show.id, now);
        plan.cancel = self
            .events
            .future_events(show.id, now)
            .await?
            .into_iter()
            .filter(|e| e.status == EventStatus::Scheduled)
            .map(|e| e.id)
            .collect();

        let outcome = self.events.apply(plan).await?;
        let mut report = SyncReport::default();
        report.record(&outcome);
        tracing::info!(
            show_id = %show.id,
            cancelled = report.cancelled,
            "show cancelled"
        );
        Ok(report)
    }

    /// Extend an active show's events to the current horizon.
    ///
    /// `show` only names the show; the template is re-read once the lock is
    /// held, so a show cancelled or edited since the caller loaded it is
    /// handled as it is now stored. Only the tail past the last recorded
    /// horizon is generated. When the stored horizon is already current
    /// nothing happens. The log entry is written together with the events,
    /// so a failed run leaves the stored horizon behind and the show is
    /// picked up again next cycle.
    pub async fn maintain_show(&self, show: &Show) -> Result<SyncReport> {
        let _permit = self.locks.acquire(show.id).await?;
        let show = match self.shows.get_show(show.id).await? {
            Some(current) if current.is_active() => current,
            _ => {
                tracing::debug!(show_id = %show.id, "show no longer active, skipping maintenance");
                return Ok(SyncReport::default());
            }
        };

        let now = self.clock.now();
        let target = self.horizon(now);
        let last = self.events.latest_generation(show.id).await?;

        let generation = match &last {
            Some(log) if log.horizon >= target => {
                tracing::trace!(show_id = %show.id, horizon = %log.horizon, "horizon is current");
                return Ok(SyncReport::default());
            }
            Some(log) => generate_events_after(&show, log.horizon, target, now, self.cap)?,
            None => generate_events_for_show(&show, target, now, self.cap)?,
        };

        let mut plan = SyncPlan::new(show.id, now);
        plan.record = Some(GenerationRecord {
            trigger: GenerationTrigger::Maintenance,
            horizon: generation.covered_until,
        });
        let mut report = self.absorb(&show, generation, &mut plan);
        let outcome = self.events.apply(plan).await?;
        report.record(&outcome);
        self.log_outcome(&show, GenerationTrigger::Maintenance, &outcome, &report);
        Ok(report)
    }

    /// Maintain the show with the given id, loading it from storage.
    pub async fn maintain_show_id(&self, id: Uuid) -> Result<SyncReport> {
        let show = self
            .shows
            .get_show(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("show {id}")))?;
        self.maintain_show(&show).await
    }

    // ── Helpers ──────────────────────────────────────────────────────

    /// Move drafts into the plan and log occurrences that were skipped.
    fn absorb(&self, show: &Show, generation: Generation, plan: &mut SyncPlan) -> SyncReport {
        for skip in &generation.skipped {
            tracing::warn!(show_id = %show.id, error = %skip, "occurrence skipped during generation");
        }
        plan.insert = generation.drafts;
        SyncReport {
            skipped: generation.skipped.len(),
            ..SyncReport::default()
        }
    }

    fn log_outcome(
        &self,
        show: &Show,
        trigger: GenerationTrigger,
        outcome: &ApplyOutcome,
        report: &SyncReport,
    ) {
        for conflict in &outcome.conflicts {
            tracing::debug!(show_id = %show.id, error = %conflict, "draft already stored");
        }
        tracing::info!(
            show_id = %show.id,
            %trigger,
            generated = report.generated,
            cancelled = report.cancelled,
            conflicts = report.conflicts,
            preserved = report.preserved_customized,
            skipped = report.skipped,
            "events synchronized"
        );
    }
}
