//! One-shot commands that drive the synchronizer from JSON files.

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use sp_domain::event::EventEdit;
use sp_domain::show::{RepeatPattern, SchedulingConfig, Show, ShowStatus};

use crate::runtime::schedules::calculate_next_occurrences;
use crate::runtime::{EventRepository, ShowRepository, SyncReport};
use crate::state::AppState;

/// A show template as written by hand. Bookkeeping fields (`version`,
/// timestamps) are managed by showplan.
#[derive(Debug, Deserialize)]
pub struct ShowFile {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    pub repeat_pattern: RepeatPattern,
    #[serde(default)]
    pub scheduling_config: Option<SchedulingConfig>,
    pub start_time: NaiveTime,
    pub length_minutes: u32,
    pub first_event_date: NaiveDate,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub status: Option<ShowStatus>,
}

impl ShowFile {
    pub fn read(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn into_new_show(self) -> Show {
        let mut show = Show::new(
            self.name,
            self.repeat_pattern,
            self.first_event_date,
            self.start_time,
            self.length_minutes,
        );
        if let Some(id) = self.id {
            show.id = id;
        }
        show.scheduling_config = self.scheduling_config;
        if let Some(tz) = self.timezone {
            show.timezone = tz;
        }
        if let Some(status) = self.status {
            show.status = status;
        }
        show
    }

    /// The edited template for `existing`, with the version bumped when
    /// anything schedule-relevant changed.
    pub fn apply_to(self, existing: &Show, now: DateTime<Utc>) -> Show {
        let mut show = existing.clone();
        show.name = self.name;
        show.repeat_pattern = self.repeat_pattern;
        show.scheduling_config = self.scheduling_config;
        show.start_time = self.start_time;
        show.length_minutes = self.length_minutes;
        show.first_event_date = self.first_event_date;
        if let Some(tz) = self.timezone {
            show.timezone = tz;
        }
        if let Some(status) = self.status {
            show.status = status;
        }
        if existing.schedule_differs(&show) {
            show.bump_version(now);
        }
        show
    }
}

fn print_report(report: &SyncReport) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

async fn load_show(state: &AppState, id: Uuid) -> anyhow::Result<Show> {
    state
        .store
        .get_show(id)
        .await?
        .with_context(|| format!("show {id} not found"))
}

pub async fn add(state: &AppState, file: &Path) -> anyhow::Result<()> {
    let show = ShowFile::read(file)?.into_new_show();
    let id = show.id;
    let report = state.sync.on_show_created(show).await?;
    println!("created show {id}");
    print_report(&report)
}

pub async fn update(state: &AppState, file: &Path) -> anyhow::Result<()> {
    let input = ShowFile::read(file)?;
    let id = input
        .id
        .with_context(|| format!("{} has no `id`", file.display()))?;
    let existing = load_show(state, id).await?;
    let updated = input.apply_to(&existing, state.sync.clock().now());
    let report = state.sync.on_show_updated(&existing, updated).await?;
    print_report(&report)
}

pub async fn cancel(state: &AppState, id: Uuid) -> anyhow::Result<()> {
    let mut show = load_show(state, id).await?;
    show.bump_version(state.sync.clock().now());
    let report = state.sync.on_show_cancelled(show).await?;
    print_report(&report)
}

pub async fn list(state: &AppState) -> anyhow::Result<()> {
    let now = state.sync.clock().now();
    for show in state.store.list_shows().await? {
        let next = calculate_next_occurrences(&show, 1, now)
            .first()
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".into());
        println!(
            "{}  {:<9}  {:<9}  v{:<3}  next={}  {}",
            show.id,
            format!("{:?}", show.repeat_pattern).to_lowercase(),
            format!("{:?}", show.status).to_lowercase(),
            show.version,
            next,
            show.name,
        );
    }
    Ok(())
}

pub async fn next(state: &AppState, id: Uuid, count: Option<usize>) -> anyhow::Result<()> {
    let show = load_show(state, id).await?;
    let count = count.unwrap_or(state.config.scheduling.preview_occurrences);
    let times = calculate_next_occurrences(&show, count, state.sync.clock().now());
    if times.is_empty() {
        println!("no upcoming occurrences for {}", show.name);
    }
    for t in times {
        println!("{}", t.to_rfc3339());
    }
    Ok(())
}

pub async fn events(state: &AppState, id: Uuid) -> anyhow::Result<()> {
    for e in state.store.list_events(id).await? {
        println!(
            "{}  {} → {}  {:<9}  {}{}",
            e.id,
            e.start_date_time.to_rfc3339(),
            e.end_date_time.to_rfc3339(),
            format!("{:?}", e.status).to_lowercase(),
            e.title,
            if e.is_customized { "  (customized)" } else { "" },
        );
    }
    Ok(())
}

pub async fn edit_event(state: &AppState, event_id: Uuid, file: &Path) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let edit: EventEdit =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", file.display()))?;
    let event = state.store.update_event(event_id, edit).await?;
    println!("{}", serde_json::to_string_pretty(&event)?);
    Ok(())
}

pub async fn maintain(state: &AppState, show_id: Option<Uuid>) -> anyhow::Result<()> {
    if let Some(id) = show_id {
        let report = state.sync.maintain_show_id(id).await?;
        return print_report(&report);
    }
    let summary = state.maintenance.tick().await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
