//! Storage boundary for shows, events and the generation log.
//!
//! The synchronizer talks to the [`ShowRepository`] and [`EventRepository`]
//! traits. [`JsonStore`] implements both over three files in the state
//! directory: `shows.json`, `events.json` and `generation_log.jsonl`, guarded
//! by an `fs2` lock on `state.lock`.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use sp_domain::error::{Error, Result, SchedulingError};
use sp_domain::event::{Event, EventDraft, EventEdit, EventGenerationLog, EventStatus, GenerationTrigger};
use sp_domain::show::Show;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Repository traits
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[async_trait]
pub trait ShowRepository: Send + Sync {
    async fn list_shows(&self) -> Result<Vec<Show>>;
    async fn active_shows(&self) -> Result<Vec<Show>>;
    async fn get_show(&self, id: Uuid) -> Result<Option<Show>>;
    async fn upsert_show(&self, show: Show) -> Result<()>;
}

#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Events of a show starting strictly after `now`, in any status.
    async fn future_events(&self, show_id: Uuid, now: DateTime<Utc>) -> Result<Vec<Event>>;
    /// Every stored event of a show, ordered by start.
    async fn list_events(&self, show_id: Uuid) -> Result<Vec<Event>>;
    async fn latest_generation(&self, show_id: Uuid) -> Result<Option<EventGenerationLog>>;
    /// Apply a plan as one unit: cancellations, then inserts, then the log
    /// entry. Either all of it is stored or none of it.
    async fn apply(&self, plan: SyncPlan) -> Result<ApplyOutcome>;
    /// Apply a user edit; the event becomes customized.
    async fn update_event(&self, id: Uuid, edit: EventEdit) -> Result<Event>;
}

/// Changes for one show computed by a synchronization run.
#[derive(Debug, Clone)]
pub struct SyncPlan {
    pub show_id: Uuid,
    pub at: DateTime<Utc>,
    pub cancel: Vec<Uuid>,
    pub insert: Vec<EventDraft>,
    /// When set, a generation log entry is appended with the number of
    /// drafts actually inserted.
    pub record: Option<GenerationRecord>,
}

#[derive(Debug, Clone, Copy)]
pub struct GenerationRecord {
    pub trigger: GenerationTrigger,
    pub horizon: DateTime<Utc>,
}

impl SyncPlan {
    pub fn new(show_id: Uuid, at: DateTime<Utc>) -> Self {
        Self {
            show_id,
            at,
            cancel: Vec::new(),
            insert: Vec::new(),
            record: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApplyOutcome {
    pub cancelled: usize,
    pub inserted: usize,
    /// Drafts rejected because a live event already starts at that instant.
    pub conflicts: Vec<SchedulingError>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// JsonStore
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Default)]
struct StoreState {
    shows: HashMap<Uuid, Show>,
    events: Vec<Event>,
    log: Vec<EventGenerationLog>,
}

impl StoreState {
    /// A non-cancelled event of `show_id` already starts at `start`.
    fn occupied(&self, show_id: Uuid, start: DateTime<Utc>) -> bool {
        self.events
            .iter()
            .any(|e| e.show_id == show_id && e.start_date_time == start && !e.status.is_cancelled())
    }
}

/// Which files a mutation touched.
#[derive(Debug, Clone, Copy, Default)]
struct Dirty {
    shows: bool,
    events: bool,
    log: bool,
}

/// File-backed store shared by the daemon and one-shot CLI commands.
///
/// Nothing is cached between calls. Every read loads the files under a
/// shared lock on `state.lock` and every mutation reloads, changes and
/// rewrites them under an exclusive one, so several processes on the same
/// state directory see each other's writes and the `(show, start)` check
/// runs against what is actually on disk.
pub struct JsonStore {
    files: StateFiles,
    /// Serializes writers within this process.
    writer: Mutex<()>,
}

impl JsonStore {
    /// Open (or start) a store under `state_path`. Missing files mean an
    /// empty store; unreadable ones are an error.
    pub fn open(state_path: &Path) -> Result<Self> {
        std::fs::create_dir_all(state_path)?;
        let files = StateFiles::new(state_path);
        let state = {
            let _lock = files.lock(false)?;
            files.load()?
        };

        tracing::info!(
            shows = state.shows.len(),
            events = state.events.len(),
            log_entries = state.log.len(),
            path = %state_path.display(),
            "loaded state from disk"
        );

        Ok(Self {
            files,
            writer: Mutex::new(()),
        })
    }

    /// Current on-disk state.
    async fn snapshot(&self) -> Result<StoreState> {
        let files = self.files.clone();
        tokio::task::spawn_blocking(move || -> Result<StoreState> {
            let _lock = files.lock(false)?;
            files.load()
        })
        .await
        .map_err(|e| Error::Storage(format!("load task failed: {e}")))?
    }

    /// Reload, change and persist the state as one locked unit. Nothing is
    /// written when `change` fails.
    async fn mutate<T, F>(&self, change: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut StoreState) -> Result<(T, Dirty)> + Send + 'static,
    {
        let _writer = self.writer.lock().await;
        let files = self.files.clone();
        tokio::task::spawn_blocking(move || -> Result<T> {
            let _lock = files.lock(true)?;
            let mut state = files.load()?;
            let (out, dirty) = change(&mut state)?;
            files.persist(&state, dirty)?;
            Ok(out)
        })
        .await
        .map_err(|e| Error::Storage(format!("persist task failed: {e}")))?
    }
}

#[async_trait]
impl ShowRepository for JsonStore {
    async fn list_shows(&self) -> Result<Vec<Show>> {
        let mut shows: Vec<Show> = self.snapshot().await?.shows.into_values().collect();
        shows.sort_by_key(|s| s.created_at);
        Ok(shows)
    }

    async fn active_shows(&self) -> Result<Vec<Show>> {
        let mut shows = self.list_shows().await?;
        shows.retain(Show::is_active);
        Ok(shows)
    }

    async fn get_show(&self, id: Uuid) -> Result<Option<Show>> {
        Ok(self.snapshot().await?.shows.remove(&id))
    }

    async fn upsert_show(&self, show: Show) -> Result<()> {
        self.mutate(move |state| {
            state.shows.insert(show.id, show);
            Ok((
                (),
                Dirty {
                    shows: true,
                    ..Dirty::default()
                },
            ))
        })
        .await
    }
}

#[async_trait]
impl EventRepository for JsonStore {
    async fn future_events(&self, show_id: Uuid, now: DateTime<Utc>) -> Result<Vec<Event>> {
        let mut events = self.snapshot().await?.events;
        events.retain(|e| e.show_id == show_id && e.start_date_time > now);
        events.sort_by_key(|e| e.start_date_time);
        Ok(events)
    }

    async fn list_events(&self, show_id: Uuid) -> Result<Vec<Event>> {
        let mut events = self.snapshot().await?.events;
        events.retain(|e| e.show_id == show_id);
        events.sort_by_key(|e| e.start_date_time);
        Ok(events)
    }

    async fn latest_generation(&self, show_id: Uuid) -> Result<Option<EventGenerationLog>> {
        let state = self.snapshot().await?;
        Ok(state.log.into_iter().rev().find(|l| l.show_id == show_id))
    }

    async fn apply(&self, plan: SyncPlan) -> Result<ApplyOutcome> {
        self.mutate(move |state| {
            let mut outcome = ApplyOutcome::default();

            for event in state.events.iter_mut() {
                if plan.cancel.contains(&event.id) && !event.status.is_cancelled() {
                    event.status = EventStatus::Cancelled;
                    event.last_synced_at = plan.at;
                    outcome.cancelled += 1;
                }
            }

            for draft in plan.insert {
                if state.occupied(draft.show_id, draft.start_date_time) {
                    outcome.conflicts.push(SchedulingError::SynchronizationConflict {
                        show_id: draft.show_id,
                        start: draft.start_date_time,
                    });
                    continue;
                }
                state.events.push(Event::from_draft(draft, plan.at));
                outcome.inserted += 1;
            }

            if let Some(record) = plan.record {
                state.log.push(EventGenerationLog::new(
                    plan.show_id,
                    plan.at,
                    outcome.inserted,
                    record.horizon,
                    record.trigger,
                ));
            }

            let dirty = Dirty {
                shows: false,
                events: outcome.cancelled > 0 || outcome.inserted > 0,
                log: plan.record.is_some(),
            };
            Ok((outcome, dirty))
        })
        .await
    }

    async fn update_event(&self, id: Uuid, edit: EventEdit) -> Result<Event> {
        self.mutate(move |state| {
            let index = state
                .events
                .iter()
                .position(|e| e.id == id)
                .ok_or_else(|| Error::NotFound(format!("event {id}")))?;
            let mut event = state.events[index].clone();
            event.apply_edit(edit)?;

            let clash = state.events.iter().any(|e| {
                e.id != id
                    && e.show_id == event.show_id
                    && e.start_date_time == event.start_date_time
                    && !e.status.is_cancelled()
            });
            if clash && !event.status.is_cancelled() {
                return Err(Error::InvalidInput(format!(
                    "another event of show {} already starts at {}",
                    event.show_id, event.start_date_time
                )));
            }

            state.events[index] = event.clone();
            Ok((
                event,
                Dirty {
                    events: true,
                    ..Dirty::default()
                },
            ))
        })
        .await
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// File helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone)]
struct StateFiles {
    shows: PathBuf,
    events: PathBuf,
    log: PathBuf,
    lock: PathBuf,
}

impl StateFiles {
    fn new(dir: &Path) -> Self {
        Self {
            shows: dir.join("shows.json"),
            events: dir.join("events.json"),
            log: dir.join("generation_log.jsonl"),
            lock: dir.join("state.lock"),
        }
    }

    /// Take the advisory lock on `state.lock`. It is released when the
    /// returned file is dropped.
    fn lock(&self, exclusive: bool) -> Result<File> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock)?;
        if exclusive {
            fs2::FileExt::lock_exclusive(&file)?;
        } else {
            fs2::FileExt::lock_shared(&file)?;
        }
        Ok(file)
    }

    fn load(&self) -> Result<StoreState> {
        let shows: Vec<Show> = read_json(&self.shows)?.unwrap_or_default();
        Ok(StoreState {
            shows: shows.into_iter().map(|s| (s.id, s)).collect(),
            events: read_json(&self.events)?.unwrap_or_default(),
            log: read_jsonl(&self.log)?,
        })
    }

    fn persist(&self, state: &StoreState, dirty: Dirty) -> Result<()> {
        if dirty.shows {
            let mut shows: Vec<&Show> = state.shows.values().collect();
            shows.sort_by_key(|s| s.created_at);
            write_atomic(&self.shows, &serde_json::to_vec_pretty(&shows)?)?;
        }
        if dirty.events {
            write_atomic(&self.events, &serde_json::to_vec_pretty(&state.events)?)?;
        }
        if dirty.log {
            let mut buf = Vec::new();
            for entry in &state.log {
                serde_json::to_writer(&mut buf, entry)?;
                buf.push(b'\n');
            }
            write_atomic(&self.log, &buf)?;
        }
        Ok(())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match std::fs::read_to_string(path) {
        Ok(data) => Ok(Some(serde_json::from_str(&data)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn read_jsonl<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut entries = Vec::new();
    for line in data.lines().filter(|l| !l.trim().is_empty()) {
        match serde_json::from_str(line) {
            Ok(entry) => entries.push(entry),
            Err(e) => tracing::warn!(error = %e, path = %path.display(), "skipping malformed log line"),
        }
    }
    Ok(entries)
}

/// Write `bytes` to a sibling temp file and rename it over `path`.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
