//! Materialized event instances and the generation audit log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Scheduled,
    Live,
    Completed,
    Cancelled,
    Postponed,
}

impl EventStatus {
    pub fn is_cancelled(self) -> bool {
        self == Self::Cancelled
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Event
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A persisted, individually editable instance of a show.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub id: Uuid,
    pub show_id: Uuid,
    pub title: String,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub status: EventStatus,
    /// Set once a user edits any field. Customized events are never
    /// touched by resynchronization.
    #[serde(default)]
    pub is_customized: bool,
    pub show_version: u64,
    pub generated_at: DateTime<Utc>,
    pub last_synced_at: DateTime<Utc>,
}

impl Event {
    /// Materialize a draft into a stored event.
    pub fn from_draft(draft: EventDraft, synced_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            show_id: draft.show_id,
            title: draft.title,
            start_date_time: draft.start_date_time,
            end_date_time: draft.end_date_time,
            status: draft.status,
            is_customized: draft.is_customized,
            show_version: draft.show_version,
            generated_at: draft.generated_at,
            last_synced_at: synced_at,
        }
    }

    /// Apply a user edit. Any applied edit marks the event customized.
    pub fn apply_edit(&mut self, edit: EventEdit) -> Result<()> {
        let start = edit.start_date_time.unwrap_or(self.start_date_time);
        let end = edit.end_date_time.unwrap_or(self.end_date_time);
        if end <= start {
            return Err(Error::InvalidInput(format!(
                "event end {end} must be after start {start}"
            )));
        }
        if let Some(title) = edit.title {
            self.title = title;
        }
        if let Some(status) = edit.status {
            self.status = status;
        }
        self.start_date_time = start;
        self.end_date_time = end;
        self.is_customized = true;
        Ok(())
    }
}

/// An event produced by the generator, not yet persisted.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EventDraft {
    pub show_id: Uuid,
    pub title: String,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub status: EventStatus,
    pub is_customized: bool,
    pub show_version: u64,
    pub generated_at: DateTime<Utc>,
}

/// A user-submitted change to a single event. `None` leaves a field alone.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventEdit {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub start_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<EventStatus>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Generation log
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Why a generation run happened.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GenerationTrigger {
    NewShow,
    ShowUpdate,
    Maintenance,
}

impl std::fmt::Display for GenerationTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NewShow => "new_show",
            Self::ShowUpdate => "show_update",
            Self::Maintenance => "maintenance",
        };
        f.write_str(s)
    }
}

/// Append-only audit record, one per generation run.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct EventGenerationLog {
    pub id: Uuid,
    pub show_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub events_generated: usize,
    /// Horizon the show's events are materialized up to after this run.
    pub horizon: DateTime<Utc>,
    pub trigger: GenerationTrigger,
}

impl EventGenerationLog {
    pub fn new(
        show_id: Uuid,
        generated_at: DateTime<Utc>,
        events_generated: usize,
        horizon: DateTime<Utc>,
        trigger: GenerationTrigger,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            show_id,
            generated_at,
            events_generated,
            horizon,
            trigger,
        }
    }
}
