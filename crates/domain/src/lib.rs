//! Shared record types, configuration and errors for showplan.

pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod show;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Error, Result, SchedulingError, SchedulingErrorKind};
pub use event::{Event, EventDraft, EventEdit, EventGenerationLog, EventStatus, GenerationTrigger};
pub use show::{MonthlyDayFallback, RepeatPattern, SchedulingConfig, Show, ShowStatus};
