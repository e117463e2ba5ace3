//! Show scheduling: config validation, occurrence calculation and event
//! generation.
//!
//! Everything here is synchronous and free of I/O; callers pass `now`
//! explicitly.
//! - [`validation`] — Field-level checks on scheduling configs and shows
//! - [`calendar`] — Month arithmetic and timezone-aware composition
//! - [`recurrence`] — Validated config resolved into a closed rule
//! - [`occurrence`] — Future start instants for a show
//! - [`generator`] — Event drafts up to a horizon

pub mod calendar;
pub mod generator;
pub mod occurrence;
pub mod recurrence;
pub mod validation;

pub use calendar::parse_tz;
pub use generator::{
    generate_events_after, generate_events_for_show, horizon_after, three_month_horizon,
    Generation,
};
pub use occurrence::{calculate_next_occurrences, next_occurrence, OccurrenceCalculator, Occurrences};
pub use recurrence::{Recurrence, WeekOfMonth};
pub use validation::{validate_scheduling_config, validate_show};
