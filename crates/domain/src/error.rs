use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Shared error type used across all showplan crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Scheduling(#[from] SchedulingError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Scheduling errors
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Coarse classification of a [`SchedulingError`], for callers that only
/// need to branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulingErrorKind {
    ConfigValidation,
    GenerationInconsistency,
    SynchronizationConflict,
}

/// Errors raised by the occurrence/event pipeline.
///
/// Only [`SchedulingError::ConfigValidation`] is meant to reach an end
/// user. The other two kinds are absorbed by the generator and the
/// synchronizer and end up in logs and sync reports.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulingError {
    #[error("invalid scheduling config: {}", join_violations(.violations))]
    ConfigValidation { violations: Vec<FieldViolation> },

    #[error("show {show_id}: occurrence on {date} could not be dated: {reason}")]
    GenerationInconsistency {
        show_id: Uuid,
        date: NaiveDate,
        reason: String,
    },

    #[error("show {show_id}: an event already exists at {start}")]
    SynchronizationConflict { show_id: Uuid, start: DateTime<Utc> },
}

impl SchedulingError {
    pub fn kind(&self) -> SchedulingErrorKind {
        match self {
            Self::ConfigValidation { .. } => SchedulingErrorKind::ConfigValidation,
            Self::GenerationInconsistency { .. } => SchedulingErrorKind::GenerationInconsistency,
            Self::SynchronizationConflict { .. } => SchedulingErrorKind::SynchronizationConflict,
        }
    }

    pub fn is_user_facing(&self) -> bool {
        self.kind() == SchedulingErrorKind::ConfigValidation
    }

    /// Violations carried by a validation failure (empty for other kinds).
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            Self::ConfigValidation { violations } => violations,
            _ => &[],
        }
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub constraint: Constraint,
}

impl FieldViolation {
    pub fn new(field: &'static str, constraint: Constraint) -> Self {
        Self { field, constraint }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.constraint)
    }
}

/// The rule a field broke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// The field must be present for this pattern.
    Required,
    /// The field belongs to another pattern and must be left out.
    MustBeAbsent,
    /// A present collection must not be empty.
    Empty,
    OutOfRange { value: i64, min: i64, max: i64 },
    NotAllowed { value: i64 },
    MutuallyExclusive { with: &'static str },
    /// Neither this field nor its alternative group was supplied.
    RequiresOneOf { with: &'static str },
    /// Not a known IANA timezone name.
    UnknownTimezone { value: String },
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "is required"),
            Self::MustBeAbsent => write!(f, "must be absent for this pattern"),
            Self::Empty => write!(f, "must not be empty"),
            Self::OutOfRange { value, min, max } => {
                write!(f, "value {value} out of range {min}..={max}")
            }
            Self::NotAllowed { value } => write!(f, "value {value} is not allowed"),
            Self::MutuallyExclusive { with } => write!(f, "cannot be combined with {with}"),
            Self::RequiresOneOf { with } => write!(f, "is required unless {with} is set"),
            Self::UnknownTimezone { value } => {
                write!(f, "'{value}' is not an IANA timezone name like 'America/New_York' or 'UTC'")
            }
        }
    }
}
