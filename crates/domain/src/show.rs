//! Show template model — recurrence pattern, scheduling config, timing.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Enums
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// How often a show repeats.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RepeatPattern {
    /// A one-off show on `first_event_date`.
    None,
    Daily,
    Weekly,
    /// Every other week, anchored on `first_event_date`.
    Biweekly,
    Monthly,
}

impl RepeatPattern {
    /// Step in days between two runs of the same weekday, for the
    /// week-based patterns.
    pub fn week_interval_days(self) -> Option<i64> {
        match self {
            Self::Weekly => Some(7),
            Self::Biweekly => Some(14),
            Self::None | Self::Daily | Self::Monthly => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ShowStatus {
    Active,
    Paused,
    Completed,
    Cancelled,
}

impl Default for ShowStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// What a calendar-day monthly show does when the day does not exist in
/// a month (e.g. the 31st in April).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MonthlyDayFallback {
    /// Use the last calendar day of the month instead.
    LastDay,
    /// The month gets no occurrence.
    Skip,
}

impl Default for MonthlyDayFallback {
    fn default() -> Self {
        Self::LastDay
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Scheduling config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Pattern-specific refinement of *which* days a show falls on.
///
/// Fields are kept exactly as submitted so the validator can report
/// illegal combinations. Only one group applies for a given pattern:
/// `weekdays` (weekly/biweekly), `monthly_weekday` + `monthly_week_number`,
/// or `monthly_day` (+ optional `monthly_day_fallback`).
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchedulingConfig {
    /// Weekday numbers, 0 = Sunday .. 6 = Saturday.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekdays: Option<Vec<i32>>,
    /// Weekday number (0 = Sunday) for nth/last-weekday-of-month.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_weekday: Option<i32>,
    /// 1..=4, or -1 for the last one in the month.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_week_number: Option<i32>,
    /// Calendar day of the month, 1..=31.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_day: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_day_fallback: Option<MonthlyDayFallback>,
}

impl SchedulingConfig {
    pub fn weekly(weekdays: Vec<i32>) -> Self {
        Self {
            weekdays: Some(weekdays),
            ..Self::default()
        }
    }

    pub fn monthly_weekday(weekday: i32, week_number: i32) -> Self {
        Self {
            monthly_weekday: Some(weekday),
            monthly_week_number: Some(week_number),
            ..Self::default()
        }
    }

    pub fn monthly_day(day: i32, fallback: Option<MonthlyDayFallback>) -> Self {
        Self {
            monthly_day: Some(day),
            monthly_day_fallback: fallback,
            ..Self::default()
        }
    }

    /// True when any field of the weekday-of-month group is set.
    pub fn has_monthly_weekday_group(&self) -> bool {
        self.monthly_weekday.is_some() || self.monthly_week_number.is_some()
    }

    /// True when any field of the calendar-day group is set.
    pub fn has_monthly_day_group(&self) -> bool {
        self.monthly_day.is_some() || self.monthly_day_fallback.is_some()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Show model
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_version() -> u64 {
    1
}

/// A recurring show template from which events are materialized.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Show {
    pub id: Uuid,
    pub name: String,
    pub repeat_pattern: RepeatPattern,
    #[serde(default)]
    pub scheduling_config: Option<SchedulingConfig>,
    /// Wall-clock start, interpreted in `timezone`.
    pub start_time: NaiveTime,
    pub length_minutes: u32,
    pub first_event_date: NaiveDate,
    /// IANA timezone name the show's dates and start time live in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub status: ShowStatus,
    /// Bumped on every template edit; copied onto generated events.
    #[serde(default = "default_version")]
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Show {
    pub fn new(
        name: impl Into<String>,
        repeat_pattern: RepeatPattern,
        first_event_date: NaiveDate,
        start_time: NaiveTime,
        length_minutes: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            repeat_pattern,
            scheduling_config: None,
            start_time,
            length_minutes,
            first_event_date,
            timezone: default_timezone(),
            status: ShowStatus::Active,
            version: default_version(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_config(mut self, config: SchedulingConfig) -> Self {
        self.scheduling_config = Some(config);
        self
    }

    pub fn with_timezone(mut self, tz: impl Into<String>) -> Self {
        self.timezone = tz.into();
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == ShowStatus::Active
    }

    /// Record a template edit made at `at`.
    pub fn bump_version(&mut self, at: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = at;
    }

    /// True when `other` differs in anything that affects the events
    /// materialized from this template.
    pub fn schedule_differs(&self, other: &Show) -> bool {
        self.repeat_pattern != other.repeat_pattern
            || self.scheduling_config != other.scheduling_config
            || self.start_time != other.start_time
            || self.length_minutes != other.length_minutes
            || self.first_event_date != other.first_event_date
            || self.timezone != other.timezone
            || self.status != other.status
            || self.version != other.version
            || self.name != other.name
    }
}
