//! Resolved recurrence rules.
//!
//! [`SchedulingConfig`] keeps whatever the caller submitted so the
//! validator can point at bad fields. Once a config has passed validation
//! it is resolved, together with the show's pattern and first date, into a
//! closed [`Recurrence`] that the calculator matches on exhaustively.

use chrono::{Datelike, Weekday};
use sp_domain::error::SchedulingError;
use sp_domain::show::{MonthlyDayFallback, RepeatPattern, SchedulingConfig, Show};

use super::calendar::weekday_from_sunday;
use super::validation::validate_scheduling_config;

/// Which occurrence of a weekday inside a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekOfMonth {
    /// 1..=4
    Nth(u32),
    Last,
}

impl WeekOfMonth {
    fn from_week_number(n: i32) -> Option<Self> {
        match n {
            -1 => Some(Self::Last),
            1..=4 => Some(Self::Nth(n as u32)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recurrence {
    /// Once, on the first event date.
    Single,
    Daily,
    /// Every `interval_days` (7 or 14) on each of `weekdays`, sorted and
    /// without duplicates.
    Weekly {
        interval_days: i64,
        weekdays: Vec<Weekday>,
    },
    MonthlyWeekday {
        weekday: Weekday,
        week: WeekOfMonth,
    },
    MonthlyDay {
        day: u32,
        fallback: MonthlyDayFallback,
    },
}

impl Recurrence {
    /// Validate the show's scheduling config and resolve it, filling in
    /// defaults from `first_event_date` where the config is absent.
    pub fn resolve(show: &Show) -> Result<Self, SchedulingError> {
        let config = show.scheduling_config.as_ref();
        validate_scheduling_config(show.repeat_pattern, config)?;

        let first = show.first_event_date;
        let resolved = match show.repeat_pattern {
            RepeatPattern::None => Self::Single,
            RepeatPattern::Daily => Self::Daily,
            RepeatPattern::Weekly | RepeatPattern::Biweekly => {
                let interval_days = show.repeat_pattern.week_interval_days().unwrap_or(7);
                let mut weekdays: Vec<Weekday> = config
                    .and_then(|c| c.weekdays.as_ref())
                    .map(|days| days.iter().filter_map(|&d| weekday_from_sunday(d)).collect())
                    .unwrap_or_default();
                if weekdays.is_empty() {
                    weekdays.push(first.weekday());
                }
                weekdays.sort_by_key(|w| w.num_days_from_sunday());
                weekdays.dedup();
                Self::Weekly {
                    interval_days,
                    weekdays,
                }
            }
            RepeatPattern::Monthly => resolve_monthly(config, first.day()),
        };
        Ok(resolved)
    }
}

fn resolve_monthly(config: Option<&SchedulingConfig>, first_day: u32) -> Recurrence {
    let weekday_rule = config.and_then(|c| {
        let weekday = c.monthly_weekday.and_then(weekday_from_sunday)?;
        let week = c.monthly_week_number.and_then(WeekOfMonth::from_week_number)?;
        Some(Recurrence::MonthlyWeekday { weekday, week })
    });
    if let Some(rule) = weekday_rule {
        return rule;
    }

    let day = config
        .and_then(|c| c.monthly_day)
        .and_then(|d| u32::try_from(d).ok())
        .unwrap_or(first_day);
    let fallback = config
        .and_then(|c| c.monthly_day_fallback)
        .unwrap_or_default();
    Recurrence::MonthlyDay { day, fallback }
}
