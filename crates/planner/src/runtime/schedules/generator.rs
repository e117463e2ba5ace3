//! Event generation: occurrences up to a horizon become event drafts.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use sp_domain::error::SchedulingError;
use sp_domain::event::{EventDraft, EventStatus};
use sp_domain::show::Show;

use sp_domain::config::DEFAULT_HORIZON_MONTHS;

use super::calendar::{add_months, first_of_month};
use super::occurrence::OccurrenceCalculator;

/// Last second (UTC) of the month `months` after the current UTC month.
///
/// `now` in January with `months = 3` gives April 30, 23:59:59.
pub fn horizon_after(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    let (year, month) = add_months(now.year(), now.month(), i64::from(months) + 1);
    first_of_month(year, month)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .and_then(|naive| Utc.from_local_datetime(&naive).single())
        .map(|start_of_next| start_of_next - Duration::seconds(1))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// The shared rolling horizon: end of the current month plus three more.
pub fn three_month_horizon(now: DateTime<Utc>) -> DateTime<Utc> {
    horizon_after(now, DEFAULT_HORIZON_MONTHS)
}

/// Drafts produced by one generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub drafts: Vec<EventDraft>,
    /// Occurrences that could not be turned into an event.
    pub skipped: Vec<SchedulingError>,
    /// Every occurrence up to and including this instant was considered.
    /// Equals the requested horizon unless the cap ran out first, in which
    /// case it is the last occurrence the calculator returned.
    pub covered_until: DateTime<Utc>,
}

impl Generation {
    fn empty(covered_until: DateTime<Utc>) -> Self {
        Self {
            drafts: Vec::new(),
            skipped: Vec::new(),
            covered_until,
        }
    }
}

/// Generate drafts for every occurrence after `now` up to and including
/// `horizon`. Inactive shows produce nothing; an invalid config is an error.
pub fn generate_events_for_show(
    show: &Show,
    horizon: DateTime<Utc>,
    now: DateTime<Utc>,
    cap: usize,
) -> Result<Generation, SchedulingError> {
    generate_events_after(show, now, horizon, now, cap)
}

/// Like [`generate_events_for_show`] but only for occurrences strictly
/// after `after`, used to fill the tail beyond an earlier horizon.
pub fn generate_events_after(
    show: &Show,
    after: DateTime<Utc>,
    horizon: DateTime<Utc>,
    now: DateTime<Utc>,
    cap: usize,
) -> Result<Generation, SchedulingError> {
    if !show.is_active() || horizon <= now {
        return Ok(Generation::empty(horizon));
    }

    let from = after.max(now);
    let calc = OccurrenceCalculator::new(show)?;
    let occurrences = calc.next(cap, from);

    let mut generation = Generation::empty(horizon);
    if occurrences.times.len() >= cap {
        // The cap ran out; anything past the last occurrence is unseen.
        generation.covered_until = match occurrences.times.last() {
            Some(&last) if last < horizon => last,
            Some(_) => horizon,
            None => from,
        };
    }
    generation.skipped = occurrences.skipped;

    let length = Duration::minutes(i64::from(show.length_minutes));
    for start in occurrences.times {
        if start <= now {
            continue;
        }
        if start > horizon {
            break;
        }
        let end = start + length;
        if end <= start {
            generation.skipped.push(SchedulingError::GenerationInconsistency {
                show_id: show.id,
                date: start.date_naive(),
                reason: format!("length of {} minutes leaves no duration", show.length_minutes),
            });
            continue;
        }
        generation.drafts.push(EventDraft {
            show_id: show.id,
            title: show.name.clone(),
            start_date_time: start,
            end_date_time: end,
            status: EventStatus::Scheduled,
            is_customized: false,
            show_version: show.version,
            generated_at: now,
        });
    }

    Ok(generation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use sp_domain::config::DEFAULT_MAX_GENERATED;
    use sp_domain::show::{RepeatPattern, SchedulingConfig, ShowStatus};

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn weekly_show() -> Show {
        Show::new(
            "Drive Time",
            RepeatPattern::Weekly,
            NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            90,
        )
        .with_config(SchedulingConfig::weekly(vec![1, 3, 5]))
    }

    #[test]
    fn horizon_is_end_of_third_following_month() {
        assert_eq!(
            three_month_horizon(utc(2025, 1, 15, 12, 0, 0)),
            utc(2025, 4, 30, 23, 59, 59)
        );
        assert_eq!(
            three_month_horizon(utc(2025, 11, 1, 0, 0, 0)),
            utc(2026, 2, 28, 23, 59, 59)
        );
        assert_eq!(horizon_after(utc(2025, 1, 31, 23, 0, 0), 1), utc(2025, 2, 28, 23, 59, 59));
    }

    #[test]
    fn drafts_cover_horizon_with_end_times() {
        let show = weekly_show();
        let now = utc(2025, 1, 1, 0, 0, 0);
        let horizon = three_month_horizon(now);
        let out = generate_events_for_show(&show, horizon, now, DEFAULT_MAX_GENERATED).unwrap();

        assert!(!out.drafts.is_empty());
        assert!(out.skipped.is_empty());
        assert_eq!(out.drafts[0].start_date_time, utc(2025, 1, 6, 17, 0, 0));
        for d in &out.drafts {
            assert!(d.start_date_time > now);
            assert!(d.start_date_time <= horizon);
            assert_eq!(d.end_date_time - d.start_date_time, Duration::minutes(90));
            assert_eq!(d.status, EventStatus::Scheduled);
            assert!(!d.is_customized);
            assert_eq!(d.show_version, show.version);
            assert_eq!(d.generated_at, now);
            assert_eq!(d.title, "Drive Time");
        }
        // Last Mon/Wed/Fri on or before April 30, 2025 is Wednesday the 30th.
        assert_eq!(
            out.drafts.last().unwrap().start_date_time,
            utc(2025, 4, 30, 17, 0, 0)
        );
    }

    #[test]
    fn occurrence_on_horizon_is_included() {
        let show = Show::new(
            "Late",
            RepeatPattern::Daily,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveTime::from_hms_opt(23, 59, 59).unwrap(),
            1,
        );
        let now = utc(2025, 1, 1, 0, 0, 0);
        let horizon = horizon_after(now, 0);
        let out = generate_events_for_show(&show, horizon, now, 100).unwrap();
        assert_eq!(out.drafts.len(), 31);
        assert_eq!(out.drafts.last().unwrap().start_date_time, horizon);
    }

    #[test]
    fn small_cap_reports_how_far_it_got() {
        let show = Show::new(
            "Morning Mix",
            RepeatPattern::Daily,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            60,
        );
        let now = utc(2025, 1, 1, 0, 0, 0);
        let horizon = three_month_horizon(now);

        let short = generate_events_for_show(&show, horizon, now, 10).unwrap();
        assert_eq!(short.drafts.len(), 10);
        assert_eq!(short.covered_until, utc(2025, 1, 10, 9, 0, 0));

        let rest = generate_events_after(&show, short.covered_until, horizon, now, 1000).unwrap();
        assert_eq!(rest.drafts[0].start_date_time, utc(2025, 1, 11, 9, 0, 0));
        assert_eq!(rest.covered_until, horizon);

        let full = generate_events_for_show(&show, horizon, now, 1000).unwrap();
        assert_eq!(full.covered_until, horizon);
    }

    #[test]
    fn inactive_show_generates_nothing() {
        let mut show = weekly_show();
        show.status = ShowStatus::Paused;
        let now = utc(2025, 1, 1, 0, 0, 0);
        let out = generate_events_for_show(&show, three_month_horizon(now), now, 1000).unwrap();
        assert!(out.drafts.is_empty());
    }

    #[test]
    fn invalid_config_is_an_error() {
        let show = weekly_show().with_config(SchedulingConfig::weekly(vec![9]));
        let now = utc(2025, 1, 1, 0, 0, 0);
        let err = generate_events_for_show(&show, three_month_horizon(now), now, 1000).unwrap_err();
        assert!(err.is_user_facing());
    }

    #[test]
    fn zero_length_is_skipped_not_fatal() {
        let mut show = weekly_show();
        show.length_minutes = 0;
        let now = utc(2025, 1, 1, 0, 0, 0);
        let out = generate_events_for_show(&show, utc(2025, 1, 10, 23, 0, 0), now, 1000).unwrap();
        assert!(out.drafts.is_empty());
        assert_eq!(out.skipped.len(), 3);
    }

    #[test]
    fn tail_generation_starts_after_previous_horizon() {
        let show = weekly_show();
        let now = utc(2025, 1, 1, 0, 0, 0);
        let previous = utc(2025, 1, 31, 23, 59, 59);
        let out = generate_events_after(&show, previous, three_month_horizon(now), now, 1000).unwrap();
        // First Mon/Wed/Fri in February 2025 is Monday the 3rd.
        assert_eq!(out.drafts[0].start_date_time, utc(2025, 2, 3, 17, 0, 0));
    }

    #[test]
    fn generation_is_deterministic_for_fixed_now() {
        let show = weekly_show();
        let now = utc(2025, 1, 1, 0, 0, 0);
        let horizon = three_month_horizon(now);
        let a = generate_events_for_show(&show, horizon, now, 1000).unwrap();
        let b = generate_events_for_show(&show, horizon, now, 1000).unwrap();
        assert_eq!(a, b);
    }
}
