//! Occurrence calculation: show template × count → future start instants.
//!
//! Calendar dates are computed in the show's own timezone and combined with
//! its wall-clock start time; the result is converted to UTC. A local time
//! that does not exist (spring-forward gap) cannot be dated and is reported
//! in [`Occurrences::skipped`] instead of being shifted.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use sp_domain::error::{Constraint, FieldViolation, SchedulingError};
use sp_domain::show::{MonthlyDayFallback, Show};

use super::calendar::{
    add_months, compose_local, days_in_month, last_day_of_month, last_weekday_of_month,
    nth_weekday_of_month, parse_tz, LocalTime,
};
use super::recurrence::{Recurrence, WeekOfMonth};

/// Ordered future instants plus the dates that could not be dated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Occurrences {
    pub times: Vec<DateTime<Utc>>,
    pub skipped: Vec<SchedulingError>,
}

/// Computes upcoming occurrences for one show snapshot.
pub struct OccurrenceCalculator<'a> {
    show: &'a Show,
    recurrence: Recurrence,
    tz: chrono_tz::Tz,
}

impl<'a> OccurrenceCalculator<'a> {
    /// Resolve the show's recurrence. Fails with a validation error when the
    /// config or timezone is unusable.
    pub fn new(show: &'a Show) -> Result<Self, SchedulingError> {
        let recurrence = Recurrence::resolve(show)?;
        let tz = parse_tz(&show.timezone).ok_or_else(|| SchedulingError::ConfigValidation {
            violations: vec![FieldViolation::new(
                "timezone",
                Constraint::UnknownTimezone {
                    value: show.timezone.clone(),
                },
            )],
        })?;
        Ok(Self {
            show,
            recurrence,
            tz,
        })
    }

    /// Up to `max` occurrences strictly after `now`, ascending.
    ///
    /// Shows that are not active have no occurrences.
    pub fn next(&self, max: usize, now: DateTime<Utc>) -> Occurrences {
        let mut out = Collector::new(self, max, now);
        if max == 0 || !self.show.is_active() {
            return out.finish();
        }

        match &self.recurrence {
            Recurrence::Single => {
                out.push(self.show.first_event_date);
            }
            Recurrence::Daily => self.daily(&mut out),
            Recurrence::Weekly {
                interval_days,
                weekdays,
            } => self.weekly(&mut out, *interval_days, weekdays),
            Recurrence::MonthlyWeekday { weekday, week } => self.monthly(&mut out, |y, m| match week {
                WeekOfMonth::Nth(n) => nth_weekday_of_month(y, m, *weekday, *n),
                WeekOfMonth::Last => last_weekday_of_month(y, m, *weekday),
            }),
            Recurrence::MonthlyDay { day, fallback } => self.monthly(&mut out, |y, m| {
                if *day <= days_in_month(y, m) {
                    NaiveDate::from_ymd_opt(y, m, *day)
                } else {
                    match fallback {
                        MonthlyDayFallback::LastDay => last_day_of_month(y, m),
                        MonthlyDayFallback::Skip => None,
                    }
                }
            }),
        }

        out.finish()
    }

    /// The show's calendar date for `now`, minus one day so that a start
    /// time late in the local day is never missed by the jump.
    fn walk_floor(&self, now: DateTime<Utc>) -> NaiveDate {
        let today = now.with_timezone(&self.tz).date_naive();
        today.pred_opt().unwrap_or(today)
    }

    fn daily(&self, out: &mut Collector<'_>) {
        let mut date = self.show.first_event_date.max(self.walk_floor(out.now));
        // Past days before the floor are jumped; at most a couple remain,
        // plus one per DST gap on the way.
        let budget = out.max.saturating_mul(2).saturating_add(7);
        for _ in 0..budget {
            if out.is_full() {
                break;
            }
            out.push(date);
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
    }

    fn weekly(&self, out: &mut Collector<'_>, interval_days: i64, weekdays: &[chrono::Weekday]) {
        let first = self.show.first_event_date;
        let floor = self.walk_floor(out.now);
        // Rough per-weekday allocation; the merged stream is sorted and
        // truncated afterwards, which is what guarantees the final count.
        let per_weekday = out.max / weekdays.len().max(1) + 1;

        let mut merged = Vec::new();
        let mut skipped = Vec::new();
        for &weekday in weekdays {
            let offset = (7 + i64::from(weekday.num_days_from_sunday())
                - i64::from(first.weekday().num_days_from_sunday()))
                % 7;
            let Some(mut date) = first.checked_add_signed(Duration::days(offset)) else {
                continue;
            };
            // Jump whole intervals up to the floor, keeping the phase
            // anchored on the first event date.
            if date < floor {
                let behind = (floor - date).num_days();
                let steps = (behind + interval_days - 1) / interval_days;
                match date.checked_add_signed(Duration::days(steps * interval_days)) {
                    Some(d) => date = d,
                    None => continue,
                }
            }

            let mut stream = Collector::new(self, per_weekday, out.now);
            for _ in 0..per_weekday.saturating_add(4) {
                if stream.is_full() {
                    break;
                }
                stream.push(date);
                match date.checked_add_signed(Duration::days(interval_days)) {
                    Some(next) => date = next,
                    None => break,
                }
            }
            let part = stream.finish();
            merged.extend(part.times);
            skipped.extend(part.skipped);
        }

        merged.sort();
        merged.dedup();
        merged.truncate(out.max);
        out.times = merged;
        out.skipped.extend(skipped);
    }

    /// Scan months from the first event date's month (or the current month
    /// once that has passed), resolving one date per month via `pick`. A
    /// month for which `pick` returns `None` contributes nothing. The scan
    /// is bounded at twice the requested count.
    fn monthly<F>(&self, out: &mut Collector<'_>, pick: F)
    where
        F: Fn(i32, u32) -> Option<NaiveDate>,
    {
        let first = self.show.first_event_date;
        let today = out.now.with_timezone(&self.tz).date_naive();
        let start = if first < today { today } else { first };
        let months = i64::try_from(out.max.saturating_mul(2)).unwrap_or(i64::MAX);

        for delta in 0..months {
            if out.is_full() {
                break;
            }
            let (year, month) = add_months(start.year(), start.month(), delta);
            let Some(date) = pick(year, month) else {
                continue;
            };
            if date < first {
                continue;
            }
            out.push(date);
        }
    }
}

/// Accumulates future instants for one calculation, recording dates that
/// fall into a DST gap.
struct Collector<'c> {
    calc: &'c OccurrenceCalculator<'c>,
    max: usize,
    now: DateTime<Utc>,
    times: Vec<DateTime<Utc>>,
    skipped: Vec<SchedulingError>,
}

impl<'c> Collector<'c> {
    fn new(calc: &'c OccurrenceCalculator<'c>, max: usize, now: DateTime<Utc>) -> Self {
        Self {
            calc,
            max,
            now,
            times: Vec::new(),
            skipped: Vec::new(),
        }
    }

    fn is_full(&self) -> bool {
        self.times.len() >= self.max
    }

    fn push(&mut self, date: NaiveDate) {
        let show = self.calc.show;
        match compose_local(date, show.start_time, self.calc.tz) {
            LocalTime::Exact(t) | LocalTime::Ambiguous(t) => {
                if t > self.now {
                    self.times.push(t);
                }
            }
            LocalTime::Missing => {
                // Only report gaps that would otherwise have been emitted.
                if date >= self.now.with_timezone(&self.calc.tz).date_naive() {
                    self.skipped.push(SchedulingError::GenerationInconsistency {
                        show_id: show.id,
                        date,
                        reason: format!(
                            "{} does not exist in {} on that day",
                            show.start_time, self.calc.tz
                        ),
                    });
                }
            }
        }
    }

    fn finish(self) -> Occurrences {
        Occurrences {
            times: self.times,
            skipped: self.skipped,
        }
    }
}

/// Up to `max` future start instants for `show`, ascending.
///
/// Inactive shows and shows whose config does not validate yield nothing;
/// the latter is logged since it should have been rejected at write time.
pub fn calculate_next_occurrences(
    show: &Show,
    max: usize,
    now: DateTime<Utc>,
) -> Vec<DateTime<Utc>> {
    if !show.is_active() {
        return Vec::new();
    }
    let calc = match OccurrenceCalculator::new(show) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(show_id = %show.id, error = %e, "cannot calculate occurrences");
            return Vec::new();
        }
    };
    let result = calc.next(max, now);
    for skip in &result.skipped {
        tracing::warn!(show_id = %show.id, error = %skip, "occurrence skipped");
    }
    result.times
}

/// The next start instant after `now`, if any.
pub fn next_occurrence(show: &Show, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    calculate_next_occurrences(show, 1, now).into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone, Timelike};
    use sp_domain::show::{RepeatPattern, SchedulingConfig, ShowStatus};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    /// 2024-12-31 00:00 UTC, before every first date used below.
    fn new_years_eve() -> DateTime<Utc> {
        utc(2024, 12, 31, 0, 0)
    }

    fn show(pattern: RepeatPattern, first: NaiveDate) -> Show {
        Show::new(
            "Morning Mix",
            pattern,
            first,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            60,
        )
    }

    fn dates(times: &[DateTime<Utc>]) -> Vec<NaiveDate> {
        times.iter().map(|t| t.date_naive()).collect()
    }

    // ── Single ───────────────────────────────────────────────────────

    #[test]
    fn single_in_future() {
        let s = show(RepeatPattern::None, date(2025, 1, 6));
        let times = calculate_next_occurrences(&s, 5, new_years_eve());
        assert_eq!(times, vec![utc(2025, 1, 6, 9, 0)]);
    }

    #[test]
    fn single_in_past_is_empty() {
        let s = show(RepeatPattern::None, date(2024, 6, 1));
        assert!(calculate_next_occurrences(&s, 5, new_years_eve()).is_empty());
    }

    #[test]
    fn occurrence_at_now_is_not_future() {
        let s = show(RepeatPattern::None, date(2025, 1, 6));
        assert!(calculate_next_occurrences(&s, 1, utc(2025, 1, 6, 9, 0)).is_empty());
    }

    // ── Daily ────────────────────────────────────────────────────────

    #[test]
    fn daily_is_exactly_one_day_apart() {
        let s = show(RepeatPattern::Daily, date(2024, 1, 1));
        let now = utc(2025, 3, 15, 12, 0);
        let times = calculate_next_occurrences(&s, 30, now);
        assert_eq!(times.len(), 30);
        assert_eq!(times[0], utc(2025, 3, 16, 9, 0));
        for pair in times.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::hours(24));
        }
    }

    #[test]
    fn daily_includes_later_today() {
        let s = show(RepeatPattern::Daily, date(2024, 1, 1));
        let times = calculate_next_occurrences(&s, 2, utc(2025, 3, 15, 8, 0));
        assert_eq!(times, vec![utc(2025, 3, 15, 9, 0), utc(2025, 3, 16, 9, 0)]);
    }

    #[test]
    fn daily_starts_on_first_date() {
        let s = show(RepeatPattern::Daily, date(2025, 2, 1));
        let times = calculate_next_occurrences(&s, 3, new_years_eve());
        assert_eq!(dates(&times), vec![date(2025, 2, 1), date(2025, 2, 2), date(2025, 2, 3)]);
    }

    // ── Weekly / biweekly ────────────────────────────────────────────

    #[test]
    fn weekly_mon_wed_fri() {
        let s = show(RepeatPattern::Weekly, date(2025, 1, 6))
            .with_config(SchedulingConfig::weekly(vec![1, 3, 5]));
        let times = calculate_next_occurrences(&s, 5, new_years_eve());
        assert_eq!(
            times,
            vec![
                utc(2025, 1, 6, 9, 0),
                utc(2025, 1, 8, 9, 0),
                utc(2025, 1, 10, 9, 0),
                utc(2025, 1, 13, 9, 0),
                utc(2025, 1, 15, 9, 0),
            ]
        );
    }

    #[test]
    fn weekly_output_is_strictly_ascending_for_large_counts() {
        let s = show(RepeatPattern::Weekly, date(2025, 1, 6))
            .with_config(SchedulingConfig::weekly(vec![0, 2, 4, 6]));
        let times = calculate_next_occurrences(&s, 101, new_years_eve());
        assert_eq!(times.len(), 101);
        assert!(times.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn weekly_without_config_uses_first_date_weekday() {
        // 2025-01-08 is a Wednesday.
        let s = show(RepeatPattern::Weekly, date(2025, 1, 8));
        let times = calculate_next_occurrences(&s, 3, new_years_eve());
        assert_eq!(dates(&times), vec![date(2025, 1, 8), date(2025, 1, 15), date(2025, 1, 22)]);
    }

    #[test]
    fn weekly_skips_weekdays_before_first_date_in_first_week() {
        // First date is a Wednesday; Monday of that week is not emitted.
        let s = show(RepeatPattern::Weekly, date(2025, 1, 8))
            .with_config(SchedulingConfig::weekly(vec![1, 3]));
        let times = calculate_next_occurrences(&s, 3, new_years_eve());
        assert_eq!(dates(&times), vec![date(2025, 1, 8), date(2025, 1, 13), date(2025, 1, 15)]);
    }

    #[test]
    fn biweekly_keeps_phase_after_long_gap() {
        // Anchored on Monday 2025-01-06: Jan 6, 20, Feb 3, 17, Mar 3 ...
        let s = show(RepeatPattern::Biweekly, date(2025, 1, 6));
        let times = calculate_next_occurrences(&s, 3, utc(2025, 2, 1, 0, 0));
        assert_eq!(dates(&times), vec![date(2025, 2, 3), date(2025, 2, 17), date(2025, 3, 3)]);
    }

    #[test]
    fn duplicate_weekdays_do_not_duplicate_occurrences() {
        let s = show(RepeatPattern::Weekly, date(2025, 1, 6))
            .with_config(SchedulingConfig::weekly(vec![1, 1, 1]));
        let times = calculate_next_occurrences(&s, 3, new_years_eve());
        assert_eq!(dates(&times), vec![date(2025, 1, 6), date(2025, 1, 13), date(2025, 1, 20)]);
    }

    // ── Monthly by weekday ───────────────────────────────────────────

    #[test]
    fn first_monday_of_month() {
        let s = show(RepeatPattern::Monthly, date(2025, 1, 1))
            .with_config(SchedulingConfig::monthly_weekday(1, 1));
        let times = calculate_next_occurrences(&s, 2, new_years_eve());
        assert_eq!(dates(&times), vec![date(2025, 1, 6), date(2025, 2, 3)]);
    }

    #[test]
    fn last_friday_of_month_stays_in_month() {
        let s = show(RepeatPattern::Monthly, date(2025, 2, 1))
            .with_config(SchedulingConfig::monthly_weekday(5, -1));
        let times = calculate_next_occurrences(&s, 3, new_years_eve());
        assert_eq!(
            dates(&times),
            vec![date(2025, 2, 28), date(2025, 3, 28), date(2025, 4, 25)]
        );
    }

    #[test]
    fn monthly_weekday_never_precedes_first_date() {
        // First Monday of January 2025 is the 6th, before the first date.
        let s = show(RepeatPattern::Monthly, date(2025, 1, 10))
            .with_config(SchedulingConfig::monthly_weekday(1, 1));
        let times = calculate_next_occurrences(&s, 1, new_years_eve());
        assert_eq!(dates(&times), vec![date(2025, 2, 3)]);
    }

    #[test]
    fn monthly_weekday_uses_current_month_once_first_date_passed() {
        let s = show(RepeatPattern::Monthly, date(2024, 1, 1))
            .with_config(SchedulingConfig::monthly_weekday(1, 2));
        // Second Monday of March 2025 is the 10th.
        let times = calculate_next_occurrences(&s, 2, utc(2025, 3, 1, 0, 0));
        assert_eq!(dates(&times), vec![date(2025, 3, 10), date(2025, 4, 14)]);
    }

    // ── Monthly by calendar day ──────────────────────────────────────

    #[test]
    fn day_31_with_last_day_fallback() {
        let s = show(RepeatPattern::Monthly, date(2025, 1, 1)).with_config(
            SchedulingConfig::monthly_day(31, Some(MonthlyDayFallback::LastDay)),
        );
        let times = calculate_next_occurrences(&s, 5, new_years_eve());
        assert_eq!(
            dates(&times),
            vec![
                date(2025, 1, 31),
                date(2025, 2, 28),
                date(2025, 3, 31),
                date(2025, 4, 30),
                date(2025, 5, 31),
            ]
        );
    }

    #[test]
    fn day_31_with_skip_fallback() {
        let s = show(RepeatPattern::Monthly, date(2025, 1, 1)).with_config(
            SchedulingConfig::monthly_day(31, Some(MonthlyDayFallback::Skip)),
        );
        let times = calculate_next_occurrences(&s, 3, new_years_eve());
        assert_eq!(dates(&times), vec![date(2025, 1, 31), date(2025, 3, 31), date(2025, 5, 31)]);
    }

    #[test]
    fn monthly_scan_stops_after_twice_the_requested_count() {
        let s = show(RepeatPattern::Monthly, date(2025, 1, 1)).with_config(
            SchedulingConfig::monthly_day(31, Some(MonthlyDayFallback::Skip)),
        );
        // January's occurrence has passed and February has no 31st, so the
        // two months scanned for one result yield nothing.
        let late_january = utc(2025, 1, 31, 21, 0);
        assert!(calculate_next_occurrences(&s, 1, late_january).is_empty());
        // Four months for two results reach March 31 but not May 31.
        assert_eq!(
            dates(&calculate_next_occurrences(&s, 2, late_january)),
            vec![date(2025, 3, 31)]
        );
    }

    #[test]
    fn monthly_scan_from_february_reaches_march() {
        let s = show(RepeatPattern::Monthly, date(2025, 1, 1)).with_config(
            SchedulingConfig::monthly_day(31, Some(MonthlyDayFallback::Skip)),
        );
        let times = calculate_next_occurrences(&s, 1, utc(2025, 2, 1, 0, 0));
        assert_eq!(times, vec![utc(2025, 3, 31, 9, 0)]);
    }

    #[test]
    fn leap_february_gets_the_29th() {
        let s = show(RepeatPattern::Monthly, date(2024, 1, 31));
        let times = calculate_next_occurrences(&s, 2, utc(2024, 1, 1, 0, 0));
        assert_eq!(dates(&times), vec![date(2024, 1, 31), date(2024, 2, 29)]);
    }

    #[test]
    fn monthly_day_before_first_date_is_skipped() {
        let s = show(RepeatPattern::Monthly, date(2025, 1, 15))
            .with_config(SchedulingConfig::monthly_day(10, None));
        let times = calculate_next_occurrences(&s, 1, new_years_eve());
        assert_eq!(dates(&times), vec![date(2025, 2, 10)]);
    }

    // ── Timezones ────────────────────────────────────────────────────

    #[test]
    fn new_york_start_time_follows_dst() {
        let s = show(RepeatPattern::Daily, date(2025, 3, 8)).with_timezone("America/New_York");
        let times = calculate_next_occurrences(&s, 2, utc(2025, 3, 1, 0, 0));
        // 09:00 EST then 09:00 EDT.
        assert_eq!(times, vec![utc(2025, 3, 8, 14, 0), utc(2025, 3, 9, 13, 0)]);
    }

    #[test]
    fn dst_gap_is_skipped_and_reported() {
        let mut s = show(RepeatPattern::Daily, date(2025, 3, 8)).with_timezone("America/New_York");
        s.start_time = NaiveTime::from_hms_opt(2, 30, 0).unwrap();
        let calc = OccurrenceCalculator::new(&s).unwrap();
        let result = calc.next(3, utc(2025, 3, 1, 0, 0));
        assert_eq!(
            dates(&result.times),
            vec![date(2025, 3, 8), date(2025, 3, 10), date(2025, 3, 11)]
        );
        assert!(result.times.iter().all(|t| t.minute() == 30));
        assert_eq!(result.skipped.len(), 1);
        assert!(matches!(
            result.skipped[0],
            SchedulingError::GenerationInconsistency { date: d, .. } if d == date(2025, 3, 9)
        ));
    }

    #[test]
    fn unknown_timezone_fails_construction() {
        let s = show(RepeatPattern::Daily, date(2025, 1, 1)).with_timezone("Mars/Olympus");
        assert!(OccurrenceCalculator::new(&s).is_err());
        assert!(calculate_next_occurrences(&s, 3, new_years_eve()).is_empty());
    }

    // ── Guards ───────────────────────────────────────────────────────

    #[test]
    fn inactive_show_has_no_occurrences() {
        for status in [ShowStatus::Paused, ShowStatus::Completed, ShowStatus::Cancelled] {
            let mut s = show(RepeatPattern::Daily, date(2025, 1, 1));
            s.status = status;
            assert!(calculate_next_occurrences(&s, 5, new_years_eve()).is_empty());
        }
    }

    #[test]
    fn zero_max_is_empty() {
        let s = show(RepeatPattern::Daily, date(2025, 1, 1));
        assert!(calculate_next_occurrences(&s, 0, new_years_eve()).is_empty());
    }

    #[test]
    fn next_occurrence_is_first_of_sequence() {
        let s = show(RepeatPattern::Weekly, date(2025, 1, 6))
            .with_config(SchedulingConfig::weekly(vec![3, 1]));
        assert_eq!(next_occurrence(&s, utc(2025, 1, 6, 10, 0)), Some(utc(2025, 1, 8, 9, 0)));
    }
}
