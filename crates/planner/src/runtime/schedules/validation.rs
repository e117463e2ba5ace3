//! Input validation for show templates and their scheduling configs.

use sp_domain::error::{Constraint, FieldViolation, SchedulingError};
use sp_domain::show::{RepeatPattern, SchedulingConfig, Show};

use super::calendar::parse_tz;

/// Accepted values for `monthly_week_number` (-1 = last).
const WEEK_NUMBERS: [i32; 5] = [1, 2, 3, 4, -1];

/// Validate a scheduling config against its repeat pattern.
///
/// A missing config is valid for every pattern; the calculator falls back
/// to defaults derived from the show's first event date. Every violation is
/// collected so the caller can report them all at once.
pub fn validate_scheduling_config(
    pattern: RepeatPattern,
    config: Option<&SchedulingConfig>,
) -> Result<(), SchedulingError> {
    let Some(config) = config else {
        return Ok(());
    };

    let mut violations = Vec::new();
    match pattern {
        // Single and daily shows have nothing to refine; the fields are
        // ignored but may still not mix the weekly and monthly shapes.
        RepeatPattern::None | RepeatPattern::Daily => check_shapes_exclusive(config, &mut violations),
        RepeatPattern::Weekly | RepeatPattern::Biweekly => {
            check_weekly(config, &mut violations);
        }
        RepeatPattern::Monthly => check_monthly(config, &mut violations),
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(SchedulingError::ConfigValidation { violations })
    }
}

fn check_shapes_exclusive(config: &SchedulingConfig, out: &mut Vec<FieldViolation>) {
    if config.weekdays.is_none() {
        return;
    }
    if config.has_monthly_weekday_group() {
        out.push(FieldViolation::new(
            "weekdays",
            Constraint::MutuallyExclusive {
                with: "monthly_weekday",
            },
        ));
    }
    if config.has_monthly_day_group() {
        out.push(FieldViolation::new(
            "weekdays",
            Constraint::MutuallyExclusive { with: "monthly_day" },
        ));
    }
}

fn check_weekly(config: &SchedulingConfig, out: &mut Vec<FieldViolation>) {
    match &config.weekdays {
        None => out.push(FieldViolation::new("weekdays", Constraint::Required)),
        Some(days) if days.is_empty() => {
            out.push(FieldViolation::new("weekdays", Constraint::Empty))
        }
        Some(days) => {
            for &day in days {
                check_range(out, "weekdays", day, 0, 6);
            }
        }
    }

    let monthly_fields = [
        ("monthly_weekday", config.monthly_weekday.is_some()),
        ("monthly_week_number", config.monthly_week_number.is_some()),
        ("monthly_day", config.monthly_day.is_some()),
        ("monthly_day_fallback", config.monthly_day_fallback.is_some()),
    ];
    for (field, present) in monthly_fields {
        if present {
            out.push(FieldViolation::new(field, Constraint::MustBeAbsent));
        }
    }
}

fn check_monthly(config: &SchedulingConfig, out: &mut Vec<FieldViolation>) {
    if config.weekdays.is_some() {
        out.push(FieldViolation::new("weekdays", Constraint::MustBeAbsent));
    }

    let weekday_group = config.has_monthly_weekday_group();
    let day_given = config.monthly_day.is_some();

    match (weekday_group, day_given) {
        (true, true) => out.push(FieldViolation::new(
            "monthly_day",
            Constraint::MutuallyExclusive {
                with: "monthly_weekday",
            },
        )),
        (false, false) => out.push(FieldViolation::new(
            "monthly_day",
            Constraint::RequiresOneOf {
                with: "monthly_weekday",
            },
        )),
        _ => {}
    }

    if weekday_group {
        match config.monthly_weekday {
            Some(wd) => check_range(out, "monthly_weekday", wd, 0, 6),
            None => out.push(FieldViolation::new("monthly_weekday", Constraint::Required)),
        }
        match config.monthly_week_number {
            Some(n) if !WEEK_NUMBERS.contains(&n) => out.push(FieldViolation::new(
                "monthly_week_number",
                Constraint::NotAllowed { value: n.into() },
            )),
            Some(_) => {}
            None => out.push(FieldViolation::new("monthly_week_number", Constraint::Required)),
        }
        if config.monthly_day_fallback.is_some() && !day_given {
            out.push(FieldViolation::new(
                "monthly_day_fallback",
                Constraint::MutuallyExclusive {
                    with: "monthly_weekday",
                },
            ));
        }
    }

    if let Some(day) = config.monthly_day {
        check_range(out, "monthly_day", day, 1, 31);
    }
}

fn check_range(out: &mut Vec<FieldViolation>, field: &'static str, value: i32, min: i32, max: i32) {
    if value < min || value > max {
        out.push(FieldViolation::new(
            field,
            Constraint::OutOfRange {
                value: value.into(),
                min: min.into(),
                max: max.into(),
            },
        ));
    }
}

/// Validate everything about a show template that the calculator relies
/// on: the scheduling config, the timezone and a positive length.
pub fn validate_show(show: &Show) -> Result<(), SchedulingError> {
    let mut violations = match validate_scheduling_config(
        show.repeat_pattern,
        show.scheduling_config.as_ref(),
    ) {
        Ok(()) => Vec::new(),
        Err(SchedulingError::ConfigValidation { violations }) => violations,
        Err(other) => return Err(other),
    };

    if parse_tz(&show.timezone).is_none() {
        violations.push(FieldViolation::new(
            "timezone",
            Constraint::UnknownTimezone {
                value: show.timezone.clone(),
            },
        ));
    }

    if show.length_minutes == 0 {
        violations.push(FieldViolation::new(
            "length_minutes",
            Constraint::OutOfRange {
                value: 0,
                min: 1,
                max: u32::MAX.into(),
            },
        ));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(SchedulingError::ConfigValidation { violations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sp_domain::show::MonthlyDayFallback;

    fn violations(pattern: RepeatPattern, cfg: SchedulingConfig) -> Vec<FieldViolation> {
        validate_scheduling_config(pattern, Some(&cfg))
            .unwrap_err()
            .violations()
            .to_vec()
    }

    // ── Absent config ────────────────────────────────────────────────

    #[test]
    fn absent_config_is_valid_for_every_pattern() {
        for p in [
            RepeatPattern::None,
            RepeatPattern::Daily,
            RepeatPattern::Weekly,
            RepeatPattern::Biweekly,
            RepeatPattern::Monthly,
        ] {
            assert!(validate_scheduling_config(p, None).is_ok(), "{p:?}");
        }
    }

    // ── Weekly / biweekly ────────────────────────────────────────────

    #[test]
    fn weekly_accepts_valid_weekdays() {
        let cfg = SchedulingConfig::weekly(vec![1, 3, 5]);
        assert!(validate_scheduling_config(RepeatPattern::Weekly, Some(&cfg)).is_ok());
        assert!(validate_scheduling_config(RepeatPattern::Biweekly, Some(&cfg)).is_ok());
    }

    #[test]
    fn weekly_rejects_empty_weekdays() {
        let v = violations(RepeatPattern::Weekly, SchedulingConfig::weekly(vec![]));
        assert_eq!(v, vec![FieldViolation::new("weekdays", Constraint::Empty)]);
    }

    #[test]
    fn weekly_rejects_missing_weekdays() {
        let v = violations(RepeatPattern::Biweekly, SchedulingConfig::default());
        assert_eq!(v, vec![FieldViolation::new("weekdays", Constraint::Required)]);
    }

    #[test]
    fn weekly_rejects_out_of_range_day() {
        let v = violations(RepeatPattern::Weekly, SchedulingConfig::weekly(vec![0, 7, -1]));
        assert_eq!(v.len(), 2);
        assert!(v.iter().all(|x| x.field == "weekdays"));
        assert_eq!(
            v[0].constraint,
            Constraint::OutOfRange { value: 7, min: 0, max: 6 }
        );
    }

    #[test]
    fn weekly_rejects_monthly_fields() {
        let mut cfg = SchedulingConfig::weekly(vec![2]);
        cfg.monthly_day = Some(15);
        let v = violations(RepeatPattern::Weekly, cfg);
        assert_eq!(v, vec![FieldViolation::new("monthly_day", Constraint::MustBeAbsent)]);
    }

    // ── Single / daily ───────────────────────────────────────────────

    #[test]
    fn daily_ignores_a_single_shape() {
        let cfg = SchedulingConfig::weekly(vec![1, 3]);
        assert!(validate_scheduling_config(RepeatPattern::Daily, Some(&cfg)).is_ok());
        let cfg = SchedulingConfig::monthly_day(15, None);
        assert!(validate_scheduling_config(RepeatPattern::None, Some(&cfg)).is_ok());
    }

    #[test]
    fn daily_rejects_weekdays_mixed_with_monthly_fields() {
        let mut cfg = SchedulingConfig::weekly(vec![1]);
        cfg.monthly_day = Some(15);
        let v = violations(RepeatPattern::Daily, cfg);
        assert_eq!(
            v,
            vec![FieldViolation::new(
                "weekdays",
                Constraint::MutuallyExclusive { with: "monthly_day" }
            )]
        );

        let mut cfg = SchedulingConfig::monthly_weekday(1, 2);
        cfg.weekdays = Some(vec![3]);
        cfg.monthly_day_fallback = Some(MonthlyDayFallback::Skip);
        let v = violations(RepeatPattern::None, cfg);
        assert_eq!(v.len(), 2);
        assert!(v.iter().all(|x| x.field == "weekdays"));
    }

    // ── Monthly ──────────────────────────────────────────────────────

    #[test]
    fn monthly_accepts_each_group() {
        let nth = SchedulingConfig::monthly_weekday(1, 1);
        let last = SchedulingConfig::monthly_weekday(5, -1);
        let day = SchedulingConfig::monthly_day(31, Some(MonthlyDayFallback::Skip));
        let bare_day = SchedulingConfig::monthly_day(15, None);
        for cfg in [nth, last, day, bare_day] {
            assert!(validate_scheduling_config(RepeatPattern::Monthly, Some(&cfg)).is_ok());
        }
    }

    #[test]
    fn monthly_rejects_both_groups() {
        let mut cfg = SchedulingConfig::monthly_weekday(1, 2);
        cfg.monthly_day = Some(10);
        let v = violations(RepeatPattern::Monthly, cfg);
        assert_eq!(
            v,
            vec![FieldViolation::new(
                "monthly_day",
                Constraint::MutuallyExclusive { with: "monthly_weekday" }
            )]
        );
    }

    #[test]
    fn monthly_rejects_neither_group() {
        let v = violations(RepeatPattern::Monthly, SchedulingConfig::default());
        assert_eq!(v[0].field, "monthly_day");
        assert!(matches!(v[0].constraint, Constraint::RequiresOneOf { .. }));
    }

    #[test]
    fn monthly_rejects_week_number_zero() {
        let v = violations(RepeatPattern::Monthly, SchedulingConfig::monthly_weekday(1, 0));
        assert_eq!(
            v,
            vec![FieldViolation::new(
                "monthly_week_number",
                Constraint::NotAllowed { value: 0 }
            )]
        );
        let v = violations(RepeatPattern::Monthly, SchedulingConfig::monthly_weekday(1, 5));
        assert_eq!(v[0].constraint, Constraint::NotAllowed { value: 5 });
    }

    #[test]
    fn monthly_rejects_half_weekday_group() {
        let cfg = SchedulingConfig {
            monthly_weekday: Some(3),
            ..SchedulingConfig::default()
        };
        let v = violations(RepeatPattern::Monthly, cfg);
        assert_eq!(
            v,
            vec![FieldViolation::new("monthly_week_number", Constraint::Required)]
        );
    }

    #[test]
    fn monthly_rejects_bad_ranges() {
        let v = violations(RepeatPattern::Monthly, SchedulingConfig::monthly_day(32, None));
        assert_eq!(v[0].constraint, Constraint::OutOfRange { value: 32, min: 1, max: 31 });
        let v = violations(RepeatPattern::Monthly, SchedulingConfig::monthly_day(0, None));
        assert_eq!(v[0].field, "monthly_day");
        let v = violations(RepeatPattern::Monthly, SchedulingConfig::monthly_weekday(7, 1));
        assert_eq!(v[0].field, "monthly_weekday");
    }

    #[test]
    fn monthly_rejects_weekdays() {
        let mut cfg = SchedulingConfig::monthly_day(1, None);
        cfg.weekdays = Some(vec![1]);
        let v = violations(RepeatPattern::Monthly, cfg);
        assert_eq!(v, vec![FieldViolation::new("weekdays", Constraint::MustBeAbsent)]);
    }

    #[test]
    fn fallback_without_day_conflicts_with_weekday_group() {
        let mut cfg = SchedulingConfig::monthly_weekday(2, 3);
        cfg.monthly_day_fallback = Some(MonthlyDayFallback::LastDay);
        let v = violations(RepeatPattern::Monthly, cfg);
        assert_eq!(v[0].field, "monthly_day_fallback");
    }

    #[test]
    fn only_validation_errors_are_user_facing() {
        let err = validate_scheduling_config(
            RepeatPattern::Weekly,
            Some(&SchedulingConfig::weekly(vec![])),
        )
        .unwrap_err();
        assert!(err.is_user_facing());
    }

    // ── Whole-show validation ────────────────────────────────────────

    fn show(pattern: RepeatPattern) -> Show {
        Show::new(
            "Drive Time",
            pattern,
            chrono::NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
            chrono::NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            120,
        )
    }

    #[test]
    fn validate_show_accepts_plain_show() {
        assert!(validate_show(&show(RepeatPattern::Daily)).is_ok());
        let s = show(RepeatPattern::Weekly).with_timezone("America/New_York");
        assert!(validate_show(&s).is_ok());
    }

    #[test]
    fn validate_show_rejects_unknown_timezone() {
        let s = show(RepeatPattern::Daily).with_timezone("Not/Real");
        let err = validate_show(&s).unwrap_err();
        assert_eq!(err.violations()[0].field, "timezone");
    }

    #[test]
    fn validate_show_collects_config_and_length() {
        let mut s = show(RepeatPattern::Weekly).with_config(SchedulingConfig::weekly(vec![]));
        s.length_minutes = 0;
        let err = validate_show(&s).unwrap_err();
        let fields: Vec<_> = err.violations().iter().map(|v| v.field).collect();
        assert_eq!(fields, vec!["weekdays", "length_minutes"]);
    }
}
