//! Tests for availability resolution: weekly rules, exceptions, blocked periods,
//! timezones and DST.

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use slot_engine::dst::DstPolicy;
use slot_engine::{
    resolve_availability, AvailabilityRule, BlockedPeriod, DateRange, Interval, Roster, Schedule,
    SchedulingError,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn t(hour: u32, min: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, min, 0).unwrap()
}

fn d(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Interval in UTC on a given day.
fn utc(day: u32, start_hour: u32, start_min: u32, end_hour: u32, end_min: u32) -> Interval {
    Interval::new(
        Utc.with_ymd_and_hms(2026, 3, day, start_hour, start_min, 0)
            .unwrap(),
        Utc.with_ymd_and_hms(2026, 3, day, end_hour, end_min, 0)
            .unwrap(),
    )
    .unwrap()
}

fn range(start: NaiveDate, end: NaiveDate) -> DateRange {
    DateRange::new(start, end).unwrap()
}

/// Staff available Mondays 09:00-17:00 UTC.
fn monday_schedule() -> Schedule {
    Schedule::new("alice", Tz::UTC).with_rule(AvailabilityRule::weekly(
        Weekday::Mon,
        t(9, 0),
        t(17, 0),
    ))
}

// ── Weekly rules ────────────────────────────────────────────────────────────

#[test]
fn weekly_rule_only_applies_on_its_weekday() {
    // 2026-03-02 is a Monday; the range covers one full week.
    let result = resolve_availability(&monday_schedule(), range(d(2026, 3, 2), d(2026, 3, 8))).unwrap();

    assert_eq!(result, vec![utc(2, 9, 0, 17, 0)]);
}

#[test]
fn weekly_rule_repeats_every_week() {
    let result = resolve_availability(&monday_schedule(), range(d(2026, 3, 2), d(2026, 3, 16))).unwrap();

    assert_eq!(
        result,
        vec![utc(2, 9, 0, 17, 0), utc(9, 9, 0, 17, 0), utc(16, 9, 0, 17, 0)]
    );
}

#[test]
fn day_without_rule_or_add_is_unavailable() {
    // Tuesday 2026-03-03 has no rule.
    let result = resolve_availability(&monday_schedule(), DateRange::single(d(2026, 3, 3))).unwrap();
    assert!(result.is_empty(), "no rule and no ADD means no availability");
}

#[test]
fn split_shift_on_same_weekday() {
    let schedule = Schedule::new("alice", Tz::UTC)
        .with_rule(AvailabilityRule::weekly(Weekday::Mon, t(9, 0), t(12, 0)))
        .with_rule(AvailabilityRule::weekly(Weekday::Mon, t(13, 0), t(17, 0)));

    let result = resolve_availability(&schedule, DateRange::single(d(2026, 3, 2))).unwrap();

    assert_eq!(result, vec![utc(2, 9, 0, 12, 0), utc(2, 13, 0, 17, 0)]);
}

#[test]
fn effective_period_bounds_the_rule() {
    let schedule = Schedule::new("alice", Tz::UTC).with_rule(AvailabilityRule::Recurring {
        weekday: Weekday::Mon,
        start_time: t(9, 0),
        end_time: t(17, 0),
        effective_from: Some(d(2026, 3, 9)),
        effective_until: Some(d(2026, 3, 9)),
    });

    let result = resolve_availability(&schedule, range(d(2026, 3, 2), d(2026, 3, 16))).unwrap();

    assert_eq!(result, vec![utc(9, 9, 0, 17, 0)], "only the Monday inside the effective period");
}

// ── Exceptions ──────────────────────────────────────────────────────────────

#[test]
fn remove_exception_trims_the_day() {
    let schedule =
        monday_schedule().with_rule(AvailabilityRule::remove(d(2026, 3, 2), t(12, 0), t(13, 0)));

    let result = resolve_availability(&schedule, DateRange::single(d(2026, 3, 2))).unwrap();

    assert_eq!(result, vec![utc(2, 9, 0, 12, 0), utc(2, 13, 0, 17, 0)]);
}

#[test]
fn remove_exception_only_affects_its_date() {
    let schedule =
        monday_schedule().with_rule(AvailabilityRule::remove(d(2026, 3, 2), t(9, 0), t(17, 0)));

    let result = resolve_availability(&schedule, range(d(2026, 3, 2), d(2026, 3, 9))).unwrap();

    assert_eq!(result, vec![utc(9, 9, 0, 17, 0)]);
}

#[test]
fn add_exception_extends_and_merges_with_rule() {
    let schedule =
        monday_schedule().with_rule(AvailabilityRule::add(d(2026, 3, 2), t(17, 0), t(19, 0)));

    let result = resolve_availability(&schedule, DateRange::single(d(2026, 3, 2))).unwrap();

    assert_eq!(result, vec![utc(2, 9, 0, 19, 0)], "adjacent ADD merges into one interval");
}

#[test]
fn add_applies_before_remove() {
    // Tuesday has no weekly rule: ADD 10-14, then REMOVE 11-12 trims the added hours.
    let schedule = monday_schedule()
        .with_rule(AvailabilityRule::remove(d(2026, 3, 3), t(11, 0), t(12, 0)))
        .with_rule(AvailabilityRule::add(d(2026, 3, 3), t(10, 0), t(14, 0)));

    let result = resolve_availability(&schedule, DateRange::single(d(2026, 3, 3))).unwrap();

    assert_eq!(result, vec![utc(3, 10, 0, 11, 0), utc(3, 12, 0, 14, 0)]);
}

#[test]
fn two_adds_on_same_date_union() {
    let schedule = monday_schedule()
        .with_rule(AvailabilityRule::add(d(2026, 3, 3), t(10, 0), t(12, 0)))
        .with_rule(AvailabilityRule::add(d(2026, 3, 3), t(11, 0), t(13, 0)));

    let result = resolve_availability(&schedule, DateRange::single(d(2026, 3, 3))).unwrap();

    assert_eq!(result, vec![utc(3, 10, 0, 13, 0)]);
}

// ── Blocked periods ─────────────────────────────────────────────────────────

#[test]
fn blocked_period_spanning_days_removes_availability() {
    let schedule = monday_schedule()
        .with_rule(AvailabilityRule::weekly(Weekday::Tue, t(9, 0), t(17, 0)))
        .with_blocked(BlockedPeriod::new(
            "Conference",
            Interval::new(
                Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2026, 3, 4, 0, 0, 0).unwrap(),
            )
            .unwrap(),
        ));

    let result = resolve_availability(&schedule, range(d(2026, 3, 2), d(2026, 3, 3))).unwrap();

    assert_eq!(result, vec![utc(2, 9, 0, 12, 0)]);
}

#[test]
fn roster_wide_block_applies_to_every_schedule() {
    let mut roster = Roster::from_schedules([
        monday_schedule(),
        Schedule::new("bob", Tz::UTC).with_rule(AvailabilityRule::weekly(
            Weekday::Mon,
            t(8, 0),
            t(12, 0),
        )),
    ]);
    roster.block_all(BlockedPeriod::new("Holiday", utc(2, 0, 0, 23, 59)));

    for staff in ["alice", "bob"] {
        let schedule = roster.get(staff).unwrap();
        let result = resolve_availability(schedule, DateRange::single(d(2026, 3, 2))).unwrap();
        assert!(result.is_empty(), "{} should be blocked", staff);
    }
}

// ── Timezones and DST ───────────────────────────────────────────────────────

#[test]
fn rules_resolve_in_the_business_timezone() {
    // Madrid is UTC+1 in early March: 09:00-17:00 local is 08:00-16:00 UTC.
    let schedule = Schedule::new("alice", Tz::Europe__Madrid).with_rule(AvailabilityRule::weekly(
        Weekday::Mon,
        t(9, 0),
        t(17, 0),
    ));

    let result = resolve_availability(&schedule, DateRange::single(d(2026, 3, 2))).unwrap();

    assert_eq!(result, vec![utc(2, 8, 0, 16, 0)]);
}

#[test]
fn summer_time_shifts_the_utc_instants() {
    // Monday 2026-03-30 is after the switch to CEST (UTC+2).
    let schedule = Schedule::new("alice", Tz::Europe__Madrid).with_rule(AvailabilityRule::weekly(
        Weekday::Mon,
        t(9, 0),
        t(17, 0),
    ));

    let result = resolve_availability(&schedule, DateRange::single(d(2026, 3, 30))).unwrap();

    assert_eq!(result, vec![utc(30, 7, 0, 15, 0)]);
}

#[test]
fn start_in_dst_gap_shifts_forward_by_default() {
    // 2026-03-29 (Sunday): Madrid jumps from 02:00 to 03:00.
    // 02:30 local does not exist and becomes 03:30 CEST = 01:30 UTC.
    let schedule = Schedule::new("alice", Tz::Europe__Madrid).with_rule(AvailabilityRule::weekly(
        Weekday::Sun,
        t(2, 30),
        t(5, 0),
    ));

    let result = resolve_availability(&schedule, DateRange::single(d(2026, 3, 29))).unwrap();

    assert_eq!(result, vec![utc(29, 1, 30, 3, 0)]);
}

#[test]
fn start_in_dst_gap_is_dropped_under_skip() {
    let schedule = Schedule::new("alice", Tz::Europe__Madrid)
        .with_dst_policy(DstPolicy::Skip)
        .with_rule(AvailabilityRule::weekly(Weekday::Sun, t(2, 30), t(5, 0)));

    let result = resolve_availability(&schedule, DateRange::single(d(2026, 3, 29))).unwrap();

    assert!(result.is_empty());
}

#[test]
fn start_in_repeated_hour_takes_the_earliest_instant() {
    // 2026-10-25 (Sunday): Madrid falls back from 03:00 CEST to 02:00 CET.
    // 02:00 local happens twice; the earlier reading is 00:00 UTC.
    let schedule = Schedule::new("alice", Tz::Europe__Madrid).with_rule(AvailabilityRule::weekly(
        Weekday::Sun,
        t(2, 0),
        t(3, 30),
    ));

    let result = resolve_availability(&schedule, DateRange::single(d(2026, 10, 25))).unwrap();

    let expected = Interval::new(
        Utc.with_ymd_and_hms(2026, 10, 25, 0, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 10, 25, 2, 30, 0).unwrap(),
    )
    .unwrap();
    assert_eq!(result, vec![expected]);
}

#[test]
fn end_in_repeated_hour_takes_the_earliest_instant() {
    // 02:30 local first occurs at 00:30 UTC.
    let schedule = Schedule::new("alice", Tz::Europe__Madrid).with_rule(AvailabilityRule::weekly(
        Weekday::Sun,
        t(0, 0),
        t(2, 30),
    ));

    let result = resolve_availability(&schedule, DateRange::single(d(2026, 10, 25))).unwrap();

    let expected = Interval::new(
        Utc.with_ymd_and_hms(2026, 10, 24, 22, 0, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 10, 25, 0, 30, 0).unwrap(),
    )
    .unwrap();
    assert_eq!(result, vec![expected]);
}

// ── Malformed input ─────────────────────────────────────────────────────────

#[test]
fn overlapping_weekly_rules_are_reported() {
    let schedule = monday_schedule().with_rule(AvailabilityRule::weekly(
        Weekday::Mon,
        t(16, 0),
        t(18, 0),
    ));

    let err = resolve_availability(&schedule, DateRange::single(d(2026, 3, 2))).unwrap_err();

    assert_eq!(
        err,
        SchedulingError::OverlappingRules {
            staff_id: "alice".to_string(),
            weekday: Weekday::Mon,
        }
    );
}

#[test]
fn overlapping_hours_with_disjoint_effective_periods_are_fine() {
    let schedule = Schedule::new("alice", Tz::UTC)
        .with_rule(AvailabilityRule::Recurring {
            weekday: Weekday::Mon,
            start_time: t(9, 0),
            end_time: t(17, 0),
            effective_from: None,
            effective_until: Some(d(2026, 3, 8)),
        })
        .with_rule(AvailabilityRule::Recurring {
            weekday: Weekday::Mon,
            start_time: t(10, 0),
            end_time: t(18, 0),
            effective_from: Some(d(2026, 3, 9)),
            effective_until: None,
        });

    let result = resolve_availability(&schedule, range(d(2026, 3, 2), d(2026, 3, 9))).unwrap();

    assert_eq!(result, vec![utc(2, 9, 0, 17, 0), utc(9, 10, 0, 18, 0)]);
}

#[test]
fn rule_with_end_before_start_is_rejected() {
    let schedule = Schedule::new("alice", Tz::UTC).with_rule(AvailabilityRule::weekly(
        Weekday::Mon,
        t(17, 0),
        t(9, 0),
    ));

    let err = resolve_availability(&schedule, DateRange::single(d(2026, 3, 2))).unwrap_err();
    assert!(matches!(err, SchedulingError::InvalidRule { .. }));
}

#[test]
fn add_rule_rejects_overlap_at_write_time() {
    let mut schedule = monday_schedule();

    let err = schedule
        .add_rule(AvailabilityRule::weekly(Weekday::Mon, t(8, 0), t(10, 0)))
        .unwrap_err();
    assert!(matches!(err, SchedulingError::OverlappingRules { .. }));

    schedule
        .add_rule(AvailabilityRule::weekly(Weekday::Tue, t(8, 0), t(10, 0)))
        .expect("a different weekday does not clash");
    assert_eq!(schedule.rules.len(), 2);
}

#[test]
fn inverted_date_range_is_rejected() {
    let err = DateRange::new(d(2026, 3, 9), d(2026, 3, 2)).unwrap_err();
    assert!(matches!(err, SchedulingError::InvalidDateRange { .. }));
}

#[test]
fn unknown_staff_lookup_fails() {
    let roster = Roster::from_schedules([monday_schedule()]);

    let err = roster.get("carol").unwrap_err();
    assert_eq!(err, SchedulingError::UnknownStaff("carol".to_string()));
}

// ── Determinism ─────────────────────────────────────────────────────────────

#[test]
fn resolution_is_idempotent() {
    let schedule = monday_schedule()
        .with_rule(AvailabilityRule::add(d(2026, 3, 4), t(10, 0), t(12, 0)))
        .with_rule(AvailabilityRule::remove(d(2026, 3, 9), t(12, 0), t(13, 0)));
    let window = range(d(2026, 3, 1), d(2026, 3, 31));

    let first = resolve_availability(&schedule, window).unwrap();
    let second = resolve_availability(&schedule, window).unwrap();

    assert_eq!(first, second);
}

#[test]
fn schedule_snapshot_from_json() {
    let json = r#"{
        "staff_id": "alice",
        "timezone": "Europe/Madrid",
        "rules": [
            {"type": "recurring", "weekday": "Mon", "start_time": "09:00:00", "end_time": "17:00:00"},
            {"type": "exception", "date": "2026-03-02", "kind": "REMOVE", "start_time": "12:00:00", "end_time": "13:00:00"}
        ]
    }"#;

    let schedule: Schedule = serde_json::from_str(json).unwrap();
    let result = resolve_availability(&schedule, DateRange::single(d(2026, 3, 2))).unwrap();

    assert_eq!(result, vec![utc(2, 8, 0, 11, 0), utc(2, 12, 0, 16, 0)]);
}
