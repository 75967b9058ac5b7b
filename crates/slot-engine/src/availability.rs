//! Availability resolution: weekly rules plus exceptions into concrete intervals.
//!
//! For each business-local day in the range:
//!
//! 1. recurring rules for that weekday whose effective period covers the date,
//! 2. unioned with ADD exceptions for the date,
//! 3. minus REMOVE exceptions for the date (ADD first, so an exception can both
//!    extend and then trim),
//! 4. minus blocked periods,
//!
//! merged into a chronological, non-overlapping list.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::Result;
use crate::interval::{self, Interval};
use crate::schedule::{AvailabilityRule, DateRange, ExceptionKind, Schedule};

/// Resolve a schedule snapshot into the staff member's available intervals.
///
/// Deterministic: identical inputs always produce identical output.
///
/// # Errors
/// Returns `InvalidRule` for a rule whose start time is not before its end time,
/// and `OverlappingRules` when two recurring rules for the same weekday overlap.
pub fn resolve_availability(schedule: &Schedule, range: DateRange) -> Result<Vec<Interval>> {
    schedule.check()?;

    let intervals: Vec<Interval> = range
        .days()
        .flat_map(|date| day_availability(schedule, date))
        .collect();
    let merged = interval::merge(&intervals);

    debug!(
        staff_id = %schedule.staff_id,
        from = %range.start,
        to = %range.end,
        intervals = merged.len(),
        "resolved availability"
    );

    Ok(merged)
}

/// Available intervals on a single business-local date.
///
/// Assumes the schedule already passed [`Schedule::check`].
pub(crate) fn day_availability(schedule: &Schedule, date: NaiveDate) -> Vec<Interval> {
    let pinned = |rule: &AvailabilityRule| {
        let (start, end) = rule.times();
        schedule.local_interval(date, start, end)
    };

    let open: Vec<Interval> = schedule
        .rules
        .iter()
        .filter(|r| r.recurs_on(date) || r.excepts(date, ExceptionKind::Add))
        .filter_map(pinned)
        .collect();

    if open.is_empty() {
        return open;
    }

    let removed: Vec<Interval> = schedule
        .rules
        .iter()
        .filter(|r| r.excepts(date, ExceptionKind::Remove))
        .filter_map(pinned)
        .collect();

    let blocked: Vec<Interval> = schedule.blocked.iter().map(|b| b.interval).collect();

    let trimmed = interval::subtract_all(&open, &removed);
    interval::subtract_all(&trimmed, &blocked)
}
