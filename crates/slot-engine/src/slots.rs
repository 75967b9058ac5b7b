//! Bookable slot generation.
//!
//! Availability minus busy time, clipped to the booking window, cut into
//! fixed-length candidates. Days are resolved one at a time as the iterator is
//! pulled, so asking for the first few slots of a long range stays cheap.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::availability::day_availability;
use crate::error::Result;
use crate::interval::{self, Interval};
use crate::policy::Policy;
use crate::schedule::{DateRange, Schedule};

/// A bookable candidate. Transient: produced on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub staff_id: String,
    pub service_id: String,
    pub interval: Interval,
}

/// What to generate slots for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotQuery {
    pub service_id: String,
    /// Slot length in minutes; falls back to the policy default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    pub range: DateRange,
}

impl SlotQuery {
    pub fn new(service_id: impl Into<String>, range: DateRange) -> Self {
        Self {
            service_id: service_id.into(),
            duration_minutes: None,
            range,
        }
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }
}

/// Lazy, finite sequence of [`TimeSlot`]s.
///
/// Cloning a fresh `Slots` (or calling [`generate_slots`] again with the same
/// inputs) reproduces the same sequence.
#[derive(Debug, Clone)]
pub struct Slots<'a> {
    schedule: &'a Schedule,
    busy: Vec<Interval>,
    service_id: String,
    duration: Duration,
    step: Duration,
    window: Option<Interval>,
    next_day: Option<NaiveDate>,
    last_day: NaiveDate,
    fragments: VecDeque<Interval>,
    cursor: Option<(Interval, DateTime<Utc>)>,
}

/// Generate bookable slots for `query` on `schedule`.
///
/// `busy` is the ledger snapshot for the staff member (buffer already applied).
/// Slots start at the beginning of each free fragment and advance by the policy's
/// slot interval (default: the slot duration) while a full slot still fits.
/// Busy time is subtracted regardless of `allow_overlapping`.
///
/// # Errors
/// Returns the schedule's structural errors (see [`crate::resolve_availability`])
/// and `InvalidInterval` for a zero duration.
pub fn generate_slots<'a>(
    schedule: &'a Schedule,
    busy: &[Interval],
    query: &SlotQuery,
    policy: &Policy,
    now: DateTime<Utc>,
) -> Result<Slots<'a>> {
    schedule.check()?;

    let duration = policy.duration_or_default(query.duration_minutes);
    Interval::starting_at(now, duration)?;

    // Empty when the notice period reaches past the advance limit.
    let window = Interval::new(policy.earliest_start(now), policy.latest_start(now)).ok();

    debug!(
        staff_id = %schedule.staff_id,
        service_id = %query.service_id,
        from = %query.range.start,
        to = %query.range.end,
        duration_minutes = duration.num_minutes(),
        "generating slots"
    );

    Ok(Slots {
        schedule,
        busy: interval::merge(busy),
        service_id: query.service_id.clone(),
        duration,
        step: policy.step(duration),
        window,
        next_day: window.map(|_| query.range.start),
        last_day: query.range.end,
        fragments: VecDeque::new(),
        cursor: None,
    })
}

impl Slots<'_> {
    /// Free fragments on `date` that can hold at least one slot.
    fn free_fragments(&self, date: NaiveDate) -> VecDeque<Interval> {
        let Some(window) = self.window else {
            return VecDeque::new();
        };
        let available = day_availability(self.schedule, date);
        interval::subtract_all(&available, &self.busy)
            .iter()
            .filter_map(|fragment| fragment.intersect(&window))
            .filter(|fragment| fragment.duration() >= self.duration)
            .collect()
    }
}

impl Iterator for Slots<'_> {
    type Item = TimeSlot;

    fn next(&mut self) -> Option<TimeSlot> {
        loop {
            if let Some((fragment, start)) = self.cursor.take() {
                let end = start + self.duration;
                if end <= fragment.end() {
                    self.cursor = Some((fragment, start + self.step));
                    trace!(%start, %end, "slot");
                    return Some(TimeSlot {
                        staff_id: self.schedule.staff_id.clone(),
                        service_id: self.service_id.clone(),
                        interval: Interval::new(start, end).ok()?,
                    });
                }
            }

            if let Some(fragment) = self.fragments.pop_front() {
                self.cursor = Some((fragment, fragment.start()));
                continue;
            }

            let day = self.next_day?;
            self.next_day = day.succ_opt().filter(|next| *next <= self.last_day);
            self.fragments = self.free_fragments(day);
        }
    }
}
