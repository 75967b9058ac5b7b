//! Booking validation: the accept/reject decision for a requested appointment.
//!
//! Checks run per instance in a fixed order and the first failure wins:
//!
//! 1. the start lies within `[now + min_booking_notice, now + max_advance_booking]`,
//! 2. the instance lies within the staff member's availability for that day,
//! 3. unless overlapping is allowed, the instance overlaps no busy time.
//!
//! Recurring requests are expanded first and are all-or-nothing. Rejections are
//! returned as data; only malformed input produces an `Err`.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::appointment::Appointment;
use crate::availability::day_availability;
use crate::error::{Result, SchedulingError};
use crate::interval::Interval;
use crate::policy::Policy;
use crate::recurrence::RecurrenceRule;
use crate::schedule::Schedule;

/// A requested appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub staff_id: String,
    pub service_id: String,
    pub start: DateTime<Utc>,
    /// Length in minutes; falls back to the policy default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceRule>,
}

impl BookingRequest {
    pub fn new(
        staff_id: impl Into<String>,
        service_id: impl Into<String>,
        start: DateTime<Utc>,
    ) -> Self {
        Self {
            staff_id: staff_id.into(),
            service_id: service_id.into(),
            start,
            duration_minutes: None,
            recurrence: None,
        }
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    pub fn with_recurrence(mut self, rule: RecurrenceRule) -> Self {
        self.recurrence = Some(rule);
        self
    }

    /// Every interval this request would occupy, in order.
    ///
    /// A single interval for a one-off request; the expanded instances otherwise.
    pub fn instances(&self, policy: &Policy, tz: Tz) -> Result<Vec<Interval>> {
        let duration = policy.duration_or_default(self.duration_minutes);
        match &self.recurrence {
            Some(rule) => rule.expand(self.start, duration, tz),
            None => Ok(vec![Interval::starting_at(self.start, duration)?]),
        }
    }
}

/// Machine-readable reason for a rejected booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    OutsideBookingWindow,
    OutsideAvailability,
    Conflict,
}

impl RejectionReason {
    pub fn code(self) -> &'static str {
        match self {
            RejectionReason::OutsideBookingWindow => "OUTSIDE_BOOKING_WINDOW",
            RejectionReason::OutsideAvailability => "OUTSIDE_AVAILABILITY",
            RejectionReason::Conflict => "CONFLICT",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Why and where a booking was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    pub reason: RejectionReason,
    /// 0-based index of the failing instance; set for recurring requests only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failing_index: Option<usize>,
    /// The instance that failed.
    pub interval: Interval,
    /// The busy interval hit, for `Conflict`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflicting: Option<Interval>,
}

/// The intervals an accepted request will occupy once persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Booked {
    Single(Interval),
    Recurring(Vec<Interval>),
}

impl Booked {
    pub fn intervals(&self) -> &[Interval] {
        match self {
            Booked::Single(interval) => std::slice::from_ref(interval),
            Booked::Recurring(intervals) => intervals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Accepted { booked: Booked },
    Rejected(Rejection),
}

impl Decision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Decision::Accepted { .. })
    }

    pub fn booked(&self) -> Option<&Booked> {
        match self {
            Decision::Accepted { booked } => Some(booked),
            Decision::Rejected(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Decision::Accepted { .. } => None,
            Decision::Rejected(rejection) => Some(rejection),
        }
    }
}

/// Decide whether `request` can be booked.
///
/// `busy` is the ledger snapshot for the request's staff member with buffer time
/// already applied. Pure: the same inputs always give the same decision.
///
/// # Errors
/// Returns `UnknownStaff` when `schedule` belongs to a different staff member,
/// the schedule's structural errors, `InvalidInterval` for a zero duration and
/// `InvalidRecurrence` for a rule that cannot be expanded.
pub fn validate_booking(
    request: &BookingRequest,
    schedule: &Schedule,
    busy: &[Interval],
    policy: &Policy,
    now: DateTime<Utc>,
) -> Result<Decision> {
    if request.staff_id != schedule.staff_id {
        return Err(SchedulingError::UnknownStaff(request.staff_id.clone()));
    }
    schedule.check()?;

    let instances = request.instances(policy, schedule.timezone)?;
    let recurring = request.recurrence.is_some();
    Ok(decide(
        &request.staff_id,
        instances,
        recurring,
        schedule,
        busy,
        policy,
        now,
    ))
}

/// Decide whether an existing appointment can move to `new_start`, optionally
/// with a new duration (minutes; defaults to its current length).
///
/// `busy` must not contain the appointment itself (see
/// [`crate::BookingLedger::busy_intervals_excluding`]).
///
/// The moved interval keeps the appointment's exact length unless
/// `new_duration` is given.
///
/// # Errors
/// Returns `InvalidTransition` unless the appointment is tentative or confirmed,
/// `UnknownStaff` when `schedule` belongs to a different staff member, the
/// schedule's structural errors and `InvalidInterval` for a zero duration.
pub fn validate_reschedule(
    appointment: &Appointment,
    new_start: DateTime<Utc>,
    new_duration: Option<u32>,
    schedule: &Schedule,
    busy: &[Interval],
    policy: &Policy,
    now: DateTime<Utc>,
) -> Result<Decision> {
    if !appointment.can_reschedule() {
        return Err(SchedulingError::InvalidTransition {
            id: appointment.id.clone(),
            from: appointment.status,
            action: "reschedule",
        });
    }

    if appointment.staff_id != schedule.staff_id {
        return Err(SchedulingError::UnknownStaff(appointment.staff_id.clone()));
    }
    schedule.check()?;

    let duration = new_duration
        .map(|minutes| Duration::minutes(i64::from(minutes)))
        .unwrap_or_else(|| appointment.interval.duration());
    let moved = Interval::starting_at(new_start, duration)?;

    Ok(decide(
        &appointment.staff_id,
        vec![moved],
        false,
        schedule,
        busy,
        policy,
        now,
    ))
}

/// Check every instance in order; the first failure rejects the whole request.
fn decide(
    staff_id: &str,
    instances: Vec<Interval>,
    recurring: bool,
    schedule: &Schedule,
    busy: &[Interval],
    policy: &Policy,
    now: DateTime<Utc>,
) -> Decision {
    let mut accepted: Vec<Interval> = Vec::with_capacity(instances.len());

    for (index, instance) in instances.into_iter().enumerate() {
        if let Some((reason, conflicting)) =
            check_instance(&instance, schedule, busy, &accepted, policy, now)
        {
            debug!(
                staff_id,
                start = %instance.start(),
                %reason,
                index,
                "booking rejected"
            );
            return Decision::Rejected(Rejection {
                reason,
                failing_index: recurring.then_some(index),
                interval: instance,
                conflicting,
            });
        }
        accepted.push(instance);
    }

    debug!(staff_id, instances = accepted.len(), "booking accepted");

    let booked = match (recurring, accepted.as_slice()) {
        (false, [only]) => Booked::Single(*only),
        _ => Booked::Recurring(accepted),
    };
    Decision::Accepted { booked }
}

/// Run checks 1-3 against one instance. `earlier` holds instances of the same
/// request that already passed.
fn check_instance(
    instance: &Interval,
    schedule: &Schedule,
    busy: &[Interval],
    earlier: &[Interval],
    policy: &Policy,
    now: DateTime<Utc>,
) -> Option<(RejectionReason, Option<Interval>)> {
    let start = instance.start();
    if start < policy.earliest_start(now) || start > policy.latest_start(now) {
        return Some((RejectionReason::OutsideBookingWindow, None));
    }

    let available = day_availability(schedule, schedule.local_date(start));
    if !available.iter().any(|a| a.contains(instance)) {
        return Some((RejectionReason::OutsideAvailability, None));
    }

    if !policy.allow_overlapping {
        let buffer: Duration = policy.buffer();
        let hit = busy
            .iter()
            .copied()
            .chain(earlier.iter().map(|e| e.padded(buffer)))
            .find(|b| b.overlaps(instance));
        if let Some(hit) = hit {
            return Some((RejectionReason::Conflict, Some(hit)));
        }
    }

    None
}
