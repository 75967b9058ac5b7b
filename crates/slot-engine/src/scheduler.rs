//! A roster, a ledger and a policy bundled behind one entry point.
//!
//! `Scheduler` performs the "read busy intervals, validate" half of a booking.
//! Committing the accepted intervals, and making read-validate-commit atomic per
//! staff member, stays with the caller's persistence layer.

use chrono::{DateTime, Duration, Utc};

use crate::appointment::Appointment;
use crate::availability::resolve_availability;
use crate::error::Result;
use crate::interval::Interval;
use crate::ledger::BookingLedger;
use crate::policy::Policy;
use crate::schedule::{DateRange, Roster};
use crate::slots::{generate_slots, SlotQuery, Slots};
use crate::validator::{validate_booking, validate_reschedule, BookingRequest, Decision};

#[derive(Debug, Clone)]
pub struct Scheduler<'a, L> {
    roster: &'a Roster,
    ledger: L,
    policy: &'a Policy,
}

impl<'a, L: BookingLedger> Scheduler<'a, L> {
    pub fn new(roster: &'a Roster, ledger: L, policy: &'a Policy) -> Self {
        Self {
            roster,
            ledger,
            policy,
        }
    }

    pub fn policy(&self) -> &Policy {
        self.policy
    }

    /// Resolved availability for one staff member.
    pub fn availability(&self, staff_id: &str, range: DateRange) -> Result<Vec<Interval>> {
        resolve_availability(self.roster.get(staff_id)?, range)
    }

    /// Bookable slots for one staff member, lazily generated.
    pub fn slots(
        &self,
        staff_id: &str,
        query: &SlotQuery,
        now: DateTime<Utc>,
    ) -> Result<Slots<'a>> {
        let schedule = self.roster.get(staff_id)?;
        let span = schedule.range_interval(query.range)?;
        let busy = self.ledger.busy_intervals(staff_id, &span);
        generate_slots(schedule, &busy, query, self.policy, now)
    }

    /// Validate a new booking against the ledger's current busy time.
    pub fn validate(&self, request: &BookingRequest, now: DateTime<Utc>) -> Result<Decision> {
        let schedule = self.roster.get(&request.staff_id)?;
        let instances = request.instances(self.policy, schedule.timezone)?;
        let busy = match span(&instances) {
            Some(span) => self.ledger.busy_intervals(&request.staff_id, &span),
            None => Vec::new(),
        };
        validate_booking(request, schedule, &busy, self.policy, now)
    }

    /// Validate moving (and optionally resizing) an existing appointment.
    pub fn validate_reschedule(
        &self,
        appointment: &Appointment,
        new_start: DateTime<Utc>,
        new_duration: Option<u32>,
        now: DateTime<Utc>,
    ) -> Result<Decision> {
        let schedule = self.roster.get(&appointment.staff_id)?;
        let duration = new_duration
            .map(|m| Duration::minutes(i64::from(m)))
            .unwrap_or_else(|| appointment.interval.duration());
        let target = Interval::starting_at(new_start, duration)?;
        let busy = self.ledger.busy_intervals_excluding(
            &appointment.staff_id,
            &target,
            &appointment.id,
        );
        validate_reschedule(
            appointment,
            new_start,
            new_duration,
            schedule,
            &busy,
            self.policy,
            now,
        )
    }
}

/// The smallest interval covering every instance.
fn span(instances: &[Interval]) -> Option<Interval> {
    let first = instances.first()?;
    let last_end = instances.iter().map(Interval::end).max()?;
    Interval::new(first.start(), last_end).ok()
}
