//! Booking ledger: the read view of existing appointments used for conflict checks.
//!
//! The ledger answers with busy time that already includes buffer padding, so the
//! validator and slot generator only ever compare plain intervals.

use chrono::Duration;

use crate::appointment::Appointment;
use crate::interval::{self, Interval};

/// Busy time per staff member, read from a point-in-time snapshot.
///
/// Implementations return merged, chronological intervals for every appointment
/// that blocks time (confirmed, in progress, or tentative on hold) and whose padded
/// interval overlaps `range`. Intervals are not clipped to `range`.
pub trait BookingLedger {
    fn busy_intervals(&self, staff_id: &str, range: &Interval) -> Vec<Interval>;

    /// Same as [`BookingLedger::busy_intervals`] but ignoring one appointment,
    /// so a reschedule is never in conflict with the booking it moves.
    fn busy_intervals_excluding(
        &self,
        staff_id: &str,
        range: &Interval,
        appointment_id: &str,
    ) -> Vec<Interval>;
}

/// In-memory ledger over an appointment snapshot.
#[derive(Debug, Clone, Copy)]
pub struct AppointmentLedger<'a> {
    appointments: &'a [Appointment],
    buffer: Duration,
}

impl<'a> AppointmentLedger<'a> {
    /// `buffer` is applied on both sides of every appointment.
    pub fn new(appointments: &'a [Appointment], buffer: Duration) -> Self {
        Self {
            appointments,
            buffer,
        }
    }

    fn collect(&self, staff_id: &str, range: &Interval, exclude: Option<&str>) -> Vec<Interval> {
        let padded: Vec<Interval> = self
            .appointments
            .iter()
            .filter(|a| a.staff_id == staff_id && a.blocks_time())
            .filter(|a| exclude != Some(a.id.as_str()))
            .map(|a| a.interval.padded(self.buffer))
            .filter(|busy| busy.overlaps(range))
            .collect();
        interval::merge(&padded)
    }
}

impl BookingLedger for AppointmentLedger<'_> {
    fn busy_intervals(&self, staff_id: &str, range: &Interval) -> Vec<Interval> {
        self.collect(staff_id, range, None)
    }

    fn busy_intervals_excluding(
        &self,
        staff_id: &str,
        range: &Interval,
        appointment_id: &str,
    ) -> Vec<Interval> {
        self.collect(staff_id, range, Some(appointment_id))
    }
}
