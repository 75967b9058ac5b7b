//! # slot-engine
//!
//! Deterministic availability resolution, slot generation and booking validation
//! for appointment scheduling.
//!
//! Given a staff member's availability rules, the busy time of existing bookings
//! and a booking policy, the engine computes bookable slots and accepts or rejects
//! booking requests without ever double-booking. Every operation is a pure
//! function of its inputs: no I/O, no global state, no locking. Persisting an
//! accepted booking atomically with the busy-time read is the caller's job.
//!
//! ## Modules
//!
//! - [`interval`]: half-open intervals: overlap, intersect, subtract, merge
//! - [`schedule`]: availability rules, blocked periods, schedules, rosters
//! - [`availability`]: rules + exceptions → concrete available intervals
//! - [`dst`]: DST gap handling for wall-clock rules
//! - [`ledger`]: busy time of existing appointments
//! - [`slots`]: lazy bookable slot generation
//! - [`recurrence`]: recurring booking expansion
//! - [`validator`]: accept/reject decisions for new and moved bookings
//! - [`scheduler`]: roster + ledger + policy behind one entry point
//! - [`appointment`]: appointment status lifecycle
//! - [`policy`]: per-call booking settings
//! - [`error`]: Error types

pub mod appointment;
pub mod availability;
pub mod dst;
pub mod error;
pub mod interval;
pub mod ledger;
pub mod policy;
pub mod recurrence;
pub mod schedule;
pub mod scheduler;
pub mod slots;
pub mod validator;

pub use appointment::{Appointment, AppointmentStatus};
pub use availability::resolve_availability;
pub use error::SchedulingError;
pub use interval::Interval;
pub use ledger::{AppointmentLedger, BookingLedger};
pub use policy::Policy;
pub use recurrence::{Frequency, RecurrenceEnd, RecurrenceRule};
pub use schedule::{AvailabilityRule, BlockedPeriod, DateRange, ExceptionKind, Roster, Schedule};
pub use scheduler::Scheduler;
pub use slots::{generate_slots, SlotQuery, Slots, TimeSlot};
pub use validator::{
    validate_booking, validate_reschedule, Booked, BookingRequest, Decision, Rejection,
    RejectionReason,
};
