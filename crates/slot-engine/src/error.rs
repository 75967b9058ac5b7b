//! Error types for slot-engine operations.
//!
//! These are structural failures: malformed input or violated preconditions.
//! Booking rejections are ordinary results and live in [`crate::validator`].

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use thiserror::Error;

use crate::appointment::AppointmentStatus;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulingError {
    /// An interval whose start is not strictly before its end.
    #[error("Invalid interval: start {start} is not before end {end}")]
    InvalidInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// A time-of-day rule whose start is not strictly before its end.
    #[error("Invalid availability rule for staff '{staff_id}': {detail}")]
    InvalidRule { staff_id: String, detail: String },

    /// No schedule is known for the staff member.
    #[error("Unknown staff: {0}")]
    UnknownStaff(String),

    /// Two recurring rules for the same weekday overlap while both are in effect.
    #[error("Overlapping availability rules for staff '{staff_id}' on {weekday}")]
    OverlappingRules { staff_id: String, weekday: Weekday },

    /// A date range whose end precedes its start.
    #[error("Invalid date range: {start} .. {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    /// A recurrence rule that cannot be expanded.
    #[error("Invalid recurrence: {0}")]
    InvalidRecurrence(String),

    /// A status change that the appointment's current status does not allow.
    #[error("Cannot {action} appointment '{id}' in status {from:?}")]
    InvalidTransition {
        id: String,
        from: AppointmentStatus,
        action: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, SchedulingError>;
