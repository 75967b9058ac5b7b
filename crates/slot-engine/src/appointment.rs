//! Appointments and their status lifecycle.
//!
//! Appointments are never deleted by the core; cancellation is a status change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulingError};
use crate::interval::Interval;
use crate::recurrence::RecurrenceRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Tentative,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

fn hold_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub staff_id: String,
    pub service_id: String,
    pub interval: Interval,
    pub status: AppointmentStatus,
    /// A tentative appointment only reserves its time while on hold.
    #[serde(default = "hold_by_default")]
    pub hold: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cancellation_reason: String,
}

impl Appointment {
    /// A new tentative appointment holding its interval.
    pub fn tentative(
        id: impl Into<String>,
        staff_id: impl Into<String>,
        service_id: impl Into<String>,
        interval: Interval,
    ) -> Self {
        Self {
            id: id.into(),
            staff_id: staff_id.into(),
            service_id: service_id.into(),
            interval,
            status: AppointmentStatus::Tentative,
            hold: true,
            recurrence: None,
            cancelled_at: None,
            cancellation_reason: String::new(),
        }
    }

    /// A new confirmed appointment.
    pub fn confirmed(
        id: impl Into<String>,
        staff_id: impl Into<String>,
        service_id: impl Into<String>,
        interval: Interval,
    ) -> Self {
        Self {
            status: AppointmentStatus::Confirmed,
            ..Self::tentative(id, staff_id, service_id, interval)
        }
    }

    /// Whether this appointment makes its staff member busy.
    pub fn blocks_time(&self) -> bool {
        match self.status {
            AppointmentStatus::Confirmed | AppointmentStatus::InProgress => true,
            AppointmentStatus::Tentative => self.hold,
            AppointmentStatus::Completed
            | AppointmentStatus::Cancelled
            | AppointmentStatus::NoShow => false,
        }
    }

    pub fn can_reschedule(&self) -> bool {
        matches!(
            self.status,
            AppointmentStatus::Tentative | AppointmentStatus::Confirmed
        )
    }

    pub fn confirm(&mut self) -> Result<()> {
        self.transition("confirm", AppointmentStatus::Confirmed, |s| {
            s == AppointmentStatus::Tentative
        })
    }

    pub fn start(&mut self) -> Result<()> {
        self.transition("start", AppointmentStatus::InProgress, |s| {
            s == AppointmentStatus::Confirmed
        })
    }

    pub fn complete(&mut self) -> Result<()> {
        self.transition("complete", AppointmentStatus::Completed, |s| {
            matches!(s, AppointmentStatus::Confirmed | AppointmentStatus::InProgress)
        })
    }

    pub fn cancel(&mut self, reason: impl Into<String>, at: DateTime<Utc>) -> Result<()> {
        self.transition("cancel", AppointmentStatus::Cancelled, |s| {
            !matches!(s, AppointmentStatus::Cancelled | AppointmentStatus::Completed)
        })?;
        self.cancelled_at = Some(at);
        self.cancellation_reason = reason.into();
        Ok(())
    }

    /// Only an appointment that has already ended can be a no-show.
    pub fn mark_no_show(&mut self, now: DateTime<Utc>) -> Result<()> {
        let ended = self.interval.end() <= now;
        self.transition("mark no-show", AppointmentStatus::NoShow, |s| {
            ended && matches!(s, AppointmentStatus::Tentative | AppointmentStatus::Confirmed)
        })
    }

    /// Move or resize the appointment. Validation of the new interval is the
    /// caller's job (see [`crate::validator::validate_reschedule`]).
    pub fn reschedule(&mut self, interval: Interval) -> Result<()> {
        if !self.can_reschedule() {
            return Err(self.invalid("reschedule"));
        }
        self.interval = interval;
        Ok(())
    }

    fn transition(
        &mut self,
        action: &'static str,
        to: AppointmentStatus,
        allowed: impl FnOnce(AppointmentStatus) -> bool,
    ) -> Result<()> {
        if !allowed(self.status) {
            return Err(self.invalid(action));
        }
        self.status = to;
        Ok(())
    }

    fn invalid(&self, action: &'static str) -> SchedulingError {
        SchedulingError::InvalidTransition {
            id: self.id.clone(),
            from: self.status,
            action,
        }
    }
}
