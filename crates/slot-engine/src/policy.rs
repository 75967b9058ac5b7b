//! Booking policy: the settings snapshot passed into every call.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Booking rules for one resolution or validation call.
///
/// Field units follow the settings the values come from: durations in minutes,
/// the advance window in days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Duration used when a request does not name one (minutes).
    pub default_duration: u32,
    /// Earliest bookable start, relative to now (minutes).
    pub min_booking_notice: u32,
    /// Latest bookable start, relative to now (days).
    pub max_advance_booking: u32,
    /// Skip the conflict check against existing bookings.
    pub allow_overlapping: bool,
    /// Gap kept free on both sides of every appointment (minutes).
    pub buffer_time: u32,
    /// Step between candidate slot starts (minutes). Defaults to the slot duration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot_interval: Option<u32>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            default_duration: 60,
            min_booking_notice: 60,
            max_advance_booking: 90,
            allow_overlapping: false,
            buffer_time: 0,
            slot_interval: None,
        }
    }
}

impl Policy {
    pub fn min_notice(&self) -> Duration {
        Duration::minutes(i64::from(self.min_booking_notice))
    }

    pub fn max_advance(&self) -> Duration {
        Duration::days(i64::from(self.max_advance_booking))
    }

    /// Earliest bookable start for a request made at `now`.
    pub fn earliest_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.min_notice())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Latest bookable start for a request made at `now`. An advance window that
    /// reaches past the representable range is unbounded.
    pub fn latest_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.max_advance())
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    pub fn buffer(&self) -> Duration {
        Duration::minutes(i64::from(self.buffer_time))
    }

    /// The requested duration, or the policy default.
    pub fn duration_or_default(&self, duration_minutes: Option<u32>) -> Duration {
        Duration::minutes(i64::from(duration_minutes.unwrap_or(self.default_duration)))
    }

    /// Step between slot starts for a slot of `duration`.
    pub fn step(&self, duration: Duration) -> Duration {
        match self.slot_interval {
            Some(minutes) if minutes > 0 => Duration::minutes(i64::from(minutes)),
            _ => duration,
        }
    }
}
