//! DST transition policies for wall-clock availability rules.
//!
//! Availability is written in business-local time ("Mon 09:00-17:00") and has to
//! be pinned to instants. Ambiguous local times (fall back) always resolve to the
//! earliest instant; nonexistent local times (spring forward) follow [`DstPolicy`].

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Policy for local times that fall into a DST gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstPolicy {
    /// Drop the affected availability for that day.
    Skip,
    /// Shift forward by the length of the gap (02:30 becomes 03:30 when clocks
    /// jump from 02:00 to 03:00).
    #[default]
    ShiftForward,
}

impl DstPolicy {
    /// Pin a local wall-clock time in `tz` to an instant.
    ///
    /// Returns `None` only under [`DstPolicy::Skip`] for a time inside a gap.
    pub fn resolve(self, tz: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        match tz.from_local_datetime(&local) {
            LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
            LocalResult::None => match self {
                DstPolicy::Skip => None,
                DstPolicy::ShiftForward => {
                    // Transitions are months apart, so a day earlier is safely
                    // on the pre-gap offset.
                    let before = tz
                        .offset_from_utc_datetime(&(local - Duration::days(1)))
                        .fix()
                        .local_minus_utc();
                    Some((local - Duration::seconds(i64::from(before))).and_utc())
                }
            },
        }
    }
}
