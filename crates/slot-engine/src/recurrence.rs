//! Recurrence expansion -- converts a booking recurrence rule into concrete instances.
//!
//! Wraps the `rrule` crate (v0.13) and `chrono-tz`. Instances are anchored at the
//! business-local wall-clock time of the first occurrence, so a weekly 10:00
//! appointment stays at 10:00 across DST changes. Later instances falling on a
//! repeated hour take the earliest instant; those in a gap shift forward.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use rrule::RRuleSet;
use serde::{Deserialize, Serialize};

use crate::dst::DstPolicy;
use crate::error::{Result, SchedulingError};
use crate::interval::Interval;

/// Upper bound on instances produced by one expansion.
pub const MAX_INSTANCES: u16 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    fn as_rrule(self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
        }
    }
}

/// How a recurrence stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecurrenceEnd {
    /// Last business-local date on which an instance may start, inclusive.
    #[serde(rename = "until")]
    Until(NaiveDate),
    /// Exact number of instances, the first occurrence included.
    #[serde(rename = "occurrence_count")]
    Count(u32),
}

fn one() -> u32 {
    1
}

/// A recurrence rule for a booking, e.g. "every 2 weeks, 6 times".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    /// Repeat every `interval_count` periods.
    #[serde(default = "one")]
    pub interval_count: u32,
    pub end: RecurrenceEnd,
}

impl RecurrenceRule {
    pub fn new(frequency: Frequency, end: RecurrenceEnd) -> Self {
        Self {
            frequency,
            interval_count: 1,
            end,
        }
    }

    pub fn every(mut self, interval_count: u32) -> Self {
        self.interval_count = interval_count;
        self
    }

    /// The RFC 5545 RRULE value for this rule, e.g. `FREQ=WEEKLY;INTERVAL=1;COUNT=4`.
    pub fn to_rrule(&self) -> String {
        let mut rule = format!(
            "FREQ={};INTERVAL={}",
            self.frequency.as_rrule(),
            self.interval_count
        );
        if let RecurrenceEnd::Count(count) = self.end {
            rule.push_str(&format!(";COUNT={}", count));
        }
        rule
    }

    /// Expand into instance intervals of `duration`, the first starting at `first_start`.
    ///
    /// Pure and deterministic: the same rule and anchor always give the same
    /// ordered list. `Count(n)` yields exactly `n` instances; `Until(date)` yields
    /// every instance whose local start date is on or before `date`.
    ///
    /// # Errors
    /// Returns `InvalidRecurrence` for a zero interval, a zero or oversized count,
    /// an `Until` that would pass [`MAX_INSTANCES`], or a rule that yields no
    /// instances; `InvalidInterval` for a non-positive duration.
    pub fn expand(
        &self,
        first_start: DateTime<Utc>,
        duration: Duration,
        tz: Tz,
    ) -> Result<Vec<Interval>> {
        if self.interval_count == 0 {
            return Err(SchedulingError::InvalidRecurrence(
                "interval_count must be at least 1".to_string(),
            ));
        }

        let limit = match self.end {
            RecurrenceEnd::Count(0) => {
                return Err(SchedulingError::InvalidRecurrence(
                    "occurrence_count must be at least 1".to_string(),
                ))
            }
            RecurrenceEnd::Count(count) => u16::try_from(count)
                .ok()
                .filter(|c| *c <= MAX_INSTANCES)
                .ok_or_else(|| {
                    SchedulingError::InvalidRecurrence(format!(
                        "occurrence_count {} exceeds the limit of {}",
                        count, MAX_INSTANCES
                    ))
                })?,
            // One past the cap, to tell a finished series from a truncated one.
            RecurrenceEnd::Until(_) => MAX_INSTANCES + 1,
        };

        // Check the duration once, before touching the rrule parser.
        Interval::starting_at(first_start, duration)?;

        // Expand on floating wall-clock time (no DST in UTC) and pin each local
        // start afterwards, so an anchor in a repeated hour still parses.
        let local = first_start.with_timezone(&tz).naive_local();
        let rrule_text = format!(
            "DTSTART;TZID=UTC:{}\nRRULE:{}",
            local.format("%Y%m%dT%H%M%S"),
            self.to_rrule()
        );

        let rrule_set: RRuleSet = rrule_text
            .parse()
            .map_err(|e| SchedulingError::InvalidRecurrence(format!("{}", e)))?;

        let until = match self.end {
            RecurrenceEnd::Until(date) => Some(date),
            RecurrenceEnd::Count(_) => None,
        };

        let local_starts: Vec<NaiveDateTime> = rrule_set
            .all(limit)
            .dates
            .into_iter()
            .map(|dt| dt.naive_utc())
            .take_while(|start| until.is_none_or(|until| start.date() <= until))
            .collect();

        if local_starts.len() > usize::from(MAX_INSTANCES) {
            return Err(SchedulingError::InvalidRecurrence(format!(
                "{} runs past the limit of {} instances",
                self.to_rrule(),
                MAX_INSTANCES
            )));
        }

        let instances = local_starts
            .into_iter()
            .enumerate()
            .map(|(index, start)| {
                let instant = if index == 0 {
                    first_start
                } else {
                    DstPolicy::ShiftForward.resolve(tz, start).ok_or_else(|| {
                        SchedulingError::InvalidRecurrence(format!(
                            "{} does not exist in {}",
                            start,
                            tz.name()
                        ))
                    })?
                };
                Interval::starting_at(instant, duration)
            })
            .collect::<Result<Vec<Interval>>>()?;

        if instances.is_empty() {
            return Err(SchedulingError::InvalidRecurrence(format!(
                "{} expands to no instances from {}",
                self.to_rrule(),
                local
            )));
        }

        Ok(instances)
    }
}
