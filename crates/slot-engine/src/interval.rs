//! Half-open time intervals and the algebra over them.
//!
//! Every interval is `[start, end)` with `start < end`. The invariant is enforced
//! by [`Interval::new`] and by deserialization, so the operations below are total.
//! Adjacent intervals (one ends exactly when the other starts) do NOT overlap.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulingError};

/// A non-empty half-open interval `[start, end)` between two instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawInterval {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawInterval> for Interval {
    type Error = SchedulingError;

    fn try_from(raw: RawInterval) -> Result<Self> {
        Interval::new(raw.start, raw.end)
    }
}

impl Interval {
    /// Build an interval, failing with `InvalidInterval` unless `start < end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(SchedulingError::InvalidInterval { start, end })
        }
    }

    /// Build the interval `[start, start + duration)`.
    pub fn starting_at(start: DateTime<Utc>, duration: Duration) -> Result<Self> {
        Self::new(start, start + duration)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// True iff `self.start < other.end && other.start < self.end`.
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// The common part of two intervals, or `None` when they do not overlap.
    pub fn intersect(&self, other: &Interval) -> Option<Interval> {
        if self.overlaps(other) {
            Some(Interval {
                start: self.start.max(other.start),
                end: self.end.min(other.end),
            })
        } else {
            None
        }
    }

    /// True when `other` lies entirely within `self`.
    pub fn contains(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Widen the interval by `buffer` on both sides. Non-positive buffers are a no-op.
    pub fn padded(&self, buffer: Duration) -> Interval {
        if buffer <= Duration::zero() {
            return *self;
        }
        Interval {
            start: self.start - buffer,
            end: self.end + buffer,
        }
    }

    /// Remove every busy interval from `self`.
    ///
    /// `busy` may be unsorted and may overlap itself or extend past `self`.
    /// Returns the remaining free fragments in chronological order.
    pub fn subtract(&self, busy: &[Interval]) -> Vec<Interval> {
        let clipped: Vec<Interval> = busy.iter().filter_map(|b| self.intersect(b)).collect();
        let merged = merge(&clipped);

        let mut free = Vec::new();
        let mut cursor = self.start;

        for b in &merged {
            if cursor < b.start {
                free.push(Interval {
                    start: cursor,
                    end: b.start,
                });
            }
            cursor = cursor.max(b.end);
        }

        // Trailing fragment after the last busy period.
        if cursor < self.end {
            free.push(Interval {
                start: cursor,
                end: self.end,
            });
        }

        free
    }
}

/// Coalesce overlapping or adjacent intervals.
///
/// Returns a sorted, non-overlapping list in which no two neighbours touch.
pub fn merge(intervals: &[Interval]) -> Vec<Interval> {
    let mut sorted = intervals.to_vec();
    sorted.sort();

    let mut merged: Vec<Interval> = Vec::with_capacity(sorted.len());
    for interval in sorted {
        if let Some(last) = merged.last_mut() {
            if interval.start <= last.end {
                last.end = last.end.max(interval.end);
                continue;
            }
        }
        merged.push(interval);
    }

    merged
}

/// Subtract `busy` from every interval of `available`.
///
/// `available` is merged first, so the result is chronological and non-overlapping.
pub fn subtract_all(available: &[Interval], busy: &[Interval]) -> Vec<Interval> {
    merge(available)
        .iter()
        .flat_map(|a| a.subtract(busy))
        .collect()
}
