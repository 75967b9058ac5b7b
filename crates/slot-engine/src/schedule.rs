//! Staff availability snapshots: rules, blocked periods, schedules and rosters.
//!
//! The core never owns or mutates this data beyond the write-time helpers on
//! [`Schedule`]; callers hand in a snapshot per call.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::dst::DstPolicy;
use crate::error::{Result, SchedulingError};
use crate::interval::Interval;

/// Whether an exception adds availability or takes it away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExceptionKind {
    Add,
    Remove,
}

/// One availability rule, in business-local wall-clock time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AvailabilityRule {
    /// Weekly hours, e.g. every Monday 09:00-17:00.
    Recurring {
        weekday: Weekday,
        start_time: NaiveTime,
        end_time: NaiveTime,
        /// First date the rule applies to (unbounded when absent).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        effective_from: Option<NaiveDate>,
        /// Last date the rule applies to, inclusive (unbounded when absent).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        effective_until: Option<NaiveDate>,
    },
    /// A one-day override that extends or trims availability.
    Exception {
        date: NaiveDate,
        kind: ExceptionKind,
        start_time: NaiveTime,
        end_time: NaiveTime,
    },
}

impl AvailabilityRule {
    /// Weekly rule without effective bounds.
    pub fn weekly(weekday: Weekday, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        AvailabilityRule::Recurring {
            weekday,
            start_time,
            end_time,
            effective_from: None,
            effective_until: None,
        }
    }

    pub fn add(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        AvailabilityRule::Exception {
            date,
            kind: ExceptionKind::Add,
            start_time,
            end_time,
        }
    }

    pub fn remove(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        AvailabilityRule::Exception {
            date,
            kind: ExceptionKind::Remove,
            start_time,
            end_time,
        }
    }

    pub fn times(&self) -> (NaiveTime, NaiveTime) {
        match self {
            AvailabilityRule::Recurring {
                start_time,
                end_time,
                ..
            }
            | AvailabilityRule::Exception {
                start_time,
                end_time,
                ..
            } => (*start_time, *end_time),
        }
    }

    /// True for a recurring rule that is in effect on `date` and matches its weekday.
    pub(crate) fn recurs_on(&self, date: NaiveDate) -> bool {
        match self {
            AvailabilityRule::Recurring {
                weekday,
                effective_from,
                effective_until,
                ..
            } => {
                *weekday == date.weekday()
                    && effective_from.is_none_or(|from| from <= date)
                    && effective_until.is_none_or(|until| date <= until)
            }
            AvailabilityRule::Exception { .. } => false,
        }
    }

    /// True for an exception of `kind` on exactly `date`.
    pub(crate) fn excepts(&self, date: NaiveDate, kind: ExceptionKind) -> bool {
        matches!(
            self,
            AvailabilityRule::Exception { date: d, kind: k, .. } if *d == date && *k == kind
        )
    }

    /// Two recurring rules clash when they share a weekday, their hours overlap and
    /// their effective periods intersect.
    fn clashes_with(&self, other: &AvailabilityRule) -> bool {
        let (
            AvailabilityRule::Recurring {
                weekday: w1,
                start_time: s1,
                end_time: e1,
                effective_from: f1,
                effective_until: u1,
            },
            AvailabilityRule::Recurring {
                weekday: w2,
                start_time: s2,
                end_time: e2,
                effective_from: f2,
                effective_until: u2,
            },
        ) = (self, other)
        else {
            return false;
        };

        let hours_overlap = s1 < e2 && s2 < e1;
        let periods_intersect = match (f1, u2) {
            (Some(from), Some(until)) if from > until => false,
            _ => !matches!((f2, u1), (Some(from), Some(until)) if from > until),
        };

        w1 == w2 && hours_overlap && periods_intersect
    }
}

/// An absolute-time window in which the staff member cannot be booked
/// (vacation, holiday, maintenance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockedPeriod {
    #[serde(default)]
    pub title: String,
    #[serde(flatten)]
    pub interval: Interval,
}

impl BlockedPeriod {
    pub fn new(title: impl Into<String>, interval: Interval) -> Self {
        Self {
            title: title.into(),
            interval,
        }
    }
}

/// The availability rule set for one staff member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub staff_id: String,
    /// Business timezone in which rules are written and dates are counted.
    pub timezone: Tz,
    #[serde(default)]
    pub dst_policy: DstPolicy,
    #[serde(default)]
    pub rules: Vec<AvailabilityRule>,
    #[serde(default)]
    pub blocked: Vec<BlockedPeriod>,
}

impl Schedule {
    pub fn new(staff_id: impl Into<String>, timezone: Tz) -> Self {
        Self {
            staff_id: staff_id.into(),
            timezone,
            dst_policy: DstPolicy::default(),
            rules: Vec::new(),
            blocked: Vec::new(),
        }
    }

    pub fn with_dst_policy(mut self, policy: DstPolicy) -> Self {
        self.dst_policy = policy;
        self
    }

    /// Append a rule without validation (snapshot construction).
    pub fn with_rule(mut self, rule: AvailabilityRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_blocked(mut self, period: BlockedPeriod) -> Self {
        self.blocked.push(period);
        self
    }

    /// Append a rule, rejecting malformed hours and recurring rules that would
    /// overlap an existing rule for the same weekday.
    pub fn add_rule(&mut self, rule: AvailabilityRule) -> Result<()> {
        self.check_rule_hours(&rule)?;
        if let Some(AvailabilityRule::Recurring { weekday, .. }) =
            self.rules.iter().find(|existing| existing.clashes_with(&rule))
        {
            return Err(SchedulingError::OverlappingRules {
                staff_id: self.staff_id.clone(),
                weekday: *weekday,
            });
        }
        self.rules.push(rule);
        Ok(())
    }

    /// Validate a snapshot: every rule has `start_time < end_time` and no two
    /// recurring rules clash.
    pub fn check(&self) -> Result<()> {
        for rule in &self.rules {
            self.check_rule_hours(rule)?;
        }
        for (i, a) in self.rules.iter().enumerate() {
            for b in &self.rules[i + 1..] {
                if let AvailabilityRule::Recurring { weekday, .. } = a {
                    if a.clashes_with(b) {
                        return Err(SchedulingError::OverlappingRules {
                            staff_id: self.staff_id.clone(),
                            weekday: *weekday,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    fn check_rule_hours(&self, rule: &AvailabilityRule) -> Result<()> {
        let (start, end) = rule.times();
        if start < end {
            Ok(())
        } else {
            Err(SchedulingError::InvalidRule {
                staff_id: self.staff_id.clone(),
                detail: format!("start time {} is not before end time {}", start, end),
            })
        }
    }

    /// Pin `[start, end)` on `date` to instants in the business timezone.
    ///
    /// `None` when the DST policy skips the day or the pinned interval is empty.
    pub(crate) fn local_interval(
        &self,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Option<Interval> {
        let start = self.dst_policy.resolve(self.timezone, date.and_time(start))?;
        let end = self.dst_policy.resolve(self.timezone, date.and_time(end))?;
        Interval::new(start, end).ok()
    }

    /// Business-local date of an instant.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }

    /// The instants spanned by `range`: local midnight of the first day up to
    /// local midnight after the last day.
    pub fn range_interval(&self, range: DateRange) -> Result<Interval> {
        let midnight = NaiveTime::MIN;
        let start = DstPolicy::ShiftForward.resolve(self.timezone, range.start.and_time(midnight));
        let after = range.end.succ_opt().unwrap_or(range.end);
        let end = DstPolicy::ShiftForward.resolve(self.timezone, after.and_time(midnight));
        match (start, end) {
            (Some(start), Some(end)) => Interval::new(start, end),
            _ => Err(SchedulingError::InvalidDateRange {
                start: range.start,
                end: range.end,
            }),
        }
    }
}

/// An inclusive range of business-local dates. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    pub(crate) start: NaiveDate,
    pub(crate) end: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = SchedulingError;

    fn try_from(raw: RawDateRange) -> Result<Self> {
        DateRange::new(raw.start, raw.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start <= end {
            Ok(Self { start, end })
        } else {
            Err(SchedulingError::InvalidDateRange { start, end })
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every date in the range, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}

/// Schedules keyed by staff identifier.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    schedules: BTreeMap<String, Schedule>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_schedules(schedules: impl IntoIterator<Item = Schedule>) -> Self {
        let mut roster = Self::new();
        for schedule in schedules {
            roster.insert(schedule);
        }
        roster
    }

    /// Insert or replace the schedule for its staff member.
    pub fn insert(&mut self, schedule: Schedule) {
        self.schedules.insert(schedule.staff_id.clone(), schedule);
    }

    /// Look up a staff member's schedule, failing with `UnknownStaff`.
    pub fn get(&self, staff_id: &str) -> Result<&Schedule> {
        self.schedules
            .get(staff_id)
            .ok_or_else(|| SchedulingError::UnknownStaff(staff_id.to_string()))
    }

    /// Attach a business-wide blocked period to every schedule.
    pub fn block_all(&mut self, period: BlockedPeriod) {
        for schedule in self.schedules.values_mut() {
            schedule.blocked.push(period.clone());
        }
    }

    pub fn staff_ids(&self) -> impl Iterator<Item = &str> {
        self.schedules.keys().map(String::as_str)
    }
}
