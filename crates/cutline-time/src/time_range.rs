//! `TimeRange`: a start time plus duration with an end-exclusive bound.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TimeResult;
use crate::rational_time::RationalTime;

/// A span of time: a start instant and a duration.
///
/// The end bound is exclusive: a 24-frame range starting at frame 0 covers
/// frames `[0, 24)`. Duration is expected to be non-negative; constructors
/// do not reorder operands.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_time: RationalTime,
    pub duration: RationalTime,
}

impl TimeRange {
    /// Create a new `TimeRange` with the given start time and duration.
    #[must_use]
    pub fn new(start_time: RationalTime, duration: RationalTime) -> Self {
        Self {
            start_time,
            duration,
        }
    }

    /// A zero-length range at time 0 of the given rate.
    #[must_use]
    pub fn zero(rate: f64) -> Self {
        Self {
            start_time: RationalTime::zero(rate),
            duration: RationalTime::zero(rate),
        }
    }

    /// Build a range from a start time and an exclusive end time.
    ///
    /// # Errors
    ///
    /// Returns an error if the end time cannot be rescaled to the start
    /// time's rate.
    pub fn range_from_start_end_time(
        start_time: RationalTime,
        end_time_exclusive: RationalTime,
    ) -> TimeResult<Self> {
        let duration = end_time_exclusive.checked_sub(start_time)?;
        Ok(Self {
            start_time,
            duration,
        })
    }

    /// The exclusive end bound: `start_time + duration` at the start rate.
    #[must_use]
    pub fn end_time_exclusive(&self) -> RationalTime {
        // Same-rate arithmetic: duration is carried at a rescalable rate by
        // construction, so failure here would mean a zero-rate duration.
        self.start_time
            .checked_add(self.duration)
            .unwrap_or(self.start_time)
    }

    /// Whether `time` falls inside `[start, end_exclusive)`.
    #[must_use]
    pub fn contains(&self, time: RationalTime) -> bool {
        time >= self.start_time && time < self.end_time_exclusive()
    }

    /// Whether `range` lies entirely inside this range.
    #[must_use]
    pub fn contains_range(&self, range: &TimeRange) -> bool {
        range.start_time >= self.start_time
            && range.end_time_exclusive() <= self.end_time_exclusive()
    }

    /// Whether two ranges overlap by a non-zero amount.
    #[must_use]
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start_time < other.end_time_exclusive()
            && other.start_time < self.end_time_exclusive()
    }

    /// `time` clamped into this range's bounds.
    #[must_use]
    pub fn clamped(&self, time: RationalTime) -> RationalTime {
        if time < self.start_time {
            return self.start_time;
        }
        let end = self.end_time_exclusive();
        if time > end {
            end
        } else {
            time
        }
    }

    /// This range with the duration extended by `amount` (start unchanged).
    ///
    /// # Errors
    ///
    /// Returns an error if `amount` cannot be rescaled to the duration rate.
    pub fn extended_by(&self, amount: RationalTime) -> TimeResult<Self> {
        Ok(Self {
            start_time: self.start_time,
            duration: self.duration.checked_add(amount)?,
        })
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} +{}]", self.start_time, self.duration)
    }
}
