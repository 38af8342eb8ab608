//! `RationalTime`: a time value expressed as ticks at a tick rate.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TimeError, TimeResult};

/// A rational time value: `value` ticks at `rate` ticks per second.
///
/// Frame 36 of a 24fps sequence is `RationalTime { value: 36.0, rate: 24.0 }`.
/// Values are `f64` so fractional frame positions (from retimes or rate
/// conversion) are representable exactly as the source produced them.
#[derive(Copy, Clone, Debug, Serialize, Deserialize)]
pub struct RationalTime {
    pub value: f64,
    pub rate: f64,
}

impl RationalTime {
    /// Create a new `RationalTime` with the given value and rate.
    #[must_use]
    pub fn new(value: f64, rate: f64) -> Self {
        Self { value, rate }
    }

    /// Zero ticks at the given rate.
    #[must_use]
    pub fn zero(rate: f64) -> Self {
        Self { value: 0.0, rate }
    }

    /// Create a `RationalTime` from seconds at the given rate.
    #[must_use]
    pub fn from_seconds(seconds: f64, rate: f64) -> Self {
        Self {
            value: seconds * rate,
            rate,
        }
    }

    /// Convert to seconds.
    #[must_use]
    pub fn to_seconds(self) -> f64 {
        self.value / self.rate
    }

    /// Rescale this time to a new rate, preserving the instant it denotes.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::InvalidRate`] if either rate is zero.
    pub fn rescaled_to(self, rate: f64) -> TimeResult<Self> {
        if self.rate == 0.0 {
            return Err(TimeError::InvalidRate { rate: self.rate });
        }
        if rate == 0.0 {
            return Err(TimeError::InvalidRate { rate });
        }
        Ok(Self {
            value: self.value * (rate / self.rate),
            rate,
        })
    }

    /// Add another time, rescaling it to this time's rate first.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::InvalidRate`] if either rate is zero.
    pub fn checked_add(self, other: Self) -> TimeResult<Self> {
        let other = other.rescaled_to(self.rate)?;
        Ok(Self {
            value: self.value + other.value,
            rate: self.rate,
        })
    }

    /// Subtract another time, rescaling it to this time's rate first.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::InvalidRate`] if either rate is zero.
    pub fn checked_sub(self, other: Self) -> TimeResult<Self> {
        let other = other.rescaled_to(self.rate)?;
        Ok(Self {
            value: self.value - other.value,
            rate: self.rate,
        })
    }

    /// Compare against another time after rescaling it to this time's rate.
    ///
    /// Ordering after rescale uses exact floating comparison; no rounding is
    /// applied.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::InvalidRate`] if either rate is zero.
    pub fn compare(self, other: Self) -> TimeResult<Ordering> {
        let other = other.rescaled_to(self.rate)?;
        Ok(self
            .value
            .partial_cmp(&other.value)
            .unwrap_or(Ordering::Equal))
    }

    /// The negation of this time.
    #[must_use]
    pub fn negated(self) -> Self {
        Self {
            value: -self.value,
            rate: self.rate,
        }
    }

    /// The whole frame number this time falls on at its own rate.
    #[must_use]
    pub fn to_frames(self) -> i64 {
        self.value.floor() as i64
    }

    /// The whole frame number this time falls on at the given rate.
    ///
    /// # Errors
    ///
    /// Returns [`TimeError::InvalidRate`] if either rate is zero.
    pub fn to_frames_at(self, rate: f64) -> TimeResult<i64> {
        Ok(self.rescaled_to(rate)?.to_frames())
    }
}

impl PartialEq for RationalTime {
    fn eq(&self, other: &Self) -> bool {
        // Degenerate zero-rate values compare field-wise so reflexivity holds.
        match other.rescaled_to(self.rate) {
            Ok(rescaled) => self.value == rescaled.value,
            Err(_) => self.value == other.value && self.rate == other.rate,
        }
    }
}

impl PartialOrd for RationalTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let rescaled = other.rescaled_to(self.rate).ok()?;
        self.value.partial_cmp(&rescaled.value)
    }
}

impl fmt::Display for RationalTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.value, self.rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescale_preserves_instant() {
        let t = RationalTime::new(24.0, 24.0);
        let rescaled = t.rescaled_to(48.0).expect("rescale");
        assert_eq!(rescaled.value, 48.0);
        assert_eq!(rescaled.rate, 48.0);
        assert_eq!(t.to_seconds(), rescaled.to_seconds());
    }

    #[test]
    fn rescale_to_zero_rate_fails() {
        let t = RationalTime::new(24.0, 24.0);
        assert_eq!(
            t.rescaled_to(0.0),
            Err(TimeError::InvalidRate { rate: 0.0 })
        );
    }

    #[test]
    fn rescale_from_zero_rate_fails() {
        let t = RationalTime::new(24.0, 0.0);
        assert!(t.rescaled_to(24.0).is_err());
    }

    #[test]
    fn add_rescales_right_operand() {
        // 12 frames at 24fps plus 1 second at 48fps = 36 frames at 24fps.
        let a = RationalTime::new(12.0, 24.0);
        let b = RationalTime::new(48.0, 48.0);
        let sum = a.checked_add(b).expect("add");
        assert_eq!(sum.value, 36.0);
        assert_eq!(sum.rate, 24.0);
    }

    #[test]
    fn subtract_can_go_negative() {
        let a = RationalTime::new(5.0, 24.0);
        let b = RationalTime::new(24.0, 24.0);
        let diff = a.checked_sub(b).expect("sub");
        assert_eq!(diff.value, -19.0);
    }

    #[test]
    fn cross_rate_equality() {
        let a = RationalTime::new(24.0, 24.0);
        let b = RationalTime::new(48.0, 48.0);
        assert_eq!(a, b);
        assert!(a.compare(b).expect("compare") == Ordering::Equal);
    }

    #[test]
    fn cross_rate_ordering() {
        let a = RationalTime::new(12.0, 24.0);
        let b = RationalTime::new(48.0, 48.0);
        assert!(a < b);
        assert_eq!(a.compare(b).expect("compare"), Ordering::Less);
    }

    #[test]
    fn fractional_values_are_preserved() {
        let t = RationalTime::new(10.0, 24.0).rescaled_to(30.0).expect("rescale");
        assert_eq!(t.value, 12.5);
        assert_eq!(t.to_frames(), 12);
    }

    #[test]
    fn seconds_roundtrip() {
        let t = RationalTime::from_seconds(2.5, 24.0);
        assert_eq!(t.value, 60.0);
        assert_eq!(t.to_seconds(), 2.5);
    }

    #[test]
    fn to_frames_floors() {
        assert_eq!(RationalTime::new(23.9, 24.0).to_frames(), 23);
        assert_eq!(RationalTime::new(-0.5, 24.0).to_frames(), -1);
    }
}
