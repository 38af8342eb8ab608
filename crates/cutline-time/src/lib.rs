//! Rational time arithmetic for the Cutline timeline model.
//!
//! Editorial time is expressed as a count of ticks at a tick rate, so frame
//! positions survive rate conversion without rounding:
//!
//! - [`RationalTime`]: a `value`/`rate` pair (e.g. frame 48 at 24fps)
//! - [`TimeRange`]: a start time plus duration with an end-exclusive bound
//!
//! Arithmetic between operands of differing rates rescales the right operand
//! to the left operand's rate first; nothing is silently truncated, and
//! fractional frame positions are valid.
//!
//! # Usage
//!
//! ```rust
//! use cutline_time::{RationalTime, TimeRange};
//!
//! let start = RationalTime::new(0.0, 24.0);
//! let duration = RationalTime::new(48.0, 24.0); // 2 seconds at 24fps
//! let range = TimeRange::new(start, duration);
//!
//! assert_eq!(range.end_time_exclusive().value, 48.0);
//! assert!(range.contains(RationalTime::new(47.5, 24.0)));
//! ```

pub mod error;
pub mod rational_time;
pub mod time_range;

pub use error::{TimeError, TimeResult};
pub use rational_time::RationalTime;
pub use time_range::TimeRange;
