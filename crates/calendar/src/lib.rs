//! Business Calendar (Layer 1)
//!
//! Converts raw time-log intervals into work hours with the midday break
//! excluded.

#![warn(missing_docs)]

pub mod duration;

pub use duration::{compute_hours, compute_hours_utc, log_hours, normalize};
