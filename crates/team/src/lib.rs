//! Team weighting
//!
//! Splits each role's percentage evenly across the members holding it.

#![warn(missing_docs)]

pub mod distributor;

pub use distributor::{distribute, distribute_by_initiative, team_members};
