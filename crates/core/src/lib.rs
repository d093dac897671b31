//! PMO core data models.
//!
//! This crate defines the work tree, time logs, schedules and team records
//! that the allocation and rollup engines operate on.

#![warn(missing_docs)]

// Core identities
mod id;
mod error;
mod config;

// Work breakdown
mod work_item;
mod tree;
mod initiative;

// Time and team
mod interval;
mod timelog;
mod schedule;
mod team;
mod access;

mod snapshot;

// Re-exports
pub use id::*;
pub use error::{Error, Prerequisite, Result};
pub use config::Config;

pub use work_item::{WorkItem, ItemRollup, Workflow, TaskState, TicketState};
pub use tree::WorkTree;
pub use initiative::{Initiative, InitiativeKind, InitiativeStatus};

pub use interval::{normalize, validate_interval};
pub use timelog::{
    TimeLogEntry, LogState, TimerState, PauseSpan, CorrectionRequest, CorrectionKind, CorrectionState,
};
pub use schedule::{WorkSchedule, DaySchedule, WorkWindow};
pub use team::{Role, RoleAssignment};
pub use access::{classify, AccessGroup, GroupMembership, RoleFlags};

pub use snapshot::Snapshot;

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
