//! Errors raised by the allocation and rollup core.

use crate::id::WorkItemId;

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// What is still open when a lifecycle advance is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prerequisite {
    /// Time logs on the item that are not approved yet
    UnapprovedTimeLogs,
    /// Children that have not reached `done`
    UnfinishedChildren,
}

impl std::fmt::Display for Prerequisite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnapprovedTimeLogs => f.write_str("unapproved time logs"),
            Self::UnfinishedChildren => f.write_str("unfinished sub-tasks"),
        }
    }
}

/// Errors that can occur in core operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// Sibling entry weights would sum past 100
    #[error("weight overflow: sibling entry weights would total {total}%")]
    WeightOverflow {
        /// Sum the write would produce
        total: f64,
    },

    /// Weight is negative or not a number
    #[error("invalid weight: {value}")]
    InvalidWeight {
        /// Rejected input
        value: f64,
    },

    /// Lifecycle advance blocked
    #[error("prerequisite not met: {count} {kind}")]
    PrerequisiteNotMet {
        /// What is still open
        kind: Prerequisite,
        /// How many block the advance
        count: usize,
    },

    /// Interval cannot be measured
    #[error("invalid interval: {reason}")]
    InvalidInterval {
        /// Why the span was refused
        reason: String,
    },

    /// Action is not valid in the current state
    #[error("cannot {action} from state {from}")]
    InvalidTransition {
        /// Current state
        from: String,
        /// Attempted action
        action: &'static str,
    },

    /// A member already has an open time log on the item
    #[error("an open time log already exists for this member")]
    AlreadyRunning,

    /// Work item not in the tree
    #[error("work item not found: {0}")]
    NotFound(WorkItemId),
}

impl Error {
    /// Build an `InvalidInterval` error.
    pub fn invalid_interval(reason: impl Into<String>) -> Self {
        Self::InvalidInterval {
            reason: reason.into(),
        }
    }
}
