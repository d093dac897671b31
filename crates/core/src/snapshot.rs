//! Snapshot - everything a caller loads before running the core.

use serde::{Deserialize, Serialize};
use crate::initiative::Initiative;
use crate::schedule::WorkSchedule;
use crate::team::{Role, RoleAssignment};
use crate::timelog::{CorrectionRequest, TimeLogEntry};
use crate::tree::WorkTree;
use crate::id::WorkItemId;

/// In-memory state of one initiative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// The owning initiative
    pub initiative: Initiative,

    /// Work breakdown
    pub tree: WorkTree,

    /// Time logs for every item of the tree
    #[serde(default)]
    pub time_logs: Vec<TimeLogEntry>,

    /// Pending and decided correction requests
    #[serde(default)]
    pub corrections: Vec<CorrectionRequest>,

    /// Calendar used to measure time logs
    #[serde(default)]
    pub schedule: WorkSchedule,

    /// Role catalog
    #[serde(default)]
    pub roles: Vec<Role>,

    /// Team composition
    #[serde(default)]
    pub assignments: Vec<RoleAssignment>,
}

impl Snapshot {
    /// Empty snapshot for a fresh initiative.
    pub fn new(initiative: Initiative, tree: WorkTree, schedule: WorkSchedule) -> Self {
        Self {
            initiative,
            tree,
            time_logs: Vec::new(),
            corrections: Vec::new(),
            schedule,
            roles: Vec::new(),
            assignments: Vec::new(),
        }
    }

    /// Time logs attached to one item.
    pub fn logs_for(&self, item: WorkItemId) -> impl Iterator<Item = &TimeLogEntry> {
        self.time_logs.iter().filter(move |log| log.work_item == item)
    }
}
