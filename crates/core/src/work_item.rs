//! Work item model - a node in the allocation tree.

use serde::{Deserialize, Serialize};
use crate::id::WorkItemId;
use crate::Time;

/// A work item is one node of an initiative's breakdown.
///
/// `entry_weight` is always denominated against the tree root's pool, while
/// `relative_weight` is the share of the immediate parent's entry weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    /// Unique identifier
    pub id: WorkItemId,

    /// Sequence code (`T-01`, `T-01.02`, ...)
    pub code: String,

    /// Title
    pub name: String,

    /// Parent item, `None` for root items
    pub parent: Option<WorkItemId>,

    /// Children in creation order
    pub children: Vec<WorkItemId>,

    /// Share of the total pool (0-100)
    pub entry_weight: f64,

    /// Share of the parent's entry weight (0-100)
    pub relative_weight: f64,

    /// Manually entered progress, meaningful for leaves (0-100)
    pub manual_progress: f64,

    /// Lifecycle state
    pub workflow: Workflow,

    /// Rolled-up results written back by the caller
    pub rollup: ItemRollup,

    /// Code of the lowest free sequence slot when this item was numbered
    pub missing_from: Option<String>,

    /// Creation timestamp
    pub created_at: Time,
}

impl WorkItem {
    /// Create a fresh item with zero weights in state `new`.
    pub fn new(name: impl Into<String>, parent: Option<WorkItemId>, workflow: Workflow) -> Self {
        Self {
            id: WorkItemId::new(),
            code: String::new(),
            name: name.into(),
            parent,
            children: Vec::new(),
            entry_weight: 0.0,
            relative_weight: 0.0,
            manual_progress: 0.0,
            workflow,
            rollup: ItemRollup::default(),
            missing_from: None,
            created_at: chrono::Utc::now(),
        }
    }

    /// True when the item has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// True for root items.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// True when the item reached terminal success.
    pub fn is_done(&self) -> bool {
        self.workflow.is_done()
    }
}

/// Computed values a caller persists after running the rollup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemRollup {
    /// Budgeted effort in person-days
    pub budgeted_effort: f64,

    /// Consumed effort in person-days
    pub actual_effort: f64,

    /// Rolled-up progress (0-100)
    pub progress: f64,

    /// Budget / actual ratio for completed leaves, uncapped
    pub quality: f64,
}

/// Lifecycle of a work item, resolved at the data-model boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "state", rename_all = "snake_case")]
pub enum Workflow {
    /// Approval chain used by delivery work
    Standard(TaskState),
    /// Short chain used by ticket-like work
    Ticket(TicketState),
}

impl Workflow {
    /// Initial standard workflow.
    pub fn standard() -> Self {
        Self::Standard(TaskState::New)
    }

    /// Initial ticket workflow.
    pub fn ticket() -> Self {
        Self::Ticket(TicketState::New)
    }

    /// True when the item reached terminal success.
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Standard(TaskState::Done) | Self::Ticket(TicketState::Done))
    }

    /// True for `new` in either chain.
    pub fn is_new(&self) -> bool {
        matches!(self, Self::Standard(TaskState::New) | Self::Ticket(TicketState::New))
    }

    /// State label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Standard(state) => state.as_str(),
            Self::Ticket(state) => state.as_str(),
        }
    }
}

impl Default for Workflow {
    fn default() -> Self {
        Self::standard()
    }
}

/// Standard approval chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Not started
    New,
    /// Being worked
    InProgress,
    /// Waiting for first approval
    Approval1,
    /// Waiting for second approval
    Approval2,
    /// Finished
    Done,
    /// Refused; only loaded from existing data
    Rejected,
    /// Abandoned
    Cancelled,
}

impl TaskState {
    /// The state a confirm moves to, `None` when the chain has ended.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::New => Some(Self::InProgress),
            Self::InProgress => Some(Self::Approval1),
            Self::Approval1 => Some(Self::Approval2),
            Self::Approval2 => Some(Self::Done),
            Self::Done | Self::Rejected | Self::Cancelled => None,
        }
    }

    /// Whether a reject is accepted here.
    pub fn can_reject(self) -> bool {
        matches!(self, Self::Approval1 | Self::Approval2)
    }

    /// Whether the chain has ended.
    pub fn is_final(self) -> bool {
        matches!(self, Self::Done | Self::Rejected | Self::Cancelled)
    }

    /// Get string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Approval1 => "approval_1",
            Self::Approval2 => "approval_2",
            Self::Done => "done",
            Self::Rejected => "rejected",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Ticket chain; `Hold` re-enters `InProgress` on confirm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketState {
    /// Not started
    New,
    /// Being worked
    InProgress,
    /// Parked
    Hold,
    /// Finished
    Done,
}

impl TicketState {
    /// The state a confirm moves to.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::New | Self::Hold => Some(Self::InProgress),
            Self::InProgress => Some(Self::Done),
            Self::Done => None,
        }
    }

    /// Get string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Hold => "hold",
            Self::Done => "done",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_chain_is_linear() {
        let mut state = TaskState::New;
        let mut seen = vec![state];
        while let Some(next) = state.next() {
            state = next;
            seen.push(state);
        }
        assert_eq!(
            seen,
            vec![
                TaskState::New,
                TaskState::InProgress,
                TaskState::Approval1,
                TaskState::Approval2,
                TaskState::Done,
            ]
        );
    }

    #[test]
    fn test_reject_only_mid_chain() {
        assert!(TaskState::Approval1.can_reject());
        assert!(TaskState::Approval2.can_reject());
        assert!(!TaskState::New.can_reject());
        assert!(!TaskState::Done.can_reject());
    }

    #[test]
    fn test_ticket_hold_reenters() {
        assert_eq!(TicketState::Hold.next(), Some(TicketState::InProgress));
        assert_eq!(TicketState::InProgress.next(), Some(TicketState::Done));
        assert_eq!(TicketState::Done.next(), None);
    }

    #[test]
    fn test_workflow_done() {
        assert!(Workflow::Standard(TaskState::Done).is_done());
        assert!(Workflow::Ticket(TicketState::Done).is_done());
        assert!(!Workflow::standard().is_done());
    }

    #[test]
    fn test_workflow_serde_tagged() {
        let json = serde_json::to_string(&Workflow::Ticket(TicketState::Hold)).unwrap();
        assert_eq!(json, r#"{"kind":"ticket","state":"hold"}"#);
    }
}
