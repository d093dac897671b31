//! Initiative model - the project or ticket queue that owns a work tree.

use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};
use crate::id::InitiativeId;
use crate::Time;

/// An initiative owns one work tree and its total budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Initiative {
    /// Unique identifier
    pub id: InitiativeId,

    /// Initiative code
    pub code: String,

    /// Display name
    pub name: String,

    /// Kind of initiative
    pub kind: InitiativeKind,

    /// Status
    pub status: InitiativeStatus,

    /// Total budgeted effort in person-days
    pub budget: f64,

    /// When created
    pub created_at: Time,
}

impl Initiative {
    /// Create a new initiative in status `new`.
    pub fn new(code: impl Into<String>, name: impl Into<String>, kind: InitiativeKind, budget: f64) -> Self {
        Self {
            id: InitiativeId::new(),
            code: code.into(),
            name: name.into(),
            kind,
            status: InitiativeStatus::New,
            budget,
            created_at: chrono::Utc::now(),
        }
    }

    /// Advance one step along the chain for this kind.
    pub fn confirm(&mut self) -> Result<InitiativeStatus> {
        let next = match self.kind {
            InitiativeKind::Delivery | InitiativeKind::Maintenance => self.status.next_project(),
            InitiativeKind::Ticket => self.status.next_ticket(),
            InitiativeKind::Other => None,
        };
        let next = next.ok_or(Error::InvalidTransition {
            from: self.status.as_str().to_string(),
            action: "confirm",
        })?;
        self.status = next;
        Ok(next)
    }

    /// Park a ticket in progress.
    pub fn hold(&mut self) -> Result<()> {
        if self.kind != InitiativeKind::Ticket || self.status != InitiativeStatus::InProgress {
            return Err(Error::InvalidTransition {
                from: self.status.as_str().to_string(),
                action: "hold",
            });
        }
        self.status = InitiativeStatus::Hold;
        Ok(())
    }

    /// Mark the initiative failed.
    pub fn fail(&mut self) {
        self.status = InitiativeStatus::Failed;
    }

    /// Return to `new`.
    pub fn set_to_draft(&mut self) {
        self.status = InitiativeStatus::New;
    }
}

/// Kind of initiative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitiativeKind {
    /// Project delivery
    Delivery,
    /// Project maintenance
    Maintenance,
    /// Non-project ticket queue
    Ticket,
    /// Non-project, no approval chain
    Other,
}

/// Initiative status across both chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitiativeStatus {
    /// Draft
    New,
    /// Waiting for confirmation
    Waiting,
    /// Confirmed by the customer
    Confirmed,
    /// Waiting for the sales director
    SalesDirToApprove,
    /// Waiting for the head of the PMO
    HeadPmoToApprove,
    /// Handed to operations
    Operation,
    /// Budget approved
    BudgetApprove,
    /// Waiting for the finance director
    FinanceDirToApprove,
    /// Fully approved
    FullApprove,
    /// Ticket being worked
    InProgress,
    /// Ticket parked
    Hold,
    /// Ticket solved
    Solved,
    /// Project closed
    Closed,
    /// Abandoned
    Failed,
}

impl InitiativeStatus {
    fn next_project(self) -> Option<Self> {
        use InitiativeStatus::*;
        match self {
            New => Some(Waiting),
            Waiting => Some(Confirmed),
            Confirmed => Some(SalesDirToApprove),
            SalesDirToApprove => Some(HeadPmoToApprove),
            HeadPmoToApprove => Some(Operation),
            Operation => Some(BudgetApprove),
            BudgetApprove => Some(FinanceDirToApprove),
            FinanceDirToApprove => Some(FullApprove),
            FullApprove => Some(Closed),
            _ => None,
        }
    }

    fn next_ticket(self) -> Option<Self> {
        match self {
            Self::New | Self::Hold => Some(Self::InProgress),
            Self::InProgress => Some(Self::Solved),
            _ => None,
        }
    }

    /// Get string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Waiting => "waiting",
            Self::Confirmed => "confirmed",
            Self::SalesDirToApprove => "sales_dir_to_approve",
            Self::HeadPmoToApprove => "head_pmo_to_approve",
            Self::Operation => "operation",
            Self::BudgetApprove => "budget_approve",
            Self::FinanceDirToApprove => "finance_dir_to_approve",
            Self::FullApprove => "full_approve",
            Self::InProgress => "in_progress",
            Self::Hold => "hold",
            Self::Solved => "solved",
            Self::Closed => "closed",
            Self::Failed => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_chain_reaches_closed() {
        let mut project = Initiative::new("IP-001", "Core banking", InitiativeKind::Delivery, 100.0);
        let mut steps = 0;
        while project.confirm().is_ok() {
            steps += 1;
        }
        assert_eq!(steps, 9);
        assert_eq!(project.status, InitiativeStatus::Closed);
    }

    #[test]
    fn test_ticket_hold_and_resume() {
        let mut ticket = Initiative::new("TK-1", "Helpdesk", InitiativeKind::Ticket, 0.0);
        assert!(ticket.hold().is_err());
        ticket.confirm().unwrap();
        ticket.hold().unwrap();
        assert_eq!(ticket.confirm().unwrap(), InitiativeStatus::InProgress);
        assert_eq!(ticket.confirm().unwrap(), InitiativeStatus::Solved);
        assert!(ticket.confirm().is_err());
    }

    #[test]
    fn test_fail_and_reset() {
        let mut project = Initiative::new("MT-7", "Support", InitiativeKind::Maintenance, 10.0);
        project.fail();
        assert!(project.confirm().is_err());
        project.set_to_draft();
        assert_eq!(project.confirm().unwrap(), InitiativeStatus::Waiting);
    }
}
