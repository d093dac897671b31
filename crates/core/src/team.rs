//! Team model - roles and who holds them on an initiative.

use serde::{Deserialize, Serialize};
use crate::id::{AssignmentId, InitiativeId, MemberId, RoleId};

/// A job role carrying a share of the initiative's weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    /// Unique identifier
    pub id: RoleId,

    /// Role name
    pub name: String,

    /// Percentage allocated to the role as a whole
    pub total_percentage: f64,
}

impl Role {
    /// Create a role.
    pub fn new(name: impl Into<String>, total_percentage: f64) -> Self {
        Self {
            id: RoleId::new(),
            name: name.into(),
            total_percentage,
        }
    }
}

/// A team member holding a role on an initiative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Unique identifier
    pub id: AssignmentId,

    /// Owning initiative
    pub initiative: InitiativeId,

    /// Team member
    pub member: MemberId,

    /// Role held
    pub role: RoleId,

    /// The role's total percentage, copied from the role
    pub role_percentage: f64,

    /// Display order
    pub sequence: u32,
}

impl RoleAssignment {
    /// Assign `member` to `role` on `initiative`.
    pub fn new(initiative: InitiativeId, member: MemberId, role: &Role) -> Self {
        Self {
            id: AssignmentId::new(),
            initiative,
            member,
            role: role.id,
            role_percentage: role.total_percentage,
            sequence: 0,
        }
    }
}
