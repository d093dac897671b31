//! Access-role classification, computed once by the caller and passed along.

use serde::{Deserialize, Serialize};
use crate::id::MemberId;

/// Access groups a member can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessGroup {
    /// Full access to every initiative
    Administrator,
    /// Runs initiatives
    ProjectManager,
    /// Approves time logs and corrections
    Approver,
    /// Works on assigned items
    TeamMember,
}

/// One membership row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMembership {
    /// Member
    pub member: MemberId,
    /// Group joined
    pub group: AccessGroup,
}

/// What a member may do, derived from their memberships.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleFlags {
    /// Full access
    pub is_admin: bool,
    /// Manages initiatives
    pub is_manager: bool,
    /// May approve time logs and corrections
    pub can_approve: bool,
    /// On some team
    pub is_member: bool,
}

/// Classify `member` from the membership table.
///
/// Administrators imply every other flag; managers may approve.
pub fn classify(member: MemberId, memberships: &[GroupMembership]) -> RoleFlags {
    memberships
        .iter()
        .filter(|m| m.member == member)
        .fold(RoleFlags::default(), |flags, m| match m.group {
            AccessGroup::Administrator => RoleFlags {
                is_admin: true,
                is_manager: true,
                can_approve: true,
                is_member: true,
            },
            AccessGroup::ProjectManager => RoleFlags {
                is_manager: true,
                can_approve: true,
                is_member: true,
                ..flags
            },
            AccessGroup::Approver => RoleFlags {
                can_approve: true,
                ..flags
            },
            AccessGroup::TeamMember => RoleFlags {
                is_member: true,
                ..flags
            },
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_combines_groups() {
        let alice = MemberId::new();
        let bob = MemberId::new();
        let memberships = [
            GroupMembership { member: alice, group: AccessGroup::TeamMember },
            GroupMembership { member: alice, group: AccessGroup::Approver },
            GroupMembership { member: bob, group: AccessGroup::Administrator },
        ];

        let flags = classify(alice, &memberships);
        assert!(flags.is_member && flags.can_approve);
        assert!(!flags.is_admin && !flags.is_manager);

        let flags = classify(bob, &memberships);
        assert!(flags.is_admin && flags.is_manager && flags.can_approve);
    }

    #[test]
    fn test_unknown_member_has_no_flags() {
        assert_eq!(classify(MemberId::new(), &[]), RoleFlags::default());
    }
}
