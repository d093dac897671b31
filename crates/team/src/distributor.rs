//! Role-weight distribution.
//!
//! A role's percentage belongs to the role, not to whoever holds it. Each
//! assignment receives `role_percentage / k` where `k` counts the
//! assignments holding the same role on the same initiative.

use std::collections::{HashMap, HashSet};

use pmo_core::{AssignmentId, InitiativeId, MemberId, RoleAssignment, RoleId};
use tracing::debug;

/// Effective weight of each assignment in one initiative's team.
///
/// Recompute whenever an assignment is added or removed.
pub fn distribute(assignments: &[RoleAssignment]) -> HashMap<AssignmentId, f64> {
    let mut holders: HashMap<RoleId, usize> = HashMap::new();
    for assignment in assignments {
        *holders.entry(assignment.role).or_default() += 1;
    }

    assignments
        .iter()
        .map(|assignment| {
            let k = holders.get(&assignment.role).copied().unwrap_or(1);
            (assignment.id, assignment.role_percentage / k as f64)
        })
        .collect()
}

/// [`distribute`] applied to each initiative separately.
pub fn distribute_by_initiative(
    assignments: &[RoleAssignment],
) -> HashMap<InitiativeId, HashMap<AssignmentId, f64>> {
    let mut grouped: HashMap<InitiativeId, Vec<RoleAssignment>> = HashMap::new();
    for assignment in assignments {
        grouped
            .entry(assignment.initiative)
            .or_default()
            .push(assignment.clone());
    }

    grouped
        .into_iter()
        .map(|(initiative, team)| {
            debug!(%initiative, assignments = team.len(), "distributing role weights");
            (initiative, distribute(&team))
        })
        .collect()
}

/// Distinct members of `initiative`'s team, in assignment order.
pub fn team_members(assignments: &[RoleAssignment], initiative: InitiativeId) -> Vec<MemberId> {
    let mut ordered: Vec<&RoleAssignment> = assignments
        .iter()
        .filter(|assignment| assignment.initiative == initiative)
        .collect();
    ordered.sort_by_key(|assignment| assignment.sequence);

    let mut seen = HashSet::new();
    ordered
        .into_iter()
        .map(|assignment| assignment.member)
        .filter(|member| seen.insert(*member))
        .collect()
}
