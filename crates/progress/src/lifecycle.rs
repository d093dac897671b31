//! Work item lifecycle transitions and the time-log timer.
//!
//! `confirm` advances exactly one step. Leaving `in_progress` requires every
//! time log on the item to be approved and every child to be done.

use chrono::NaiveDateTime;
use pmo_core::{
    Error, LogState, MemberId, Prerequisite, Result, TaskState, TicketState, TimeLogEntry, TimeLogId,
    WorkItemId, WorkTree, Workflow,
};
use tracing::info;

/// Advance `id` one step along its chain.
pub fn confirm(tree: &mut WorkTree, id: WorkItemId, logs: &[TimeLogEntry]) -> Result<Workflow> {
    let item = tree.get(id)?;
    let leaving_work = matches!(
        item.workflow,
        Workflow::Standard(TaskState::InProgress) | Workflow::Ticket(TicketState::InProgress)
    );
    if leaving_work {
        check_prerequisites(tree, id, logs)?;
    }

    let next = match item.workflow {
        Workflow::Standard(state) => state.next().map(Workflow::Standard),
        Workflow::Ticket(state) => state.next().map(Workflow::Ticket),
    };
    let next = next.ok_or_else(|| Error::InvalidTransition {
        from: item.workflow.label().to_string(),
        action: "confirm",
    })?;

    let item = tree.get_mut(id)?;
    info!(item = %item.code, from = item.workflow.label(), to = next.label(), "confirmed");
    item.workflow = next;
    if next.is_done() {
        item.manual_progress = 100.0;
    }
    Ok(next)
}

fn check_prerequisites(tree: &WorkTree, id: WorkItemId, logs: &[TimeLogEntry]) -> Result<()> {
    let unapproved = logs
        .iter()
        .filter(|log| log.work_item == id && log.state != LogState::Approved)
        .count();
    if unapproved > 0 {
        return Err(Error::PrerequisiteNotMet {
            kind: Prerequisite::UnapprovedTimeLogs,
            count: unapproved,
        });
    }

    let mut unfinished = 0;
    for child in &tree.get(id)?.children {
        if !tree.get(*child)?.is_done() {
            unfinished += 1;
        }
    }
    if unfinished > 0 {
        return Err(Error::PrerequisiteNotMet {
            kind: Prerequisite::UnfinishedChildren,
            count: unfinished,
        });
    }
    Ok(())
}

/// Send an item under approval back to `in_progress`.
pub fn reject(tree: &mut WorkTree, id: WorkItemId) -> Result<()> {
    let item = tree.get_mut(id)?;
    match item.workflow {
        Workflow::Standard(state) if state.can_reject() => {
            info!(item = %item.code, from = state.as_str(), "rejected");
            item.workflow = Workflow::Standard(TaskState::InProgress);
            Ok(())
        }
        other => Err(Error::InvalidTransition {
            from: other.label().to_string(),
            action: "reject",
        }),
    }
}

/// Cancel a standard item that has not reached a final state.
pub fn cancel(tree: &mut WorkTree, id: WorkItemId) -> Result<()> {
    let item = tree.get_mut(id)?;
    match item.workflow {
        Workflow::Standard(state) if !state.is_final() => {
            info!(item = %item.code, from = state.as_str(), "cancelled");
            item.workflow = Workflow::Standard(TaskState::Cancelled);
            Ok(())
        }
        other => Err(Error::InvalidTransition {
            from: other.label().to_string(),
            action: "cancel",
        }),
    }
}

/// Put an item back to `new`.
pub fn set_to_draft(tree: &mut WorkTree, id: WorkItemId) -> Result<()> {
    let item = tree.get_mut(id)?;
    item.workflow = match item.workflow {
        Workflow::Standard(_) => Workflow::standard(),
        Workflow::Ticket(_) => Workflow::ticket(),
    };
    Ok(())
}

/// Park a ticket-like item that is in progress.
pub fn hold(tree: &mut WorkTree, id: WorkItemId) -> Result<()> {
    let item = tree.get_mut(id)?;
    match item.workflow {
        Workflow::Ticket(TicketState::InProgress) => {
            item.workflow = Workflow::Ticket(TicketState::Hold);
            Ok(())
        }
        other => Err(Error::InvalidTransition {
            from: other.label().to_string(),
            action: "hold",
        }),
    }
}

/// Start a timer for `member` on `id`. A `new` item moves to `in_progress`.
pub fn start_timer(
    tree: &mut WorkTree,
    id: WorkItemId,
    logs: &mut Vec<TimeLogEntry>,
    member: MemberId,
    now: NaiveDateTime,
) -> Result<TimeLogId> {
    let running = logs
        .iter()
        .any(|log| log.work_item == id && log.member == Some(member) && log.is_open());
    if running {
        return Err(Error::AlreadyRunning);
    }

    let item = tree.get_mut(id)?;
    if item.workflow.is_new() {
        item.workflow = match item.workflow {
            Workflow::Standard(_) => Workflow::Standard(TaskState::InProgress),
            Workflow::Ticket(_) => Workflow::Ticket(TicketState::InProgress),
        };
    }
    let log = TimeLogEntry::open(id, Some(member), now);
    let log_id = log.id;
    info!(item = %item.code, log = %log_id, "timer started");
    logs.push(log);
    Ok(log_id)
}

/// Stop `member`'s running or paused timer on `id`; the closed log is
/// approved. A span reaching past midnight is refused and the timer stays open.
pub fn stop_timer(
    logs: &mut [TimeLogEntry],
    id: WorkItemId,
    member: MemberId,
    now: NaiveDateTime,
) -> Result<TimeLogId> {
    let log = open_log(logs, id, member, "stop timer")?;
    log.close(now)?;
    info!(log = %log.id, "timer stopped");
    Ok(log.id)
}

/// Pause `member`'s running timer on `id`.
pub fn pause_timer(
    logs: &mut [TimeLogEntry],
    id: WorkItemId,
    member: MemberId,
    now: NaiveDateTime,
) -> Result<TimeLogId> {
    let log = open_log(logs, id, member, "pause timer")?;
    log.pause(now)?;
    info!(log = %log.id, "timer paused");
    Ok(log.id)
}

/// Resume `member`'s paused timer on `id`.
pub fn resume_timer(
    logs: &mut [TimeLogEntry],
    id: WorkItemId,
    member: MemberId,
    now: NaiveDateTime,
) -> Result<TimeLogId> {
    let log = open_log(logs, id, member, "resume timer")?;
    log.resume(now)?;
    info!(log = %log.id, "timer resumed");
    Ok(log.id)
}

fn open_log<'a>(
    logs: &'a mut [TimeLogEntry],
    id: WorkItemId,
    member: MemberId,
    action: &'static str,
) -> Result<&'a mut TimeLogEntry> {
    logs.iter_mut()
        .rev()
        .find(|log| log.work_item == id && log.member == Some(member) && log.is_open())
        .ok_or(Error::InvalidTransition {
            from: "stopped".to_string(),
            action,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pmo_core::{Config, TimerState, WorkSchedule};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    fn state(tree: &WorkTree, id: WorkItemId) -> Workflow {
        tree.get(id).unwrap().workflow
    }

    #[test]
    fn test_confirm_walks_chain_and_sets_progress() {
        let mut tree = WorkTree::default();
        let leaf = tree.add_root("leaf");
        for expected in [TaskState::InProgress, TaskState::Approval1, TaskState::Approval2, TaskState::Done] {
            assert_eq!(confirm(&mut tree, leaf, &[]).unwrap(), Workflow::Standard(expected));
        }
        assert_eq!(tree.get(leaf).unwrap().manual_progress, 100.0);
        assert!(matches!(
            confirm(&mut tree, leaf, &[]),
            Err(Error::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_confirm_blocked_by_unapproved_logs() {
        let mut tree = WorkTree::default();
        let item = tree.add_root("item");
        confirm(&mut tree, item, &[]).unwrap();
        let logs = vec![
            TimeLogEntry::open(item, None, at(9, 0)),
            TimeLogEntry::open(item, None, at(10, 0)),
            TimeLogEntry::closed(item, at(8, 0), at(9, 0)),
        ];

        let err = confirm(&mut tree, item, &logs).unwrap_err();
        assert_eq!(
            err,
            Error::PrerequisiteNotMet {
                kind: Prerequisite::UnapprovedTimeLogs,
                count: 2
            }
        );
        assert_eq!(state(&tree, item), Workflow::Standard(TaskState::InProgress));
    }

    #[test]
    fn test_confirm_blocked_by_children() {
        let mut tree = WorkTree::default();
        let parent = tree.add_root("parent");
        let a = tree.add_child(parent, "a").unwrap();
        tree.add_child(parent, "b").unwrap();
        confirm(&mut tree, parent, &[]).unwrap();

        for _ in 0..4 {
            confirm(&mut tree, a, &[]).unwrap();
        }
        let err = confirm(&mut tree, parent, &[]).unwrap_err();
        assert_eq!(
            err,
            Error::PrerequisiteNotMet {
                kind: Prerequisite::UnfinishedChildren,
                count: 1
            }
        );
    }

    #[test]
    fn test_reject_only_from_approvals() {
        let mut tree = WorkTree::default();
        let item = tree.add_root("item");
        assert!(reject(&mut tree, item).is_err());
        confirm(&mut tree, item, &[]).unwrap();
        confirm(&mut tree, item, &[]).unwrap();
        reject(&mut tree, item).unwrap();
        assert_eq!(state(&tree, item), Workflow::Standard(TaskState::InProgress));
    }

    #[test]
    fn test_cancel_and_draft() {
        let mut tree = WorkTree::default();
        let item = tree.add_root("item");
        cancel(&mut tree, item).unwrap();
        assert!(cancel(&mut tree, item).is_err());
        set_to_draft(&mut tree, item).unwrap();
        assert_eq!(state(&tree, item), Workflow::standard());
    }

    #[test]
    fn test_ticket_chain_with_hold() {
        let mut tree = WorkTree::default();
        let ticket = tree.add_root_with("ticket", Workflow::ticket());
        assert!(hold(&mut tree, ticket).is_err());
        confirm(&mut tree, ticket, &[]).unwrap();
        hold(&mut tree, ticket).unwrap();
        assert_eq!(
            confirm(&mut tree, ticket, &[]).unwrap(),
            Workflow::Ticket(TicketState::InProgress)
        );
        assert_eq!(confirm(&mut tree, ticket, &[]).unwrap(), Workflow::Ticket(TicketState::Done));
        assert!(tree.get(ticket).unwrap().is_done());
    }

    #[test]
    fn test_timer_lifecycle() {
        let mut tree = WorkTree::default();
        let item = tree.add_root("item");
        let member = MemberId::new();
        let mut logs = Vec::new();

        let log_id = start_timer(&mut tree, item, &mut logs, member, at(9, 0)).unwrap();
        assert_eq!(state(&tree, item), Workflow::Standard(TaskState::InProgress));
        assert_eq!(
            start_timer(&mut tree, item, &mut logs, member, at(9, 30)),
            Err(Error::AlreadyRunning)
        );

        assert_eq!(stop_timer(&mut logs, item, member, at(11, 0)).unwrap(), log_id);
        assert!(logs[0].counts_as_effort());
        assert!(stop_timer(&mut logs, item, member, at(12, 0)).is_err());

        // Everything approved, no children: the item may leave in_progress.
        assert_eq!(
            confirm(&mut tree, item, &logs).unwrap(),
            Workflow::Standard(TaskState::Approval1)
        );
    }

    #[test]
    fn test_overnight_timer_stays_open_and_rollup_still_runs() {
        let mut tree = WorkTree::default();
        let item = tree.add_root("item");
        let member = MemberId::new();
        let mut logs = Vec::new();

        start_timer(&mut tree, item, &mut logs, member, at(22, 0)).unwrap();
        let next_day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap().and_hms_opt(1, 0, 0).unwrap();
        assert!(matches!(
            stop_timer(&mut logs, item, member, next_day),
            Err(Error::InvalidInterval { .. })
        ));
        assert!(logs[0].is_open());
        assert!(!logs[0].counts_as_effort());

        let engine = crate::RollupEngine::new(Config::default());
        assert!(engine.run(&tree, &logs, &WorkSchedule::office_hours(), 10.0).is_ok());

        // The same timer can still be stopped on its own day.
        stop_timer(&mut logs, item, member, at(23, 45)).unwrap();
        assert!(logs[0].counts_as_effort());
    }

    #[test]
    fn test_pause_and_resume_timer() {
        let mut tree = WorkTree::default();
        let item = tree.add_root("item");
        let member = MemberId::new();
        let mut logs = Vec::new();

        let log_id = start_timer(&mut tree, item, &mut logs, member, at(9, 0)).unwrap();
        assert!(resume_timer(&mut logs, item, member, at(9, 10)).is_err());
        assert_eq!(pause_timer(&mut logs, item, member, at(10, 0)).unwrap(), log_id);
        assert_eq!(logs[0].timer(), TimerState::Paused);

        // A paused timer still blocks a second one.
        assert_eq!(
            start_timer(&mut tree, item, &mut logs, member, at(10, 10)),
            Err(Error::AlreadyRunning)
        );

        resume_timer(&mut logs, item, member, at(10, 30)).unwrap();
        assert_eq!(logs[0].running_duration(at(11, 0)), chrono::Duration::minutes(90));

        stop_timer(&mut logs, item, member, at(11, 0)).unwrap();
        assert_eq!(logs[0].timer(), TimerState::Stopped);
        assert!(pause_timer(&mut logs, item, member, at(11, 5)).is_err());
    }
}
