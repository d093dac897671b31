//! Time log entries and the correction requests that supersede them.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};
use crate::id::{CorrectionId, MemberId, TimeLogId, WorkItemId};
use crate::interval::validate_interval;

/// Approval state of a time log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogState {
    /// Recorded, not yet submitted
    Draft,
    /// Waiting for approval
    Pending,
    /// Counts toward consumed effort once closed
    Approved,
    /// Refused by an approver
    Rejected,
}

/// Where a log's timer stands, derived from its instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerState {
    /// Open and counting
    Running,
    /// Open, counting suspended
    Paused,
    /// Closed
    Stopped,
}

/// One finished pause of a running timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseSpan {
    /// Pause began
    pub from: NaiveDateTime,
    /// Timer resumed (or stopped)
    pub to: NaiveDateTime,
}

impl PauseSpan {
    fn length(&self) -> Duration {
        (self.to - self.from).max(Duration::zero())
    }
}

/// A span of work recorded against one work item.
///
/// Instants are local civil time. The duration is never stored; it is
/// recomputed from `start`/`end` by the calendar calculator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeLogEntry {
    /// Unique identifier
    pub id: TimeLogId,

    /// Work item the time belongs to
    pub work_item: WorkItemId,

    /// Who logged it
    pub member: Option<MemberId>,

    /// What was done
    pub description: String,

    /// When work started
    pub start: NaiveDateTime,

    /// When work ended, `None` while the timer runs
    pub end: Option<NaiveDateTime>,

    /// Approval state
    pub state: LogState,

    /// Start of the pause in progress
    #[serde(default)]
    pub paused_at: Option<NaiveDateTime>,

    /// Finished pauses, oldest first
    #[serde(default)]
    pub pauses: Vec<PauseSpan>,
}

impl TimeLogEntry {
    /// Open a running log in `draft`.
    pub fn open(work_item: WorkItemId, member: Option<MemberId>, start: NaiveDateTime) -> Self {
        Self {
            id: TimeLogId::new(),
            work_item,
            member,
            description: String::new(),
            start,
            end: None,
            state: LogState::Draft,
            paused_at: None,
            pauses: Vec::new(),
        }
    }

    /// A closed, approved log, as produced by a backfill.
    pub fn closed(work_item: WorkItemId, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            end: Some(end),
            state: LogState::Approved,
            ..Self::open(work_item, None, start)
        }
    }

    /// True while the timer runs or is paused.
    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Timer state.
    pub fn timer(&self) -> TimerState {
        match (self.end, self.paused_at) {
            (Some(_), _) => TimerState::Stopped,
            (None, Some(_)) => TimerState::Paused,
            (None, None) => TimerState::Running,
        }
    }

    /// True when the log counts toward consumed effort.
    pub fn counts_as_effort(&self) -> bool {
        self.end.is_some() && self.state == LogState::Approved
    }

    /// Suspend a running timer.
    pub fn pause(&mut self, now: NaiveDateTime) -> Result<()> {
        if self.timer() != TimerState::Running {
            return Err(self.timer_error("pause"));
        }
        if now < self.start {
            return Err(Error::invalid_interval("pause before the log started"));
        }
        self.paused_at = Some(now);
        Ok(())
    }

    /// Resume a paused timer.
    pub fn resume(&mut self, now: NaiveDateTime) -> Result<()> {
        let Some(from) = self.paused_at.filter(|_| self.end.is_none()) else {
            return Err(self.timer_error("resume"));
        };
        if now < from {
            return Err(Error::invalid_interval("resume before the pause began"));
        }
        self.pauses.push(PauseSpan { from, to: now });
        self.paused_at = None;
        Ok(())
    }

    /// Stop the timer. Closing approves the log and ends any pause.
    ///
    /// The span must fall within one civil day, as the calculator requires.
    pub fn close(&mut self, end: NaiveDateTime) -> Result<()> {
        if !self.is_open() {
            return Err(self.timer_error("close"));
        }
        validate_interval(self.start, end)?;
        if let Some(from) = self.paused_at.take() {
            self.pauses.push(PauseSpan { from, to: end.max(from) });
        }
        self.end = Some(end);
        self.state = LogState::Approved;
        Ok(())
    }

    fn timer_error(&self, action: &'static str) -> Error {
        let from = match self.timer() {
            TimerState::Running => "running",
            TimerState::Paused => "paused",
            TimerState::Stopped => "stopped",
        };
        Error::InvalidTransition {
            from: from.to_string(),
            action,
        }
    }

    /// Send a draft for approval.
    pub fn submit(&mut self) -> Result<()> {
        self.transition(LogState::Draft, LogState::Pending, "submit")
    }

    /// Approve a pending log.
    pub fn approve(&mut self) -> Result<()> {
        self.transition(LogState::Pending, LogState::Approved, "approve")
    }

    /// Reject a pending log.
    pub fn reject(&mut self) -> Result<()> {
        self.transition(LogState::Pending, LogState::Rejected, "reject")
    }

    fn transition(&mut self, from: LogState, to: LogState, action: &'static str) -> Result<()> {
        if self.state != from {
            return Err(Error::InvalidTransition {
                from: format!("{:?}", self.state).to_lowercase(),
                action,
            });
        }
        self.state = to;
        Ok(())
    }

    /// Total paused time up to `now`, counting a pause still in progress.
    pub fn paused_duration(&self, now: NaiveDateTime) -> Duration {
        let finished = self
            .pauses
            .iter()
            .fold(Duration::zero(), |total, pause| total + pause.length());
        let ongoing = self
            .paused_at
            .map(|from| (now - from).max(Duration::zero()))
            .unwrap_or_else(Duration::zero);
        finished + ongoing
    }

    /// Elapsed working time of an open log, pauses excluded; zero once closed.
    pub fn running_duration(&self, now: NaiveDateTime) -> Duration {
        match self.end {
            Some(_) => Duration::zero(),
            None => ((now - self.start) - self.paused_duration(now)).max(Duration::zero()),
        }
    }
}

/// Whether a correction edits an existing log or backfills a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionKind {
    /// Backfill a log that was never recorded
    New,
    /// Replace the interval of an existing log
    Correction,
}

/// Approval state of a correction request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionState {
    /// Waiting for a decision
    Pending,
    /// Applied to the logs
    Approved,
    /// Refused
    Rejected,
}

/// A request to backfill or correct a time log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRequest {
    /// Unique identifier
    pub id: CorrectionId,

    /// Work item the time belongs to
    pub work_item: WorkItemId,

    /// Log being corrected
    pub target: Option<TimeLogId>,

    /// Requesting member
    pub member: Option<MemberId>,

    /// Request kind
    pub kind: CorrectionKind,

    /// Replacement description
    pub description: String,

    /// Requested start
    pub start: Option<NaiveDateTime>,

    /// Requested end
    pub end: Option<NaiveDateTime>,

    /// Approval state
    pub state: CorrectionState,
}

impl CorrectionRequest {
    /// Request a correction of an existing log.
    pub fn correct(log: &TimeLogEntry, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            id: CorrectionId::new(),
            work_item: log.work_item,
            target: Some(log.id),
            member: log.member,
            kind: CorrectionKind::Correction,
            description: log.description.clone(),
            start: Some(start),
            end: Some(end),
            state: CorrectionState::Pending,
        }
    }

    /// Request a backfilled log.
    pub fn backfill(
        work_item: WorkItemId,
        member: Option<MemberId>,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Self {
        Self {
            id: CorrectionId::new(),
            work_item,
            target: None,
            member,
            kind: CorrectionKind::New,
            description: String::new(),
            start: Some(start),
            end: Some(end),
            state: CorrectionState::Pending,
        }
    }

    /// Approve the request, superseding the target log's interval or
    /// appending a new approved log. Returns the affected log.
    pub fn approve(&mut self, logs: &mut Vec<TimeLogEntry>) -> Result<TimeLogId> {
        if self.state != CorrectionState::Pending {
            return Err(Error::InvalidTransition {
                from: format!("{:?}", self.state).to_lowercase(),
                action: "approve",
            });
        }
        let (Some(start), Some(end)) = (self.start, self.end) else {
            return Err(Error::invalid_interval("start and end are required"));
        };
        validate_interval(start, end)?;

        let target = self
            .target
            .and_then(|target| logs.iter_mut().find(|log| log.id == target));
        let id = match target {
            Some(log) => {
                log.start = start;
                log.end = Some(end);
                log.description = self.description.clone();
                log.state = LogState::Approved;
                log.paused_at = None;
                log.pauses.clear();
                log.id
            }
            None => {
                let mut log = TimeLogEntry::closed(self.work_item, start, end);
                log.member = self.member;
                log.description = self.description.clone();
                let id = log.id;
                logs.push(log);
                id
            }
        };
        self.state = CorrectionState::Approved;
        Ok(id)
    }

    /// Reject a pending request.
    pub fn reject(&mut self) -> Result<()> {
        if self.state != CorrectionState::Pending {
            return Err(Error::InvalidTransition {
                from: format!("{:?}", self.state).to_lowercase(),
                action: "reject",
            });
        }
        self.state = CorrectionState::Rejected;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_close_approves() {
        let mut log = TimeLogEntry::open(WorkItemId::new(), None, at(9, 0));
        assert!(log.is_open());
        assert!(!log.counts_as_effort());

        log.close(at(11, 0)).unwrap();
        assert_eq!(log.state, LogState::Approved);
        assert!(log.counts_as_effort());
        assert!(log.close(at(12, 0)).is_err());
    }

    #[test]
    fn test_close_rejects_backwards_end() {
        let mut log = TimeLogEntry::open(WorkItemId::new(), None, at(9, 0));
        assert!(matches!(log.close(at(8, 0)), Err(Error::InvalidInterval { .. })));
        assert!(log.is_open());
    }

    #[test]
    fn test_close_rejects_cross_midnight() {
        let mut log = TimeLogEntry::open(WorkItemId::new(), None, at(22, 0));
        let next_day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap().and_hms_opt(1, 0, 0).unwrap();
        assert!(matches!(log.close(next_day), Err(Error::InvalidInterval { .. })));
        assert!(log.is_open());
        assert!(!log.counts_as_effort());

        log.close(at(23, 30)).unwrap();
        assert!(log.counts_as_effort());
    }

    #[test]
    fn test_pause_and_resume() {
        let mut log = TimeLogEntry::open(WorkItemId::new(), None, at(9, 0));
        assert_eq!(log.timer(), TimerState::Running);
        assert!(log.resume(at(9, 5)).is_err());

        log.pause(at(10, 0)).unwrap();
        assert_eq!(log.timer(), TimerState::Paused);
        assert!(log.pause(at(10, 5)).is_err());
        assert_eq!(log.running_duration(at(10, 20)), chrono::Duration::minutes(60));

        log.resume(at(10, 30)).unwrap();
        assert_eq!(log.timer(), TimerState::Running);
        assert_eq!(log.pauses.len(), 1);
        assert_eq!(log.running_duration(at(11, 0)), chrono::Duration::minutes(90));
    }

    #[test]
    fn test_close_while_paused_ends_pause() {
        let mut log = TimeLogEntry::open(WorkItemId::new(), None, at(9, 0));
        log.pause(at(10, 0)).unwrap();
        log.close(at(10, 45)).unwrap();

        assert_eq!(log.timer(), TimerState::Stopped);
        assert_eq!(log.paused_at, None);
        assert_eq!(log.paused_duration(at(12, 0)), chrono::Duration::minutes(45));
        assert!(log.pause(at(11, 0)).is_err());
    }

    #[test]
    fn test_logs_without_pause_fields_still_load() {
        let log = TimeLogEntry::closed(WorkItemId::new(), at(9, 0), at(10, 0));
        let mut json = serde_json::to_value(&log).unwrap();
        let fields = json.as_object_mut().unwrap();
        fields.remove("paused_at");
        fields.remove("pauses");
        let loaded: TimeLogEntry = serde_json::from_value(json).unwrap();
        assert_eq!(loaded, log);
    }

    #[test]
    fn test_submit_approve_chain() {
        let mut log = TimeLogEntry::open(WorkItemId::new(), None, at(9, 0));
        assert!(log.approve().is_err());
        log.submit().unwrap();
        log.approve().unwrap();
        assert_eq!(log.state, LogState::Approved);
    }

    #[test]
    fn test_running_duration() {
        let log = TimeLogEntry::open(WorkItemId::new(), None, at(9, 0));
        assert_eq!(log.running_duration(at(10, 30)), chrono::Duration::minutes(90));
        let closed = TimeLogEntry::closed(WorkItemId::new(), at(9, 0), at(10, 0));
        assert_eq!(closed.running_duration(at(10, 30)), chrono::Duration::zero());
    }

    #[test]
    fn test_correction_supersedes_target() {
        let item = WorkItemId::new();
        let mut logs = vec![TimeLogEntry::closed(item, at(9, 0), at(10, 0))];
        let mut request = CorrectionRequest::correct(&logs[0], at(8, 0), at(10, 0));

        let id = request.approve(&mut logs).unwrap();
        assert_eq!(id, logs[0].id);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].start, at(8, 0));
        assert_eq!(request.state, CorrectionState::Approved);
        assert!(request.approve(&mut logs).is_err());
    }

    #[test]
    fn test_backfill_appends_log() {
        let item = WorkItemId::new();
        let mut logs = Vec::new();
        let mut request = CorrectionRequest::backfill(item, None, at(13, 0), at(15, 0));
        request.approve(&mut logs).unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].counts_as_effort());
    }

    #[test]
    fn test_correction_requires_both_instants() {
        let mut request = CorrectionRequest::backfill(WorkItemId::new(), None, at(13, 0), at(15, 0));
        request.end = None;
        let mut logs = Vec::new();
        assert!(matches!(request.approve(&mut logs), Err(Error::InvalidInterval { .. })));
        assert_eq!(request.state, CorrectionState::Pending);
    }

    #[test]
    fn test_correction_rejects_cross_midnight() {
        let item = WorkItemId::new();
        let mut logs = vec![TimeLogEntry::closed(item, at(20, 0), at(21, 0))];
        let next_day = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap().and_hms_opt(0, 30, 0).unwrap();
        let mut request = CorrectionRequest::correct(&logs[0], at(20, 0), next_day);

        assert!(matches!(request.approve(&mut logs), Err(Error::InvalidInterval { .. })));
        assert_eq!(request.state, CorrectionState::Pending);
        assert_eq!(logs[0].end, Some(at(21, 0)));
    }
}
