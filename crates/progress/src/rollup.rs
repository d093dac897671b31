//! Budget, consumed effort, progress and quality rollup.
//!
//! Budget is a flat product of the total budget and an item's entry weight.
//! Progress averages the immediate children with equal weight, regardless of
//! their entry weights. Consumed effort walks the whole subtree.

use std::collections::{HashMap, HashSet};
use chrono::NaiveDate;
use pmo_calendar::log_hours;
use pmo_core::{
    Config, ItemRollup, Result, TimeLogEntry, LogState, WorkItem, WorkItemId, WorkSchedule, WorkTree,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Budgeted effort of `id`, in the unit of `total_budget`.
pub fn budgeted_effort(tree: &WorkTree, id: WorkItemId, total_budget: f64) -> Result<f64> {
    Ok(total_budget * tree.get(id)?.entry_weight / 100.0)
}

/// Rolled-up progress of `id` (0-100).
pub fn computed_progress(tree: &WorkTree, id: WorkItemId) -> Result<f64> {
    let item = tree.get(id)?;
    if item.is_leaf() {
        return Ok(leaf_progress(item));
    }
    let share = 1.0 / item.children.len() as f64;
    item.children
        .iter()
        .try_fold(0.0, |acc, child| Ok(acc + share * computed_progress(tree, *child)?))
}

/// Consumed effort of `id` and all its descendants, in person-days.
pub fn actual_effort(
    tree: &WorkTree,
    id: WorkItemId,
    logs: &[TimeLogEntry],
    schedule: &WorkSchedule,
    config: &Config,
) -> Result<f64> {
    let subtree = tree.subtree(id)?;
    let hours = logs
        .iter()
        .filter(|log| log.counts_as_effort() && subtree.contains(&log.work_item))
        .map(|log| log_hours(log, schedule))
        .sum::<Result<f64>>()?;
    Ok(hours / config.hours_per_day)
}

/// Budget-to-actual ratio of a completed leaf, as a percentage. Uncapped.
pub fn quality_score(item: &WorkItem, budgeted: f64, actual: f64) -> f64 {
    if item.is_leaf() && item.is_done() && budgeted > 0.0 && actual > 0.0 {
        budgeted / actual * 100.0
    } else {
        0.0
    }
}

fn leaf_progress(item: &WorkItem) -> f64 {
    if item.is_done() {
        100.0
    } else {
        item.manual_progress.clamp(0.0, 100.0)
    }
}

/// Sub-task and time-log completion counters for one item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionStats {
    /// Immediate children
    pub children: usize,
    /// Immediate children in `done`
    pub children_done: usize,
    /// `children_done` as a percentage
    pub children_done_pct: f64,
    /// Time logs on the item itself
    pub logs: usize,
    /// Approved time logs on the item itself
    pub logs_approved: usize,
    /// `logs_approved` as a percentage
    pub logs_approved_pct: f64,
}

/// Completion counters of `id`.
pub fn completion_stats(tree: &WorkTree, id: WorkItemId, logs: &[TimeLogEntry]) -> Result<CompletionStats> {
    let item = tree.get(id)?;
    let children_done = item
        .children
        .iter()
        .map(|child| tree.get(*child))
        .collect::<Result<Vec<_>>>()?
        .into_iter()
        .filter(|child| child.is_done())
        .count();
    let own: Vec<_> = logs.iter().filter(|log| log.work_item == id).collect();
    let logs_approved = own.iter().filter(|log| log.state == LogState::Approved).count();

    Ok(CompletionStats {
        children: item.children.len(),
        children_done,
        children_done_pct: percentage(children_done, item.children.len()),
        logs: own.len(),
        logs_approved,
        logs_approved_pct: percentage(logs_approved, own.len()),
    })
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// First and last day work was logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualDates {
    /// Earliest log start
    pub start: Option<NaiveDate>,
    /// Latest log end
    pub end: Option<NaiveDate>,
}

/// Actual start/end dates across the subtree of `id`.
pub fn actual_dates(tree: &WorkTree, id: WorkItemId, logs: &[TimeLogEntry]) -> Result<ActualDates> {
    let subtree = tree.subtree(id)?;
    let in_subtree = || logs.iter().filter(|log| subtree.contains(&log.work_item));
    Ok(ActualDates {
        start: in_subtree().map(|log| log.start.date()).min(),
        end: in_subtree().filter_map(|log| log.end).map(|end| end.date()).max(),
    })
}

/// Initiative-level figures, aggregated over the root items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InitiativeRollup {
    /// Equal-weight average of root item progress
    pub progress: f64,
    /// Sum of root item consumed effort
    pub actual_effort: f64,
    /// Total budget
    pub budget: f64,
    /// Logged date range
    pub dates: ActualDates,
}

/// Rollup results for a whole tree.
#[derive(Debug, Clone, Default)]
pub struct RollupReport {
    /// Per-item figures
    pub items: HashMap<WorkItemId, ItemRollup>,
    /// Aggregate figures
    pub initiative: InitiativeRollup,
}

impl RollupReport {
    /// Copy the computed figures onto the tree's items for the caller to save.
    pub fn apply(&self, tree: &mut WorkTree) -> Result<()> {
        for (id, rollup) in &self.items {
            tree.get_mut(*id)?.rollup = rollup.clone();
        }
        Ok(())
    }
}

/// Computes every item's figures in one bottom-up pass, measuring each
/// time log once and reusing subtree aggregates.
#[derive(Debug, Clone, Default)]
pub struct RollupEngine {
    config: Config,
}

impl RollupEngine {
    /// Create an engine.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Roll up the whole tree.
    pub fn run(
        &self,
        tree: &WorkTree,
        logs: &[TimeLogEntry],
        schedule: &WorkSchedule,
        total_budget: f64,
    ) -> Result<RollupReport> {
        let mut own_hours: HashMap<WorkItemId, f64> = HashMap::new();
        for log in logs.iter().filter(|log| log.counts_as_effort()) {
            *own_hours.entry(log.work_item).or_default() += log_hours(log, schedule)?;
        }

        let mut order = Vec::with_capacity(tree.len());
        for root in tree.roots() {
            order.extend(tree.subtree(*root)?);
        }

        // Children before parents.
        let mut hours: HashMap<WorkItemId, f64> = HashMap::new();
        let mut progress: HashMap<WorkItemId, f64> = HashMap::new();
        let mut items = HashMap::with_capacity(order.len());
        for id in order.iter().rev() {
            let item = tree.get(*id)?;
            let subtree_hours = own_hours.get(id).copied().unwrap_or_default()
                + item.children.iter().filter_map(|c| hours.get(c)).sum::<f64>();
            let item_progress = if item.is_leaf() {
                leaf_progress(item)
            } else {
                let share = 1.0 / item.children.len() as f64;
                item.children
                    .iter()
                    .map(|c| share * progress.get(c).copied().unwrap_or_default())
                    .sum()
            };

            let budgeted = total_budget * item.entry_weight / 100.0;
            let actual = subtree_hours / self.config.hours_per_day;
            items.insert(
                *id,
                ItemRollup {
                    budgeted_effort: budgeted,
                    actual_effort: actual,
                    progress: item_progress,
                    quality: quality_score(item, budgeted, actual),
                },
            );
            hours.insert(*id, subtree_hours);
            progress.insert(*id, item_progress);
        }

        let roots = tree.roots();
        let root_progress = if roots.is_empty() {
            0.0
        } else {
            roots.iter().filter_map(|r| progress.get(r)).sum::<f64>() / roots.len() as f64
        };
        let root_actual: f64 = roots
            .iter()
            .filter_map(|r| items.get(r))
            .map(|r| r.actual_effort)
            .sum();
        let known: HashSet<WorkItemId> = order.iter().copied().collect();
        let tracked = || logs.iter().filter(|log| known.contains(&log.work_item));
        let dates = ActualDates {
            start: tracked().map(|log| log.start.date()).min(),
            end: tracked().filter_map(|log| log.end).map(|end| end.date()).max(),
        };

        debug!(items = items.len(), logs = logs.len(), progress = root_progress, "rollup complete");
        Ok(RollupReport {
            items,
            initiative: InitiativeRollup {
                progress: root_progress,
                actual_effort: root_actual,
                budget: total_budget,
                dates,
            },
        })
    }
}
