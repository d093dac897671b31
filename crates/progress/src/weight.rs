//! Weight propagation.
//!
//! Every item carries two linked percentages:
//! - `entry_weight`, its share of the whole pool (root-denominated)
//! - `relative_weight`, its share of the parent's entry weight
//!
//! Writes validate the sibling sum first, then rebase descendants so each
//! keeps its relative share against the new ancestor value. All new values
//! are planned before anything is written, so a failed call changes nothing.

use std::collections::HashMap;
use pmo_core::{Config, Error, Result, WorkItemId, WorkTree};
use tracing::{debug, warn};

/// A planned write: (item, entry weight, relative weight).
type Write = (WorkItemId, f64, f64);

/// Applies weight edits and cascades them through a work tree.
#[derive(Debug, Clone, Default)]
pub struct WeightEngine {
    config: Config,
}

impl WeightEngine {
    /// Create an engine.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Set `id`'s entry weight, then rebase its descendants.
    ///
    /// Fails with [`Error::WeightOverflow`] when the entry weights of `id`
    /// and its siblings (or the other root items) would exceed 100.
    pub fn set_entry_weight(&self, tree: &mut WorkTree, id: WorkItemId, value: f64) -> Result<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::InvalidWeight { value });
        }

        let item = tree.get(id)?;
        let others = tree
            .siblings(id)?
            .into_iter()
            .map(|sibling| tree.get(sibling).map(|s| s.entry_weight))
            .sum::<Result<f64>>()?;
        let total = others + value;
        if !self.config.within_full_share(total) {
            warn!(item = %item.code, value, total, "rejecting entry weight, siblings would exceed 100%");
            return Err(Error::WeightOverflow { total });
        }

        let relative = match item.parent {
            Some(parent) => relative_of(value, tree.get(parent)?.entry_weight),
            None => value,
        };

        let mut entries = HashMap::from([(id, value)]);
        let mut plan = vec![(id, value, relative)];
        plan_rebase(tree, id, &mut entries, &mut plan)?;
        debug!(item = %item.code, value, relative, cascaded = plan.len() - 1, "entry weight set");
        apply(tree, plan)
    }

    /// Split `id`'s entry weight evenly across its children and rebase the
    /// grandchildren. No-op for a leaf.
    pub fn redistribute_evenly(&self, tree: &mut WorkTree, id: WorkItemId) -> Result<()> {
        let item = tree.get(id)?;
        if item.children.is_empty() {
            debug!(item = %item.code, "no children to redistribute");
            return Ok(());
        }

        let relative = 100.0 / item.children.len() as f64;
        let entry = item.entry_weight * relative / 100.0;
        let children = item.children.clone();

        let mut entries = HashMap::new();
        let mut plan = Vec::new();
        for child in &children {
            entries.insert(*child, entry);
            plan.push((*child, entry, relative));
        }
        for child in &children {
            plan_rebase(tree, *child, &mut entries, &mut plan)?;
        }
        debug!(item = %item.code, children = children.len(), relative, "weights redistributed evenly");
        apply(tree, plan)
    }

    /// Re-derive every descendant's entry weight from its relative weight.
    /// `id` itself is left alone; running it twice changes nothing.
    pub fn resync(&self, tree: &mut WorkTree, id: WorkItemId) -> Result<()> {
        let mut entries = HashMap::new();
        let mut plan = Vec::new();
        plan_rebase(tree, id, &mut entries, &mut plan)?;
        debug!(item = %tree.get(id)?.code, cascaded = plan.len(), "resynced");
        apply(tree, plan)
    }

    /// Resync every root item, restoring `relative_weight == entry_weight` on
    /// the roots themselves.
    pub fn resync_all(&self, tree: &mut WorkTree) -> Result<()> {
        let mut entries = HashMap::new();
        let mut plan = Vec::new();
        for root in tree.roots().to_vec() {
            let entry = tree.get(root)?.entry_weight;
            plan.push((root, entry, entry));
            plan_rebase(tree, root, &mut entries, &mut plan)?;
        }
        apply(tree, plan)
    }
}

/// Relative share of `entry` against the parent's entry weight; zero when
/// either side is zero.
fn relative_of(entry: f64, parent_entry: f64) -> f64 {
    if entry > 0.0 && parent_entry > 0.0 {
        entry / parent_entry * 100.0
    } else {
        0.0
    }
}

/// Plan new entry weights for every descendant of `from`. `entries` holds
/// values already planned for ancestors; unplanned parents are read from
/// the tree.
fn plan_rebase(
    tree: &WorkTree,
    from: WorkItemId,
    entries: &mut HashMap<WorkItemId, f64>,
    plan: &mut Vec<Write>,
) -> Result<()> {
    for id in tree.descendants(from)? {
        let item = tree.get(id)?;
        let parent = item.parent.ok_or(Error::NotFound(id))?;
        let parent_entry = match entries.get(&parent) {
            Some(planned) => *planned,
            None => tree.get(parent)?.entry_weight,
        };
        let entry = parent_entry * item.relative_weight / 100.0;
        entries.insert(id, entry);
        plan.push((id, entry, item.relative_weight));
    }
    Ok(())
}

fn apply(tree: &mut WorkTree, plan: Vec<Write>) -> Result<()> {
    for (id, entry, relative) in plan {
        let item = tree.get_mut(id)?;
        item.entry_weight = entry;
        item.relative_weight = relative;
    }
    Ok(())
}
