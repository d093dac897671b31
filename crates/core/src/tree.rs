//! Work tree - an arena of work items with resolved parent/child links.

use std::collections::{HashMap, VecDeque};
use serde::{Deserialize, Serialize};
use crate::error::{Error, Result};
use crate::id::WorkItemId;
use crate::work_item::{WorkItem, Workflow};

/// A materialized tree (forest) of work items belonging to one initiative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkTree {
    items: HashMap<WorkItemId, WorkItem>,
    roots: Vec<WorkItemId>,
    code_prefix: String,
}

impl Default for WorkTree {
    fn default() -> Self {
        Self::new("T-")
    }
}

impl WorkTree {
    /// Create an empty tree whose root items are coded `<prefix>NN`.
    pub fn new(code_prefix: impl Into<String>) -> Self {
        Self {
            items: HashMap::new(),
            roots: Vec::new(),
            code_prefix: code_prefix.into(),
        }
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the tree has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Root items in creation order.
    pub fn roots(&self) -> &[WorkItemId] {
        &self.roots
    }

    /// All items, unordered.
    pub fn iter(&self) -> impl Iterator<Item = &WorkItem> {
        self.items.values()
    }

    /// Look up an item.
    pub fn get(&self, id: WorkItemId) -> Result<&WorkItem> {
        self.items.get(&id).ok_or(Error::NotFound(id))
    }

    /// Look up an item mutably.
    pub fn get_mut(&mut self, id: WorkItemId) -> Result<&mut WorkItem> {
        self.items.get_mut(&id).ok_or(Error::NotFound(id))
    }

    /// Find an item by its sequence code.
    pub fn find_by_code(&self, code: &str) -> Option<&WorkItem> {
        self.items.values().find(|item| item.code == code)
    }

    /// Items sharing `id`'s parent (or the other root items), excluding `id`.
    pub fn siblings(&self, id: WorkItemId) -> Result<Vec<WorkItemId>> {
        let item = self.get(id)?;
        let pool = match item.parent {
            Some(parent) => self.get(parent)?.children.as_slice(),
            None => self.roots.as_slice(),
        };
        Ok(pool.iter().copied().filter(|other| *other != id).collect())
    }

    /// Descendants of `id` in breadth-first order, excluding `id` itself.
    ///
    /// Every parent appears before its children.
    pub fn descendants(&self, id: WorkItemId) -> Result<Vec<WorkItemId>> {
        let mut out = Vec::new();
        let mut queue: VecDeque<WorkItemId> = self.get(id)?.children.iter().copied().collect();
        while let Some(next) = queue.pop_front() {
            out.push(next);
            if let Some(item) = self.items.get(&next) {
                queue.extend(item.children.iter().copied());
            }
        }
        Ok(out)
    }

    /// `id` followed by all its descendants.
    pub fn subtree(&self, id: WorkItemId) -> Result<Vec<WorkItemId>> {
        let mut out = vec![id];
        out.extend(self.descendants(id)?);
        Ok(out)
    }

    /// Walk from `id` up to its root item, returning the root.
    pub fn root_of(&self, id: WorkItemId) -> Result<WorkItemId> {
        let mut current = self.get(id)?;
        while let Some(parent) = current.parent {
            current = self.get(parent)?;
        }
        Ok(current.id)
    }

    /// Add a root item with the standard workflow.
    pub fn add_root(&mut self, name: impl Into<String>) -> WorkItemId {
        self.insert_root(WorkItem::new(name, None, Workflow::standard()))
    }

    /// Add a root item with an explicit workflow.
    pub fn add_root_with(&mut self, name: impl Into<String>, workflow: Workflow) -> WorkItemId {
        self.insert_root(WorkItem::new(name, None, workflow))
    }

    fn insert_root(&mut self, mut item: WorkItem) -> WorkItemId {
        let (code, missing) = next_code(
            &self.code_prefix,
            self.roots.iter().filter_map(|id| self.items.get(id)).map(|i| i.code.as_str()),
        );
        item.code = code;
        item.missing_from = missing;
        let id = item.id;
        self.roots.push(id);
        self.items.insert(id, item);
        id
    }

    /// Add a child under `parent`, inheriting the parent's workflow kind.
    pub fn add_child(&mut self, parent: WorkItemId, name: impl Into<String>) -> Result<WorkItemId> {
        let workflow = match self.get(parent)?.workflow {
            Workflow::Standard(_) => Workflow::standard(),
            Workflow::Ticket(_) => Workflow::ticket(),
        };
        self.add_child_with(parent, name, workflow)
    }

    /// Add a child under `parent` with an explicit workflow.
    pub fn add_child_with(
        &mut self,
        parent: WorkItemId,
        name: impl Into<String>,
        workflow: Workflow,
    ) -> Result<WorkItemId> {
        let parent_item = self.get(parent)?;
        let prefix = format!("{}.", parent_item.code);
        let (code, missing) = next_code(
            &prefix,
            parent_item
                .children
                .iter()
                .filter_map(|id| self.items.get(id))
                .map(|i| i.code.as_str()),
        );

        let mut item = WorkItem::new(name, Some(parent), workflow);
        item.code = code;
        item.missing_from = missing;
        let id = item.id;
        self.items.insert(id, item);
        self.get_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Remove `id` and its whole subtree. Siblings keep their weights and codes.
    pub fn remove(&mut self, id: WorkItemId) -> Result<Vec<WorkItem>> {
        let doomed = self.subtree(id)?;
        let parent = self.get(id)?.parent;
        match parent {
            Some(parent) => self.get_mut(parent)?.children.retain(|child| *child != id),
            None => self.roots.retain(|root| *root != id),
        }
        Ok(doomed
            .into_iter()
            .filter_map(|item| self.items.remove(&item))
            .collect())
    }

    /// Renumber the children of `id` in creation order, recursively.
    pub fn reindex(&mut self, id: WorkItemId) -> Result<()> {
        let (code, children) = {
            let item = self.get(id)?;
            let mut children = item.children.clone();
            children.sort_by_key(|child| self.items.get(child).map(|c| c.created_at));
            (item.code.clone(), children)
        };
        for (idx, child) in children.into_iter().enumerate() {
            let item = self.get_mut(child)?;
            item.code = format!("{}.{:02}", code, idx + 1);
            item.missing_from = None;
            self.reindex(child)?;
        }
        Ok(())
    }
}

/// Next sequence code after the highest existing number under `prefix`,
/// plus the code of the lowest gap below it.
fn next_code<'a>(prefix: &str, existing: impl Iterator<Item = &'a str>) -> (String, Option<String>) {
    let numbers: Vec<u32> = existing
        .filter_map(|code| code.strip_prefix(prefix))
        .filter_map(|rest| rest.parse().ok())
        .collect();
    let Some(max) = numbers.iter().copied().max() else {
        return (format!("{}{:02}", prefix, 1), None);
    };
    let missing = (1..max).find(|n| !numbers.contains(n));
    (
        format!("{}{:02}", prefix, max + 1),
        missing.map(|n| format!("{}{:02}", prefix, n)),
    )
}
