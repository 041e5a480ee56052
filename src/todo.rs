// chaintrack/src/todo.rs

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Result, StoreError};
use crate::event::Subscription;
use crate::store::{DataFile, default_data_dir};

/// One node of the to-do forest. Absent keys in older data files read as
/// their defaults; empty children and missing due dates are omitted when
/// written back.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub name: String,
    #[serde(default)]
    pub completed: bool,
    /// Opaque display text ("6/30/24"-ish); calendar interpretation belongs
    /// to the caller.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<TodoItem>,
}

impl TodoItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// What to do with a deleted node's children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Children take the removed node's position among its former siblings,
    /// keeping their relative order.
    #[default]
    PromoteChildren,
    /// Remove the whole subtree.
    Subtree,
}

/// To-do store: an ordered forest persisted as one JSON array. Stored order
/// is display order; the only bulk write is whole-tree replacement.
pub struct TodoStore {
    file: DataFile<Vec<TodoItem>>,
}

impl TodoStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            file: DataFile::load(path, Vec::new())?,
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(default_data_dir()?.join("todo.json"))
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// The current forest (a copy).
    pub fn tree(&self) -> Vec<TodoItem> {
        self.file.data().clone()
    }

    /// Replace the whole forest, persist, and notify. Callers hand back a
    /// rebuilt tree after any edit, reorders included.
    pub fn set_tree(&mut self, tree: Vec<TodoItem>) -> Result<()> {
        *self.file.data_mut() = tree;
        self.file.save()
    }

    /// Lazy pre-order traversal of every node, any depth. Read-only; the
    /// stored tree is never touched.
    pub fn flatten(&self) -> Flatten<'_> {
        Flatten {
            stack: vec![self.file.data().iter()],
        }
    }

    /// Remove the node at `path` (sibling indices from the root down) and
    /// persist. Children of the removed node follow `policy`.
    pub fn remove_at(&mut self, path: &[usize], policy: DeletePolicy) -> Result<TodoItem> {
        let Some((&last, parents)) = path.split_last() else {
            return Err(StoreError::Validation("empty to-do item path".into()));
        };
        let mut siblings = self.file.data_mut();
        for &slot in parents {
            siblings = &mut siblings
                .get_mut(slot)
                .ok_or_else(|| StoreError::NotFound(format!("no to-do item at {path:?}")))?
                .items;
        }
        if last >= siblings.len() {
            return Err(StoreError::NotFound(format!("no to-do item at {path:?}")));
        }
        let mut removed = siblings.remove(last);
        if policy == DeletePolicy::PromoteChildren {
            let children = std::mem::take(&mut removed.items);
            siblings.splice(last..last, children);
        }
        info!("removed to-do item '{}' at {path:?} ({policy:?})", removed.name);
        self.file.save()?;
        Ok(removed)
    }

    pub fn backup(&mut self) -> Result<PathBuf> {
        self.file.snapshot()
    }

    pub fn subscribe(&mut self, handler: impl FnMut() + 'static) -> Subscription {
        self.file.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, token: Subscription) {
        self.file.unsubscribe(token);
    }
}

/// Pre-order iterator over a to-do forest: each node, then its subtree,
/// depth-first.
pub struct Flatten<'a> {
    stack: Vec<std::slice::Iter<'a, TodoItem>>,
}

impl<'a> Iterator for Flatten<'a> {
    type Item = &'a TodoItem;

    fn next(&mut self) -> Option<&'a TodoItem> {
        while let Some(top) = self.stack.last_mut() {
            if let Some(item) = top.next() {
                self.stack.push(item.items.iter());
                return Some(item);
            }
            self.stack.pop();
        }
        None
    }
}
