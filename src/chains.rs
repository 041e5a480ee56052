// chaintrack/src/chains.rs

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::dates::{day_index, day_keys, days_in_month, month_keys};
use crate::error::{Result, StoreError};
use crate::event::Subscription;
use crate::store::{DataFile, default_data_dir};

/// year -> month -> one 0/1 slot per day of that month.
type CompletionGrid = BTreeMap<String, BTreeMap<String, Vec<u8>>>;
/// year -> month -> day -> comment text. Days are string keys here, unlike
/// the completion grid's array positions; both shapes are part of the file
/// format.
type CommentTree = BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChainDocument {
    chain_order: Vec<String>,
    chains: BTreeMap<String, CompletionGrid>,
    chain_comments: BTreeMap<String, CommentTree>,
}

/// Habit-completion store: one 0/1 value per (chain, calendar day), plus
/// optional per-day comments. Every mutating call rewrites the backing file
/// and fires the update event once.
pub struct ChainStore {
    file: DataFile<ChainDocument>,
}

impl ChainStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            file: DataFile::load(path, ChainDocument::default())?,
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(default_data_dir()?.join("chains.json"))
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Display order of chain names (a copy).
    pub fn order(&self) -> Vec<String> {
        self.file.data().chain_order.clone()
    }

    /// Reorder chains. The new order must contain exactly the current names;
    /// adding, removing or renaming goes through the dedicated operations.
    pub fn set_order(&mut self, new_order: Vec<String>) -> Result<()> {
        let doc = self.file.data_mut();
        let mut old_sorted = doc.chain_order.clone();
        old_sorted.sort();
        let mut new_sorted = new_order.clone();
        new_sorted.sort();
        if new_sorted != old_sorted {
            return Err(StoreError::Validation(
                "new chain order must contain the same names as the old order".into(),
            ));
        }
        info!("reordered chains from {:?} to {:?}", doc.chain_order, new_order);
        doc.chain_order = new_order;
        self.file.save()
    }

    pub fn create_chain(&mut self, name: &str) -> Result<()> {
        let doc = self.file.data_mut();
        if doc.chains.contains_key(name) {
            return Err(StoreError::NameConflict(name.into()));
        }
        doc.chains.insert(name.into(), CompletionGrid::new());
        doc.chain_order.push(name.into());
        info!("created chain '{name}'");
        self.file.save()
    }

    /// Completion value for one day. A date with no stored entry reads as 0;
    /// an unknown chain is an error.
    pub fn value(&self, name: &str, date: NaiveDate) -> Result<u8> {
        let grid = self.grid(name)?;
        let (year, month) = month_keys(date);
        Ok(grid
            .get(&year)
            .and_then(|y| y.get(&month))
            .and_then(|days| days.get(day_index(date)))
            .copied()
            .unwrap_or(0))
    }

    /// Write one day's completion value, lazily allocating the month array
    /// (sized to the month's real day count) and pruning it again if the
    /// write left the whole month at zero.
    pub fn set_value(&mut self, name: &str, date: NaiveDate, value: bool) -> Result<()> {
        let day_count = days_in_month(date.year(), date.month())? as usize;
        let (year, month) = month_keys(date);
        let grid = self.grid_mut(name)?;
        let days = grid
            .entry(year.clone())
            .or_default()
            .entry(month.clone())
            .or_insert_with(|| vec![0; day_count]);
        let slot = day_index(date);
        let old = days[slot];
        let new = value as u8;
        days[slot] = new;
        let day = date.day();
        info!("chain '{name}' at {year}/{month}/{day}: {old} -> {new}");
        prune_if_all_zero(grid, &year, &month);
        self.file.save()
    }

    /// Full-length 0/1 array for a month; all zeros (at the month's real
    /// length, leap years included) when never populated.
    pub fn month_values(&self, name: &str, year: i32, month: u32) -> Result<Vec<u8>> {
        let day_count = days_in_month(year, month)? as usize;
        let grid = self.grid(name)?;
        Ok(grid
            .get(&year.to_string())
            .and_then(|y| y.get(&month.to_string()))
            .cloned()
            .unwrap_or_else(|| vec![0; day_count]))
    }

    /// Comment for one day, or None if there is none.
    pub fn comment(&self, name: &str, date: NaiveDate) -> Option<String> {
        let (year, month, day) = day_keys(date);
        self.file
            .data()
            .chain_comments
            .get(name)?
            .get(&year)?
            .get(&month)?
            .get(&day)
            .cloned()
    }

    /// Attach a comment to one day. Empty or whitespace-only text behaves as
    /// a delete.
    pub fn set_comment(&mut self, name: &str, date: NaiveDate, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return self.delete_comment(name, date);
        }
        let old = self.comment(name, date);
        let (year, month, day) = day_keys(date);
        self.file
            .data_mut()
            .chain_comments
            .entry(name.into())
            .or_default()
            .entry(year.clone())
            .or_default()
            .entry(month.clone())
            .or_default()
            .insert(day.clone(), text.into());
        info!("chain '{name}' comment at {year}/{month}/{day}: {old:?} -> '{text}'");
        self.file.save()
    }

    /// Remove a day's comment, pruning now-empty month/year/chain branches.
    /// Removing a comment that was never set is a no-op.
    pub fn delete_comment(&mut self, name: &str, date: NaiveDate) -> Result<()> {
        let (year, month, day) = day_keys(date);
        let comments = &mut self.file.data_mut().chain_comments;
        let removed = comments
            .get_mut(name)
            .and_then(|tree| tree.get_mut(&year))
            .and_then(|months| months.get_mut(&month))
            .and_then(|days| days.remove(&day));
        let Some(old) = removed else {
            info!("no chain '{name}' comment at {year}/{month}/{day} to delete");
            return Ok(());
        };
        prune_comment_branches(comments, name, &year, &month);
        info!("deleted chain '{name}' comment '{old}' at {year}/{month}/{day}");
        self.file.save()
    }

    /// Move a chain and all of its history to a new name.
    pub fn rename_chain(&mut self, current: &str, new: &str) -> Result<()> {
        let doc = self.file.data_mut();
        if doc.chains.contains_key(new) {
            return Err(StoreError::NameConflict(new.into()));
        }
        let slot = doc
            .chain_order
            .iter()
            .position(|n| n == current)
            .ok_or_else(|| StoreError::NotFound(format!("no chain '{current}'")))?;
        doc.chain_order[slot] = new.into();
        if let Some(grid) = doc.chains.remove(current) {
            doc.chains.insert(new.into(), grid);
        }
        if let Some(comments) = doc.chain_comments.remove(current) {
            doc.chain_comments.insert(new.into(), comments);
        }
        info!("renamed chain '{current}' to '{new}'");
        self.file.save()
    }

    pub fn delete_chain(&mut self, name: &str) -> Result<()> {
        let doc = self.file.data_mut();
        let slot = doc
            .chain_order
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| StoreError::NotFound(format!("no chain '{name}'")))?;
        doc.chain_order.remove(slot);
        doc.chains.remove(name);
        doc.chain_comments.remove(name);
        info!("deleted chain '{name}'");
        self.file.save()
    }

    /// Timestamped backup copy of the document; the primary file keeps its
    /// path and contents.
    pub fn backup(&mut self) -> Result<PathBuf> {
        self.file.snapshot()
    }

    pub fn subscribe(&mut self, handler: impl FnMut() + 'static) -> Subscription {
        self.file.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, token: Subscription) {
        self.file.unsubscribe(token);
    }

    fn grid(&self, name: &str) -> Result<&CompletionGrid> {
        self.file
            .data()
            .chains
            .get(name)
            .ok_or_else(|| StoreError::NotFound(format!("no chain '{name}'")))
    }

    fn grid_mut(&mut self, name: &str) -> Result<&mut CompletionGrid> {
        self.file
            .data_mut()
            .chains
            .get_mut(name)
            .ok_or_else(|| StoreError::NotFound(format!("no chain '{name}'")))
    }
}

/// Drop a month whose slots are all zero, and the year once it has no months.
fn prune_if_all_zero(grid: &mut CompletionGrid, year: &str, month: &str) {
    let Some(months) = grid.get_mut(year) else {
        return;
    };
    if months.get(month).is_some_and(|days| days.iter().all(|v| *v == 0)) {
        months.remove(month);
        if months.is_empty() {
            grid.remove(year);
        }
    }
}

/// Cascade month -> year -> chain removal of now-empty comment branches.
fn prune_comment_branches(
    comments: &mut BTreeMap<String, CommentTree>,
    name: &str,
    year: &str,
    month: &str,
) {
    let Some(tree) = comments.get_mut(name) else {
        return;
    };
    let Some(months) = tree.get_mut(year) else {
        return;
    };
    if months.get(month).is_some_and(|days| days.is_empty()) {
        months.remove(month);
        if months.is_empty() {
            tree.remove(year);
            if tree.is_empty() {
                comments.remove(name);
            }
        }
    }
}
