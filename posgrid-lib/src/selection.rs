//! Row selection by stable key.

use std::collections::HashSet;
use std::hash::Hash;

use crate::row::TableRow;

/// Selection mode for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionMode {
    /// No selection column.
    #[default]
    None,
    /// At most one row (radio-button style).
    Single,
    /// Any number of rows (checkbox style).
    Multi,
}

/// Tracks selected rows by their keys.
///
/// Keys come from [`TableRow::key`], so a selection survives re-sorting and
/// paging; only rows present in the current row model are realized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<K: Clone + Eq + Hash> {
    mode: SelectionMode,
    selected: HashSet<K>,
}

impl<K: Clone + Eq + Hash> Default for Selection<K> {
    fn default() -> Self {
        Self::new(SelectionMode::None)
    }
}

impl<K: Clone + Eq + Hash> Selection<K> {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            selected: HashSet::new(),
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Toggle selection for a key. Returns true if selection changed.
    pub fn toggle(&mut self, key: K) -> bool {
        match self.mode {
            SelectionMode::None => false,
            SelectionMode::Single => {
                let was_selected = self.selected.contains(&key);
                self.selected.clear();
                if !was_selected {
                    self.selected.insert(key);
                }
                true
            }
            SelectionMode::Multi => {
                if !self.selected.remove(&key) {
                    self.selected.insert(key);
                }
                true
            }
        }
    }

    /// Select every key. Returns how many were newly selected.
    pub fn select_all(&mut self, keys: impl IntoIterator<Item = K>) -> usize {
        if self.mode != SelectionMode::Multi {
            return 0;
        }
        keys.into_iter()
            .filter(|key| self.selected.insert(key.clone()))
            .count()
    }

    /// Deselect every key. Returns how many were removed.
    pub fn deselect_all<'a>(&mut self, keys: impl IntoIterator<Item = &'a K>) -> usize
    where
        K: 'a,
    {
        keys.into_iter()
            .filter(|key| self.selected.remove(*key))
            .count()
    }

    /// True when `keys` is non-empty and every key is selected.
    pub fn contains_all<'a>(&self, keys: impl IntoIterator<Item = &'a K>) -> bool
    where
        K: 'a,
    {
        let mut any = false;
        for key in keys {
            if !self.selected.contains(key) {
                return false;
            }
            any = true;
        }
        any
    }

    pub fn is_selected(&self, key: &K) -> bool {
        self.selected.contains(key)
    }

    /// Clear all selections. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let count = self.selected.len();
        self.selected.clear();
        count
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.selected.iter()
    }

    /// Map the selected keys to row objects, in row order.
    ///
    /// Keys without a matching row are skipped.
    pub fn realize<'a, T>(&self, rows: impl IntoIterator<Item = &'a T>) -> Vec<T>
    where
        T: TableRow<Key = K>,
    {
        if self.selected.is_empty() {
            return Vec::new();
        }
        rows.into_iter()
            .filter(|row| self.selected.contains(&row.key()))
            .cloned()
            .collect()
    }
}
