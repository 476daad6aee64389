//! Interactive table state.
//!
//! [`TableState`] is the single mutable bag behind a table. Its mutators are
//! pure: they report whether anything changed and leave side effects
//! (recomputing rows, persisting, emitting queries) to the engine.

mod filter;
mod layout;
mod sorting;

pub use filter::*;
pub use layout::*;
pub use sorting::*;

use std::collections::BTreeMap;
use std::hash::Hash;

use crate::selection::{Selection, SelectionMode};

/// All interactive state of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableState<K: Clone + Eq + Hash> {
    pub sorting: Vec<ColumnSort>,
    pub search: String,
    pub filters: BTreeMap<String, FilterValue>,
    /// Missing entries mean visible.
    pub visibility: BTreeMap<String, bool>,
    /// Empty until seeded; the engine normalizes it against the column model.
    pub order: Vec<String>,
    pub pinning: ColumnPinning,
    pub sizing: BTreeMap<String, u16>,
    pub selection: Selection<K>,
    pub page_index: usize,
    pub page_size: usize,
}

impl<K: Clone + Eq + Hash> TableState<K> {
    /// Create default state.
    pub fn new(page_size: usize, selection: SelectionMode) -> Self {
        Self {
            sorting: Vec::new(),
            search: String::new(),
            filters: BTreeMap::new(),
            visibility: BTreeMap::new(),
            order: Vec::new(),
            pinning: ColumnPinning::default(),
            sizing: BTreeMap::new(),
            selection: Selection::new(selection),
            page_index: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn is_visible(&self, column_id: &str) -> bool {
        self.visibility.get(column_id).copied().unwrap_or(true)
    }

    pub fn set_search(&mut self, search: impl Into<String>) -> bool {
        let search = search.into();
        if self.search == search {
            return false;
        }
        self.search = search;
        true
    }

    /// Set or clear (`None` or an empty value) a column filter.
    pub fn set_filter(&mut self, column_id: &str, value: Option<FilterValue>) -> bool {
        match value.filter(|v| !v.is_empty()) {
            Some(value) => {
                if self.filters.get(column_id) == Some(&value) {
                    return false;
                }
                self.filters.insert(column_id.to_string(), value);
                true
            }
            None => self.filters.remove(column_id).is_some(),
        }
    }

    pub fn clear_filters(&mut self) -> bool {
        let changed = !self.filters.is_empty();
        self.filters.clear();
        changed
    }

    pub fn toggle_sort(&mut self, column_id: &str, additive: bool) {
        cycle_sort(&mut self.sorting, column_id, additive);
    }

    pub fn set_sorting(&mut self, sorting: Vec<ColumnSort>) -> bool {
        if self.sorting == sorting {
            return false;
        }
        self.sorting = sorting;
        true
    }

    pub fn set_visibility(&mut self, column_id: &str, visible: bool) -> bool {
        if self.is_visible(column_id) == visible {
            return false;
        }
        self.visibility.insert(column_id.to_string(), visible);
        true
    }

    /// Move a column within `order` to `to` (clamped). `order` must already
    /// contain the column.
    pub fn move_column(&mut self, column_id: &str, to: usize) -> bool {
        let Some(from) = self.order.iter().position(|id| id == column_id) else {
            return false;
        };
        let to = to.min(self.order.len() - 1);
        if from == to {
            return false;
        }
        let id = self.order.remove(from);
        self.order.insert(to, id);
        true
    }

    pub fn pin(&mut self, column_id: &str, side: Option<PinSide>) -> bool {
        if self.pinning.side(column_id) == side {
            return false;
        }
        self.pinning.pin(column_id, side);
        true
    }

    pub fn resize(&mut self, column_id: &str, width: u16) -> bool {
        if self.sizing.get(column_id) == Some(&width) {
            return false;
        }
        self.sizing.insert(column_id.to_string(), width);
        true
    }

    pub fn set_page_index(&mut self, page_index: usize) -> bool {
        if self.page_index == page_index {
            return false;
        }
        self.page_index = page_index;
        true
    }

    /// Change the page size and return to the first page.
    pub fn set_page_size(&mut self, page_size: usize) -> bool {
        let page_size = page_size.max(1);
        if self.page_size == page_size {
            return false;
        }
        self.page_size = page_size;
        self.page_index = 0;
        true
    }

    /// Layout projection that gets persisted as a preference.
    pub fn preference(&self) -> Preference {
        Preference {
            column_visibility: self.visibility.clone(),
            column_order: self.order.clone(),
            column_pinning: self.pinning.clone(),
            column_sizing: self.sizing.clone(),
            page_size: self.page_size,
        }
    }

    /// Replace the layout subset with a loaded preference.
    pub fn apply_preference(&mut self, preference: &Preference) {
        self.visibility = preference.column_visibility.clone();
        self.order = preference.column_order.clone();
        self.pinning = preference.column_pinning.clone();
        self.sizing = preference.column_sizing.clone();
        if preference.page_size > 0 {
            self.page_size = preference.page_size;
        }
    }

    /// Return the layout subset to defaults.
    pub fn reset_layout(&mut self, page_size: usize) {
        self.visibility.clear();
        self.order.clear();
        self.pinning = ColumnPinning::default();
        self.sizing.clear();
        self.page_size = page_size.max(1);
        self.page_index = 0;
    }

    /// Capture everything a preset can restore.
    pub fn snapshot(&self) -> PresetSnapshot {
        PresetSnapshot {
            column_visibility: Some(self.visibility.clone()),
            column_order: Some(self.order.clone()),
            column_pinning: Some(self.pinning.clone()),
            column_sizing: Some(self.sizing.clone()),
            page_size: Some(self.page_size),
            sorting: Some(self.sorting.clone()),
            search: Some(self.search.clone()),
            filters: Some(self.filters.clone()),
            page_index: Some(self.page_index),
        }
    }

    /// Replace the preset-controlled subset in one step. Missing fields keep
    /// their current values.
    pub fn apply_snapshot(&mut self, snapshot: &PresetSnapshot) {
        if let Some(visibility) = &snapshot.column_visibility {
            self.visibility = visibility.clone();
        }
        if let Some(order) = &snapshot.column_order {
            self.order = order.clone();
        }
        if let Some(pinning) = &snapshot.column_pinning {
            self.pinning = pinning.clone();
        }
        if let Some(sizing) = &snapshot.column_sizing {
            self.sizing = sizing.clone();
        }
        if let Some(page_size) = snapshot.page_size.filter(|size| *size > 0) {
            self.page_size = page_size;
        }
        if let Some(sorting) = &snapshot.sorting {
            self.sorting = sorting.clone();
        }
        if let Some(search) = &snapshot.search {
            self.search = search.clone();
        }
        if let Some(filters) = &snapshot.filters {
            self.filters = filters.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> TableState<u32> {
        TableState::new(25, SelectionMode::Multi)
    }

    #[test]
    fn test_empty_filter_clears() {
        let mut state = state();
        assert!(state.set_filter("name", Some(FilterValue::text("fries"))));
        assert!(!state.set_filter("name", Some(FilterValue::text("fries"))));
        assert!(state.set_filter("name", Some(FilterValue::text(""))));
        assert!(state.filters.is_empty());
    }

    #[test]
    fn test_move_column_clamps() {
        let mut state = state();
        state.order = vec!["a".into(), "b".into(), "c".into()];
        assert!(state.move_column("a", 99));
        assert_eq!(state.order, ["b", "c", "a"]);
        assert!(!state.move_column("ghost", 0));
    }

    #[test]
    fn test_page_size_resets_index() {
        let mut state = state();
        state.page_index = 3;
        assert!(state.set_page_size(50));
        assert_eq!(state.page_index, 0);
        assert!(!state.set_page_size(50));
    }

    #[test]
    fn test_snapshot_apply_is_idempotent() {
        let mut source = state();
        source.set_search("burger");
        source.toggle_sort("price", false);
        source.set_visibility("sku", false);
        source.pin("name", Some(PinSide::Left));
        let snapshot = source.snapshot();

        let mut target = state();
        target.page_index = 2;
        target.apply_snapshot(&snapshot);
        let once = target.clone();
        target.apply_snapshot(&snapshot);
        assert_eq!(target, once);
        assert_eq!(target.search, "burger");
        assert_eq!(target.page_index, 2);
    }

    #[test]
    fn test_partial_snapshot_keeps_current() {
        let mut state = state();
        state.set_search("kept");
        state.apply_snapshot(&PresetSnapshot {
            page_size: Some(10),
            ..Default::default()
        });
        assert_eq!(state.search, "kept");
        assert_eq!(state.page_size, 10);
    }
}
