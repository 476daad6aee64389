//! Layout and snapshot projections of table state.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use super::filter::FilterValue;
use super::sorting::ColumnSort;

/// Side a column is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinSide {
    Left,
    Right,
}

/// Pinned columns per side. A column appears on at most one side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnPinning {
    #[serde(default)]
    pub left: Vec<String>,
    #[serde(default)]
    pub right: Vec<String>,
}

impl ColumnPinning {
    /// Pin a column to a side, or unpin it with `None`.
    pub fn pin(&mut self, column_id: &str, side: Option<PinSide>) {
        self.left.retain(|id| id != column_id);
        self.right.retain(|id| id != column_id);
        match side {
            Some(PinSide::Left) => self.left.push(column_id.to_string()),
            Some(PinSide::Right) => self.right.push(column_id.to_string()),
            None => {}
        }
    }

    pub fn side(&self, column_id: &str) -> Option<PinSide> {
        if self.left.iter().any(|id| id == column_id) {
            Some(PinSide::Left)
        } else if self.right.iter().any(|id| id == column_id) {
            Some(PinSide::Right)
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }

    /// Drop unknown ids and resolve columns listed on both sides (left wins).
    pub(crate) fn retain_known(&mut self, is_known: impl Fn(&str) -> bool) {
        let mut left: Vec<String> = Vec::new();
        for id in self.left.drain(..) {
            if is_known(&id) && !left.contains(&id) {
                left.push(id);
            }
        }
        let mut right: Vec<String> = Vec::new();
        for id in self.right.drain(..) {
            if is_known(&id) && !left.contains(&id) && !right.contains(&id) {
                right.push(id);
            }
        }
        self.left = left;
        self.right = right;
    }
}

/// Persisted layout, keyed per table, tenant and user.
///
/// Maps are ordered so the encoded payload is byte-stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preference {
    #[serde(default)]
    pub column_visibility: BTreeMap<String, bool>,
    #[serde(default)]
    pub column_order: Vec<String>,
    #[serde(default)]
    pub column_pinning: ColumnPinning,
    #[serde(default)]
    pub column_sizing: BTreeMap<String, u16>,
    pub page_size: usize,
}

/// Full interactive state captured by a preset.
///
/// Every field is optional so presets saved by older layouts still apply:
/// missing fields keep the current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_visibility: Option<BTreeMap<String, bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_order: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_pinning: Option<ColumnPinning>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_sizing: Option<BTreeMap<String, u16>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorting: Option<Vec<ColumnSort>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<BTreeMap<String, FilterValue>>,
    /// Recorded for reference; applying a preset keeps the current page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_index: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_moves_between_sides() {
        let mut pinning = ColumnPinning::default();
        pinning.pin("name", Some(PinSide::Left));
        pinning.pin("name", Some(PinSide::Right));
        assert_eq!(pinning.side("name"), Some(PinSide::Right));
        assert!(pinning.left.is_empty());
        pinning.pin("name", None);
        assert!(pinning.is_empty());
    }

    #[test]
    fn test_retain_known_dedups_sides() {
        let mut pinning = ColumnPinning {
            left: vec!["a".into(), "ghost".into(), "a".into()],
            right: vec!["a".into(), "b".into()],
        };
        pinning.retain_known(|id| id != "ghost");
        assert_eq!(pinning.left, ["a"]);
        assert_eq!(pinning.right, ["b"]);
    }

    #[test]
    fn test_snapshot_missing_fields() {
        let snapshot: PresetSnapshot = serde_json::from_str(r#"{"search":"fries"}"#).unwrap();
        assert_eq!(snapshot.search.as_deref(), Some("fries"));
        assert!(snapshot.sorting.is_none());
    }
}
