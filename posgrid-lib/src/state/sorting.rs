//! Sorting types.

use serde::Deserialize;
use serde::Serialize;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort applied to one column. Entries earlier in the list take precedence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSort {
    pub id: String,
    pub direction: SortDirection,
}

impl ColumnSort {
    pub fn asc(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Advance a column through none → asc → desc → none.
///
/// With `additive` the other sorted columns are kept; otherwise the column
/// replaces the whole sort list.
pub(crate) fn cycle_sort(sorting: &mut Vec<ColumnSort>, column_id: &str, additive: bool) {
    let current = sorting
        .iter()
        .find(|s| s.id == column_id)
        .map(|s| s.direction);

    let next = match current {
        None => Some(SortDirection::Asc),
        Some(SortDirection::Asc) => Some(SortDirection::Desc),
        Some(SortDirection::Desc) => None,
    };

    if additive {
        match (current, next) {
            (None, Some(direction)) => sorting.push(ColumnSort {
                id: column_id.to_string(),
                direction,
            }),
            (Some(_), Some(direction)) => {
                if let Some(entry) = sorting.iter_mut().find(|s| s.id == column_id) {
                    entry.direction = direction;
                }
            }
            _ => sorting.retain(|s| s.id != column_id),
        }
    } else {
        sorting.clear();
        if let Some(direction) = next {
            sorting.push(ColumnSort {
                id: column_id.to_string(),
                direction,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle() {
        let mut sorting = Vec::new();
        cycle_sort(&mut sorting, "name", false);
        assert_eq!(sorting, [ColumnSort::asc("name")]);
        cycle_sort(&mut sorting, "name", false);
        assert_eq!(sorting, [ColumnSort::desc("name")]);
        cycle_sort(&mut sorting, "name", false);
        assert!(sorting.is_empty());
    }

    #[test]
    fn test_single_sort_replaces() {
        let mut sorting = vec![ColumnSort::desc("qty")];
        cycle_sort(&mut sorting, "name", false);
        assert_eq!(sorting, [ColumnSort::asc("name")]);
    }

    #[test]
    fn test_additive_keeps_others() {
        let mut sorting = vec![ColumnSort::desc("qty")];
        cycle_sort(&mut sorting, "name", true);
        cycle_sort(&mut sorting, "qty", true);
        assert_eq!(sorting, [ColumnSort::asc("name")]);
    }
}
