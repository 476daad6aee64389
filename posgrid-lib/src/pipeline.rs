//! Local-mode row pipeline: filter, then sort, then paginate.

use std::cmp::Ordering;
use std::hash::Hash;

use crate::row::{CellValue, TableRow};
use crate::state::{ColumnSort, SortDirection, TableState};

/// Result of one pipeline pass. Rows are referenced by index into the full
/// row set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowModel {
    /// Indices of every row left after filtering, in sorted order.
    pub ordered: Vec<usize>,
    /// Indices of the rows on the current page, in display order.
    pub indices: Vec<usize>,
    /// Rows left after filtering.
    pub filtered: usize,
    /// Never zero.
    pub page_count: usize,
    /// Page index clamped into `[0, page_count)`.
    pub page_index: usize,
}

/// Computes the visible rows entirely in memory.
///
/// Only the global search is applied. Per-column filters stay in
/// [`TableState::filters`] for presets and remote queries but do not narrow
/// local rows.
#[derive(Debug, Clone)]
pub struct RowPipeline<T: TableRow> {
    rows: Vec<T>,
}

impl<T: TableRow> RowPipeline<T> {
    pub fn new(rows: Vec<T>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&T> {
        self.rows.get(index)
    }

    pub fn set_rows(&mut self, rows: Vec<T>) {
        self.rows = rows;
    }

    /// Run filter → sort → paginate.
    ///
    /// `searchable` lists the data columns the search term is matched against
    /// and `text` yields a cell's displayed text for that match. `sortable`
    /// decides which sort entries are honored.
    pub fn compute<K: Clone + Eq + Hash>(
        &self,
        state: &TableState<K>,
        searchable: &[&str],
        text: impl Fn(&T, &str) -> String,
        sortable: impl Fn(&str) -> bool,
    ) -> RowModel {
        let mut indices = self.filter(&state.search, searchable, text);

        let sorting: Vec<&ColumnSort> = state.sorting.iter().filter(|s| sortable(&s.id)).collect();
        if !sorting.is_empty() {
            self.sort(&mut indices, &sorting);
        }

        paginate(indices, state.page_index, state.page_size)
    }

    fn filter(
        &self,
        search: &str,
        searchable: &[&str],
        text: impl Fn(&T, &str) -> String,
    ) -> Vec<usize> {
        let term = search.trim().to_lowercase();
        if term.is_empty() {
            return (0..self.rows.len()).collect();
        }

        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                searchable
                    .iter()
                    .any(|column| text(row, column).to_lowercase().contains(&term))
            })
            .map(|(index, _)| index)
            .collect()
    }

    fn sort(&self, indices: &mut Vec<usize>, sorting: &[&ColumnSort]) {
        let mut keyed: Vec<(usize, Vec<CellValue>)> = indices
            .iter()
            .map(|&index| {
                let row = &self.rows[index];
                let values = sorting.iter().map(|s| row.cell_value(&s.id)).collect();
                (index, values)
            })
            .collect();

        // `sort_by` is stable: ties keep their filtered order.
        keyed.sort_by(|(_, a), (_, b)| {
            for (position, sort) in sorting.iter().enumerate() {
                let ordering = a[position].compare(&b[position]);
                let ordering = match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });

        *indices = keyed.into_iter().map(|(index, _)| index).collect();
    }
}

fn paginate(ordered: Vec<usize>, page_index: usize, page_size: usize) -> RowModel {
    let page_size = page_size.max(1);
    let filtered = ordered.len();
    let page_count = filtered.div_ceil(page_size).max(1);
    let page_index = page_index.min(page_count - 1);

    let start = page_index * page_size;
    let end = (start + page_size).min(filtered);
    let indices = ordered
        .get(start..end)
        .map(<[usize]>::to_vec)
        .unwrap_or_default();

    RowModel {
        ordered,
        indices,
        filtered,
        page_count,
        page_index,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::SelectionMode;

    #[derive(Clone, Debug)]
    struct Dish {
        id: u32,
        name: &'static str,
        price: i64,
    }

    impl TableRow for Dish {
        type Key = u32;

        fn key(&self) -> u32 {
            self.id
        }

        fn cell_text(&self, column_id: &str) -> String {
            match column_id {
                "name" => self.name.to_string(),
                "price" => self.price.to_string(),
                _ => String::new(),
            }
        }

        fn cell_value(&self, column_id: &str) -> CellValue {
            match column_id {
                "price" => CellValue::Integer(self.price),
                other => CellValue::Text(self.cell_text(other)),
            }
        }
    }

    fn dish(id: u32, name: &'static str, price: i64) -> Dish {
        Dish { id, name, price }
    }

    fn names(pipeline: &RowPipeline<Dish>, model: &RowModel) -> Vec<&'static str> {
        model
            .indices
            .iter()
            .map(|&i| pipeline.row(i).unwrap().name)
            .collect()
    }

    const SEARCHABLE: &[&str] = &["name", "price"];

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let pipeline = RowPipeline::new(vec![dish(1, "Bob", 1), dish(2, "Ann", 2)]);
        let mut state = TableState::<u32>::new(25, SelectionMode::None);

        state.set_search("bo");
        let model = pipeline.compute(&state, SEARCHABLE, Dish::cell_text, |_| true);
        assert_eq!(names(&pipeline, &model), ["Bob"]);

        state.set_search("zz");
        let model = pipeline.compute(&state, SEARCHABLE, Dish::cell_text, |_| true);
        assert!(model.indices.is_empty());
        assert_eq!(model.filtered, 0);
        assert_eq!(model.page_count, 1);
    }

    #[test]
    fn test_search_matches_displayed_text() {
        let pipeline = RowPipeline::new(vec![dish(1, "Bob", 0), dish(2, "Ann", 2)]);
        let mut state = TableState::<u32>::new(25, SelectionMode::None);
        let displayed = |row: &Dish, column: &str| match column {
            "price" if row.price == 0 => "free".to_string(),
            other => row.cell_text(other),
        };

        state.set_search("free");
        let model = pipeline.compute(&state, SEARCHABLE, displayed, |_| true);
        assert_eq!(names(&pipeline, &model), ["Bob"]);

        let model = pipeline.compute(&state, SEARCHABLE, Dish::cell_text, |_| true);
        assert!(model.indices.is_empty());
    }

    #[test]
    fn test_stable_sort() {
        let pipeline = RowPipeline::new(vec![
            dish(1, "Fries", 3),
            dish(2, "Burger", 9),
            dish(3, "Soda", 3),
            dish(4, "Salad", 7),
        ]);
        let mut state = TableState::<u32>::new(25, SelectionMode::None);
        state.toggle_sort("price", false);

        let model = pipeline.compute(&state, SEARCHABLE, Dish::cell_text, |_| true);
        assert_eq!(names(&pipeline, &model), ["Fries", "Soda", "Salad", "Burger"]);

        state.toggle_sort("price", false);
        let model = pipeline.compute(&state, SEARCHABLE, Dish::cell_text, |_| true);
        assert_eq!(names(&pipeline, &model), ["Burger", "Salad", "Fries", "Soda"]);
    }

    #[test]
    fn test_unsortable_columns_ignored() {
        let pipeline = RowPipeline::new(vec![dish(1, "b", 1), dish(2, "a", 2)]);
        let mut state = TableState::<u32>::new(25, SelectionMode::None);
        state.toggle_sort("name", false);

        let model = pipeline.compute(&state, SEARCHABLE, Dish::cell_text, |id| id != "name");
        assert_eq!(names(&pipeline, &model), ["b", "a"]);
    }

    #[test]
    fn test_filters_do_not_narrow_local_rows() {
        let pipeline = RowPipeline::new(vec![dish(1, "Bob", 1), dish(2, "Ann", 2)]);
        let mut state = TableState::<u32>::new(25, SelectionMode::None);
        state.set_filter("name", Some(crate::state::FilterValue::text("Ann")));

        let model = pipeline.compute(&state, SEARCHABLE, Dish::cell_text, |_| true);
        assert_eq!(model.filtered, 2);
    }

    #[test]
    fn test_pagination_slices_and_clamps() {
        let rows = (0..23).map(|i| dish(i, "Item", i as i64)).collect();
        let pipeline = RowPipeline::new(rows);
        let mut state = TableState::<u32>::new(10, SelectionMode::None);

        state.page_index = 2;
        let model = pipeline.compute(&state, SEARCHABLE, Dish::cell_text, |_| true);
        assert_eq!(model.page_count, 3);
        assert_eq!(model.indices, [20, 21, 22]);

        state.page_index = 7;
        let model = pipeline.compute(&state, SEARCHABLE, Dish::cell_text, |_| true);
        assert_eq!(model.page_index, 2);
        assert_eq!(model.indices.len(), 3);
    }
}
