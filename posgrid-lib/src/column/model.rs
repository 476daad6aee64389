//! Column tree normalization.

use std::collections::HashMap;
use std::collections::HashSet;

use crate::error::ColumnError;
use crate::row::TableRow;

use super::descriptor::{CellRenderer, ColumnDescriptor, FilterKind, FilterOption};

/// Id of the synthetic selection column.
pub const SELECTION_COLUMN_ID: &str = "__select";

/// Structural role of a column node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Bound to row data.
    Leaf,
    /// Header-only parent.
    Group,
    /// Synthetic checkbox column.
    Selection,
}

/// A resolved column. Links to other nodes are ids, never references.
pub struct ColumnNode<T> {
    id: String,
    label: String,
    kind: ColumnKind,
    parent: Option<String>,
    children: Vec<String>,
    depth: usize,
    sortable: bool,
    hideable: bool,
    filter: Option<FilterKind>,
    filter_options: Vec<FilterOption>,
    width: Option<u16>,
    render: Option<CellRenderer<T>>,
}

impl<T> ColumnNode<T> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn children(&self) -> &[String] {
        &self.children
    }

    /// Number of ancestors.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_leaf(&self) -> bool {
        self.kind != ColumnKind::Group
    }

    pub fn is_sortable(&self) -> bool {
        self.kind == ColumnKind::Leaf && self.sortable
    }

    pub fn is_hideable(&self) -> bool {
        self.kind == ColumnKind::Leaf && self.hideable
    }

    pub fn is_reorderable(&self) -> bool {
        self.kind == ColumnKind::Leaf
    }

    pub fn filter_kind(&self) -> Option<FilterKind> {
        self.filter
    }

    pub fn filter_options(&self) -> &[FilterOption] {
        &self.filter_options
    }

    pub fn width_hint(&self) -> Option<u16> {
        self.width
    }

    pub fn renderer(&self) -> Option<&CellRenderer<T>> {
        self.render.as_ref()
    }
}

impl<T> std::fmt::Debug for ColumnNode<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnNode")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

/// One cell of a header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCell {
    /// Column (or group) id. For placeholders, the id of the leaf below.
    pub id: String,
    pub label: String,
    pub colspan: usize,
    /// Filler above a leaf that is shallower than the deepest leaf.
    pub placeholder: bool,
}

/// Id-addressed column tree built from descriptors.
///
/// Nodes live in an arena in declaration order; `leaves` holds the natural
/// leaf order with the selection column first when enabled.
pub struct ColumnModel<T> {
    nodes: Vec<ColumnNode<T>>,
    index: HashMap<String, usize>,
    roots: Vec<String>,
    leaves: Vec<String>,
    selection: bool,
}

impl<T> ColumnModel<T> {
    /// Normalize descriptors into a column tree.
    ///
    /// Ids resolve to `key`, then the caller-supplied `id`, then a positional
    /// fallback such as `col_1_0`.
    pub fn new(
        descriptors: Vec<ColumnDescriptor<T>>,
        selection_enabled: bool,
    ) -> Result<Self, ColumnError> {
        let mut model = Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            roots: Vec::new(),
            leaves: Vec::new(),
            selection: selection_enabled,
        };

        if selection_enabled {
            model.push(ColumnNode {
                id: SELECTION_COLUMN_ID.to_string(),
                label: String::new(),
                kind: ColumnKind::Selection,
                parent: None,
                children: Vec::new(),
                depth: 0,
                sortable: false,
                hideable: false,
                filter: None,
                filter_options: Vec::new(),
                width: Some(40),
                render: None,
            })?;
        }

        let mut explicit = HashSet::new();
        collect_explicit_ids(&descriptors, &mut explicit);

        for (position, descriptor) in descriptors.into_iter().enumerate() {
            model.insert(descriptor, None, &[position], &explicit)?;
        }

        Ok(model)
    }

    fn insert(
        &mut self,
        descriptor: ColumnDescriptor<T>,
        parent: Option<&str>,
        path: &[usize],
        explicit: &HashSet<String>,
    ) -> Result<String, ColumnError> {
        let id = match explicit_id(&descriptor) {
            Some(id) => id.to_string(),
            None => self.fallback_id(path, explicit),
        };
        if id == SELECTION_COLUMN_ID {
            return Err(ColumnError::ReservedId(id));
        }

        let kind = if descriptor.is_group() {
            ColumnKind::Group
        } else {
            ColumnKind::Leaf
        };

        self.push(ColumnNode {
            id: id.clone(),
            label: descriptor.label,
            kind,
            parent: parent.map(str::to_string),
            children: Vec::new(),
            depth: path.len() - 1,
            sortable: descriptor.sortable,
            hideable: descriptor.hideable,
            filter: descriptor.filter,
            filter_options: descriptor.filter_options,
            width: descriptor.width,
            render: descriptor.render,
        })?;

        let mut children = Vec::with_capacity(descriptor.children.len());
        for (position, child) in descriptor.children.into_iter().enumerate() {
            let mut child_path = path.to_vec();
            child_path.push(position);
            children.push(self.insert(child, Some(&id), &child_path, explicit)?);
        }

        if let Some(&slot) = self.index.get(&id) {
            self.nodes[slot].children = children;
        }

        Ok(id)
    }

    /// Positional id such as `col_1_0`, suffixed with `-<n>` when a caller id
    /// or an earlier column already uses it.
    fn fallback_id(&self, path: &[usize], explicit: &HashSet<String>) -> String {
        let path: Vec<String> = path.iter().map(|p| p.to_string()).collect();
        let base = format!("col_{}", path.join("_"));
        let taken = |id: &str| explicit.contains(id) || self.index.contains_key(id);

        let mut id = base.clone();
        let mut attempt = 1;
        while taken(&id) {
            id = format!("{base}-{attempt}");
            attempt += 1;
        }
        id
    }

    fn push(&mut self, node: ColumnNode<T>) -> Result<(), ColumnError> {
        if self.index.contains_key(&node.id) {
            return Err(ColumnError::DuplicateId(node.id));
        }
        if node.parent.is_none() {
            self.roots.push(node.id.clone());
        }
        if node.is_leaf() {
            self.leaves.push(node.id.clone());
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    /// Whether a synthetic selection column was prepended.
    pub fn has_selection(&self) -> bool {
        self.selection
    }

    /// Leaf ids in natural order, selection column first when enabled.
    pub fn leaf_ids(&self) -> &[String] {
        &self.leaves
    }

    /// Leaf ids bound to row data (no selection column).
    pub fn data_leaf_ids(&self) -> impl Iterator<Item = &str> {
        self.leaves
            .iter()
            .map(String::as_str)
            .filter(|id| *id != SELECTION_COLUMN_ID)
    }

    /// Top-level column ids.
    pub fn root_ids(&self) -> &[String] {
        &self.roots
    }

    pub fn node(&self, id: &str) -> Option<&ColumnNode<T>> {
        self.index.get(id).map(|&slot| &self.nodes[slot])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn is_leaf(&self, id: &str) -> bool {
        self.node(id).is_some_and(ColumnNode::is_leaf)
    }

    pub fn is_sortable(&self, id: &str) -> bool {
        self.node(id).is_some_and(ColumnNode::is_sortable)
    }

    pub fn is_hideable(&self, id: &str) -> bool {
        self.node(id).is_some_and(ColumnNode::is_hideable)
    }

    pub fn is_reorderable(&self, id: &str) -> bool {
        self.node(id).is_some_and(ColumnNode::is_reorderable)
    }

    pub fn filter_kind(&self, id: &str) -> Option<FilterKind> {
        self.node(id).and_then(ColumnNode::filter_kind)
    }

    pub fn filter_options(&self, id: &str) -> &[FilterOption] {
        self.node(id)
            .map(ColumnNode::filter_options)
            .unwrap_or_default()
    }

    pub fn width_hint(&self, id: &str) -> Option<u16> {
        self.node(id).and_then(ColumnNode::width_hint)
    }

    pub fn renderer(&self, id: &str) -> Option<&CellRenderer<T>> {
        self.node(id).and_then(ColumnNode::renderer)
    }

    /// Text a cell displays: the column renderer's output, else the row's
    /// own cell text.
    pub fn display_text(&self, row: &T, id: &str) -> String
    where
        T: TableRow,
    {
        match self.renderer(id) {
            Some(render) => render(row),
            None => row.cell_text(id),
        }
    }

    pub fn children(&self, id: &str) -> &[String] {
        self.node(id).map(ColumnNode::children).unwrap_or_default()
    }

    pub fn parent(&self, id: &str) -> Option<&str> {
        self.node(id).and_then(ColumnNode::parent)
    }

    /// Ancestors from the root down to (and including) `id`.
    fn lineage(&self, id: &str) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut cursor = self.node(id);
        while let Some(node) = cursor {
            chain.push(node.id());
            cursor = node.parent().and_then(|p| self.node(p));
        }
        chain.reverse();
        chain
    }

    /// Turn any stored order into a permutation of the known leaf ids.
    ///
    /// Unknown and duplicate ids are dropped, missing leaves are appended in
    /// natural order, and the selection column is forced to the front.
    pub fn normalize_order(&self, order: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(self.leaves.len());

        if self.selection {
            seen.insert(SELECTION_COLUMN_ID);
            normalized.push(SELECTION_COLUMN_ID.to_string());
        }

        let known = order
            .iter()
            .map(String::as_str)
            .chain(self.leaves.iter().map(String::as_str));
        for id in known {
            if self.is_leaf(id) && seen.insert(id) {
                normalized.push(id.to_string());
            }
        }

        normalized
    }

    /// Header rows for the given ordered leaves, one row per tree level.
    ///
    /// Adjacent leaves sharing an ancestor are merged into one spanning cell.
    /// A group whose leaves were reordered apart is split into several cells.
    pub fn header_groups(&self, leaves: &[String]) -> Vec<Vec<HeaderCell>> {
        let lineages: Vec<Vec<&str>> = leaves.iter().map(|id| self.lineage(id)).collect();
        let levels = lineages.iter().map(Vec::len).max().unwrap_or(0);

        let mut rows: Vec<Vec<HeaderCell>> = Vec::with_capacity(levels);
        for level in 0..levels {
            let mut row: Vec<HeaderCell> = Vec::new();
            for lineage in &lineages {
                let Some(&leaf) = lineage.last() else { continue };
                let (id, placeholder) = if level + 1 == levels {
                    (leaf, false)
                } else if level + 1 < lineage.len() {
                    (lineage[level], false)
                } else {
                    (leaf, true)
                };

                if let Some(last) = row.last_mut()
                    && last.id == id
                    && last.placeholder == placeholder
                {
                    last.colspan += 1;
                    continue;
                }

                let label = if placeholder {
                    String::new()
                } else {
                    self.node(id).map(|n| n.label.clone()).unwrap_or_default()
                };
                row.push(HeaderCell {
                    id: id.to_string(),
                    label,
                    colspan: 1,
                    placeholder,
                });
            }
            rows.push(row);
        }
        rows
    }
}

impl<T> std::fmt::Debug for ColumnModel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnModel")
            .field("nodes", &self.nodes)
            .field("leaves", &self.leaves)
            .finish()
    }
}

fn explicit_id<T>(descriptor: &ColumnDescriptor<T>) -> Option<&str> {
    descriptor
        .key
        .as_deref()
        .filter(|k| !k.is_empty())
        .or_else(|| descriptor.id.as_deref().filter(|i| !i.is_empty()))
}

fn collect_explicit_ids<T>(descriptors: &[ColumnDescriptor<T>], out: &mut HashSet<String>) {
    for descriptor in descriptors {
        if let Some(id) = explicit_id(descriptor) {
            out.insert(id.to_string());
        }
        collect_explicit_ids(&descriptor.children, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct Row;

    fn grouped() -> Vec<ColumnDescriptor<Row>> {
        vec![
            ColumnDescriptor::new("name", "Name"),
            ColumnDescriptor::group(
                "Stock",
                vec![
                    ColumnDescriptor::new("qty", "Qty"),
                    ColumnDescriptor::new("unit", "Unit"),
                ],
            )
            .with_id("stock"),
            ColumnDescriptor::unbound("Actions"),
        ]
    }

    #[test]
    fn test_id_resolution() {
        let model = ColumnModel::new(grouped(), false).unwrap();
        assert_eq!(model.leaf_ids(), ["name", "qty", "unit", "col_2"]);
        assert_eq!(model.children("stock"), ["qty", "unit"]);
        assert_eq!(model.parent("qty"), Some("stock"));
        assert!(!model.is_leaf("stock"));
    }

    #[test]
    fn test_positional_fallback_nests() {
        let columns = vec![ColumnDescriptor::<Row>::group(
            "Group",
            vec![ColumnDescriptor::unbound("A"), ColumnDescriptor::unbound("B")],
        )];
        let model = ColumnModel::new(columns, false).unwrap();
        assert_eq!(model.root_ids(), ["col_0"]);
        assert_eq!(model.leaf_ids(), ["col_0_0", "col_0_1"]);
    }

    #[test]
    fn test_selection_column_prepended() {
        let model = ColumnModel::new(grouped(), true).unwrap();
        assert_eq!(model.leaf_ids()[0], SELECTION_COLUMN_ID);
        assert!(!model.is_sortable(SELECTION_COLUMN_ID));
        assert!(!model.is_hideable(SELECTION_COLUMN_ID));
        assert!(!model.is_reorderable(SELECTION_COLUMN_ID));
        assert_eq!(model.data_leaf_ids().count(), 4);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let columns = vec![
            ColumnDescriptor::<Row>::new("name", "Name"),
            ColumnDescriptor::new("name", "Other"),
        ];
        assert!(matches!(
            ColumnModel::new(columns, false),
            Err(ColumnError::DuplicateId(id)) if id == "name"
        ));
    }

    #[test]
    fn test_fallback_skips_caller_ids() {
        let columns = vec![
            ColumnDescriptor::<Row>::unbound("Actions"),
            ColumnDescriptor::new("col_0", "Legacy"),
            ColumnDescriptor::unbound("Notes").with_id("col_2"),
            ColumnDescriptor::unbound("More"),
        ];
        let model = ColumnModel::new(columns, false).unwrap();
        assert_eq!(model.leaf_ids(), ["col_0-1", "col_0", "col_2", "col_3"]);
    }

    #[test]
    fn test_reserved_id_rejected() {
        let columns = vec![ColumnDescriptor::<Row>::new(SELECTION_COLUMN_ID, "X")];
        assert!(matches!(
            ColumnModel::new(columns, false),
            Err(ColumnError::ReservedId(_))
        ));
    }

    #[test]
    fn test_normalize_order_is_permutation() {
        let model = ColumnModel::new(grouped(), true).unwrap();
        let stored = vec![
            "unit".to_string(),
            "ghost".to_string(),
            SELECTION_COLUMN_ID.to_string(),
            "unit".to_string(),
            "stock".to_string(),
            "name".to_string(),
        ];
        let order = model.normalize_order(&stored);
        assert_eq!(order, [SELECTION_COLUMN_ID, "unit", "name", "qty", "col_2"]);

        let mut sorted = order.clone();
        sorted.sort();
        let mut leaves = model.leaf_ids().to_vec();
        leaves.sort();
        assert_eq!(sorted, leaves);
    }

    #[test]
    fn test_header_groups_span_and_split() {
        let model = ColumnModel::new(grouped(), false).unwrap();

        let natural = model.leaf_ids().to_vec();
        let rows = model.header_groups(&natural);
        assert_eq!(rows.len(), 2);
        let top: Vec<(&str, usize, bool)> = rows[0]
            .iter()
            .map(|c| (c.id.as_str(), c.colspan, c.placeholder))
            .collect();
        assert_eq!(
            top,
            [("name", 1, true), ("stock", 2, false), ("col_2", 1, true)]
        );

        let split: Vec<String> = ["qty", "name", "unit"].map(String::from).to_vec();
        let rows = model.header_groups(&split);
        let top: Vec<&str> = rows[0].iter().map(|c| c.id.as_str()).collect();
        assert_eq!(top, ["stock", "name", "stock"]);
    }
}
