//! Raw column descriptors supplied by the host page.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

/// Injected cell presentation. Held by the column node and handed back to the
/// host; the engine itself only reads [`TableRow::cell_text`](crate::TableRow::cell_text).
pub type CellRenderer<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// Kind of structured filter a column offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterKind {
    Text,
    NumberRange,
    DateRange,
    MultiSelect,
}

/// One choice of a multi-select filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub label: String,
    pub value: String,
}

impl FilterOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// A column as declared by a page, flat or grouped.
///
/// # Example
///
/// ```
/// use posgrid_lib::column::{ColumnDescriptor, FilterKind};
///
/// #[derive(Clone)]
/// struct Item;
///
/// let columns: Vec<ColumnDescriptor<Item>> = vec![
///     ColumnDescriptor::new("name", "Name").filter(FilterKind::Text),
///     ColumnDescriptor::group(
///         "Stock",
///         vec![
///             ColumnDescriptor::new("qty", "Quantity").width(90),
///             ColumnDescriptor::new("unit", "Unit").sortable(false),
///         ],
///     ),
/// ];
/// assert_eq!(columns[1].children.len(), 2);
/// ```
pub struct ColumnDescriptor<T> {
    /// Data key; becomes the column id when present.
    pub key: Option<String>,
    /// Explicit id for columns without a data key.
    pub id: Option<String>,
    /// Header label.
    pub label: String,
    /// Nested columns. Non-empty makes this a group.
    pub children: Vec<ColumnDescriptor<T>>,
    pub sortable: bool,
    pub hideable: bool,
    pub filter: Option<FilterKind>,
    pub filter_options: Vec<FilterOption>,
    /// Initial width in pixels.
    pub width: Option<u16>,
    pub render: Option<CellRenderer<T>>,
}

impl<T> ColumnDescriptor<T> {
    /// Create a leaf column bound to a data key.
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::unbound(label)
        }
    }

    /// Create a leaf column without a data key (display-only, e.g. actions).
    pub fn unbound(label: impl Into<String>) -> Self {
        Self {
            key: None,
            id: None,
            label: label.into(),
            children: Vec::new(),
            sortable: true,
            hideable: true,
            filter: None,
            filter_options: Vec::new(),
            width: None,
            render: None,
        }
    }

    /// Create a header-only group.
    pub fn group(label: impl Into<String>, children: Vec<ColumnDescriptor<T>>) -> Self {
        Self {
            children,
            sortable: false,
            ..Self::unbound(label)
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn hideable(mut self, hideable: bool) -> Self {
        self.hideable = hideable;
        self
    }

    pub fn filter(mut self, kind: FilterKind) -> Self {
        self.filter = Some(kind);
        self
    }

    /// Set multi-select choices. Implies [`FilterKind::MultiSelect`].
    pub fn options(mut self, options: Vec<FilterOption>) -> Self {
        self.filter = Some(FilterKind::MultiSelect);
        self.filter_options = options;
        self
    }

    pub fn width(mut self, width: u16) -> Self {
        self.width = Some(width);
        self
    }

    pub fn render(mut self, render: impl Fn(&T) -> String + Send + Sync + 'static) -> Self {
        self.render = Some(Arc::new(render));
        self
    }

    /// Whether this descriptor is a group.
    pub fn is_group(&self) -> bool {
        !self.children.is_empty()
    }
}

impl<T> Clone for ColumnDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            id: self.id.clone(),
            label: self.label.clone(),
            children: self.children.clone(),
            sortable: self.sortable,
            hideable: self.hideable,
            filter: self.filter,
            filter_options: self.filter_options.clone(),
            width: self.width,
            render: self.render.clone(),
        }
    }
}

impl<T> fmt::Debug for ColumnDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("key", &self.key)
            .field("id", &self.id)
            .field("label", &self.label)
            .field("children", &self.children)
            .field("sortable", &self.sortable)
            .field("hideable", &self.hideable)
            .field("filter", &self.filter)
            .field("width", &self.width)
            .field("render", &self.render.is_some())
            .finish()
    }
}
