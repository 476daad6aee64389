//! Engine configuration

use std::time::Duration;

use crate::selection::SelectionMode;

/// Whether row virtualization is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Virtualization {
    /// Window rows once the row count exceeds the threshold.
    #[default]
    Auto,
    /// Always window rows.
    On,
    /// Always materialize every row.
    Off,
}

/// Tunables shared by every table instance.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use posgrid_lib::config::EngineConfig;
///
/// let config = EngineConfig::default()
///     .with_default_page_size(50)
///     .with_query_debounce(Duration::from_millis(200));
/// assert_eq!(config.default_page_size, 50);
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Rows per page before any preference is loaded.
    ///
    /// Default: 25
    pub default_page_size: usize,

    /// Page sizes offered to the user.
    pub page_size_options: Vec<usize>,

    /// Quiet period before a layout change is persisted.
    ///
    /// Default: 500ms
    pub preference_debounce: Duration,

    /// Quiet period before a query change is emitted in remote mode.
    ///
    /// Default: 350ms
    pub query_debounce: Duration,

    /// Estimated row height in pixels.
    ///
    /// Default: 48
    pub row_height: f64,

    /// Rows rendered beyond each edge of the viewport.
    ///
    /// Default: 8
    pub overscan: usize,

    /// Row count above which `Virtualization::Auto` turns windowing on.
    ///
    /// Default: 50
    pub virtualization_threshold: usize,

    pub virtualization: Virtualization,

    /// Roles allowed to save role-scoped presets.
    pub role_preset_allowlist: Vec<String>,

    /// Smallest width a column can be resized to.
    ///
    /// Default: 40
    pub min_column_width: u16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_page_size: 25,
            page_size_options: vec![10, 25, 50, 100],
            preference_debounce: Duration::from_millis(500),
            query_debounce: Duration::from_millis(350),
            row_height: 48.0,
            overscan: 8,
            virtualization_threshold: 50,
            virtualization: Virtualization::Auto,
            role_preset_allowlist: vec!["admin".to_string(), "manager".to_string()],
            min_column_width: 40,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_page_size(mut self, page_size: usize) -> Self {
        self.default_page_size = page_size.max(1);
        self
    }

    pub fn with_page_size_options(mut self, options: Vec<usize>) -> Self {
        self.page_size_options = options;
        self
    }

    pub fn with_preference_debounce(mut self, delay: Duration) -> Self {
        self.preference_debounce = delay;
        self
    }

    pub fn with_query_debounce(mut self, delay: Duration) -> Self {
        self.query_debounce = delay;
        self
    }

    pub fn with_row_height(mut self, row_height: f64) -> Self {
        self.row_height = row_height;
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn with_virtualization(mut self, virtualization: Virtualization) -> Self {
        self.virtualization = virtualization;
        self
    }

    pub fn with_virtualization_threshold(mut self, threshold: usize) -> Self {
        self.virtualization_threshold = threshold;
        self
    }

    pub fn with_role_preset_allowlist<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.role_preset_allowlist = roles.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_min_column_width(mut self, width: u16) -> Self {
        self.min_column_width = width;
        self
    }
}

/// Optional table features.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableFeatures {
    /// Row selection. Anything but `None` adds the selection column.
    pub selection: SelectionMode,
    /// Allow shift-click style additive sorting.
    pub multi_sort: bool,
    /// Persist layout per user.
    pub preferences: bool,
    /// Named presets.
    pub presets: bool,
    pub export: bool,
}

impl Default for TableFeatures {
    fn default() -> Self {
        Self {
            selection: SelectionMode::None,
            multi_sort: false,
            preferences: true,
            presets: true,
            export: true,
        }
    }
}

impl TableFeatures {
    pub fn with_selection(mut self, mode: SelectionMode) -> Self {
        self.selection = mode;
        self
    }

    pub fn with_multi_sort(mut self, enabled: bool) -> Self {
        self.multi_sort = enabled;
        self
    }

    pub fn with_preferences(mut self, enabled: bool) -> Self {
        self.preferences = enabled;
        self
    }

    pub fn with_presets(mut self, enabled: bool) -> Self {
        self.presets = enabled;
        self
    }

    pub fn with_export(mut self, enabled: bool) -> Self {
        self.export = enabled;
        self
    }
}
