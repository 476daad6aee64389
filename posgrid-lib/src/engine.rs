//! The table engine.
//!
//! [`DataTable`] owns the column model, the interactive state and exactly one
//! data driver (local pipeline or remote query emitter). Every mutator ends in
//! a sync step that recomputes rows, emits queries and schedules preference
//! writes as needed.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Deserialize;
use serde::Serialize;

use crate::column::ColumnDescriptor;
use crate::column::ColumnModel;
use crate::column::HeaderCell;
use crate::column::SELECTION_COLUMN_ID;
use crate::config::EngineConfig;
use crate::config::TableFeatures;
use crate::detail::Activation;
use crate::detail::ActivationOutcome;
use crate::detail::DetailBridge;
use crate::detail::DetailRenderer;
use crate::detail::RowClickCallback;
use crate::error::ColumnError;
use crate::error::PresetError;
use crate::identity::SessionContext;
use crate::identity::StaticSession;
use crate::identity::TableIdentity;
use crate::identity::derive_table_id;
use crate::mode::Mode;
use crate::pipeline::RowModel;
use crate::pipeline::RowPipeline;
use crate::preferences::PreferenceSync;
use crate::presets::Preset;
use crate::presets::PresetScope;
use crate::presets::PresetStore;
use crate::query::QueryCallback;
use crate::query::QueryDescriptor;
use crate::query::QueryEmitter;
use crate::row::TableRow;
use crate::selection::SelectionMode;
use crate::state::ColumnSort;
use crate::state::FilterValue;
use crate::state::PinSide;
use crate::state::TableState;
use crate::store::PreferenceBackend;
use crate::store::PresetBackend;
use crate::virtualizer::RowWindow;
use crate::virtualizer::Virtualizer;

/// Host callback for bulk actions: the action name and the selected rows.
pub type BulkActionCallback<T> = Arc<dyn Fn(&str, Vec<T>) + Send + Sync>;

/// Host callback performing an export.
pub type ExportCallback = Arc<dyn Fn(ExportRequest) -> BoxFuture<'static, ()> + Send + Sync>;

/// Export file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

/// What the host should export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub query: QueryDescriptor,
    /// Visible data columns in display order.
    pub columns: Vec<String>,
}

/// Callbacks supplied by the host. All optional.
///
/// Supplying `on_query_change` puts the table in remote mode.
pub struct TableCallbacks<T: TableRow> {
    pub on_row_click: Option<RowClickCallback<T>>,
    pub on_bulk_action: Option<BulkActionCallback<T>>,
    pub on_query_change: Option<QueryCallback>,
    pub on_export: Option<ExportCallback>,
    pub render_row_detail: Option<DetailRenderer<T>>,
}

impl<T: TableRow> Default for TableCallbacks<T> {
    fn default() -> Self {
        Self {
            on_row_click: None,
            on_bulk_action: None,
            on_query_change: None,
            on_export: None,
            render_row_detail: None,
        }
    }
}

impl<T: TableRow> TableCallbacks<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_row_click(mut self, f: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.on_row_click = Some(Arc::new(f));
        self
    }

    pub fn on_bulk_action(mut self, f: impl Fn(&str, Vec<T>) + Send + Sync + 'static) -> Self {
        self.on_bulk_action = Some(Arc::new(f));
        self
    }

    pub fn on_query_change(mut self, f: impl Fn(QueryDescriptor) + Send + Sync + 'static) -> Self {
        self.on_query_change = Some(Arc::new(f));
        self
    }

    pub fn on_export(
        mut self,
        f: impl Fn(ExportRequest) -> BoxFuture<'static, ()> + Send + Sync + 'static,
    ) -> Self {
        self.on_export = Some(Arc::new(f));
        self
    }

    pub fn render_row_detail(mut self, f: impl Fn(&T) -> String + Send + Sync + 'static) -> Self {
        self.render_row_detail = Some(Arc::new(f));
        self
    }
}

/// Builder for [`DataTable`].
///
/// # Example
///
/// ```ignore
/// let mut table = DataTable::builder(columns)
///     .data(rows)
///     .route("/inventory/items")
///     .session(Arc::new(StaticSession::new("acme", "u-17")))
///     .store(store)
///     .build()?;
/// table.mount().await;
/// ```
pub struct DataTableBuilder<T: TableRow> {
    columns: Vec<ColumnDescriptor<T>>,
    data: Vec<T>,
    features: TableFeatures,
    config: EngineConfig,
    callbacks: TableCallbacks<T>,
    table_id: Option<String>,
    route: String,
    session: Arc<dyn SessionContext>,
    preference_backend: Option<Arc<dyn PreferenceBackend>>,
    preset_backend: Option<Arc<dyn PresetBackend>>,
    total_count: Option<usize>,
    page_count: Option<usize>,
}

impl<T: TableRow> DataTableBuilder<T> {
    pub fn new(columns: Vec<ColumnDescriptor<T>>) -> Self {
        Self {
            columns,
            data: Vec::new(),
            features: TableFeatures::default(),
            config: EngineConfig::default(),
            callbacks: TableCallbacks::default(),
            table_id: None,
            route: String::new(),
            session: Arc::new(StaticSession::default()),
            preference_backend: None,
            preset_backend: None,
            total_count: None,
            page_count: None,
        }
    }

    pub fn data(mut self, rows: Vec<T>) -> Self {
        self.data = rows;
        self
    }

    pub fn features(mut self, features: TableFeatures) -> Self {
        self.features = features;
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn callbacks(mut self, callbacks: TableCallbacks<T>) -> Self {
        self.callbacks = callbacks;
        self
    }

    /// Use an explicit table id instead of deriving one from the route.
    pub fn table_id(mut self, table_id: impl Into<String>) -> Self {
        self.table_id = Some(table_id.into());
        self
    }

    /// Route the table is mounted on, used to derive the table id.
    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.route = route.into();
        self
    }

    pub fn session(mut self, session: Arc<dyn SessionContext>) -> Self {
        self.session = session;
        self
    }

    pub fn preferences(mut self, backend: Arc<dyn PreferenceBackend>) -> Self {
        self.preference_backend = Some(backend);
        self
    }

    pub fn presets(mut self, backend: Arc<dyn PresetBackend>) -> Self {
        self.preset_backend = Some(backend);
        self
    }

    /// Use one store for both preferences and presets.
    pub fn store<S>(self, store: Arc<S>) -> Self
    where
        S: PreferenceBackend + PresetBackend + 'static,
    {
        self.preferences(store.clone()).presets(store)
    }

    /// Total row count reported by the host in remote mode.
    pub fn total_count(mut self, total_count: usize) -> Self {
        self.total_count = Some(total_count);
        self
    }

    /// Page count reported by the host in remote mode.
    pub fn page_count(mut self, page_count: usize) -> Self {
        self.page_count = Some(page_count);
        self
    }

    /// Build the table.
    ///
    /// In remote mode the initial query emission is scheduled right away.
    /// Outside a tokio runtime it waits for [`DataTable::flush`] instead.
    pub fn build(self) -> Result<DataTable<T>, ColumnError> {
        let Self {
            columns,
            data,
            features,
            config,
            mut callbacks,
            table_id,
            route,
            session,
            preference_backend,
            preset_backend,
            total_count,
            page_count,
        } = self;

        let columns = ColumnModel::new(columns, features.selection != SelectionMode::None)?;
        let table_id = table_id.unwrap_or_else(|| {
            let keys: Vec<&str> = columns.data_leaf_ids().collect();
            derive_table_id(&route, &keys)
        });
        let identity = TableIdentity::for_session(table_id.clone(), session.as_ref());

        let mode = Mode::resolve(callbacks.on_query_change.as_ref());
        let driver = match callbacks.on_query_change.take() {
            Some(on_query_change) => Driver::Remote {
                rows: data,
                total_count,
                page_count,
                emitter: QueryEmitter::new(config.query_debounce, on_query_change),
            },
            None => Driver::Local {
                pipeline: RowPipeline::new(data),
                model: RowModel::default(),
            },
        };

        let preferences = preference_backend
            .filter(|_| features.preferences)
            .map(|backend| PreferenceSync::new(backend, identity.clone(), config.preference_debounce));
        let presets = preset_backend
            .filter(|_| features.presets)
            .map(|backend| PresetStore::new(backend, config.role_preset_allowlist.clone()));

        let mut table = DataTable {
            state: TableState::new(config.default_page_size, features.selection),
            virtualizer: Virtualizer::from_config(&config),
            detail: DetailBridge::new(callbacks.render_row_detail, callbacks.on_row_click),
            on_bulk_action: callbacks.on_bulk_action,
            on_export: callbacks.on_export,
            columns,
            config,
            features,
            mode,
            driver,
            preferences,
            presets,
            session,
            table_id,
            identity,
        };

        // Without persistence no load will seed the order.
        if table.preferences.is_none() {
            table.seed_order();
        }
        table.sync();

        log::debug!("Built table {} in {} mode", table.identity, table.mode);
        Ok(table)
    }
}

enum Driver<T: TableRow> {
    Local {
        pipeline: RowPipeline<T>,
        model: RowModel,
    },
    Remote {
        /// The current page as supplied by the host.
        rows: Vec<T>,
        total_count: Option<usize>,
        page_count: Option<usize>,
        emitter: QueryEmitter,
    },
}

/// A generic, virtualized data table.
pub struct DataTable<T: TableRow> {
    columns: ColumnModel<T>,
    state: TableState<T::Key>,
    config: EngineConfig,
    features: TableFeatures,
    mode: Mode,
    driver: Driver<T>,
    virtualizer: Virtualizer,
    preferences: Option<PreferenceSync>,
    presets: Option<PresetStore>,
    detail: DetailBridge<T>,
    on_bulk_action: Option<BulkActionCallback<T>>,
    on_export: Option<ExportCallback>,
    session: Arc<dyn SessionContext>,
    table_id: String,
    identity: TableIdentity,
}

impl<T: TableRow> DataTable<T> {
    pub fn builder(columns: Vec<ColumnDescriptor<T>>) -> DataTableBuilder<T> {
        DataTableBuilder::new(columns)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    pub fn identity(&self) -> &TableIdentity {
        &self.identity
    }

    pub fn columns(&self) -> &ColumnModel<T> {
        &self.columns
    }

    pub fn state(&self) -> &TableState<T::Key> {
        &self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn features(&self) -> &TableFeatures {
        &self.features
    }

    /// Whether the preference load attempt finished (always true without
    /// persistence).
    pub fn is_loaded(&self) -> bool {
        self.preferences.as_ref().is_none_or(PreferenceSync::is_loaded)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Load the stored preference and the preset list for the current
    /// identity.
    pub async fn mount(&mut self) {
        self.load_preferences().await;
        if let Some(presets) = &mut self.presets {
            presets.reload(&self.identity).await;
        }
    }

    /// Replace the session. If tenant or user changed, the pending preference
    /// write is dropped, the layout is reset, and everything is loaded again
    /// for the new identity.
    pub async fn set_session(&mut self, session: Arc<dyn SessionContext>) {
        self.session = session;
        let identity = TableIdentity::for_session(self.table_id.clone(), self.session.as_ref());
        if identity == self.identity {
            return;
        }

        log::debug!("Table identity changed: {} -> {}", self.identity, identity);
        self.identity = identity.clone();
        if let Some(sync) = &mut self.preferences {
            sync.set_identity(identity);
            self.state.reset_layout(self.config.default_page_size);
        }
        self.mount().await;
    }

    /// Deliver pending preference writes and query emissions now.
    pub async fn flush(&mut self) {
        if let Some(sync) = &mut self.preferences {
            sync.flush().await;
        }
        if let Driver::Remote { emitter, .. } = &mut self.driver {
            emitter.flush().await;
        }
    }

    /// Drop pending preference writes and query emissions.
    pub fn shutdown(&mut self) {
        if let Some(sync) = &mut self.preferences {
            sync.cancel();
        }
        if let Driver::Remote { emitter, .. } = &mut self.driver {
            emitter.cancel();
        }
    }

    async fn load_preferences(&mut self) {
        let loaded = match &mut self.preferences {
            Some(sync) => sync.load().await,
            None => None,
        };
        if let Some(preference) = loaded {
            self.state.apply_preference(&preference);
        }
        self.normalize_layout();

        if let Some(sync) = &mut self.preferences {
            sync.set_baseline(self.state.preference());
        }
        self.seed_order();
        self.sync();
    }

    /// First-run fallback: an empty order becomes the natural leaf order.
    fn seed_order(&mut self) {
        if self.state.order.is_empty() {
            log::debug!("Seeding column order for {}", self.identity);
            self.state.order = self.columns.leaf_ids().to_vec();
        }
    }

    /// Drop layout entries that do not fit the column model.
    fn normalize_layout(&mut self) {
        let columns = &self.columns;
        if !self.state.order.is_empty() {
            self.state.order = columns.normalize_order(&self.state.order);
        }
        self.state
            .pinning
            .retain_known(|id| columns.is_leaf(id) && id != SELECTION_COLUMN_ID);
        self.state
            .visibility
            .retain(|id, _| columns.is_hideable(id));
        self.state.sizing.retain(|id, _| columns.is_leaf(id));
        self.state
            .sorting
            .retain(|sort| columns.is_sortable(&sort.id));
    }

    /// Bring everything derived from state up to date.
    fn sync(&mut self) {
        self.normalize_layout();

        let columns = &self.columns;
        match &mut self.driver {
            Driver::Local { pipeline, model } => {
                let searchable: Vec<&str> = columns.data_leaf_ids().collect();
                *model = pipeline.compute(
                    &self.state,
                    &searchable,
                    |row, id| columns.display_text(row, id),
                    |id| columns.is_sortable(id),
                );
                self.state.page_index = model.page_index;
            }
            Driver::Remote {
                total_count,
                page_count,
                emitter,
                ..
            } => {
                if let Some(count) = remote_page_count(*total_count, *page_count, self.state.page_size) {
                    self.state.page_index = self.state.page_index.min(count - 1);
                }
                emitter.observe(&self.state);
            }
        }

        let row_count = self.row_count();
        self.virtualizer.set_row_count(row_count);

        if let Some(sync) = &mut self.preferences {
            sync.observe(self.state.preference());
        }
    }

    // =========================================================================
    // Data
    // =========================================================================

    /// Replace the rows. In remote mode these are the rows of the current
    /// page. The selection is kept.
    pub fn set_data(&mut self, rows: Vec<T>) {
        match &mut self.driver {
            Driver::Local { pipeline, .. } => pipeline.set_rows(rows),
            Driver::Remote { rows: current, .. } => *current = rows,
        }
        self.sync();
    }

    /// Update the totals reported by the host. Ignored in local mode.
    pub fn set_totals(&mut self, total: Option<usize>, pages: Option<usize>) -> bool {
        let Driver::Remote {
            total_count,
            page_count,
            ..
        } = &mut self.driver
        else {
            return false;
        };
        *total_count = total;
        *page_count = pages;
        self.sync();
        true
    }

    /// Rows of the current page in display order.
    pub fn page_rows(&self) -> Vec<&T> {
        match &self.driver {
            Driver::Local { pipeline, model } => model
                .indices
                .iter()
                .filter_map(|&index| pipeline.row(index))
                .collect(),
            Driver::Remote { rows, .. } => rows.iter().collect(),
        }
    }

    fn page_keys(&self) -> Vec<T::Key> {
        self.page_rows().into_iter().map(TableRow::key).collect()
    }

    /// Number of rows on the current page.
    pub fn row_count(&self) -> usize {
        match &self.driver {
            Driver::Local { model, .. } => model.indices.len(),
            Driver::Remote { rows, .. } => rows.len(),
        }
    }

    /// Rows matching the current query across all pages.
    pub fn filtered_count(&self) -> usize {
        match &self.driver {
            Driver::Local { model, .. } => model.filtered,
            Driver::Remote {
                rows, total_count, ..
            } => total_count.unwrap_or(rows.len()),
        }
    }

    /// Page count, if known. Always known in local mode.
    pub fn page_count(&self) -> Option<usize> {
        match &self.driver {
            Driver::Local { model, .. } => Some(model.page_count),
            Driver::Remote {
                total_count,
                page_count,
                ..
            } => remote_page_count(*total_count, *page_count, self.state.page_size),
        }
    }

    /// Display text of a cell, using the column renderer when one is set.
    pub fn render_cell(&self, row: &T, column_id: &str) -> String {
        self.columns.display_text(row, column_id)
    }

    fn find_row(&self, key: &T::Key) -> Option<&T> {
        let rows = match &self.driver {
            Driver::Local { pipeline, .. } => pipeline.rows(),
            Driver::Remote { rows, .. } => rows.as_slice(),
        };
        rows.iter().find(|row| &row.key() == key)
    }

    // =========================================================================
    // Search, filters, sorting, pagination
    // =========================================================================

    pub fn set_search(&mut self, search: impl Into<String>) -> bool {
        let changed = self.state.set_search(search);
        if changed {
            self.sync();
        }
        changed
    }

    pub fn set_filter(&mut self, column_id: &str, value: Option<FilterValue>) -> bool {
        if !self.columns.is_leaf(column_id) {
            return false;
        }
        let changed = self.state.set_filter(column_id, value);
        if changed {
            self.sync();
        }
        changed
    }

    pub fn clear_filters(&mut self) -> bool {
        let changed = self.state.clear_filters();
        if changed {
            self.sync();
        }
        changed
    }

    /// Cycle a column through ascending, descending and unsorted.
    ///
    /// `additive` keeps other sorted columns when multi-sort is enabled.
    pub fn toggle_sort(&mut self, column_id: &str, additive: bool) -> bool {
        if !self.columns.is_sortable(column_id) {
            return false;
        }
        self.state
            .toggle_sort(column_id, additive && self.features.multi_sort);
        self.sync();
        true
    }

    pub fn set_sorting(&mut self, mut sorting: Vec<ColumnSort>) -> bool {
        sorting.retain(|sort| self.columns.is_sortable(&sort.id));
        if !self.features.multi_sort {
            sorting.truncate(1);
        }
        let changed = self.state.set_sorting(sorting);
        if changed {
            self.sync();
        }
        changed
    }

    pub fn set_page_index(&mut self, page_index: usize) -> bool {
        let page_index = match self.page_count() {
            Some(count) => page_index.min(count - 1),
            None => page_index,
        };
        let changed = self.state.set_page_index(page_index);
        if changed {
            self.sync();
        }
        changed
    }

    /// Change the page size and return to the first page.
    pub fn set_page_size(&mut self, page_size: usize) -> bool {
        let changed = self.state.set_page_size(page_size);
        if changed {
            self.sync();
        }
        changed
    }

    pub fn can_previous_page(&self) -> bool {
        self.state.page_index > 0
    }

    /// Unknown page counts in remote mode allow paging forward.
    pub fn can_next_page(&self) -> bool {
        self.page_count()
            .is_none_or(|count| self.state.page_index + 1 < count)
    }

    pub fn next_page(&mut self) -> bool {
        self.can_next_page() && self.set_page_index(self.state.page_index + 1)
    }

    pub fn previous_page(&mut self) -> bool {
        self.can_previous_page() && self.set_page_index(self.state.page_index - 1)
    }

    pub fn first_page(&mut self) -> bool {
        self.set_page_index(0)
    }

    pub fn last_page(&mut self) -> bool {
        match self.page_count() {
            Some(count) => self.set_page_index(count - 1),
            None => false,
        }
    }

    // =========================================================================
    // Column layout
    // =========================================================================

    /// Effective leaf order: always a permutation of the leaf ids.
    pub fn column_order(&self) -> Vec<String> {
        self.columns.normalize_order(&self.state.order)
    }

    /// Visible leaves as displayed: left-pinned, unpinned, then right-pinned.
    pub fn visible_columns(&self) -> Vec<String> {
        let order = self.column_order();
        let pinning = &self.state.pinning;
        let visible = |id: &&String| self.state.is_visible(id);

        let left = pinning.left.iter().filter(visible);
        let center = order
            .iter()
            .filter(|id| pinning.side(id).is_none())
            .filter(visible);
        let right = pinning.right.iter().filter(visible);

        // The selection column is never pinned, keep it in front.
        let mut columns: Vec<String> = Vec::with_capacity(order.len());
        if self.columns.has_selection() {
            columns.push(SELECTION_COLUMN_ID.to_string());
        }
        columns.extend(
            left.chain(center)
                .chain(right)
                .filter(|id| *id != SELECTION_COLUMN_ID)
                .cloned(),
        );
        columns
    }

    /// Header rows for the visible columns.
    pub fn header_groups(&self) -> Vec<Vec<HeaderCell>> {
        self.columns.header_groups(&self.visible_columns())
    }

    pub fn set_column_visibility(&mut self, column_id: &str, visible: bool) -> bool {
        if !self.columns.is_hideable(column_id) {
            return false;
        }
        let changed = self.state.set_visibility(column_id, visible);
        if changed {
            self.sync();
        }
        changed
    }

    pub fn toggle_column_visibility(&mut self, column_id: &str) -> bool {
        let visible = self.state.is_visible(column_id);
        self.set_column_visibility(column_id, !visible)
    }

    /// Move a leaf to position `to` in the order. The selection column keeps
    /// position zero.
    pub fn move_column(&mut self, column_id: &str, to: usize) -> bool {
        if !self.columns.is_reorderable(column_id) {
            return false;
        }
        self.state.order = self.column_order();
        let to = if self.columns.has_selection() { to.max(1) } else { to };
        let changed = self.state.move_column(column_id, to);
        if changed {
            self.sync();
        }
        changed
    }

    /// Pin a data column to a side, or unpin it with `None`.
    pub fn pin_column(&mut self, column_id: &str, side: Option<PinSide>) -> bool {
        if !self.columns.is_leaf(column_id) || column_id == SELECTION_COLUMN_ID {
            return false;
        }
        let changed = self.state.pin(column_id, side);
        if changed {
            self.sync();
        }
        changed
    }

    /// Resize a leaf. Widths below the configured minimum are raised to it.
    pub fn resize_column(&mut self, column_id: &str, width: u16) -> bool {
        if !self.columns.is_leaf(column_id) {
            return false;
        }
        let changed = self
            .state
            .resize(column_id, width.max(self.config.min_column_width));
        if changed {
            self.sync();
        }
        changed
    }

    /// Current width of a leaf: the resized width, else its hint.
    pub fn column_width(&self, column_id: &str) -> Option<u16> {
        self.state
            .sizing
            .get(column_id)
            .copied()
            .or_else(|| self.columns.width_hint(column_id))
    }

    /// Return visibility, order, pinning, sizing and page size to defaults.
    pub fn reset_layout(&mut self) {
        self.state.reset_layout(self.config.default_page_size);
        self.seed_order();
        self.sync();
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn selection_mode(&self) -> SelectionMode {
        self.state.selection.mode()
    }

    /// Toggle a row of the current page. Keys not on the page are ignored.
    pub fn toggle_row(&mut self, key: T::Key) -> bool {
        if !self.page_keys().contains(&key) {
            return false;
        }
        self.state.selection.toggle(key)
    }

    /// Select every row on the current page. Returns how many were added.
    pub fn select_all_on_page(&mut self) -> usize {
        let keys = self.page_keys();
        self.state.selection.select_all(keys)
    }

    /// Deselect the page if it is fully selected, select it otherwise.
    pub fn toggle_all_on_page(&mut self) -> bool {
        let keys = self.page_keys();
        if self.state.selection.contains_all(&keys) {
            self.state.selection.deselect_all(&keys) > 0
        } else {
            self.state.selection.select_all(keys) > 0
        }
    }

    pub fn clear_selection(&mut self) -> usize {
        self.state.selection.clear()
    }

    pub fn is_selected(&self, key: &T::Key) -> bool {
        self.state.selection.is_selected(key)
    }

    pub fn is_all_page_selected(&self) -> bool {
        self.state.selection.contains_all(&self.page_keys())
    }

    pub fn selected_count(&self) -> usize {
        self.state.selection.len()
    }

    /// Selected rows of the current page, in display order.
    ///
    /// Keys selected on other pages stay selected but are not realized.
    pub fn selected_rows(&self) -> Vec<T> {
        self.state.selection.realize(self.page_rows())
    }

    /// Hand the selected rows to the bulk-action callback.
    ///
    /// Returns the number of rows dispatched. Nothing is dispatched without a
    /// callback or a selection.
    pub fn bulk_action(&self, action: &str) -> usize {
        let Some(on_bulk_action) = &self.on_bulk_action else {
            return 0;
        };
        let rows = self.selected_rows();
        if rows.is_empty() {
            return 0;
        }
        let count = rows.len();
        log::debug!("Dispatching bulk action {:?} for {} rows", action, count);
        on_bulk_action(action, rows);
        count
    }

    // =========================================================================
    // Detail
    // =========================================================================

    /// Activate a row of the current page.
    pub fn activate_row(&mut self, key: &T::Key, activation: Activation) -> ActivationOutcome {
        let row = self
            .page_rows()
            .into_iter()
            .find(|row| &row.key() == key)
            .cloned();
        match row {
            Some(row) => self.detail.activate(&row, activation),
            None => ActivationOutcome::Ignored,
        }
    }

    pub fn close_detail(&mut self) -> bool {
        self.detail.close()
    }

    /// The row the detail panel is bound to, if it is still in the data.
    pub fn detail_row(&self) -> Option<&T> {
        self.detail.open_key().and_then(|key| self.find_row(key))
    }

    pub fn render_detail(&self) -> Option<String> {
        self.detail_row().and_then(|row| self.detail.render(row))
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Descriptor an export would use.
    pub fn export_descriptor(&self) -> QueryDescriptor {
        match &self.driver {
            Driver::Remote { emitter, .. } => emitter
                .memoized()
                .cloned()
                .unwrap_or_else(|| QueryDescriptor::from_state(&self.state)),
            Driver::Local { .. } => QueryDescriptor::from_state(&self.state),
        }
    }

    /// Ask the host to export. Returns false when export is disabled or no
    /// callback is configured.
    pub async fn export(&self, format: ExportFormat) -> bool {
        if !self.features.export {
            return false;
        }
        let Some(on_export) = &self.on_export else {
            return false;
        };

        let request = ExportRequest {
            format,
            query: self.export_descriptor(),
            columns: self
                .visible_columns()
                .into_iter()
                .filter(|id| id != SELECTION_COLUMN_ID)
                .collect(),
        };
        log::debug!("Exporting {} as {:?}", self.identity, format);
        on_export(request).await;
        true
    }

    // =========================================================================
    // Presets
    // =========================================================================

    pub fn presets(&self) -> &[Preset] {
        self.presets
            .as_ref()
            .map(PresetStore::presets)
            .unwrap_or_default()
    }

    pub fn can_save_preset(&self, scope: PresetScope) -> bool {
        self.presets
            .as_ref()
            .is_some_and(|store| store.can_save(scope, self.session.role().as_deref()))
    }

    /// Save the entire current state as a preset.
    pub async fn save_preset(&mut self, name: &str, scope: PresetScope) -> Result<Preset, PresetError> {
        let Some(store) = &mut self.presets else {
            return Err(PresetError::Disabled);
        };
        let role = self.session.role();
        store
            .save(&self.identity, role.as_deref(), name, scope, self.state.snapshot())
            .await
    }

    /// Apply a preset by id. Returns false if it is not in the list.
    pub fn apply_preset(&mut self, preset_id: &str) -> bool {
        let Some(snapshot) = self
            .presets
            .as_ref()
            .and_then(|store| store.find(preset_id))
            .map(|preset| preset.state.clone())
        else {
            return false;
        };
        self.state.apply_snapshot(&snapshot);
        self.sync();
        true
    }

    // =========================================================================
    // Virtualization
    // =========================================================================

    pub fn virtualizer(&self) -> &Virtualizer {
        &self.virtualizer
    }

    pub fn virtualizer_mut(&mut self) -> &mut Virtualizer {
        &mut self.virtualizer
    }

    pub fn set_viewport(&mut self, height: f64) {
        self.virtualizer.scroll.set_viewport(height);
    }

    /// Apply a pending scroll request. Returns true if the offset moved.
    pub fn process_scroll(&mut self) -> bool {
        self.virtualizer.process_scroll()
    }

    /// Rows of the current page to materialize.
    pub fn row_window(&self) -> RowWindow {
        self.virtualizer.window(self.row_count())
    }

    /// Request a scroll bringing the row into view. Returns false if the row
    /// is not on the current page.
    pub fn scroll_row_into_view(&mut self, key: &T::Key) -> bool {
        let Some(index) = self.page_rows().iter().position(|row| &row.key() == key) else {
            return false;
        };
        self.virtualizer.scroll.scroll_into_view(index);
        true
    }
}

fn remote_page_count(
    total_count: Option<usize>,
    page_count: Option<usize>,
    page_size: usize,
) -> Option<usize> {
    page_count
        .or_else(|| total_count.map(|total| total.div_ceil(page_size.max(1))))
        .map(|count| count.max(1))
}
