//! Row virtualization.
//!
//! This module provides:
//! - `ScrollState`: scroll offset, viewport, and a pending request
//! - `ScrollRequest`: actions that can be requested on scroll state
//! - `Virtualizer`: the visible row window for a fixed row height

use crate::config::EngineConfig;
use crate::config::Virtualization;

// =============================================================================
// ScrollRequest
// =============================================================================

/// Actions that can be requested on scroll state.
///
/// Consumed by [`Virtualizer::process_scroll`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScrollRequest {
    /// Scroll by a relative amount in pixels (positive = down).
    Delta(f64),
    /// Scroll to an absolute offset.
    ToOffset(f64),
    /// Scroll to make the row at index visible.
    IntoView(usize),
    PageUp,
    PageDown,
    Home,
    End,
}

// =============================================================================
// ScrollState
// =============================================================================

/// Scroll position of the row container, in pixels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrollState {
    /// Current scroll offset from the top.
    pub offset: f64,

    /// Viewport height, reported by the host after layout.
    pub viewport: f64,

    /// Total content height.
    pub content_height: f64,

    request: Option<ScrollRequest>,
}

impl ScrollState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum scroll offset (content_height - viewport).
    pub fn max_offset(&self) -> f64 {
        (self.content_height - self.viewport).max(0.0)
    }

    /// Current scroll progress (0.0 = top, 1.0 = bottom).
    pub fn progress(&self) -> f64 {
        let max = self.max_offset();
        if max == 0.0 { 0.0 } else { self.offset / max }
    }

    /// Whether content exceeds viewport.
    pub fn can_scroll(&self) -> bool {
        self.content_height > self.viewport
    }

    pub fn scroll_by(&mut self, delta: f64) {
        self.request = Some(ScrollRequest::Delta(delta));
    }

    pub fn scroll_to(&mut self, offset: f64) {
        self.request = Some(ScrollRequest::ToOffset(offset));
    }

    pub fn scroll_into_view(&mut self, index: usize) {
        self.request = Some(ScrollRequest::IntoView(index));
    }

    pub fn page_up(&mut self) {
        self.request = Some(ScrollRequest::PageUp);
    }

    pub fn page_down(&mut self) {
        self.request = Some(ScrollRequest::PageDown);
    }

    pub fn home(&mut self) {
        self.request = Some(ScrollRequest::Home);
    }

    pub fn end(&mut self) {
        self.request = Some(ScrollRequest::End);
    }

    /// Take and clear the pending request.
    pub fn take_request(&mut self) -> Option<ScrollRequest> {
        self.request.take()
    }

    pub fn has_request(&self) -> bool {
        self.request.is_some()
    }

    pub fn set_viewport(&mut self, height: f64) {
        self.viewport = height.max(0.0);
        self.offset = self.offset.min(self.max_offset());
    }

    pub fn set_content_height(&mut self, height: f64) {
        self.content_height = height.max(0.0);
        // Clamp offset if content shrunk
        self.offset = self.offset.min(self.max_offset());
    }

    /// Apply a request to the offset.
    ///
    /// `IntoView` needs row geometry, so it is handed back unprocessed.
    pub fn apply_request(&mut self, request: ScrollRequest) -> Option<ScrollRequest> {
        let max = self.max_offset();
        match request {
            ScrollRequest::Delta(delta) => self.offset = (self.offset + delta).clamp(0.0, max),
            ScrollRequest::ToOffset(offset) => self.offset = offset.clamp(0.0, max),
            ScrollRequest::PageUp => self.offset = (self.offset - self.viewport).max(0.0),
            ScrollRequest::PageDown => self.offset = (self.offset + self.viewport).min(max),
            ScrollRequest::Home => self.offset = 0.0,
            ScrollRequest::End => self.offset = max,
            ScrollRequest::IntoView(_) => return Some(request),
        }
        None
    }
}

// =============================================================================
// Virtualizer
// =============================================================================

/// One materialized row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VirtualRow {
    /// Index into the current row model.
    pub index: usize,
    /// Distance from the top of the content, in pixels.
    pub offset: f64,
}

/// Contiguous slice of rows to materialize.
#[derive(Debug, Clone, PartialEq)]
pub struct RowWindow {
    /// First materialized index, overscan included.
    pub start: usize,
    /// One past the last materialized index.
    pub end: usize,
    /// First row intersecting the viewport.
    pub first_visible: usize,
    /// One past the last row intersecting the viewport.
    pub last_visible: usize,
    pub rows: Vec<VirtualRow>,
    pub total_height: f64,
    /// False when every row is materialized.
    pub virtualized: bool,
}

impl RowWindow {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Computes the visible row window for a fixed row height.
#[derive(Debug, Clone)]
pub struct Virtualizer {
    row_height: f64,
    overscan: usize,
    threshold: usize,
    mode: Virtualization,
    pub scroll: ScrollState,
}

impl Virtualizer {
    pub fn new(row_height: f64, overscan: usize, threshold: usize, mode: Virtualization) -> Self {
        Self {
            row_height: if row_height > 0.0 { row_height } else { 1.0 },
            overscan,
            threshold,
            mode,
            scroll: ScrollState::new(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.row_height,
            config.overscan,
            config.virtualization_threshold,
            config.virtualization,
        )
    }

    pub fn row_height(&self) -> f64 {
        self.row_height
    }

    pub fn overscan(&self) -> usize {
        self.overscan
    }

    /// Whether windowing applies to `row_count` rows.
    pub fn is_active(&self, row_count: usize) -> bool {
        match self.mode {
            Virtualization::On => true,
            Virtualization::Off => false,
            Virtualization::Auto => row_count > self.threshold,
        }
    }

    /// Update content height for a new row count.
    pub fn set_row_count(&mut self, row_count: usize) {
        self.scroll
            .set_content_height(row_count as f64 * self.row_height);
    }

    /// Y offset of the row at index.
    pub fn row_offset(&self, index: usize) -> f64 {
        index as f64 * self.row_height
    }

    /// Index of the row at the given Y offset.
    pub fn row_at_offset(&self, y: f64) -> usize {
        (y.max(0.0) / self.row_height).floor() as usize
    }

    /// Process a pending scroll request. Returns true if the offset moved.
    pub fn process_scroll(&mut self) -> bool {
        let old_offset = self.scroll.offset;

        if let Some(request) = self.scroll.take_request()
            && let Some(ScrollRequest::IntoView(index)) = self.scroll.apply_request(request)
        {
            let y = self.row_offset(index);
            let viewport = self.scroll.viewport;
            let offset = self.scroll.offset;

            if y < offset {
                self.scroll.offset = y;
            } else if y + self.row_height > offset + viewport {
                self.scroll.offset = (y + self.row_height - viewport).min(self.scroll.max_offset());
            }
        }

        self.scroll.offset != old_offset
    }

    /// Rows to materialize for `row_count` rows at the current scroll position.
    pub fn window(&self, row_count: usize) -> RowWindow {
        let total_height = row_count as f64 * self.row_height;

        if !self.is_active(row_count) || row_count == 0 {
            let rows = (0..row_count)
                .map(|index| VirtualRow {
                    index,
                    offset: self.row_offset(index),
                })
                .collect();
            return RowWindow {
                start: 0,
                end: row_count,
                first_visible: 0,
                last_visible: row_count,
                rows,
                total_height,
                virtualized: false,
            };
        }

        let max_offset = (total_height - self.scroll.viewport).max(0.0);
        let offset = self.scroll.offset.clamp(0.0, max_offset);

        let first_visible = self.row_at_offset(offset).min(row_count - 1);
        let bottom = offset + self.scroll.viewport;
        let last_visible = ((bottom / self.row_height).ceil() as usize)
            .clamp(first_visible + 1, row_count);

        let start = first_visible.saturating_sub(self.overscan);
        let end = (last_visible + self.overscan).min(row_count);

        let rows = (start..end)
            .map(|index| VirtualRow {
                index,
                offset: self.row_offset(index),
            })
            .collect();

        RowWindow {
            start,
            end,
            first_visible,
            last_visible,
            rows,
            total_height,
            virtualized: true,
        }
    }
}
