//! Virtualized row window.
//!
//! Only the rows intersecting the viewport (plus `overscan` rows on each side)
//! are rendered. Spacers above and below stand in for the skipped rows so the
//! scroll height never changes:
//!
//! `spacer_above + rendered * row_height + spacer_below == len * row_height`
//!
//! Heights are integer pixels so the identity holds exactly.

use std::ops::Range;

use tabula_config::TableSettings;
use tabula_core::Density;

/// Scroll container geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub scroll_offset: u64,
    pub height: u64,
}

/// Rows to render and the spacer heights around them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSlice {
    /// First rendered index
    pub first: usize,
    /// One past the last rendered index
    pub last: usize,
    pub spacer_above: u64,
    pub spacer_below: u64,
    /// False when the whole list is rendered (fallback)
    pub virtualized: bool,
}

impl WindowSlice {
    fn full(len: usize) -> Self {
        Self {
            first: 0,
            last: len,
            spacer_above: 0,
            spacer_below: 0,
            virtualized: false,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.first..self.last
    }

    pub fn len(&self) -> usize {
        self.last - self.first
    }

    pub fn is_empty(&self) -> bool {
        self.first == self.last
    }

    /// The rendered items
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let last = self.last.min(items.len());
        &items[self.first.min(last)..last]
    }

    /// Spacers plus rendered rows
    pub fn total_height(&self, row_height: u32) -> u64 {
        self.spacer_above + self.len() as u64 * row_height as u64 + self.spacer_below
    }
}

/// Compute the render window for `len` fixed-height rows.
///
/// Falls back to the full, unvirtualized list when `row_height` is zero or
/// the container is not attached (`viewport` is `None`).
pub fn compute_window(len: usize, row_height: u32, viewport: Option<Viewport>, overscan: usize) -> WindowSlice {
    let Some(viewport) = viewport else {
        return WindowSlice::full(len);
    };
    if row_height == 0 {
        return WindowSlice::full(len);
    }

    let h = row_height as u64;
    let total = len as u64 * h;
    let top = viewport.scroll_offset.min(total);
    let bottom = top.saturating_add(viewport.height).min(total);

    let first_visible = (top / h) as usize;
    let last_visible = bottom.div_ceil(h) as usize;

    let first = first_visible.saturating_sub(overscan).min(len);
    let last = last_visible.saturating_add(overscan).min(len).max(first);

    WindowSlice {
        first,
        last,
        spacer_above: first as u64 * h,
        spacer_below: (len - last) as u64 * h,
        virtualized: true,
    }
}

/// Stateful driver for a virtualized table body.
///
/// Scroll events only record the latest offset; [`VirtualRows::frame`] is
/// called once per animation frame, applies it, and reports a new window only
/// when the visible range actually moved. Bursts of scroll events therefore
/// cost one recomputation per frame and no re-render inside a row.
#[derive(Debug, Clone)]
pub struct VirtualRows {
    len: usize,
    row_height: u32,
    overscan: usize,
    viewport: Option<Viewport>,
    pending_offset: Option<u64>,
    current: Option<WindowSlice>,
}

impl VirtualRows {
    pub fn new(row_height: u32, overscan: usize) -> Self {
        Self {
            len: 0,
            row_height,
            overscan,
            viewport: None,
            pending_offset: None,
            current: None,
        }
    }

    /// Row height for `density` and overscan from the settings file
    pub fn from_settings(settings: &TableSettings, density: Density) -> Self {
        Self::new(settings.row_height(density), settings.overscan)
    }

    /// Container mounted with the given viewport height
    pub fn attach(&mut self, height: u64) {
        let scroll_offset = self.viewport.map_or(0, |v| v.scroll_offset);
        self.viewport = Some(Viewport { scroll_offset, height });
        self.current = None;
    }

    pub fn detach(&mut self) {
        self.viewport = None;
        self.pending_offset = None;
        self.current = None;
    }

    /// Items identity changed
    pub fn set_len(&mut self, len: usize) {
        if len != self.len {
            self.len = len;
            self.current = None;
        }
    }

    /// Density changed
    pub fn set_row_height(&mut self, row_height: u32) {
        if row_height != self.row_height {
            self.row_height = row_height;
            self.current = None;
        }
    }

    pub fn row_height(&self) -> u32 {
        self.row_height
    }

    /// Record a scroll event. Cheap; no window computation happens here.
    pub fn on_scroll(&mut self, scroll_offset: u64) {
        self.pending_offset = Some(scroll_offset);
    }

    /// Apply pending input. Returns the new window when it differs from the
    /// last one returned, `None` when nothing needs re-rendering.
    pub fn frame(&mut self) -> Option<WindowSlice> {
        if let (Some(offset), Some(viewport)) = (self.pending_offset.take(), self.viewport.as_mut()) {
            viewport.scroll_offset = offset;
        }

        let window = self.window();
        if self.current == Some(window) {
            return None;
        }
        log::debug!("virtual rows: window {:?}", window.range());
        self.current = Some(window);
        Some(window)
    }

    /// Window for the current (applied) state
    pub fn window(&self) -> WindowSlice {
        compute_window(self.len, self.row_height, self.viewport, self.overscan)
    }
}
