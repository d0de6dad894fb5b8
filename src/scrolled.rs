//!
//! Scroll container with a custom thumb.
//!
//! The container renders the block and the thumb column. The
//! content is rendered by the owner into [ScrollContainerState::inner],
//! starting with the line [ScrollContainerState::scroll_top].
//!
//! The thumb is shown when the mouse enters the area or when
//! the content is scrolled, and hidden when the mouse leaves.
//! While the thumb is dragged it stays visible.
//!
//! ```rust ignore
//! ScrollContainer::new()
//!     .content_len(24)
//!     .render(area, buf, &mut state.scroll);
//!
//! for (row, n) in (state.scroll.scroll_top..24).enumerate() {
//!     // render line n at state.scroll.inner.y + row
//! }
//! ```
//!
use crate::_private::NonExhaustive;
use crate::listener::{Drag, Listeners};
use crate::scrolled::event::ScrollOutcome;
use rat_event::{ct_event, HandleEvent, MouseOnly};
use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect};
use ratatui::prelude::BlockExt;
use ratatui::style::Style;
use ratatui::widgets::{Block, StatefulWidget, Widget};
use std::cmp::{max, min};

/// Scroll container widget.
#[derive(Debug, Default, Clone)]
pub struct ScrollContainer<'a> {
    style: Style,
    track_style: Option<Style>,
    thumb_style: Option<Style>,
    track_symbol: Option<&'a str>,
    thumb_symbol: Option<&'a str>,
    content_len: Option<usize>,
    block: Option<Block<'a>>,
}

/// Combined styles.
#[derive(Debug, Clone)]
pub struct ScrollContainerStyle {
    pub style: Style,
    pub track: Option<Style>,
    pub thumb: Option<Style>,
    pub track_symbol: Option<&'static str>,
    pub thumb_symbol: Option<&'static str>,
    pub block: Option<Block<'static>>,

    pub non_exhaustive: NonExhaustive,
}

/// How to get to a new scroll position.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    /// Jump.
    #[default]
    Instant,
    /// Move there over a few ticks.
    Smooth,
}

/// Size and position of the thumb as percentage of the track.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ThumbGeometry {
    pub height_pct: f64,
    pub top_pct: f64,
}

/// State & event-handling.
#[derive(Debug)]
pub struct ScrollContainerState {
    /// Complete area.
    /// __readonly__. renewed for each render.
    pub area: Rect,
    /// Area for the content.
    /// __readonly__. renewed for each render.
    pub inner: Rect,
    /// Column for the thumb.
    /// __readonly__. renewed for each render.
    pub track: Rect,
    /// Thumb. Empty if the thumb is hidden.
    /// __readonly__. renewed for each render.
    pub thumb: Rect,

    /// First visible line.
    /// __read+write__
    pub scroll_top: usize,
    /// Number of lines of the content.
    /// __read+write__
    pub content_len: usize,
    /// Number of visible lines.
    /// __read+write__ renewed for each render.
    pub viewport_len: usize,

    /// Thumb is visible.
    /// __read+write__
    pub visible: bool,
    /// Mouse is over the container.
    /// __read+write__
    pub hover: bool,

    /// Running drag of the thumb. Start row and scroll_top.
    pub drag: Option<Drag<(u16, usize)>>,
    /// Registry for the drag listener.
    /// __read+write__
    pub listeners: Listeners,
    /// Target of a running smooth scroll.
    pub animation: Option<usize>,

    pub non_exhaustive: NonExhaustive,
}

pub(crate) mod event {
    use rat_event::{ConsumedEvent, Outcome};

    /// Result of event-handling.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    pub enum ScrollOutcome {
        /// The given event was not handled at all.
        Continue,
        /// The event was handled, no repaint necessary.
        Unchanged,
        /// The event was handled, repaint necessary.
        Changed,
        /// The scroll position changed.
        Scrolled,
    }

    impl ConsumedEvent for ScrollOutcome {
        fn is_consumed(&self) -> bool {
            *self != ScrollOutcome::Continue
        }
    }

    impl From<bool> for ScrollOutcome {
        fn from(value: bool) -> Self {
            if value {
                ScrollOutcome::Changed
            } else {
                ScrollOutcome::Unchanged
            }
        }
    }

    impl From<ScrollOutcome> for Outcome {
        fn from(value: ScrollOutcome) -> Self {
            match value {
                ScrollOutcome::Continue => Outcome::Continue,
                ScrollOutcome::Unchanged => Outcome::Unchanged,
                ScrollOutcome::Changed => Outcome::Changed,
                ScrollOutcome::Scrolled => Outcome::Changed,
            }
        }
    }
}

/// Thumb height and top as percentages.
///
/// height = viewport / content, top = scroll_top / content.
/// Both are 0 for empty content, the height is capped at 100.
pub fn thumb_geometry(scroll_top: usize, content_len: usize, viewport_len: usize) -> ThumbGeometry {
    if content_len == 0 {
        return ThumbGeometry::default();
    }
    let content = content_len as f64;
    ThumbGeometry {
        height_pct: (viewport_len as f64 / content * 100.0).min(100.0),
        top_pct: (scroll_top as f64 / content * 100.0).min(100.0),
    }
}

impl Default for ScrollContainerStyle {
    fn default() -> Self {
        Self {
            style: Default::default(),
            track: None,
            thumb: None,
            track_symbol: None,
            thumb_symbol: None,
            block: None,
            non_exhaustive: NonExhaustive,
        }
    }
}

impl<'a> ScrollContainer<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set all styles.
    pub fn styles(mut self, styles: ScrollContainerStyle) -> Self {
        self.style = styles.style;
        if styles.track.is_some() {
            self.track_style = styles.track;
        }
        if styles.thumb.is_some() {
            self.thumb_style = styles.thumb;
        }
        if styles.track_symbol.is_some() {
            self.track_symbol = styles.track_symbol;
        }
        if styles.thumb_symbol.is_some() {
            self.thumb_symbol = styles.thumb_symbol;
        }
        if styles.block.is_some() {
            self.block = styles.block;
        }
        self.block = self.block.map(|v| v.style(self.style));
        self
    }

    /// Base style.
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self.block = self.block.map(|v| v.style(style));
        self
    }

    /// Style for the thumb column.
    pub fn track_style(mut self, style: Style) -> Self {
        self.track_style = Some(style);
        self
    }

    /// Style for the thumb.
    pub fn thumb_style(mut self, style: Style) -> Self {
        self.thumb_style = Some(style);
        self
    }

    /// Number of lines of the content.
    pub fn content_len(mut self, len: usize) -> Self {
        self.content_len = Some(len);
        self
    }

    /// Block.
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block.style(self.style));
        self
    }
}

impl StatefulWidget for &ScrollContainer<'_> {
    type State = ScrollContainerState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        render_ref(self, area, buf, state);
    }
}

impl StatefulWidget for ScrollContainer<'_> {
    type State = ScrollContainerState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        render_ref(&self, area, buf, state);
    }
}

fn render_ref(
    widget: &ScrollContainer<'_>,
    area: Rect,
    buf: &mut Buffer,
    state: &mut ScrollContainerState,
) {
    state.area = area;
    if let Some(content_len) = widget.content_len {
        state.content_len = content_len;
    }

    let inner = widget.block.inner_if_some(area);
    state.inner = Rect::new(
        inner.x,
        inner.y,
        inner.width.saturating_sub(1),
        inner.height,
    );
    state.track = Rect::new(
        inner.right().saturating_sub(1),
        inner.y,
        min(1, inner.width),
        inner.height,
    );
    state.viewport_len = state.inner.height as usize;
    // resize may change the limit
    state.scroll_top = min(state.scroll_top, state.max_scroll());

    if let Some(block) = &widget.block {
        block.render(area, buf);
    } else {
        buf.set_style(area, widget.style);
    }

    state.thumb = state.thumb_area();
    if state.visible && !state.thumb.is_empty() {
        let track_style = widget.track_style.unwrap_or(widget.style);
        let thumb_style = widget.thumb_style.unwrap_or(widget.style);
        let track_symbol = widget.track_symbol.unwrap_or("│");
        let thumb_symbol = widget.thumb_symbol.unwrap_or("┃");
        for y in state.track.top()..state.track.bottom() {
            if let Some(cell) = buf.cell_mut((state.track.x, y)) {
                if state.thumb.contains(Position::new(state.track.x, y)) {
                    cell.set_symbol(thumb_symbol);
                    cell.set_style(thumb_style);
                } else {
                    cell.set_symbol(track_symbol);
                    cell.set_style(track_style);
                }
            }
        }
    }
}

impl Default for ScrollContainerState {
    fn default() -> Self {
        Self {
            area: Default::default(),
            inner: Default::default(),
            track: Default::default(),
            thumb: Default::default(),
            scroll_top: 0,
            content_len: 0,
            viewport_len: 0,
            visible: false,
            hover: false,
            drag: None,
            listeners: Default::default(),
            animation: None,
            non_exhaustive: NonExhaustive,
        }
    }
}

impl ScrollContainerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a shared listener registry.
    pub fn with_listeners(listeners: Listeners) -> Self {
        Self {
            listeners,
            ..Default::default()
        }
    }

    pub fn clear_areas(&mut self) {
        self.area = Rect::default();
        self.inner = Rect::default();
        self.track = Rect::default();
        self.thumb = Rect::default();
    }

    /// Set content and viewport length.
    /// Render does this too.
    pub fn set_metrics(&mut self, content_len: usize, viewport_len: usize) {
        self.content_len = content_len;
        self.viewport_len = viewport_len;
        self.scroll_top = min(self.scroll_top, self.max_scroll());
    }

    /// Largest valid scroll_top.
    pub fn max_scroll(&self) -> usize {
        self.content_len.saturating_sub(self.viewport_len)
    }

    /// Current thumb geometry.
    pub fn geometry(&self) -> ThumbGeometry {
        thumb_geometry(self.scroll_top, self.content_len, self.viewport_len)
    }

    /// Thumb area derived from the geometry.
    fn thumb_area(&self) -> Rect {
        if self.track.is_empty() || self.content_len == 0 {
            return Rect::new(self.track.x, self.track.y, self.track.width, 0);
        }
        let g = self.geometry();
        let track_len = self.track.height as f64;
        let top = min(
            (g.top_pct / 100.0 * track_len).round() as u16,
            self.track.height.saturating_sub(1),
        );
        let len = max(1, (g.height_pct / 100.0 * track_len).round() as u16);
        let len = min(len, self.track.height - top);
        Rect::new(self.track.x, self.track.y + top, self.track.width, len)
    }

    /// Scroll to the position. Stops a smooth scroll.
    pub fn scroll_to(&mut self, pos: usize) -> bool {
        self.animation = None;
        self.set_scroll_top(pos)
    }

    fn set_scroll_top(&mut self, pos: usize) -> bool {
        let old = self.scroll_top;
        self.scroll_top = min(pos, self.max_scroll());
        old != self.scroll_top
    }

    /// Scroll by some lines.
    pub fn scroll_by(&mut self, delta: isize) -> bool {
        self.scroll_to(self.scroll_top.saturating_add_signed(delta))
    }

    /// Scroll position that centers the given line.
    pub fn center_offset(&self, index: usize) -> usize {
        let half = self.viewport_len.saturating_sub(1) / 2;
        min(index.saturating_sub(half), self.max_scroll())
    }

    /// Move the given line to the middle of the viewport.
    ///
    /// Instant jumps, Smooth starts an animation that [tick](Self::tick)
    /// advances. Returns true if anything changed or started.
    pub fn scroll_to_center(&mut self, index: usize, behavior: ScrollBehavior) -> bool {
        let target = self.center_offset(index);
        match behavior {
            ScrollBehavior::Instant => self.scroll_to(target),
            ScrollBehavior::Smooth => {
                if target == self.scroll_top {
                    self.animation = None;
                    false
                } else {
                    self.animation = Some(target);
                    true
                }
            }
        }
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Advance a smooth scroll by a third of the remaining distance,
    /// at least one line. Returns true if the position changed.
    pub fn tick(&mut self) -> bool {
        let Some(target) = self.animation else {
            return false;
        };
        let target = min(target, self.max_scroll());
        let dist = self.scroll_top.abs_diff(target);
        let step = max(1, dist / 3);
        let next = if self.scroll_top < target {
            self.scroll_top + min(step, dist)
        } else {
            self.scroll_top - min(step, dist)
        };
        if next == target {
            self.animation = None;
        }
        self.set_scroll_top(next)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Start dragging the thumb at the given row.
    pub fn start_drag(&mut self, row: u16) {
        self.animation = None;
        self.visible = true;
        self.drag = Some(self.listeners.drag("scroll-thumb", (row, self.scroll_top)));
    }

    /// Drag moved to the given row.
    ///
    /// scroll_top = start + delta * content / viewport
    pub fn drag_to(&mut self, row: u16) -> bool {
        let Some(drag) = &self.drag else {
            return false;
        };
        if self.viewport_len == 0 {
            return false;
        }
        let (start_row, start_top) = drag.start;
        let delta = row as f64 - start_row as f64;
        let pos = start_top as f64 + delta * self.content_len as f64 / self.viewport_len as f64;
        let pos = pos.round().max(0.0) as usize;
        self.set_scroll_top(pos)
    }

    /// End of the drag. The thumb hides if the mouse is elsewhere.
    pub fn end_drag(&mut self) -> bool {
        if self.drag.take().is_some() {
            if !self.hover {
                self.visible = false;
            }
            true
        } else {
            false
        }
    }

    fn set_hover(&mut self, hover: bool) -> bool {
        let old = (self.hover, self.visible);
        self.hover = hover;
        if hover {
            self.visible = true;
        } else if !self.is_dragging() {
            self.visible = false;
        }
        old != (self.hover, self.visible)
    }
}

impl HandleEvent<crossterm::event::Event, MouseOnly, ScrollOutcome> for ScrollContainerState {
    fn handle(&mut self, event: &crossterm::event::Event, _qualifier: MouseOnly) -> ScrollOutcome {
        match event {
            ct_event!(mouse moved for x,y) => {
                let hover = self.area.contains(Position::new(*x, *y));
                if self.set_hover(hover) {
                    ScrollOutcome::Changed
                } else {
                    ScrollOutcome::Continue
                }
            }
            ct_event!(scroll down for x,y) if self.area.contains(Position::new(*x, *y)) => {
                self.visible = true;
                if self.scroll_by(1) {
                    ScrollOutcome::Scrolled
                } else {
                    ScrollOutcome::Changed
                }
            }
            ct_event!(scroll up for x,y) if self.area.contains(Position::new(*x, *y)) => {
                self.visible = true;
                if self.scroll_by(-1) {
                    ScrollOutcome::Scrolled
                } else {
                    ScrollOutcome::Changed
                }
            }
            ct_event!(mouse down Left for x,y) if self.track.contains(Position::new(*x, *y)) => {
                let thumb = self.thumb_area();
                if thumb.contains(Position::new(*x, *y)) {
                    self.start_drag(*y);
                    ScrollOutcome::Changed
                } else {
                    let page = self.viewport_len as isize;
                    let r = if *y < thumb.y {
                        self.scroll_by(-page)
                    } else {
                        self.scroll_by(page)
                    };
                    self.visible = true;
                    if r {
                        ScrollOutcome::Scrolled
                    } else {
                        ScrollOutcome::Changed
                    }
                }
            }
            ct_event!(mouse drag Left for _x,y) if self.is_dragging() => {
                if self.drag_to(*y) {
                    ScrollOutcome::Scrolled
                } else {
                    ScrollOutcome::Unchanged
                }
            }
            ct_event!(mouse up Left for x,y) if self.is_dragging() => {
                self.hover = self.area.contains(Position::new(*x, *y));
                self.end_drag().into()
            }
            _ => ScrollOutcome::Continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry() {
        let g = thumb_geometry(10, 100, 20);
        assert_eq!(g.height_pct, 20.0);
        assert_eq!(g.top_pct, 10.0);

        let g = thumb_geometry(0, 0, 20);
        assert_eq!(g, ThumbGeometry::default());
        assert!(!g.height_pct.is_nan());

        let g = thumb_geometry(0, 5, 20);
        assert_eq!(g.height_pct, 100.0);
    }

    #[test]
    fn test_scroll_limits() {
        let mut state = ScrollContainerState::new();
        state.set_metrics(24, 7);
        assert_eq!(state.max_scroll(), 17);
        assert!(state.scroll_to(100));
        assert_eq!(state.scroll_top, 17);
        assert!(state.scroll_by(-20));
        assert_eq!(state.scroll_top, 0);
        assert!(!state.scroll_by(-1));
    }

    #[test]
    fn test_center() {
        let mut state = ScrollContainerState::new();
        state.set_metrics(60, 7);
        assert_eq!(state.center_offset(0), 0);
        assert_eq!(state.center_offset(2), 0);
        assert_eq!(state.center_offset(30), 27);
        assert_eq!(state.center_offset(59), 53);

        assert!(state.scroll_to_center(30, ScrollBehavior::Instant));
        assert_eq!(state.scroll_top, 27);
        assert!(!state.is_animating());
    }

    #[test]
    fn test_smooth() {
        let mut state = ScrollContainerState::new();
        state.set_metrics(60, 7);
        assert!(state.scroll_to_center(30, ScrollBehavior::Smooth));
        assert_eq!(state.scroll_top, 0);
        assert!(state.is_animating());

        let mut n = 0;
        while state.tick() {
            n += 1;
            assert!(n < 60);
        }
        assert_eq!(state.scroll_top, 27);
        assert!(!state.is_animating());
        assert!(n > 1);

        // same target does nothing
        assert!(!state.scroll_to_center(30, ScrollBehavior::Smooth));
    }

    #[test]
    fn test_drag() {
        let listeners = Listeners::new();
        let mut state = ScrollContainerState::with_listeners(listeners.clone());
        state.set_metrics(100, 20);
        state.scroll_to(10);

        state.start_drag(5);
        assert_eq!(listeners.len(), 1);
        assert!(state.drag_to(7));
        // d * H / V = 2 * 100 / 20
        assert_eq!(state.scroll_top, 20);
        assert!(state.drag_to(4));
        assert_eq!(state.scroll_top, 5);
        state.drag_to(0);
        assert_eq!(state.scroll_top, 0);
        state.drag_to(100);
        assert_eq!(state.scroll_top, 80);

        assert!(state.end_drag());
        assert!(listeners.is_empty());
        assert!(!state.visible);
        assert!(!state.drag_to(10));
    }
}
