//!
//! Popover placed relative to some trigger area.
//!
//! The popover has no state. The owning widget decides whether
//! it is visible, calls [Popover::layout] to get the area, renders
//! the popover there and puts its content into [Popover::inner].
//!
//! ```rust ignore
//! if state.popup_active {
//!     let popover = Popover::new()
//!         .placement(Placement::BelowOrAbove)
//!         .block(Block::bordered());
//!     let area = popover.layout(state.area, Size::new(30, 10), buf.area);
//!     (&popover).render(area, buf);
//!     render_content(popover.inner(area), buf, state);
//! }
//! ```
//!
use crate::_private::NonExhaustive;
use crate::util::{fallback_popup_style, reset_buf_area};
use ratatui::buffer::Buffer;
use ratatui::layout::{Rect, Size};
use ratatui::prelude::BlockExt;
use ratatui::style::Style;
use ratatui::widgets::{Block, Widget};
use std::cmp::max;

/// Placement relative to the trigger area.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Placement {
    /// Use the trigger area as is.
    None,
    /// Place above. Aligned left.
    Above,
    /// Place below. Aligned left.
    Below,
    /// Place left. Aligned top.
    Left,
    /// Place right. Aligned top.
    Right,
    /// Above or below dependent on available space. Aligned left.
    AboveOrBelow,
    /// Below or above dependent on available space. Aligned left.
    #[default]
    BelowOrAbove,
    /// Place at position (x,y).
    Position(u16, u16),
}

/// Popover widget.
#[derive(Debug, Default, Clone)]
pub struct Popover<'a> {
    style: Style,
    placement: Placement,
    offset: (i16, i16),
    boundary: Option<Rect>,
    block: Option<Block<'a>>,
}

/// Combined style.
#[derive(Debug, Clone)]
pub struct PopoverStyle {
    pub style: Style,
    pub offset: Option<(i16, i16)>,
    pub block: Option<Block<'static>>,
    pub placement: Option<Placement>,

    pub non_exhaustive: NonExhaustive,
}

impl Default for PopoverStyle {
    fn default() -> Self {
        Self {
            style: Default::default(),
            offset: None,
            block: None,
            placement: None,
            non_exhaustive: NonExhaustive,
        }
    }
}

impl<'a> Popover<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set all styles.
    pub fn styles(mut self, styles: PopoverStyle) -> Self {
        self.style = styles.style;
        if let Some(offset) = styles.offset {
            self.offset = offset;
        }
        if let Some(placement) = styles.placement {
            self.placement = placement;
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
        self.block = self.block.map(|v| v.style(self.style));
        self
    }

    /// Placement relative to the trigger.
    pub fn placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Extra offset applied after the placement.
    pub fn offset(mut self, offset: (i16, i16)) -> Self {
        self.offset = offset;
        self
    }

    /// Outer bounds for the popover. Defaults to the buffer area.
    pub fn boundary(mut self, boundary: Rect) -> Self {
        self.boundary = Some(boundary);
        self
    }

    /// Block.
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block.style(self.style));
        self
    }

    /// Area for the content.
    pub fn inner(&self, area: Rect) -> Rect {
        self.block.inner_if_some(area)
    }

    /// Calculate the popover area for content of the given size.
    ///
    /// The size is the size of the content, the block is added.
    /// The result is kept inside the boundary and shrunk if
    /// necessary.
    pub fn layout(&self, trigger: Rect, content: Size, buf_area: Rect) -> Rect {
        let block = crate::util::block_size(&self.block);
        let size = Size::new(
            content.width.saturating_add(block.width),
            content.height.saturating_add(block.height),
        );
        place(
            self.placement,
            trigger,
            size,
            self.offset,
            self.boundary.unwrap_or(buf_area),
        )
    }
}

impl Widget for &Popover<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        reset_buf_area(area, buf);
        if let Some(block) = &self.block {
            block.render(area, buf);
        } else {
            buf.set_style(area, fallback_popup_style(self.style));
        }
    }
}

impl Widget for Popover<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        (&self).render(area, buf);
    }
}

/// Place an area of the given size relative to the trigger.
pub fn place(
    placement: Placement,
    trigger: Rect,
    size: Size,
    offset: (i16, i16),
    boundary: Rect,
) -> Rect {
    let mut offset = offset;
    let mut area = match placement {
        Placement::None => Rect::new(trigger.x, trigger.y, size.width, size.height),
        Placement::Above => Rect::new(
            trigger.x,
            trigger.y.saturating_sub(size.height),
            size.width,
            size.height,
        ),
        Placement::Below => Rect::new(trigger.x, trigger.bottom(), size.width, size.height),
        Placement::Left => Rect::new(
            trigger.x.saturating_sub(size.width),
            trigger.y,
            size.width,
            size.height,
        ),
        Placement::Right => Rect::new(trigger.right(), trigger.y, size.width, size.height),
        Placement::Position(x, y) => Rect::new(x, y, size.width, size.height),
        Placement::AboveOrBelow => {
            if size.height.saturating_add_signed(-offset.1) <= trigger.y - boundary.y.min(trigger.y)
            {
                Rect::new(
                    trigger.x,
                    trigger.y.saturating_sub(size.height),
                    size.width,
                    size.height,
                )
            } else {
                offset = (offset.0, -offset.1);
                Rect::new(trigger.x, trigger.bottom(), size.width, size.height)
            }
        }
        Placement::BelowOrAbove => {
            if (trigger.bottom() + size.height).saturating_add_signed(offset.1) <= boundary.bottom()
            {
                Rect::new(trigger.x, trigger.bottom(), size.width, size.height)
            } else {
                offset = (offset.0, -offset.1);
                Rect::new(
                    trigger.x,
                    trigger.y.saturating_sub(size.height),
                    size.width,
                    size.height,
                )
            }
        }
    };

    area.x = area.x.saturating_add_signed(offset.0);
    area.y = area.y.saturating_add_signed(offset.1);

    // keep in sight
    if area.left() < boundary.left() {
        area.x = boundary.left();
    }
    if area.right() >= boundary.right() {
        let corr = area.right().saturating_sub(boundary.right());
        area.x = max(boundary.left(), area.x.saturating_sub(corr));
    }
    if area.top() < boundary.top() {
        area.y = boundary.top();
    }
    if area.bottom() >= boundary.bottom() {
        let corr = area.bottom().saturating_sub(boundary.bottom());
        area.y = max(boundary.top(), area.y.saturating_sub(corr));
    }

    // shrink to size
    if area.right() > boundary.right() {
        let corr = area.right() - boundary.right();
        area.width = area.width.saturating_sub(corr);
    }
    if area.bottom() > boundary.bottom() {
        let corr = area.bottom() - boundary.bottom();
        area.height = area.height.saturating_sub(corr);
    }

    area
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: Rect = Rect::new(0, 0, 80, 24);

    #[test]
    fn test_below_or_above() {
        let trigger = Rect::new(10, 2, 12, 1);
        let area = place(Placement::BelowOrAbove, trigger, Size::new(30, 10), (0, 0), SCREEN);
        assert_eq!(area, Rect::new(10, 3, 30, 10));

        let trigger = Rect::new(10, 20, 12, 1);
        let area = place(Placement::BelowOrAbove, trigger, Size::new(30, 10), (0, 0), SCREEN);
        assert_eq!(area, Rect::new(10, 10, 30, 10));
    }

    #[test]
    fn test_keep_in_sight() {
        let trigger = Rect::new(70, 2, 8, 1);
        let area = place(Placement::Below, trigger, Size::new(30, 10), (0, 0), SCREEN);
        assert_eq!(area, Rect::new(50, 3, 30, 10));

        let area = place(Placement::Below, trigger, Size::new(100, 40), (0, 0), SCREEN);
        assert_eq!(area, Rect::new(0, 0, 80, 24));
    }

    #[test]
    fn test_layout_adds_block() {
        let popover = Popover::new()
            .placement(Placement::Below)
            .block(Block::bordered());
        let area = popover.layout(Rect::new(0, 0, 10, 1), Size::new(28, 8), SCREEN);
        assert_eq!(area, Rect::new(0, 1, 30, 10));
        assert_eq!(popover.inner(area), Rect::new(1, 2, 28, 8));
    }

    #[test]
    fn test_render_clears() {
        let mut buf = Buffer::empty(SCREEN);
        buf.set_string(0, 1, "xxxxxxxx", Style::default());
        let popover = Popover::new();
        popover.render(Rect::new(0, 1, 4, 1), &mut buf);
        assert_eq!(buf.cell((0, 1)).map(|v| v.symbol()), Some(" "));
        assert_eq!(buf.cell((4, 1)).map(|v| v.symbol()), Some("x"));
    }
}
