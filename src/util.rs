//!
//! Small helpers.
//!
use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect, Size};
use ratatui::prelude::BlockExt;
use ratatui::style::{Style, Stylize};
use ratatui::widgets::Block;
use std::mem;

/// Returns a new style with fg and bg swapped.
///
/// This is not the same as setting Style::reversed().
/// The latter sends special controls to the terminal,
/// the former just swaps.
pub fn revert_style(mut style: Style) -> Style {
    if style.fg.is_some() || style.bg.is_some() {
        mem::swap(&mut style.fg, &mut style.bg);
        style
    } else {
        style.black().on_white()
    }
}

/// Fallback for popup style.
pub fn fallback_popup_style(style: Style) -> Style {
    if style.fg.is_some() || style.bg.is_some() {
        style
    } else {
        style.black().on_gray()
    }
}

/// Reset an area of the buffer.
pub fn reset_buf_area(area: Rect, buf: &mut Buffer) {
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.reset();
            }
        }
    }
}

/// Write a label clipped to the area and to the buffer.
/// The whole area gets the style.
pub fn render_label(buf: &mut Buffer, area: Rect, text: &str, style: Style) {
    let area = area.intersection(buf.area);
    if area.is_empty() {
        return;
    }
    buf.set_style(area, style);
    buf.set_stringn(area.x, area.y, text, area.width as usize, style);
}

/// Get the padding the block imposes as a Size.
pub fn block_size(block: &Option<Block<'_>>) -> Size {
    let area = Rect::new(0, 0, 20, 20);
    let inner = block.inner_if_some(area);
    Size {
        width: (inner.left() - area.left()) + (area.right() - inner.right()),
        height: (inner.top() - area.top()) + (area.bottom() - inner.bottom()),
    }
}

/// Index of the first area containing the position.
pub fn item_at(areas: &[Rect], x: u16, y: u16) -> Option<usize> {
    let pos = Position::new(x, y);
    areas.iter().position(|v| v.contains(pos))
}

/// Is the position inside any of the areas?
pub fn contains_any(areas: &[Rect], x: u16, y: u16) -> bool {
    item_at(areas, x, y).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_at() {
        let areas = [Rect::new(0, 0, 4, 1), Rect::new(4, 0, 4, 1)];
        assert_eq!(item_at(&areas, 0, 0), Some(0));
        assert_eq!(item_at(&areas, 5, 0), Some(1));
        assert_eq!(item_at(&areas, 8, 0), None);
        assert!(!contains_any(&areas, 0, 1));
    }

    #[test]
    fn test_render_label_clipped() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 5, 2));
        render_label(&mut buf, Rect::new(3, 1, 6, 1), "abcdef", Style::default());
        render_label(&mut buf, Rect::new(0, 4, 6, 1), "never", Style::default());
        assert_eq!(buf.cell((3, 1)).map(|v| v.symbol()), Some("a"));
        assert_eq!(buf.cell((4, 1)).map(|v| v.symbol()), Some("b"));
    }

    #[test]
    fn test_block_size() {
        assert_eq!(block_size(&None), Size::new(0, 0));
        assert_eq!(block_size(&Some(Block::bordered())), Size::new(2, 2));
    }
}
