//!
//! Single line text input.
//!
//! Used for the login fields and as the text part of the date
//! and time picker. Optionally masks its content and limits the
//! number of characters.
//!
//! ```rust ignore
//! TextField::new()
//!     .placeholder("Username")
//!     .styles(theme.text_style())
//!     .render(area, buf, &mut state.username);
//! if let Some((x, y)) = state.username.screen_cursor() {
//!     frame.set_cursor_position((x, y));
//! }
//! ```
//!
use crate::_private::NonExhaustive;
use crate::text_field::event::TextOutcome;
use rat_event::{ct_event, HandleEvent, MouseOnly, Regular};
use rat_focus::{FocusBuilder, FocusFlag, HasFocus};
use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect};
use ratatui::prelude::BlockExt;
use ratatui::style::{Style, Stylize};
use ratatui::widgets::{Block, StatefulWidget, Widget};

/// Text field widget.
#[derive(Debug, Default, Clone)]
pub struct TextField<'a> {
    style: Style,
    focus_style: Option<Style>,
    invalid_style: Option<Style>,
    placeholder_style: Option<Style>,
    placeholder: Option<&'a str>,
    block: Option<Block<'a>>,
}

/// Combined style.
#[derive(Debug, Clone)]
pub struct TextFieldStyle {
    pub style: Style,
    pub focus: Option<Style>,
    pub invalid: Option<Style>,
    pub placeholder: Option<Style>,
    pub block: Option<Block<'static>>,

    pub non_exhaustive: NonExhaustive,
}

/// State & event-handling.
#[derive(Debug)]
pub struct TextFieldState {
    /// Complete area.
    /// __readonly__. renewed for each render.
    pub area: Rect,
    /// Text area.
    /// __readonly__. renewed for each render.
    pub inner: Rect,

    /// Display offset in chars.
    /// __readonly__. renewed for each render.
    pub offset: usize,
    /// Cursor position in chars.
    /// __read+write__
    pub cursor: usize,

    /// Maximum number of chars.
    /// __read+write__
    pub max_len: Option<usize>,
    /// Show this char instead of the content.
    /// __read+write__
    pub mask: Option<char>,
    /// Accepted chars.
    /// __read+write__
    pub filter: Option<fn(char) -> bool>,
    /// Content is marked as invalid.
    /// __read+write__
    pub invalid: bool,

    /// Current focus state.
    /// __read+write__
    pub focus: FocusFlag,

    value: String,

    pub non_exhaustive: NonExhaustive,
}

pub(crate) mod event {
    use rat_event::{ConsumedEvent, Outcome};

    /// Result of event-handling.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    pub enum TextOutcome {
        /// The given event has not been used at all.
        Continue,
        /// The event has been recognized, but the result was nil.
        Unchanged,
        /// The event has been recognized and there is some change
        /// due to it.
        Changed,
        /// Text content has changed.
        TextChanged,
    }

    impl ConsumedEvent for TextOutcome {
        fn is_consumed(&self) -> bool {
            *self != TextOutcome::Continue
        }
    }

    impl From<bool> for TextOutcome {
        fn from(value: bool) -> Self {
            if value {
                TextOutcome::Changed
            } else {
                TextOutcome::Unchanged
            }
        }
    }

    impl From<TextOutcome> for Outcome {
        fn from(value: TextOutcome) -> Self {
            match value {
                TextOutcome::Continue => Outcome::Continue,
                TextOutcome::Unchanged => Outcome::Unchanged,
                TextOutcome::Changed => Outcome::Changed,
                TextOutcome::TextChanged => Outcome::Changed,
            }
        }
    }
}

impl Default for TextFieldStyle {
    fn default() -> Self {
        Self {
            style: Default::default(),
            focus: None,
            invalid: None,
            placeholder: None,
            block: None,
            non_exhaustive: NonExhaustive,
        }
    }
}

impl<'a> TextField<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set all styles.
    pub fn styles(mut self, styles: TextFieldStyle) -> Self {
        self.style = styles.style;
        if styles.focus.is_some() {
            self.focus_style = styles.focus;
        }
        if styles.invalid.is_some() {
            self.invalid_style = styles.invalid;
        }
        if styles.placeholder.is_some() {
            self.placeholder_style = styles.placeholder;
        }
        if styles.block.is_some() {
            self.block = styles.block;
        }
        self.block = self.block.map(|v| v.style(self.style));
        self
    }

    /// Base style.
    pub fn style(mut self, style: impl Into<Style>) -> Self {
        self.style = style.into();
        self.block = self.block.map(|v| v.style(self.style));
        self
    }

    /// Style when focused.
    pub fn focus_style(mut self, style: impl Into<Style>) -> Self {
        self.focus_style = Some(style.into());
        self
    }

    /// Style for invalid content.
    pub fn invalid_style(mut self, style: impl Into<Style>) -> Self {
        self.invalid_style = Some(style.into());
        self
    }

    /// Text shown while the field is empty.
    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    /// Block.
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block.style(self.style));
        self
    }
}

impl StatefulWidget for &TextField<'_> {
    type State = TextFieldState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        render_ref(self, area, buf, state);
    }
}

impl StatefulWidget for TextField<'_> {
    type State = TextFieldState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        render_ref(&self, area, buf, state);
    }
}

fn render_ref(widget: &TextField<'_>, area: Rect, buf: &mut Buffer, state: &mut TextFieldState) {
    state.area = area;
    state.inner = widget.block.inner_if_some(area);

    // keep the cursor visible
    let width = state.inner.width as usize;
    if width > 0 {
        if state.cursor < state.offset {
            state.offset = state.cursor;
        } else if state.cursor >= state.offset + width {
            state.offset = state.cursor + 1 - width;
        }
    } else {
        state.offset = 0;
    }

    let mut style = widget.style;
    if state.is_focused() {
        style = style.patch(widget.focus_style.unwrap_or_default());
    }
    if state.invalid {
        style = style.patch(widget.invalid_style.unwrap_or_else(|| Style::new().red()));
    }

    if let Some(block) = &widget.block {
        block.render(area, buf);
    }
    buf.set_style(state.inner, style);

    if state.value.is_empty() {
        if let Some(placeholder) = widget.placeholder {
            let placeholder_style = widget
                .placeholder_style
                .unwrap_or_else(|| style.dim());
            buf.set_stringn(
                state.inner.x,
                state.inner.y,
                placeholder,
                width,
                placeholder_style,
            );
        }
    } else {
        let shown = state.display_text();
        let visible = shown.chars().skip(state.offset).take(width).collect::<String>();
        buf.set_stringn(state.inner.x, state.inner.y, visible, width, style);
    }
}

impl Default for TextFieldState {
    fn default() -> Self {
        Self {
            area: Default::default(),
            inner: Default::default(),
            offset: 0,
            cursor: 0,
            max_len: None,
            mask: None,
            filter: None,
            invalid: false,
            focus: Default::default(),
            value: Default::default(),
            non_exhaustive: NonExhaustive,
        }
    }
}

impl HasFocus for TextFieldState {
    fn build(&self, builder: &mut FocusBuilder) {
        builder.leaf_widget(self);
    }

    fn focus(&self) -> FocusFlag {
        self.focus.clone()
    }

    fn area(&self) -> Rect {
        self.area
    }
}

impl TextFieldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: &str) -> Self {
        Self {
            focus: FocusFlag::new().with_name(name),
            ..Default::default()
        }
    }

    /// Limit the length.
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = Some(max_len);
        self
    }

    /// Show the mask char instead of the content.
    pub fn with_mask(mut self, mask: char) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Only accept chars passing the filter.
    pub fn with_filter(mut self, filter: fn(char) -> bool) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn clear_areas(&mut self) {
        self.area = Rect::default();
        self.inner = Rect::default();
    }

    pub fn value(&self) -> &str {
        self.value.as_str()
    }

    /// Length in chars.
    pub fn len(&self) -> usize {
        self.value.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Set the text. Truncates to max_len and moves the cursor
    /// to the end. No filter is applied.
    pub fn set_value(&mut self, value: impl Into<String>) {
        let mut value = value.into();
        if let Some(max_len) = self.max_len {
            value = value.chars().take(max_len).collect();
        }
        self.value = value;
        self.cursor = self.len();
        self.offset = 0;
    }

    pub fn clear(&mut self) -> bool {
        if self.value.is_empty() {
            false
        } else {
            self.value.clear();
            self.cursor = 0;
            self.offset = 0;
            true
        }
    }

    /// Text as displayed.
    pub fn display_text(&self) -> String {
        match self.mask {
            Some(mask) => self.value.chars().map(|_| mask).collect(),
            None => self.value.clone(),
        }
    }

    fn byte_pos(&self, char_pos: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    /// Insert a char at the cursor.
    pub fn insert_char(&mut self, c: char) -> bool {
        if c.is_control() {
            return false;
        }
        if let Some(filter) = self.filter {
            if !filter(c) {
                return false;
            }
        }
        if let Some(max_len) = self.max_len {
            if self.len() >= max_len {
                return false;
            }
        }
        let pos = self.byte_pos(self.cursor);
        self.value.insert(pos, c);
        self.cursor += 1;
        true
    }

    /// Insert a string at the cursor.
    /// Line breaks are dropped, the rest goes through the filter.
    pub fn insert_str(&mut self, s: &str) -> bool {
        let mut changed = false;
        for c in s.chars() {
            changed |= self.insert_char(c);
        }
        changed
    }

    pub fn delete_prev_char(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let pos = self.byte_pos(self.cursor - 1);
        self.value.remove(pos);
        self.cursor -= 1;
        true
    }

    pub fn delete_next_char(&mut self) -> bool {
        if self.cursor >= self.len() {
            return false;
        }
        let pos = self.byte_pos(self.cursor);
        self.value.remove(pos);
        true
    }

    /// Set the cursor. Clamped to the text.
    pub fn set_cursor(&mut self, cursor: usize) -> bool {
        let old = self.cursor;
        self.cursor = cursor.min(self.len());
        old != self.cursor
    }

    pub fn move_left(&mut self) -> bool {
        self.set_cursor(self.cursor.saturating_sub(1))
    }

    pub fn move_right(&mut self) -> bool {
        self.set_cursor(self.cursor + 1)
    }

    /// Set the cursor from a screen column relative to the text area.
    pub fn set_screen_cursor(&mut self, col: u16) -> bool {
        self.set_cursor(self.offset + col as usize)
    }

    /// Cursor position on screen, if focused.
    pub fn screen_cursor(&self) -> Option<(u16, u16)> {
        if self.is_focused() && !self.inner.is_empty() {
            let col = self.cursor.saturating_sub(self.offset) as u16;
            Some((
                self.inner.x + col.min(self.inner.width.saturating_sub(1)),
                self.inner.y,
            ))
        } else {
            None
        }
    }
}

impl HandleEvent<crossterm::event::Event, Regular, TextOutcome> for TextFieldState {
    fn handle(&mut self, event: &crossterm::event::Event, _keymap: Regular) -> TextOutcome {
        fn tc(r: bool) -> TextOutcome {
            if r {
                TextOutcome::TextChanged
            } else {
                TextOutcome::Unchanged
            }
        }

        let r = if self.is_focused() {
            match event {
                ct_event!(key press c) | ct_event!(key press SHIFT-c) => tc(self.insert_char(*c)),
                ct_event!(keycode press Backspace) => tc(self.delete_prev_char()),
                ct_event!(keycode press Delete) => tc(self.delete_next_char()),
                ct_event!(keycode press Left) => self.move_left().into(),
                ct_event!(keycode press Right) => self.move_right().into(),
                ct_event!(keycode press Home) => self.set_cursor(0).into(),
                ct_event!(keycode press End) => self.set_cursor(self.len()).into(),
                crossterm::event::Event::Paste(s) => tc(self.insert_str(s)),
                _ => TextOutcome::Continue,
            }
        } else {
            TextOutcome::Continue
        };

        if r == TextOutcome::Continue {
            self.handle(event, MouseOnly)
        } else {
            r
        }
    }
}

impl HandleEvent<crossterm::event::Event, MouseOnly, TextOutcome> for TextFieldState {
    fn handle(&mut self, event: &crossterm::event::Event, _keymap: MouseOnly) -> TextOutcome {
        match event {
            ct_event!(mouse down Left for column,row)
                if self.inner.contains(Position::new(*column, *row)) =>
            {
                self.set_screen_cursor(column - self.inner.x).into()
            }
            _ => TextOutcome::Continue,
        }
    }
}

/// Handle all events.
/// Text events are only processed if focus is true.
/// Mouse events are processed if they are in range.
pub fn handle_events(
    state: &mut TextFieldState,
    focus: bool,
    event: &crossterm::event::Event,
) -> TextOutcome {
    state.focus.set(focus);
    state.handle(event, Regular)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn test_edit() {
        let mut state = TextFieldState::new();
        for c in "helo".chars() {
            assert_eq!(
                handle_events(&mut state, true, &key(KeyCode::Char(c))),
                TextOutcome::TextChanged
            );
        }
        handle_events(&mut state, true, &key(KeyCode::Left));
        handle_events(&mut state, true, &key(KeyCode::Char('l')));
        assert_eq!(state.value(), "hello");

        handle_events(&mut state, true, &key(KeyCode::Home));
        handle_events(&mut state, true, &key(KeyCode::Delete));
        assert_eq!(state.value(), "ello");
        assert_eq!(
            handle_events(&mut state, true, &key(KeyCode::Backspace)),
            TextOutcome::Unchanged
        );

        assert_eq!(
            handle_events(&mut state, false, &key(KeyCode::Char('x'))),
            TextOutcome::Continue
        );
    }

    #[test]
    fn test_max_len_and_mask() {
        let mut state = TextFieldState::new().with_max_len(3).with_mask('*');
        state.focus.set(true);
        assert!(state.insert_str("secret"));
        assert_eq!(state.value(), "sec");
        assert_eq!(state.display_text(), "***");

        state.set_value("abcdef");
        assert_eq!(state.value(), "abc");
        assert_eq!(state.cursor, 3);
    }

    #[test]
    fn test_filter_and_paste() {
        let mut state = TextFieldState::new().with_filter(|c| c.is_ascii_digit() || c == '-');
        let r = handle_events(&mut state, true, &Event::Paste("2024-0a7-1\n0".into()));
        assert_eq!(r, TextOutcome::TextChanged);
        assert_eq!(state.value(), "2024-07-10");
    }

    #[test]
    fn test_render_scrolls() {
        let mut state = TextFieldState::new();
        state.focus.set(true);
        state.set_value("0123456789");
        let mut buf = Buffer::empty(Rect::new(0, 0, 5, 1));
        TextField::new().render(Rect::new(0, 0, 5, 1), &mut buf, &mut state);
        assert_eq!(state.offset, 6);
        assert_eq!(state.screen_cursor(), Some((4, 0)));
        assert_eq!(buf.cell((0, 0)).map(|v| v.symbol()), Some("6"));

        assert!(state.set_screen_cursor(0));
        assert_eq!(state.cursor, 6);
    }
}
