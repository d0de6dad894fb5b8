//!
//! Percentage slider.
//!
//! The value is a percentage in `0..=100`. A mouse down on the track
//! moves the knob there, and as long as the button is held the knob
//! follows the mouse, even outside of the widget.
//!
//! ```rust ignore
//! Slider::new()
//!     .styles(theme.slider_style())
//!     .render(area, buf, &mut state.mileage);
//!
//! let km = state.mileage.value() * daily_limit / 100.0;
//! ```
//!
use crate::_private::NonExhaustive;
use crate::listener::{Drag, Listeners};
use crate::util::revert_style;
use log::debug;
use rat_event::{ct_event, HandleEvent, MouseOnly, Outcome, Regular};
use rat_focus::{FocusBuilder, FocusFlag, HasFocus};
use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect};
use ratatui::prelude::BlockExt;
use ratatui::style::{Style, Stylize};
use ratatui::widgets::{Block, StatefulWidget, Widget};

/// Width of the knob.
pub const KNOB_WIDTH: u16 = 3;
/// Step for the arrow keys and the mouse wheel.
pub const STEP: f64 = 1.0;
/// Step for PageUp/PageDown.
pub const MAJOR_STEP: f64 = 10.0;

/// Slider widget.
#[derive(Debug, Default, Clone)]
pub struct Slider<'a> {
    style: Style,
    focus_style: Option<Style>,
    knob_style: Option<Style>,
    track_char: Option<&'a str>,
    knob: Option<&'a str>,
    block: Option<Block<'a>>,
}

/// Combined style.
#[derive(Debug, Clone)]
pub struct SliderStyle {
    pub style: Style,
    pub focus: Option<Style>,
    pub knob: Option<Style>,
    pub track_char: Option<&'static str>,
    pub knob_str: Option<&'static str>,
    pub block: Option<Block<'static>>,

    pub non_exhaustive: NonExhaustive,
}

/// State & event-handling.
#[derive(Debug)]
pub struct SliderState {
    /// Complete area.
    /// __readonly__. renewed for each render.
    pub area: Rect,
    /// Track.
    /// __readonly__. renewed for each render.
    pub track: Rect,
    /// Knob.
    /// __readonly__. renewed for each render.
    pub knob: Rect,

    /// Running mouse drag.
    pub drag: Option<Drag<()>>,
    /// Registry for the drag listener.
    /// __read+write__
    pub listeners: Listeners,

    /// Current focus state.
    /// __read+write__
    pub focus: FocusFlag,

    value: f64,

    pub non_exhaustive: NonExhaustive,
}

impl Default for SliderStyle {
    fn default() -> Self {
        Self {
            style: Default::default(),
            focus: None,
            knob: None,
            track_char: None,
            knob_str: None,
            block: None,
            non_exhaustive: NonExhaustive,
        }
    }
}

impl<'a> Slider<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set all styles.
    pub fn styles(mut self, styles: SliderStyle) -> Self {
        self.style = styles.style;
        if styles.focus.is_some() {
            self.focus_style = styles.focus;
        }
        if styles.knob.is_some() {
            self.knob_style = styles.knob;
        }
        if styles.track_char.is_some() {
            self.track_char = styles.track_char;
        }
        if styles.knob_str.is_some() {
            self.knob = styles.knob_str;
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

    /// Knob style when focused.
    pub fn focus_style(mut self, style: Style) -> Self {
        self.focus_style = Some(style);
        self
    }

    /// Knob style.
    pub fn knob_style(mut self, style: Style) -> Self {
        self.knob_style = Some(style);
        self
    }

    /// Fill char for the track.
    pub fn track_char(mut self, track: &'a str) -> Self {
        self.track_char = Some(track);
        self
    }

    /// Block.
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block.style(self.style));
        self
    }
}

impl StatefulWidget for &Slider<'_> {
    type State = SliderState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        render_ref(self, area, buf, state);
    }
}

impl StatefulWidget for Slider<'_> {
    type State = SliderState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        render_ref(&self, area, buf, state);
    }
}

fn render_ref(widget: &Slider<'_>, area: Rect, buf: &mut Buffer, state: &mut SliderState) {
    state.area = area;
    let inner = widget.block.inner_if_some(area);
    state.track = Rect::new(inner.x, inner.y, inner.width, inner.height.min(1));
    state.knob = state.knob_area();

    if let Some(block) = &widget.block {
        block.render(area, buf);
    } else {
        buf.set_style(area, widget.style);
    }

    let style = if widget.style == Style::default() {
        Style::default().black().on_gray()
    } else {
        widget.style
    };
    let knob_style = if state.is_focused() {
        widget.focus_style.unwrap_or_else(|| revert_style(style))
    } else {
        widget.knob_style.unwrap_or_else(|| revert_style(style))
    };

    let track_char = widget.track_char.unwrap_or("─");
    for x in state.track.left()..state.track.right() {
        if let Some(cell) = buf.cell_mut((x, state.track.y)) {
            cell.set_symbol(track_char);
            cell.set_style(style);
        }
    }

    let knob = widget.knob.unwrap_or("███");
    buf.set_stringn(
        state.knob.x,
        state.knob.y,
        knob,
        state.knob.width as usize,
        knob_style,
    );
}

impl Default for SliderState {
    fn default() -> Self {
        Self {
            area: Default::default(),
            track: Default::default(),
            knob: Default::default(),
            drag: None,
            listeners: Default::default(),
            focus: Default::default(),
            value: 0.0,
            non_exhaustive: NonExhaustive,
        }
    }
}

impl HasFocus for SliderState {
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

impl SliderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: &str) -> Self {
        Self {
            focus: FocusFlag::new().with_name(name),
            ..Default::default()
        }
    }

    /// Use a shared listener registry.
    pub fn with_listeners(mut self, listeners: Listeners) -> Self {
        self.listeners = listeners;
        self
    }

    pub fn clear_areas(&mut self) {
        self.area = Rect::default();
        self.track = Rect::default();
        self.knob = Rect::default();
    }

    /// Percentage.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Set the percentage. Clamped to 0..=100.
    pub fn set_value(&mut self, value: f64) -> bool {
        let old = self.value;
        self.value = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, 100.0)
        };
        old != self.value
    }

    pub fn next(&mut self) -> bool {
        self.set_value(self.value + STEP)
    }

    pub fn prev(&mut self) -> bool {
        self.set_value(self.value - STEP)
    }

    pub fn next_major(&mut self) -> bool {
        self.set_value(self.value + MAJOR_STEP)
    }

    pub fn prev_major(&mut self) -> bool {
        self.set_value(self.value - MAJOR_STEP)
    }

    fn knob_area(&self) -> Rect {
        let usable = self.track.width.saturating_sub(KNOB_WIDTH);
        let offset = (self.value / 100.0 * usable as f64).round() as u16;
        Rect::new(
            self.track.x + offset.min(usable),
            self.track.y,
            KNOB_WIDTH.min(self.track.width),
            self.track.height,
        )
    }

    /// Percentage for a screen column.
    ///
    /// `(x - (track.x + knob/2)) * 100 / (track.width - knob)`, clamped.
    /// None if the track is not wider than the knob.
    pub fn value_at(&self, x: u16) -> Option<f64> {
        let usable = self.track.width.saturating_sub(KNOB_WIDTH);
        if usable == 0 {
            return None;
        }
        let pos = x as f64 - (self.track.x + KNOB_WIDTH / 2) as f64;
        Some((pos * 100.0 / usable as f64).clamp(0.0, 100.0))
    }

    /// Set the value from a screen column.
    pub fn clicked_at(&mut self, x: u16) -> bool {
        match self.value_at(x) {
            Some(value) => self.set_value(value),
            None => false,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }
}

impl HandleEvent<crossterm::event::Event, Regular, Outcome> for SliderState {
    fn handle(&mut self, event: &crossterm::event::Event, _qualifier: Regular) -> Outcome {
        let r = if self.is_focused() {
            match event {
                ct_event!(keycode press Home) => self.set_value(0.0).into(),
                ct_event!(keycode press End) => self.set_value(100.0).into(),
                ct_event!(keycode press Left) | ct_event!(key press '-') => self.prev().into(),
                ct_event!(keycode press Right) | ct_event!(key press '+') => self.next().into(),
                ct_event!(keycode press PageUp) | ct_event!(keycode press ALT-Left) => {
                    self.prev_major().into()
                }
                ct_event!(keycode press PageDown) | ct_event!(keycode press ALT-Right) => {
                    self.next_major().into()
                }
                _ => Outcome::Continue,
            }
        } else {
            Outcome::Continue
        };

        if r == Outcome::Continue {
            HandleEvent::handle(self, event, MouseOnly)
        } else {
            r
        }
    }
}

impl HandleEvent<crossterm::event::Event, MouseOnly, Outcome> for SliderState {
    fn handle(&mut self, event: &crossterm::event::Event, _keymap: MouseOnly) -> Outcome {
        match event {
            ct_event!(mouse down Left for x,y) if self.track.contains(Position::new(*x, *y)) => {
                self.drag = Some(self.listeners.drag("slider", ()));
                debug!("slider drag start");
                self.clicked_at(*x);
                Outcome::Changed
            }
            ct_event!(mouse drag Left for x,_y) if self.is_dragging() => {
                self.clicked_at(*x).into()
            }
            ct_event!(mouse up Left for _x,_y) if self.is_dragging() => {
                self.drag = None;
                debug!("slider drag end {:.1}", self.value);
                Outcome::Changed
            }
            ct_event!(scroll down for x,y) if self.track.contains(Position::new(*x, *y)) => {
                self.next().into()
            }
            ct_event!(scroll up for x,y) if self.track.contains(Position::new(*x, *y)) => {
                self.prev().into()
            }
            _ => Outcome::Continue,
        }
    }
}

/// Handle all events.
/// Key events are only processed if focus is true.
/// Mouse events are processed if they are in range.
pub fn handle_events(
    state: &mut SliderState,
    focus: bool,
    event: &crossterm::event::Event,
) -> Outcome {
    state.focus.set(focus);
    HandleEvent::handle(state, event, Regular)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{Event, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

    fn mouse(kind: MouseEventKind, x: u16, y: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column: x,
            row: y,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn rendered(listeners: &Listeners) -> SliderState {
        let mut state = SliderState::new().with_listeners(listeners.clone());
        let mut buf = Buffer::empty(Rect::new(0, 0, 40, 3));
        Slider::new().render(Rect::new(10, 1, 23, 1), &mut buf, &mut state);
        state
    }

    #[test]
    fn test_value_at() {
        let state = rendered(&Listeners::new());
        // usable width 20, center offset 1
        assert_eq!(state.value_at(11), Some(0.0));
        assert_eq!(state.value_at(21), Some(50.0));
        assert_eq!(state.value_at(31), Some(100.0));
        assert_eq!(state.value_at(0), Some(0.0));
        assert_eq!(state.value_at(39), Some(100.0));

        let mut narrow = SliderState::new();
        narrow.track = Rect::new(0, 0, 3, 1);
        assert_eq!(narrow.value_at(1), None);
        assert!(!narrow.clicked_at(1));
    }

    #[test]
    fn test_drag() {
        let listeners = Listeners::new();
        let mut state = rendered(&listeners);

        let r = state.handle(&mouse(MouseEventKind::Down(MouseButton::Left), 16, 1), MouseOnly);
        assert_eq!(r, Outcome::Changed);
        assert_eq!(state.value(), 25.0);
        assert_eq!(listeners.len(), 1);

        // outside of the widget
        state.handle(&mouse(MouseEventKind::Drag(MouseButton::Left), 26, 7), MouseOnly);
        assert_eq!(state.value(), 75.0);
        state.handle(&mouse(MouseEventKind::Drag(MouseButton::Left), 2, 7), MouseOnly);
        assert_eq!(state.value(), 0.0);

        state.handle(&mouse(MouseEventKind::Up(MouseButton::Left), 2, 7), MouseOnly);
        assert!(listeners.is_empty());
        let r = state.handle(&mouse(MouseEventKind::Drag(MouseButton::Left), 26, 1), MouseOnly);
        assert_eq!(r, Outcome::Continue);
    }

    #[test]
    fn test_keys() {
        let mut state = SliderState::new();
        state.focus.set(true);
        assert!(state.next_major());
        assert!(state.next());
        assert_eq!(state.value(), 11.0);
        assert!(!state.set_value(11.0));
        state.set_value(250.0);
        assert_eq!(state.value(), 100.0);
        assert!(!state.next());
        state.set_value(-3.0);
        assert_eq!(state.value(), 0.0);
    }
}
