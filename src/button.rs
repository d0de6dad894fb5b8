//!
//! Submit button of the login and upload screens.
//!
//! While the request runs the button is pending. It shows the
//! pending label, renders dimmed and ignores all input until the
//! screen gets its reply.
//!
//! ```rust ignore
//! let button = Button::new(" Login ").pending_label(" Logging in... ");
//! let [area] = Layout::horizontal([Constraint::Length(button.width(&state.submit))])
//!     .flex(Flex::Center)
//!     .areas(area);
//! button.render(area, buf, &mut state.submit);
//!
//! match state.submit.handle(event, Regular) {
//!     ButtonOutcome::Pressed => state.login(),
//!     r => r.into(),
//! }
//! ```
//!
use crate::_private::NonExhaustive;
use crate::button::event::ButtonOutcome;
use crate::util::revert_style;
use rat_event::{ct_event, HandleEvent, MouseOnly, Regular};
use rat_focus::{FocusBuilder, FocusFlag, HasFocus};
use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Style, Stylize};
use ratatui::text::Line;
use ratatui::widgets::{StatefulWidget, Widget};

/// Submit button.
#[derive(Debug, Default, Clone)]
pub struct Button<'a> {
    label: &'a str,
    pending_label: Option<&'a str>,
    style: Style,
    focus_style: Option<Style>,
    pending_style: Option<Style>,
}

/// State & event-handling.
#[derive(Debug)]
pub struct ButtonState {
    /// __readonly__. renewed for each render.
    pub area: Rect,

    /// Mouse went down on the button, waiting for the release.
    /// __used for mouse interaction__
    pub armed: bool,
    /// The request is running.
    /// __read+write__ use set_pending()
    pub pending: bool,

    /// __read+write__
    pub focus: FocusFlag,

    pub non_exhaustive: NonExhaustive,
}

pub(crate) mod event {
    use rat_event::{ConsumedEvent, Outcome};

    /// Result value for event-handling.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ButtonOutcome {
        /// The given event was not handled at all.
        Continue,
        /// The event was handled, no repaint necessary.
        Unchanged,
        /// The event was handled, repaint necessary.
        Changed,
        /// Submit.
        Pressed,
    }

    impl ConsumedEvent for ButtonOutcome {
        fn is_consumed(&self) -> bool {
            *self != ButtonOutcome::Continue
        }
    }

    impl From<ButtonOutcome> for Outcome {
        fn from(value: ButtonOutcome) -> Self {
            match value {
                ButtonOutcome::Continue => Outcome::Continue,
                ButtonOutcome::Unchanged => Outcome::Unchanged,
                ButtonOutcome::Changed | ButtonOutcome::Pressed => Outcome::Changed,
            }
        }
    }
}

impl<'a> Button<'a> {
    pub fn new(label: &'a str) -> Self {
        Self {
            label,
            ..Default::default()
        }
    }

    /// Label while the request runs.
    pub fn pending_label(mut self, label: &'a str) -> Self {
        self.pending_label = Some(label);
        self
    }

    pub fn style(mut self, style: impl Into<Style>) -> Self {
        self.style = style.into();
        self
    }

    pub fn focus_style(mut self, style: impl Into<Style>) -> Self {
        self.focus_style = Some(style.into());
        self
    }

    /// Style while the request runs. Defaults to the dimmed base style.
    pub fn pending_style(mut self, style: impl Into<Style>) -> Self {
        self.pending_style = Some(style.into());
        self
    }

    fn label(&self, state: &ButtonState) -> &'a str {
        match self.pending_label {
            Some(label) if state.pending => label,
            _ => self.label,
        }
    }

    /// Width of the current label.
    pub fn width(&self, state: &ButtonState) -> u16 {
        self.label(state).chars().count() as u16
    }
}

impl StatefulWidget for &Button<'_> {
    type State = ButtonState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        render_ref(self, area, buf, state);
    }
}

impl StatefulWidget for Button<'_> {
    type State = ButtonState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        render_ref(&self, area, buf, state);
    }
}

fn render_ref(widget: &Button<'_>, area: Rect, buf: &mut Buffer, state: &mut ButtonState) {
    state.area = area;

    let focus_style = widget
        .focus_style
        .unwrap_or_else(|| revert_style(widget.style));
    let style = if state.pending {
        widget.pending_style.unwrap_or_else(|| widget.style.dim())
    } else if state.armed {
        revert_style(focus_style)
    } else if state.is_focused() {
        focus_style
    } else {
        widget.style
    };

    buf.set_style(area, style);
    Line::from(widget.label(state)).centered().render(area, buf);
}

impl Default for ButtonState {
    fn default() -> Self {
        Self {
            area: Default::default(),
            armed: false,
            pending: false,
            focus: Default::default(),
            non_exhaustive: NonExhaustive,
        }
    }
}

impl ButtonState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: &str) -> Self {
        Self {
            focus: FocusFlag::new().with_name(name),
            ..Default::default()
        }
    }

    pub fn clear_areas(&mut self) {
        self.area = Rect::default();
    }

    /// Start or end the request. A pending button drops a half-done click.
    pub fn set_pending(&mut self, pending: bool) {
        self.pending = pending;
        if pending {
            self.armed = false;
        }
    }
}

impl HasFocus for ButtonState {
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

impl HandleEvent<crossterm::event::Event, Regular, ButtonOutcome> for ButtonState {
    fn handle(&mut self, event: &crossterm::event::Event, _keymap: Regular) -> ButtonOutcome {
        if self.pending {
            return ButtonOutcome::Continue;
        }
        if self.is_focused() {
            if let ct_event!(keycode press Enter) | ct_event!(key press ' ') = event {
                return ButtonOutcome::Pressed;
            }
        }
        HandleEvent::handle(self, event, MouseOnly)
    }
}

impl HandleEvent<crossterm::event::Event, MouseOnly, ButtonOutcome> for ButtonState {
    fn handle(&mut self, event: &crossterm::event::Event, _keymap: MouseOnly) -> ButtonOutcome {
        if self.pending {
            return ButtonOutcome::Continue;
        }
        match event {
            ct_event!(mouse down Left for x,y) if self.area.contains(Position::new(*x, *y)) => {
                self.armed = true;
                ButtonOutcome::Changed
            }
            ct_event!(mouse up Left for x,y) if self.armed => {
                self.armed = false;
                if self.area.contains(Position::new(*x, *y)) {
                    ButtonOutcome::Pressed
                } else {
                    ButtonOutcome::Changed
                }
            }
            _ => ButtonOutcome::Continue,
        }
    }
}

/// Handle all events.
/// Key events are only processed if focus is true.
pub fn handle_events(
    state: &mut ButtonState,
    focus: bool,
    event: &crossterm::event::Event,
) -> ButtonOutcome {
    state.focus.set(focus);
    HandleEvent::handle(state, event, Regular)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{
        Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    };
    use ratatui::style::Modifier;

    fn mouse(kind: MouseEventKind, x: u16, y: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column: x,
            row: y,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn button() -> Button<'static> {
        Button::new(" Upload ")
            .pending_label(" Uploading... ")
            .style(Style::new().black().on_white())
    }

    fn rendered(state: &mut ButtonState) -> Buffer {
        let mut buf = Buffer::empty(Rect::new(0, 0, 20, 1));
        let button = button();
        let area = Rect::new(2, 0, button.width(state), 1);
        button.render(area, &mut buf, state);
        buf
    }

    fn text(buf: &Buffer) -> String {
        buf.content.iter().map(|v| v.symbol()).collect()
    }

    #[test]
    fn test_click() {
        let mut state = ButtonState::new();
        rendered(&mut state);

        let down = mouse(MouseEventKind::Down(MouseButton::Left), 3, 0);
        assert_eq!(state.handle(&down, MouseOnly), ButtonOutcome::Changed);
        assert!(state.armed);
        let up = mouse(MouseEventKind::Up(MouseButton::Left), 4, 0);
        assert_eq!(state.handle(&up, MouseOnly), ButtonOutcome::Pressed);
        assert!(!state.armed);

        // dragged off the button before the release
        state.handle(&down, MouseOnly);
        let up = mouse(MouseEventKind::Up(MouseButton::Left), 15, 0);
        assert_eq!(state.handle(&up, MouseOnly), ButtonOutcome::Changed);
        assert_eq!(state.handle(&up, MouseOnly), ButtonOutcome::Continue);
    }

    #[test]
    fn test_keys() {
        let mut state = ButtonState::new();
        rendered(&mut state);
        let enter = Event::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(handle_events(&mut state, false, &enter), ButtonOutcome::Continue);
        assert_eq!(handle_events(&mut state, true, &enter), ButtonOutcome::Pressed);
    }

    #[test]
    fn test_pending() {
        let mut state = ButtonState::new();
        let buf = rendered(&mut state);
        assert_eq!(text(&buf), "   Upload           ");

        let down = mouse(MouseEventKind::Down(MouseButton::Left), 3, 0);
        state.handle(&down, MouseOnly);
        state.set_pending(true);
        assert!(!state.armed);

        let buf = rendered(&mut state);
        assert_eq!(text(&buf), "   Uploading...     ");
        assert_eq!(state.area.width, 14);
        assert!(buf[(3, 0)].modifier.contains(Modifier::DIM));

        let enter = Event::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(handle_events(&mut state, true, &enter), ButtonOutcome::Continue);
        let up = mouse(MouseEventKind::Up(MouseButton::Left), 3, 0);
        assert_eq!(state.handle(&down, MouseOnly), ButtonOutcome::Continue);
        assert_eq!(state.handle(&up, MouseOnly), ButtonOutcome::Continue);

        state.set_pending(false);
        let buf = rendered(&mut state);
        assert_eq!(text(&buf), "   Upload           ");
        assert_eq!(handle_events(&mut state, true, &enter), ButtonOutcome::Pressed);
    }
}
