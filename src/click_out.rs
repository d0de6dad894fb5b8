//!
//! Detects clicks outside of some areas.
//!
//! ```rust ignore
//! // while the popup is open
//! state.click_out.attach();
//!
//! // render
//! state.click_out.set_inside(&[field_area, popup_area]);
//!
//! // event-handling, before anything else
//! match state.click_out.handle(event, Popup) {
//!     ClickOutOutcome::Outside => {
//!         state.click_out.detach();
//!         state.hide_popup();
//!     }
//!     _ => {}
//! }
//! ```
//!
use crate::_private::NonExhaustive;
use crate::click_out::event::ClickOutOutcome;
use crate::listener::{ListenerGuard, Listeners};
use crate::util::contains_any;
use rat_event::{ct_event, HandleEvent, Popup};
use ratatui::layout::Rect;

/// State for the click-out detection.
#[derive(Debug, Default)]
pub struct ClickOutState {
    /// Areas that count as inside.
    /// __read+write__ usually renewed for each render.
    pub inside: Vec<Rect>,
    /// Registry for the listener.
    /// __read+write__
    pub listeners: Listeners,

    listener: Option<ListenerGuard>,

    pub non_exhaustive: NonExhaustive,
}

pub(crate) mod event {
    use rat_event::{ConsumedEvent, Outcome};

    /// Result of the click-out detection.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ClickOutOutcome {
        /// Not an outside click.
        Continue,
        /// A mouse button went down outside all areas.
        Outside,
    }

    impl ConsumedEvent for ClickOutOutcome {
        fn is_consumed(&self) -> bool {
            // an outside click still belongs to whatever is there.
            false
        }
    }

    impl From<ClickOutOutcome> for Outcome {
        fn from(value: ClickOutOutcome) -> Self {
            match value {
                ClickOutOutcome::Continue => Outcome::Continue,
                ClickOutOutcome::Outside => Outcome::Changed,
            }
        }
    }
}

impl ClickOutState {
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

    /// Start listening. Does nothing if already attached.
    pub fn attach(&mut self) {
        if self.listener.is_none() {
            self.listener = Some(self.listeners.attach("click-out"));
        }
    }

    /// Stop listening.
    pub fn detach(&mut self) {
        self.listener = None;
    }

    pub fn is_attached(&self) -> bool {
        self.listener.is_some()
    }

    /// Replace the inside areas.
    pub fn set_inside(&mut self, areas: &[Rect]) {
        self.inside.clear();
        self.inside.extend(areas.iter().filter(|v| !v.is_empty()));
    }

    pub fn clear_areas(&mut self) {
        self.inside.clear();
    }
}

impl HandleEvent<crossterm::event::Event, Popup, ClickOutOutcome> for ClickOutState {
    fn handle(&mut self, event: &crossterm::event::Event, _qualifier: Popup) -> ClickOutOutcome {
        if !self.is_attached() {
            return ClickOutOutcome::Continue;
        }
        match event {
            ct_event!(mouse down Left for x,y)
            | ct_event!(mouse down Right for x,y)
            | ct_event!(mouse down Middle for x,y)
                if !contains_any(&self.inside, *x, *y) =>
            {
                ClickOutOutcome::Outside
            }
            _ => ClickOutOutcome::Continue,
        }
    }
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

    #[test]
    fn test_outside_once_per_click() {
        let mut state = ClickOutState::new();
        state.set_inside(&[Rect::new(0, 0, 10, 1), Rect::new(0, 1, 20, 5)]);

        let down = mouse(MouseEventKind::Down(MouseButton::Left), 30, 3);
        assert_eq!(state.handle(&down, Popup), ClickOutOutcome::Continue);

        state.attach();
        assert_eq!(state.handle(&down, Popup), ClickOutOutcome::Outside);
        let up = mouse(MouseEventKind::Up(MouseButton::Left), 30, 3);
        assert_eq!(state.handle(&up, Popup), ClickOutOutcome::Continue);
        let drag = mouse(MouseEventKind::Drag(MouseButton::Left), 31, 3);
        assert_eq!(state.handle(&drag, Popup), ClickOutOutcome::Continue);

        let inside = mouse(MouseEventKind::Down(MouseButton::Left), 15, 3);
        assert_eq!(state.handle(&inside, Popup), ClickOutOutcome::Continue);
        let right = mouse(MouseEventKind::Down(MouseButton::Right), 15, 0);
        assert_eq!(state.handle(&right, Popup), ClickOutOutcome::Outside);
    }

    #[test]
    fn test_no_leak() {
        let listeners = Listeners::new();
        let mut state = ClickOutState::with_listeners(listeners.clone());
        for _ in 0..5 {
            state.attach();
            state.attach();
            assert_eq!(listeners.len(), 1);
            state.detach();
            assert_eq!(listeners.len(), 0);
        }
        state.attach();
        drop(state);
        assert!(listeners.is_empty());
    }
}
