//!
//! Log records as toasts.
//!
//! [ToastQueue::output] gives a fern output that feeds the queue.
//! [Toasts] renders the queue stacked at the top center of the screen.
//! A toast lives for [LIFETIME], the last [FADE] it is rendered dimmed.
//! A click removes it early.
//!
use crate::util::render_label;
use log::Level;
use rat_event::{ct_event, HandleEvent, MouseOnly, Outcome};
use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Clear, StatefulWidget, Widget};
use std::cmp::min;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Lifetime of a toast.
pub const LIFETIME: Duration = Duration::from_millis(3000);
/// Fade out at the end of the lifetime.
pub const FADE: Duration = Duration::from_millis(300);

/// Maximum width of a toast.
const MAX_WIDTH: u16 = 60;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub level: Level,
    pub message: String,
    pub created: Instant,
}

impl Toast {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created) >= LIFETIME
    }

    pub fn is_fading(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created) >= LIFETIME - FADE
    }
}

/// Queue of toasts. Clones share the queue.
#[derive(Debug, Default, Clone)]
pub struct ToastQueue {
    toasts: Arc<Mutex<VecDeque<Toast>>>,
    next_id: Arc<AtomicU64>,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Toast>> {
        // a panic while holding the lock leaves the queue intact.
        self.toasts.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add a toast.
    pub fn push(&self, level: Level, message: impl Into<String>) {
        self.push_at(level, message, Instant::now());
    }

    /// Add a toast with a given creation time.
    pub fn push_at(&self, level: Level, message: impl Into<String>, created: Instant) {
        let level = match level {
            Level::Trace => Level::Debug,
            v => v,
        };
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push_back(Toast {
            id,
            level,
            message: message.into(),
            created,
        });
    }

    /// Remove a toast.
    pub fn remove(&self, id: u64) -> bool {
        let mut toasts = self.lock();
        let len = toasts.len();
        toasts.retain(|v| v.id != id);
        len != toasts.len()
    }

    /// Drop expired toasts.
    pub fn expire(&self, now: Instant) -> bool {
        let mut toasts = self.lock();
        let len = toasts.len();
        toasts.retain(|v| !v.is_expired(now));
        len != toasts.len()
    }

    /// Anything fading? Needs repaints.
    pub fn is_fading(&self, now: Instant) -> bool {
        self.lock().iter().any(|v| v.is_fading(now))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copy of the current toasts.
    pub fn snapshot(&self) -> Vec<Toast> {
        self.lock().iter().cloned().collect()
    }

    /// Output for a fern dispatch.
    pub fn output(&self) -> fern::Output {
        let queue = self.clone();
        fern::Output::call(move |record| {
            queue.push(record.level(), record.args().to_string());
        })
    }
}

/// Renders the toasts.
#[derive(Debug, Default, Clone)]
pub struct Toasts {
    now: Option<Instant>,
}

/// State & event-handling.
#[derive(Debug, Default)]
pub struct ToastsState {
    /// Toasts as rendered.
    /// __readonly__. renewed for each render.
    pub areas: Vec<(u64, Rect)>,
    /// __read+write__
    pub queue: ToastQueue,
}

impl Toasts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render as of this time.
    pub fn now(mut self, now: Instant) -> Self {
        self.now = Some(now);
        self
    }
}

pub fn level_style(level: Level) -> Style {
    match level {
        Level::Error => Style::new().fg(Color::White).bg(Color::Red),
        Level::Warn => Style::new().fg(Color::Black).bg(Color::Yellow),
        Level::Info => Style::new().fg(Color::Black).bg(Color::Green),
        Level::Debug | Level::Trace => Style::new().fg(Color::White).bg(Color::DarkGray),
    }
}

impl StatefulWidget for Toasts {
    type State = ToastsState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let now = self.now.unwrap_or_else(Instant::now);

        state.areas.clear();
        let mut y = area.y;
        for toast in state.queue.snapshot() {
            if toast.is_expired(now) {
                continue;
            }
            if y.saturating_add(3) > area.bottom() {
                break;
            }

            let width = min(
                min(
                    u16::try_from(toast.message.chars().count())
                        .unwrap_or(u16::MAX)
                        .saturating_add(4),
                    MAX_WIDTH,
                ),
                area.width,
            );
            let x = area.x + (area.width - width) / 2;
            let toast_area = Rect::new(x, y, width, 3);

            let mut style = level_style(toast.level);
            if toast.is_fading(now) {
                style = style.add_modifier(Modifier::DIM);
            }

            Clear.render(toast_area, buf);
            let block = Block::bordered().style(style);
            let inner = block.inner(toast_area);
            block.render(toast_area, buf);
            render_label(
                buf,
                Rect::new(inner.x + 1, inner.y, inner.width.saturating_sub(2), inner.height),
                &toast.message,
                style,
            );

            state.areas.push((toast.id, toast_area));
            y += 3;
        }
    }
}

impl ToastsState {
    pub fn new(queue: ToastQueue) -> Self {
        Self {
            areas: Default::default(),
            queue,
        }
    }
}

impl HandleEvent<crossterm::event::Event, MouseOnly, Outcome> for ToastsState {
    fn handle(&mut self, event: &crossterm::event::Event, _qualifier: MouseOnly) -> Outcome {
        match event {
            ct_event!(mouse down Left for x,y) => {
                let hit = self
                    .areas
                    .iter()
                    .find(|(_, area)| area.contains(Position::new(*x, *y)))
                    .map(|(id, _)| *id);
                match hit {
                    Some(id) => {
                        self.queue.remove(id);
                        self.areas.retain(|(v, _)| *v != id);
                        Outcome::Changed
                    }
                    None => Outcome::Continue,
                }
            }
            _ => Outcome::Continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{Event, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

    #[test]
    fn test_lifetime() {
        let queue = ToastQueue::new();
        let t0 = Instant::now();
        queue.push_at(Level::Error, "Invalid file type!", t0);
        queue.push_at(Level::Trace, "detail", t0 + Duration::from_millis(1000));

        let toasts = queue.snapshot();
        assert_eq!(toasts[1].level, Level::Debug);

        assert!(!toasts[0].is_fading(t0 + Duration::from_millis(2699)));
        assert!(toasts[0].is_fading(t0 + Duration::from_millis(2700)));

        assert!(!queue.expire(t0 + Duration::from_millis(2999)));
        assert!(queue.expire(t0 + Duration::from_millis(3000)));
        assert_eq!(queue.len(), 1);
        assert!(queue.expire(t0 + Duration::from_millis(4000)));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_click_removes() {
        let queue = ToastQueue::new();
        let now = Instant::now();
        queue.push_at(Level::Info, "Upload successful!", now);
        queue.push_at(Level::Warn, "No file selected!", now);

        let mut state = ToastsState::new(queue.clone());
        let area = Rect::new(0, 0, 80, 20);
        let mut buf = Buffer::empty(area);
        Toasts::new().now(now).render(area, &mut buf, &mut state);
        assert_eq!(state.areas.len(), 2);
        assert_eq!(state.areas[1].1.y, 3);

        let click = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 40,
            row: 4,
            modifiers: KeyModifiers::NONE,
        });
        assert_eq!(state.handle(&click, MouseOnly), Outcome::Changed);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.snapshot()[0].message, "Upload successful!");
    }

    #[test]
    fn test_long_message() {
        let queue = ToastQueue::new();
        let now = Instant::now();
        queue.push_at(Level::Error, "x".repeat(70_000), now);
        queue.push_at(Level::Info, "short", now);

        let mut state = ToastsState::new(queue);
        let area = Rect::new(0, 0, 80, 20);
        let mut buf = Buffer::empty(area);
        Toasts::new().now(now).render(area, &mut buf, &mut state);
        assert_eq!(state.areas[0].1.width, MAX_WIDTH.min(80));
        assert_eq!(state.areas[1].1.width, 9);
    }
}
