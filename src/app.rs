//!
//! Application state.
//!
//! Shows the login screen until the login succeeds, then the
//! upload screen. Toasts overlay both.
//!
use crate::_private::NonExhaustive;
use crate::commands::Commands;
use crate::config::Config;
use crate::login::event::LoginOutcome;
use crate::login::{Login, LoginState};
use crate::tasks::{Reply, TaskPool};
use crate::toast::{ToastQueue, Toasts, ToastsState};
use crate::upload::event::RecordOutcome;
use crate::upload::{self, UploadForm, UploadFormState};
use crate::uploader::AcceptList;
use log::debug;
use rat_event::{ct_event, flow, HandleEvent, MouseOnly, Outcome, Regular};
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Style, Stylize};
use ratatui::widgets::{StatefulWidget, Widget};
use std::sync::Arc;
use std::time::Instant;

/// Number of workers for the remote calls.
const WORKERS: usize = 2;

pub const TITLE: &str = "Pretty Der6y";

/// The active screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Upload,
}

/// Renders the application.
#[derive(Debug, Default, Clone)]
pub struct App;

/// State & event-handling.
#[derive(Debug)]
pub struct AppState {
    /// __readonly__
    pub screen: Screen,
    /// __read+write__
    pub login: LoginState,
    /// __read+write__
    pub upload: UploadFormState,
    /// __read+write__
    pub toasts: ToastsState,
    /// Remote calls.
    pub tasks: TaskPool,
    /// Ctrl-Q
    /// __readonly__
    pub quit: bool,

    pub non_exhaustive: NonExhaustive,
}

impl StatefulWidget for App {
    type State = AppState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let [title, body, status] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        let title_style = Style::new().black().on_cyan().bold();
        buf.set_style(title, title_style);
        ratatui::text::Line::from(TITLE)
            .centered()
            .style(title_style)
            .render(title, buf);

        match state.screen {
            Screen::Login => Login::new().render(body, buf, &mut state.login),
            Screen::Upload => UploadForm::new().render(body, buf, &mut state.upload),
        }

        let hint = match state.screen {
            Screen::Login => "Tab next | Enter login | Ctrl-Q quit",
            Screen::Upload => {
                "Tab next | F4 picker | Enter browse | paste path to drop | Ctrl-Q quit"
            }
        };
        buf.set_style(status, Style::new().dark_gray());
        ratatui::text::Line::from(hint).render(status, buf);

        Toasts::new().render(body, buf, &mut state.toasts);
    }
}

impl AppState {
    pub fn new(config: &Config, commands: Arc<dyn Commands>, toasts: ToastQueue) -> Self {
        let mut z = Self {
            screen: Screen::Login,
            login: LoginState::new(),
            upload: UploadFormState::new(
                AcceptList::parse(&config.accept),
                config.start_dir.clone(),
                config.map_center,
            ),
            toasts: ToastsState::new(toasts),
            tasks: TaskPool::new(commands, WORKERS),
            quit: false,
            non_exhaustive: NonExhaustive,
        };
        z.login.build_focus().first();
        z
    }

    /// Cursor position for the frame.
    pub fn screen_cursor(&self) -> Option<(u16, u16)> {
        match self.screen {
            Screen::Login => self.login.screen_cursor(),
            Screen::Upload => self.upload.screen_cursor(),
        }
    }

    fn show_upload(&mut self) {
        debug!("show upload screen");
        self.screen = Screen::Upload;
        self.upload.mount(&self.tasks);
        self.upload.build_focus().first();
    }

    /// Handle a reply of the task pool.
    pub fn reply(&mut self, reply: Reply) -> Outcome {
        match reply {
            Reply::LoggedIn(r) => match self.login.reply(r) {
                LoginOutcome::LoggedIn => {
                    self.show_upload();
                    Outcome::Changed
                }
                r => r.into(),
            },
            Reply::DailyLimit(r) => self.upload.reply_daily_limit(r).into(),
            Reply::Uploaded(r) => self.upload.reply_upload(r).into(),
        }
    }

    /// One pass of the event loop. Handles the event, if any, and
    /// ticks afterwards. A steady stream of events must not starve
    /// the replies or the clock.
    pub fn update(&mut self, event: Option<&crossterm::event::Event>, now: Instant) -> Outcome {
        let r = match event {
            Some(event) => self.handle(event, Regular),
            None => Outcome::Continue,
        };
        if self.quit {
            return r;
        }
        r.max(self.tick(now))
    }

    /// Replies, clock, animations and toasts.
    pub fn tick(&mut self, now: Instant) -> Outcome {
        let mut r = Outcome::Continue;
        while let Some(reply) = self.tasks.try_recv() {
            r = r.max(self.reply(reply));
        }
        if self.screen == Screen::Upload && self.upload.tick(now) {
            r = Outcome::Changed;
        }
        if self.toasts.queue.expire(now) || self.toasts.queue.is_fading(now) {
            r = Outcome::Changed;
        }
        // new toasts
        if self.toasts.queue.len() != self.toasts.areas.len() {
            r = Outcome::Changed;
        }
        r
    }
}

impl HandleEvent<crossterm::event::Event, Regular, Outcome> for AppState {
    fn handle(&mut self, event: &crossterm::event::Event, _qualifier: Regular) -> Outcome {
        if let ct_event!(key press CONTROL-'q') = event {
            self.quit = true;
            return Outcome::Changed;
        }
        if let crossterm::event::Event::Resize(_, _) = event {
            return Outcome::Changed;
        }

        flow!(self.toasts.handle(event, MouseOnly));

        match self.screen {
            Screen::Login => {
                let mut focus = self.login.build_focus();
                let f = focus.handle(event, Regular);
                let r = match self.login.handle(event, Regular) {
                    LoginOutcome::Submit => self.login.submit(&self.tasks),
                    r => r,
                };
                f.max(r.into())
            }
            Screen::Upload => {
                let mut focus = self.upload.build_focus();
                let r = match upload::handle_events(&mut self.upload, &mut focus, event) {
                    RecordOutcome::Submit => self.upload.submit(&self.tasks),
                    r => r,
                };
                r.into()
            }
        }
    }
}
