//!
//! Login screen.
//!
//! Username and password with a submit button. Submitting validates
//! the form and starts the login task. Only one login can be pending,
//! the button is disabled while it runs.
//!
use crate::_private::NonExhaustive;
use crate::button::event::ButtonOutcome;
use crate::button::{Button, ButtonState};
use crate::commands::CommandError;
use crate::login::event::LoginOutcome;
use crate::tasks::{Spawn, Task};
use crate::text_field::event::TextOutcome;
use crate::text_field::{TextField, TextFieldState};
use crate::util::render_label;
use log::{debug, error, info};
use rat_event::{ct_event, flow, HandleEvent, Regular};
use rat_focus::{Focus, FocusBuilder, FocusFlag, HasFocus};
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::widgets::{Block, StatefulWidget, Widget};

/// Maximum length of the username.
pub const USERNAME_LEN: usize = 11;
/// Maximum length of the password.
pub const PASSWORD_LEN: usize = 16;

pub const USERNAME_REQUIRED: &str = "Username is required";
pub const PASSWORD_REQUIRED: &str = "Password is required";

/// Login screen.
#[derive(Debug, Clone)]
pub struct Login<'a> {
    title: &'a str,
    style: Style,
    field_style: Style,
    focus_style: Style,
    error_style: Style,
    button_style: Style,
}

/// State & event-handling.
#[derive(Debug)]
pub struct LoginState {
    /// Form area.
    /// __readonly__. renewed for each render.
    pub area: Rect,

    /// __read+write__
    pub username: TextFieldState,
    /// __read+write__
    pub password: TextFieldState,
    /// __read+write__
    pub submit: ButtonState,

    /// Validation messages.
    /// __readonly__
    pub username_error: Option<&'static str>,
    /// __readonly__
    pub password_error: Option<&'static str>,
    /// Login is running.
    /// __readonly__
    pub pending: bool,

    /// Container focus.
    pub focus: FocusFlag,

    pub non_exhaustive: NonExhaustive,
}

pub(crate) mod event {
    use rat_event::{ConsumedEvent, Outcome};

    /// Result of event-handling.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    pub enum LoginOutcome {
        /// The given event was not handled at all.
        Continue,
        /// The event was handled, no repaint necessary.
        Unchanged,
        /// The event was handled, repaint necessary.
        Changed,
        /// The user wants to log in.
        Submit,
        /// Login succeeded.
        LoggedIn,
    }

    impl ConsumedEvent for LoginOutcome {
        fn is_consumed(&self) -> bool {
            *self != LoginOutcome::Continue
        }
    }

    impl From<bool> for LoginOutcome {
        fn from(value: bool) -> Self {
            if value {
                LoginOutcome::Changed
            } else {
                LoginOutcome::Unchanged
            }
        }
    }

    impl From<LoginOutcome> for Outcome {
        fn from(value: LoginOutcome) -> Self {
            match value {
                LoginOutcome::Continue => Outcome::Continue,
                LoginOutcome::Unchanged => Outcome::Unchanged,
                LoginOutcome::Changed => Outcome::Changed,
                LoginOutcome::Submit => Outcome::Changed,
                LoginOutcome::LoggedIn => Outcome::Changed,
            }
        }
    }
}

impl Default for Login<'_> {
    fn default() -> Self {
        Self {
            title: " Pretty Der6y ",
            style: Style::new(),
            field_style: Style::new().bg(Color::DarkGray),
            focus_style: Style::new().black().on_cyan(),
            error_style: Style::new().red(),
            button_style: Style::new().black().on_gray(),
        }
    }
}

impl<'a> Login<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: &'a str) -> Self {
        self.title = title;
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn field_style(mut self, style: Style) -> Self {
        self.field_style = style;
        self
    }

    pub fn focus_style(mut self, style: Style) -> Self {
        self.focus_style = style;
        self
    }
}

impl StatefulWidget for Login<'_> {
    type State = LoginState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        let [form] = Layout::horizontal([Constraint::Length(36)])
            .flex(Flex::Center)
            .areas(area);
        let [form] = Layout::vertical([Constraint::Length(12)])
            .flex(Flex::Center)
            .areas(form);
        state.area = form;

        let block = Block::bordered().title(self.title).style(self.style);
        let inner = block.inner(form);
        block.render(form, buf);

        let [_, l_user, f_user, e_user, l_pass, f_pass, e_pass, _, f_submit] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .horizontal_margin(2)
            .areas(inner);

        render_label(buf, l_user, "Username", self.style);
        TextField::new()
            .style(self.field_style)
            .focus_style(self.focus_style)
            .placeholder("phone number")
            .render(f_user, buf, &mut state.username);
        if let Some(msg) = state.username_error {
            render_label(buf, e_user, msg, self.error_style);
        }

        render_label(buf, l_pass, "Password", self.style);
        TextField::new()
            .style(self.field_style)
            .focus_style(self.focus_style)
            .render(f_pass, buf, &mut state.password);
        if let Some(msg) = state.password_error {
            render_label(buf, e_pass, msg, self.error_style);
        }

        let button = Button::new(" Login ")
            .pending_label(" Logging in... ")
            .style(self.button_style)
            .focus_style(self.focus_style)
            .pending_style(Style::new().dark_gray().on_black());
        let [f_submit] = Layout::horizontal([Constraint::Length(button.width(&state.submit))])
            .flex(Flex::Center)
            .areas(f_submit);
        button.render(f_submit, buf, &mut state.submit);
    }
}

impl Default for LoginState {
    fn default() -> Self {
        Self {
            area: Default::default(),
            username: TextFieldState::named("username").with_max_len(USERNAME_LEN),
            password: TextFieldState::named("password")
                .with_max_len(PASSWORD_LEN)
                .with_mask('*'),
            submit: ButtonState::named("login"),
            username_error: None,
            password_error: None,
            pending: false,
            focus: FocusFlag::new().with_name("login-screen"),
            non_exhaustive: NonExhaustive,
        }
    }
}

impl HasFocus for LoginState {
    fn build(&self, builder: &mut FocusBuilder) {
        builder.widget(&self.username);
        builder.widget(&self.password);
        builder.widget(&self.submit);
    }

    fn focus(&self) -> FocusFlag {
        self.focus.clone()
    }

    fn area(&self) -> Rect {
        self.area
    }
}

impl LoginState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Focus for the form.
    pub fn build_focus(&self) -> Focus {
        let mut fb = FocusBuilder::new(None);
        fb.widget(self);
        fb.build()
    }

    /// Cursor position of the focused field.
    pub fn screen_cursor(&self) -> Option<(u16, u16)> {
        self.username
            .screen_cursor()
            .or_else(|| self.password.screen_cursor())
    }

    /// Check the fields and set the messages.
    pub fn validate(&mut self) -> bool {
        self.username_error = if self.username.value().trim().is_empty() {
            Some(USERNAME_REQUIRED)
        } else {
            None
        };
        self.password_error = if self.password.is_empty() {
            Some(PASSWORD_REQUIRED)
        } else {
            None
        };
        self.username_error.is_none() && self.password_error.is_none()
    }

    fn set_pending(&mut self, pending: bool) {
        self.pending = pending;
        self.submit.set_pending(pending);
    }

    /// Start the login.
    pub fn submit(&mut self, tasks: &dyn Spawn) -> LoginOutcome {
        if self.pending {
            debug!("login already pending");
            return LoginOutcome::Unchanged;
        }
        if !self.validate() {
            return LoginOutcome::Changed;
        }

        let task = Task::Login {
            username: self.username.value().trim().to_string(),
            password: self.password.value().to_string(),
        };
        match tasks.spawn(task) {
            Ok(()) => self.set_pending(true),
            Err(e) => error!("Error logging in: {:?}", e),
        }
        LoginOutcome::Changed
    }

    /// Result of the login task.
    pub fn reply(&mut self, result: Result<(), CommandError>) -> LoginOutcome {
        self.set_pending(false);
        match result {
            Ok(()) => {
                info!("Login successful!");
                LoginOutcome::LoggedIn
            }
            Err(e) => {
                error!("Error logging in: {}", e);
                LoginOutcome::Changed
            }
        }
    }
}

impl HandleEvent<crossterm::event::Event, Regular, LoginOutcome> for LoginState {
    fn handle(&mut self, event: &crossterm::event::Event, _qualifier: Regular) -> LoginOutcome {
        flow!(match self.username.handle(event, Regular) {
            TextOutcome::TextChanged => {
                self.username_error = None;
                LoginOutcome::Changed
            }
            TextOutcome::Continue => LoginOutcome::Continue,
            TextOutcome::Unchanged => LoginOutcome::Unchanged,
            TextOutcome::Changed => LoginOutcome::Changed,
        });
        flow!(match self.password.handle(event, Regular) {
            TextOutcome::TextChanged => {
                self.password_error = None;
                LoginOutcome::Changed
            }
            TextOutcome::Continue => LoginOutcome::Continue,
            TextOutcome::Unchanged => LoginOutcome::Unchanged,
            TextOutcome::Changed => LoginOutcome::Changed,
        });
        flow!(match self.submit.handle(event, Regular) {
            ButtonOutcome::Pressed => LoginOutcome::Submit,
            ButtonOutcome::Continue => LoginOutcome::Continue,
            ButtonOutcome::Unchanged => LoginOutcome::Unchanged,
            ButtonOutcome::Changed => LoginOutcome::Changed,
        });

        if self.username.is_focused() || self.password.is_focused() {
            match event {
                ct_event!(keycode press Enter) => LoginOutcome::Submit,
                _ => LoginOutcome::Continue,
            }
        } else {
            LoginOutcome::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::SendError;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<Task>>);

    impl Spawn for Recorder {
        fn spawn(&self, task: Task) -> Result<(), SendError<()>> {
            self.0.borrow_mut().push(task);
            Ok(())
        }
    }

    #[test]
    fn test_validation() {
        let tasks = Recorder::default();
        let mut state = LoginState::new();

        assert_eq!(state.submit(&tasks), LoginOutcome::Changed);
        assert_eq!(state.username_error, Some(USERNAME_REQUIRED));
        assert_eq!(state.password_error, Some(PASSWORD_REQUIRED));
        assert!(tasks.0.borrow().is_empty());

        state.username.set_value("13800000000");
        assert_eq!(state.submit(&tasks), LoginOutcome::Changed);
        assert_eq!(state.username_error, None);
        assert_eq!(state.password_error, Some(PASSWORD_REQUIRED));
    }

    #[test]
    fn test_single_pending() {
        let tasks = Recorder::default();
        let mut state = LoginState::new();
        state.username.set_value("13800000000");
        state.password.set_value("secret");

        assert_eq!(state.submit(&tasks), LoginOutcome::Changed);
        assert!(state.pending);
        assert!(state.submit.pending);
        assert_eq!(state.submit(&tasks), LoginOutcome::Unchanged);
        assert_eq!(tasks.0.borrow().len(), 1);
        assert_eq!(
            tasks.0.borrow()[0],
            Task::Login {
                username: "13800000000".into(),
                password: "secret".into()
            }
        );

        assert_eq!(
            state.reply(Err(CommandError::InvalidCredentials)),
            LoginOutcome::Changed
        );
        assert!(!state.pending);
        assert_eq!(state.reply(Ok(())), LoginOutcome::LoggedIn);
    }

    #[test]
    fn test_limits() {
        let mut state = LoginState::new();
        state.username.set_value("1234567890123");
        assert_eq!(state.username.value(), "12345678901");
        state.password.set_value("pw");
        assert_eq!(state.password.display_text(), "**");
    }
}
