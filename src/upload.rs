//!
//! Upload screen.
//!
//! Date and time of the run, the mileage as a share of the daily
//! limit, the track file and a map of the track.
//!
//! Date and time follow the clock until the user picks a value.
//! The daily limit is fetched when the screen is mounted.
//!
use crate::_private::NonExhaustive;
use crate::button::event::ButtonOutcome;
use crate::button::{Button, ButtonState};
use crate::commands::CommandError;
use crate::date_picker::{DatePicker, DatePickerState};
use crate::event::{PickerOutcome, UploadOutcome};
use crate::slider::{Slider, SliderState};
use crate::tasks::{Spawn, Task};
use crate::temporal::{SharedTemporal, Temporal};
use crate::time_picker::{TimePicker, TimePickerState};
use crate::track::Track;
use crate::track_view::TrackView;
use crate::upload::event::RecordOutcome;
use crate::uploader::{AcceptList, CandidateFile, Uploader, UploaderState};
use crate::util::render_label;
use log::{debug, error, info, warn};
use rat_event::{flow, ConsumedEvent, HandleEvent, Outcome, Popup, Regular};
use rat_focus::{Focus, FocusBuilder, FocusFlag, HasFocus};
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::widgets::{Block, StatefulWidget, Widget};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Interval of the clock.
pub const CLOCK_TICK: Duration = Duration::from_secs(1);

/// Format a mileage.
pub fn format_mileage(km: f64) -> String {
    format!("{:.2}km", km)
}

/// Upload screen.
#[derive(Debug, Clone)]
pub struct UploadForm {
    style: Style,
    field_style: Style,
    focus_style: Style,
    popup_style: Style,
    button_style: Style,
}

/// State & event-handling.
#[derive(Debug)]
pub struct UploadFormState {
    /// Complete area.
    /// __readonly__. renewed for each render.
    pub area: Rect,

    /// Date and time of the run.
    /// __read+write__
    pub value: SharedTemporal,
    /// __read+write__
    pub date: DatePickerState,
    /// __read+write__
    pub time: TimePickerState,
    /// Share of the daily limit in percent.
    /// __read+write__
    pub slider: SliderState,
    /// __read+write__
    pub uploader: UploaderState,
    /// __read+write__
    pub submit: ButtonState,

    /// Maximum mileage in km. 0 until the backend answers.
    /// __readonly__
    pub daily_limit: f64,
    /// Content of the selected file.
    /// __readonly__
    pub geojson: Option<String>,
    /// Parsed track.
    /// __readonly__
    pub track: Option<Track>,
    /// Center of the map without a track `(lat, lon)`.
    /// __read+write__
    pub map_center: (f64, f64),

    /// Date and time follow the clock.
    /// __readonly__
    pub ticking: bool,
    /// Last clock update.
    last_tick: Option<Instant>,
    /// Upload is running.
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
    pub enum RecordOutcome {
        /// The given event was not handled at all.
        Continue,
        /// The event was handled, no repaint necessary.
        Unchanged,
        /// The event was handled, repaint necessary.
        Changed,
        /// The user wants to upload.
        Submit,
        /// Upload succeeded.
        Uploaded,
    }

    impl ConsumedEvent for RecordOutcome {
        fn is_consumed(&self) -> bool {
            *self != RecordOutcome::Continue
        }
    }

    impl From<Outcome> for RecordOutcome {
        fn from(value: Outcome) -> Self {
            match value {
                Outcome::Continue => RecordOutcome::Continue,
                Outcome::Unchanged => RecordOutcome::Unchanged,
                Outcome::Changed => RecordOutcome::Changed,
            }
        }
    }

    impl From<RecordOutcome> for Outcome {
        fn from(value: RecordOutcome) -> Self {
            match value {
                RecordOutcome::Continue => Outcome::Continue,
                RecordOutcome::Unchanged => Outcome::Unchanged,
                RecordOutcome::Changed => Outcome::Changed,
                RecordOutcome::Submit => Outcome::Changed,
                RecordOutcome::Uploaded => Outcome::Changed,
            }
        }
    }
}

impl Default for UploadForm {
    fn default() -> Self {
        Self {
            style: Style::new(),
            field_style: Style::new().bg(Color::DarkGray),
            focus_style: Style::new().black().on_cyan(),
            popup_style: Style::new().white().on_black(),
            button_style: Style::new().black().on_gray(),
        }
    }
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn focus_style(mut self, style: Style) -> Self {
        self.focus_style = style;
        self
    }
}

impl StatefulWidget for UploadForm {
    type State = UploadFormState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        state.area = area;
        buf.set_style(area, self.style);

        let [l_when, l_mileage, _, l_track, l_map, _, l_submit] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .horizontal_margin(1)
        .areas(area);

        let [date_label, date_field, _, time_label, time_field] = Layout::horizontal([
            Constraint::Length(10),
            Constraint::Length(11),
            Constraint::Length(2),
            Constraint::Length(6),
            Constraint::Length(9),
        ])
        .areas(l_when);
        render_label(buf, date_label, "Date", self.style);
        let date = DatePicker::new()
            .style(self.field_style)
            .focus_style(self.focus_style)
            .popup_style(self.popup_style);
        (&date).render(date_field, buf, &mut state.date);
        render_label(buf, time_label, "Time", self.style);
        let time = TimePicker::new()
            .style(self.field_style)
            .focus_style(self.focus_style)
            .popup_style(self.popup_style);
        (&time).render(time_field, buf, &mut state.time);

        let [mileage_label, mileage_slider, _, mileage_value] = Layout::horizontal([
            Constraint::Length(10),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(22),
        ])
        .areas(l_mileage);
        render_label(buf, mileage_label, "Mileage", self.style);
        Slider::new()
            .style(self.field_style)
            .focus_style(self.focus_style)
            .render(mileage_slider, buf, &mut state.slider);
        render_label(
            buf,
            mileage_value,
            &format!(
                "{} / {}",
                format_mileage(state.mileage()),
                format_mileage(state.daily_limit)
            ),
            self.style,
        );

        let uploader = Uploader::new()
            .style(self.style)
            .focus_style(self.focus_style);
        (&uploader).render(l_track, buf, &mut state.uploader);

        let mut map = TrackView::new()
            .track(state.track.as_ref())
            .center(state.map_center)
            .block(Block::bordered().title(" Map "));
        if let Some(track) = &state.track {
            let title = format!(" Map {} ", format_mileage(track.length_km()));
            map = map.block(Block::bordered().title(title));
        }
        map.render(l_map, buf);

        let button = Button::new(" Upload ")
            .pending_label(" Uploading... ")
            .style(self.button_style)
            .focus_style(self.focus_style);
        let [submit] = Layout::horizontal([Constraint::Length(button.width(&state.submit))])
            .flex(Flex::Center)
            .areas(l_submit);
        button.render(submit, buf, &mut state.submit);

        // popovers last
        date.render_popup(buf, &mut state.date);
        time.render_popup(buf, &mut state.time);
        uploader.render_popup(buf, &mut state.uploader);
    }
}

impl Default for UploadFormState {
    fn default() -> Self {
        Self::new(AcceptList::default(), PathBuf::from("."), (0.0, 0.0))
    }
}

impl HasFocus for UploadFormState {
    fn build(&self, builder: &mut FocusBuilder) {
        builder.widget(&self.date);
        builder.widget(&self.time);
        builder.widget(&self.slider);
        builder.widget(&self.uploader);
        builder.widget(&self.submit);
    }

    fn focus(&self) -> FocusFlag {
        self.focus.clone()
    }

    fn area(&self) -> Rect {
        self.area
    }
}

impl UploadFormState {
    pub fn new(accept: AcceptList, start_dir: impl Into<PathBuf>, map_center: (f64, f64)) -> Self {
        let value = SharedTemporal::new(Temporal::now());
        let mut z = Self {
            area: Default::default(),
            date: DatePickerState::named("date", value.clone()),
            time: TimePickerState::named("time", value.clone()),
            value,
            slider: SliderState::named("mileage"),
            uploader: UploaderState::named("track", accept, start_dir),
            submit: ButtonState::named("upload"),
            daily_limit: 0.0,
            geojson: None,
            track: None,
            map_center,
            ticking: true,
            last_tick: None,
            pending: false,
            focus: FocusFlag::new().with_name("upload-screen"),
            non_exhaustive: NonExhaustive,
        };
        z.date.sync_text(true);
        z.time.sync_text(true);
        z
    }

    /// Use this clock for the time.
    pub fn with_clock(mut self, clock: fn() -> Temporal) -> Self {
        self.time.clock = clock;
        self.value.set(clock());
        self.date.sync_text(true);
        self.time.sync_text(true);
        self
    }

    /// Focus for the form.
    pub fn build_focus(&self) -> Focus {
        let mut fb = FocusBuilder::new(None);
        fb.widget(self);
        fb.build()
    }

    /// Cursor position of the focused text field.
    pub fn screen_cursor(&self) -> Option<(u16, u16)> {
        self.date
            .text
            .screen_cursor()
            .or_else(|| self.time.text.screen_cursor())
    }

    /// Screen is shown. Fetches the daily limit.
    pub fn mount(&mut self, tasks: &dyn Spawn) {
        if let Err(e) = tasks.spawn(Task::DailyLimit) {
            error!("Error getting daily limit: {:?}", e);
        }
    }

    /// Mileage in km.
    pub fn mileage(&self) -> f64 {
        self.slider.value() * self.daily_limit / 100.0
    }

    /// Clock and animations.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = self.time.tick();

        if self.ticking {
            let due = match self.last_tick {
                Some(last) => now.saturating_duration_since(last) >= CLOCK_TICK,
                None => true,
            };
            if due {
                self.last_tick = Some(now);
                if self.value.set((self.time.clock)()) {
                    self.date.sync_text(false);
                    self.time.sync_text(false);
                    changed = true;
                }
            }
        }
        changed
    }

    /// Close popovers on outside clicks. Never consumes the event.
    pub fn handle_click_out(&mut self, event: &crossterm::event::Event) -> Outcome {
        let r = Outcome::from(self.date.handle_click_out(event))
            .max(Outcome::from(self.time.handle_click_out(event)))
            .max(Outcome::from(self.uploader.handle_click_out(event)));
        match r {
            Outcome::Continue => Outcome::Continue,
            _ => Outcome::Changed,
        }
    }

    /// The user picked a value, the clock stops.
    fn picked(&mut self, r: PickerOutcome) -> RecordOutcome {
        if r == PickerOutcome::Value && self.ticking {
            debug!("clock stopped");
            self.ticking = false;
        }
        Outcome::from(r).into()
    }

    /// Read and parse the file.
    pub fn load_track(&mut self, file: &CandidateFile) -> bool {
        self.geojson = None;
        self.track = None;
        match file.read_text() {
            Ok(text) => {
                match Track::parse(&text) {
                    Ok(track) => {
                        debug!("track with {} points", track.len());
                        self.track = Some(track);
                    }
                    Err(e) => error!("Error reading track: {}", e),
                }
                self.geojson = Some(text);
                true
            }
            Err(e) => {
                error!("Error reading track: {}", e);
                false
            }
        }
    }

    fn selected(&mut self, r: UploadOutcome) -> RecordOutcome {
        if r == UploadOutcome::Selected {
            if let Some(file) = self.uploader.file.clone() {
                self.load_track(&file);
            }
        }
        Outcome::from(r).into()
    }

    fn set_pending(&mut self, pending: bool) {
        self.pending = pending;
        self.submit.set_pending(pending);
    }

    /// Start the upload.
    pub fn submit(&mut self, tasks: &dyn Spawn) -> RecordOutcome {
        if self.pending {
            debug!("upload already pending");
            return RecordOutcome::Unchanged;
        }
        let Some(file) = self.uploader.file.clone() else {
            warn!("No file selected!");
            return RecordOutcome::Changed;
        };
        // the file may have changed or vanished since it was selected.
        if !self.load_track(&file) {
            return RecordOutcome::Changed;
        }
        let Some(geojson) = self.geojson.clone() else {
            return RecordOutcome::Changed;
        };

        let task = Task::Upload {
            geojson,
            mileage: self.mileage(),
            end_time: self.value.get().timestamp_millis(),
        };
        match tasks.spawn(task) {
            Ok(()) => self.set_pending(true),
            Err(e) => error!("Error uploading: {:?}", e),
        }
        RecordOutcome::Changed
    }

    /// Result of the daily limit task.
    pub fn reply_daily_limit(&mut self, result: Result<f64, CommandError>) -> RecordOutcome {
        match result {
            Ok(limit) => {
                debug!("daily limit {}", limit);
                self.daily_limit = limit;
            }
            Err(e) => error!("Error getting daily limit: {}", e),
        }
        RecordOutcome::Changed
    }

    /// Result of the upload task.
    pub fn reply_upload(&mut self, result: Result<(), CommandError>) -> RecordOutcome {
        self.set_pending(false);
        match result {
            Ok(()) => {
                info!("Upload successful!");
                self.uploader.clear();
                self.geojson = None;
                self.track = None;
                RecordOutcome::Uploaded
            }
            Err(e) => {
                error!("Error uploading: {}", e);
                RecordOutcome::Changed
            }
        }
    }
}

impl HandleEvent<crossterm::event::Event, Popup, RecordOutcome> for UploadFormState {
    fn handle(&mut self, event: &crossterm::event::Event, _qualifier: Popup) -> RecordOutcome {
        flow!({
            let r = self.date.handle(event, Popup);
            self.picked(r)
        });
        flow!({
            let r = self.time.handle(event, Popup);
            self.picked(r)
        });
        flow!({
            let r = self.uploader.handle(event, Popup);
            self.selected(r)
        });
        RecordOutcome::Continue
    }
}

impl HandleEvent<crossterm::event::Event, Regular, RecordOutcome> for UploadFormState {
    fn handle(&mut self, event: &crossterm::event::Event, _qualifier: Regular) -> RecordOutcome {
        // popovers follow the focus before any widget sees the event.
        // a focus change alone must not swallow the click that caused it.
        let focus_changed = self.sync_focus();

        let r = self.handle_widgets(event);
        if focus_changed {
            r.max(RecordOutcome::Changed)
        } else {
            r
        }
    }
}

impl UploadFormState {
    /// Open or close the popovers after a focus change.
    pub fn sync_focus(&mut self) -> bool {
        let date = self.date.sync_focus();
        let time = self.time.sync_focus();
        let uploader = self.uploader.sync_focus();
        date || time || uploader
    }

    fn handle_widgets(&mut self, event: &crossterm::event::Event) -> RecordOutcome {
        // a drop goes to the uploader below the mouse, not to the focused field.
        if matches!(event, crossterm::event::Event::Paste(_)) && self.uploader.hover {
            let r = self.uploader.handle(event, Regular);
            return self.selected(r);
        }

        flow!({
            let r = self.date.handle(event, Regular);
            self.picked(r)
        });
        flow!({
            let r = self.time.handle(event, Regular);
            self.picked(r)
        });
        flow!(RecordOutcome::from(self.slider.handle(event, Regular)));
        flow!({
            let r = self.uploader.handle(event, Regular);
            self.selected(r)
        });
        flow!(match self.submit.handle(event, Regular) {
            ButtonOutcome::Pressed => RecordOutcome::Submit,
            ButtonOutcome::Continue => RecordOutcome::Continue,
            ButtonOutcome::Unchanged => RecordOutcome::Unchanged,
            ButtonOutcome::Changed => RecordOutcome::Changed,
        });
        RecordOutcome::Continue
    }
}

/// Handle all events.
///
/// Outside clicks close the popovers but still reach the widget below.
/// Popovers go before the focus, a click into a popover must not
/// move the focus.
pub fn handle_events(
    state: &mut UploadFormState,
    focus: &mut Focus,
    event: &crossterm::event::Event,
) -> RecordOutcome {
    let click_out = RecordOutcome::from(state.handle_click_out(event));

    let r = state.handle(event, Popup);
    if r.is_consumed() {
        return r.max(click_out);
    }

    let f = RecordOutcome::from(focus.handle(event, Regular));
    click_out.max(f).max(state.handle(event, Regular))
}
