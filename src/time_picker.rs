//!
//! Time picker.
//!
//! A text field for `HH:MM:SS` plus a popover with three wheels for
//! hours, minutes and seconds, a `Now` and an `OK` button.
//!
//! Each wheel is a [ScrollContainerState]. The cell of the current
//! value is kept in the middle of its wheel, the first time the popover
//! is shown this happens instantly, later changes scroll smoothly. The
//! smooth scroll needs [TimePickerState::tick] to be called regularly.
//!
//! The picker only changes the time part of the shared value, except for
//! `Now` which replaces the whole value with the current instant.
//!
//! ```rust ignore
//! let picker = TimePicker::new().styles(theme.time_style());
//! picker.render(time_area, buf, &mut state.time);
//! // ... other widgets
//! picker.render_popup(buf, &mut state.time);
//! ```
//!
use crate::_private::NonExhaustive;
use crate::button::event::ButtonOutcome;
use crate::button::{Button, ButtonState};
use crate::click_out::event::ClickOutOutcome;
use crate::click_out::ClickOutState;
use crate::popover::{Placement, Popover, PopoverStyle};
use crate::scrolled::event::ScrollOutcome;
use crate::scrolled::{ScrollBehavior, ScrollContainer, ScrollContainerState};
use crate::temporal::event::PickerOutcome;
use crate::temporal::{SharedTemporal, Temporal};
use crate::text_field::event::TextOutcome;
use crate::text_field::{TextField, TextFieldState};
use crate::util::{fallback_popup_style, item_at, render_label, revert_style};
use chrono::NaiveTime;
use log::debug;
use rat_event::{ct_event, ConsumedEvent, HandleEvent, MouseOnly, Popup, Regular};
use rat_focus::{FocusBuilder, FocusFlag, HasFocus};
use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect, Size};
use ratatui::style::{Style, Stylize};
use ratatui::widgets::{Block, StatefulWidget, Widget};

/// Size of the popover content.
const CONTENT_SIZE: Size = Size::new(17, 8);
/// Width of one wheel including the thumb.
const WHEEL_WIDTH: u16 = 5;

/// One field of the time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeField {
    Hour,
    Minute,
    Second,
}

impl TimeField {
    /// Number of values.
    pub fn count(self) -> u32 {
        match self {
            TimeField::Hour => 24,
            TimeField::Minute | TimeField::Second => 60,
        }
    }

    pub fn get(self, value: Temporal) -> u32 {
        match self {
            TimeField::Hour => value.hour(),
            TimeField::Minute => value.minute(),
            TimeField::Second => value.second(),
        }
    }

    /// Replace this field. None if n is out of range.
    pub fn set(self, value: Temporal, n: u32) -> Option<Temporal> {
        match self {
            TimeField::Hour => value.with_hour(n),
            TimeField::Minute => value.with_minute(n),
            TimeField::Second => value.with_second(n),
        }
    }
}

/// Time picker widget.
#[derive(Debug, Clone)]
pub struct TimePicker<'a> {
    style: Style,
    focus_style: Option<Style>,
    invalid_style: Option<Style>,
    popup_style: Style,
    select_style: Option<Style>,
    thumb_style: Option<Style>,
    button_style: Option<Style>,
    popover: Popover<'a>,
}

/// Combined styles.
#[derive(Debug, Clone)]
pub struct TimePickerStyle {
    /// Text field.
    pub style: Style,
    pub focus: Option<Style>,
    pub invalid: Option<Style>,
    /// Popover
    pub popup: PopoverStyle,
    /// Cell of the current value.
    pub select: Option<Style>,
    /// Wheel thumb.
    pub thumb: Option<Style>,
    /// Now and OK.
    pub button: Option<Style>,

    pub non_exhaustive: NonExhaustive,
}

/// One wheel.
#[derive(Debug)]
pub struct WheelState {
    /// Field of this wheel.
    pub field: TimeField,
    /// Scrolling.
    /// __read+write__
    pub scroll: ScrollContainerState,
    /// Visible cells.
    /// __readonly__. renewed for each render.
    pub cell_areas: Vec<Rect>,
    /// Values of the visible cells.
    /// __readonly__. renewed for each render.
    pub cells: Vec<u32>,
    /// Value last moved to the center.
    centered: Option<u32>,
}

/// State & event-handling.
#[derive(Debug)]
pub struct TimePickerState {
    /// Area of the text field.
    /// __readonly__. renewed for each render.
    pub area: Rect,
    /// Complete popover area. Empty while closed.
    /// __readonly__. renewed for each render.
    pub popup_area: Rect,
    /// Popover content area.
    /// __readonly__. renewed for each render.
    pub popup_inner: Rect,

    /// Hours, minutes, seconds.
    pub wheels: [WheelState; 3],
    /// Wheel for the keyboard.
    /// __read+write__
    pub selected_wheel: usize,
    /// Now
    pub now_button: ButtonState,
    /// OK
    pub ok_button: ButtonState,

    /// The value.
    /// __read+write__
    pub value: SharedTemporal,
    /// Source for `Now`.
    /// __read+write__
    pub clock: fn() -> Temporal,
    /// Popover is shown.
    /// __readonly__ use show_popup()/hide_popup().
    pub popup_active: bool,

    /// Text field. Its focus flag is the focus of the picker.
    /// __read+write__
    pub text: TextFieldState,
    /// Click-out detection for the popover.
    /// __read+write__
    pub click_out: ClickOutState,

    /// Time last written into the text field.
    synced: Option<NaiveTime>,
    /// Text has been edited but doesn't parse.
    dirty: bool,
    /// Focus as seen by the last event.
    was_focused: bool,

    pub non_exhaustive: NonExhaustive,
}

impl Default for TimePickerStyle {
    fn default() -> Self {
        Self {
            style: Default::default(),
            focus: None,
            invalid: None,
            popup: Default::default(),
            select: None,
            thumb: None,
            button: None,
            non_exhaustive: NonExhaustive,
        }
    }
}

impl Default for TimePicker<'_> {
    fn default() -> Self {
        Self {
            style: Default::default(),
            focus_style: None,
            invalid_style: None,
            popup_style: Default::default(),
            select_style: None,
            thumb_style: None,
            button_style: None,
            popover: Popover::new()
                .placement(Placement::BelowOrAbove)
                .block(Block::bordered()),
        }
    }
}

impl<'a> TimePicker<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set all styles.
    pub fn styles(mut self, styles: TimePickerStyle) -> Self {
        self.style = styles.style;
        if styles.focus.is_some() {
            self.focus_style = styles.focus;
        }
        if styles.invalid.is_some() {
            self.invalid_style = styles.invalid;
        }
        if styles.select.is_some() {
            self.select_style = styles.select;
        }
        if styles.thumb.is_some() {
            self.thumb_style = styles.thumb;
        }
        if styles.button.is_some() {
            self.button_style = styles.button;
        }
        self.popup_style = styles.popup.style;
        self.popover = self.popover.styles(styles.popup);
        self
    }

    /// Base style of the text field.
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Text field when focused.
    pub fn focus_style(mut self, style: Style) -> Self {
        self.focus_style = Some(style);
        self
    }

    /// Base style of the popover.
    pub fn popup_style(mut self, style: Style) -> Self {
        self.popup_style = style;
        self.popover = self.popover.style(style);
        self
    }

    /// Cell of the current value.
    pub fn select_style(mut self, style: Style) -> Self {
        self.select_style = Some(style);
        self
    }

    /// Placement of the popover.
    pub fn placement(mut self, placement: Placement) -> Self {
        self.popover = self.popover.placement(placement);
        self
    }

    /// Render the popover. Call this after all other widgets.
    pub fn render_popup(&self, buf: &mut Buffer, state: &mut TimePickerState) {
        if !state.popup_active {
            state.clear_popup_areas();
            state.click_out.set_inside(&[state.area]);
            return;
        }

        let area = self.popover.layout(state.area, CONTENT_SIZE, buf.area);
        (&self.popover).render(area, buf);
        state.popup_area = area;
        let inner = self.popover.inner(area);
        state.popup_inner = inner;
        state.click_out.set_inside(&[state.area, area]);

        let base = fallback_popup_style(self.popup_style);
        let select = self.select_style.unwrap_or_else(|| revert_style(base));
        let thumb = self.thumb_style.unwrap_or(base);
        let value = state.value.get();
        let focused = state.is_focused();

        for (i, wheel) in state.wheels.iter_mut().enumerate() {
            let wheel_area = Rect::new(
                inner.x + i as u16 * (WHEEL_WIDTH + 1),
                inner.y,
                WHEEL_WIDTH,
                inner.height.saturating_sub(1),
            )
            .intersection(inner);

            ScrollContainer::new()
                .style(base)
                .thumb_style(thumb)
                .content_len(wheel.field.count() as usize)
                .render(wheel_area, buf, &mut wheel.scroll);

            let current = wheel.field.get(value);
            if wheel.centered != Some(current) {
                let behavior = if wheel.centered.is_none() {
                    ScrollBehavior::Instant
                } else {
                    ScrollBehavior::Smooth
                };
                wheel.scroll.scroll_to_center(current as usize, behavior);
                wheel.centered = Some(current);
            }

            wheel.cells.clear();
            wheel.cell_areas.clear();
            let cells = wheel.scroll.inner;
            for row in 0..cells.height {
                let n = wheel.scroll.scroll_top as u32 + row as u32;
                if n >= wheel.field.count() {
                    break;
                }
                let cell_area = Rect::new(cells.x, cells.y + row, cells.width, 1);
                let mut style = if n == current { select } else { base };
                if n == current && focused && i == state.selected_wheel {
                    style = style.underlined();
                }
                render_label(buf, cell_area, &format!(" {:02} ", n), style);
                wheel.cells.push(n);
                wheel.cell_areas.push(cell_area);
            }
        }

        let button_style = self.button_style.unwrap_or_else(|| base.bold());
        let row = inner.y + inner.height.saturating_sub(1);
        Button::new("Now")
            .style(button_style)
            .render(Rect::new(inner.x, row, 5, 1).intersection(inner), buf, &mut state.now_button);
        Button::new("OK").style(button_style).render(
            Rect::new(inner.right().saturating_sub(4), row, 4, 1).intersection(inner),
            buf,
            &mut state.ok_button,
        );
    }
}

impl StatefulWidget for &TimePicker<'_> {
    type State = TimePickerState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        render_ref(self, area, buf, state);
    }
}

impl StatefulWidget for TimePicker<'_> {
    type State = TimePickerState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        render_ref(&self, area, buf, state);
    }
}

fn render_ref(widget: &TimePicker<'_>, area: Rect, buf: &mut Buffer, state: &mut TimePickerState) {
    state.area = area;
    state.sync_text(false);

    let mut field = TextField::new().style(widget.style).placeholder("HH:MM:SS");
    if let Some(focus_style) = widget.focus_style {
        field = field.focus_style(focus_style);
    }
    if let Some(invalid_style) = widget.invalid_style {
        field = field.invalid_style(invalid_style);
    }
    field.render(area, buf, &mut state.text);
}

impl WheelState {
    pub fn new(field: TimeField) -> Self {
        Self {
            field,
            scroll: Default::default(),
            cell_areas: Default::default(),
            cells: Default::default(),
            centered: None,
        }
    }

    fn clear_areas(&mut self) {
        self.scroll.clear_areas();
        self.cell_areas.clear();
        self.cells.clear();
    }
}

impl Default for TimePickerState {
    fn default() -> Self {
        Self {
            area: Default::default(),
            popup_area: Default::default(),
            popup_inner: Default::default(),
            wheels: [
                WheelState::new(TimeField::Hour),
                WheelState::new(TimeField::Minute),
                WheelState::new(TimeField::Second),
            ],
            selected_wheel: 0,
            now_button: Default::default(),
            ok_button: Default::default(),
            value: Default::default(),
            clock: Temporal::now,
            popup_active: false,
            text: TextFieldState::new()
                .with_max_len(8)
                .with_filter(|c| c.is_ascii_digit() || c == ':'),
            click_out: Default::default(),
            synced: None,
            dirty: false,
            was_focused: false,
            non_exhaustive: NonExhaustive,
        }
    }
}

impl HasFocus for TimePickerState {
    fn build(&self, builder: &mut FocusBuilder) {
        builder.leaf_widget(self);
    }

    fn focus(&self) -> FocusFlag {
        self.text.focus.clone()
    }

    fn area(&self) -> Rect {
        self.area
    }
}

impl TimePickerState {
    pub fn new(value: SharedTemporal) -> Self {
        Self {
            value,
            ..Default::default()
        }
    }

    pub fn named(name: &str, value: SharedTemporal) -> Self {
        let mut z = Self::new(value);
        z.text.focus = FocusFlag::new().with_name(name);
        z
    }

    /// Use another clock for `Now`.
    pub fn with_clock(mut self, clock: fn() -> Temporal) -> Self {
        self.clock = clock;
        self
    }

    pub fn clear_areas(&mut self) {
        self.area = Rect::default();
        self.text.clear_areas();
        self.clear_popup_areas();
    }

    fn clear_popup_areas(&mut self) {
        self.popup_area = Rect::default();
        self.popup_inner = Rect::default();
        for wheel in &mut self.wheels {
            wheel.clear_areas();
        }
        self.now_button.clear_areas();
        self.ok_button.clear_areas();
    }

    pub fn is_popup_active(&self) -> bool {
        self.popup_active
    }

    /// Open the popover. The wheels center on the value
    /// without animation.
    pub fn show_popup(&mut self) {
        if !self.popup_active {
            debug!("time picker open");
            for wheel in &mut self.wheels {
                wheel.centered = None;
            }
        }
        self.popup_active = true;
        self.click_out.attach();
    }

    pub fn hide_popup(&mut self) {
        if self.popup_active {
            debug!("time picker close");
        }
        self.popup_active = false;
        self.click_out.detach();
        for wheel in &mut self.wheels {
            wheel.scroll.end_drag();
            wheel.scroll.animation = None;
        }
    }

    /// Text of the field.
    pub fn text(&self) -> &str {
        self.text.value()
    }

    /// Write the time into the text field.
    ///
    /// Without force this only happens if the time has changed since
    /// the last sync and no unparsed edit is pending.
    pub fn sync_text(&mut self, force: bool) {
        let value = self.value.get();
        if force || (!self.dirty && self.synced != Some(value.time())) {
            self.text.set_value(value.time_text());
            self.text.invalid = false;
            self.synced = Some(value.time());
            self.dirty = false;
        }
    }

    /// Take the text of the field as the new time, if it is valid.
    pub fn commit_text(&mut self) -> PickerOutcome {
        let parsed = self.value.get().parse_time_text(self.text.value());
        match parsed {
            Some(value) => {
                self.dirty = false;
                self.text.invalid = false;
                self.synced = Some(value.time());
                if self.value.set(value) {
                    PickerOutcome::Value
                } else {
                    PickerOutcome::Changed
                }
            }
            None => {
                self.dirty = true;
                self.text.invalid = self.text.len() >= 8;
                PickerOutcome::Changed
            }
        }
    }

    /// Track focus changes. Opens the popover when the focus arrives,
    /// closes it and cleans up the text when the focus leaves.
    pub fn sync_focus(&mut self) -> bool {
        let focused = self.is_focused();
        if focused == self.was_focused {
            return false;
        }
        self.was_focused = focused;
        if focused {
            self.show_popup();
        } else {
            self.hide_popup();
            self.sync_text(true);
        }
        true
    }

    /// Close the popover on a mouse click outside of field and popover.
    /// The click itself is left for others.
    pub fn handle_click_out(&mut self, event: &crossterm::event::Event) -> ClickOutOutcome {
        let r = self.click_out.handle(event, Popup);
        if r == ClickOutOutcome::Outside {
            self.hide_popup();
        }
        r
    }

    /// Advance the smooth scrolling of the wheels.
    pub fn tick(&mut self) -> bool {
        let mut changed = false;
        for wheel in &mut self.wheels {
            changed |= wheel.scroll.tick();
        }
        changed
    }

    /// Any wheel still moving?
    pub fn is_animating(&self) -> bool {
        self.wheels.iter().any(|v| v.scroll.is_animating())
    }

    /// Set one field of the value.
    pub fn set_field(&mut self, field: TimeField, n: u32) -> PickerOutcome {
        if self.value.try_update(|v| field.set(v, n)) {
            self.sync_text(true);
            PickerOutcome::Value
        } else {
            PickerOutcome::Unchanged
        }
    }

    /// Replace the value with the current instant.
    pub fn now(&mut self) -> PickerOutcome {
        let now = (self.clock)();
        if self.value.set(now) {
            self.sync_text(true);
            PickerOutcome::Value
        } else {
            PickerOutcome::Changed
        }
    }

    /// Step the field of the selected wheel, wrapping around.
    fn step_selected(&mut self, delta: i32) -> PickerOutcome {
        let field = self.wheels[self.selected_wheel.min(2)].field;
        let count = field.count() as i32;
        let n = (field.get(self.value.get()) as i32 + delta).rem_euclid(count);
        self.set_field(field, n as u32)
    }

    fn select_wheel(&mut self, delta: isize) -> PickerOutcome {
        let selected = self.selected_wheel.saturating_add_signed(delta).min(2);
        if selected != self.selected_wheel {
            self.selected_wheel = selected;
            PickerOutcome::Changed
        } else {
            PickerOutcome::Unchanged
        }
    }

    fn handle_popup_keys(&mut self, event: &crossterm::event::Event) -> PickerOutcome {
        match event {
            ct_event!(keycode press Left) => self.select_wheel(-1),
            ct_event!(keycode press Right) => self.select_wheel(1),
            ct_event!(keycode press Up) => self.step_selected(-1),
            ct_event!(keycode press Down) => self.step_selected(1),
            ct_event!(keycode press Enter) | ct_event!(keycode press Esc) => {
                self.hide_popup();
                PickerOutcome::Changed
            }
            _ => PickerOutcome::Continue,
        }
    }
}

impl From<ScrollOutcome> for PickerOutcome {
    fn from(value: ScrollOutcome) -> Self {
        match value {
            ScrollOutcome::Continue => PickerOutcome::Continue,
            ScrollOutcome::Unchanged => PickerOutcome::Unchanged,
            ScrollOutcome::Changed => PickerOutcome::Changed,
            ScrollOutcome::Scrolled => PickerOutcome::Changed,
        }
    }
}

impl HandleEvent<crossterm::event::Event, Popup, PickerOutcome> for TimePickerState {
    fn handle(&mut self, event: &crossterm::event::Event, _qualifier: Popup) -> PickerOutcome {
        if !self.popup_active {
            return PickerOutcome::Continue;
        }

        // every wheel must see the mouse moves for its hover state.
        let mut r = PickerOutcome::Continue;
        for wheel in &mut self.wheels {
            r = r.max(wheel.scroll.handle(event, MouseOnly).into());
        }
        if r.is_consumed() {
            return r;
        }

        match self.now_button.handle(event, MouseOnly) {
            ButtonOutcome::Pressed => return self.now(),
            ButtonOutcome::Continue => {}
            r => return PickerOutcome::from(rat_event::Outcome::from(r)),
        }
        match self.ok_button.handle(event, MouseOnly) {
            ButtonOutcome::Pressed => {
                self.hide_popup();
                return PickerOutcome::Changed;
            }
            ButtonOutcome::Continue => {}
            r => return PickerOutcome::from(rat_event::Outcome::from(r)),
        }

        match event {
            ct_event!(mouse down Left for x,y)
                if self.popup_area.contains(Position::new(*x, *y)) =>
            {
                let hit = self.wheels.iter().find_map(|wheel| {
                    item_at(&wheel.cell_areas, *x, *y)
                        .and_then(|i| wheel.cells.get(i))
                        .map(|n| (wheel.field, *n))
                });
                match hit {
                    Some((field, n)) => self.set_field(field, n).max(PickerOutcome::Changed),
                    None => PickerOutcome::Unchanged,
                }
            }
            crossterm::event::Event::Mouse(m)
                if self.popup_area.contains(Position::new(m.column, m.row)) =>
            {
                PickerOutcome::Unchanged
            }
            _ => PickerOutcome::Continue,
        }
    }
}

impl HandleEvent<crossterm::event::Event, Regular, PickerOutcome> for TimePickerState {
    fn handle(&mut self, event: &crossterm::event::Event, _qualifier: Regular) -> PickerOutcome {
        let focus_changed = self.sync_focus();

        let mut r = if self.is_focused() {
            match event {
                ct_event!(keycode press F(4)) | ct_event!(keycode press ALT-Down) => {
                    if self.popup_active {
                        self.hide_popup();
                    } else {
                        self.show_popup();
                    }
                    PickerOutcome::Changed
                }
                _ if self.popup_active => self.handle_popup_keys(event),
                _ => PickerOutcome::Continue,
            }
        } else {
            PickerOutcome::Continue
        };

        if r == PickerOutcome::Continue {
            r = match self.text.handle(event, Regular) {
                TextOutcome::TextChanged => self.commit_text(),
                r => r.into(),
            };
        }

        // a click into the focused field reopens the popover.
        if let ct_event!(mouse down Left for x,y) = event {
            if self.is_focused()
                && !self.popup_active
                && self.area.contains(Position::new(*x, *y))
            {
                self.show_popup();
                r = r.max(PickerOutcome::Changed);
            }
        }

        if focus_changed {
            r.max(PickerOutcome::Changed)
        } else {
            r
        }
    }
}

/// Handle all events.
/// Key events are only processed if focus is true.
/// Mouse events are processed if they are in range.
pub fn handle_events(
    state: &mut TimePickerState,
    focus: bool,
    event: &crossterm::event::Event,
) -> PickerOutcome {
    state.text.focus.set(focus);
    let r = state.handle(event, Popup);
    if r == PickerOutcome::Continue {
        state.handle(event, Regular)
    } else {
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value() -> SharedTemporal {
        SharedTemporal::new(Temporal::from_ymd_hms(2024, 7, 10, 8, 30, 15).expect("valid"))
    }

    fn noon() -> Temporal {
        Temporal::from_ymd_hms(2025, 1, 2, 12, 0, 0).unwrap_or_default()
    }

    #[test]
    fn test_fields() {
        let v = value().get();
        assert_eq!(TimeField::Hour.get(v), 8);
        assert_eq!(TimeField::Minute.get(v), 30);
        assert_eq!(TimeField::Second.count(), 60);
        assert_eq!(TimeField::Hour.set(v, 24), None);
        assert_eq!(TimeField::Second.set(v, 59).map(|v| v.time_text()), Some("08:30:59".into()));
    }

    #[test]
    fn test_set_field_keeps_rest() {
        let mut state = TimePickerState::new(value());
        assert_eq!(state.set_field(TimeField::Minute, 45), PickerOutcome::Value);
        let v = state.value.get();
        assert_eq!(v.time_text(), "08:45:15");
        assert_eq!(v.date_text(), "2024-07-10");
        assert_eq!(state.text(), "08:45:15");
        assert_eq!(state.set_field(TimeField::Minute, 45), PickerOutcome::Unchanged);
    }

    #[test]
    fn test_now() {
        let mut state = TimePickerState::new(value()).with_clock(noon);
        assert_eq!(state.now(), PickerOutcome::Value);
        assert_eq!(state.value.get(), noon());
        assert_eq!(state.now(), PickerOutcome::Changed);
    }

    #[test]
    fn test_commit_text() {
        let mut state = TimePickerState::new(value());
        state.text.set_value("7:05:09");
        assert_eq!(state.commit_text(), PickerOutcome::Value);
        assert_eq!(state.value.get().time_text(), "07:05:09");

        state.text.set_value("24:00:00");
        assert_eq!(state.commit_text(), PickerOutcome::Changed);
        assert_eq!(state.value.get().time_text(), "07:05:09");
        assert!(state.text.invalid);
    }

    #[test]
    fn test_keys_wrap() {
        let mut state = TimePickerState::new(value());
        state.selected_wheel = 0;
        state.value.update(|v| v.with_hour(0).unwrap_or(v));
        state.step_selected(-1);
        assert_eq!(state.value.get().hour(), 23);
        state.select_wheel(5);
        assert_eq!(state.selected_wheel, 2);
        state.step_selected(1);
        assert_eq!(state.value.get().second(), 16);
    }
}
