//!
//! Date picker.
//!
//! A text field for `YYYY-MM-DD` plus a calendar popover. The popover
//! opens when the field gains the focus and shows one of three views.
//!
//! * Day: the calendar of the current month. The header buttons switch
//!   to the month or year view, `<` and `>` go to the previous or next
//!   month.
//! * Month: the 12 months. Picking one goes back to the day view.
//! * Year: the 12 years starting with the current decade. Picking one
//!   goes on to the month view.
//!
//! The value lives in a [SharedTemporal] owned by the form. The picker
//! only changes its date part, the time of day is kept.
//!
//! The popover is rendered after everything else, its events are handled
//! before anything else.
//!
//! ```rust ignore
//! // render
//! let picker = DatePicker::new().styles(theme.picker_style());
//! picker.render(date_area, buf, &mut state.date);
//! // ... other widgets
//! picker.render_popup(buf, &mut state.date);
//!
//! // events
//! let mut r: Outcome = state.date.handle_click_out(event).into();
//! flow!(state.date.handle(event, Popup));
//! flow!(focus.handle(event, Regular));
//! r = max(r, state.date.handle(event, Regular).into());
//! ```
//!
use crate::_private::NonExhaustive;
use crate::click_out::event::ClickOutOutcome;
use crate::click_out::ClickOutState;
use crate::popover::{Placement, Popover, PopoverStyle};
use crate::temporal::event::PickerOutcome;
use crate::temporal::{days_in_month, decade_start, SharedTemporal, Temporal};
use crate::text_field::event::TextOutcome;
use crate::text_field::{TextField, TextFieldState};
use crate::util::{fallback_popup_style, item_at, render_label, revert_style};
use chrono::{Datelike, Days, NaiveDate};
use log::debug;
use rat_event::{ct_event, HandleEvent, MouseOnly, Popup, Regular};
use rat_focus::{FocusBuilder, FocusFlag, HasFocus};
use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect, Size};
use ratatui::style::{Style, Stylize};
use ratatui::widgets::{Block, StatefulWidget, Widget};

/// Short month names.
pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Weekday header. Weeks start on Sunday.
pub const WEEKDAY_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Size of the popover content.
const CONTENT_SIZE: Size = Size::new(28, 8);

/// Active view of the popover.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PickerView {
    #[default]
    Day,
    Month,
    Year,
}

/// What a cell of the popover stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateCell {
    Day(NaiveDate),
    /// Month, 0-based.
    Month(u32),
    Year(i32),
}

/// Clickable parts of the popover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hit {
    Prev,
    Next,
    MonthButton,
    YearButton,
    Header,
    Cell(DateCell),
}

/// Date picker widget.
#[derive(Debug, Clone)]
pub struct DatePicker<'a> {
    style: Style,
    focus_style: Option<Style>,
    invalid_style: Option<Style>,
    popup_style: Style,
    select_style: Option<Style>,
    dim_style: Option<Style>,
    header_style: Option<Style>,
    popover: Popover<'a>,
}

/// Combined styles.
#[derive(Debug, Clone)]
pub struct DatePickerStyle {
    /// Text field.
    pub style: Style,
    pub focus: Option<Style>,
    pub invalid: Option<Style>,
    /// Popover
    pub popup: PopoverStyle,
    /// Current day, keyboard selection.
    pub select: Option<Style>,
    /// Days of the previous month.
    pub dim: Option<Style>,
    /// Header and weekdays.
    pub header: Option<Style>,

    pub non_exhaustive: NonExhaustive,
}

/// State & event-handling.
#[derive(Debug)]
pub struct DatePickerState {
    /// Area of the text field.
    /// __readonly__. renewed for each render.
    pub area: Rect,
    /// Complete popover area. Empty while closed.
    /// __readonly__. renewed for each render.
    pub popup_area: Rect,
    /// Popover content area.
    /// __readonly__. renewed for each render.
    pub popup_inner: Rect,
    /// Previous page.
    /// __readonly__. renewed for each render.
    pub prev_area: Rect,
    /// Next page.
    /// __readonly__. renewed for each render.
    pub next_area: Rect,
    /// Month button of the day view.
    /// __readonly__. renewed for each render.
    pub month_button_area: Rect,
    /// Year button of the day view.
    /// __readonly__. renewed for each render.
    pub year_button_area: Rect,
    /// Header button of the month and year view.
    /// __readonly__. renewed for each render.
    pub header_button_area: Rect,
    /// Cell areas.
    /// __readonly__. renewed for each render.
    pub cell_areas: Vec<Rect>,
    /// Cell values, same order as the areas.
    /// __readonly__. renewed for each render.
    pub cells: Vec<DateCell>,

    /// The value.
    /// __read+write__
    pub value: SharedTemporal,
    /// Active view.
    /// __read+write__ use set_view().
    pub view: PickerView,
    /// Keyboard selection in the month and year view.
    /// __read+write__
    pub selected: usize,
    /// Popover is shown.
    /// __readonly__ use show_popup()/hide_popup().
    pub popup_active: bool,

    /// Text field. Its focus flag is the focus of the picker.
    /// __read+write__
    pub text: TextFieldState,
    /// Click-out detection for the popover.
    /// __read+write__
    pub click_out: ClickOutState,

    /// Date last written into the text field.
    synced: Option<NaiveDate>,
    /// Text has been edited but doesn't parse.
    dirty: bool,
    /// Focus as seen by the last event.
    was_focused: bool,

    pub non_exhaustive: NonExhaustive,
}

impl Default for DatePickerStyle {
    fn default() -> Self {
        Self {
            style: Default::default(),
            focus: None,
            invalid: None,
            popup: Default::default(),
            select: None,
            dim: None,
            header: None,
            non_exhaustive: NonExhaustive,
        }
    }
}

impl Default for DatePicker<'_> {
    fn default() -> Self {
        Self {
            style: Default::default(),
            focus_style: None,
            invalid_style: None,
            popup_style: Default::default(),
            select_style: None,
            dim_style: None,
            header_style: None,
            popover: Popover::new()
                .placement(Placement::BelowOrAbove)
                .block(Block::bordered()),
        }
    }
}

impl<'a> DatePicker<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set all styles.
    pub fn styles(mut self, styles: DatePickerStyle) -> Self {
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
        if styles.dim.is_some() {
            self.dim_style = styles.dim;
        }
        if styles.header.is_some() {
            self.header_style = styles.header;
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

    /// Current day and keyboard selection.
    pub fn select_style(mut self, style: Style) -> Self {
        self.select_style = Some(style);
        self
    }

    /// Days of the previous month.
    pub fn dim_style(mut self, style: Style) -> Self {
        self.dim_style = Some(style);
        self
    }

    /// Header and weekdays.
    pub fn header_style(mut self, style: Style) -> Self {
        self.header_style = Some(style);
        self
    }

    /// Placement of the popover.
    pub fn placement(mut self, placement: Placement) -> Self {
        self.popover = self.popover.placement(placement);
        self
    }

    /// Block for the popover.
    pub fn popup_block(mut self, block: Block<'a>) -> Self {
        self.popover = self.popover.block(block);
        self
    }

    /// Render the popover. Call this after all other widgets.
    pub fn render_popup(&self, buf: &mut Buffer, state: &mut DatePickerState) {
        if !state.popup_active {
            state.clear_popup_areas();
            state.click_out.set_inside(&[state.area]);
            return;
        }

        let area = self.popover.layout(state.area, CONTENT_SIZE, buf.area);
        (&self.popover).render(area, buf);
        state.popup_area = area;
        state.popup_inner = self.popover.inner(area);
        state.click_out.set_inside(&[state.area, area]);

        let styles = PopupStyles::new(self);
        match state.view {
            PickerView::Day => render_day_view(&styles, buf, state),
            PickerView::Month => render_month_view(&styles, buf, state),
            PickerView::Year => render_year_view(&styles, buf, state),
        }
    }
}

impl StatefulWidget for &DatePicker<'_> {
    type State = DatePickerState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        render_ref(self, area, buf, state);
    }
}

impl StatefulWidget for DatePicker<'_> {
    type State = DatePickerState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        render_ref(&self, area, buf, state);
    }
}

fn render_ref(widget: &DatePicker<'_>, area: Rect, buf: &mut Buffer, state: &mut DatePickerState) {
    state.area = area;
    state.sync_text(false);

    let mut field = TextField::new().style(widget.style).placeholder("YYYY-MM-DD");
    if let Some(focus_style) = widget.focus_style {
        field = field.focus_style(focus_style);
    }
    if let Some(invalid_style) = widget.invalid_style {
        field = field.invalid_style(invalid_style);
    }
    field.render(area, buf, &mut state.text);
}

/// Resolved styles for the popover content.
struct PopupStyles {
    base: Style,
    select: Style,
    dim: Style,
    header: Style,
}

impl PopupStyles {
    fn new(widget: &DatePicker<'_>) -> Self {
        let base = fallback_popup_style(widget.popup_style);
        Self {
            base,
            select: widget.select_style.unwrap_or_else(|| revert_style(base)),
            dim: widget.dim_style.unwrap_or_else(|| base.dim()),
            header: widget.header_style.unwrap_or_else(|| base.bold()),
        }
    }
}

/// Header with `<`, `>` and one or two buttons between them.
fn render_header(
    styles: &PopupStyles,
    buf: &mut Buffer,
    state: &mut DatePickerState,
    labels: &[String],
) -> Vec<Rect> {
    let inner = state.popup_inner;
    state.prev_area = Rect::new(inner.x, inner.y, 3, 1).intersection(inner);
    state.next_area =
        Rect::new(inner.right().saturating_sub(3), inner.y, 3, 1).intersection(inner);
    render_label(buf, state.prev_area, " < ", styles.header);
    render_label(buf, state.next_area, " > ", styles.header);

    let width = labels.iter().map(|v| v.len() as u16 + 2).sum::<u16>()
        + labels.len().saturating_sub(1) as u16;
    let mut x = inner.x + inner.width.saturating_sub(width) / 2;
    let mut areas = Vec::new();
    for label in labels {
        let w = label.len() as u16 + 2;
        let area = Rect::new(x, inner.y, w, 1).intersection(inner);
        render_label(buf, area, &format!(" {} ", label), styles.header.underlined());
        areas.push(area);
        x += w + 1;
    }
    areas
}

fn render_day_view(styles: &PopupStyles, buf: &mut Buffer, state: &mut DatePickerState) {
    let value = state.value.get();
    let inner = state.popup_inner;

    let buttons = render_header(
        styles,
        buf,
        state,
        &[
            MONTH_NAMES[value.month0() as usize].to_string(),
            value.year().to_string(),
        ],
    );
    state.month_button_area = buttons[0];
    state.year_button_area = buttons[1];
    state.header_button_area = Rect::default();

    for (i, name) in WEEKDAY_NAMES.iter().enumerate() {
        let area = Rect::new(inner.x + i as u16 * 4, inner.y + 1, 4, 1).intersection(inner);
        render_label(buf, area, &format!("{:>3} ", name), styles.header);
    }

    state.cells.clear();
    state.cell_areas.clear();
    for (i, date) in day_grid(value).into_iter().enumerate() {
        let col = (i % 7) as u16;
        let row = (i / 7) as u16;
        let area = Rect::new(inner.x + col * 4, inner.y + 2 + row, 4, 1).intersection(inner);
        let style = if date.month() != value.month() {
            styles.dim
        } else if date == value.date() {
            styles.select
        } else {
            styles.base
        };
        render_label(buf, area, &format!("{:>3} ", date.day()), style);
        state.cells.push(DateCell::Day(date));
        state.cell_areas.push(area);
    }
}

/// 4x3 grid for the month and the year view.
fn render_grid(
    styles: &PopupStyles,
    buf: &mut Buffer,
    state: &mut DatePickerState,
    cells: Vec<(DateCell, String)>,
) {
    let inner = state.popup_inner;
    let width = inner.width / 4;

    state.cells.clear();
    state.cell_areas.clear();
    for (i, (cell, label)) in cells.into_iter().enumerate() {
        let col = (i % 4) as u16;
        let row = (i / 4) as u16;
        let area = Rect::new(inner.x + col * width, inner.y + 2 + row * 2, width, 1)
            .intersection(inner);
        let style = if i == state.selected {
            styles.select
        } else {
            styles.base
        };
        render_label(buf, area, &format!("{:^w$}", label, w = width as usize), style);
        state.cells.push(cell);
        state.cell_areas.push(area);
    }
}

fn render_month_view(styles: &PopupStyles, buf: &mut Buffer, state: &mut DatePickerState) {
    let value = state.value.get();
    let buttons = render_header(styles, buf, state, &[value.year().to_string()]);
    state.header_button_area = buttons[0];
    state.month_button_area = Rect::default();
    state.year_button_area = Rect::default();

    let cells = MONTH_NAMES
        .iter()
        .enumerate()
        .map(|(m0, name)| (DateCell::Month(m0 as u32), name.to_string()))
        .collect();
    render_grid(styles, buf, state, cells);
}

fn render_year_view(styles: &PopupStyles, buf: &mut Buffer, state: &mut DatePickerState) {
    let value = state.value.get();
    let start = decade_start(value.year());
    let buttons = render_header(styles, buf, state, &[format!("{} - {}", start, start + 9)]);
    state.header_button_area = buttons[0];
    state.month_button_area = Rect::default();
    state.year_button_area = Rect::default();

    let cells = crate::temporal::decade(value.year())
        .iter()
        .map(|y| (DateCell::Year(*y), y.to_string()))
        .collect();
    render_grid(styles, buf, state, cells);
}

/// Days shown in the day view.
///
/// All days of the value's month, preceded by the last days of the
/// previous month so that the first day lands in its weekday column.
pub fn day_grid(value: Temporal) -> Vec<NaiveDate> {
    let Some(first) = NaiveDate::from_ymd_opt(value.year(), value.month(), 1) else {
        return Vec::new();
    };
    let pad = first.weekday().num_days_from_sunday() as u64;

    let mut days = Vec::with_capacity(42);
    for i in (1..=pad).rev() {
        if let Some(date) = first.checked_sub_days(Days::new(i)) {
            days.push(date);
        }
    }
    for day in 1..=days_in_month(value.year(), value.month()) {
        if let Some(date) = NaiveDate::from_ymd_opt(value.year(), value.month(), day) {
            days.push(date);
        }
    }
    days
}

impl Default for DatePickerState {
    fn default() -> Self {
        Self {
            area: Default::default(),
            popup_area: Default::default(),
            popup_inner: Default::default(),
            prev_area: Default::default(),
            next_area: Default::default(),
            month_button_area: Default::default(),
            year_button_area: Default::default(),
            header_button_area: Default::default(),
            cell_areas: Default::default(),
            cells: Default::default(),
            value: Default::default(),
            view: Default::default(),
            selected: 0,
            popup_active: false,
            text: TextFieldState::new()
                .with_max_len(10)
                .with_filter(|c| c.is_ascii_digit() || c == '-'),
            click_out: Default::default(),
            synced: None,
            dirty: false,
            was_focused: false,
            non_exhaustive: NonExhaustive,
        }
    }
}

impl HasFocus for DatePickerState {
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

impl DatePickerState {
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

    pub fn clear_areas(&mut self) {
        self.area = Rect::default();
        self.text.clear_areas();
        self.clear_popup_areas();
    }

    fn clear_popup_areas(&mut self) {
        self.popup_area = Rect::default();
        self.popup_inner = Rect::default();
        self.prev_area = Rect::default();
        self.next_area = Rect::default();
        self.month_button_area = Rect::default();
        self.year_button_area = Rect::default();
        self.header_button_area = Rect::default();
        self.cell_areas.clear();
        self.cells.clear();
    }

    pub fn is_popup_active(&self) -> bool {
        self.popup_active
    }

    /// Open the popover with the day view.
    pub fn show_popup(&mut self) {
        if !self.popup_active {
            debug!("date picker open");
        }
        self.popup_active = true;
        self.set_view(PickerView::Day);
        self.click_out.attach();
    }

    pub fn hide_popup(&mut self) {
        if self.popup_active {
            debug!("date picker close");
        }
        self.popup_active = false;
        self.click_out.detach();
    }

    /// Switch the view. Resets the keyboard selection to the value.
    pub fn set_view(&mut self, view: PickerView) {
        let value = self.value.get();
        self.view = view;
        self.selected = match view {
            PickerView::Day => 0,
            PickerView::Month => value.month0() as usize,
            PickerView::Year => (value.year() - decade_start(value.year())) as usize,
        };
        debug!("date picker view {:?}", view);
    }

    /// Text of the field.
    pub fn text(&self) -> &str {
        self.text.value()
    }

    /// Write the date into the text field.
    ///
    /// Without force this only happens if the value has changed since
    /// the last sync and no unparsed edit is pending.
    pub fn sync_text(&mut self, force: bool) {
        let value = self.value.get();
        if force || (!self.dirty && self.synced != Some(value.date())) {
            self.text.set_value(value.date_text());
            self.text.invalid = false;
            self.synced = Some(value.date());
            self.dirty = false;
        }
    }

    /// Take the text of the field as the new date, if it is valid.
    pub fn commit_text(&mut self) -> PickerOutcome {
        let parsed = self.value.get().parse_date_text(self.text.value());
        match parsed {
            Some(value) => {
                self.dirty = false;
                self.text.invalid = false;
                self.synced = Some(value.date());
                if self.value.set(value) {
                    PickerOutcome::Value
                } else {
                    PickerOutcome::Changed
                }
            }
            None => {
                self.dirty = true;
                self.text.invalid = self.text.len() >= 10;
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

    fn change(&mut self, f: impl FnOnce(Temporal) -> Temporal) -> PickerOutcome {
        if self.value.update(f) {
            self.sync_text(true);
            PickerOutcome::Value
        } else {
            PickerOutcome::Unchanged
        }
    }

    /// Select a cell.
    pub fn pick(&mut self, cell: DateCell) -> PickerOutcome {
        match cell {
            DateCell::Day(date) => {
                let r = self.change(|v| v.with_date(date));
                self.hide_popup();
                r.max(PickerOutcome::Changed)
            }
            DateCell::Month(m0) => {
                let r = self.change(|v| v.with_month0(m0));
                self.set_view(PickerView::Day);
                r.max(PickerOutcome::Changed)
            }
            DateCell::Year(year) => {
                let r = self.change(|v| v.with_year(year));
                self.set_view(PickerView::Month);
                r.max(PickerOutcome::Changed)
            }
        }
    }

    /// Previous page of the active view.
    pub fn prev_page(&mut self) -> PickerOutcome {
        match self.view {
            PickerView::Day => self.change(|v| v.add_months(-1)),
            PickerView::Month => self.change(|v| v.add_years(-1)),
            PickerView::Year => self.change(|v| v.add_years(-10)),
        }
    }

    /// Next page of the active view.
    pub fn next_page(&mut self) -> PickerOutcome {
        match self.view {
            PickerView::Day => self.change(|v| v.add_months(1)),
            PickerView::Month => self.change(|v| v.add_years(1)),
            PickerView::Year => self.change(|v| v.add_years(10)),
        }
    }

    fn hit(&self, x: u16, y: u16) -> Option<Hit> {
        let pos = Position::new(x, y);
        if self.prev_area.contains(pos) {
            Some(Hit::Prev)
        } else if self.next_area.contains(pos) {
            Some(Hit::Next)
        } else if self.month_button_area.contains(pos) {
            Some(Hit::MonthButton)
        } else if self.year_button_area.contains(pos) {
            Some(Hit::YearButton)
        } else if self.header_button_area.contains(pos) {
            Some(Hit::Header)
        } else {
            item_at(&self.cell_areas, x, y)
                .and_then(|i| self.cells.get(i))
                .map(|c| Hit::Cell(*c))
        }
    }

    fn act(&mut self, hit: Hit) -> PickerOutcome {
        match hit {
            Hit::Prev => self.prev_page().max(PickerOutcome::Changed),
            Hit::Next => self.next_page().max(PickerOutcome::Changed),
            Hit::MonthButton => {
                self.set_view(PickerView::Month);
                PickerOutcome::Changed
            }
            Hit::YearButton => {
                self.set_view(PickerView::Year);
                PickerOutcome::Changed
            }
            Hit::Header => {
                match self.view {
                    PickerView::Month => self.set_view(PickerView::Year),
                    PickerView::Year | PickerView::Day => self.set_view(PickerView::Day),
                }
                PickerOutcome::Changed
            }
            Hit::Cell(cell) => self.pick(cell),
        }
    }

    fn move_selected(&mut self, delta: isize) -> PickerOutcome {
        let selected = self.selected.saturating_add_signed(delta).min(11);
        if selected != self.selected {
            self.selected = selected;
            PickerOutcome::Changed
        } else {
            PickerOutcome::Unchanged
        }
    }

    fn selected_cell(&self) -> Option<DateCell> {
        let value = self.value.get();
        match self.view {
            PickerView::Day => None,
            PickerView::Month => Some(DateCell::Month(self.selected.min(11) as u32)),
            PickerView::Year => Some(DateCell::Year(
                decade_start(value.year()) + self.selected.min(11) as i32,
            )),
        }
    }

    fn handle_popup_keys(&mut self, event: &crossterm::event::Event) -> PickerOutcome {
        match event {
            ct_event!(keycode press Esc) => {
                self.hide_popup();
                return PickerOutcome::Changed;
            }
            ct_event!(keycode press PageUp) => return self.prev_page().max(PickerOutcome::Changed),
            ct_event!(keycode press PageDown) => {
                return self.next_page().max(PickerOutcome::Changed)
            }
            _ => {}
        }

        match self.view {
            PickerView::Day => match event {
                ct_event!(keycode press Left) => self.change(|v| v.add_days(-1)),
                ct_event!(keycode press Right) => self.change(|v| v.add_days(1)),
                ct_event!(keycode press Up) => self.change(|v| v.add_days(-7)),
                ct_event!(keycode press Down) => self.change(|v| v.add_days(7)),
                ct_event!(keycode press Enter) => {
                    self.hide_popup();
                    PickerOutcome::Changed
                }
                _ => PickerOutcome::Continue,
            },
            PickerView::Month | PickerView::Year => match event {
                ct_event!(keycode press Left) => self.move_selected(-1),
                ct_event!(keycode press Right) => self.move_selected(1),
                ct_event!(keycode press Up) => self.move_selected(-4),
                ct_event!(keycode press Down) => self.move_selected(4),
                ct_event!(keycode press Enter) => match self.selected_cell() {
                    Some(cell) => self.pick(cell),
                    None => PickerOutcome::Unchanged,
                },
                _ => PickerOutcome::Continue,
            },
        }
    }
}

impl HandleEvent<crossterm::event::Event, Popup, PickerOutcome> for DatePickerState {
    fn handle(&mut self, event: &crossterm::event::Event, _qualifier: Popup) -> PickerOutcome {
        if !self.popup_active {
            return PickerOutcome::Continue;
        }
        match event {
            ct_event!(mouse down Left for x,y)
                if self.popup_area.contains(Position::new(*x, *y)) =>
            {
                match self.hit(*x, *y) {
                    Some(hit) => self.act(hit),
                    None => PickerOutcome::Unchanged,
                }
            }
            ct_event!(scroll up for x,y) if self.popup_area.contains(Position::new(*x, *y)) => {
                self.prev_page().max(PickerOutcome::Changed)
            }
            ct_event!(scroll down for x,y) if self.popup_area.contains(Position::new(*x, *y)) => {
                self.next_page().max(PickerOutcome::Changed)
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

impl HandleEvent<crossterm::event::Event, Regular, PickerOutcome> for DatePickerState {
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

impl HandleEvent<crossterm::event::Event, MouseOnly, PickerOutcome> for DatePickerState {
    fn handle(&mut self, event: &crossterm::event::Event, _qualifier: MouseOnly) -> PickerOutcome {
        let r = self.handle(event, Popup);
        if r == PickerOutcome::Continue {
            self.text.handle(event, MouseOnly).into()
        } else {
            r
        }
    }
}

/// Handle all events.
/// Key events are only processed if focus is true.
/// Mouse events are processed if they are in range.
pub fn handle_events(
    state: &mut DatePickerState,
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

impl From<TextOutcome> for PickerOutcome {
    fn from(value: TextOutcome) -> Self {
        match value {
            TextOutcome::Continue => PickerOutcome::Continue,
            TextOutcome::Unchanged => PickerOutcome::Unchanged,
            TextOutcome::Changed => PickerOutcome::Changed,
            TextOutcome::TextChanged => PickerOutcome::Changed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(y: i32, m: u32, d: u32) -> SharedTemporal {
        SharedTemporal::new(Temporal::from_ymd_hms(y, m, d, 8, 0, 0).expect("valid"))
    }

    #[test]
    fn test_day_grid() {
        // 2024-07-01 is a Monday
        let days = day_grid(value(2024, 7, 10).get());
        assert_eq!(days.len(), 1 + 31);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2024, 6, 30).expect("date"));
        assert_eq!(days[1].day(), 1);

        // 2023-10-01 is a Sunday
        let days = day_grid(value(2023, 10, 5).get());
        assert_eq!(days.len(), 31);
        assert_eq!(days[0].day(), 1);

        // 2022-01-01 is a Saturday
        let days = day_grid(value(2022, 1, 5).get());
        assert_eq!(days.len(), 6 + 31);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2021, 12, 26).expect("date"));
    }

    #[test]
    fn test_commit_text() {
        let mut state = DatePickerState::new(value(2024, 7, 10));
        state.sync_text(false);
        assert_eq!(state.text(), "2024-07-10");

        state.text.set_value("2023-02-30");
        assert_eq!(state.commit_text(), PickerOutcome::Changed);
        assert_eq!(state.value.get().date_text(), "2024-07-10");
        assert!(state.text.invalid);

        // pending edit is kept
        state.sync_text(false);
        assert_eq!(state.text(), "2023-02-30");

        state.text.set_value("2023-02-28");
        assert_eq!(state.commit_text(), PickerOutcome::Value);
        assert_eq!(state.value.get().date_text(), "2023-02-28");
        assert_eq!(state.value.get().time_text(), "08:00:00");
    }

    #[test]
    fn test_views() {
        let mut state = DatePickerState::new(value(2024, 7, 10));
        state.show_popup();
        assert_eq!(state.view, PickerView::Day);

        assert_eq!(state.act(Hit::YearButton), PickerOutcome::Changed);
        assert_eq!(state.view, PickerView::Year);
        assert_eq!(state.selected, 4);
        assert_eq!(state.act(Hit::Header), PickerOutcome::Changed);
        assert_eq!(state.view, PickerView::Day);

        state.act(Hit::MonthButton);
        assert_eq!(state.view, PickerView::Month);
        assert_eq!(state.selected, 6);
        state.act(Hit::Header);
        assert_eq!(state.view, PickerView::Year);

        assert_eq!(state.pick(DateCell::Year(2025)), PickerOutcome::Value);
        assert_eq!(state.view, PickerView::Month);
        assert_eq!(state.pick(DateCell::Month(1)), PickerOutcome::Value);
        assert_eq!(state.view, PickerView::Day);
        assert_eq!(state.value.get().date_text(), "2025-02-10");

        let date = NaiveDate::from_ymd_opt(2025, 2, 15).expect("date");
        assert_eq!(state.pick(DateCell::Day(date)), PickerOutcome::Value);
        assert!(!state.popup_active);
        assert_eq!(state.text(), "2025-02-15");
    }

    #[test]
    fn test_pages() {
        let mut state = DatePickerState::new(value(2024, 1, 31));
        state.show_popup();
        assert_eq!(state.next_page(), PickerOutcome::Value);
        assert_eq!(state.value.get().date_text(), "2024-02-29");
        state.set_view(PickerView::Year);
        state.prev_page();
        assert_eq!(state.value.get().date_text(), "2014-02-28");
        state.set_view(PickerView::Month);
        state.next_page();
        assert_eq!(state.value.get().year(), 2015);
    }

    #[test]
    fn test_focus_opens() {
        let mut state = DatePickerState::new(value(2024, 7, 10));
        state.text.focus.set(true);
        assert!(state.sync_focus());
        assert!(state.popup_active);
        assert!(state.click_out.is_attached());
        assert!(!state.sync_focus());

        state.text.set_value("2024-");
        state.commit_text();
        state.text.focus.set(false);
        assert!(state.sync_focus());
        assert!(!state.popup_active);
        assert!(!state.click_out.is_attached());
        assert_eq!(state.text(), "2024-07-10");
    }
}
