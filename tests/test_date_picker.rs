use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use pretty_der6y::date_picker::{self, DateCell, DatePicker, DatePickerState, PickerView};
use pretty_der6y::event::PickerOutcome;
use pretty_der6y::temporal::{SharedTemporal, Temporal};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::StatefulWidget;

fn click(area: Rect) -> Event {
    Event::Mouse(MouseEvent {
        kind: MouseEventKind::Down(MouseButton::Left),
        column: area.x + area.width / 2,
        row: area.y,
        modifiers: KeyModifiers::NONE,
    })
}

fn key(code: KeyCode) -> Event {
    Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn render(buf: &mut Buffer, state: &mut DatePickerState) {
    let picker = DatePicker::new();
    (&picker).render(Rect::new(2, 1, 11, 1), buf, state);
    picker.render_popup(buf, state);
}

fn cell_area(state: &DatePickerState, cell: DateCell) -> Rect {
    let idx = state
        .cells
        .iter()
        .position(|v| *v == cell)
        .expect("cell visible");
    state.cell_areas[idx]
}

fn open(value: Temporal) -> (Buffer, DatePickerState) {
    let mut buf = Buffer::empty(Rect::new(0, 0, 60, 24));
    let mut state = DatePickerState::new(SharedTemporal::new(value));
    render(&mut buf, &mut state);
    // the focus arrives
    let r = date_picker::handle_events(&mut state, true, &Event::FocusGained);
    assert_eq!(r, PickerOutcome::Changed);
    assert!(state.popup_active);
    render(&mut buf, &mut state);
    (buf, state)
}

#[test]
fn test_year_month_day_flow() {
    let (mut buf, mut state) = open(Temporal::from_ymd_hms(2024, 7, 10, 8, 0, 0).expect("valid"));
    assert_eq!(state.view, PickerView::Day);
    assert!(!state.popup_area.is_empty());

    let e = click(state.year_button_area);
    let r = date_picker::handle_events(&mut state, true, &e);
    assert_eq!(r, PickerOutcome::Changed);
    assert_eq!(state.view, PickerView::Year);
    render(&mut buf, &mut state);

    let years = state
        .cells
        .iter()
        .map(|v| match v {
            DateCell::Year(y) => *y,
            _ => 0,
        })
        .collect::<Vec<_>>();
    assert_eq!(years, (2020..=2031).collect::<Vec<_>>());

    let area = cell_area(&state, DateCell::Year(2025));
    let r = date_picker::handle_events(&mut state, true, &click(area));
    assert_eq!(r, PickerOutcome::Value);
    assert_eq!(state.view, PickerView::Month);
    assert_eq!(state.value.get().year(), 2025);
    render(&mut buf, &mut state);

    let area = cell_area(&state, DateCell::Month(2));
    let r = date_picker::handle_events(&mut state, true, &click(area));
    assert_eq!(r, PickerOutcome::Value);
    assert_eq!(state.view, PickerView::Day);

    let value = state.value.get();
    assert_eq!(value.month0(), 2);
    assert_eq!(value.day(), 10);
    assert_eq!(value.time_text(), "08:00:00");
    assert_eq!(state.text(), "2025-03-10");
}

#[test]
fn test_month_clamps_day() {
    let (mut buf, mut state) = open(Temporal::from_ymd_hms(2024, 1, 31, 12, 0, 0).expect("valid"));
    let e = click(state.month_button_area);
    date_picker::handle_events(&mut state, true, &e);
    assert_eq!(state.view, PickerView::Month);
    render(&mut buf, &mut state);

    let area = cell_area(&state, DateCell::Month(1));
    date_picker::handle_events(&mut state, true, &click(area));
    assert_eq!(state.value.get().date_text(), "2024-02-29");
}

#[test]
fn test_pick_day_keeps_time() {
    let (_buf, mut state) = open(Temporal::from_ymd_hms(2024, 7, 10, 21, 15, 30).expect("valid"));
    let day = chrono::NaiveDate::from_ymd_opt(2024, 7, 15).expect("date");
    let area = cell_area(&state, DateCell::Day(day));

    let r = date_picker::handle_events(&mut state, true, &click(area));
    assert_eq!(r, PickerOutcome::Value);
    let value = state.value.get();
    assert_eq!(value.date_text(), "2024-07-15");
    assert_eq!(value.time_text(), "21:15:30");
    assert!(!state.popup_active);
}

#[test]
fn test_click_outside_closes() {
    let (_buf, mut state) = open(Temporal::from_ymd_hms(2024, 7, 10, 8, 0, 0).expect("valid"));
    let outside = click(Rect::new(55, 20, 1, 1));

    state.handle_click_out(&outside);
    assert!(!state.popup_active);
    assert!(!state.click_out.is_attached());
    assert_eq!(state.value.get().date_text(), "2024-07-10");
}

#[test]
fn test_typing() {
    let (_buf, mut state) = open(Temporal::from_ymd_hms(2024, 7, 10, 8, 0, 0).expect("valid"));
    date_picker::handle_events(&mut state, true, &key(KeyCode::Esc));
    assert!(!state.popup_active);

    for _ in 0..2 {
        date_picker::handle_events(&mut state, true, &key(KeyCode::Backspace));
    }
    assert_eq!(state.text(), "2024-07-");
    assert_eq!(state.value.get().date_text(), "2024-07-10");

    date_picker::handle_events(&mut state, true, &key(KeyCode::Char('2')));
    let r = date_picker::handle_events(&mut state, true, &key(KeyCode::Char('1')));
    assert_eq!(r, PickerOutcome::Value);
    assert_eq!(state.value.get().date_text(), "2024-07-21");
    assert_eq!(state.value.get().time_text(), "08:00:00");

    // letters are filtered
    let r = date_picker::handle_events(&mut state, true, &key(KeyCode::Char('x')));
    assert_ne!(r, PickerOutcome::Value);
    assert_eq!(state.text(), "2024-07-21");
}

#[test]
fn test_end_of_calendar() {
    let (mut buf, mut state) = open(Temporal::from_ymd_hms(9999, 12, 31, 8, 0, 0).expect("valid"));

    date_picker::handle_events(&mut state, true, &key(KeyCode::PageDown));
    date_picker::handle_events(&mut state, true, &key(KeyCode::Right));
    assert_eq!(state.value.get().date_text(), "9999-12-31");
    assert_eq!(state.text(), "9999-12-31");

    let e = click(state.year_button_area);
    date_picker::handle_events(&mut state, true, &e);
    render(&mut buf, &mut state);
    let area = cell_area(&state, DateCell::Year(10000));
    date_picker::handle_events(&mut state, true, &click(area));
    assert_eq!(state.value.get().year(), 9999);
    assert_eq!(state.text(), "9999-12-31");
}
