use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use pretty_der6y::event::UploadOutcome;
use pretty_der6y::uploader::{self, list_dir, AcceptList, EntryKind, Uploader, UploaderState, EMPTY_LABEL};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::StatefulWidget;
use std::fs;
use std::path::Path;

const ACCEPT: &str = ".geojson,application/geo+json";

fn key(code: KeyCode) -> Event {
    Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn click(x: u16, y: u16) -> Event {
    Event::Mouse(MouseEvent {
        kind: MouseEventKind::Down(MouseButton::Left),
        column: x,
        row: y,
        modifiers: KeyModifiers::NONE,
    })
}

fn render(buf: &mut Buffer, state: &mut UploaderState) {
    let uploader = Uploader::new();
    (&uploader).render(Rect::new(0, 0, 50, 3), buf, state);
    uploader.render_popup(buf, state);
}

fn scratch(dir: &Path) {
    fs::create_dir(dir.join("runs")).unwrap();
    fs::write(dir.join("track.geojson"), "{}").unwrap();
    fs::write(dir.join("photo.png"), "").unwrap();
    fs::write(dir.join("runs").join("a.GEOJSON"), "{}").unwrap();
}

#[test]
fn test_list_dir() {
    let dir = tempfile::tempdir().unwrap();
    scratch(dir.path());

    let entries = list_dir(dir.path(), &AcceptList::parse(ACCEPT)).unwrap();
    let names = entries.iter().map(|v| v.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["..", "runs", "track.geojson"]);
    assert_eq!(entries[0].kind, EntryKind::Parent);
    assert_eq!(entries[1].kind, EntryKind::Dir);
    assert_eq!(entries[2].kind, EntryKind::File);

    let all = list_dir(dir.path(), &AcceptList::parse("")).unwrap();
    assert_eq!(all.len(), 4);
}

#[test]
fn test_drop_by_paste() {
    let mut buf = Buffer::empty(Rect::new(0, 0, 60, 20));
    let mut state = UploaderState::new(AcceptList::parse(ACCEPT), ".");
    render(&mut buf, &mut state);
    assert_eq!(state.label(), EMPTY_LABEL);

    // not focused, not hovered
    let paste = Event::Paste("'/home/runner/my run.geojson'".into());
    assert_eq!(uploader::handle_events(&mut state, false, &paste), UploadOutcome::Continue);
    assert!(state.file.is_none());

    let r = uploader::handle_events(&mut state, true, &paste);
    assert_eq!(r, UploadOutcome::Selected);
    let file = state.file.clone().unwrap();
    assert_eq!(file.name, "my run.geojson");
    assert_eq!(file.mime, "application/geo+json");

    // rejected, the old file stays
    let r = uploader::handle_events(&mut state, true, &Event::Paste("/tmp/track.png".into()));
    assert_eq!(r, UploadOutcome::Changed);
    assert_eq!(state.file.as_ref().map(|v| v.name.as_str()), Some("my run.geojson"));

    state.clear();
    assert_eq!(state.label(), EMPTY_LABEL);
}

#[test]
fn test_drop_on_hover() {
    let mut buf = Buffer::empty(Rect::new(0, 0, 60, 20));
    let mut state = UploaderState::new(AcceptList::parse(ACCEPT), ".");
    render(&mut buf, &mut state);

    let moved = Event::Mouse(MouseEvent {
        kind: MouseEventKind::Moved,
        column: 10,
        row: 1,
        modifiers: KeyModifiers::NONE,
    });
    uploader::handle_events(&mut state, false, &moved);
    assert!(state.hover);

    let r = uploader::handle_events(&mut state, false, &Event::Paste("file:///tmp/x.geojson".into()));
    assert_eq!(r, UploadOutcome::Selected);
}

#[test]
fn test_browse() {
    let dir = tempfile::tempdir().unwrap();
    scratch(dir.path());

    let mut buf = Buffer::empty(Rect::new(0, 0, 60, 20));
    let mut state = UploaderState::new(AcceptList::parse(ACCEPT), dir.path());
    render(&mut buf, &mut state);

    assert_eq!(uploader::handle_events(&mut state, true, &key(KeyCode::Enter)), UploadOutcome::Changed);
    assert!(state.popup_active);
    render(&mut buf, &mut state);
    assert_eq!(state.entry_areas.len(), 3);

    // descend into runs
    let runs = state.entry_areas[1];
    let r = uploader::handle_events(&mut state, true, &click(runs.x + 1, runs.y));
    assert_eq!(r, UploadOutcome::Changed);
    assert_eq!(state.dir, dir.path().join("runs"));
    render(&mut buf, &mut state);

    // select with the keyboard
    uploader::handle_events(&mut state, true, &key(KeyCode::Down));
    assert_eq!(state.selected, 1);
    let r = uploader::handle_events(&mut state, true, &key(KeyCode::Enter));
    assert_eq!(r, UploadOutcome::Selected);
    assert!(!state.popup_active);
    assert_eq!(state.label(), "a.GEOJSON");
    assert_eq!(state.file.as_ref().unwrap().read_text().unwrap(), "{}");
}

#[test]
fn test_browse_click_out() {
    let mut buf = Buffer::empty(Rect::new(0, 0, 60, 20));
    let mut state = UploaderState::new(AcceptList::parse(ACCEPT), ".");
    render(&mut buf, &mut state);
    state.show_popup();
    render(&mut buf, &mut state);

    state.handle_click_out(&click(59, 19));
    assert!(!state.popup_active);
    assert!(!state.click_out.is_attached());
}
