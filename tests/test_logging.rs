use crossterm::event::{Event, KeyModifiers, MouseEvent, MouseEventKind};
use log::{Level, LevelFilter};
use pretty_der6y::config::{setup_logging, Config};
use pretty_der6y::event::{HandleEvent, Regular, UploadOutcome};
use pretty_der6y::toast::ToastQueue;
use pretty_der6y::uploader::{AcceptList, Uploader, UploaderState};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::widgets::StatefulWidget;
use std::fs;
use std::path::PathBuf;

// The logger is process wide, this binary installs it once.
#[test]
fn test_rejected_drop_is_toasted() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        log_file: dir.path().join("log.log"),
        log_level: LevelFilter::Debug,
        toast_level: LevelFilter::Info,
        ..Default::default()
    };
    let queue = ToastQueue::new();
    setup_logging(&config, &queue).unwrap();

    let accept = AcceptList::parse(config.accept.as_str());
    let mut state = UploaderState::new(accept, PathBuf::from("."));
    let mut buf = Buffer::empty(Rect::new(0, 0, 40, 3));
    (&Uploader::new()).render(buf.area, &mut buf, &mut state);

    let moved = Event::Mouse(MouseEvent {
        kind: MouseEventKind::Moved,
        column: 2,
        row: 1,
        modifiers: KeyModifiers::NONE,
    });
    state.handle(&moved, Regular);
    assert!(state.hover);

    let r = state.handle(&Event::Paste("/tmp/track.png".into()), Regular);
    assert_eq!(r, UploadOutcome::Changed);
    assert!(state.file.is_none());

    let toasts = queue.snapshot();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].level, Level::Error);
    assert_eq!(toasts[0].message, "Invalid file type!");

    // debug records only go to the file
    let r = state.handle(&Event::Paste("/tmp/track.geojson".into()), Regular);
    assert_eq!(r, UploadOutcome::Selected);
    assert_eq!(queue.len(), 1);

    log::logger().flush();
    let log = fs::read_to_string(&config.log_file).unwrap();
    assert!(log.contains("ERROR pretty_der6y::uploader Invalid file type!"));
    assert!(log.contains("uploader accepted"));
}
