//!
//! File uploader.
//!
//! Holds at most one candidate file. There are two ways to get one:
//!
//! * Drop: terminals paste the path of a file that is dropped onto
//!   them. A paste while the uploader is focused or under the mouse
//!   is taken as a drop. Dropped files are checked against the
//!   accept list, a file that doesn't match is rejected with an
//!   error log.
//! * Browse: Enter/Space or a click open a popover with a directory
//!   listing. It shows sub-directories and the files matching the
//!   accept list.
//!
//! The accept list is a comma separated list of file extensions
//! (`.geojson`), MIME types (`application/geo+json`) and MIME
//! wildcards (`image/*`).
//!
use crate::_private::NonExhaustive;
use crate::click_out::event::ClickOutOutcome;
use crate::click_out::ClickOutState;
use crate::popover::{Placement, Popover, PopoverStyle};
use crate::scrolled::{ScrollContainer, ScrollContainerState};
use crate::uploader::event::UploadOutcome;
use crate::util::{fallback_popup_style, item_at, render_label, revert_style};
use log::{debug, error, warn};
use rat_event::{ct_event, ConsumedEvent, HandleEvent, MouseOnly, Popup, Regular};
use rat_focus::{FocusBuilder, FocusFlag, HasFocus};
use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect, Size};
use ratatui::prelude::BlockExt;
use ratatui::style::{Style, Stylize};
use ratatui::widgets::{Block, StatefulWidget, Widget};
use std::cmp::min;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

/// Label while no file is selected.
pub const EMPTY_LABEL: &str = "Drag & Drop a file here or click to select";

/// Size of the browse popover content.
const BROWSE_SIZE: Size = Size::new(44, 12);

/// Accepted file types.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AcceptList {
    entries: Vec<String>,
}

impl AcceptList {
    /// Parse a comma separated list. Entries are trimmed,
    /// empty entries are dropped.
    pub fn parse(list: &str) -> Self {
        Self {
            entries: list
                .split(',')
                .map(|v| v.trim().to_ascii_lowercase())
                .filter(|v| !v.is_empty())
                .collect(),
        }
    }

    /// An empty list accepts everything.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Does any entry match the file name or the MIME type?
    pub fn accepts(&self, name: &str, mime: &str) -> bool {
        if self.entries.is_empty() {
            return true;
        }
        let name = name.to_ascii_lowercase();
        let mime = mime.to_ascii_lowercase();
        self.entries.iter().any(|entry| {
            if entry.starts_with('.') {
                name.ends_with(entry.as_str())
            } else if let Some(prefix) = entry.strip_suffix('*') {
                prefix.ends_with('/') && mime.starts_with(prefix)
            } else {
                mime == *entry
            }
        })
    }
}

/// MIME type derived from the file extension.
pub fn mime_for_name(name: &str) -> &'static str {
    let ext = match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_ascii_lowercase(),
        None => return "application/octet-stream",
    };
    match ext.as_str() {
        "geojson" => "application/geo+json",
        "json" => "application/json",
        "gpx" => "application/gpx+xml",
        "kml" => "application/vnd.google-earth.kml+xml",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

/// Extract the path from the text a terminal pastes for a dropped file.
///
/// Takes the first line and strips quotes. A `file://` url is decoded,
/// otherwise `\ ` is unescaped. None if nothing usable is left.
pub fn parse_dropped_path(text: &str) -> Option<PathBuf> {
    let line = text.lines().map(str::trim).find(|v| !v.is_empty())?;

    let mut line = line;
    for quote in ['\'', '"'] {
        if line.len() >= 2 && line.starts_with(quote) && line.ends_with(quote) {
            line = &line[1..line.len() - 1];
        }
    }

    if line.starts_with("file:") {
        let url = Url::parse(line).ok()?;
        return url.to_file_path().ok();
    }

    let path = line.replace("\\ ", " ");
    if path.is_empty() {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

/// The selected file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub name: String,
    pub mime: String,
}

impl CandidateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|v| v.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let mime = mime_for_name(&name).to_string();
        Self { path, name, mime }
    }

    /// Read the content.
    pub fn read_text(&self) -> io::Result<String> {
        fs::read_to_string(&self.path)
    }
}

/// Kind of a browse entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Parent,
    Dir,
    File,
}

/// One line of the browse listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowseEntry {
    pub kind: EntryKind,
    pub name: String,
    pub path: PathBuf,
}

/// List a directory. `..` first, then directories, then the files
/// the accept list matches. Both sorted by name.
pub fn list_dir(dir: &Path, accept: &AcceptList) -> io::Result<Vec<BrowseEntry>> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        if path.is_dir() {
            dirs.push(BrowseEntry {
                kind: EntryKind::Dir,
                name,
                path,
            });
        } else if accept.accepts(&name, mime_for_name(&name)) {
            files.push(BrowseEntry {
                kind: EntryKind::File,
                name,
                path,
            });
        }
    }
    dirs.sort_by(|a, b| a.name.cmp(&b.name));
    files.sort_by(|a, b| a.name.cmp(&b.name));

    let mut entries = Vec::with_capacity(dirs.len() + files.len() + 1);
    if let Some(parent) = dir.parent() {
        entries.push(BrowseEntry {
            kind: EntryKind::Parent,
            name: "..".into(),
            path: parent.to_path_buf(),
        });
    }
    entries.extend(dirs);
    entries.extend(files);
    Ok(entries)
}

/// Uploader widget.
#[derive(Debug, Clone)]
pub struct Uploader<'a> {
    style: Style,
    focus_style: Option<Style>,
    popup_style: Style,
    select_style: Option<Style>,
    dir_style: Option<Style>,
    block: Option<Block<'a>>,
    popover: Popover<'a>,
}

/// Combined styles.
#[derive(Debug, Clone)]
pub struct UploaderStyle {
    pub style: Style,
    pub focus: Option<Style>,
    pub block: Option<Block<'static>>,
    /// Browse popover
    pub popup: PopoverStyle,
    /// Selected line of the listing.
    pub select: Option<Style>,
    /// Directories in the listing.
    pub dir: Option<Style>,

    pub non_exhaustive: NonExhaustive,
}

/// State & event-handling.
#[derive(Debug)]
pub struct UploaderState {
    /// Complete area.
    /// __readonly__. renewed for each render.
    pub area: Rect,
    /// Area inside the block.
    /// __readonly__. renewed for each render.
    pub inner: Rect,
    /// Browse popover. Empty while closed.
    /// __readonly__. renewed for each render.
    pub popup_area: Rect,
    /// Lines of the listing.
    /// __readonly__. renewed for each render.
    pub entry_areas: Vec<Rect>,

    /// Accepted types.
    /// __read+write__
    pub accept: AcceptList,
    /// The selected file.
    /// __read+write__
    pub file: Option<CandidateFile>,

    /// Directory of the listing.
    /// __read+write__ use set_dir()
    pub dir: PathBuf,
    /// Listing.
    /// __readonly__
    pub entries: Vec<BrowseEntry>,
    /// Selected line of the listing.
    /// __read+write__
    pub selected: usize,
    /// Scrolling of the listing.
    /// __read+write__
    pub scroll: ScrollContainerState,
    /// Browse popover is shown.
    /// __readonly__
    pub popup_active: bool,

    /// Mouse is over the uploader.
    /// __readonly__
    pub hover: bool,
    /// Click-out detection for the popover.
    /// __read+write__
    pub click_out: ClickOutState,
    /// Current focus state.
    /// __read+write__
    pub focus: FocusFlag,
    /// Focus as seen by the last event.
    was_focused: bool,

    pub non_exhaustive: NonExhaustive,
}

pub(crate) mod event {
    use rat_event::{ConsumedEvent, Outcome};

    /// Result of event-handling.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    pub enum UploadOutcome {
        /// The given event was not handled at all.
        Continue,
        /// The event was handled, no repaint necessary.
        Unchanged,
        /// The event was handled, repaint necessary.
        Changed,
        /// A new file has been selected.
        Selected,
    }

    impl ConsumedEvent for UploadOutcome {
        fn is_consumed(&self) -> bool {
            *self != UploadOutcome::Continue
        }
    }

    impl From<bool> for UploadOutcome {
        fn from(value: bool) -> Self {
            if value {
                UploadOutcome::Changed
            } else {
                UploadOutcome::Unchanged
            }
        }
    }

    impl From<UploadOutcome> for Outcome {
        fn from(value: UploadOutcome) -> Self {
            match value {
                UploadOutcome::Continue => Outcome::Continue,
                UploadOutcome::Unchanged => Outcome::Unchanged,
                UploadOutcome::Changed => Outcome::Changed,
                UploadOutcome::Selected => Outcome::Changed,
            }
        }
    }
}

impl Default for UploaderStyle {
    fn default() -> Self {
        Self {
            style: Default::default(),
            focus: None,
            block: None,
            popup: Default::default(),
            select: None,
            dir: None,
            non_exhaustive: NonExhaustive,
        }
    }
}

impl Default for Uploader<'_> {
    fn default() -> Self {
        Self {
            style: Default::default(),
            focus_style: None,
            popup_style: Default::default(),
            select_style: None,
            dir_style: None,
            block: Some(Block::bordered()),
            popover: Popover::new()
                .placement(Placement::BelowOrAbove)
                .block(Block::bordered()),
        }
    }
}

impl<'a> Uploader<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set all styles.
    pub fn styles(mut self, styles: UploaderStyle) -> Self {
        self.style = styles.style;
        if styles.focus.is_some() {
            self.focus_style = styles.focus;
        }
        if styles.block.is_some() {
            self.block = styles.block;
        }
        if styles.select.is_some() {
            self.select_style = styles.select;
        }
        if styles.dir.is_some() {
            self.dir_style = styles.dir;
        }
        self.block = self.block.map(|v| v.style(self.style));
        self.popup_style = styles.popup.style;
        self.popover = self.popover.styles(styles.popup);
        self
    }

    /// Base style.
    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self.block = self.block.map(|v| v.style(style));
        self
    }

    /// Style when focused.
    pub fn focus_style(mut self, style: Style) -> Self {
        self.focus_style = Some(style);
        self
    }

    /// Block.
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block.style(self.style));
        self
    }

    /// Render the browse popover. Call this after all other widgets.
    pub fn render_popup(&self, buf: &mut Buffer, state: &mut UploaderState) {
        if !state.popup_active {
            state.popup_area = Rect::default();
            state.entry_areas.clear();
            state.scroll.clear_areas();
            state.click_out.set_inside(&[state.area]);
            return;
        }

        let area = self.popover.layout(state.area, BROWSE_SIZE, buf.area);
        (&self.popover).render(area, buf);
        state.popup_area = area;
        state.click_out.set_inside(&[state.area, area]);

        let base = fallback_popup_style(self.popup_style);
        let select = self.select_style.unwrap_or_else(|| revert_style(base));
        let dir_style = self.dir_style.unwrap_or_else(|| base.bold());

        let inner = self.popover.inner(area);
        let dir = state.dir.to_string_lossy();
        let skip = dir.chars().count().saturating_sub(inner.width as usize);
        let dir = dir.chars().skip(skip).collect::<String>();
        render_label(
            buf,
            Rect::new(inner.x, inner.y, inner.width, 1).intersection(inner),
            &dir,
            base.underlined(),
        );

        let list_area = Rect::new(
            inner.x,
            inner.y + 1,
            inner.width,
            inner.height.saturating_sub(1),
        )
        .intersection(inner);
        ScrollContainer::new()
            .style(base)
            .content_len(state.entries.len())
            .render(list_area, buf, &mut state.scroll);

        state.entry_areas.clear();
        let lines = state.scroll.inner;
        for row in 0..lines.height {
            let idx = state.scroll.scroll_top + row as usize;
            let Some(entry) = state.entries.get(idx) else {
                break;
            };
            let line_area = Rect::new(lines.x, lines.y + row, lines.width, 1);
            let (label, style) = match entry.kind {
                EntryKind::Parent => ("../".to_string(), dir_style),
                EntryKind::Dir => (format!("{}/", entry.name), dir_style),
                EntryKind::File => (entry.name.clone(), base),
            };
            let style = if idx == state.selected {
                style.patch(select)
            } else {
                style
            };
            render_label(buf, line_area, &label, style);
            state.entry_areas.push(line_area);
        }
    }
}

impl StatefulWidget for &Uploader<'_> {
    type State = UploaderState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        render_ref(self, area, buf, state);
    }
}

impl StatefulWidget for Uploader<'_> {
    type State = UploaderState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        render_ref(&self, area, buf, state);
    }
}

fn render_ref(widget: &Uploader<'_>, area: Rect, buf: &mut Buffer, state: &mut UploaderState) {
    state.area = area;
    state.inner = widget.block.inner_if_some(area);

    let mut style = widget.style;
    if state.is_focused() {
        style = style.patch(widget.focus_style.unwrap_or_else(|| revert_style(widget.style)));
    }

    if let Some(block) = &widget.block {
        block.clone().style(style).render(area, buf);
    } else {
        buf.set_style(area, style);
    }

    let label = state.label();
    let width = min(label.chars().count() as u16, state.inner.width);
    let y = state.inner.y + state.inner.height.saturating_sub(1) / 2;
    let x = state.inner.x + (state.inner.width - width) / 2;
    render_label(buf, Rect::new(x, y, width, 1).intersection(state.inner), &label, style);
}

impl Default for UploaderState {
    fn default() -> Self {
        Self {
            area: Default::default(),
            inner: Default::default(),
            popup_area: Default::default(),
            entry_areas: Default::default(),
            accept: Default::default(),
            file: None,
            dir: PathBuf::from("."),
            entries: Default::default(),
            selected: 0,
            scroll: Default::default(),
            popup_active: false,
            hover: false,
            click_out: Default::default(),
            focus: Default::default(),
            was_focused: false,
            non_exhaustive: NonExhaustive,
        }
    }
}

impl HasFocus for UploaderState {
    fn build(&self, builder: &mut FocusBuilder) {
        builder.leaf_widget(self);
    }

    fn focus(&self) -> FocusFlag {
        self.focus.clone()
    }

    fn area(&self) -> Rect {
        self.area
    }
}

impl UploaderState {
    pub fn new(accept: AcceptList, dir: impl Into<PathBuf>) -> Self {
        Self {
            accept,
            dir: dir.into(),
            ..Default::default()
        }
    }

    pub fn named(name: &str, accept: AcceptList, dir: impl Into<PathBuf>) -> Self {
        let mut z = Self::new(accept, dir);
        z.focus = FocusFlag::new().with_name(name);
        z
    }

    pub fn clear_areas(&mut self) {
        self.area = Rect::default();
        self.inner = Rect::default();
        self.popup_area = Rect::default();
        self.entry_areas.clear();
        self.scroll.clear_areas();
    }

    /// Label shown in the uploader.
    pub fn label(&self) -> String {
        match &self.file {
            Some(file) => file.name.clone(),
            None => EMPTY_LABEL.to_string(),
        }
    }

    /// Forget the file.
    pub fn clear(&mut self) -> bool {
        self.file.take().is_some()
    }

    /// Take a dropped file. It must pass the accept list.
    pub fn drop_file(&mut self, path: impl Into<PathBuf>) -> UploadOutcome {
        let file = CandidateFile::new(path);
        if self.accept.accepts(&file.name, &file.mime) {
            debug!("uploader accepted {:?}", file.path);
            self.file = Some(file);
            UploadOutcome::Selected
        } else {
            error!("Invalid file type!");
            UploadOutcome::Changed
        }
    }

    /// Take the file without further checks.
    pub fn select_file(&mut self, path: impl Into<PathBuf>) -> UploadOutcome {
        let file = CandidateFile::new(path);
        debug!("uploader selected {:?}", file.path);
        self.file = Some(file);
        UploadOutcome::Selected
    }

    /// Change the directory of the listing.
    pub fn set_dir(&mut self, dir: impl Into<PathBuf>) {
        self.dir = dir.into();
        self.reload();
    }

    /// Read the listing again.
    pub fn reload(&mut self) {
        self.entries = match list_dir(&self.dir, &self.accept) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot read directory {:?}: {}", self.dir, e);
                self.dir
                    .parent()
                    .map(|parent| BrowseEntry {
                        kind: EntryKind::Parent,
                        name: "..".into(),
                        path: parent.to_path_buf(),
                    })
                    .into_iter()
                    .collect()
            }
        };
        self.selected = 0;
        self.scroll.scroll_to(0);
    }

    pub fn is_popup_active(&self) -> bool {
        self.popup_active
    }

    /// Open the browse popover.
    pub fn show_popup(&mut self) {
        if !self.popup_active {
            debug!("uploader browse {:?}", self.dir);
            self.reload();
        }
        self.popup_active = true;
        self.click_out.attach();
    }

    pub fn hide_popup(&mut self) {
        self.popup_active = false;
        self.click_out.detach();
    }

    /// Close the popover on a mouse click outside of uploader and popover.
    /// The click itself is left for others.
    pub fn handle_click_out(&mut self, event: &crossterm::event::Event) -> ClickOutOutcome {
        let r = self.click_out.handle(event, Popup);
        if r == ClickOutOutcome::Outside {
            self.hide_popup();
        }
        r
    }

    /// Open the entry of the listing.
    pub fn activate(&mut self, idx: usize) -> UploadOutcome {
        let Some(entry) = self.entries.get(idx).cloned() else {
            return UploadOutcome::Unchanged;
        };
        match entry.kind {
            EntryKind::Parent | EntryKind::Dir => {
                self.set_dir(entry.path);
                UploadOutcome::Changed
            }
            EntryKind::File => {
                self.hide_popup();
                self.select_file(entry.path)
            }
        }
    }

    fn move_selected(&mut self, delta: isize) -> UploadOutcome {
        if self.entries.is_empty() {
            return UploadOutcome::Unchanged;
        }
        let selected = min(
            self.selected.saturating_add_signed(delta),
            self.entries.len() - 1,
        );
        if selected == self.selected {
            return UploadOutcome::Unchanged;
        }
        self.selected = selected;

        let viewport = self.scroll.viewport_len.max(1);
        if selected < self.scroll.scroll_top {
            self.scroll.scroll_to(selected);
        } else if selected >= self.scroll.scroll_top + viewport {
            self.scroll.scroll_to(selected + 1 - viewport);
        }
        UploadOutcome::Changed
    }

    /// Close the browse popover when the focus leaves.
    pub fn sync_focus(&mut self) -> bool {
        let focused = self.is_focused();
        if focused == self.was_focused {
            return false;
        }
        self.was_focused = focused;
        if !focused && self.popup_active {
            self.hide_popup();
            true
        } else {
            false
        }
    }
}

impl HandleEvent<crossterm::event::Event, Popup, UploadOutcome> for UploaderState {
    fn handle(&mut self, event: &crossterm::event::Event, _qualifier: Popup) -> UploadOutcome {
        if !self.popup_active {
            return UploadOutcome::Continue;
        }

        let r: UploadOutcome = match self.scroll.handle(event, MouseOnly) {
            crate::event::ScrollOutcome::Continue => UploadOutcome::Continue,
            crate::event::ScrollOutcome::Unchanged => UploadOutcome::Unchanged,
            _ => UploadOutcome::Changed,
        };
        if r.is_consumed() {
            return r;
        }

        match event {
            ct_event!(mouse down Left for x,y)
                if self.popup_area.contains(Position::new(*x, *y)) =>
            {
                match item_at(&self.entry_areas, *x, *y) {
                    Some(row) => {
                        let idx = self.scroll.scroll_top + row;
                        self.selected = idx;
                        self.activate(idx).max(UploadOutcome::Changed)
                    }
                    None => UploadOutcome::Unchanged,
                }
            }
            crossterm::event::Event::Mouse(m)
                if self.popup_area.contains(Position::new(m.column, m.row)) =>
            {
                UploadOutcome::Unchanged
            }
            _ => UploadOutcome::Continue,
        }
    }
}

impl HandleEvent<crossterm::event::Event, Regular, UploadOutcome> for UploaderState {
    fn handle(&mut self, event: &crossterm::event::Event, _qualifier: Regular) -> UploadOutcome {
        let focus_changed = self.sync_focus();

        // a drop arrives as paste.
        if let crossterm::event::Event::Paste(text) = event {
            if self.is_focused() || self.hover {
                return match parse_dropped_path(text) {
                    Some(path) => self.drop_file(path),
                    None => UploadOutcome::Unchanged,
                };
            }
        }

        let r = if self.is_focused() {
            if self.popup_active {
                match event {
                    ct_event!(keycode press Up) => self.move_selected(-1),
                    ct_event!(keycode press Down) => self.move_selected(1),
                    ct_event!(keycode press PageUp) => {
                        self.move_selected(-(self.scroll.viewport_len.max(1) as isize))
                    }
                    ct_event!(keycode press PageDown) => {
                        self.move_selected(self.scroll.viewport_len.max(1) as isize)
                    }
                    ct_event!(keycode press Enter) => self.activate(self.selected),
                    ct_event!(keycode press Backspace) => match self.dir.parent() {
                        Some(parent) => {
                            let parent = parent.to_path_buf();
                            self.set_dir(parent);
                            UploadOutcome::Changed
                        }
                        None => UploadOutcome::Unchanged,
                    },
                    ct_event!(keycode press Esc) => {
                        self.hide_popup();
                        UploadOutcome::Changed
                    }
                    _ => UploadOutcome::Continue,
                }
            } else {
                match event {
                    ct_event!(keycode press Enter) | ct_event!(key press ' ') => {
                        self.show_popup();
                        UploadOutcome::Changed
                    }
                    ct_event!(keycode press Delete) => self.clear().into(),
                    _ => UploadOutcome::Continue,
                }
            }
        } else {
            UploadOutcome::Continue
        };

        let r = if r == UploadOutcome::Continue {
            self.handle(event, MouseOnly)
        } else {
            r
        };

        if focus_changed {
            r.max(UploadOutcome::Changed)
        } else {
            r
        }
    }
}

impl HandleEvent<crossterm::event::Event, MouseOnly, UploadOutcome> for UploaderState {
    fn handle(&mut self, event: &crossterm::event::Event, _qualifier: MouseOnly) -> UploadOutcome {
        match event {
            ct_event!(mouse moved for x,y) => {
                // hover only matters for drops, leave the event to others.
                self.hover = self.area.contains(Position::new(*x, *y));
                UploadOutcome::Continue
            }
            ct_event!(mouse down Left for x,y) if self.area.contains(Position::new(*x, *y)) => {
                if self.popup_active {
                    self.hide_popup();
                } else {
                    self.show_popup();
                }
                UploadOutcome::Changed
            }
            _ => UploadOutcome::Continue,
        }
    }
}

/// Handle all events.
/// Key events are only processed if focus is true.
/// Mouse events are processed if they are in range.
pub fn handle_events(
    state: &mut UploaderState,
    focus: bool,
    event: &crossterm::event::Event,
) -> UploadOutcome {
    state.focus.set(focus);
    let r = state.handle(event, Popup);
    if r == UploadOutcome::Continue {
        state.handle(event, Regular)
    } else {
        r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept() {
        let accept = AcceptList::parse(".geojson, application/geo+json,,");
        assert_eq!(accept.entries().len(), 2);
        assert!(accept.accepts("track.geojson", "application/octet-stream"));
        assert!(accept.accepts("TRACK.GeoJSON", ""));
        assert!(accept.accepts("track.json", "application/geo+json"));
        assert!(!accept.accepts("track.png", "image/png"));
        assert!(!accept.accepts("geojson", "text/plain"));

        let images = AcceptList::parse("image/*");
        assert!(images.accepts("a.png", "image/png"));
        assert!(!images.accepts("a.pdf", "application/pdf"));

        assert!(AcceptList::parse(" , ").accepts("anything", "x/y"));
    }

    #[test]
    fn test_mime() {
        assert_eq!(mime_for_name("a.geojson"), "application/geo+json");
        assert_eq!(mime_for_name("A.PNG"), "image/png");
        assert_eq!(mime_for_name("README"), "application/octet-stream");
    }

    #[test]
    fn test_dropped_path() {
        assert_eq!(
            parse_dropped_path("'/tmp/my track.geojson'"),
            Some(PathBuf::from("/tmp/my track.geojson"))
        );
        assert_eq!(
            parse_dropped_path("/tmp/my\\ track.geojson\n"),
            Some(PathBuf::from("/tmp/my track.geojson"))
        );
        assert_eq!(parse_dropped_path("  \n "), None);
        assert_eq!(parse_dropped_path("\"\""), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_dropped_url() {
        assert_eq!(
            parse_dropped_path("file:///tmp/my%20track.geojson"),
            Some(PathBuf::from("/tmp/my track.geojson"))
        );
        assert_eq!(
            parse_dropped_path("'file:///home/r/%E8%B7%91%E6%AD%A5.geojson'\r\n"),
            Some(PathBuf::from("/home/r/跑步.geojson"))
        );
        // remote files can't be read.
        assert_eq!(parse_dropped_path("file://nas/runs/a.geojson"), None);
    }

    #[test]
    fn test_drop() {
        let mut state = UploaderState::new(
            AcceptList::parse(".geojson,application/geo+json"),
            PathBuf::from("."),
        );
        assert_eq!(state.drop_file("/x/track.geojson"), UploadOutcome::Selected);
        assert_eq!(state.label(), "track.geojson");

        assert_eq!(state.drop_file("/x/track.png"), UploadOutcome::Changed);
        assert_eq!(state.file.as_ref().map(|v| v.name.as_str()), Some("track.geojson"));

        assert!(state.clear());
        assert_eq!(state.label(), EMPTY_LABEL);
    }
}
