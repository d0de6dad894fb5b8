#![doc = include_str!("../readme.md")]
//
#![allow(clippy::collapsible_else_if)]
#![allow(clippy::collapsible_if)]
#![allow(clippy::if_same_then_else)]

pub mod event {
    //!
    //! Event-handler traits and Keybindings.
    //!
    //! See [rat-event](https://docs.rs/rat-event/latest/rat_event/)
    //!
    pub use rat_event::*;

    pub use crate::button::event::ButtonOutcome;
    pub use crate::click_out::event::ClickOutOutcome;
    pub use crate::login::event::LoginOutcome;
    pub use crate::scrolled::event::ScrollOutcome;
    pub use crate::temporal::event::PickerOutcome;
    pub use crate::text_field::event::TextOutcome;
    pub use crate::upload::event::RecordOutcome;
    pub use crate::uploader::event::UploadOutcome;
}

/// Module for focus-handling functionality.
/// See [rat-focus](https://docs.rs/rat-focus)
pub mod focus {
    pub use rat_focus::{Focus, FocusBuilder, FocusFlag, HasFocus};
}

// --- widget modules here --- (alphabetical)

pub mod button;
pub mod click_out;
pub mod date_picker;
pub mod listener;
pub mod popover;
pub mod scrolled;
pub mod slider;
pub mod text_field;
pub mod time_picker;
pub mod uploader;

// --- domain ---

pub mod temporal;
pub mod track;
pub mod track_view;

// --- application ---

pub mod app;
pub mod commands;
pub mod config;
pub mod login;
pub mod tasks;
pub mod toast;
pub mod upload;

pub mod util;

mod _private {
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct NonExhaustive;
}
