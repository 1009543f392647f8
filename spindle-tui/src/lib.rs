//! Terminal UI for Spindle
//!
//! CRT-styled widgets for a single turntable:
//! - Platter: rotating record drawn on a braille canvas
//! - Deck: time readout, tempo, tone, echo and cue
//! - Status bar and help overlay

mod app;
mod theme;
pub mod widgets;

pub use app::{App, AppState, MessageType};
pub use theme::{Theme, CRT_AMBER, CRT_GREEN, SLIPMAT};
pub use widgets::{platter_rect, DeckWidget, HelpWidget, PlatterWidget, StatusBarWidget};
