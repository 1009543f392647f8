//! UI Widgets for Spindle

mod deck;
mod platter;
pub mod status_bar;

pub use deck::{progress_bar, DeckWidget};
pub use platter::{platter_rect, PlatterWidget};
pub use status_bar::{HelpWidget, StatusBarWidget};
