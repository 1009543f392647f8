//! Input handling for Spindle
//!
//! Modal keyboard (normal / `:` command line / help) and mouse gestures on
//! the platter, both turned into [`Command`]s for the app loop.

mod commands;
mod modal;

pub use commands::Command;
pub use modal::{cell_to_point, parse_command, InputHandler, Mode, PlatterArea};
