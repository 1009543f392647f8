//! Command definitions for Spindle

use spindle_core::EngineCommand;
use std::path::PathBuf;

/// Commands that can be dispatched from input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Forwarded to the turntable
    Engine(EngineCommand),

    // Media
    LoadTrack(PathBuf),

    // Modes
    EnterCommandMode,
    EnterNormalMode,
    ToggleHelp,
    /// Scroll the help overlay by lines (negative is up)
    ScrollHelp(i32),

    // Display
    SetTheme(String),

    // Command line input the parser did not understand
    ExecuteCommand(String),

    Cancel,
    Quit,
}

impl From<EngineCommand> for Command {
    fn from(cmd: EngineCommand) -> Self {
        Command::Engine(cmd)
    }
}
