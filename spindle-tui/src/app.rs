//! Application UI state

use crate::theme::Theme;
use spindle_core::TurntableState;
use spindle_input::Mode;

/// Message type for colored status messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageType {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// Everything the renderer needs for one frame
pub struct AppState {
    /// Engine snapshot, refreshed every frame
    pub turntable: TurntableState,
    /// Title of the loaded record
    pub track_title: Option<String>,
    /// A load is in flight
    pub loading: bool,

    pub mode: Mode,
    pub command_buffer: String,
    pub message: Option<String>,
    pub message_type: MessageType,
    pub show_help: bool,
    pub help_scroll: u16,

    pub theme: Theme,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            turntable: TurntableState::default(),
            track_title: None,
            loading: false,
            mode: Mode::Normal,
            command_buffer: String::new(),
            message: None,
            message_type: MessageType::Info,
            show_help: false,
            help_scroll: 0,
            theme: Theme::default(),
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow the input handler's mode; help opens and closes with it
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        self.show_help = mode == Mode::Help;
        if !self.show_help {
            self.help_scroll = 0;
        }
    }

    pub fn scroll_help(&mut self, lines: i32) {
        self.help_scroll = (self.help_scroll as i32 + lines).max(0) as u16;
    }

    /// Set theme by name
    pub fn set_theme(&mut self, name: &str) {
        match Theme::by_name(name) {
            Some(theme) => {
                self.theme = theme;
                self.set_success(format!("Theme set to: {}", self.theme.name));
            }
            None => self.set_error(format!(
                "Unknown theme: {}. Use green/amber/slipmat",
                name
            )),
        }
    }

    pub fn clear_message(&mut self) {
        self.message = None;
        self.message_type = MessageType::Info;
    }

    /// Set a message to display (info level)
    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.message_type = MessageType::Info;
    }

    pub fn set_success(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.message_type = MessageType::Success;
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.message_type = MessageType::Warning;
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.message_type = MessageType::Error;
    }
}

/// Main application wrapper
pub struct App {
    pub state: AppState,
    pub should_quit: bool,
}

impl App {
    pub fn new() -> Self {
        Self {
            state: AppState::new(),
            should_quit: false,
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_type() {
        let mut state = AppState::new();
        state.set_error("no record");
        assert_eq!(state.message.as_deref(), Some("no record"));
        assert_eq!(state.message_type, MessageType::Error);

        state.clear_message();
        assert!(state.message.is_none());
        assert_eq!(state.message_type, MessageType::Info);
    }

    #[test]
    fn test_help_follows_mode() {
        let mut state = AppState::new();
        state.set_mode(Mode::Help);
        assert!(state.show_help);
        state.scroll_help(3);
        state.scroll_help(-5);
        assert_eq!(state.help_scroll, 0);
        state.scroll_help(2);
        state.set_mode(Mode::Normal);
        assert!(!state.show_help);
        assert_eq!(state.help_scroll, 0);
    }

    #[test]
    fn test_set_theme() {
        let mut state = AppState::new();
        state.set_theme("amber");
        assert_eq!(state.theme.name, "amber");
        assert_eq!(state.message_type, MessageType::Success);

        state.set_theme("plaid");
        assert_eq!(state.theme.name, "amber");
        assert_eq!(state.message_type, MessageType::Error);
    }
}
