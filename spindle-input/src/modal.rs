//! Modal state machine for keyboard input, plus platter mouse gestures

use crate::commands::Command;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use spindle_core::{EngineCommand, NudgeDirection, Point, Rpm, STEP_SECONDS};
use std::time::Duration;

/// Echo mix change per key press
const ECHO_STEP: f32 = 0.05;

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: f64 = 2.0;

/// Input modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Normal,
    Command,
    Help,
}

impl Mode {
    /// Get display name for the mode
    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Command => "COMMAND",
            Mode::Help => "HELP",
        }
    }
}

/// Screen rectangle holding the platter, in terminal cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlatterArea {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl PlatterArea {
    pub fn contains(&self, column: u16, row: u16) -> bool {
        column >= self.x
            && column < self.x.saturating_add(self.width)
            && row >= self.y
            && row < self.y.saturating_add(self.height)
    }

    /// Center in pointer coordinates
    pub fn center(&self) -> Point {
        Point::new(
            self.x as f64 + self.width as f64 / 2.0,
            (self.y as f64 + self.height as f64 / 2.0) * CELL_ASPECT,
        )
    }
}

/// Map a terminal cell to pointer coordinates (aspect-corrected)
pub fn cell_to_point(column: u16, row: u16) -> Point {
    Point::new(column as f64 + 0.5, (row as f64 + 0.5) * CELL_ASPECT)
}

/// Handles keyboard and mouse input and converts it to commands
pub struct InputHandler {
    mode: Mode,
    command_buffer: String,
    /// Tempo change per key press (percent)
    tempo_step: f64,
    platter: Option<PlatterArea>,
    /// Left button went down on the platter and has not come up yet
    dragging: bool,
}

impl InputHandler {
    pub fn new() -> Self {
        Self {
            mode: Mode::Normal,
            command_buffer: String::new(),
            tempo_step: 0.1,
            platter: None,
            dragging: false,
        }
    }

    pub fn with_tempo_step(mut self, step: f64) -> Self {
        self.tempo_step = step.abs();
        self
    }

    /// Get current mode
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Get current command buffer (for display)
    pub fn command_buffer(&self) -> &str {
        &self.command_buffer
    }

    /// Tell the handler where the platter is drawn. Returns its center.
    pub fn set_platter_area(&mut self, area: PlatterArea) -> Point {
        self.platter = Some(area);
        area.center()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    /// Handle a key event and return a command if applicable
    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(Command::Quit);
        }
        match self.mode {
            Mode::Normal => self.handle_normal_mode(key),
            Mode::Command => self.handle_command_mode(key),
            Mode::Help => self.handle_help_mode(key),
        }
    }

    /// Handle a mouse event. `now` is the event's monotonic timestamp.
    ///
    /// A left press on the platter opens a scratch; drags keep feeding it
    /// even outside the platter until the button comes up.
    pub fn handle_mouse(&mut self, event: MouseEvent, now: Duration) -> Option<Command> {
        let point = cell_to_point(event.column, event.row);
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let on_platter = self
                    .platter
                    .is_some_and(|area| area.contains(event.column, event.row));
                if !on_platter {
                    return None;
                }
                self.dragging = true;
                Some(EngineCommand::ScratchPress(point, now).into())
            }
            MouseEventKind::Drag(MouseButton::Left) if self.dragging => {
                Some(EngineCommand::ScratchMove(point, now).into())
            }
            MouseEventKind::Up(MouseButton::Left) if self.dragging => {
                self.dragging = false;
                Some(EngineCommand::ScratchRelease.into())
            }
            _ => None,
        }
    }

    fn handle_normal_mode(&mut self, key: KeyEvent) -> Option<Command> {
        let engine = |cmd: EngineCommand| Some(Command::Engine(cmd));
        match key.code {
            // Mode switching
            KeyCode::Char(':') => {
                self.mode = Mode::Command;
                self.command_buffer.clear();
                Some(Command::EnterCommandMode)
            }
            KeyCode::Char('?') => {
                self.mode = Mode::Help;
                Some(Command::ToggleHelp)
            }

            // Transport
            KeyCode::Char(' ') => engine(EngineCommand::TogglePlay),
            KeyCode::Char('s') => engine(EngineCommand::Stop),
            KeyCode::Char('c') => engine(EngineCommand::SetCue),
            KeyCode::Char('v') => engine(EngineCommand::GoCue),
            KeyCode::Left => engine(EngineCommand::Step(-STEP_SECONDS)),
            KeyCode::Right => engine(EngineCommand::Step(STEP_SECONDS)),

            // Speed
            KeyCode::Char('3') => engine(EngineCommand::SetRpm(Rpm::ThirtyThree)),
            KeyCode::Char('4') => engine(EngineCommand::SetRpm(Rpm::FortyFive)),
            KeyCode::Up | KeyCode::Char('+') | KeyCode::Char('=') => {
                engine(EngineCommand::AdjustTempo(self.tempo_step))
            }
            KeyCode::Down | KeyCode::Char('-') => {
                engine(EngineCommand::AdjustTempo(-self.tempo_step))
            }
            KeyCode::Char(',') => engine(EngineCommand::Nudge(NudgeDirection::Slower)),
            KeyCode::Char('.') => engine(EngineCommand::Nudge(NudgeDirection::Faster)),

            // Tone and echo
            KeyCode::Char('[') => engine(EngineCommand::AdjustCutoff(-1.0)),
            KeyCode::Char(']') => engine(EngineCommand::AdjustCutoff(1.0)),
            KeyCode::Char('e') => engine(EngineCommand::AdjustEchoMix(ECHO_STEP)),
            KeyCode::Char('E') => engine(EngineCommand::AdjustEchoMix(-ECHO_STEP)),

            KeyCode::Char('q') => Some(Command::Quit),
            KeyCode::Esc => Some(Command::Cancel),

            _ => None,
        }
    }

    fn handle_command_mode(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Enter => {
                let cmd = parse_command(&self.command_buffer);
                self.mode = if cmd == Some(Command::ToggleHelp) {
                    Mode::Help
                } else {
                    Mode::Normal
                };
                let buffer = std::mem::take(&mut self.command_buffer);
                cmd.or(Some(Command::ExecuteCommand(buffer)))
            }
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.command_buffer.clear();
                Some(Command::EnterNormalMode)
            }
            KeyCode::Backspace => {
                self.command_buffer.pop();
                if self.command_buffer.is_empty() {
                    self.mode = Mode::Normal;
                    Some(Command::EnterNormalMode)
                } else {
                    None
                }
            }
            KeyCode::Char(c) => {
                self.command_buffer.push(c);
                None
            }
            _ => None,
        }
    }

    fn handle_help_mode(&mut self, key: KeyEvent) -> Option<Command> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
                self.mode = Mode::Normal;
                Some(Command::ToggleHelp)
            }
            KeyCode::Up | KeyCode::Char('k') => Some(Command::ScrollHelp(-1)),
            KeyCode::Down | KeyCode::Char('j') => Some(Command::ScrollHelp(1)),
            KeyCode::PageUp => Some(Command::ScrollHelp(-10)),
            KeyCode::PageDown => Some(Command::ScrollHelp(10)),
            _ => None,
        }
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip one pair of matching surrounding quotes
fn unquote(s: &str) -> &str {
    let quoted = s.len() >= 2
        && ((s.starts_with('\'') && s.ends_with('\'')) || (s.starts_with('"') && s.ends_with('"')));
    if quoted {
        &s[1..s.len() - 1]
    } else {
        s
    }
}

/// Parse a `:` command line
pub fn parse_command(line: &str) -> Option<Command> {
    let input = line.trim();

    match input {
        "q" | "quit" => return Some(Command::Quit),
        "help" => return Some(Command::ToggleHelp),
        "play" => return Some(EngineCommand::TogglePlay.into()),
        "stop" => return Some(EngineCommand::Stop.into()),
        _ => {}
    }

    let (verb, rest) = input.split_once(char::is_whitespace)?;
    let rest = rest.trim();

    match verb {
        "load" => {
            let path = unquote(rest);
            (!path.is_empty()).then(|| Command::LoadTrack(path.into()))
        }
        "tempo" => {
            let pct: f64 = rest.trim_end_matches('%').trim().parse().ok()?;
            pct.is_finite()
                .then_some(EngineCommand::SetTempo(pct).into())
        }
        "cutoff" => {
            let hz = if rest == "open" {
                spindle_core::CUTOFF_MAX_HZ
            } else {
                rest.trim_end_matches("Hz").trim().parse::<f32>().ok()?
            };
            hz.is_finite()
                .then_some(EngineCommand::SetCutoff(hz).into())
        }
        "echo" => {
            let mix = match rest.strip_suffix('%') {
                Some(pct) => pct.trim().parse::<f32>().ok()? / 100.0,
                None => rest.parse::<f32>().ok()?,
            };
            mix.is_finite()
                .then_some(EngineCommand::SetEchoMix(mix).into())
        }
        "rpm" => Rpm::parse(rest).map(|rpm| EngineCommand::SetRpm(rpm).into()),
        "theme" => Some(Command::SetTheme(rest.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn type_line(handler: &mut InputHandler, line: &str) -> Option<Command> {
        handler.handle_key(key(KeyCode::Char(':')));
        for c in line.chars() {
            handler.handle_key(key(KeyCode::Char(c)));
        }
        handler.handle_key(key(KeyCode::Enter))
    }

    #[test]
    fn test_transport_keys() {
        let mut handler = InputHandler::new();
        assert_eq!(
            handler.handle_key(key(KeyCode::Char(' '))),
            Some(Command::Engine(EngineCommand::TogglePlay))
        );
        assert_eq!(
            handler.handle_key(key(KeyCode::Left)),
            Some(Command::Engine(EngineCommand::Step(-1.0)))
        );
        assert_eq!(
            handler.handle_key(key(KeyCode::Char('.'))),
            Some(Command::Engine(EngineCommand::Nudge(NudgeDirection::Faster)))
        );
        assert_eq!(
            handler.handle_key(key(KeyCode::Char('4'))),
            Some(Command::Engine(EngineCommand::SetRpm(Rpm::FortyFive)))
        );
    }

    #[test]
    fn test_tempo_step_is_configurable() {
        let mut handler = InputHandler::new().with_tempo_step(0.5);
        assert_eq!(
            handler.handle_key(key(KeyCode::Down)),
            Some(Command::Engine(EngineCommand::AdjustTempo(-0.5)))
        );
    }

    #[test]
    fn test_quit_keys() {
        let mut handler = InputHandler::new();
        assert_eq!(handler.handle_key(key(KeyCode::Char('q'))), Some(Command::Quit));
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handler.handle_key(ctrl_c), Some(Command::Quit));
    }

    #[test]
    fn test_help_mode_swallows_keys() {
        let mut handler = InputHandler::new();
        handler.handle_key(key(KeyCode::Char('?')));
        assert_eq!(handler.mode(), Mode::Help);
        assert_eq!(handler.handle_key(key(KeyCode::Char(' '))), None);
        assert_eq!(handler.handle_key(key(KeyCode::Down)), Some(Command::ScrollHelp(1)));
        assert_eq!(handler.handle_key(key(KeyCode::Char('k'))), Some(Command::ScrollHelp(-1)));
        assert_eq!(handler.handle_key(key(KeyCode::Esc)), Some(Command::ToggleHelp));
        assert_eq!(handler.mode(), Mode::Normal);
    }

    #[test]
    fn test_help_from_command_line() {
        let mut handler = InputHandler::new();
        assert_eq!(type_line(&mut handler, "help"), Some(Command::ToggleHelp));
        assert_eq!(handler.mode(), Mode::Help);
    }

    #[test]
    fn test_command_line_load() {
        let mut handler = InputHandler::new();
        let cmd = type_line(&mut handler, "load '/music/my track.flac'");
        assert_eq!(cmd, Some(Command::LoadTrack("/music/my track.flac".into())));
        assert_eq!(handler.mode(), Mode::Normal);
        assert!(handler.command_buffer().is_empty());
    }

    #[test]
    fn test_command_line_values() {
        assert_eq!(
            parse_command("tempo -2.5"),
            Some(EngineCommand::SetTempo(-2.5).into())
        );
        assert_eq!(
            parse_command("cutoff 1200"),
            Some(EngineCommand::SetCutoff(1200.0).into())
        );
        assert_eq!(
            parse_command("cutoff open"),
            Some(EngineCommand::SetCutoff(8000.0).into())
        );
        assert_eq!(
            parse_command("echo 35%"),
            Some(EngineCommand::SetEchoMix(0.35).into())
        );
        assert_eq!(
            parse_command("echo 0.2"),
            Some(EngineCommand::SetEchoMix(0.2).into())
        );
        assert_eq!(
            parse_command("rpm 45"),
            Some(EngineCommand::SetRpm(Rpm::FortyFive).into())
        );
        assert_eq!(parse_command("quit"), Some(Command::Quit));
        assert_eq!(parse_command("theme amber"), Some(Command::SetTheme("amber".into())));
    }

    #[test]
    fn test_command_line_rejects_garbage() {
        assert_eq!(parse_command("rpm 78"), None);
        assert_eq!(parse_command("tempo fast"), None);
        assert_eq!(parse_command("load   "), None);
        assert_eq!(parse_command("spin"), None);

        let mut handler = InputHandler::new();
        assert_eq!(
            type_line(&mut handler, "spin"),
            Some(Command::ExecuteCommand("spin".into()))
        );
    }

    #[test]
    fn test_backspace_leaves_command_mode() {
        let mut handler = InputHandler::new();
        handler.handle_key(key(KeyCode::Char(':')));
        handler.handle_key(key(KeyCode::Char('x')));
        assert_eq!(handler.handle_key(key(KeyCode::Backspace)), Some(Command::EnterNormalMode));
        assert_eq!(handler.mode(), Mode::Normal);
    }

    #[test]
    fn test_platter_gesture() {
        let mut handler = InputHandler::new();
        let center = handler.set_platter_area(PlatterArea {
            x: 0,
            y: 0,
            width: 40,
            height: 20,
        });
        assert_eq!(center, Point::new(20.0, 20.0));

        let t0 = Duration::from_millis(100);
        let press = handler.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 30, 10), t0);
        assert_eq!(
            press,
            Some(EngineCommand::ScratchPress(Point::new(30.5, 21.0), t0).into())
        );
        assert!(handler.is_dragging());

        // Drags outside the platter still count once the hand is down
        let t1 = Duration::from_millis(116);
        let drag = handler.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 60, 30), t1);
        assert_eq!(
            drag,
            Some(EngineCommand::ScratchMove(Point::new(60.5, 61.0), t1).into())
        );

        let up = handler.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 60, 30), t1);
        assert_eq!(up, Some(EngineCommand::ScratchRelease.into()));
        assert!(!handler.is_dragging());
    }

    #[test]
    fn test_clicks_off_platter_ignored() {
        let mut handler = InputHandler::new();
        let t = Duration::ZERO;
        // No platter laid out yet
        assert_eq!(
            handler.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 1, 1), t),
            None
        );
        handler.set_platter_area(PlatterArea {
            x: 10,
            y: 5,
            width: 10,
            height: 5,
        });
        assert_eq!(
            handler.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 9, 6), t),
            None
        );
        assert_eq!(
            handler.handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 12, 6), t),
            None
        );
        assert_eq!(
            handler.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 12, 6), t),
            None
        );
    }
}
