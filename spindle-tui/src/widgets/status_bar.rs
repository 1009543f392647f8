//! Status bar widget - mode indicator and command line

use crate::app::MessageType;
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use spindle_input::Mode;

/// Widget for displaying the status bar with mode and command input
pub struct StatusBarWidget<'a> {
    mode: Mode,
    command_buffer: &'a str,
    message: Option<&'a str>,
    message_type: MessageType,
    theme: &'a Theme,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(mode: Mode, command_buffer: &'a str, theme: &'a Theme) -> Self {
        Self {
            mode,
            command_buffer,
            message: None,
            message_type: MessageType::Info,
            theme,
        }
    }

    pub fn message(mut self, msg: Option<&'a str>, msg_type: MessageType) -> Self {
        self.message = msg;
        self.message_type = msg_type;
        self
    }

    fn mode_style(&self) -> Style {
        match self.mode {
            Mode::Normal | Mode::Help => self.theme.highlight(),
            Mode::Command => self.theme.accent(),
        }
    }
}

impl Widget for StatusBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height < 1 {
            return;
        }

        let chunks = Layout::horizontal([
            Constraint::Length(10), // Mode indicator
            Constraint::Min(20),    // Command/message area
            Constraint::Length(24), // Help hint
        ])
        .split(area);

        let mode_line = Line::from(vec![
            Span::raw("["),
            Span::styled(self.mode.display_name(), self.mode_style()),
            Span::raw("]"),
        ]);
        Paragraph::new(mode_line).render(chunks[0], buf);

        let content = if self.mode == Mode::Command {
            Line::from(vec![
                Span::styled(":", self.theme.accent()),
                Span::styled(self.command_buffer, self.theme.normal()),
                Span::styled("█", self.theme.highlight()), // Cursor
            ])
        } else if let Some(msg) = self.message {
            let msg_style = match self.message_type {
                MessageType::Info => self.theme.dim(),
                MessageType::Success => self.theme.accent(),
                MessageType::Warning => self.theme.warning(),
                MessageType::Error => self.theme.danger(),
            };
            Line::from(Span::styled(msg, msg_style))
        } else {
            Line::from(Span::styled(
                "Ready. Press ? for help, : for commands",
                self.theme.dim(),
            ))
        };
        Paragraph::new(content).render(chunks[1], buf);

        let help = match self.mode {
            Mode::Normal => "space:play  s:stop  ?:help",
            Mode::Command => "Enter:run  Esc:cancel",
            Mode::Help => "j/k:scroll  Esc:close",
        };
        Paragraph::new(Line::from(Span::styled(help, self.theme.dim()))).render(chunks[2], buf);
    }
}

/// Help overlay widget with scrolling support
pub struct HelpWidget<'a> {
    theme: &'a Theme,
    scroll: u16,
}

impl<'a> HelpWidget<'a> {
    pub fn new(theme: &'a Theme) -> Self {
        Self { theme, scroll: 0 }
    }

    pub fn scroll(mut self, scroll: u16) -> Self {
        self.scroll = scroll;
        self
    }

    /// Width of the help box in cells
    pub const WIDTH: u16 = 52;

    fn help_lines() -> &'static [&'static str] {
        &[
            "╔══════════════════════════════════════════════════╗",
            "║                SPINDLE TURNTABLE                 ║",
            "║              ↑/↓ or j/k to scroll                ║",
            "╠══════════════════════════════════════════════════╣",
            "║ TRANSPORT                                        ║",
            "║   space       Play / pause                       ║",
            "║   s           Stop (brake, then back to start)   ║",
            "║   c / v       Set cue / jump to cue              ║",
            "║   ← / →       Step back / forward one second     ║",
            "╠──────────────────────────────────────────────────╣",
            "║ SPEED                                            ║",
            "║   3 / 4       33⅓ / 45 RPM                       ║",
            "║   ↑ / ↓       Tempo up / down                    ║",
            "║   , / .       Nudge slower / faster              ║",
            "╠──────────────────────────────────────────────────╣",
            "║ TONE AND ECHO                                    ║",
            "║   [ / ]       Close / open the low-pass          ║",
            "║   e / E       Echo mix up / down                 ║",
            "╠──────────────────────────────────────────────────╣",
            "║ SCRATCH                                          ║",
            "║   Drag the platter with the left mouse button.   ║",
            "║   Let go fast for a backspin.                    ║",
            "╠──────────────────────────────────────────────────╣",
            "║ COMMANDS (:)                                     ║",
            "║   :load <path>     Load a record                 ║",
            "║   :tempo <pct>     Set tempo, e.g. :tempo -2.5   ║",
            "║   :cutoff <hz>     Low-pass cutoff, or 'open'    ║",
            "║   :echo <mix>      Echo mix, 0.2 or 20%          ║",
            "║   :rpm 33|45       Platter speed                 ║",
            "║   :theme <name>    green / amber / slipmat       ║",
            "║   :q               Quit                          ║",
            "╠══════════════════════════════════════════════════╣",
            "║          Press Esc or ? to close help            ║",
            "╚══════════════════════════════════════════════════╝",
        ]
    }

    /// Lines the overlay can show; clamp scrolling against this
    pub fn line_count() -> u16 {
        Self::help_lines().len() as u16
    }
}

impl Widget for HelpWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for y in area.y..area.y + area.height {
            for x in area.x..area.x + area.width {
                buf[(x, y)].set_char(' ').set_style(self.theme.normal());
            }
        }

        let help_text = Self::help_lines();
        let total_lines = help_text.len() as u16;
        let visible_lines = area.height.min(total_lines);

        let max_scroll = total_lines.saturating_sub(visible_lines);
        let scroll = self.scroll.min(max_scroll);

        let start_x = area.x + area.width.saturating_sub(Self::WIDTH) / 2;

        for (i, line) in help_text
            .iter()
            .skip(scroll as usize)
            .take(visible_lines as usize)
            .enumerate()
        {
            let y = area.y + i as u16;
            for (j, ch) in line.chars().enumerate() {
                let x = start_x + j as u16;
                if x >= area.x + area.width {
                    break;
                }
                let style = if "║╔╗╚╝═╠╣─".contains(ch) {
                    self.theme.border()
                } else {
                    self.theme.normal()
                };
                buf[(x, y)].set_char(ch).set_style(style);
            }
        }

        if total_lines > visible_lines && area.height > 0 {
            let indicator = format!(" [{}/{}] ", scroll + 1, max_scroll + 1);
            let indicator_x = area.x + area.width.saturating_sub(indicator.len() as u16 + 2);
            let indicator_y = area.y + area.height - 1;
            for (i, ch) in indicator.chars().enumerate() {
                let x = indicator_x + i as u16;
                if x < area.x + area.width {
                    buf[(x, indicator_y)].set_char(ch).set_style(self.theme.dim());
                }
            }
        }
    }
}
