//! Deck widget - time readout, tempo, tone, echo and cue

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use spindle_core::{NudgeDirection, RotationMode, TurntableState};

/// Horizontal track progress, `width` cells of `━` (played) and `─` (to go)
pub fn progress_bar(position: f64, duration: f64, width: usize) -> String {
    let fraction = if duration > 0.0 && position.is_finite() {
        (position / duration).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (fraction * width as f64).round() as usize;
    let mut bar = "━".repeat(filled);
    bar.push_str(&"─".repeat(width - filled));
    bar
}

/// Widget for the turntable's readouts
pub struct DeckWidget<'a> {
    state: &'a TurntableState,
    theme: &'a Theme,
    title: Option<&'a str>,
    loading: bool,
}

impl<'a> DeckWidget<'a> {
    pub fn new(state: &'a TurntableState, theme: &'a Theme) -> Self {
        Self {
            state,
            theme,
            title: None,
            loading: false,
        }
    }

    /// Name of the loaded record
    pub fn title(mut self, title: Option<&'a str>) -> Self {
        self.title = title;
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    fn render_transport(&self) -> Span<'a> {
        let (symbol, style) = if self.state.braking {
            ("■", self.theme.warning())
        } else if self.state.playback.is_playing {
            ("▶", self.theme.accent())
        } else {
            ("‖", self.theme.dim())
        };
        Span::styled(format!(" {} ", symbol), style)
    }

    /// Short tags for transient motion states
    fn flags(&self) -> Vec<(&'static str, Style)> {
        let mut flags = Vec::new();
        if self.state.braking {
            flags.push(("BRAKE", self.theme.warning()));
        }
        match self.state.nudging {
            Some(NudgeDirection::Faster) => flags.push(("NUDGE+", self.theme.accent())),
            Some(NudgeDirection::Slower) => flags.push(("NUDGE-", self.theme.accent())),
            None => {}
        }
        if self.state.scratching {
            flags.push(("SCRATCH", self.theme.highlight()));
        } else if self.state.mode == RotationMode::Inertial {
            flags.push(("BACKSPIN", self.theme.warning()));
        }
        flags
    }

    fn header(&self) -> String {
        match (self.title, self.loading) {
            (_, true) => " Loading... ".to_string(),
            (Some(title), false) => format!(" {} ", title),
            (None, false) => " No record ".to_string(),
        }
    }
}

impl Widget for DeckWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border())
            .title(Span::styled(self.header(), self.theme.title()));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let state = self.state;
        let mut lines = Vec::with_capacity(4);

        lines.push(Line::from(vec![
            self.render_transport(),
            Span::styled(state.readout(), self.theme.normal()),
        ]));

        let bar_width = inner.width.saturating_sub(2) as usize;
        lines.push(Line::from(Span::styled(
            format!(
                " {}",
                progress_bar(state.playback.position, state.playback.duration, bar_width)
            ),
            self.theme.accent(),
        )));

        lines.push(Line::from(vec![
            Span::styled(" Tempo ", self.theme.dim()),
            Span::styled(state.tempo_display.clone(), self.theme.normal()),
            Span::styled("  Tone ", self.theme.dim()),
            Span::styled(state.cutoff_display.clone(), self.theme.normal()),
            Span::styled("  Echo ", self.theme.dim()),
            Span::styled(state.echo_display.clone(), self.theme.normal()),
        ]));

        let mut cue_line = vec![Span::styled(
            format!(" {}", state.cue_label()),
            self.theme.normal(),
        )];
        for (flag, style) in self.flags() {
            cue_line.push(Span::raw("  "));
            cue_line.push(Span::styled(flag, style));
        }
        if !state.loaded && !self.loading {
            cue_line.push(Span::styled("  :load <path>", self.theme.dim()));
        }
        lines.push(Line::from(cue_line));

        Paragraph::new(lines).render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spindle_core::PlaybackState;

    fn render(widget: DeckWidget<'_>) -> Vec<String> {
        let area = Rect::new(0, 0, 60, 6);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect()
            })
            .collect()
    }

    fn loaded_state() -> TurntableState {
        TurntableState {
            loaded: true,
            playback: PlaybackState {
                position: 61.9,
                duration: 125.0,
                rate: 1.0,
                is_playing: true,
            },
            tempo_display: "+2.5%".to_string(),
            cutoff_display: "open".to_string(),
            echo_display: "35%".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(5.0, 10.0, 4), "━━──");
        assert_eq!(progress_bar(20.0, 10.0, 3), "━━━");
        assert_eq!(progress_bar(1.0, 0.0, 2), "──");
        assert_eq!(progress_bar(f64::NAN, 10.0, 2), "──");
    }

    #[test]
    fn test_readout_lines() {
        let state = loaded_state();
        let theme = Theme::default();
        let rows = render(DeckWidget::new(&state, &theme).title(Some("Disco Inferno")));

        assert!(rows[0].contains("Disco Inferno"));
        assert!(rows[1].contains("01:01 / 02:05 | 33⅓ RPM"));
        assert!(rows[3].contains("Tempo +2.5%"));
        assert!(rows[3].contains("Tone open"));
        assert!(rows[3].contains("Echo 35%"));
        assert!(rows[4].contains("Cue: --"));
    }

    #[test]
    fn test_cue_and_flags() {
        let mut state = loaded_state();
        state.cue = Some(42.0);
        state.braking = true;
        state.nudging = Some(NudgeDirection::Slower);
        let theme = Theme::default();
        let rows = render(DeckWidget::new(&state, &theme));

        assert!(rows[4].contains("Cue: 00:42"));
        assert!(rows[4].contains("BRAKE"));
        assert!(rows[4].contains("NUDGE-"));
    }

    #[test]
    fn test_backspin_flag() {
        let mut state = loaded_state();
        state.mode = RotationMode::Inertial;
        let theme = Theme::default();
        let rows = render(DeckWidget::new(&state, &theme));
        assert!(rows[4].contains("BACKSPIN"));
    }

    #[test]
    fn test_empty_deck_hints_load() {
        let state = TurntableState::default();
        let theme = Theme::default();
        let rows = render(DeckWidget::new(&state, &theme));
        assert!(rows[0].contains("No record"));
        assert!(rows[1].contains("00:00 / 00:00"));
        assert!(rows[4].contains(":load <path>"));

        let rows = render(DeckWidget::new(&state, &theme).loading(true));
        assert!(rows[0].contains("Loading..."));
        assert!(!rows[4].contains(":load"));
    }
}
