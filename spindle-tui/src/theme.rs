//! CRT-style themes for Spindle

use ratatui::style::{Color, Modifier, Style};

/// Theme configuration for the UI
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: &'static str,
    /// Primary foreground color (text, borders)
    pub fg: Color,
    /// Dimmed foreground (secondary text)
    pub fg_dim: Color,
    /// Background color
    pub bg: Color,
    /// Highlight color (active elements, scratch marker)
    pub highlight: Color,
    /// Accent color (motor-driven marker, progress)
    pub accent: Color,
    /// Warning color (brake, backspin)
    pub warning: Color,
    /// Error color
    pub danger: Color,
    /// Record groove color
    pub vinyl: Color,
    /// Center label color
    pub label: Color,
}

impl Theme {
    /// Look up a preset by name
    pub fn by_name(name: &str) -> Option<Theme> {
        match name.trim().to_lowercase().as_str() {
            "green" | "phosphor" | "phosphor-green" => Some(CRT_GREEN),
            "amber" | "orange" => Some(CRT_AMBER),
            "slipmat" | "red" => Some(SLIPMAT),
            _ => None,
        }
    }

    pub fn normal(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    pub fn dim(&self) -> Style {
        Style::default().fg(self.fg_dim).bg(self.bg)
    }

    /// Get style for highlighted items
    pub fn highlight(&self) -> Style {
        Style::default()
            .fg(self.bg)
            .bg(self.highlight)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border(&self) -> Style {
        Style::default().fg(self.fg_dim)
    }

    /// Border of a panel that is being touched
    pub fn border_active(&self) -> Style {
        Style::default().fg(self.highlight)
    }

    pub fn title(&self) -> Style {
        Style::default().fg(self.fg).add_modifier(Modifier::BOLD)
    }

    pub fn accent(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn warning(&self) -> Style {
        Style::default().fg(self.warning)
    }

    pub fn danger(&self) -> Style {
        Style::default().fg(self.danger)
    }
}

/// Classic phosphor green CRT theme
pub const CRT_GREEN: Theme = Theme {
    name: "phosphor-green",
    fg: Color::Rgb(51, 255, 51),          // #33ff33
    fg_dim: Color::Rgb(25, 128, 25),
    bg: Color::Rgb(0, 10, 0),
    highlight: Color::Rgb(180, 255, 180),
    accent: Color::Rgb(100, 255, 100),
    warning: Color::Rgb(255, 255, 100),
    danger: Color::Rgb(255, 100, 100),
    vinyl: Color::Rgb(40, 180, 40),
    label: Color::Rgb(150, 255, 150),
};

/// Amber CRT theme (1980s monochrome)
pub const CRT_AMBER: Theme = Theme {
    name: "amber",
    fg: Color::Rgb(255, 176, 0), // #ffb000
    fg_dim: Color::Rgb(128, 88, 0),
    bg: Color::Rgb(10, 5, 0),
    highlight: Color::Rgb(255, 220, 128),
    accent: Color::Rgb(255, 200, 64),
    warning: Color::Rgb(255, 255, 100),
    danger: Color::Rgb(255, 100, 100),
    vinyl: Color::Rgb(200, 140, 0),
    label: Color::Rgb(255, 210, 90),
};

/// Black record on a red slipmat
pub const SLIPMAT: Theme = Theme {
    name: "slipmat",
    fg: Color::Rgb(235, 235, 235),
    fg_dim: Color::Rgb(120, 120, 120),
    bg: Color::Rgb(12, 12, 12),
    highlight: Color::Rgb(255, 60, 60),
    accent: Color::Rgb(255, 140, 140),
    warning: Color::Rgb(255, 200, 80),
    danger: Color::Rgb(255, 60, 60),
    vinyl: Color::Rgb(90, 90, 90),
    label: Color::Rgb(220, 40, 40),
};

impl Default for Theme {
    fn default() -> Self {
        CRT_GREEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name() {
        assert_eq!(Theme::by_name("Amber").map(|t| t.name), Some("amber"));
        assert_eq!(Theme::by_name(" phosphor ").map(|t| t.name), Some("phosphor-green"));
        assert_eq!(Theme::by_name("slipmat"), Some(SLIPMAT));
        assert!(Theme::by_name("disco").is_none());
    }

    #[test]
    fn test_default_is_green() {
        assert_eq!(Theme::default().name, "phosphor-green");
    }
}
