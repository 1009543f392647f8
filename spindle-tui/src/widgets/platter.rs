//! Platter widget - the spinning record

use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Color,
    symbols::Marker,
    text::Span,
    widgets::{
        canvas::{Canvas, Circle, Line as CanvasLine, Points},
        Block, Borders, Widget,
    },
};
use spindle_core::{RotationMode, TurntableState};

/// Record edge, in canvas units
const RECORD_RADIUS: f64 = 0.95;
/// Paper label edge
const LABEL_RADIUS: f64 = 0.32;
/// Grooves drawn between label and edge
const GROOVES: [f64; 3] = [0.5, 0.65, 0.8];

/// Largest rect inside `area` that keeps the record round.
///
/// Terminal cells are about twice as tall as they are wide, so the rect is
/// twice as many columns as rows.
pub fn platter_rect(area: Rect) -> Rect {
    let height = area.height.min(area.width / 2);
    let width = height * 2;
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

/// Top-down view of the platter with a marker line at the current angle
pub struct PlatterWidget<'a> {
    state: &'a TurntableState,
    theme: &'a Theme,
}

impl<'a> PlatterWidget<'a> {
    pub fn new(state: &'a TurntableState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    fn marker_color(&self) -> Color {
        match self.state.mode {
            RotationMode::Idle => self.theme.fg_dim,
            RotationMode::Playing if self.state.braking => self.theme.warning,
            RotationMode::Playing => self.theme.accent,
            RotationMode::Scratching => self.theme.highlight,
            RotationMode::Inertial => self.theme.warning,
        }
    }

    /// Marker direction in canvas space.
    ///
    /// The angle grows clockwise on screen (pointer y points down), canvas y
    /// points up, hence the flipped sine.
    fn marker_direction(&self) -> (f64, f64) {
        let angle = self.state.angle;
        if angle.is_finite() {
            (angle.cos(), -angle.sin())
        } else {
            (1.0, 0.0)
        }
    }
}

impl Widget for PlatterWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.state.scratching {
            self.theme.border_active()
        } else {
            self.theme.border()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(" PLATTER ", self.theme.title()))
            .title_bottom(Span::styled(
                format!(" {} RPM ", self.state.rpm.label()),
                self.theme.dim(),
            ));

        let (dx, dy) = self.marker_direction();
        let marker_color = self.marker_color();
        let vinyl = self.theme.vinyl;
        let label = self.theme.label;
        let dim = self.theme.fg_dim;

        Canvas::default()
            .block(block)
            .background_color(self.theme.bg)
            .marker(Marker::Braille)
            .x_bounds([-1.0, 1.0])
            .y_bounds([-1.0, 1.0])
            .paint(move |ctx| {
                ctx.draw(&Circle {
                    x: 0.0,
                    y: 0.0,
                    radius: RECORD_RADIUS,
                    color: vinyl,
                });
                for radius in GROOVES {
                    ctx.draw(&Circle {
                        x: 0.0,
                        y: 0.0,
                        radius,
                        color: dim,
                    });
                }
                ctx.layer();
                ctx.draw(&Circle {
                    x: 0.0,
                    y: 0.0,
                    radius: LABEL_RADIUS,
                    color: label,
                });
                ctx.draw(&Points {
                    coords: &[(0.0, 0.0)],
                    color: label,
                });
                ctx.layer();
                ctx.draw(&CanvasLine {
                    x1: dx * LABEL_RADIUS,
                    y1: dy * LABEL_RADIUS,
                    x2: dx * RECORD_RADIUS,
                    y2: dy * RECORD_RADIUS,
                    color: marker_color,
                });
            })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn render(state: &TurntableState) -> Buffer {
        let theme = Theme::default();
        let area = Rect::new(0, 0, 40, 20);
        let mut buf = Buffer::empty(area);
        PlatterWidget::new(state, &theme).render(area, &mut buf);
        buf
    }

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_platter_rect_is_twice_as_wide() {
        let rect = platter_rect(Rect::new(0, 0, 100, 30));
        assert_eq!(rect, Rect::new(20, 0, 60, 30));

        let narrow = platter_rect(Rect::new(5, 2, 20, 30));
        assert_eq!(narrow, Rect::new(5, 12, 20, 10));
    }

    #[test]
    fn test_draws_record_and_rpm() {
        let state = TurntableState::default();
        let buf = render(&state);
        assert!(row_text(&buf, 0).contains("PLATTER"));
        assert!(row_text(&buf, 19).contains("33⅓ RPM"));

        // Braille dots inside the frame
        let drawn = (1..19)
            .flat_map(|y| (1..39).map(move |x| (x, y)))
            .filter(|&(x, y)| buf[(x, y)].symbol() != " ")
            .count();
        assert!(drawn > 0);
    }

    #[test]
    fn test_marker_follows_angle() {
        let mut state = TurntableState::default();
        let at_rest = render(&state);
        state.angle = PI;
        let turned = render(&state);
        assert_ne!(at_rest, turned);
    }

    #[test]
    fn test_non_finite_angle_still_renders() {
        let state = TurntableState {
            angle: f64::NAN,
            ..Default::default()
        };
        let buf = render(&state);
        assert!(row_text(&buf, 0).contains("PLATTER"));
    }
}
