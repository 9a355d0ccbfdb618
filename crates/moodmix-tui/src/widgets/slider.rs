//! One mood axis as a horizontal slider row.
//!
//! ```text
//!   Energy      hip      ━━━━━━━━●──────  calm      75
//! ```

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use moodmix_proto::mood::MoodAxisKind;

use crate::playback::BarGeometry;
use crate::theme::{C_ACCENT, C_MUTED, C_PRIMARY, C_SECONDARY, C_TAG};

const NAME_W: u16 = 13;
const POLE_W: u16 = 9;
const VALUE_W: u16 = 5;

/// Columns of the track inside a slider row.
pub fn slider_track(area: Rect) -> BarGeometry {
    let fixed = NAME_W + POLE_W * 2 + VALUE_W;
    BarGeometry {
        left: area.x + NAME_W + POLE_W,
        width: area.width.saturating_sub(fixed),
    }
}

/// Slider value under column `x`.
pub fn value_at(x: u16, track: BarGeometry) -> u8 {
    if track.width <= 1 {
        return 0;
    }
    let span = (track.width - 1) as f64;
    let offset = (x as f64 - track.left as f64).clamp(0.0, span);
    (offset / span * 100.0).round() as u8
}

fn knob_col(value: u8, width: u16) -> u16 {
    if width <= 1 {
        return 0;
    }
    ((value.min(100) as f64 / 100.0) * (width - 1) as f64).round() as u16
}

pub fn draw_slider(frame: &mut Frame, area: Rect, kind: MoodAxisKind, value: u8, selected: bool) {
    if area.height == 0 {
        return;
    }
    let track = slider_track(area);
    let knob = knob_col(value, track.width);

    let name_style = if selected {
        Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(C_SECONDARY)
    };
    let marker = if selected { "▸ " } else { "  " };
    let a = kind.pole_a();
    let b = kind.pole_b();

    let mut filled = String::new();
    let mut rest = String::new();
    for i in 0..track.width {
        if i < knob {
            filled.push('━');
        } else if i > knob {
            rest.push('─');
        }
    }

    let knob_style = if selected {
        Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(C_PRIMARY)
    };

    let mut spans = vec![
        Span::styled(marker, Style::default().fg(C_ACCENT)),
        Span::styled(
            format!("{:<w$}", kind.display_name(), w = (NAME_W - 2) as usize),
            name_style,
        ),
        Span::styled(
            format!("{:<w$}", a.alias, w = POLE_W as usize),
            Style::default().fg(C_MUTED),
        ),
    ];
    if track.width > 0 {
        spans.push(Span::styled(filled, Style::default().fg(C_TAG)));
        spans.push(Span::styled("●", knob_style));
        spans.push(Span::styled(rest, Style::default().fg(C_MUTED)));
    }
    spans.push(Span::styled(
        format!("  {:<w$}", b.alias, w = (POLE_W - 2) as usize),
        Style::default().fg(C_MUTED),
    ));
    spans.push(Span::styled(
        format!("{:>w$}", value, w = VALUE_W as usize),
        Style::default().fg(C_PRIMARY),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_geometry() {
        let t = slider_track(Rect::new(2, 5, 80, 1));
        assert_eq!(t.left, 2 + NAME_W + POLE_W);
        assert_eq!(t.width, 80 - NAME_W - 2 * POLE_W - VALUE_W);
        assert_eq!(slider_track(Rect::new(0, 0, 10, 1)).width, 0);
    }

    #[test]
    fn test_value_at_clamps_and_scales() {
        let track = BarGeometry { left: 10, width: 101 };
        assert_eq!(value_at(0, track), 0);
        assert_eq!(value_at(10, track), 0);
        assert_eq!(value_at(60, track), 50);
        assert_eq!(value_at(110, track), 100);
        assert_eq!(value_at(500, track), 100);
    }

    #[test]
    fn test_knob_round_trip() {
        let track = BarGeometry { left: 0, width: 101 };
        for v in [0u8, 25, 50, 99, 100] {
            assert_eq!(value_at(knob_col(v, track.width), track), v);
        }
    }
}
