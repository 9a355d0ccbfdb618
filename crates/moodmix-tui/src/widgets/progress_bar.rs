//! Smooth Unicode progress bar widget.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::playback::BarGeometry;
use crate::theme::{C_MUTED, C_PLAYING, C_SECONDARY};

const BLOCKS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];

/// Where the fill cells land inside `area` once the time labels are placed.
pub fn bar_geometry(area: Rect, left_label: &str, right_label: &str) -> BarGeometry {
    let left_w = if left_label.is_empty() { 0 } else { left_label.len() as u16 + 1 };
    let right_w = if right_label.is_empty() { 0 } else { right_label.len() as u16 + 1 };
    let width = area.width.saturating_sub(left_w + right_w).max(4).min(area.width);
    BarGeometry {
        left: area.x + left_w.min(area.width - width),
        width,
    }
}

/// The fill string for `width` cells, 8 eighths per cell.
pub fn fill(progress: f64, width: usize) -> String {
    let eighths = (progress.clamp(0.0, 1.0) * width as f64 * 8.0) as usize;
    let full_blocks = eighths / 8;
    let partial = eighths % 8;

    let mut bar = String::with_capacity(width + 4);
    for _ in 0..full_blocks {
        bar.push('█');
    }
    if full_blocks < width {
        bar.push(BLOCKS[partial]);
        for _ in (full_blocks + 1)..width {
            bar.push(' ');
        }
    }
    bar
}

/// Render a smooth progress bar in `area` and return the columns the fill
/// occupies, for mouse seeking.
/// `progress` is 0.0..=1.0. `time_pos` and `duration` are optional display values.
pub fn draw_progress(
    frame: &mut Frame,
    area: Rect,
    progress: f64,
    time_pos: Option<f64>,
    duration: Option<f64>,
) -> BarGeometry {
    if area.width < 4 || area.height == 0 {
        return BarGeometry::default();
    }

    let left_label = time_pos.map(fmt_time).unwrap_or_default();
    let right_label = duration.map(fmt_time).unwrap_or_default();
    let geometry = bar_geometry(area, &left_label, &right_label);

    let mut spans = Vec::new();
    if !left_label.is_empty() {
        spans.push(Span::styled(
            format!("{} ", left_label),
            Style::default().fg(C_SECONDARY),
        ));
    }
    spans.push(Span::styled(
        fill(progress, geometry.width as usize),
        Style::default().fg(C_PLAYING).bg(crate::theme::C_TRACK_BG),
    ));
    if !right_label.is_empty() {
        spans.push(Span::styled(
            format!(" {}", right_label),
            Style::default().fg(C_MUTED),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
    geometry
}

pub fn fmt_time(secs: f64) -> String {
    if !(secs > 0.0) {
        return "0:00".to_string();
    }
    let s = secs as u64;
    let h = s / 3600;
    let m = (s % 3600) / 60;
    let s = s % 60;
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fmt_time() {
        assert_eq!(fmt_time(0.0), "0:00");
        assert_eq!(fmt_time(-3.0), "0:00");
        assert_eq!(fmt_time(f64::NAN), "0:00");
        assert_eq!(fmt_time(185.9), "3:05");
        assert_eq!(fmt_time(3725.0), "1:02:05");
    }

    #[test]
    fn test_bar_geometry_excludes_labels() {
        let area = Rect::new(10, 0, 40, 1);
        let g = bar_geometry(area, "1:00", "9:00");
        assert_eq!(g.left, 15);
        assert_eq!(g.width, 30);
        let g = bar_geometry(area, "", "");
        assert_eq!(g, BarGeometry { left: 10, width: 40 });
    }

    #[test]
    fn test_fill_widths() {
        assert_eq!(fill(0.0, 4), "    ");
        assert_eq!(fill(1.0, 4), "████");
        assert_eq!(fill(0.5, 4), "██  ");
        assert_eq!(fill(0.25, 2), "▌ ");
    }
}
