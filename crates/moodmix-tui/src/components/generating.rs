//! Generating screen: step list and progress while a cycle runs.

use std::time::Instant;

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    theme::{C_ACCENT, C_MUTED, C_PLAYING, C_PRIMARY, C_SECONDARY},
    widgets::{
        pane_chrome::{centered, pane_chrome},
        progress_bar::draw_progress,
    },
};

const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

pub struct GeneratingScreen {
    frame: usize,
}

impl GeneratingScreen {
    pub fn new() -> Self {
        Self { frame: 0 }
    }
}

impl Default for GeneratingScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for GeneratingScreen {
    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        match key.code {
            KeyCode::Esc => vec![Action::CancelGeneration],
            _ => vec![],
        }
    }

    fn tick(&mut self, _state: &AppState) -> Vec<Action> {
        self.frame = (self.frame + 1) % SPINNER_FRAMES.len();
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let progress = &state.generation;
        let height = progress.labels.len() as u16 + 7;
        let panel = centered(area, 60, height);
        let block = pane_chrome("generating playlist", focused, None);
        let inner = block.inner(panel);
        frame.render_widget(block, panel);

        let rows = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(progress.labels.len() as u16),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

        let image = state
            .image_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        frame.render_widget(
            Paragraph::new(Span::styled(format!(" {}", image), Style::default().fg(C_SECONDARY))),
            rows[0],
        );

        let lines: Vec<Line> = progress
            .labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                if i < progress.step {
                    Line::from(vec![
                        Span::styled(" ✓ ", Style::default().fg(C_PLAYING)),
                        Span::styled(*label, Style::default().fg(C_SECONDARY)),
                    ])
                } else if i == progress.step {
                    Line::from(vec![
                        Span::styled(
                            format!(" {} ", SPINNER_FRAMES[self.frame]),
                            Style::default().fg(C_ACCENT),
                        ),
                        Span::styled(
                            *label,
                            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
                        ),
                    ])
                } else {
                    Line::from(vec![
                        Span::styled(" ○ ", Style::default().fg(C_MUTED)),
                        Span::styled(*label, Style::default().fg(C_MUTED)),
                    ])
                }
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), rows[1]);

        let percent = progress.display_percent(Instant::now());
        let bar_area = Rect {
            x: rows[3].x + 1,
            width: rows[3].width.saturating_sub(8),
            ..rows[3]
        };
        draw_progress(frame, bar_area, percent / 100.0, None, None);
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("{:>4.0}%", percent),
                Style::default().fg(C_PRIMARY),
            )),
            Rect {
                x: bar_area.x + bar_area.width + 1,
                width: 6,
                ..rows[3]
            },
        );

        if progress.is_done() {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    " waiting for the curator…",
                    Style::default().fg(C_MUTED),
                )),
                rows[4],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    #[test]
    fn test_esc_cancels() {
        let mut s = GeneratingScreen::new();
        let state = AppState::default();
        assert_eq!(
            s.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE), &state),
            vec![Action::CancelGeneration]
        );
        assert!(s
            .handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE), &state)
            .is_empty());
    }
}
