//! Upload screen: choose the image that seeds a generation cycle.

use std::path::PathBuf;

use ratatui::crossterm::event::KeyEvent;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::{
    action::Action,
    api::guess_image_mime,
    app_state::AppState,
    component::Component,
    theme::{C_ACCENT, C_ERROR, C_MUTED, C_SECONDARY},
    widgets::{
        pane_chrome::{centered, pane_chrome},
        path_input::{InputAction, PathInput},
    },
};

pub struct UploadScreen {
    input: PathInput,
    error: Option<String>,
}

impl UploadScreen {
    pub fn new() -> Self {
        Self {
            input: PathInput::new("~/Pictures/photo.jpg"),
            error: None,
        }
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    #[cfg(test)]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn submit(&mut self, raw: &str) -> Vec<Action> {
        match validate_image_path(raw) {
            Ok(path) => {
                self.error = None;
                vec![Action::SubmitImage(path)]
            }
            Err(message) => {
                self.error = Some(message);
                vec![]
            }
        }
    }
}

impl Default for UploadScreen {
    fn default() -> Self {
        Self::new()
    }
}

/// Expand `~`, then require an existing file with an image extension.
pub fn validate_image_path(raw: &str) -> Result<PathBuf, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("enter the path of an image".to_string());
    }
    let path = match raw.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|h| h.join(rest))
            .unwrap_or_else(|| PathBuf::from(raw)),
        None => PathBuf::from(raw),
    };
    if !path.is_file() {
        return Err(format!("no such file: {}", path.display()));
    }
    if !guess_image_mime(&path).starts_with("image/") {
        return Err(format!("not an image: {}", path.display()));
    }
    Ok(path)
}

impl Component for UploadScreen {
    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        match self.input.handle_key(key) {
            InputAction::Submitted(text) => self.submit(&text),
            InputAction::Changed(_) | InputAction::Cleared => {
                self.error = None;
                vec![]
            }
            InputAction::None => vec![],
        }
    }

    fn on_action(&mut self, action: &Action, state: &AppState) -> Vec<Action> {
        if let Action::ResetToStart = action {
            self.error = None;
            match &state.image_path {
                Some(p) => self.input.set_value(&p.to_string_lossy()),
                None => self.input.set_value(""),
            }
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let panel = centered(area, 72, 11);
        let block = pane_chrome("moodmix", focused, None);
        let inner = block.inner(panel);
        frame.render_widget(block, panel);

        let rows = Layout::vertical([
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

        frame.render_widget(
            Paragraph::new(vec![
                Line::from(Span::styled(
                    " A playlist for the mood of your photo",
                    Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    " Image path (jpg, png, webp, gif, heic):",
                    Style::default().fg(C_SECONDARY),
                )),
            ]),
            rows[0],
        );
        let input_area = Rect {
            x: rows[1].x + 1,
            width: rows[1].width.saturating_sub(2),
            ..rows[1]
        };
        self.input.draw(frame, input_area);

        if let Some(err) = &self.error {
            frame.render_widget(
                Paragraph::new(Span::styled(format!(" ✗ {}", err), Style::default().fg(C_ERROR))),
                rows[3],
            );
        }
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!(" curator: {}", state.api_base),
                Style::default().fg(C_MUTED),
            )),
            rows[4],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_validate_image_path() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("a.png");
        std::fs::write(&img, b"x").unwrap();
        let txt = dir.path().join("notes.txt");
        std::fs::write(&txt, b"x").unwrap();

        assert_eq!(validate_image_path(&img.to_string_lossy()), Ok(img.clone()));
        assert!(validate_image_path("").is_err());
        assert!(validate_image_path(&dir.path().join("missing.jpg").to_string_lossy())
            .unwrap_err()
            .starts_with("no such file"));
        assert!(validate_image_path(&txt.to_string_lossy())
            .unwrap_err()
            .starts_with("not an image"));
    }

    #[test]
    fn test_enter_submits_or_shows_inline_error() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("b.jpg");
        std::fs::write(&img, b"x").unwrap();
        let state = AppState::default();
        let mut screen = UploadScreen::new();

        assert!(screen.handle_key(key(KeyCode::Enter), &state).is_empty());
        assert!(screen.error().is_some());

        screen.input.set_value(&img.to_string_lossy());
        let actions = screen.handle_key(key(KeyCode::Enter), &state);
        assert_eq!(actions, vec![Action::SubmitImage(img)]);
        assert!(screen.error().is_none());
    }
}
