//! PathInput: single-line tui-input field for the image path.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};

use crate::theme::{C_FILTER_BG, C_FILTER_FG, C_MUTED};

#[derive(Debug, PartialEq)]
pub enum InputAction {
    Changed(String),
    Submitted(String),
    Cleared,
    None,
}

pub struct PathInput {
    input: Input,
    placeholder: String,
}

impl PathInput {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            input: Input::default(),
            placeholder: placeholder.into(),
        }
    }

    pub fn set_value(&mut self, value: &str) {
        self.input = Input::new(value.to_string());
    }

    pub fn text(&self) -> &str {
        self.input.value()
    }

    /// Enter submits the trimmed text; Esc clears.
    pub fn handle_key(&mut self, key: KeyEvent) -> InputAction {
        match key.code {
            KeyCode::Enter => InputAction::Submitted(self.input.value().trim().to_string()),
            KeyCode::Esc => {
                if self.input.value().is_empty() {
                    InputAction::None
                } else {
                    self.input = Input::default();
                    InputAction::Cleared
                }
            }
            _ => {
                let before = self.input.value().to_string();
                self.input.handle_event(&Event::Key(key));
                if self.input.value() != before {
                    InputAction::Changed(self.input.value().to_string())
                } else {
                    InputAction::None
                }
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        if area.width < 3 {
            return;
        }
        let scroll = self
            .input
            .visual_scroll(area.width.saturating_sub(3) as usize);
        let value = self.input.value();
        let display = if value.is_empty() {
            Span::styled(format!("› {}", self.placeholder), Style::default().fg(C_MUTED))
        } else {
            let visible: String = value.chars().skip(scroll).collect();
            Span::styled(format!("› {}", visible), Style::default().fg(C_FILTER_FG))
        };

        let paragraph =
            Paragraph::new(Line::from(vec![display])).style(Style::default().bg(C_FILTER_BG));
        frame.render_widget(paragraph, area);

        let cursor_x = area.x + 2 + (self.input.visual_cursor().saturating_sub(scroll)) as u16;
        frame.set_cursor_position((cursor_x.min(area.x + area.width - 1), area.y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_typing_and_submit() {
        let mut input = PathInput::new("path");
        assert_eq!(
            input.handle_key(key(KeyCode::Char('a'))),
            InputAction::Changed("a".into())
        );
        input.handle_key(key(KeyCode::Char('b')));
        input.handle_key(key(KeyCode::Backspace));
        assert_eq!(input.text(), "a");
        input.set_value("  /tmp/x.jpg ");
        assert_eq!(
            input.handle_key(key(KeyCode::Enter)),
            InputAction::Submitted("/tmp/x.jpg".into())
        );
    }

    #[test]
    fn test_esc_clears_then_noop() {
        let mut input = PathInput::new("path");
        input.set_value("abc");
        assert_eq!(input.handle_key(key(KeyCode::Esc)), InputAction::Cleared);
        assert_eq!(input.text(), "");
        assert_eq!(input.handle_key(key(KeyCode::Esc)), InputAction::None);
    }
}
