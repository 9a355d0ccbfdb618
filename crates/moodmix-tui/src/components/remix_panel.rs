//! Mood remix panel: modal over the player with one slider per axis.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};

use moodmix_proto::mood::MoodAxisKind;

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    remix::RemixDraft,
    theme::C_MUTED,
    widgets::{
        pane_chrome::{centered, hit, pane_chrome},
        slider::{draw_slider, slider_track, value_at},
    },
};

const STEP: i16 = 5;

pub struct RemixPanel {
    draft: RemixDraft,
    /// Last-drawn slider rows, one per axis.
    rows: Vec<Rect>,
    dragging: Option<usize>,
}

impl RemixPanel {
    pub fn new() -> Self {
        Self {
            draft: RemixDraft::default(),
            rows: Vec::new(),
            dragging: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.draft.is_open()
    }

    /// Outer rect of the modal inside `area`.
    pub fn panel_rect(area: Rect) -> Rect {
        centered(area, 76, MoodAxisKind::ALL.len() as u16 * 2 + 4)
    }

    fn confirm(&mut self) -> Vec<Action> {
        self.dragging = None;
        match self.draft.confirm() {
            Some(hint) => vec![Action::CloseRemix, Action::Regenerate { hint: Some(hint) }],
            None => vec![],
        }
    }

    fn set_from_column(&mut self, axis: usize, col: u16) {
        if let Some(row) = self.rows.get(axis) {
            let v = value_at(col, slider_track(*row));
            self.draft.set(MoodAxisKind::ALL[axis], v);
        }
    }
}

impl Default for RemixPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for RemixPanel {
    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        let fine = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::Esc => {
                self.draft.cancel();
                vec![Action::CloseRemix]
            }
            KeyCode::Enter => self.confirm(),
            KeyCode::Up | KeyCode::Char('k') => {
                self.draft.select_prev();
                vec![]
            }
            KeyCode::Down | KeyCode::Char('j') | KeyCode::Tab => {
                self.draft.select_next();
                vec![]
            }
            KeyCode::Left | KeyCode::Char('h') => {
                self.draft.adjust(if fine { -1 } else { -STEP });
                vec![]
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.draft.adjust(if fine { 1 } else { STEP });
                vec![]
            }
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, _state: &AppState) -> Vec<Action> {
        let (col, row) = (event.column, event.row);
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Some(i) = self.rows.iter().position(|r| hit(*r, col, row)) {
                    self.draft.select(i);
                    let track = slider_track(self.rows[i]);
                    if col >= track.left && col < track.left + track.width {
                        self.set_from_column(i, col);
                        self.dragging = Some(i);
                    }
                }
                vec![]
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(i) = self.dragging {
                    self.set_from_column(i, col);
                }
                vec![]
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.dragging = None;
                vec![]
            }
            _ => vec![],
        }
    }

    fn on_action(&mut self, action: &Action, state: &AppState) -> Vec<Action> {
        match action {
            Action::OpenRemix => {
                if let Some(doc) = &state.document {
                    self.draft.open(&doc.mood_sliders);
                }
            }
            Action::ResetToStart | Action::DocumentReady => self.draft.cancel(),
            _ => {}
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, _state: &AppState) {
        self.rows.clear();
        let Some(values) = self.draft.values().copied() else {
            return;
        };
        let panel = Self::panel_rect(area);
        frame.render_widget(Clear, panel);
        let block = pane_chrome("mood remix", focused, None);
        let inner = block.inner(panel);
        frame.render_widget(block, panel);

        for (i, kind) in MoodAxisKind::ALL.iter().enumerate() {
            let y = inner.y + 1 + i as u16 * 2;
            if y >= inner.y + inner.height {
                break;
            }
            let row = Rect {
                x: inner.x + 1,
                y,
                width: inner.width.saturating_sub(2),
                height: 1,
            };
            draw_slider(frame, row, *kind, values.get(*kind), i == self.draft.selected_index());
            self.rows.push(row);
        }

        let hint_y = inner.y + inner.height.saturating_sub(1);
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                " Enter regenerate with this mood · Esc keep the current playlist",
                Style::default().fg(C_MUTED),
            ))),
            Rect {
                y: hint_y,
                height: 1,
                ..inner
            },
        );
    }
}
