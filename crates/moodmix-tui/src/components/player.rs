//! Player: the playlist result screen.
//!
//! Layout:
//!
//! ```text
//!  title · now playing
//!  ┌ image ─────────── 1/3 ┐┌ tracks ──────────────────┐
//!  │ ‹       ▶ PLAY      › ││ ▶ 1  0:00  title  artist │
//!  │         ● ○ ○         │└──────────────────────────┘
//!  └───────────────────────┘┌ about ───────────────────┐
//!  0:42 ████████▌            9:00                       │
//!  [▶ play] [m remix] [g regenerate] ...
//! ```
//!
//! The carousel position is owned here.  Playback state is read from
//! `AppState::playback`; every playback change goes out as an `Action`.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use unicode_width::UnicodeWidthStr;

use moodmix_proto::playlist::{ImageKind, PlaylistDocument};

use crate::{
    action::Action,
    app_state::AppState,
    carousel::Carousel,
    component::Component,
    playback::BarGeometry,
    theme::{
        style_selected, C_ACCENT, C_BG, C_IMAGE_LP, C_IMAGE_ORIGINAL, C_IMAGE_YOUTUBE, C_MUTED,
        C_PLAYING, C_PRIMARY, C_SECONDARY, C_TAG,
    },
    widgets::{
        pane_chrome::{hit, pane_chrome, Badge},
        progress_bar::{draw_progress, fmt_time},
        truncate,
    },
};

const SEEK_STEP_SECS: f64 = 10.0;

/// Last-drawn rects, used by `handle_mouse`.
#[derive(Debug, Default, Clone)]
struct PlayerAreas {
    image: Rect,
    overlay: Rect,
    dots: Vec<Rect>,
    bar_row: Rect,
    bar: BarGeometry,
    tracks: Rect,
    buttons: Vec<(Rect, Action)>,
}

pub struct Player {
    carousel: Carousel,
    areas: PlayerAreas,
    dragging: bool,
    track_scroll: usize,
}

impl Player {
    pub fn new() -> Self {
        Self {
            carousel: Carousel::default(),
            areas: PlayerAreas::default(),
            dragging: false,
            track_scroll: 0,
        }
    }

    #[cfg(test)]
    pub fn carousel(&self) -> &Carousel {
        &self.carousel
    }

    fn on_mouse_down(&mut self, col: u16, row: u16, state: &AppState) -> Vec<Action> {
        let areas = self.areas.clone();

        // The overlay sits on top of the image halves; it must win.
        if hit(areas.overlay, col, row) {
            return vec![Action::TogglePlay];
        }
        if hit(areas.bar_row, col, row) && areas.bar.width > 0 {
            self.dragging = true;
            return vec![Action::SeekClick {
                x: col,
                bar: areas.bar,
            }];
        }
        if let Some(i) = areas.dots.iter().position(|r| hit(*r, col, row)) {
            self.carousel.select(i);
            return vec![];
        }
        if hit(areas.image, col, row) {
            if col < areas.image.x + areas.image.width / 2 {
                self.carousel.prev();
            } else {
                self.carousel.next();
            }
            return vec![];
        }
        if hit(areas.tracks, col, row) {
            let index = (row - areas.tracks.y) as usize + self.track_scroll;
            let len = state.document.as_ref().map_or(0, |d| d.tracks.len());
            if index < len {
                return vec![Action::PlayTrack(index)];
            }
            return vec![];
        }
        if let Some((_, action)) = areas.buttons.iter().find(|(r, _)| hit(*r, col, row)) {
            return vec![action.clone()];
        }
        vec![]
    }

    fn draw_image(&mut self, frame: &mut Frame, area: Rect, doc: &PlaylistDocument, state: &AppState) {
        let index = self.carousel.index();
        let image = doc.images.get(index);
        let kind = image.map_or(ImageKind::Original, |i| i.kind);
        let badge_text = format!("{}/{}", index + 1, doc.images.len().max(1));
        let title = format!("image · {}", kind.label());
        let block = pane_chrome(
            &title,
            false,
            Some(Badge {
                text: &badge_text,
                color: C_SECONDARY,
            }),
        );
        let inner = block.inner(area);
        frame.render_widget(block, area);
        self.areas.image = inner;
        self.areas.overlay = Rect::default();
        self.areas.dots.clear();
        if inner.height < 3 || inner.width < 12 {
            return;
        }

        let color = match kind {
            ImageKind::Original => C_IMAGE_ORIGINAL,
            ImageKind::Youtube => C_IMAGE_YOUTUBE,
            ImageKind::Lp => C_IMAGE_LP,
        };
        let caption = match kind {
            ImageKind::Original => "your photo",
            ImageKind::Youtube => "video thumbnail",
            ImageKind::Lp => "LP cover",
        };
        let source = image.map_or("", |i| i.url.as_str());
        let text_w = inner.width.saturating_sub(4) as usize;
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("◆ {}", caption),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
            .centered(),
            Line::from(Span::styled(truncate(source, text_w), Style::default().fg(C_MUTED)))
                .centered(),
            Line::from(Span::styled("(no preview in terminal)", Style::default().fg(C_MUTED)))
                .centered(),
        ];
        frame.render_widget(Paragraph::new(lines), inner);

        let mid = inner.y + inner.height / 2;
        let arrows = Line::from(vec![
            Span::styled("‹", Style::default().fg(C_SECONDARY)),
            Span::raw(" ".repeat(inner.width.saturating_sub(2) as usize)),
            Span::styled("›", Style::default().fg(C_SECONDARY)),
        ]);
        frame.render_widget(
            Paragraph::new(arrows),
            Rect {
                y: mid,
                height: 1,
                ..inner
            },
        );

        // Play/pause overlay, centered below the caption.
        let label = if state.playback.playing { " ❚❚ PAUSE " } else { " ▶ PLAY " };
        let w = label.chars().count() as u16;
        let overlay = Rect {
            x: inner.x + (inner.width.saturating_sub(w)) / 2,
            y: (mid + 1).min(inner.y + inner.height - 1),
            width: w.min(inner.width),
            height: 1,
        };
        frame.render_widget(
            Paragraph::new(Span::styled(
                label,
                Style::default().fg(C_BG).bg(C_ACCENT).add_modifier(Modifier::BOLD),
            )),
            overlay,
        );
        self.areas.overlay = overlay;

        // Dot indicators on the last row, two columns each.
        let n = self.carousel.len() as u16;
        if n > 1 {
            let dots_w = n * 2 - 1;
            let x0 = inner.x + inner.width.saturating_sub(dots_w) / 2;
            let y = inner.y + inner.height - 1;
            let mut spans = Vec::new();
            for i in 0..n {
                let active = i as usize == index;
                spans.push(Span::styled(
                    if active { "●" } else { "○" },
                    Style::default().fg(if active { C_PRIMARY } else { C_MUTED }),
                ));
                if i + 1 < n {
                    spans.push(Span::raw(" "));
                }
                self.areas.dots.push(Rect {
                    x: x0 + i * 2,
                    y,
                    width: 1,
                    height: 1,
                });
            }
            frame.render_widget(
                Paragraph::new(Line::from(spans)),
                Rect {
                    x: x0,
                    y,
                    width: dots_w.min(inner.width),
                    height: 1,
                },
            );
        }
    }

    fn draw_tracks(&mut self, frame: &mut Frame, area: Rect, doc: &PlaylistDocument, state: &AppState) {
        let count = format!("{} songs", doc.tracks.len());
        let block = pane_chrome(
            "tracks",
            false,
            Some(Badge {
                text: &count,
                color: C_SECONDARY,
            }),
        );
        let inner = block.inner(area);
        frame.render_widget(block, area);
        self.areas.tracks = inner;

        let visible = inner.height as usize;
        let current = state.playback.current_index;
        if visible > 0 {
            if current < self.track_scroll {
                self.track_scroll = current;
            } else if current >= self.track_scroll + visible {
                self.track_scroll = current + 1 - visible;
            }
        }

        let width = inner.width as usize;
        let lines: Vec<Line> = doc
            .tracks
            .iter()
            .enumerate()
            .skip(self.track_scroll)
            .take(visible)
            .map(|(i, track)| {
                let is_current = i == current && state.playback.loaded;
                let marker = if is_current && state.playback.playing {
                    "▶"
                } else if is_current {
                    "❚"
                } else {
                    " "
                };
                let prefix = format!(" {} {:>2}  {:>5}  ", marker, i + 1, fmt_time(track.start_time));
                let rest = width.saturating_sub(prefix.width());
                let title = truncate(&track.title, rest * 3 / 5);
                let artist = truncate(&track.artist, rest.saturating_sub(title.width() + 2));
                let line = Line::from(vec![
                    Span::styled(
                        prefix,
                        Style::default().fg(if is_current { C_PLAYING } else { C_MUTED }),
                    ),
                    Span::styled(title, Style::default().fg(C_PRIMARY)),
                    Span::raw("  "),
                    Span::styled(artist, Style::default().fg(C_SECONDARY)),
                ]);
                if is_current {
                    line.style(style_selected())
                } else {
                    line
                }
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn draw_about(&self, frame: &mut Frame, area: Rect, doc: &PlaylistDocument, state: &AppState) {
        let block = pane_chrome("about", false, None);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut tags = Vec::new();
        for kw in &doc.keywords {
            tags.push(Span::styled(
                format!("#{} {}", kw.keyword, kw.value),
                Style::default().fg(C_TAG),
            ));
            tags.push(Span::raw("  "));
        }
        let mut lines = vec![Line::from(tags), Line::from("")];
        if let Some(track) = doc.tracks.get(state.playback.current_index) {
            lines.push(Line::from(vec![
                Span::styled("♪ ", Style::default().fg(C_PLAYING)),
                Span::styled(track.reason.clone(), Style::default().fg(C_PRIMARY)),
            ]));
        }
        if !doc.keyword_explanation.is_empty() {
            lines.push(Line::from(Span::styled(
                doc.keyword_explanation.clone(),
                Style::default().fg(C_SECONDARY),
            )));
        }
        if !doc.playlist_reason.is_empty() {
            lines.push(Line::from(Span::styled(
                doc.playlist_reason.clone(),
                Style::default().fg(C_SECONDARY),
            )));
        }
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
    }

    fn draw_buttons(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        let play = if state.playback.playing { "❚❚ pause" } else { "▶ play" };
        let buttons = [
            (play.to_string(), Action::TogglePlay),
            ("m remix".to_string(), Action::OpenRemix),
            ("g regenerate".to_string(), Action::Regenerate { hint: None }),
            ("d download image".to_string(), Action::DownloadImage(self.carousel.index())),
            ("s save mix".to_string(), Action::SaveMix),
            ("x start over".to_string(), Action::ResetToStart),
        ];
        self.areas.buttons.clear();
        let mut spans = Vec::new();
        let mut x = area.x + 1;
        spans.push(Span::raw(" "));
        for (label, action) in buttons {
            let text = format!("[{}]", label);
            let w = text.chars().count() as u16;
            if x + w > area.x + area.width {
                break;
            }
            self.areas.buttons.push((
                Rect {
                    x,
                    y: area.y,
                    width: w,
                    height: 1,
                },
                action,
            ));
            spans.push(Span::styled(text, Style::default().fg(C_SECONDARY)));
            spans.push(Span::raw(" "));
            x += w + 1;
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Component for Player {
    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        match key.code {
            KeyCode::Char(' ') => vec![Action::TogglePlay],
            KeyCode::Left => vec![Action::SeekRelative(-SEEK_STEP_SECS)],
            KeyCode::Right => vec![Action::SeekRelative(SEEK_STEP_SECS)],
            KeyCode::Char('n') => vec![Action::NextTrack],
            KeyCode::Char('p') => vec![Action::PrevTrack],
            KeyCode::Char('h') => {
                self.carousel.prev();
                vec![]
            }
            KeyCode::Char('l') => {
                self.carousel.next();
                vec![]
            }
            KeyCode::Char('m') => vec![Action::OpenRemix],
            KeyCode::Char('g') => vec![Action::Regenerate { hint: None }],
            KeyCode::Char('x') => vec![Action::ResetToStart],
            KeyCode::Char('d') => vec![Action::DownloadImage(self.carousel.index())],
            KeyCode::Char('s') if key.modifiers == KeyModifiers::NONE => vec![Action::SaveMix],
            KeyCode::Char(c @ '1'..='9') => vec![Action::PlayTrack(c as usize - '1' as usize)],
            _ => vec![],
        }
    }

    fn handle_mouse(&mut self, event: MouseEvent, _area: Rect, state: &AppState) -> Vec<Action> {
        let (col, row) = (event.column, event.row);
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => self.on_mouse_down(col, row, state),
            MouseEventKind::Drag(MouseButton::Left) if self.dragging => vec![Action::SeekDrag {
                x: col,
                bar: self.areas.bar,
                primary_held: true,
            }],
            MouseEventKind::Up(MouseButton::Left) => {
                self.dragging = false;
                vec![]
            }
            // Button released outside the terminal: the drag is over.
            MouseEventKind::Moved if self.dragging => {
                self.dragging = false;
                vec![Action::SeekDrag {
                    x: col,
                    bar: self.areas.bar,
                    primary_held: false,
                }]
            }
            MouseEventKind::ScrollDown if hit(self.areas.tracks, col, row) => {
                let len = state.document.as_ref().map_or(0, |d| d.tracks.len());
                if self.track_scroll + (self.areas.tracks.height as usize) < len {
                    self.track_scroll += 1;
                }
                vec![]
            }
            MouseEventKind::ScrollUp if hit(self.areas.tracks, col, row) => {
                self.track_scroll = self.track_scroll.saturating_sub(1);
                vec![]
            }
            _ => vec![],
        }
    }

    fn on_action(&mut self, action: &Action, state: &AppState) -> Vec<Action> {
        if let Action::DocumentReady = action {
            let len = state.document.as_ref().map_or(0, |d| d.images.len());
            self.carousel.reset(len);
            self.track_scroll = 0;
            self.dragging = false;
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        let Some(doc) = state.document.as_ref() else {
            return;
        };

        let rows = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(8),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

        let mut title = vec![Span::styled(
            format!(" {}", doc.title),
            Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
        )];
        if let Some(track) = doc.tracks.get(state.playback.current_index) {
            title.push(Span::styled(
                format!("  ·  {} — {}", track.title, track.artist),
                Style::default().fg(C_SECONDARY),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(title)), rows[0]);

        let body = Layout::horizontal([Constraint::Percentage(42), Constraint::Percentage(58)])
            .split(rows[1]);
        let right = Layout::vertical([Constraint::Min(4), Constraint::Length(9)]).split(body[1]);

        self.draw_image(frame, body[0], doc, state);
        self.draw_tracks(frame, right[0], doc, state);
        self.draw_about(frame, right[1], doc, state);

        let bar_row = Rect {
            x: rows[2].x + 1,
            width: rows[2].width.saturating_sub(2),
            ..rows[2]
        };
        let snap = &state.playback;
        self.areas.bar = draw_progress(
            frame,
            bar_row,
            snap.progress_percent / 100.0,
            Some(snap.current_time),
            Some(snap.total_duration),
        );
        self.areas.bar_row = bar_row;

        self.draw_buttons(frame, rows[3], state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moodmix_proto::playlist::Image;
    use ratatui::{backend::TestBackend, Terminal};

    fn state() -> AppState {
        let mut doc = PlaylistDocument::fallback("/tmp/p.jpg", "");
        doc.images = vec![
            Image {
                kind: ImageKind::Original,
                url: "/tmp/p.jpg".into(),
            },
            Image {
                kind: ImageKind::Youtube,
                url: "http://h/y".into(),
            },
            Image {
                kind: ImageKind::Lp,
                url: "http://h/l".into(),
            },
        ];
        let mut state = AppState::default();
        state.document = Some(doc);
        state.playback.total_duration = 540.0;
        state.playback.loaded = true;
        state
    }

    fn drawn(state: &AppState) -> Player {
        let mut player = Player::new();
        player.on_action(&Action::DocumentReady, state);
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal
            .draw(|f| player.draw(f, f.area(), true, state))
            .unwrap();
        player
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_overlay_click_toggles_without_moving_carousel() {
        let s = state();
        let mut p = drawn(&s);
        let o = p.areas.overlay;
        assert!(o.width > 0);
        let actions = p.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), o.x, o.y), Rect::default(), &s);
        assert_eq!(actions, vec![Action::TogglePlay]);
        assert_eq!(p.carousel().index(), 0);
    }

    #[test]
    fn test_image_halves_and_dots_navigate() {
        let s = state();
        let mut p = drawn(&s);
        let img = p.areas.image;
        let down = MouseEventKind::Down(MouseButton::Left);
        p.handle_mouse(mouse(down, img.x, img.y), Rect::default(), &s);
        assert_eq!(p.carousel().index(), 2);
        p.handle_mouse(mouse(down, img.x + img.width - 1, img.y), Rect::default(), &s);
        assert_eq!(p.carousel().index(), 0);
        let dot = p.areas.dots[1];
        p.handle_mouse(mouse(down, dot.x, dot.y), Rect::default(), &s);
        assert_eq!(p.carousel().index(), 1);
    }

    #[test]
    fn test_bar_click_then_drag() {
        let s = state();
        let mut p = drawn(&s);
        let bar = p.areas.bar;
        let row = p.areas.bar_row.y;
        let actions = p.handle_mouse(
            mouse(MouseEventKind::Down(MouseButton::Left), bar.left + 3, row),
            Rect::default(),
            &s,
        );
        assert_eq!(actions, vec![Action::SeekClick { x: bar.left + 3, bar }]);
        let actions = p.handle_mouse(
            mouse(MouseEventKind::Drag(MouseButton::Left), bar.left + 9, row),
            Rect::default(),
            &s,
        );
        assert_eq!(
            actions,
            vec![Action::SeekDrag {
                x: bar.left + 9,
                bar,
                primary_held: true
            }]
        );
        p.handle_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 0, row), Rect::default(), &s);
        assert!(p
            .handle_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 5, row), Rect::default(), &s)
            .is_empty());
    }

    #[test]
    fn test_track_row_click() {
        let s = state();
        let mut p = drawn(&s);
        let t = p.areas.tracks;
        let actions = p.handle_mouse(
            mouse(MouseEventKind::Down(MouseButton::Left), t.x + 2, t.y + 1),
            Rect::default(),
            &s,
        );
        assert_eq!(actions, vec![Action::PlayTrack(1)]);
        let actions = p.handle_mouse(
            mouse(MouseEventKind::Down(MouseButton::Left), t.x + 2, t.y + 3),
            Rect::default(),
            &s,
        );
        assert!(actions.is_empty());
    }

    #[test]
    fn test_buttons_map_to_actions() {
        let s = state();
        let mut p = drawn(&s);
        let labels: Vec<Action> = p.areas.buttons.iter().map(|(_, a)| a.clone()).collect();
        assert!(labels.contains(&Action::OpenRemix));
        assert!(labels.contains(&Action::ResetToStart));
        let (r, a) = p.areas.buttons[4].clone();
        let actions = p.handle_mouse(mouse(MouseEventKind::Down(MouseButton::Left), r.x, r.y), Rect::default(), &s);
        assert_eq!(actions, vec![a]);
    }

    #[test]
    fn test_keys() {
        let s = state();
        let mut p = drawn(&s);
        assert_eq!(p.handle_key(key(KeyCode::Char(' ')), &s), vec![Action::TogglePlay]);
        assert_eq!(p.handle_key(key(KeyCode::Left), &s), vec![Action::SeekRelative(-10.0)]);
        assert_eq!(p.handle_key(key(KeyCode::Char('2')), &s), vec![Action::PlayTrack(1)]);
        assert!(p.handle_key(key(KeyCode::Char('l')), &s).is_empty());
        assert_eq!(p.handle_key(key(KeyCode::Char('d')), &s), vec![Action::DownloadImage(1)]);
    }
}
