//! Status bar: bottom line with api health, audio state, and keybindings.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app_state::{ApiHealth, Screen};
use crate::theme::{C_BADGE_ERR, C_BADGE_LIVE, C_BADGE_PENDING, C_MUTED, C_SECONDARY};

fn health_badge(health: &ApiHealth) -> (&'static str, Color) {
    match health {
        ApiHealth::Checking => ("API …", C_BADGE_PENDING),
        ApiHealth::Up(_) => ("API ●", C_BADGE_LIVE),
        ApiHealth::Down(_) => ("API ○", C_BADGE_ERR),
    }
}

pub fn keys_for(screen: Screen, remix_open: bool) -> &'static str {
    match screen {
        Screen::Upload => " type an image path  Enter generate  Esc clear  Ctrl-C quit",
        Screen::Generating => " Esc cancel  q quit",
        Screen::Playlist if remix_open => {
            " ↑↓ axis  ←→ adjust (Shift ±1)  Enter regenerate  Esc cancel"
        }
        Screen::Playlist => {
            " Space play/pause  ←→ seek  n/p track  h/l image  m remix  g regenerate  d download  s save mix  x reset  q quit"
        }
    }
}

/// Draw the keybindings footer bar (one row).
pub fn draw_status_bar(
    frame: &mut Frame,
    area: Rect,
    screen: Screen,
    remix_open: bool,
    health: &ApiHealth,
    audio_available: bool,
) {
    let (badge, color) = health_badge(health);
    let mut spans = vec![Span::styled(
        format!(" {} ", badge),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )];
    if !audio_available {
        spans.push(Span::styled(
            "NO AUDIO ",
            Style::default().fg(C_BADGE_ERR).add_modifier(Modifier::BOLD),
        ));
    }
    spans.push(Span::styled(
        keys_for(screen, remix_open),
        Style::default().fg(C_MUTED),
    ));
    if let ApiHealth::Down(reason) = health {
        spans.push(Span::styled(
            format!("  ({})", reason),
            Style::default().fg(C_SECONDARY),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_follow_screen() {
        assert!(keys_for(Screen::Upload, false).contains("Enter generate"));
        assert!(keys_for(Screen::Playlist, false).contains("m remix"));
        assert!(keys_for(Screen::Playlist, true).contains("Esc cancel"));
    }

    #[test]
    fn test_health_badge() {
        assert_eq!(health_badge(&ApiHealth::Up("ok".into())).1, C_BADGE_LIVE);
        assert_eq!(health_badge(&ApiHealth::Down("refused".into())).1, C_BADGE_ERR);
    }
}
