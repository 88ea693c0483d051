//! Color palette and styles for the player.

use ratatui::style::{Color, Modifier, Style};

pub const C_ACCENT: Color = Color::Rgb(255, 95, 95);
pub const C_PLAYING: Color = Color::Rgb(80, 200, 120);
pub const C_DEGRADED: Color = Color::Rgb(255, 184, 80);
pub const C_MUTED: Color = Color::Rgb(72, 72, 88);
pub const C_SECONDARY: Color = Color::Rgb(115, 115, 138);
pub const C_PRIMARY: Color = Color::Rgb(210, 210, 225);
pub const C_PANEL_BORDER: Color = Color::Rgb(40, 40, 52);
pub const C_OVERLAY_BORDER: Color = Color::Rgb(120, 100, 200);

pub fn style_default() -> Style {
    Style::default().fg(C_PRIMARY)
}

pub fn style_secondary() -> Style {
    Style::default().fg(C_SECONDARY)
}

pub fn style_muted() -> Style {
    Style::default().fg(C_MUTED)
}

/// Game title: bold accent, or amber while the server is down.
pub fn style_game(degraded: bool) -> Style {
    let fg = if degraded { C_DEGRADED } else { C_ACCENT };
    Style::default().fg(fg).add_modifier(Modifier::BOLD)
}

pub fn style_playing(is_playing: bool) -> Style {
    if is_playing {
        Style::default().fg(C_PLAYING).add_modifier(Modifier::BOLD)
    } else {
        style_secondary()
    }
}
