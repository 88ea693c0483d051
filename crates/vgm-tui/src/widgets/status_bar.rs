//! Status bar: play/mute state, volume and key hints on one row.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use vgm_core::ClientPlaybackState;

use super::progress_bar::bar;
use crate::theme::{style_playing, C_ACCENT, C_MUTED, C_PLAYING, C_SECONDARY};

const KEYS: &str = "space play/stop  m mute  0-9 vol  f full  r refresh  ? debug  q quit";

pub fn draw_status_bar(
    frame: &mut Frame,
    area: Rect,
    playback: &ClientPlaybackState,
    player_error: Option<&str>,
) {
    let vol_color = if playback.is_muted { C_MUTED } else { C_PLAYING };
    let mut spans = vec![
        Span::styled(format!(" {} ", playback.play_icon()), style_playing(playback.is_playing)),
        Span::raw(" "),
        Span::raw(playback.mute_icon()),
        Span::raw(" "),
        Span::styled(bar(playback.volume as f64, 10), Style::default().fg(vol_color)),
        Span::styled(
            format!(" {:>3}%", (playback.volume * 100.0).round() as u32),
            Style::default().fg(C_SECONDARY),
        ),
        Span::raw("  "),
    ];
    match player_error {
        Some(err) => spans.push(Span::styled(
            err.to_string(),
            Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
        )),
        None => spans.push(Span::styled(KEYS, Style::default().fg(C_MUTED))),
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
