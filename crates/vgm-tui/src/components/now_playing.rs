//! NowPlaying panel: game, track, cover and the track position.

use std::time::Instant;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::{
    app_state::AppState,
    component::Component,
    theme::{style_default, style_game, style_muted, C_PANEL_BORDER},
    widgets::{progress_bar::draw_progress, truncate},
};

pub struct NowPlayingPanel;

impl NowPlayingPanel {
    fn lines(state: &AppState, width: usize) -> Vec<Line<'static>> {
        let view = &state.now_playing;
        let mut lines = vec![
            Line::from(Span::styled(
                truncate(&view.game, width),
                style_game(view.degraded),
            )),
            Line::from(Span::styled(truncate(&view.track, width), style_default())),
        ];
        if !state.fullscreen {
            if let Some(cover) = &view.cover {
                lines.push(Line::from(Span::styled(
                    truncate(&format!("cover {}", cover), width),
                    style_muted(),
                )));
            }
        }
        lines
    }
}

impl Component for NowPlayingPanel {
    fn draw(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        let inner = if state.fullscreen {
            area
        } else {
            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(ratatui::style::Style::default().fg(C_PANEL_BORDER))
                .title(Span::styled(" ♫ vgm-radio ", style_muted()));
            let inner = block.inner(area);
            frame.render_widget(block, area);
            inner
        };
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let text = Self::lines(state, inner.width.saturating_sub(2) as usize);
        let text_h = text.len() as u16;
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Fill(1),
                Constraint::Length(text_h),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Fill(1),
            ])
            .split(inner);

        frame.render_widget(Paragraph::new(text).alignment(Alignment::Center), rows[1]);

        if let Some((elapsed, length)) = state.track_position(Instant::now()) {
            let bar_area = rows[3].inner(ratatui::layout::Margin::new(2, 0));
            draw_progress(frame, bar_area, elapsed, length);
        }
    }
}
