//! DebugOverlay: centered popup with the poller's latest figures.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};
use vgm_core::CycleOutcome;

use crate::{
    app_state::AppState,
    component::Component,
    theme::{style_default, style_secondary, C_OVERLAY_BORDER},
};

pub struct DebugOverlay;

fn row(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<12}", label), style_secondary()),
        Span::styled(value, style_default()),
    ])
}

impl DebugOverlay {
    fn lines(state: &AppState) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        match &state.last_report {
            None => lines.push(row("next poll", "pending".into())),
            Some(report) => {
                lines.push(row(
                    "next poll",
                    format!("in {:.1}s", report.delay.as_secs_f64()),
                ));
                match &report.outcome {
                    CycleOutcome::Updated {
                        remaining_secs,
                        buffer_secs,
                    } => {
                        lines.push(row("remaining", format!("{:.1}s", remaining_secs)));
                        lines.push(row("buffer", format!("{:.2}s", buffer_secs)));
                    }
                    CycleOutcome::Down { .. } => lines.push(row("state", "degraded".into())),
                }
            }
        }
        lines.push(row(
            "last error",
            state.last_error.clone().unwrap_or_else(|| "none".into()),
        ));
        lines
    }
}

impl Component for DebugOverlay {
    fn draw(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        if !state.show_debug {
            return;
        }
        let w = area.width.min(56);
        let h = area.height.min(8);
        let popup = Rect {
            x: area.x + (area.width - w) / 2,
            y: area.y + (area.height - h) / 2,
            width: w,
            height: h,
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(C_OVERLAY_BORDER))
            .title(" debug ");
        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(Self::lines(state))
                .block(block)
                .wrap(Wrap { trim: true }),
            popup,
        );
    }
}
