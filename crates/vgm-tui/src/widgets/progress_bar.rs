//! Smooth Unicode bars for track position and volume.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use vgm_core::snapshot::format_clock;

use crate::theme::{C_MUTED, C_PLAYING, C_SECONDARY};

const BLOCKS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];

/// `fraction` of `width` cells filled, eighth-cell resolution.
pub fn bar(fraction: f64, width: usize) -> String {
    let eighths = (fraction.clamp(0.0, 1.0) * width as f64 * 8.0).round() as usize;
    let full = eighths / 8;
    let partial = eighths % 8;

    let mut s = String::with_capacity(width * 3);
    for _ in 0..full {
        s.push('█');
    }
    if full < width {
        s.push(BLOCKS[partial]);
        for _ in (full + 1)..width {
            s.push(' ');
        }
    }
    s
}

/// Track position bar with `elapsed` and `length` labels on either side.
pub fn draw_progress(frame: &mut Frame, area: Rect, elapsed: f64, length: f64) {
    if area.width < 4 || area.height == 0 {
        return;
    }
    let left = format_clock(elapsed);
    let right = format_clock(length);
    let label_w = (left.len() + right.len() + 2) as u16;
    let bar_w = area.width.saturating_sub(label_w).max(4) as usize;
    let fraction = if length > 0.0 { elapsed / length } else { 0.0 };

    let line = Line::from(vec![
        Span::styled(format!("{} ", left), Style::default().fg(C_SECONDARY)),
        Span::styled(bar(fraction, bar_w), Style::default().fg(C_PLAYING)),
        Span::styled(format!(" {}", right), Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}
