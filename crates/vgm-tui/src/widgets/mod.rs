pub mod progress_bar;
pub mod status_bar;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Cut `s` to at most `max` terminal columns, marking the cut with `…`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_by_columns() {
        assert_eq!(truncate("Chrono Trigger", 20), "Chrono Trigger");
        assert_eq!(truncate("Chrono Trigger", 7), "Chrono…");
        // double-width glyphs take two columns each
        assert_eq!(truncate("聖剣伝説2", 5), "聖剣…");
        assert_eq!(truncate("abc", 0), "");
    }
}
