//! Action enum and the key map that produces it.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    TogglePlayback,
    ToggleMute,
    ToggleFullscreen,
    /// Number key; the slider position is derived from the digit.
    VolumeKey(char),
    RefreshNow,
    ToggleDebug,
    Quit,
}

/// Translate a key press. Anything held with alt, ctrl, shift or super is
/// left to the terminal, except Ctrl-C which always quits. Some terminals
/// report `?` with shift held.
pub fn action_for_key(key: KeyEvent) -> Option<Action> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
        return Some(Action::Quit);
    }
    let shifted_query = key.modifiers == KeyModifiers::SHIFT && key.code == KeyCode::Char('?');
    if !key.modifiers.is_empty() && !shifted_query {
        return None;
    }
    match key.code {
        KeyCode::Char(' ') => Some(Action::TogglePlayback),
        KeyCode::Char('m') => Some(Action::ToggleMute),
        KeyCode::Char('f') => Some(Action::ToggleFullscreen),
        KeyCode::Char(c @ '0'..='9') => Some(Action::VolumeKey(c)),
        KeyCode::Char('r') => Some(Action::RefreshNow),
        KeyCode::Char('?') => Some(Action::ToggleDebug),
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_bindings() {
        assert_eq!(action_for_key(press(KeyCode::Char(' '))), Some(Action::TogglePlayback));
        assert_eq!(action_for_key(press(KeyCode::Char('m'))), Some(Action::ToggleMute));
        assert_eq!(action_for_key(press(KeyCode::Char('f'))), Some(Action::ToggleFullscreen));
        assert_eq!(action_for_key(press(KeyCode::Char('7'))), Some(Action::VolumeKey('7')));
        assert_eq!(action_for_key(press(KeyCode::Char('0'))), Some(Action::VolumeKey('0')));
        assert_eq!(action_for_key(press(KeyCode::Char('r'))), Some(Action::RefreshNow));
        assert_eq!(action_for_key(press(KeyCode::Char('?'))), Some(Action::ToggleDebug));
        assert_eq!(action_for_key(press(KeyCode::Char('q'))), Some(Action::Quit));
        assert_eq!(action_for_key(press(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_modified_keys_are_ignored() {
        for mods in [KeyModifiers::ALT, KeyModifiers::SHIFT, KeyModifiers::SUPER] {
            assert_eq!(action_for_key(KeyEvent::new(KeyCode::Char('m'), mods)), None);
        }
        assert_eq!(
            action_for_key(KeyEvent::new(KeyCode::Char(' '), KeyModifiers::CONTROL)),
            None
        );
        assert_eq!(
            action_for_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Action::Quit)
        );
        assert_eq!(
            action_for_key(KeyEvent::new(KeyCode::Char('?'), KeyModifiers::SHIFT)),
            Some(Action::ToggleDebug)
        );
    }

    #[test]
    fn test_release_is_ignored() {
        let mut key = press(KeyCode::Char(' '));
        key.kind = KeyEventKind::Release;
        assert_eq!(action_for_key(key), None);
    }
}
