//! Key bindings: normal and vim-style.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Rotate,
    SoftDrop,
    HardDrop,
    Pause,
    ToggleBgm,
    ToggleSfx,
    Quit,
    None,
}

/// Map key event to game action. Supports both normal (arrows, space) and vim (hjkl).
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p') => Action::Pause,
        KeyCode::Char('m') => Action::ToggleBgm,
        KeyCode::Char('x') => Action::ToggleSfx,
        KeyCode::Left | KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::MoveRight,
        KeyCode::Up | KeyCode::Char('k') => Action::Rotate,
        KeyCode::Down | KeyCode::Char('j') => Action::SoftDrop,
        KeyCode::Enter | KeyCode::Char(' ') => Action::HardDrop,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arrow_and_vim_keys_agree() {
        let pairs = [
            (KeyCode::Left, KeyCode::Char('h'), Action::MoveLeft),
            (KeyCode::Right, KeyCode::Char('l'), Action::MoveRight),
            (KeyCode::Up, KeyCode::Char('k'), Action::Rotate),
            (KeyCode::Down, KeyCode::Char('j'), Action::SoftDrop),
        ];
        for (normal, vim, action) in pairs {
            assert_eq!(key_to_action(KeyEvent::new(normal, KeyModifiers::NONE)), action);
            assert_eq!(key_to_action(KeyEvent::new(vim, KeyModifiers::NONE)), action);
        }
    }

    #[test]
    fn test_audio_toggles() {
        let m = KeyEvent::new(KeyCode::Char('m'), KeyModifiers::NONE);
        let x = KeyEvent::new(KeyCode::Char('x'), KeyModifiers::NONE);
        assert_eq!(key_to_action(m), Action::ToggleBgm);
        assert_eq!(key_to_action(x), Action::ToggleSfx);
    }

    #[test]
    fn test_modified_keys_are_ignored() {
        let ctrl_h = KeyEvent::new(KeyCode::Char('h'), KeyModifiers::CONTROL);
        let alt_space = KeyEvent::new(KeyCode::Char(' '), KeyModifiers::ALT);
        assert_eq!(key_to_action(ctrl_h), Action::None);
        assert_eq!(key_to_action(alt_space), Action::None);
    }
}
