//! Platform-agnostic input event types.
//!
//! The host maps its native keyboard and mouse input to these enums once per
//! frame. The console never sees raw platform input.

use serde::{Deserialize, Serialize};

/// A platform-agnostic input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// Printable character typed.
    Text(char),
    /// Non-text key pressed.
    KeyPress {
        key: Key,
        /// Whether a shift modifier was held.
        shift: bool,
    },
    /// Mouse wheel moved. Positive deltas scroll towards older lines.
    Wheel(i32),
}

impl InputEvent {
    /// A key press without modifiers.
    pub const fn key(key: Key) -> Self {
        Self::KeyPress { key, shift: false }
    }

    /// A key press with shift held.
    pub const fn shifted(key: Key) -> Self {
        Self::KeyPress { key, shift: true }
    }
}

/// Keys the console reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// The `` ` `` / `~` key, the default console toggle.
    Backquote,
    Escape,
    Enter,
    Backspace,
    Delete,
    Tab,
    Up,
    Down,
    Left,
    Right,
    /// Function key `F1`..`F12`.
    F(u8),
}

impl Key {
    /// Zero-based action slot of a function key.
    pub fn function_slot(self) -> Option<usize> {
        match self {
            Key::F(n @ 1..=12) => Some(usize::from(n - 1)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_helpers() {
        assert_eq!(
            InputEvent::key(Key::Tab),
            InputEvent::KeyPress {
                key: Key::Tab,
                shift: false
            }
        );
        assert_eq!(
            InputEvent::shifted(Key::Tab),
            InputEvent::KeyPress {
                key: Key::Tab,
                shift: true
            }
        );
    }

    #[test]
    fn text_input_unicode() {
        let e = InputEvent::Text('\u{1F600}');
        if let InputEvent::Text(ch) = e {
            assert_eq!(ch, '\u{1F600}');
        }
    }

    #[test]
    fn function_slots() {
        assert_eq!(Key::F(1).function_slot(), Some(0));
        assert_eq!(Key::F(12).function_slot(), Some(11));
        assert_eq!(Key::F(0).function_slot(), None);
        assert_eq!(Key::F(13).function_slot(), None);
        assert_eq!(Key::Enter.function_slot(), None);
    }

    #[test]
    fn key_deserializes_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            key: Key,
        }
        let w: Wrapper = toml::from_str("key = \"Escape\"").unwrap();
        assert_eq!(w.key, Key::Escape);
    }

    #[test]
    fn wheel_differs_by_delta() {
        assert_ne!(InputEvent::Wheel(1), InputEvent::Wheel(-1));
    }
}
