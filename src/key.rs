use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Names of keys that never produce content and are dropped on arrival.
pub const IGNORED_KEY_NAMES: [&str; 6] = ["Shift", "Control", "Alt", "Meta", "CapsLock", "Tab"];

/// A single key event as seen by the keystroke processor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    /// Modifiers and anything else that is not content.
    Ignored,
}

impl Key {
    /// Parse a browser-style key name (`"a"`, `"Backspace"`, `"Shift"`).
    ///
    /// Single characters become content; `Backspace` is recognised; any
    /// other name, known modifier or not, is ignored.
    pub fn from_name(name: &str) -> Self {
        if name == "Backspace" {
            return Key::Backspace;
        }
        if IGNORED_KEY_NAMES.contains(&name) {
            return Key::Ignored;
        }

        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Key::Char(c),
            _ => Key::Ignored,
        }
    }

    /// Label used in keystroke records.
    pub fn label(&self) -> String {
        match self {
            Key::Char(c) => c.to_string(),
            Key::Backspace => "Backspace".to_string(),
            Key::Ignored => String::new(),
        }
    }
}

impl From<char> for Key {
    fn from(c: char) -> Self {
        Key::Char(c)
    }
}

impl From<KeyEvent> for Key {
    fn from(ev: KeyEvent) -> Self {
        match ev.code {
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Char(_) if ev.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                Key::Ignored
            }
            KeyCode::Char(c) => Key::Char(c),
            _ => Key::Ignored,
        }
    }
}
