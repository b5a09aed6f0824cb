//! Keyboard input model.
//!
//! Only the keys the composite widgets react to are named; everything else
//! arrives as [`Key::Character`] or [`Key::Other`] and is ignored by the
//! built-in handlers.

/// A key on the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Up arrow.
    ArrowUp,
    /// Down arrow.
    ArrowDown,
    /// Left arrow.
    ArrowLeft,
    /// Right arrow.
    ArrowRight,
    /// Home.
    Home,
    /// End.
    End,
    /// Enter / Return.
    Enter,
    /// Space bar.
    Space,
    /// Tab.
    Tab,
    /// Escape.
    Escape,
    /// A printable character.
    Character(char),
    /// Any other key.
    Other,
}

impl Key {
    /// Whether this key activates the focused control.
    pub fn is_activation(self) -> bool {
        matches!(self, Key::Enter | Key::Space)
    }
}

/// Modifier keys held during a key press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KeyboardModifiers {
    /// The Shift key is held.
    pub shift: bool,
    /// The Control key is held.
    pub control: bool,
    /// The Alt key is held.
    pub alt: bool,
    /// The Meta key is held.
    pub meta: bool,
}

impl KeyboardModifiers {
    /// No modifiers pressed.
    pub const NONE: Self = Self {
        shift: false,
        control: false,
        alt: false,
        meta: false,
    };

    /// Only Shift pressed.
    pub const SHIFT: Self = Self {
        shift: true,
        control: false,
        alt: false,
        meta: false,
    };
}

/// A key press delivered to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key that was pressed.
    pub key: Key,
    /// Modifiers held during the press.
    pub modifiers: KeyboardModifiers,
    accepted: bool,
}

impl KeyEvent {
    /// Create a key press without modifiers.
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: KeyboardModifiers::NONE,
            accepted: false,
        }
    }

    /// Create a key press with modifiers.
    pub fn with_modifiers(key: Key, modifiers: KeyboardModifiers) -> Self {
        Self {
            key,
            modifiers,
            accepted: false,
        }
    }

    /// Shift+`key`.
    pub fn shifted(key: Key) -> Self {
        Self::with_modifiers(key, KeyboardModifiers::SHIFT)
    }

    /// Whether a handler consumed the key (its default is prevented).
    pub fn is_accepted(&self) -> bool {
        self.accepted
    }

    /// Mark the key as handled.
    pub fn accept(&mut self) {
        self.accepted = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept() {
        let mut event = KeyEvent::shifted(Key::Tab);
        assert!(event.modifiers.shift);
        assert!(!event.is_accepted());
        event.accept();
        assert!(event.is_accepted());
    }

    #[test]
    fn test_activation_keys() {
        assert!(Key::Enter.is_activation());
        assert!(Key::Space.is_activation());
        assert!(!Key::Character('a').is_activation());
    }
}
