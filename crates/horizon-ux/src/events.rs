//! Input event types delivered by the host to widgets.
//!
//! Horizon UX widgets are headless: the host translates its native input
//! (browser events, a windowing toolkit, a test script) into these types and
//! hands them to the widget.

/// Keyboard modifiers that may be held during input events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct KeyboardModifiers {
    /// The Shift key is held.
    pub shift: bool,
    /// The Control key is held (Cmd on macOS).
    pub control: bool,
    /// The Alt key is held (Option on macOS).
    pub alt: bool,
    /// The Meta/Super key is held (Windows key, Cmd on macOS).
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

    /// Shift modifier only.
    pub const SHIFT: Self = Self {
        shift: true,
        control: false,
        alt: false,
        meta: false,
    };

    /// Control modifier only.
    pub const CTRL: Self = Self {
        shift: false,
        control: true,
        alt: false,
        meta: false,
    };

    /// Check if any modifier is pressed.
    pub fn any(&self) -> bool {
        self.shift || self.control || self.alt || self.meta
    }

    /// Check if a command modifier (Control or Meta) is pressed.
    ///
    /// Shift and Alt are excluded: they still produce text.
    pub fn is_command(&self) -> bool {
        self.control || self.meta
    }
}

/// Keyboard key codes.
///
/// Keys that produce text (letters, digits, punctuation) are reported as
/// [`Key::Character`]; the produced text travels in [`KeyPressEvent::text`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    // Navigation
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    PageUp,
    PageDown,

    // Editing
    Backspace,
    Delete,
    Insert,
    Enter,
    Tab,
    Space,

    // Modifiers (also tracked via KeyboardModifiers, but useful as key events)
    ShiftLeft,
    ShiftRight,
    ControlLeft,
    ControlRight,
    AltLeft,
    AltRight,
    MetaLeft,
    MetaRight,
    CapsLock,

    // Control
    Escape,

    // Function keys
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,

    /// A text-producing key.
    Character,

    /// Unknown/unmapped key.
    Unknown(u16),
}

impl Key {
    /// Check if this is a modifier key.
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Key::ShiftLeft
                | Key::ShiftRight
                | Key::ControlLeft
                | Key::ControlRight
                | Key::AltLeft
                | Key::AltRight
                | Key::MetaLeft
                | Key::MetaRight
                | Key::CapsLock
        )
    }

    /// Check if this is a navigation key.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Key::ArrowUp
                | Key::ArrowDown
                | Key::ArrowLeft
                | Key::ArrowRight
                | Key::Home
                | Key::End
                | Key::PageUp
                | Key::PageDown
        )
    }

    /// Check if this is a function key.
    pub fn is_function_key(&self) -> bool {
        matches!(
            self,
            Key::F1
                | Key::F2
                | Key::F3
                | Key::F4
                | Key::F5
                | Key::F6
                | Key::F7
                | Key::F8
                | Key::F9
                | Key::F10
                | Key::F11
                | Key::F12
        )
    }
}

/// Key press event, sent when a key is pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPressEvent {
    /// The key that was pressed.
    pub key: Key,
    /// Keyboard modifiers held during the event.
    pub modifiers: KeyboardModifiers,
    /// The text input from this key press (if any).
    ///
    /// For printable keys, this contains the character that would be typed.
    /// For non-printable keys (modifiers, function keys, etc.), this is empty.
    pub text: String,
    /// Whether this is a key repeat event (key held down).
    pub is_repeat: bool,
}

impl KeyPressEvent {
    /// Create a new key press event.
    pub fn new(
        key: Key,
        modifiers: KeyboardModifiers,
        text: impl Into<String>,
        is_repeat: bool,
    ) -> Self {
        Self {
            key,
            modifiers,
            text: text.into(),
            is_repeat,
        }
    }

    /// A plain press of a non-text key.
    pub fn key(key: Key) -> Self {
        Self::new(key, KeyboardModifiers::NONE, "", false)
    }

    /// A plain press of a key producing `text`.
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        let key = if text == " " { Key::Space } else { Key::Character };
        Self::new(key, KeyboardModifiers::NONE, text, false)
    }

    /// Whether this press inserts text into an editor.
    pub fn is_printable(&self) -> bool {
        !self.modifiers.is_command()
            && !self.text.is_empty()
            && self.text.chars().all(|ch| !ch.is_control())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable_detection() {
        assert!(KeyPressEvent::text("a").is_printable());
        assert!(KeyPressEvent::text(" ").is_printable());
        assert_eq!(KeyPressEvent::text(" ").key, Key::Space);
        assert!(!KeyPressEvent::key(Key::ArrowDown).is_printable());
        assert!(!KeyPressEvent::new(Key::Character, KeyboardModifiers::CTRL, "a", false).is_printable());
        assert!(KeyPressEvent::new(Key::Character, KeyboardModifiers::SHIFT, "A", false).is_printable());
        assert!(!KeyPressEvent::new(Key::Enter, KeyboardModifiers::NONE, "\r", false).is_printable());
    }

    #[test]
    fn test_key_classification() {
        assert!(Key::ShiftLeft.is_modifier());
        assert!(!Key::Escape.is_modifier());
        assert!(Key::PageDown.is_navigation());
        assert!(Key::F5.is_function_key());
        assert!(!Key::Character.is_navigation());
    }
}
