//! Keyboard and mouse-button state
//!
//! Key symbols use virtual-key numbering on every backend. The Win32 backend
//! passes its codes through untouched; other backends translate into it.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Modifier keys and mouse buttons held while an event was generated
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KeyState: u16 {
        const SHIFT = 0x0001;
        const CONTROL = 0x0002;
        const ALT = 0x0004;
        const SYSTEM = 0x0008;
        const BUTTON_LEFT = 0x0010;
        const BUTTON_MIDDLE = 0x0020;
        const BUTTON_RIGHT = 0x0040;
        const BUTTON_X1 = 0x0080;
        const BUTTON_X2 = 0x0100;

        const MODIFIERS = Self::SHIFT.bits() | Self::CONTROL.bits() | Self::ALT.bits() | Self::SYSTEM.bits();
        const BUTTONS = Self::BUTTON_LEFT.bits()
            | Self::BUTTON_MIDDLE.bits()
            | Self::BUTTON_RIGHT.bits()
            | Self::BUTTON_X1.bits()
            | Self::BUTTON_X2.bits();
    }
}

impl KeyState {
    /// Only the keyboard modifier bits
    pub fn modifiers(self) -> KeyState {
        self & KeyState::MODIFIERS
    }

    /// Only the mouse button bits
    pub fn buttons(self) -> KeyState {
        self & KeyState::BUTTONS
    }
}

/// A virtual key code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeySymbol(pub u32);

impl KeySymbol {
    /// No key
    pub const NONE: KeySymbol = KeySymbol(0);

    /// Symbol for an ASCII letter or digit, case insensitive
    pub fn from_char(ch: char) -> Option<KeySymbol> {
        let ch = ch.to_ascii_uppercase();
        if ch.is_ascii_uppercase() || ch.is_ascii_digit() {
            Some(KeySymbol(ch as u32))
        } else {
            None
        }
    }

    pub fn code(self) -> u32 {
        self.0
    }
}

/// Named key symbols
pub mod keys {
    use super::KeySymbol;

    pub const BACKSPACE: KeySymbol = KeySymbol(0x08);
    pub const TAB: KeySymbol = KeySymbol(0x09);
    pub const RETURN: KeySymbol = KeySymbol(0x0D);
    pub const SHIFT: KeySymbol = KeySymbol(0x10);
    pub const CONTROL: KeySymbol = KeySymbol(0x11);
    pub const ALT: KeySymbol = KeySymbol(0x12);
    pub const ESCAPE: KeySymbol = KeySymbol(0x1B);
    pub const SPACE: KeySymbol = KeySymbol(0x20);
    pub const Q: KeySymbol = KeySymbol(0x51);
    pub const PAGE_UP: KeySymbol = KeySymbol(0x21);
    pub const PAGE_DOWN: KeySymbol = KeySymbol(0x22);
    pub const END: KeySymbol = KeySymbol(0x23);
    pub const HOME: KeySymbol = KeySymbol(0x24);
    pub const LEFT: KeySymbol = KeySymbol(0x25);
    pub const UP: KeySymbol = KeySymbol(0x26);
    pub const RIGHT: KeySymbol = KeySymbol(0x27);
    pub const DOWN: KeySymbol = KeySymbol(0x28);
    pub const INSERT: KeySymbol = KeySymbol(0x2D);
    pub const DELETE: KeySymbol = KeySymbol(0x2E);
    pub const F1: KeySymbol = KeySymbol(0x70);
    pub const F2: KeySymbol = KeySymbol(0x71);
    pub const F3: KeySymbol = KeySymbol(0x72);
    pub const F4: KeySymbol = KeySymbol(0x73);
    pub const F5: KeySymbol = KeySymbol(0x74);
    pub const F6: KeySymbol = KeySymbol(0x75);
    pub const F7: KeySymbol = KeySymbol(0x76);
    pub const F8: KeySymbol = KeySymbol(0x77);
    pub const F9: KeySymbol = KeySymbol(0x78);
    pub const F10: KeySymbol = KeySymbol(0x79);
    pub const F11: KeySymbol = KeySymbol(0x7A);
    pub const F12: KeySymbol = KeySymbol(0x7B);
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    X1,
    X2,
}

impl MouseButton {
    /// The [`KeyState`] bit reported while this button is held
    pub fn state_flag(self) -> KeyState {
        match self {
            MouseButton::Left => KeyState::BUTTON_LEFT,
            MouseButton::Middle => KeyState::BUTTON_MIDDLE,
            MouseButton::Right => KeyState::BUTTON_RIGHT,
            MouseButton::X1 => KeyState::BUTTON_X1,
            MouseButton::X2 => KeyState::BUTTON_X2,
        }
    }
}

/// A key plus the exact modifier combination that must be held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HotKey {
    pub key: KeySymbol,
    pub modifiers: KeyState,
}

impl HotKey {
    /// Mouse button bits in `modifiers` are dropped
    pub fn new(key: KeySymbol, modifiers: KeyState) -> Self {
        Self {
            key,
            modifiers: modifiers.modifiers(),
        }
    }

    /// True for this key with exactly these modifiers held
    pub fn matches(&self, key: KeySymbol, state: KeyState) -> bool {
        self.key == key && self.modifiers == state.modifiers()
    }
}

impl fmt::Display for HotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, name) in [
            (KeyState::CONTROL, "Ctrl+"),
            (KeyState::ALT, "Alt+"),
            (KeyState::SHIFT, "Shift+"),
            (KeyState::SYSTEM, "Sys+"),
        ] {
            if self.modifiers.contains(flag) {
                f.write_str(name)?;
            }
        }
        match char::from_u32(self.key.0) {
            Some(ch) if ch.is_ascii_alphanumeric() => write!(f, "{ch}"),
            _ => write!(f, "0x{:02X}", self.key.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_from_chars_are_case_insensitive() {
        assert_eq!(KeySymbol::from_char('q'), Some(KeySymbol(0x51)));
        assert_eq!(KeySymbol::from_char('Q'), Some(KeySymbol(0x51)));
        assert_eq!(KeySymbol::from_char('7'), Some(KeySymbol(0x37)));
        assert_eq!(KeySymbol::from_char('#'), None);
    }

    #[test]
    fn hot_key_ignores_button_state() {
        let hk = HotKey::new(keys::F5, KeyState::CONTROL | KeyState::BUTTON_LEFT);
        assert_eq!(hk.modifiers, KeyState::CONTROL);
        assert!(hk.matches(keys::F5, KeyState::CONTROL | KeyState::BUTTON_RIGHT));
        assert!(!hk.matches(keys::F5, KeyState::CONTROL | KeyState::SHIFT));
        assert!(!hk.matches(keys::F6, KeyState::CONTROL));
    }

    #[test]
    fn hot_key_display() {
        let hk = HotKey::new(
            KeySymbol::from_char('s').unwrap(),
            KeyState::CONTROL | KeyState::SHIFT,
        );
        assert_eq!(hk.to_string(), "Ctrl+Shift+S");
        assert_eq!(HotKey::new(keys::ESCAPE, KeyState::empty()).to_string(), "0x1B");
    }

    #[test]
    fn button_flags() {
        assert_eq!(MouseButton::Right.state_flag(), KeyState::BUTTON_RIGHT);
        let state = KeyState::SHIFT | KeyState::BUTTON_LEFT;
        assert_eq!(state.buttons(), KeyState::BUTTON_LEFT);
        assert_eq!(state.modifiers(), KeyState::SHIFT);
    }
}
