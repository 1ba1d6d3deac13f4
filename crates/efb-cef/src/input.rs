//! Host input to native browser events.

use crate::engine::BrowserEngine;
use crate::keymap;
use bitflags::bitflags;

bitflags! {
    /// Key flags as reported by the host simulator.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct HostKeyFlags: u8 {
        const SHIFT      = 0b0_0001;
        const OPTION_ALT = 0b0_0010;
        const CONTROL    = 0b0_0100;
        const DOWN       = 0b0_1000;
        const UP         = 0b1_0000;
    }
}

bitflags! {
    /// Engine event modifier bits.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u32 {
        const SHIFT_DOWN   = 1 << 1;
        const CONTROL_DOWN = 1 << 2;
        const ALT_DOWN     = 1 << 3;
    }
}

impl From<HostKeyFlags> for Modifiers {
    fn from(flags: HostKeyFlags) -> Self {
        let mut modifiers = Modifiers::empty();
        if flags.contains(HostKeyFlags::SHIFT) {
            modifiers |= Modifiers::SHIFT_DOWN;
        }
        if flags.contains(HostKeyFlags::OPTION_ALT) {
            modifiers |= Modifiers::ALT_DOWN;
        }
        if flags.contains(HostKeyFlags::CONTROL) {
            modifiers |= Modifiers::CONTROL_DOWN;
        }
        modifiers
    }
}

impl HostKeyFlags {
    /// A key is down when the host says so, or sends no flags at all.
    pub fn is_key_down(self) -> bool {
        self.is_empty() || self.contains(HostKeyFlags::DOWN)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEventKind {
    KeyDown,
    KeyUp,
    Char,
}

/// Keyboard event in the engine's model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub kind: KeyEventKind,
    pub windows_key_code: i32,
    pub native_key_code: i32,
    pub character: u16,
    pub unmodified_character: u16,
    pub modifiers: Modifiers,
    pub is_system_key: bool,
}

/// Mouse position in browser pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MouseEvent {
    pub x: i32,
    pub y: i32,
    pub modifiers: Modifiers,
}

impl MouseEvent {
    pub fn at(px: f32, py: f32) -> Self {
        Self {
            x: px as i32,
            y: py as i32,
            modifiers: Modifiers::empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
    #[default]
    Left,
    Middle,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickPhase {
    Down,
    Drag,
    Up,
}

/// How virtual keys become native key codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTranslation {
    /// Windows: virtual key and scan code are passed straight through.
    Direct,
    /// Elsewhere: the virtual key is looked up in the keycode table.
    Table,
}

impl KeyTranslation {
    /// Translation for the platform this crate was built for.
    pub fn native() -> Self {
        if cfg!(windows) {
            KeyTranslation::Direct
        } else {
            KeyTranslation::Table
        }
    }
}

impl Default for KeyTranslation {
    fn default() -> Self {
        Self::native()
    }
}

/// A key press: the raw key event plus the character event a text field
/// needs to actually show the character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyStroke {
    pub key: KeyEvent,
    pub char_event: Option<KeyEvent>,
}

/// Forwards host input, already mapped to browser pixels, to the engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputRouter {
    translation: KeyTranslation,
}

impl InputRouter {
    pub fn new(translation: KeyTranslation) -> Self {
        Self { translation }
    }

    pub fn translation(&self) -> KeyTranslation {
        self.translation
    }

    pub fn send_move<E: BrowserEngine + ?Sized>(&self, engine: &mut E, px: f32, py: f32) {
        engine.send_mouse_move(&MouseEvent::at(px, py), false);
    }

    pub fn send_click<E: BrowserEngine + ?Sized>(
        &self,
        engine: &mut E,
        px: f32,
        py: f32,
        phase: ClickPhase,
    ) {
        let event = MouseEvent::at(px, py);
        match phase {
            ClickPhase::Down => engine.send_mouse_click(&event, MouseButton::Left, false, 1),
            // Drag sampling is coarser than move sampling; a move keeps drags smooth.
            ClickPhase::Drag => engine.send_mouse_move(&event, false),
            ClickPhase::Up => engine.send_mouse_click(&event, MouseButton::Left, true, 1),
        }
    }

    pub fn send_scroll<E: BrowserEngine + ?Sized>(
        &self,
        engine: &mut E,
        px: f32,
        py: f32,
        ticks: i32,
        horizontal: bool,
    ) {
        let event = MouseEvent::at(px, py);
        let (dx, dy) = if horizontal { (ticks, 0) } else { (0, ticks) };
        engine.send_mouse_wheel(&event, dx, dy);
    }

    /// Send a key, followed by a character event for printable key-downs.
    pub fn send_key<E: BrowserEngine + ?Sized>(
        &self,
        engine: &mut E,
        raw_char: u8,
        virtual_key: u8,
        flags: HostKeyFlags,
    ) -> KeyStroke {
        let stroke = self.translate_key(raw_char, virtual_key, flags);
        engine.send_key_event(&stroke.key);
        if let Some(ref char_event) = stroke.char_event {
            engine.send_key_event(char_event);
        }
        stroke
    }

    pub fn translate_key(&self, raw_char: u8, virtual_key: u8, flags: HostKeyFlags) -> KeyStroke {
        let kind = if flags.is_key_down() {
            KeyEventKind::KeyDown
        } else {
            KeyEventKind::KeyUp
        };

        let (native_key_code, character) = match self.translation {
            KeyTranslation::Direct => {
                let scan = keymap::scan_code(virtual_key).unwrap_or(0);
                (scan as i32, char::from(raw_char) as u16)
            }
            KeyTranslation::Table => {
                let native = match keymap::x11_keycode(virtual_key) {
                    Some(code) => code as i32,
                    None => {
                        log::debug!("Unknown key: {raw_char:#04x} VK: {virtual_key:#04x}");
                        raw_char as i32
                    }
                };
                (native, raw_char as u16)
            }
        };

        let key = KeyEvent {
            kind,
            windows_key_code: virtual_key as i32,
            native_key_code,
            character,
            unmodified_character: character,
            modifiers: Modifiers::from(flags),
            is_system_key: false,
        };

        let printable = raw_char == b' ' || raw_char.is_ascii_graphic();
        let char_event = (kind == KeyEventKind::KeyDown && printable).then(|| KeyEvent {
            kind: KeyEventKind::Char,
            windows_key_code: character as i32,
            modifiers: Modifiers::empty(),
            ..key
        });

        KeyStroke { key, char_event }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::{VK_A, VK_LEFT, VK_RETURN};

    #[test]
    fn modifier_bits_combine_independently() {
        assert_eq!(Modifiers::from(HostKeyFlags::empty()), Modifiers::empty());
        assert_eq!(
            Modifiers::from(HostKeyFlags::SHIFT | HostKeyFlags::CONTROL | HostKeyFlags::DOWN),
            Modifiers::SHIFT_DOWN | Modifiers::CONTROL_DOWN
        );
        assert_eq!(
            Modifiers::from(HostKeyFlags::OPTION_ALT),
            Modifiers::ALT_DOWN
        );
    }

    #[test]
    fn printable_key_down_pairs_with_char() {
        let router = InputRouter::new(KeyTranslation::Table);
        let stroke = router.translate_key(b'a', VK_A, HostKeyFlags::empty());

        assert_eq!(stroke.key.kind, KeyEventKind::KeyDown);
        assert_eq!(stroke.key.native_key_code, 38);
        assert_eq!(stroke.key.windows_key_code, VK_A as i32);

        let ch = stroke.char_event.unwrap();
        assert_eq!(ch.kind, KeyEventKind::Char);
        assert_eq!(ch.native_key_code, stroke.key.native_key_code);
        assert_eq!(ch.character, b'a' as u16);
        assert_eq!(ch.windows_key_code, b'a' as i32);
    }

    #[test]
    fn key_up_and_control_keys_have_no_char() {
        let router = InputRouter::new(KeyTranslation::Table);

        let up = router.translate_key(b'a', VK_A, HostKeyFlags::UP);
        assert_eq!(up.key.kind, KeyEventKind::KeyUp);
        assert!(up.char_event.is_none());

        let enter = router.translate_key(b'\r', VK_RETURN, HostKeyFlags::DOWN);
        assert_eq!(enter.key.kind, KeyEventKind::KeyDown);
        assert!(enter.char_event.is_none());

        let arrow = router.translate_key(0, VK_LEFT, HostKeyFlags::DOWN);
        assert_eq!(arrow.key.native_key_code, 113);
        assert!(arrow.char_event.is_none());
    }

    #[test]
    fn unknown_key_falls_back_to_raw_byte() {
        let router = InputRouter::new(KeyTranslation::Table);
        let stroke = router.translate_key(b'~', 0xE7, HostKeyFlags::DOWN);
        assert_eq!(stroke.key.native_key_code, b'~' as i32);
        assert_eq!(stroke.key.windows_key_code, 0xE7);
    }

    #[test]
    fn direct_translation_uses_scan_codes() {
        let router = InputRouter::new(KeyTranslation::Direct);
        let stroke = router.translate_key(b'A', VK_A, HostKeyFlags::SHIFT | HostKeyFlags::DOWN);
        assert_eq!(stroke.key.native_key_code, 0x1E);
        assert_eq!(stroke.key.character, b'A' as u16);
        assert_eq!(stroke.key.modifiers, Modifiers::SHIFT_DOWN);
        assert!(stroke.char_event.is_some());
    }

    #[test]
    fn mouse_event_truncates_pixels() {
        let event = MouseEvent::at(10.9, 20.2);
        assert_eq!((event.x, event.y), (10, 20));
    }
}
