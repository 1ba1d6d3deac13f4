//! Desktop stand-ins for the simulator: window title as status bar, log
//! output as notifications, winit keys as virtual keys.

use efb::cef::keymap::*;
use efb::cef::{HostKeyFlags, HostLocale, HostServices};
use std::sync::Arc;
use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};
use winit::window::Window;

pub struct DesktopHost {
    window: Arc<Window>,
    title: String,
    loading: bool,
    keyboard_claimed: bool,
}

impl DesktopHost {
    pub fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            title: String::new(),
            loading: false,
            keyboard_claimed: false,
        }
    }

    fn refresh_title(&self) {
        let marker = if self.loading { " (loading)" } else { "" };
        if self.title.is_empty() {
            self.window.set_title(&format!("EFB{marker}"));
        } else {
            self.window.set_title(&format!("EFB - {}{marker}", self.title));
        }
    }
}

impl HostServices for DesktopHost {
    fn show_notification(&mut self, title: &str, body: &str) {
        log::info!("[{title}] {body}");
    }

    fn set_status_title(&mut self, title: &str) {
        self.title = title.to_string();
        self.refresh_title();
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
        self.refresh_title();
    }

    fn set_download_progress(&mut self, percent: i32, complete: bool) {
        if complete {
            log::info!("download complete");
        } else {
            log::debug!("download {percent}%");
        }
    }

    fn claim_keyboard_focus(&mut self) {
        self.keyboard_claimed = true;
    }

    fn release_keyboard_focus(&mut self) {
        self.keyboard_claimed = false;
    }

    fn has_keyboard_focus(&self) -> bool {
        self.keyboard_claimed
    }

    fn bring_to_front(&mut self) {
        self.window.focus_window();
    }

    fn locale(&self) -> HostLocale {
        HostLocale::English
    }
}

/// Host-style key: ASCII character, virtual key and flags.
pub fn host_key(event: &KeyEvent, modifiers: ModifiersState) -> Option<(u8, u8, HostKeyFlags)> {
    let PhysicalKey::Code(code) = event.physical_key else {
        return None;
    };
    let vk = virtual_key(code)?;

    let mut flags = match event.state {
        ElementState::Pressed => HostKeyFlags::DOWN,
        ElementState::Released => HostKeyFlags::UP,
    };
    if modifiers.shift_key() {
        flags |= HostKeyFlags::SHIFT;
    }
    if modifiers.alt_key() {
        flags |= HostKeyFlags::OPTION_ALT;
    }
    if modifiers.control_key() {
        flags |= HostKeyFlags::CONTROL;
    }

    let raw_char = event
        .text
        .as_ref()
        .and_then(|text| text.chars().next())
        .filter(char::is_ascii)
        .map_or(0, |c| c as u8);
    Some((raw_char, vk, flags))
}

fn virtual_key(code: KeyCode) -> Option<u8> {
    use KeyCode::*;

    let letters = [
        KeyA, KeyB, KeyC, KeyD, KeyE, KeyF, KeyG, KeyH, KeyI, KeyJ, KeyK, KeyL, KeyM, KeyN, KeyO,
        KeyP, KeyQ, KeyR, KeyS, KeyT, KeyU, KeyV, KeyW, KeyX, KeyY, KeyZ,
    ];
    if let Some(i) = letters.iter().position(|k| *k == code) {
        return Some(VK_A + i as u8);
    }
    let digits = [
        Digit0, Digit1, Digit2, Digit3, Digit4, Digit5, Digit6, Digit7, Digit8, Digit9,
    ];
    if let Some(i) = digits.iter().position(|k| *k == code) {
        return Some(VK_0 + i as u8);
    }
    let functions = [F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12];
    if let Some(i) = functions.iter().position(|k| *k == code) {
        return Some(VK_F1 + i as u8);
    }

    let vk = match code {
        Backspace => VK_BACK,
        Tab => VK_TAB,
        Enter | NumpadEnter => VK_RETURN,
        Escape => VK_ESCAPE,
        Space => VK_SPACE,
        PageUp => VK_PRIOR,
        PageDown => VK_NEXT,
        End => VK_END,
        Home => VK_HOME,
        ArrowLeft => VK_LEFT,
        ArrowUp => VK_UP,
        ArrowRight => VK_RIGHT,
        ArrowDown => VK_DOWN,
        Insert => VK_INSERT,
        Delete => VK_DELETE,
        Semicolon => VK_OEM_1,
        Equal => VK_OEM_PLUS,
        Comma => VK_OEM_COMMA,
        Minus => VK_OEM_MINUS,
        Period => VK_OEM_PERIOD,
        Slash => VK_OEM_2,
        Backquote => VK_OEM_3,
        BracketLeft => VK_OEM_4,
        Backslash => VK_OEM_5,
        BracketRight => VK_OEM_6,
        Quote => VK_OEM_7,
        _ => return None,
    };
    Some(vk)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_digits_and_function_keys_map_in_order() {
        assert_eq!(virtual_key(KeyCode::KeyA), Some(0x41));
        assert_eq!(virtual_key(KeyCode::KeyZ), Some(0x5A));
        assert_eq!(virtual_key(KeyCode::Digit7), Some(0x37));
        assert_eq!(virtual_key(KeyCode::F12), Some(0x7B));
        assert_eq!(virtual_key(KeyCode::Enter), Some(VK_RETURN));
        assert_eq!(virtual_key(KeyCode::CapsLock), None);
    }
}
