//! Host virtual-key codes and their native key codes.
//!
//! Virtual keys use the Windows numbering the simulator reports. Each entry
//! carries the X11 keycode (evdev + 8) used on Linux and macOS hosts, and
//! the PC set-1 scan code used on Windows.

pub const VK_BACK: u8 = 0x08;
pub const VK_TAB: u8 = 0x09;
pub const VK_RETURN: u8 = 0x0D;
pub const VK_ESCAPE: u8 = 0x1B;
pub const VK_SPACE: u8 = 0x20;
pub const VK_PRIOR: u8 = 0x21;
pub const VK_NEXT: u8 = 0x22;
pub const VK_END: u8 = 0x23;
pub const VK_HOME: u8 = 0x24;
pub const VK_LEFT: u8 = 0x25;
pub const VK_UP: u8 = 0x26;
pub const VK_RIGHT: u8 = 0x27;
pub const VK_DOWN: u8 = 0x28;
pub const VK_INSERT: u8 = 0x2D;
pub const VK_DELETE: u8 = 0x2E;
pub const VK_0: u8 = 0x30;
pub const VK_A: u8 = 0x41;
pub const VK_F1: u8 = 0x70;
pub const VK_OEM_1: u8 = 0xBA;
pub const VK_OEM_PLUS: u8 = 0xBB;
pub const VK_OEM_COMMA: u8 = 0xBC;
pub const VK_OEM_MINUS: u8 = 0xBD;
pub const VK_OEM_PERIOD: u8 = 0xBE;
pub const VK_OEM_2: u8 = 0xBF;
pub const VK_OEM_3: u8 = 0xC0;
pub const VK_OEM_4: u8 = 0xDB;
pub const VK_OEM_5: u8 = 0xDC;
pub const VK_OEM_6: u8 = 0xDD;
pub const VK_OEM_7: u8 = 0xDE;

/// `(virtual key, x11 keycode, scan code)`
const KEY_TABLE: &[(u8, u32, u32)] = &[
    (VK_BACK, 22, 0x0E),
    (VK_TAB, 23, 0x0F),
    (VK_RETURN, 36, 0x1C),
    (VK_ESCAPE, 9, 0x01),
    (VK_SPACE, 65, 0x39),
    (VK_PRIOR, 112, 0x49),
    (VK_NEXT, 117, 0x51),
    (VK_END, 115, 0x4F),
    (VK_HOME, 110, 0x47),
    (VK_LEFT, 113, 0x4B),
    (VK_UP, 111, 0x48),
    (VK_RIGHT, 114, 0x4D),
    (VK_DOWN, 116, 0x50),
    (VK_INSERT, 118, 0x52),
    (VK_DELETE, 119, 0x53),
    // 0-9
    (0x30, 19, 0x0B),
    (0x31, 10, 0x02),
    (0x32, 11, 0x03),
    (0x33, 12, 0x04),
    (0x34, 13, 0x05),
    (0x35, 14, 0x06),
    (0x36, 15, 0x07),
    (0x37, 16, 0x08),
    (0x38, 17, 0x09),
    (0x39, 18, 0x0A),
    // A-Z
    (0x41, 38, 0x1E),
    (0x42, 56, 0x30),
    (0x43, 54, 0x2E),
    (0x44, 40, 0x20),
    (0x45, 26, 0x12),
    (0x46, 41, 0x21),
    (0x47, 42, 0x22),
    (0x48, 43, 0x23),
    (0x49, 31, 0x17),
    (0x4A, 44, 0x24),
    (0x4B, 45, 0x25),
    (0x4C, 46, 0x26),
    (0x4D, 58, 0x32),
    (0x4E, 57, 0x31),
    (0x4F, 32, 0x18),
    (0x50, 33, 0x19),
    (0x51, 24, 0x10),
    (0x52, 27, 0x13),
    (0x53, 39, 0x1F),
    (0x54, 28, 0x14),
    (0x55, 30, 0x16),
    (0x56, 55, 0x2F),
    (0x57, 25, 0x11),
    (0x58, 53, 0x2D),
    (0x59, 29, 0x15),
    (0x5A, 52, 0x2C),
    // F1-F12
    (0x70, 67, 0x3B),
    (0x71, 68, 0x3C),
    (0x72, 69, 0x3D),
    (0x73, 70, 0x3E),
    (0x74, 71, 0x3F),
    (0x75, 72, 0x40),
    (0x76, 73, 0x41),
    (0x77, 74, 0x42),
    (0x78, 75, 0x43),
    (0x79, 76, 0x44),
    (0x7A, 95, 0x57),
    (0x7B, 96, 0x58),
    // Punctuation
    (VK_OEM_1, 47, 0x27),
    (VK_OEM_PLUS, 21, 0x0D),
    (VK_OEM_COMMA, 59, 0x33),
    (VK_OEM_MINUS, 20, 0x0C),
    (VK_OEM_PERIOD, 60, 0x34),
    (VK_OEM_2, 61, 0x35),
    (VK_OEM_3, 49, 0x29),
    (VK_OEM_4, 34, 0x1A),
    (VK_OEM_5, 51, 0x2B),
    (VK_OEM_6, 35, 0x1B),
    (VK_OEM_7, 48, 0x28),
];

fn lookup(vk: u8) -> Option<&'static (u8, u32, u32)> {
    KEY_TABLE.iter().find(|(code, _, _)| *code == vk)
}

/// X11 keycode for a virtual key.
pub fn x11_keycode(vk: u8) -> Option<u32> {
    lookup(vk).map(|&(_, x11, _)| x11)
}

/// Set-1 scan code for a virtual key.
pub fn scan_code(vk: u8) -> Option<u32> {
    lookup(vk).map(|&(_, _, scan)| scan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_and_digits_are_mapped() {
        assert_eq!(x11_keycode(VK_A), Some(38));
        assert_eq!(scan_code(VK_A), Some(0x1E));
        assert_eq!(x11_keycode(VK_0), Some(19));
        assert_eq!(x11_keycode(VK_RETURN), Some(36));
        assert_eq!(scan_code(VK_F1), Some(0x3B));
    }

    #[test]
    fn table_has_no_duplicate_keys() {
        for (i, (vk, _, _)) in KEY_TABLE.iter().enumerate() {
            assert!(
                KEY_TABLE[i + 1..].iter().all(|(other, _, _)| other != vk),
                "duplicate entry for {vk:#04x}"
            );
        }
    }

    #[test]
    fn unknown_key_is_none() {
        assert_eq!(x11_keycode(0xFF), None);
        assert_eq!(scan_code(0x07), None);
    }
}
