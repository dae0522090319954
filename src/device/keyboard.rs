//!HID keyboard reports

use packed_struct::prelude::*;

use crate::{Result, UsbHidError};

//Keyboard/Keypad usage page (0x07) codes
pub const KEY_NONE: u8 = 0x00;
pub const KEY_ERROR_ROLL_OVER: u8 = 0x01;
pub const KEY_POST_FAIL: u8 = 0x02;
pub const KEY_ERROR_UNDEFINED: u8 = 0x03;
pub const KEY_A: u8 = 0x04;
pub const KEY_Z: u8 = 0x1D;
pub const KEY_1: u8 = 0x1E;
pub const KEY_0: u8 = 0x27;
pub const KEY_ENTER: u8 = 0x28;
pub const KEY_ESCAPE: u8 = 0x29;
pub const KEY_BACKSPACE: u8 = 0x2A;
pub const KEY_TAB: u8 = 0x2B;
pub const KEY_SPACE: u8 = 0x2C;
pub const KEY_RIGHT_ARROW: u8 = 0x4F;
pub const KEY_LEFT_ARROW: u8 = 0x50;
pub const KEY_DOWN_ARROW: u8 = 0x51;
pub const KEY_UP_ARROW: u8 = 0x52;
pub const KEY_LEFT_CONTROL: u8 = 0xE0;
pub const KEY_LEFT_SHIFT: u8 = 0xE1;
pub const KEY_LEFT_ALT: u8 = 0xE2;
pub const KEY_LEFT_GUI: u8 = 0xE3;
pub const KEY_RIGHT_CONTROL: u8 = 0xE4;
pub const KEY_RIGHT_SHIFT: u8 = 0xE5;
pub const KEY_RIGHT_ALT: u8 = 0xE6;
pub const KEY_RIGHT_GUI: u8 = 0xE7;

/// Output report carrying the host's keyboard LED state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, PackedStruct)]
#[packed_struct(endian = "lsb", bit_numbering = "lsb0", size_bytes = "1")]
pub struct KeyboardLedsReport {
    #[packed_field(bits = "0")]
    pub num_lock: bool,
    #[packed_field(bits = "1")]
    pub caps_lock: bool,
    #[packed_field(bits = "2")]
    pub scroll_lock: bool,
    #[packed_field(bits = "3")]
    pub compose: bool,
    #[packed_field(bits = "4")]
    pub kana: bool,
}

/// 8 byte input report: modifier bitmap, reserved byte, 6 key codes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, PackedStruct)]
#[packed_struct(endian = "lsb", bit_numbering = "msb0", size_bytes = "8")]
pub struct KeyboardReport {
    #[packed_field(bits = "0")]
    pub right_gui: bool,
    #[packed_field(bits = "1")]
    pub right_alt: bool,
    #[packed_field(bits = "2")]
    pub right_shift: bool,
    #[packed_field(bits = "3")]
    pub right_ctrl: bool,
    #[packed_field(bits = "4")]
    pub left_gui: bool,
    #[packed_field(bits = "5")]
    pub left_alt: bool,
    #[packed_field(bits = "6")]
    pub left_shift: bool,
    #[packed_field(bits = "7")]
    pub left_ctrl: bool,
    #[packed_field(bytes = "2..8", element_size_bytes = "1")]
    pub keys: [u8; 6],
}

impl KeyboardReport {
    /// Build a report from the usage codes of all currently pressed keys.
    ///
    /// More than six non-modifier keys fills every slot with
    /// [`KEY_ERROR_ROLL_OVER`] - HID spec Appendix C.
    pub fn new<K: IntoIterator<Item = u8>>(keys: K) -> Self {
        let mut report = Self::default();

        let mut error = false;
        let mut i = 0;
        for k in keys {
            match k {
                KEY_LEFT_CONTROL => report.left_ctrl = true,
                KEY_LEFT_SHIFT => report.left_shift = true,
                KEY_LEFT_ALT => report.left_alt = true,
                KEY_LEFT_GUI => report.left_gui = true,
                KEY_RIGHT_CONTROL => report.right_ctrl = true,
                KEY_RIGHT_SHIFT => report.right_shift = true,
                KEY_RIGHT_ALT => report.right_alt = true,
                KEY_RIGHT_GUI => report.right_gui = true,
                KEY_NONE => {}
                KEY_ERROR_ROLL_OVER | KEY_POST_FAIL | KEY_ERROR_UNDEFINED => {
                    if !error {
                        error = true;
                        report.keys.fill(k);
                    }
                }
                _ => {
                    if error {
                        continue;
                    }

                    if i < report.keys.len() {
                        report.keys[i] = k;
                        i += 1;
                    } else {
                        error = true;
                        report.keys.fill(KEY_ERROR_ROLL_OVER);
                    }
                }
            }
        }
        report
    }

    pub fn to_bytes(&self) -> Result<[u8; 8]> {
        self.pack().map_err(|_| UsbHidError::SerializationError)
    }
}

#[cfg(test)]
mod test {
    #![allow(clippy::unwrap_used)]

    use packed_struct::prelude::*;

    use super::*;

    #[test]
    fn leds_caps_lock() {
        assert_eq!(
            KeyboardLedsReport::unpack(&[2]),
            Ok(KeyboardLedsReport {
                caps_lock: true,
                ..Default::default()
            })
        );
    }

    #[test]
    fn leds_ignore_padding_bits() {
        assert_eq!(
            KeyboardLedsReport::unpack(&[0xF1]),
            Ok(KeyboardLedsReport {
                num_lock: true,
                compose: false,
                kana: true,
                ..Default::default()
            })
        );
    }

    #[test]
    fn report_mixed() {
        let bytes = KeyboardReport::new([KEY_LEFT_ALT, KEY_A, KEY_A + 1, KEY_A + 2, KEY_RIGHT_GUI])
            .to_bytes()
            .unwrap();

        assert_eq!(bytes, [0x84, 0x00, 0x04, 0x05, 0x06, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn report_keys_follow_reserved_byte() {
        let report = KeyboardReport {
            left_ctrl: true,
            keys: [KEY_A, KEY_Z, KEY_1, KEY_0, KEY_ENTER, KEY_SPACE],
            ..Default::default()
        };

        let bytes = report.to_bytes().unwrap();
        assert_eq!(bytes[0], 0x01);
        assert_eq!(bytes[1], 0x00);
        assert_eq!(
            &bytes[2..],
            &[KEY_A, KEY_Z, KEY_1, KEY_0, KEY_ENTER, KEY_SPACE]
        );
        assert_eq!(KeyboardReport::unpack(&bytes).unwrap(), report);
    }

    #[test]
    fn report_all_modifiers() {
        let bytes = KeyboardReport::new(KEY_LEFT_CONTROL..=KEY_RIGHT_GUI)
            .to_bytes()
            .unwrap();

        assert_eq!(bytes, [0xFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn report_empty() {
        assert_eq!(KeyboardReport::new([]).to_bytes().unwrap(), [0; 8]);
        assert_eq!(KeyboardReport::new([KEY_NONE; 3]).to_bytes().unwrap(), [0; 8]);
    }

    #[test]
    fn report_rolls_over_past_six_keys() {
        let bytes = KeyboardReport::new([
            KEY_LEFT_SHIFT,
            KEY_A,
            KEY_A + 1,
            KEY_A + 2,
            KEY_A + 3,
            KEY_A + 4,
            KEY_A + 5,
            KEY_A + 6,
        ])
        .to_bytes()
        .unwrap();

        assert_eq!(bytes, [0x02, 0x00, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01]);
    }

    #[test]
    fn report_error_codes_take_precedence() {
        let report = KeyboardReport::new([KEY_A, KEY_POST_FAIL, KEY_ENTER, KEY_ERROR_ROLL_OVER]);
        assert_eq!(report.keys, [KEY_POST_FAIL; 6]);
    }
}
