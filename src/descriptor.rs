//! HID class descriptors and request codes

use num_enum::{IntoPrimitive, TryFromPrimitive};
use packed_struct::prelude::*;

use crate::context::UsbSpeed;

pub const USB_CLASS_HID: u8 = 0x03;
pub const SPEC_VERSION_1_11: u16 = 0x0111; //1.11 in BCD
pub const COUNTRY_CODE_NOT_SUPPORTED: u8 = 0x0;

/// Length of the class specific HID descriptor, including the two byte header
pub const HID_DESCRIPTOR_LEN: usize = 9;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Ord, PartialOrd, IntoPrimitive)]
#[repr(u8)]
pub enum InterfaceProtocol {
    None = 0x00,
    Keyboard = 0x01,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PrimitiveEnum, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum DescriptorType {
    Hid = 0x21,
    Report = 0x22,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive)]
#[repr(u8)]
pub enum InterfaceSubClass {
    None = 0x00,
    Boot = 0x01,
}

impl From<InterfaceProtocol> for InterfaceSubClass {
    fn from(protocol: InterfaceProtocol) -> Self {
        if protocol == InterfaceProtocol::None {
            InterfaceSubClass::None
        } else {
            InterfaceSubClass::Boot
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum HidProtocol {
    Boot = 0x00,
    Report = 0x01,
}

/// Class specific requests - HID spec 7.2
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum HidRequest {
    GetReport = 0x01,
    GetIdle = 0x02,
    GetProtocol = 0x03,
    SetReport = 0x09,
    SetIdle = 0x0A,
    SetProtocol = 0x0B,
}

/// Body of the HID descriptor, everything after `bLength` and `bDescriptorType`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PackedStruct)]
#[packed_struct(endian = "lsb", size_bytes = 7)]
pub struct HidDescriptorBody {
    pub bcd_hid: u16,
    pub country_code: u8,
    pub num_descriptors: u8,
    #[packed_field(ty = "enum", size_bytes = "1")]
    pub descriptor_type: DescriptorType,
    pub descriptor_length: u16,
}

/// HID Keyboard report descriptor
///
/// Input report: 8 modifier bits, 1 reserved byte and 6 key codes (8 bytes).
/// Output report: 5 LED bits padded to a single byte.
///
/// Matches Appendix B.1 & E.6 of [Device Class Definition for Human
/// Interface Devices (Hid) Version 1.11](<https://www.usb.org/sites/default/files/hid1_11.pdf>)
#[rustfmt::skip]
pub const KEYBOARD_REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop),
    0x09, 0x06, // Usage (Keyboard),
    0xA1, 0x01, // Collection (Application),
    0x05, 0x07, //     Usage Page (Key Codes),
    0x19, 0xE0, //     Usage Minimum (224),
    0x29, 0xE7, //     Usage Maximum (231),
    0x15, 0x00, //     Logical Minimum (0),
    0x25, 0x01, //     Logical Maximum (1),
    0x75, 0x01, //     Report Size (1),
    0x95, 0x08, //     Report Count (8),
    0x81, 0x02, //     Input (Data, Variable, Absolute), ;Modifier byte
    0x95, 0x01, //     Report Count (1),
    0x75, 0x08, //     Report Size (8),
    0x81, 0x03, //     Input (Constant), ;Reserved byte
    0x95, 0x05, //     Report Count (5),
    0x75, 0x01, //     Report Size (1),
    0x05, 0x08, //     Usage Page (LEDs),
    0x19, 0x01, //     Usage Minimum (1),
    0x29, 0x05, //     Usage Maximum (5),
    0x91, 0x02, //     Output (Data, Variable, Absolute), ;LED report
    0x95, 0x01, //     Report Count (1),
    0x75, 0x03, //     Report Size (3),
    0x91, 0x03, //     Output (Constant), ;LED report padding
    0x95, 0x06, //     Report Count (6),
    0x75, 0x08, //     Report Size (8),
    0x15, 0x00, //     Logical Minimum (0),
    0x25, 0x65, //     Logical Maximum(101),
    0x05, 0x07, //     Usage Page (Key Codes),
    0x19, 0x00, //     Usage Minimum (0),
    0x29, 0x65, //     Usage Maximum (101),
    0x81, 0x00, //     Input (Data, Array), ;Key arrays (6 bytes)
    0xC0,       // End Collection
];

const REPORT_DESCRIPTOR_LEN: u16 = KEYBOARD_REPORT_DESCRIPTOR.len() as u16;

/// HID descriptor for the keyboard interface - HID spec 6.2.1
#[rustfmt::skip]
pub const HID_DESCRIPTOR: [u8; HID_DESCRIPTOR_LEN] = [
    HID_DESCRIPTOR_LEN as u8,
    DescriptorType::Hid as u8,
    (SPEC_VERSION_1_11 & 0xFF) as u8, (SPEC_VERSION_1_11 >> 8) as u8,
    COUNTRY_CODE_NOT_SUPPORTED,
    0x01, // one class descriptor follows
    DescriptorType::Report as u8,
    (REPORT_DESCRIPTOR_LEN & 0xFF) as u8, (REPORT_DESCRIPTOR_LEN >> 8) as u8,
];

/// Report descriptor served for `speed`. Both speeds share one layout.
pub fn report_descriptor(_speed: UsbSpeed) -> &'static [u8] {
    KEYBOARD_REPORT_DESCRIPTOR
}

/// HID descriptor served for `speed`. Both speeds share one layout.
pub fn hid_descriptor(_speed: UsbSpeed) -> &'static [u8] {
    &HID_DESCRIPTOR
}

#[cfg(test)]
mod test {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn hid_descriptor_matches_packed_body() {
        assert_eq!(HID_DESCRIPTOR[0] as usize, HID_DESCRIPTOR_LEN);
        assert_eq!(HID_DESCRIPTOR[1], 0x21);

        let mut body = [0; 7];
        body.copy_from_slice(&HID_DESCRIPTOR[2..]);

        assert_eq!(
            HidDescriptorBody::unpack(&body).unwrap(),
            HidDescriptorBody {
                bcd_hid: SPEC_VERSION_1_11,
                country_code: COUNTRY_CODE_NOT_SUPPORTED,
                num_descriptors: 1,
                descriptor_type: DescriptorType::Report,
                descriptor_length: 63,
            }
        );
    }

    #[test]
    fn hid_descriptor_wire_bytes() {
        assert_eq!(
            HID_DESCRIPTOR,
            [0x09, 0x21, 0x11, 0x01, 0x00, 0x01, 0x22, 0x3F, 0x00]
        );
    }

    #[test]
    fn report_descriptor_is_keyboard_collection() {
        assert_eq!(KEYBOARD_REPORT_DESCRIPTOR.len(), 63);
        assert_eq!(&KEYBOARD_REPORT_DESCRIPTOR[..6], &[0x05, 0x01, 0x09, 0x06, 0xA1, 0x01]);
        assert_eq!(KEYBOARD_REPORT_DESCRIPTOR.last(), Some(&0xC0));
    }

    #[test]
    fn providers_ignore_speed() {
        assert_eq!(
            report_descriptor(UsbSpeed::Full),
            report_descriptor(UsbSpeed::High)
        );
        assert_eq!(hid_descriptor(UsbSpeed::High), &HID_DESCRIPTOR[..]);
    }

    #[test]
    fn boot_subclass_follows_interface_protocol() {
        assert_eq!(
            InterfaceSubClass::from(InterfaceProtocol::Keyboard),
            InterfaceSubClass::Boot
        );
        assert_eq!(
            InterfaceSubClass::from(InterfaceProtocol::None),
            InterfaceSubClass::None
        );
        assert_eq!(u8::from(InterfaceSubClass::Boot), 0x01);
    }

    #[test]
    fn request_codes_round_trip_through_primitive() {
        assert_eq!(HidRequest::try_from(0x0A_u8).unwrap(), HidRequest::SetIdle);
        assert_eq!(u8::from(HidRequest::GetProtocol), 0x03);
        assert!(HidRequest::try_from(0x04_u8).is_err());
        assert_eq!(HidProtocol::try_from(0_u8).unwrap(), HidProtocol::Boot);
        assert_eq!(DescriptorType::try_from(0x22_u8).unwrap(), DescriptorType::Report);
    }
}
