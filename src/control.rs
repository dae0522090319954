//! Raw control transfer setup packets

use packed_struct::prelude::*;
use usb_device::control::{Recipient, Request, RequestType};
use usb_device::UsbDirection;

use crate::UsbHidError;

/// The 8 byte setup packet exactly as it appears on the wire - USB 2.0 spec 9.3
#[derive(Clone, Copy, Debug, PartialEq, Eq, PackedStruct)]
#[packed_struct(endian = "lsb", bit_numbering = "msb0", size_bytes = "8")]
pub struct SetupPacket {
    #[packed_field(bits = "0")]
    pub device_to_host: bool,
    #[packed_field(bits = "1:2")]
    pub request_type: u8,
    #[packed_field(bits = "3:7")]
    pub recipient: u8,
    pub request: u8,
    pub value: u16,
    pub index: u16,
    pub length: u16,
}

impl SetupPacket {
    /// Decode a setup packet received on the control OUT endpoint
    pub fn parse(buf: &[u8]) -> Result<Request, UsbHidError> {
        let raw: &[u8; 8] = buf
            .try_into()
            .map_err(|_| UsbHidError::SerializationError)?;
        let packet = SetupPacket::unpack(raw).map_err(|_| UsbHidError::SerializationError)?;
        Ok(Request::from(packet))
    }
}

impl From<SetupPacket> for Request {
    fn from(packet: SetupPacket) -> Self {
        Request {
            direction: if packet.device_to_host {
                UsbDirection::In
            } else {
                UsbDirection::Out
            },
            request_type: match packet.request_type {
                0 => RequestType::Standard,
                1 => RequestType::Class,
                2 => RequestType::Vendor,
                _ => RequestType::Reserved,
            },
            recipient: match packet.recipient {
                0 => Recipient::Device,
                1 => Recipient::Interface,
                2 => Recipient::Endpoint,
                3 => Recipient::Other,
                _ => Recipient::Reserved,
            },
            request: packet.request,
            value: packet.value,
            index: packet.index,
            length: packet.length,
        }
    }
}

impl From<Request> for SetupPacket {
    fn from(request: Request) -> Self {
        SetupPacket {
            device_to_host: request.direction == UsbDirection::In,
            request_type: request.request_type as u8,
            recipient: request.recipient as u8,
            request: request.request,
            value: request.value,
            index: request.index,
            length: request.length,
        }
    }
}

#[cfg(test)]
mod test {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::descriptor::HidRequest;

    #[test]
    fn parses_get_report_descriptor() {
        // GET_DESCRIPTOR(Report) to interface 0, 0xFF bytes
        let buf = [0x81, 0x06, 0x00, 0x22, 0x00, 0x00, 0xFF, 0x00];
        let request = SetupPacket::parse(&buf).unwrap();

        assert_eq!(request.direction, UsbDirection::In);
        assert_eq!(request.request_type, RequestType::Standard);
        assert_eq!(request.recipient, Recipient::Interface);
        assert_eq!(request.request, Request::GET_DESCRIPTOR);
        assert_eq!(request.value, 0x2200);
        assert_eq!(request.index, 0);
        assert_eq!(request.length, 0xFF);
    }

    #[test]
    fn packs_class_set_idle() {
        let request = Request {
            direction: UsbDirection::Out,
            request_type: RequestType::Class,
            recipient: Recipient::Interface,
            request: HidRequest::SetIdle.into(),
            value: 0x7D00,
            index: 0x0001,
            length: 0,
        };

        let bytes = SetupPacket::from(request).pack().unwrap();
        assert_eq!(bytes, [0x21, 0x0A, 0x00, 0x7D, 0x01, 0x00, 0x00, 0x00]);
        assert_eq!(SetupPacket::parse(&bytes).unwrap(), request);
    }

    #[test]
    fn rejects_short_packets() {
        assert!(matches!(
            SetupPacket::parse(&[0x80, 0x06, 0x00]),
            Err(UsbHidError::SerializationError)
        ));
    }

    #[test]
    fn vendor_and_reserved_types_decode() {
        let vendor = SetupPacket::parse(&[0xC1, 0x01, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(vendor.request_type, RequestType::Vendor);

        let reserved = SetupPacket::parse(&[0xE1, 0x01, 0, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(reserved.request_type, RequestType::Reserved);
    }
}
