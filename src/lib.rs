//! USB HID keyboard class for APM32 device stacks.
//!
//! The class core ([`hid_class::HidClass`]) is independent of any particular
//! device stack: it talks to the lower layers through
//! [`transport::EndpointTransport`] and is driven through the
//! [`class::UsbdClass`] operation set. [`usb_class::UsbHidClass`] runs the same
//! core inside a [usb-device](https://crates.io/crates/usb-device) stack.
//!
//! ```rust, no_run
//! # use core::option::Option;
//! # use core::result::Result;
//! # use core::todo;
//! # use usb_device::bus::PollResult;
//! use apm32_usbd_hid::device::keyboard::{KeyboardReport, KEY_A};
//! use apm32_usbd_hid::prelude::*;
//! # use usb_device::class_prelude::*;
//! # use usb_device::prelude::*;
//! # use usb_device::UsbDirection;
//! #
//! # trait InputPin {
//! #     fn is_high(&self) -> Result<bool, core::convert::Infallible>;
//! # }
//! #
//! # struct DummyUsbBus;
//! # impl UsbBus for DummyUsbBus{fn alloc_ep(&mut self, ep_dir: UsbDirection, ep_addr: Option<EndpointAddress>, ep_type: EndpointType, max_packet_size: u16, interval: u8) -> usb_device::Result<EndpointAddress> {
//! #         todo!()
//! #     }
//! # fn enable(&mut self) { todo!() }
//! # fn reset(&self) { todo!() }
//! # fn set_device_address(&self, addr: u8) { todo!() }
//! # fn write(&self, ep_addr: EndpointAddress, buf: &[u8]) -> usb_device::Result<usize> { todo!() }
//! # fn read(&self, ep_addr: EndpointAddress, buf: &mut [u8]) -> usb_device::Result<usize> { todo!() }
//! # fn set_stalled(&self, ep_addr: EndpointAddress, stalled: bool) { todo!() }
//! # fn is_stalled(&self, ep_addr: EndpointAddress) -> bool { todo!() }
//! # fn suspend(&self) { todo!() }
//! # fn resume(&self) { todo!() }
//! # fn poll(&self) -> PollResult { todo!() }}
//! #
//! # let usb_bus = DummyUsbBus{};
//! # let pin: &dyn InputPin = todo!();
//! #
//! let usb_alloc = UsbBusAllocator::new(usb_bus);
//!
//! let mut keyboard = UsbHidClassBuilder::new()
//!     .description("Keyboard")
//!     .build(&usb_alloc)
//!     .unwrap();
//!
//! let mut usb_dev = UsbDeviceBuilder::new(&usb_alloc, UsbVidPid(0x1209, 0x0001))
//!     .manufacturer("Geehy")
//!     .product("APM32 Keyboard")
//!     .serial_number("TEST")
//!     .build();
//!
//! loop {
//!     let keys = if pin.is_high().unwrap() { &[KEY_A][..] } else { &[] };
//!
//!     // Busy until the host has collected the previous report
//!     keyboard.write_keyboard_report(&KeyboardReport::new(keys.iter().copied())).ok();
//!
//!     usb_dev.poll(&mut [&mut keyboard]);
//! }
//! ```
//!
//! Features
//! --------
//!
//! * Boot compatible keyboard interface with a fixed 8 byte input report
//! * HID idle and protocol requests
//! * One report in flight at a time, with backpressure reported to the caller
//! * Descriptor, setup packet and report types that are bit exact with HID 1.11

#![no_std]

//Allow the use of std in tests
#[cfg(test)]
#[macro_use]
extern crate std;

use usb_device::UsbError;

pub mod class;
pub mod context;
pub mod control;
pub mod descriptor;
pub mod device;
pub mod hid_class;
pub mod prelude;
pub mod transport;
pub mod usb_class;

#[derive(Debug)]
pub enum UsbHidError {
    /// A report is already in flight, or there is nothing to do yet
    WouldBlock,
    /// The device has not been configured by the host
    NotConfigured,
    /// No class instance exists for the current configuration
    NotInitialized,
    /// The class instance could not be allocated
    AllocationFailed,
    /// The request was refused and the control pipe stalled
    Stall,
    UsbError(UsbError),
    SerializationError,
}

impl From<UsbError> for UsbHidError {
    fn from(e: UsbError) -> Self {
        match e {
            UsbError::WouldBlock => UsbHidError::WouldBlock,
            _ => UsbHidError::UsbError(e),
        }
    }
}

pub type Result<T> = core::result::Result<T, UsbHidError>;
