//! The USB HID Prelude.
//!
//! The purpose of this module is to alleviate imports of structs and enums
//! required to instance the HID keyboard class:
//!
//! ```
//! # #![allow(unused_imports)]
//! use apm32_usbd_hid::prelude::*;
//! ```

pub use crate::context::{DeviceContext, UsbSpeed};
pub use crate::hid_class::prelude::*;
pub use crate::transport::EndpointTransport;
pub use crate::usb_class::{UsbHidClass, UsbHidClassBuilder};
pub use crate::UsbHidError;
