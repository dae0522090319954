//! The HID Class Prelude.
//!
//! The purpose of this module is to alleviate imports of structs and enums
//! required to configure and drive a [`HidClass`]:
//!
//! ```
//! # #![allow(unused_imports)]
//! use apm32_usbd_hid::hid_class::prelude::*;
//! ```

pub use super::{
    HidClass, HidConfig, HidConfigBuilder, HidInstance, HidState, UsbHidBuilderError,
    UsbPacketSize,
};
pub use crate::class::UsbdClass;
