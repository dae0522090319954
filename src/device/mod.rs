//! Report layouts for the concrete devices served by the HID class

pub mod keyboard;
