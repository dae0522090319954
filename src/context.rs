//! Device wide state shared between the device stack and its classes

use usb_device::endpoint::EndpointAddress;
use usb_device::device::UsbDeviceState;
use usb_device::UsbDirection;

/// Number of endpoint slots tracked per direction
pub const MAX_ENDPOINTS: usize = 16;

/// Bus speed negotiated with the host
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum UsbSpeed {
    #[default]
    Full,
    High,
}

/// Per endpoint, per direction metadata
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct EndpointInfo {
    pub in_use: bool,
    pub interval: u8,
    pub max_packet_size: u16,
}

/// State the device stack owns and lends to each class handler
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceContext {
    speed: UsbSpeed,
    state: UsbDeviceState,
    ep_in: [EndpointInfo; MAX_ENDPOINTS],
    ep_out: [EndpointInfo; MAX_ENDPOINTS],
}

impl DeviceContext {
    pub fn new(speed: UsbSpeed) -> Self {
        Self {
            speed,
            state: UsbDeviceState::Default,
            ep_in: [EndpointInfo::default(); MAX_ENDPOINTS],
            ep_out: [EndpointInfo::default(); MAX_ENDPOINTS],
        }
    }

    pub fn speed(&self) -> UsbSpeed {
        self.speed
    }

    pub fn set_speed(&mut self, speed: UsbSpeed) {
        self.speed = speed;
    }

    pub fn state(&self) -> UsbDeviceState {
        self.state
    }

    pub fn set_state(&mut self, state: UsbDeviceState) {
        self.state = state;
    }

    pub fn is_configured(&self) -> bool {
        self.state == UsbDeviceState::Configured
    }

    pub fn endpoint(&self, addr: EndpointAddress) -> &EndpointInfo {
        match addr.direction() {
            UsbDirection::In => &self.ep_in[addr.index() % MAX_ENDPOINTS],
            UsbDirection::Out => &self.ep_out[addr.index() % MAX_ENDPOINTS],
        }
    }

    pub fn endpoint_mut(&mut self, addr: EndpointAddress) -> &mut EndpointInfo {
        match addr.direction() {
            UsbDirection::In => &mut self.ep_in[addr.index() % MAX_ENDPOINTS],
            UsbDirection::Out => &mut self.ep_out[addr.index() % MAX_ENDPOINTS],
        }
    }

    /// Forget all endpoint metadata, used on bus reset
    pub fn clear_endpoints(&mut self) {
        self.ep_in = [EndpointInfo::default(); MAX_ENDPOINTS];
        self.ep_out = [EndpointInfo::default(); MAX_ENDPOINTS];
    }
}

impl Default for DeviceContext {
    fn default() -> Self {
        Self::new(UsbSpeed::default())
    }
}
