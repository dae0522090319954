//! HID keyboard class: lifecycle, control request dispatch and report transmission

use embedded_time::duration::Milliseconds;
use embedded_time::fixed_point::FixedPoint;
use log::{error, info, trace, warn};
use usb_device::control::{Request, RequestType};
use usb_device::endpoint::{EndpointAddress, EndpointType};
use usb_device::UsbDirection;

use crate::class::UsbdClass;
use crate::context::{DeviceContext, EndpointInfo, UsbSpeed};
use crate::descriptor::{self, DescriptorType, HidProtocol, HidRequest};
use crate::transport::EndpointTransport;
use crate::{Result, UsbHidError};

pub mod prelude;

pub const HID_IN_EP_ADDR: u8 = 0x81;
pub const HID_FS_INTERVAL: u8 = 10;
/// bInterval exponent, 2^(7-1) microframes
pub const HID_HS_INTERVAL: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum UsbPacketSize {
    Bytes8 = 8,
    Bytes16 = 16,
    Bytes32 = 32,
    Bytes64 = 64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsbHidBuilderError {
    ValueOverflow,
}

pub type BuilderResult<B> = core::result::Result<B, UsbHidBuilderError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HidConfig {
    in_endpoint: EndpointAddress,
    max_packet_size: UsbPacketSize,
    fs_interval: u8,
    hs_interval: u8,
}

impl HidConfig {
    pub fn in_endpoint(&self) -> EndpointAddress {
        self.in_endpoint
    }

    pub fn max_packet_size(&self) -> UsbPacketSize {
        self.max_packet_size
    }

    /// bInterval for the interrupt IN endpoint at `speed`
    pub fn interval(&self, speed: UsbSpeed) -> u8 {
        match speed {
            UsbSpeed::Full => self.fs_interval,
            UsbSpeed::High => self.hs_interval,
        }
    }
}

impl Default for HidConfig {
    fn default() -> Self {
        Self {
            in_endpoint: EndpointAddress::from(HID_IN_EP_ADDR),
            max_packet_size: UsbPacketSize::Bytes8,
            fs_interval: HID_FS_INTERVAL,
            hs_interval: HID_HS_INTERVAL,
        }
    }
}

#[must_use = "this `HidConfigBuilder` must be assigned or consumed by `::build()`"]
#[derive(Clone, Debug)]
pub struct HidConfigBuilder {
    config: HidConfig,
}

impl HidConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: HidConfig::default(),
        }
    }

    pub fn in_endpoint_address(mut self, address: u8) -> BuilderResult<Self> {
        let address = EndpointAddress::from(address);
        if address.direction() != UsbDirection::In || address.index() == 0 {
            return Err(UsbHidBuilderError::ValueOverflow);
        }
        self.config.in_endpoint = address;
        Ok(self)
    }

    pub fn max_packet_size(mut self, max_packet_size: UsbPacketSize) -> Self {
        self.config.max_packet_size = max_packet_size;
        self
    }

    pub fn full_speed_interval<D: Into<Milliseconds>>(
        mut self,
        interval: D,
    ) -> BuilderResult<Self> {
        let interval = u8::try_from(interval.into().integer())
            .map_err(|_| UsbHidBuilderError::ValueOverflow)?;
        if interval == 0 {
            return Err(UsbHidBuilderError::ValueOverflow);
        }
        self.config.fs_interval = interval;
        Ok(self)
    }

    /// Polling period of 2^(exponent-1) microframes
    pub fn high_speed_interval(mut self, exponent: u8) -> BuilderResult<Self> {
        if !(1..=16).contains(&exponent) {
            return Err(UsbHidBuilderError::ValueOverflow);
        }
        self.config.hs_interval = exponent;
        Ok(self)
    }

    pub fn build(self) -> HidConfig {
        self.config
    }
}

impl Default for HidConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether an input report transfer is outstanding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HidState {
    Idle,
    Busy,
}

/// Per configuration state of the HID interface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HidInstance {
    state: HidState,
    ep_in_addr: EndpointAddress,
    alt_setting: u8,
    idle: u8,
    protocol: u8,
}

impl HidInstance {
    fn new(ep_in_addr: EndpointAddress) -> Self {
        Self {
            state: HidState::Idle,
            ep_in_addr,
            alt_setting: 0,
            idle: 0,
            protocol: 0,
        }
    }

    pub fn state(&self) -> HidState {
        self.state
    }

    pub fn ep_in_addr(&self) -> EndpointAddress {
        self.ep_in_addr
    }

    pub fn alt_setting(&self) -> u8 {
        self.alt_setting
    }

    /// Raw idle rate in units of 4ms, 0 is indefinite
    pub fn idle(&self) -> u8 {
        self.idle
    }

    pub fn idle_duration(&self) -> Milliseconds {
        Milliseconds(u32::from(self.idle) * 4)
    }

    pub fn protocol(&self) -> u8 {
        self.protocol
    }

    pub fn hid_protocol(&self) -> Option<HidProtocol> {
        HidProtocol::try_from(self.protocol).ok()
    }
}

/// HID keyboard class handler.
///
/// Owns the single instance slot for its interface: filled by
/// [`init`](UsbdClass::init), emptied by [`deinit`](UsbdClass::deinit). Every
/// other entry point fails with [`UsbHidError::NotInitialized`] while the slot
/// is empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HidClass {
    config: HidConfig,
    instance: Option<HidInstance>,
}

impl HidClass {
    pub fn new(config: HidConfig) -> Self {
        Self {
            config,
            instance: None,
        }
    }

    pub fn config(&self) -> &HidConfig {
        &self.config
    }

    pub fn instance(&self) -> Option<&HidInstance> {
        self.instance.as_ref()
    }

    fn instance_mut(&mut self) -> Result<&mut HidInstance> {
        self.instance.as_mut().ok_or_else(|| {
            error!("HID class instance is not initialized");
            UsbHidError::NotInitialized
        })
    }

    /// Queue one input report on the interrupt IN endpoint.
    ///
    /// Returns [`UsbHidError::WouldBlock`] while the previous report is still in
    /// flight. Reports are never queued; the caller drops or retries.
    pub fn submit_report(
        &mut self,
        ctx: &mut DeviceContext,
        transport: &mut dyn EndpointTransport,
        report: &[u8],
    ) -> Result<()> {
        let instance = self.instance_mut()?;

        if !ctx.is_configured() {
            trace!("Report not sent, device state {:?}", ctx.state());
            return Err(UsbHidError::NotConfigured);
        }

        if instance.state == HidState::Busy {
            trace!("Report not sent, previous report in flight");
            return Err(UsbHidError::WouldBlock);
        }

        instance.state = HidState::Busy;
        if let Err(e) = transport.submit_transfer(ctx, instance.ep_in_addr, report) {
            // No completion will arrive for a transfer that never started
            instance.state = HidState::Idle;
            warn!("Failed to submit report - {:?}", e);
            return Err(e);
        }

        trace!("Submitted report, {:X} bytes", report.len());
        Ok(())
    }

    /// Host polling interval for the IN endpoint at the current bus speed
    pub fn read_interval(&self, ctx: &DeviceContext) -> Milliseconds {
        match ctx.speed() {
            UsbSpeed::Full => Milliseconds(u32::from(self.config.fs_interval)),
            UsbSpeed::High => Milliseconds((1_u32 << (self.config.hs_interval - 1)) / 8),
        }
    }

    fn stall(
        ctx: &mut DeviceContext,
        transport: &mut dyn EndpointTransport,
        request: &Request,
    ) -> UsbHidError {
        transport.signal_control_error(ctx, request);
        UsbHidError::Stall
    }

    fn get_descriptor(
        ctx: &mut DeviceContext,
        transport: &mut dyn EndpointTransport,
        request: &Request,
    ) -> Result<()> {
        let speed = ctx.speed();
        let descriptor = match DescriptorType::try_from((request.value >> 8) as u8) {
            Ok(DescriptorType::Report) => descriptor::report_descriptor(speed),
            Ok(DescriptorType::Hid) => descriptor::hid_descriptor(speed),
            Err(_) => {
                warn!(
                    "Unsupported descriptor type, request:{:X}, value:{:X}",
                    request.request, request.value
                );
                return Err(Self::stall(ctx, transport, request));
            }
        };

        let len = descriptor.len().min(usize::from(request.length));
        transport.send_control_data(ctx, &descriptor[..len]);
        trace!("Sent descriptor {:X}, {:X} bytes", request.value >> 8, len);
        Ok(())
    }

    fn standard_request(
        instance: &mut HidInstance,
        ctx: &mut DeviceContext,
        transport: &mut dyn EndpointTransport,
        request: &Request,
    ) -> Result<()> {
        match request.request {
            Request::GET_DESCRIPTOR => Self::get_descriptor(ctx, transport, request),
            Request::GET_STATUS if ctx.is_configured() => {
                transport.send_control_data(ctx, &[0, 0]);
                Ok(())
            }
            Request::GET_INTERFACE if ctx.is_configured() => {
                transport.send_control_data(ctx, &[instance.alt_setting]);
                Ok(())
            }
            Request::SET_INTERFACE if ctx.is_configured() => {
                instance.alt_setting = (request.value & 0xFF) as u8;
                info!("Set alternate setting to {:X}", instance.alt_setting);
                Ok(())
            }
            Request::CLEAR_FEATURE => {
                trace!("Clear feature {:X}", request.value);
                Ok(())
            }
            Request::GET_STATUS | Request::GET_INTERFACE | Request::SET_INTERFACE => {
                warn!(
                    "Standard request {:X} rejected, device state {:?}",
                    request.request,
                    ctx.state()
                );
                Err(Self::stall(ctx, transport, request))
            }
            _ => {
                warn!(
                    "Unsupported standard request: {:X}, value: {:X}",
                    request.request, request.value
                );
                Err(Self::stall(ctx, transport, request))
            }
        }
    }

    fn class_request(
        instance: &mut HidInstance,
        ctx: &mut DeviceContext,
        transport: &mut dyn EndpointTransport,
        request: &Request,
    ) -> Result<()> {
        match HidRequest::try_from(request.request) {
            Ok(HidRequest::SetIdle) => {
                instance.idle = (request.value >> 8) as u8;
                info!("Set idle to {:X}", instance.idle);
                Ok(())
            }
            Ok(HidRequest::GetIdle) => {
                transport.send_control_data(ctx, &[instance.idle]);
                Ok(())
            }
            Ok(HidRequest::SetProtocol) => {
                instance.protocol = (request.value & 0xFF) as u8;
                info!("Set protocol to {:X}", instance.protocol);
                Ok(())
            }
            Ok(HidRequest::GetProtocol) => {
                transport.send_control_data(ctx, &[instance.protocol]);
                Ok(())
            }
            _ => {
                warn!(
                    "Unsupported class request: {:X}, value: {:X}",
                    request.request, request.value
                );
                Err(Self::stall(ctx, transport, request))
            }
        }
    }
}

impl Default for HidClass {
    fn default() -> Self {
        Self::new(HidConfig::default())
    }
}

impl UsbdClass for HidClass {
    fn name(&self) -> &'static str {
        "Class HID"
    }

    fn init(
        &mut self,
        ctx: &mut DeviceContext,
        transport: &mut dyn EndpointTransport,
        cfg_index: u8,
    ) -> Result<()> {
        if self.instance.is_some() {
            error!(
                "HID class instance already allocated, configuration {:X} not applied",
                cfg_index
            );
            return Err(UsbHidError::AllocationFailed);
        }

        let instance = HidInstance::new(self.config.in_endpoint);
        let addr = instance.ep_in_addr;
        let max_packet_size = self.config.max_packet_size as u16;

        ctx.endpoint_mut(addr).interval = self.config.interval(ctx.speed());
        transport.open_endpoint(ctx, addr, EndpointType::Interrupt, max_packet_size);
        let endpoint = ctx.endpoint_mut(addr);
        endpoint.in_use = true;
        endpoint.max_packet_size = max_packet_size;

        self.instance = Some(instance);
        info!(
            "HID class initialized for configuration {:X}, endpoint {:X}",
            cfg_index,
            u8::from(addr)
        );
        Ok(())
    }

    fn deinit(
        &mut self,
        ctx: &mut DeviceContext,
        transport: &mut dyn EndpointTransport,
        cfg_index: u8,
    ) -> Result<()> {
        let instance = self.instance.take().ok_or_else(|| {
            error!("HID class instance is not initialized");
            UsbHidError::NotInitialized
        })?;

        transport.close_endpoint(ctx, instance.ep_in_addr);
        *ctx.endpoint_mut(instance.ep_in_addr) = EndpointInfo::default();

        info!("HID class released for configuration {:X}", cfg_index);
        Ok(())
    }

    /// Reserved for idle rate driven report repetition, never does any work
    fn sof(&mut self, _ctx: &mut DeviceContext) -> Result<()> {
        self.instance_mut()?;
        Err(UsbHidError::WouldBlock)
    }

    fn setup(
        &mut self,
        ctx: &mut DeviceContext,
        transport: &mut dyn EndpointTransport,
        request: &Request,
    ) -> Result<()> {
        let instance = self.instance_mut()?;

        trace!(
            "setup: request type: {:?}, request: {:X}, value: {:X}, length: {:X}",
            request.request_type,
            request.request,
            request.value,
            request.length
        );

        match request.request_type {
            RequestType::Standard => Self::standard_request(instance, ctx, transport, request),
            RequestType::Class => Self::class_request(instance, ctx, transport, request),
            RequestType::Vendor | RequestType::Reserved => {
                warn!(
                    "Unsupported request type: {:?}, request: {:X}",
                    request.request_type, request.request
                );
                Err(Self::stall(ctx, transport, request))
            }
        }
    }

    fn data_in(
        &mut self,
        _ctx: &mut DeviceContext,
        _transport: &mut dyn EndpointTransport,
        ep_num: u8,
    ) -> Result<()> {
        let instance = self.instance_mut()?;

        if usize::from(ep_num) != instance.ep_in_addr.index() {
            trace!("Ignoring IN completion for endpoint {:X}", ep_num);
            return Ok(());
        }

        instance.state = HidState::Idle;
        trace!("Report transfer complete");
        Ok(())
    }
}
