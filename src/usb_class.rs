//! USB Class running the HID keyboard core inside a usb-device stack

use delegate::delegate;
use embedded_time::duration::Milliseconds;
use heapless::Vec;
use log::{error, info, trace, warn};
#[allow(clippy::wildcard_imports)]
use usb_device::class_prelude::*;
use usb_device::control::{Recipient, Request, RequestType};
use usb_device::device::{UsbDeviceState, DEFAULT_ALTERNATE_SETTING};
use usb_device::endpoint::{EndpointAddress, EndpointType};
use usb_device::UsbError;

use crate::class::UsbdClass;
use crate::context::{DeviceContext, UsbSpeed};
use crate::descriptor::{
    DescriptorType, InterfaceProtocol, InterfaceSubClass, HID_DESCRIPTOR, USB_CLASS_HID,
};
use crate::device::keyboard::KeyboardReport;
use crate::hid_class::{HidClass, HidConfig, HidInstance};
use crate::transport::EndpointTransport;
use crate::UsbHidError;

const CONFIGURATION_NONE: u16 = 0;
const CONFIGURATION_VALUE: u16 = 1;
const CONTROL_BUFFER_SIZE: usize = 64;

/// What the class asked the control pipe to do with the current request
#[derive(Debug)]
enum ControlReply {
    None,
    Data(Vec<u8, CONTROL_BUFFER_SIZE>),
    Stall,
}

/// [`EndpointTransport`] over the endpoints usb-device allocated for this class
struct BusTransport<'e, 'a, B: UsbBus> {
    in_endpoint: &'e EndpointIn<'a, B>,
    reply: ControlReply,
}

impl<'e, 'a, B: UsbBus> BusTransport<'e, 'a, B> {
    fn new(in_endpoint: &'e EndpointIn<'a, B>) -> Self {
        Self {
            in_endpoint,
            reply: ControlReply::None,
        }
    }
}

impl<B: UsbBus> EndpointTransport for BusTransport<'_, '_, B> {
    fn open_endpoint(
        &mut self,
        _ctx: &mut DeviceContext,
        addr: EndpointAddress,
        ep_type: EndpointType,
        max_packet_size: u16,
    ) {
        //usb-device allocates endpoints when the class is built, check they match
        if addr != self.in_endpoint.address()
            || max_packet_size > self.in_endpoint.max_packet_size()
        {
            warn!(
                "Endpoint {:X} ({} bytes) does not match the allocated endpoint {:X} ({} bytes)",
                u8::from(addr),
                max_packet_size,
                u8::from(self.in_endpoint.address()),
                self.in_endpoint.max_packet_size()
            );
        }
        trace!("Opened {:?} endpoint {:X}", ep_type, u8::from(addr));
    }

    fn close_endpoint(&mut self, _ctx: &mut DeviceContext, addr: EndpointAddress) {
        trace!("Closed endpoint {:X}", u8::from(addr));
    }

    fn submit_transfer(
        &mut self,
        _ctx: &mut DeviceContext,
        addr: EndpointAddress,
        data: &[u8],
    ) -> crate::Result<()> {
        if addr != self.in_endpoint.address() {
            error!("No IN endpoint allocated at {:X}", u8::from(addr));
            return Err(UsbHidError::UsbError(UsbError::InvalidEndpoint));
        }
        self.in_endpoint.write(data)?;
        Ok(())
    }

    fn send_control_data(&mut self, _ctx: &mut DeviceContext, data: &[u8]) {
        let mut buffer = Vec::new();
        self.reply = match buffer.extend_from_slice(data) {
            Ok(_) => ControlReply::Data(buffer),
            Err(_) => {
                error!(
                    "Control reply too large for buffer. Reply size {}, expected <={}",
                    data.len(),
                    CONTROL_BUFFER_SIZE
                );
                ControlReply::Stall
            }
        };
    }

    fn signal_control_error(&mut self, _ctx: &mut DeviceContext, request: &Request) {
        trace!("Stalling request {:X}", request.request);
        self.reply = ControlReply::Stall;
    }
}

/// Builder for [`UsbHidClass`]
#[must_use = "this `UsbHidClassBuilder` must be assigned or consumed by `::build()`"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsbHidClassBuilder {
    speed: UsbSpeed,
    description: Option<&'static str>,
    config: HidConfig,
}

impl UsbHidClassBuilder {
    pub fn new() -> Self {
        Self {
            speed: UsbSpeed::Full,
            description: None,
            config: HidConfig::default(),
        }
    }

    pub fn speed(mut self, speed: UsbSpeed) -> Self {
        self.speed = speed;
        self
    }

    pub fn description(mut self, s: &'static str) -> Self {
        self.description = Some(s);
        self
    }

    pub fn hid_config(mut self, config: HidConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build<B: UsbBus>(
        self,
        usb_alloc: &UsbBusAllocator<B>,
    ) -> usb_device::Result<UsbHidClass<'_, B>> {
        let interface = usb_alloc.interface();
        let in_endpoint: EndpointIn<'_, B> = usb_alloc.alloc(
            Some(self.config.in_endpoint()),
            EndpointType::Interrupt,
            self.config.max_packet_size() as u16,
            self.config.interval(self.speed),
        )?;

        Ok(UsbHidClass {
            interface,
            in_endpoint,
            description: self.description,
            description_index: self.description.map(|_| usb_alloc.string()),
            ctx: DeviceContext::new(self.speed),
            hid: HidClass::new(self.config),
        })
    }
}

impl Default for UsbHidClassBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// HID keyboard interface for a usb-device [`UsbDevice`](usb_device::device::UsbDevice).
///
/// Follows `SET_CONFIGURATION` on the control pipe to create and release the
/// class instance, so reports can only be submitted once the host has
/// configured the device.
///
/// All methods take `&mut self`. When reports are submitted from a different
/// context than the one polling the device, share the class behind an
/// interrupt free mutex.
pub struct UsbHidClass<'a, B: UsbBus> {
    interface: InterfaceNumber,
    in_endpoint: EndpointIn<'a, B>,
    description: Option<&'static str>,
    description_index: Option<StringIndex>,
    ctx: DeviceContext,
    hid: HidClass,
}

impl<'a, B: UsbBus> UsbHidClass<'a, B> {
    delegate! {
        to self.hid {
            pub fn instance(&self) -> Option<&HidInstance>;
            pub fn config(&self) -> &HidConfig;
        }
        to self.ctx {
            pub fn speed(&self) -> UsbSpeed;
            pub fn state(&self) -> UsbDeviceState;
        }
    }

    pub fn interface_number(&self) -> InterfaceNumber {
        self.interface
    }

    /// Queue a raw input report, see [`HidClass::submit_report`]
    pub fn submit_report(&mut self, report: &[u8]) -> crate::Result<()> {
        let mut transport = BusTransport::new(&self.in_endpoint);
        self.hid.submit_report(&mut self.ctx, &mut transport, report)
    }

    pub fn write_keyboard_report(&mut self, report: &KeyboardReport) -> crate::Result<()> {
        let data = report.to_bytes()?;
        self.submit_report(&data)
    }

    /// Call from the start of frame interrupt
    pub fn start_of_frame(&mut self) -> crate::Result<()> {
        self.hid.sof(&mut self.ctx)
    }

    pub fn read_interval(&self) -> Milliseconds {
        self.hid.read_interval(&self.ctx)
    }

    fn is_own_interface(&self, request: &Request) -> bool {
        request.recipient == Recipient::Interface
            && u8::try_from(request.index).ok() == Some(u8::from(self.interface))
    }

    fn dispatch(&mut self, request: &Request) -> ControlReply {
        let mut transport = BusTransport::new(&self.in_endpoint);
        match self.hid.setup(&mut self.ctx, &mut transport, request) {
            Ok(()) | Err(UsbHidError::Stall) => {}
            Err(e) => {
                error!("Failed to handle request {:X} - {:?}", request.request, e);
                transport.reply = ControlReply::Stall;
            }
        }
        transport.reply
    }

    fn release_instance(&mut self, cfg_index: u8) {
        if self.hid.instance().is_some() {
            let mut transport = BusTransport::new(&self.in_endpoint);
            if let Err(e) = self.hid.deinit(&mut self.ctx, &mut transport, cfg_index) {
                error!("Failed to release HID class - {:?}", e);
            }
        }
    }

    fn set_configuration(&mut self, value: u16) {
        match value {
            CONFIGURATION_NONE => {
                self.release_instance(CONFIGURATION_VALUE as u8);
                if self.ctx.is_configured() {
                    self.ctx.set_state(UsbDeviceState::Addressed);
                }
            }
            CONFIGURATION_VALUE => {
                //selecting the current configuration again restarts it
                self.release_instance(CONFIGURATION_VALUE as u8);
                self.ctx.set_state(UsbDeviceState::Configured);

                let mut transport = BusTransport::new(&self.in_endpoint);
                if let Err(e) = self
                    .hid
                    .init(&mut self.ctx, &mut transport, CONFIGURATION_VALUE as u8)
                {
                    error!("Failed to initialize HID class - {:?}", e);
                }
            }
            _ => warn!("Unsupported configuration value {:X}", value),
        }
    }

    fn observe_device_request(&mut self, request: &Request) {
        match request.request {
            Request::SET_ADDRESS => {
                if self.ctx.state() == UsbDeviceState::Default && request.value != 0 {
                    self.ctx.set_state(UsbDeviceState::Addressed);
                }
            }
            Request::SET_CONFIGURATION => self.set_configuration(request.value),
            _ => {}
        }
    }
}

impl<B: UsbBus> UsbClass<B> for UsbHidClass<'_, B> {
    fn get_configuration_descriptors(
        &self,
        writer: &mut DescriptorWriter,
    ) -> usb_device::Result<()> {
        writer.interface_alt(
            self.interface,
            DEFAULT_ALTERNATE_SETTING,
            USB_CLASS_HID,
            InterfaceSubClass::from(InterfaceProtocol::Keyboard).into(),
            InterfaceProtocol::Keyboard.into(),
            self.description_index,
        )?;

        //Hid descriptor
        writer.write(DescriptorType::Hid.into(), &HID_DESCRIPTOR[2..])?;

        writer.endpoint(&self.in_endpoint)?;

        info!("wrote class config descriptor");
        Ok(())
    }

    fn get_string(&self, index: StringIndex, _lang_id: u16) -> Option<&str> {
        self.description_index
            .filter(|&i| i == index)
            .and(self.description)
    }

    fn reset(&mut self) {
        info!("Reset");
        self.release_instance(CONFIGURATION_VALUE as u8);
        self.ctx.set_state(UsbDeviceState::Default);
        self.ctx.clear_endpoints();
    }

    fn control_out(&mut self, transfer: ControlOut<B>) {
        let request = *transfer.request();

        if request.request_type == RequestType::Standard && request.recipient == Recipient::Device
        {
            //left for usb-device to accept, only tracked here
            self.observe_device_request(&request);
            return;
        }

        if !self.is_own_interface(&request) {
            return;
        }

        trace!(
            "ctrl_out: request type: {:?}, request: {:X}, value: {:X}",
            request.request_type,
            request.request,
            request.value
        );

        let result = match self.dispatch(&request) {
            ControlReply::None => transfer.accept(),
            ControlReply::Stall => transfer.reject(),
            ControlReply::Data(_) => {
                warn!("Dropping reply data for OUT request {:X}", request.request);
                transfer.reject()
            }
        };
        if let Err(e) = result {
            error!("Failed to complete control out - {:?}", e);
        }
    }

    fn control_in(&mut self, transfer: ControlIn<B>) {
        let request = *transfer.request();

        if !self.is_own_interface(&request) {
            return;
        }

        trace!(
            "ctrl_in: request type: {:?}, request: {:X}, value: {:X}",
            request.request_type,
            request.request,
            request.value
        );

        match self.dispatch(&request) {
            ControlReply::Data(data) => match transfer.accept_with(&data) {
                Err(e) => error!("Failed to send control data - {:?}", e),
                Ok(_) => trace!("Sent control data, {:X} bytes", data.len()),
            },
            ControlReply::None => {
                if let Err(e) = transfer.accept_with(&[]) {
                    error!("Failed to complete control in - {:?}", e);
                }
            }
            ControlReply::Stall => {
                if let Err(e) = transfer.reject() {
                    error!("Failed to stall control in - {:?}", e);
                }
            }
        }
    }

    fn endpoint_in_complete(&mut self, addr: EndpointAddress) {
        if addr != self.in_endpoint.address() {
            return;
        }

        let mut transport = BusTransport::new(&self.in_endpoint);
        if let Err(e) = self
            .hid
            .data_in(&mut self.ctx, &mut transport, addr.index() as u8)
        {
            warn!("Unexpected IN completion - {:?}", e);
        }
    }
}
