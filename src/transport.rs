//! Contract a class handler requires from the lower device layers

use usb_device::control::Request;
use usb_device::endpoint::{EndpointAddress, EndpointType};

use crate::context::DeviceContext;
use crate::Result;

/// Endpoint and control pipe operations provided by the device core.
///
/// `submit_transfer` is asynchronous: completion is reported later through
/// [`UsbdClass::data_in`](crate::class::UsbdClass::data_in).
pub trait EndpointTransport {
    fn open_endpoint(
        &mut self,
        ctx: &mut DeviceContext,
        addr: EndpointAddress,
        ep_type: EndpointType,
        max_packet_size: u16,
    );
    fn close_endpoint(&mut self, ctx: &mut DeviceContext, addr: EndpointAddress);
    fn submit_transfer(
        &mut self,
        ctx: &mut DeviceContext,
        addr: EndpointAddress,
        data: &[u8],
    ) -> Result<()>;
    /// Queue the data stage of the current control transfer
    fn send_control_data(&mut self, ctx: &mut DeviceContext, data: &[u8]);
    /// Stall the control pipe in response to `request`
    fn signal_control_error(&mut self, ctx: &mut DeviceContext, request: &Request);
}
