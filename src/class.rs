//! Operation set shared by every class the device stack can host

use usb_device::control::Request;

use crate::context::DeviceContext;
use crate::transport::EndpointTransport;
use crate::Result;

/// A USB device class handler.
///
/// The device core calls these from its event loop, one at a time and each to
/// completion. Operations a class has no use for keep their default, which
/// accepts the event and does nothing.
pub trait UsbdClass {
    fn name(&self) -> &'static str;

    /// Host selected configuration `cfg_index`
    fn init(
        &mut self,
        ctx: &mut DeviceContext,
        transport: &mut dyn EndpointTransport,
        cfg_index: u8,
    ) -> Result<()>;

    /// Configuration `cfg_index` was cleared or the bus was reset
    fn deinit(
        &mut self,
        ctx: &mut DeviceContext,
        transport: &mut dyn EndpointTransport,
        cfg_index: u8,
    ) -> Result<()>;

    /// Start of frame, once per (micro)frame
    fn sof(&mut self, _ctx: &mut DeviceContext) -> Result<()> {
        Ok(())
    }

    fn setup(
        &mut self,
        ctx: &mut DeviceContext,
        transport: &mut dyn EndpointTransport,
        request: &Request,
    ) -> Result<()>;

    fn ep0_tx_sent(&mut self, _ctx: &mut DeviceContext) -> Result<()> {
        Ok(())
    }

    fn ep0_rx_ready(&mut self, _ctx: &mut DeviceContext) -> Result<()> {
        Ok(())
    }

    /// A transfer submitted on IN endpoint `ep_num` completed
    fn data_in(
        &mut self,
        _ctx: &mut DeviceContext,
        _transport: &mut dyn EndpointTransport,
        _ep_num: u8,
    ) -> Result<()> {
        Ok(())
    }

    fn data_out(
        &mut self,
        _ctx: &mut DeviceContext,
        _transport: &mut dyn EndpointTransport,
        _ep_num: u8,
    ) -> Result<()> {
        Ok(())
    }
}
