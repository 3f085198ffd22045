//! Telemetry seam towards an external event sink (message-bus client,
//! test recorder). The pump decodes every received frame and forwards
//! device-originated broadcast notifications; everything else on the bus
//! is request traffic and stays inside the engine.
use crate::{
    error::SubscribeError,
    gateway::interface_manager::{InterfaceInfo, InterfaceManager, InterfaceState},
    protocol::{
        device::{
            addresses,
            frame::{DataType, DeviceFrame, Direction},
        },
        transport::{iface_name::IfaceName, traits::can_host::CanHost},
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Unsolicited port state change announced by a device.
pub struct PortEvent {
    pub iface: IfaceName,
    pub device: u8,
    pub direction: Direction,
    pub port: u8,
    pub data_type: DataType,
    pub value: u32,
}

/// Receiver of gateway telemetry.
pub trait EventSink {
    fn port_event(&mut self, event: &PortEvent);
    fn interface_state(&mut self, info: &InterfaceInfo);
}

/// Forward every device-notify broadcast frame to the sink, forever.
///
/// A frame qualifies when the responder byte is the broadcast address,
/// the notify flag is set, and it uses command framing; the initiator
/// byte is then the announcing device.
pub async fn pipe_broadcast_frames<H, S, const MAX_IFACES: usize>(
    manager: &InterfaceManager<H, MAX_IFACES>,
    sink: &mut S,
) -> Result<(), SubscribeError>
where
    H: CanHost,
    S: EventSink,
{
    let mut listener = manager.listen()?;
    loop {
        let received = listener.next().await;
        let frame = DeviceFrame::decode(&received.frame);
        if frame.id.responder() != addresses::BROADCAST
            || !frame.comm.is_notify()
            || frame.data.is_config()
        {
            continue;
        }
        sink.port_event(&PortEvent {
            iface: received.iface,
            device: frame.id.initiator(),
            direction: frame.data.direction(),
            port: frame.port,
            data_type: frame.data.data_type(),
            value: frame.payload,
        });
    }
}

/// Push the current interface snapshot set into the sink.
pub fn publish_interface_states<H, S, const MAX_IFACES: usize>(
    manager: &InterfaceManager<H, MAX_IFACES>,
    sink: &mut S,
) where
    H: CanHost,
    S: EventSink,
{
    let mut snapshot = [InterfaceInfo {
        name: IfaceName::EMPTY,
        state: InterfaceState::Opening,
        rx_count: 0,
        tx_count: 0,
    }; MAX_IFACES];
    let count = manager.interfaces(&mut snapshot);
    for info in &snapshot[..count] {
        sink.interface_state(info);
    }
}
