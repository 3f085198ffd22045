//! Minimal abstraction over the host operating system's view of the CAN
//! hardware. Allows the gateway engine to plug into various backends
//! (socketcan, HAL driver, test double) without knowing any of them.
use crate::protocol::transport::{iface_name::IfaceName, raw_frame::RawFrame};

/// Transmit-only handle for one open channel.
pub trait CanTx {
    type Error: core::fmt::Debug;

    /// Queue a frame for transmission. Non-blocking; delivery confirmation
    /// is the job of the application protocol, not the channel.
    fn send(&mut self, frame: &RawFrame) -> Result<(), Self::Error>;
}

/// Contract for enumerating, probing, and opening bus interfaces.
///
/// Received frames do not flow through this trait: the host adapter pushes
/// them into the engine via
/// [`InterfaceManager::ingress`](crate::gateway::interface_manager::InterfaceManager::ingress)
/// from whatever receive context it owns.
pub trait CanHost {
    type Tx: CanTx;
    type Error: core::fmt::Debug;

    /// Write the names of all present interfaces into `out`; returns how
    /// many were written. Names beyond `out.len()` are dropped.
    fn interface_names(&mut self, out: &mut [IfaceName]) -> usize;

    /// Current link state of an interface ("up" or anything else).
    fn link_up(&mut self, name: &IfaceName) -> bool;

    /// Open a raw channel on the named interface.
    fn open(&mut self, name: &IfaceName) -> Result<Self::Tx, Self::Error>;
}
