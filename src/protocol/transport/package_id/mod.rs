//! Creation and extraction of the 29-bit correlation identifiers carried in
//! the bus identifier of every protocol frame.
use core::cell::Cell;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

/// Highest value of the 13-bit sequence field.
pub const SEQUENCE_MAX: u16 = 0x1FFF;

//==================================================================================PACKAGE_ID
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Encapsulates the 29-bit correlation identifier and exposes accessors for
/// its sequence, initiator, and responder fields.
///
/// Layout: `sequence(13) << 16 | initiator(8) << 8 | responder(8)`.
/// The initiator byte names the operation (a reserved pseudo-address on
/// requests, the device address on telemetry); the responder byte names the
/// target, with `0xFF` for broadcast.
pub struct PackageId(pub u32);

impl PackageId {
    /// Compose an identifier from its three fields. Sequence bits above 13
    /// are discarded.
    pub fn new(sequence: u16, initiator: u8, responder: u8) -> Self {
        Self(
            ((sequence & SEQUENCE_MAX) as u32) << 16
                | (initiator as u32) << 8
                | responder as u32,
        )
    }

    /// 13-bit request sequence number.
    pub fn sequence(&self) -> u16 {
        ((self.0 >> 16) & SEQUENCE_MAX as u32) as u16
    }

    /// Eight-bit initiator address (operation pseudo-address or device).
    pub fn initiator(&self) -> u8 {
        ((self.0 >> 8) & 0xFF) as u8
    }

    /// Eight-bit responder address (`0xFF` = broadcast).
    pub fn responder(&self) -> u8 {
        (self.0 & 0xFF) as u8
    }
}

//==================================================================================SEQUENCE_COUNTER
/// Monotonic sequence allocator shared by every in-flight request.
///
/// Wraps at [`SEQUENCE_MAX`] back to zero. Bounded in-flight counts and the
/// operation deadlines guarantee a value is never reused while a request
/// carrying it is still pending.
pub struct SequenceCounter {
    next: Mutex<CriticalSectionRawMutex, Cell<u16>>,
}

impl SequenceCounter {
    /// Counter starting at zero.
    pub const fn new() -> Self {
        Self {
            next: Mutex::new(Cell::new(0)),
        }
    }

    /// Allocate the next sequence value.
    pub fn next(&self) -> u16 {
        self.next.lock(|cell| {
            let value = cell.get();
            cell.set(if value >= SEQUENCE_MAX { 0 } else { value + 1 });
            value
        })
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}
