//! Scheduled-delay records and the collector assembling them from a
//! list-delays frame stream.
//!
//! Each pending delay arrives as five WAIT-flagged sub-frames in field
//! order, all carrying the delay's output port, and the stream closes
//! with a WAIT-cleared frame.
use crate::protocol::device::{commands, config::ActionKind, frame::DeviceFrame, StreamResult};

/// Maximum pending delays reported in one listing.
pub const MAX_DELAYS: usize = 16;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// One pending scheduled action on a device.
pub struct Delay {
    pub id: u32,
    /// Device the delayed action will drive.
    pub device: u8,
    /// Output port the delay is bound to.
    pub port: u8,
    pub active: bool,
    pub kind: ActionKind,
    pub remaining_ms: u32,
}

#[derive(Clone, Copy, Debug, Default)]
/// Inline delay list, at most [`MAX_DELAYS`] entries.
pub struct DelayList {
    delays: [Delay; MAX_DELAYS],
    len: usize,
}

impl DelayList {
    pub const fn new() -> Self {
        Self {
            delays: [Delay {
                id: 0,
                device: 0,
                port: 0,
                active: false,
                kind: ActionKind::Low,
                remaining_ms: 0,
            }; MAX_DELAYS],
            len: 0,
        }
    }

    /// Append a delay; silently drops when full.
    pub fn push(&mut self, delay: Delay) {
        if self.len < MAX_DELAYS {
            self.delays[self.len] = delay;
            self.len += 1;
        }
    }

    pub fn as_slice(&self) -> &[Delay] {
        &self.delays[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn last_mut(&mut self) -> Option<&mut Delay> {
        self.delays[..self.len].last_mut()
    }
}

#[derive(Debug, Default)]
/// Assembles a [`DelayList`] from a list-delays response stream. A
/// `DelayId` frame opens a record; the remaining field frames fill the
/// record most recently opened.
pub struct DelayStreamCollector {
    list: DelayList,
}

impl DelayStreamCollector {
    pub const fn new() -> Self {
        Self {
            list: DelayList::new(),
        }
    }

    /// Feed one accepted frame. [`StreamResult::Complete`] when the
    /// WAIT-cleared terminator arrives.
    pub fn process(&mut self, frame: &DeviceFrame) -> StreamResult {
        if frame.data.is_config() {
            return StreamResult::Ignored;
        }
        match frame.op.option() {
            commands::DELAY_ID => self.list.push(Delay {
                id: frame.payload,
                port: frame.port,
                ..Delay::default()
            }),
            commands::DELAY_DEVICE => {
                if let Some(delay) = self.list.last_mut() {
                    delay.device = frame.payload as u8;
                }
            }
            commands::DELAY_ACTIVE => {
                if let Some(delay) = self.list.last_mut() {
                    delay.active = frame.payload != 0;
                }
            }
            commands::DELAY_KIND => {
                if let Some(delay) = self.list.last_mut() {
                    delay.kind = ActionKind::from_num(frame.payload as u8);
                }
            }
            commands::DELAY_REMAINING => {
                if let Some(delay) = self.list.last_mut() {
                    delay.remaining_ms = frame.payload;
                }
            }
            _ if frame.comm.is_wait() => return StreamResult::Ignored,
            // Terminator frames carry no field data.
            _ => {}
        }
        if frame.comm.is_wait() {
            StreamResult::Consumed
        } else {
            StreamResult::Complete
        }
    }

    /// The list assembled so far.
    pub fn into_list(self) -> DelayList {
        self.list
    }
}
