//! In-memory representation of one CAN transmission unit as exchanged with
//! the host channel.
use embedded_can::{ExtendedId, Frame, Id, StandardId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Raw CAN frame as read from or written to the bus.
pub struct RawFrame {
    /// Bus identifier; 29 bits when `ext` is set, 11 bits otherwise.
    pub id: u32,
    /// Payload buffer. The device protocol always uses eight bytes.
    pub data: [u8; 8],
    /// Number of valid payload bytes (Data Length Code, 0 to 8).
    pub len: usize,
    /// Extended (29-bit) frame format.
    pub ext: bool,
    /// Remote transmission request.
    pub rtr: bool,
}

impl RawFrame {
    /// Build an extended data frame, the only shape the device protocol emits.
    pub fn extended(id: u32, data: [u8; 8]) -> Self {
        Self {
            id: id & 0x1FFF_FFFF,
            data,
            len: 8,
            ext: true,
            rtr: false,
        }
    }
}

/// Interoperability with HAL drivers speaking `embedded-can`.
impl Frame for RawFrame {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        if data.len() > 8 {
            return None;
        }
        let (id, ext) = split_id(id.into());
        let mut buf = [0; 8];
        buf[..data.len()].copy_from_slice(data);
        Some(Self {
            id,
            data: buf,
            len: data.len(),
            ext,
            rtr: false,
        })
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        if dlc > 8 {
            return None;
        }
        let (id, ext) = split_id(id.into());
        Some(Self {
            id,
            data: [0; 8],
            len: dlc,
            ext,
            rtr: true,
        })
    }

    fn is_extended(&self) -> bool {
        self.ext
    }

    fn is_remote_frame(&self) -> bool {
        self.rtr
    }

    fn id(&self) -> Id {
        if self.ext {
            Id::Extended(ExtendedId::new(self.id).unwrap_or(ExtendedId::MAX))
        } else {
            Id::Standard(StandardId::new(self.id as u16).unwrap_or(StandardId::MAX))
        }
    }

    fn dlc(&self) -> usize {
        self.len
    }

    fn data(&self) -> &[u8] {
        &self.data[..self.len]
    }
}

fn split_id(id: Id) -> (u32, bool) {
    match id {
        Id::Standard(id) => (id.as_raw() as u32, false),
        Id::Extended(id) => (id.as_raw(), true),
    }
}
