//! Logical frame codec: bit-packed control bytes, the decoded frame view,
//! and the encode/decode pair mapping it onto raw 8-byte payloads.
//!
//! Decoding is total: every payload produces a [`DeviceFrame`].
//! Combinations that make no protocol sense are filtered by the request
//! matchers, never rejected here.
use crate::protocol::transport::{package_id::PackageId, raw_frame::RawFrame};

//==================================================================================COMM_CONTROL
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Communication-control byte (payload byte 0).
pub struct CommControl(pub u8);

impl CommControl {
    pub const DISCOVERY: u8 = 0x40;
    pub const PING: u8 = 0x20;
    pub const ACK: u8 = 0x10;
    pub const ERROR: u8 = 0x08;
    /// Continuation: more frames of the same logical record follow.
    pub const WAIT: u8 = 0x04;
    /// Unsolicited device-originated state change.
    pub const NOTIFY: u8 = 0x02;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn is_discovery(&self) -> bool {
        self.0 & Self::DISCOVERY != 0
    }

    pub fn is_ping(&self) -> bool {
        self.0 & Self::PING != 0
    }

    pub fn is_ack(&self) -> bool {
        self.0 & Self::ACK != 0
    }

    pub fn is_error(&self) -> bool {
        self.0 & Self::ERROR != 0
    }

    pub fn is_wait(&self) -> bool {
        self.0 & Self::WAIT != 0
    }

    pub fn is_notify(&self) -> bool {
        self.0 & Self::NOTIFY != 0
    }

    pub fn with(self, flag: u8) -> Self {
        Self(self.0 | flag)
    }
}

//==================================================================================DATA_CONTROL
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Data/config-control byte (payload byte 1). The top bit selects config
/// framing; the rest qualifies the addressed signal.
pub struct DataControl(pub u8);

impl DataControl {
    pub const CONFIG: u8 = 0x80;
    pub const ANALOG: u8 = 0x40;
    pub const INPUT: u8 = 0x20;
    const DATA_TYPE_MASK: u8 = 0x0C;
    const DATA_TYPE_SHIFT: u8 = 2;

    /// Control byte for a port command on the given signal.
    pub fn command(signal: SignalKind, direction: Direction, data_type: DataType) -> Self {
        let mut bits = (data_type as u8) << Self::DATA_TYPE_SHIFT;
        if signal == SignalKind::Analog {
            bits |= Self::ANALOG;
        }
        if direction == Direction::Input {
            bits |= Self::INPUT;
        }
        Self(bits)
    }

    /// Control byte for config framing.
    pub const fn config() -> Self {
        Self(Self::CONFIG)
    }

    pub fn is_config(&self) -> bool {
        self.0 & Self::CONFIG != 0
    }

    pub fn signal(&self) -> SignalKind {
        if self.0 & Self::ANALOG != 0 {
            SignalKind::Analog
        } else {
            SignalKind::Digital
        }
    }

    pub fn direction(&self) -> Direction {
        if self.0 & Self::INPUT != 0 {
            Direction::Input
        } else {
            Direction::Output
        }
    }

    pub fn data_type(&self) -> DataType {
        DataType::from_bits((self.0 & Self::DATA_TYPE_MASK) >> Self::DATA_TYPE_SHIFT)
    }
}

//==================================================================================OP_BYTE
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Operation byte (payload byte 2): set/get discriminator in bit 7,
/// operation or option number in the low seven bits.
pub struct OpByte(pub u8);

impl OpByte {
    pub const SET: u8 = 0x80;

    /// Get-direction operation byte.
    pub const fn get(option: u8) -> Self {
        Self(option & 0x7F)
    }

    /// Set-direction operation byte.
    pub const fn set(option: u8) -> Self {
        Self(Self::SET | (option & 0x7F))
    }

    pub fn option(&self) -> u8 {
        self.0 & 0x7F
    }

    pub fn is_set(&self) -> bool {
        self.0 & Self::SET != 0
    }
}

//==================================================================================ENUMS
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Signal class of the addressed port.
pub enum SignalKind {
    Digital,
    Analog,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Direction of the addressed port.
pub enum Direction {
    Output,
    Input,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Encoding of the 32-bit payload value.
pub enum DataType {
    Bit = 0b00,
    Byte = 0b01,
    Int = 0b10,
    Float = 0b11,
}

impl DataType {
    /// Total two-bit conversion.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Bit,
            0b01 => Self::Byte,
            0b10 => Self::Int,
            _ => Self::Float,
        }
    }
}

//==================================================================================DEVICE_FRAME
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Decoded application-layer view of one raw frame.
pub struct DeviceFrame {
    /// Correlation identifier carried in the bus identifier.
    pub id: PackageId,
    pub comm: CommControl,
    pub data: DataControl,
    pub op: OpByte,
    /// Port or sub-index; [`NO_PORT`](super::NO_PORT) when absent.
    pub port: u8,
    /// 32-bit payload, most-significant byte first on the wire.
    pub payload: u32,
}

impl DeviceFrame {
    /// Pack the logical frame into an extended raw frame.
    pub fn encode(&self) -> RawFrame {
        let value = self.payload.to_be_bytes();
        RawFrame::extended(
            self.id.0,
            [
                self.comm.0,
                self.data.0,
                self.op.0,
                self.port,
                value[0],
                value[1],
                value[2],
                value[3],
            ],
        )
    }

    /// Unpack a raw frame. Total: bytes past the DLC read as zero.
    pub fn decode(raw: &RawFrame) -> Self {
        let mut data = [0; 8];
        let len = raw.len.min(8);
        data[..len].copy_from_slice(&raw.data[..len]);
        Self {
            id: PackageId(raw.id),
            comm: CommControl(data[0]),
            data: DataControl(data[1]),
            op: OpByte(data[2]),
            port: data[3],
            payload: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
        }
    }
}

//==================================================================================PORT_MASKS
/// Number of ports addressable through a 16-bit mask.
pub const MAX_PORTS: usize = 16;

/// Fold a port list into its bitmask. Ports outside `0..16` are ignored;
/// passing one is a caller error, not a codec error.
pub fn ports_to_mask(ports: &[u8]) -> u16 {
    let mut mask = 0;
    for &port in ports {
        debug_assert!((port as usize) < MAX_PORTS);
        if (port as usize) < MAX_PORTS {
            mask |= 1 << port;
        }
    }
    mask
}

/// Expand a bitmask into an ascending port list written to `out`; returns
/// how many ports were written.
pub fn mask_to_ports(mask: u16, out: &mut [u8]) -> usize {
    let mut count = 0;
    for port in 0..MAX_PORTS as u8 {
        if mask & (1 << port) != 0 && count < out.len() {
            out[count] = port;
            count += 1;
        }
    }
    count
}

//==================================================================================TESTS
#[cfg(test)]
#[path = "tests.rs"]
mod tests;
