//! Device application layer: control-byte bitfields, operation numbering,
//! the logical frame codec, and the configuration/delay record models
//! assembled from frame streams.
pub mod config;
pub mod delay;
pub mod frame;

/// Reserved pseudo-device addresses. Each gateway-initiated operation uses
/// its own initiator address so responses stay attributable even on a
/// shared broadcast medium.
pub mod addresses {
    pub const GET_PORT: u8 = 0xF0;
    pub const SET_PORT: u8 = 0xF1;
    pub const DISCOVER: u8 = 0xF2;
    pub const PING: u8 = 0xF3;
    pub const GET_CONFIG: u8 = 0xF4;
    pub const SET_CONFIG: u8 = 0xF5;
    pub const WRITE_EEPROM: u8 = 0xF6;
    pub const LIST_DELAYS: u8 = 0xF7;
    pub const CLEAR_DELAY: u8 = 0xF8;
    pub const BROADCAST: u8 = 0xFF;
}

/// Operation codes for command framing (data-control CONFIG bit clear).
pub mod commands {
    /// Primary port value.
    pub const PORT: u8 = 0x00;
    /// Auxiliary payload layered onto the same port action.
    pub const PORT_EXTRA: u8 = 0x01;
    /// Scheduled-delay duration layered onto the same port action.
    pub const PORT_DELAY: u8 = 0x02;

    /// Delay-list sub-frames, one per field of a delay record.
    pub const DELAY_ID: u8 = 0x01;
    pub const DELAY_DEVICE: u8 = 0x02;
    pub const DELAY_ACTIVE: u8 = 0x03;
    pub const DELAY_KIND: u8 = 0x04;
    pub const DELAY_REMAINING: u8 = 0x05;

    /// Clear a scheduled delay by its identifier / by its output port.
    pub const CLEAR_BY_ID: u8 = 0x00;
    pub const CLEAR_BY_PORT: u8 = 0x01;
}

/// Option numbers for config framing (data-control CONFIG bit set).
pub mod options {
    pub const DEBOUNCE: u8 = 0x01;
    pub const DOUBLECLICK: u8 = 0x02;
    pub const LONGPRESS: u8 = 0x03;
    pub const BYPASS_INSTANTLY: u8 = 0x04;
    pub const BYPASS_ON_DIP_SWITCH: u8 = 0x05;
    pub const BYPASS_ON_DISCONNECT: u8 = 0x06;

    /// Action-list marker: a set with zero payload clears the list, a get
    /// streams it, and the terminator acknowledgement carries this option.
    pub const ACTIONS: u8 = 0x10;
    pub const ACTION_BASE: u8 = 0x11;
    pub const ACTION_PORTS: u8 = 0x12;
    pub const ACTION_SKIP_WHEN_DELAY: u8 = 0x13;
    pub const ACTION_CLEAR_DELAYS: u8 = 0x14;
    pub const ACTION_DELAY: u8 = 0x15;
    pub const ACTION_LONGPRESS: u8 = 0x16;

    pub const WRITE_EEPROM: u8 = 0x7F;
}

/// Port byte value meaning "no port applies to this frame".
pub const NO_PORT: u8 = 0xFF;

/// Device byte value closing an action stream ("no further actions").
pub const ACTION_SENTINEL: u8 = 0xFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Outcome of feeding one frame into a streaming-record collector.
pub enum StreamResult {
    /// Frame does not belong to the record being assembled.
    Ignored,
    /// Frame extended the in-progress record; more are expected.
    Consumed,
    /// Continuation flag cleared: the record sequence is complete.
    Complete,
}
