//! Transport layer: raw CAN frame representation, 29-bit correlation
//! identifier management, interface naming, and host abstraction traits.
//!
//! ## Default operation deadlines
//!
//! These constants define recommended deadlines for the device operation
//! classes. They are configuration, not protocol: every one of them can be
//! overridden through [`Timeouts`](crate::gateway::client::Timeouts).

pub mod iface_name;
pub mod package_id;
pub mod raw_frame;
pub mod timer;
pub mod traits;

/// Deadline for a single port read/write acknowledgement (ms).
///
/// Port commands are answered from device RAM; on a healthy 125-500 kbps
/// bus the round trip stays well under 10 ms.
pub const DEFAULT_COMMAND_TIMEOUT_MS: u32 = 10;

/// Deadline for one configuration step acknowledgement (ms).
///
/// Configuration writes touch the device-side option table and are slower
/// than port commands, but still answered frame-for-frame.
pub const DEFAULT_CONFIG_SINGLE_TIMEOUT_MS: u32 = 25;

/// Aggregate deadline for a whole configuration read or write (ms).
///
/// A full 16-port configuration exchange is a few hundred frames; the
/// aggregate deadline bounds the operation when individual steps keep
/// succeeding slowly.
pub const DEFAULT_CONFIG_TOTAL_TIMEOUT_MS: u32 = 2_000;

/// Grace window after a broadcast request (ms).
///
/// Broadcast requests have no known responder count; the gateway keeps
/// collecting acknowledgements for this window before resolving.
pub const DEFAULT_GRACE_WINDOW_MS: u32 = 70;

/// Deadline for a ping exchange (ms).
pub const DEFAULT_PING_TIMEOUT_MS: u32 = 100;

/// Deadline for a discovery round (ms).
pub const DEFAULT_DISCOVER_TIMEOUT_MS: u32 = 100;

/// Deadline for an EEPROM commit acknowledgement (ms).
///
/// Devices block on the non-volatile write before acknowledging; tens of
/// seconds are required for the larger option tables.
pub const DEFAULT_EEPROM_TIMEOUT_MS: u32 = 30_000;

/// Deadline for a complete delay-list stream (ms).
pub const DEFAULT_LIST_DELAYS_TIMEOUT_MS: u32 = 1_000;

/// Deadline for a clear-delay acknowledgement (ms).
pub const DEFAULT_CLEAR_DELAY_TIMEOUT_MS: u32 = 50;

/// Default interval between two interface reconciliation cycles (ms).
pub const DEFAULT_IFACE_CHECK_INTERVAL_MS: u32 = 10_000;

/// Default interface discovery pattern (comma-separated glob list).
pub const DEFAULT_IFACE_PATTERNS: &str = "can*";
