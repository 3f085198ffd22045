//! Abstraction traits at the host boundary (interface enumeration, raw
//! channels, and timing).
pub mod can_host;
pub mod gw_timer;
