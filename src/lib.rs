//! `canio-gw` library: protocol engine sitting between a raw CAN bus and the
//! higher-level control planes of an I/O gateway. The crate exposes the wire
//! primitives (frames, correlation identifiers, codec), the device protocol
//! (port access, configuration streaming, delay management), and the gateway
//! engine (interface lifecycle, frame fan-out, request correlation) in a
//! `no_std` environment.
#![no_std]
//==================================================================================
/// Domain and low-level errors (send failures, timeouts, protocol rejections).
pub mod error;
/// Gateway engine: interface lifecycle, frame fan-out, request correlation,
/// and the typed device operation client.
pub mod gateway;
/// Wire protocol: transport primitives and the device application layer.
pub mod protocol;
//==================================================================================
