//! Gateway engine: interface lifecycle and reconciliation, received-frame
//! fan-out, request/response correlation, the typed device operation
//! client, and the telemetry pump feeding an external event sink.
pub mod client;
pub mod correlator;
pub mod frame_bus;
pub mod interface_manager;
pub mod telemetry;
