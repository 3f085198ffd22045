//! Wire protocol implementation: transport primitives (raw frames,
//! correlation identifiers, host abstraction) and the device application
//! layer (control bytes, configuration records, delay records).
pub mod device;
pub mod transport;
