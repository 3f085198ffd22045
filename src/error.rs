//! Error definitions shared across library modules.
//! Each type models a specific failure scenario (transmission, listener
//! registration, response waiting, full device operations).
use thiserror_no_std::Error;

#[derive(Error, Debug, PartialEq, Eq)]
/// Errors raised when handing a frame to an interface for transmission.
pub enum SendError<E: core::fmt::Debug> {
    /// No open channel exists for the requested interface name.
    #[error("interface is not open")]
    InterfaceNotOpen,

    /// The underlying CAN channel refused or failed to queue the frame.
    #[error("CAN bus send error: {0:?}")]
    Bus(E),
}

#[derive(Error, Debug, PartialEq, Eq)]
/// Errors raised while registering a frame listener.
pub enum SubscribeError {
    /// Every listener slot of the frame fan-out is already taken.
    #[error("all frame listener slots are in use")]
    SlotsExhausted,
}

#[derive(Error, Debug, PartialEq, Eq)]
/// Outcome of a single response wait inside the correlator.
pub enum WaitError {
    /// No satisfying frame arrived before the deadline fired.
    #[error("no matching frame arrived within the deadline")]
    Timeout,

    /// A correlated frame arrived but carried the error flag or the wrong
    /// get/set direction.
    #[error("device 0x{device:02X} rejected operation 0x{option:02X}")]
    Protocol { device: u8, option: u8 },
}

#[derive(Error, Debug, PartialEq, Eq)]
/// Errors surfaced to callers of the device operation client.
pub enum RequestError<E: core::fmt::Debug> {
    /// The operation deadline expired without a satisfying response.
    #[error("operation timed out")]
    Timeout,

    /// The device answered with the error flag or an inverted get/set
    /// direction. Not retried internally.
    #[error("device 0x{device:02X} rejected operation 0x{option:02X}")]
    Protocol { device: u8, option: u8 },

    /// Unable to register the response listener.
    #[error(transparent)]
    Subscribe(#[from] SubscribeError),

    /// The request frame never made it onto the bus.
    #[error(transparent)]
    Send(#[from] SendError<E>),
}

impl<E: core::fmt::Debug> From<WaitError> for RequestError<E> {
    fn from(err: WaitError) -> Self {
        match err {
            WaitError::Timeout => RequestError::Timeout,
            WaitError::Protocol { device, option } => RequestError::Protocol { device, option },
        }
    }
}
