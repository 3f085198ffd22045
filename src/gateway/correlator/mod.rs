//! Response correlation: races a frame listener against a deadline.
//!
//! Three wait shapes cover the protocol: a single correlated response,
//! a broadcast collection window, and a multi-frame record stream. Each
//! takes a classifier so the caller decides which frames correlate; a
//! frame classified as an error rejects the wait immediately with the
//! responder's protocol error.
use futures_util::{
    future::{select, Either},
    pin_mut,
};

use crate::{
    error::WaitError,
    gateway::frame_bus::FrameListener,
    protocol::{
        device::{frame::DeviceFrame, StreamResult},
        transport::{iface_name::IfaceName, traits::gw_timer::GwTimer},
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Classification of one received frame against a pending request.
pub enum Verdict {
    /// Not correlated; keep waiting.
    Ignore,
    /// Correlated, satisfying response.
    Accept,
    /// Correlated but rejected by the device.
    Error,
}

fn protocol_error(frame: &DeviceFrame) -> WaitError {
    WaitError::Protocol {
        device: frame.id.responder(),
        option: frame.op.option(),
    }
}

/// Wait for the first accepted frame on `iface`, at most `timeout_ms`.
pub async fn await_first<T, F>(
    listener: &mut FrameListener<'_>,
    timer: &mut T,
    timeout_ms: u32,
    iface: &IfaceName,
    mut classify: F,
) -> Result<DeviceFrame, WaitError>
where
    T: GwTimer,
    F: FnMut(&DeviceFrame) -> Verdict,
{
    let deadline = timer.delay_ms(timeout_ms);
    pin_mut!(deadline);
    loop {
        let next = listener.next();
        pin_mut!(next);
        match select(next, deadline.as_mut()).await {
            Either::Left((received, _)) => {
                if received.iface != *iface {
                    continue;
                }
                let frame = DeviceFrame::decode(&received.frame);
                match classify(&frame) {
                    Verdict::Ignore => continue,
                    Verdict::Accept => return Ok(frame),
                    Verdict::Error => return Err(protocol_error(&frame)),
                }
            }
            Either::Right(((), _)) => return Err(WaitError::Timeout),
        }
    }
}

/// Collect accepted frames on `iface` until the stream goes quiet for
/// `grace_ms`, `total_ms` runs out, or `on_accept` asks to stop. Each
/// accepted frame re-arms the grace window; window expiry is normal
/// completion.
pub async fn collect_until<T, F, G>(
    listener: &mut FrameListener<'_>,
    timer: &mut T,
    total_ms: u32,
    grace_ms: u32,
    iface: &IfaceName,
    mut classify: F,
    mut on_accept: G,
) -> Result<(), WaitError>
where
    T: GwTimer,
    F: FnMut(&DeviceFrame) -> Verdict,
    G: FnMut(&DeviceFrame) -> bool,
{
    let started = timer.now_ms();
    let mut last_accept = started;
    loop {
        let now = timer.now_ms();
        let total_left = (total_ms as u64).saturating_sub(now - started);
        let grace_left = (grace_ms as u64).saturating_sub(now - last_accept);
        let wait_ms = total_left.min(grace_left) as u32;
        if wait_ms == 0 {
            return Ok(());
        }

        // The deadline future borrows the timer, so it must be gone
        // before the accept timestamp can be taken below.
        let received = {
            let deadline = timer.delay_ms(wait_ms);
            pin_mut!(deadline);
            let next = listener.next();
            pin_mut!(next);
            match select(next, deadline).await {
                Either::Left((received, _)) => received,
                Either::Right(((), _)) => return Ok(()),
            }
        };
        if received.iface != *iface {
            continue;
        }
        let frame = DeviceFrame::decode(&received.frame);
        match classify(&frame) {
            Verdict::Ignore => continue,
            Verdict::Accept => {
                last_accept = timer.now_ms();
                if on_accept(&frame) {
                    return Ok(());
                }
            }
            Verdict::Error => return Err(protocol_error(&frame)),
        }
    }
}

/// Feed accepted frames on `iface` into a record stream until the stream
/// reports completion, at most `timeout_ms` for the whole stream.
pub async fn collect_stream<T, F, S>(
    listener: &mut FrameListener<'_>,
    timer: &mut T,
    timeout_ms: u32,
    iface: &IfaceName,
    mut classify: F,
    mut step: S,
) -> Result<(), WaitError>
where
    T: GwTimer,
    F: FnMut(&DeviceFrame) -> Verdict,
    S: FnMut(&DeviceFrame) -> StreamResult,
{
    let deadline = timer.delay_ms(timeout_ms);
    pin_mut!(deadline);
    loop {
        let next = listener.next();
        pin_mut!(next);
        match select(next, deadline.as_mut()).await {
            Either::Left((received, _)) => {
                if received.iface != *iface {
                    continue;
                }
                let frame = DeviceFrame::decode(&received.frame);
                match classify(&frame) {
                    Verdict::Ignore => continue,
                    Verdict::Accept => match step(&frame) {
                        StreamResult::Ignored | StreamResult::Consumed => continue,
                        StreamResult::Complete => return Ok(()),
                    },
                    Verdict::Error => return Err(protocol_error(&frame)),
                }
            }
            Either::Right(((), _)) => return Err(WaitError::Timeout),
        }
    }
}
