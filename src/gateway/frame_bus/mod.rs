//! Fan-out of received frames to request listeners.
//!
//! Every frame entering through ingress is published to all current
//! listeners. The queue is bounded and lossy: a listener that falls
//! behind skips the overwritten frames and keeps reading the newest
//! ones. Request deadlines absorb the loss.
use core::cell::Cell;

use embassy_sync::{
    blocking_mutex::{raw::CriticalSectionRawMutex, Mutex},
    pubsub::{PubSubChannel, Subscriber, WaitResult},
};

use crate::{
    error::SubscribeError,
    protocol::transport::{iface_name::IfaceName, raw_frame::RawFrame},
};

/// Frames buffered per listener before old ones are overwritten.
pub const FRAME_QUEUE_DEPTH: usize = 16;

/// Concurrent listener slots.
pub const MAX_LISTENERS: usize = 8;

type Channel = PubSubChannel<CriticalSectionRawMutex, BusFrame, FRAME_QUEUE_DEPTH, MAX_LISTENERS, 1>;
type ChannelSubscriber<'a> =
    Subscriber<'a, CriticalSectionRawMutex, BusFrame, FRAME_QUEUE_DEPTH, MAX_LISTENERS, 1>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// A received frame tagged with the interface it arrived on.
pub struct BusFrame {
    pub iface: IfaceName,
    pub frame: RawFrame,
}

/// Broadcast channel carrying every received frame to all listeners.
pub struct FrameBus {
    channel: Channel,
    listeners: Mutex<CriticalSectionRawMutex, Cell<usize>>,
}

impl FrameBus {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            listeners: Mutex::new(Cell::new(0)),
        }
    }

    /// Publish a frame to every listener, overwriting the oldest queued
    /// frame for listeners whose queue is full.
    pub fn publish(&self, frame: BusFrame) {
        self.channel.immediate_publisher().publish_immediate(frame);
    }

    /// Register a scoped listener. Dropping it releases the slot.
    pub fn listen(&self) -> Result<FrameListener<'_>, SubscribeError> {
        let subscriber = self
            .channel
            .subscriber()
            .map_err(|_| SubscribeError::SlotsExhausted)?;
        self.listeners.lock(|count| count.set(count.get() + 1));
        Ok(FrameListener {
            subscriber,
            bus: self,
        })
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock(|count| count.get())
    }
}

impl Default for FrameBus {
    fn default() -> Self {
        Self::new()
    }
}

/// One subscription to the frame fan-out, released on drop.
pub struct FrameListener<'a> {
    subscriber: ChannelSubscriber<'a>,
    bus: &'a FrameBus,
}

impl FrameListener<'_> {
    /// Wait for the next frame, skipping over any overwritten backlog.
    pub async fn next(&mut self) -> BusFrame {
        loop {
            match self.subscriber.next_message().await {
                WaitResult::Message(frame) => return frame,
                WaitResult::Lagged(_) => continue,
            }
        }
    }
}

impl Drop for FrameListener<'_> {
    fn drop(&mut self) {
        self.bus.listeners.lock(|count| count.set(count.get() - 1));
    }
}
