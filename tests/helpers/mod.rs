/// Test doubles simulating the CAN host, its transmit channels, and the
/// timer during integration tests.
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

use canio_gw::gateway::client::Timeouts;
use canio_gw::protocol::device::frame::{CommControl, DeviceFrame};
use canio_gw::protocol::transport::{
    iface_name::IfaceName,
    package_id::PackageId,
    raw_frame::RawFrame,
    traits::{
        can_host::{CanHost, CanTx},
        gw_timer::GwTimer,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Error type of the mock host and its channels.
pub struct MockBusError;

#[derive(Default)]
#[allow(dead_code)]
/// Mutable host-side world the tests script: present interfaces, link
/// states, and injected open failures.
pub struct HostState {
    pub names: Vec<String>,
    pub links_down: Vec<String>,
    pub fail_open: Vec<String>,
    pub open_count: usize,
}

#[derive(Clone)]
#[allow(dead_code)]
/// In-memory host reproducing the `CanHost` trait behavior. Every frame a
/// transmit channel sends lands on the shared capture channel.
pub struct MockHost {
    pub state: Arc<Mutex<HostState>>,
    sent_tx: mpsc::UnboundedSender<(IfaceName, RawFrame)>,
}

#[allow(dead_code)]
impl MockHost {
    /// Host starting with the given interfaces present and links up.
    /// Returns the receiver observing everything the gateway transmits.
    pub fn new(names: &[&str]) -> (Self, mpsc::UnboundedReceiver<(IfaceName, RawFrame)>) {
        let (sent_tx, sent_rx) = mpsc::unbounded_channel();
        let state = HostState {
            names: names.iter().map(|name| name.to_string()).collect(),
            ..HostState::default()
        };
        (
            Self {
                state: Arc::new(Mutex::new(state)),
                sent_tx,
            },
            sent_rx,
        )
    }

    pub fn set_names(&self, names: &[&str]) {
        self.state.lock().unwrap().names = names.iter().map(|name| name.to_string()).collect();
    }

    pub fn set_link_down(&self, name: &str, down: bool) {
        let mut state = self.state.lock().unwrap();
        state.links_down.retain(|entry| entry != name);
        if down {
            state.links_down.push(name.to_string());
        }
    }

    pub fn set_fail_open(&self, name: &str, fail: bool) {
        let mut state = self.state.lock().unwrap();
        state.fail_open.retain(|entry| entry != name);
        if fail {
            state.fail_open.push(name.to_string());
        }
    }

    pub fn open_count(&self) -> usize {
        self.state.lock().unwrap().open_count
    }
}

/// Transmit channel capturing frames into the host's shared channel.
pub struct MockTx {
    name: IfaceName,
    sent_tx: mpsc::UnboundedSender<(IfaceName, RawFrame)>,
}

impl CanTx for MockTx {
    type Error = MockBusError;

    fn send(&mut self, frame: &RawFrame) -> Result<(), Self::Error> {
        self.sent_tx
            .send((self.name, *frame))
            .map_err(|_| MockBusError)
    }
}

impl CanHost for MockHost {
    type Tx = MockTx;
    type Error = MockBusError;

    fn interface_names(&mut self, out: &mut [IfaceName]) -> usize {
        let state = self.state.lock().unwrap();
        let count = state.names.len().min(out.len());
        for (slot, name) in out.iter_mut().zip(&state.names) {
            *slot = IfaceName::new(name);
        }
        count
    }

    fn link_up(&mut self, name: &IfaceName) -> bool {
        !self
            .state
            .lock()
            .unwrap()
            .links_down
            .iter()
            .any(|entry| entry.as_str() == name.as_str())
    }

    fn open(&mut self, name: &IfaceName) -> Result<Self::Tx, Self::Error> {
        let mut state = self.state.lock().unwrap();
        if state.fail_open.iter().any(|entry| entry.as_str() == name.as_str()) {
            return Err(MockBusError);
        }
        state.open_count += 1;
        Ok(MockTx {
            name: *name,
            sent_tx: self.sent_tx.clone(),
        })
    }
}

#[allow(dead_code)]
/// Timer based on `tokio::time::sleep` to drive deadlines in tests.
pub struct MockTimer {
    start: Instant,
}

#[allow(dead_code)]
impl MockTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl GwTimer for MockTimer {
    async fn delay_ms(&mut self, millis: u32) {
        sleep(Duration::from_millis(millis as u64)).await;
    }

    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

#[allow(dead_code)]
/// Deadlines widened enough to absorb test scheduler jitter while keeping
/// the window-based operations quick.
pub fn test_timeouts() -> Timeouts {
    Timeouts {
        command_ms: 200,
        config_single_ms: 200,
        config_total_ms: 2_000,
        grace_ms: 80,
        ping_ms: 200,
        discover_ms: 80,
        eeprom_ms: 500,
        list_delays_ms: 500,
        clear_delay_ms: 200,
    }
}

#[allow(dead_code)]
/// Receive and decode the next frame the gateway transmitted.
pub async fn recv_request(
    sent_rx: &mut mpsc::UnboundedReceiver<(IfaceName, RawFrame)>,
) -> (IfaceName, DeviceFrame) {
    let (iface, raw) = sent_rx
        .recv()
        .await
        .expect("gateway did not transmit a frame");
    (iface, DeviceFrame::decode(&raw))
}

#[allow(dead_code)]
/// Acknowledgement a device at `device` would send for `request`: same
/// sequence, initiator, flags, and operation, with the ACK flag added.
pub fn reply_to(request: &DeviceFrame, device: u8) -> DeviceFrame {
    DeviceFrame {
        id: PackageId::new(
            request.id.sequence(),
            request.id.initiator(),
            device,
        ),
        comm: request.comm.with(CommControl::ACK),
        data: request.data,
        op: request.op,
        port: request.port,
        payload: request.payload,
    }
}
