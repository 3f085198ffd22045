//! Registry and lifecycle of open CAN interfaces.
//!
//! The manager mirrors the host's interface set: a periodic reconcile
//! cycle enumerates host interfaces, keeps the ones matching the
//! configured glob patterns open, reopens channels whose link went down,
//! and closes channels whose interface disappeared. Outgoing frames go
//! through [`InterfaceManager::send`]; received frames are pushed in by
//! the host adapter through [`InterfaceManager::ingress`] and fan out to
//! request listeners.
use core::cell::RefCell;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};

use crate::{
    error::{SendError, SubscribeError},
    gateway::frame_bus::{BusFrame, FrameBus, FrameListener},
    protocol::transport::{
        iface_name::IfaceName,
        raw_frame::RawFrame,
        traits::{
            can_host::{CanHost, CanTx},
            gw_timer::GwTimer,
        },
        DEFAULT_IFACE_CHECK_INTERVAL_MS, DEFAULT_IFACE_PATTERNS,
    },
};

pub mod pattern;
use pattern::PatternSet;

/// Error type of the transmit channel behind a host.
pub type TxError<H> = <<H as CanHost>::Tx as CanTx>::Error;

//==================================================================================STATE
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Lifecycle state of a managed interface.
pub enum InterfaceState {
    /// Channel open, waiting for the link to come up.
    Opening,
    /// Channel open and link up.
    Open,
    /// Channel reopened after a link loss, link still down.
    Reopening,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Snapshot of one managed interface.
pub struct InterfaceInfo {
    pub name: IfaceName,
    pub state: InterfaceState,
    pub rx_count: u32,
    pub tx_count: u32,
}

struct Slot<Tx> {
    name: IfaceName,
    tx: Tx,
    state: InterfaceState,
    rx_count: u32,
    tx_count: u32,
}

impl<Tx> Slot<Tx> {
    fn info(&self) -> InterfaceInfo {
        InterfaceInfo {
            name: self.name,
            state: self.state,
            rx_count: self.rx_count,
            tx_count: self.tx_count,
        }
    }
}

//==================================================================================MANAGER
/// Owner of the host seam, the open channels, and the frame fan-out.
pub struct InterfaceManager<H: CanHost, const MAX_IFACES: usize = 8> {
    host: Mutex<CriticalSectionRawMutex, RefCell<H>>,
    slots: Mutex<CriticalSectionRawMutex, RefCell<[Option<Slot<H::Tx>>; MAX_IFACES]>>,
    bus: FrameBus,
    patterns: PatternSet,
    check_interval_ms: u32,
}

impl<H: CanHost, const MAX_IFACES: usize> InterfaceManager<H, MAX_IFACES> {
    /// Manager with the default pattern set and reconcile interval.
    pub fn new(host: H) -> Self {
        Self::with_config(host, DEFAULT_IFACE_PATTERNS, DEFAULT_IFACE_CHECK_INTERVAL_MS)
    }

    /// Manager with explicit glob patterns and reconcile interval.
    pub fn with_config(host: H, patterns: &str, check_interval_ms: u32) -> Self {
        Self {
            host: Mutex::new(RefCell::new(host)),
            slots: Mutex::new(RefCell::new(core::array::from_fn(|_| None))),
            bus: FrameBus::new(),
            patterns: PatternSet::parse(patterns),
            check_interval_ms,
        }
    }

    //==============================================================================DATA_PATH
    /// Queue a frame on the named interface.
    pub fn send(&self, iface: &IfaceName, frame: &RawFrame) -> Result<(), SendError<TxError<H>>> {
        self.slots.lock(|slots| {
            let mut slots = slots.borrow_mut();
            let slot = slots
                .iter_mut()
                .flatten()
                .find(|slot| slot.name == *iface)
                .ok_or(SendError::InterfaceNotOpen)?;
            slot.tx.send(frame).map_err(SendError::Bus)?;
            slot.tx_count += 1;
            Ok(())
        })
    }

    /// Push a received frame into the engine. Frames from interfaces the
    /// manager does not hold open are dropped.
    pub fn ingress(&self, iface: &IfaceName, frame: RawFrame) {
        let known = self.slots.lock(|slots| {
            let mut slots = slots.borrow_mut();
            match slots.iter_mut().flatten().find(|slot| slot.name == *iface) {
                Some(slot) => {
                    slot.rx_count += 1;
                    true
                }
                None => false,
            }
        });
        if known {
            self.bus.publish(BusFrame {
                iface: *iface,
                frame,
            });
        } else {
            #[cfg(feature = "defmt")]
            defmt::warn!("Dropping frame from unmanaged interface {}", iface);
        }
    }

    /// Register a scoped listener on the received-frame fan-out.
    pub fn listen(&self) -> Result<FrameListener<'_>, SubscribeError> {
        self.bus.listen()
    }

    /// Number of currently registered frame listeners.
    pub fn listener_count(&self) -> usize {
        self.bus.listener_count()
    }

    /// Write a snapshot of all managed interfaces into `out`; returns how
    /// many were written.
    pub fn interfaces(&self, out: &mut [InterfaceInfo]) -> usize {
        self.slots.lock(|slots| {
            let slots = slots.borrow();
            let mut count = 0;
            for slot in slots.iter().flatten() {
                if count == out.len() {
                    break;
                }
                out[count] = slot.info();
                count += 1;
            }
            count
        })
    }

    //==============================================================================LIFECYCLE
    /// One reconcile cycle: enumerate, open new, reopen dead, close gone.
    ///
    /// Host and slot locks are never held together, so host callbacks may
    /// call back into the manager.
    pub fn reconcile(&self) {
        let mut present = [IfaceName::EMPTY; MAX_IFACES];
        let count = self
            .host
            .lock(|host| host.borrow_mut().interface_names(&mut present));

        let mut matched = [IfaceName::EMPTY; MAX_IFACES];
        let mut matched_len = 0;
        for name in &present[..count] {
            if self.patterns.matches(name) {
                matched[matched_len] = *name;
                matched_len += 1;
            }
        }
        let matched = &matched[..matched_len];

        self.close_disappeared(matched);

        for name in matched {
            let state = self.slot_state(name);
            let up = self.host.lock(|host| host.borrow_mut().link_up(name));
            match state {
                None => self.open_interface(name, up),
                Some(_) if !up => self.reopen_interface(name),
                Some(state) if state != InterfaceState::Open => {
                    // Link came back; the channel is already fresh.
                    self.set_state(name, InterfaceState::Open);
                    #[cfg(feature = "defmt")]
                    defmt::info!("Interface {} is up", name);
                }
                Some(_) => {}
            }
        }
    }

    /// Reconcile forever on the configured interval.
    pub async fn run(&self, mut timer: impl GwTimer) {
        self.reconcile();
        loop {
            timer.delay_ms(self.check_interval_ms).await;
            self.reconcile();
        }
    }

    fn close_disappeared(&self, matched: &[IfaceName]) {
        self.slots.lock(|slots| {
            for entry in slots.borrow_mut().iter_mut() {
                if let Some(slot) = entry {
                    if !matched.iter().any(|name| *name == slot.name) {
                        #[cfg(feature = "defmt")]
                        defmt::info!("Interface {} disappeared, closing", slot.name);
                        *entry = None;
                    }
                }
            }
        });
    }

    fn open_interface(&self, name: &IfaceName, link_up: bool) {
        match self.host.lock(|host| host.borrow_mut().open(name)) {
            Ok(tx) => {
                let state = if link_up {
                    InterfaceState::Open
                } else {
                    InterfaceState::Opening
                };
                #[cfg(feature = "defmt")]
                defmt::info!("Opened interface {}", name);
                self.insert_slot(Slot {
                    name: *name,
                    tx,
                    state,
                    rx_count: 0,
                    tx_count: 0,
                });
            }
            Err(_err) => {
                // Retried next cycle.
                #[cfg(feature = "defmt")]
                defmt::warn!("Failed to open interface {}: {:?}", name, defmt::Debug2Format(&_err));
            }
        }
    }

    /// Close and open again with counters reset. A failed reopen leaves no
    /// slot, same as a failed open.
    fn reopen_interface(&self, name: &IfaceName) {
        #[cfg(feature = "defmt")]
        defmt::warn!("Interface {} link is down, reopening", name);
        self.remove_slot(name);
        match self.host.lock(|host| host.borrow_mut().open(name)) {
            Ok(tx) => self.insert_slot(Slot {
                name: *name,
                tx,
                state: InterfaceState::Reopening,
                rx_count: 0,
                tx_count: 0,
            }),
            Err(_err) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Failed to reopen interface {}: {:?}", name, defmt::Debug2Format(&_err));
            }
        }
    }

    fn slot_state(&self, name: &IfaceName) -> Option<InterfaceState> {
        self.slots.lock(|slots| {
            slots
                .borrow()
                .iter()
                .flatten()
                .find(|slot| slot.name == *name)
                .map(|slot| slot.state)
        })
    }

    fn set_state(&self, name: &IfaceName, state: InterfaceState) {
        self.slots.lock(|slots| {
            if let Some(slot) = slots
                .borrow_mut()
                .iter_mut()
                .flatten()
                .find(|slot| slot.name == *name)
            {
                slot.state = state;
            }
        });
    }

    fn insert_slot(&self, slot: Slot<H::Tx>) {
        self.slots.lock(|slots| {
            let mut slots = slots.borrow_mut();
            if let Some(entry) = slots.iter_mut().find(|entry| entry.is_none()) {
                *entry = Some(slot);
            } else {
                #[cfg(feature = "defmt")]
                defmt::warn!("No free interface slot for {}", slot.name);
            }
        });
    }

    fn remove_slot(&self, name: &IfaceName) {
        self.slots.lock(|slots| {
            for entry in slots.borrow_mut().iter_mut() {
                if matches!(entry, Some(slot) if slot.name == *name) {
                    *entry = None;
                }
            }
        });
    }
}
