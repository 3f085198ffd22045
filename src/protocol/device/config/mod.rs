//! Per-port configuration model and the collector that assembles an action
//! list from a config frame stream.
//!
//! A device streams its action list as WAIT-flagged config frames, one
//! field per frame, closed by a WAIT-cleared terminator. The collector
//! mirrors that: feed it every accepted frame in arrival order and it
//! builds the list incrementally.
use crate::protocol::device::{frame::DeviceFrame, options, StreamResult, ACTION_SENTINEL};

/// Number of input ports a device exposes.
pub const NUM_INPUT_PORTS: usize = 16;

/// Maximum actions attachable to one input port.
pub const MAX_ACTIONS_PER_PORT: usize = 8;

//==================================================================================ENUMS
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Input edge that fires an action.
pub enum ActionTrigger {
    #[default]
    Disabled = 0,
    Rising = 1,
    Falling = 2,
}

impl ActionTrigger {
    /// Total conversion; unknown values disable the action.
    pub fn from_num(num: u8) -> Self {
        match num {
            1 => Self::Rising,
            2 => Self::Falling,
            _ => Self::Disabled,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Press pattern that qualifies the trigger.
pub enum ActionMode {
    #[default]
    Click = 0,
    Longpress = 1,
    Doubleclick = 2,
}

impl ActionMode {
    /// Total conversion; unknown values fall back to a plain click.
    pub fn from_num(num: u8) -> Self {
        match num {
            1 => Self::Longpress,
            2 => Self::Doubleclick,
            _ => Self::Click,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// What the action does to its target ports.
pub enum ActionKind {
    #[default]
    Low = 0,
    High = 1,
    Toggle = 2,
    Pwm = 3,
}

impl ActionKind {
    /// Total conversion; unknown values fall back to driving low.
    pub fn from_num(num: u8) -> Self {
        match num {
            1 => Self::High,
            2 => Self::Toggle,
            3 => Self::Pwm,
            _ => Self::Low,
        }
    }
}

//==================================================================================ACTION
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Device and port set referenced by a delay guard.
pub struct DelayTarget {
    pub device: u8,
    /// Bitmask of output ports, bit N = port N.
    pub ports: u16,
}

impl DelayTarget {
    /// Payload encoding used by the skip/clear-delay config frames.
    pub fn to_payload(&self) -> u32 {
        (self.device as u32) << 16 | self.ports as u32
    }

    pub fn from_payload(payload: u32) -> Self {
        Self {
            device: (payload >> 16) as u8,
            ports: payload as u16,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// One configured input action.
pub struct Action {
    /// Target device driven by the action.
    pub device: u8,
    pub trigger: ActionTrigger,
    pub mode: ActionMode,
    pub kind: ActionKind,
    /// Bitmask of target output ports.
    pub ports: u16,
    /// Skip the action while one of these ports has a pending delay.
    pub skip_when_delay: Option<DelayTarget>,
    /// Clear pending delays on these ports before acting.
    pub clear_delays: Option<DelayTarget>,
    /// Schedule the action this far in the future instead of acting now.
    pub delay_ms: u32,
    /// Hold time for [`ActionMode::Longpress`].
    pub longpress_ms: u32,
}

impl Action {
    /// Base-frame payload carrying the four scalar fields.
    pub fn base_payload(&self) -> u32 {
        (self.device as u32) << 24
            | (self.trigger as u32) << 16
            | (self.mode as u32) << 8
            | self.kind as u32
    }

    /// Decode a base-frame payload. `None` for the end-of-list sentinel.
    pub fn from_base_payload(payload: u32) -> Option<Self> {
        let device = (payload >> 24) as u8;
        if device == ACTION_SENTINEL {
            return None;
        }
        Some(Self {
            device,
            trigger: ActionTrigger::from_num((payload >> 16) as u8),
            mode: ActionMode::from_num((payload >> 8) as u8),
            kind: ActionKind::from_num(payload as u8),
            ..Self::default()
        })
    }
}

//==================================================================================ACTION_LIST
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Inline action list, at most [`MAX_ACTIONS_PER_PORT`] entries.
pub struct ActionList {
    actions: [Action; MAX_ACTIONS_PER_PORT],
    len: usize,
}

impl ActionList {
    pub const fn new() -> Self {
        Self {
            actions: [Action {
                device: 0,
                trigger: ActionTrigger::Disabled,
                mode: ActionMode::Click,
                kind: ActionKind::Low,
                ports: 0,
                skip_when_delay: None,
                clear_delays: None,
                delay_ms: 0,
                longpress_ms: 0,
            }; MAX_ACTIONS_PER_PORT],
            len: 0,
        }
    }

    /// Append an action; silently drops when full.
    pub fn push(&mut self, action: Action) {
        if self.len < MAX_ACTIONS_PER_PORT {
            self.actions[self.len] = action;
            self.len += 1;
        }
    }

    pub fn as_slice(&self) -> &[Action] {
        &self.actions[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    fn last_mut(&mut self) -> Option<&mut Action> {
        self.actions[..self.len].last_mut()
    }
}

//==================================================================================PORT_CONFIG
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Full configuration of one input port.
pub struct PortConfig {
    pub input_port: u8,
    pub debounce_ms: u32,
    pub doubleclick_ms: u32,
    pub longpress_ms: u32,
    pub bypass_instantly: bool,
    pub bypass_on_dip_switch: bool,
    pub bypass_on_disconnect: bool,
    pub actions: ActionList,
}

impl PortConfig {
    pub const fn new(input_port: u8) -> Self {
        Self {
            input_port,
            debounce_ms: 0,
            doubleclick_ms: 0,
            longpress_ms: 0,
            bypass_instantly: false,
            bypass_on_dip_switch: false,
            bypass_on_disconnect: false,
            actions: ActionList::new(),
        }
    }
}

impl Default for PortConfig {
    fn default() -> Self {
        Self::new(0)
    }
}

//==================================================================================COLLECTOR
#[derive(Debug, Default)]
/// Assembles an [`ActionList`] from a stream of config acknowledgement
/// frames. Field frames that arrive before any base frame are ignored.
pub struct ActionStreamCollector {
    list: ActionList,
}

impl ActionStreamCollector {
    pub const fn new() -> Self {
        Self {
            list: ActionList::new(),
        }
    }

    /// Feed one accepted frame. [`StreamResult::Complete`] when the
    /// WAIT-cleared terminator arrives.
    pub fn process(&mut self, frame: &DeviceFrame) -> StreamResult {
        if !frame.data.is_config() {
            return StreamResult::Ignored;
        }
        match frame.op.option() {
            options::ACTION_BASE => {
                if let Some(action) = Action::from_base_payload(frame.payload) {
                    self.list.push(action);
                }
            }
            options::ACTION_PORTS => {
                if let Some(action) = self.list.last_mut() {
                    action.ports = frame.payload as u16;
                }
            }
            options::ACTION_SKIP_WHEN_DELAY => {
                if let Some(action) = self.list.last_mut() {
                    action.skip_when_delay = Some(DelayTarget::from_payload(frame.payload));
                }
            }
            options::ACTION_CLEAR_DELAYS => {
                if let Some(action) = self.list.last_mut() {
                    action.clear_delays = Some(DelayTarget::from_payload(frame.payload));
                }
            }
            options::ACTION_DELAY => {
                if let Some(action) = self.list.last_mut() {
                    action.delay_ms = frame.payload;
                }
            }
            options::ACTION_LONGPRESS => {
                if let Some(action) = self.list.last_mut() {
                    action.longpress_ms = frame.payload;
                }
            }
            options::ACTIONS => {}
            _ => return StreamResult::Ignored,
        }
        if frame.comm.is_wait() {
            StreamResult::Consumed
        } else {
            StreamResult::Complete
        }
    }

    /// The list assembled so far.
    pub fn into_list(self) -> ActionList {
        self.list
    }
}

//==================================================================================TESTS
#[cfg(test)]
#[path = "tests.rs"]
mod tests;
