//! Typed device operation client.
//!
//! Every operation allocates a fresh sequence number, registers a frame
//! listener before the request leaves the bus, and correlates replies by
//! sequence, initiator pseudo-address, and responder. Operations against
//! a concrete device short-circuit on the first correlated reply;
//! broadcast operations collect replies for a grace window.
use crate::{
    error::RequestError,
    gateway::{
        correlator::{self, Verdict},
        interface_manager::{InterfaceManager, TxError},
    },
    protocol::{
        device::{
            addresses, commands,
            config::{ActionStreamCollector, PortConfig, NUM_INPUT_PORTS},
            delay::{Delay, DelayStreamCollector},
            frame::{CommControl, DataControl, DataType, DeviceFrame, Direction, OpByte, SignalKind},
            options, NO_PORT,
        },
        transport::{
            iface_name::IfaceName,
            package_id::{PackageId, SequenceCounter},
            traits::{can_host::CanHost, gw_timer::GwTimer},
            DEFAULT_CLEAR_DELAY_TIMEOUT_MS, DEFAULT_COMMAND_TIMEOUT_MS,
            DEFAULT_CONFIG_SINGLE_TIMEOUT_MS, DEFAULT_CONFIG_TOTAL_TIMEOUT_MS,
            DEFAULT_DISCOVER_TIMEOUT_MS, DEFAULT_EEPROM_TIMEOUT_MS, DEFAULT_GRACE_WINDOW_MS,
            DEFAULT_LIST_DELAYS_TIMEOUT_MS, DEFAULT_PING_TIMEOUT_MS,
        },
    },
};

//==================================================================================TIMEOUTS
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Per-operation deadlines in milliseconds.
pub struct Timeouts {
    /// Single port command acknowledgement.
    pub command_ms: u32,
    /// One step of a configuration exchange.
    pub config_single_ms: u32,
    /// Whole configuration exchange across all steps.
    pub config_total_ms: u32,
    /// Quiet window that closes a broadcast reply collection.
    pub grace_ms: u32,
    pub ping_ms: u32,
    pub discover_ms: u32,
    pub eeprom_ms: u32,
    pub list_delays_ms: u32,
    pub clear_delay_ms: u32,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            command_ms: DEFAULT_COMMAND_TIMEOUT_MS,
            config_single_ms: DEFAULT_CONFIG_SINGLE_TIMEOUT_MS,
            config_total_ms: DEFAULT_CONFIG_TOTAL_TIMEOUT_MS,
            grace_ms: DEFAULT_GRACE_WINDOW_MS,
            ping_ms: DEFAULT_PING_TIMEOUT_MS,
            discover_ms: DEFAULT_DISCOVER_TIMEOUT_MS,
            eeprom_ms: DEFAULT_EEPROM_TIMEOUT_MS,
            list_delays_ms: DEFAULT_LIST_DELAYS_TIMEOUT_MS,
            clear_delay_ms: DEFAULT_CLEAR_DELAY_TIMEOUT_MS,
        }
    }
}

//==================================================================================PORT_WRITE
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// One output port write, optionally layered with an auxiliary value and
/// a scheduling delay.
pub struct PortWrite {
    pub signal: SignalKind,
    pub data_type: DataType,
    pub port: u8,
    pub value: u32,
    /// Auxiliary payload (PWM ramp time and similar), sent as a sub-frame.
    pub extra: Option<u32>,
    /// Execute the write this many milliseconds in the future.
    pub delay_ms: Option<u32>,
}

//==================================================================================VERDICTS
fn unicast_verdict(request: PackageId, device: u8, expect_set: bool, reply: &DeviceFrame) -> Verdict {
    if reply.id.sequence() != request.sequence()
        || reply.id.initiator() != request.initiator()
        || reply.id.responder() != device
        || !reply.comm.is_ack()
    {
        return Verdict::Ignore;
    }
    if reply.comm.is_error() || reply.op.is_set() != expect_set {
        return Verdict::Error;
    }
    Verdict::Accept
}

/// Broadcast replies never reject the collection: a device answering with
/// the error flag is simply not counted.
fn broadcast_verdict(request: PackageId, reply: &DeviceFrame) -> Verdict {
    if reply.id.sequence() != request.sequence()
        || reply.id.initiator() != request.initiator()
        || reply.id.responder() == addresses::BROADCAST
        || !reply.comm.is_ack()
        || reply.comm.is_error()
    {
        return Verdict::Ignore;
    }
    Verdict::Accept
}

//==================================================================================CLIENT
/// Client for the full device operation set, bound to one manager.
pub struct DeviceClient<'a, H: CanHost, T: GwTimer, const MAX_IFACES: usize = 8> {
    manager: &'a InterfaceManager<H, MAX_IFACES>,
    timer: T,
    sequences: SequenceCounter,
    timeouts: Timeouts,
}

impl<'a, H: CanHost, T: GwTimer, const MAX_IFACES: usize> DeviceClient<'a, H, T, MAX_IFACES> {
    pub fn new(manager: &'a InterfaceManager<H, MAX_IFACES>, timer: T) -> Self {
        Self {
            manager,
            timer,
            sequences: SequenceCounter::new(),
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    //==============================================================================DISCOVERY
    /// Broadcast a discovery request and collect responder addresses
    /// until the bus stays quiet for the grace window, bounded by the
    /// discovery deadline. Returns how many were written to `out`.
    pub async fn discover(
        &mut self,
        iface: &IfaceName,
        out: &mut [u8],
    ) -> Result<usize, RequestError<TxError<H>>> {
        let request = DeviceFrame {
            id: self.next_id(addresses::DISCOVER, addresses::BROADCAST),
            comm: CommControl::empty().with(CommControl::DISCOVERY),
            data: DataControl::default(),
            op: OpByte::get(0),
            port: NO_PORT,
            payload: 0,
        };
        self.collect_addresses(iface, request, self.timeouts.discover_ms, out)
            .await
    }

    /// Ping one device; resolves on its acknowledgement.
    pub async fn ping(
        &mut self,
        iface: &IfaceName,
        device: u8,
    ) -> Result<(), RequestError<TxError<H>>> {
        let request = DeviceFrame {
            id: self.next_id(addresses::PING, device),
            comm: CommControl::empty().with(CommControl::PING),
            data: DataControl::default(),
            op: OpByte::get(0),
            port: NO_PORT,
            payload: 0,
        };
        self.request_ack(iface, request, self.timeouts.ping_ms)
            .await?;
        Ok(())
    }

    /// Ping the broadcast address and collect every responder, like
    /// [`discover`](Self::discover) but with the ping flag.
    pub async fn ping_all(
        &mut self,
        iface: &IfaceName,
        out: &mut [u8],
    ) -> Result<usize, RequestError<TxError<H>>> {
        let request = DeviceFrame {
            id: self.next_id(addresses::PING, addresses::BROADCAST),
            comm: CommControl::empty().with(CommControl::PING),
            data: DataControl::default(),
            op: OpByte::get(0),
            port: NO_PORT,
            payload: 0,
        };
        self.collect_addresses(iface, request, self.timeouts.ping_ms, out)
            .await
    }

    //==============================================================================PORTS
    /// Read one port value.
    pub async fn get_port(
        &mut self,
        iface: &IfaceName,
        device: u8,
        signal: SignalKind,
        direction: Direction,
        data_type: DataType,
        port: u8,
    ) -> Result<u32, RequestError<TxError<H>>> {
        let request = DeviceFrame {
            id: self.next_id(addresses::GET_PORT, device),
            comm: CommControl::empty(),
            data: DataControl::command(signal, direction, data_type),
            op: OpByte::get(commands::PORT),
            port,
            payload: 0,
        };
        let reply = self
            .request_ack(iface, request, self.timeouts.command_ms)
            .await?;
        Ok(reply.payload)
    }

    /// Write one output port. Auxiliary and delay values travel as
    /// WAIT-chained sub-frames of the same request before the device
    /// acknowledges the action as a whole.
    pub async fn set_port(
        &mut self,
        iface: &IfaceName,
        device: u8,
        write: &PortWrite,
    ) -> Result<(), RequestError<TxError<H>>> {
        let manager = self.manager;
        let id = self.next_id(addresses::SET_PORT, device);
        let data = DataControl::command(write.signal, Direction::Output, write.data_type);

        let mut frames = [DeviceFrame {
            id,
            comm: CommControl::empty(),
            data,
            op: OpByte::set(commands::PORT),
            port: write.port,
            payload: write.value,
        }; 3];
        let mut len = 1;
        if let Some(extra) = write.extra {
            frames[len].op = OpByte::set(commands::PORT_EXTRA);
            frames[len].payload = extra;
            len += 1;
        }
        if let Some(delay_ms) = write.delay_ms {
            frames[len].op = OpByte::set(commands::PORT_DELAY);
            frames[len].payload = delay_ms;
            len += 1;
        }
        // Every frame but the last announces a continuation.
        for frame in &mut frames[..len - 1] {
            frame.comm = frame.comm.with(CommControl::WAIT);
        }

        let mut listener = manager.listen()?;
        for frame in &frames[..len] {
            manager.send(iface, &frame.encode())?;
        }
        correlator::await_first(
            &mut listener,
            &mut self.timer,
            self.timeouts.command_ms,
            iface,
            |reply| unicast_verdict(id, device, true, reply),
        )
        .await?;
        Ok(())
    }

    //==============================================================================CONFIG
    /// Read the full configuration of every input port, in port order.
    /// Writes at most `out.len()` ports and returns how many.
    pub async fn get_config(
        &mut self,
        iface: &IfaceName,
        device: u8,
        out: &mut [PortConfig],
    ) -> Result<usize, RequestError<TxError<H>>> {
        let manager = self.manager;
        let started = self.timer.now_ms();
        let ports = out.len().min(NUM_INPUT_PORTS);

        for (port, config) in out.iter_mut().enumerate().take(ports) {
            let port = port as u8;
            *config = PortConfig::new(port);
            config.debounce_ms = self.get_option(iface, device, options::DEBOUNCE, port).await?;
            self.remaining_ms(started, self.timeouts.config_total_ms)?;
            config.doubleclick_ms = self
                .get_option(iface, device, options::DOUBLECLICK, port)
                .await?;
            self.remaining_ms(started, self.timeouts.config_total_ms)?;
            config.longpress_ms = self
                .get_option(iface, device, options::LONGPRESS, port)
                .await?;
            self.remaining_ms(started, self.timeouts.config_total_ms)?;
            config.bypass_instantly = self
                .get_option(iface, device, options::BYPASS_INSTANTLY, port)
                .await?
                != 0;
            self.remaining_ms(started, self.timeouts.config_total_ms)?;
            config.bypass_on_dip_switch = self
                .get_option(iface, device, options::BYPASS_ON_DIP_SWITCH, port)
                .await?
                != 0;
            self.remaining_ms(started, self.timeouts.config_total_ms)?;
            config.bypass_on_disconnect = self
                .get_option(iface, device, options::BYPASS_ON_DISCONNECT, port)
                .await?
                != 0;

            let remaining = self.remaining_ms(started, self.timeouts.config_total_ms)?;
            let id = self.next_id(addresses::GET_CONFIG, device);
            let request = DeviceFrame {
                id,
                comm: CommControl::empty(),
                data: DataControl::config(),
                op: OpByte::get(options::ACTIONS),
                port,
                payload: 0,
            };
            let mut collector = ActionStreamCollector::new();
            let mut listener = manager.listen()?;
            manager.send(iface, &request.encode())?;
            correlator::collect_stream(
                &mut listener,
                &mut self.timer,
                remaining,
                iface,
                |reply| unicast_verdict(id, device, false, reply),
                |reply| collector.process(reply),
            )
            .await?;
            config.actions = collector.into_list();

            self.remaining_ms(started, self.timeouts.config_total_ms)?;
        }
        Ok(ports)
    }

    /// Write the full configuration of the given input ports. Each step is
    /// acknowledged individually; the first failure aborts the remainder.
    pub async fn set_config(
        &mut self,
        iface: &IfaceName,
        device: u8,
        configs: &[PortConfig],
    ) -> Result<(), RequestError<TxError<H>>> {
        let started = self.timer.now_ms();

        for config in configs {
            let port = config.input_port;

            // Reset the stored list before streaming the replacement.
            self.set_option(iface, device, options::ACTIONS, port, 0)
                .await?;
            for action in config.actions.as_slice() {
                self.set_option(iface, device, options::ACTION_BASE, port, action.base_payload())
                    .await?;
                self.set_option(
                    iface,
                    device,
                    options::ACTION_PORTS,
                    port,
                    action.ports as u32,
                )
                .await?;
                if let Some(target) = action.skip_when_delay {
                    self.set_option(
                        iface,
                        device,
                        options::ACTION_SKIP_WHEN_DELAY,
                        port,
                        target.to_payload(),
                    )
                    .await?;
                }
                if let Some(target) = action.clear_delays {
                    self.set_option(
                        iface,
                        device,
                        options::ACTION_CLEAR_DELAYS,
                        port,
                        target.to_payload(),
                    )
                    .await?;
                }
                if action.delay_ms > 0 {
                    self.set_option(iface, device, options::ACTION_DELAY, port, action.delay_ms)
                        .await?;
                }
                if action.longpress_ms > 0 {
                    self.set_option(
                        iface,
                        device,
                        options::ACTION_LONGPRESS,
                        port,
                        action.longpress_ms,
                    )
                    .await?;
                }
                self.remaining_ms(started, self.timeouts.config_total_ms)?;
            }

            self.set_option(iface, device, options::DEBOUNCE, port, config.debounce_ms)
                .await?;
            self.set_option(iface, device, options::DOUBLECLICK, port, config.doubleclick_ms)
                .await?;
            self.set_option(iface, device, options::LONGPRESS, port, config.longpress_ms)
                .await?;
            self.set_option(
                iface,
                device,
                options::BYPASS_INSTANTLY,
                port,
                config.bypass_instantly as u32,
            )
            .await?;
            self.set_option(
                iface,
                device,
                options::BYPASS_ON_DIP_SWITCH,
                port,
                config.bypass_on_dip_switch as u32,
            )
            .await?;
            self.set_option(
                iface,
                device,
                options::BYPASS_ON_DISCONNECT,
                port,
                config.bypass_on_disconnect as u32,
            )
            .await?;

            self.remaining_ms(started, self.timeouts.config_total_ms)?;
        }
        Ok(())
    }

    /// Ask the device to persist its running configuration.
    pub async fn write_eeprom(
        &mut self,
        iface: &IfaceName,
        device: u8,
    ) -> Result<(), RequestError<TxError<H>>> {
        let request = DeviceFrame {
            id: self.next_id(addresses::WRITE_EEPROM, device),
            comm: CommControl::empty(),
            data: DataControl::config(),
            op: OpByte::set(options::WRITE_EEPROM),
            port: NO_PORT,
            payload: 0,
        };
        self.request_ack(iface, request, self.timeouts.eeprom_ms)
            .await?;
        Ok(())
    }

    //==============================================================================DELAYS
    /// List the pending scheduled delays of a device. Returns how many
    /// were written to `out`.
    pub async fn list_delays(
        &mut self,
        iface: &IfaceName,
        device: u8,
        out: &mut [Delay],
    ) -> Result<usize, RequestError<TxError<H>>> {
        let manager = self.manager;
        let id = self.next_id(addresses::LIST_DELAYS, device);
        let request = DeviceFrame {
            id,
            comm: CommControl::empty(),
            data: DataControl::default(),
            op: OpByte::get(0),
            port: NO_PORT,
            payload: 0,
        };
        let mut collector = DelayStreamCollector::new();
        let mut listener = manager.listen()?;
        manager.send(iface, &request.encode())?;
        correlator::collect_stream(
            &mut listener,
            &mut self.timer,
            self.timeouts.list_delays_ms,
            iface,
            |reply| unicast_verdict(id, device, false, reply),
            |reply| collector.process(reply),
        )
        .await?;

        let list = collector.into_list();
        let count = list.len().min(out.len());
        out[..count].copy_from_slice(&list.as_slice()[..count]);
        Ok(count)
    }

    /// Cancel one pending delay by its identifier.
    pub async fn clear_delay_by_id(
        &mut self,
        iface: &IfaceName,
        device: u8,
        delay_id: u32,
    ) -> Result<(), RequestError<TxError<H>>> {
        let request = DeviceFrame {
            id: self.next_id(addresses::CLEAR_DELAY, device),
            comm: CommControl::empty(),
            data: DataControl::default(),
            op: OpByte::set(commands::CLEAR_BY_ID),
            port: NO_PORT,
            payload: delay_id,
        };
        self.request_ack(iface, request, self.timeouts.clear_delay_ms)
            .await?;
        Ok(())
    }

    /// Cancel every pending delay bound to an output port.
    pub async fn clear_delay_by_port(
        &mut self,
        iface: &IfaceName,
        device: u8,
        port: u8,
    ) -> Result<(), RequestError<TxError<H>>> {
        let request = DeviceFrame {
            id: self.next_id(addresses::CLEAR_DELAY, device),
            comm: CommControl::empty(),
            data: DataControl::default(),
            op: OpByte::set(commands::CLEAR_BY_PORT),
            port,
            payload: 0,
        };
        self.request_ack(iface, request, self.timeouts.clear_delay_ms)
            .await?;
        Ok(())
    }

    //==============================================================================INTERNALS
    fn next_id(&self, initiator: u8, responder: u8) -> PackageId {
        PackageId::new(self.sequences.next(), initiator, responder)
    }

    /// Milliseconds left of an aggregate deadline, or [`RequestError::Timeout`].
    fn remaining_ms(&self, started: u64, total_ms: u32) -> Result<u32, RequestError<TxError<H>>> {
        let elapsed = self.timer.now_ms().saturating_sub(started);
        let remaining = (total_ms as u64).saturating_sub(elapsed);
        if remaining == 0 {
            return Err(RequestError::Timeout);
        }
        Ok(remaining as u32)
    }

    /// Subscribe, send, and wait for the single correlated acknowledgement.
    async fn request_ack(
        &mut self,
        iface: &IfaceName,
        request: DeviceFrame,
        timeout_ms: u32,
    ) -> Result<DeviceFrame, RequestError<TxError<H>>> {
        let manager = self.manager;
        let mut listener = manager.listen()?;
        manager.send(iface, &request.encode())?;
        let reply = correlator::await_first(
            &mut listener,
            &mut self.timer,
            timeout_ms,
            iface,
            |reply| {
                unicast_verdict(request.id, request.id.responder(), request.op.is_set(), reply)
            },
        )
        .await?;
        Ok(reply)
    }

    /// Subscribe, send, and collect broadcast responder addresses until
    /// the quiet grace window closes, `total_ms` runs out, or `out`
    /// fills up.
    async fn collect_addresses(
        &mut self,
        iface: &IfaceName,
        request: DeviceFrame,
        total_ms: u32,
        out: &mut [u8],
    ) -> Result<usize, RequestError<TxError<H>>> {
        let manager = self.manager;
        let grace_ms = self.timeouts.grace_ms;
        let mut listener = manager.listen()?;
        manager.send(iface, &request.encode())?;

        let mut count = 0;
        correlator::collect_until(
            &mut listener,
            &mut self.timer,
            total_ms,
            grace_ms,
            iface,
            |reply| broadcast_verdict(request.id, reply),
            |reply| {
                let address = reply.id.responder();
                if count < out.len() && !out[..count].contains(&address) {
                    out[count] = address;
                    count += 1;
                }
                count == out.len()
            },
        )
        .await?;
        Ok(count)
    }

    async fn get_option(
        &mut self,
        iface: &IfaceName,
        device: u8,
        option: u8,
        port: u8,
    ) -> Result<u32, RequestError<TxError<H>>> {
        let request = DeviceFrame {
            id: self.next_id(addresses::GET_CONFIG, device),
            comm: CommControl::empty(),
            data: DataControl::config(),
            op: OpByte::get(option),
            port,
            payload: 0,
        };
        let reply = self
            .request_ack(iface, request, self.timeouts.config_single_ms)
            .await?;
        Ok(reply.payload)
    }

    async fn set_option(
        &mut self,
        iface: &IfaceName,
        device: u8,
        option: u8,
        port: u8,
        payload: u32,
    ) -> Result<(), RequestError<TxError<H>>> {
        let request = DeviceFrame {
            id: self.next_id(addresses::SET_CONFIG, device),
            comm: CommControl::empty(),
            data: DataControl::config(),
            op: OpByte::set(option),
            port,
            payload,
        };
        self.request_ack(iface, request, self.timeouts.config_single_ms)
            .await?;
        Ok(())
    }
}
