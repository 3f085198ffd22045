//! Unit tests for the action model and the action stream collector.
use super::*;
use crate::protocol::device::{
    addresses,
    frame::{CommControl, DataControl, DeviceFrame, OpByte},
    NO_PORT,
};
use crate::protocol::transport::package_id::PackageId;

fn config_frame(option: u8, payload: u32, wait: bool) -> DeviceFrame {
    let mut comm = CommControl::empty().with(CommControl::ACK);
    if wait {
        comm = comm.with(CommControl::WAIT);
    }
    DeviceFrame {
        id: PackageId::new(1, addresses::GET_CONFIG, 0x05),
        comm,
        data: DataControl::config(),
        op: OpByte::get(option),
        port: NO_PORT,
        payload,
    }
}

#[test]
/// Base payload packing and unpacking are inverse.
fn test_action_base_round_trip() {
    let action = Action {
        device: 0x12,
        trigger: ActionTrigger::Falling,
        mode: ActionMode::Doubleclick,
        kind: ActionKind::Toggle,
        ..Action::default()
    };
    assert_eq!(Action::from_base_payload(action.base_payload()), Some(action));
}

#[test]
/// The 0xFF device byte closes the list without producing a record.
fn test_action_base_sentinel() {
    assert_eq!(Action::from_base_payload(0xFF00_0000), None);
}

#[test]
/// Unknown enum values decode to their defined fallbacks.
fn test_enum_fallbacks() {
    assert_eq!(ActionTrigger::from_num(9), ActionTrigger::Disabled);
    assert_eq!(ActionMode::from_num(9), ActionMode::Click);
    assert_eq!(ActionKind::from_num(9), ActionKind::Low);
}

#[test]
/// A two-action stream with field frames assembles both records.
fn test_collector_two_actions() {
    let mut collector = ActionStreamCollector::new();
    let first = Action {
        device: 0x07,
        trigger: ActionTrigger::Rising,
        mode: ActionMode::Click,
        kind: ActionKind::High,
        ..Action::default()
    };
    let second = Action {
        device: 0x08,
        trigger: ActionTrigger::Falling,
        mode: ActionMode::Longpress,
        kind: ActionKind::Pwm,
        ..Action::default()
    };

    let frames = [
        config_frame(options::ACTION_BASE, first.base_payload(), true),
        config_frame(options::ACTION_PORTS, 0x0005, true),
        config_frame(options::ACTION_BASE, second.base_payload(), true),
        config_frame(options::ACTION_PORTS, 0x0100, true),
        config_frame(options::ACTION_LONGPRESS, 1500, true),
        config_frame(
            options::ACTION_SKIP_WHEN_DELAY,
            DelayTarget { device: 0x08, ports: 0x0100 }.to_payload(),
            true,
        ),
    ];
    for frame in &frames {
        assert_eq!(collector.process(frame), StreamResult::Consumed);
    }
    assert_eq!(
        collector.process(&config_frame(options::ACTIONS, 0, false)),
        StreamResult::Complete
    );

    let list = collector.into_list();
    assert_eq!(list.len(), 2);
    assert_eq!(list.as_slice()[0].device, 0x07);
    assert_eq!(list.as_slice()[0].ports, 0x0005);
    assert_eq!(list.as_slice()[1].longpress_ms, 1500);
    assert_eq!(
        list.as_slice()[1].skip_when_delay,
        Some(DelayTarget { device: 0x08, ports: 0x0100 })
    );
    assert_eq!(list.as_slice()[1].clear_delays, None);
}

#[test]
/// A sentinel terminator yields an empty list.
fn test_collector_empty_stream() {
    let mut collector = ActionStreamCollector::new();
    assert_eq!(
        collector.process(&config_frame(options::ACTION_BASE, 0xFF00_0000, false)),
        StreamResult::Complete
    );
    assert!(collector.into_list().is_empty());
}

#[test]
/// Field frames without a preceding base frame are dropped, and command
/// frames never enter the record.
fn test_collector_stray_frames() {
    let mut collector = ActionStreamCollector::new();
    assert_eq!(
        collector.process(&config_frame(options::ACTION_PORTS, 0x0001, true)),
        StreamResult::Consumed
    );

    let mut command = config_frame(options::ACTION_BASE, 0, true);
    command.data = DataControl::default();
    assert_eq!(collector.process(&command), StreamResult::Ignored);

    assert!(collector.into_list().is_empty());
}

#[test]
/// The list silently saturates at its capacity.
fn test_action_list_capacity() {
    let mut list = ActionList::new();
    for i in 0..MAX_ACTIONS_PER_PORT + 2 {
        list.push(Action {
            device: i as u8,
            ..Action::default()
        });
    }
    assert_eq!(list.len(), MAX_ACTIONS_PER_PORT);
    assert_eq!(list.as_slice().last().map(|a| a.device), Some(7));
}
