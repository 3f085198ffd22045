//! Unit tests for the logical frame codec and the port mask helpers.
use super::*;
use crate::protocol::device::{addresses, options};

//==================================================================================CODEC
#[test]
/// Encoding then decoding returns the original frame for a config request.
fn test_codec_round_trip_config() {
    let frame = DeviceFrame {
        id: PackageId::new(0x0123, addresses::GET_CONFIG, 0x05),
        comm: CommControl::empty().with(CommControl::ACK).with(CommControl::WAIT),
        data: DataControl::config(),
        op: OpByte::get(options::ACTION_BASE),
        port: 3,
        payload: 0x05_01_00_02,
    };
    assert_eq!(DeviceFrame::decode(&frame.encode()), frame);
}

#[test]
/// Encoding then decoding returns the original frame for a port command.
fn test_codec_round_trip_command() {
    let frame = DeviceFrame {
        id: PackageId::new(0x1FFF, addresses::SET_PORT, 0xFF),
        comm: CommControl::empty(),
        data: DataControl::command(SignalKind::Analog, Direction::Output, DataType::Int),
        op: OpByte::set(super::super::commands::PORT),
        port: 15,
        payload: 0xDEAD_BEEF,
    };
    let raw = frame.encode();
    assert!(raw.ext);
    assert_eq!(raw.len, 8);
    assert_eq!(DeviceFrame::decode(&raw), frame);
}

#[test]
/// The payload travels most-significant byte first.
fn test_payload_big_endian() {
    let frame = DeviceFrame {
        id: PackageId::new(0, addresses::GET_PORT, 1),
        comm: CommControl::empty(),
        data: DataControl::command(SignalKind::Digital, Direction::Input, DataType::Bit),
        op: OpByte::get(0),
        port: 0,
        payload: 0x0102_0304,
    };
    let raw = frame.encode();
    assert_eq!(&raw.data[4..], &[0x01, 0x02, 0x03, 0x04]);
}

#[test]
/// Decoding is total: a short frame reads its missing bytes as zero.
fn test_decode_short_frame() {
    let mut raw = RawFrame::extended(0x0001_F305, [0; 8]);
    raw.data[0] = CommControl::PING;
    raw.len = 2;

    let frame = DeviceFrame::decode(&raw);
    assert!(frame.comm.is_ping());
    assert_eq!(frame.port, 0);
    assert_eq!(frame.payload, 0);
}

#[test]
/// Every flag accessor reflects exactly its own bit.
fn test_comm_control_flags() {
    let comm = CommControl(CommControl::DISCOVERY | CommControl::ERROR);
    assert!(comm.is_discovery());
    assert!(comm.is_error());
    assert!(!comm.is_ping());
    assert!(!comm.is_ack());
    assert!(!comm.is_wait());
    assert!(!comm.is_notify());
}

#[test]
/// Data-control builders and accessors agree on every field.
fn test_data_control_fields() {
    let ctrl = DataControl::command(SignalKind::Analog, Direction::Input, DataType::Float);
    assert!(!ctrl.is_config());
    assert_eq!(ctrl.signal(), SignalKind::Analog);
    assert_eq!(ctrl.direction(), Direction::Input);
    assert_eq!(ctrl.data_type(), DataType::Float);

    assert!(DataControl::config().is_config());
    assert_eq!(DataControl::config().signal(), SignalKind::Digital);
}

#[test]
/// The set discriminator lives in bit 7 and options stay seven bits wide.
fn test_op_byte() {
    let get = OpByte::get(options::DEBOUNCE);
    let set = OpByte::set(options::DEBOUNCE);
    assert!(!get.is_set());
    assert!(set.is_set());
    assert_eq!(get.option(), set.option());
    // An option with the top bit set must not leak into the discriminator.
    assert!(!OpByte::get(0xFF).is_set());
}

//==================================================================================PORT_MASKS
#[test]
/// Mask expansion reverses mask construction for arbitrary subsets.
fn test_mask_round_trip() {
    let subsets: [&[u8]; 4] = [&[], &[0], &[0, 7, 15], &[1, 2, 3, 4, 5]];
    for ports in subsets {
        let mask = ports_to_mask(ports);
        let mut out = [0; MAX_PORTS];
        let count = mask_to_ports(mask, &mut out);
        assert_eq!(&out[..count], ports);
    }
}

#[test]
/// The full mask expands to all sixteen ports in ascending order.
fn test_full_mask() {
    let mut out = [0; MAX_PORTS];
    let count = mask_to_ports(0xFFFF, &mut out);
    assert_eq!(count, MAX_PORTS);
    for (i, port) in out.iter().enumerate() {
        assert_eq!(*port as usize, i);
    }
}
