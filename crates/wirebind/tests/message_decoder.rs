use std::sync::Arc;

use bytes::{BufMut, BytesMut};
use wirebind::codec::{
    AdapterRegistry, CodecError, FieldSpec, RecordSchema, RegistryConfig, StringKind, WireType,
};
use wirebind::frame::{checksum::xor, FrameConfig, FrameError, Header};
use wirebind::{Error, MessageDecoder};

/// Meter report: header 0x68, 1-byte length, body, 1-byte XOR, tail 0x16.
#[derive(Debug, Default, Clone, PartialEq)]
struct Report {
    address: String,
    energy_wh: u32,
    voltage_dv: u16,
}

impl WireType for Report {}

fn registry() -> Arc<AdapterRegistry> {
    let mut builder = AdapterRegistry::builder();
    builder
        .register_record(
            RecordSchema::<Report>::new()
                .field(
                    "address",
                    FieldSpec::new().length(6).string_kind(StringKind::Bcd),
                    |r: &Report| &r.address,
                    |r, v| r.address = v,
                )
                .field(
                    "energy_wh",
                    FieldSpec::new().length(4),
                    |r: &Report| &r.energy_wh,
                    |r, v| r.energy_wh = v,
                )
                .field(
                    "voltage_dv",
                    FieldSpec::new().length(2).versions(2, u32::MAX),
                    |r: &Report| &r.voltage_dv,
                    |r, v| r.voltage_dv = v,
                ),
        )
        .unwrap();
    Arc::new(builder.build())
}

fn config() -> FrameConfig {
    FrameConfig {
        header: Header::One(0x68),
        length_field_offset: 1,
        length_field_length: 1,
        // XOR byte and tail follow the body.
        length_adjustment: 2,
        initial_bytes_to_strip: 2,
        max_frame_length: 64,
        ..FrameConfig::default()
    }
}

fn wire_frame(registry: &AdapterRegistry, report: &Report, version: u32) -> Vec<u8> {
    let body = registry.to_bytes(report, version).unwrap();
    let mut frame = vec![0x68, body.len() as u8];
    frame.extend_from_slice(&body);
    frame.push(xor(&body[..]));
    frame.push(0x16);
    frame
}

fn report() -> Report {
    Report {
        address: "000012345678".into(),
        energy_wh: 123_456,
        voltage_dv: 2301,
    }
}

#[test]
fn decodes_records_across_chunk_boundaries() {
    let registry = registry();
    let frame = wire_frame(&registry, &report(), 2);
    let mut decoder = MessageDecoder::<Report>::new(config(), Arc::clone(&registry), 2).unwrap();

    let mut src = BytesMut::new();
    src.put_slice(&[0x00, 0x11]);
    src.put_slice(&frame[..5]);
    assert_eq!(decoder.decode_message(&mut src).unwrap(), None);

    src.put_slice(&frame[5..]);
    src.put_slice(&frame);
    assert_eq!(decoder.decode_message(&mut src).unwrap(), Some(report()));
    assert_eq!(decoder.decode_message(&mut src).unwrap(), Some(report()));
    assert!(src.is_empty());
}

#[test]
fn version_drives_the_record_layout() {
    let registry = registry();
    let v1 = wire_frame(&registry, &report(), 1);
    assert_eq!(v1.len(), 2 + 10 + 2);

    let mut decoder = MessageDecoder::<Report>::new(config(), registry, 1).unwrap();
    let decoded = decoder
        .decode_message(&mut BytesMut::from(&v1[..]))
        .unwrap()
        .unwrap();
    assert_eq!(decoded.energy_wh, 123_456);
    assert_eq!(decoded.voltage_dv, 0);
}

#[test]
fn default_version_comes_from_registry_config() {
    let mut builder = wirebind::codec::RegistryBuilder::with_config(RegistryConfig {
        default_version: 7,
        ..RegistryConfig::default()
    });
    builder
        .register_record(RecordSchema::<Report>::new())
        .unwrap();
    let decoder =
        MessageDecoder::<Report>::with_default_version(config(), Arc::new(builder.build())).unwrap();
    assert_eq!(decoder.version(), 7);
}

#[test]
fn empty_frame_is_an_error() {
    let bare = FrameConfig {
        length_adjustment: 0,
        ..config()
    };
    let mut decoder = MessageDecoder::<Report>::new(bare, registry(), 1).unwrap();
    let mut src = BytesMut::from(&[0x68, 0x00][..]);
    assert!(matches!(decoder.decode_message(&mut src), Err(Error::EmptyMessage)));
    assert!(src.is_empty());
}

#[test]
fn invalid_framing_is_rejected_up_front() {
    let bad = FrameConfig {
        length_field_length: 5,
        ..config()
    };
    let err = MessageDecoder::<Report>::new(bad, registry(), 1).unwrap_err();
    assert!(matches!(err, Error::Frame(FrameError::UnsupportedLengthField(5))));
}

#[test]
fn oversized_frame_is_skipped() {
    let registry = registry();
    let mut decoder = MessageDecoder::<Report>::new(config(), Arc::clone(&registry), 2).unwrap();
    let mut src = BytesMut::from(&[0x68, 0xF0][..]);
    src.put_bytes(0xEE, 0xF2);
    src.put_slice(&wire_frame(&registry, &report(), 2));

    assert!(matches!(
        decoder.decode_message(&mut src),
        Err(Error::Frame(FrameError::TooLongFrame { .. }))
    ));
    assert_eq!(decoder.decode_message(&mut src).unwrap(), Some(report()));
}

#[test]
fn unregistered_record_reports_no_adapter() {
    #[derive(Default)]
    struct Unknown;
    impl WireType for Unknown {}

    let registry = Arc::new(AdapterRegistry::new());
    let mut decoder = MessageDecoder::<Unknown>::new(config(), registry, 1).unwrap();
    let mut src = BytesMut::from(&[0x68, 0x01, 0x2A, 0x2A, 0x16][..]);
    assert!(matches!(
        decoder.decode_message(&mut src),
        Err(Error::Codec(CodecError::NoAdapter { .. }))
    ));
}
