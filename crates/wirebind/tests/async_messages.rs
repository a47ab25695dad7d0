use std::sync::Arc;

use futures_util::StreamExt;
use tokio_util::codec::FramedRead;
use wirebind::codec::{AdapterRegistry, FieldSpec, RecordSchema, WireType};
use wirebind::frame::{FrameConfig, FrameError, Header};
use wirebind::{Error, MessageDecoder};

#[derive(Debug, Default, PartialEq)]
struct Heartbeat {
    node: u8,
    uptime_s: u32,
}

impl WireType for Heartbeat {}

fn decoder() -> MessageDecoder<Heartbeat> {
    decoder_with_max(FrameConfig::default().max_frame_length)
}

fn decoder_with_max(max_frame_length: usize) -> MessageDecoder<Heartbeat> {
    let mut builder = AdapterRegistry::builder();
    builder
        .register_record(
            RecordSchema::<Heartbeat>::new()
                .field("node", FieldSpec::new(), |h: &Heartbeat| &h.node, |h, v| h.node = v)
                .field(
                    "uptime_s",
                    FieldSpec::new().length(4).big_endian(),
                    |h: &Heartbeat| &h.uptime_s,
                    |h, v| h.uptime_s = v,
                ),
        )
        .unwrap();
    let config = FrameConfig {
        header: Header::Two(0xAA55),
        length_field_offset: 2,
        length_field_length: 1,
        initial_bytes_to_strip: 3,
        max_frame_length,
        ..FrameConfig::default()
    };
    MessageDecoder::new(config, Arc::new(builder.build()), 1).unwrap()
}

#[tokio::test]
async fn framed_read_yields_records() {
    let stream: &[u8] = &[
        0x00, 0xAA, 0x55, 0x05, 0x01, 0x00, 0x00, 0x01, 0x00, // node 1, 256 s
        0xAA, 0x55, 0x05, 0x02, 0x00, 0x00, 0x00, 0x3C, // node 2, 60 s
    ];
    let mut framed = FramedRead::new(stream, decoder());

    let first = framed.next().await.unwrap().unwrap();
    assert_eq!(first, Heartbeat { node: 1, uptime_s: 256 });
    let second = framed.next().await.unwrap().unwrap();
    assert_eq!(second, Heartbeat { node: 2, uptime_s: 60 });
    assert!(framed.next().await.is_none());
}

#[tokio::test]
async fn oversized_frame_does_not_end_the_stream() {
    let mut stream = vec![0xAA, 0x55, 0xF0];
    stream.extend_from_slice(&[0x11; 0xF0]);
    stream.extend_from_slice(&[0xAA, 0x55, 0x05, 0x03, 0x00, 0x00, 0x00, 0x0A]);

    let mut framed = FramedRead::new(stream.as_slice(), decoder_with_max(64));

    let record = framed.next().await.unwrap().unwrap();
    assert_eq!(record, Heartbeat { node: 3, uptime_s: 10 });
    assert!(framed.next().await.is_none());
}

#[tokio::test]
async fn truncated_stream_reports_connection_closed() {
    let stream: &[u8] = &[0xAA, 0x55, 0x05, 0x01, 0x00];
    let mut framed = FramedRead::new(stream, decoder());

    let err = framed.next().await.unwrap().unwrap_err();
    assert!(matches!(err, Error::Frame(FrameError::ConnectionClosed)));
}
