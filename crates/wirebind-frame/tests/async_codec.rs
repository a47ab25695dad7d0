use bytes::BytesMut;
use futures_util::StreamExt;
use tokio_util::codec::{Decoder, FramedRead};
use wirebind_frame::{FrameConfig, FrameDecoder, FrameError, Header};

fn sync_word_config() -> FrameConfig {
    // 0xAA55 | len (2B BE) | payload | crc (2B)
    FrameConfig {
        header: Header::Two(0xAA55),
        length_field_offset: 2,
        length_field_length: 2,
        length_adjustment: 2,
        initial_bytes_to_strip: 4,
        max_frame_length: 64,
        ..FrameConfig::default()
    }
}

fn frame(payload: &[u8]) -> Vec<u8> {
    let mut wire = vec![0xAA, 0x55];
    wire.extend_from_slice(&(payload.len() as u16).to_be_bytes());
    wire.extend_from_slice(payload);
    wire.extend_from_slice(&wirebind_frame::checksum::modbus_crc16(payload).to_le_bytes());
    wire
}

#[tokio::test]
async fn framed_read_yields_stripped_frames() {
    let mut wire = vec![0x00];
    wire.extend(frame(b"alpha"));
    wire.extend(frame(b"beta"));

    let decoder = FrameDecoder::new(sync_word_config()).unwrap();
    let mut framed = FramedRead::new(wire.as_slice(), decoder);

    let first = framed.next().await.unwrap().unwrap();
    let second = framed.next().await.unwrap().unwrap();
    assert_eq!(&first[..5], b"alpha");
    assert_eq!(first.len(), 7);
    assert_eq!(&second[..4], b"beta");
    assert!(framed.next().await.is_none());
}

#[tokio::test]
async fn framed_read_skips_oversized_frames() {
    let mut wire = frame(b"alpha");
    wire.extend(frame(&[0x11; 100]));
    wire.extend(frame(b"ok"));

    let decoder = FrameDecoder::new(sync_word_config()).unwrap();
    let mut framed = FramedRead::new(wire.as_slice(), decoder);

    let first = framed.next().await.unwrap().unwrap();
    let second = framed.next().await.unwrap().unwrap();
    assert_eq!(&first[..5], b"alpha");
    assert_eq!(&second[..2], b"ok");
    assert!(framed.next().await.is_none());
}

#[tokio::test]
async fn framed_read_continues_after_length_only_oversize() {
    let config = FrameConfig {
        length_field_length: 1,
        max_frame_length: 4,
        ..FrameConfig::default()
    };
    let wire: &[u8] = &[0x05, 1, 2, 3, 4, 5, 0x01, 0xEE];
    let mut framed = FramedRead::new(wire, FrameDecoder::new(config).unwrap());

    let frame = framed.next().await.unwrap().unwrap();
    assert_eq!(frame.as_ref(), &[0x01, 0xEE]);
    assert!(framed.next().await.is_none());
}

#[test]
fn split_oversized_frame_is_discarded_across_reads() {
    let oversized = frame(&[0x11; 100]);
    let mut decoder = FrameDecoder::new(sync_word_config()).unwrap();

    let mut buf = BytesMut::from(&oversized[..40]);
    assert!(decoder.decode(&mut buf).unwrap().is_none());
    assert!(buf.is_empty());
    assert!(decoder.is_discarding());

    buf.extend_from_slice(&oversized[40..]);
    buf.extend_from_slice(&frame(b"ok"));
    let frame = decoder.decode(&mut buf).unwrap().unwrap();
    assert_eq!(&frame[..2], b"ok");
    assert!(!decoder.is_discarding());
}

#[test]
fn blocking_decode_still_reports_oversized_frames() {
    let oversized = frame(&[0x11; 100]);
    let mut decoder = FrameDecoder::new(sync_word_config()).unwrap();

    let mut buf = BytesMut::from(&oversized[..40]);
    let err = decoder.decode_frame(&mut buf).unwrap_err();
    assert!(matches!(
        err,
        FrameError::TooLongFrame {
            length: 106,
            discarding: true,
            ..
        }
    ));
}

#[tokio::test]
async fn truncated_stream_reports_connection_closed() {
    let mut wire = frame(b"truncated");
    wire.truncate(8);

    let decoder = FrameDecoder::new(sync_word_config()).unwrap();
    let mut framed = FramedRead::new(wire.as_slice(), decoder);

    let err = framed.next().await.unwrap().unwrap_err();
    assert!(matches!(err, FrameError::ConnectionClosed));
}
