//! `tokio_util::codec` integration for [`FrameDecoder`].
//!
//! A `FramedRead` stream stops at the first error, so oversized frames are
//! dropped here instead of being reported. The blocking
//! [`FrameDecoder::decode_frame`] still returns [`FrameError::TooLongFrame`].

use bytes::{Bytes, BytesMut};
use tokio_util::codec::Decoder;

use crate::decoder::FrameDecoder;
use crate::error::FrameError;

impl Decoder for FrameDecoder {
    type Item = Bytes;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            match self.decode_frame(src) {
                Err(FrameError::TooLongFrame {
                    length,
                    max,
                    discarding,
                }) => {
                    tracing::debug!(length, max, discarding, "oversized frame skipped");
                }
                other => return other,
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None if src.is_empty() || self.is_discarding() => Ok(None),
            None => {
                tracing::debug!(buffered = src.len(), "stream closed with an incomplete frame");
                Err(FrameError::ConnectionClosed)
            }
        }
    }
}
