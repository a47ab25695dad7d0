use bytes::{Buf, Bytes, BytesMut};

use crate::config::FrameConfig;
use crate::error::{FrameError, Result};
use crate::order::ByteOrder;

/// Splits a byte stream into frames delimited by a length field.
///
/// One decoder binds to one ordered stream: it keeps discard state between
/// calls and must not be shared by independent streams.
///
/// Frame layout:
/// ```text
/// ┌──────────────┬─────────┬──────────────┬──────────────────────────────┐
/// │ Header (0-2B)│ ...     │ Length field │ length + adjustment bytes    │
/// │ (optional)   │         │ (1/2/3/4/8B) │                              │
/// └──────────────┴─────────┴──────────────┴──────────────────────────────┘
/// |<---- length_field_offset ---->|
/// ```
#[derive(Debug)]
pub struct FrameDecoder {
    config: FrameConfig,
    length_field_end_offset: usize,
    discarding_too_long_frame: bool,
    too_long_frame_length: u64,
    bytes_to_discard: u64,
}

impl FrameDecoder {
    /// Create a decoder, rejecting configurations that can never frame.
    pub fn new(config: FrameConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: FrameConfig) -> Self {
        Self {
            length_field_end_offset: config.length_field_end_offset(),
            config,
            discarding_too_long_frame: false,
            too_long_frame_length: 0,
            bytes_to_discard: 0,
        }
    }

    /// Decode the next frame from `src`.
    ///
    /// Returns `Ok(None)` when more input is needed. On success the whole
    /// frame is consumed from `src` and the emitted buffer holds the frame
    /// minus `initial_bytes_to_strip` leading bytes.
    pub fn decode_frame(&mut self, src: &mut BytesMut) -> Result<Option<Bytes>> {
        if self.discarding_too_long_frame {
            self.discard_too_long_frame(src)?;
            if self.discarding_too_long_frame {
                return Ok(None);
            }
        }

        if self.config.header.width() > 0 && !self.find_header(src) {
            return Ok(None);
        }

        if src.len() < self.length_field_end_offset {
            return Ok(None);
        }

        let end = self.length_field_end_offset;
        let raw_length = read_length_field(
            &src[self.config.length_field_offset..end],
            self.config.length_field_length,
            self.config.byte_order,
        )?;

        if raw_length < 0 {
            src.advance(end);
            return Err(FrameError::CorruptedFrame(format!(
                "negative pre-adjustment length field: {raw_length}"
            )));
        }

        let frame_length =
            raw_length as i128 + self.config.length_adjustment as i128 + end as i128;

        if frame_length < end as i128 {
            src.advance(end);
            return Err(FrameError::CorruptedFrame(format!(
                "adjusted frame length ({frame_length}) is less than length field end offset: {end}"
            )));
        }

        if frame_length > self.config.max_frame_length as i128 {
            let frame_length = u64::try_from(frame_length).unwrap_or(u64::MAX);
            self.exceeded_frame_length(src, frame_length)?;
            return Ok(None);
        }

        // Never truncates: bounded by max_frame_length above.
        let frame_length = frame_length as usize;
        if src.len() < frame_length {
            return Ok(None);
        }

        let strip = self.config.initial_bytes_to_strip;
        if strip > frame_length {
            src.advance(frame_length);
            return Err(FrameError::CorruptedFrame(format!(
                "adjusted frame length ({frame_length}) is less than initial bytes to strip: {strip}"
            )));
        }

        src.advance(strip);
        let frame = src.split_to(frame_length - strip).freeze();
        tracing::trace!(frame_length, emitted = frame.len(), "frame decoded");
        Ok(Some(frame))
    }

    /// Decode every complete frame currently buffered in `src`.
    pub fn decode_all(&mut self, src: &mut BytesMut) -> Result<Vec<Bytes>> {
        let mut frames = Vec::new();
        while let Some(frame) = self.decode_frame(src)? {
            frames.push(frame);
        }
        Ok(frames)
    }

    /// True while the bytes of an oversized frame are being skipped.
    pub fn is_discarding(&self) -> bool {
        self.discarding_too_long_frame
    }

    /// Bytes of the oversized frame still to be skipped.
    pub fn bytes_to_discard(&self) -> u64 {
        self.bytes_to_discard
    }

    /// Decoder configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Skip forward to the configured header. The scan resumes on the next
    /// call: only the trailing `width - 1` bytes are kept when not found.
    fn find_header(&self, src: &mut BytesMut) -> bool {
        let header = self.config.header;
        let width = header.width();

        let mut skipped = 0usize;
        let found = loop {
            if src.len() - skipped < width {
                break false;
            }
            if header.matches(&src[skipped..skipped + width]) {
                break true;
            }
            skipped += 1;
        };

        if skipped > 0 {
            tracing::debug!(skipped, "skipped bytes before frame header");
            src.advance(skipped);
        }
        found
    }

    fn discard_too_long_frame(&mut self, src: &mut BytesMut) -> Result<()> {
        let local = self.bytes_to_discard.min(src.len() as u64);
        src.advance(local as usize);
        self.bytes_to_discard -= local;
        self.fail_if_necessary(false)
    }

    fn exceeded_frame_length(&mut self, src: &mut BytesMut, frame_length: u64) -> Result<()> {
        let buffered = src.len() as u64;
        self.too_long_frame_length = frame_length;

        if buffered >= frame_length {
            // The whole oversized frame is already here.
            src.advance(frame_length as usize);
        } else {
            self.discarding_too_long_frame = true;
            self.bytes_to_discard = frame_length - buffered;
            src.clear();
        }

        tracing::warn!(
            frame_length,
            max = self.config.max_frame_length,
            remaining = self.bytes_to_discard,
            "discarding oversized frame"
        );
        self.fail_if_necessary(true)
    }

    fn fail_if_necessary(&mut self, first_detection: bool) -> Result<()> {
        if self.bytes_to_discard == 0 {
            let length = self.too_long_frame_length;
            self.too_long_frame_length = 0;
            self.discarding_too_long_frame = false;
            if !self.config.fail_fast || first_detection {
                return Err(FrameError::TooLongFrame {
                    length,
                    max: self.config.max_frame_length,
                    discarding: false,
                });
            }
        } else if self.config.fail_fast && first_detection {
            return Err(FrameError::TooLongFrame {
                length: self.too_long_frame_length,
                max: self.config.max_frame_length,
                discarding: true,
            });
        }
        Ok(())
    }
}

impl Default for FrameDecoder {
    /// Two-byte big-endian length at offset 0, 64 KiB limit.
    fn default() -> Self {
        Self::with_valid_config(FrameConfig::default())
    }
}

/// Read an unadjusted length value of `width` bytes from the front of `buf`.
///
/// Widths 1 to 4 are unsigned; an 8-byte field is signed so that a
/// negative value can be reported as corruption.
pub fn read_length_field(buf: &[u8], width: usize, order: ByteOrder) -> Result<i64> {
    if !matches!(width, 1 | 2 | 3 | 4 | 8) {
        return Err(FrameError::UnsupportedLengthField(width));
    }
    if buf.len() < width {
        return Err(FrameError::CorruptedFrame(format!(
            "length field needs {width} bytes, only {} available",
            buf.len()
        )));
    }

    let mut cursor = buf;
    Ok(order.get_uint(&mut cursor, width) as i64)
}
