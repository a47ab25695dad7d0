use crate::error::{FrameError, Result};
use crate::order::ByteOrder;

/// Default maximum adjusted frame length: 64 KiB.
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 64 * 1024;

/// Fixed header value that marks the start of a frame.
///
/// Header bytes are compared in big-endian order, so `Two(0x6868)` matches
/// the byte sequence `68 68`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Header {
    /// No header synchronization.
    #[default]
    None,
    /// A single header byte.
    One(u8),
    /// A two-byte header.
    Two(u16),
}

impl Header {
    /// Width of the header on the wire (0, 1 or 2 bytes).
    pub fn width(self) -> usize {
        match self {
            Header::None => 0,
            Header::One(_) => 1,
            Header::Two(_) => 2,
        }
    }

    /// Build a header from a raw value and width, as found in protocol docs.
    pub fn from_parts(value: u16, width: usize) -> Result<Self> {
        match width {
            0 => Ok(Header::None),
            1 => u8::try_from(value).map(Header::One).map_err(|_| {
                FrameError::InvalidConfig(format!(
                    "header value {value:#x} does not fit in 1 byte"
                ))
            }),
            2 => Ok(Header::Two(value)),
            other => Err(FrameError::InvalidConfig(format!(
                "header width must be 0, 1 or 2 (got {other})"
            ))),
        }
    }

    pub(crate) fn matches(self, window: &[u8]) -> bool {
        match self {
            Header::None => true,
            Header::One(value) => window.first() == Some(&value),
            Header::Two(value) => window.len() >= 2 && window[..2] == value.to_be_bytes(),
        }
    }
}

/// Configuration for the length-field frame decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    /// Byte order of the length field. Default: big-endian.
    pub byte_order: ByteOrder,
    /// Maximum adjusted frame length in bytes. Default: 64 KiB.
    pub max_frame_length: usize,
    /// Offset of the length field from the frame start (header included).
    pub length_field_offset: usize,
    /// Width of the length field: 1, 2, 3, 4 or 8 bytes. Default: 2.
    pub length_field_length: usize,
    /// Added to the raw length value to obtain the bytes following the
    /// length field (e.g. trailing checksum and tail bytes).
    pub length_adjustment: i64,
    /// Leading bytes removed from every emitted frame.
    pub initial_bytes_to_strip: usize,
    /// Report an oversized frame as soon as it is detected rather than once
    /// its bytes have been discarded.
    pub fail_fast: bool,
    /// Optional header synchronization pattern.
    pub header: Header,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            byte_order: ByteOrder::Big,
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            length_field_offset: 0,
            length_field_length: 2,
            length_adjustment: 0,
            initial_bytes_to_strip: 0,
            fail_fast: true,
            header: Header::None,
        }
    }
}

impl FrameConfig {
    /// Offset of the first byte after the length field.
    pub fn length_field_end_offset(&self) -> usize {
        self.length_field_offset + self.length_field_length
    }

    /// Check that the configuration can describe a frame at all.
    pub fn validate(&self) -> Result<()> {
        if self.max_frame_length == 0 {
            return Err(FrameError::InvalidConfig(
                "max_frame_length must be positive".to_string(),
            ));
        }

        if !matches!(self.length_field_length, 1 | 2 | 3 | 4 | 8) {
            return Err(FrameError::UnsupportedLengthField(
                self.length_field_length,
            ));
        }

        if self.length_field_length > self.max_frame_length {
            return Err(FrameError::InvalidConfig(format!(
                "length_field_length ({}) exceeds max_frame_length ({})",
                self.length_field_length, self.max_frame_length
            )));
        }

        if self.length_field_offset > self.max_frame_length - self.length_field_length {
            return Err(FrameError::InvalidConfig(format!(
                "max_frame_length ({}) must be at least length_field_offset ({}) + length_field_length ({})",
                self.max_frame_length, self.length_field_offset, self.length_field_length
            )));
        }

        Ok(())
    }
}
