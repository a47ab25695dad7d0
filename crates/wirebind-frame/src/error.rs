/// Errors that can occur while splitting a byte stream into frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The decoder configuration can never produce a valid frame.
    #[error("invalid frame configuration: {0}")]
    InvalidConfig(String),

    /// The length field is negative or inconsistent with the frame layout.
    #[error("corrupted frame: {0}")]
    CorruptedFrame(String),

    /// The adjusted frame length exceeds the configured maximum.
    ///
    /// `discarding` is true while the decoder is still skipping the bytes of
    /// the oversized frame (fail-fast mode reports before discard finishes).
    #[error("adjusted frame length exceeds {max}: {length} - {}", discard_state(.discarding))]
    TooLongFrame {
        length: u64,
        max: usize,
        discarding: bool,
    },

    /// The length field width is not one of 1, 2, 3, 4 or 8.
    #[error("unsupported length field width: {0} (expected: 1, 2, 3, 4, or 8)")]
    UnsupportedLengthField(usize),

    /// An I/O error occurred while reading from the underlying stream.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before a complete frame was received.
    #[error("connection closed (incomplete frame)")]
    ConnectionClosed,
}

fn discard_state(discarding: &bool) -> &'static str {
    if *discarding {
        "discarding"
    } else {
        "discarded"
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
