//! Length-field frame decoding for fixed-structure device protocols.
//!
//! Turns a continuous byte stream into delimited message buffers:
//! - Optional 1- or 2-byte header synchronization (garbage is skipped)
//! - A length field of 1, 2, 3, 4 or 8 bytes at a configurable offset
//! - Maximum frame size protection with a discard/recovery state machine
//!
//! Framing is decode-side only. Encoding a message is the caller's business.

pub mod bits;
pub mod checksum;
#[cfg(feature = "async")]
pub mod codec;
pub mod config;
pub mod decoder;
pub mod error;
pub mod order;
pub mod reader;

pub use config::{FrameConfig, Header, DEFAULT_MAX_FRAME_LENGTH};
pub use decoder::{read_length_field, FrameDecoder};
pub use error::{FrameError, Result};
pub use order::ByteOrder;
pub use reader::FrameReader;
