//! Schema-driven binary codec for fixed-structure device protocols.
//!
//! wirebind splits a byte stream into frames by a length field and maps each
//! frame onto a record type described by a field schema, with per-field
//! byte order, length, string encoding, offsets and protocol-version ranges.
//!
//! # Crate Structure
//!
//! - [`frame`]: length-field frame decoding, header resync, checksums, bit helpers
//! - [`codec`]: field schemas, adapter registry, built-in adapters
//! - [`MessageDecoder`]: frames in, typed records out

/// Re-export frame types.
pub mod frame {
    pub use wirebind_frame::*;
}

/// Re-export codec types.
pub mod codec {
    pub use wirebind_codec::*;
}

mod error;
mod message;

pub use error::{Error, Result};
pub use message::MessageDecoder;
