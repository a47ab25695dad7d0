use bytes::{Buf, BufMut};

/// Byte order of a multi-byte wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    /// Most significant byte first.
    Big,
    /// Least significant byte first. Device protocols default to this.
    #[default]
    Little,
}

impl ByteOrder {
    /// Read an unsigned integer of `width` bytes (1..=8).
    ///
    /// The caller must ensure `src` holds at least `width` bytes.
    pub fn get_uint<B: Buf>(self, src: &mut B, width: usize) -> u64 {
        match self {
            ByteOrder::Big => src.get_uint(width),
            ByteOrder::Little => src.get_uint_le(width),
        }
    }

    /// Write the low `width` bytes (1..=8) of `value`.
    pub fn put_uint<B: BufMut>(self, dst: &mut B, value: u64, width: usize) {
        match self {
            ByteOrder::Big => dst.put_uint(value, width),
            ByteOrder::Little => dst.put_uint_le(value, width),
        }
    }
}
