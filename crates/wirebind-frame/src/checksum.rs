//! Checksums used by metering and field-bus protocols.
//!
//! Every function consumes the readable bytes of the given buffer. Pass a
//! slice (`&frame[..n]`) to checksum part of a frame without consuming it.

use bytes::Buf;

const MODBUS_POLY: u16 = 0xA001;

static MODBUS_TABLE: [u16; 256] = modbus_table();

const fn modbus_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u16;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ MODBUS_POLY
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// CRC-16/MODBUS (poly 0xA001 reflected, init 0xFFFF).
///
/// Modbus transmits the low byte first, so append it with `put_u16_le`.
pub fn modbus_crc16<B: Buf>(mut buf: B) -> u16 {
    let mut crc = 0xFFFFu16;
    while buf.has_remaining() {
        let byte = buf.get_u8();
        crc = (crc >> 8) ^ MODBUS_TABLE[((crc ^ byte as u16) & 0xFF) as usize];
    }
    crc
}

/// Wrapping 8-bit sum of all bytes.
pub fn acc_sum<B: Buf>(mut buf: B) -> u8 {
    let mut sum = 0u8;
    while buf.has_remaining() {
        sum = sum.wrapping_add(buf.get_u8());
    }
    sum
}

/// XOR of all bytes.
pub fn xor<B: Buf>(mut buf: B) -> u8 {
    let mut acc = 0u8;
    while buf.has_remaining() {
        acc ^= buf.get_u8();
    }
    acc
}

/// 8-bit checksum over signed bytes: the low byte of the sum, negated
/// (two's complement) when the sum overflows a byte.
pub fn checksum8<B: Buf>(mut buf: B) -> u8 {
    let mut sum = 0i32;
    while buf.has_remaining() {
        sum += buf.get_i8() as i32;
    }
    if sum > 0xFF {
        sum = (!sum).wrapping_add(1);
    }
    (sum & 0xFF) as u8
}

/// XOR of all complete 4-byte words, seeded with `0xFFFF_FFFF`.
///
/// Trailing bytes that do not fill a word are left in the buffer.
pub fn checksum32<B: Buf>(mut buf: B, little_endian: bool) -> u32 {
    let mut acc = 0xFFFF_FFFFu32;
    while buf.remaining() >= 4 {
        acc ^= if little_endian {
            buf.get_u32_le()
        } else {
            buf.get_u32()
        };
    }
    acc
}
