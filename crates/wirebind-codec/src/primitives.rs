//! Built-in scalar adapters.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::mem::size_of;
use std::sync::Arc;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::adapter::{erase, AdapterKind, DynAdapter, TypeAdapter, WireContext};
use crate::decimal::{scale_of_divisor, Decimal};
use crate::error::{CodecError, Result};
use crate::field::{FieldSpec, OffsetRule, StringKind};

/// Append `count` copies of `value`.
pub fn fill_bytes(dst: &mut BytesMut, count: usize, value: u8) {
    if count > 0 {
        dst.put_bytes(value, count);
    }
}

/// Fixed-width integer with wrapping arithmetic in its own width.
pub trait WireInt: Copy + Default + Send + Sync + 'static {
    fn from_raw(raw: u64) -> Self;
    fn to_raw(self) -> u64;
    fn from_offset(offset: i64) -> Self;
    fn apply(self, rule: OffsetRule, offset: Self) -> Self;
}

macro_rules! wire_int {
    ($($t:ty),* $(,)?) => {
        $(
            impl WireInt for $t {
                fn from_raw(raw: u64) -> Self {
                    raw as $t
                }

                fn to_raw(self) -> u64 {
                    self as u64
                }

                fn from_offset(offset: i64) -> Self {
                    offset as $t
                }

                fn apply(self, rule: OffsetRule, offset: Self) -> Self {
                    match rule {
                        OffsetRule::None => self,
                        OffsetRule::Add => self.wrapping_add(offset),
                        OffsetRule::Subtract => self.wrapping_sub(offset),
                        OffsetRule::Multiply => self.wrapping_mul(offset),
                        OffsetRule::Divide if offset == 0 => self,
                        OffsetRule::Divide => self.wrapping_div(offset),
                    }
                }
            }
        )*
    };
}

wire_int!(u16, i16, u32, i32, u64, i64);

/// Integers stored in 1 to 4 bytes. Length 0 uses the type's own width.
pub struct IntegerAdapter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: WireInt> IntegerAdapter<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    fn width(field: &FieldSpec) -> Option<usize> {
        match field.length {
            0 => Some(size_of::<T>().min(4)),
            1..=4 => Some(field.length),
            _ => None,
        }
    }
}

impl<T: WireInt> Default for IntegerAdapter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: WireInt> TypeAdapter<T> for IntegerAdapter<T> {
    fn read(&self, _cx: &WireContext<'_>, src: &mut Bytes, field: &FieldSpec) -> Result<Option<T>> {
        let Some(width) = Self::width(field) else {
            tracing::warn!(
                length = field.length,
                "unsupported integer length (expected 1-4); reading 0"
            );
            return Ok(Some(T::default()));
        };
        if src.remaining() < width {
            return Ok(None);
        }
        let raw = T::from_raw(field.byte_order.get_uint(src, width));
        Ok(Some(raw.apply(field.offset_rule, T::from_offset(field.offset))))
    }

    fn write(
        &self,
        _cx: &WireContext<'_>,
        dst: &mut BytesMut,
        value: Option<&T>,
        field: &FieldSpec,
    ) -> Result<()> {
        let Some(width) = Self::width(field) else {
            tracing::warn!(
                length = field.length,
                "unsupported integer length (expected 1-4); nothing written"
            );
            return Ok(());
        };
        let raw = match value {
            Some(value) => value.apply(field.offset_rule.inverse(), T::from_offset(field.offset)),
            None => T::default(),
        };
        field.byte_order.put_uint(dst, raw.to_raw(), width);
        Ok(())
    }
}

/// 8-byte integers. Only length 8 (or 0) is accepted.
pub struct LongAdapter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: WireInt> LongAdapter<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    fn supported(field: &FieldSpec) -> bool {
        matches!(field.length, 0 | 8)
    }
}

impl<T: WireInt> Default for LongAdapter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: WireInt> TypeAdapter<T> for LongAdapter<T> {
    fn read(&self, _cx: &WireContext<'_>, src: &mut Bytes, field: &FieldSpec) -> Result<Option<T>> {
        if !Self::supported(field) {
            tracing::warn!(
                length = field.length,
                "8-byte integer field declares another length; reading 0"
            );
            return Ok(Some(T::default()));
        }
        if src.remaining() < 8 {
            return Ok(None);
        }
        let raw = T::from_raw(field.byte_order.get_uint(src, 8));
        Ok(Some(raw.apply(field.offset_rule, T::from_offset(field.offset))))
    }

    fn write(
        &self,
        _cx: &WireContext<'_>,
        dst: &mut BytesMut,
        value: Option<&T>,
        field: &FieldSpec,
    ) -> Result<()> {
        if !Self::supported(field) {
            tracing::warn!(
                length = field.length,
                "8-byte integer field declares another length; nothing written"
            );
            return Ok(());
        }
        let raw = match value {
            Some(value) => value.apply(field.offset_rule.inverse(), T::from_offset(field.offset)),
            None => T::default(),
        };
        field.byte_order.put_uint(dst, raw.to_raw(), 8);
        Ok(())
    }
}

/// Single byte (`u8`, `i8`). Length and offset rules are ignored.
pub struct ByteAdapter<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> ByteAdapter<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for ByteAdapter<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-byte integer.
pub trait WireByte: Copy + Send + Sync + 'static {
    fn from_byte(byte: u8) -> Self;
    fn to_byte(self) -> u8;
}

impl WireByte for u8 {
    fn from_byte(byte: u8) -> Self {
        byte
    }

    fn to_byte(self) -> u8 {
        self
    }
}

impl WireByte for i8 {
    fn from_byte(byte: u8) -> Self {
        byte as i8
    }

    fn to_byte(self) -> u8 {
        self as u8
    }
}

impl<T: WireByte> TypeAdapter<T> for ByteAdapter<T> {
    fn read(&self, _cx: &WireContext<'_>, src: &mut Bytes, _field: &FieldSpec) -> Result<Option<T>> {
        if !src.has_remaining() {
            return Ok(None);
        }
        Ok(Some(T::from_byte(src.get_u8())))
    }

    fn write(
        &self,
        _cx: &WireContext<'_>,
        dst: &mut BytesMut,
        value: Option<&T>,
        _field: &FieldSpec,
    ) -> Result<()> {
        dst.put_u8(value.map_or(0, |v| v.to_byte()));
        Ok(())
    }
}

/// One byte, nonzero reads as `true`.
#[derive(Default)]
pub struct BoolAdapter;

impl TypeAdapter<bool> for BoolAdapter {
    fn read(&self, _cx: &WireContext<'_>, src: &mut Bytes, _field: &FieldSpec) -> Result<Option<bool>> {
        if !src.has_remaining() {
            return Ok(None);
        }
        Ok(Some(src.get_u8() != 0))
    }

    fn write(
        &self,
        _cx: &WireContext<'_>,
        dst: &mut BytesMut,
        value: Option<&bool>,
        _field: &FieldSpec,
    ) -> Result<()> {
        dst.put_u8(u8::from(value.copied().unwrap_or(false)));
        Ok(())
    }
}

/// Strings in BCD, UTF-8 or ASCII.
///
/// Values longer than a non-zero `length` are cut to fit (at a character
/// boundary for UTF-8); shorter ones are padded with `fill`.
#[derive(Default)]
pub struct StringAdapter;

impl StringAdapter {
    fn encode(value: &str, kind: StringKind) -> Result<Vec<u8>> {
        match kind {
            StringKind::Bcd => {
                hex::decode(value).map_err(|err| CodecError::InvalidBcd(format!("{value:?}: {err}")))
            }
            StringKind::Ascii if !value.is_ascii() => {
                Err(CodecError::NonAsciiString(value.to_string()))
            }
            StringKind::Ascii => Ok(value.as_bytes().to_vec()),
            StringKind::Utf8 => Ok(value.as_bytes().to_vec()),
        }
    }
}

fn trim_padding(text: &str) -> String {
    text.trim_matches(|c: char| c <= ' ').to_string()
}

fn utf8_prefix(bytes: &[u8], max: usize) -> usize {
    let mut end = max.min(bytes.len());
    while end > 0 && end < bytes.len() && (bytes[end] & 0xC0) == 0x80 {
        end -= 1;
    }
    end
}

impl TypeAdapter<String> for StringAdapter {
    fn read(&self, _cx: &WireContext<'_>, src: &mut Bytes, field: &FieldSpec) -> Result<Option<String>> {
        let length = match field.length {
            0 => src.remaining(),
            n if src.remaining() < n => return Ok(None),
            n => n,
        };
        let bytes = src.split_to(length);

        let text = match field.string_kind {
            StringKind::Bcd => hex::encode(&bytes),
            StringKind::Utf8 => trim_padding(&String::from_utf8_lossy(&bytes)),
            StringKind::Ascii => {
                let decoded: String = bytes
                    .iter()
                    .map(|&b| if b.is_ascii() { b as char } else { char::REPLACEMENT_CHARACTER })
                    .collect();
                trim_padding(&decoded)
            }
        };
        Ok(Some(text))
    }

    fn write(
        &self,
        _cx: &WireContext<'_>,
        dst: &mut BytesMut,
        value: Option<&String>,
        field: &FieldSpec,
    ) -> Result<()> {
        let Some(value) = value else {
            fill_bytes(dst, field.length, field.fill);
            return Ok(());
        };

        let bytes = Self::encode(value, field.string_kind)?;
        let written = match field.length {
            0 => bytes.len(),
            n if bytes.len() <= n => bytes.len(),
            n => {
                let cut = if field.string_kind == StringKind::Utf8 {
                    utf8_prefix(&bytes, n)
                } else {
                    n
                };
                tracing::warn!(
                    length = bytes.len(),
                    declared = n,
                    "string longer than its field; truncated"
                );
                cut
            }
        };
        dst.put_slice(&bytes[..written]);
        fill_bytes(dst, field.length.saturating_sub(written), field.fill);
        Ok(())
    }
}

/// Unsigned 1-4 byte value exposed as a [`Decimal`].
///
/// Only the divide rule is honoured: the raw value is divided by the offset
/// with a scale taken from its power of ten, rounding half up. Encoding
/// multiplies back and truncates.
#[derive(Default)]
pub struct DecimalAdapter;

impl DecimalAdapter {
    fn width(field: &FieldSpec) -> Option<usize> {
        match field.length {
            0 => Some(4),
            1..=4 => Some(field.length),
            _ => None,
        }
    }
}

impl TypeAdapter<Decimal> for DecimalAdapter {
    fn read(&self, _cx: &WireContext<'_>, src: &mut Bytes, field: &FieldSpec) -> Result<Option<Decimal>> {
        let Some(width) = Self::width(field) else {
            tracing::warn!(length = field.length, "unsupported decimal length; reading 0");
            return Ok(Some(Decimal::ZERO));
        };
        if src.remaining() < width {
            return Ok(None);
        }
        let raw = Decimal::from_int(field.byte_order.get_uint(src, width) as i64);
        if field.offset_rule != OffsetRule::Divide {
            return Ok(Some(raw));
        }
        let scale = scale_of_divisor(field.offset);
        raw.div_round_half_up(field.offset, scale)
            .map(Some)
            .ok_or_else(|| {
                CodecError::InvalidSchema(format!("cannot divide decimal by {}", field.offset))
            })
    }

    fn write(
        &self,
        _cx: &WireContext<'_>,
        dst: &mut BytesMut,
        value: Option<&Decimal>,
        field: &FieldSpec,
    ) -> Result<()> {
        let Some(width) = Self::width(field) else {
            tracing::warn!(length = field.length, "unsupported decimal length; nothing written");
            return Ok(());
        };
        let raw = match (value, field.offset_rule) {
            (None, _) => 0,
            (Some(value), OffsetRule::Divide) => value.mul_trunc(field.offset),
            (Some(value), _) => value.trunc(),
        };
        field.byte_order.put_uint(dst, raw as u64, width);
        Ok(())
    }
}

/// Adapters for every built-in scalar type, keyed by type.
pub(crate) fn builtin_scalars() -> HashMap<TypeId, Arc<dyn DynAdapter>> {
    fn entry<T: Any, A: TypeAdapter<T>>(adapter: A) -> (TypeId, Arc<dyn DynAdapter>) {
        (TypeId::of::<T>(), erase(adapter, AdapterKind::Builtin))
    }

    HashMap::from([
        entry::<u8, _>(ByteAdapter::<u8>::new()),
        entry::<i8, _>(ByteAdapter::<i8>::new()),
        entry::<u16, _>(IntegerAdapter::<u16>::new()),
        entry::<i16, _>(IntegerAdapter::<i16>::new()),
        entry::<u32, _>(IntegerAdapter::<u32>::new()),
        entry::<i32, _>(IntegerAdapter::<i32>::new()),
        entry::<u64, _>(LongAdapter::<u64>::new()),
        entry::<i64, _>(LongAdapter::<i64>::new()),
        entry::<bool, _>(BoolAdapter),
        entry::<String, _>(StringAdapter),
        entry::<Decimal, _>(DecimalAdapter),
    ])
}
