pub use wirebind_frame::ByteOrder;

use crate::error::{CodecError, Result};

/// Text encoding of a string field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StringKind {
    /// Raw bytes shown as lowercase hex digit pairs (`0x1A2B` <-> `"1a2b"`).
    Bcd,
    /// UTF-8 text, surrounding whitespace and NUL padding trimmed on read.
    Utf8,
    /// 7-bit ASCII text, trimmed on read.
    #[default]
    Ascii,
}

/// Numeric transform applied on decode and inverted on encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OffsetRule {
    #[default]
    None,
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl OffsetRule {
    /// The rule that undoes this one.
    pub fn inverse(self) -> Self {
        match self {
            OffsetRule::None => OffsetRule::None,
            OffsetRule::Add => OffsetRule::Subtract,
            OffsetRule::Subtract => OffsetRule::Add,
            OffsetRule::Multiply => OffsetRule::Divide,
            OffsetRule::Divide => OffsetRule::Multiply,
        }
    }
}

/// Wire rules for one record field.
///
/// ```
/// use wirebind_codec::{FieldSpec, OffsetRule};
///
/// // 2-byte big-endian voltage in tenths of a volt, present from version 2.
/// let spec = FieldSpec::new()
///     .length(2)
///     .big_endian()
///     .versions(2, u32::MAX)
///     .offset(OffsetRule::Divide, 10);
/// assert!(spec.applies_to(3));
/// assert!(!spec.applies_to(1));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldSpec {
    pub byte_order: ByteOrder,
    /// First protocol version carrying the field (inclusive).
    pub min_version: u32,
    /// Last protocol version carrying the field (inclusive).
    pub max_version: u32,
    /// Fixed byte length, or element count for sequences. For strings 0
    /// means "the rest of the buffer"; for numbers it means the natural width.
    pub length: usize,
    /// Length handed to each element of a sequence. 0 reuses `length`.
    pub element_length: usize,
    pub string_kind: StringKind,
    /// Padding byte for short or absent strings.
    pub fill: u8,
    pub offset_rule: OffsetRule,
    pub offset: i64,
}

impl Default for FieldSpec {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldSpec {
    pub const fn new() -> Self {
        Self {
            byte_order: ByteOrder::Little,
            min_version: 1,
            max_version: u32::MAX,
            length: 0,
            element_length: 0,
            string_kind: StringKind::Ascii,
            fill: 0,
            offset_rule: OffsetRule::None,
            offset: 0,
        }
    }

    pub const fn length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    pub const fn element_length(mut self, length: usize) -> Self {
        self.element_length = length;
        self
    }

    pub const fn big_endian(mut self) -> Self {
        self.byte_order = ByteOrder::Big;
        self
    }

    pub const fn byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    pub const fn versions(mut self, min: u32, max: u32) -> Self {
        self.min_version = min;
        self.max_version = max;
        self
    }

    pub const fn string_kind(mut self, kind: StringKind) -> Self {
        self.string_kind = kind;
        self
    }

    pub const fn fill(mut self, fill: u8) -> Self {
        self.fill = fill;
        self
    }

    pub const fn offset(mut self, rule: OffsetRule, offset: i64) -> Self {
        self.offset_rule = rule;
        self.offset = offset;
        self
    }

    /// Whether the field is on the wire at `version`.
    pub fn applies_to(&self, version: u32) -> bool {
        (self.min_version..=self.max_version).contains(&version)
    }

    /// Rules for each element of a sequence field.
    pub fn element_spec(&self) -> Self {
        let mut element = *self;
        if self.element_length > 0 {
            element.length = self.element_length;
        }
        element
    }

    /// Reject rules that can never be applied.
    pub fn validate(&self) -> Result<()> {
        if self.min_version > self.max_version {
            return Err(CodecError::InvalidSchema(format!(
                "min_version ({}) exceeds max_version ({})",
                self.min_version, self.max_version
            )));
        }

        if matches!(self.offset_rule, OffsetRule::Multiply | OffsetRule::Divide) && self.offset == 0
        {
            return Err(CodecError::InvalidSchema(format!(
                "{:?} offset rule needs a non-zero offset",
                self.offset_rule
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let spec = FieldSpec::default();
        assert_eq!(spec.byte_order, ByteOrder::Little);
        assert_eq!(spec.string_kind, StringKind::Ascii);
        assert_eq!(spec.offset_rule, OffsetRule::None);
        assert_eq!((spec.min_version, spec.max_version), (1, u32::MAX));
        assert!(spec.applies_to(1));
        assert!(!spec.applies_to(0));
    }

    #[test]
    fn version_range_is_inclusive() {
        let spec = FieldSpec::new().versions(2, 3);
        assert!(!spec.applies_to(1));
        assert!(spec.applies_to(2));
        assert!(spec.applies_to(3));
        assert!(!spec.applies_to(4));
    }

    #[test]
    fn validate_rejects_inverted_range() {
        assert!(matches!(
            FieldSpec::new().versions(4, 2).validate(),
            Err(CodecError::InvalidSchema(_))
        ));
    }

    #[test]
    fn validate_rejects_zero_divisor() {
        assert!(FieldSpec::new().offset(OffsetRule::Divide, 0).validate().is_err());
        assert!(FieldSpec::new().offset(OffsetRule::Multiply, 0).validate().is_err());
        assert!(FieldSpec::new().offset(OffsetRule::Add, 0).validate().is_ok());
    }

    #[test]
    fn element_spec_overrides_length() {
        let spec = FieldSpec::new().length(3).element_length(2).big_endian();
        let element = spec.element_spec();
        assert_eq!(element.length, 2);
        assert_eq!(element.byte_order, ByteOrder::Big);
        assert_eq!(FieldSpec::new().length(3).element_spec().length, 3);
    }

    #[test]
    fn inverse_rules() {
        assert_eq!(OffsetRule::Add.inverse(), OffsetRule::Subtract);
        assert_eq!(OffsetRule::Divide.inverse(), OffsetRule::Multiply);
        assert_eq!(OffsetRule::None.inverse(), OffsetRule::None);
    }
}
