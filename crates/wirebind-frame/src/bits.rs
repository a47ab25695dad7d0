//! Bit-field helpers for status and fault words.
//!
//! Meter protocols document bit positions from the most significant bit of a
//! 32-bit word, starting at 1. The helpers below follow that numbering.

const WORD_BITS: u32 = u32::BITS;

/// Whether bit `pos` (1 = most significant, 32 = least significant) is set.
///
/// Positions outside `1..=32` read as unset.
pub fn one_bit(value: u32, pos: u32) -> bool {
    if !(1..=WORD_BITS).contains(&pos) {
        return false;
    }
    value & (1 << (WORD_BITS - pos)) != 0
}

/// Value of the `pos`-th group of `width` bits, groups numbered from the
/// most significant end starting at 1.
///
/// Returns 0 when the group does not lie inside the word.
pub fn bits(value: u32, pos: u32, width: u32) -> u32 {
    if width == 0 || width > WORD_BITS || pos == 0 {
        return 0;
    }
    let Some(end) = pos.checked_mul(width).filter(|end| *end <= WORD_BITS) else {
        return 0;
    };
    let mask = if width == WORD_BITS {
        u32::MAX
    } else {
        (1 << width) - 1
    };
    (value >> (WORD_BITS - end)) & mask
}

/// Two-bit group `pos` (1 = the top two bits).
pub fn two_bit(value: u32, pos: u32) -> u32 {
    bits(value, pos, 2)
}

/// Four-bit group `pos` (1 = the top nibble).
pub fn four_bit(value: u32, pos: u32) -> u32 {
    bits(value, pos, 4)
}

/// Bits `from..to`, counted from the most significant bit starting at 0,
/// returned right-aligned.
///
/// Returns 0 for an empty or out-of-range span.
pub fn bit_range(value: u32, from: u32, to: u32) -> u32 {
    if from >= to || to > WORD_BITS {
        return 0;
    }
    let width = to - from;
    (value << from) >> (WORD_BITS - width)
}

/// Names of the set bits among the low `len` bits of `word`, highest bit
/// first. `names[i]` describes bit `i`.
pub fn flag_descriptions<'a, S: AsRef<str>>(names: &'a [S], word: u32, len: usize) -> Vec<&'a str> {
    let len = len.min(names.len()).min(WORD_BITS as usize);
    (0..len)
        .rev()
        .filter(|bit| word & (1 << bit) != 0)
        .map(|bit| names[bit].as_ref())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_bit_counts_from_msb() {
        assert!(one_bit(0x8000_0000, 1));
        assert!(!one_bit(0x8000_0000, 2));
        assert!(one_bit(0x0000_0001, 32));
        assert!(!one_bit(u32::MAX, 0));
        assert!(!one_bit(u32::MAX, 33));
    }

    #[test]
    fn nibble_and_pair_groups() {
        let word = 0xA5C3_0000;
        assert_eq!(four_bit(word, 1), 0xA);
        assert_eq!(four_bit(word, 2), 0x5);
        assert_eq!(four_bit(word, 4), 0x3);
        assert_eq!(two_bit(word, 1), 0b10);
        assert_eq!(two_bit(word, 2), 0b10);
        assert_eq!(bits(word, 9, 4), 0);
        assert_eq!(bits(word, 1, 32), word);
    }

    #[test]
    fn bit_range_is_right_aligned() {
        assert_eq!(bit_range(0xF000_0000, 0, 4), 0xF);
        assert_eq!(bit_range(0x0FF0_0000, 4, 12), 0xFF);
        assert_eq!(bit_range(0x1234_5678, 0, 32), 0x1234_5678);
        assert_eq!(bit_range(0xFFFF_FFFF, 5, 5), 0);
    }

    #[test]
    fn flag_descriptions_highest_first() {
        let names = ["over-voltage", "under-voltage", "phase loss", "reversed"];
        assert_eq!(
            flag_descriptions(&names, 0b1011, 4),
            vec!["reversed", "under-voltage", "over-voltage"]
        );
        assert_eq!(flag_descriptions(&names, 0b1011, 2), vec!["under-voltage", "over-voltage"]);
        assert!(flag_descriptions(&names, 0, 4).is_empty());
    }
}
