//! Pure bit-level packing rules for fields inside fixed-width register words.
//!
//! Words are carried as `u64`; registers narrower than 64 bits simply never
//! populate the upper bits. Every helper here is reentrant and performs no
//! bus traffic.

use thiserror::Error;

use crate::AccessError;

/// Widest register word supported by the access layer, in bits.
pub const MAX_WORD_BITS: u32 = u64::BITS;

/// Policy applied when a value is wider than the bit range receiving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OverflowPolicy {
    /// Fail with a range error and leave the target untouched.
    #[default]
    Reject,
    /// Keep only the low `width` bits of the value.
    Truncate,
}

/// Value exceeded the bit width it was composed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("value {value:#x} exceeds the {width}-bit range")]
pub struct RangeError {
    /// Rejected value.
    pub value: u64,
    /// Available width in bits.
    pub width: u32,
}

impl RangeError {
    /// Attaches the name of the field or register that rejected the value.
    #[must_use]
    pub fn for_target(self, target: &str) -> AccessError {
        AccessError::Range {
            target: target.to_owned(),
            value: self.value,
            width: self.width,
        }
    }
}

/// Returns a mask with the low `width` bits set.
#[must_use]
pub const fn low_mask(width: u32) -> u64 {
    if width >= MAX_WORD_BITS {
        u64::MAX
    } else {
        (1_u64 << width) - 1
    }
}

/// Returns the in-word mask of the range `[lsb, lsb + width)`.
#[must_use]
pub const fn field_mask(lsb: u32, width: u32) -> u64 {
    match low_mask(width).checked_shl(lsb) {
        Some(mask) => mask,
        None => 0,
    }
}

/// Extracts `width` bits starting at `lsb`: `(word >> lsb) & ((1 << width) - 1)`.
#[must_use]
pub const fn extract(word: u64, lsb: u32, width: u32) -> u64 {
    match word.checked_shr(lsb) {
        Some(shifted) => shifted & low_mask(width),
        None => 0,
    }
}

/// Clamps `value` to `width` bits according to `policy`.
///
/// # Errors
///
/// Returns [`RangeError`] when `value` does not fit and `policy` is
/// [`OverflowPolicy::Reject`].
pub const fn fit(value: u64, width: u32, policy: OverflowPolicy) -> Result<u64, RangeError> {
    let masked = value & low_mask(width);
    if masked != value && matches!(policy, OverflowPolicy::Reject) {
        return Err(RangeError { value, width });
    }
    Ok(masked)
}

/// Replaces bits `[lsb, lsb + width)` of `word` with `value`.
///
/// The target range is cleared first, `value` is clamped per `policy`, and the
/// shifted result is OR-ed back in. Bits outside the range are preserved.
///
/// # Errors
///
/// Returns [`RangeError`] when `value` exceeds `(1 << width) - 1` under
/// [`OverflowPolicy::Reject`].
pub const fn compose(
    word: u64,
    lsb: u32,
    width: u32,
    value: u64,
    policy: OverflowPolicy,
) -> Result<u64, RangeError> {
    let value = match fit(value, width, policy) {
        Ok(value) => value,
        Err(err) => return Err(err),
    };
    let mask = field_mask(lsb, width);
    let shifted = match value.checked_shl(lsb) {
        Some(shifted) => shifted,
        None => 0,
    };
    Ok((word & !mask) | (shifted & mask))
}

#[cfg(test)]
mod tests {
    use super::{compose, extract, field_mask, fit, low_mask, OverflowPolicy, RangeError};
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0)]
    #[case(1, 0b1)]
    #[case(3, 0b111)]
    #[case(32, 0xFFFF_FFFF)]
    #[case(64, u64::MAX)]
    fn low_mask_covers_requested_width(#[case] width: u32, #[case] expected: u64) {
        assert_eq!(low_mask(width), expected);
    }

    #[test]
    fn field_mask_matches_shifted_low_mask() {
        assert_eq!(field_mask(1, 3), 0b1110);
        assert_eq!(field_mask(63, 1), 1 << 63);
        assert_eq!(field_mask(0, 64), u64::MAX);
        assert_eq!(field_mask(64, 1), 0);
    }

    #[test]
    fn extract_reads_only_the_target_bits() {
        assert_eq!(extract(0b1011, 1, 3), 0b101);
        assert_eq!(extract(0b1011, 0, 1), 1);
        assert_eq!(extract(u64::MAX, 0, 64), u64::MAX);
        assert_eq!(extract(u64::MAX, 64, 1), 0);
    }

    #[test]
    fn compose_preserves_neighbouring_bits() {
        let word = compose(0x01, 1, 3, 5, OverflowPolicy::Reject).expect("5 fits in 3 bits");
        assert_eq!(word, 0x0B);
    }

    #[test]
    fn strict_compose_rejects_oversized_values() {
        assert_eq!(
            compose(0, 1, 3, 8, OverflowPolicy::Reject),
            Err(RangeError { value: 8, width: 3 })
        );
    }

    #[test]
    fn truncating_compose_masks_oversized_values() {
        assert_eq!(compose(0, 1, 3, 0b1_101, OverflowPolicy::Truncate), Ok(0b1010));
        assert_eq!(fit(0x1FF, 8, OverflowPolicy::Truncate), Ok(0xFF));
    }

    #[test]
    fn range_error_carries_target_name() {
        let err = RangeError { value: 9, width: 3 }.for_target("mode");
        assert_eq!(
            err.to_string(),
            "value 0x9 does not fit in 3 bits of 'mode'"
        );
    }

    proptest! {
        #[test]
        fn compose_then_extract_round_trips_modulo_width(
            word in any::<u64>(),
            (lsb, width) in (0_u32..64).prop_flat_map(|lsb| (Just(lsb), 1..=64 - lsb)),
            value in any::<u64>(),
        ) {
            let composed = compose(word, lsb, width, value, OverflowPolicy::Truncate).unwrap();
            prop_assert_eq!(extract(composed, lsb, width), value & low_mask(width));
            prop_assert_eq!(composed & !field_mask(lsb, width), word & !field_mask(lsb, width));
        }

        #[test]
        fn strict_compose_accepts_exactly_the_values_that_fit(
            width in 1_u32..=16,
            value in 0_u64..(1 << 17),
        ) {
            let fits = value <= low_mask(width);
            prop_assert_eq!(compose(0, 0, width, value, OverflowPolicy::Reject).is_ok(), fits);
        }
    }
}
