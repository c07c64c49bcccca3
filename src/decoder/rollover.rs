//! Rollover correction for truncated hardware counters
//!
//! Frame and sample counters are transmitted truncated to a few bits and
//! roll over frequently. A truncated counter is reconciled against a wider
//! reference counter by splicing its bits into the reference and then
//! choosing whichever of `{raw, raw - M, raw + M}` lies closest to the
//! reference, where `M` is the truncated counter's modulus.

/// Replace the lowest bits of `reference` with the truncated counter value.
///
/// `modulus` must be a power of two matching the truncated field's width.
#[inline]
pub fn splice_lower_bits(reference: u32, narrow: u32, modulus: u32) -> u32 {
    debug_assert!(modulus.is_power_of_two());
    (reference & !(modulus - 1)) | (narrow & (modulus - 1))
}

/// Correct a spliced counter value against its wide reference.
///
/// If `raw` is within `threshold` of `reference` it is returned unchanged;
/// otherwise one modulus is added or subtracted to undo the rollover.
/// `threshold` is typically `modulus / 2`. A downward correction that would
/// go negative is clamped to zero.
pub fn correct_rollover(raw: u32, reference: u32, modulus: u32, threshold: u32) -> u32 {
    let diff = raw as i64 - reference as i64;
    let corrected = if diff > threshold as i64 {
        raw as i64 - modulus as i64
    } else if diff < -(threshold as i64) {
        raw as i64 + modulus as i64
    } else {
        raw as i64
    };
    corrected.max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_threshold_unchanged() {
        // |a - b| <= T keeps the raw value
        assert_eq!(correct_rollover(10, 10, 8, 4), 10);
        assert_eq!(correct_rollover(14, 10, 8, 4), 14);
        assert_eq!(correct_rollover(6, 10, 8, 4), 6);
    }

    #[test]
    fn test_positive_excursion_subtracts_modulus() {
        // a - b > T: the narrow counter rolled over past the reference
        assert_eq!(correct_rollover(15, 10, 8, 4), 7);
        assert_eq!(correct_rollover(23, 10, 8, 4), 15);
    }

    #[test]
    fn test_negative_excursion_adds_modulus() {
        // a - b < -T: the reference rolled over past the narrow counter
        assert_eq!(correct_rollover(5, 10, 8, 4), 13);
        assert_eq!(correct_rollover(0, 10, 8, 4), 8);
    }

    #[test]
    fn test_boundary_is_not_corrected() {
        // exactly T away stays raw in both directions
        assert_eq!(correct_rollover(14, 10, 8, 4), 14);
        assert_eq!(correct_rollover(6, 10, 8, 4), 6);
    }

    #[test]
    fn test_downward_correction_clamps_at_zero() {
        assert_eq!(correct_rollover(6, 1, 8, 4), 0);
    }

    #[test]
    fn test_splice_lower_bits() {
        assert_eq!(splice_lower_bits(0x120, 0x5, 8), 0x125);
        assert_eq!(splice_lower_bits(0x127, 0x0, 8), 0x120);
        assert_eq!(splice_lower_bits(0xFF, 0x3, 16), 0xF3);
    }

    #[test]
    fn test_splice_masks_oversized_narrow_value() {
        // narrow values wider than the modulus are truncated, not OR-ed in
        assert_eq!(splice_lower_bits(0x100, 0xFF, 8), 0x107);
    }
}
