//! Marker word classification for the FEM readout stream
//!
//! The stream is a sequence of 32-bit words, each of which splits into two
//! 16-bit half-words with the lower half arriving first:
//!
//! `[16b word0_R, 16b word0_L, 16b word1_R, 16b word1_L, ...]`
//!
//! Event boundaries are full 32-bit markers; everything else (header words,
//! channel boundaries, ROI markers, ADC data) is tagged in the upper nibble
//! or upper two bits of a 16-bit half-word. Classification is stateless:
//! every predicate is an exact masked compare against a fixed constant.

/// Marker constants and their match masks
pub mod marker {
    // 32-bit event boundaries (exact match)
    pub const EVENT_START: u32 = 0xFFFF_FFFF;
    pub const EVENT_END: u32 = 0xE000_0000;

    // Upper-nibble tags (mask 0xF000)
    pub const NIBBLE_MASK: u16 = 0xF000;
    pub const HEADER_WORD: u16 = 0xF000;
    pub const CHARGE_CHANNEL_START: u16 = 0x4000;
    pub const CHARGE_CHANNEL_END: u16 = 0x5000;

    // Upper-two-bit tags (mask 0xC000), light readout only
    pub const WORD_TAG_MASK: u16 = 0xC000;
    pub const LIGHT_CHANNEL_START: u16 = 0x4000;
    pub const LIGHT_CHANNEL_END: u16 = 0xC000;
    pub const LIGHT_CHANNEL_INTMED: u16 = 0x8000;

    // Bits 12-13 tags (mask 0x3000), light ROI structure
    pub const ROI_TAG_MASK: u16 = 0x3000;
    pub const LIGHT_ROI_HEADER1: u16 = 0x1000;
    pub const LIGHT_ROI_HEADER2: u16 = 0x2000;
    pub const LIGHT_ROI_END: u16 = 0x3000;
}

/// Split a 32-bit stream word into its two 16-bit half-words,
/// in arrival order (lower half first).
#[inline]
pub fn split_word(word: u32) -> [u16; 2] {
    [(word & 0xFFFF) as u16, ((word >> 16) & 0xFFFF) as u16]
}

#[inline]
pub fn is_event_start(word: u32) -> bool {
    word == marker::EVENT_START
}

#[inline]
pub fn is_event_end(word: u32) -> bool {
    word == marker::EVENT_END
}

/// FEM header words carry 0xF in the upper nibble of both half-words;
/// the lower (first) half-word is enough to classify.
#[inline]
pub fn is_header_word(half: u16) -> bool {
    half & marker::NIBBLE_MASK == marker::HEADER_WORD
}

#[inline]
pub fn is_charge_channel_start(half: u16) -> bool {
    half & marker::NIBBLE_MASK == marker::CHARGE_CHANNEL_START
}

#[inline]
pub fn is_charge_channel_end(half: u16) -> bool {
    half & marker::NIBBLE_MASK == marker::CHARGE_CHANNEL_END
}

#[inline]
pub fn is_light_channel_start(half: u16) -> bool {
    half & marker::WORD_TAG_MASK == marker::LIGHT_CHANNEL_START
}

#[inline]
pub fn is_light_channel_end(half: u16) -> bool {
    half & marker::WORD_TAG_MASK == marker::LIGHT_CHANNEL_END
}

/// Every well-formed word between a light channel start and end carries
/// the intermediate tag in its upper two bits.
#[inline]
pub fn is_light_channel_intmed(half: u16) -> bool {
    half & marker::WORD_TAG_MASK == marker::LIGHT_CHANNEL_INTMED
}

#[inline]
pub fn is_light_roi_header1(half: u16) -> bool {
    half & marker::ROI_TAG_MASK == marker::LIGHT_ROI_HEADER1
}

#[inline]
pub fn is_light_roi_header2(half: u16) -> bool {
    half & marker::ROI_TAG_MASK == marker::LIGHT_ROI_HEADER2
}

#[inline]
pub fn is_light_roi_end(half: u16) -> bool {
    half & marker::ROI_TAG_MASK == marker::LIGHT_ROI_END
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_word_lower_half_first() {
        assert_eq!(split_word(0xABCD_1234), [0x1234, 0xABCD]);
        assert_eq!(split_word(0x0000_FFFF), [0xFFFF, 0x0000]);
    }

    #[test]
    fn test_event_markers_exact_match() {
        assert!(is_event_start(0xFFFF_FFFF));
        assert!(!is_event_start(0xFFFF_FFFE));
        assert!(is_event_end(0xE000_0000));
        assert!(!is_event_end(0xE000_0001));
    }

    #[test]
    fn test_header_word_masked_match() {
        assert!(is_header_word(0xF000));
        assert!(is_header_word(0xFFFF));
        assert!(!is_header_word(0xE000));
    }

    #[test]
    fn test_charge_channel_markers() {
        assert!(is_charge_channel_start(0x4000));
        assert!(is_charge_channel_start(0x4ABC));
        assert!(!is_charge_channel_start(0x5000));
        assert!(is_charge_channel_end(0x5123));
        assert!(!is_charge_channel_end(0x4123));
    }

    #[test]
    fn test_light_channel_markers_two_bit_mask() {
        // Any 0x4xxx-0x7xxx half matches light start
        assert!(is_light_channel_start(0x4000));
        assert!(is_light_channel_start(0x7FFF));
        assert!(!is_light_channel_start(0x8000));
        assert!(is_light_channel_end(0xC000));
        assert!(is_light_channel_end(0xFFFF));
        assert!(is_light_channel_intmed(0x8000));
        assert!(is_light_channel_intmed(0xBFFF));
        assert!(!is_light_channel_intmed(0xC000));
    }

    #[test]
    fn test_light_roi_tags() {
        // Intermediate-tagged (0x8000) halves with ROI tags in bits 12-13
        assert!(is_light_roi_header1(0x9000));
        assert!(is_light_roi_header2(0xA000));
        assert!(is_light_roi_end(0xB000));
        assert!(!is_light_roi_header1(0xA000));
        assert!(!is_light_roi_end(0xA123));
    }
}
