//! Bit-layout accessors for FEM and light ROI header fields
//!
//! Header fields are split across two 16-bit half-words, each carrying a
//! 4-bit tag in its upper nibble. The accessors here reconstruct the wide
//! values with explicit shifts and masks; padding and tag bits are always
//! masked out, never assumed zero. This replaces the compiler-defined
//! overlapping bitfield layouts of older decoders, which were not portable
//! across compilers or endianness.
//!
//! Naming convention: `first` is the half-word that arrives first in the
//! stream (the lower 16 bits of the 32-bit word), `second` the one that
//! follows.

mod layout {
    pub mod fem {
        // Header word 1, second half: slot/id/flags below the 0xF tag nibble
        pub const SLOT_MASK: u16 = 0x1F;
        pub const FEM_ID_SHIFT: u16 = 5;
        pub const FEM_ID_MASK: u16 = 0xF;
        pub const FLAGS_SHIFT: u16 = 9;
        pub const FLAGS_MASK: u16 = 0x7;

        // Header words 2-5: a 24-bit value, upper 12 bits in the first
        // half-word, lower 12 bits in the second
        pub const WIDE_MASK: u32 = 0xFFF;
        pub const WIDE_SHIFT: u32 = 12;

        // Header word 6, first half: sample-number upper nibble in bits 0-3,
        // trigger-frame lower nibble in bits 4-7; second half: sample-number
        // lower byte in bits 0-7
        pub const TRIG_SAMPLE_UPPER_MASK: u32 = 0xF;
        pub const TRIG_SAMPLE_UPPER_SHIFT: u32 = 8;
        pub const TRIG_SAMPLE_LOWER_MASK: u32 = 0xFF;
        pub const TRIG_FRAME_LOWER_SHIFT: u16 = 4;
        pub const TRIG_FRAME_LOWER_MASK: u16 = 0xF;
    }

    pub mod light {
        // ROI header word 1
        pub const CHANNEL_MASK: u16 = 0x3F;
        pub const ID_SHIFT: u16 = 9;
        pub const ID_MASK: u16 = 0x7;
        pub const HEADER_TAG_SHIFT: u16 = 12;
        pub const HEADER_TAG_MASK: u16 = 0x3;
        pub const WORD_TAG_SHIFT: u16 = 14;
        pub const WORD_TAG_MASK: u16 = 0x3;

        // ROI header word 2: sample upper 5 bits, frame number 3 bits
        pub const SAMPLE_UPPER_MASK: u32 = 0x1F;
        pub const SAMPLE_UPPER_SHIFT: u32 = 12;
        pub const FRAME_SHIFT: u16 = 5;
        pub const FRAME_MASK: u16 = 0x7;

        // ROI header word 3: sample lower 12 bits
        pub const SAMPLE_LOWER_MASK: u32 = 0xFFF;
    }

    // ADC data half-words: 12-bit sample, 4 tag bits discarded
    pub const ADC_MASK: u16 = 0x0FFF;
}

/// Extract the 12-bit ADC sample from a data half-word.
#[inline]
pub fn adc_sample(half: u16) -> u16 {
    half & layout::ADC_MASK
}

/// FEM header field accessors
pub mod fem {
    use super::layout::fem as l;

    /// Slot number (5 bits) from header word 1.
    #[inline]
    pub fn slot_number(second: u16) -> u16 {
        second & l::SLOT_MASK
    }

    /// FEM id (4 bits) from header word 1.
    #[inline]
    pub fn fem_id(second: u16) -> u16 {
        (second >> l::FEM_ID_SHIFT) & l::FEM_ID_MASK
    }

    /// Status flags (test/overflow/full, 3 bits) from header word 1.
    #[inline]
    pub fn flags(second: u16) -> u16 {
        (second >> l::FLAGS_SHIFT) & l::FLAGS_MASK
    }

    /// 24-bit value split across header words 2-5
    /// (ADC word count, event number, event frame number, checksum).
    #[inline]
    pub fn wide_field(first: u16, second: u16) -> u32 {
        ((first as u32 & l::WIDE_MASK) << l::WIDE_SHIFT) | (second as u32 & l::WIDE_MASK)
    }

    /// Trigger sample number (12 bits) from header word 6.
    ///
    /// The upper nibble sits in bits 0-3 of the first half-word and is
    /// shifted up by 8 to meet the lower byte; an older format revision
    /// shifted by 4, which zeroes the nibble under the 0xF00 field mask
    /// and cannot be what the hardware intends.
    #[inline]
    pub fn trig_sample_number(first: u16, second: u16) -> u32 {
        ((first as u32 & l::TRIG_SAMPLE_UPPER_MASK) << l::TRIG_SAMPLE_UPPER_SHIFT)
            | (second as u32 & l::TRIG_SAMPLE_LOWER_MASK)
    }

    /// Lower 4 bits of the trigger frame number, from header word 6.
    #[inline]
    pub fn trig_frame_number_lower(first: u16) -> u16 {
        (first >> l::TRIG_FRAME_LOWER_SHIFT) & l::TRIG_FRAME_LOWER_MASK
    }
}

/// Light ROI header field accessors
pub mod light {
    use super::layout::light as l;

    /// Light channel id (6 bits) from ROI header word 1.
    #[inline]
    pub fn channel(word: u16) -> u16 {
        word & l::CHANNEL_MASK
    }

    /// Module-internal id (3 bits) from ROI header word 1.
    #[inline]
    pub fn id(word: u16) -> u16 {
        (word >> l::ID_SHIFT) & l::ID_MASK
    }

    /// Header tag (2 bits) from ROI header word 1.
    #[inline]
    pub fn header_tag(word: u16) -> u16 {
        (word >> l::HEADER_TAG_SHIFT) & l::HEADER_TAG_MASK
    }

    /// Word tag (2 bits) from ROI header word 1.
    #[inline]
    pub fn word_tag(word: u16) -> u16 {
        (word >> l::WORD_TAG_SHIFT) & l::WORD_TAG_MASK
    }

    /// Rolling frame number (3 bits) from ROI header word 2.
    #[inline]
    pub fn frame_num(word: u16) -> u16 {
        (word >> l::FRAME_SHIFT) & l::FRAME_MASK
    }

    /// Full 17-bit sample number: 5 upper bits from ROI header word 2,
    /// 12 lower bits from ROI header word 3.
    #[inline]
    pub fn sample_number(word2: u16, word3: u16) -> u32 {
        ((word2 as u32 & l::SAMPLE_UPPER_MASK) << l::SAMPLE_UPPER_SHIFT)
            | (word3 as u32 & l::SAMPLE_LOWER_MASK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adc_sample_discards_tag_nibble() {
        assert_eq!(adc_sample(0xAFFF), 0x0FFF);
        assert_eq!(adc_sample(0x012C), 300);
        assert_eq!(adc_sample(0xF000), 0);
    }

    #[test]
    fn test_fem_word1_fields() {
        // tag=0xF, flags=0b101, fem_id=0x9, slot=0x16
        let second: u16 = 0xF000 | (0b101 << 9) | (0x9 << 5) | 0x16;
        assert_eq!(fem::slot_number(second), 0x16);
        assert_eq!(fem::fem_id(second), 0x9);
        assert_eq!(fem::flags(second), 0b101);
    }

    #[test]
    fn test_fem_wide_field_reassembly() {
        // 24-bit value 0xABC123: upper 12 bits first, lower 12 bits second
        let first: u16 = 0xF000 | 0xABC;
        let second: u16 = 0xF000 | 0x123;
        assert_eq!(fem::wide_field(first, second), 0xABC123);
    }

    #[test]
    fn test_fem_wide_field_masks_padding() {
        // Tag nibbles must never leak into the value
        assert_eq!(fem::wide_field(0xFFFF, 0xFFFF), 0xFFFFFF);
        assert_eq!(fem::wide_field(0xF000, 0xF000), 0);
    }

    #[test]
    fn test_fem_trig_sample_number() {
        // sample = 0xA5C: upper nibble 0xA in first word bits 0-3,
        // lower byte 0x5C in second word bits 0-7
        let first: u16 = 0xF000 | 0x000A;
        let second: u16 = 0xF000 | 0x005C;
        assert_eq!(fem::trig_sample_number(first, second), 0xA5C);
    }

    #[test]
    fn test_fem_trig_frame_lower() {
        let first: u16 = 0xF000 | (0xB << 4) | 0x3;
        assert_eq!(fem::trig_frame_number_lower(first), 0xB);
    }

    #[test]
    fn test_light_header1_fields() {
        // word_tag=0b10 (intermediate), header_tag=0b01, id=0b011, ch=37
        let word: u16 = (0b10 << 14) | (0b01 << 12) | (0b011 << 9) | 37;
        assert_eq!(light::channel(word), 37);
        assert_eq!(light::id(word), 0b011);
        assert_eq!(light::header_tag(word), 0b01);
        assert_eq!(light::word_tag(word), 0b10);
    }

    #[test]
    fn test_light_sample_and_frame() {
        // sample = 0x1F0A5 (17 bits), frame = 5
        let word2: u16 = 0x8000 | (5 << 5) | 0x1F;
        let word3: u16 = 0x8000 | 0x0A5;
        assert_eq!(light::frame_num(word2), 5);
        assert_eq!(light::sample_number(word2, word3), 0x1F0A5);
    }
}
