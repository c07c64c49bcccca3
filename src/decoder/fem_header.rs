//! FEM header decoding
//!
//! Every FEM (charge or light) emits six consecutive 32-bit header words at
//! the start of its readout block. The words carry no position tag beyond
//! the shared 0xF nibble, so decoding is strictly positional: word *k* is
//! only meaningful immediately after word *k-1*. [`FemHeaderDecoder`] steps
//! through the six positions and hands out a [`FemHeader`] snapshot exactly
//! when the sixth word has been consumed.

use serde::Serialize;
use std::fmt;
use tracing::warn;

use super::fields::fem;
use super::rollover::{correct_rollover, splice_lower_bits};
use super::words::split_word;

/// Modulus of the 4-bit trigger frame counter in header word 6.
const TRIG_FRAME_MODULUS: u32 = 16;

/// Decoded FEM header block
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FemHeader {
    /// Slot the FEM sits in; distinguishes charge from light readout
    pub slot_number: u16,
    pub fem_id: u16,
    /// Status flags: test, overflow, buffer-full
    pub flags: u16,
    /// Number of ADC words in this FEM's data block
    pub num_adc_words: u32,
    pub event_number: u32,
    pub event_frame_number: u32,
    pub checksum: u32,
    /// Sample number within the trigger frame (12 bits)
    pub trig_sample_number: u32,
    /// Truncated (4-bit) trigger frame counter
    pub trig_frame_number_lower: u16,
}

impl FemHeader {
    /// Full trigger frame number: the truncated 4-bit counter spliced into
    /// the event frame counter and rollover-corrected against it.
    pub fn trigger_frame_number(&self) -> u32 {
        let spliced = splice_lower_bits(
            self.event_frame_number,
            self.trig_frame_number_lower as u32,
            TRIG_FRAME_MODULUS,
        );
        correct_rollover(
            spliced,
            self.event_frame_number,
            TRIG_FRAME_MODULUS,
            TRIG_FRAME_MODULUS / 2,
        )
    }
}

impl fmt::Display for FemHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "slot:{:2} fem:{:2} evt:{} frame:{} trig_frame:{} trig_sample:{} nadc:{}",
            self.slot_number,
            self.fem_id,
            self.event_number,
            self.event_frame_number,
            self.trigger_frame_number(),
            self.trig_sample_number,
            self.num_adc_words,
        )
    }
}

/// Positional state machine over the six FEM header words
#[derive(Debug, Default)]
pub struct FemHeaderDecoder {
    position: usize,
    scratch: FemHeader,
    desyncs: u64,
}

impl FemHeaderDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restart the cycle at word 1. The scratch fields keep their last
    /// decoded values; they are only published through [`Self::feed`].
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Current position in the header cycle (0-5).
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of out-of-range positions seen so far.
    pub fn desyncs(&self) -> u64 {
        self.desyncs
    }

    /// Slot number decoded most recently, even if the current cycle has not
    /// completed. Channel data follows its own FEM's header block, so this
    /// is the slot the subsequent data words belong to.
    pub fn current_slot(&self) -> u16 {
        self.scratch.slot_number
    }

    /// Consume one 32-bit header word.
    ///
    /// Returns a snapshot of the completed header after the sixth word; all
    /// other calls return `None`. An out-of-range position resets the cycle
    /// and drops the word for header purposes.
    pub fn feed(&mut self, word: u32) -> Option<FemHeader> {
        let [first, second] = split_word(word);
        match self.position {
            0 => {
                self.scratch.slot_number = fem::slot_number(second);
                self.scratch.fem_id = fem::fem_id(second);
                self.scratch.flags = fem::flags(second);
            }
            1 => self.scratch.num_adc_words = fem::wide_field(first, second),
            2 => self.scratch.event_number = fem::wide_field(first, second),
            3 => self.scratch.event_frame_number = fem::wide_field(first, second),
            4 => self.scratch.checksum = fem::wide_field(first, second),
            5 => {
                self.scratch.trig_sample_number = fem::trig_sample_number(first, second);
                self.scratch.trig_frame_number_lower = fem::trig_frame_number_lower(first);
                self.position = 0;
                return Some(self.scratch.clone());
            }
            pos => {
                warn!(position = pos, "FEM header cycle out of range, resetting");
                self.desyncs += 1;
                self.position = 0;
                return None;
            }
        }
        self.position += 1;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encode one FEM header word from its two half-words.
    fn pack(first: u16, second: u16) -> u32 {
        (first as u32) | ((second as u32) << 16)
    }

    /// Encode a 24-bit value as a header word (upper 12 bits arrive first).
    fn pack_wide(value: u32) -> u32 {
        let first = 0xF000 | ((value >> 12) & 0xFFF) as u16;
        let second = 0xF000 | (value & 0xFFF) as u16;
        pack(first, second)
    }

    /// Build the full 6-word header sequence for the given field values.
    pub(crate) fn make_fem_header_words(
        slot: u16,
        fem_id: u16,
        flags: u16,
        num_adc: u32,
        event_number: u32,
        event_frame: u32,
        checksum: u32,
        trig_sample: u32,
        trig_frame_lower: u16,
    ) -> [u32; 6] {
        let word1 = pack(
            0xFFFF,
            0xF000 | (flags << 9) | (fem_id << 5) | (slot & 0x1F),
        );
        let word6 = pack(
            0xF000 | ((trig_frame_lower & 0xF) << 4) | ((trig_sample >> 8) & 0xF) as u16,
            0xF000 | (trig_sample & 0xFF) as u16,
        );
        [
            word1,
            pack_wide(num_adc),
            pack_wide(event_number),
            pack_wide(event_frame),
            pack_wide(checksum),
            word6,
        ]
    }

    #[test]
    fn test_six_word_round_trip() {
        let words = make_fem_header_words(16, 3, 0b010, 0x123456, 42, 1000, 0xABCDEF, 0x5A5, 0x9);
        let mut dec = FemHeaderDecoder::new();

        for &w in &words[..5] {
            assert!(dec.feed(w).is_none());
        }
        let header = dec.feed(words[5]).expect("header complete after word 6");

        assert_eq!(header.slot_number, 16);
        assert_eq!(header.fem_id, 3);
        assert_eq!(header.flags, 0b010);
        assert_eq!(header.num_adc_words, 0x123456);
        assert_eq!(header.event_number, 42);
        assert_eq!(header.event_frame_number, 1000);
        assert_eq!(header.checksum, 0xABCDEF);
        assert_eq!(header.trig_sample_number, 0x5A5);
        assert_eq!(header.trig_frame_number_lower, 0x9);
    }

    #[test]
    fn test_snapshot_only_at_completion() {
        let words = make_fem_header_words(7, 1, 0, 10, 1, 2, 3, 4, 5);
        let mut dec = FemHeaderDecoder::new();
        for (i, &w) in words.iter().enumerate() {
            let out = dec.feed(w);
            assert_eq!(out.is_some(), i == 5, "completion only at word 6");
        }
        // Cycle wrapped back to position 0 and can run again
        assert_eq!(dec.position(), 0);
        for &w in &words[..5] {
            assert!(dec.feed(w).is_none());
        }
        assert!(dec.feed(words[5]).is_some());
    }

    #[test]
    fn test_reset_restarts_cycle() {
        let words = make_fem_header_words(7, 1, 0, 10, 1, 2, 3, 4, 5);
        let mut dec = FemHeaderDecoder::new();
        dec.feed(words[0]);
        dec.feed(words[1]);
        assert_eq!(dec.position(), 2);
        dec.reset();
        assert_eq!(dec.position(), 0);
        // Full cycle after reset still completes
        for &w in &words[..5] {
            assert!(dec.feed(w).is_none());
        }
        assert!(dec.feed(words[5]).is_some());
    }

    #[test]
    fn test_out_of_range_position_resets_and_drops_word() {
        let words = make_fem_header_words(7, 1, 0, 10, 99, 2, 3, 4, 5);
        let mut dec = FemHeaderDecoder::new();
        dec.position = 17;
        assert!(dec.feed(words[0]).is_none());
        assert_eq!(dec.desyncs(), 1);
        assert_eq!(dec.position(), 0);
        // The triggering word was dropped: the next six words form a
        // clean cycle
        for &w in &words[..5] {
            assert!(dec.feed(w).is_none());
        }
        let header = dec.feed(words[5]).unwrap();
        assert_eq!(header.event_number, 99);
    }

    #[test]
    fn test_current_slot_available_mid_cycle() {
        let words = make_fem_header_words(16, 1, 0, 10, 1, 2, 3, 4, 5);
        let mut dec = FemHeaderDecoder::new();
        dec.feed(words[0]);
        assert_eq!(dec.current_slot(), 16);
    }

    #[test]
    fn test_trigger_frame_number_corrected() {
        let mut header = FemHeader {
            event_frame_number: 0x127,
            trig_frame_number_lower: 0x8,
            ..Default::default()
        };
        // spliced = 0x128, diff 1, within threshold
        assert_eq!(header.trigger_frame_number(), 0x128);

        // spliced = 0x12F, diff 15 > 8: subtract one modulus
        header.trig_frame_number_lower = 0xF;
        header.event_frame_number = 0x120;
        assert_eq!(header.trigger_frame_number(), 0x11F);

        // spliced = 0x120, diff -15 < -8: add one modulus
        header.trig_frame_number_lower = 0x0;
        header.event_frame_number = 0x12F;
        assert_eq!(header.trigger_frame_number(), 0x130);
    }
}
