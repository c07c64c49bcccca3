//! Light ROI header decoding
//!
//! Each hardware-selected light region of interest opens with three 16-bit
//! header words: channel/id tags, then the frame counter and upper sample
//! bits, then the lower sample bits. Like the FEM header, decoding is
//! positional; only the first word carries the ROI-header-1 marker, so the
//! tokenizer routes words 2 and 3 here based on the cycle being mid-way
//! ([`LightHeaderDecoder::pending`]).

use serde::Serialize;
use std::fmt;
use tracing::warn;

use super::fields::light;
use super::rollover::{correct_rollover, splice_lower_bits};

/// Modulus of the 3-bit rolling frame counter in ROI header word 2.
const LIGHT_FRAME_MODULUS: u32 = 8;

/// Decoded light ROI header
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LightRoiHeader {
    /// Light channel id carried in-band (unlike charge channels)
    pub channel: u16,
    pub id: u16,
    pub header_tag: u16,
    pub word_tag: u16,
    /// Truncated (3-bit) rolling frame counter
    pub frame_num: u16,
    /// Full 17-bit sample number within the frame
    pub sample_number: u32,
}

impl LightRoiHeader {
    /// Full frame number: the 3-bit rolling counter spliced into the FEM's
    /// trigger frame counter and rollover-corrected against it.
    pub fn frame_number(&self, trigger_frame: u32) -> u32 {
        let spliced = splice_lower_bits(trigger_frame, self.frame_num as u32, LIGHT_FRAME_MODULUS);
        correct_rollover(
            spliced,
            trigger_frame,
            LIGHT_FRAME_MODULUS,
            LIGHT_FRAME_MODULUS / 2,
        )
    }
}

impl fmt::Display for LightRoiHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ch:{:2} id:{} frame:{} sample:{}",
            self.channel, self.id, self.frame_num, self.sample_number
        )
    }
}

/// Positional state machine over the three light ROI header words
#[derive(Debug, Default)]
pub struct LightHeaderDecoder {
    position: usize,
    scratch: LightRoiHeader,
    // word 2 is kept until word 3 supplies the lower sample bits
    sample_word: u16,
    desyncs: u64,
}

impl LightHeaderDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// True while a header cycle is mid-way. Words 2 and 3 do not carry the
    /// ROI-header-1 marker, so this is what routes them into the cycle.
    pub fn pending(&self) -> bool {
        self.position != 0
    }

    /// Number of out-of-range positions seen so far.
    pub fn desyncs(&self) -> u64 {
        self.desyncs
    }

    /// Consume one 16-bit header word.
    ///
    /// Returns the completed header after the third word; earlier calls
    /// return `None`. An out-of-range position resets the cycle and drops
    /// the word.
    pub fn feed(&mut self, word: u16) -> Option<LightRoiHeader> {
        match self.position {
            0 => {
                self.scratch.channel = light::channel(word);
                self.scratch.id = light::id(word);
                self.scratch.header_tag = light::header_tag(word);
                self.scratch.word_tag = light::word_tag(word);
            }
            1 => {
                self.scratch.frame_num = light::frame_num(word);
                self.sample_word = word;
            }
            2 => {
                self.scratch.sample_number = light::sample_number(self.sample_word, word);
                self.position = 0;
                return Some(self.scratch.clone());
            }
            pos => {
                warn!(position = pos, "light ROI header cycle out of range, resetting");
                self.desyncs += 1;
                self.position = 0;
                return None;
            }
        }
        self.position += 1;
        None
    }
}
