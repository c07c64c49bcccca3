//! Common output types for the decoder module

use serde::Serialize;
use std::fmt;

/// One fully decoded event, keyed by a monotonically increasing id.
///
/// Columns are parallel vectors: the FEM header columns hold one entry per
/// FEM header block seen in the event, the light columns one entry per
/// light ROI, the charge columns one entry per charge trace (or per
/// extracted ROI when ROI mode is on). Conversion into host array or table
/// types is the caller's business; this struct is plain data.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Event {
    /// Decoder-assigned event index, counting emitted events from zero
    pub id: u64,

    // FEM header columns
    pub slot_number: Vec<u16>,
    pub num_adc_word: Vec<u32>,
    pub event_number: Vec<u32>,
    pub event_frame_number: Vec<u32>,
    pub trigger_frame_number: Vec<u32>,
    pub check_sum: Vec<u32>,
    pub trigger_sample: Vec<u32>,

    // Light readout columns, one entry per ROI
    pub light_channel: Vec<u16>,
    pub light_frame_number: Vec<u32>,
    pub light_sample_number: Vec<u32>,
    pub light_adc: Vec<Vec<u16>>,

    // Charge readout columns, one entry per trace or per ROI
    pub charge_channel: Vec<u16>,
    pub charge_adc: Vec<Vec<u16>>,
    /// Absolute trace indices per ROI; empty when ROI mode is off
    pub charge_adc_index: Vec<Vec<u32>>,
}

impl Event {
    /// Clear all accumulator columns, keeping the id untouched.
    pub fn clear(&mut self) {
        self.slot_number.clear();
        self.num_adc_word.clear();
        self.event_number.clear();
        self.event_frame_number.clear();
        self.trigger_frame_number.clear();
        self.check_sum.clear();
        self.trigger_sample.clear();
        self.light_channel.clear();
        self.light_frame_number.clear();
        self.light_sample_number.clear();
        self.light_adc.clear();
        self.charge_channel.clear();
        self.charge_adc.clear();
        self.charge_adc_index.clear();
    }

    /// Number of FEM header blocks seen in this event.
    pub fn n_fems(&self) -> usize {
        self.slot_number.len()
    }

    /// Format a one-line summary for display.
    pub fn display(&self) -> String {
        format!(
            "Evt {:6} fems:{} charge_ch:{} light_rois:{}",
            self.id,
            self.n_fems(),
            self.charge_channel.len(),
            self.light_channel.len(),
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Counters accumulated over a decode run
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DecodeStats {
    /// Events emitted so far
    pub events_decoded: u64,
    /// 32-bit words consumed from the stream
    pub words_consumed: u64,
    /// Out-of-range header cycle positions (FEM and light combined)
    pub header_desyncs: u64,
    /// Words inside an active light region that matched no ROI structure
    pub unexpected_words: u64,
    /// Events discarded because the stream ended before their end marker
    pub partial_events_discarded: u64,
}

impl fmt::Display for DecodeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "events:{} words:{} desyncs:{} unexpected:{} discarded:{}",
            self.events_decoded,
            self.words_consumed,
            self.header_desyncs,
            self.unexpected_words,
            self.partial_events_discarded,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_keeps_id() {
        let mut ev = Event {
            id: 7,
            slot_number: vec![1, 2],
            charge_adc: vec![vec![1, 2, 3]],
            ..Default::default()
        };
        ev.clear();
        assert_eq!(ev.id, 7);
        assert!(ev.slot_number.is_empty());
        assert!(ev.charge_adc.is_empty());
    }

    #[test]
    fn test_display_summary() {
        let ev = Event {
            id: 3,
            slot_number: vec![15, 16],
            ..Default::default()
        };
        let s = ev.display();
        assert!(s.contains("fems:2"));
    }
}
