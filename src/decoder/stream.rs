//! Event stream tokenizer
//!
//! [`EventDecoder`] walks the materialized word sequence one 32-bit word at
//! a time and assembles one [`Event`] per event-start/event-end marker
//! pair. Classified words route to the FEM header cycle, the light ROI
//! header cycle, or the active channel trace; channel-end markers close
//! traces out into the event's columns.
//!
//! Decoding is purely synchronous and pull-based: each
//! [`EventDecoder::next_event`] call advances the cursor until it can
//! yield a complete event, or returns `None` at end-of-stream. The word buffer and all
//! state machine positions are exclusively owned by one decoder instance;
//! independent streams need independent instances.

use std::mem;
use std::path::Path;
use tracing::{debug, info, trace, warn};

use super::common::{DecodeStats, Event};
use super::fem_header::{FemHeader, FemHeaderDecoder};
use super::fields::adc_sample;
use super::light_header::{LightHeaderDecoder, LightRoiHeader};
use super::roi::ChargeRoiExtractor;
use super::words::{self, split_word};
use super::DecodeError;
use crate::config::DecoderSettings;

/// How often to report decode progress (in events)
const PROGRESS_INTERVAL: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenizerState {
    /// Between events; only an event-start marker is meaningful
    Idle,
    /// Accumulating words into the current event
    InEvent,
}

/// Pull-based decoder over a fully materialized word sequence
pub struct EventDecoder {
    buffer: Vec<u32>,
    cursor: usize,
    settings: DecoderSettings,
    extractor: ChargeRoiExtractor,

    fem: FemHeaderDecoder,
    light: LightHeaderDecoder,
    state: TokenizerState,

    // Per-event readout state
    reading_charge: bool,
    reading_light: bool,
    light_header_done: bool,
    pending_light: Option<LightRoiHeader>,
    active_fem: Option<FemHeader>,
    charge_channel_number: u16,
    adc_buf: Vec<u16>,
    current: Event,

    event_counter: u64,
    words_consumed: u64,
    unexpected_words: u64,
    partial_events_discarded: u64,
}

impl EventDecoder {
    /// Create a decoder over an in-memory word sequence.
    pub fn new(buffer: Vec<u32>, settings: DecoderSettings) -> Self {
        let extractor = ChargeRoiExtractor::new(settings.pre_samples, settings.post_samples);
        Self {
            buffer,
            cursor: 0,
            settings,
            extractor,
            fem: FemHeaderDecoder::new(),
            light: LightHeaderDecoder::new(),
            state: TokenizerState::Idle,
            reading_charge: false,
            reading_light: false,
            light_header_done: false,
            pending_light: None,
            active_fem: None,
            charge_channel_number: 0,
            adc_buf: Vec::new(),
            current: Event::default(),
            event_counter: 0,
            words_consumed: 0,
            unexpected_words: 0,
            partial_events_discarded: 0,
        }
    }

    /// Read a raw data file into memory and decode from it.
    ///
    /// Failing to open or read the file is a hard error; no decoder state
    /// is constructed in that case.
    pub fn from_file<P: AsRef<Path>>(path: P, settings: DecoderSettings) -> Result<Self, DecodeError> {
        Ok(Self::new(read_words(path)?, settings))
    }

    pub fn settings(&self) -> &DecoderSettings {
        &self.settings
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> DecodeStats {
        DecodeStats {
            events_decoded: self.event_counter,
            words_consumed: self.words_consumed,
            header_desyncs: self.fem.desyncs() + self.light.desyncs(),
            unexpected_words: self.unexpected_words,
            partial_events_discarded: self.partial_events_discarded,
        }
    }

    /// Advance the cursor until the next complete event.
    ///
    /// Returns `None` at end-of-stream. A partial event cut off by the end
    /// of the stream is discarded, never yielded.
    pub fn next_event(&mut self) -> Option<Event> {
        while self.cursor < self.buffer.len() {
            let word = self.buffer[self.cursor];
            self.cursor += 1;
            self.words_consumed += 1;

            if words::is_event_start(word) {
                if self.state == TokenizerState::InEvent {
                    // Re-synchronization: a second start before an end
                    // discards the orphaned partial event
                    debug!(
                        event = self.event_counter,
                        "event start inside open event, discarding partial event"
                    );
                    self.partial_events_discarded += 1;
                }
                self.begin_event();
                continue;
            }
            if words::is_event_end(word) {
                if self.state == TokenizerState::Idle {
                    trace!("event end with no open event, ignoring");
                    continue;
                }
                return Some(self.finish_event());
            }
            if self.state == TokenizerState::Idle {
                continue;
            }

            let [first, second] = split_word(word);
            if words::is_header_word(first) {
                if let Some(header) = self.fem.feed(word) {
                    self.push_fem_header(header);
                }
                continue;
            }

            for half in [first, second] {
                self.consume_half_word(half);
            }
        }

        if self.state == TokenizerState::InEvent {
            warn!(
                event = self.event_counter,
                "stream ended without event end marker, discarding partial event"
            );
            self.partial_events_discarded += 1;
            self.state = TokenizerState::Idle;
            self.current.clear();
        }
        None
    }

    /// Decode up to `max_events` events (fewer if the stream runs out).
    pub fn decode_events(&mut self, max_events: usize) -> Vec<Event> {
        let mut events = Vec::new();
        while events.len() < max_events {
            match self.next_event() {
                Some(event) => events.push(event),
                None => break,
            }
        }
        events
    }

    fn begin_event(&mut self) {
        self.state = TokenizerState::InEvent;
        self.current.clear();
        self.fem.reset();
        self.light.reset();
        self.light_header_done = false;
        self.pending_light = None;
        self.reading_charge = false;
        self.reading_light = false;
        self.charge_channel_number = 0;
        self.adc_buf.clear();
    }

    fn finish_event(&mut self) -> Event {
        self.state = TokenizerState::Idle;
        let mut event = mem::take(&mut self.current);
        event.id = self.event_counter;
        if self.event_counter % PROGRESS_INTERVAL == 0 {
            debug!(event = self.event_counter, "decoding progress");
        }
        self.event_counter += 1;
        event
    }

    fn push_fem_header(&mut self, header: FemHeader) {
        self.current.slot_number.push(header.slot_number);
        self.current.num_adc_word.push(header.num_adc_words);
        self.current.event_number.push(header.event_number);
        self.current.event_frame_number.push(header.event_frame_number);
        self.current.trigger_frame_number.push(header.trigger_frame_number());
        self.current.check_sum.push(header.checksum);
        self.current.trigger_sample.push(header.trig_sample_number);
        // Charge channel identity restarts with every FEM block
        self.charge_channel_number = 0;
        self.active_fem = Some(header);
    }

    /// Route one 16-bit half-word by the active channel boundary state.
    fn consume_half_word(&mut self, half: u16) {
        let light_slot = self.fem.current_slot() == self.settings.light_slot;

        if words::is_charge_channel_start(half) && !self.reading_charge && !light_slot {
            self.reading_charge = true;
            self.adc_buf.clear();
        } else if words::is_charge_channel_end(half) && !light_slot {
            // An end with no active start is a no-op
            if self.reading_charge {
                self.finish_charge_channel();
            }
        } else if self.reading_charge {
            self.adc_buf.push(adc_sample(half));
        } else if words::is_light_channel_start(half) && !self.reading_light && light_slot {
            self.reading_light = true;
            self.light.reset();
            self.light_header_done = false;
            self.adc_buf.clear();
        } else if words::is_light_channel_end(half) && light_slot {
            self.reading_light = false;
        } else if self.reading_light {
            self.consume_light_word(half);
        } else if half != 0 {
            // Zero outside any boundary is padding; anything else is noise
            trace!("word outside any channel boundary, ignoring: {half:#06x}");
        }
    }

    /// Route one half-word inside an active light region.
    fn consume_light_word(&mut self, half: u16) {
        if !words::is_light_channel_intmed(half) {
            trace!("light region word missing intermediate tag: {half:#06x}");
        }

        // The ROI-header-1 marker or a mid-way header cycle both mean the
        // word belongs to the header; header words 2 and 3 carry no marker
        // of their own
        if words::is_light_roi_header1(half) || !self.light_header_done {
            match self.light.feed(half) {
                Some(header) => {
                    self.light_header_done = true;
                    self.pending_light = Some(header);
                    self.adc_buf.clear();
                }
                None => self.light_header_done = false,
            }
        } else if words::is_light_roi_header2(half) {
            self.adc_buf.push(adc_sample(half));
        } else if words::is_light_roi_end(half) {
            self.finish_light_roi();
        } else {
            warn!("unexpected word in light region, skipping: {half:#06x}");
            self.unexpected_words += 1;
        }
    }

    fn finish_charge_channel(&mut self) {
        self.reading_charge = false;
        let channel = self.charge_channel_number;
        self.charge_channel_number += 1;
        let trace_buf = mem::take(&mut self.adc_buf);

        if self.settings.use_charge_roi {
            match self.settings.channel_threshold.get(channel as usize) {
                Some(&threshold) => {
                    for roi in self.extractor.extract(&trace_buf, channel, threshold) {
                        self.current.charge_channel.push(roi.channel);
                        self.current.charge_adc.push(roi.adc);
                        self.current.charge_adc_index.push(roi.indices);
                    }
                }
                None => {
                    warn!(channel, "no threshold configured for charge channel, keeping full trace");
                    self.current.charge_channel.push(channel);
                    self.current.charge_adc.push(trace_buf);
                }
            }
        } else {
            self.current.charge_channel.push(channel);
            self.current.charge_adc.push(trace_buf);
        }
    }

    fn finish_light_roi(&mut self) {
        self.light.reset();
        self.light_header_done = false;
        let trace_buf = mem::take(&mut self.adc_buf);

        let Some(header) = self.pending_light.take() else {
            warn!(
                samples = trace_buf.len(),
                "light ROI end without a decoded ROI header, dropping trace"
            );
            return;
        };

        let trigger_frame = self
            .active_fem
            .as_ref()
            .map(FemHeader::trigger_frame_number)
            .unwrap_or(0);

        self.current.light_channel.push(header.channel);
        self.current
            .light_frame_number
            .push(header.frame_number(trigger_frame));
        self.current.light_sample_number.push(header.sample_number);
        self.current.light_adc.push(trace_buf);
    }
}

impl Iterator for EventDecoder {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        self.next_event()
    }
}

/// Read a raw data file into a 32-bit word buffer in one shot.
///
/// The stream is little-endian as written by the DAQ host. A trailing
/// fragment shorter than one word is dropped with a warning.
pub fn read_words<P: AsRef<Path>>(path: P) -> Result<Vec<u32>, DecodeError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    if bytes.len() % 4 != 0 {
        warn!(
            path = %path.display(),
            trailing = bytes.len() % 4,
            "input is not a whole number of 32-bit words, dropping trailing bytes"
        );
    }
    info!(
        path = %path.display(),
        bytes = bytes.len(),
        words = bytes.len() / 4,
        "read input file"
    );
    Ok(bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}
