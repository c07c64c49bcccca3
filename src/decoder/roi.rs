//! Threshold-based region-of-interest extraction for charge traces
//!
//! Charge FEMs ship the full waveform for every channel. When ROI mode is
//! enabled, only windows around threshold crossings are kept: a configured
//! number of samples before the crossing and after it. Windows never share
//! samples; a window opening close behind its predecessor is clipped so it
//! starts no earlier than the sample after the predecessor's last one.

use serde::Serialize;

/// One extracted window of a charge channel trace
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChargeRoi {
    /// Implicit charge channel number the trace belonged to
    pub channel: u16,
    /// ADC values inside the window
    pub adc: Vec<u16>,
    /// Absolute index in the original trace for every sample in `adc`
    pub indices: Vec<u32>,
}

/// Threshold-crossing windowing over completed channel traces
#[derive(Debug, Clone)]
pub struct ChargeRoiExtractor {
    /// Samples kept before a threshold crossing
    pub pre_samples: usize,
    /// Samples kept from the crossing onwards (crossing included)
    pub post_samples: usize,
}

impl Default for ChargeRoiExtractor {
    fn default() -> Self {
        Self {
            pre_samples: 10,
            post_samples: 40,
        }
    }
}

impl ChargeRoiExtractor {
    pub fn new(pre_samples: usize, post_samples: usize) -> Self {
        Self {
            pre_samples,
            post_samples,
        }
    }

    /// Extract all windows from a completed trace in one left-to-right pass.
    ///
    /// A window opens on the first sample strictly above `threshold`,
    /// back-filled by up to `pre_samples` earlier samples (clipped to the
    /// trace start and to one past the previous window's end), and closes
    /// once `post_samples` samples from the crossing onwards have been
    /// collected. A window truncated by the end of the trace is emitted
    /// as-is.
    pub fn extract(&self, trace: &[u16], channel: u16, threshold: u16) -> Vec<ChargeRoi> {
        let mut rois = Vec::new();
        let mut adc: Vec<u16> = Vec::new();
        let mut indices: Vec<u32> = Vec::new();
        let mut in_window = false;
        let mut anchor = 0usize;
        let mut last_emitted_end: Option<usize> = None;

        for (i, &sample) in trace.iter().enumerate() {
            if !in_window {
                if sample <= threshold {
                    continue;
                }
                // Open a window: back-fill the pre-crossing region without
                // re-emitting samples a previous window already closed out
                let mut start = i.saturating_sub(self.pre_samples);
                if let Some(end) = last_emitted_end {
                    start = start.max(end + 1);
                }
                for j in start..i {
                    adc.push(trace[j]);
                    indices.push(j as u32);
                }
                in_window = true;
                anchor = i;
            }

            adc.push(sample);
            indices.push(i as u32);

            if i + 1 - anchor >= self.post_samples {
                last_emitted_end = Some(i);
                rois.push(ChargeRoi {
                    channel,
                    adc: std::mem::take(&mut adc),
                    indices: std::mem::take(&mut indices),
                });
                in_window = false;
            }
        }

        // Partial window truncated by the trace end
        if !adc.is_empty() {
            rois.push(ChargeRoi {
                channel,
                adc,
                indices,
            });
        }

        rois
    }
}
