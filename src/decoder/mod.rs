//! Decoder module for FEM readout streams
//!
//! This module provides:
//! - Marker word classification (words)
//! - Bit-layout field accessors (fields)
//! - Rollover correction for truncated counters (rollover)
//! - FEM and light ROI header state machines (fem_header, light_header)
//! - Charge trace ROI extraction (roi)
//! - The event stream tokenizer driving it all (stream)

pub mod common;
pub mod fem_header;
pub mod fields;
pub mod light_header;
pub mod roi;
pub mod rollover;
pub mod stream;
pub mod words;

// Re-exports
pub use common::{DecodeStats, Event};
pub use fem_header::{FemHeader, FemHeaderDecoder};
pub use light_header::{LightHeaderDecoder, LightRoiHeader};
pub use roi::{ChargeRoi, ChargeRoiExtractor};
pub use stream::EventDecoder;

use thiserror::Error;

/// Decoder error type
///
/// Protocol-level anomalies (header desyncs, unmatched markers, unexpected
/// words) never surface here; they are logged and decoding continues. Only
/// source unavailability and bad configuration are hard failures.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}
