//! FEMDEC-RS: Event decoder for FEM charge and light readout streams
//!
//! This crate turns the raw binary stream written by detector front-end
//! modules (FEMs) into structured per-event records of digitized charge
//! and light-channel waveforms.

pub mod config;
pub mod decoder;
