//! Providers Module - Live network probes

pub mod probes;

pub use probes::{LiveProbes, OfflineProbes, ProbeClient};
