//! Utils Module - Helper Functions & Shared Utilities

pub mod constants;
pub mod dataset;
pub mod logging;
pub mod store;
pub mod telemetry;

pub use constants::*;
pub use logging::init_logging;
pub use store::{load_model, save_model, ModelArtifact, Preprocessor};
pub use telemetry::{ServiceStats, StatsSnapshot};
